// ── Allow-list policy ──
//
// One list of unique ids, read either as a blacklist or a whitelist (or
// both, if the mode string names both). Unreadable settings disable the
// list entirely rather than locking every light out.

use std::collections::BTreeSet;

use serde_json::Value;
use strum::Display;
use tracing::debug;

use crate::config::AllowListSettings;
use crate::error::CoreError;
use crate::model::UniqueId;

/// How the configured id list is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum AllowListMode {
    Unset,
    Blacklist,
    Whitelist,
    /// The mode string named both; the blacklist check runs first.
    Both,
}

impl AllowListMode {
    /// Parse the free-form mode string by substring, as the host UI writes it.
    pub fn from_setting(raw: &str) -> Self {
        let raw = raw.to_lowercase();
        match (raw.contains("blacklist"), raw.contains("whitelist")) {
            (true, true) => Self::Both,
            (true, false) => Self::Blacklist,
            (false, true) => Self::Whitelist,
            (false, false) => Self::Unset,
        }
    }

    pub fn includes_blacklist(self) -> bool {
        matches!(self, Self::Blacklist | Self::Both)
    }

    pub fn includes_whitelist(self) -> bool {
        matches!(self, Self::Whitelist | Self::Both)
    }
}

/// Typed allow-list configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllowListConfig {
    pub unique_ids: BTreeSet<UniqueId>,
    pub mode: AllowListMode,
}

impl AllowListConfig {
    /// Interpret raw settings. `Ok(None)` means nothing is configured.
    pub fn from_settings(settings: &AllowListSettings) -> Result<Option<Self>, CoreError> {
        let (Some(ids), Some(mode)) = (
            non_null(settings.blacklisted_unique_ids.as_ref()),
            non_null(settings.blacklist_or_whitelist.as_ref()),
        ) else {
            return Ok(None);
        };

        let mode = match mode {
            Value::String(s) => AllowListMode::from_setting(s),
            other => {
                return Err(CoreError::Config {
                    message: format!("blacklistOrWhitelist must be a string, got {other}"),
                });
            }
        };

        let Value::Array(entries) = ids else {
            return Err(CoreError::Config {
                message: format!("blacklistedUniqueIds must be a list, got {ids}"),
            });
        };

        let unique_ids = entries
            .iter()
            .map(|entry| match entry {
                Value::String(s) => Ok(UniqueId::new(s)),
                other => Err(CoreError::Config {
                    message: format!("blacklistedUniqueIds entries must be strings, got {other}"),
                }),
            })
            .collect::<Result<BTreeSet<_>, _>>()?;

        Ok(Some(Self { unique_ids, mode }))
    }
}

fn non_null(value: Option<&Value>) -> Option<&Value> {
    value.filter(|v| !v.is_null())
}

/// Gate deciding whether a device identity may stay registered.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AllowListPolicy {
    config: Option<AllowListConfig>,
}

impl AllowListPolicy {
    /// A policy that allows everything.
    pub fn unrestricted() -> Self {
        Self::default()
    }

    /// Build from raw settings, falling open when they can't be read.
    pub fn from_settings(settings: &AllowListSettings) -> Self {
        match AllowListConfig::from_settings(settings) {
            Ok(config) => Self { config },
            Err(e) => {
                debug!(error = %e, "ignoring unreadable allow list, all devices allowed");
                Self::unrestricted()
            }
        }
    }

    pub fn config(&self) -> Option<&AllowListConfig> {
        self.config.as_ref()
    }

    pub fn is_allowed(&self, unique_id: &UniqueId) -> bool {
        let Some(config) = &self.config else {
            return true;
        };
        let listed = config.unique_ids.contains(unique_id);

        if config.mode.includes_blacklist() && listed {
            return false;
        }
        if config.mode.includes_whitelist() && !listed {
            return false;
        }
        true
    }
}
