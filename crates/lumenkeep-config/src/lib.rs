//! Configuration for lumenkeep.
//!
//! TOML file + `LUMENKEEP_*` environment layering, validation, and
//! translation to `lumenkeep_core::PlatformConfig`. Key names follow
//! snake_case; the camelCase spellings used by smart-home hosts are
//! accepted as aliases.

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Toml},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use lumenkeep_core::{AllowListSettings, PlatformConfig, RetentionPolicy, ScanPolicy};

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub discovery: Discovery,

    #[serde(alias = "deviceManagement")]
    pub device_management: DeviceManagement,

    pub pruning: Pruning,

    pub registry: Registry,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct Discovery {
    /// Listen window for one discovery probe.
    pub timeout_ms: u64,
    /// Probes before giving up on an empty network.
    pub max_attempts: u32,
    /// Bound on each new device's state query.
    pub state_timeout_ms: u64,
}

impl Default for Discovery {
    fn default() -> Self {
        Self {
            timeout_ms: 2000,
            max_attempts: 5,
            state_timeout_ms: 1000,
        }
    }
}

/// Allow-list settings. Values stay untyped: a malformed list must not
/// stop the config from loading.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct DeviceManagement {
    #[serde(
        alias = "blacklistedUniqueIDs",
        alias = "blacklistedUniqueIds",
        skip_serializing_if = "Option::is_none"
    )]
    pub blacklisted_unique_ids: Option<serde_json::Value>,

    #[serde(alias = "blacklistOrWhitelist", skip_serializing_if = "Option::is_none")]
    pub blacklist_or_whitelist: Option<serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct Pruning {
    #[serde(alias = "pruneMissingCachedAccessories")]
    pub prune_missing_cached_accessories: bool,

    #[serde(alias = "pruneAllAccessoriesNextRestart")]
    pub prune_all_accessories_next_restart: bool,

    #[serde(alias = "restartsBeforeMissingAccessoriesPruned")]
    pub restarts_before_missing_accessories_pruned: u32,
}

impl Default for Pruning {
    fn default() -> Self {
        let retention = RetentionPolicy::default();
        Self {
            prune_missing_cached_accessories: retention.prune_missing_cached_accessories,
            prune_all_accessories_next_restart: retention.prune_all_accessories_next_restart,
            restarts_before_missing_accessories_pruned: retention
                .restarts_before_missing_accessories_pruned,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct Registry {
    /// Accessory state file. Defaults to `accessories.json` in the data dir.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

// ── Paths ───────────────────────────────────────────────────────────

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("dev", "lumenkeep", "lumenkeep")
}

fn dirs_fallback(kind: &str) -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(kind);
    p.push("lumenkeep");
    p
}

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    project_dirs().map_or_else(
        || dirs_fallback(".config").join("config.toml"),
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

/// Default location of the accessory state file.
pub fn default_registry_path() -> PathBuf {
    project_dirs().map_or_else(
        || dirs_fallback(".local/share").join("accessories.json"),
        |dirs| dirs.data_dir().join("accessories.json"),
    )
}

impl Config {
    /// The configured registry path, or the platform default.
    pub fn registry_path(&self) -> PathBuf {
        self.registry
            .path
            .clone()
            .unwrap_or_else(default_registry_path)
    }
}

// ── Config loading ──────────────────────────────────────────────────

// Defaults come from serde rather than a serialized provider, so a
// camelCase key in the file never collides with a snake_case default.
fn figment(path: &Path) -> Figment {
    Figment::new()
        .merge(Toml::file(path))
        .merge(Env::prefixed("LUMENKEEP_").ignore(&["config"]).split("__"))
}

/// Load and validate the config at `path` plus environment overrides.
/// A missing file yields the defaults.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let config: Config = figment(path).extract()?;
    validate(&config)?;
    Ok(config)
}

/// Load the config from the canonical path.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Check the values a run can't work with.
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    let discovery = &config.discovery;
    if discovery.max_attempts == 0 {
        return Err(invalid("discovery.max_attempts", "must be at least 1"));
    }
    if discovery.timeout_ms == 0 {
        return Err(invalid("discovery.timeout_ms", "must be greater than 0"));
    }
    if discovery.state_timeout_ms == 0 {
        return Err(invalid("discovery.state_timeout_ms", "must be greater than 0"));
    }
    Ok(())
}

fn invalid(field: &str, reason: &str) -> ConfigError {
    ConfigError::Validation {
        field: field.into(),
        reason: reason.into(),
    }
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write it to `path`.
pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<(), ConfigError> {
    save_config_to(cfg, &config_path())
}

// ── Translation ─────────────────────────────────────────────────────

/// Build the core's runtime configuration.
pub fn to_platform_config(cfg: &Config) -> PlatformConfig {
    PlatformConfig {
        scan: ScanPolicy {
            timeout: Duration::from_millis(cfg.discovery.timeout_ms),
            max_attempts: cfg.discovery.max_attempts,
        },
        state_timeout: Duration::from_millis(cfg.discovery.state_timeout_ms),
        retention: RetentionPolicy {
            prune_missing_cached_accessories: cfg.pruning.prune_missing_cached_accessories,
            prune_all_accessories_next_restart: cfg.pruning.prune_all_accessories_next_restart,
            restarts_before_missing_accessories_pruned: cfg
                .pruning
                .restarts_before_missing_accessories_pruned,
        },
        allow_list: AllowListSettings {
            blacklisted_unique_ids: cfg.device_management.blacklisted_unique_ids.clone(),
            blacklist_or_whitelist: cfg.device_management.blacklist_or_whitelist.clone(),
        },
    }
}
