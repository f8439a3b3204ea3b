// ── Runtime platform configuration ──
//
// These types describe *how* a run behaves: scan budget, query timeouts,
// retention rules and the raw allow-list settings. They never touch disk.
// `lumenkeep-config` builds a `PlatformConfig` and hands it in.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Discovery retry policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanPolicy {
    /// Listen window for one discovery probe.
    pub timeout: Duration,
    /// Probes issued before giving up on an empty network.
    pub max_attempts: u32,
}

impl Default for ScanPolicy {
    fn default() -> Self {
        Self {
            timeout: Duration::from_millis(2000),
            max_attempts: 5,
        }
    }
}

/// When cached accessories get removed from the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetentionPolicy {
    pub prune_missing_cached_accessories: bool,
    pub prune_all_accessories_next_restart: bool,
    pub restarts_before_missing_accessories_pruned: u32,
}

impl Default for RetentionPolicy {
    fn default() -> Self {
        Self {
            prune_missing_cached_accessories: false,
            prune_all_accessories_next_restart: false,
            restarts_before_missing_accessories_pruned: 3,
        }
    }
}

/// Allow-list settings exactly as configured.
///
/// Values stay untyped so a malformed entry never blocks loading; the
/// allow-list policy interprets them and falls open on anything it can't read.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AllowListSettings {
    pub blacklisted_unique_ids: Option<serde_json::Value>,
    pub blacklist_or_whitelist: Option<serde_json::Value>,
}

/// Everything one run needs besides its collaborators.
#[derive(Debug, Clone, PartialEq)]
pub struct PlatformConfig {
    pub scan: ScanPolicy,
    /// Bound on each new device's state query.
    pub state_timeout: Duration,
    pub retention: RetentionPolicy,
    pub allow_list: AllowListSettings,
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            scan: ScanPolicy::default(),
            state_timeout: Duration::from_millis(1000),
            retention: RetentionPolicy::default(),
            allow_list: AllowListSettings::default(),
        }
    }
}
