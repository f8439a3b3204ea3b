// ── Hardware identity ──
//
// A light's unique id is derived from its MAC address and is the only
// stable handle we get from discovery. Accessory UUIDs are a pure
// function of it, so the same bulb always maps to the same accessory.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Namespace for name-based accessory UUIDs.
const ACCESSORY_NAMESPACE: Uuid = Uuid::from_u128(0x3f6d_1c0a_8e2b_5d47_9a41_0c7e_5b2f_d913);

/// Stable hardware identity, normalized to upper-case hex without separators
/// (`600194A1B2C3`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct UniqueId(String);

impl UniqueId {
    /// Normalize any common MAC-ish spelling: colons, dashes, dots and
    /// surrounding whitespace are stripped, hex is upper-cased.
    pub fn new(raw: impl AsRef<str>) -> Self {
        let normalized = raw
            .as_ref()
            .trim()
            .chars()
            .filter(|c| !matches!(c, ':' | '-' | '.'))
            .collect::<String>()
            .to_uppercase();
        Self(normalized)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Trailing six characters, used to tell identical models apart in names.
    pub fn short(&self) -> &str {
        let start = self.0.len().saturating_sub(6);
        self.0.get(start..).unwrap_or(&self.0)
    }

    /// Deterministic accessory UUID for this identity.
    pub fn accessory_uuid(&self) -> Uuid {
        Uuid::new_v5(&ACCESSORY_NAMESPACE, self.0.as_bytes())
    }
}

impl fmt::Display for UniqueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for UniqueId {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::new(s))
    }
}

impl From<String> for UniqueId {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<&str> for UniqueId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<UniqueId> for String {
    fn from(id: UniqueId) -> Self {
        id.0
    }
}
