// ── Device domain types ──

use serde::{Deserialize, Serialize};
use std::net::IpAddr;

use super::identity::UniqueId;
use crate::error::CoreError;

/// Opaque state snapshot returned by a device query.
///
/// Kept only for diagnostics; nothing in the reconciliation logic reads it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StateSnapshot(pub serde_json::Value);

impl StateSnapshot {
    pub fn is_empty(&self) -> bool {
        self.0.is_null()
    }
}

impl From<serde_json::Value> for StateSnapshot {
    fn from(value: serde_json::Value) -> Self {
        Self(value)
    }
}

/// A device reply as it comes off the discovery boundary, before validation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceDescriptor {
    pub unique_id: Option<String>,
    pub ip_address: Option<String>,
    pub model_number: Option<String>,
    pub light_version: Option<u8>,
    pub light_version_modifier: Option<u8>,
    #[serde(default)]
    pub initial_state: Option<serde_json::Value>,
}

/// A validated device as reported by one discovery scan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Device {
    pub unique_id: UniqueId,
    pub ip_address: IpAddr,
    pub model_number: String,
    pub light_version: u8,
    pub light_version_modifier: u8,
    #[serde(default)]
    pub initial_state: StateSnapshot,
}

impl Device {
    /// Accessory UUID for this device's hardware identity.
    pub fn accessory_uuid(&self) -> uuid::Uuid {
        self.unique_id.accessory_uuid()
    }
}

impl TryFrom<DeviceDescriptor> for Device {
    type Error = CoreError;

    fn try_from(raw: DeviceDescriptor) -> Result<Self, Self::Error> {
        let unique_id = raw
            .unique_id
            .map(UniqueId::new)
            .filter(|id| !id.is_empty())
            .ok_or_else(|| CoreError::invalid_device("uniqueId", "missing"))?;

        let ip_address = raw
            .ip_address
            .ok_or_else(|| CoreError::invalid_device("ipAddress", "missing"))?;
        let ip_address: IpAddr = ip_address.trim().parse().map_err(|_| {
            CoreError::invalid_device("ipAddress", format!("not an IP address: {ip_address}"))
        })?;

        let model_number = raw
            .model_number
            .map(|m| m.trim().to_owned())
            .filter(|m| !m.is_empty())
            .ok_or_else(|| CoreError::invalid_device("modelNumber", "missing"))?;

        let light_version = raw
            .light_version
            .ok_or_else(|| CoreError::invalid_device("lightVersion", "missing"))?;
        let light_version_modifier = raw
            .light_version_modifier
            .ok_or_else(|| CoreError::invalid_device("lightVersionModifier", "missing"))?;

        Ok(Self {
            unique_id,
            ip_address,
            model_number,
            light_version,
            light_version_modifier,
            initial_state: raw.initial_state.map(StateSnapshot).unwrap_or_default(),
        })
    }
}
