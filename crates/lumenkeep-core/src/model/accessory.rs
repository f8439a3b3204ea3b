// ── Accessory domain types ──
//
// An accessory is the persisted handle the hosting registry keeps for a
// light across restarts. We own only its context.

use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use uuid::Uuid;

use super::device::Device;
use super::identity::UniqueId;

/// Per-accessory state carried between runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessoryContext {
    pub display_name: String,
    /// Last device descriptor that matched this accessory.
    pub device: Device,
    #[serde(rename = "cachedIPAddress")]
    pub cached_ip_address: IpAddr,
    /// Consecutive runs in which discovery did not report this device.
    #[serde(default)]
    pub restarts_since_seen: u32,
}

impl AccessoryContext {
    /// Context for a device seen for the first time in this run.
    pub fn first_seen(display_name: impl Into<String>, device: Device) -> Self {
        Self {
            display_name: display_name.into(),
            cached_ip_address: device.ip_address,
            device,
            restarts_since_seen: 0,
        }
    }
}

/// A registered accessory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Accessory {
    /// Never recomputed once assigned.
    pub uuid: Uuid,
    pub context: AccessoryContext,
}

impl Accessory {
    pub fn new(uuid: Uuid, context: AccessoryContext) -> Self {
        Self { uuid, context }
    }

    pub fn unique_id(&self) -> &UniqueId {
        &self.context.device.unique_id
    }

    pub fn display_name(&self) -> &str {
        &self.context.display_name
    }

    pub fn restarts_since_seen(&self) -> u32 {
        self.context.restarts_since_seen
    }

    /// The user asked for removal by putting "delete" in the name.
    pub fn is_marked_for_deletion(&self) -> bool {
        self.context.display_name.to_lowercase().contains("delete")
    }
}
