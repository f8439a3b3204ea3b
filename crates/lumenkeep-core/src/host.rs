// ── Collaborator seams ──
//
// Everything that talks to the network or to the hosting runtime sits
// behind one of these traits. The core crate only ever sees them as
// trait objects, so the binary (or a test) decides what's on the other side.

use std::time::Duration;

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::CoreError;
use crate::model::{Accessory, AccessoryContext, Device, DeviceDescriptor, StateSnapshot};
use crate::profile::LightProfile;

/// One broadcast probe cycle on the local network.
#[async_trait]
pub trait Discovery: Send + Sync {
    /// Collect replies for at most `timeout`. No replies is an empty list,
    /// not an error.
    async fn scan(&self, timeout: Duration) -> Result<Vec<DeviceDescriptor>, CoreError>;
}

/// Per-device state query.
#[async_trait]
pub trait DeviceTransport: Send + Sync {
    async fn get_state(
        &self,
        device: &Device,
        timeout: Duration,
    ) -> Result<StateSnapshot, CoreError>;
}

/// The hosting runtime's accessory store.
#[async_trait]
pub trait AccessoryRegistry: Send + Sync {
    /// Every accessory persisted by previous runs. Called once at startup.
    async fn restore(&self) -> Result<Vec<Accessory>, CoreError>;

    /// Create a fresh accessory handle.
    fn create(&self, uuid: Uuid, context: AccessoryContext) -> Accessory {
        Accessory::new(uuid, context)
    }

    async fn register(&self, accessories: &[Accessory]) -> Result<(), CoreError>;

    async fn update(&self, accessories: &[Accessory]) -> Result<(), CoreError>;

    async fn unregister(&self, accessories: &[Accessory]) -> Result<(), CoreError>;
}

/// Maps devices onto exposed smart-home characteristics.
pub trait AccessoryAdapter: Send + Sync {
    /// Work out what kind of light a device is.
    fn describe(&self, device: &Device) -> Result<LightProfile, CoreError>;

    /// Attach characteristic handlers to an accessory that stays registered.
    fn attach(&self, accessory: &Accessory) -> Result<(), CoreError>;
}
