// ── Domain model ──
//
// Devices are what one discovery scan reports; accessories are what the
// hosting registry persists. Identity ties the two together.

pub mod accessory;
pub mod device;
pub mod identity;

pub use accessory::{Accessory, AccessoryContext};
pub use device::{Device, DeviceDescriptor, StateSnapshot};
pub use identity::UniqueId;
