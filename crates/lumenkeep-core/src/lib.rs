// lumenkeep-core: Reconciles discovered smart lights with persisted accessories.

pub mod cache;
pub mod config;
pub mod error;
pub mod host;
pub mod model;
pub mod platform;
pub mod policy;
pub mod profile;
pub mod reconcile;
pub mod report;
pub mod scan;

// ── Primary re-exports ──────────────────────────────────────────────
pub use cache::AccessoryCache;
pub use config::{AllowListSettings, PlatformConfig, RetentionPolicy, ScanPolicy};
pub use error::CoreError;
pub use host::{AccessoryAdapter, AccessoryRegistry, DeviceTransport, Discovery};
pub use platform::{Collaborators, Platform};
pub use profile::{Capabilities, LightProfile, ProfileAdapter};
pub use reconcile::{ReconciliationEngine, RegistryEffect, RemovalReason};
pub use report::RunSummary;
pub use scan::ScanCoordinator;

pub use model::{Accessory, AccessoryContext, Device, DeviceDescriptor, StateSnapshot, UniqueId};
pub use policy::{AllowListMode, AllowListPolicy, PruningPolicy};
