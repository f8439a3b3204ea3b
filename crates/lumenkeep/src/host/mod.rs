//! Hosting runtime pieces: where accessories are persisted and where
//! device replies come from.

mod registry;
mod snapshot;

pub use registry::FileRegistry;
pub use snapshot::{SnapshotDiscovery, SnapshotTransport};
