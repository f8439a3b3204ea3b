//! Snapshot-file network.
//!
//! Stands in for the broadcast probe and per-device query: a JSON array of
//! device replies, re-read on every call so a long-running host sees edits.
//!
//! ```json
//! [
//!   { "uniqueId": "600194A1B2C3", "ipAddress": "192.168.1.40",
//!     "modelNumber": "AK001-ZJ2101", "lightVersion": 4,
//!     "lightVersionModifier": 51, "state": { "on": true } }
//! ]
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use lumenkeep_core::{
    CoreError, Device, DeviceDescriptor, DeviceTransport, Discovery, StateSnapshot, UniqueId,
};

/// One reply in the snapshot file.
#[derive(Debug, Deserialize)]
struct SnapshotEntry {
    #[serde(flatten)]
    descriptor: DeviceDescriptor,
    /// Returned by state queries.
    #[serde(default)]
    state: Option<serde_json::Value>,
    /// The device answers discovery but refuses state queries.
    #[serde(default)]
    unreachable: bool,
}

async fn read_snapshot(path: &Path) -> Result<Vec<SnapshotEntry>, String> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| format!("{}: {e}", path.display()))?;
    serde_json::from_str(&raw).map_err(|e| format!("{}: {e}", path.display()))
}

/// Discovery that replays the devices listed in a snapshot file.
#[derive(Debug, Clone)]
pub struct SnapshotDiscovery {
    path: PathBuf,
}

impl SnapshotDiscovery {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl Discovery for SnapshotDiscovery {
    async fn scan(&self, _timeout: Duration) -> Result<Vec<DeviceDescriptor>, CoreError> {
        let entries = read_snapshot(&self.path)
            .await
            .map_err(|reason| CoreError::Discovery { reason })?;
        debug!(count = entries.len(), "snapshot replies");
        Ok(entries.into_iter().map(|e| e.descriptor).collect())
    }
}

/// State queries answered from the same snapshot file.
#[derive(Debug, Clone)]
pub struct SnapshotTransport {
    path: PathBuf,
}

impl SnapshotTransport {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl DeviceTransport for SnapshotTransport {
    async fn get_state(
        &self,
        device: &Device,
        _timeout: Duration,
    ) -> Result<StateSnapshot, CoreError> {
        let transport_error = |reason: String| CoreError::Transport {
            address: device.ip_address.to_string(),
            reason,
        };

        let entries = read_snapshot(&self.path).await.map_err(transport_error)?;
        let entry = entries
            .into_iter()
            .find(|e| {
                e.descriptor
                    .unique_id
                    .as_deref()
                    .is_some_and(|id| UniqueId::new(id) == device.unique_id)
            })
            .ok_or_else(|| transport_error("no reply".into()))?;

        if entry.unreachable {
            return Err(transport_error("connection refused".into()));
        }
        Ok(entry.state.map(StateSnapshot).unwrap_or_default())
    }
}
