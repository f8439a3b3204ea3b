//! JSON-file accessory registry.
//!
//! Loaded once per process, mutated by registry effects, written back in
//! one atomic replace when the run is done.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::debug;
use uuid::Uuid;

use lumenkeep_core::{Accessory, AccessoryRegistry, CoreError};

const STATE_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct StateFile {
    version: u32,
    saved_at: DateTime<Utc>,
    accessories: Vec<Accessory>,
}

/// Accessory registry persisted as a single JSON document.
#[derive(Debug)]
pub struct FileRegistry {
    path: PathBuf,
    entries: Mutex<IndexMap<Uuid, Accessory>>,
}

impl FileRegistry {
    /// Load the state file. A missing file is an empty registry.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, CoreError> {
        let path = path.into();
        let accessories = match tokio::fs::read_to_string(&path).await {
            Ok(raw) => parse_state(&path, &raw)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => return Err(registry_error(&path, e)),
        };
        debug!(path = %path.display(), count = accessories.len(), "loaded accessory state");

        let entries = accessories.into_iter().map(|a| (a.uuid, a)).collect();
        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    /// Snapshot of every registered accessory, in registration order.
    pub async fn accessories(&self) -> Vec<Accessory> {
        self.entries.lock().await.values().cloned().collect()
    }

    /// Write the current state next to the target, then rename over it.
    pub async fn save(&self) -> Result<(), CoreError> {
        let state = StateFile {
            version: STATE_VERSION,
            saved_at: Utc::now(),
            accessories: self.accessories().await,
        };
        let json = serde_json::to_string_pretty(&state).map_err(|e| CoreError::Registry {
            message: format!("cannot encode accessory state: {e}"),
        })?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| registry_error(parent, e))?;
        }
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json)
            .await
            .map_err(|e| registry_error(&tmp, e))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| registry_error(&self.path, e))?;

        debug!(
            path = %self.path.display(),
            count = state.accessories.len(),
            "saved accessory state"
        );
        Ok(())
    }
}

#[async_trait]
impl AccessoryRegistry for FileRegistry {
    async fn restore(&self) -> Result<Vec<Accessory>, CoreError> {
        Ok(self.accessories().await)
    }

    async fn register(&self, accessories: &[Accessory]) -> Result<(), CoreError> {
        let mut entries = self.entries.lock().await;
        for accessory in accessories {
            entries.insert(accessory.uuid, accessory.clone());
        }
        Ok(())
    }

    async fn update(&self, accessories: &[Accessory]) -> Result<(), CoreError> {
        let mut entries = self.entries.lock().await;
        for accessory in accessories {
            let Some(slot) = entries.get_mut(&accessory.uuid) else {
                return Err(CoreError::Registry {
                    message: format!("cannot update unregistered accessory {}", accessory.uuid),
                });
            };
            *slot = accessory.clone();
        }
        Ok(())
    }

    async fn unregister(&self, accessories: &[Accessory]) -> Result<(), CoreError> {
        let mut entries = self.entries.lock().await;
        for accessory in accessories {
            entries.shift_remove(&accessory.uuid);
        }
        Ok(())
    }
}

fn parse_state(path: &Path, raw: &str) -> Result<Vec<Accessory>, CoreError> {
    let state: StateFile = serde_json::from_str(raw).map_err(|e| CoreError::Registry {
        message: format!("{}: {e}", path.display()),
    })?;
    if state.version != STATE_VERSION {
        return Err(CoreError::Registry {
            message: format!(
                "{}: unsupported state file version {}",
                path.display(),
                state.version
            ),
        });
    }
    Ok(state.accessories)
}

fn registry_error(path: &Path, err: std::io::Error) -> CoreError {
    CoreError::Registry {
        message: format!("{}: {err}", path.display()),
    }
}
