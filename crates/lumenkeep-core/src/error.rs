// ── Core error types ──
//
// Errors raised by collaborators (discovery, device transport, registry,
// adapter) and by descriptor validation. None of these are fatal to a
// run: the platform isolates them per device or per effect and keeps going.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Network errors ───────────────────────────────────────────────
    #[error("Discovery probe failed: {reason}")]
    Discovery { reason: String },

    #[error("Cannot query device at {address}: {reason}")]
    Transport { address: String, reason: String },

    #[error("{operation} timed out after {timeout_ms}ms")]
    Timeout { operation: String, timeout_ms: u64 },

    // ── Data errors ──────────────────────────────────────────────────
    #[error("Invalid device descriptor ({field}): {reason}")]
    InvalidDevice { field: String, reason: String },

    // ── Collaborator errors ──────────────────────────────────────────
    #[error("Accessory registry error: {message}")]
    Registry { message: String },

    #[error("Accessory adapter error: {message}")]
    Adapter { message: String },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Returns `true` for network failures that a later run may not hit.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Discovery { .. } | Self::Transport { .. } | Self::Timeout { .. }
        )
    }

    pub(crate) fn invalid_device(field: &str, reason: impl Into<String>) -> Self {
        Self::InvalidDevice {
            field: field.into(),
            reason: reason.into(),
        }
    }
}
