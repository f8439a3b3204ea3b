// ── Registry effects ──
//
// Decisions are data. The engine and the pruning sweep produce effects;
// only the platform applies them to the registry, in order.

use serde::Serialize;
use strum::Display;

use crate::model::Accessory;

/// Why an accessory is being removed from the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
#[serde(rename_all = "snake_case")]
pub enum RemovalReason {
    #[strum(to_string = "marked for deletion")]
    DeleteRequested,
    #[strum(to_string = "missing too long")]
    MissingTooLong,
    #[strum(to_string = "reset requested")]
    ResetRequested,
    #[strum(to_string = "not allowed")]
    Disallowed,
}

/// One change to apply to the accessory registry.
#[derive(Debug, Clone, PartialEq)]
pub enum RegistryEffect {
    Register(Accessory),
    Update(Accessory),
    Unregister {
        accessory: Accessory,
        reason: RemovalReason,
    },
}

impl RegistryEffect {
    pub fn accessory(&self) -> &Accessory {
        match self {
            Self::Register(a) | Self::Update(a) | Self::Unregister { accessory: a, .. } => a,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Register(_) => "register",
            Self::Update(_) => "update",
            Self::Unregister { .. } => "unregister",
        }
    }
}
