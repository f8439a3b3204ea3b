// ── Reconciliation ──
//
// Folds one scan's devices into the run's accessory cache.

mod effect;
mod engine;

pub use effect::{RegistryEffect, RemovalReason};
pub use engine::{AddressDrift, Classification, ReconciliationEngine, ReconciliationResult, classify};
