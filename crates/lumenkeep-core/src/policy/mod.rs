// ── Policies ──
//
// Pure decision logic: who may be registered, and what gets pruned.

pub mod allow_list;
pub mod pruning;

pub use allow_list::{AllowListConfig, AllowListMode, AllowListPolicy};
pub use pruning::{PruneDecision, PruningPolicy, SweepOutcome};
