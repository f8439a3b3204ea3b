// ── Run summary ──

use std::fmt;

use serde::Serialize;

use crate::policy::SweepOutcome;
use crate::reconcile::{ReconciliationResult, RegistryEffect};

/// Counters for one completed run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    /// Accessories registered after this run (new + cached-seen).
    pub registered: usize,
    /// Accessories registered for the first time.
    pub new: usize,
    /// Cached accessories that discovery reported again.
    pub cached_seen: usize,
    /// Cached accessories kept although discovery missed them.
    pub unseen: usize,
    /// Accessories unregistered, for any reason.
    pub pruned: usize,
    /// Devices or registry effects that failed.
    pub failed: usize,
}

impl RunSummary {
    pub(crate) fn collect(reconciled: &ReconciliationResult, swept: &SweepOutcome) -> Self {
        let disallowed = reconciled
            .effects
            .iter()
            .filter(|e| matches!(e, RegistryEffect::Unregister { .. }))
            .count();
        Self {
            registered: reconciled.registered,
            new: reconciled.new,
            cached_seen: reconciled.cached_seen(),
            unseen: swept.unseen,
            pruned: swept.pruned() + disallowed,
            failed: reconciled.failed,
        }
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Registered:           {}", self.registered)?;
        writeln!(f, "  new:                {}", self.new)?;
        writeln!(f, "  cached, seen:       {}", self.cached_seen)?;
        writeln!(f, "Cached, not seen:     {}", self.unseen)?;
        writeln!(f, "Pruned:               {}", self.pruned)?;
        write!(f, "Failed:               {}", self.failed)
    }
}
