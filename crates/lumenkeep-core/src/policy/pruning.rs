// ── Pruning policy ──
//
// Runs once per restart over every accessory restored from the registry,
// after reconciliation has reset the ones that were seen. First matching
// rule wins:
//
//   1. "delete" anywhere in the display name
//   2. missing for too long (when enabled), or a reset of everything
//   3. still missing: removed if no longer allowed, otherwise kept and
//      re-persisted with its grown counter
//   4. seen this run: nothing to do

use tracing::{info, warn};
use uuid::Uuid;

use super::allow_list::AllowListPolicy;
use crate::cache::AccessoryCache;
use crate::config::RetentionPolicy;
use crate::model::Accessory;
use crate::reconcile::{RegistryEffect, RemovalReason};

/// What the sweep decided for one accessory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PruneDecision {
    Remove(RemovalReason),
    /// Not seen this run but kept; carries the current miss count.
    KeepUnseen { restarts_since_seen: u32 },
    Keep,
}

/// Pure precedence evaluation for a single accessory.
pub fn decide(
    accessory: &Accessory,
    retention: &RetentionPolicy,
    allow_list: &AllowListPolicy,
) -> PruneDecision {
    let restarts = accessory.restarts_since_seen();

    if accessory.is_marked_for_deletion() {
        return PruneDecision::Remove(RemovalReason::DeleteRequested);
    }

    if retention.prune_all_accessories_next_restart {
        return PruneDecision::Remove(RemovalReason::ResetRequested);
    }
    // A threshold of 0 acts as 1: an accessory seen this run is never missing.
    if retention.prune_missing_cached_accessories
        && restarts >= retention.restarts_before_missing_accessories_pruned.max(1)
    {
        return PruneDecision::Remove(RemovalReason::MissingTooLong);
    }

    if restarts > 0 {
        if !allow_list.is_allowed(accessory.unique_id()) {
            return PruneDecision::Remove(RemovalReason::Disallowed);
        }
        return PruneDecision::KeepUnseen {
            restarts_since_seen: restarts,
        };
    }

    PruneDecision::Keep
}

/// Effects produced by one sweep.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SweepOutcome {
    /// Unregister and update effects, in cache order.
    pub effects: Vec<RegistryEffect>,
    /// Accessories kept although discovery did not report them.
    pub unseen: usize,
}

impl SweepOutcome {
    pub fn pruned(&self) -> usize {
        self.effects
            .iter()
            .filter(|e| matches!(e, RegistryEffect::Unregister { .. }))
            .count()
    }
}

/// Applies retention rules to a reconciled cache.
#[derive(Debug, Clone)]
pub struct PruningPolicy<'a> {
    retention: RetentionPolicy,
    allow_list: &'a AllowListPolicy,
}

impl<'a> PruningPolicy<'a> {
    pub fn new(retention: RetentionPolicy, allow_list: &'a AllowListPolicy) -> Self {
        Self {
            retention,
            allow_list,
        }
    }

    /// Sweep every restored accessory. Pruned entries leave the cache.
    ///
    /// Accessories registered during this run are not candidates: they were
    /// just created from a live device.
    pub fn sweep(&self, cache: &mut AccessoryCache) -> SweepOutcome {
        let decisions: Vec<(Uuid, PruneDecision)> = cache
            .restored()
            .map(|a| (a.uuid, decide(a, &self.retention, self.allow_list)))
            .collect();

        let mut outcome = SweepOutcome::default();
        for (uuid, decision) in decisions {
            match decision {
                PruneDecision::Remove(reason) => {
                    let Some(accessory) = cache.remove(&uuid) else {
                        continue;
                    };
                    info!(
                        name = %accessory.display_name(),
                        unique_id = %accessory.unique_id(),
                        %reason,
                        "removing accessory"
                    );
                    outcome
                        .effects
                        .push(RegistryEffect::Unregister { accessory, reason });
                }
                PruneDecision::KeepUnseen {
                    restarts_since_seen,
                } => {
                    let Some(accessory) = cache.get(&uuid) else {
                        continue;
                    };
                    self.warn_unseen(accessory, restarts_since_seen);
                    outcome.effects.push(RegistryEffect::Update(accessory.clone()));
                    outcome.unseen += 1;
                }
                PruneDecision::Keep => {}
            }
        }
        outcome
    }

    fn warn_unseen(&self, accessory: &Accessory, restarts: u32) {
        if self.retention.prune_missing_cached_accessories {
            let remaining = self
                .retention
                .restarts_before_missing_accessories_pruned
                .saturating_sub(restarts);
            warn!(
                name = %accessory.display_name(),
                unique_id = %accessory.unique_id(),
                restarts_since_seen = restarts,
                "accessory still not seen, will be pruned after {remaining} more restart(s)"
            );
        } else {
            warn!(
                name = %accessory.display_name(),
                unique_id = %accessory.unique_id(),
                restarts_since_seen = restarts,
                "accessory still not seen, pruning of missing accessories is disabled"
            );
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::config::AllowListSettings;
    use crate::model::{AccessoryContext, Device, StateSnapshot, UniqueId};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn accessory(id: &str, name: &str, restarts: u32) -> Accessory {
        let unique_id = UniqueId::new(id);
        let device = Device {
            unique_id: unique_id.clone(),
            ip_address: "10.0.0.5".parse().unwrap(),
            model_number: "AK001".into(),
            light_version: 1,
            light_version_modifier: 0x33,
            initial_state: StateSnapshot::default(),
        };
        let mut ctx = AccessoryContext::first_seen(name, device);
        ctx.restarts_since_seen = restarts;
        Accessory::new(unique_id.accessory_uuid(), ctx)
    }

    fn retention(prune_missing: bool, prune_all: bool, threshold: u32) -> RetentionPolicy {
        RetentionPolicy {
            prune_missing_cached_accessories: prune_missing,
            prune_all_accessories_next_restart: prune_all,
            restarts_before_missing_accessories_pruned: threshold,
        }
    }

    fn blacklist(ids: &[&str]) -> AllowListPolicy {
        AllowListPolicy::from_settings(&AllowListSettings {
            blacklisted_unique_ids: Some(json!(ids)),
            blacklist_or_whitelist: Some(json!("blacklist")),
        })
    }

    #[test]
    fn delete_marker_wins_over_everything() {
        let acc = accessory("A1", "Kitchen delete", 0);
        let decision = decide(&acc, &retention(false, false, 3), &AllowListPolicy::unrestricted());
        assert_eq!(decision, PruneDecision::Remove(RemovalReason::DeleteRequested));
    }

    #[test]
    fn missing_threshold_prunes_when_enabled() {
        let allow = AllowListPolicy::unrestricted();
        let r = retention(true, false, 3);
        assert_eq!(
            decide(&accessory("A1", "Lamp", 2), &r, &allow),
            PruneDecision::KeepUnseen {
                restarts_since_seen: 2
            }
        );
        assert_eq!(
            decide(&accessory("A1", "Lamp", 3), &r, &allow),
            PruneDecision::Remove(RemovalReason::MissingTooLong)
        );
    }

    #[test]
    fn zero_threshold_never_prunes_seen_accessories() {
        let policy = retention(true, false, 0);
        let allow = AllowListPolicy::unrestricted();
        assert_eq!(
            decide(&accessory("A1", "Porch", 0), &policy, &allow),
            PruneDecision::Keep
        );
        assert_eq!(
            decide(&accessory("A1", "Porch", 1), &policy, &allow),
            PruneDecision::Remove(RemovalReason::MissingTooLong)
        );
    }

    #[test]
    fn missing_threshold_ignored_when_disabled() {
        let decision = decide(
            &accessory("A1", "Lamp", 40),
            &retention(false, false, 3),
            &AllowListPolicy::unrestricted(),
        );
        assert_eq!(
            decision,
            PruneDecision::KeepUnseen {
                restarts_since_seen: 40
            }
        );
    }

    #[test]
    fn reset_prunes_seen_accessories_too() {
        let decision = decide(
            &accessory("A1", "Lamp", 0),
            &retention(false, true, 3),
            &AllowListPolicy::unrestricted(),
        );
        assert_eq!(decision, PruneDecision::Remove(RemovalReason::ResetRequested));
    }

    #[test]
    fn unseen_and_disallowed_is_pruned() {
        let decision = decide(&accessory("A1", "Lamp", 1), &retention(false, false, 3), &blacklist(&["A1"]));
        assert_eq!(decision, PruneDecision::Remove(RemovalReason::Disallowed));
    }

    #[test]
    fn seen_accessory_is_left_alone() {
        let decision = decide(&accessory("A1", "Lamp", 0), &retention(true, false, 3), &blacklist(&["A1"]));
        assert_eq!(decision, PruneDecision::Keep);
    }

    #[test]
    fn sweep_removes_pruned_and_updates_unseen() {
        let mut cache = AccessoryCache::restore([
            accessory("A1", "Desk delete", 0),
            accessory("B2", "Hall", 0),
            accessory("C3", "Porch", 2),
        ]);
        let allow = AllowListPolicy::unrestricted();
        let policy = PruningPolicy::new(retention(true, false, 3), &allow);

        let outcome = policy.sweep(&mut cache);

        assert_eq!(outcome.pruned(), 2);
        assert_eq!(outcome.unseen, 1);
        let kinds: Vec<&str> = outcome.effects.iter().map(RegistryEffect::kind).collect();
        assert_eq!(kinds, vec!["unregister", "update", "unregister"]);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.iter().next().unwrap().display_name(), "Hall");
    }
}
