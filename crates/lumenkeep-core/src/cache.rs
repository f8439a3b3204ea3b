// ── Run-scoped accessory cache ──
//
// Owned by exactly one run. Built from the registry's restore hook,
// mutated by reconciliation, then swept by the pruning policy. Insertion
// order is kept so effects and listings stay deterministic.

use std::collections::HashSet;

use indexmap::IndexMap;
use uuid::Uuid;

use crate::model::Accessory;

/// Accessories known to the current run, keyed by UUID.
#[derive(Debug, Clone, Default)]
pub struct AccessoryCache {
    entries: IndexMap<Uuid, Accessory>,
    /// Registered during this run rather than restored from the registry.
    fresh: HashSet<Uuid>,
}

impl AccessoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the cache from persisted accessories, counting this run as one
    /// more restart for each of them.
    pub fn restore(accessories: impl IntoIterator<Item = Accessory>) -> Self {
        let mut cache = Self::new();
        for accessory in accessories {
            cache.restore_one(accessory);
        }
        cache
    }

    /// Restore hook for a single persisted accessory.
    pub fn restore_one(&mut self, mut accessory: Accessory) {
        let ctx = &mut accessory.context;
        ctx.restarts_since_seen = ctx.restarts_since_seen.saturating_add(1);
        self.entries.insert(accessory.uuid, accessory);
    }

    /// Add an accessory registered during this run.
    pub(crate) fn insert_registered(&mut self, accessory: Accessory) {
        self.fresh.insert(accessory.uuid);
        self.entries.insert(accessory.uuid, accessory);
    }

    pub fn get(&self, uuid: &Uuid) -> Option<&Accessory> {
        self.entries.get(uuid)
    }

    pub(crate) fn get_mut(&mut self, uuid: &Uuid) -> Option<&mut Accessory> {
        self.entries.get_mut(uuid)
    }

    /// Remove an accessory, keeping the order of the rest.
    pub(crate) fn remove(&mut self, uuid: &Uuid) -> Option<Accessory> {
        self.fresh.remove(uuid);
        self.entries.shift_remove(uuid)
    }

    pub fn is_fresh(&self, uuid: &Uuid) -> bool {
        self.fresh.contains(uuid)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Accessory> {
        self.entries.values()
    }

    /// Accessories that came from the registry at startup.
    pub fn restored(&self) -> impl Iterator<Item = &Accessory> {
        self.entries.values().filter(|a| !self.fresh.contains(&a.uuid))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::model::{AccessoryContext, Device, StateSnapshot, UniqueId};

    fn accessory(id: &str, restarts: u32) -> Accessory {
        let unique_id = UniqueId::new(id);
        let device = Device {
            unique_id: unique_id.clone(),
            ip_address: "10.0.0.5".parse().unwrap(),
            model_number: "AK001".into(),
            light_version: 1,
            light_version_modifier: 0x33,
            initial_state: StateSnapshot::default(),
        };
        let mut ctx = AccessoryContext::first_seen(id, device);
        ctx.restarts_since_seen = restarts;
        Accessory::new(unique_id.accessory_uuid(), ctx)
    }

    #[test]
    fn restore_increments_each_accessory_once() {
        let cache = AccessoryCache::restore([accessory("A1", 0), accessory("B2", 4)]);
        let counts: Vec<u32> = cache.iter().map(Accessory::restarts_since_seen).collect();
        assert_eq!(counts, vec![1, 5]);
    }

    #[test]
    fn registered_accessories_are_not_restored() {
        let mut cache = AccessoryCache::restore([accessory("A1", 0)]);
        let fresh = accessory("B2", 0);
        let uuid = fresh.uuid;
        cache.insert_registered(fresh);

        assert!(cache.is_fresh(&uuid));
        assert_eq!(cache.restored().count(), 1);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn remove_keeps_order() {
        let mut cache =
            AccessoryCache::restore([accessory("A1", 0), accessory("B2", 0), accessory("C3", 0)]);
        cache.remove(&UniqueId::new("B2").accessory_uuid());
        let names: Vec<&str> = cache.iter().map(Accessory::display_name).collect();
        assert_eq!(names, vec!["A1", "C3"]);
    }
}
