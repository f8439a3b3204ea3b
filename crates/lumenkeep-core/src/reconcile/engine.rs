// ── Reconciliation engine ──
//
// Three-way merge between this scan's devices and the run's cache.
// Identity (the accessory UUID derived from `uniqueId`) is authoritative;
// addresses are only a cached hint and get corrected when they drift.

use std::net::IpAddr;
use std::time::Duration;

use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::effect::{RegistryEffect, RemovalReason};
use crate::cache::AccessoryCache;
use crate::error::CoreError;
use crate::host::{AccessoryAdapter, AccessoryRegistry, DeviceTransport};
use crate::model::{Accessory, AccessoryContext, Device, StateSnapshot};
use crate::policy::AllowListPolicy;

/// A cached accessory reappeared at a different address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddressDrift {
    pub old: IpAddr,
    pub new: IpAddr,
}

/// How a discovered device relates to the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    New { uuid: Uuid },
    Seen { uuid: Uuid, drift: Option<AddressDrift> },
}

/// Pure identity match of one device against the cache.
pub fn classify(device: &Device, cache: &AccessoryCache) -> Classification {
    let uuid = device.accessory_uuid();
    match cache.get(&uuid) {
        None => Classification::New { uuid },
        Some(existing) => {
            let old = existing.context.cached_ip_address;
            let drift = (old != device.ip_address).then_some(AddressDrift {
                old,
                new: device.ip_address,
            });
            Classification::Seen { uuid, drift }
        }
    }
}

/// Effects and counters from reconciling one scan.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReconciliationResult {
    /// Effects in discovery order.
    pub effects: Vec<RegistryEffect>,
    /// Devices that are registered after this run (new + cached-seen).
    pub registered: usize,
    /// Devices registered for the first time.
    pub new: usize,
    /// New devices skipped by the allow list.
    pub rejected: usize,
    /// Devices whose processing failed.
    pub failed: usize,
}

impl ReconciliationResult {
    /// Cached accessories that discovery reported again.
    pub fn cached_seen(&self) -> usize {
        self.registered.saturating_sub(self.new)
    }
}

/// Per-device outcome before it is folded into the result.
enum Outcome {
    Registered(Accessory),
    /// Identity matched; the refreshed context is committed even when
    /// attaching handlers failed.
    Updated {
        accessory: Accessory,
        attach_error: Option<CoreError>,
    },
    Removed(Accessory),
    Rejected,
}

/// Folds discovered devices into the cache one at a time.
pub struct ReconciliationEngine<'a> {
    transport: &'a dyn DeviceTransport,
    registry: &'a dyn AccessoryRegistry,
    adapter: &'a dyn AccessoryAdapter,
    allow_list: &'a AllowListPolicy,
    state_timeout: Duration,
}

impl<'a> ReconciliationEngine<'a> {
    pub fn new(
        transport: &'a dyn DeviceTransport,
        registry: &'a dyn AccessoryRegistry,
        adapter: &'a dyn AccessoryAdapter,
        allow_list: &'a AllowListPolicy,
        state_timeout: Duration,
    ) -> Self {
        Self {
            transport,
            registry,
            adapter,
            allow_list,
            state_timeout,
        }
    }

    /// Reconcile every discovered device, in order. A failing device is
    /// logged and skipped; the rest are still processed.
    pub async fn reconcile(
        &self,
        discovered: &[Device],
        cache: &mut AccessoryCache,
    ) -> ReconciliationResult {
        let mut result = ReconciliationResult::default();

        for device in discovered {
            match self.process(device, cache).await {
                Ok(Outcome::Registered(accessory)) => {
                    result.new += 1;
                    result.registered += 1;
                    result.effects.push(RegistryEffect::Register(accessory));
                }
                Ok(Outcome::Updated {
                    accessory,
                    attach_error,
                }) => {
                    if let Some(e) = attach_error {
                        result.failed += 1;
                        error!(
                            unique_id = %device.unique_id,
                            error = %e,
                            "failed to attach handlers, cached accessory still refreshed"
                        );
                    }
                    result.registered += 1;
                    result.effects.push(RegistryEffect::Update(accessory));
                }
                Ok(Outcome::Removed(accessory)) => {
                    result.effects.push(RegistryEffect::Unregister {
                        accessory,
                        reason: RemovalReason::Disallowed,
                    });
                }
                Ok(Outcome::Rejected) => result.rejected += 1,
                Err(e) => {
                    result.failed += 1;
                    error!(
                        unique_id = %device.unique_id,
                        ip = %device.ip_address,
                        error = %e,
                        "failed to reconcile device"
                    );
                }
            }
        }

        result
    }

    async fn process(
        &self,
        device: &Device,
        cache: &mut AccessoryCache,
    ) -> Result<Outcome, CoreError> {
        match classify(device, cache) {
            Classification::New { uuid } => self.register_new(device, uuid, cache).await,
            Classification::Seen { uuid, drift } => {
                self.refresh_existing(device, uuid, drift, cache)
            }
        }
    }

    async fn register_new(
        &self,
        device: &Device,
        uuid: Uuid,
        cache: &mut AccessoryCache,
    ) -> Result<Outcome, CoreError> {
        let state = self.query_state(device).await?;
        let profile = self.adapter.describe(device)?;

        let mut device = device.clone();
        device.initial_state = state;
        let context = AccessoryContext::first_seen(profile.display_name(&device), device);
        let accessory = self.registry.create(uuid, context);

        if !self.allow_list.is_allowed(accessory.unique_id()) {
            warn!(
                name = %accessory.display_name(),
                unique_id = %accessory.unique_id(),
                "new device is not allowed, skipping registration"
            );
            return Ok(Outcome::Rejected);
        }

        self.adapter.attach(&accessory)?;
        cache.insert_registered(accessory.clone());
        info!(
            name = %accessory.display_name(),
            unique_id = %accessory.unique_id(),
            ip = %accessory.context.cached_ip_address,
            "registering new accessory"
        );
        Ok(Outcome::Registered(accessory))
    }

    fn refresh_existing(
        &self,
        device: &Device,
        uuid: Uuid,
        drift: Option<AddressDrift>,
        cache: &mut AccessoryCache,
    ) -> Result<Outcome, CoreError> {
        let Some(existing) = cache.get_mut(&uuid) else {
            return Err(CoreError::Internal(format!(
                "accessory {uuid} vanished from the cache mid-run"
            )));
        };

        existing.context.restarts_since_seen = 0;

        if let Some(AddressDrift { old, new }) = drift {
            warn!(
                name = %existing.display_name(),
                unique_id = %device.unique_id,
                old_ip = %old,
                new_ip = %new,
                "accessory changed address, updating cache"
            );
            existing.context.cached_ip_address = new;
        }
        refresh_device(&mut existing.context.device, device);

        if !self.allow_list.is_allowed(existing.unique_id()) {
            warn!(
                name = %existing.display_name(),
                unique_id = %existing.unique_id(),
                "cached accessory is not allowed, removing"
            );
            let removed = cache.remove(&uuid).ok_or_else(|| {
                CoreError::Internal(format!("accessory {uuid} vanished from the cache mid-run"))
            })?;
            return Ok(Outcome::Removed(removed));
        }

        debug!(name = %existing.display_name(), "cached accessory seen again");
        Ok(Outcome::Updated {
            attach_error: self.adapter.attach(existing).err(),
            accessory: existing.clone(),
        })
    }

    async fn query_state(&self, device: &Device) -> Result<StateSnapshot, CoreError> {
        let timeout = self.state_timeout;
        match tokio::time::timeout(timeout, self.transport.get_state(device, timeout)).await {
            Ok(state) => state,
            Err(_) => Err(CoreError::Timeout {
                operation: format!("state query for {}", device.ip_address),
                timeout_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
            }),
        }
    }
}

/// Take the latest descriptor while keeping the identity and any state
/// snapshot the new reply didn't carry.
fn refresh_device(cached: &mut Device, discovered: &Device) {
    let state = std::mem::take(&mut cached.initial_state);
    *cached = discovered.clone();
    if cached.initial_state.is_empty() {
        cached.initial_state = state;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::config::AllowListSettings;
    use crate::model::UniqueId;
    use crate::profile::{LightProfile, ProfileAdapter};
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    struct FixedTransport;

    #[async_trait]
    impl DeviceTransport for FixedTransport {
        async fn get_state(
            &self,
            device: &Device,
            _timeout: Duration,
        ) -> Result<StateSnapshot, CoreError> {
            if device.unique_id.as_str() == "DEAD01" {
                return Err(CoreError::Transport {
                    address: device.ip_address.to_string(),
                    reason: "connection refused".into(),
                });
            }
            Ok(StateSnapshot(json!({ "on": true })))
        }
    }

    /// Never answers a state query for `HANG01`.
    struct HangingTransport;

    #[async_trait]
    impl DeviceTransport for HangingTransport {
        async fn get_state(
            &self,
            device: &Device,
            timeout: Duration,
        ) -> Result<StateSnapshot, CoreError> {
            if device.unique_id.as_str() == "HANG01" {
                std::future::pending::<()>().await;
            }
            FixedTransport.get_state(device, timeout).await
        }
    }

    /// Describes devices but can never attach handlers.
    struct BrokenAdapter;

    impl AccessoryAdapter for BrokenAdapter {
        fn describe(&self, device: &Device) -> Result<LightProfile, CoreError> {
            ProfileAdapter.describe(device)
        }

        fn attach(&self, _accessory: &Accessory) -> Result<(), CoreError> {
            Err(CoreError::Adapter {
                message: "characteristic handlers unavailable".into(),
            })
        }
    }

    struct NullRegistry;

    #[async_trait]
    impl AccessoryRegistry for NullRegistry {
        async fn restore(&self) -> Result<Vec<Accessory>, CoreError> {
            Ok(Vec::new())
        }
        async fn register(&self, _: &[Accessory]) -> Result<(), CoreError> {
            Ok(())
        }
        async fn update(&self, _: &[Accessory]) -> Result<(), CoreError> {
            Ok(())
        }
        async fn unregister(&self, _: &[Accessory]) -> Result<(), CoreError> {
            Ok(())
        }
    }

    fn device(id: &str, ip: &str) -> Device {
        Device {
            unique_id: UniqueId::new(id),
            ip_address: ip.parse().unwrap(),
            model_number: "AK001".into(),
            light_version: 1,
            light_version_modifier: 0x33,
            initial_state: StateSnapshot::default(),
        }
    }

    fn cached(id: &str, ip: &str) -> Accessory {
        let device = device(id, ip);
        Accessory::new(
            device.accessory_uuid(),
            AccessoryContext::first_seen(format!("Strip {id}"), device),
        )
    }

    async fn reconcile(
        allow_list: &AllowListPolicy,
        discovered: &[Device],
        cache: &mut AccessoryCache,
    ) -> ReconciliationResult {
        reconcile_with(&FixedTransport, &ProfileAdapter, allow_list, discovered, cache).await
    }

    async fn reconcile_with(
        transport: &dyn DeviceTransport,
        adapter: &dyn AccessoryAdapter,
        allow_list: &AllowListPolicy,
        discovered: &[Device],
        cache: &mut AccessoryCache,
    ) -> ReconciliationResult {
        let engine = ReconciliationEngine::new(
            transport,
            &NullRegistry,
            adapter,
            allow_list,
            Duration::from_millis(1000),
        );
        engine.reconcile(discovered, cache).await
    }

    #[test]
    fn classify_detects_new_and_drift() {
        let cache = AccessoryCache::restore([cached("A1", "10.0.0.5")]);

        assert_eq!(
            classify(&device("B2", "10.0.0.7"), &cache),
            Classification::New {
                uuid: UniqueId::new("B2").accessory_uuid()
            }
        );
        assert_eq!(
            classify(&device("A1", "10.0.0.9"), &cache),
            Classification::Seen {
                uuid: UniqueId::new("A1").accessory_uuid(),
                drift: Some(AddressDrift {
                    old: "10.0.0.5".parse().unwrap(),
                    new: "10.0.0.9".parse().unwrap(),
                }),
            }
        );
        assert!(matches!(
            classify(&device("A1", "10.0.0.5"), &cache),
            Classification::Seen { drift: None, .. }
        ));
    }

    #[tokio::test]
    async fn new_device_is_registered_with_state() {
        let mut cache = AccessoryCache::new();
        let result = reconcile(
            &AllowListPolicy::unrestricted(),
            &[device("A1", "1.1.1.1")],
            &mut cache,
        )
        .await;

        assert_eq!((result.registered, result.new, result.cached_seen()), (1, 1, 0));
        let accessory = cache.get(&UniqueId::new("A1").accessory_uuid()).unwrap();
        assert_eq!(accessory.display_name(), "RGB Strip A1");
        assert_eq!(accessory.context.device.initial_state, StateSnapshot(json!({ "on": true })));
        assert!(cache.is_fresh(&accessory.uuid));
    }

    #[tokio::test]
    async fn address_drift_updates_cache_without_duplicates() {
        let mut cache = AccessoryCache::restore([cached("A1", "10.0.0.5")]);
        let result = reconcile(
            &AllowListPolicy::unrestricted(),
            &[device("A1", "10.0.0.9")],
            &mut cache,
        )
        .await;

        assert_eq!(cache.len(), 1);
        assert_eq!((result.registered, result.new), (1, 0));
        let accessory = cache.iter().next().unwrap();
        assert_eq!(accessory.context.cached_ip_address.to_string(), "10.0.0.9");
        assert_eq!(accessory.restarts_since_seen(), 0);
        assert!(matches!(&result.effects[..], [RegistryEffect::Update(a)] if a.uuid == accessory.uuid));
    }

    #[tokio::test]
    async fn unreachable_device_does_not_block_others() {
        let mut cache = AccessoryCache::new();
        let result = reconcile(
            &AllowListPolicy::unrestricted(),
            &[device("DEAD01", "1.1.1.1"), device("B2", "1.1.1.2")],
            &mut cache,
        )
        .await;

        assert_eq!(result.failed, 1);
        assert_eq!(result.new, 1);
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn disallowed_new_device_is_skipped_quietly() {
        let allow_list = AllowListPolicy::from_settings(&AllowListSettings {
            blacklisted_unique_ids: Some(json!(["A1"])),
            blacklist_or_whitelist: Some(json!("blacklist")),
        });
        let mut cache = AccessoryCache::new();
        let result = reconcile(&allow_list, &[device("A1", "1.1.1.1")], &mut cache).await;

        assert!(result.effects.is_empty());
        assert_eq!(result.rejected, 1);
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn disallowed_cached_accessory_is_unregistered() {
        let allow_list = AllowListPolicy::from_settings(&AllowListSettings {
            blacklisted_unique_ids: Some(json!(["B2"])),
            blacklist_or_whitelist: Some(json!("whitelist")),
        });
        let mut cache = AccessoryCache::restore([cached("A1", "10.0.0.5")]);
        let result = reconcile(&allow_list, &[device("A1", "10.0.0.5")], &mut cache).await;

        assert_eq!(result.registered, 0);
        assert!(matches!(
            &result.effects[..],
            [RegistryEffect::Unregister { reason: RemovalReason::Disallowed, .. }]
        ));
        assert!(cache.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn hung_state_query_times_out_and_next_device_registers() {
        let mut cache = AccessoryCache::new();
        let result = reconcile_with(
            &HangingTransport,
            &ProfileAdapter,
            &AllowListPolicy::unrestricted(),
            &[device("HANG01", "1.1.1.1"), device("B2", "1.1.1.2")],
            &mut cache,
        )
        .await;

        assert_eq!(result.failed, 1);
        assert_eq!(result.new, 1);
        assert!(cache.get(&UniqueId::new("B2").accessory_uuid()).is_some());
        assert!(cache.get(&UniqueId::new("HANG01").accessory_uuid()).is_none());
    }

    #[tokio::test]
    async fn attach_failure_still_commits_identity_match() {
        let mut stale = cached("A1", "10.0.0.5");
        stale.context.restarts_since_seen = 2;
        let mut cache = AccessoryCache::restore([stale]);

        let result = reconcile_with(
            &FixedTransport,
            &BrokenAdapter,
            &AllowListPolicy::unrestricted(),
            &[device("A1", "10.0.0.9")],
            &mut cache,
        )
        .await;

        assert_eq!((result.registered, result.failed), (1, 1));
        let [RegistryEffect::Update(updated)] = &result.effects[..] else {
            panic!("expected one update, got {:?}", result.effects);
        };
        assert_eq!(updated.context.cached_ip_address.to_string(), "10.0.0.9");
        assert_eq!(updated.restarts_since_seen(), 0);
        assert_eq!(cache.iter().next().unwrap(), updated);
    }
}
