// ── Platform ──
//
// One process restart: restore the registry into a run-scoped cache,
// scan, reconcile, apply effects, sweep, apply again, summarize. Every
// collaborator is a trait object so the host decides what's wired in.

use std::sync::Arc;

use tracing::{debug, error, info};

use crate::cache::AccessoryCache;
use crate::config::PlatformConfig;
use crate::error::CoreError;
use crate::host::{AccessoryAdapter, AccessoryRegistry, DeviceTransport, Discovery};
use crate::policy::{AllowListPolicy, PruningPolicy};
use crate::reconcile::{ReconciliationEngine, RegistryEffect};
use crate::report::RunSummary;
use crate::scan::ScanCoordinator;

/// The collaborators a platform talks to.
#[derive(Clone)]
pub struct Collaborators {
    pub discovery: Arc<dyn Discovery>,
    pub transport: Arc<dyn DeviceTransport>,
    pub registry: Arc<dyn AccessoryRegistry>,
    pub adapter: Arc<dyn AccessoryAdapter>,
}

/// Drives reconciliation runs against a set of collaborators.
pub struct Platform {
    config: PlatformConfig,
    allow_list: AllowListPolicy,
    host: Collaborators,
}

impl Platform {
    /// Build a platform. Allow-list settings are interpreted once here.
    pub fn new(config: PlatformConfig, host: Collaborators) -> Self {
        let allow_list = AllowListPolicy::from_settings(&config.allow_list);
        Self {
            config,
            allow_list,
            host,
        }
    }

    /// Restore hook: load persisted accessories into a fresh cache.
    pub async fn restore(&self) -> Result<AccessoryCache, CoreError> {
        let accessories = self.host.registry.restore().await?;
        debug!(count = accessories.len(), "restored cached accessories");
        Ok(AccessoryCache::restore(accessories))
    }

    /// Run one restart end to end. Only a failed restore is an error;
    /// everything after it is isolated per device or per effect.
    pub async fn run(&self) -> Result<RunSummary, CoreError> {
        let mut cache = self.restore().await?;
        Ok(self.run_with_cache(&mut cache).await)
    }

    /// Run against an already restored cache.
    pub async fn run_with_cache(&self, cache: &mut AccessoryCache) -> RunSummary {
        let devices = ScanCoordinator::new(self.host.discovery.as_ref())
            .scan_with(&self.config.scan)
            .await;

        let engine = ReconciliationEngine::new(
            self.host.transport.as_ref(),
            self.host.registry.as_ref(),
            self.host.adapter.as_ref(),
            &self.allow_list,
            self.config.state_timeout,
        );
        let reconciled = engine.reconcile(&devices, cache).await;
        let mut failed = self.apply(&reconciled.effects).await;

        let swept = PruningPolicy::new(self.config.retention, &self.allow_list).sweep(cache);
        failed += self.attach_unseen(&swept.effects);
        failed += self.apply(&swept.effects).await;

        let mut summary = RunSummary::collect(&reconciled, &swept);
        summary.failed += failed;
        info!(
            registered = summary.registered,
            new = summary.new,
            cached_seen = summary.cached_seen,
            unseen = summary.unseen,
            pruned = summary.pruned,
            failed = summary.failed,
            "run complete"
        );
        summary
    }

    /// Apply effects one at a time, in order. Returns how many failed.
    async fn apply(&self, effects: &[RegistryEffect]) -> usize {
        let registry = self.host.registry.as_ref();
        let mut failed = 0;

        for effect in effects {
            let batch = std::slice::from_ref(effect.accessory());
            let applied = match effect {
                RegistryEffect::Register(_) => registry.register(batch).await,
                RegistryEffect::Update(_) => registry.update(batch).await,
                RegistryEffect::Unregister { .. } => registry.unregister(batch).await,
            };
            match applied {
                Ok(()) => debug!(
                    kind = effect.kind(),
                    name = %effect.accessory().display_name(),
                    "applied registry effect"
                ),
                Err(e) => {
                    failed += 1;
                    error!(
                        kind = effect.kind(),
                        name = %effect.accessory().display_name(),
                        error = %e,
                        "failed to apply registry effect"
                    );
                }
            }
        }
        failed
    }

    /// Kept-but-unseen accessories still get handlers attached.
    fn attach_unseen(&self, effects: &[RegistryEffect]) -> usize {
        let mut failed = 0;
        for effect in effects {
            let RegistryEffect::Update(accessory) = effect else {
                continue;
            };
            if let Err(e) = self.host.adapter.attach(accessory) {
                failed += 1;
                error!(
                    name = %accessory.display_name(),
                    error = %e,
                    "failed to attach handlers"
                );
            }
        }
        failed
    }
}
