// ── Scan coordination ──
//
// Lights on flaky Wi-Fi often miss the first probe, so an empty scan is
// retried straight away until something answers or the budget runs out.
// Replies are validated here; nothing downstream sees a raw descriptor.

use std::collections::HashSet;
use std::time::Duration;

use tracing::{info, warn};

use crate::config::ScanPolicy;
use crate::host::Discovery;
use crate::model::{Device, DeviceDescriptor};

/// Extra time allowed past the probe window before a hung probe is abandoned.
const PROBE_GRACE: Duration = Duration::from_millis(500);

/// Retries discovery until at least one device answers.
pub struct ScanCoordinator<'a> {
    discovery: &'a dyn Discovery,
}

impl<'a> ScanCoordinator<'a> {
    pub fn new(discovery: &'a dyn Discovery) -> Self {
        Self { discovery }
    }

    /// Probe up to `max_attempts` times (at least once). Returns the last
    /// attempt's devices; an empty list means nothing is reachable right now.
    pub async fn scan(&self, timeout: Duration, max_attempts: u32) -> Vec<Device> {
        let max_attempts = max_attempts.max(1);
        let mut devices = Vec::new();

        for attempt in 1..=max_attempts {
            match self.probe(timeout).await {
                Ok(found) if !found.is_empty() => {
                    devices = found;
                    break;
                }
                Ok(_) => warn!(attempt, max_attempts, "scan found zero devices"),
                Err(reason) => {
                    warn!(attempt, max_attempts, %reason, "scan found zero devices");
                }
            }
        }

        if devices.is_empty() {
            info!(
                count = 0,
                "discovery complete, check that the lights are powered and on the same subnet"
            );
        } else {
            info!(count = devices.len(), "discovery complete");
        }
        devices
    }

    /// Convenience wrapper taking the configured policy.
    pub async fn scan_with(&self, policy: &ScanPolicy) -> Vec<Device> {
        self.scan(policy.timeout, policy.max_attempts).await
    }

    /// One discovery round. `Err` carries why the round produced nothing.
    async fn probe(&self, timeout: Duration) -> Result<Vec<Device>, String> {
        match tokio::time::timeout(timeout + PROBE_GRACE, self.discovery.scan(timeout)).await {
            Ok(Ok(descriptors)) => Ok(validate(descriptors)),
            Ok(Err(e)) => Err(e.to_string()),
            Err(_) => Err(format!("no reply within {}ms", (timeout + PROBE_GRACE).as_millis())),
        }
    }
}

/// Drop descriptors that fail validation or repeat an identity already seen.
fn validate(descriptors: Vec<DeviceDescriptor>) -> Vec<Device> {
    let mut seen = HashSet::new();
    let mut devices = Vec::with_capacity(descriptors.len());

    for raw in descriptors {
        match Device::try_from(raw) {
            Ok(device) => {
                if seen.insert(device.unique_id.clone()) {
                    devices.push(device);
                } else {
                    warn!(unique_id = %device.unique_id, "ignoring duplicate discovery reply");
                }
            }
            Err(e) => warn!(error = %e, "ignoring malformed discovery reply"),
        }
    }
    devices
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::error::CoreError;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use tracing::{Event, Level, Subscriber};
    use tracing_subscriber::layer::{Context, Layer, SubscriberExt};

    /// Returns queued replies one probe at a time, then empty lists.
    #[derive(Default)]
    struct ScriptedDiscovery {
        calls: AtomicU32,
        replies: Mutex<Vec<Result<Vec<DeviceDescriptor>, CoreError>>>,
    }

    impl ScriptedDiscovery {
        fn with(replies: Vec<Result<Vec<DeviceDescriptor>, CoreError>>) -> Self {
            Self {
                calls: AtomicU32::new(0),
                replies: Mutex::new(replies.into_iter().rev().collect()),
            }
        }
    }

    #[async_trait]
    impl Discovery for ScriptedDiscovery {
        async fn scan(&self, _timeout: Duration) -> Result<Vec<DeviceDescriptor>, CoreError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.replies.lock().unwrap().pop().unwrap_or_else(|| Ok(Vec::new()))
        }
    }

    /// Never answers; every probe runs into the grace deadline.
    #[derive(Default)]
    struct SilentDiscovery {
        calls: AtomicU32,
    }

    #[async_trait]
    impl Discovery for SilentDiscovery {
        async fn scan(&self, _timeout: Duration) -> Result<Vec<DeviceDescriptor>, CoreError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            std::future::pending().await
        }
    }

    /// Counts WARN events emitted while installed.
    #[derive(Clone, Default)]
    struct WarnCounter(Arc<AtomicUsize>);

    impl<S: Subscriber> Layer<S> for WarnCounter {
        fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
            if *event.metadata().level() == Level::WARN {
                self.0.fetch_add(1, Ordering::SeqCst);
            }
        }
    }

    fn discovery_error() -> Result<Vec<DeviceDescriptor>, CoreError> {
        Err(CoreError::Discovery {
            reason: "network unreachable".into(),
        })
    }

    fn descriptor(id: &str, ip: &str) -> DeviceDescriptor {
        DeviceDescriptor {
            unique_id: Some(id.into()),
            ip_address: Some(ip.into()),
            model_number: Some("AK001".into()),
            light_version: Some(1),
            light_version_modifier: Some(0x33),
            initial_state: None,
        }
    }

    #[tokio::test]
    async fn always_empty_stops_after_five_attempts() {
        let discovery = ScriptedDiscovery::default();
        let devices = ScanCoordinator::new(&discovery)
            .scan(Duration::from_millis(10), 5)
            .await;
        assert!(devices.is_empty());
        assert_eq!(discovery.calls.load(Ordering::SeqCst), 5);
    }

    #[tokio::test]
    async fn stops_at_first_non_empty_attempt() {
        let discovery = ScriptedDiscovery::with(vec![
            Ok(Vec::new()),
            Ok(vec![descriptor("A1", "1.1.1.1")]),
        ]);
        let devices = ScanCoordinator::new(&discovery)
            .scan(Duration::from_millis(10), 5)
            .await;
        assert_eq!(devices.len(), 1);
        assert_eq!(discovery.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn probe_errors_count_as_empty_attempts() {
        let discovery =
            ScriptedDiscovery::with(vec![discovery_error(), Ok(vec![descriptor("A1", "1.1.1.1")])]);
        let devices = ScanCoordinator::new(&discovery)
            .scan(Duration::from_millis(10), 5)
            .await;
        assert_eq!(devices.len(), 1);
    }

    #[tokio::test]
    async fn zero_budget_still_probes_once() {
        let discovery = ScriptedDiscovery::default();
        ScanCoordinator::new(&discovery)
            .scan(Duration::from_millis(10), 0)
            .await;
        assert_eq!(discovery.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn validation_drops_malformed_and_duplicate_replies() {
        let mut broken = descriptor("B2", "1.1.1.2");
        broken.ip_address = None;
        let devices = validate(vec![
            descriptor("A1", "1.1.1.1"),
            broken,
            descriptor("a1", "1.1.1.9"),
        ]);
        assert_eq!(devices.len(), 1);
        assert_eq!(devices[0].ip_address.to_string(), "1.1.1.1");
    }

    #[tokio::test(start_paused = true)]
    async fn hung_probes_are_abandoned_and_retried() {
        let discovery = SilentDiscovery::default();
        let devices = ScanCoordinator::new(&discovery)
            .scan(Duration::from_secs(5), 5)
            .await;
        assert!(devices.is_empty());
        assert_eq!(discovery.calls.load(Ordering::SeqCst), 5);
    }

    #[tokio::test]
    async fn one_warning_per_empty_attempt() {
        let warnings = WarnCounter::default();
        let _guard =
            tracing::subscriber::set_default(tracing_subscriber::registry().with(warnings.clone()));

        let empty = ScriptedDiscovery::default();
        ScanCoordinator::new(&empty)
            .scan(Duration::from_millis(10), 5)
            .await;
        assert_eq!(warnings.0.load(Ordering::SeqCst), 5);

        let failing = ScriptedDiscovery::with((0..5).map(|_| discovery_error()).collect());
        ScanCoordinator::new(&failing)
            .scan(Duration::from_millis(10), 5)
            .await;
        assert_eq!(warnings.0.load(Ordering::SeqCst), 10);
    }
}
