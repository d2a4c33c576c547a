//! Station Poller Implementation

use crate::decode::decode_register;
use alert_core::{AlertEvent, DeviceId, SharedTracker};
use modbus_rtu::RegisterReader;
use notifier::{dispatch, Notify};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Input register holding each controller's error code
pub const STATUS_REGISTER: u16 = 0;

/// Configuration for the station poller
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollerConfig {
    /// Modbus station ids to poll, one per chiller
    pub stations: Vec<u8>,
    /// Seconds between polling cycles (default: 10)
    pub interval_secs: u64,
    /// Consecutive failed reads before a station is reported unreachable
    pub unreachable_after: u32,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            stations: vec![1, 2, 3],
            interval_secs: 10,
            unreachable_after: 3,
        }
    }
}

impl PollerConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

/// Polls every configured station once per interval
pub struct StationPoller<R> {
    config: PollerConfig,
    reader: R,
    tracker: SharedTracker,
    notifier: Arc<dyn Notify>,
    /// Consecutive read failures per station
    failures: HashMap<u8, u32>,
}

impl<R: RegisterReader> StationPoller<R> {
    pub fn new(
        config: PollerConfig,
        reader: R,
        tracker: SharedTracker,
        notifier: Arc<dyn Notify>,
    ) -> Self {
        info!(
            "Station poller created for stations {:?} every {}s",
            config.stations, config.interval_secs
        );
        Self {
            config,
            reader,
            tracker,
            notifier,
            failures: HashMap::new(),
        }
    }

    /// Read every station once and return the events emitted.
    ///
    /// A failed read skips that station for this cycle only.
    pub async fn poll_once(&mut self) -> Vec<AlertEvent> {
        let mut events = Vec::new();

        for station in self.config.stations.clone() {
            let value = match self.reader.read_input_register(station, STATUS_REGISTER).await {
                Ok(value) => {
                    self.failures.remove(&station);
                    value
                }
                Err(e) => {
                    let failures = self.failures.entry(station).or_insert(0);
                    *failures += 1;
                    warn!("Failed to read chiller {} (attempt {}): {}", station, failures, e);
                    if *failures == self.config.unreachable_after {
                        warn!("Chiller {} unreachable after {} attempts", station, failures);
                    }
                    continue;
                }
            };

            debug!("Chiller {} status register = {}", station, value);
            let status = decode_register(value);
            if let Some(event) =
                dispatch(&self.tracker, self.notifier.as_ref(), DeviceId::Station(station), status).await
            {
                events.push(event);
            }
        }

        events
    }

    /// Poll until cancelled, then close the bus
    pub async fn run(&mut self, cancel: CancellationToken) {
        info!("Starting station poller");
        let interval = self.config.interval();

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = self.poll_once() => {}
            }

            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(interval) => {}
            }
        }

        self.reader.disconnect().await;
        info!("Station poller stopped");
    }

    /// Consecutive failed reads for a station
    pub fn failure_count(&self, station: u8) -> u32 {
        self.failures.get(&station).copied().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alert_core::{AlertKind, ErrorValue};
    use async_trait::async_trait;
    use modbus_rtu::MockRegisterReader;
    use notifier::NotifyError;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingNotifier {
        delivered: Mutex<Vec<(DeviceId, AlertKind)>>,
    }

    #[async_trait]
    impl Notify for RecordingNotifier {
        async fn deliver(&self, event: &AlertEvent) -> Result<(), NotifyError> {
            self.delivered.lock().unwrap().push((event.device, event.kind));
            Ok(())
        }
    }

    fn poller(
        stations: Vec<u8>,
        reader: MockRegisterReader,
    ) -> (StationPoller<MockRegisterReader>, SharedTracker, Arc<RecordingNotifier>) {
        let tracker = SharedTracker::new();
        let notifier = Arc::new(RecordingNotifier::default());
        let config = PollerConfig {
            stations,
            ..Default::default()
        };
        let poller = StationPoller::new(config, reader, tracker.clone(), notifier.clone());
        (poller, tracker, notifier)
    }

    #[tokio::test]
    async fn test_five_cycle_raise_and_clear() {
        let reader = MockRegisterReader::scripted().with_values(3, [0, 0, 101, 101, 0]);
        let (mut poller, _tracker, _notifier) = poller(vec![3], reader);

        let mut per_cycle = Vec::new();
        for _ in 0..5 {
            let kinds: Vec<_> = poller.poll_once().await.into_iter().map(|e| e.kind).collect();
            per_cycle.push(kinds);
        }

        assert_eq!(
            per_cycle,
            vec![
                vec![],
                vec![],
                vec![AlertKind::Raised],
                vec![],
                vec![AlertKind::Cleared],
            ]
        );
    }

    #[tokio::test]
    async fn test_failed_read_skips_station_without_state_change() {
        let reader = MockRegisterReader::scripted()
            .with_values(1, [101])
            .with_failure(1)
            .with_values(2, [202]);
        let (mut poller, tracker, _notifier) = poller(vec![1, 2], reader);

        assert_eq!(poller.poll_once().await.len(), 2);

        // Station 1 fails this cycle; its error must stay active
        let events = poller.poll_once().await;
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].device, DeviceId::Station(2));
        assert_eq!(tracker.active_error(&DeviceId::Station(1)), Some(ErrorValue::Code(101)));
        assert_eq!(poller.failure_count(1), 1);

        poller.poll_once().await;
        assert_eq!(poller.failure_count(1), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_polls_on_interval_until_cancelled() {
        let reader = MockRegisterReader::scripted().with_values(1, [101, 101, 0]);
        let (mut poller, tracker, notifier) = poller(vec![1], reader);
        let cancel = CancellationToken::new();

        let handle = tokio::spawn({
            let cancel = cancel.clone();
            async move { poller.run(cancel).await }
        });

        // Cycles at t=0s, 10s, 20s
        tokio::time::sleep(Duration::from_secs(25)).await;
        cancel.cancel();
        handle.await.unwrap();

        assert_eq!(
            *notifier.delivered.lock().unwrap(),
            vec![
                (DeviceId::Station(1), AlertKind::Raised),
                (DeviceId::Station(1), AlertKind::Cleared),
            ]
        );
        assert!(tracker.active().is_empty());
    }

    #[tokio::test]
    async fn test_cancelled_before_start_never_polls() {
        let reader = MockRegisterReader::scripted().with_values(1, [101]);
        let (mut poller, tracker, _notifier) = poller(vec![1], reader);
        let cancel = CancellationToken::new();
        cancel.cancel();

        poller.run(cancel).await;
        assert!(tracker.active().is_empty());
    }
}
