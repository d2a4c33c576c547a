//! Alert Tracker Implementation

use crate::device::{DeviceId, ErrorValue, Status};
use crate::event::AlertEvent;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, info};

/// Active-error map for all monitored devices.
///
/// A device is present only while its last observation was an error.
/// The stored value is the most recent *distinct* error, so repeats of
/// the same error leave the map untouched.
#[derive(Debug, Default)]
pub struct AlertTracker {
    /// Active errors by device
    active: HashMap<DeviceId, ErrorValue>,
}

impl AlertTracker {
    /// Create an empty tracker (every device implicitly nominal)
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one observation and return the event it causes, if any.
    ///
    /// A changed error while already in error re-raises with the new value
    /// and does not emit a `Cleared` for the old one.
    pub fn observe(&mut self, device: DeviceId, status: Status) -> Option<AlertEvent> {
        match status {
            Status::Nominal => {
                let previous = self.active.remove(&device)?;
                info!("Device {} recovered from error {}", device, previous);
                Some(AlertEvent::cleared(device, previous))
            }
            Status::Error(value) => {
                if self.active.get(&device) == Some(&value) {
                    debug!("Device {} still reporting error {}", device, value);
                    return None;
                }
                if let Some(previous) = self.active.insert(device, value.clone()) {
                    info!("Device {} error changed: {} -> {}", device, previous, value);
                } else {
                    info!("Device {} raised error {}", device, value);
                }
                Some(AlertEvent::raised(device, value))
            }
        }
    }

    /// Currently active error for a device, if it has one
    pub fn active_error(&self, device: &DeviceId) -> Option<&ErrorValue> {
        self.active.get(device)
    }

    /// Snapshot of all active errors, ordered by device
    pub fn active(&self) -> Vec<(DeviceId, ErrorValue)> {
        let mut entries: Vec<_> = self
            .active
            .iter()
            .map(|(device, error)| (*device, error.clone()))
            .collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        entries
    }

    /// Number of devices in error
    pub fn len(&self) -> usize {
        self.active.len()
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }
}

/// Tracker handle shared by the polling and push front-ends.
///
/// All mutation goes through [`SharedTracker::observe`], which holds the
/// lock for exactly one transition.
#[derive(Debug, Clone, Default)]
pub struct SharedTracker {
    inner: Arc<Mutex<AlertTracker>>,
}

impl SharedTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn observe(&self, device: DeviceId, status: Status) -> Option<AlertEvent> {
        // A panic elsewhere cannot leave the map half-updated, so a poisoned
        // lock still guards a consistent tracker.
        let mut tracker = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        tracker.observe(device, status)
    }

    pub fn active_error(&self, device: &DeviceId) -> Option<ErrorValue> {
        let tracker = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        tracker.active_error(device).cloned()
    }

    pub fn active(&self) -> Vec<(DeviceId, ErrorValue)> {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .active()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::AlertKind;
    use proptest::prelude::*;
    use std::net::IpAddr;

    fn station(id: u8) -> DeviceId {
        DeviceId::Station(id)
    }

    fn kinds(events: &[AlertEvent]) -> Vec<(AlertKind, ErrorValue)> {
        events.iter().map(|e| (e.kind, e.error.clone())).collect()
    }

    #[test]
    fn test_nominal_on_unknown_device_is_noop() {
        let mut tracker = AlertTracker::new();
        assert!(tracker.observe(station(1), Status::Nominal).is_none());
        assert!(tracker.is_empty());
    }

    #[test]
    fn test_raise_then_clear_round_trip() {
        let mut tracker = AlertTracker::new();
        let d = station(7);

        let events: Vec<_> = [Status::error(101u16), Status::error(101u16), Status::Nominal]
            .into_iter()
            .filter_map(|s| tracker.observe(d, s))
            .collect();

        assert_eq!(
            kinds(&events),
            vec![
                (AlertKind::Raised, ErrorValue::Code(101)),
                (AlertKind::Cleared, ErrorValue::Code(101)),
            ]
        );
        assert!(events.iter().all(|e| e.device == d));
        assert!(tracker.active_error(&d).is_none());
    }

    #[test]
    fn test_changed_error_reraises_without_clear() {
        let mut tracker = AlertTracker::new();
        let d = station(2);

        let first = tracker.observe(d, Status::error(101u16)).unwrap();
        let second = tracker.observe(d, Status::error(202u16)).unwrap();

        assert_eq!(first.kind, AlertKind::Raised);
        assert_eq!(second.kind, AlertKind::Raised);
        assert_eq!(second.error, ErrorValue::Code(202));
        assert_eq!(tracker.active_error(&d), Some(&ErrorValue::Code(202)));

        // Clearing reports the superseding error, not the first one
        let cleared = tracker.observe(d, Status::Nominal).unwrap();
        assert_eq!(cleared.error, ErrorValue::Code(202));
    }

    #[test]
    fn test_polled_station_scenario() {
        let mut tracker = AlertTracker::new();
        let d = station(3);
        let mut emitted = Vec::new();

        for (cycle, register) in [0u16, 0, 101, 101, 0].into_iter().enumerate() {
            let status = if register == 0 {
                Status::Nominal
            } else {
                Status::error(register)
            };
            if let Some(event) = tracker.observe(d, status) {
                emitted.push((cycle + 1, event.kind));
            }
        }

        assert_eq!(emitted, vec![(3, AlertKind::Raised), (5, AlertKind::Cleared)]);
    }

    #[test]
    fn test_devices_are_independent() {
        let mut tracker = AlertTracker::new();
        let addr: IpAddr = "192.168.1.105".parse().unwrap();

        tracker.observe(station(1), Status::error(101u16));
        tracker.observe(DeviceId::Address(addr), Status::error("Low Level in Tank"));
        assert_eq!(tracker.len(), 2);

        tracker.observe(station(1), Status::Nominal);
        assert_eq!(
            tracker.active(),
            vec![(DeviceId::Address(addr), ErrorValue::from("Low Level in Tank"))]
        );
    }

    #[test]
    fn test_shared_tracker_across_threads() {
        let shared = SharedTracker::new();
        let handles: Vec<_> = (1..=8u8)
            .map(|id| {
                let shared = shared.clone();
                std::thread::spawn(move || {
                    let mut raised = 0;
                    for _ in 0..50 {
                        if shared.observe(station(id), Status::error(id as u16)).is_some() {
                            raised += 1;
                        }
                    }
                    raised
                })
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.join().unwrap(), 1);
        }
        assert_eq!(shared.active().len(), 8);
    }

    fn status_strategy() -> impl Strategy<Value = Status> {
        prop_oneof![
            Just(Status::Nominal),
            (1u16..4).prop_map(Status::error),
            prop::sample::select(vec!["Low Level", "High Temp"]).prop_map(Status::error),
        ]
    }

    proptest! {
        #[test]
        fn prop_repeated_observation_emits_once(status in status_strategy(), repeats in 2usize..10) {
            let mut tracker = AlertTracker::new();
            let d = station(1);
            tracker.observe(d, status.clone());
            for _ in 1..repeats {
                prop_assert!(tracker.observe(d, status.clone()).is_none());
            }
        }

        #[test]
        fn prop_map_matches_last_event(statuses in prop::collection::vec(status_strategy(), 1..40)) {
            let mut tracker = AlertTracker::new();
            let d = station(9);
            for status in statuses {
                match tracker.observe(d, status.clone()) {
                    Some(event) if event.is_raised() => {
                        prop_assert_eq!(tracker.active_error(&d), Some(&event.error));
                    }
                    Some(_) => prop_assert!(tracker.active_error(&d).is_none()),
                    None => {}
                }
                // Presence in the map mirrors the last observation
                prop_assert_eq!(tracker.active_error(&d).is_some(), !status.is_nominal());
            }
        }
    }
}
