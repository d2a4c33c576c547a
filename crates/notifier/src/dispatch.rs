//! Observation to notification glue shared by both front-ends

use crate::webhook::Notify;
use alert_core::{AlertEvent, DeviceId, SharedTracker, Status};
use tracing::warn;

/// Apply an observation and deliver the resulting event, if any.
///
/// The tracker is updated before delivery is attempted. A failed delivery
/// is logged and the event still counts as emitted.
pub async fn dispatch(
    tracker: &SharedTracker,
    notifier: &dyn Notify,
    device: DeviceId,
    status: Status,
) -> Option<AlertEvent> {
    let event = tracker.observe(device, status)?;

    if let Err(e) = notifier.deliver(&event).await {
        warn!(
            "Failed to deliver {:?} alert for device {}: {}",
            event.kind, event.device, e
        );
    }

    Some(event)
}
