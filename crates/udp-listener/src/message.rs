//! Datagram text decoding

use alert_core::Status;

/// Prefix of an alarm message; the rest of the line is the description
pub const ALARM_PREFIX: &str = "ALARM:";

/// Phrase contained in heartbeat messages when no alarm is active
pub const NORMAL_PHRASE: &str = "System Normal";

/// Decode one message into a status.
///
/// The alarm prefix is checked first, so an alarm whose description
/// mentions the normal phrase is still an alarm. Returns `None` for
/// anything that is neither; such messages must not reach the tracker.
pub fn decode_message(raw: &str) -> Option<Status> {
    let message = raw.trim();

    if let Some(description) = message.strip_prefix(ALARM_PREFIX) {
        Some(Status::error(description.trim()))
    } else if message.contains(NORMAL_PHRASE) {
        Some(Status::Nominal)
    } else {
        None
    }
}
