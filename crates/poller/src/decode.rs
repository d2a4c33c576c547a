//! Register value normalization

use alert_core::Status;

/// Map a status register to a tracker status: 0 is nominal, anything else
/// is that error code.
pub fn decode_register(value: u16) -> Status {
    match value {
        0 => Status::Nominal,
        code => Status::error(code),
    }
}
