//! Modbus Error Types

use thiserror::Error;

/// Errors that can occur while reading a station's registers
#[derive(Debug, Error)]
pub enum ModbusError {
    /// Serial port could not be opened or failed mid-transfer
    #[error("Serial port error: {0}")]
    SerialError(String),

    /// Station did not answer in time
    #[error("Timeout waiting for station {station} after {timeout_ms}ms")]
    Timeout { station: u8, timeout_ms: u64 },

    /// CRC over the received frame does not match
    #[error("CRC mismatch: expected {expected:04X}, got {actual:04X}")]
    CrcMismatch { expected: u16, actual: u16 },

    /// Station replied with a Modbus exception
    #[error("Station {station} returned exception code {code:02X}")]
    Exception { station: u8, code: u8 },

    /// Frame is structurally wrong (bad length, wrong station, wrong function)
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Client was used after disconnect
    #[error("Serial bus not connected")]
    NotConnected,
}

impl From<std::io::Error> for ModbusError {
    fn from(err: std::io::Error) -> Self {
        ModbusError::SerialError(err.to_string())
    }
}

impl From<tokio_serial::Error> for ModbusError {
    fn from(err: tokio_serial::Error) -> Self {
        ModbusError::SerialError(err.to_string())
    }
}
