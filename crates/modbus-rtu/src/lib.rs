//! Modbus RTU Implementation
//!
//! This crate provides async register reads from Modbus RTU stations on an
//! RS-485 bus. Only the "read input registers" function is implemented,
//! which is all the chiller controllers expose.

mod client;
mod error;
mod frame;
mod mock;

pub use client::{RegisterReader, RtuClient, SerialSettings};
pub use error::ModbusError;
pub use frame::{crc16, decode_read_response, encode_read_request, expected_response_len};
pub use mock::MockRegisterReader;

/// Modbus function codes
pub mod function {
    /// Read input registers
    pub const READ_INPUT_REGISTERS: u8 = 0x04;
    /// Bit set on the function code of an exception response
    pub const EXCEPTION_FLAG: u8 = 0x80;
}
