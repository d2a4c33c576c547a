//! Device identifiers and normalized status values

use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::IpAddr;

/// A monitored chiller unit.
///
/// Polled units are addressed by their Modbus station id, pushed units by
/// the address their datagrams come from. The tracker only needs the key
/// to be comparable, so both schemes share one map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceId {
    /// Modbus station id on the serial bus
    Station(u8),
    /// Sender address of UDP status messages
    Address(IpAddr),
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceId::Station(id) => write!(f, "{}", id),
            DeviceId::Address(addr) => write!(f, "{}", addr),
        }
    }
}

impl From<u8> for DeviceId {
    fn from(station: u8) -> Self {
        DeviceId::Station(station)
    }
}

impl From<IpAddr> for DeviceId {
    fn from(addr: IpAddr) -> Self {
        DeviceId::Address(addr)
    }
}

/// The error a device reported, as an opaque comparable token
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ErrorValue {
    /// Nonzero register value from a polled unit
    Code(u16),
    /// Free-text alarm description from a pushed unit
    Text(String),
}

impl fmt::Display for ErrorValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorValue::Code(code) => write!(f, "{}", code),
            ErrorValue::Text(text) => f.write_str(text),
        }
    }
}

impl From<u16> for ErrorValue {
    fn from(code: u16) -> Self {
        ErrorValue::Code(code)
    }
}

impl From<&str> for ErrorValue {
    fn from(text: &str) -> Self {
        ErrorValue::Text(text.to_string())
    }
}

impl From<String> for ErrorValue {
    fn from(text: String) -> Self {
        ErrorValue::Text(text)
    }
}

/// Normalized device condition fed to the tracker
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Status {
    Nominal,
    Error(ErrorValue),
}

impl Status {
    /// Shorthand for `Status::Error(value.into())`
    pub fn error(value: impl Into<ErrorValue>) -> Self {
        Status::Error(value.into())
    }

    pub fn is_nominal(&self) -> bool {
        matches!(self, Status::Nominal)
    }
}
