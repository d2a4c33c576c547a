//! Alert transition records

use crate::device::{DeviceId, ErrorValue};
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

/// Direction of a state transition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertKind {
    /// Device entered an error state, or switched to a different error
    Raised,
    /// Device returned to nominal
    Cleared,
}

/// An emitted alert. Built only when the tracker's map actually changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertEvent {
    pub device: DeviceId,
    pub kind: AlertKind,
    /// The new error for `Raised`, the error being cleared for `Cleared`
    pub error: ErrorValue,
    pub timestamp: DateTime<Local>,
}

impl AlertEvent {
    pub fn raised(device: DeviceId, error: ErrorValue) -> Self {
        Self {
            device,
            kind: AlertKind::Raised,
            error,
            timestamp: Local::now(),
        }
    }

    pub fn cleared(device: DeviceId, error: ErrorValue) -> Self {
        Self {
            device,
            kind: AlertKind::Cleared,
            error,
            timestamp: Local::now(),
        }
    }

    pub fn is_raised(&self) -> bool {
        self.kind == AlertKind::Raised
    }
}
