//! Chiller Alert Core
//!
//! Decides, per device, whether an observation is a new problem, a
//! continuing problem, a recovery, or nothing at all. Every state change
//! yields exactly one [`AlertEvent`].

mod codes;
mod device;
mod event;
mod tracker;

pub use codes::{CodeBookError, ErrorCodeBook, UNKNOWN_ERROR_CODE};
pub use device::{DeviceId, ErrorValue, Status};
pub use event::{AlertEvent, AlertKind};
pub use tracker::{AlertTracker, SharedTracker};
