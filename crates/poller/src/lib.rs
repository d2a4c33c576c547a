//! Chiller Station Poller
//!
//! Reads each station's status register on a fixed interval and feeds the
//! decoded status into the shared alert tracker.

mod decode;
mod poller;

pub use decode::decode_register;
pub use poller::{PollerConfig, StationPoller, STATUS_REGISTER};
