//! Push Status Receiver
//!
//! Controllers on the lab network send short text datagrams: periodic
//! "System Normal" heartbeats and "ALARM: <description>" messages. This
//! crate decodes them and feeds the shared alert tracker.

mod listener;
mod message;

pub use listener::{ListenerConfig, ListenerError, UdpListener};
pub use message::{decode_message, ALARM_PREFIX, NORMAL_PHRASE};
