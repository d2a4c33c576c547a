//! Alert Notification
//!
//! Renders alert transitions as chat attachments and posts them to an
//! incoming webhook. Delivery is best effort: a failed post is logged and
//! never rolls back the tracker.

mod dispatch;
mod message;
mod webhook;

pub use dispatch::dispatch;
pub use message::{render_payload, render_text, Accent};
pub use webhook::{Notify, NotifyError, WebhookConfig, WebhookNotifier};
