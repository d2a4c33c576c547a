//! Chat message rendering

use alert_core::{AlertEvent, AlertKind, DeviceId, ErrorCodeBook, ErrorValue};
use chrono::{DateTime, Local};
use serde_json::{json, Value};

/// Marker emoji and attachment colour for a transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Accent {
    pub emoji: &'static str,
    pub color: &'static str,
}

impl Accent {
    pub const WARNING: Accent = Accent {
        emoji: ":warning:",
        color: "#FFA500",
    };

    pub const RECOVERED: Accent = Accent {
        emoji: ":white_check_mark:",
        color: "#36A64F",
    };

    pub fn for_kind(kind: AlertKind) -> Self {
        match kind {
            AlertKind::Raised => Accent::WARNING,
            AlertKind::Cleared => Accent::RECOVERED,
        }
    }
}

fn device_label(device: &DeviceId) -> String {
    match device {
        DeviceId::Station(id) => format!("*Chiller {}*", id),
        DeviceId::Address(addr) => format!("*Chiller ({})*", addr),
    }
}

/// Body text of the message, without the marker emoji
pub fn render_text(event: &AlertEvent, codes: &ErrorCodeBook) -> String {
    let label = device_label(&event.device);
    match (event.kind, &event.error) {
        (AlertKind::Raised, ErrorValue::Code(code)) => format!(
            "{} reported error `{}`: {}",
            label,
            code,
            codes.describe(*code)
        ),
        (AlertKind::Raised, ErrorValue::Text(text)) => {
            format!("{} reported error:\n`{}`", label, text)
        }
        (AlertKind::Cleared, ErrorValue::Code(code)) => {
            format!("{} recovered. Previous error `{}` cleared.", label, code)
        }
        (AlertKind::Cleared, ErrorValue::Text(text)) => {
            format!("{} has recovered.\nPrevious error `{}` cleared.", label, text)
        }
    }
}

/// Full webhook body: one coloured attachment with a text section and a
/// timestamp context line
pub fn render_payload(event: &AlertEvent, codes: &ErrorCodeBook, sent_at: DateTime<Local>) -> Value {
    let accent = Accent::for_kind(event.kind);
    let text = format!("{} {}", accent.emoji, render_text(event, codes));
    let timestamp = format!("Timestamp: {}", sent_at.format("%Y-%m-%d %H:%M:%S"));

    json!({
        "attachments": [
            {
                "color": accent.color,
                "blocks": [
                    {
                        "type": "section",
                        "text": { "type": "mrkdwn", "text": text }
                    },
                    {
                        "type": "context",
                        "elements": [
                            { "type": "mrkdwn", "text": timestamp }
                        ]
                    }
                ]
            }
        ]
    })
}
