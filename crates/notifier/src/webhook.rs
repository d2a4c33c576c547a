//! Incoming-webhook delivery

use crate::message::render_payload;
use alert_core::{AlertEvent, ErrorCodeBook};
use async_trait::async_trait;
use chrono::Local;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

/// Delivery failures. None of them are retried.
#[derive(Debug, Error)]
pub enum NotifyError {
    /// Network failure, DNS failure or timeout
    #[error("Webhook request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Endpoint answered with something other than 200
    #[error("Webhook returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
}

/// Destination for alert transitions
#[async_trait]
pub trait Notify: Send + Sync {
    async fn deliver(&self, event: &AlertEvent) -> Result<(), NotifyError>;
}

/// Webhook endpoint settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WebhookConfig {
    /// Incoming webhook URL
    pub url: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            timeout_secs: 5,
        }
    }
}

/// Posts rendered alerts to a chat webhook
pub struct WebhookNotifier {
    client: reqwest::Client,
    url: String,
    codes: Arc<ErrorCodeBook>,
}

impl WebhookNotifier {
    /// Create a notifier with a client bounded by the configured timeout
    pub fn new(config: &WebhookConfig, codes: Arc<ErrorCodeBook>) -> Result<Self, NotifyError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        info!("Webhook notifier ready (timeout {}s)", config.timeout_secs);
        Ok(Self {
            client,
            url: config.url.clone(),
            codes,
        })
    }
}

#[async_trait]
impl Notify for WebhookNotifier {
    async fn deliver(&self, event: &AlertEvent) -> Result<(), NotifyError> {
        let payload = render_payload(event, &self.codes, Local::now());
        debug!("Posting {:?} alert for device {}", event.kind, event.device);

        let response = self.client.post(&self.url).json(&payload).send().await?;
        let status = response.status();
        if status != reqwest::StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            return Err(NotifyError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alert_core::{DeviceId, ErrorValue};
    use axum::{http::StatusCode, routing::post, Json, Router};
    use serde_json::Value;
    use tokio::sync::mpsc;

    /// Spawn a webhook endpoint that records bodies and answers `status`
    async fn spawn_endpoint(status: StatusCode) -> (String, mpsc::UnboundedReceiver<Value>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let app = Router::new().route(
            "/hook",
            post(move |Json(body): Json<Value>| {
                let tx = tx.clone();
                async move {
                    let _ = tx.send(body);
                    (status, "ok")
                }
            }),
        );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (format!("http://{}/hook", addr), rx)
    }

    fn notifier(url: String) -> WebhookNotifier {
        let config = WebhookConfig {
            url,
            timeout_secs: 2,
        };
        WebhookNotifier::new(&config, Arc::new(ErrorCodeBook::default())).unwrap()
    }

    #[tokio::test]
    async fn test_delivers_rendered_payload() {
        let (url, mut bodies) = spawn_endpoint(StatusCode::OK).await;
        let event = AlertEvent::raised(DeviceId::Station(3), ErrorValue::Code(101));

        notifier(url).deliver(&event).await.unwrap();

        let body = bodies.recv().await.unwrap();
        assert_eq!(body["attachments"][0]["color"], "#FFA500");
        assert_eq!(
            body["attachments"][0]["blocks"][0]["text"]["text"],
            ":warning: *Chiller 3* reported error `101`: Unknown error code"
        );
    }

    #[tokio::test]
    async fn test_server_error_is_reported() {
        let (url, _bodies) = spawn_endpoint(StatusCode::INTERNAL_SERVER_ERROR).await;
        let event = AlertEvent::cleared(DeviceId::Station(3), ErrorValue::Code(101));

        match notifier(url).deliver(&event).await {
            Err(NotifyError::Status { status, .. }) => assert_eq!(status, 500),
            other => panic!("expected status error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_request_error() {
        // Bind then drop to get a port nobody listens on
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let event = AlertEvent::cleared(DeviceId::Station(3), ErrorValue::Code(101));
        let result = notifier(format!("http://{}/hook", addr)).deliver(&event).await;
        assert!(matches!(result, Err(NotifyError::Request(_))));
    }

    #[test]
    fn test_status_error_display() {
        let err = NotifyError::Status {
            status: 404,
            body: "no_service".to_string(),
        };
        assert_eq!(err.to_string(), "Webhook returned HTTP 404: no_service");
    }
}
