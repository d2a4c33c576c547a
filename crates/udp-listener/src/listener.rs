//! UDP Listener Implementation

use crate::message::decode_message;
use alert_core::{AlertEvent, DeviceId, SharedTracker};
use notifier::{dispatch, Notify};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use thiserror::Error;
use tokio::net::UdpSocket;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

/// Listener startup errors
#[derive(Debug, Error)]
pub enum ListenerError {
    #[error("Failed to bind UDP port {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },
}

/// Listener configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListenerConfig {
    /// Address to bind; must match the controllers' target port
    pub bind_addr: String,
    /// Receive buffer size in bytes
    pub buffer_size: usize,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:4210".to_string(),
            buffer_size: 1024,
        }
    }
}

/// Receives controller datagrams and applies them to the tracker
pub struct UdpListener {
    socket: UdpSocket,
    buffer_size: usize,
    tracker: SharedTracker,
    notifier: Arc<dyn Notify>,
}

impl UdpListener {
    /// Bind the listening socket. Failure here is fatal for the caller.
    pub async fn bind(
        config: &ListenerConfig,
        tracker: SharedTracker,
        notifier: Arc<dyn Notify>,
    ) -> Result<Self, ListenerError> {
        let socket = UdpSocket::bind(&config.bind_addr)
            .await
            .map_err(|source| ListenerError::Bind {
                addr: config.bind_addr.clone(),
                source,
            })?;

        match socket.local_addr() {
            Ok(addr) => info!("Listening for chiller status on UDP {}", addr),
            Err(_) => info!("Listening for chiller status on UDP {}", config.bind_addr),
        }

        Ok(Self {
            socket,
            buffer_size: config.buffer_size,
            tracker,
            notifier,
        })
    }

    /// Address the socket is bound to
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.socket.local_addr()
    }

    /// Decode one datagram and apply it.
    ///
    /// Undecodable or unrecognized payloads are dropped without touching
    /// the tracker.
    pub async fn handle_datagram(&self, payload: &[u8], sender: SocketAddr) -> Option<AlertEvent> {
        let text = match std::str::from_utf8(payload) {
            Ok(text) => text,
            Err(e) => {
                debug!("Dropping non-UTF-8 datagram from {}: {}", sender, e);
                return None;
            }
        };
        trace!("[{}] says: {}", sender.ip(), text.trim());

        let Some(status) = decode_message(text) else {
            debug!("Ignoring unrecognized message from {}: {:?}", sender.ip(), text.trim());
            return None;
        };

        dispatch(
            &self.tracker,
            self.notifier.as_ref(),
            DeviceId::Address(sender.ip()),
            status,
        )
        .await
    }

    /// Receive until cancelled. The socket is closed when this returns.
    pub async fn run(self, cancel: CancellationToken) {
        info!("Waiting for chillers to report status");
        let mut buf = vec![0u8; self.buffer_size];

        loop {
            let received = tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                received = self.socket.recv_from(&mut buf) => received,
            };

            match received {
                Ok((len, sender)) => {
                    self.handle_datagram(&buf[..len], sender).await;
                }
                Err(e) => warn!("UDP receive failed: {}", e),
            }
        }

        info!("UDP listener stopped");
    }
}
