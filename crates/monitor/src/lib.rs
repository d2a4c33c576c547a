//! Chiller Fleet Monitor
//!
//! Wires the polling and push front-ends to one shared alert tracker and
//! the webhook notifier, and runs them until shutdown.

pub mod config;

use alert_core::{ErrorCodeBook, SharedTracker};
use anyhow::Context;
use modbus_rtu::{MockRegisterReader, RegisterReader, RtuClient};
use notifier::{Notify, WebhookNotifier};
use poller::StationPoller;
use std::future::Future;
use std::sync::Arc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};
use udp_listener::UdpListener;

pub use crate::config::MonitorConfig;

/// Initialize logging. Defaults to INFO; `RUST_LOG` overrides.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(true)
        .finish();

    if tracing::subscriber::set_global_default(subscriber).is_err() {
        warn!("Tracing subscriber already installed");
    }
}

/// Install the shutdown handlers and return a future that resolves with
/// the name of the first signal received.
///
/// Handlers are registered before this returns, so a signal delivered
/// while the caller is still starting up is not lost.
pub fn shutdown_signal() -> std::io::Result<impl Future<Output = &'static str>> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let mut terminate = signal(SignalKind::terminate())?;
        Ok(async move {
            tokio::select! {
                result = tokio::signal::ctrl_c() => {
                    if let Err(e) = result {
                        warn!("Interrupt handler failed: {}", e);
                    }
                    "interrupt"
                }
                _ = terminate.recv() => "terminate",
            }
        })
    }

    #[cfg(not(unix))]
    {
        Ok(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!("Interrupt handler failed: {}", e);
            }
            "interrupt"
        })
    }
}

fn spawn_poller<R>(
    tasks: &mut JoinSet<()>,
    config: &MonitorConfig,
    reader: R,
    tracker: SharedTracker,
    notifier: Arc<dyn Notify>,
    cancel: CancellationToken,
) where
    R: RegisterReader + 'static,
{
    let mut poller = StationPoller::new(config.poll.poller(), reader, tracker, notifier);
    tasks.spawn(async move { poller.run(cancel).await });
}

/// Run the monitor until `cancel` fires.
///
/// Every transport is acquired before any loop starts, so a bind or
/// serial-open failure aborts startup with nothing left running.
pub async fn run(config: MonitorConfig, cancel: CancellationToken) -> anyhow::Result<()> {
    let codes = ErrorCodeBook::load(&config.error_codes_path)
        .with_context(|| format!("loading {}", config.error_codes_path))?;
    let notifier: Arc<dyn Notify> = Arc::new(
        WebhookNotifier::new(&config.webhook, Arc::new(codes)).context("creating webhook client")?,
    );
    let tracker = SharedTracker::new();

    let listener = if config.push.enabled {
        let listener = UdpListener::bind(&config.push.listener(), tracker.clone(), notifier.clone())
            .await
            .context("is another monitor instance already running?")?;
        Some(listener)
    } else {
        None
    };

    let mut tasks = JoinSet::new();

    if config.poll.enabled {
        if config.serial.mock {
            warn!("Serial mock mode enabled: station codes are simulated");
            let reader = MockRegisterReader::random();
            spawn_poller(&mut tasks, &config, reader, tracker.clone(), notifier.clone(), cancel.clone());
        } else {
            let reader = RtuClient::open(&config.serial.settings())
                .with_context(|| format!("opening serial port {}", config.serial.port))?;
            spawn_poller(&mut tasks, &config, reader, tracker.clone(), notifier.clone(), cancel.clone());
        }
    }

    if let Some(listener) = listener {
        tasks.spawn(listener.run(cancel.clone()));
    }

    info!("Lab monitoring system started");

    while let Some(result) = tasks.join_next().await {
        if let Err(e) = result {
            // Stop the surviving front-end too
            cancel.cancel();
            warn!("Monitor task failed: {}", e);
        }
    }

    let active = tracker.active();
    if !active.is_empty() {
        info!("Shutting down with {} unresolved alert(s): {:?}", active.len(), active);
    }
    info!("Lab monitor stopped");
    Ok(())
}
