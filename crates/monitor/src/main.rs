//! Chiller Monitor - Main Entry Point

use anyhow::Context;
use monitor::{init_logging, run, shutdown_signal, MonitorConfig};
use tokio_util::sync::CancellationToken;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();

    info!("=== Chiller Monitor v{} ===", env!("CARGO_PKG_VERSION"));

    let config = MonitorConfig::load()?;
    info!(
        "Polling {} on {} every {}s; UDP listener {}",
        if config.poll.enabled { "enabled" } else { "disabled" },
        config.serial.port,
        config.poll.interval_secs,
        if config.push.enabled { config.push.bind_addr.as_str() } else { "disabled" },
    );

    let shutdown = shutdown_signal().context("installing signal handlers")?;
    let cancel = CancellationToken::new();
    tokio::spawn({
        let cancel = cancel.clone();
        async move {
            let signal = shutdown.await;
            info!("Received {} signal, stopping monitor...", signal);
            cancel.cancel();
        }
    });

    run(config, cancel).await
}
