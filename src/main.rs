//! Cloud Connect Panel - Main Entry Point
//!
//! Console front-end for managing owner data, client data and SSH tunnels

use std::sync::Arc;

use anyhow::Context;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt};

use cloud_connect_panel::app::console::Console;
use cloud_connect_panel::app::{Gateways, Panel};
use cloud_connect_panel::domain::PanelConfig;
use cloud_connect_panel::eventing::Notifier;
use cloud_connect_panel::helpers::{get_or_create_data_dir, is_development};
use cloud_connect_panel::services::HttpGateway;

const LOG_FILE_PREFIX: &str = "cloud-connect-panel.log";

/// Install the subscriber. The returned guard flushes the log file on drop.
fn setup_logging(config: &PanelConfig) -> Option<WorkerGuard> {
    let level = if is_development() && config.logging.level == "info" {
        "debug"
    } else {
        config.logging.level.as_str()
    };
    let filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"));

    let (file_layer, guard) = match config.logging.file.then(get_or_create_data_dir) {
        Some(Ok(dir)) => {
            let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer().with_ansi(false).with_writer(writer);
            (Some(layer), Some(guard))
        }
        _ => (None, None),
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
        .with(file_layer)
        .with(filter)
        .init();
    guard
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = PanelConfig::load().context("Failed to load configuration")?;
    let _log_guard = setup_logging(&config);

    tracing::info!(base_url = %config.server.base_url, "Starting Cloud Connect panel...");

    let gateway = Arc::new(HttpGateway::new(config.clone()).context("Failed to create HTTP client")?);
    let (notifier, notifications) = Notifier::channel();
    let panel = Arc::new(Panel::new(Gateways::shared(gateway), config, notifier));

    panel.bootstrap().await;

    let mut console = Console::new(panel.clone(), notifications);
    tokio::select! {
        result = console.run() => result.context("Console failed")?,
        _ = tokio::signal::ctrl_c() => tracing::info!("Interrupted"),
    }

    panel.teardown();
    tracing::info!("Panel closed");
    Ok(())
}
