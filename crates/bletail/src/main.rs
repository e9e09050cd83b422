//! BleTail application entry point.
//!
//! Wires together the discovery collaborator, the session state machine,
//! and the keepalive seam, then tails the session from a terminal.
//!
//! # Architecture
//!
//! ```text
//! main()
//!  └─ AppConfig::load_or_default()     -- tunables from bletail.toml
//!  └─ find_peripheral()                -- bounded scan, prefix match
//!  └─ SessionManager::spawn()          -- owns the whole session lifecycle
//!  └─ observation loop
//!       ├─ status watch    -> print status transitions
//!       ├─ log watch       -> print each new message
//!       └─ Ctrl-C          -> disconnect and exit
//! ```
//!
//! The binary never drives the session beyond `connect` and the final
//! `disconnect`; everything in between (discovery of the GATT tree, channel
//! selection, subscription, teardown on link loss) happens inside the
//! session task.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tracing::info;
use tracing_subscriber::EnvFilter;

use bletail::application::session::{SessionConfig, SessionManager};
use bletail::infrastructure::ble::btleplug_backend::{find_peripheral, DiscoveryConfig};
use bletail::infrastructure::ble::BlePeripheral;
use bletail::infrastructure::keepalive::LogKeepalive;
use bletail::infrastructure::storage::config::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load_or_default(Path::new("bletail.toml"));

    // Initialise structured logging; RUST_LOG overrides the config level.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.session.log_level.clone())),
        )
        .init();

    info!("BleTail starting");

    // A CLI argument overrides the configured device-name prefix.
    let name_prefix = std::env::args()
        .nth(1)
        .unwrap_or_else(|| config.device.name_prefix.clone());

    // ── Discovery collaborator ────────────────────────────────────────────────
    let discovery = DiscoveryConfig {
        name_prefix,
        scan_window: Duration::from_secs(config.device.scan_window_secs),
    };
    let peripheral = find_peripheral(&discovery)
        .await
        .context("no usable peripheral found")?;
    info!(name = %peripheral.name(), "peripheral chosen");

    // ── Session ───────────────────────────────────────────────────────────────
    let session_config = SessionConfig {
        connect_timeout: Duration::from_secs(config.session.connect_timeout_secs),
    };
    let handle = SessionManager::spawn(session_config, Arc::new(LogKeepalive));
    handle.connect(Arc::new(peripheral) as Arc<dyn BlePeripheral>).await;

    // ── Observation loop ──────────────────────────────────────────────────────
    let mut status_rx = handle.watch_status();
    let mut log_rx = handle.watch_log();

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("shutdown signal received");
                break;
            }
            changed = status_rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let status = status_rx.borrow_and_update().clone();
                println!("status: {status}");
            }
            changed = log_rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let latest = log_rx.borrow_and_update().latest().cloned();
                if let Some(entry) = latest {
                    println!("{}", entry.text);
                }
            }
        }
    }

    handle.disconnect().await;
    info!("BleTail stopped");
    Ok(())
}
