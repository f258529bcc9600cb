//! OS signal handling.
//!
//! # Responsibilities
//! - Register signal handlers (SIGTERM, SIGINT, SIGHUP)
//! - SIGTERM/SIGINT trigger graceful shutdown
//! - SIGHUP reloads the configuration file
//!
//! # Design Decisions
//! - Uses Tokio's signal handling (async-safe)
//! - A rejected reload keeps the current configuration

use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::mpsc;

use crate::config::{watcher, Config};
use crate::lifecycle::shutdown::Shutdown;

/// Listen for signals until shutdown is requested.
#[cfg(unix)]
pub async fn listen(
    shutdown: Arc<Shutdown>,
    config_path: PathBuf,
    update_tx: mpsc::UnboundedSender<Config>,
) -> std::io::Result<()> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut interrupt = signal(SignalKind::interrupt())?;
    let mut terminate = signal(SignalKind::terminate())?;
    let mut hangup = signal(SignalKind::hangup())?;

    loop {
        tokio::select! {
            _ = interrupt.recv() => {
                shutdown.trigger("SIGINT");
                return Ok(());
            }
            _ = terminate.recv() => {
                shutdown.trigger("SIGTERM");
                return Ok(());
            }
            _ = hangup.recv() => {
                tracing::info!(
                    path = %config_path.display(),
                    "SIGHUP received, reloading configuration"
                );
                if let Some(config) = watcher::reload(&config_path) {
                    if update_tx.send(config).is_err() {
                        tracing::warn!("Server no longer accepts configuration updates");
                    }
                }
            }
        }
    }
}

/// Listen for Ctrl+C; reloading is only available through the file watcher.
#[cfg(not(unix))]
pub async fn listen(
    shutdown: Arc<Shutdown>,
    _config_path: PathBuf,
    _update_tx: mpsc::UnboundedSender<Config>,
) -> std::io::Result<()> {
    tokio::signal::ctrl_c().await?;
    shutdown.trigger("Ctrl+C");
    Ok(())
}
