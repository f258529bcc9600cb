//! Configuration file watcher for hot reload.

use std::path::{Path, PathBuf};
use std::time::Duration;

use notify::{Config as NotifyConfig, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::config::loader::load_config;
use crate::config::schema::Config;

/// A watcher that monitors the configuration file for changes.
pub struct ConfigWatcher {
    path: PathBuf,
    update_tx: mpsc::UnboundedSender<Config>,
}

impl ConfigWatcher {
    /// Create a new ConfigWatcher feeding an existing update channel.
    pub fn new(path: &Path, update_tx: mpsc::UnboundedSender<Config>) -> Self {
        Self {
            path: path.to_path_buf(),
            update_tx,
        }
    }

    /// Start watching the file in a background thread.
    ///
    /// The parent directory is watched rather than the file itself: editors
    /// and mounted ConfigMaps save by renaming a new file over the old one,
    /// which would orphan a watch placed on the file.
    ///
    /// The returned watcher must be kept alive for as long as reloads are wanted.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let tx = self.update_tx.clone();
        let path = self.path.clone();
        let file_name = self.path.file_name().map(|name| name.to_os_string());

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    let changed = event.kind.is_modify() || event.kind.is_create();
                    let ours = event
                        .paths
                        .iter()
                        .any(|event_path| event_path.file_name() == file_name.as_deref());
                    if changed && ours {
                        tracing::info!(
                            path = %path.display(),
                            "Config file change detected, reloading"
                        );
                        if let Some(config) = reload(&path) {
                            let _ = tx.send(config);
                        }
                    }
                }
                Err(e) => tracing::error!(error = %e, "Watch error"),
            },
            NotifyConfig::default().with_poll_interval(Duration::from_secs(2)),
        )?;

        watcher.watch(watch_dir(&self.path), RecursiveMode::NonRecursive)?;

        tracing::info!(path = %self.path.display(), "Config watcher started");
        Ok(watcher)
    }
}

/// Directory holding `path`; a bare file name lives in the working directory.
fn watch_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    }
}

/// Load the file again, returning the config only if it is free of problems.
pub fn reload(path: &Path) -> Option<Config> {
    match load_config(path) {
        Ok((config, problems)) if problems.is_empty() => Some(config),
        Ok((_, problems)) => {
            for problem in &problems {
                tracing::error!(%problem, "Configuration problem");
            }
            tracing::warn!(
                problems = problems.len(),
                "Reloaded configuration rejected, keeping current configuration"
            );
            None
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to reload config, keeping current configuration");
            None
        }
    }
}
