use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::sync::mpsc;

use redirector::config::watcher::ConfigWatcher;
use redirector::http::HttpServer;
use redirector::lifecycle::{load_validated, signals, Shutdown};
use redirector::net::Listener;
use redirector::observability::logging::{init_logging, LogFormat};
use redirector::observability::metrics::init_metrics;

/// Redirect requests to new locations based on their host and path.
#[derive(Debug, Parser)]
#[command(name = "redirector", version)]
struct Cli {
    /// Configuration file (JSON, or TOML when the extension is .toml).
    #[arg(short, long, env = "REDIRECTOR_CONFIG", default_value = "config.json")]
    config: PathBuf,

    /// Serve Prometheus metrics on this address.
    #[arg(long, env = "REDIRECTOR_METRICS_ADDRESS")]
    metrics_address: Option<SocketAddr>,

    /// Maximum number of concurrently open client connections.
    #[arg(long, default_value_t = 10_000)]
    max_connections: usize,

    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    /// Reload the configuration whenever the file changes.
    #[arg(long)]
    watch: bool,

    /// Validate the configuration and exit.
    #[arg(long)]
    check: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(cli.log_format);

    tracing::info!("redirector v{} starting", env!("CARGO_PKG_VERSION"));

    let config = load_validated(&cli.config)?;
    if cli.check {
        tracing::info!(path = %cli.config.display(), "Configuration is valid");
        return Ok(());
    }

    if let Some(addr) = cli.metrics_address {
        init_metrics(addr)?;
    }

    let listener = Listener::bind(&config.listen_address, cli.max_connections).await?;

    let shutdown = Arc::new(Shutdown::new());
    let shutdown_rx = shutdown.subscribe();
    let (update_tx, update_rx) = mpsc::unbounded_channel();

    // Dropping the watcher stops it, so it lives as long as main.
    let _watcher = if cli.watch {
        Some(ConfigWatcher::new(&cli.config, update_tx.clone()).run()?)
    } else {
        None
    };

    let signal_task = tokio::spawn(signals::listen(
        Arc::clone(&shutdown),
        cli.config.clone(),
        update_tx,
    ));

    let server = HttpServer::new(config);
    server.run(listener, update_rx, shutdown_rx).await?;

    signal_task.abort();
    tracing::info!("Shutdown complete");
    Ok(())
}
