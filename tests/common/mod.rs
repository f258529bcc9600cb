//! Shared utilities for integration testing.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use redirector::config::{parse_config, Config, Format};
use redirector::http::{HttpServer, ServerError};
use redirector::lifecycle::Shutdown;
use redirector::net::Listener;

/// A redirector running on an ephemeral local port.
pub struct TestServer {
    pub addr: SocketAddr,
    pub shutdown: Arc<Shutdown>,
    pub updates: mpsc::UnboundedSender<Config>,
    pub handle: JoinHandle<Result<(), ServerError>>,
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

/// Parse a JSON configuration, failing the test on any problem.
pub fn config(json: &str) -> Config {
    let (config, problems) = parse_config(json, Format::Json).unwrap();
    assert!(problems.is_empty(), "unexpected problems: {problems:?}");
    config
}

/// Start a server answering with `json` on 127.0.0.1.
pub async fn start_server(json: &str) -> TestServer {
    let listener = Listener::bind("127.0.0.1:0", 64).await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Arc::new(Shutdown::new());
    let (updates, update_rx) = mpsc::unbounded_channel();

    let server = HttpServer::new(config(json)).with_drain_timeout(Duration::from_secs(1));
    let handle = tokio::spawn(server.run(listener, update_rx, shutdown.subscribe()));

    TestServer {
        addr,
        shutdown,
        updates,
        handle,
    }
}

/// HTTP client that reports redirects instead of following them.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .timeout(Duration::from_secs(5))
        .build()
        .unwrap()
}
