//! HTTP server setup and the accept loop.
//!
//! # Responsibilities
//! - Accept connections from the bounded [`Listener`]
//! - Serve HTTP/1.1 and HTTP/2 on each connection
//! - Dispatch every request to the routing engine
//! - Swap in reloaded configurations without dropping connections
//! - Drain open connections on shutdown
//!
//! # Design Decisions
//! - The live config sits behind `ArcSwap`: requests load a snapshot, reloads store a new one
//! - A request never observes a half-applied config
//! - Close is a service error, which makes hyper abort the connection without writing

use std::future::{ready, Ready};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use arc_swap::ArcSwap;
use hyper::body::Incoming;
use hyper::service::service_fn;
use hyper::{Request, Response};
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as AutoConnBuilder;
use tokio::net::TcpStream;
use tokio::sync::{broadcast, mpsc};

use crate::config::Config;
use crate::http::request::request_facts;
use crate::http::response::{render, CloseConnection, Rendered, ResponseBody};
use crate::net::{ConnectionPermit, ConnectionTracker, Listener, ListenerError};
use crate::observability::{logging, metrics};
use crate::routing::decide;

/// How long shutdown waits for open connections.
pub const DRAIN_TIMEOUT: Duration = Duration::from_secs(10);

/// Pause after a failed accept (e.g. out of file descriptors).
const ACCEPT_ERROR_BACKOFF: Duration = Duration::from_millis(100);

#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error(transparent)]
    Listener(#[from] ListenerError),
}

/// State shared by every connection.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ArcSwap<Config>>,
}

/// HTTP server for the redirector.
pub struct HttpServer {
    state: AppState,
    tracker: ConnectionTracker,
    drain_timeout: Duration,
}

impl HttpServer {
    /// Create a server answering with `config` until a reload replaces it.
    pub fn new(config: Config) -> Self {
        Self {
            state: AppState {
                config: Arc::new(ArcSwap::from_pointee(config)),
            },
            tracker: ConnectionTracker::new(),
            drain_timeout: DRAIN_TIMEOUT,
        }
    }

    /// Override how long shutdown waits for open connections.
    pub fn with_drain_timeout(mut self, drain_timeout: Duration) -> Self {
        self.drain_timeout = drain_timeout;
        self
    }

    /// Run the server until `shutdown` fires.
    ///
    /// Configurations received on `config_updates` replace the live one.
    /// They must already be validated.
    pub async fn run(
        self,
        listener: Listener,
        mut config_updates: mpsc::UnboundedReceiver<Config>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), ServerError> {
        if let Ok(addr) = listener.local_addr() {
            tracing::info!(address = %addr, "HTTP server starting");
        }

        loop {
            tokio::select! {
                accepted = listener.accept() => match accepted {
                    Ok((stream, remote_addr, permit)) => {
                        self.spawn_connection(stream, remote_addr, permit, shutdown.resubscribe());
                    }
                    Err(ListenerError::Accept(e)) => {
                        tracing::warn!(error = %e, "Failed to accept connection");
                        tokio::time::sleep(ACCEPT_ERROR_BACKOFF).await;
                    }
                    Err(e) => return Err(e.into()),
                },
                Some(config) = config_updates.recv() => self.apply(config),
                _ = shutdown.recv() => break,
            }
        }

        drop(listener);
        tracing::info!(
            active_connections = self.tracker.active_count(),
            "Shutting down, draining connections"
        );

        let remaining = self.tracker.drain(self.drain_timeout).await;
        if remaining > 0 {
            tracing::warn!(remaining, "Drain timeout elapsed with connections still open");
        }

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    fn apply(&self, config: Config) {
        let current = self.state.config.load();
        if current.listen_address != config.listen_address {
            tracing::warn!(
                current = %current.listen_address,
                requested = %config.listen_address,
                "listen_address cannot change without a restart, ignoring it"
            );
        }

        tracing::info!(domains = config.domains.len(), "Configuration reloaded");
        self.state.config.store(Arc::new(config));
    }

    fn spawn_connection(
        &self,
        stream: TcpStream,
        remote_addr: SocketAddr,
        permit: ConnectionPermit,
        mut shutdown: broadcast::Receiver<()>,
    ) {
        let state = self.state.clone();
        let guard = self.tracker.track();

        tokio::spawn(async move {
            let _permit = permit;
            let connection_id = guard.id();
            let io = TokioIo::new(stream);

            let service = service_fn(move |request: Request<Incoming>| {
                handle(&state, &request, remote_addr)
            });

            let builder = AutoConnBuilder::new(TokioExecutor::new());
            let conn = builder.serve_connection(io, service);
            tokio::pin!(conn);

            let result = tokio::select! {
                result = conn.as_mut() => result,
                _ = shutdown.recv() => {
                    conn.as_mut().graceful_shutdown();
                    conn.await
                }
            };

            if let Err(e) = result {
                tracing::debug!(
                    connection_id = %connection_id,
                    peer_addr = %remote_addr,
                    error = %e,
                    "Connection ended with error"
                );
            }
            drop(guard);
        });
    }
}

/// Answer one request against the current configuration snapshot.
fn handle(
    state: &AppState,
    request: &Request<Incoming>,
    remote_addr: SocketAddr,
) -> Ready<Result<Response<ResponseBody>, CloseConnection>> {
    let start_time = Instant::now();
    let _in_flight = metrics::InFlightGuard::start();

    let config = state.config.load();
    let remote_addr = remote_addr.to_string();
    let facts = request_facts(request, &remote_addr, config.client_ip_header.as_deref());

    let decision = decide(&config, &facts);
    if decision.log_hits {
        logging::log_hit(&decision.hit(&facts));
    }

    let rendered = render(&decision, request.method(), request.version());
    metrics::record_request(&decision, facts.method, start_time);

    ready(match rendered {
        Rendered::Response(response) => Ok(response),
        Rendered::Close => Err(CloseConnection),
    })
}
