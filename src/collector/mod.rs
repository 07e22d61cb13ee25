//! Collector role
//!
//! Listens for reporter notifications, records the caller's address in the
//! [`Ledger`] and serves the rendered history. Shutdown closes the listener,
//! drains in-flight requests for a bounded time and publishes a
//! [`LifecycleToken`].

pub mod conn;
pub mod page;
pub mod pid_file;
pub mod server;

use crate::ledger::{Ledger, SEED_ADDRESS};
use crate::lifecycle::{CompletionSender, LifecycleError, LifecycleToken, Role};
use async_trait::async_trait;
use axum::serve::ListenerExt;
use conn::TimedListener;
use parking_lot::Mutex;
use pid_file::PidFile;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

pub const ROLE: &str = "collector";

/// How long shutdown waits for in-flight requests before giving up on them
///
/// Connections still open after that end at their own [`REQUEST_TIMEOUT`].
pub const DRAIN_TIMEOUT: Duration = Duration::from_secs(10);

/// How long a connection may stall on a read or write before it is dropped
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone)]
pub struct CollectorConfig {
    pub host: String,
    pub port: u16,
    pub pid_file: Option<PathBuf>,
    /// First ledger entry, shown until a reporter checks in
    pub seed: String,
    pub request_timeout: Duration,
    pub drain_timeout: Duration,
}

impl CollectorConfig {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            pid_file: None,
            seed: SEED_ADDRESS.to_string(),
            request_timeout: REQUEST_TIMEOUT,
            drain_timeout: DRAIN_TIMEOUT,
        }
    }

    pub fn with_pid_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.pid_file = Some(path.into());
        self
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Error)]
pub enum CollectorError {
    #[error("failed to write pid file {path}: {source}")]
    PidFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to listen on {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },
}

impl From<CollectorError> for LifecycleError {
    fn from(err: CollectorError) -> Self {
        LifecycleError::Start {
            role: ROLE,
            source: Box::new(err),
        }
    }
}

pub struct Collector {
    config: CollectorConfig,
    ledger: Arc<Ledger>,
    shutdown: CancellationToken,
    pid_file: Mutex<Option<PidFile>>,
    local_addr: Mutex<Option<SocketAddr>>,
}

impl Collector {
    /// Create the collector, writing the pid file if one is configured
    pub fn new(config: CollectorConfig) -> Result<Self, CollectorError> {
        let pid_file = match &config.pid_file {
            Some(path) => Some(PidFile::create(path).map_err(|source| CollectorError::PidFile {
                path: path.clone(),
                source,
            })?),
            None => None,
        };

        Ok(Self {
            ledger: Arc::new(Ledger::new(config.seed.clone())),
            config,
            shutdown: CancellationToken::new(),
            pid_file: Mutex::new(pid_file),
            local_addr: Mutex::new(None),
        })
    }

    pub fn config(&self) -> &CollectorConfig {
        &self.config
    }

    /// The ledger served by this collector
    pub fn ledger(&self) -> Arc<Ledger> {
        Arc::clone(&self.ledger)
    }

    /// Bound address, available once `run` has succeeded
    pub fn local_addr(&self) -> Option<SocketAddr> {
        *self.local_addr.lock()
    }

    fn release_pid_file(&self) {
        if let Some(pid_file) = self.pid_file.lock().take() {
            pid_file.remove();
        }
    }
}

#[async_trait]
impl Role for Collector {
    fn name(&self) -> &'static str {
        ROLE
    }

    async fn run(&self, completion: CompletionSender) -> Result<(), LifecycleError> {
        let addr = self.config.listen_addr();
        let bound = TcpListener::bind(&addr)
            .await
            .and_then(|listener| listener.local_addr().map(|local| (listener, local)));
        let (listener, local_addr) = match bound {
            Ok(bound) => bound,
            Err(source) => {
                // Never started, so nothing else will clean up after us
                self.release_pid_file();
                return Err(CollectorError::Bind { addr, source }.into());
            }
        };
        *self.local_addr.lock() = Some(local_addr);

        // A no-op tap lets axum derive `ConnectInfo<SocketAddr>` for the custom listener
        let listener =
            TimedListener::new(listener, self.config.request_timeout).tap_io(|_| {});
        let app = server::router(self.ledger());
        let serve_shutdown = self.shutdown.clone();
        let server = tokio::spawn(async move {
            axum::serve(
                listener,
                app.into_make_service_with_connect_info::<SocketAddr>(),
            )
            .with_graceful_shutdown(serve_shutdown.cancelled_owned())
            .await
        });
        let server_abort = server.abort_handle();

        let shutdown = self.shutdown.clone();
        let drain_timeout = self.config.drain_timeout;
        tokio::spawn(async move {
            shutdown.cancelled().await;
            log::info!("receive close & close listen.");

            match tokio::time::timeout(drain_timeout, server).await {
                Ok(Ok(Ok(()))) => log::info!("listener closed"),
                Ok(Ok(Err(e))) => log::warn!("server stopped with error: {}", e),
                Ok(Err(e)) => log::error!("server task failed: {}", e),
                Err(_) => {
                    log::warn!(
                        "requests still in flight after {:?}, dropping them",
                        drain_timeout
                    );
                    server_abort.abort();
                }
            }

            if completion.send(LifecycleToken { role: ROLE }).await.is_err() {
                log::warn!("completion channel closed before collector finished");
            }
        });

        log::info!("server begin receive on {}", local_addr);
        Ok(())
    }

    fn shutdown(&self) {
        self.release_pid_file();
        self.shutdown.cancel();
    }
}
