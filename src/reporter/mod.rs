//! Reporter role
//!
//! Pushes a notification to the collector every [`REPORT_INTERVAL`] until
//! shut down. Failed pushes are logged and otherwise ignored; the next tick
//! tries again with no backoff.

pub mod notifier;

use crate::lifecycle::{CompletionSender, LifecycleError, LifecycleToken, Role};
use async_trait::async_trait;
use notifier::{HttpNotifier, Notifier};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

pub use notifier::ReporterError;

pub const ROLE: &str = "reporter";

/// Fixed pause between two notification attempts
pub const REPORT_INTERVAL: Duration = Duration::from_secs(10);

#[derive(Debug, Clone)]
pub struct ReporterConfig {
    pub host: String,
    pub port: u16,
    pub interval: Duration,
}

impl ReporterConfig {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            interval: REPORT_INTERVAL,
        }
    }

    /// Collector URL notifications are sent to
    pub fn target_url(&self) -> String {
        format!("http://{}:{}/", self.host, self.port)
    }
}

impl From<ReporterError> for LifecycleError {
    fn from(err: ReporterError) -> Self {
        LifecycleError::Start {
            role: ROLE,
            source: Box::new(err),
        }
    }
}

pub struct Reporter {
    notifier: Arc<dyn Notifier>,
    interval: Duration,
    shutdown: CancellationToken,
}

impl Reporter {
    /// Reporter that notifies the collector over HTTP
    pub fn new(config: ReporterConfig) -> Result<Self, ReporterError> {
        let notifier = HttpNotifier::new(config.target_url())?;
        Ok(Self::with_notifier(Arc::new(notifier), config.interval))
    }

    /// Reporter with a custom transport
    pub fn with_notifier(notifier: Arc<dyn Notifier>, interval: Duration) -> Self {
        Self {
            notifier,
            interval,
            shutdown: CancellationToken::new(),
        }
    }
}

/// The periodic push loop; returns once shutdown has been observed
async fn report_loop(notifier: Arc<dyn Notifier>, interval: Duration, shutdown: CancellationToken) {
    log::info!("client begin notice to {}", notifier.target());

    loop {
        if shutdown.is_cancelled() {
            break;
        }

        match notifier.notify().await {
            Ok(()) => log::debug!("Notified {}", notifier.target()),
            Err(e) => log::warn!("{}", e),
        }

        tokio::select! {
            _ = tokio::time::sleep(interval) => {}
            _ = shutdown.cancelled() => {}
        }
    }

    log::info!("receive close & stop notice.");
}

#[async_trait]
impl Role for Reporter {
    fn name(&self) -> &'static str {
        ROLE
    }

    async fn run(&self, completion: CompletionSender) -> Result<(), LifecycleError> {
        let notifier = Arc::clone(&self.notifier);
        let interval = self.interval;
        let shutdown = self.shutdown.clone();

        tokio::spawn(async move {
            report_loop(notifier, interval, shutdown).await;
            if completion.send(LifecycleToken { role: ROLE }).await.is_err() {
                log::warn!("completion channel closed before reporter finished");
            }
        });

        Ok(())
    }

    fn shutdown(&self) {
        self.shutdown.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_url() {
        let config = ReporterConfig::new("192.168.2.3", 9404);

        assert_eq!(config.target_url(), "http://192.168.2.3:9404/");
        assert_eq!(config.interval, REPORT_INTERVAL);
    }

    #[test]
    fn test_reporter_error_maps_to_start_failure() {
        let err = ReporterError::Status {
            url: "http://x/".to_string(),
            status: reqwest::StatusCode::BAD_GATEWAY,
        };

        let lifecycle: LifecycleError = err.into();
        assert!(matches!(lifecycle, LifecycleError::Start { role: ROLE, .. }));
    }
}
