//! Notification transport used by the reporter loop

use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;

/// Client-side timeout for one notification
pub const NOTIFY_TIMEOUT: Duration = Duration::from_secs(10);

/// Form body sent with every notification (`up=true`)
#[derive(Debug, Clone, Serialize)]
pub struct NotifyForm {
    pub up: bool,
}

impl Default for NotifyForm {
    fn default() -> Self {
        Self { up: true }
    }
}

#[derive(Debug, Error)]
pub enum ReporterError {
    #[error("failed to build http client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("notification to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("collector at {url} answered {status}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },
}

/// One "I am here" push to the collector
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self) -> Result<(), ReporterError>;

    /// Destination, for logging
    fn target(&self) -> &str;
}

/// Notifier that POSTs the marker form over HTTP
pub struct HttpNotifier {
    client: reqwest::Client,
    url: String,
}

impl HttpNotifier {
    pub fn new(url: impl Into<String>) -> Result<Self, ReporterError> {
        let client = reqwest::Client::builder()
            .timeout(NOTIFY_TIMEOUT)
            // The collector drops idle connections after as long as one interval
            .pool_max_idle_per_host(0)
            .build()
            .map_err(ReporterError::Client)?;

        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

#[async_trait]
impl Notifier for HttpNotifier {
    async fn notify(&self) -> Result<(), ReporterError> {
        let response = self
            .client
            .post(&self.url)
            .form(&NotifyForm::default())
            .send()
            .await
            .map_err(|source| ReporterError::Transport {
                url: self.url.clone(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ReporterError::Status {
                url: self.url.clone(),
                status,
            });
        }

        Ok(())
    }

    fn target(&self) -> &str {
        &self.url
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unreachable_collector_is_transport_error() {
        // Bind then drop to get a port nothing listens on
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let notifier = HttpNotifier::new(format!("http://127.0.0.1:{}/", port)).unwrap();

        let result = notifier.notify().await;

        assert!(matches!(result, Err(ReporterError::Transport { .. })));
    }

    #[test]
    fn test_target_is_url() {
        let notifier = HttpNotifier::new("http://10.0.0.1:9404/").unwrap();

        assert_eq!(notifier.target(), "http://10.0.0.1:9404/");
    }
}
