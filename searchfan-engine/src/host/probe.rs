//! Health probing for supervised services.

use async_trait::async_trait;
use std::time::{Duration, Instant};
use tracing::debug;

/// Default per-probe timeout.
const PROBE_TIMEOUT_SECS: u64 = 3;

/// A yes/no health check against a running service.
///
/// Probes never error: any failure to get a positive answer is simply
/// `false`, so callers can poll without error handling.
#[async_trait]
pub trait HealthProbe: Send + Sync {
    /// Returns true if the service answered the probe.
    async fn check(&self) -> bool;
}

/// [`HealthProbe`] that issues an HTTP GET and requires a 2xx answer.
pub struct HttpHealthProbe {
    client: reqwest::Client,
    url: String,
}

impl HttpHealthProbe {
    /// Creates a probe for the given health endpoint URL.
    pub fn new(url: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(PROBE_TIMEOUT_SECS))
            .build()
            .unwrap_or_default();
        Self {
            client,
            url: url.into(),
        }
    }

    /// The probed URL.
    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl HealthProbe for HttpHealthProbe {
    async fn check(&self) -> bool {
        let start = Instant::now();
        let healthy = match self.client.get(&self.url).send().await {
            Ok(response) => response.status().is_success(),
            Err(error) => {
                debug!(url = %self.url, error = %error, "Health probe request failed");
                false
            }
        };
        debug!(
            url = %self.url,
            healthy,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Health probe completed"
        );
        healthy
    }
}
