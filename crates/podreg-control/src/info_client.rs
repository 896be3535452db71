//! Runtime container info sources.
//!
//! A [`PodInfoGetter`] answers "what is the container runtime reporting for
//! pod X on host Y". [`InfoError::NotAvailable`] is the expected miss: the
//! node has not reported the pod yet, and callers treat it as "no data".

use std::time::Duration;

use async_trait::async_trait;
use podreg_core::{PodId, PodInfo};
use thiserror::Error;
use tracing::debug;

/// Errors from runtime info sources.
#[derive(Debug, Error)]
pub enum InfoError {
    /// The source has no info for this pod yet.
    #[error("pod info not available")]
    NotAvailable,

    /// The node answered with an unexpected status.
    #[error("node returned status {0}")]
    Http(u16),

    /// The request could not be made or its body could not be read.
    #[error("info request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Info client setup failed.
    #[error("info client configuration error: {0}")]
    Config(String),
}

impl InfoError {
    /// Returns true for the expected "not yet reported" miss.
    #[must_use]
    pub const fn is_not_available(&self) -> bool {
        matches!(self, Self::NotAvailable)
    }
}

/// A source of per-pod container runtime info.
#[async_trait]
pub trait PodInfoGetter: Send + Sync {
    /// Get the container info for `pod_id` running on `host`.
    ///
    /// # Errors
    ///
    /// Returns `InfoError::NotAvailable` when the source has nothing for the
    /// pod, or another error if the query fails.
    async fn get_pod_info(&self, host: &str, pod_id: &PodId) -> Result<PodInfo, InfoError>;
}

/// Queries the info endpoint each node serves.
///
/// `GET http://{host}:{port}/podInfo?podID={id}` returns the pod's
/// container map as JSON; `404` means the node doesn't know the pod.
#[derive(Debug, Clone)]
pub struct HttpPodInfoGetter {
    client: reqwest::Client,
    port: u16,
}

impl HttpPodInfoGetter {
    /// Create a getter for nodes listening on `port`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(port: u16, timeout: Duration) -> Result<Self, InfoError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .build()
            .map_err(|e| InfoError::Config(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self { client, port })
    }

    /// Create a getter with a custom reqwest client.
    #[must_use]
    pub fn with_client(client: reqwest::Client, port: u16) -> Self {
        Self { client, port }
    }

    /// The port queried on each node.
    #[must_use]
    pub const fn port(&self) -> u16 {
        self.port
    }
}

#[async_trait]
impl PodInfoGetter for HttpPodInfoGetter {
    async fn get_pod_info(&self, host: &str, pod_id: &PodId) -> Result<PodInfo, InfoError> {
        let url = format!("http://{host}:{}/podInfo", self.port);

        let response = self
            .client
            .get(&url)
            .query(&[("podID", pod_id.as_str())])
            .send()
            .await?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(InfoError::NotAvailable);
        }
        if !status.is_success() {
            debug!(host = %host, pod_id = %pod_id, status = %status, "Node info request failed");
            return Err(InfoError::Http(status.as_u16()));
        }

        Ok(response.json::<PodInfo>().await?)
    }
}
