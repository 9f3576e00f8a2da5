//! Concurrent retrieval of feed bodies.
//!
//! [`FeedFetcher::spawn_all`] starts one task per feed URL, all at once, and
//! hands back the receiving end of a completion channel. Responses arrive in
//! the order the requests finish, not in configuration order.

use std::time::Duration;

use reqwest::Client;
use tokio::sync::mpsc;
use tracing::debug;

use crate::source::FeedSource;
use crate::FeedError;

/// The outcome of retrieving one feed URL.
#[derive(Debug)]
pub struct FeedResponse {
    /// Key of the cluster the URL belongs to.
    pub cluster: String,
    pub url: String,
    pub body: Result<String, FeedError>,
}

/// HTTP client for statistics feeds.
///
/// Cloning is cheap; clones share one connection pool.
#[derive(Debug, Clone)]
pub struct FeedFetcher {
    client: Client,
}

impl FeedFetcher {
    /// Create a new builder for configuring the fetcher.
    pub fn builder() -> FeedFetcherBuilder {
        FeedFetcherBuilder::default()
    }

    /// Use an already configured client.
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    /// Retrieve one feed body.
    pub async fn fetch(&self, url: &str) -> Result<String, FeedError> {
        let response = self.client.get(url).send().await?;

        if !response.status().is_success() {
            return Err(FeedError::Status(response.status().as_u16()));
        }

        Ok(response.text().await?)
    }

    /// Start retrieving every URL of every source.
    ///
    /// Returns the completion channel and the number of responses to expect
    /// on it. The channel holds one slot per URL, so no task ever waits on a
    /// slow consumer.
    pub fn spawn_all(&self, sources: &[FeedSource]) -> (mpsc::Receiver<FeedResponse>, usize) {
        let expected: usize = sources.iter().map(|s| s.urls.len()).sum();
        let (tx, rx) = mpsc::channel(expected.max(1));

        for source in sources {
            for url in &source.urls {
                let fetcher = self.clone();
                let tx = tx.clone();
                let cluster = source.name.clone();
                let url = url.clone();

                tokio::spawn(async move {
                    debug!(%cluster, %url, "requesting feed");
                    let body = fetcher.fetch(&url).await;
                    // The receiver is gone once a cycle has been aborted.
                    let _ = tx.send(FeedResponse { cluster, url, body }).await;
                });
            }
        }

        (rx, expected)
    }
}

/// Builder for [`FeedFetcher`].
#[derive(Debug, Default)]
pub struct FeedFetcherBuilder {
    timeout: Option<Duration>,
}

impl FeedFetcherBuilder {
    /// Set the per-request timeout (default: 5 seconds).
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Build the fetcher.
    pub fn build(self) -> Result<FeedFetcher, FeedError> {
        let timeout = self.timeout.unwrap_or(Duration::from_secs(5));

        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("hawatch/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| FeedError::Client(e.to_string()))?;

        Ok(FeedFetcher { client })
    }
}
