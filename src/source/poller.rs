//! Background poll loop.
//!
//! Runs fetch → merge → aggregate once per interval and publishes each
//! outcome to a [`ChannelSource`].

use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info};

use hawatch_feeds::{CycleError, FeedFetcher, FeedSource, Loader};
use hawatch_types::Statistics;

use super::{ChannelSource, CycleUpdate};
use crate::config::{ConfigError, Settings};
use crate::data::Aggregator;

/// Drives poll cycles for a fixed set of clusters.
#[derive(Debug, Clone)]
pub struct Poller {
    loader: Loader,
    aggregator: Aggregator,
    sources: Vec<FeedSource>,
    interval: Duration,
}

impl Poller {
    pub fn new(
        loader: Loader,
        aggregator: Aggregator,
        sources: Vec<FeedSource>,
        interval: Duration,
    ) -> Self {
        Self {
            loader,
            aggregator,
            sources,
            interval,
        }
    }

    /// Build the fetcher, schema and aggregator the settings describe.
    pub fn from_settings(settings: &Settings) -> Result<Self, ConfigError> {
        let fetcher = FeedFetcher::builder().timeout(settings.timeout()).build()?;
        let loader =
            Loader::new(fetcher, settings.schema()?).with_detection(settings.detection());
        Ok(Self::new(
            loader,
            Aggregator::new(settings.aggregate_options()),
            settings.sources(),
            settings.interval(),
        ))
    }

    pub fn sources(&self) -> &[FeedSource] {
        &self.sources
    }

    /// Run one complete cycle.
    pub async fn run_cycle(&self) -> Result<Statistics, CycleError> {
        let cycle = self.loader.load(&self.sources).await?;
        Ok(self.aggregator.aggregate(&cycle, &self.sources))
    }

    /// Poll forever, publishing every outcome.
    ///
    /// Returns once nobody is listening any more.
    pub async fn run(self, tx: watch::Sender<CycleUpdate>) {
        loop {
            let update = match self.run_cycle().await {
                Ok(stats) => {
                    info!(
                        sessions = stats.total_sessions,
                        advisories = stats.advisory_count(),
                        degraded = stats.degraded_count(),
                        "poll cycle complete"
                    );
                    CycleUpdate::Ready(stats)
                }
                Err(e) => {
                    error!(error = %e, "poll cycle failed");
                    CycleUpdate::Failed(e.to_string())
                }
            };

            if tx.send(update).is_err() {
                break;
            }
            tokio::time::sleep(self.interval).await;
        }
    }

    /// Start polling on the current runtime.
    ///
    /// # Returns
    ///
    /// A tuple of (source, handle) where:
    /// - source is a ChannelSource for the TUI
    /// - handle is the background poll task
    pub fn spawn(self) -> (ChannelSource, JoinHandle<()>) {
        let description = match self.sources.len() {
            1 => "polling 1 loadbalancer".to_string(),
            n => format!("polling {} loadbalancers", n),
        };
        let (tx, source) = ChannelSource::create(&description);
        let handle = tokio::spawn(self.run(tx));
        (source, handle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::AggregateOptions;
    use crate::source::DataSource;
    use hawatch_feeds::{FeedFetcher, Schema};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    const FEED: &str = "\
# pxname,svname,scur,rate,status,tracked,lastchg
www,FRONTEND,42,5,OPEN,,
www,web1,0,0,DOWN,,65
";

    /// Serve `body` to every request on an ephemeral port.
    async fn serve(body: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            while let Ok((mut stream, _)) = listener.accept().await {
                tokio::spawn(async move {
                    let mut buf = [0u8; 2048];
                    let _ = stream.read(&mut buf).await;
                    let response = format!(
                        "HTTP/1.1 200 OK\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                        body.len(),
                        body
                    );
                    let _ = stream.write_all(response.as_bytes()).await;
                });
            }
        });
        format!("http://{}/stats;csv", addr)
    }

    fn poller(urls: Vec<String>) -> Poller {
        let fetcher = FeedFetcher::builder()
            .timeout(Duration::from_secs(2))
            .build()
            .unwrap();
        Poller::new(
            Loader::new(fetcher, Schema::tolerant()),
            Aggregator::new(AggregateOptions {
                hide_no_check: false,
                high_sessions_threshold: 150,
            }),
            vec![FeedSource::new("edge", urls)],
            Duration::from_millis(50),
        )
    }

    #[test]
    fn test_from_settings() {
        let settings = Settings::from_yaml(
            r#"
schema: strict
interval: 7
high_sessions_threshold: 50
loadbalancers:
  edge:
    urls: [http://lb1/stats, http://lb2/stats]
  core:
    name: Core
    urls: [http://lb3/stats]
"#,
        )
        .unwrap();

        let poller = Poller::from_settings(&settings).unwrap();
        let names: Vec<&str> = poller.sources().iter().map(|s| s.display_name.as_str()).collect();
        assert_eq!(names, vec!["Core", "edge"]);
        assert_eq!(poller.interval, Duration::from_secs(7));
        assert_eq!(poller.loader.detection(), hawatch_feeds::DuplicateDetection::Presence);
    }

    #[tokio::test]
    async fn test_run_cycle() {
        let url = serve(FEED).await;
        let stats = poller(vec![url]).run_cycle().await.unwrap();

        assert_eq!(stats.total_sessions, 42);
        let edge = stats.cluster("edge").unwrap();
        assert_eq!(edge.advisories.len(), 1);
        assert_eq!(edge.advisories[0].message, "DOWN for 1m5s");
    }

    #[tokio::test]
    async fn test_spawn_publishes_cycles() {
        let url = serve(FEED).await;
        let (mut source, handle) = poller(vec![url]).spawn();
        assert_eq!(source.description(), "polling 1 loadbalancer");

        let mut stats = None;
        for _ in 0..100 {
            if let Some(s) = source.poll() {
                stats = Some(s);
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        handle.abort();

        assert_eq!(stats.unwrap().total_session_rate, 5);
    }

    #[tokio::test]
    async fn test_failed_cycle_is_published() {
        let url = serve("www,web1\n").await;
        let (mut source, handle) = poller(vec![url]).spawn();

        for _ in 0..100 {
            assert!(source.poll().is_none());
            if source.error().is_some() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        handle.abort();

        assert!(source.error().unwrap().contains("Missing column"));
    }
}
