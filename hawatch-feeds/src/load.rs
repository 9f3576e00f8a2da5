//! One poll cycle: fetch, decode and merge every feed.

use std::collections::BTreeMap;

use tracing::{debug, info, warn};

use hawatch_types::{ClusterView, DegradedFeed};

use crate::fetch::{FeedFetcher, FeedResponse};
use crate::merge::{DuplicateDetection, Merger};
use crate::schema::Schema;
use crate::source::FeedSource;
use crate::CycleError;

/// Reject source lists that cannot produce a cycle.
pub fn validate_sources(sources: &[FeedSource]) -> Result<(), CycleError> {
    if sources.is_empty() {
        return Err(CycleError::NoClusters);
    }
    match sources.iter().find(|s| s.urls.is_empty()) {
        Some(source) => Err(CycleError::EmptyUrls(source.name.clone())),
        None => Ok(()),
    }
}

/// The merged result of one poll cycle.
#[derive(Debug, Clone, Default)]
pub struct Cycle {
    /// Every cluster polled, including clusters whose feeds all failed.
    pub view: ClusterView,
    /// Failed feeds by cluster key.
    pub degraded: BTreeMap<String, Vec<DegradedFeed>>,
}

impl Cycle {
    /// Whether any feed of `cluster` failed this cycle.
    pub fn is_degraded(&self, cluster: &str) -> bool {
        self.degraded.get(cluster).is_some_and(|feeds| !feeds.is_empty())
    }

    /// Failed feeds of `cluster`.
    pub fn degraded_feeds(&self, cluster: &str) -> &[DegradedFeed] {
        self.degraded.get(cluster).map(Vec::as_slice).unwrap_or_default()
    }
}

/// Runs poll cycles against a fixed schema.
#[derive(Debug, Clone)]
pub struct Loader {
    fetcher: FeedFetcher,
    schema: Schema,
    detection: DuplicateDetection,
}

impl Loader {
    /// Create a loader using the duplicate predicate paired with the
    /// schema's mode.
    pub fn new(fetcher: FeedFetcher, schema: Schema) -> Self {
        let detection = DuplicateDetection::for_mode(schema.mode());
        Self {
            fetcher,
            schema,
            detection,
        }
    }

    /// Override the duplicate-detection predicate.
    pub fn with_detection(mut self, detection: DuplicateDetection) -> Self {
        self.detection = detection;
        self
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn detection(&self) -> DuplicateDetection {
        self.detection
    }

    /// Fetch every feed of every source and merge the results.
    ///
    /// Responses are folded in as they complete. A failed retrieval is
    /// recorded as degraded; a body that fails to decode aborts the cycle
    /// and nothing from it is returned.
    pub async fn load(&self, sources: &[FeedSource]) -> Result<Cycle, CycleError> {
        validate_sources(sources)?;

        let (mut rx, expected) = self.fetcher.spawn_all(sources);
        let merger = Merger::new(&self.schema, self.detection);

        let mut cycle = Cycle::default();
        for source in sources {
            cycle.view.ensure_cluster(&source.name);
        }

        let mut received = 0;
        while received < expected {
            let Some(response) = rx.recv().await else {
                return Err(CycleError::Incomplete {
                    missing: expected - received,
                });
            };
            received += 1;
            self.fold_response(&merger, &mut cycle, response)?;
        }

        info!(
            clusters = cycle.view.len(),
            servers = cycle.view.server_count(),
            degraded = cycle.degraded.values().map(Vec::len).sum::<usize>(),
            "poll cycle merged"
        );
        Ok(cycle)
    }

    fn fold_response(
        &self,
        merger: &Merger<'_>,
        cycle: &mut Cycle,
        response: FeedResponse,
    ) -> Result<(), CycleError> {
        let FeedResponse { cluster, url, body } = response;

        let body = match body {
            Ok(body) => body,
            Err(e) => {
                warn!(%cluster, %url, error = %e, "feed unavailable");
                cycle
                    .degraded
                    .entry(cluster)
                    .or_default()
                    .push(DegradedFeed::new(url, e.to_string()));
                return Ok(());
            }
        };

        let decode_error = |source| CycleError::Decode {
            cluster: cluster.clone(),
            url: url.clone(),
            source,
        };

        let mut rows = 0usize;
        for record in self.schema.decode(&body).map_err(decode_error)? {
            merger.fold(&mut cycle.view, &cluster, record.map_err(decode_error)?);
            rows += 1;
        }
        debug!(%cluster, %url, rows, "feed merged");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Route, TestServer};
    use crate::{DecodeError, SchemaMode};
    use std::time::Duration;

    const LB1: &str = "\
# pxname,svname,scur,rate,status,tracked,lastchg
www,FRONTEND,10,4,OPEN,,
www,web1,5,1,UP,,65
www,web2,0,0,DOWN,,120
";

    const LB2: &str = "\
# pxname,svname,scur,rate,status,tracked,lastchg
www,FRONTEND,32,1,OPEN,,
www,web1,7,2,DOWN,,3
";

    fn loader() -> Loader {
        let fetcher = FeedFetcher::builder()
            .timeout(Duration::from_secs(2))
            .build()
            .unwrap();
        Loader::new(fetcher, Schema::tolerant())
    }

    #[test]
    fn test_validate_sources() {
        assert!(matches!(validate_sources(&[]), Err(CycleError::NoClusters)));

        let sources = vec![
            FeedSource::new("east", vec!["http://lb1/".to_string()]),
            FeedSource::new("west", vec![]),
        ];
        assert!(matches!(
            validate_sources(&sources),
            Err(CycleError::EmptyUrls(name)) if name == "west"
        ));

        assert!(validate_sources(&sources[..1]).is_ok());
    }

    #[test]
    fn test_loader_detection_follows_mode() {
        let fetcher = FeedFetcher::builder().build().unwrap();
        let strict = Loader::new(fetcher.clone(), Schema::strict());
        assert_eq!(strict.detection(), DuplicateDetection::Presence);
        assert_eq!(strict.schema().mode(), SchemaMode::Strict);

        let tolerant = Loader::new(fetcher, Schema::tolerant())
            .with_detection(DuplicateDetection::Presence);
        assert_eq!(tolerant.detection(), DuplicateDetection::Presence);
    }

    #[tokio::test]
    async fn test_load_merges_feeds_of_one_cluster() {
        let server = TestServer::start(vec![Route::ok("/lb1", LB1), Route::ok("/lb2", LB2)]).await;
        let sources = vec![FeedSource::new(
            "edge",
            vec![server.url("/lb1"), server.url("/lb2")],
        )];

        let cycle = loader().load(&sources).await.unwrap();

        assert!(!cycle.is_degraded("edge"));
        assert_eq!(cycle.view.server_count(), 3);

        let frontend = cycle.view.record("edge", "www", "FRONTEND").unwrap();
        assert_eq!(frontend.text("scur"), "42");
        assert_eq!(frontend.text("rate"), "5");

        let web1 = cycle.view.record("edge", "www", "web1").unwrap();
        assert_eq!(web1.text("scur"), "12");
        let status = web1.text("status");
        assert!(status == "UP,DOWN" || status == "DOWN,UP", "got {status}");
    }

    #[tokio::test]
    async fn test_load_records_degraded_feed() {
        let server = TestServer::start(vec![Route::ok("/lb1", LB1), Route::status("/lb2", 503)]).await;
        let sources = vec![
            FeedSource::new("edge", vec![server.url("/lb1"), server.url("/lb2")]),
            FeedSource::new("dark", vec![server.url("/gone")]),
        ];

        let cycle = loader().load(&sources).await.unwrap();

        assert!(cycle.is_degraded("edge"));
        let degraded = cycle.degraded_feeds("edge");
        assert_eq!(degraded.len(), 1);
        assert_eq!(degraded[0].url, server.url("/lb2"));
        assert!(degraded[0].reason.contains("503"));

        assert_eq!(
            cycle.view.record("edge", "www", "FRONTEND").unwrap().text("scur"),
            "10"
        );

        // A cluster whose only feed failed is still part of the view.
        assert!(cycle.is_degraded("dark"));
        assert!(cycle.view.cluster("dark").unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_load_fails_on_decode_error() {
        let bad = "# pxname,svname,scur,status,tracked,lastchg\nwww,web1,1,UP,,3\n";
        let server = TestServer::start(vec![Route::ok("/lb1", LB1), Route::ok("/bad", bad)]).await;
        let sources = vec![FeedSource::new(
            "edge",
            vec![server.url("/lb1"), server.url("/bad")],
        )];

        let err = loader().load(&sources).await.unwrap_err();
        match err {
            CycleError::Decode {
                cluster,
                url,
                source: DecodeError::MissingColumn(column),
            } => {
                assert_eq!(cluster, "edge");
                assert_eq!(url, server.url("/bad"));
                assert_eq!(column, "rate");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_strict_cycle_rejects_wrongly_sized_row() {
        let server = TestServer::start(vec![Route::ok("/lb1", "www,web1,1,UP\n")]).await;
        let fetcher = FeedFetcher::builder().build().unwrap();
        let loader = Loader::new(fetcher, Schema::strict());
        let sources = vec![FeedSource::new("edge", vec![server.url("/lb1")])];

        let err = loader.load(&sources).await.unwrap_err();
        assert!(matches!(
            err,
            CycleError::Decode {
                source: DecodeError::FieldCountMismatch { found: 4, .. },
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_load_rejects_invalid_sources() {
        let err = loader().load(&[]).await.unwrap_err();
        assert!(matches!(err, CycleError::NoClusters));
    }
}
