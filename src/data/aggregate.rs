//! Reduction of a merged cycle into totals and advisories.

use std::cmp::Ordering;

use tracing::warn;

use hawatch_feeds::{Cycle, FeedSource, MergedRecord};
use hawatch_types::{
    format_seconds, Advisory, AdvisoryKind, ClusterStatistics, Statistics, BACKEND, FRONTEND,
};

/// Knobs of the aggregation pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AggregateOptions {
    /// Suppress "no check" advisories.
    pub hide_no_check: bool,
    /// Current sessions above which an `UP` server gets an advisory.
    pub high_sessions_threshold: i64,
}

type AdvisoryKey = fn(&Advisory) -> &str;

fn by_group(advisory: &Advisory) -> &str {
    &advisory.group
}

fn by_server(advisory: &Advisory) -> &str {
    &advisory.server
}

/// Advisory display order.
const ADVISORY_ORDER: &[AdvisoryKey] = &[by_group, by_server];

/// Compare lexicographically over a list of key extractors.
fn compare_by(keys: &[AdvisoryKey], a: &Advisory, b: &Advisory) -> Ordering {
    keys.iter()
        .map(|key| key(a).cmp(key(b)))
        .find(|ordering| ordering.is_ne())
        .unwrap_or(Ordering::Equal)
}

/// Turns each cycle's [`Cycle`] into [`Statistics`].
#[derive(Debug, Clone)]
pub struct Aggregator {
    options: AggregateOptions,
}

impl Aggregator {
    pub fn new(options: AggregateOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &AggregateOptions {
        &self.options
    }

    /// Aggregate every configured cluster.
    ///
    /// Clusters are listed even when none of their feeds answered.
    pub fn aggregate(&self, cycle: &Cycle, sources: &[FeedSource]) -> Statistics {
        let clusters = sources
            .iter()
            .map(|source| self.aggregate_cluster(cycle, source))
            .collect();
        Statistics::from_clusters(clusters)
    }

    fn aggregate_cluster(&self, cycle: &Cycle, source: &FeedSource) -> ClusterStatistics {
        let mut stats = ClusterStatistics::new(&source.name, &source.display_name);
        stats.degraded = cycle.degraded_feeds(&source.name).to_vec();

        let Some(groups) = cycle.view.cluster(&source.name) else {
            return stats;
        };

        for (group, servers) in groups {
            for (server, record) in servers {
                if server == FRONTEND {
                    let sessions = counter(record, "scur", &source.name, group);
                    let rate = counter(record, "rate", &source.name, group);
                    stats.total_sessions = stats.total_sessions.wrapping_add(sessions);
                    stats.total_session_rate = stats.total_session_rate.wrapping_add(rate);
                    continue;
                }
                if server == BACKEND || !record.text("tracked").is_empty() {
                    continue;
                }
                if let Some(advisory) = self.classify(source, group, server, record) {
                    stats.advisories.push(advisory);
                }
            }
        }

        stats
            .advisories
            .sort_by(|a, b| compare_by(ADVISORY_ORDER, a, b));
        stats
    }

    fn classify(
        &self,
        source: &FeedSource,
        group: &str,
        server: &str,
        record: &MergedRecord,
    ) -> Option<Advisory> {
        let status = record.text("status");
        let (kind, message) = match status.as_ref() {
            "UP" => {
                if source.options.ignore_high_sessions {
                    return None;
                }
                let sessions = counter(record, "scur", &source.name, group);
                if sessions <= self.options.high_sessions_threshold {
                    return None;
                }
                (
                    AdvisoryKind::HighSessions,
                    format!("UP has high current sessions: {}", sessions),
                )
            }
            "0" => {
                warn!(cluster = %source.name, group, server, "server reports status 0");
                return None;
            }
            "no check" => {
                if self.options.hide_no_check {
                    return None;
                }
                (AdvisoryKind::NoCheck, "Server has no check defined!".to_string())
            }
            other => {
                let message = match record.int("lastchg") {
                    Some(seconds) => format!("{} for {}", other, format_seconds(seconds)),
                    None => format!("{} for {} seconds", other, record.text("lastchg")),
                };
                (AdvisoryKind::Status, message)
            }
        };

        Some(Advisory {
            group: group.to_string(),
            server: server.to_string(),
            kind,
            message,
        })
    }
}

/// Read a numeric field, counting anything unreadable as zero.
fn counter(record: &MergedRecord, field: &str, cluster: &str, group: &str) -> i64 {
    record.int(field).unwrap_or_else(|| {
        warn!(
            cluster,
            group,
            field,
            value = %record.text(field),
            "non-numeric counter treated as 0"
        );
        0
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use hawatch_feeds::{ClusterOptions, DuplicateDetection, Merger, Schema};

    const HEADER: &str = "# pxname,svname,scur,rate,status,tracked,lastchg\n";

    fn options(threshold: i64) -> AggregateOptions {
        AggregateOptions {
            hide_no_check: false,
            high_sessions_threshold: threshold,
        }
    }

    /// Build a cycle by decoding and merging tolerant feed bodies.
    fn cycle(cluster: &str, bodies: &[&str]) -> Cycle {
        let schema = Schema::tolerant();
        let merger = Merger::new(&schema, DuplicateDetection::NonEmpty);
        let mut cycle = Cycle::default();
        cycle.view.ensure_cluster(cluster);
        for body in bodies {
            let full = format!("{HEADER}{body}");
            for record in schema.decode(&full).unwrap() {
                merger.fold(&mut cycle.view, cluster, record.unwrap());
            }
        }
        cycle
    }

    fn source(name: &str) -> FeedSource {
        FeedSource::new(name, vec![format!("http://{name}/stats")])
    }

    #[test]
    fn test_frontend_totals_without_advisories() {
        let cycle = cycle("edge", &["www,FRONTEND,42,5,OPEN,,\n"]);
        let stats = Aggregator::new(options(50)).aggregate(&cycle, &[source("edge")]);

        let edge = stats.cluster("edge").unwrap();
        assert_eq!(edge.total_sessions, 42);
        assert_eq!(edge.total_session_rate, 5);
        assert!(edge.advisories.is_empty());
        assert_eq!(stats.total_sessions, 42);
        assert_eq!(stats.total_session_rate, 5);
    }

    #[test]
    fn test_duplicate_frontends_are_summed() {
        let cycle = cycle(
            "edge",
            &["www,FRONTEND,5,1,OPEN,,\n", "www,FRONTEND,7,2,OPEN,,\n"],
        );
        assert_eq!(
            cycle.view.record("edge", "www", "FRONTEND").unwrap().text("scur"),
            "12"
        );

        let stats = Aggregator::new(options(50)).aggregate(&cycle, &[source("edge")]);
        assert_eq!(stats.total_sessions, 12);
        assert_eq!(stats.total_session_rate, 3);
    }

    #[test]
    fn test_no_check_advisory() {
        let cycle = cycle("edge", &["www,web1,0,0,no check,,\n"]);

        let stats = Aggregator::new(options(50)).aggregate(&cycle, &[source("edge")]);
        let advisories = &stats.cluster("edge").unwrap().advisories;
        assert_eq!(advisories.len(), 1);
        assert_eq!(advisories[0].message, "Server has no check defined!");
        assert_eq!(advisories[0].kind, AdvisoryKind::NoCheck);

        let hidden = AggregateOptions {
            hide_no_check: true,
            ..options(50)
        };
        let stats = Aggregator::new(hidden).aggregate(&cycle, &[source("edge")]);
        assert!(stats.cluster("edge").unwrap().advisories.is_empty());
    }

    #[test]
    fn test_high_sessions_advisory() {
        let cycle = cycle("edge", &["www,web1,200,3,UP,,10\n", "www,web2,100,3,UP,,10\n"]);

        let stats = Aggregator::new(options(150)).aggregate(&cycle, &[source("edge")]);
        let advisories = &stats.cluster("edge").unwrap().advisories;
        assert_eq!(advisories.len(), 1);
        assert_eq!(advisories[0].server, "web1");
        assert_eq!(advisories[0].message, "UP has high current sessions: 200");

        // At the threshold is not above it.
        let stats = Aggregator::new(options(200)).aggregate(&cycle, &[source("edge")]);
        assert!(stats.cluster("edge").unwrap().advisories.is_empty());
    }

    #[test]
    fn test_ignore_high_sessions_option() {
        let cycle = cycle("edge", &["www,web1,200,3,UP,,10\n"]);
        let quiet = source("edge").with_options(ClusterOptions {
            ignore_high_sessions: true,
            ..ClusterOptions::default()
        });

        let stats = Aggregator::new(options(150)).aggregate(&cycle, &[quiet]);
        assert!(stats.cluster("edge").unwrap().advisories.is_empty());
    }

    #[test]
    fn test_status_advisory_formats_duration() {
        let cycle = cycle(
            "edge",
            &["www,web1,0,0,DOWN,,65\n", "api,web9,0,0,MAINT,,unknown\n"],
        );

        let stats = Aggregator::new(options(50)).aggregate(&cycle, &[source("edge")]);
        let advisories = &stats.cluster("edge").unwrap().advisories;
        assert_eq!(advisories.len(), 2);
        assert_eq!(advisories[0].group, "api");
        assert_eq!(advisories[0].message, "MAINT for unknown seconds");
        assert_eq!(advisories[1].message, "DOWN for 1m5s");
        assert_eq!(advisories[1].kind, AdvisoryKind::Status);
    }

    #[test]
    fn test_skipped_rows() {
        let cycle = cycle(
            "edge",
            &[
                "www,BACKEND,9,9,DOWN,,1\n",
                "www,web1,0,0,DOWN,www/web2,30\n",
                "www,web2,0,0,0,,30\n",
                "www,web3,1,0,UP,,30\n",
            ],
        );

        let stats = Aggregator::new(options(50)).aggregate(&cycle, &[source("edge")]);
        let edge = stats.cluster("edge").unwrap();
        assert!(edge.advisories.is_empty());
        assert_eq!(edge.total_sessions, 0);
    }

    #[test]
    fn test_advisories_ordered_by_group_then_server() {
        let cycle = cycle(
            "edge",
            &[
                "www,web2,0,0,DOWN,,1\n",
                "api,web3,0,0,DOWN,,1\n",
                "www,web1,0,0,DOWN,,1\n",
                "api,web1,0,0,DOWN,,1\n",
            ],
        );

        let stats = Aggregator::new(options(50)).aggregate(&cycle, &[source("edge")]);
        let order: Vec<(&str, &str)> = stats.cluster("edge").unwrap()
            .advisories
            .iter()
            .map(|a| (a.group.as_str(), a.server.as_str()))
            .collect();
        assert_eq!(
            order,
            vec![("api", "web1"), ("api", "web3"), ("www", "web1"), ("www", "web2")]
        );
    }

    #[test]
    fn test_global_totals_sum_clusters() {
        let schema = Schema::tolerant();
        let merger = Merger::new(&schema, DuplicateDetection::NonEmpty);
        let mut cycle = Cycle::default();
        for (cluster, body) in [
            ("west", "www,FRONTEND,10,1,OPEN,,\n"),
            ("east", "www,FRONTEND,32,4,OPEN,,\napi,FRONTEND,8,2,OPEN,,\n"),
        ] {
            let full = format!("{HEADER}{body}");
            for record in schema.decode(&full).unwrap() {
                merger.fold(&mut cycle.view, cluster, record.unwrap());
            }
        }

        let stats =
            Aggregator::new(options(50)).aggregate(&cycle, &[source("west"), source("east")]);

        let names: Vec<&str> = stats.clusters.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["east", "west"]);
        assert_eq!(stats.cluster("east").unwrap().total_sessions, 40);
        assert_eq!(stats.total_sessions, 50);
        assert_eq!(stats.total_session_rate, 7);
    }

    #[test]
    fn test_frontend_totals_wrap_on_overflow() {
        let mut cycle = cycle("edge", &["www,FRONTEND,1,1,OPEN,,\n"]);
        let mut record = MergedRecord::new();
        record.insert("scur", i64::MAX.to_string());
        record.insert("rate", "0");
        cycle
            .view
            .group_mut("edge", "api")
            .insert(FRONTEND.to_string(), record);

        let stats = Aggregator::new(options(50)).aggregate(&cycle, &[source("edge")]);
        assert_eq!(stats.total_sessions, i64::MIN);
        assert_eq!(stats.total_session_rate, 1);
    }

    #[test]
    fn test_unreadable_counter_counts_as_zero() {
        let mut cycle = cycle("edge", &["www,FRONTEND,5,1,OPEN,,\n"]);
        let mut record = MergedRecord::new();
        record.insert("scur", "5,x");
        record.insert("rate", "2");
        cycle
            .view
            .group_mut("edge", "api")
            .insert(FRONTEND.to_string(), record);

        let stats = Aggregator::new(options(50)).aggregate(&cycle, &[source("edge")]);
        assert_eq!(stats.total_sessions, 5);
        assert_eq!(stats.total_session_rate, 3);
    }

    #[test]
    fn test_degraded_feeds_are_carried() {
        let mut cycle = cycle("edge", &["www,FRONTEND,5,1,OPEN,,\n"]);
        cycle.degraded.insert(
            "edge".to_string(),
            vec![hawatch_types::DegradedFeed::new("http://lb2/", "Request timed out")],
        );

        let stats = Aggregator::new(options(50))
            .aggregate(&cycle, &[source("edge"), source("dark")]);
        assert!(stats.cluster("edge").unwrap().is_degraded());
        assert_eq!(stats.degraded_count(), 1);

        let dark = stats.cluster("dark").unwrap();
        assert_eq!(dark.total_sessions, 0);
        assert!(dark.advisories.is_empty());
    }
}
