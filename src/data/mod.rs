//! Per-cycle data as the monitor presents it.
//!
//! ## Data Flow
//!
//! ```text
//! Cycle (merged feeds)
//!        │
//!        ▼
//! Aggregator::aggregate()
//!        │
//!        ▼
//! Statistics ──▶ FleetData (timestamped, flattened for the advisory table)
//! ```

pub mod aggregate;

pub use aggregate::{AggregateOptions, Aggregator};

use std::fs;
use std::path::Path;
use std::time::Instant;

use anyhow::Result;

use hawatch_types::{Advisory, ClusterStatistics, Statistics};

/// Write statistics as pretty-printed JSON.
pub fn write_json(stats: &Statistics, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(stats)?;
    fs::write(path, json)?;
    Ok(())
}

/// The latest statistics received by the monitor.
#[derive(Debug, Clone)]
pub struct FleetData {
    pub stats: Statistics,
    pub last_updated: Instant,
}

/// One advisory together with the cluster it was raised in.
#[derive(Debug, Clone, Copy)]
pub struct AdvisoryRow<'a> {
    pub cluster: &'a ClusterStatistics,
    pub advisory: &'a Advisory,
}

impl FleetData {
    pub fn new(stats: Statistics) -> Self {
        Self {
            stats,
            last_updated: Instant::now(),
        }
    }

    /// All advisories, cluster by cluster.
    pub fn advisory_rows(&self) -> Vec<AdvisoryRow<'_>> {
        self.stats
            .clusters
            .iter()
            .flat_map(|cluster| {
                cluster
                    .advisories
                    .iter()
                    .map(move |advisory| AdvisoryRow { cluster, advisory })
            })
            .collect()
    }
}

impl AdvisoryRow<'_> {
    /// Text searched by the advisory filter.
    pub fn matches(&self, search: &str) -> bool {
        if search.is_empty() {
            return true;
        }
        let search = search.to_lowercase();
        [
            self.cluster.display_name.as_str(),
            self.advisory.group.as_str(),
            self.advisory.server.as_str(),
            self.advisory.message.as_str(),
        ]
        .iter()
        .any(|field| field.to_lowercase().contains(&search))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hawatch_types::AdvisoryKind;

    fn advisory(group: &str, server: &str, message: &str) -> Advisory {
        Advisory {
            group: group.to_string(),
            server: server.to_string(),
            kind: AdvisoryKind::Status,
            message: message.to_string(),
        }
    }

    fn sample() -> FleetData {
        let mut east = ClusterStatistics::new("east", "East");
        east.advisories = vec![advisory("www", "web1", "DOWN for 5s")];
        let mut west = ClusterStatistics::new("west", "West");
        west.advisories = vec![
            advisory("api", "app1", "MAINT for 1m0s"),
            advisory("api", "app2", "Server has no check defined!"),
        ];
        FleetData::new(Statistics::from_clusters(vec![west, east]))
    }

    #[test]
    fn test_advisory_rows_follow_cluster_order() {
        let data = sample();
        let rows = data.advisory_rows();
        let servers: Vec<(&str, &str)> = rows
            .iter()
            .map(|r| (r.cluster.name.as_str(), r.advisory.server.as_str()))
            .collect();
        assert_eq!(
            servers,
            vec![("east", "web1"), ("west", "app1"), ("west", "app2")]
        );
    }

    #[test]
    fn test_write_json_round_trips_through_file() {
        let data = sample();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stats.json");

        write_json(&data.stats, &path).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let read: Statistics = serde_json::from_str(&content).unwrap();
        assert_eq!(read, data.stats);
        assert!(content.contains("\"display_name\": \"West\""));
    }

    #[test]
    fn test_row_filter() {
        let data = sample();
        let rows = data.advisory_rows();
        assert_eq!(rows.iter().filter(|r| r.matches("")).count(), 3);
        assert_eq!(rows.iter().filter(|r| r.matches("WEST")).count(), 2);
        assert_eq!(rows.iter().filter(|r| r.matches("no check")).count(), 1);
        assert_eq!(rows.iter().filter(|r| r.matches("db")).count(), 0);
    }
}
