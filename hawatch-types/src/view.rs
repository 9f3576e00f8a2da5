//! ClusterView - the merged state of every cluster for one poll cycle.

use std::collections::BTreeMap;

use crate::MergedRecord;

/// Servers of one group, keyed by server name.
pub type GroupMap = BTreeMap<String, MergedRecord>;

/// Groups of one cluster, keyed by group name.
pub type LoadbalancerMap = BTreeMap<String, GroupMap>;

/// Mapping from cluster name → group name → server name → [`MergedRecord`].
///
/// A view is built from scratch every cycle and handed to the aggregator
/// once all feeds have been folded in. Nothing carries over between cycles.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct ClusterView {
    clusters: BTreeMap<String, LoadbalancerMap>,
}

impl ClusterView {
    /// Create an empty view.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a cluster so it shows up even when no feed returned rows.
    pub fn ensure_cluster(&mut self, cluster: &str) {
        if !self.clusters.contains_key(cluster) {
            self.clusters.insert(cluster.to_string(), LoadbalancerMap::new());
        }
    }

    /// The server map of a group, creating the cluster and group on first use.
    pub fn group_mut(&mut self, cluster: &str, group: &str) -> &mut GroupMap {
        self.clusters
            .entry(cluster.to_string())
            .or_default()
            .entry(group.to_string())
            .or_default()
    }

    /// Groups of a cluster.
    pub fn cluster(&self, cluster: &str) -> Option<&LoadbalancerMap> {
        self.clusters.get(cluster)
    }

    /// A single merged record.
    pub fn record(&self, cluster: &str, group: &str, server: &str) -> Option<&MergedRecord> {
        self.clusters.get(cluster)?.get(group)?.get(server)
    }

    /// Iterate over clusters in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &LoadbalancerMap)> {
        self.clusters.iter()
    }

    /// Number of clusters.
    pub fn len(&self) -> usize {
        self.clusters.len()
    }

    /// Check if the view holds no clusters.
    pub fn is_empty(&self) -> bool {
        self.clusters.is_empty()
    }

    /// Total number of `(group, server)` records across all clusters.
    pub fn server_count(&self) -> usize {
        self.clusters
            .values()
            .flat_map(|groups| groups.values())
            .map(|servers| servers.len())
            .sum()
    }
}
