//! Statistics - the per-cycle output handed to renderers.

/// What kind of condition an advisory reports.
///
/// Renderers use this to pick a severity colour; the message text is
/// already complete on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum AdvisoryKind {
    /// Server is `UP` but carries more sessions than the configured threshold.
    HighSessions,
    /// Server has no health check configured.
    NoCheck,
    /// Server is in a non-nominal state (`DOWN`, `MAINT`, `NOLB`, ...).
    Status,
}

impl AdvisoryKind {
    /// Returns a short symbol for display.
    pub fn symbol(&self) -> &'static str {
        match self {
            AdvisoryKind::HighSessions => "LOAD",
            AdvisoryKind::NoCheck => "NOCHK",
            AdvisoryKind::Status => "STATE",
        }
    }
}

/// A human-readable warning about one server.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Advisory {
    /// Group (proxy) the server belongs to.
    pub group: String,
    /// Server name within the group.
    pub server: String,
    /// What triggered the advisory.
    pub kind: AdvisoryKind,
    /// Status message shown to the operator.
    pub message: String,
}

/// A feed whose retrieval failed during the cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DegradedFeed {
    pub url: String,
    pub reason: String,
}

impl DegradedFeed {
    pub fn new(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            reason: reason.into(),
        }
    }
}

/// Totals and advisories for one cluster.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ClusterStatistics {
    /// Configuration key of the cluster.
    pub name: String,
    /// Name shown to operators.
    pub display_name: String,
    /// Sum of current sessions over all `FRONTEND` rows.
    pub total_sessions: i64,
    /// Sum of session rates over all `FRONTEND` rows.
    pub total_session_rate: i64,
    /// Advisories ordered by group, then server.
    pub advisories: Vec<Advisory>,
    /// Feeds that could not be retrieved this cycle.
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Vec::is_empty"))]
    pub degraded: Vec<DegradedFeed>,
}

impl ClusterStatistics {
    /// Create empty statistics for a cluster.
    pub fn new(name: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            display_name: display_name.into(),
            ..Self::default()
        }
    }

    /// Check if any feed of this cluster failed.
    pub fn is_degraded(&self) -> bool {
        !self.degraded.is_empty()
    }
}

/// The aggregated outcome of one poll cycle.
///
/// # Example
///
/// ```rust
/// use hawatch_types::{ClusterStatistics, Statistics};
///
/// let mut edge = ClusterStatistics::new("edge", "Edge");
/// edge.total_sessions = 42;
/// let stats = Statistics::from_clusters(vec![edge]);
///
/// assert_eq!(stats.total_sessions, 42);
/// assert_eq!(stats.advisory_count(), 0);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Statistics {
    /// Sessions across every cluster.
    pub total_sessions: i64,
    /// Session rate across every cluster.
    pub total_session_rate: i64,
    /// Per-cluster statistics ordered by cluster name.
    pub clusters: Vec<ClusterStatistics>,
}

impl Statistics {
    /// Build statistics from per-cluster entries, deriving the global totals.
    ///
    /// Clusters are sorted by name.
    pub fn from_clusters(mut clusters: Vec<ClusterStatistics>) -> Self {
        clusters.sort_by(|a, b| a.name.cmp(&b.name));
        Self {
            total_sessions: wrapping_total(clusters.iter().map(|c| c.total_sessions)),
            total_session_rate: wrapping_total(clusters.iter().map(|c| c.total_session_rate)),
            clusters,
        }
    }

    /// Get statistics for a specific cluster.
    pub fn cluster(&self, name: &str) -> Option<&ClusterStatistics> {
        self.clusters.iter().find(|c| c.name == name)
    }

    /// Number of advisories across all clusters.
    pub fn advisory_count(&self) -> usize {
        self.clusters.iter().map(|c| c.advisories.len()).sum()
    }

    /// Number of degraded feeds across all clusters.
    pub fn degraded_count(&self) -> usize {
        self.clusters.iter().map(|c| c.degraded.len()).sum()
    }
}

fn wrapping_total(values: impl Iterator<Item = i64>) -> i64 {
    values.fold(0, i64::wrapping_add)
}
