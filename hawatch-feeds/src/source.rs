//! Feed sources - the clusters to poll.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Per-cluster options.
///
/// Known options are typed fields; anything else in the configuration is
/// kept verbatim in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClusterOptions {
    /// Never warn about high session counts on this cluster.
    #[serde(default, alias = "ignorehighsessions")]
    pub ignore_high_sessions: bool,

    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl ClusterOptions {
    /// Look up an unrecognised boolean option.
    pub fn flag(&self, name: &str) -> Option<bool> {
        self.extra.get(name).and_then(serde_json::Value::as_bool)
    }
}

/// A named cluster and the feed URLs of its load-balancer nodes.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedSource {
    /// Cluster key; records of all its feeds are merged under this name.
    pub name: String,
    /// Name shown to operators.
    pub display_name: String,
    /// Feed URLs, in configuration order.
    pub urls: Vec<String>,
    pub options: ClusterOptions,
}

impl FeedSource {
    /// Create a source whose display name equals its key.
    pub fn new(name: impl Into<String>, urls: Vec<String>) -> Self {
        let name = name.into();
        Self {
            display_name: name.clone(),
            name,
            urls,
            options: ClusterOptions::default(),
        }
    }

    /// Set the display name.
    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = display_name.into();
        self
    }

    /// Set the options.
    pub fn with_options(mut self, options: ClusterOptions) -> Self {
        self.options = options;
        self
    }
}
