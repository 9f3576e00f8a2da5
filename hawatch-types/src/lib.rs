//! # hawatch-types
//!
//! Core types for load-balancer fleet monitoring. This crate defines the data
//! model shared by the feed pipeline (`hawatch-feeds`) and the terminal
//! monitor (`hawatch`).
//!
//! ## Data Flow
//!
//! ```text
//! feed rows ──▶ MergedRecord ──▶ ClusterView ──▶ Statistics
//!              (per server)    (per cycle)      (totals + advisories)
//! ```
//!
//! - [`FieldValue`] / [`MergedRecord`]: the reconciled fields of one
//!   `(group, server)` identity key
//! - [`ClusterView`]: cluster → group → server → record, rebuilt every cycle
//! - [`Statistics`]: session totals and ordered advisories handed to renderers
//!
//! ## Features
//!
//! - `serde`: serialization of [`Statistics`] and friends (used for JSON export)
//!
//! ## Example
//!
//! ```rust
//! use hawatch_types::{ClusterView, FieldValue, MergedRecord};
//!
//! let mut view = ClusterView::new();
//! let mut record = MergedRecord::new();
//! record.insert("scur", FieldValue::Int(42));
//! view.group_mut("edge", "www").insert("FRONTEND".to_string(), record);
//!
//! assert_eq!(view.server_count(), 1);
//! assert_eq!(view.record("edge", "www", "FRONTEND").and_then(|r| r.int("scur")), Some(42));
//! ```

mod duration;
mod record;
mod statistics;
mod view;

pub use duration::*;
pub use record::*;
pub use statistics::*;
pub use view::*;

/// Server name of the aggregate row describing a whole frontend.
pub const FRONTEND: &str = "FRONTEND";

/// Server name of the aggregate row describing a whole backend.
pub const BACKEND: &str = "BACKEND";
