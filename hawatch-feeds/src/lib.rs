//! # hawatch-feeds
//!
//! The poll-cycle pipeline for HAProxy statistics feeds: fetch every feed URL
//! concurrently, decode each CSV body into records, and fold duplicate
//! `(group, server)` rows reported by several nodes of the same cluster into
//! one [`ClusterView`].
//!
//! ## Pipeline
//!
//! ```text
//!  FeedSource ──▶ FeedFetcher ──(mpsc, completion order)──▶ Loader
//!                 one task per URL                           │
//!                                                            ├─ Schema::decode  (strict | tolerant)
//!                                                            └─ Merger::fold    (identity | sum | reconcile)
//!                                                                   │
//!                                                                   ▼
//!                                                            Cycle { view, degraded }
//! ```
//!
//! A feed that cannot be retrieved degrades its cluster but does not fail the
//! cycle. A body that cannot be decoded fails the whole cycle.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::time::Duration;
//! use hawatch_feeds::{FeedFetcher, FeedSource, Loader, Schema};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let fetcher = FeedFetcher::builder()
//!         .timeout(Duration::from_secs(5))
//!         .build()?;
//!     let loader = Loader::new(fetcher, Schema::tolerant());
//!
//!     let sources = vec![FeedSource::new(
//!         "edge",
//!         vec!["http://lb1:8080/stats;csv".to_string()],
//!     )];
//!     let cycle = loader.load(&sources).await?;
//!
//!     println!("Merged {} servers", cycle.view.server_count());
//!     Ok(())
//! }
//! ```

pub mod decode;
pub mod error;
pub mod fetch;
pub mod load;
pub mod merge;
pub mod schema;
pub mod source;

#[cfg(test)]
pub(crate) mod testing;

pub use decode::{RawRecord, Records};
pub use error::{CycleError, DecodeError, FeedError};
pub use fetch::{FeedFetcher, FeedFetcherBuilder, FeedResponse};
pub use load::{validate_sources, Cycle, Loader};
pub use merge::{DuplicateDetection, Merger};
pub use schema::{ColumnSpec, FieldDef, FieldType, MergePolicy, Schema, SchemaMode};
pub use source::{ClusterOptions, FeedSource};

// Re-export types for convenience
pub use hawatch_types::{ClusterView, DegradedFeed, FieldValue, MergedRecord};
