//! # hawatch
//!
//! A terminal monitor and library for fleets of HAProxy load balancers.
//!
//! Every configured cluster exposes one or more CSV statistics feeds. Each
//! poll cycle fetches all feeds concurrently, merges rows reported by more
//! than one feed of the same cluster, and reduces the result into session
//! totals and advisories for servers that need attention.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                         Application                          │
//! │  ┌─────────┐    ┌──────────┐    ┌─────────┐    ┌──────────┐  │
//! │  │  app    │───▶│   data   │───▶│   ui    │───▶│ Terminal │  │
//! │  │ (state) │    │(advisory │    │(ratatui)│    │          │  │
//! │  └────┬────┘    │  rows)   │    └─────────┘    └──────────┘  │
//! │       │         └──────────┘                                 │
//! │       ▼                                                      │
//! │  ┌─────────┐                                                 │
//! │  │ source  │◀── Poller (live) | FileSource (replay)          │
//! │  └────┬────┘                                                 │
//! │       ▼                                                      │
//! │  hawatch-feeds: fetch ──▶ decode ──▶ merge ──▶ Cycle         │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! - **[`config`]**: YAML settings with environment overrides
//! - **[`source`]**: the [`DataSource`] trait, the background [`Poller`] and
//!   replay of exported statistics
//! - **[`data`]**: the [`Aggregator`] that turns a merged cycle into
//!   [`Statistics`], and [`FleetData`] as the TUI holds it
//! - **[`ui`]**: Terminal rendering using ratatui
//! - **[`logging`]**: `tracing` subscriber setup
//!
//! ## Usage
//!
//! ### As a CLI tool
//!
//! ```bash
//! # Watch the clusters of config.yml
//! hawatch --config config.yml
//!
//! # Run a single cycle and write the statistics as JSON
//! hawatch --config config.yml --export stats.json
//!
//! # Browse a previous export
//! hawatch --replay stats.json
//! ```
//!
//! ### As a library
//!
//! ```no_run
//! use hawatch::{Poller, Settings};
//!
//! # tokio_test::block_on(async {
//! let settings = Settings::from_yaml(
//!     "high_sessions_threshold: 150\nloadbalancers:\n  edge:\n    urls: [http://lb1:8080/stats;csv]\n",
//! )?;
//! let poller = Poller::from_settings(&settings)?;
//! let stats = poller.run_cycle().await?;
//! println!("{} sessions across the fleet", stats.total_sessions);
//! # Ok::<_, anyhow::Error>(())
//! # });
//! ```
//!
//! ### Feeding the TUI from a channel
//!
//! ```
//! use hawatch::{App, ChannelSource, CycleUpdate, Statistics};
//!
//! let (tx, source) = ChannelSource::create("custom");
//! let mut app = App::new(Box::new(source));
//!
//! tx.send(CycleUpdate::Ready(Statistics::default())).unwrap();
//! assert!(app.reload_data().unwrap());
//! ```

pub mod app;
pub mod config;
pub mod data;
pub mod events;
pub mod logging;
pub mod source;
pub mod ui;

pub use app::{App, View};
pub use config::{ConfigError, Settings};
pub use data::{AggregateOptions, Aggregator, FleetData};
pub use logging::{LogLevel, LogTarget};
pub use source::{ChannelSource, CycleUpdate, DataSource, FileSource, Poller};

pub use hawatch_types::{Advisory, AdvisoryKind, ClusterStatistics, DegradedFeed, Statistics};
