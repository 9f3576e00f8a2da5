//! Data source abstraction for receiving cycle statistics.
//!
//! The monitor reads [`Statistics`] through the [`DataSource`] trait: live
//! from the background [`Poller`], or replayed from an exported JSON file.

mod channel;
mod file;
mod poller;

pub use channel::{ChannelSource, CycleUpdate};
pub use file::FileSource;
pub use poller::Poller;

use std::fmt::Debug;

use hawatch_types::Statistics;

/// Trait for receiving statistics from various sources.
///
/// # Example
///
/// ```
/// use hawatch::{DataSource, FileSource};
///
/// let mut source = FileSource::new("hawatch_export.json");
/// if let Some(stats) = source.poll() {
///     println!("Got {} clusters", stats.clusters.len());
/// }
/// ```
pub trait DataSource: Send + Debug {
    /// Poll for the latest statistics.
    ///
    /// Returns `Some(stats)` if new data is available, `None` otherwise.
    /// This method should be non-blocking.
    fn poll(&mut self) -> Option<Statistics>;

    /// Returns a human-readable description of the source.
    ///
    /// Used for display in the TUI status bar.
    fn description(&self) -> &str;

    /// The most recent failure, if the last update was one.
    fn error(&self) -> Option<&str>;
}
