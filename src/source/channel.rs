//! Channel-based data source.
//!
//! Receives cycle outcomes via a tokio watch channel. The poller pushes one
//! update per cycle; the TUI only ever sees the latest.

use tokio::sync::watch;

use hawatch_types::Statistics;

use super::DataSource;

/// The outcome of the most recent poll cycle.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum CycleUpdate {
    /// No cycle has finished yet.
    #[default]
    Pending,
    Ready(Statistics),
    Failed(String),
}

/// A data source that receives cycle outcomes via a channel.
///
/// A failed cycle does not replace earlier statistics; it is reported
/// through [`DataSource::error`] until the next successful one.
///
/// # Example
///
/// ```
/// use hawatch::{ChannelSource, CycleUpdate, DataSource, Statistics};
///
/// let (tx, mut source) = ChannelSource::create("poller");
/// tx.send(CycleUpdate::Ready(Statistics::default())).unwrap();
/// assert!(source.poll().is_some());
/// ```
#[derive(Debug)]
pub struct ChannelSource {
    receiver: watch::Receiver<CycleUpdate>,
    description: String,
    last_error: Option<String>,
}

impl ChannelSource {
    /// Create a new channel source.
    ///
    /// # Arguments
    ///
    /// * `receiver` - The receiving end of a watch channel
    /// * `source_description` - Where updates come from
    pub fn new(receiver: watch::Receiver<CycleUpdate>, source_description: &str) -> Self {
        Self {
            receiver,
            description: source_description.to_string(),
            last_error: None,
        }
    }

    /// Create a channel pair for sending updates to a ChannelSource.
    pub fn create(source_description: &str) -> (watch::Sender<CycleUpdate>, Self) {
        let (tx, rx) = watch::channel(CycleUpdate::Pending);
        (tx, Self::new(rx, source_description))
    }
}

impl DataSource for ChannelSource {
    fn poll(&mut self) -> Option<Statistics> {
        if !self.receiver.has_changed().unwrap_or(false) {
            return None;
        }

        match &*self.receiver.borrow_and_update() {
            CycleUpdate::Pending => None,
            CycleUpdate::Ready(stats) => {
                self.last_error = None;
                Some(stats.clone())
            }
            CycleUpdate::Failed(err) => {
                self.last_error = Some(err.clone());
                None
            }
        }
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }
}
