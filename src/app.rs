//! Application state and navigation logic.

use std::path::Path;
use std::time::{Duration, Instant};

use anyhow::Result;

use crate::data::{self, FleetData};
use crate::source::DataSource;
use crate::ui::advisories::{self, SortColumn};
use crate::ui::Theme;

/// The current view/tab in the TUI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    /// Per-cluster totals with their advisory trees.
    Clusters,
    /// Every advisory of the fleet in one sortable table.
    Advisories,
}

impl View {
    /// Cycle to the next view.
    pub fn next(self) -> Self {
        match self {
            View::Clusters => View::Advisories,
            View::Advisories => View::Clusters,
        }
    }

    /// Cycle to the previous view.
    pub fn prev(self) -> Self {
        // Two views: previous and next coincide.
        self.next()
    }

    /// Returns the display label for this view.
    pub fn label(&self) -> &'static str {
        match self {
            View::Clusters => "Clusters",
            View::Advisories => "Advisories",
        }
    }
}

/// Main application state.
pub struct App {
    pub running: bool,
    pub current_view: View,
    pub show_help: bool,

    // Data source
    source: Box<dyn DataSource>,
    pub data: Option<FleetData>,
    pub load_error: Option<String>,

    // Navigation state
    /// First visible line of the Clusters view.
    pub scroll: usize,
    /// Selected row of the Advisories view.
    pub selected_index: usize,

    // Sorting (Advisories view)
    pub sort_column: SortColumn,
    pub sort_ascending: bool,

    // Search/filter
    pub filter_text: String,
    pub filter_active: bool,

    // UI
    pub theme: Theme,

    // Status message (temporary feedback)
    pub status_message: Option<(String, Instant)>,
}

impl App {
    /// Create a new App reading from the given data source.
    pub fn new(source: Box<dyn DataSource>) -> Self {
        Self::with_theme(source, Theme::auto_detect())
    }

    /// Create a new App with an explicit theme.
    pub fn with_theme(source: Box<dyn DataSource>, theme: Theme) -> Self {
        Self {
            running: true,
            current_view: View::Clusters,
            show_help: false,
            source,
            data: None,
            load_error: None,
            scroll: 0,
            selected_index: 0,
            sort_column: SortColumn::default(),
            sort_ascending: true,
            filter_text: String::new(),
            filter_active: false,
            theme,
            status_message: None,
        }
    }

    /// Returns a description of the current data source.
    pub fn source_description(&self) -> &str {
        self.source.description()
    }

    /// Set a temporary status message that will be shown for a few seconds.
    pub fn set_status_message(&mut self, message: String) {
        self.status_message = Some((message, Instant::now()));
    }

    /// Get the current status message if it hasn't expired (3 seconds).
    pub fn get_status_message(&self) -> Option<&str> {
        match &self.status_message {
            Some((msg, time)) if time.elapsed() < Duration::from_secs(3) => Some(msg),
            _ => None,
        }
    }

    /// Poll the data source for new data.
    ///
    /// Returns Ok(true) if new data was received. A failed cycle keeps the
    /// previous statistics on screen and only records the error.
    pub fn reload_data(&mut self) -> Result<bool> {
        if let Some(stats) = self.source.poll() {
            self.data = Some(FleetData::new(stats));
            self.load_error = None;
            self.clamp_selection();
            return Ok(true);
        }

        self.load_error = self.source.error().map(str::to_string);
        Ok(false)
    }

    /// Switch to the next view.
    pub fn next_view(&mut self) {
        self.current_view = self.current_view.next();
    }

    /// Switch to the previous view.
    pub fn prev_view(&mut self) {
        self.current_view = self.current_view.prev();
    }

    /// Switch to a specific view.
    pub fn set_view(&mut self, view: View) {
        self.current_view = view;
    }

    /// Move down by one line or row.
    pub fn select_next(&mut self) {
        self.select_next_n(1);
    }

    /// Move up by one line or row.
    pub fn select_prev(&mut self) {
        self.select_prev_n(1);
    }

    /// Move down by n lines or rows.
    pub fn select_next_n(&mut self, n: usize) {
        match self.current_view {
            // Clamped against the content height when rendered.
            View::Clusters => self.scroll = self.scroll.saturating_add(n),
            View::Advisories => {
                let max = self.visible_advisory_count().saturating_sub(1);
                self.selected_index = (self.selected_index + n).min(max);
            }
        }
    }

    /// Move up by n lines or rows.
    pub fn select_prev_n(&mut self, n: usize) {
        match self.current_view {
            View::Clusters => self.scroll = self.scroll.saturating_sub(n),
            View::Advisories => self.selected_index = self.selected_index.saturating_sub(n),
        }
    }

    /// Jump to the top.
    pub fn select_first(&mut self) {
        match self.current_view {
            View::Clusters => self.scroll = 0,
            View::Advisories => self.selected_index = 0,
        }
    }

    /// Jump to the bottom.
    pub fn select_last(&mut self) {
        match self.current_view {
            View::Clusters => self.scroll = usize::MAX,
            View::Advisories => {
                self.selected_index = self.visible_advisory_count().saturating_sub(1);
            }
        }
    }

    /// Number of advisory rows left after filtering.
    fn visible_advisory_count(&self) -> usize {
        self.data
            .as_ref()
            .map_or(0, |data| advisories::visible_rows(self, data).len())
    }

    fn clamp_selection(&mut self) {
        let max = self.visible_advisory_count().saturating_sub(1);
        self.selected_index = self.selected_index.min(max);
    }

    /// Toggle the help overlay.
    pub fn toggle_help(&mut self) {
        self.show_help = !self.show_help;
    }

    /// Cycle to the next sort column of the Advisories view.
    pub fn cycle_sort(&mut self) {
        self.sort_column = self.sort_column.next();
    }

    /// Toggle sort direction between ascending and descending.
    pub fn toggle_sort_direction(&mut self) {
        self.sort_ascending = !self.sort_ascending;
    }

    /// Enter filter input mode (starts capturing keystrokes for search).
    pub fn start_filter(&mut self) {
        self.filter_active = true;
    }

    /// Exit filter input mode without clearing the filter text.
    pub fn cancel_filter(&mut self) {
        self.filter_active = false;
    }

    /// Clear the filter text and exit filter mode.
    pub fn clear_filter(&mut self) {
        self.filter_text.clear();
        self.filter_active = false;
    }

    /// Append a character to the filter text.
    pub fn filter_push(&mut self, c: char) {
        self.filter_text.push(c);
        self.clamp_selection();
    }

    /// Remove the last character from the filter text.
    pub fn filter_pop(&mut self) {
        self.filter_text.pop();
    }

    /// Signal the application to quit.
    pub fn quit(&mut self) {
        self.running = false;
    }

    /// Export the current statistics to a file.
    pub fn export_state(&self, path: &Path) -> Result<()> {
        let Some(ref data) = self.data else {
            anyhow::bail!("No data to export");
        };
        data::write_json(&data.stats, path)
    }
}
