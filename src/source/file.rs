//! File-based data source.
//!
//! Replays statistics previously written with `--export`, re-reading the
//! file whenever it changes.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use hawatch_types::Statistics;

use super::DataSource;

/// A data source that reads exported statistics from a JSON file.
///
/// The source tracks the file's modification time and only returns
/// new data when the file has been updated.
#[derive(Debug)]
pub struct FileSource {
    path: PathBuf,
    description: String,
    last_error: Option<String>,
    last_modified: Option<SystemTime>,
}

impl FileSource {
    /// Create a new file source for the given path.
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref().to_path_buf();
        let description = format!("file: {}", path.display());
        Self {
            path,
            description,
            last_error: None,
            last_modified: None,
        }
    }

    /// Returns the path being replayed.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn modified_time(&self) -> Option<SystemTime> {
        fs::metadata(&self.path).ok()?.modified().ok()
    }

    fn read_file(&mut self) -> Option<Statistics> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) => {
                self.last_error = Some(format!("Read error: {}", e));
                return None;
            }
        };
        match serde_json::from_str(&content) {
            Ok(stats) => {
                self.last_error = None;
                Some(stats)
            }
            Err(e) => {
                self.last_error = Some(format!("Parse error: {}", e));
                None
            }
        }
    }
}

impl DataSource for FileSource {
    fn poll(&mut self) -> Option<Statistics> {
        let current_modified = self.modified_time();

        let file_changed = match (&self.last_modified, &current_modified) {
            (None, _) => true,
            (Some(_), None) => false,
            (Some(last), Some(current)) => current > last,
        };
        if !file_changed {
            return None;
        }

        let stats = self.read_file()?;
        self.last_modified = current_modified;
        Some(stats)
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }
}
