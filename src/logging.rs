//! Log output setup.

use std::fs::File;
use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::{anyhow, Result};
use clap::ValueEnum;
use tracing_subscriber::EnvFilter;

/// Verbosity accepted on the command line.
///
/// `warning` and `note` are kept as aliases of `warn` and `info` for older
/// configurations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum LogLevel {
    #[default]
    Error,
    #[value(alias = "warning")]
    Warn,
    #[value(alias = "note")]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    /// The filter directive for this level.
    pub fn directive(self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }

    /// Filter for this level, unless `RUST_LOG` says otherwise.
    pub fn filter(self) -> EnvFilter {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(self.directive()))
    }
}

/// Where log lines are written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogTarget {
    Stderr,
    File(PathBuf),
    /// Dropped; used while the TUI owns the terminal and no file was given.
    Discard,
}

/// Install the global subscriber.
pub fn init(level: LogLevel, target: LogTarget) -> Result<()> {
    let builder = tracing_subscriber::fmt().with_env_filter(level.filter());

    let result = match target {
        LogTarget::Stderr => builder.with_writer(std::io::stderr).try_init(),
        LogTarget::File(path) => {
            let file = File::create(&path)?;
            builder
                .with_writer(Mutex::new(file))
                .with_ansi(false)
                .try_init()
        }
        LogTarget::Discard => builder.with_writer(std::io::sink).try_init(),
    };

    result.map_err(|e| anyhow!("Failed to install logger: {e}"))
}
