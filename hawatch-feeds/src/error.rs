//! Error types for the feed pipeline.

use thiserror::Error;

/// Errors retrieving a single feed.
///
/// These never abort a cycle; the loader records them as degraded feeds.
#[derive(Debug, Error)]
pub enum FeedError {
    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    Http(String),

    /// Feed answered with a non-success status.
    #[error("Feed returned status {0}")]
    Status(u16),

    /// Connection failed.
    #[error("Connection failed: {0}")]
    Connection(String),

    /// Timeout waiting for response.
    #[error("Request timed out")]
    Timeout,

    /// The HTTP client could not be constructed.
    #[error("Failed to build HTTP client: {0}")]
    Client(String),
}

impl From<reqwest::Error> for FeedError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FeedError::Timeout
        } else if err.is_connect() {
            FeedError::Connection(err.to_string())
        } else {
            FeedError::Http(err.to_string())
        }
    }
}

/// Errors decoding a feed body, or defining the schema used to decode it.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// A row does not have as many columns as the strict schema.
    #[error("CSV line fields mismatch. Expected {expected} found {found}")]
    FieldCountMismatch { expected: usize, found: usize },

    /// A schema column declares a type the decoder cannot produce.
    #[error("Unsupported type '{type_name}' for column '{field}'")]
    UnsupportedFieldType { field: String, type_name: String },

    /// An integer column holds something else.
    #[error("Invalid integer '{value}' in column '{field}'")]
    InvalidInteger { field: String, value: String },

    /// A required column is absent from the header or schema.
    #[error("Missing column '{0}'")]
    MissingColumn(String),

    /// A schema declares the same column twice.
    #[error("Duplicate column '{0}'")]
    DuplicateColumn(String),

    /// The body is not well-formed CSV.
    #[error("Malformed CSV: {0}")]
    Csv(#[from] csv::Error),
}

/// Errors that abort a whole poll cycle.
#[derive(Debug, Error)]
pub enum CycleError {
    /// Nothing to poll.
    #[error("No loadbalancers to load")]
    NoClusters,

    /// A cluster has no feed URLs.
    #[error("Loadbalancer '{0}' has no feed URLs")]
    EmptyUrls(String),

    /// A feed body violated the expected format.
    #[error("Failed to decode {url} for '{cluster}': {source}")]
    Decode {
        cluster: String,
        url: String,
        source: DecodeError,
    },

    /// Fetch tasks went away before reporting.
    #[error("{missing} feed response(s) never arrived")]
    Incomplete { missing: usize },
}
