//! Error types for the Dossier core library.
//!
//! Uses `thiserror` for public API error types. Only [`ReportError`] ever
//! reaches the caller of a pipeline run; [`SourceError`] and [`HistoryError`]
//! are absorbed at the gatherer and history boundaries and logged.

use std::path::PathBuf;

use crate::report::ReportFormat;

/// Top-level error type for the Dossier core library.
#[derive(Debug, thiserror::Error)]
pub enum DossierError {
    #[error("Report error: {0}")]
    Report(#[from] ReportError),

    #[error("Source error: {0}")]
    Source(#[from] SourceError),

    #[error("History error: {0}")]
    History(#[from] HistoryError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Failures of a remote collaborator (encyclopedia, search engine, HTTP, chart).
#[derive(Debug, Clone, thiserror::Error)]
pub enum SourceError {
    #[error("HTTP request failed: {message}")]
    Http { message: String },

    #[error("Unexpected HTTP status {status} for {url}")]
    Status { status: u16, url: String },

    #[error("No page found for '{topic}'")]
    NotFound { topic: String },

    #[error("'{topic}' is ambiguous (disambiguation page)")]
    Disambiguation { topic: String },

    #[error("Failed to parse response: {message}")]
    Parse { message: String },

    #[error("Request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    #[error("Chart rendering failed: {message}")]
    Chart { message: String },
}

/// Terminal failures of a report invocation.
#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("Topic must not be empty")]
    EmptyTopic,

    #[error("A report is already being generated")]
    Busy,

    #[error("No usable content was gathered for '{topic}'")]
    NoContent { topic: String },

    #[error("Failed to render {format} document: {message}")]
    Render {
        format: ReportFormat,
        message: String,
    },

    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Report task aborted: {message}")]
    Aborted { message: String },
}

/// Errors from the history store.
///
/// Reads never produce these; a missing or malformed file loads as empty.
#[derive(Debug, thiserror::Error)]
pub enum HistoryError {
    #[error("Failed to persist history to {path}: {source}")]
    Persist {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors from the configuration system.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {message}")]
    Invalid { message: String },
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        ConfigError::Invalid {
            message: err.to_string(),
        }
    }
}

/// A type alias for results using the top-level `DossierError`.
pub type Result<T> = std::result::Result<T, DossierError>;
