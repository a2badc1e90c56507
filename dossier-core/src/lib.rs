//! # Dossier Core
//!
//! Core library for the Dossier research report generator.
//! Provides the report data model, best-effort source gatherers, keyword
//! signal extraction, the text sanitizer, the report history store,
//! configuration, and the pipeline orchestrator.

pub mod config;
pub mod error;
pub mod history;
pub mod keywords;
pub mod persistence;
pub mod report;
pub mod sanitize;

// Re-export commonly used types at the crate root.
pub use config::{DossierConfig, load_config};
pub use error::{DossierError, ReportError, Result, SourceError};
pub use history::{HistoryEntry, HistoryStore};
pub use keywords::{KeywordCount, KeywordExtractor, KeywordSignal, extract_keywords};
pub use report::{
    Depth, Language, ReportEngine, ReportFormat, ReportModel, ReportObserver, ReportRequest,
    WebResult,
};
pub use sanitize::sanitize;
