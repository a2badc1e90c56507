//! Observer interface between the pipeline and the interactive surface.
//!
//! Callbacks fire on the pipeline's worker task. A UI must marshal them onto
//! its own thread before touching any widget state.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Progress markers emitted while a report is being built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportStage {
    Summary,
    WebSearch,
    Scraping { index: usize, total: usize },
    Keywords,
    Rendering,
    Finalizing,
}

impl std::fmt::Display for ReportStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReportStage::Summary => f.write_str("fetching encyclopedia summary"),
            ReportStage::WebSearch => f.write_str("searching the web"),
            ReportStage::Scraping { index, total } => {
                write!(f, "reading web source {index}/{total}")
            }
            ReportStage::Keywords => f.write_str("extracting keywords"),
            ReportStage::Rendering => f.write_str("rendering document"),
            ReportStage::Finalizing => f.write_str("finalizing"),
        }
    }
}

/// Terminal outcome of one invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportOutcome {
    Completed(PathBuf),
    Failed(String),
}

/// Callback interface for report progress and outcome.
pub trait ReportObserver: Send + Sync {
    fn on_stage(&self, stage: &ReportStage);
    fn on_completed(&self, path: &Path);
    fn on_failed(&self, error: &str);
}

/// No-op observer.
pub struct NoOpObserver;

impl ReportObserver for NoOpObserver {
    fn on_stage(&self, _stage: &ReportStage) {}
    fn on_completed(&self, _path: &Path) {}
    fn on_failed(&self, _error: &str) {}
}

/// Observer that records everything, for tests.
#[derive(Default)]
pub struct RecordingObserver {
    stages: Mutex<Vec<ReportStage>>,
    outcomes: Mutex<Vec<ReportOutcome>>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stages(&self) -> Vec<ReportStage> {
        self.stages.lock().map(|s| s.clone()).unwrap_or_default()
    }

    pub fn outcomes(&self) -> Vec<ReportOutcome> {
        self.outcomes.lock().map(|o| o.clone()).unwrap_or_default()
    }

    /// The most recent outcome; a failure always replaces an earlier success.
    pub fn last_outcome(&self) -> Option<ReportOutcome> {
        self.outcomes().pop()
    }
}

impl ReportObserver for RecordingObserver {
    fn on_stage(&self, stage: &ReportStage) {
        if let Ok(mut stages) = self.stages.lock() {
            stages.push(stage.clone());
        }
    }

    fn on_completed(&self, path: &Path) {
        if let Ok(mut outcomes) = self.outcomes.lock() {
            outcomes.push(ReportOutcome::Completed(path.to_path_buf()));
        }
    }

    fn on_failed(&self, error: &str) {
        if let Ok(mut outcomes) = self.outcomes.lock() {
            outcomes.push(ReportOutcome::Failed(error.to_string()));
        }
    }
}
