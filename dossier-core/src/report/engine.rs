//! Report orchestrator: the single entry point of the pipeline.
//!
//! Sequence: summary → web search → per-result excerpts → keyword signal →
//! chart → render → cleanup → history. Gatherer failures only degrade the
//! data; the run fails only when the document cannot be written (or, if
//! configured, when nothing at all was gathered).

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::Local;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::events::{NoOpObserver, ReportObserver, ReportStage};
use super::gather::{Gatherers, temp_file_name};
use super::model::{ReportModel, ReportRequest, WebResult};
use super::sources::{ChartRenderer, RendererSet};
use crate::config::PipelineConfig;
use crate::error::ReportError;
use crate::history::HistoryStore;
use crate::keywords::{KeywordExtractor, KeywordSignal};
use crate::persistence;

/// Temporary files created during one invocation, removed on every exit path.
#[derive(Debug, Default)]
pub struct TempFiles {
    paths: Vec<PathBuf>,
}

impl TempFiles {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn track(&mut self, path: PathBuf) {
        self.paths.push(path);
    }

    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }

    /// Best-effort removal; failures are logged and swallowed.
    pub fn cleanup(&mut self) {
        for path in self.paths.drain(..) {
            if let Err(e) = persistence::remove_if_exists(&path) {
                warn!(path = %path.display(), error = %e, "Could not remove temporary file");
            }
        }
    }
}

impl Drop for TempFiles {
    fn drop(&mut self) {
        self.cleanup();
    }
}

/// Clears the in-flight flag when an invocation ends.
struct InFlight<'a>(&'a AtomicBool);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Sequences gatherers, keyword extraction, rendering and history.
pub struct ReportEngine {
    gatherers: Gatherers,
    chart: Arc<dyn ChartRenderer>,
    renderers: RendererSet,
    history: HistoryStore,
    pipeline: PipelineConfig,
    keywords: KeywordExtractor,
    in_flight: AtomicBool,
}

impl ReportEngine {
    pub fn new(
        gatherers: Gatherers,
        chart: Arc<dyn ChartRenderer>,
        renderers: RendererSet,
        history: HistoryStore,
        pipeline: PipelineConfig,
    ) -> Self {
        Self {
            gatherers,
            chart,
            renderers,
            history,
            pipeline,
            keywords: KeywordExtractor::default(),
            in_flight: AtomicBool::new(false),
        }
    }

    /// Replace the default keyword extractor.
    pub fn with_keyword_extractor(mut self, extractor: KeywordExtractor) -> Self {
        self.keywords = extractor;
        self
    }

    pub fn history(&self) -> &HistoryStore {
        &self.history
    }

    /// Whether an invocation is currently running.
    pub fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Generate one report and return its destination path.
    pub async fn generate_report(&self, request: ReportRequest) -> Result<PathBuf, ReportError> {
        self.generate_with(request, &NoOpObserver).await
    }

    /// Generate one report, reporting progress and the outcome to `observer`.
    ///
    /// A second call while one is running fails immediately with
    /// [`ReportError::Busy`].
    pub async fn generate_with(
        &self,
        request: ReportRequest,
        observer: &dyn ReportObserver,
    ) -> Result<PathBuf, ReportError> {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            let err = ReportError::Busy;
            observer.on_failed(&err.to_string());
            return Err(err);
        }
        let _guard = InFlight(&self.in_flight);

        let mut temps = TempFiles::new();
        let result = self.run(&request, observer, &mut temps).await;
        temps.cleanup();

        match &result {
            Ok(path) => {
                info!(topic = %request.topic, path = %path.display(), "Report generated");
                observer.on_completed(path);
            }
            Err(e) => {
                warn!(topic = %request.topic, error = %e, "Report generation failed");
                observer.on_failed(&e.to_string());
            }
        }
        result
    }

    /// Run one invocation on a Tokio worker task.
    ///
    /// The observer receives the terminal outcome from that task.
    pub fn spawn(
        self: Arc<Self>,
        request: ReportRequest,
        observer: Arc<dyn ReportObserver>,
    ) -> JoinHandle<Result<PathBuf, ReportError>> {
        tokio::spawn(async move { self.generate_with(request, observer.as_ref()).await })
    }

    async fn run(
        &self,
        request: &ReportRequest,
        observer: &dyn ReportObserver,
        temps: &mut TempFiles,
    ) -> Result<PathBuf, ReportError> {
        let topic = request.topic.trim();
        if topic.is_empty() {
            return Err(ReportError::EmptyTopic);
        }
        let renderer = self
            .renderers
            .get(request.format)
            .ok_or_else(|| ReportError::Render {
                format: request.format,
                message: "no renderer registered for this format".into(),
            })?;

        let params = request.depth.params();
        let temp_dir = self.pipeline.resolved_temp_dir();
        if let Err(e) = std::fs::create_dir_all(&temp_dir) {
            warn!(dir = %temp_dir.display(), error = %e, "Temporary directory unavailable");
        }
        info!(
            topic,
            lang = request.language.code(),
            depth = ?request.depth,
            format = %request.format,
            "Starting report"
        );

        observer.on_stage(&ReportStage::Summary);
        let summary = self
            .gatherers
            .fetch_summary(topic, request.language, params.summary_sentences, &temp_dir)
            .await;
        if let Some(cover) = &summary.cover_image {
            temps.track(cover.clone());
        }

        observer.on_stage(&ReportStage::WebSearch);
        let hits = self
            .gatherers
            .fetch_web_results(topic, params.web_results)
            .await;

        let mut accumulated = summary.text.clone();
        let mut web_results = Vec::with_capacity(hits.len());
        let total = hits.len();
        for (i, hit) in hits.into_iter().enumerate() {
            let snippet = if request.depth.is_quick() {
                hit.snippet
            } else {
                observer.on_stage(&ReportStage::Scraping {
                    index: i + 1,
                    total,
                });
                self.gatherers.scrape_page(&hit.url).await
            };
            accumulated.push(' ');
            accumulated.push_str(&snippet);
            web_results.push(WebResult {
                title: hit.title,
                snippet,
                url: hit.url,
            });
        }

        let keywords = if request.depth.is_quick() {
            KeywordSignal::default()
        } else {
            observer.on_stage(&ReportStage::Keywords);
            self.keywords.extract(&accumulated)
        };
        debug!(keywords = keywords.len(), "Keyword signal ready");

        let chart_image = if keywords.is_empty() {
            None
        } else {
            self.draw_chart(topic, &keywords, &temp_dir, temps)
        };

        if self.pipeline.fail_on_empty
            && summary.is_unavailable()
            && web_results.is_empty()
            && keywords.is_empty()
        {
            return Err(ReportError::NoContent {
                topic: topic.to_string(),
            });
        }

        let model = ReportModel {
            topic: topic.to_string(),
            language: request.language,
            depth: request.depth,
            cover_image: summary.cover_image,
            summary: summary.text,
            web_results,
            keywords,
            chart_image,
            generated_at: Local::now(),
        };

        observer.on_stage(&ReportStage::Rendering);
        let destination = request.destination.clone();
        let staged = persistence::staging_path(&destination);
        let render_target = staged.clone();
        let rendered =
            tokio::task::spawn_blocking(move || renderer.render(&model, &render_target))
                .await
                .map_err(|e| ReportError::Aborted {
                    message: e.to_string(),
                })
                .and_then(|r| r);
        if let Err(e) = rendered {
            discard_staged(&staged);
            return Err(e);
        }
        if let Err(source) = persistence::promote(&staged, &destination) {
            discard_staged(&staged);
            return Err(ReportError::Write {
                path: destination,
                source,
            });
        }

        observer.on_stage(&ReportStage::Finalizing);
        temps.cleanup();
        let recorded = destination.to_string_lossy();
        if let Err(e) = self.history.append(topic, &recorded) {
            warn!(error = %e, "Report written but history was not updated");
        }
        Ok(destination)
    }

    fn draw_chart(
        &self,
        topic: &str,
        keywords: &KeywordSignal,
        temp_dir: &Path,
        temps: &mut TempFiles,
    ) -> Option<PathBuf> {
        let path = temp_dir.join(temp_file_name(topic, "chart", "png"));
        temps.track(path.clone());
        match self.chart.render_chart(topic, keywords, &path) {
            Ok(()) => Some(path),
            Err(e) => {
                warn!(topic, error = %e, "Keyword chart unavailable");
                None
            }
        }
    }
}

fn discard_staged(staged: &Path) {
    if let Err(e) = persistence::remove_if_exists(staged) {
        warn!(path = %staged.display(), error = %e, "Could not remove partial output");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_temp_files_removed_on_drop() {
        let dir = TempDir::new().unwrap();
        let a = dir.path().join("a.png");
        let b = dir.path().join("b.jpg");
        std::fs::write(&a, b"a").unwrap();
        std::fs::write(&b, b"b").unwrap();
        {
            let mut temps = TempFiles::new();
            temps.track(a.clone());
            temps.track(b.clone());
            temps.track(dir.path().join("never-created.png"));
        }
        assert!(!a.exists());
        assert!(!b.exists());
    }

    #[test]
    fn test_temp_files_cleanup_drains() {
        let dir = TempDir::new().unwrap();
        let a = dir.path().join("a.png");
        std::fs::write(&a, b"a").unwrap();
        let mut temps = TempFiles::new();
        temps.track(a.clone());
        temps.cleanup();
        assert!(temps.paths().is_empty());
        assert!(!a.exists());
    }
}
