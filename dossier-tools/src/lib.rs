//! # Dossier Tools
//!
//! Concrete collaborators for the Dossier report pipeline: the Wikipedia and
//! DuckDuckGo clients, the HTTP fetcher, the keyword chart, and the PDF and
//! DOCX renderers. [`build_engine`] wires them into a ready [`ReportEngine`].

pub mod chart;
pub mod docx;
pub mod http;
pub mod pdf;
pub mod web;
pub mod wikipedia;

use dossier_core::config::DossierConfig;
use dossier_core::history::HistoryStore;
use dossier_core::report::{Gatherers, RendererSet, ReportEngine};
use std::sync::Arc;

pub use chart::BarChartRenderer;
pub use docx::DocxRenderer;
pub use http::ReqwestFetcher;
pub use pdf::PdfRenderer;
pub use web::DuckDuckGoSearch;
pub use wikipedia::WikipediaClient;

/// Both document renderers, keyed by format.
pub fn default_renderers(config: &DossierConfig) -> dossier_core::Result<RendererSet> {
    Ok(RendererSet::new()
        .with(Arc::new(PdfRenderer::new(config.render.clone())))
        .with(Arc::new(DocxRenderer::new()?)))
}

/// Assemble a production engine from `config`.
pub fn build_engine(config: &DossierConfig) -> dossier_core::Result<ReportEngine> {
    let sources = &config.sources;
    let gatherers = Gatherers::new(
        Arc::new(WikipediaClient::new(sources)?),
        Arc::new(DuckDuckGoSearch::new(sources)?),
        Arc::new(ReqwestFetcher::new(&sources.user_agent)?),
        sources.clone(),
    );
    let history = HistoryStore::with_capacity(
        config.history.resolved_path(),
        config.history.capacity,
    );
    tracing::debug!(history = %history.path().display(), "Building report engine");

    Ok(ReportEngine::new(
        gatherers,
        Arc::new(BarChartRenderer::new()),
        default_renderers(config)?,
        history,
        config.pipeline.clone(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use dossier_core::report::ReportFormat;

    #[test]
    fn test_default_renderers_cover_both_formats() {
        let renderers = default_renderers(&DossierConfig::default()).unwrap();
        assert!(renderers.get(ReportFormat::Pdf).is_some());
        assert!(renderers.get(ReportFormat::Docx).is_some());
    }

    #[test]
    fn test_build_engine() {
        let dir = tempfile::TempDir::new().unwrap();
        let mut config = DossierConfig::default();
        config.history.path = Some(dir.path().join("history.json"));
        let engine = build_engine(&config).unwrap();
        assert!(!engine.is_busy());
        assert_eq!(engine.history().path(), dir.path().join("history.json"));
    }
}
