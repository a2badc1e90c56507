//! Collaborator seams of the report pipeline.
//!
//! The pipeline never talks to the network or a document format directly.
//! Production implementations live in `dossier-tools`; tests substitute
//! in-memory mocks.

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use super::model::{Language, ReportFormat, ReportModel};
use crate::error::{ReportError, SourceError};
use crate::keywords::KeywordSignal;

/// Encyclopedia article as returned by a [`SummarySource`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EncyclopediaPage {
    pub title: String,
    pub summary: String,
    /// Image URLs in page order.
    pub image_urls: Vec<String>,
}

/// A raw search engine hit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchHit {
    pub title: String,
    pub snippet: String,
    pub url: String,
}

/// Status and body of a completed GET.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn is_ok(&self) -> bool {
        self.status == 200
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Encyclopedia summary service.
#[async_trait]
pub trait SummarySource: Send + Sync {
    /// First `sentences` sentences of the article for `topic`, plus its images.
    async fn summary(
        &self,
        topic: &str,
        language: Language,
        sentences: usize,
    ) -> Result<EncyclopediaPage, SourceError>;
}

/// Web search service.
#[async_trait]
pub trait SearchSource: Send + Sync {
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchHit>, SourceError>;
}

/// Plain HTTP GET with a browser-like client identity.
#[async_trait]
pub trait HttpFetcher: Send + Sync {
    async fn get(&self, url: &str, timeout: Duration) -> Result<HttpResponse, SourceError>;

    /// GET a text document, with the body decoded to UTF-8.
    ///
    /// The default treats the raw body as UTF-8; implementations that see the
    /// response headers should honor the declared charset.
    async fn get_text(&self, url: &str, timeout: Duration) -> Result<HttpResponse, SourceError> {
        let response = self.get(url, timeout).await?;
        Ok(HttpResponse {
            status: response.status,
            body: response.text().into_bytes(),
        })
    }
}

/// Draws a keyword signal into an image file.
pub trait ChartRenderer: Send + Sync {
    fn render_chart(
        &self,
        topic: &str,
        signal: &KeywordSignal,
        path: &Path,
    ) -> Result<(), SourceError>;
}

/// Writes a [`ReportModel`] to a document file.
pub trait DocumentRenderer: Send + Sync {
    fn format(&self) -> ReportFormat;

    fn render(&self, model: &ReportModel, path: &Path) -> Result<(), ReportError>;
}

/// One renderer per format; the orchestrator picks exactly one per run.
#[derive(Default, Clone)]
pub struct RendererSet {
    renderers: HashMap<ReportFormat, Arc<dyn DocumentRenderer>>,
}

impl RendererSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `renderer` under its own format, replacing any previous one.
    pub fn with(mut self, renderer: Arc<dyn DocumentRenderer>) -> Self {
        self.renderers.insert(renderer.format(), renderer);
        self
    }

    pub fn get(&self, format: ReportFormat) -> Option<Arc<dyn DocumentRenderer>> {
        self.renderers.get(&format).cloned()
    }
}

impl std::fmt::Debug for RendererSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut formats: Vec<_> = self.renderers.keys().map(|k| k.to_string()).collect();
        formats.sort();
        f.debug_struct("RendererSet").field("formats", &formats).finish()
    }
}
