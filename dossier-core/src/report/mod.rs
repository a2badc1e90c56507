//! Research report pipeline.
//!
//! Given a topic, gathers an encyclopedia summary, web search results and page
//! excerpts, derives a keyword signal, and renders a PDF or DOCX document:
//! 1. **Gather**: summary + cover image, search hits, page excerpts (best-effort)
//! 2. **Signal**: keyword frequency table and chart (normal/deep depth only)
//! 3. **Render**: one document renderer chosen by format
//! 4. **Record**: temporary files removed, history updated

pub mod engine;
pub mod events;
pub mod gather;
pub mod layout;
pub mod model;
pub mod sources;

pub use engine::ReportEngine;
pub use events::{NoOpObserver, RecordingObserver, ReportObserver, ReportOutcome, ReportStage};
pub use gather::{Gatherers, SCRAPE_EMPTY, SCRAPE_FAILED, SUMMARY_UNAVAILABLE};
pub use model::{
    Depth, DepthParams, Language, ReportFormat, ReportModel, ReportRequest, WebResult,
};
pub use sources::{
    ChartRenderer, DocumentRenderer, EncyclopediaPage, HttpFetcher, HttpResponse, RendererSet,
    SearchHit, SearchSource, SummarySource,
};
