//! Renderer-agnostic section list derived from a [`ReportModel`].
//!
//! Both document renderers walk the same sections in the same order, so
//! section presence rules live here once.

use std::path::Path;

use super::model::{ReportModel, WebResult};
use crate::keywords::KeywordSignal;

/// A body section of a report, after the cover/title block.
#[derive(Debug, Clone, PartialEq)]
pub enum Section<'a> {
    /// Encyclopedia summary. Always present.
    Overview { text: &'a str },
    /// Keyword chart image with its signal. Present only when a chart was drawn.
    KeywordChart {
        image: &'a Path,
        signal: &'a KeywordSignal,
    },
    /// Web sources. Present only when at least one result exists.
    WebResources { results: &'a [WebResult] },
}

impl Section<'_> {
    pub fn kind(&self) -> SectionKind {
        match self {
            Section::Overview { .. } => SectionKind::Overview,
            Section::KeywordChart { .. } => SectionKind::KeywordChart,
            Section::WebResources { .. } => SectionKind::WebResources,
        }
    }
}

/// Discriminant of [`Section`], handy for assertions and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionKind {
    Overview,
    KeywordChart,
    WebResources,
}

/// Sections of `model` in document order.
pub fn sections(model: &ReportModel) -> Vec<Section<'_>> {
    let mut out = vec![Section::Overview {
        text: &model.summary,
    }];

    if let Some(image) = model.chart_image.as_deref() {
        if !model.keywords.is_empty() {
            out.push(Section::KeywordChart {
                image,
                signal: &model.keywords,
            });
        }
    }

    if !model.web_results.is_empty() {
        out.push(Section::WebResources {
            results: &model.web_results,
        });
    }

    out
}

/// Cover image path if one was downloaded and still exists on disk.
pub fn usable_image(path: Option<&Path>) -> Option<&Path> {
    path.filter(|p| p.is_file())
}
