//! Flow-document renderer producing `.docx` (Office Open XML) files.
//!
//! The package is assembled by hand: XML parts come from Handlebars
//! templates in [`templates`], images are stored under `word/media/`, and
//! everything is written into a deflated zip archive.

pub mod templates;

use dossier_core::error::ReportError;
use dossier_core::report::layout::{Section, sections, usable_image};
use dossier_core::report::{DocumentRenderer, ReportFormat, ReportModel};
use handlebars::Handlebars;
use serde::Serialize;
use std::io::{Cursor, Write};
use std::path::Path;
use tracing::{debug, warn};
use zip::CompressionMethod;
use zip::write::SimpleFileOptions;

/// English Metric Units per inch.
const EMU_PER_INCH: u64 = 914_400;
const COVER_WIDTH_IN: f64 = 4.0;
const CHART_WIDTH_IN: f64 = 5.0;

const STYLE_TITLE: &str = "Title";
const STYLE_HEADING: &str = "Heading1";
const STYLE_SOURCE: &str = "IntenseQuote";

/// One `<w:p>` of the document body.
#[derive(Debug, Clone, Default, Serialize)]
struct Block {
    style: Option<&'static str>,
    text: Option<String>,
    bold: bool,
    image: Option<ImageRef>,
}

impl Block {
    fn styled(style: &'static str, text: impl Into<String>) -> Self {
        Self {
            style: Some(style),
            text: Some(xml_text(&text.into())),
            ..Self::default()
        }
    }

    fn plain(text: impl Into<String>) -> Self {
        Self {
            text: Some(xml_text(&text.into())),
            ..Self::default()
        }
    }

    fn bold(text: impl Into<String>) -> Self {
        Self {
            bold: true,
            ..Self::plain(text)
        }
    }
}

#[derive(Debug, Clone, Serialize)]
struct ImageRef {
    id: usize,
    rel_id: String,
    name: String,
    /// Path inside `word/`, e.g. `media/image1.png`.
    target: String,
    cx: u64,
    cy: u64,
}

/// An image embedded in the package.
struct Media {
    image: ImageRef,
    bytes: Vec<u8>,
}

/// Body blocks plus the media they reference.
#[derive(Default)]
struct Body {
    blocks: Vec<Block>,
    media: Vec<Media>,
}

impl Body {
    /// Append an image paragraph `width_in` inches wide; skipped if unreadable.
    fn push_image(&mut self, path: &Path, width_in: f64) {
        let (w, h) = match image::image_dimensions(path) {
            Ok(dims) => dims,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Image omitted from DOCX");
                return;
            }
        };
        let bytes = match std::fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Image omitted from DOCX");
                return;
            }
        };
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase)
            .unwrap_or_else(|| "png".into());

        let id = self.media.len() + 1;
        let cx = (width_in * EMU_PER_INCH as f64) as u64;
        let cy = cx * u64::from(h) / u64::from(w.max(1));
        let image = ImageRef {
            id,
            rel_id: format!("rIdImage{id}"),
            name: format!("Picture {id}"),
            target: format!("media/image{id}.{ext}"),
            cx,
            cy,
        };
        self.blocks.push(Block {
            image: Some(image.clone()),
            ..Block::default()
        });
        self.media.push(Media { image, bytes });
    }
}

#[derive(Serialize)]
struct DocumentData<'a> {
    blocks: &'a [Block],
}

#[derive(Serialize)]
struct RelsData<'a> {
    images: Vec<&'a ImageRef>,
}

#[derive(Serialize)]
struct CoreData {
    title: String,
    created: String,
}

pub struct DocxRenderer {
    templates: Handlebars<'static>,
}

impl DocxRenderer {
    pub fn new() -> Result<Self, ReportError> {
        let mut registry = Handlebars::new();
        registry.set_strict_mode(false);
        for (name, source) in [
            ("document", templates::DOCUMENT),
            ("document_rels", templates::DOCUMENT_RELS),
            ("core", templates::CORE_PROPS),
        ] {
            registry
                .register_template_string(name, source)
                .map_err(|e| render_error(format!("template {name}: {e}")))?;
        }
        Ok(Self {
            templates: registry,
        })
    }

    fn body(&self, model: &ReportModel) -> Body {
        let mut body = Body::default();
        body.blocks
            .push(Block::styled(STYLE_TITLE, format!("Report: {}", model.topic)));
        body.blocks.push(Block::plain(format!(
            "Generated on: {}",
            model.generated_at.format("%Y-%m-%d")
        )));
        if let Some(cover) = usable_image(model.cover_image.as_deref()) {
            body.push_image(cover, COVER_WIDTH_IN);
        }

        for section in sections(model) {
            match section {
                Section::Overview { text } => {
                    body.blocks.push(Block::styled(STYLE_HEADING, "Overview"));
                    body.blocks.push(Block::plain(text));
                }
                Section::KeywordChart { image, signal } => {
                    body.blocks.push(Block::styled(STYLE_HEADING, "Data Analysis"));
                    body.push_image(image, CHART_WIDTH_IN);
                    body.blocks.push(Block::plain(signal.caption()));
                }
                Section::WebResources { results } => {
                    body.blocks.push(Block::styled(STYLE_HEADING, "Web Resources"));
                    for result in results {
                        body.blocks.push(Block::bold(result.title.as_str()));
                        body.blocks.push(Block::plain(result.snippet.as_str()));
                        body.blocks.push(Block::styled(
                            STYLE_SOURCE,
                            format!("Source: {}", result.url),
                        ));
                    }
                }
            }
        }
        body
    }

    /// Complete `.docx` package for `model`, in memory.
    pub fn package(&self, model: &ReportModel) -> Result<Vec<u8>, ReportError> {
        let body = self.body(model);
        let document = self
            .templates
            .render("document", &DocumentData {
                blocks: &body.blocks,
            })
            .map_err(|e| render_error(e.to_string()))?;
        let rels = self
            .templates
            .render("document_rels", &RelsData {
                images: body.media.iter().map(|m| &m.image).collect(),
            })
            .map_err(|e| render_error(e.to_string()))?;
        let core = self
            .templates
            .render("core", &CoreData {
                title: xml_text(&format!("Report: {}", model.topic)),
                created: model
                    .generated_at
                    .with_timezone(&chrono::Utc)
                    .format("%Y-%m-%dT%H:%M:%SZ")
                    .to_string(),
            })
            .map_err(|e| render_error(e.to_string()))?;

        let mut parts: Vec<(String, &[u8])> = vec![
            ("[Content_Types].xml".into(), templates::CONTENT_TYPES.as_bytes()),
            ("_rels/.rels".into(), templates::PACKAGE_RELS.as_bytes()),
            ("docProps/core.xml".into(), core.as_bytes()),
            ("word/document.xml".into(), document.as_bytes()),
            ("word/styles.xml".into(), templates::STYLES.as_bytes()),
            ("word/_rels/document.xml.rels".into(), rels.as_bytes()),
        ];
        for media in &body.media {
            parts.push((format!("word/{}", media.image.target), media.bytes.as_slice()));
        }
        write_zip(parts)
    }
}

impl DocumentRenderer for DocxRenderer {
    fn format(&self) -> ReportFormat {
        ReportFormat::Docx
    }

    fn render(&self, model: &ReportModel, path: &Path) -> Result<(), ReportError> {
        let bytes = self.package(model)?;
        std::fs::write(path, &bytes).map_err(|source| ReportError::Write {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), bytes = bytes.len(), "DOCX written");
        Ok(())
    }
}

fn write_zip(parts: Vec<(String, &[u8])>) -> Result<Vec<u8>, ReportError> {
    let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    for (name, data) in parts {
        zip.start_file(name.as_str(), options)
            .map_err(|e| render_error(format!("zip entry {name}: {e}")))?;
        zip.write_all(data)
            .map_err(|e| render_error(format!("zip entry {name}: {e}")))?;
    }
    let cursor = zip
        .finish()
        .map_err(|e| render_error(format!("zip finalize: {e}")))?;
    Ok(cursor.into_inner())
}

fn render_error(message: String) -> ReportError {
    ReportError::Render {
        format: ReportFormat::Docx,
        message,
    }
}

/// Drop characters XML 1.0 cannot carry; markup escaping is left to Handlebars.
fn xml_text(text: &str) -> String {
    text.chars()
        .filter(|&c| matches!(c, '\t' | '\n' | '\r') || (c >= ' ' && c != '\u{FFFE}' && c != '\u{FFFF}'))
        .collect()
}
