//! Paginated PDF renderer built on `genpdf`.
//!
//! Layout: a cover page (banner, optional cover image, topic), then content
//! pages carrying a running `Report: <topic>` header. Every page has a
//! `Page <n>` footer. All text is passed through [`sanitize`] first.

use dossier_core::config::RenderConfig;
use dossier_core::error::ReportError;
use dossier_core::report::layout::{Section, sections, usable_image};
use dossier_core::report::{DocumentRenderer, ReportFormat, ReportModel, WebResult};
use dossier_core::sanitize::sanitize;
use genpdf::elements::{Break, FramedElement, Image, PageBreak, Paragraph};
use genpdf::fonts::{FontData, FontFamily};
use genpdf::style::{Color, Style, StyledString};
use genpdf::{Alignment, Context, Document, Element, Margins, Mm, PageDecorator, Position, Scale};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

const PAGE_MARGIN: f64 = 20.0;
const FOOTER_HEIGHT: f64 = 10.0;
const HEADER_GAP: f64 = 4.0;
const COVER_IMAGE_WIDTH_MM: f64 = 120.0;
const CHART_WIDTH_MM: f64 = 110.0;
/// genpdf places images at this resolution unless told otherwise.
const GENPDF_DEFAULT_DPI: f64 = 300.0;

const LINK_BLUE: Color = Color::Rgb(0, 0, 255);
const BANNER_BLUE: Color = Color::Rgb(0x21, 0x33, 0x63);
const MUTED: Color = Color::Greyscale(110);

pub struct PdfRenderer {
    fonts: RenderConfig,
}

impl PdfRenderer {
    pub fn new(fonts: RenderConfig) -> Self {
        Self { fonts }
    }

    fn build(&self, model: &ReportModel) -> Result<Document, ReportError> {
        let family = load_font_family(&self.fonts.font_dirs, &self.fonts.font_families)?;
        let topic = sanitize(&model.topic);

        let mut doc = Document::new(family);
        doc.set_title(format!("Report: {}", topic));
        doc.set_minimal_conformance();
        doc.set_line_spacing(1.25);
        doc.set_font_size(11);
        doc.set_page_decorator(ReportPageDecorator::new(&topic));

        push_cover(&mut doc, model);
        doc.push(PageBreak::new());

        for section in sections(model) {
            match section {
                Section::Overview { text } => {
                    push_section_title(
                        &mut doc,
                        &format!("Overview ({})", model.language),
                    );
                    doc.push(Paragraph::new(sanitize(text)));
                    doc.push(Break::new(1));
                }
                Section::KeywordChart { image, signal } => {
                    if let Some(chart) = scaled_image(image, CHART_WIDTH_MM) {
                        push_section_title(&mut doc, "Semantic Analysis");
                        doc.push(chart);
                        doc.push(
                            Paragraph::new(StyledString::new(
                                sanitize(&signal.caption()),
                                Style::new().italic().with_font_size(9),
                            ))
                            .aligned(Alignment::Center),
                        );
                        doc.push(Break::new(1));
                    }
                }
                Section::WebResources { results } => {
                    push_section_title(&mut doc, "Web Resources");
                    for result in results {
                        push_web_card(&mut doc, result);
                    }
                }
            }
        }
        Ok(doc)
    }
}

impl DocumentRenderer for PdfRenderer {
    fn format(&self) -> ReportFormat {
        ReportFormat::Pdf
    }

    fn render(&self, model: &ReportModel, path: &Path) -> Result<(), ReportError> {
        let doc = self.build(model)?;
        let mut buffer = Vec::new();
        doc.render(&mut buffer).map_err(|e| ReportError::Render {
            format: ReportFormat::Pdf,
            message: e.to_string(),
        })?;
        std::fs::write(path, &buffer).map_err(|source| ReportError::Write {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), bytes = buffer.len(), "PDF written");
        Ok(())
    }
}

fn push_cover(doc: &mut Document, model: &ReportModel) {
    doc.push(Break::new(3));
    doc.push(
        Paragraph::new(StyledString::new(
            "RESEARCH REPORT",
            Style::new().bold().with_font_size(24).with_color(BANNER_BLUE),
        ))
        .aligned(Alignment::Center),
    );
    doc.push(Break::new(2));

    let cover = usable_image(model.cover_image.as_deref())
        .and_then(|path| scaled_image(path, COVER_IMAGE_WIDTH_MM));
    match cover {
        Some(image) => {
            doc.push(image);
            doc.push(Break::new(2));
        }
        None => doc.push(Break::new(6)),
    }

    doc.push(
        Paragraph::new(StyledString::new(
            sanitize(&model.topic.to_uppercase()),
            Style::new().bold().with_font_size(20),
        ))
        .aligned(Alignment::Center),
    );
    doc.push(Break::new(1));
    doc.push(
        Paragraph::new(StyledString::new(
            format!("Generated on {}", model.generated_at.format("%Y-%m-%d")),
            Style::new().with_font_size(10).with_color(MUTED),
        ))
        .aligned(Alignment::Center),
    );
}

fn push_section_title(doc: &mut Document, title: &str) {
    doc.push(Paragraph::new(StyledString::new(
        sanitize(title),
        Style::new().bold().with_font_size(15).with_color(BANNER_BLUE),
    )));
    doc.push(Break::new(0.5));
}

fn push_web_card(doc: &mut Document, result: &WebResult) {
    let title = Paragraph::new(StyledString::new(
        sanitize(&result.title),
        Style::new().bold().with_font_size(10),
    ))
    .padded(Margins::trbl(1, 2, 1, 2));
    doc.push(FramedElement::new(title));
    doc.push(Paragraph::new(StyledString::new(
        sanitize(&result.snippet),
        Style::new().with_font_size(10),
    )));
    doc.push(Paragraph::new(StyledString::new(
        sanitize(&result.url),
        Style::new().italic().with_font_size(8).with_color(LINK_BLUE),
    )));
    doc.push(Break::new(1));
}

/// Centered image scaled to `width_mm`; `None` if genpdf cannot load it.
fn scaled_image(path: &Path, width_mm: f64) -> Option<Image> {
    let (px_width, _) = match image::image_dimensions(path) {
        Ok(dims) => dims,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Unreadable image omitted");
            return None;
        }
    };
    match Image::from_path(path) {
        Ok(img) => {
            let natural_mm = px_width.max(1) as f64 / GENPDF_DEFAULT_DPI * 25.4;
            let factor = width_mm / natural_mm;
            Some(
                img.with_alignment(Alignment::Center)
                    .with_scale(Scale::new(factor, factor)),
            )
        }
        Err(e) => {
            // genpdf rejects images with an alpha channel.
            warn!(path = %path.display(), error = %e, "Image omitted from PDF");
            None
        }
    }
}

/// Running header from page 2 and a page-number footer on every page.
struct ReportPageDecorator {
    page: usize,
    header: String,
}

impl ReportPageDecorator {
    fn new(topic: &str) -> Self {
        Self {
            page: 0,
            header: format!("Report: {}", topic),
        }
    }
}

impl PageDecorator for ReportPageDecorator {
    fn decorate_page<'a>(
        &mut self,
        context: &Context,
        mut area: genpdf::render::Area<'a>,
        style: Style,
    ) -> Result<genpdf::render::Area<'a>, genpdf::error::Error> {
        self.page += 1;
        area.add_margins(Margins::trbl(
            PAGE_MARGIN,
            PAGE_MARGIN,
            PAGE_MARGIN,
            PAGE_MARGIN,
        ));

        let footer_top = area.size().height - Mm::from(FOOTER_HEIGHT);
        let mut footer_area = area.clone();
        footer_area.add_offset(Position::new(0, footer_top));
        let mut footer = Paragraph::new(StyledString::new(
            format!("Page {}", self.page),
            Style::new().italic().with_font_size(8).with_color(MUTED),
        ))
        .aligned(Alignment::Center);
        footer.render(context, footer_area, style)?;
        area.set_height(footer_top);

        if self.page > 1 {
            let mut header = Paragraph::new(StyledString::new(
                self.header.clone(),
                Style::new().italic().with_font_size(8).with_color(MUTED),
            ))
            .aligned(Alignment::Right);
            let result = header.render(context, area.clone(), style)?;
            area.add_offset(Position::new(0, result.size.height + Mm::from(HEADER_GAP)));
        }
        Ok(area)
    }
}

/// First family found in `dirs`, trying `families` in order within each directory.
pub fn load_font_family(
    dirs: &[PathBuf],
    families: &[String],
) -> Result<FontFamily<FontData>, ReportError> {
    for dir in dirs {
        for family in families {
            if let Some(found) = load_family_from(dir, family) {
                debug!(dir = %dir.display(), family = %family, "Using font family");
                return Ok(found);
            }
        }
    }
    Err(ReportError::Render {
        format: ReportFormat::Pdf,
        message: format!(
            "no usable font family ({}) in {} searched directories",
            families.join(", "),
            dirs.len()
        ),
    })
}

fn load_family_from(dir: &Path, family: &str) -> Option<FontFamily<FontData>> {
    if !dir.is_dir() {
        return None;
    }
    Some(FontFamily {
        regular: load_variant(dir, family, &["-Regular", "", " Regular"])?,
        bold: load_variant(dir, family, &["-Bold", " Bold"])?,
        italic: load_variant(dir, family, &["-Italic", "-Oblique", " Italic"])?,
        bold_italic: load_variant(
            dir,
            family,
            &["-BoldItalic", "-BoldOblique", " Bold Italic"],
        )?,
    })
}

fn load_variant(dir: &Path, family: &str, suffixes: &[&str]) -> Option<FontData> {
    suffixes.iter().find_map(|suffix| {
        let path = dir.join(format!("{family}{suffix}.ttf"));
        if !path.is_file() {
            return None;
        }
        FontData::load(&path, None).ok()
    })
}
