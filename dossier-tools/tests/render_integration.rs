//! Integration tests for the document renderers and the chart.
//!
//! The DOCX package is unzipped and its XML inspected. PDF rendering needs a
//! TrueType family on the host; those tests return early when none is found.

use chrono::Local;
use dossier_core::config::RenderConfig;
use dossier_core::keywords::extract_keywords;
use dossier_core::report::{
    ChartRenderer, Depth, DocumentRenderer, Language, ReportFormat, ReportModel, WebResult,
};
use dossier_tools::pdf::load_font_family;
use dossier_tools::{BarChartRenderer, DocxRenderer, PdfRenderer};
use image::{Rgb, RgbImage};
use std::io::Read;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn model(topic: &str) -> ReportModel {
    ReportModel {
        topic: topic.into(),
        language: Language::En,
        depth: Depth::Normal,
        cover_image: None,
        summary: "Venice is a city built on islands \u{2014} \u{201C}La Serenissima\u{201D}.".into(),
        web_results: vec![WebResult {
            title: "Canals & Bridges".into(),
            snippet: "More than 400 bridges <cross> the canals.".into(),
            url: "https://example.org/venice".into(),
        }],
        keywords: Default::default(),
        chart_image: None,
        generated_at: Local::now(),
    }
}

fn write_png(path: &Path, w: u32, h: u32) {
    RgbImage::from_pixel(w, h, Rgb([200, 30, 30]))
        .save(path)
        .unwrap();
}

fn with_chart(dir: &TempDir, mut m: ReportModel) -> ReportModel {
    let signal = extract_keywords("lagoon lagoon gondola canals canals canals");
    let chart = dir.path().join("chart.png");
    BarChartRenderer::new()
        .render_chart(&m.topic, &signal, &chart)
        .unwrap();
    m.keywords = signal;
    m.chart_image = Some(chart);
    m
}

fn docx_entry(path: &Path, name: &str) -> Option<Vec<u8>> {
    let file = std::fs::File::open(path).unwrap();
    let mut archive = zip::ZipArchive::new(file).unwrap();
    let mut entry = archive.by_name(name).ok()?;
    let mut buf = Vec::new();
    entry.read_to_end(&mut buf).unwrap();
    Some(buf)
}

fn docx_document(path: &Path) -> String {
    String::from_utf8(docx_entry(path, "word/document.xml").expect("document part")).unwrap()
}

// --- DOCX ---

#[test]
fn test_docx_minimal_report() {
    let dir = TempDir::new().unwrap();
    let out = dir.path().join("venice.docx");
    DocxRenderer::new().unwrap().render(&model("Venice"), &out).unwrap();

    let xml = docx_document(&out);
    assert!(xml.contains("Report: Venice"));
    assert!(xml.contains("Generated on: "));
    assert!(xml.contains(r#"<w:pStyle w:val="Heading1"/></w:pPr><w:r><w:t xml:space="preserve">Overview</w:t>"#));
    // Full Unicode survives in the flow document.
    assert!(xml.contains("\u{201C}La Serenissima\u{201D}"));
    // Markup in data is escaped.
    assert!(xml.contains("Canals &amp; Bridges"));
    assert!(xml.contains("&lt;cross&gt;"));
    assert!(xml.contains(r#"<w:pStyle w:val="IntenseQuote"/>"#));
    assert!(xml.contains("Source: https://example.org/venice"));
    assert!(!xml.contains("Data Analysis"));
    assert!(!xml.contains("<w:drawing>"));

    assert!(docx_entry(&out, "[Content_Types].xml").is_some());
    assert!(docx_entry(&out, "word/styles.xml").is_some());
    assert!(docx_entry(&out, "word/media/image1.png").is_none());
}

#[test]
fn test_docx_with_cover_and_chart() {
    let dir = TempDir::new().unwrap();
    let cover = dir.path().join("cover.jpg");
    RgbImage::from_pixel(400, 200, Rgb([10, 80, 160]))
        .save_with_format(&cover, image::ImageFormat::Jpeg)
        .unwrap();
    let mut m = with_chart(&dir, model("Venice"));
    m.cover_image = Some(cover);

    let out = dir.path().join("venice.docx");
    DocxRenderer::new().unwrap().render(&m, &out).unwrap();

    let xml = docx_document(&out);
    assert!(xml.contains("Data Analysis"));
    assert!(xml.contains("canals (3), lagoon (2), gondola (1)"));
    // Cover: 4in wide, aspect kept (2:1).
    assert!(xml.contains(r#"<wp:extent cx="3657600" cy="1828800"/>"#));
    // Chart: 5in wide, 600x400.
    assert!(xml.contains(r#"<wp:extent cx="4572000" cy="3048000"/>"#));

    let rels = String::from_utf8(docx_entry(&out, "word/_rels/document.xml.rels").unwrap()).unwrap();
    assert!(rels.contains(r#"Target="media/image1.jpg""#));
    assert!(rels.contains(r#"Target="media/image2.png""#));
    assert!(docx_entry(&out, "word/media/image1.jpg").is_some());
    assert!(docx_entry(&out, "word/media/image2.png").is_some());
}

#[test]
fn test_docx_missing_image_is_omitted() {
    let dir = TempDir::new().unwrap();
    let mut m = model("Venice");
    m.cover_image = Some(PathBuf::from("/nonexistent/cover.png"));
    let out = dir.path().join("venice.docx");
    DocxRenderer::new().unwrap().render(&m, &out).unwrap();
    assert!(!docx_document(&out).contains("<w:drawing>"));
}

#[test]
fn test_docx_unwritable_destination() {
    let dir = TempDir::new().unwrap();
    let out = dir.path().join("no-such-dir").join("venice.docx");
    let err = DocxRenderer::new()
        .unwrap()
        .render(&model("Venice"), &out)
        .unwrap_err();
    assert!(matches!(err, dossier_core::ReportError::Write { .. }));
}

// --- PDF ---

fn pdf_renderer() -> Option<PdfRenderer> {
    let fonts = RenderConfig::default();
    match load_font_family(&fonts.font_dirs, &fonts.font_families) {
        Ok(_) => Some(PdfRenderer::new(fonts)),
        Err(e) => {
            eprintln!("skipping PDF render test: {e}");
            None
        }
    }
}

#[test]
fn test_pdf_renders_full_report() {
    let Some(renderer) = pdf_renderer() else {
        return;
    };
    let dir = TempDir::new().unwrap();
    let cover = dir.path().join("cover.png");
    write_png(&cover, 300, 200);
    let mut m = with_chart(&dir, model("Venezia \u{2014} citt\u{E0}"));
    m.cover_image = Some(cover);

    let out = dir.path().join("venice.pdf");
    renderer.render(&m, &out).unwrap();

    let bytes = std::fs::read(&out).unwrap();
    assert!(bytes.starts_with(b"%PDF"));
    assert_eq!(renderer.format(), ReportFormat::Pdf);
}

#[test]
fn test_pdf_without_images_or_results() {
    let Some(renderer) = pdf_renderer() else {
        return;
    };
    let dir = TempDir::new().unwrap();
    let mut m = model("Empty");
    m.web_results.clear();
    m.summary = "N/A".into();
    let out = dir.path().join("empty.pdf");
    renderer.render(&m, &out).unwrap();
    assert!(std::fs::metadata(&out).unwrap().len() > 0);
}

#[test]
fn test_pdf_without_fonts_fails_cleanly() {
    let dir = TempDir::new().unwrap();
    let renderer = PdfRenderer::new(RenderConfig {
        font_dirs: vec![dir.path().to_path_buf()],
        font_families: vec!["Nope".into()],
    });
    let out = dir.path().join("x.pdf");
    let err = renderer.render(&model("X"), &out).unwrap_err();
    assert!(matches!(
        err,
        dossier_core::ReportError::Render {
            format: ReportFormat::Pdf,
            ..
        }
    ));
    assert!(!out.exists());
}
