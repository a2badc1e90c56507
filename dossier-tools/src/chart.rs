//! Keyword bar chart, drawn straight into an RGB PNG.
//!
//! One bar per keyword in signal order, height proportional to its count.
//! Labels are not drawn; renderers print the keyword list under the image.

use dossier_core::error::SourceError;
use dossier_core::keywords::KeywordSignal;
use dossier_core::report::ChartRenderer;
use image::{ImageFormat, Rgb, RgbImage};
use std::path::Path;
use tracing::debug;

pub const BAR_COLOR: Rgb<u8> = Rgb([0x21, 0x33, 0x63]);
pub const BACKGROUND: Rgb<u8> = Rgb([0xFF, 0xFF, 0xFF]);
const AXIS_COLOR: Rgb<u8> = Rgb([0x80, 0x80, 0x80]);

#[derive(Debug, Clone)]
pub struct BarChartRenderer {
    width: u32,
    height: u32,
    margin: u32,
}

impl Default for BarChartRenderer {
    fn default() -> Self {
        // 6x4 inches at 100 dpi.
        Self {
            width: 600,
            height: 400,
            margin: 30,
        }
    }
}

impl BarChartRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Draw `signal` into an in-memory image.
    pub fn draw(&self, signal: &KeywordSignal) -> Result<RgbImage, SourceError> {
        if signal.is_empty() {
            return Err(SourceError::Chart {
                message: "empty keyword signal".into(),
            });
        }
        if self.width <= self.margin * 2 || self.height <= self.margin * 2 {
            return Err(SourceError::Chart {
                message: format!("chart area {}x{} too small", self.width, self.height),
            });
        }

        let mut img = RgbImage::from_pixel(self.width, self.height, BACKGROUND);
        let plot_w = self.width - 2 * self.margin;
        let plot_h = self.height - 2 * self.margin;
        let baseline = self.height - self.margin;

        let max = signal.max_count().max(1) as u32;
        let slot = plot_w / signal.len() as u32;
        let bar_w = (slot * 2 / 3).max(1);

        for (i, entry) in signal.entries().iter().enumerate() {
            let bar_h = (plot_h * entry.count as u32 / max).max(1);
            let x0 = self.margin + slot * i as u32 + (slot - bar_w) / 2;
            fill_rect(&mut img, x0, baseline - bar_h, bar_w, bar_h, BAR_COLOR);
        }
        fill_rect(&mut img, self.margin, baseline, plot_w, 1, AXIS_COLOR);
        Ok(img)
    }
}

fn fill_rect(img: &mut RgbImage, x: u32, y: u32, w: u32, h: u32, color: Rgb<u8>) {
    let x_end = (x + w).min(img.width());
    let y_end = (y + h).min(img.height());
    for py in y..y_end {
        for px in x..x_end {
            img.put_pixel(px, py, color);
        }
    }
}

impl ChartRenderer for BarChartRenderer {
    fn render_chart(
        &self,
        topic: &str,
        signal: &KeywordSignal,
        path: &Path,
    ) -> Result<(), SourceError> {
        let img = self.draw(signal)?;
        img.save_with_format(path, ImageFormat::Png)
            .map_err(|e| SourceError::Chart {
                message: format!("Failed to write {}: {}", path.display(), e),
            })?;
        debug!(topic, path = %path.display(), bars = signal.len(), "Chart written");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dossier_core::keywords::extract_keywords;

    #[test]
    fn test_empty_signal_is_an_error() {
        let renderer = BarChartRenderer::new();
        assert!(renderer.draw(&KeywordSignal::default()).is_err());
    }

    #[test]
    fn test_tallest_bar_spans_plot() {
        let renderer = BarChartRenderer::new();
        let signal = extract_keywords("volcano volcano volcano magma magma crater");
        let img = renderer.draw(&signal).unwrap();
        assert_eq!(img.dimensions(), (600, 400));

        // First slot holds the most frequent keyword, drawn to the top margin.
        let slot = 540 / 3;
        let center_x = 30 + slot / 2;
        assert_eq!(*img.get_pixel(center_x, 31), BAR_COLOR);
        // Third bar (count 1) is a third as tall.
        let third_x = 30 + slot * 2 + slot / 2;
        assert_eq!(*img.get_pixel(third_x, 31), BACKGROUND);
        assert_eq!(*img.get_pixel(third_x, 369), BAR_COLOR);
        // Corners stay white.
        assert_eq!(*img.get_pixel(0, 0), BACKGROUND);
    }

    #[test]
    fn test_render_chart_writes_png() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("chart.png");
        let signal = extract_keywords("glacier glacier moraine");
        BarChartRenderer::new()
            .render_chart("Ice", &signal, &path)
            .unwrap();
        let (w, h) = image::image_dimensions(&path).unwrap();
        assert_eq!((w, h), (600, 400));
    }
}
