//! Source gatherers: best-effort data fetches that never fail the pipeline.
//!
//! Each gatherer absorbs its own errors: the failure is logged and replaced by
//! a sentinel so the report can still be produced from whatever else arrived.

use scraper::{Html, Selector};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use super::model::Language;
use super::sources::{HttpFetcher, SearchHit, SearchSource, SummarySource};
use crate::config::SourcesConfig;
use crate::persistence;

/// Summary text used when the encyclopedia lookup fails.
pub const SUMMARY_UNAVAILABLE: &str = "N/A";
/// Excerpt used when a page cannot be fetched or parsed.
pub const SCRAPE_FAILED: &str = "Site access failed.";
/// Excerpt used when a fetched page has no paragraph text.
pub const SCRAPE_EMPTY: &str = "No text content detected.";

/// Maximum excerpt length in characters before the `...` marker.
pub const EXCERPT_MAX_CHARS: usize = 400;
/// Number of leading paragraphs joined into an excerpt.
pub const EXCERPT_PARAGRAPHS: usize = 3;

const RASTER_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png"];

/// Outcome of [`Gatherers::fetch_summary`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryOutcome {
    pub text: String,
    /// Downloaded cover image; the caller owns and deletes it.
    pub cover_image: Option<PathBuf>,
}

impl SummaryOutcome {
    pub fn unavailable() -> Self {
        Self {
            text: SUMMARY_UNAVAILABLE.to_string(),
            cover_image: None,
        }
    }

    pub fn is_unavailable(&self) -> bool {
        self.text == SUMMARY_UNAVAILABLE
    }
}

/// The three gatherers and the collaborators they call.
#[derive(Clone)]
pub struct Gatherers {
    summary: Arc<dyn SummarySource>,
    search: Arc<dyn SearchSource>,
    fetcher: Arc<dyn HttpFetcher>,
    settings: SourcesConfig,
}

impl Gatherers {
    pub fn new(
        summary: Arc<dyn SummarySource>,
        search: Arc<dyn SearchSource>,
        fetcher: Arc<dyn HttpFetcher>,
        settings: SourcesConfig,
    ) -> Self {
        Self {
            summary,
            search,
            fetcher,
            settings,
        }
    }

    /// Encyclopedia summary plus an optional cover image saved under `temp_dir`.
    ///
    /// Any lookup failure yields [`SUMMARY_UNAVAILABLE`] and no image.
    pub async fn fetch_summary(
        &self,
        topic: &str,
        language: Language,
        sentences: usize,
        temp_dir: &Path,
    ) -> SummaryOutcome {
        debug!(topic, lang = language.code(), sentences, "Fetching summary");
        let page = match self.summary.summary(topic, language, sentences).await {
            Ok(page) => page,
            Err(e) => {
                warn!(topic, error = %e, "Summary unavailable");
                return SummaryOutcome::unavailable();
            }
        };

        let cover_image = self
            .download_cover(topic, &page.image_urls, temp_dir)
            .await;
        SummaryOutcome {
            text: page.summary,
            cover_image,
        }
    }

    /// Try the first raster image among the leading candidates.
    async fn download_cover(
        &self,
        topic: &str,
        image_urls: &[String],
        temp_dir: &Path,
    ) -> Option<PathBuf> {
        let timeout = Duration::from_secs(self.settings.image_timeout_secs);
        for url in image_urls.iter().take(self.settings.max_image_candidates) {
            let Some(ext) = raster_extension(url) else {
                continue;
            };
            let response = match self.fetcher.get(url, timeout).await {
                Ok(r) if r.is_ok() => r,
                Ok(r) => {
                    debug!(url = %url, status = r.status, "Skipping cover candidate");
                    continue;
                }
                Err(e) => {
                    warn!(url = %url, error = %e, "Cover image download failed");
                    return None;
                }
            };
            let path = temp_dir.join(temp_file_name(topic, "cover", &ext));
            return match tokio::fs::write(&path, &response.body).await {
                Ok(()) => {
                    debug!(path = %path.display(), "Saved cover image");
                    Some(path)
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Could not save cover image");
                    let _ = persistence::remove_if_exists(&path);
                    None
                }
            };
        }
        None
    }

    /// Up to `count` search hits for `topic`; empty on any failure.
    pub async fn fetch_web_results(&self, topic: &str, count: usize) -> Vec<SearchHit> {
        debug!(topic, count, "Searching the web");
        match self.search.search(topic, count).await {
            Ok(mut hits) => {
                hits.truncate(count);
                hits
            }
            Err(e) => {
                warn!(topic, error = %e, "Web search unavailable");
                Vec::new()
            }
        }
    }

    /// Excerpt of the first paragraphs of `url`, or [`SCRAPE_FAILED`].
    pub async fn scrape_page(&self, url: &str) -> String {
        let timeout = Duration::from_secs(self.settings.scrape_timeout_secs);
        match self.fetcher.get_text(url, timeout).await {
            Ok(response) if response.is_ok() => extract_excerpt(&response.text()),
            Ok(response) => {
                warn!(url, status = response.status, "Scrape refused");
                SCRAPE_FAILED.to_string()
            }
            Err(e) => {
                warn!(url, error = %e, "Scrape failed");
                SCRAPE_FAILED.to_string()
            }
        }
    }
}

/// Join the text of the first paragraphs of `html` into a bounded excerpt.
pub fn extract_excerpt(html: &str) -> String {
    let document = Html::parse_document(html);
    let Ok(selector) = Selector::parse("p") else {
        return SCRAPE_FAILED.to_string();
    };

    let joined = document
        .select(&selector)
        .take(EXCERPT_PARAGRAPHS)
        .map(|p| p.text().collect::<String>())
        .collect::<Vec<_>>()
        .join(" ");

    let bounded = if joined.chars().count() > EXCERPT_MAX_CHARS {
        let mut cut: String = joined.chars().take(EXCERPT_MAX_CHARS).collect();
        cut.push_str("...");
        cut
    } else {
        joined
    };

    let trimmed = bounded.trim();
    if trimmed.is_empty() {
        SCRAPE_EMPTY.to_string()
    } else {
        trimmed.to_string()
    }
}

/// Lower-cased extension of `url` if it names a supported raster image.
pub fn raster_extension(url: &str) -> Option<String> {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    let ext = path.rsplit_once('.')?.1.to_lowercase();
    RASTER_EXTENSIONS.contains(&ext.as_str()).then_some(ext)
}

/// Process-local, topic-derived temp file name, e.g. `dossier-4242-ancient-rome-chart.png`.
pub fn temp_file_name(topic: &str, kind: &str, ext: &str) -> String {
    format!(
        "dossier-{}-{}-{}.{}",
        std::process::id(),
        topic_slug(topic),
        kind,
        ext
    )
}

/// ASCII-lowercase slug of `topic`, limited to 48 characters.
pub fn topic_slug(topic: &str) -> String {
    let mut slug = String::new();
    let mut last_dash = true;
    for ch in topic.chars() {
        if ch.is_ascii_alphanumeric() {
            slug.push(ch.to_ascii_lowercase());
            last_dash = false;
        } else if !last_dash {
            slug.push('-');
            last_dash = true;
        }
        if slug.len() >= 48 {
            break;
        }
    }
    let slug = slug.trim_matches('-').to_string();
    if slug.is_empty() { "topic".to_string() } else { slug }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_excerpt_first_three_paragraphs() {
        let html = "<html><body><h1>Ignored</h1><p>One.</p><p>Two.</p><p>Three.</p><p>Four.</p></body></html>";
        assert_eq!(extract_excerpt(html), "One. Two. Three.");
    }

    #[test]
    fn test_extract_excerpt_nested_markup() {
        let html = "<p>A <b>bold</b> <a href='#'>link</a>.</p>";
        assert_eq!(extract_excerpt(html), "A bold link.");
    }

    #[test]
    fn test_extract_excerpt_truncates_with_ellipsis() {
        let long = "x".repeat(500);
        let html = format!("<p>{long}</p>");
        let excerpt = extract_excerpt(&html);
        assert_eq!(excerpt.chars().count(), EXCERPT_MAX_CHARS + 3);
        assert!(excerpt.ends_with("..."));
    }

    #[test]
    fn test_extract_excerpt_truncates_by_chars() {
        let long = "è".repeat(450);
        let excerpt = extract_excerpt(&format!("<p>{long}</p>"));
        assert_eq!(excerpt.chars().count(), 403);
    }

    #[test]
    fn test_extract_excerpt_exactly_limit_not_truncated() {
        let exact = "y".repeat(EXCERPT_MAX_CHARS);
        assert_eq!(extract_excerpt(&format!("<p>{exact}</p>")), exact);
    }

    #[test]
    fn test_extract_excerpt_no_paragraphs() {
        assert_eq!(extract_excerpt("<div>no paragraphs</div>"), SCRAPE_EMPTY);
        assert_eq!(extract_excerpt("<p>   </p>"), SCRAPE_EMPTY);
        assert_eq!(extract_excerpt(""), SCRAPE_EMPTY);
    }

    #[test]
    fn test_raster_extension() {
        assert_eq!(
            raster_extension("https://upload.wikimedia.org/a/Colosseum.JPG"),
            Some("jpg".into())
        );
        assert_eq!(raster_extension("http://x/y.png?width=200"), Some("png".into()));
        assert_eq!(raster_extension("http://x/y.jpeg"), Some("jpeg".into()));
        assert_eq!(raster_extension("http://x/logo.svg"), None);
        assert_eq!(raster_extension("http://x/noext"), None);
    }

    #[test]
    fn test_topic_slug() {
        assert_eq!(topic_slug("Ancient Rome"), "ancient-rome");
        assert_eq!(topic_slug("  C++ / Rust!  "), "c-rust");
        assert_eq!(topic_slug("東京"), "topic");
        assert!(topic_slug(&"a".repeat(100)).len() <= 48);
    }

    #[test]
    fn test_temp_file_name_is_process_local() {
        let name = temp_file_name("Ancient Rome", "chart", "png");
        assert_eq!(
            name,
            format!("dossier-{}-ancient-rome-chart.png", std::process::id())
        );
    }

    #[test]
    fn test_summary_outcome_unavailable() {
        let outcome = SummaryOutcome::unavailable();
        assert!(outcome.is_unavailable());
        assert!(outcome.cover_image.is_none());
    }
}
