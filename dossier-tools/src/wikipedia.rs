//! Encyclopedia summaries from the MediaWiki Action API.
//!
//! Two queries per topic: a plain-text extract (following redirects, refusing
//! disambiguation pages) and, best-effort, the page's image URLs.

use async_trait::async_trait;
use dossier_core::config::SourcesConfig;
use dossier_core::error::SourceError;
use dossier_core::report::{EncyclopediaPage, Language, SummarySource};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

use crate::http::{build_client, map_reqwest_error};

/// TextExtracts refuses `exsentences` above this; longer summaries are cut locally.
const API_MAX_SENTENCES: usize = 10;

pub struct WikipediaClient {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
    max_images: usize,
}

impl WikipediaClient {
    pub fn new(settings: &SourcesConfig) -> Result<Self, SourceError> {
        Ok(Self {
            client: build_client(&settings.user_agent)?,
            base_url: settings.wikipedia_base_url.clone(),
            timeout: Duration::from_secs(settings.api_timeout_secs),
            max_images: settings.max_image_candidates,
        })
    }

    /// API endpoint for `language`; `{lang}` in the base URL is substituted.
    pub fn endpoint(&self, language: Language) -> String {
        self.base_url.replace("{lang}", language.code())
    }

    async fn query(
        &self,
        language: Language,
        params: &[(&str, String)],
    ) -> Result<QueryResponse, SourceError> {
        let url = self.endpoint(language);
        let response = self
            .client
            .get(&url)
            .query(&[("action", "query"), ("format", "json"), ("formatversion", "2")])
            .query(params)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| map_reqwest_error(e, self.timeout))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::Status {
                status: status.as_u16(),
                url,
            });
        }
        let body = response
            .text()
            .await
            .map_err(|e| map_reqwest_error(e, self.timeout))?;
        serde_json::from_str(&body).map_err(|e| SourceError::Parse {
            message: format!("Invalid MediaWiki response: {}", e),
        })
    }

    async fn image_urls(&self, title: &str, language: Language) -> Vec<String> {
        let params = [
            ("generator", "images".to_string()),
            ("titles", title.to_string()),
            ("gimlimit", self.max_images.max(1).to_string()),
            ("prop", "imageinfo".to_string()),
            ("iiprop", "url".to_string()),
        ];
        match self.query(language, &params).await {
            Ok(response) => parse_image_urls(response),
            Err(e) => {
                warn!(title, error = %e, "Image list unavailable");
                Vec::new()
            }
        }
    }
}

#[async_trait]
impl SummarySource for WikipediaClient {
    async fn summary(
        &self,
        topic: &str,
        language: Language,
        sentences: usize,
    ) -> Result<EncyclopediaPage, SourceError> {
        let mut params = vec![
            ("prop", "extracts|pageprops".to_string()),
            ("explaintext", "1".to_string()),
            ("exsectionformat", "wiki".to_string()),
            ("redirects", "1".to_string()),
            ("titles", topic.to_string()),
        ];
        if sentences <= API_MAX_SENTENCES {
            params.push(("exsentences", sentences.to_string()));
        }

        let response = self.query(language, &params).await?;
        let (title, extract) = parse_extract(response, topic)?;
        let summary = first_sentences(&extract, sentences);
        debug!(topic, title = %title, chars = summary.len(), "Encyclopedia summary");

        let image_urls = self.image_urls(&title, language).await;
        Ok(EncyclopediaPage {
            title,
            summary,
            image_urls,
        })
    }
}

// --- Response shapes (formatversion=2) ---

#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    query: Option<QueryBody>,
}

#[derive(Debug, Deserialize)]
struct QueryBody {
    #[serde(default)]
    pages: Vec<Page>,
}

#[derive(Debug, Deserialize)]
struct Page {
    #[serde(default)]
    title: String,
    #[serde(default)]
    missing: bool,
    #[serde(default)]
    invalid: bool,
    #[serde(default)]
    extract: Option<String>,
    #[serde(default)]
    pageprops: Option<serde_json::Map<String, serde_json::Value>>,
    #[serde(default)]
    imageinfo: Vec<ImageInfo>,
}

#[derive(Debug, Deserialize)]
struct ImageInfo {
    url: String,
}

fn parse_extract(response: QueryResponse, topic: &str) -> Result<(String, String), SourceError> {
    let not_found = || SourceError::NotFound {
        topic: topic.to_string(),
    };
    let page = response
        .query
        .and_then(|q| q.pages.into_iter().next())
        .ok_or_else(not_found)?;
    if page.missing || page.invalid {
        return Err(not_found());
    }
    if page
        .pageprops
        .as_ref()
        .is_some_and(|p| p.contains_key("disambiguation"))
    {
        return Err(SourceError::Disambiguation {
            topic: topic.to_string(),
        });
    }
    let extract = page.extract.unwrap_or_default();
    if extract.trim().is_empty() {
        return Err(not_found());
    }
    Ok((page.title, extract))
}

/// Image URLs ordered by file title, as the page's image list is.
fn parse_image_urls(response: QueryResponse) -> Vec<String> {
    let mut pages = response.query.map(|q| q.pages).unwrap_or_default();
    pages.sort_by(|a, b| a.title.cmp(&b.title));
    pages
        .into_iter()
        .filter_map(|p| p.imageinfo.into_iter().next())
        .map(|info| info.url)
        .collect()
}

/// `== Heading ==` lines of a full-article extract.
fn is_section_heading(line: &str) -> bool {
    let line = line.trim();
    line.len() > 2 && line.starts_with("==") && line.ends_with("==")
}

/// Leading `count` sentences of `text`, whitespace-collapsed. Section headings
/// are skipped.
pub fn first_sentences(text: &str, count: usize) -> String {
    let words = text
        .lines()
        .filter(|line| !is_section_heading(line))
        .flat_map(str::split_whitespace);
    let mut out = Vec::new();
    let mut seen = 0;
    for word in words {
        out.push(word);
        if word.ends_with(['.', '!', '?']) {
            seen += 1;
            if seen >= count {
                break;
            }
        }
    }
    out.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(json: &str) -> QueryResponse {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_endpoint_substitutes_language() {
        let client = WikipediaClient::new(&SourcesConfig::default()).unwrap();
        assert_eq!(
            client.endpoint(Language::Fr),
            "https://fr.wikipedia.org/w/api.php"
        );
    }

    #[test]
    fn test_parse_extract() {
        let r = response(
            r#"{"batchcomplete":true,"query":{"redirects":[{"from":"rome","to":"Rome"}],
                "pages":[{"pageid":25458,"ns":0,"title":"Rome","extract":"Rome is the capital of Italy."}]}}"#,
        );
        let (title, extract) = parse_extract(r, "rome").unwrap();
        assert_eq!(title, "Rome");
        assert_eq!(extract, "Rome is the capital of Italy.");
    }

    #[test]
    fn test_parse_missing_page() {
        let r = response(r#"{"query":{"pages":[{"ns":0,"title":"Qzxv","missing":true}]}}"#);
        assert!(matches!(
            parse_extract(r, "Qzxv"),
            Err(SourceError::NotFound { .. })
        ));
        let empty = response(r#"{"batchcomplete":true}"#);
        assert!(matches!(
            parse_extract(empty, "x"),
            Err(SourceError::NotFound { .. })
        ));
    }

    #[test]
    fn test_parse_disambiguation() {
        let r = response(
            r#"{"query":{"pages":[{"pageid":1,"title":"Mercury","extract":"Mercury may refer to:",
                "pageprops":{"disambiguation":""}}]}}"#,
        );
        assert!(matches!(
            parse_extract(r, "Mercury"),
            Err(SourceError::Disambiguation { .. })
        ));
    }

    #[test]
    fn test_parse_image_urls_sorted_by_title() {
        let r = response(
            r#"{"query":{"pages":[
                {"ns":6,"title":"File:Z.png","imageinfo":[{"url":"https://upload/z.png"}]},
                {"ns":6,"title":"File:A.svg","imageinfo":[{"url":"https://upload/a.svg"}]},
                {"ns":6,"title":"File:M.jpg"}
            ]}}"#,
        );
        assert_eq!(
            parse_image_urls(r),
            vec!["https://upload/a.svg", "https://upload/z.png"]
        );
    }

    #[test]
    fn test_first_sentences() {
        let text = "One is first. Two follows!  Three asks?\nFour ends.";
        assert_eq!(first_sentences(text, 2), "One is first. Two follows!");
        assert_eq!(first_sentences(text, 10), "One is first. Two follows! Three asks? Four ends.");
        assert_eq!(first_sentences("No terminator here", 1), "No terminator here");
    }

    #[test]
    fn test_first_sentences_skips_section_headings() {
        let text = "Rome is a city. It is old.\n\n\n== History ==\nRome was founded in 753 BC. It grew.\n=== Empire ===\nIt ruled.";
        assert_eq!(
            first_sentences(text, 20),
            "Rome is a city. It is old. Rome was founded in 753 BC. It grew. It ruled."
        );
        assert_eq!(first_sentences(text, 3), "Rome is a city. It is old. Rome was founded in 753 BC.");
    }
}
