//! Web search through DuckDuckGo's HTML endpoint.
//!
//! No API key required. Result links on that page point at a redirect
//! (`/l/?uddg=<encoded target>`), which is unwrapped to the real URL.

use async_trait::async_trait;
use dossier_core::config::SourcesConfig;
use dossier_core::error::SourceError;
use dossier_core::report::{SearchHit, SearchSource};
use scraper::{ElementRef, Html, Selector};
use std::time::Duration;
use tracing::debug;
use url::Url;

use crate::http::{build_client, map_reqwest_error};

pub struct DuckDuckGoSearch {
    client: reqwest::Client,
    search_url: String,
    timeout: Duration,
}

impl DuckDuckGoSearch {
    pub fn new(settings: &SourcesConfig) -> Result<Self, SourceError> {
        Ok(Self {
            client: build_client(&settings.user_agent)?,
            search_url: settings.search_url.clone(),
            timeout: Duration::from_secs(settings.api_timeout_secs),
        })
    }
}

#[async_trait]
impl SearchSource for DuckDuckGoSearch {
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchHit>, SourceError> {
        if max_results == 0 {
            return Ok(Vec::new());
        }
        let response = self
            .client
            .post(&self.search_url)
            .form(&[("q", query)])
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| map_reqwest_error(e, self.timeout))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::Status {
                status: status.as_u16(),
                url: self.search_url.clone(),
            });
        }
        let body = response
            .text()
            .await
            .map_err(|e| map_reqwest_error(e, self.timeout))?;

        let hits = parse_results(&body, max_results)?;
        debug!(query, hits = hits.len(), "Web search");
        Ok(hits)
    }
}

fn selector(css: &str) -> Result<Selector, SourceError> {
    Selector::parse(css).map_err(|e| SourceError::Parse {
        message: format!("Bad selector {}: {}", css, e),
    })
}

fn element_text(el: ElementRef<'_>) -> String {
    el.text()
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Organic results from a DuckDuckGo HTML page, in page order.
///
/// Sponsored entries and entries without a usable link are skipped.
pub fn parse_results(html: &str, max_results: usize) -> Result<Vec<SearchHit>, SourceError> {
    let document = Html::parse_document(html);
    let result_sel = selector(".result")?;
    let link_sel = selector("a.result__a")?;
    let snippet_sel = selector(".result__snippet")?;

    let mut hits = Vec::new();
    for result in document.select(&result_sel) {
        if hits.len() >= max_results {
            break;
        }
        if result.value().classes().any(|c| c == "result--ad") {
            continue;
        }
        let Some(link) = result.select(&link_sel).next() else {
            continue;
        };
        let Some(url) = link.value().attr("href").and_then(decode_result_url) else {
            continue;
        };
        let snippet = result
            .select(&snippet_sel)
            .next()
            .map(element_text)
            .unwrap_or_default();
        hits.push(SearchHit {
            title: element_text(link),
            snippet,
            url,
        });
    }
    Ok(hits)
}

/// Target of a result link: the `uddg` parameter of a redirect, or the link itself.
pub fn decode_result_url(href: &str) -> Option<String> {
    let absolute = if href.starts_with("//") {
        format!("https:{href}")
    } else if href.starts_with('/') {
        format!("https://duckduckgo.com{href}")
    } else {
        href.to_string()
    };
    let parsed = Url::parse(&absolute).ok()?;

    if let Some((_, target)) = parsed.query_pairs().find(|(k, _)| k == "uddg") {
        return Some(target.into_owned());
    }
    matches!(parsed.scheme(), "http" | "https").then(|| parsed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const PAGE: &str = r##"
<html><body>
  <div class="result results_links result--ad">
    <h2 class="result__title"><a class="result__a" href="https://ads.example/">Sponsored</a></h2>
    <a class="result__snippet">Buy now</a>
  </div>
  <div class="result results_links results_links_deep web-result">
    <h2 class="result__title">
      <a rel="nofollow" class="result__a" href="//duckduckgo.com/l/?uddg=https%3A%2F%2Fen.wikipedia.org%2Fwiki%2FColosseum&amp;rut=abc">The <b>Colosseum</b></a>
    </h2>
    <a class="result__snippet" href="#">An oval   amphitheatre in the centre of <b>Rome</b>.</a>
  </div>
  <div class="result results_links web-result">
    <h2 class="result__title"><a class="result__a" href="https://www.rome.net/colosseum">Colosseum tickets</a></h2>
  </div>
  <div class="result results_links web-result">
    <h2 class="result__title"><a class="result__a" href="https://third.example/">Third</a></h2>
    <a class="result__snippet">Third snippet</a>
  </div>
</body></html>"##;

    #[test]
    fn test_parse_results() {
        let hits = parse_results(PAGE, 10).unwrap();
        assert_eq!(hits.len(), 3);
        assert_eq!(
            hits[0],
            SearchHit {
                title: "The Colosseum".into(),
                snippet: "An oval amphitheatre in the centre of Rome.".into(),
                url: "https://en.wikipedia.org/wiki/Colosseum".into(),
            }
        );
        assert_eq!(hits[1].url, "https://www.rome.net/colosseum");
        assert_eq!(hits[1].snippet, "");
    }

    #[test]
    fn test_parse_results_respects_limit() {
        let hits = parse_results(PAGE, 1).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].title, "The Colosseum");
    }

    #[test]
    fn test_parse_results_empty_page() {
        assert!(parse_results("<html><body>No results.</body></html>", 5)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_decode_result_url() {
        assert_eq!(
            decode_result_url("//duckduckgo.com/l/?uddg=https%3A%2F%2Fexample.com%2Fa%3Fb%3D1&rut=x"),
            Some("https://example.com/a?b=1".into())
        );
        assert_eq!(
            decode_result_url("/l/?uddg=http%3A%2F%2Fx.org%2F"),
            Some("http://x.org/".into())
        );
        assert_eq!(
            decode_result_url("https://direct.example/page"),
            Some("https://direct.example/page".into())
        );
        assert_eq!(decode_result_url("javascript:void(0)"), None);
    }
}
