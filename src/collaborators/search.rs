//! Web search through DuckDuckGo's HTML endpoint.
//!
//! Result links on the HTML page point at a DuckDuckGo redirect of the form
//! `//duckduckgo.com/l/?uddg=<encoded target>`; the target URL is unwrapped
//! from the `uddg` parameter. Sponsored links carry no `uddg` target and are
//! skipped.

use super::{SearchProvider, SearchResults};
use crate::error::CollaboratorError;
use itertools::Itertools;
use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use tracing::{debug, instrument};
use url::Url;

static RESULT_LINK: Lazy<Selector> =
    Lazy::new(|| Selector::parse("a.result__a[href]").expect("static selector"));

pub const DEFAULT_ENDPOINT: &str = "https://html.duckduckgo.com/html/";

#[derive(Debug, Clone)]
pub struct DuckDuckGoSearch {
    client: reqwest::Client,
    endpoint: String,
}

impl DuckDuckGoSearch {
    pub fn new(client: reqwest::Client) -> Self {
        Self::with_endpoint(client, DEFAULT_ENDPOINT)
    }

    pub fn with_endpoint(client: reqwest::Client, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
        }
    }
}

impl SearchProvider for DuckDuckGoSearch {
    #[instrument(level = "info", skip(self), fields(%query, max_results))]
    async fn search(&self, query: &str, max_results: usize) -> Result<SearchResults, CollaboratorError> {
        let request_url = format!("{}?q={}", self.endpoint, urlencoding::encode(query));
        let html = self
            .client
            .get(&request_url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        let urls = parse_results(&html, max_results);
        debug!(count = urls.len(), urls = ?urls, "Search results");
        Ok(urls.into())
    }
}

/// Result target URLs from a results page, deduplicated, in page order.
pub fn parse_results(html: &str, max_results: usize) -> Vec<String> {
    let document = Html::parse_document(html);
    document
        .select(&RESULT_LINK)
        .filter_map(|a| a.value().attr("href"))
        .filter_map(resolve_result_href)
        .unique()
        .take(max_results)
        .collect()
}

/// Unwrap a DuckDuckGo redirect link; pass direct links through.
pub fn resolve_result_href(href: &str) -> Option<String> {
    let absolute = if href.starts_with("//") {
        format!("https:{href}")
    } else {
        href.to_string()
    };
    let parsed = Url::parse(&absolute).ok()?;
    let is_redirect = parsed
        .host_str()
        .is_some_and(|h| h == "duckduckgo.com" || h.ends_with(".duckduckgo.com"));
    if !is_redirect {
        return Some(parsed.to_string());
    }
    parsed
        .query_pairs()
        .find(|(k, _)| k == "uddg")
        .map(|(_, v)| v.into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_redirect() {
        let href = "//duckduckgo.com/l/?uddg=https%3A%2F%2Fwww.reuters.com%2Fworld%2Fstory%3Fa%3D1&rut=abc";
        assert_eq!(
            resolve_result_href(href).as_deref(),
            Some("https://www.reuters.com/world/story?a=1")
        );
    }

    #[test]
    fn test_resolve_direct_link() {
        assert_eq!(
            resolve_result_href("https://apnews.com/article/x").as_deref(),
            Some("https://apnews.com/article/x")
        );
    }

    #[test]
    fn test_resolve_ad_link_is_skipped() {
        assert_eq!(resolve_result_href("https://duckduckgo.com/y.js?ad_domain=shop.com"), None);
        assert_eq!(resolve_result_href("not a url"), None);
    }

    #[test]
    fn test_parse_results_dedupes_and_limits() {
        let html = r#"<html><body>
            <a class="result__a" href="//duckduckgo.com/l/?uddg=https%3A%2F%2Fa.com%2F1">A</a>
            <a class="result__a" href="//duckduckgo.com/l/?uddg=https%3A%2F%2Fa.com%2F1">A again</a>
            <a class="result__snippet" href="https://ignored.com/">snippet</a>
            <a class="result__a" href="https://b.com/2">B</a>
            <a class="result__a" href="https://c.com/3">C</a>
            </body></html>"#;
        assert_eq!(
            parse_results(html, 2),
            vec!["https://a.com/1".to_string(), "https://b.com/2".to_string()]
        );
    }
}
