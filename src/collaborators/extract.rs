//! Article extraction over plain HTTP.
//!
//! The page is fetched with reqwest and parsed with scraper:
//! - **Text**: paragraphs inside `<article>`, falling back to every `<p>`
//! - **Title**: `og:title`, then `<title>`, then the first `<h1>`
//! - **Publish date**: `article:published_time` and similar meta tags,
//!   `<time datetime>`, then JSON-LD `datePublished`
//!
//! The publish date is reported as `"<Month> <Year>"` because that is the
//! granularity the search queries use.

use super::Extractor;
use crate::error::CollaboratorError;
use crate::models::ExtractedArticle;
use chrono::{DateTime, NaiveDate};
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use serde_json::Value;
use tracing::{debug, instrument};

fn selector(css: &str) -> Selector {
    Selector::parse(css).expect("static selector")
}

static ARTICLE_P: Lazy<Selector> = Lazy::new(|| selector("article p"));
static ANY_P: Lazy<Selector> = Lazy::new(|| selector("p"));
static OG_TITLE: Lazy<Selector> = Lazy::new(|| selector(r#"meta[property="og:title"]"#));
static TITLE: Lazy<Selector> = Lazy::new(|| selector("title"));
static H1: Lazy<Selector> = Lazy::new(|| selector("h1"));
static DATE_META: Lazy<Selector> = Lazy::new(|| {
    selector(
        r#"meta[property="article:published_time"], meta[name="pubdate"], meta[name="date"], meta[itemprop="datePublished"]"#,
    )
});
static TIME: Lazy<Selector> = Lazy::new(|| selector("time[datetime]"));
static JSON_LD: Lazy<Selector> = Lazy::new(|| selector(r#"script[type="application/ld+json"]"#));

/// Fetches a page over HTTP and pulls out the article body, title and
/// publish period (`"%B %Y"`, empty when the page carries no date).
#[derive(Debug, Clone)]
pub struct HttpExtractor {
    client: reqwest::Client,
}

impl HttpExtractor {
    /// # Arguments
    ///
    /// * `client` - Shared client; its user agent and timeout apply to every fetch.
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl Extractor for HttpExtractor {
    #[instrument(level = "info", skip_all, fields(%url))]
    async fn extract(&self, url: &str) -> Result<ExtractedArticle, CollaboratorError> {
        let body = self
            .client
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        let article = parse_article(&body);
        debug!(
            bytes = body.len(),
            has_text = article.text.is_some(),
            publish_period = %article.publish_period,
            "Parsed article page"
        );
        Ok(article)
    }
}

/// Pull text, title and publish period out of an article page.
pub fn parse_article(html: &str) -> ExtractedArticle {
    let document = Html::parse_document(html);
    ExtractedArticle {
        text: article_text(&document),
        title: article_title(&document),
        publish_period: publish_date(&document)
            .map(|d| d.format("%B %Y").to_string())
            .unwrap_or_default(),
    }
}

fn element_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .collect::<Vec<_>>()
        .join(" ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn paragraphs(document: &Html, selector: &Selector) -> Vec<String> {
    document
        .select(selector)
        .map(element_text)
        .filter(|p| !p.is_empty())
        .collect()
}

fn article_text(document: &Html) -> Option<String> {
    let mut paras = paragraphs(document, &ARTICLE_P);
    if paras.is_empty() {
        paras = paragraphs(document, &ANY_P);
    }
    if paras.is_empty() { None } else { Some(paras.join("\n\n")) }
}

fn article_title(document: &Html) -> Option<String> {
    let og = document
        .select(&OG_TITLE)
        .filter_map(|e| e.value().attr("content"))
        .map(|t| t.trim().to_string())
        .find(|t| !t.is_empty());
    og.or_else(|| {
        document
            .select(&TITLE)
            .chain(document.select(&H1))
            .map(element_text)
            .find(|t| !t.is_empty())
    })
}

fn publish_date(document: &Html) -> Option<NaiveDate> {
    let from_meta = document
        .select(&DATE_META)
        .filter_map(|e| e.value().attr("content"))
        .chain(document.select(&TIME).filter_map(|e| e.value().attr("datetime")))
        .find_map(parse_date);
    from_meta.or_else(|| {
        document
            .select(&JSON_LD)
            .filter_map(|script| serde_json::from_str::<Value>(&script.text().collect::<String>()).ok())
            .find_map(|json| find_string(&json, "datePublished").and_then(parse_date))
    })
}

/// Accept RFC 3339 timestamps or anything starting with `YYYY-MM-DD`.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.date_naive());
    }
    raw.get(..10)
        .and_then(|prefix| NaiveDate::parse_from_str(prefix, "%Y-%m-%d").ok())
}

/// Depth-first search for the first string value stored under `key`.
fn find_string<'a>(value: &'a Value, key: &str) -> Option<&'a str> {
    match value {
        Value::Object(map) => map
            .get(key)
            .and_then(Value::as_str)
            .or_else(|| map.values().find_map(|v| find_string(v, key))),
        Value::Array(items) => items.iter().find_map(|v| find_string(v, key)),
        _ => None,
    }
}
