//! External collaborators used by the discovery pipeline.
//!
//! Each collaborator is a trait so the pipeline can be driven by stubs in
//! tests. The production implementations live in the submodules:
//!
//! | Trait | Implementation | Backend |
//! |-------|----------------|---------|
//! | [`Extractor`] | [`extract::HttpExtractor`] | reqwest + scraper, meta tags and JSON-LD for dates |
//! | [`SearchProvider`] | [`search::DuckDuckGoSearch`] | DuckDuckGo HTML results page |
//! | [`Summarizer`] | [`summarize::LlmSummarizer`] | OpenAI-compatible LLM via `awful_aj` |
//!
//! Failures are returned as [`CollaboratorError`]; the pipeline treats them
//! as a reason to skip the item, not to abort.

pub mod extract;
pub mod search;
pub mod summarize;

use crate::error::CollaboratorError;
use crate::models::ExtractedArticle;

/// Turn a URL into article text, title and publish period.
pub trait Extractor {
    async fn extract(&self, url: &str) -> Result<ExtractedArticle, CollaboratorError>;
}

/// Run a web search and return result URLs in relevance order.
pub trait SearchProvider {
    async fn search(&self, query: &str, max_results: usize) -> Result<SearchResults, CollaboratorError>;
}

/// Produce short digests of article text.
pub trait Summarizer {
    /// Search-query sized digest (a few dozen words) of one long document.
    async fn query_digest(&self, text: &str) -> Result<String, CollaboratorError>;

    /// Single digest covering several related articles.
    async fn combined_digest(&self, texts: &[String]) -> Result<String, CollaboratorError>;
}

/// Result URLs pulled one at a time. `None` means the results are exhausted.
#[derive(Debug, Default)]
pub struct SearchResults {
    urls: std::vec::IntoIter<String>,
}

impl From<Vec<String>> for SearchResults {
    fn from(urls: Vec<String>) -> Self {
        Self {
            urls: urls.into_iter(),
        }
    }
}

impl Iterator for SearchResults {
    type Item = String;

    fn next(&mut self) -> Option<Self::Item> {
        self.urls.next()
    }
}

/// Number of whitespace-separated words in `text`.
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_results_exhaust() {
        let mut results = SearchResults::from(vec!["a".to_string(), "b".to_string()]);
        assert_eq!(results.next().as_deref(), Some("a"));
        assert_eq!(results.next().as_deref(), Some("b"));
        assert_eq!(results.next(), None);
        assert_eq!(SearchResults::default().next(), None);
    }

    #[test]
    fn test_word_count() {
        assert_eq!(word_count("  one two\nthree\t four "), 4);
        assert_eq!(word_count(""), 0);
    }
}
