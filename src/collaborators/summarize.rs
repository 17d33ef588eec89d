//! LLM-backed summaries.
//!
//! Two prompts are used, each with its own `awful_aj` chat template:
//! - a query digest of the source article, short enough to be a search query
//! - a combined digest of the discovered articles, built from the first
//!   400 words of each

use super::{Summarizer, word_count};
use crate::api::{RetryPolicy, ask_with_backoff};
use crate::error::CollaboratorError;
use awful_aj::{config::AwfulJadeConfig, template::ChatTemplate};
use tracing::{info, instrument};

/// Articles shorter than this are refused for query digests.
pub const MIN_DIGEST_WORDS: usize = 120;
/// Search engines ignore query words past roughly this many.
pub const MAX_QUERY_WORDS: usize = 32;
/// Words taken from each article for the combined digest.
pub const COMBINED_WORDS_PER_ARTICLE: usize = 400;

/// Summarizer backed by an OpenAI-compatible endpoint through `awful_aj`.
///
/// The query template turns an article into a short search query; the digest
/// template merges the alternative articles into one summary. Every request
/// goes through [`RetryPolicy`].
pub struct LlmSummarizer {
    config: AwfulJadeConfig,
    query_template: ChatTemplate,
    digest_template: ChatTemplate,
    policy: RetryPolicy,
}

impl LlmSummarizer {
    /// # Arguments
    ///
    /// * `config` - Endpoint, model and key loaded from the `awful_aj` config file.
    /// * `query_template` - Template for the search-query digest.
    /// * `digest_template` - Template for the combined digest.
    /// * `policy` - Retry and backoff settings for every LLM call.
    pub fn new(
        config: AwfulJadeConfig,
        query_template: ChatTemplate,
        digest_template: ChatTemplate,
        policy: RetryPolicy,
    ) -> Self {
        Self {
            config,
            query_template,
            digest_template,
            policy,
        }
    }
}

impl Summarizer for LlmSummarizer {
    #[instrument(level = "info", skip_all, fields(words = word_count(text)))]
    async fn query_digest(&self, text: &str) -> Result<String, CollaboratorError> {
        let words = word_count(text);
        if words < MIN_DIGEST_WORDS {
            return Err(CollaboratorError::TooShort {
                words,
                minimum: MIN_DIGEST_WORDS,
            });
        }
        let raw = ask_with_backoff(&self.config, &self.query_template, text, self.policy)
            .await
            .map_err(|e| CollaboratorError::Llm(e.to_string()))?;
        let query = clean_query(&raw);
        if query.is_empty() {
            return Err(CollaboratorError::Unparseable(raw));
        }
        info!(%query, "Built search query digest");
        Ok(query)
    }

    #[instrument(level = "info", skip_all, fields(articles = texts.len()))]
    async fn combined_digest(&self, texts: &[String]) -> Result<String, CollaboratorError> {
        let combined = combined_input(texts);
        let raw = ask_with_backoff(&self.config, &self.digest_template, &combined, self.policy)
            .await
            .map_err(|e| CollaboratorError::Llm(e.to_string()))?;
        let digest = raw.trim().to_string();
        if digest.is_empty() {
            return Err(CollaboratorError::Unparseable(raw));
        }
        Ok(digest)
    }
}

/// Collapse whitespace, drop surrounding quotes and cap the word count.
pub fn clean_query(raw: &str) -> String {
    raw.split_whitespace()
        .take(MAX_QUERY_WORDS)
        .collect::<Vec<_>>()
        .join(" ")
        .trim_matches(|c| c == '"' || c == '\'' || c == '“' || c == '”')
        .trim()
        .to_string()
}

/// First [`COMBINED_WORDS_PER_ARTICLE`] words of each text, one article per paragraph.
pub fn combined_input(texts: &[String]) -> String {
    texts
        .iter()
        .map(|t| {
            t.split_whitespace()
                .take(COMBINED_WORDS_PER_ARTICLE)
                .collect::<Vec<_>>()
                .join(" ")
        })
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n")
}
