//! Validated URL → full article text.

use crate::collaborators::{Extractor, word_count};
use crate::models::{CandidateArticle, ValidatedUrl};
use futures::stream::{self, StreamExt};
use tracing::{debug, info, instrument, warn};

/// Articles with fewer words than this are dropped.
pub const MIN_ARTICLE_WORDS: usize = 100;

/// Extract every URL in order, keeping only articles with at least `min_words` words.
///
/// Extraction failures and pages without text are logged and skipped.
#[instrument(level = "info", skip_all, fields(urls = validated.len()))]
pub async fn collect<E: Extractor>(
    extractor: &E,
    validated: &[ValidatedUrl],
    min_words: usize,
) -> Vec<CandidateArticle> {
    let articles: Vec<CandidateArticle> = stream::iter(validated)
        .then(|v| async move {
            match extractor.extract(&v.url).await {
                Ok(extracted) => {
                    let Some(text) = extracted.text else {
                        warn!(url = %v.url, "Page has no article text");
                        return None;
                    };
                    let words = word_count(&text);
                    if words < min_words {
                        debug!(url = %v.url, words, min_words, "Article too short; dropping");
                        return None;
                    }
                    Some(CandidateArticle {
                        text,
                        title: extracted.title,
                        url: v.url.clone(),
                        outlet_name: v.outlet_name.clone(),
                        bias: v.bias,
                    })
                }
                Err(e) => {
                    warn!(url = %v.url, error = %e, "Extraction failed; dropping");
                    None
                }
            }
        })
        .filter_map(|opt| std::future::ready(opt))
        .collect()
        .await;

    if !validated.is_empty() {
        info!(kept = articles.len(), dropped = validated.len() - articles.len(), "Collected articles");
    }
    articles
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CollaboratorError;
    use crate::models::{BiasLabel, ExtractedArticle};
    use std::collections::HashMap;

    struct MapExtractor {
        pages: HashMap<String, Option<String>>,
    }

    impl Extractor for MapExtractor {
        async fn extract(&self, url: &str) -> Result<ExtractedArticle, CollaboratorError> {
            match self.pages.get(url) {
                Some(text) => Ok(ExtractedArticle {
                    text: text.clone(),
                    title: Some(format!("title of {url}")),
                    publish_period: String::new(),
                }),
                None => Err(CollaboratorError::Unparseable(format!("no page at {url}"))),
            }
        }
    }

    fn validated(url: &str, bias: BiasLabel) -> ValidatedUrl {
        ValidatedUrl {
            url: url.to_string(),
            outlet_name: format!("outlet {url}"),
            bias,
        }
    }

    #[tokio::test]
    async fn test_collect_drops_short_missing_and_failed() {
        let long = "word ".repeat(MIN_ARTICLE_WORDS);
        let extractor = MapExtractor {
            pages: HashMap::from([
                ("a".to_string(), Some(long.clone())),
                ("b".to_string(), Some("too short".to_string())),
                ("c".to_string(), None),
                ("e".to_string(), Some(long.clone())),
            ]),
        };
        let input = vec![
            validated("a", BiasLabel::Left),
            validated("b", BiasLabel::Left),
            validated("c", BiasLabel::Center),
            validated("d", BiasLabel::Center),
            validated("e", BiasLabel::Center),
        ];

        let articles = collect(&extractor, &input, MIN_ARTICLE_WORDS).await;
        let urls: Vec<&str> = articles.iter().map(|a| a.url.as_str()).collect();
        assert_eq!(urls, vec!["a", "e"]);
        assert_eq!(articles[0].bias, BiasLabel::Left);
        assert_eq!(articles[1].outlet_name, "outlet e");
        assert_eq!(articles[1].title.as_deref(), Some("title of e"));
    }

    #[tokio::test]
    async fn test_collect_threshold_is_inclusive() {
        let extractor = MapExtractor {
            pages: HashMap::from([
                ("exact".to_string(), Some("w ".repeat(100))),
                ("under".to_string(), Some("w ".repeat(99))),
            ]),
        };
        let input = vec![validated("exact", BiasLabel::Right), validated("under", BiasLabel::Right)];
        let articles = collect(&extractor, &input, 100).await;
        assert_eq!(articles.len(), 1);
        assert_eq!(articles[0].url, "exact");
    }
}
