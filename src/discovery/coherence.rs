//! Keep only the collected articles that discuss the same story.
//!
//! Each article's average similarity is the mean of its row in the pairwise
//! similarity matrix, diagonal included. Counting the self-similarity of 1.0
//! lifts every average, most noticeably for small sets, and decides which
//! articles pass the threshold, so it is kept as is.

use crate::error::DiscoveryError;
use crate::models::{CandidateArticle, CoherentMember, CoherentSet};
use crate::similarity::DocumentSimilarity;
use tracing::{debug, info, instrument, warn};

/// Average similarity an article must exceed to be kept.
pub const COHERENCE_THRESHOLD: f64 = 0.53;
/// Largest coherent set returned.
pub const MAX_COHERENT: usize = 4;
/// Smallest coherent set; anything smaller is a failure.
pub const MIN_COHERENT: usize = 2;

/// Row means of a square matrix.
pub fn average_similarity(matrix: &[Vec<f64>]) -> Vec<f64> {
    matrix
        .iter()
        .map(|row| {
            if row.is_empty() {
                0.0
            } else {
                row.iter().sum::<f64>() / row.len() as f64
            }
        })
        .collect()
}

/// Reduce `articles` to a [`CoherentSet`].
///
/// More than [`MAX_COHERENT`] qualifying articles are cut to the best ones by
/// average similarity, highest first, ties in input order. Otherwise the
/// qualifying articles keep their input order.
#[instrument(level = "info", skip_all, fields(articles = articles.len()))]
pub fn filter<D: DocumentSimilarity>(
    articles: Vec<CandidateArticle>,
    similarity: &D,
) -> Result<CoherentSet, DiscoveryError> {
    if articles.is_empty() {
        warn!("No articles to compare");
        return Err(DiscoveryError::NoSimilarArticles);
    }

    let texts: Vec<&str> = articles.iter().map(|a| a.text.as_str()).collect();
    let averages = average_similarity(&similarity.matrix(&texts));
    debug!(?averages, "Average pairwise similarity");

    let mut keep: Vec<usize> = (0..articles.len())
        .filter(|&i| averages[i] > COHERENCE_THRESHOLD)
        .collect();

    if keep.len() > MAX_COHERENT {
        // stable sort keeps input order among equal averages
        keep.sort_by(|&a, &b| averages[b].total_cmp(&averages[a]));
        keep.truncate(MAX_COHERENT);
    }

    if keep.len() < MIN_COHERENT {
        warn!(qualifying = keep.len(), "Too few articles share a topic");
        return Err(DiscoveryError::NoSimilarArticles);
    }

    let mut slots: Vec<Option<CandidateArticle>> = articles.into_iter().map(Some).collect();
    let members: Vec<CoherentMember> = keep
        .iter()
        .filter_map(|&i| {
            slots[i].take().map(|article| CoherentMember {
                article,
                average_similarity: averages[i],
            })
        })
        .collect();

    info!(kept = members.len(), "Built coherent article set");
    Ok(CoherentSet { members })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::BiasLabel;
    use crate::similarity::TfidfCosine;
    use std::collections::HashMap;

    /// Similarity keyed by document text; unknown pairs score 0, diagonal 1.
    #[derive(Default)]
    struct PairTable {
        pairs: HashMap<(String, String), f64>,
    }

    impl PairTable {
        fn with(mut self, a: &str, b: &str, score: f64) -> Self {
            self.pairs.insert((a.to_string(), b.to_string()), score);
            self.pairs.insert((b.to_string(), a.to_string()), score);
            self
        }

        fn all_pairs(names: &[&str], score: f64) -> Self {
            let mut table = Self::default();
            for (i, a) in names.iter().enumerate() {
                for b in &names[i + 1..] {
                    table = table.with(a, b, score);
                }
            }
            table
        }
    }

    impl DocumentSimilarity for PairTable {
        fn matrix(&self, documents: &[&str]) -> Vec<Vec<f64>> {
            documents
                .iter()
                .map(|a| {
                    documents
                        .iter()
                        .map(|b| {
                            if a == b {
                                1.0
                            } else {
                                self.pairs
                                    .get(&(a.to_string(), b.to_string()))
                                    .copied()
                                    .unwrap_or(0.0)
                            }
                        })
                        .collect()
                })
                .collect()
        }
    }

    fn article(text: &str) -> CandidateArticle {
        CandidateArticle {
            text: text.to_string(),
            title: None,
            url: format!("https://{text}.example/story"),
            outlet_name: text.to_string(),
            bias: BiasLabel::Center,
        }
    }

    fn texts(set: &CoherentSet) -> Vec<&str> {
        set.articles().map(|a| a.text.as_str()).collect()
    }

    #[test]
    fn test_average_includes_diagonal() {
        let m = vec![vec![1.0, 0.0], vec![0.0, 1.0]];
        assert_eq!(average_similarity(&m), vec![0.5, 0.5]);
    }

    #[test]
    fn test_four_mutually_similar_articles_are_kept() {
        let table = PairTable::all_pairs(&["a", "b", "c", "d"], 0.9);
        let set = filter(vec![article("a"), article("b"), article("c"), article("d")], &table).unwrap();
        assert_eq!(texts(&set), vec!["a", "b", "c", "d"]);
        for member in &set.members {
            assert!((member.average_similarity - 0.925).abs() < 1e-12);
        }
    }

    #[test]
    fn test_outlier_is_dropped() {
        let table = PairTable::all_pairs(&["a", "b", "c"], 0.9);
        let set = filter(vec![article("a"), article("x"), article("b"), article("c")], &table).unwrap();
        assert_eq!(texts(&set), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_too_few_survivors_fail() {
        // pair a/b alone: averages (1 + 0.9 + 0 + 0) / 4 = 0.475
        let table = PairTable::default().with("a", "b", 0.9);
        let err = filter(vec![article("a"), article("b"), article("x"), article("y")], &table).unwrap_err();
        assert!(matches!(err, DiscoveryError::NoSimilarArticles));
    }

    #[test]
    fn test_single_and_empty_inputs_fail() {
        let table = PairTable::default();
        assert!(matches!(
            filter(vec![article("a")], &table),
            Err(DiscoveryError::NoSimilarArticles)
        ));
        assert!(matches!(filter(vec![], &table), Err(DiscoveryError::NoSimilarArticles)));
    }

    #[test]
    fn test_self_similarity_lets_a_dissimilar_pair_through() {
        // averages are (1 + 0.1) / 2 = 0.55 even though the two texts barely overlap
        let table = PairTable::default().with("a", "b", 0.1);
        let set = filter(vec![article("a"), article("b")], &table).unwrap();
        assert_eq!(set.len(), 2);
    }

    /// Every cell, diagonal included, has the same score.
    struct Flat(f64);

    impl DocumentSimilarity for Flat {
        fn matrix(&self, documents: &[&str]) -> Vec<Vec<f64>> {
            vec![vec![self.0; documents.len()]; documents.len()]
        }
    }

    #[test]
    fn test_average_at_threshold_does_not_qualify() {
        let docs = || vec![article("a"), article("b")];
        assert_eq!(
            average_similarity(&Flat(COHERENCE_THRESHOLD).matrix(&["a", "b"])),
            vec![COHERENCE_THRESHOLD; 2]
        );
        assert!(matches!(
            filter(docs(), &Flat(COHERENCE_THRESHOLD)),
            Err(DiscoveryError::NoSimilarArticles)
        ));
        assert_eq!(filter(docs(), &Flat(0.54)).unwrap().len(), 2);
    }

    #[test]
    fn test_more_than_four_keeps_top_four_descending() {
        let names = ["a", "b", "c", "d", "e", "f"];
        let mut table = PairTable::all_pairs(&names, 0.75);
        // lift e and f above the rest
        table = table.with("e", "f", 1.0);
        let set = filter(names.iter().map(|n| article(n)).collect(), &table).unwrap();
        assert_eq!(set.len(), MAX_COHERENT);
        // e, f tie at the top; a..d tie next, so input order decides
        assert_eq!(texts(&set), vec!["e", "f", "a", "b"]);
        let averages: Vec<f64> = set.members.iter().map(|m| m.average_similarity).collect();
        assert!(averages.windows(2).all(|w| w[0] >= w[1]));
    }

    #[test]
    fn test_filter_is_idempotent() {
        let table = PairTable::all_pairs(&["a", "b", "c"], 0.7)
            .with("a", "d", 0.2)
            .with("b", "d", 0.1);
        let first = filter(
            vec![article("a"), article("b"), article("c"), article("d")],
            &table,
        )
        .unwrap();
        let again = filter(first.articles().cloned().collect(), &table).unwrap();
        assert_eq!(texts(&first), texts(&again));
    }

    #[test]
    fn test_tfidf_groups_same_story() {
        let budget = "the senate passed the budget bill after a long debate over spending and taxes";
        let docs = vec![
            article(&format!("{budget} on monday")),
            article(&format!("{budget} late on tuesday")),
            article(&format!("{budget} with bipartisan support")),
            article("a new species of frog was discovered in the rainforest by researchers"),
        ];
        let set = filter(docs, &TfidfCosine).unwrap();
        assert_eq!(set.len(), 3);
        assert!(set.articles().all(|a| a.text.contains("senate")));
    }
}
