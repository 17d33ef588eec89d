//! String and document similarity.
//!
//! Two measures back the discovery pipeline:
//! - [`FuzzyMatcher`]: partial-ratio score between two strings, used by the
//!   query probe to compare result URLs with the source URL and with an
//!   outlet's homepage.
//! - [`DocumentSimilarity`]: square TF-IDF cosine matrix over article texts,
//!   used by the topic coherence filter.
//!
//! Both are traits so tests can pin exact scores. [`PartialRatio`] and
//! [`TfidfCosine`] are the production implementations.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;

/// Word tokens of two or more characters, the same pattern the models were trained with.
static TOKEN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b\w\w+\b").expect("valid token regex"));

/// Score two strings in `0..=100`, tolerating one being a fragment of the other.
pub trait FuzzyMatcher {
    fn partial_ratio(&self, a: &str, b: &str) -> u8;
}

/// Pairwise similarity of documents as a square matrix with values in `[0, 1]`.
pub trait DocumentSimilarity {
    fn matrix(&self, documents: &[&str]) -> Vec<Vec<f64>>;
}

/// Partial-ratio fuzzy match.
///
/// The shorter string is slid across the longer one; each equal-length
/// window is scored with normalized Levenshtein similarity and the best
/// window wins. Empty input scores 0.
#[derive(Debug, Clone, Copy, Default)]
pub struct PartialRatio;

impl FuzzyMatcher for PartialRatio {
    fn partial_ratio(&self, a: &str, b: &str) -> u8 {
        partial_ratio(a, b)
    }
}

pub fn partial_ratio(a: &str, b: &str) -> u8 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() || b.is_empty() {
        return 0;
    }
    let (short, long) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    let needle: String = short.iter().collect();

    let mut best = 0.0_f64;
    for window in long.windows(short.len()) {
        let candidate: String = window.iter().collect();
        let score = strsim::normalized_levenshtein(&needle, &candidate);
        if score > best {
            best = score;
            if best >= 1.0 {
                break;
            }
        }
    }
    (best * 100.0).round().clamp(0.0, 100.0) as u8
}

/// Lowercased word tokens of `text`.
pub fn tokenize(text: &str) -> Vec<String> {
    TOKEN_RE
        .find_iter(text)
        .map(|m| m.as_str().to_lowercase())
        .collect()
}

/// Raw term counts for one document.
pub fn term_counts(text: &str) -> HashMap<String, f64> {
    let mut counts = HashMap::new();
    for token in tokenize(text) {
        *counts.entry(token).or_insert(0.0) += 1.0;
    }
    counts
}

/// Scale `values` to unit Euclidean length in place. All-zero input stays zero.
pub fn l2_normalize<'a>(values: impl Iterator<Item = &'a mut f64>) {
    let values: Vec<&mut f64> = values.collect();
    let norm = values.iter().map(|v| **v * **v).sum::<f64>().sqrt();
    if norm > 0.0 {
        for v in values {
            *v /= norm;
        }
    }
}

pub fn cosine_similarity(a: &HashMap<String, f64>, b: &HashMap<String, f64>) -> f64 {
    let (small, large) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    let dot: f64 = small
        .iter()
        .filter_map(|(term, x)| large.get(term).map(|y| x * y))
        .sum();
    let norm_a = a.values().map(|x| x * x).sum::<f64>().sqrt();
    let norm_b = b.values().map(|x| x * x).sum::<f64>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    (dot / (norm_a * norm_b)).clamp(0.0, 1.0)
}

/// TF-IDF cosine similarity fitted on the documents being compared.
///
/// Raw term frequency, smoothed IDF `ln((1 + n) / (1 + df)) + 1`, L2-normalized rows.
#[derive(Debug, Clone, Copy, Default)]
pub struct TfidfCosine;

impl TfidfCosine {
    pub fn vectors(documents: &[&str]) -> Vec<HashMap<String, f64>> {
        let counts: Vec<HashMap<String, f64>> = documents.iter().map(|d| term_counts(d)).collect();

        let mut doc_freq: HashMap<&str, usize> = HashMap::new();
        for doc in &counts {
            for term in doc.keys() {
                *doc_freq.entry(term.as_str()).or_insert(0) += 1;
            }
        }

        let n = documents.len() as f64;
        let idf: HashMap<&str, f64> = doc_freq
            .iter()
            .map(|(term, &df)| (*term, ((1.0 + n) / (1.0 + df as f64)).ln() + 1.0))
            .collect();

        counts
            .iter()
            .map(|doc| {
                let mut weighted: HashMap<String, f64> = doc
                    .iter()
                    .map(|(term, tf)| (term.clone(), tf * idf.get(term.as_str()).copied().unwrap_or(1.0)))
                    .collect();
                l2_normalize(weighted.values_mut());
                weighted
            })
            .collect()
    }
}

impl DocumentSimilarity for TfidfCosine {
    fn matrix(&self, documents: &[&str]) -> Vec<Vec<f64>> {
        let vectors = Self::vectors(documents);
        vectors
            .iter()
            .map(|a| vectors.iter().map(|b| cosine_similarity(a, b)).collect())
            .collect()
    }
}
