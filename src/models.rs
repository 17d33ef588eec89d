//! Data models shared by the classifier and the discovery pipeline.
//!
//! This module defines the value types that flow between stages:
//! - [`BiasLabel`] and [`OutletRecord`]: the fixed bias taxonomy and the outlet table rows
//! - [`FeatureVector`], [`OneVsAllScores`], [`ClassificationResult`]: classifier inputs/outputs
//! - [`SearchCandidate`], [`ValidatedUrl`], [`CandidateArticle`], [`CoherentSet`]: discovery stages
//! - [`DiscoveryReport`]: the serialized result of a full run
//!
//! Every stage produces new values; nothing here is mutated after construction.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Editorial slant of an outlet or article.
///
/// The derived ordering exists only so labels can index tables and be
/// iterated in a stable order. It carries no notion of ranking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BiasLabel {
    Center,
    Left,
    Right,
}

impl BiasLabel {
    /// All labels in index order.
    pub const ALL: [BiasLabel; 3] = [BiasLabel::Center, BiasLabel::Left, BiasLabel::Right];

    pub fn index(self) -> usize {
        match self {
            BiasLabel::Center => 0,
            BiasLabel::Left => 1,
            BiasLabel::Right => 2,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            BiasLabel::Center => "center",
            BiasLabel::Left => "left",
            BiasLabel::Right => "right",
        }
    }
}

impl fmt::Display for BiasLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a string is not one of the three bias labels.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unrecognized bias label: {0:?}")]
pub struct UnknownBiasLabel(pub String);

impl FromStr for BiasLabel {
    type Err = UnknownBiasLabel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "center" | "centre" => Ok(BiasLabel::Center),
            "left" => Ok(BiasLabel::Left),
            "right" => Ok(BiasLabel::Right),
            _ => Err(UnknownBiasLabel(s.to_string())),
        }
    }
}

/// One row of the outlet reference table.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct OutletRecord {
    /// Display name of the outlet, unique within the table.
    pub name: String,
    /// Bare domain, e.g. `reuters.com`.
    pub homepage: String,
    pub bias: BiasLabel,
}

/// Sparse feature vector produced by the featurizer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureVector {
    /// Number of dimensions the vector lives in.
    pub dims: usize,
    /// `(index, value)` pairs with `index < dims`, sorted by index.
    pub entries: Vec<(usize, f64)>,
}

impl FeatureVector {
    pub fn new(dims: usize, mut entries: Vec<(usize, f64)>) -> Self {
        entries.sort_by_key(|(i, _)| *i);
        Self { dims, entries }
    }

    /// Dot product against a dense weight vector of the same dimension.
    pub fn dot(&self, weights: &[f64]) -> f64 {
        self.entries
            .iter()
            .filter_map(|&(i, v)| weights.get(i).map(|w| w * v))
            .sum()
    }
}

/// Independent one-vs-rest probabilities, one per label. They need not sum to 1.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct OneVsAllScores {
    pub center: f64,
    pub left: f64,
    pub right: f64,
}

impl OneVsAllScores {
    pub fn get(&self, label: BiasLabel) -> f64 {
        match label {
            BiasLabel::Center => self.center,
            BiasLabel::Left => self.left,
            BiasLabel::Right => self.right,
        }
    }
}

/// Output of the classification cascade for one document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassificationResult {
    /// Label chosen by the one-vs-one tie-break model.
    pub label: BiasLabel,
    /// Probability pair from the one-vs-one model, ordered (lower label, higher label).
    pub binary_scores: (f64, f64),
    pub one_vs_all: OneVsAllScores,
    /// Label judged least likely by the one-vs-rest stage.
    pub excluded: BiasLabel,
}

impl ClassificationResult {
    pub fn excluded_index(&self) -> usize {
        self.excluded.index()
    }
}

/// An outlet drawn by the sampler together with the bias it was drawn for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampledOutlet {
    pub outlet: OutletRecord,
    pub bias: BiasLabel,
}

/// A search to run against one sampled outlet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchCandidate {
    pub query: String,
    pub target_outlet: OutletRecord,
    pub target_bias: BiasLabel,
}

impl SearchCandidate {
    /// Build the query `"<summary> article <date> <outlet name>"`.
    pub fn new(summary: &str, date: &str, sampled: &SampledOutlet) -> Self {
        let query = [summary, "article", date, sampled.outlet.name.as_str()].join(" ");
        Self {
            query,
            target_outlet: sampled.outlet.clone(),
            target_bias: sampled.bias,
        }
    }
}

/// A search result confirmed to belong to the intended outlet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidatedUrl {
    pub url: String,
    pub outlet_name: String,
    pub bias: BiasLabel,
}

/// What the extraction collaborator returns for a URL.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedArticle {
    /// `None` when the page could not be turned into article text.
    pub text: Option<String>,
    pub title: Option<String>,
    /// `"<Month> <Year>"`, or empty when no publish date was found.
    pub publish_period: String,
}

/// A fetched article long enough to be compared with the others.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateArticle {
    pub text: String,
    pub title: Option<String>,
    pub url: String,
    pub outlet_name: String,
    pub bias: BiasLabel,
}

/// An article kept by the topic coherence filter with its average similarity.
#[derive(Debug, Clone, PartialEq)]
pub struct CoherentMember {
    pub article: CandidateArticle,
    pub average_similarity: f64,
}

/// Between two and four articles judged to cover the same story.
#[derive(Debug, Clone, PartialEq)]
pub struct CoherentSet {
    pub members: Vec<CoherentMember>,
}

impl CoherentSet {
    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn articles(&self) -> impl Iterator<Item = &CandidateArticle> {
        self.members.iter().map(|m| &m.article)
    }
}

/// Inputs to one discovery run.
#[derive(Debug, Clone)]
pub struct DiscoveryRequest {
    pub original_url: String,
    pub original_text: String,
    /// Publish period of the original article, used verbatim in queries.
    pub original_date: String,
    pub original_bias: BiasLabel,
}

/// How the discovery stage ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscoveryOutcome {
    Found,
    NoAlternativeArticlesFound,
    NoSimilarArticles,
    Skipped,
}

/// Bias assigned to the source article.
#[derive(Debug, Clone, Serialize)]
pub struct SourceBias {
    pub label: BiasLabel,
    /// `None` when the label was supplied by the user instead of the classifier.
    pub classification: Option<ClassificationResult>,
}

/// One discovered article as it appears in the report.
#[derive(Debug, Clone, Serialize)]
pub struct AlternativeArticle {
    pub title: Option<String>,
    pub url: String,
    pub outlet: String,
    /// Bias of the outlet according to the reference table.
    pub outlet_bias: BiasLabel,
    /// Bias the classifier assigns to the article text, when classification is enabled.
    pub predicted_bias: Option<BiasLabel>,
    pub average_similarity: f64,
}

/// Everything a run produced, serialized to JSON.
#[derive(Debug, Clone, Serialize)]
pub struct DiscoveryReport {
    /// RFC 3339 timestamp of report creation.
    pub generated_at: String,
    pub url: String,
    pub title: Option<String>,
    pub publish_period: String,
    pub bias: SourceBias,
    pub outcome: DiscoveryOutcome,
    pub alternatives: Vec<AlternativeArticle>,
    /// Multi-article digest of the alternatives.
    pub summary: Option<String>,
}
