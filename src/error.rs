//! Error types.
//!
//! Discovery and classification failures are typed so callers can tell
//! "nothing matched" apart from a crash. Collaborator failures are exclusion
//! signals: they are logged and the affected item is skipped.

use crate::models::{BiasLabel, OneVsAllScores};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClassificationError {
    /// No label's score is ≤ both others, which only happens with NaN scores.
    #[error("one-vs-rest scores have no minimum: {scores:?}")]
    InvalidScoreVector { scores: OneVsAllScores },

    /// No model bundle was loaded and no bias was supplied.
    #[error("classification is disabled; pass --models or --bias")]
    Disabled,
}

#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("bias table has {available} {bias} outlets, {requested} requested")]
    InsufficientSources {
        bias: BiasLabel,
        requested: usize,
        available: usize,
    },

    #[error("no alternative articles found")]
    NoAlternativeArticlesFound,

    #[error("no similar articles among the alternatives")]
    NoSimilarArticles,
}

/// Failure of an external collaborator (search, extraction, summarization).
#[derive(Debug, Error)]
pub enum CollaboratorError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("not enough text in document ({words} words, {minimum} required)")]
    TooShort { words: usize, minimum: usize },

    #[error("LLM error: {0}")]
    Llm(String),

    #[error("unparseable response: {0}")]
    Unparseable(String),
}

/// Startup failure while loading the bias table or the model bundle.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON in {path}: {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid YAML in {path}: {source}")]
    Yaml {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("outlet {0:?} appears more than once in the bias table")]
    DuplicateOutlet(String),

    #[error("outlet {0:?} has no usable homepage")]
    EmptyHomepage(String),

    #[error("model {model} has {found} weights, vocabulary has {expected} terms")]
    ModelShape {
        model: String,
        expected: usize,
        found: usize,
    },
}
