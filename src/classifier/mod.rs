//! Bias classification cascade.
//!
//! A document is scored by three one-vs-rest models. The label with the
//! lowest score is excluded, and a one-vs-one model trained on the two
//! remaining labels makes the final call:
//!
//! ```text
//! vector ─┬─ center-vs-rest ─┐
//!         ├─ left-vs-rest ───┼─ excluded = first label ≤ both others
//!         └─ right-vs-rest ──┘            │
//!                                         ▼
//!                    one-vs-one model for the remaining pair ─▶ label
//! ```
//!
//! Ties at the minimum go to the first label in `Center, Left, Right` order.

pub mod features;

use crate::error::{ClassificationError, LoadError};
use crate::models::{BiasLabel, ClassificationResult, FeatureVector, OneVsAllScores};
use serde::Deserialize;
use std::path::Path;
use tracing::{debug, info, instrument};

pub use features::Featurizer;

/// A binary model returning the probability of its positive class.
pub trait BinaryClassifier {
    fn positive_probability(&self, vector: &FeatureVector) -> f64;
}

/// Binary logistic regression: `sigmoid(w · x + b)`.
#[derive(Debug, Clone, Deserialize)]
pub struct LogisticModel {
    pub weights: Vec<f64>,
    pub intercept: f64,
}

impl BinaryClassifier for LogisticModel {
    fn positive_probability(&self, vector: &FeatureVector) -> f64 {
        let z = vector.dot(&self.weights) + self.intercept;
        1.0 / (1.0 + (-z).exp())
    }
}

/// One value per bias label.
#[derive(Debug, Clone, Deserialize)]
pub struct PerLabel<T> {
    pub center: T,
    pub left: T,
    pub right: T,
}

impl<T> PerLabel<T> {
    pub fn get(&self, label: BiasLabel) -> &T {
        match label {
            BiasLabel::Center => &self.center,
            BiasLabel::Left => &self.left,
            BiasLabel::Right => &self.right,
        }
    }
}

/// One-vs-one models, each named after the pair it separates.
///
/// The lower label of each pair is the negative class, the higher label the positive one.
#[derive(Debug, Clone, Deserialize)]
pub struct PairModels<T> {
    pub left_right: T,
    pub center_right: T,
    pub center_left: T,
}

impl<T> PairModels<T> {
    /// Model separating the two labels other than `excluded`, with its (negative, positive) labels.
    pub fn for_excluded(&self, excluded: BiasLabel) -> (&T, BiasLabel, BiasLabel) {
        match excluded {
            BiasLabel::Center => (&self.left_right, BiasLabel::Left, BiasLabel::Right),
            BiasLabel::Left => (&self.center_right, BiasLabel::Center, BiasLabel::Right),
            BiasLabel::Right => (&self.center_left, BiasLabel::Center, BiasLabel::Left),
        }
    }
}

/// Label whose one-vs-rest score is ≤ both others, first in label order on ties.
pub fn excluded_label(scores: &OneVsAllScores) -> Result<BiasLabel, ClassificationError> {
    BiasLabel::ALL
        .into_iter()
        .find(|&candidate| {
            let p = scores.get(candidate);
            BiasLabel::ALL
                .into_iter()
                .filter(|&other| other != candidate)
                .all(|other| p <= scores.get(other))
        })
        .ok_or(ClassificationError::InvalidScoreVector { scores: *scores })
}

/// Two-stage classifier: three one-vs-rest models pick the label to exclude,
/// then the one-vs-one model for the remaining pair decides between them.
#[derive(Debug, Clone)]
pub struct ClassificationCascade<M> {
    one_vs_rest: PerLabel<M>,
    one_vs_one: PairModels<M>,
}

impl<M: BinaryClassifier> ClassificationCascade<M> {
    pub fn new(one_vs_rest: PerLabel<M>, one_vs_one: PairModels<M>) -> Self {
        Self {
            one_vs_rest,
            one_vs_one,
        }
    }

    pub fn one_vs_all(&self, vector: &FeatureVector) -> OneVsAllScores {
        OneVsAllScores {
            center: self.one_vs_rest.center.positive_probability(vector),
            left: self.one_vs_rest.left.positive_probability(vector),
            right: self.one_vs_rest.right.positive_probability(vector),
        }
    }

    /// Classify one feature vector.
    ///
    /// # Arguments
    ///
    /// * `vector` - Featurized article text.
    ///
    /// # Returns
    ///
    /// The winning label with the excluded label and the one-vs-rest scores,
    /// or [`ClassificationError::InvalidScoreVector`] when no label can be excluded.
    pub fn classify(&self, vector: &FeatureVector) -> Result<ClassificationResult, ClassificationError> {
        let one_vs_all = self.one_vs_all(vector);
        let excluded = excluded_label(&one_vs_all)?;

        let (model, negative, positive) = self.one_vs_one.for_excluded(excluded);
        let p = model.positive_probability(vector);
        let label = if p > 0.5 { positive } else { negative };

        debug!(
            ?one_vs_all,
            %excluded,
            %label,
            positive_probability = p,
            "Classified feature vector"
        );

        Ok(ClassificationResult {
            label,
            binary_scores: (1.0 - p, p),
            one_vs_all,
            excluded,
        })
    }
}

/// Serialized featurizer plus the six logistic models.
#[derive(Debug, Clone, Deserialize)]
pub struct ModelBundle {
    pub vectorizer: Featurizer,
    pub one_vs_rest: PerLabel<LogisticModel>,
    pub one_vs_one: PairModels<LogisticModel>,
}

impl ModelBundle {
    #[instrument(level = "info", skip_all, fields(path = %path.as_ref().display()))]
    pub fn load(path: impl AsRef<Path>) -> Result<Self, LoadError> {
        let path_str = path.as_ref().display().to_string();
        let raw = std::fs::read(path.as_ref()).map_err(|source| LoadError::Io {
            path: path_str.clone(),
            source,
        })?;
        let bundle: ModelBundle =
            serde_json::from_slice(&raw).map_err(|source| LoadError::Json {
                path: path_str,
                source,
            })?;
        bundle.validate()?;
        info!(vocabulary = bundle.vectorizer.dims(), "Loaded classification models");
        Ok(bundle)
    }

    /// Every model must have one weight per vocabulary column.
    pub fn validate(&self) -> Result<(), LoadError> {
        let expected = self.vectorizer.dims();
        if !self.vectorizer.is_consistent() {
            return Err(LoadError::ModelShape {
                model: "vectorizer".to_string(),
                expected,
                found: self.vectorizer.vocabulary.len(),
            });
        }
        let models = [
            ("center", &self.one_vs_rest.center),
            ("left", &self.one_vs_rest.left),
            ("right", &self.one_vs_rest.right),
            ("left_right", &self.one_vs_one.left_right),
            ("center_right", &self.one_vs_one.center_right),
            ("center_left", &self.one_vs_one.center_left),
        ];
        for (name, model) in models {
            if model.weights.len() != expected {
                return Err(LoadError::ModelShape {
                    model: name.to_string(),
                    expected,
                    found: model.weights.len(),
                });
            }
        }
        Ok(())
    }

    pub fn into_parts(self) -> (Featurizer, ClassificationCascade<LogisticModel>) {
        (
            self.vectorizer,
            ClassificationCascade::new(self.one_vs_rest, self.one_vs_one),
        )
    }
}

/// Featurizer and cascade used together on raw article text.
#[derive(Debug, Clone)]
pub struct TextClassifier {
    featurizer: Featurizer,
    cascade: ClassificationCascade<LogisticModel>,
}

impl TextClassifier {
    pub fn from_bundle(bundle: ModelBundle) -> Self {
        let (featurizer, cascade) = bundle.into_parts();
        Self { featurizer, cascade }
    }

    pub fn classify_text(&self, text: &str) -> Result<ClassificationResult, ClassificationError> {
        self.cascade.classify(&self.featurizer.transform(text))
    }
}
