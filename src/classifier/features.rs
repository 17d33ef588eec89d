//! Text → [`FeatureVector`] using a persisted vocabulary and IDF table.
//!
//! Mirrors the transform the models were trained behind: term counts over a
//! fixed vocabulary, multiplied by per-term IDF, then L2-normalized.
//! Out-of-vocabulary tokens are ignored.

use crate::models::FeatureVector;
use crate::similarity::{l2_normalize, term_counts};
use serde::Deserialize;
use std::collections::HashMap;

#[derive(Debug, Clone, Deserialize)]
pub struct Featurizer {
    /// Term → column index.
    pub vocabulary: HashMap<String, usize>,
    /// IDF weight per column.
    pub idf: Vec<f64>,
}

impl Featurizer {
    pub fn dims(&self) -> usize {
        self.idf.len()
    }

    /// Check that every vocabulary index has an IDF weight.
    pub fn is_consistent(&self) -> bool {
        self.vocabulary.values().all(|&i| i < self.idf.len())
    }

    pub fn transform(&self, text: &str) -> FeatureVector {
        let mut entries: Vec<(usize, f64)> = term_counts(text)
            .into_iter()
            .filter_map(|(term, count)| {
                let index = *self.vocabulary.get(&term)?;
                let idf = *self.idf.get(index)?;
                Some((index, count * idf))
            })
            .collect();
        l2_normalize(entries.iter_mut().map(|(_, v)| v));
        FeatureVector::new(self.dims(), entries)
    }
}
