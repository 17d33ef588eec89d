//! Read-only state shared by a whole run.
//!
//! [`AppContext`] is built once at startup and passed down by reference.
//! Loading fails fast on a malformed bias table or model bundle. Without a
//! model bundle the context runs with classification disabled, and the caller
//! has to supply the source article's bias.

use crate::classifier::{ModelBundle, TextClassifier};
use crate::error::{ClassificationError, LoadError};
use crate::models::{BiasLabel, SourceBias};
use crate::reference::BiasReference;
use std::path::Path;
use tracing::{info, instrument, warn};

#[derive(Debug, Clone)]
pub struct AppContext {
    pub reference: BiasReference,
    classifier: Option<TextClassifier>,
}

impl AppContext {
    pub fn new(reference: BiasReference, classifier: Option<TextClassifier>) -> Self {
        Self {
            reference,
            classifier,
        }
    }

    #[instrument(level = "info", skip_all)]
    pub fn load(bias_table: &Path, models: Option<&Path>) -> Result<Self, LoadError> {
        let reference = BiasReference::load(bias_table)?;
        let classifier = match models {
            Some(path) => Some(TextClassifier::from_bundle(ModelBundle::load(path)?)),
            None => {
                warn!("No model bundle given; classification disabled");
                None
            }
        };
        Ok(Self::new(reference, classifier))
    }

    pub fn classification_enabled(&self) -> bool {
        self.classifier.is_some()
    }

    /// Bias of the source article: `supplied` when given, otherwise the classifier's verdict.
    pub fn source_bias(
        &self,
        text: &str,
        supplied: Option<BiasLabel>,
    ) -> Result<SourceBias, ClassificationError> {
        if let Some(label) = supplied {
            info!(%label, "Using supplied source bias");
            return Ok(SourceBias {
                label,
                classification: None,
            });
        }
        let classifier = self.classifier.as_ref().ok_or(ClassificationError::Disabled)?;
        let result = classifier.classify_text(text)?;
        info!(
            label = %result.label,
            excluded = %result.excluded,
            excluded_index = result.excluded_index(),
            center = result.one_vs_all.center,
            left = result.one_vs_all.left,
            right = result.one_vs_all.right,
            "Classified source article"
        );
        Ok(SourceBias {
            label: result.label,
            classification: Some(result),
        })
    }

    /// Predicted bias of a discovered article; `None` when disabled or on failure.
    pub fn predict(&self, text: &str) -> Option<BiasLabel> {
        let classifier = self.classifier.as_ref()?;
        match classifier.classify_text(text) {
            Ok(result) => Some(result.label),
            Err(e) => {
                warn!(error = %e, "Could not classify discovered article");
                None
            }
        }
    }
}
