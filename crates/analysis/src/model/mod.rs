//! Classifier capability and the model backends that implement it.
//!
//! A model artifact is a JSON document tagged with its `backend`. It is read once at startup,
//! validated against the feature layout, and handed to the
//! [`ClassificationAdapter`](crate::ClassificationAdapter) as an `Arc<dyn Classifier>`.

pub mod boosting;
pub mod linear;

pub use boosting::{BoostedTrees, Tree, TreeNode};
pub use linear::{LinearModel, StandardScaler};

use crate::classify::RawLabel;
use crate::features::FeatureVector;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;

const MODEL_ENV_VAR: &str = "CERBERUS_MODEL";

/// Opaque vector → label capability.
///
/// Implementations must be safe to call from several analyses at once; they are never
/// mutated after loading.
pub trait Classifier: Send + Sync {
    /// Most likely label, as the model represents it.
    fn predict(&self, features: &FeatureVector) -> Result<RawLabel>;
    /// Probability of every label, in model label order.
    fn predict_proba(&self, features: &FeatureVector) -> Result<Vec<f64>>;
}

/// Serialized model, one variant per backend.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "backend", rename_all = "snake_case")]
pub enum ModelArtifact {
    /// Affine class scores with softmax (logistic regression, linear SVC).
    Linear(LinearModel),
    /// Gradient-boosted regression trees, one tree per class per stage.
    GradientBoosting(BoostedTrees),
}

impl ModelArtifact {
    /// Parses and validates an artifact.
    pub fn from_json(json: &str) -> Result<Self> {
        let artifact: ModelArtifact = serde_json::from_str(json)
            .map_err(|e| Error::ModelUnavailable(format!("invalid model artifact: {e}")))?;
        artifact.validate()?;
        Ok(artifact)
    }

    /// Reads, parses and validates the artifact at `path`.
    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path).map_err(|e| {
            Error::ModelUnavailable(format!("could not read '{}': {e}", path.display()))
        })?;
        Self::from_json(&data)
    }

    /// Checks that the artifact is internally consistent and fits the feature layout.
    pub fn validate(&self) -> Result<()> {
        match self {
            ModelArtifact::Linear(model) => model.validate(),
            ModelArtifact::GradientBoosting(model) => model.validate(),
        }
        .map_err(Error::ModelUnavailable)
    }

    pub fn backend(&self) -> &'static str {
        match self {
            ModelArtifact::Linear(_) => "linear",
            ModelArtifact::GradientBoosting(_) => "gradient_boosting",
        }
    }

    pub fn into_classifier(self) -> Arc<dyn Classifier> {
        match self {
            ModelArtifact::Linear(model) => Arc::new(model),
            ModelArtifact::GradientBoosting(model) => Arc::new(model),
        }
    }
}

/// Where to find the model artifact.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ModelConfig {
    pub path: PathBuf,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            path: default_model_path(),
        }
    }
}

impl ModelConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Uses `path` when given, the default location otherwise.
    pub fn resolve(path: Option<PathBuf>) -> Self {
        path.map(Self::new).unwrap_or_default()
    }

    /// Loads the artifact and returns it as a shareable classifier.
    pub fn load(&self) -> Result<Arc<dyn Classifier>> {
        let artifact = ModelArtifact::load(&self.path)?;
        tracing::info!(
            "Loaded {} model from {}",
            artifact.backend(),
            self.path.display()
        );
        Ok(artifact.into_classifier())
    }
}

/// Resolve the model artifact path, honoring CERBERUS_MODEL if set.
/// Defaults to ./.cerberus/models/model.json relative to the current directory.
pub fn default_model_path() -> PathBuf {
    if let Ok(path) = std::env::var(MODEL_ENV_VAR) {
        return PathBuf::from(path);
    }

    let base = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    base.join(".cerberus").join("models").join("model.json")
}

/// Numerically stable softmax.
pub(crate) fn softmax(scores: &[f64]) -> Vec<f64> {
    let max = scores.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let exps: Vec<f64> = scores.iter().map(|s| (s - max).exp()).collect();
    let total: f64 = exps.iter().sum();
    exps.into_iter().map(|e| e / total).collect()
}

/// Index of the largest value; the first one wins ties.
pub(crate) fn argmax(values: &[f64]) -> Option<usize> {
    values
        .iter()
        .enumerate()
        .fold(None, |best: Option<(usize, f64)>, (idx, &v)| match best {
            Some((_, b)) if b >= v => best,
            _ => Some((idx, v)),
        })
        .map(|(idx, _)| idx)
}

/// Raw label for the class at `index`, by name when the model carries label names.
pub(crate) fn raw_label(labels: Option<&[String]>, index: usize) -> RawLabel {
    match labels.and_then(|names| names.get(index)) {
        Some(name) => RawLabel::Name(name.clone()),
        None => RawLabel::Index(index),
    }
}

/// Validates optional label names against the class count.
pub(crate) fn check_labels(
    labels: Option<&[String]>,
    classes: usize,
) -> std::result::Result<(), String> {
    match labels {
        Some(names) if names.len() != classes => Err(format!(
            "{} label names for {} classes",
            names.len(),
            classes
        )),
        _ => Ok(()),
    }
}
