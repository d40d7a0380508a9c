//! Classification adapter: runs a loaded [`Classifier`] and decodes its output into the
//! vulnerability taxonomy.
//!
//! Raw model labels (class indices or free-form strings) are turned into
//! [`VulnerabilityLabel`] immediately after the model call; nothing past this module ever
//! looks at the raw representation. Output that does not fit the four-label space is reported
//! as [`Error::MalformedPrediction`] and never coerced to "clean".

use crate::features::FeatureVector;
use crate::model::{Classifier, ModelConfig};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Allowed deviation of a distribution's sum from 1, and slack above 1 for a single entry.
const PROBABILITY_SUM_TOLERANCE: f64 = 1e-6;

/// Label as emitted by a model, before decoding.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RawLabel {
    /// Position in the label order.
    Index(usize),
    /// Label string, matched case-insensitively.
    Name(String),
}

/// Vulnerability categories in model output order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VulnerabilityLabel {
    Clean,
    GasLimit,
    IntegerOverflow,
    Reentrancy,
}

impl VulnerabilityLabel {
    /// All labels, indexed the way models emit them.
    pub const ALL: [VulnerabilityLabel; 4] = [
        VulnerabilityLabel::Clean,
        VulnerabilityLabel::GasLimit,
        VulnerabilityLabel::IntegerOverflow,
        VulnerabilityLabel::Reentrancy,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Decodes a label string, ignoring case, surrounding whitespace and `_`, `-` or space
    /// separators. Bare digits are read as an index.
    pub fn from_name(name: &str) -> Option<Self> {
        let key: String = name
            .trim()
            .chars()
            .filter(|c| !matches!(c, ' ' | '_' | '-'))
            .map(|c| c.to_ascii_lowercase())
            .collect();
        match key.as_str() {
            "clean" | "cleancontract" => Some(Self::Clean),
            "gaslimit" | "gaslimitissues" => Some(Self::GasLimit),
            "integeroverflow" => Some(Self::IntegerOverflow),
            "reentrancy" => Some(Self::Reentrancy),
            _ => key.parse::<usize>().ok().and_then(Self::from_index),
        }
    }

    /// Decodes a raw model label.
    pub fn from_raw(raw: &RawLabel) -> Option<Self> {
        match raw {
            RawLabel::Index(idx) => Self::from_index(*idx),
            RawLabel::Name(name) => Self::from_name(name),
        }
    }

    /// Fixed severity of the category.
    pub fn severity(self) -> Severity {
        match self {
            VulnerabilityLabel::Clean => Severity::None,
            VulnerabilityLabel::GasLimit => Severity::Medium,
            VulnerabilityLabel::IntegerOverflow => Severity::High,
            VulnerabilityLabel::Reentrancy => Severity::Critical,
        }
    }

    /// Label spelling used by trained models.
    pub fn key(self) -> &'static str {
        match self {
            VulnerabilityLabel::Clean => "clean contract",
            VulnerabilityLabel::GasLimit => "gaslimit",
            VulnerabilityLabel::IntegerOverflow => "integeroverflow",
            VulnerabilityLabel::Reentrancy => "reentrancy",
        }
    }

    /// Human-readable description.
    pub fn description(self) -> &'static str {
        match self {
            VulnerabilityLabel::Clean => "Clean Contract",
            VulnerabilityLabel::GasLimit => "Gas Limit Issues",
            VulnerabilityLabel::IntegerOverflow => "Integer Overflow",
            VulnerabilityLabel::Reentrancy => "Reentrancy",
        }
    }
}

impl fmt::Display for VulnerabilityLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Qualitative risk attached to a label.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Severity {
    None,
    Medium,
    High,
    Critical,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Probability assigned to one label.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct LabelProbability {
    pub label: VulnerabilityLabel,
    pub probability: f64,
}

/// Decoded classifier output for one contract.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    /// Predicted category.
    pub label: VulnerabilityLabel,
    /// Severity derived from `label`.
    pub severity: Severity,
    /// Highest probability in the distribution.
    pub confidence: f64,
    /// Distribution over every label, in label order.
    pub probabilities: Vec<LabelProbability>,
}

impl ClassificationResult {
    pub fn is_clean(&self) -> bool {
        self.label == VulnerabilityLabel::Clean
    }

    /// Whether the model was at least `threshold` sure of its answer.
    pub fn is_confident(&self, threshold: f64) -> bool {
        self.confidence >= threshold
    }

    /// Probability of `label`.
    pub fn probability(&self, label: VulnerabilityLabel) -> f64 {
        self.probabilities
            .iter()
            .find(|p| p.label == label)
            .map_or(0.0, |p| p.probability)
    }
}

/// Holds the process-wide classifier and decodes its predictions.
///
/// Built once at startup and shared by reference; the classifier itself is read-only, so
/// concurrent `classify` calls need no locking.
#[derive(Clone, Default)]
pub struct ClassificationAdapter {
    model: Option<Arc<dyn Classifier>>,
}

impl fmt::Debug for ClassificationAdapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassificationAdapter")
            .field("loaded", &self.is_loaded())
            .finish()
    }
}

impl ClassificationAdapter {
    /// Wraps an already loaded classifier.
    pub fn new(model: Arc<dyn Classifier>) -> Self {
        Self { model: Some(model) }
    }

    /// Adapter without a model; every `classify` call fails until [`reload`](Self::reload).
    pub fn unloaded() -> Self {
        Self::default()
    }

    /// Loads the model artifact named by `config`.
    pub fn from_config(config: &ModelConfig) -> Result<Self> {
        Ok(Self::new(config.load()?))
    }

    /// Replaces the current model with the artifact named by `config`.
    ///
    /// On failure the previous model, if any, stays in place.
    pub fn reload(&mut self, config: &ModelConfig) -> Result<()> {
        self.model = Some(config.load()?);
        Ok(())
    }

    pub fn is_loaded(&self) -> bool {
        self.model.is_some()
    }

    /// Classifies a feature vector.
    pub fn classify(&self, features: &FeatureVector) -> Result<ClassificationResult> {
        let model = self
            .model
            .as_ref()
            .ok_or_else(|| Error::ModelUnavailable("no model loaded".into()))?;

        let raw = model.predict(features)?;
        let distribution = model.predict_proba(features)?;
        check_distribution(&distribution)?;

        let label = VulnerabilityLabel::from_raw(&raw).ok_or_else(|| {
            Error::MalformedPrediction(format!("unrecognised label {raw:?}"))
        })?;
        let confidence = distribution.iter().copied().fold(0.0, f64::max).min(1.0);

        tracing::debug!(
            "Classified as {} (confidence {:.3}, raw {:?})",
            label,
            confidence,
            raw
        );

        Ok(ClassificationResult {
            label,
            severity: label.severity(),
            confidence,
            probabilities: VulnerabilityLabel::ALL
                .iter()
                .zip(&distribution)
                .map(|(&label, &probability)| LabelProbability { label, probability })
                .collect(),
        })
    }
}

fn check_distribution(distribution: &[f64]) -> Result<()> {
    if distribution.len() != VulnerabilityLabel::ALL.len() {
        return Err(Error::MalformedPrediction(format!(
            "expected {} probabilities, got {}",
            VulnerabilityLabel::ALL.len(),
            distribution.len()
        )));
    }
    if let Some(bad) = distribution
        .iter()
        .find(|p| !p.is_finite() || **p < 0.0 || **p > 1.0 + PROBABILITY_SUM_TOLERANCE)
    {
        return Err(Error::MalformedPrediction(format!(
            "probability {bad} outside [0, 1]"
        )));
    }
    let sum: f64 = distribution.iter().sum();
    if (sum - 1.0).abs() > PROBABILITY_SUM_TOLERANCE {
        return Err(Error::MalformedPrediction(format!(
            "probabilities sum to {sum}"
        )));
    }
    Ok(())
}
