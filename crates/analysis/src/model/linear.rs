use super::{Classifier, argmax, check_labels, raw_label, softmax};
use crate::Result;
use crate::classify::RawLabel;
use crate::features::{FEATURE_COUNT, FeatureVector};
use serde::{Deserialize, Serialize};

/// Per-feature standardization applied before scoring.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    pub mean: Vec<f64>,
    /// Standard deviations; zero entries leave the feature unscaled.
    pub scale: Vec<f64>,
}

impl StandardScaler {
    fn transform(&self, x: &[f64]) -> Vec<f64> {
        x.iter()
            .zip(self.mean.iter().zip(&self.scale))
            .map(|(v, (m, s))| if *s == 0.0 { v - m } else { (v - m) / s })
            .collect()
    }
}

/// Linear model: `softmax(W · x + b)` over optionally standardized features.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LinearModel {
    /// Label names in class order, as the model was trained with.
    #[serde(default)]
    pub labels: Option<Vec<String>>,
    /// One row of `FEATURE_COUNT` coefficients per class.
    pub weights: Vec<Vec<f64>>,
    /// One intercept per class.
    pub intercepts: Vec<f64>,
    #[serde(default)]
    pub scaler: Option<StandardScaler>,
}

impl LinearModel {
    pub(crate) fn validate(&self) -> std::result::Result<(), String> {
        if self.weights.is_empty() {
            return Err("linear model has no classes".into());
        }
        if let Some(row) = self.weights.iter().find(|row| row.len() != FEATURE_COUNT) {
            return Err(format!(
                "weight row has {} coefficients, expected {FEATURE_COUNT}",
                row.len()
            ));
        }
        if self.intercepts.len() != self.weights.len() {
            return Err(format!(
                "{} intercepts for {} classes",
                self.intercepts.len(),
                self.weights.len()
            ));
        }
        if let Some(scaler) = &self.scaler
            && (scaler.mean.len() != FEATURE_COUNT || scaler.scale.len() != FEATURE_COUNT)
        {
            return Err(format!("scaler must have {FEATURE_COUNT} entries"));
        }
        check_labels(self.labels.as_deref(), self.weights.len())
    }

    fn scores(&self, features: &FeatureVector) -> Vec<f64> {
        let x = match &self.scaler {
            Some(scaler) => scaler.transform(features.as_slice()),
            None => features.to_vec(),
        };
        self.weights
            .iter()
            .zip(&self.intercepts)
            .map(|(row, b)| row.iter().zip(&x).map(|(w, v)| w * v).sum::<f64>() + b)
            .collect()
    }
}

impl Classifier for LinearModel {
    fn predict(&self, features: &FeatureVector) -> Result<RawLabel> {
        let best = argmax(&self.scores(features)).unwrap_or(0);
        Ok(raw_label(self.labels.as_deref(), best))
    }

    fn predict_proba(&self, features: &FeatureVector) -> Result<Vec<f64>> {
        Ok(softmax(&self.scores(features)))
    }
}
