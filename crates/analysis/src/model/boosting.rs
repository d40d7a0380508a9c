use super::{Classifier, argmax, check_labels, raw_label, softmax};
use crate::{Error, Result};
use crate::classify::RawLabel;
use crate::features::{FEATURE_COUNT, FeatureVector};
use serde::{Deserialize, Serialize};

/// Node of a flattened regression tree.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TreeNode {
    /// Go `left` when `x[feature] <= threshold`, `right` otherwise.
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        value: f64,
    },
}

/// Regression tree stored as a node array rooted at index 0.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Tree {
    pub nodes: Vec<TreeNode>,
}

impl Tree {
    /// Children always sit after their parent, so every walk terminates.
    fn validate(&self) -> std::result::Result<(), String> {
        if self.nodes.is_empty() {
            return Err("tree has no nodes".into());
        }
        for (idx, node) in self.nodes.iter().enumerate() {
            if let TreeNode::Split {
                feature,
                left,
                right,
                ..
            } = node
            {
                if *feature >= FEATURE_COUNT {
                    return Err(format!("split on feature {feature} out of range"));
                }
                for child in [*left, *right] {
                    if child <= idx || child >= self.nodes.len() {
                        return Err(format!("node {idx} has invalid child {child}"));
                    }
                }
            }
        }
        Ok(())
    }

    /// Walks the tree from the root. Returns `None` when the walk leaves the node array, reads a
    /// missing feature or visits more nodes than the tree holds.
    fn evaluate(&self, x: &[f64]) -> Option<f64> {
        let mut idx = 0;
        for _ in 0..self.nodes.len() {
            match self.nodes.get(idx)? {
                TreeNode::Leaf { value } => return Some(*value),
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    idx = if *x.get(*feature)? <= *threshold {
                        *left
                    } else {
                        *right
                    };
                }
            }
        }
        None
    }
}

/// Multiclass gradient-boosted trees.
///
/// Class `k` scores `init[k] + learning_rate * Σ stage[k](x)`; probabilities are the softmax
/// of the class scores.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BoostedTrees {
    /// Label names in class order, as the model was trained with.
    #[serde(default)]
    pub labels: Option<Vec<String>>,
    pub learning_rate: f64,
    /// Prior score per class.
    pub init: Vec<f64>,
    /// Boosting stages, each holding one tree per class.
    pub trees: Vec<Vec<Tree>>,
}

impl BoostedTrees {
    pub(crate) fn validate(&self) -> std::result::Result<(), String> {
        let classes = self.init.len();
        if classes == 0 {
            return Err("boosted model has no classes".into());
        }
        if !self.learning_rate.is_finite() {
            return Err("learning rate must be finite".into());
        }
        for (stage_idx, stage) in self.trees.iter().enumerate() {
            if stage.len() != classes {
                return Err(format!(
                    "stage {stage_idx} has {} trees for {classes} classes",
                    stage.len()
                ));
            }
            for tree in stage {
                tree.validate()
                    .map_err(|e| format!("stage {stage_idx}: {e}"))?;
            }
        }
        check_labels(self.labels.as_deref(), classes)
    }

    fn scores(&self, features: &FeatureVector) -> Result<Vec<f64>> {
        let x = features.as_slice();
        let mut scores = self.init.clone();
        for (stage_idx, stage) in self.trees.iter().enumerate() {
            for (class, (score, tree)) in scores.iter_mut().zip(stage).enumerate() {
                let value = tree.evaluate(x).ok_or_else(|| {
                    Error::MalformedPrediction(format!(
                        "tree {class} of stage {stage_idx} has no reachable leaf"
                    ))
                })?;
                *score += self.learning_rate * value;
            }
        }
        Ok(scores)
    }
}

impl Classifier for BoostedTrees {
    fn predict(&self, features: &FeatureVector) -> Result<RawLabel> {
        let best = argmax(&self.scores(features)?).unwrap_or(0);
        Ok(raw_label(self.labels.as_deref(), best))
    }

    fn predict_proba(&self, features: &FeatureVector) -> Result<Vec<f64>> {
        Ok(softmax(&self.scores(features)?))
    }
}
