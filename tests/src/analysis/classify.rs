mod common;

use cerberus_analysis::classify::RawLabel;
use cerberus_analysis::model::{BoostedTrees, Tree, TreeNode};
use cerberus_analysis::{
    ClassificationAdapter, Classifier, Error, FEATURE_COUNT, FeatureVector, ModelArtifact,
    ModelConfig, Severity, VulnerabilityLabel,
};
use cerberus_core::Stage;
use common::fixture;
use std::sync::Arc;

/// Feature vector with only `system_ratio` set.
fn with_system_ratio(ratio: f64) -> FeatureVector {
    let mut values = [0.0; FEATURE_COUNT];
    values[15] = ratio;
    FeatureVector::from_array(values)
}

struct Scripted(Vec<f64>, RawLabel);

impl Classifier for Scripted {
    fn predict(&self, _: &FeatureVector) -> cerberus_analysis::Result<RawLabel> {
        Ok(self.1.clone())
    }

    fn predict_proba(&self, _: &FeatureVector) -> cerberus_analysis::Result<Vec<f64>> {
        Ok(self.0.clone())
    }
}

#[test]
fn test_linear_fixture_classifies() {
    let adapter =
        ClassificationAdapter::from_config(&ModelConfig::new(fixture("linear_model.json")))
            .unwrap();

    let result = adapter.classify(&with_system_ratio(0.5)).unwrap();
    assert_eq!(result.label, VulnerabilityLabel::Reentrancy);
    assert_eq!(result.severity, Severity::Critical);
    assert!(result.confidence > 0.99);

    let result = adapter.classify(&with_system_ratio(0.0)).unwrap();
    assert!(result.is_clean());
    assert!(result.is_confident(0.7));
    let total: f64 = result.probabilities.iter().map(|p| p.probability).sum();
    assert!((total - 1.0).abs() < 1e-9);
}

#[test]
fn test_boosted_fixture_classifies() {
    let artifact = ModelArtifact::load(&fixture("boosted_model.json")).unwrap();
    assert_eq!(artifact.backend(), "gradient_boosting");
    let adapter = ClassificationAdapter::new(artifact.into_classifier());

    assert_eq!(
        adapter.classify(&with_system_ratio(0.5)).unwrap().label,
        VulnerabilityLabel::Reentrancy
    );
    assert_eq!(
        adapter.classify(&with_system_ratio(0.05)).unwrap().label,
        VulnerabilityLabel::Clean
    );
}

#[test]
fn test_three_class_model_is_malformed_at_classify_time() {
    let adapter = ClassificationAdapter::from_config(&ModelConfig::new(fixture(
        "three_class_model.json",
    )))
    .unwrap();
    let err = adapter.classify(&with_system_ratio(0.5)).unwrap_err();
    assert!(matches!(err, Error::MalformedPrediction(_)));
    assert_eq!(err.stage(), Stage::Classification);
}

#[test]
fn test_bad_shape_is_unavailable() {
    let err = ModelConfig::new(fixture("bad_shape_model.json"))
        .load()
        .err()
        .unwrap();
    assert!(matches!(err, Error::ModelUnavailable(_)));
}

#[test]
fn test_reload_keeps_previous_model_on_failure() {
    let mut adapter =
        ClassificationAdapter::from_config(&ModelConfig::new(fixture("linear_model.json")))
            .unwrap();
    assert!(
        adapter
            .reload(&ModelConfig::new(fixture("missing.json")))
            .is_err()
    );
    assert!(adapter.is_loaded());
    assert!(adapter.classify(&with_system_ratio(0.5)).is_ok());
}

#[test]
fn test_distribution_decides_confidence() {
    let adapter = ClassificationAdapter::new(Arc::new(Scripted(
        vec![0.1, 0.05, 0.05, 0.8],
        RawLabel::Name("reentrancy".into()),
    )));
    let result = adapter.classify(&with_system_ratio(0.0)).unwrap();
    assert_eq!(result.label, VulnerabilityLabel::Reentrancy);
    assert_eq!(result.severity, Severity::Critical);
    assert_eq!(result.confidence, 0.8);
}

#[test]
fn test_negative_probability_is_malformed() {
    let adapter = ClassificationAdapter::new(Arc::new(Scripted(
        vec![-0.1, 0.3, 0.4, 0.4],
        RawLabel::Index(3),
    )));
    let err = adapter.classify(&with_system_ratio(0.0)).unwrap_err();
    assert!(matches!(err, Error::MalformedPrediction(_)));
}

#[test]
fn test_adapter_is_shareable_across_tasks() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<ClassificationAdapter>();
}

#[test]
fn test_hand_built_trees_with_dangling_children_are_malformed() {
    let leaf = || Tree {
        nodes: vec![TreeNode::Leaf { value: 0.0 }],
    };
    let model = BoostedTrees {
        labels: None,
        learning_rate: 1.0,
        init: vec![0.0; 4],
        trees: vec![vec![
            Tree {
                nodes: vec![TreeNode::Split {
                    feature: 0,
                    threshold: 0.5,
                    left: 7,
                    right: 8,
                }],
            },
            leaf(),
            leaf(),
            leaf(),
        ]],
    };

    let adapter =
        ClassificationAdapter::new(ModelArtifact::GradientBoosting(model).into_classifier());
    let err = adapter.classify(&with_system_ratio(0.0)).unwrap_err();
    assert!(matches!(err, Error::MalformedPrediction(_)));
    assert_eq!(err.stage(), Stage::Classification);
}
