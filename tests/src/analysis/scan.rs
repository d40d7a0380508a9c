mod common;

use cerberus_analysis::{
    Analyzer, ClassificationAdapter, Error, ModelConfig, VulnerabilityLabel, scan_directory,
};
use cerberus_core::Stage;
use common::{TableDisassembler, fixture};

fn analyzer() -> Analyzer<TableDisassembler> {
    let adapter =
        ClassificationAdapter::from_config(&ModelConfig::new(fixture("linear_model.json")))
            .unwrap();
    Analyzer::new(TableDisassembler, adapter)
}

#[tokio::test]
async fn test_scan_buckets_and_failures() {
    let summary = scan_directory(&analyzer(), &fixture("scan"), 0.7)
        .await
        .unwrap();

    assert_eq!(summary.total, 2);
    let clean = summary.bucket(Some(VulnerabilityLabel::Clean));
    assert_eq!(clean.count, 1);
    assert_eq!(clean.contracts[0].contract, "clean");
    assert_eq!(clean.percentage, 50.0);
    let reentrancy = summary.bucket(Some(VulnerabilityLabel::Reentrancy));
    assert_eq!(reentrancy.contracts[0].contract, "reentrant");
    assert_eq!(summary.bucket(None).count, 0);

    // broken.hex, empty.hex and invalid_only.hex, in file name order
    let stages: Vec<Stage> = summary.failures.iter().map(|f| f.stage).collect();
    assert_eq!(stages, [Stage::Input, Stage::Input, Stage::Normalization]);
    assert!(summary.failures[0].path.ends_with("broken.hex"));
}

#[tokio::test]
async fn test_high_threshold_makes_everything_uncertain() {
    let summary = scan_directory(&analyzer(), &fixture("scan"), 0.9999999)
        .await
        .unwrap();
    assert_eq!(summary.bucket(None).count, 2);
    assert_eq!(summary.bucket(None).percentage, 100.0);
}

#[tokio::test]
async fn test_missing_directory_is_an_error() {
    let err = scan_directory(&analyzer(), &fixture("no-such-dir"), 0.7)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::ScanDirectory { .. }));
    assert_eq!(err.stage(), Stage::Input);
}

#[tokio::test]
async fn test_summary_renders_as_text_and_json() {
    let summary = scan_directory(&analyzer(), &fixture("scan"), 0.7)
        .await
        .unwrap();

    let text = summary.to_string();
    assert!(text.contains("Clean Contract:\n  Count: 1\n  Percentage: 50.00%"));
    assert!(text.contains("    - reentrant (confidence: 1.00)"));
    assert!(text.contains("Failures: 3"));

    let json = serde_json::to_value(&summary).unwrap();
    assert_eq!(json["total"], 2);
    assert_eq!(json["buckets"][3]["name"], "reentrancy");
    assert_eq!(json["failures"][2]["stage"], "normalization");
}
