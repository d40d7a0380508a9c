mod common;

use cerberus_analysis::{
    Analyzer, ClassificationAdapter, Error, ModelConfig, VulnerabilityLabel,
};
use cerberus_core::Stage;
use common::{BrokenDisassembler, TableDisassembler, fixture};
use std::sync::Arc;

fn linear_adapter() -> ClassificationAdapter {
    ClassificationAdapter::from_config(&ModelConfig::new(fixture("linear_model.json"))).unwrap()
}

#[tokio::test]
async fn test_extract_reports_each_stage() {
    let analyzer = Analyzer::new(TableDisassembler, ClassificationAdapter::unloaded());
    // PUSH1 01, PUSH1 02, ADD, SSTORE, JUMPI
    let extraction = analyzer.extract("0x600160020155 57").await.unwrap();

    assert_eq!(extraction.instructions.len(), 5);
    assert_eq!(extraction.cleaned, ["PUSH", "PUSH", "ADD", "SSTORE", "JUMPI"]);
    assert_eq!(extraction.stats.num_nodes, 4);
    assert_eq!(extraction.features.get("stack_ratio"), Some(0.4));
}

#[tokio::test]
async fn test_analyze_classifies_reentrant_contract() {
    let analyzer = Analyzer::new(TableDisassembler, linear_adapter());
    // CALLER, CALL, SSTORE, STOP
    let analysis = analyzer.analyze("0x33f15500").await.unwrap();

    assert_eq!(analysis.extraction.features.get("system_ratio"), Some(0.5));
    assert_eq!(analysis.result.label, VulnerabilityLabel::Reentrancy);
}

#[tokio::test]
async fn test_analyze_file_reads_hex() {
    let analyzer = Analyzer::new(TableDisassembler, linear_adapter());
    let analysis = analyzer
        .analyze_file(&fixture("scan/clean.hex"))
        .await
        .unwrap();
    assert_eq!(analysis.result.label, VulnerabilityLabel::Clean);
}

#[tokio::test]
async fn test_errors_carry_stage() {
    let analyzer = Analyzer::new(TableDisassembler, linear_adapter());

    let err = analyzer.analyze("0xfefe").await.unwrap_err();
    assert!(matches!(err, Error::EmptyOpcodeSequence));
    assert_eq!(err.stage(), Stage::Normalization);

    let err = analyzer.analyze("0x6").await.unwrap_err();
    assert_eq!(err.stage(), Stage::Input);

    let broken = Analyzer::new(BrokenDisassembler, linear_adapter());
    let err = broken.analyze("0x00").await.unwrap_err();
    assert_eq!(err.stage(), Stage::Disassembly);
}

#[tokio::test]
async fn test_unloaded_model_fails_after_extraction() {
    let analyzer = Analyzer::new(TableDisassembler, ClassificationAdapter::unloaded());
    let err = analyzer.analyze("0x600100").await.unwrap_err();
    assert!(matches!(err, Error::ModelUnavailable(_)));
}

#[tokio::test]
async fn test_concurrent_analyses_share_one_model() {
    let analyzer = Arc::new(Analyzer::new(TableDisassembler, linear_adapter()));

    let mut handles = Vec::new();
    for hex in ["0x33f15500", "0x600160020100", "0x33f15500", "0x600160020100"] {
        let analyzer = Arc::clone(&analyzer);
        handles.push(tokio::spawn(async move { analyzer.analyze(hex).await }));
    }

    let mut labels = Vec::new();
    for handle in handles {
        labels.push(handle.await.unwrap().unwrap().result.label);
    }
    assert_eq!(
        labels,
        [
            VulnerabilityLabel::Reentrancy,
            VulnerabilityLabel::Clean,
            VulnerabilityLabel::Reentrancy,
            VulnerabilityLabel::Clean,
        ]
    );
}

#[tokio::test]
async fn test_missing_file_is_input_error() {
    let analyzer = Analyzer::new(TableDisassembler, linear_adapter());
    let err = analyzer
        .analyze_file(&fixture("scan/does_not_exist.hex"))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        Error::Core(cerberus_core::Error::FileRead { .. })
    ));
    assert_eq!(err.stage(), Stage::Input);
}

#[cfg(target_os = "linux")]
#[tokio::test]
async fn test_analyze_file_with_non_utf8_name() {
    use std::ffi::OsStr;
    use std::os::unix::ffi::OsStrExt;

    let path = std::env::temp_dir().join(OsStr::from_bytes(b"cerberus-\xff-reentrant.hex"));
    std::fs::write(&path, "0x33f15500\n").unwrap();

    let analyzer = Analyzer::new(TableDisassembler, linear_adapter());
    let result = analyzer.analyze_file(&path).await;
    std::fs::remove_file(&path).unwrap();

    assert_eq!(result.unwrap().result.label, VulnerabilityLabel::Reentrancy);
}
