use cerberus_analysis::{
    Error, FEATURE_COUNT, FEATURE_NAMES, OpcodeCategory, assemble, extract_features,
};
use cerberus_core::{Instruction, Stage, build_graph};

fn features_of(ops: &[&str]) -> cerberus_analysis::FeatureVector {
    let cleaned: Vec<String> = ops.iter().map(|s| s.to_string()).collect();
    assemble(&cleaned, &build_graph(&cleaned).stats()).unwrap()
}

#[test]
fn test_worked_example() {
    let v = features_of(&["PUSH", "PUSH", "ADD", "SSTORE", "JUMPI"]);

    assert_eq!(v.get("num_nodes"), Some(4.0));
    assert_eq!(v.get("num_edges"), Some(4.0));
    assert_eq!(v.get("arithmetic_ratio"), Some(0.2));
    assert_eq!(v.get("storage_ratio"), Some(0.2));
    assert_eq!(v.get("control_ratio"), Some(0.2));
    assert_eq!(v.get("stack_ratio"), Some(0.4));
    assert_eq!(v.get("cyclomatic_complexity"), Some(2.0));
    // density 0.25, so 100 - 2 * 0.25 * 100
    assert_eq!(v.get("maintainability_index"), Some(50.0));
    assert_eq!(v.get("jumps_to_pushes_ratio"), Some(0.5));
}

#[test]
fn test_vector_layout_is_fixed() {
    let v = features_of(&["CALLER", "CALL", "SSTORE", "GASLIMIT", "REVERT"]);
    assert_eq!(v.as_slice().len(), FEATURE_COUNT);
    assert!(v.is_finite());

    let names: Vec<&str> = v.named().map(|(name, _)| name).collect();
    assert_eq!(names, FEATURE_NAMES);
    assert_eq!(FEATURE_NAMES[0], "num_nodes");
    assert_eq!(FEATURE_NAMES[24], "maintainability_index");
}

#[test]
fn test_substring_membership_overlaps() {
    assert!(OpcodeCategory::Arithmetic.contains("ADDRESS"));
    assert!(OpcodeCategory::Environment.contains("ADDRESS"));
    assert!(OpcodeCategory::System.contains("CALLVALUE"));
    assert!(OpcodeCategory::Control.contains("GASLIMIT"));
    assert!(!OpcodeCategory::Storage.contains("MSTORE"));
}

#[test]
fn test_zero_denominators_are_zero() {
    // No stack and no memory opcodes.
    let v = features_of(&["SLOAD", "JUMP"]);
    assert_eq!(v.get("jumps_to_pushes_ratio"), Some(0.0));
    assert_eq!(v.get("storage_to_memory_ratio"), Some(0.0));
    assert!(v.is_finite());
}

#[test]
fn test_empty_sequence_is_rejected() {
    let err = assemble(&[], &Default::default()).unwrap_err();
    assert!(matches!(err, Error::EmptyOpcodeSequence));
    assert_eq!(err.stage(), Stage::Normalization);

    let only_invalid = [Instruction::new(0, "INVALID"), Instruction::new(1, "UNKNOWN_0xef")];
    assert!(matches!(
        extract_features(&only_invalid),
        Err(Error::EmptyOpcodeSequence)
    ));
}

#[test]
fn test_extract_features_normalizes_first() {
    let raw = [
        Instruction::with_immediate(0, "PUSH1", "01"),
        Instruction::with_immediate(2, "PUSH1", "02"),
        Instruction::new(4, "ADD"),
        Instruction::new(5, "SSTORE"),
        Instruction::new(6, "JUMPI"),
    ];
    let from_raw = extract_features(&raw).unwrap();
    let from_clean = features_of(&["PUSH", "PUSH", "ADD", "SSTORE", "JUMPI"]);
    assert_eq!(from_raw.as_slice(), from_clean.as_slice());
}
