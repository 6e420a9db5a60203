use std::path::PathBuf;

use assertables::*;
use rstest::*;
use serde_json::json;

use super::*;
use crate::simulation::SynthesisOptions;
use crate::utils::*;
use crate::FailurePolicy;

fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("ds-gen-{name}-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

#[rstest]
fn test_load_dictionary_yaml_keeps_order() {
    let dir = scratch_dir("yaml");
    let path = dir.join("dictionary.yaml");
    std::fs::write(&path, "zeta:\n  category: a\nalpha:\n  category: b\n_definitions: {}\n").unwrap();

    let dictionary = load_dictionary(&path).unwrap();
    assert_eq!(dictionary.keys().collect::<Vec<_>>(), vec!["zeta", "alpha", "_definitions"]);
    assert_eq!(dictionary["alpha"]["category"], json!("b"));
}

#[rstest]
fn test_load_dictionary_not_a_mapping() {
    let dir = scratch_dir("list");
    let path = dir.join("dictionary.json");
    std::fs::write(&path, "[1, 2]").unwrap();

    let err = load_dictionary(&path).unwrap_err();
    assert_contains!(err.to_string(), "must be a mapping");
}

#[rstest]
fn test_load_instance_counts() {
    let dir = scratch_dir("counts");
    let path = dir.join("counts.json");
    std::fs::write(&path, r#"{"subject": 3, "sample": 12}"#).unwrap();

    let counts = load_instance_counts(&path).unwrap();
    assert_eq!(counts["sample"], 12);
    assert!(load_instance_counts(&dir.join("missing.json")).is_err());
}

#[rstest]
fn test_write_submission_order(clinical_graph: DependencyGraph) {
    let dir = scratch_dir("order");
    let path = write_submission_order(&dir, &clinical_graph.ordered_path_to("subject").unwrap()).unwrap();

    assert_eq!(path.file_name().unwrap(), SUBMISSION_ORDER_FILE);
    assert_eq!(std::fs::read_to_string(path).unwrap(), "project\tadministrative\nsubject\tclinical\n");
}

#[rstest]
fn test_write_batch_file(mut clinical_graph: DependencyGraph) {
    let dir = scratch_dir("batch");
    let batch = clinical_graph
        .synthesize("subject", 2, &SynthesisOptions::default(), FailurePolicy::Raise)
        .unwrap();
    let path = write_batch_file(&dir, "subject", &batch).unwrap();

    let written: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();
    let records = written.as_array().unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0]["type"], json!("subject"));
    assert_eq!(records[0]["projects"], json!({"code": "test"}));
    assert_eq!(records[1]["submitter_id"], json!(batch[1].submitter_id));
}
