//! Precondition Integration Tests
//!
//! A run must refuse to start, without touching the filesystem, when its
//! inputs are unusable.

use std::fs;

use tempfile::TempDir;
use voxtract::domain::IndexError;
use voxtract::{ExtractOptions, ExtractRequest, Filters, PreconditionError};

fn request(temp: &TempDir) -> ExtractRequest {
    ExtractRequest {
        index_path: Some(temp.path().join("index.json")),
        source_dir: Some(temp.path().join("source")),
        output_dir: Some(temp.path().join("output")),
        filters: Filters::all(),
        options: ExtractOptions::default(),
    }
}

fn setup(index_json: &str) -> TempDir {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("index.json"), index_json).unwrap();
    fs::create_dir_all(temp.path().join("source")).unwrap();
    temp
}

#[test]
fn test_missing_index_file() {
    let temp = TempDir::new().unwrap();
    fs::create_dir_all(temp.path().join("source")).unwrap();

    let result = request(&temp).prepare();
    assert!(matches!(
        result,
        Err(PreconditionError::Index(IndexError::Read { .. }))
    ));
}

#[test]
fn test_malformed_index() {
    let temp = setup("{\"a1\": {\"sourceFileName\": ");

    let err = request(&temp).prepare().unwrap_err();
    assert!(matches!(err, PreconditionError::Index(IndexError::Parse { .. })));
    assert!(err.to_string().contains("index.json"));
}

#[test]
fn test_empty_index() {
    let temp = setup("{}");
    assert!(matches!(
        request(&temp).prepare(),
        Err(PreconditionError::EmptyIndex)
    ));
}

#[test]
fn test_source_folder_missing() {
    let temp = setup(r#"{"a1": {"sourceFileName": "x"}}"#);
    let mut req = request(&temp);
    req.source_dir = Some(temp.path().join("does-not-exist"));

    assert!(matches!(
        req.prepare(),
        Err(PreconditionError::SourceNotFound(_))
    ));
}

#[test]
fn test_output_folder_unset() {
    let temp = setup(r#"{"a1": {"sourceFileName": "x"}}"#);
    let mut req = request(&temp);
    req.output_dir = None;

    assert!(matches!(req.prepare(), Err(PreconditionError::OutputUnset)));
    assert!(!temp.path().join("output").exists());
}

#[test]
fn test_valid_request_prepares_without_side_effects() {
    let temp = setup(r#"{"a1": {"sourceFileName": "x", "avatarName": "Amber"}}"#);

    let run = request(&temp).prepare().unwrap();

    assert_eq!(run.index().len(), 1);
    assert_eq!(run.source_dir(), temp.path().join("source"));
    assert!(!temp.path().join("output").exists());
}
