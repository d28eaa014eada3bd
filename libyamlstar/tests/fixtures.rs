//! Test harness for the loader against fixture files.
//!
//! Every `test/yaml/*.yaml` stream is loaded with `load_all`, projected to
//! JSON and compared with `test/json/<name>.json`. Every `test/nay/*.yaml`
//! stream must fail; when `test/nay/<name>.error` exists it holds the
//! expected `Kind line:column`.

use std::fs;
use std::path::{Path, PathBuf};

use libyamlstar::{documents_to_json, load_all, LoadError};
use serde_json::Value;

/// Root test directory.
fn test_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .unwrap()
        .join("test")
}

fn fixture_files(subdir: &str) -> Vec<PathBuf> {
    let pattern = test_root().join(subdir).join("*.yaml");
    let mut files: Vec<PathBuf> = glob::glob(&pattern.to_string_lossy())
        .expect("valid glob pattern")
        .flatten()
        .collect();
    files.sort();
    files
}

fn sibling(path: &Path, subdir: &str, ext: &str) -> PathBuf {
    let stem = path.file_stem().unwrap().to_string_lossy();
    test_root().join(subdir).join(format!("{}.{}", stem, ext))
}

fn file_name(path: &Path) -> String {
    path.file_name().unwrap().to_string_lossy().to_string()
}

fn load_stream(text: &str) -> Result<Value, LoadError> {
    load_all(text).and_then(|docs| documents_to_json(&docs))
}

fn describe(err: &LoadError) -> String {
    match err.position() {
        Some(p) => format!("{} {}:{}", err.kind_name(), p.line, p.column),
        None => err.kind_name().to_string(),
    }
}

/// Load a stream that must succeed.
fn run_yaml_test(path: &Path) -> Result<(), String> {
    let name = file_name(path);
    let content =
        fs::read_to_string(path).map_err(|e| format!("Failed to read {}: {}", name, e))?;

    let actual = load_stream(&content)
        .map_err(|e| format!("{}: Unexpected load error: {} ({})", name, e, describe(&e)))?;

    let json_path = sibling(path, "json", "json");
    match fs::read_to_string(&json_path) {
        Ok(expected_text) => {
            let expected: Value = serde_json::from_str(&expected_text)
                .map_err(|e| format!("{}: Bad expected JSON: {}", name, e))?;
            if actual != expected {
                return Err(format!(
                    "{}: Output mismatch\n    expected: {}\n    actual:   {}",
                    name, expected, actual
                ));
            }
            println!("  {} => {}", name, actual);
        }
        Err(_) => println!("  {} => {} (no expected output)", name, actual),
    }
    Ok(())
}

/// Load a stream that must fail.
fn run_nay_test(path: &Path) -> Result<(), String> {
    let name = file_name(path);
    let content =
        fs::read_to_string(path).map_err(|e| format!("Failed to read {}: {}", name, e))?;

    let err = match load_stream(&content) {
        Ok(value) => {
            return Err(format!(
                "{}: Expected load error, but got success: {}",
                name, value
            ))
        }
        Err(err) => err,
    };

    let actual = describe(&err);
    match fs::read_to_string(sibling(path, "nay", "error")) {
        Ok(expected) if expected.trim() == actual => {
            println!("  {} => {} (as expected)", name, actual);
            Ok(())
        }
        Ok(expected) => Err(format!(
            "{}: Error mismatch\n    expected: {}\n    actual:   {}",
            name,
            expected.trim(),
            actual
        )),
        Err(_) => {
            println!("  {} => {}: {} (no .error file to compare)", name, actual, err);
            Ok(())
        }
    }
}

fn run_all(subdir: &str, run: fn(&Path) -> Result<(), String>) {
    let files = fixture_files(subdir);
    assert!(!files.is_empty(), "no fixtures found in test/{}", subdir);

    println!("\nRunning {} test/{} fixtures:", files.len(), subdir);

    let mut passed = 0;
    let mut errors: Vec<String> = Vec::new();
    for file in &files {
        match run(file) {
            Ok(()) => passed += 1,
            Err(e) => errors.push(e),
        }
    }

    println!("\nResults: {} passed, {} failed", passed, errors.len());
    if !errors.is_empty() {
        println!("\nErrors:");
        for error in &errors {
            println!("  - {}", error);
        }
    }

    assert!(errors.is_empty(), "{} {} fixtures failed", errors.len(), subdir);
}

#[test]
fn test_all_yaml_fixtures() {
    run_all("yaml", run_yaml_test);
}

#[test]
fn test_all_nay_fixtures() {
    run_all("nay", run_nay_test);
}
