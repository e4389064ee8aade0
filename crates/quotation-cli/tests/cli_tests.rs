//! End-to-end runs of the blueprint-quote commands against temp directories.

use clap::Parser;
use quotation_cli::{execute, Cli};
use std::path::{Path, PathBuf};

fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("../../testing/fixtures/detections")
        .join(name)
}

/// Writes a config rooted in `dir` and returns its path.
fn write_config(dir: &Path, extra: &str) -> PathBuf {
    let path = dir.join("quotation.yaml");
    let yaml = format!(
        "store_path: {}\noutput_dir: {}\n{}",
        dir.join("counts.json").display(),
        dir.join("output").display(),
        extra
    );
    std::fs::write(&path, yaml).unwrap();
    path
}

fn run(config: &Path, args: &[&str]) -> anyhow::Result<String> {
    let mut argv = vec!["blueprint-quote", "--config", config.to_str().unwrap()];
    argv.extend_from_slice(args);
    execute(Cli::try_parse_from(argv).unwrap())
}

#[test]
fn test_preview_does_not_issue() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path(), "");
    let plan = fixture("floor_plan.json");

    let output = run(&config, &["preview", "--detections", plan.to_str().unwrap()]).unwrap();
    assert!(output.contains("switches: 3 x $10.00 = $30.00"));
    assert!(output.contains("lights: 1 x $20.00 = $20.00"));
    assert!(output.contains("Total Cost: $55.00"));
    assert!(output.contains("Not issued yet."));

    // Previewing twice still reports nothing issued
    let again = run(&config, &["preview", "--detections", plan.to_str().unwrap()]).unwrap();
    assert!(again.contains("Not issued yet."));
    assert!(!dir.path().join("counts.json").exists());
}

#[test]
fn test_finalize_writes_numbered_documents() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path(), "");
    let plan = fixture("floor_plan.json");
    let args = ["finalize", "--detections", plan.to_str().unwrap(), "--issue-date", "2026-10-18"];

    let first = run(&config, &args).unwrap();
    assert!(first.contains("Quotation 1 finalized: $55.00"));
    let second = run(&config, &args).unwrap();
    assert!(second.contains("Quotation 2 finalized: $55.00"));

    let mut documents: Vec<String> = std::fs::read_dir(dir.path().join("output"))
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    documents.sort();
    assert_eq!(documents.len(), 2);
    assert!(documents[0].ends_with("_1.pdf"));
    assert!(documents[1].ends_with("_2.pdf"));

    let preview = run(&config, &["preview", "--detections", plan.to_str().unwrap()]).unwrap();
    assert!(preview.contains("Issued 2 time(s) before."));
}

#[test]
fn test_rate_overrides() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path(), "");
    let plan = fixture("floor_plan.json");

    let output = run(
        &config,
        &["preview", "--detections", plan.to_str().unwrap(), "--tax-percent", "0", "--discount-percent", "10"],
    )
    .unwrap();
    assert!(output.contains("Discount (10%): -$5.00"));
    assert!(output.contains("Total Cost: $45.00"));
}

#[test]
fn test_batch_selection_and_filter() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path(), "detections:\n  min_confidence: 0.25\n");
    let batch = fixture("batch.json");

    let output = run(
        &config,
        &["preview", "--detections", batch.to_str().unwrap(), "--image", "blueprints/ground_floor.png"],
    )
    .unwrap();
    assert!(output.contains("electrical outlets: 1 x $30.00 = $30.00"));
    assert!(output.contains("Class 7: 1 x $0.00 = $0.00"));
    assert!(output.contains("Subtotal: $30.00"));

    // Two images and no selector is ambiguous
    assert!(run(&config, &["preview", "--detections", batch.to_str().unwrap()]).is_err());
}

#[test]
fn test_counts_listing() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path(), "");
    assert_eq!(run(&config, &["counts"]).unwrap(), "No quotations issued.\n");

    let plan = fixture("floor_plan.json");
    run(&config, &["finalize", "--detections", plan.to_str().unwrap()]).unwrap();

    let listing = run(&config, &["counts"]).unwrap();
    let line = listing.lines().next().unwrap();
    let (hash, count) = line.split_once("  ").unwrap();
    assert_eq!(hash.len(), 64);
    assert_eq!(count, "1");

    let filtered = run(&config, &["counts", "--prefix", "zz"]).unwrap();
    assert_eq!(filtered, "No quotations issued.\n");
}

#[test]
fn test_invalid_detections_report_field() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path(), "");
    let broken = fixture("missing_class.json");

    let err = run(&config, &["finalize", "--detections", broken.to_str().unwrap()]).unwrap_err();
    assert!(format!("{:#}", err).contains("class_id"));
    assert!(!dir.path().join("counts.json").exists());
}

#[test]
fn test_missing_explicit_config_fails() {
    let dir = tempfile::tempdir().unwrap();
    let err = run(&dir.path().join("absent.yaml"), &["counts"]).unwrap_err();
    assert!(format!("{:#}", err).contains("failed to read config"));
}
