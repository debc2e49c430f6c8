use std::fs;
use std::path::Path;

use linky_core::{CaptureReport, FrameStatus, decode_capture_file};

fn load_expected_report(dir: &str) -> CaptureReport {
    let root = Path::new(env!("CARGO_MANIFEST_DIR")).join("..").join("..");
    let expected_path = root.join(dir).join("expected_report.json");

    let expected_json = fs::read_to_string(&expected_path).expect("read expected_report.json");
    serde_json::from_str(&expected_json).expect("parse expected report")
}

fn run_golden(dir: &str) {
    let root = Path::new(env!("CARGO_MANIFEST_DIR")).join("..").join("..");
    let input = root.join(dir).join("input.tic");
    let expected = load_expected_report(dir);

    let mut actual = decode_capture_file(&input).expect("decode capture");
    actual.generated_at = expected.generated_at.clone();
    actual.input.path = expected.input.path.clone();
    for (frame, pinned) in actual.frames.iter_mut().zip(&expected.frames) {
        frame.timestamp = pinned.timestamp.clone();
    }

    let actual_value = serde_json::to_value(actual).expect("serialize actual");
    let expected_value = serde_json::to_value(expected).expect("serialize expected");

    assert_eq!(actual_value, expected_value, "golden mismatch in {dir}");
}

#[test]
fn golden_historic() {
    run_golden("tests/golden/historic");
}

#[test]
fn golden_partial() {
    run_golden("tests/golden/partial");
}

#[test]
fn golden_historic_has_full_frames() {
    let report = load_expected_report("tests/golden/historic");
    assert_eq!(report.summary.complete, 2);
    let frame = report
        .frames
        .iter()
        .find(|frame| frame.status == FrameStatus::Complete)
        .expect("complete frame");
    assert_eq!(frame.measurements.len(), 11);
    assert_eq!(frame.measurements.get("PTEC"), Some("HP.."));
}

#[test]
fn golden_partial_keeps_prefix() {
    let report = load_expected_report("tests/golden/partial");
    let partial = report
        .frames
        .iter()
        .find(|frame| frame.status == FrameStatus::Partial)
        .expect("partial frame");
    assert!(partial.error.is_some());
    assert!(!partial.measurements.is_empty());
}
