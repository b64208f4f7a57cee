// Tests for the nuclei hand-off

use spyglass_core::CoreError;
use spyglass_core::nuclei::{NucleiRunner, TARGETS_FILE};
use std::fs;
use tempfile::TempDir;

fn targets() -> Vec<String> {
    vec![
        "https://example.com/".to_string(),
        "https://example.com/login".to_string(),
    ]
}

#[test]
fn test_targets_file_is_newline_delimited() {
    let dir = TempDir::new().unwrap();
    let runner = NucleiRunner::new().in_dir(dir.path());

    runner.write_targets(&targets()).unwrap();

    let content = fs::read_to_string(dir.path().join(TARGETS_FILE)).unwrap();
    assert_eq!(content, "https://example.com/\nhttps://example.com/login");
}

#[tokio::test]
async fn test_missing_binary_is_reported() {
    let dir = TempDir::new().unwrap();
    let runner = NucleiRunner::new()
        .with_binary("spyglass-test-no-such-nuclei")
        .in_dir(dir.path());

    let err = runner.run(&targets()).await.unwrap_err();

    assert!(matches!(err, CoreError::ToolMissing(ref tool) if tool == "spyglass-test-no-such-nuclei"));
    // targets are still written for a manual run
    assert!(runner.targets_path().exists());
}

#[cfg(unix)]
#[tokio::test]
async fn test_successful_run_returns_results_path() {
    let dir = TempDir::new().unwrap();
    let runner = NucleiRunner::new().with_binary("true").in_dir(dir.path());

    let results = runner.run(&targets()).await.unwrap();
    assert_eq!(results, dir.path().join("nuclei_results.txt"));
}

#[cfg(unix)]
#[tokio::test]
async fn test_failing_tool_is_reported() {
    let dir = TempDir::new().unwrap();
    let runner = NucleiRunner::new().with_binary("false").in_dir(dir.path());

    let err = runner.run(&targets()).await.unwrap_err();
    assert!(matches!(err, CoreError::ToolFailed { .. }));
}
