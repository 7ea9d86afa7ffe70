//! Integration tests for fatal error handling

use dscan::{Error, ScanConfig, ScanOptions};
use tempfile::TempDir;

#[test]
fn test_invalid_path_error() {
    let opts = ScanOptions::default();
    let result = dscan::scan_summary("/definitely/does/not/exist/xyz123", &opts);

    let Err(Error::InvalidInput(msg)) = result else {
        panic!("expected invalid input");
    };
    assert!(msg.contains("does not exist"));
}

#[test]
fn test_file_instead_of_directory() {
    use tempfile::NamedTempFile;

    let temp_file = NamedTempFile::new().unwrap();
    let result = dscan::scan_summary(temp_file.path(), &ScanOptions::default());

    assert!(matches!(result, Err(Error::InvalidInput(msg)) if msg.contains("not a directory")));
}

#[test]
fn test_fatal_root_opens_no_sinks() {
    let temp_dir = TempDir::new().unwrap();
    let output = temp_dir.path().join("scan.csv");
    let error_log = temp_dir.path().join("errors.log");

    let config = ScanConfig {
        root: temp_dir.path().join("missing").to_string_lossy().into_owned(),
        output: output.to_string_lossy().into_owned(),
        error_log: error_log.to_string_lossy().into_owned(),
        ..Default::default()
    };

    assert!(dscan::run_scan(&config, None).is_err());
    assert!(!output.exists());
    assert!(!error_log.exists());
}

#[test]
fn test_invalid_threshold_is_fatal() {
    let temp_dir = TempDir::new().unwrap();
    let output = temp_dir.path().join("scan.csv");

    let config = ScanConfig {
        root: temp_dir.path().to_string_lossy().into_owned(),
        output: output.to_string_lossy().into_owned(),
        error_log: temp_dir.path().join("e.log").to_string_lossy().into_owned(),
        min_size_mb: f64::NAN,
        ..Default::default()
    };

    assert!(matches!(
        dscan::run_scan(&config, None),
        Err(Error::InvalidInput(_))
    ));
    assert!(!output.exists());
}

#[test]
fn test_summary_reports_partial_failure() {
    let temp_dir = TempDir::new().unwrap();
    let mut summary = dscan::scan_summary(temp_dir.path(), &ScanOptions::default()).unwrap();
    assert!(summary.ensure_complete().is_ok());

    summary.stats.scan_errors = 2;
    let err = summary.ensure_complete().unwrap_err();
    assert!(matches!(err, Error::PartialFailure { completed: 1, failed: 2 }));
}

#[test]
fn test_unopenable_error_log_leaves_no_csv() {
    let temp_dir = TempDir::new().unwrap();
    let output = temp_dir.path().join("scan.csv");
    let blocker = temp_dir.path().join("not_a_dir");
    std::fs::write(&blocker, b"").unwrap();

    let config = ScanConfig {
        root: temp_dir.path().to_string_lossy().into_owned(),
        output: output.to_string_lossy().into_owned(),
        error_log: blocker.join("errors.log").to_string_lossy().into_owned(),
        ..Default::default()
    };

    assert!(matches!(dscan::run_scan(&config, None), Err(Error::Io(_))));
    assert!(!output.exists());
}
