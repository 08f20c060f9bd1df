//! Logging setup runs in its own test binary since it installs a global subscriber.

use symsync::logging::{LOG_FILE, init_file_logging, init_logging};

#[test]
fn test_file_logging_creates_log_file() {
    let dir = tempfile::tempdir().unwrap();
    let symsync_dir = dir.path().join(".symsync");

    init_file_logging(&symsync_dir, true).unwrap();
    tracing::info!("symsync logging test");

    // A second subscriber is refused instead of panicking
    assert!(init_logging(false).is_err());
    assert!(init_file_logging(&symsync_dir, false).is_err());

    let logs_dir = symsync_dir.join("logs");
    assert!(logs_dir.is_dir());

    let names: Vec<String> = std::fs::read_dir(&logs_dir)
        .unwrap()
        .filter_map(|e| e.ok())
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .collect();
    assert!(
        names.iter().any(|n| n.starts_with(LOG_FILE)),
        "Expected a {} file, found {:?}",
        LOG_FILE,
        names
    );
}
