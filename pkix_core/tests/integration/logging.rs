use pkix_core::logging::{self, LoggingConfig};

#[test]
fn should_write_events_to_log_file() {
    // Given a subscriber writing to a temporary file
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("pkix.log");
    logging::init(LoggingConfig::new(Some(path.clone()), false, false)).unwrap();

    // When events are emitted on the crate's targets
    tracing::info!(target: "pkix_core::path", "path build started");
    tracing::warn!(target: "pkix_core::checker", "revocation soft-failed");

    // Then both land in the file without ANSI colouring
    let contents = std::fs::read_to_string(&path).unwrap();
    assert!(contents.contains("path build started"));
    assert!(contents.contains("pkix_core::checker"));
    assert!(!contents.contains('\u{1b}'));
}
