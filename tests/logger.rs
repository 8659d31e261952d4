use std::fs;

use sql_assistant::config::{LogTarget, LoggingConfig};
use sql_assistant::constants::MSG_OWN_LOGGER;
use sql_assistant::logger::{self, Logger};

// Installs the process-wide file sink, so everything lives in one test.
#[test]
fn test_file_sink_from_config() {
    let dir = tempfile::tempdir().unwrap();
    let config = LoggingConfig {
        directory: dir.path().join("logs"),
        level: "debug".to_string(),
        ..LoggingConfig::default()
    };

    let log = Logger::from_config(&config).unwrap();
    assert!(!log.is_capturing());
    assert_eq!(logger::installed_target(), Some(LogTarget::File));

    log.debug("Test message with file");
    log.error("Something failed");
    logger::flush();

    let files: Vec<_> = fs::read_dir(dir.path().join("logs"))
        .unwrap()
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| name.starts_with("file"))
        })
        .collect();
    assert!(!files.is_empty(), "expected a log file in {:?}", dir.path());

    let content: String = files.iter().map(|path| fs::read_to_string(path).unwrap_or_default()).collect();
    assert!(content.contains(MSG_OWN_LOGGER));
    assert!(content.contains("Test message with file"));
    assert!(content.contains("| ERROR    | Something failed"));

    // Same target again is fine, a different one is refused
    assert!(logger::init(&config).is_ok());
    let stderr = LoggingConfig {
        target: LogTarget::Stderr,
        ..config.clone()
    };
    assert!(logger::init(&stderr).is_err());
}
