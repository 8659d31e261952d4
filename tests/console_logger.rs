use sql_assistant::config::{LogTarget, LoggingConfig};
use sql_assistant::logger::{self, Logger};

#[test]
fn test_stderr_sink_from_config() {
    let config = LoggingConfig {
        target: LogTarget::Stderr,
        level: "info".to_string(),
        ..LoggingConfig::default()
    };

    assert!(logger::init(&LoggingConfig {
        level: "chatty".to_string(),
        ..config.clone()
    })
    .is_err());
    assert_eq!(logger::installed_target(), None);

    let log = Logger::from_config(&config).unwrap();
    assert_eq!(logger::installed_target(), Some(LogTarget::Stderr));
    log.success("stderr sink installed");

    assert!(logger::init(&config).is_ok());
    assert!(logger::init(&LoggingConfig::default()).is_err());
}
