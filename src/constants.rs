//! Constants used throughout the crate
//!
//! This module centralizes default values and fixed log message text
//! to keep configuration defaults and log output consistent.

// Logging defaults
pub const LOG_TARGET: &str = "sql_assistant";
pub const LOG_FILE_BASENAME: &str = "file";
pub const LOG_DEFAULT_LEVEL: &str = "trace";
pub const LOG_ROTATE_SIZE_MB: u64 = 10;
pub const LOG_KEEP_FILES: usize = 5;
pub const LOG_TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6f%:z";
pub const LOG_HISTORY_TIMESTAMP_FORMAT: &str = "%H:%M:%S%.3f";
pub const LOG_HISTORY_CAPACITY: usize = 1000;
pub const BYTES_PER_MB: u64 = 1024 * 1024;

// Database defaults
pub const DB_DEFAULT_URL: &str = "sqlite://sql_assistant.db?mode=rwc";
pub const DB_MAX_CONNECTIONS: u32 = 10;
pub const DB_MIN_CONNECTIONS: u32 = 1;
pub const DB_CONNECT_TIMEOUT_SECS: u64 = 8;
pub const DB_ACQUIRE_TIMEOUT_SECS: u64 = 8;

// Configuration file lookup
pub const CONFIG_FILE_NAME: &str = "sql_assistant.toml";
pub const CONFIG_DIR_NAME: &str = "sql_assistant";
pub const CONFIG_GENERATED: &str = "Generated default configuration";

// Log messages
pub const MSG_DEPENDENCIES_OK: &str = "All dependencies were supplied";
pub const MSG_OWN_LOGGER: &str = "Created own logger because no project logger was supplied";
