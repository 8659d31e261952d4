//! Logging for the data access helpers.
//!
//! [`Logger`] is the handle injected into [`crate::SqlAssistant`]. It forwards
//! every message to the `log` facade and can additionally keep an in-memory
//! history for inspection.
//!
//! The process-wide sink behind the facade is installed at most once per
//! process by [`init`] (or [`Logger::from_config`]), either as a rotating,
//! compressed log file or as a stderr dispatch.

use chrono::Utc;
use flexi_logger::{Cleanup, Criterion, DeferredNow, FileSpec, LoggerHandle, Naming, WriteMode};
use log::{Level, LevelFilter, Record};
use once_cell::sync::OnceCell;
use std::collections::VecDeque;
use std::str::FromStr;
use std::sync::{Arc, Mutex};

use crate::config::{LogTarget, LoggingConfig};
use crate::constants::{
    BYTES_PER_MB, LOG_HISTORY_CAPACITY, LOG_HISTORY_TIMESTAMP_FORMAT, LOG_TARGET, LOG_TIMESTAMP_FORMAT,
    MSG_OWN_LOGGER,
};
use crate::error::{AssistantError, Result};

static INSTALLED_SINK: OnceCell<InstalledSink> = OnceCell::new();

struct InstalledSink {
    target: LogTarget,
    // Dropping the handle would stop the file writer
    handle: Option<LoggerHandle>,
}

/// Shared logger that can be used across the application
#[derive(Clone, Default)]
pub struct Logger {
    history: Option<Arc<Mutex<History>>>,
}

/// Bounded message history; the oldest entries are dropped first.
struct History {
    entries: VecDeque<String>,
    capacity: usize,
}

impl History {
    fn push(&mut self, entry: String) {
        if self.capacity == 0 {
            return;
        }
        while self.entries.len() >= self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(entry);
    }
}

impl Logger {
    /// Logger forwarding to whatever sink the process installed.
    pub fn new() -> Self {
        Self { history: None }
    }

    /// Logger that also keeps the most recent messages in memory.
    ///
    /// Meant for tests and diagnostics; at most `LOG_HISTORY_CAPACITY`
    /// messages are kept.
    pub fn capturing() -> Self {
        Self::capturing_with_capacity(LOG_HISTORY_CAPACITY)
    }

    /// Like [`Logger::capturing`], keeping at most `capacity` messages.
    pub fn capturing_with_capacity(capacity: usize) -> Self {
        Self {
            history: Some(Arc::new(Mutex::new(History {
                entries: VecDeque::new(),
                capacity,
            }))),
        }
    }

    /// Install the default process-wide sink described by `config` and
    /// return a logger writing to it.
    pub fn from_config(config: &LoggingConfig) -> Result<Self> {
        init(config)?;
        let logger = Self::new();
        logger.warning(MSG_OWN_LOGGER);
        Ok(logger)
    }

    pub fn debug(&self, message: impl AsRef<str>) {
        self.emit(Level::Debug, "DEBUG", message.as_ref());
    }

    pub fn warning(&self, message: impl AsRef<str>) {
        self.emit(Level::Warn, "WARNING", message.as_ref());
    }

    pub fn error(&self, message: impl AsRef<str>) {
        self.emit(Level::Error, "ERROR", message.as_ref());
    }

    /// `log` has no success level; these go out as info.
    pub fn success(&self, message: impl AsRef<str>) {
        self.emit(Level::Info, "SUCCESS", message.as_ref());
    }

    fn emit(&self, level: Level, label: &str, message: &str) {
        log::log!(target: LOG_TARGET, level, "{}", message);

        if let Some(history) = &self.history {
            let timestamp = Utc::now().format(LOG_HISTORY_TIMESTAMP_FORMAT).to_string();
            if let Ok(mut logs) = history.lock() {
                logs.push(format!("[{}] {} {}", timestamp, label, message));
            }
        }
    }

    pub fn is_capturing(&self) -> bool {
        self.history.is_some()
    }

    /// Get all recorded logs, oldest first
    pub fn get_logs(&self) -> Vec<String> {
        self.history
            .as_ref()
            .and_then(|history| history.lock().ok().map(|logs| logs.entries.iter().cloned().collect()))
            .unwrap_or_default()
    }

    /// Clear all recorded logs
    pub fn clear(&self) {
        if let Some(history) = &self.history {
            if let Ok(mut logs) = history.lock() {
                logs.entries.clear();
            }
        }
    }
}

/// Install the process-wide log sink.
///
/// Calling this again with the same target is a no-op. Switching to a
/// different target after one was installed is rejected.
pub fn init(config: &LoggingConfig) -> Result<()> {
    let level = LevelFilter::from_str(&config.level)
        .map_err(|_| AssistantError::Logging(format!("unsupported log level `{}`", config.level)))?;

    let sink = INSTALLED_SINK.get_or_try_init(|| -> Result<InstalledSink> {
        let handle = match config.target {
            LogTarget::File => Some(start_file_sink(config)?),
            LogTarget::Stderr => {
                start_stderr_sink(level)?;
                None
            }
        };
        Ok(InstalledSink {
            target: config.target,
            handle,
        })
    })?;

    if sink.target != config.target {
        return Err(AssistantError::Logging(format!(
            "logging already installed for {:?}; refusing to switch to {:?}",
            sink.target, config.target
        )));
    }

    Ok(())
}

/// Whether a process-wide sink has been installed, and which one.
pub fn installed_target() -> Option<LogTarget> {
    INSTALLED_SINK.get().map(|sink| sink.target)
}

/// Flush buffered file output, if a file sink is installed.
pub fn flush() {
    if let Some(handle) = INSTALLED_SINK.get().and_then(|sink| sink.handle.as_ref()) {
        handle.flush();
    }
}

fn start_file_sink(config: &LoggingConfig) -> Result<LoggerHandle> {
    std::fs::create_dir_all(&config.directory).map_err(|e| {
        AssistantError::Logging(format!(
            "failed to create log directory `{}`: {}",
            config.directory.display(),
            e
        ))
    })?;

    flexi_logger::Logger::try_with_str(config.level.to_lowercase())
        .map_err(|e| AssistantError::Logging(format!("invalid log level `{}`: {}", config.level, e)))?
        .log_to_file(
            FileSpec::default()
                .directory(&config.directory)
                .basename(&config.file_basename)
                .suppress_timestamp(),
        )
        .rotate(
            Criterion::Size(config.rotate_size_mb * BYTES_PER_MB),
            Naming::Numbers,
            if config.compress {
                Cleanup::KeepCompressedFiles(config.keep_files)
            } else {
                Cleanup::KeepLogFiles(config.keep_files)
            },
        )
        .format_for_files(file_line_format)
        .write_mode(WriteMode::BufferAndFlush)
        .append()
        .start()
        .map_err(|e| AssistantError::Logging(format!("failed to start file logger: {}", e)))
}

fn start_stderr_sink(level: LevelFilter) -> Result<()> {
    fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "{:25}| {} | {:8} | {}",
                record.module_path().unwrap_or_else(|| record.target()),
                chrono::Local::now().format(LOG_TIMESTAMP_FORMAT),
                record.level(),
                message
            ))
        })
        .level(level)
        .chain(std::io::stderr())
        .apply()
        .map_err(|e| AssistantError::Logging(format!("failed to install stderr logger: {}", e)))
}

/// `{module:25}| {time} | {level:8} | {message}`
fn file_line_format(w: &mut dyn std::io::Write, now: &mut DeferredNow, record: &Record) -> std::io::Result<()> {
    write!(
        w,
        "{:25}| {} | {:8} | {}",
        record.module_path().unwrap_or_else(|| record.target()),
        now.format(LOG_TIMESTAMP_FORMAT),
        record.level(),
        record.args()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_logger_keeps_no_history() {
        let logger = Logger::new();
        assert!(!logger.is_capturing());

        logger.debug("Test message");
        assert!(logger.get_logs().is_empty());
    }

    #[test]
    fn test_capturing_logger_records_levels() {
        let logger = Logger::capturing();
        logger.debug("first");
        logger.error("second");
        logger.success("third");

        let logs = logger.get_logs();
        assert_eq!(logs.len(), 3);
        assert!(logs[0].contains("DEBUG first"));
        assert!(logs[1].contains("ERROR second"));
        assert!(logs[2].contains("SUCCESS third"));

        logger.clear();
        assert!(logger.get_logs().is_empty());
    }

    #[test]
    fn test_history_drops_oldest_beyond_capacity() {
        let logger = Logger::capturing_with_capacity(2);
        logger.debug("one");
        logger.debug("two");
        logger.debug("three");

        let logs = logger.get_logs();
        assert_eq!(logs.len(), 2);
        assert!(logs[0].contains("two"));
        assert!(logs[1].contains("three"));
    }

    #[test]
    fn test_clones_share_history() {
        let logger = Logger::capturing();
        let clone = logger.clone();
        clone.warning("from clone");
        assert_eq!(logger.get_logs().len(), 1);
    }
}
