/// Logging backend
///
/// `env_logger` does the filtering and writes to stderr as usual; every
/// record it accepts is also kept in a bounded buffer shown by the in-app
/// log console.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Local};
use log::{Level, Log, Metadata, Record, SetLoggerError};

/// Lines kept by the console
pub const DEFAULT_CAPACITY: usize = 1000;

#[derive(Debug, Clone)]
pub struct LogLine {
    pub timestamp: DateTime<Local>,
    pub level: Level,
    pub target: String,
    pub message: String,
}

impl LogLine {
    pub fn to_text(&self) -> String {
        format!(
            "{} {:<5} {}: {}",
            self.timestamp.format("%H:%M:%S"),
            self.level,
            self.target,
            self.message
        )
    }
}

/// Shared ring buffer of log lines
#[derive(Debug, Clone)]
pub struct ConsoleLog {
    lines: Arc<Mutex<VecDeque<LogLine>>>,
    capacity: usize,
}

impl Default for ConsoleLog {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl ConsoleLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            lines: Arc::new(Mutex::new(VecDeque::with_capacity(capacity))),
            capacity: capacity.max(1),
        }
    }

    pub fn push(&self, line: LogLine) {
        if let Ok(mut lines) = self.lines.lock() {
            while lines.len() >= self.capacity {
                lines.pop_front();
            }
            lines.push_back(line);
        }
    }

    /// Copy of the buffered lines, oldest first
    pub fn snapshot(&self) -> Vec<LogLine> {
        self.lines
            .lock()
            .map(|lines| lines.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.lines.lock().map(|l| l.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        if let Ok(mut lines) = self.lines.lock() {
            lines.clear();
        }
    }
}

struct ConsoleLogger {
    inner: env_logger::Logger,
    console: ConsoleLog,
}

impl Log for ConsoleLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        self.inner.enabled(metadata)
    }

    fn log(&self, record: &Record) {
        if !self.inner.matches(record) {
            return;
        }
        self.inner.log(record);
        self.console.push(LogLine {
            timestamp: Local::now(),
            level: record.level(),
            target: record.target().to_string(),
            message: record.args().to_string(),
        });
    }

    fn flush(&self) {
        self.inner.flush();
    }
}

/// Install the global logger.
///
/// `RUST_LOG` wins over `default_filter`. Returns the console buffer the
/// GUI reads from.
pub fn init(default_filter: &str) -> Result<ConsoleLog, SetLoggerError> {
    let inner = env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(default_filter),
    )
    .format_timestamp_secs()
    .build();
    let max_level = inner.filter();
    let console = ConsoleLog::default();
    log::set_logger(Box::leak(Box::new(ConsoleLogger {
        inner,
        console: console.clone(),
    })))?;
    log::set_max_level(max_level);
    Ok(console)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(message: &str) -> LogLine {
        LogLine {
            timestamp: Local::now(),
            level: Level::Info,
            target: "test".to_string(),
            message: message.to_string(),
        }
    }

    #[test]
    fn test_ring_buffer_drops_oldest() {
        let console = ConsoleLog::new(2);
        console.push(line("a"));
        console.push(line("b"));
        console.push(line("c"));
        let lines: Vec<String> = console.snapshot().into_iter().map(|l| l.message).collect();
        assert_eq!(lines, vec!["b", "c"]);
        console.clear();
        assert!(console.is_empty());
    }

    #[test]
    fn test_logger_keeps_accepted_records() {
        let console = ConsoleLog::new(10);
        let logger = ConsoleLogger {
            inner: env_logger::Builder::new()
                .filter_level(log::LevelFilter::Info)
                .build(),
            console: console.clone(),
        };
        logger.log(
            &Record::builder()
                .args(format_args!("kept"))
                .level(Level::Warn)
                .target("spectro")
                .build(),
        );
        logger.log(
            &Record::builder()
                .args(format_args!("filtered"))
                .level(Level::Debug)
                .target("spectro")
                .build(),
        );
        let lines = console.snapshot();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].message, "kept");
        assert!(lines[0].to_text().contains("WARN"));
    }
}
