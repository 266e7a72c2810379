//! Unit tests for log.rs
//!
//! Tests Logger trait, LogEntry, LogSeverity, and DefaultLogger.

use crate::log::{Logger, LogEntry, LogSeverity, DefaultLogger};
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime};

fn entry(severity: LogSeverity, file: Option<&'static str>, line: Option<u32>) -> LogEntry {
    LogEntry {
        severity,
        timestamp: SystemTime::now(),
        source: "worldview::GraphManager".to_string(),
        message: "interior group changed".to_string(),
        file,
        line,
    }
}

// ============================================================================
// LOG SEVERITY TESTS
// ============================================================================

#[test]
fn test_log_severity_ordering() {
    assert!(LogSeverity::Trace < LogSeverity::Debug);
    assert!(LogSeverity::Debug < LogSeverity::Info);
    assert!(LogSeverity::Info < LogSeverity::Warn);
    assert!(LogSeverity::Warn < LogSeverity::Error);
}

#[test]
fn test_log_severity_u8_conversion() {
    for severity in [
        LogSeverity::Trace,
        LogSeverity::Debug,
        LogSeverity::Info,
        LogSeverity::Warn,
        LogSeverity::Error,
    ] {
        assert_eq!(LogSeverity::from_u8(severity.as_u8()), severity);
    }
    // Out-of-range values clamp to Error
    assert_eq!(LogSeverity::from_u8(200), LogSeverity::Error);
}

// ============================================================================
// LOG ENTRY TESTS
// ============================================================================

#[test]
fn test_log_entry_clone() {
    let original = entry(LogSeverity::Warn, Some("building.rs"), Some(42));
    let copy = original.clone();
    assert_eq!(copy.severity, LogSeverity::Warn);
    assert_eq!(copy.source, original.source);
    assert_eq!(copy.file, Some("building.rs"));
    assert_eq!(copy.line, Some(42));
}

// ============================================================================
// DEFAULT LOGGER TESTS
// ============================================================================

#[test]
fn test_format_plain_without_file_line() {
    let text = DefaultLogger::format_plain(&entry(LogSeverity::Info, None, None));
    assert!(text.contains("[INFO ]"));
    assert!(text.contains("[worldview::GraphManager]"));
    assert!(text.ends_with("interior group changed"));
}

#[test]
fn test_format_plain_with_file_line() {
    let text = DefaultLogger::format_plain(&entry(LogSeverity::Error, Some("bsp.rs"), Some(7)));
    assert!(text.contains("[ERROR]"));
    assert!(text.ends_with("(bsp.rs:7)"));
}

#[test]
fn test_format_plain_timestamp_shape() {
    let text = DefaultLogger::format_plain(&entry(LogSeverity::Debug, None, None));
    // "[YYYY-MM-DD HH:MM:SS.mmm]"
    let close = text.find(']').unwrap();
    assert_eq!(close, 24);
}

#[test]
fn test_default_logger_all_severities() {
    let logger = DefaultLogger;
    for severity in [
        LogSeverity::Trace,
        LogSeverity::Debug,
        LogSeverity::Info,
        LogSeverity::Warn,
        LogSeverity::Error,
    ] {
        logger.log(&entry(severity, None, None));
        logger.log(&entry(severity, Some("file.rs"), Some(1)));
    }
}

#[test]
fn test_custom_logger_implementation() {
    struct Capture(Arc<Mutex<Vec<String>>>);
    impl Logger for Capture {
        fn log(&self, entry: &LogEntry) {
            self.0.lock().unwrap().push(entry.message.clone());
        }
    }

    let store = Arc::new(Mutex::new(Vec::new()));
    let logger = Capture(store.clone());
    logger.log(&entry(LogSeverity::Info, None, None));
    assert_eq!(store.lock().unwrap().as_slice(), ["interior group changed"]);
}

#[test]
fn test_logger_trait_is_send_sync() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<DefaultLogger>();
}

#[test]
fn test_log_entry_with_past_timestamp() {
    let mut old = entry(LogSeverity::Info, None, None);
    old.timestamp = SystemTime::now() - Duration::from_secs(3600);
    let text = DefaultLogger::format_plain(&old);
    assert!(text.starts_with('['));
}
