//! Engine log records and the console sink
//!
//! Every message carries a severity and a namespaced source such as
//! `"worldview::GraphManager"`. Records go to one process-wide `Logger`
//! (see `Engine::set_logger`); the default prints colored lines.
//!
//! The per-frame culling code logs at Trace level; raise the threshold with
//! `Engine::set_min_severity` to keep the console readable.

use colored::*;
use std::time::SystemTime;
use chrono::{DateTime, Local};

/// Sink for engine log records
///
/// ```no_run
/// use worldview_engine::worldview::log::{Logger, LogEntry, LogSeverity};
///
/// struct Bridge;
///
/// impl Logger for Bridge {
///     fn log(&self, entry: &LogEntry) {
///         if entry.severity >= LogSeverity::Warn {
///             eprintln!("{}: {}", entry.source, entry.message);
///         }
///     }
/// }
/// ```
pub trait Logger: Send + Sync {
    fn log(&self, entry: &LogEntry);
}

/// One log record
#[derive(Debug, Clone)]
pub struct LogEntry {
    pub severity: LogSeverity,
    pub timestamp: SystemTime,
    /// Emitting subsystem, e.g. "worldview::GraphManager"
    pub source: String,
    pub message: String,
    /// Call site, set by `engine_error!` only
    pub file: Option<&'static str>,
    pub line: Option<u32>,
}

/// Ordered from most to least verbose
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogSeverity {
    /// Per-frame culling details
    Trace,
    /// Interior transitions, load completions
    Debug,
    Info,
    /// Failed loads, malformed BSP data
    Warn,
    Error,
}

impl LogSeverity {
    pub(crate) fn as_u8(self) -> u8 {
        self as u8
    }

    pub(crate) fn from_u8(value: u8) -> Self {
        match value {
            0 => LogSeverity::Trace,
            1 => LogSeverity::Debug,
            2 => LogSeverity::Info,
            3 => LogSeverity::Warn,
            _ => LogSeverity::Error,
        }
    }

    fn label(self) -> &'static str {
        match self {
            LogSeverity::Trace => "TRACE",
            LogSeverity::Debug => "DEBUG",
            LogSeverity::Info => "INFO ",
            LogSeverity::Warn => "WARN ",
            LogSeverity::Error => "ERROR",
        }
    }
}

/// Console sink: `[time] [SEVERITY] [source] message`, followed by
/// `(file:line)` when the call site is known.
pub struct DefaultLogger;

impl DefaultLogger {
    /// The console line without color codes.
    pub fn format_plain(entry: &LogEntry) -> String {
        Self::render(entry, entry.severity.label().to_string(), entry.source.clone())
    }

    fn render(entry: &LogEntry, severity: String, source: String) -> String {
        let datetime: DateTime<Local> = entry.timestamp.into();
        let mut line = format!(
            "[{}] [{}] [{}] {}",
            datetime.format("%Y-%m-%d %H:%M:%S%.3f"), severity, source, entry.message
        );
        if let (Some(file), Some(at)) = (entry.file, entry.line) {
            line.push_str(&format!(" ({}:{})", file, at));
        }
        line
    }
}

impl Logger for DefaultLogger {
    fn log(&self, entry: &LogEntry) {
        let label = entry.severity.label();
        let severity = match entry.severity {
            LogSeverity::Trace => label.bright_black(),
            LogSeverity::Debug => label.cyan(),
            LogSeverity::Info => label.green(),
            LogSeverity::Warn => label.yellow(),
            LogSeverity::Error => label.red().bold(),
        };
        println!("{}", Self::render(entry, severity.to_string(), entry.source.bright_blue().to_string()));
    }
}

// ===== LOGGING MACROS =====

/// Log through the engine hub at the severity in the macro's name.
///
/// ```ignore
/// engine_trace!("worldview::GraphManager", "{} objects visible", count);
/// ```
#[macro_export]
macro_rules! engine_trace {
    ($source:expr, $($arg:tt)*) => {
        $crate::worldview::Engine::log(
            $crate::worldview::log::LogSeverity::Trace,
            $source,
            format!($($arg)*)
        )
    };
}

#[macro_export]
macro_rules! engine_debug {
    ($source:expr, $($arg:tt)*) => {
        $crate::worldview::Engine::log(
            $crate::worldview::log::LogSeverity::Debug,
            $source,
            format!($($arg)*)
        )
    };
}

#[macro_export]
macro_rules! engine_info {
    ($source:expr, $($arg:tt)*) => {
        $crate::worldview::Engine::log(
            $crate::worldview::log::LogSeverity::Info,
            $source,
            format!($($arg)*)
        )
    };
}

#[macro_export]
macro_rules! engine_warn {
    ($source:expr, $($arg:tt)*) => {
        $crate::worldview::Engine::log(
            $crate::worldview::log::LogSeverity::Warn,
            $source,
            format!($($arg)*)
        )
    };
}

/// Like the others, plus the call site
#[macro_export]
macro_rules! engine_error {
    ($source:expr, $($arg:tt)*) => {
        $crate::worldview::Engine::log_detailed(
            $crate::worldview::log::LogSeverity::Error,
            $source,
            format!($($arg)*),
            file!(),
            line!()
        )
    };
}

/// Log an ERROR and build an `Error::InvalidResource` carrying the same message
///
/// # Example
///
/// ```ignore
/// return Err(engine_err!("worldview::assets", "Portal {} out of range", index));
/// ```
#[macro_export]
macro_rules! engine_err {
    ($source:expr, $($arg:tt)*) => {{
        let message = format!($($arg)*);
        $crate::engine_error!($source, "{}", message);
        $crate::worldview::Error::InvalidResource(message)
    }};
}

/// Log an ERROR and return `Err(Error::InvalidResource)` from the current function
#[macro_export]
macro_rules! engine_bail {
    ($source:expr, $($arg:tt)*) => {
        return Err($crate::engine_err!($source, $($arg)*))
    };
}

#[cfg(test)]
#[path = "log_tests.rs"]
mod tests;
