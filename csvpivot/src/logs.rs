//! Diagnostic logging for the filters.
//!
//! stdout carries the data stream, so every log line goes to stderr.
//! A single global logger holds the verbosity chosen on the command line.

use std::io::Write;
use std::sync::atomic::{AtomicU8, Ordering};

use once_cell::sync::Lazy;

/// Log level, ordered from most to least chatty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Info,
    Success,
    Warning,
    Error,
}

/// How much the logger lets through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verbosity {
    /// Nothing at all.
    Quiet,
    /// Warnings and errors.
    Normal,
    /// Everything, including progress.
    Verbose,
}

impl Verbosity {
    fn as_u8(self) -> u8 {
        match self {
            Verbosity::Quiet => 0,
            Verbosity::Normal => 1,
            Verbosity::Verbose => 2,
        }
    }

    fn from_u8(v: u8) -> Self {
        match v {
            0 => Verbosity::Quiet,
            1 => Verbosity::Normal,
            _ => Verbosity::Verbose,
        }
    }

    /// Whether an entry at `level` is shown.
    pub fn allows(self, level: LogLevel) -> bool {
        match self {
            Verbosity::Quiet => false,
            Verbosity::Normal => level >= LogLevel::Warning,
            Verbosity::Verbose => true,
        }
    }
}

/// A single log entry
#[derive(Debug, Clone)]
pub struct LogEntry {
    pub level: LogLevel,
    pub message: String,
    /// Nesting depth, rendered as leading spaces
    pub indent: u8,
}

impl LogEntry {
    pub fn info(message: impl Into<String>) -> Self {
        Self { level: LogLevel::Info, message: message.into(), indent: 0 }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self { level: LogLevel::Success, message: message.into(), indent: 0 }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self { level: LogLevel::Warning, message: message.into(), indent: 0 }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self { level: LogLevel::Error, message: message.into(), indent: 0 }
    }

    pub fn with_indent(mut self, indent: u8) -> Self {
        self.indent = indent;
        self
    }

    /// Text as written to stderr.
    pub fn render(&self) -> String {
        let prefix = match self.level {
            LogLevel::Info => "  ",
            LogLevel::Success => "ok",
            LogLevel::Warning => "warning:",
            LogLevel::Error => "error:",
        };
        let indent = "  ".repeat(self.indent as usize);
        format!("csvpivot: {}{} {}", indent, prefix, self.message)
    }
}

/// Global logger
pub static LOGGER: Lazy<Logger> = Lazy::new(Logger::new);

/// Writes entries to stderr, filtered by verbosity.
pub struct Logger {
    verbosity: AtomicU8,
}

impl Logger {
    pub fn new() -> Self {
        Self { verbosity: AtomicU8::new(Verbosity::Normal.as_u8()) }
    }

    pub fn set_verbosity(&self, verbosity: Verbosity) {
        self.verbosity.store(verbosity.as_u8(), Ordering::Relaxed);
    }

    pub fn verbosity(&self) -> Verbosity {
        Verbosity::from_u8(self.verbosity.load(Ordering::Relaxed))
    }

    pub fn log(&self, entry: LogEntry) {
        if !self.verbosity().allows(entry.level) {
            return;
        }
        // Write failures on stderr are ignored.
        let _ = writeln!(std::io::stderr().lock(), "{}", entry.render());
    }
}

impl Default for Logger {
    fn default() -> Self {
        Self::new()
    }
}

/// Set the global verbosity (called once by the CLI).
pub fn set_verbosity(verbosity: Verbosity) {
    LOGGER.set_verbosity(verbosity);
}

pub fn log_info(msg: impl Into<String>) {
    LOGGER.log(LogEntry::info(msg));
}

pub fn log_success(msg: impl Into<String>) {
    LOGGER.log(LogEntry::success(msg));
}

pub fn log_warning(msg: impl Into<String>) {
    LOGGER.log(LogEntry::warning(msg));
}

pub fn log_error(msg: impl Into<String>) {
    LOGGER.log(LogEntry::error(msg));
}

pub fn log_info_indent(msg: impl Into<String>, indent: u8) {
    LOGGER.log(LogEntry::info(msg).with_indent(indent));
}
