// This file implements the application's logging system.
// It provides macros for the different log levels (INFO, WARN, ERROR, DEBUG).
// Every line goes to stderr, prefixed with a local timestamp and a coloured level tag,
// so progress output never mixes with anything a tool prints on stdout.

use chrono::Local;
use colored::Colorize;
use std::fmt;
use std::sync::OnceLock;
use std::sync::atomic::{AtomicBool, Ordering};

/// Provides convenient logging macros.
/// `#[macro_export]` makes these macros globally available within the crate.

// `log_info!` for general progress of a fetch run.
#[macro_export]
macro_rules! log_info {
    ($($arg:tt)*) => ($crate::logger::emit($crate::logger::Level::Info, format_args!($($arg)*)));
}

// `log_warn!` for non-fatal issues (missing token, compression hiccups, ...).
#[macro_export]
macro_rules! log_warn {
    ($($arg:tt)*) => ($crate::logger::emit($crate::logger::Level::Warn, format_args!($($arg)*)));
}

// `log_error!` for failures that end the run or a tool's installation.
#[macro_export]
macro_rules! log_error {
    ($($arg:tt)*) => ($crate::logger::emit($crate::logger::Level::Error, format_args!($($arg)*)));
}

// `log_debug!` for detailed tracing; only printed when debug mode is on.
#[macro_export]
macro_rules! log_debug {
    ($($arg:tt)*) => ($crate::logger::emit($crate::logger::Level::Debug, format_args!($($arg)*)));
}

/// Severity of a log line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Debug,
    Info,
    Warn,
    Error,
}

impl Level {
    fn tag(self) -> colored::ColoredString {
        match self {
            Level::Debug => "[DEBUG]".dimmed(),
            Level::Info => "[INFO]".bright_green(),
            Level::Warn => "[WARN]".bright_yellow(),
            Level::Error => "[ERROR]".bright_red(),
        }
    }
}

// Global flag to control debug logging, ensured to be initialized once.
static DEBUG_ENABLED: OnceLock<AtomicBool> = OnceLock::new();

/// Initializes the logger, setting the global debug mode.
/// This function should be called once at application startup.
///
/// # Arguments
/// * `debug`: If `true`, enables debug logging; otherwise, only info, warn, and error messages are printed.
pub fn init(debug: bool) {
    DEBUG_ENABLED
        .get_or_init(|| AtomicBool::new(debug))
        .store(debug, Ordering::Relaxed);

    log_debug!("Logger initialized in DEBUG mode");
}

/// Checks if debug logging is currently enabled.
/// Used by `emit` to drop debug lines early.
pub fn is_debug_enabled() -> bool {
    DEBUG_ENABLED
        .get()
        .map(|f| f.load(Ordering::Relaxed))
        .unwrap_or(false)
}

/// Writes one formatted log line. The macros above are the intended entry point.
pub fn emit(level: Level, args: fmt::Arguments<'_>) {
    if level == Level::Debug && !is_debug_enabled() {
        return;
    }
    let stamp = Local::now().format("%Y/%m/%d %H:%M:%S").to_string();
    eprintln!("{} {} {}", stamp.dimmed(), level.tag(), args);
}
