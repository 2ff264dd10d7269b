//! Process-wide logging severity.
//!
//! The crate reports its diagnostics through the [`log`] facade; the hosting
//! application decides where the records go by installing a logger (for
//! example `env_logger`). [`set_log_severity`] caps the severity of what the
//! crate (and everything else using the facade) emits.

use log::LevelFilter;

/// Severity threshold for the logging subsystem.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogSeverity {
    /// Emit everything, including debug records.
    Debug,
    /// Emit warnings and errors.
    Warn,
    /// Emit errors only.
    Error,
    /// Emit nothing.
    Silent,
}

impl From<LogSeverity> for LevelFilter {
    fn from(value: LogSeverity) -> Self {
        match value {
            LogSeverity::Debug => LevelFilter::Debug,
            LogSeverity::Warn => LevelFilter::Warn,
            LogSeverity::Error => LevelFilter::Error,
            LogSeverity::Silent => LevelFilter::Off,
        }
    }
}

/// Sets the process-wide logging severity.
pub fn set_log_severity(severity: LogSeverity) {
    log::set_max_level(severity.into());
}

/// Returns the current process-wide logging severity.
pub fn log_severity() -> LogSeverity {
    match log::max_level() {
        LevelFilter::Off => LogSeverity::Silent,
        LevelFilter::Error => LogSeverity::Error,
        LevelFilter::Warn => LogSeverity::Warn,
        _ => LogSeverity::Debug,
    }
}
