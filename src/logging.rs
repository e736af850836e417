/// Structured logging for the rainfall prediction library
///
/// Provides context-rich logging tagged with the pipeline component,
/// timestamps, and severity levels. Supports both console output
/// and file-based logging for batch scoring runs.
///
/// The logger is a no-op until `init_logger` is called, so library
/// callers that never initialise it see no output.

use chrono::Utc;
use std::fmt;
use std::fs::OpenOptions;
use std::io::Write;
use std::sync::Mutex;

use serde::Deserialize;

use crate::model::{ForecastError, MonthlyMetrics};

// ---------------------------------------------------------------------------
// Log Levels
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    Info,
    #[serde(alias = "warn")]
    Warning,
    Error,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogLevel::Debug => write!(f, "DEBUG"),
            LogLevel::Info => write!(f, "INFO"),
            LogLevel::Warning => write!(f, "WARN"),
            LogLevel::Error => write!(f, "ERROR"),
        }
    }
}

// ---------------------------------------------------------------------------
// Pipeline Components
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Component {
    Features,
    Predictor,
    Evaluator,
    Config,
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Component::Features => write!(f, "FEAT"),
            Component::Predictor => write!(f, "MODEL"),
            Component::Evaluator => write!(f, "EVAL"),
            Component::Config => write!(f, "CFG"),
        }
    }
}

// ---------------------------------------------------------------------------
// Failure Classification
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureType {
    /// Expected failure - the caller's table is missing a column or has bad values
    Expected,
    /// Unexpected failure - model or config file is missing or corrupt
    Unexpected,
    /// Unknown - cannot determine if this is expected or not
    Unknown,
}

impl fmt::Display for FailureType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureType::Expected => write!(f, "EXPECTED"),
            FailureType::Unexpected => write!(f, "UNEXPECTED"),
            FailureType::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

// ---------------------------------------------------------------------------
// Logger Configuration
// ---------------------------------------------------------------------------

/// Global logger instance
static LOGGER: Mutex<Option<Logger>> = Mutex::new(None);

pub struct Logger {
    /// Minimum log level to display
    min_level: LogLevel,
    /// Optional file path for logging
    log_file: Option<String>,
    /// Whether to include timestamps in console output
    console_timestamps: bool,
}

impl Logger {
    /// Initialize the global logger
    pub fn init(min_level: LogLevel, log_file: Option<String>, console_timestamps: bool) {
        let logger = Logger {
            min_level,
            log_file,
            console_timestamps,
        };

        if let Ok(mut slot) = LOGGER.lock() {
            *slot = Some(logger);
        }
    }

    fn enabled(&self, level: LogLevel) -> bool {
        level >= self.min_level
    }

    fn format_entry(level: LogLevel, component: Component, message: &str) -> String {
        let timestamp = Utc::now().format("%Y-%m-%d %H:%M:%S UTC");
        format!("{} {} {}: {}", timestamp, level, component, message)
    }

    fn log(&self, level: LogLevel, component: Component, message: &str) {
        if !self.enabled(level) {
            return;
        }

        let log_entry = Self::format_entry(level, component, message);

        if self.console_timestamps {
            match level {
                LogLevel::Error | LogLevel::Warning => eprintln!("{}", log_entry),
                LogLevel::Info | LogLevel::Debug => println!("{}", log_entry),
            }
        } else {
            match level {
                LogLevel::Error => eprintln!("   ✗ {}: {}", component, message),
                LogLevel::Warning => eprintln!("   ⚠ {}: {}", component, message),
                LogLevel::Info => println!("   {}", message),
                LogLevel::Debug => println!("   [DEBUG] {}", message),
            }
        }

        if let Some(ref path) = self.log_file {
            if let Err(e) = Self::append_to_file(path, &log_entry) {
                eprintln!("Failed to write to log file {}: {}", path, e);
            }
        }
    }

    fn append_to_file(path: &str, entry: &str) -> std::io::Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)?;
        writeln!(file, "{}", entry)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Public Logging Functions
// ---------------------------------------------------------------------------

/// Initialize the global logger
pub fn init_logger(min_level: LogLevel, log_file: Option<&str>, console_timestamps: bool) {
    Logger::init(min_level, log_file.map(String::from), console_timestamps);
}

fn dispatch(level: LogLevel, component: Component, message: &str) {
    if let Ok(guard) = LOGGER.lock() {
        if let Some(logger) = guard.as_ref() {
            logger.log(level, component, message);
        }
    }
}

/// Log a general informational message
pub fn info(component: Component, message: &str) {
    dispatch(LogLevel::Info, component, message);
}

/// Log a warning message
pub fn warn(component: Component, message: &str) {
    dispatch(LogLevel::Warning, component, message);
}

/// Log a debug message
pub fn debug(component: Component, message: &str) {
    dispatch(LogLevel::Debug, component, message);
}

// ---------------------------------------------------------------------------
// Structured Failure Logging
// ---------------------------------------------------------------------------

/// Log level used for a failure of the given classification.
pub fn failure_level(failure_type: FailureType) -> LogLevel {
    match failure_type {
        FailureType::Expected => LogLevel::Debug,
        FailureType::Unexpected => LogLevel::Error,
        FailureType::Unknown => LogLevel::Warning,
    }
}

/// Log a pipeline failure with automatic classification
pub fn log_failure(component: Component, operation: &str, err: &ForecastError) {
    let failure_type = err.failure_type();
    let message = format!("{} failed [{}]: {}", operation, failure_type, err);
    dispatch(failure_level(failure_type), component, &message);
}

// ---------------------------------------------------------------------------
// Evaluation Summary Logging
// ---------------------------------------------------------------------------

/// Month with the highest rmse. Ties go to the later month.
pub fn worst_month(monthly: &[MonthlyMetrics]) -> Option<&MonthlyMetrics> {
    monthly.iter().max_by(|a, b| a.rmse.total_cmp(&b.rmse))
}

/// Lines logged for a set of monthly scores: one debug line per month, then
/// an info line naming the worst month. No scores at all is a warning.
pub fn evaluation_summary(monthly: &[MonthlyMetrics]) -> Vec<(LogLevel, String)> {
    let Some(worst) = worst_month(monthly) else {
        return vec![(LogLevel::Warning, "Evaluation produced no monthly scores".to_string())];
    };

    let mut lines: Vec<(LogLevel, String)> = monthly
        .iter()
        .map(|m| {
            let scores: Vec<String> = m
                .metrics()
                .as_pairs()
                .iter()
                .map(|(name, score)| format!("{}={:.3}", name, score))
                .collect();
            (LogLevel::Debug, format!("month {:>2}: {}", m.month, scores.join(" ")))
        })
        .collect();
    lines.push((
        LogLevel::Info,
        format!(
            "Evaluated {} month(s); worst rmse {:.3} in month {}",
            monthly.len(),
            worst.rmse,
            worst.month
        ),
    ));
    lines
}

/// Log per-month scores followed by a one-line summary of the worst month.
pub fn log_evaluation_summary(monthly: &[MonthlyMetrics]) {
    for (level, line) in evaluation_summary(monthly) {
        dispatch(level, Component::Evaluator, &line);
    }
}
