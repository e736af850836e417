/// Core data types for the rainfall prediction library.
///
/// This module defines the shared domain model imported by all other modules:
/// column-name defaults, the metrics records produced by the evaluator, the
/// importance rows reported by the predictor, and the crate-wide error type.
/// It contains no logic beyond formatting and no I/O.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::logging::FailureType;

// ---------------------------------------------------------------------------
// Column names
// ---------------------------------------------------------------------------

/// Default name of the rainfall column in an observation table, in millimetres.
pub const DEFAULT_RAINFALL_COLUMN: &str = "rainfall_mm";

/// Default name of the date column in an observation table.
pub const DEFAULT_DATE_COLUMN: &str = "date";

/// Default number of lagged rainfall columns.
pub const DEFAULT_MAX_LAG: usize = 7;

/// Calendar feature columns added by `features::create_date_features`.
pub const MONTH_COLUMN: &str = "month";
pub const DAY_COLUMN: &str = "day";
pub const DAY_OF_YEAR_COLUMN: &str = "dayofyear";

/// Name of the lag column for a given lag, e.g. `rain_lag_3`.
pub fn lag_column_name(lag: usize) -> String {
    format!("rain_lag_{}", lag)
}

// ---------------------------------------------------------------------------
// Observation types
// ---------------------------------------------------------------------------

/// One day of observed rainfall at a station, in millimetres.
///
/// `rainfall_mm` is `None` when the gauge reported nothing for the day.
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub date: NaiveDate,
    pub rainfall_mm: Option<f64>,
}

// ---------------------------------------------------------------------------
// Metrics records
// ---------------------------------------------------------------------------

/// Regression scores comparing forecasts against observed rainfall.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Metrics {
    pub rmse: f64,
    pub mae: f64,
    pub r2: f64,
}

impl Metrics {
    /// Metric names paired with their scores, in report order.
    pub fn as_pairs(&self) -> [(&'static str, f64); 3] {
        [("rmse", self.rmse), ("mae", self.mae), ("r2", self.r2)]
    }
}

/// Metrics for the subset of rows falling in one calendar month.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MonthlyMetrics {
    pub month: u32,
    pub rmse: f64,
    pub mae: f64,
    pub r2: f64,
}

impl MonthlyMetrics {
    pub fn new(month: u32, metrics: Metrics) -> Self {
        Self {
            month,
            rmse: metrics.rmse,
            mae: metrics.mae,
            r2: metrics.r2,
        }
    }

    pub fn metrics(&self) -> Metrics {
        Metrics {
            rmse: self.rmse,
            mae: self.mae,
            r2: self.r2,
        }
    }
}

/// Gain-based importance of a single model feature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureImportance {
    pub feature: String,
    pub importance: f64,
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors that can arise while building features, loading or applying a
/// model, or scoring forecasts.
#[derive(Debug, Clone, PartialEq)]
pub enum ForecastError {
    /// A file could not be opened or read.
    Io { path: String, message: String },
    /// The model file was read but is not a usable model.
    ModelFormat(String),
    /// The configuration file could not be parsed.
    Config(String),
    /// A requested column is absent from the table.
    ColumnNotFound(String),
    /// A column exists but holds the wrong kind of values.
    ColumnType { column: String, expected: &'static str },
    /// Two sequences that must line up have different lengths.
    LengthMismatch { expected: usize, actual: usize },
    /// A forecast's row labels do not line up with the table it is joined to.
    IndexMismatch { row: usize, expected: usize, actual: usize },
    /// An operation that needs at least one value received none.
    EmptyInput(String),
    /// A value required for scoring is missing or not finite.
    MissingValue { column: String, row: usize },
}

impl ForecastError {
    /// Classifies the error for logging.
    ///
    /// Schema and shape errors come from caller data and are expected;
    /// I/O and format errors point at a broken deployment.
    pub fn failure_type(&self) -> FailureType {
        match self {
            ForecastError::Io { .. } | ForecastError::ModelFormat(_) | ForecastError::Config(_) => {
                FailureType::Unexpected
            }
            ForecastError::ColumnNotFound(_)
            | ForecastError::ColumnType { .. }
            | ForecastError::LengthMismatch { .. }
            | ForecastError::IndexMismatch { .. }
            | ForecastError::MissingValue { .. } => FailureType::Expected,
            ForecastError::EmptyInput(_) => FailureType::Unknown,
        }
    }
}

impl std::fmt::Display for ForecastError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ForecastError::Io { path, message } => write!(f, "I/O error on {}: {}", path, message),
            ForecastError::ModelFormat(msg) => write!(f, "Model format error: {}", msg),
            ForecastError::Config(msg) => write!(f, "Config error: {}", msg),
            ForecastError::ColumnNotFound(column) => write!(f, "Column not found: {}", column),
            ForecastError::ColumnType { column, expected } => {
                write!(f, "Column {} is not a {} column", column, expected)
            }
            ForecastError::LengthMismatch { expected, actual } => {
                write!(f, "Length mismatch: expected {}, got {}", expected, actual)
            }
            ForecastError::IndexMismatch { row, expected, actual } => write!(
                f,
                "Index mismatch at row {}: table label {}, forecast label {}",
                row, expected, actual
            ),
            ForecastError::EmptyInput(what) => write!(f, "Empty input: {}", what),
            ForecastError::MissingValue { column, row } => {
                write!(f, "Missing value in column {} at row {}", column, row)
            }
        }
    }
}

impl std::error::Error for ForecastError {}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lag_column_names_match_trained_feature_names() {
        assert_eq!(lag_column_name(1), "rain_lag_1");
        assert_eq!(lag_column_name(7), "rain_lag_7");
    }

    #[test]
    fn test_metrics_pairs_in_report_order() {
        let m = Metrics { rmse: 1.5, mae: 1.0, r2: 0.25 };
        assert_eq!(m.as_pairs(), [("rmse", 1.5), ("mae", 1.0), ("r2", 0.25)]);
    }

    #[test]
    fn test_monthly_metrics_round_trips_inner_metrics() {
        let m = Metrics { rmse: 2.0, mae: 1.5, r2: -0.1 };
        let monthly = MonthlyMetrics::new(6, m);
        assert_eq!(monthly.month, 6);
        assert_eq!(monthly.metrics(), m);
    }

    #[test]
    fn test_error_display_names_the_column() {
        let err = ForecastError::ColumnNotFound("rain_lag_3".to_string());
        assert_eq!(err.to_string(), "Column not found: rain_lag_3");

        let err = ForecastError::MissingValue { column: "predicted".to_string(), row: 4 };
        assert!(err.to_string().contains("predicted"));
        assert!(err.to_string().contains('4'));
    }

    #[test]
    fn test_failure_classification() {
        let io = ForecastError::Io { path: "models/x.json".to_string(), message: "not found".to_string() };
        assert_eq!(io.failure_type(), FailureType::Unexpected);

        let schema = ForecastError::ColumnNotFound("month".to_string());
        assert_eq!(schema.failure_type(), FailureType::Expected);

        let empty = ForecastError::EmptyInput("actual".to_string());
        assert_eq!(empty.failure_type(), FailureType::Unknown);
    }
}
