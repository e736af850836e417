//! Feature construction for the rainfall model.
//!
//! Turns a raw table of daily observations into the table the model was
//! trained on: lagged rainfall plus calendar columns, with incomplete rows
//! removed.
//!
//! Submodules:
//! - `lags`: `rain_lag_N` columns shifted from the rainfall series.
//! - `calendar`: `month`, `day` and `dayofyear` from the date column.

pub mod calendar;
pub mod lags;

pub use calendar::create_date_features;
pub use lags::create_lag_features;

use crate::config::{FeatureConfig, MissingPolicy};
use crate::logging::{self, Component};
use crate::model::{DEFAULT_MAX_LAG, ForecastError, lag_column_name};
use crate::table::Table;

/// Sorts by date, adds lag and calendar features with the default
/// `max_lag` of 7, and drops every row with a missing value in any column.
pub fn prepare_features(
    table: &Table,
    rainfall_column: &str,
    date_column: &str,
) -> Result<Table, ForecastError> {
    let config = FeatureConfig {
        rainfall_column: rainfall_column.to_string(),
        date_column: date_column.to_string(),
        max_lag: DEFAULT_MAX_LAG,
        missing_policy: MissingPolicy::AnyColumn,
    };
    prepare_features_with(table, &config)
}

/// `prepare_features` driven by a `FeatureConfig`.
pub fn prepare_features_with(table: &Table, config: &FeatureConfig) -> Result<Table, ForecastError> {
    let result = build(table, config);
    if let Err(ref e) = result {
        logging::log_failure(Component::Features, "prepare_features", e);
    }
    result
}

fn build(table: &Table, config: &FeatureConfig) -> Result<Table, ForecastError> {
    let sorted = table.sort_by_date(&config.date_column)?;
    let lagged = create_lag_features(&sorted, &config.rainfall_column, config.max_lag)?;
    let featured = create_date_features(&lagged, &config.date_column)?;

    let complete = match config.missing_policy {
        MissingPolicy::AnyColumn => featured.drop_missing(),
        MissingPolicy::LagColumnsOnly => {
            let lag_columns: Vec<String> = (1..=config.max_lag).map(lag_column_name).collect();
            featured.drop_missing_in(&lag_columns)?
        }
    };

    let dropped = table.len() - complete.len();
    logging::debug(
        Component::Features,
        &format!(
            "Prepared {} feature row(s) from {} observation(s), {} dropped as incomplete",
            complete.len(),
            table.len(),
            dropped
        ),
    );
    if complete.is_empty() && !table.is_empty() {
        logging::warn(
            Component::Features,
            &format!("No complete rows after building {} lag(s)", config.max_lag),
        );
    }

    Ok(complete)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
