//! Lagged rainfall features.

use crate::model::{ForecastError, lag_column_name};
use crate::table::{ColumnData, Table};

/// Adds `rain_lag_1` through `rain_lag_{max_lag}` to a copy of `table`.
///
/// `rain_lag_i` at row `k` holds the rainfall value of row `k - i`; the first
/// `i` rows are missing. The table must already be sorted by date, this
/// function does not sort. `max_lag = 0` adds no columns.
pub fn create_lag_features(
    table: &Table,
    rainfall_column: &str,
    max_lag: usize,
) -> Result<Table, ForecastError> {
    let rainfall = table.floats(rainfall_column)?;
    let mut out = table.clone();

    for lag in 1..=max_lag {
        out.insert_column(&lag_column_name(lag), ColumnData::Float(shift(&rainfall, lag)))?;
    }

    Ok(out)
}

/// Moves every value `lag` positions later, filling the head with `None`.
fn shift(values: &[Option<f64>], lag: usize) -> Vec<Option<f64>> {
    let head = lag.min(values.len());
    std::iter::repeat_n(None, head)
        .chain(values[..values.len() - head].iter().copied())
        .collect()
}
