//! Calendar features derived from the observation date.

use chrono::{Datelike, NaiveDate};

use crate::model::{DAY_COLUMN, DAY_OF_YEAR_COLUMN, ForecastError, MONTH_COLUMN};
use crate::table::{ColumnData, Table};

/// Adds `month` (1-12), `day` (1-31) and `dayofyear` (1-366) integer columns
/// to a copy of `table`. Rows with no date get missing calendar values.
pub fn create_date_features(table: &Table, date_column: &str) -> Result<Table, ForecastError> {
    let dates = table.dates(date_column)?;

    let part = |f: fn(&NaiveDate) -> u32| -> ColumnData {
        ColumnData::Int(dates.iter().map(|d| d.as_ref().map(|d| i64::from(f(d)))).collect())
    };
    let month = part(|d: &NaiveDate| d.month());
    let day = part(|d: &NaiveDate| d.day());
    let day_of_year = part(|d: &NaiveDate| d.ordinal());

    let mut out = table.clone();
    out.insert_column(MONTH_COLUMN, month)?;
    out.insert_column(DAY_COLUMN, day)?;
    out.insert_column(DAY_OF_YEAR_COLUMN, day_of_year)?;
    Ok(out)
}
