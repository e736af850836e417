//! Column-oriented table of daily observations and derived features.
//!
//! Columns are typed (date, float, integer) and every cell may be missing.
//! Rows carry a positional index label that survives row filtering, so
//! forecasts can be lined up with the rows they were produced from.
//!
//! Every operation that changes shape returns a new table; callers are free
//! to reuse their input.

use std::cmp::Ordering;

use chrono::NaiveDate;

use crate::model::{DEFAULT_DATE_COLUMN, DEFAULT_RAINFALL_COLUMN, ForecastError, Observation};
use crate::predictor::Forecast;

// ---------------------------------------------------------------------------
// Column storage
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum ColumnData {
    Date(Vec<Option<NaiveDate>>),
    Float(Vec<Option<f64>>),
    Int(Vec<Option<i64>>),
}

impl ColumnData {
    pub fn len(&self) -> usize {
        match self {
            ColumnData::Date(v) => v.len(),
            ColumnData::Float(v) => v.len(),
            ColumnData::Int(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// `true` if the cell is absent. A float `NaN` counts as absent.
    pub fn is_missing(&self, row: usize) -> bool {
        match self {
            ColumnData::Date(v) => v[row].is_none(),
            ColumnData::Float(v) => v[row].is_none_or(f64::is_nan),
            ColumnData::Int(v) => v[row].is_none(),
        }
    }

    fn take(&self, rows: &[usize]) -> ColumnData {
        match self {
            ColumnData::Date(v) => ColumnData::Date(rows.iter().map(|&r| v[r]).collect()),
            ColumnData::Float(v) => ColumnData::Float(rows.iter().map(|&r| v[r]).collect()),
            ColumnData::Int(v) => ColumnData::Int(rows.iter().map(|&r| v[r]).collect()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Column {
    name: String,
    data: ColumnData,
}

// ---------------------------------------------------------------------------
// Table
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    index: Vec<usize>,
    columns: Vec<Column>,
}

impl Table {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a two-column table (`date`, `rainfall_mm`) in the given order.
    pub fn from_observations(observations: &[Observation]) -> Self {
        let dates = observations.iter().map(|o| Some(o.date)).collect();
        let rainfall = observations.iter().map(|o| o.rainfall_mm).collect();
        Table {
            index: (0..observations.len()).collect(),
            columns: vec![
                Column { name: DEFAULT_DATE_COLUMN.to_string(), data: ColumnData::Date(dates) },
                Column { name: DEFAULT_RAINFALL_COLUMN.to_string(), data: ColumnData::Float(rainfall) },
            ],
        }
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Row labels, in row order.
    pub fn index(&self) -> &[usize] {
        &self.index
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c.name == name)
    }

    pub fn column(&self, name: &str) -> Result<&ColumnData, ForecastError> {
        self.columns
            .iter()
            .find(|c| c.name == name)
            .map(|c| &c.data)
            .ok_or_else(|| ForecastError::ColumnNotFound(name.to_string()))
    }

    pub fn dates(&self, name: &str) -> Result<&[Option<NaiveDate>], ForecastError> {
        match self.column(name)? {
            ColumnData::Date(v) => Ok(v),
            _ => Err(ForecastError::ColumnType { column: name.to_string(), expected: "date" }),
        }
    }

    pub fn ints(&self, name: &str) -> Result<&[Option<i64>], ForecastError> {
        match self.column(name)? {
            ColumnData::Int(v) => Ok(v),
            _ => Err(ForecastError::ColumnType { column: name.to_string(), expected: "integer" }),
        }
    }

    /// Numeric view of a float or integer column. `NaN` cells read as `None`.
    pub fn floats(&self, name: &str) -> Result<Vec<Option<f64>>, ForecastError> {
        match self.column(name)? {
            ColumnData::Float(v) => Ok(v.iter().map(|x| x.filter(|x| !x.is_nan())).collect()),
            ColumnData::Int(v) => Ok(v.iter().map(|x| x.map(|x| x as f64)).collect()),
            ColumnData::Date(_) => {
                Err(ForecastError::ColumnType { column: name.to_string(), expected: "numeric" })
            }
        }
    }

    /// Adds a column, replacing any existing column of the same name in place.
    ///
    /// The first column added to an empty table fixes the row count and
    /// assigns the index `0..n`.
    pub fn insert_column(&mut self, name: &str, data: ColumnData) -> Result<(), ForecastError> {
        if self.columns.is_empty() && self.index.is_empty() {
            self.index = (0..data.len()).collect();
        } else if data.len() != self.len() {
            return Err(ForecastError::LengthMismatch { expected: self.len(), actual: data.len() });
        }

        match self.columns.iter_mut().find(|c| c.name == name) {
            Some(existing) => existing.data = data,
            None => self.columns.push(Column { name: name.to_string(), data }),
        }
        Ok(())
    }

    /// Builder-style `insert_column`.
    pub fn with_column(mut self, name: &str, data: ColumnData) -> Result<Self, ForecastError> {
        self.insert_column(name, data)?;
        Ok(self)
    }

    /// Rows at the given positions, keeping their index labels.
    pub fn select_rows(&self, rows: &[usize]) -> Table {
        Table {
            index: rows.iter().map(|&r| self.index[r]).collect(),
            columns: self
                .columns
                .iter()
                .map(|c| Column { name: c.name.clone(), data: c.data.take(rows) })
                .collect(),
        }
    }

    /// Stable ascending sort on a date column, missing dates last. The index
    /// is reset to `0..n` afterwards.
    pub fn sort_by_date(&self, date_column: &str) -> Result<Table, ForecastError> {
        let dates = self.dates(date_column)?;
        let mut order: Vec<usize> = (0..self.len()).collect();
        order.sort_by(|&a, &b| match (dates[a], dates[b]) {
            (Some(x), Some(y)) => x.cmp(&y),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        });

        let mut sorted = self.select_rows(&order);
        sorted.index = (0..sorted.len()).collect();
        Ok(sorted)
    }

    /// Drops every row with a missing value in any column.
    pub fn drop_missing(&self) -> Table {
        let keep: Vec<usize> = (0..self.len())
            .filter(|&row| self.columns.iter().all(|c| !c.data.is_missing(row)))
            .collect();
        self.select_rows(&keep)
    }

    /// Drops rows with a missing value in any of the named columns.
    pub fn drop_missing_in<S: AsRef<str>>(&self, columns: &[S]) -> Result<Table, ForecastError> {
        let checked = columns
            .iter()
            .map(|name| self.column(name.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        let keep: Vec<usize> = (0..self.len())
            .filter(|&row| checked.iter().all(|data| !data.is_missing(row)))
            .collect();
        Ok(self.select_rows(&keep))
    }

    /// Attaches forecast values as a float column. The forecast must have
    /// been produced from a table with the same row index.
    pub fn with_forecast(&self, name: &str, forecast: &Forecast) -> Result<Table, ForecastError> {
        if forecast.index.len() != self.len() {
            return Err(ForecastError::LengthMismatch { expected: self.len(), actual: forecast.index.len() });
        }
        if let Some(row) = forecast.index.iter().zip(&self.index).position(|(a, b)| a != b) {
            return Err(ForecastError::IndexMismatch {
                row,
                expected: self.index[row],
                actual: forecast.index[row],
            });
        }

        let values = forecast.values.iter().map(|&v| Some(v)).collect();
        self.clone().with_column(name, ColumnData::Float(values))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
