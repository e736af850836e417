//! Forecast scoring.
//!
//! Inputs are checked up front: empty inputs, length mismatches and
//! non-finite values are errors rather than `NaN` scores.

use std::collections::BTreeMap;

use crate::logging::{self, Component};
use crate::model::{ForecastError, MONTH_COLUMN, Metrics, MonthlyMetrics};
use crate::table::Table;

/// Root-mean-squared error, mean absolute error and R² of `predicted`
/// against `actual`.
///
/// When `actual` is constant R² is 1.0 for a perfect fit and 0.0 otherwise.
/// R² is undefined for a single value and comes back as `NaN`.
pub fn compute_metrics(actual: &[f64], predicted: &[f64]) -> Result<Metrics, ForecastError> {
    if actual.len() != predicted.len() {
        return Err(ForecastError::LengthMismatch {
            expected: actual.len(),
            actual: predicted.len(),
        });
    }
    if actual.is_empty() {
        return Err(ForecastError::EmptyInput("no values to score".to_string()));
    }
    check_finite("actual", actual)?;
    check_finite("predicted", predicted)?;

    let n = actual.len() as f64;
    let ss_res: f64 = actual
        .iter()
        .zip(predicted)
        .map(|(a, p)| (a - p).powi(2))
        .sum();
    let abs_err: f64 = actual.iter().zip(predicted).map(|(a, p)| (a - p).abs()).sum();

    let mean = actual.iter().sum::<f64>() / n;
    let ss_tot: f64 = actual.iter().map(|a| (a - mean).powi(2)).sum();

    let r2 = if actual.len() < 2 {
        logging::warn(Component::Evaluator, "R² is not defined for fewer than two values");
        f64::NAN
    } else if ss_tot == 0.0 {
        if ss_res == 0.0 { 1.0 } else { 0.0 }
    } else {
        1.0 - ss_res / ss_tot
    };

    Ok(Metrics {
        rmse: (ss_res / n).sqrt(),
        mae: abs_err / n,
        r2,
    })
}

fn check_finite(column: &str, values: &[f64]) -> Result<(), ForecastError> {
    match values.iter().position(|v| !v.is_finite()) {
        Some(row) => Err(ForecastError::MissingValue { column: column.to_string(), row }),
        None => Ok(()),
    }
}

/// Scores each calendar month separately, ascending by month.
///
/// `table` must carry the integer `month` column added by the feature
/// builder. Rows without a month are skipped.
pub fn compute_metrics_by_month(
    table: &Table,
    actual_column: &str,
    predicted_column: &str,
) -> Result<Vec<MonthlyMetrics>, ForecastError> {
    let result = score_by_month(table, actual_column, predicted_column);
    match result {
        Ok(ref monthly) => logging::log_evaluation_summary(monthly),
        Err(ref e) => logging::log_failure(Component::Evaluator, "compute_metrics_by_month", e),
    }
    result
}

fn score_by_month(
    table: &Table,
    actual_column: &str,
    predicted_column: &str,
) -> Result<Vec<MonthlyMetrics>, ForecastError> {
    let months = table.ints(MONTH_COLUMN)?;
    let actual = table.floats(actual_column)?;
    let predicted = table.floats(predicted_column)?;

    let mut groups: BTreeMap<i64, (Vec<f64>, Vec<f64>)> = BTreeMap::new();
    for (row, month) in months.iter().enumerate() {
        let Some(month) = month else { continue };
        let a = actual[row].ok_or_else(|| ForecastError::MissingValue {
            column: actual_column.to_string(),
            row: table.index()[row],
        })?;
        let p = predicted[row].ok_or_else(|| ForecastError::MissingValue {
            column: predicted_column.to_string(),
            row: table.index()[row],
        })?;
        let group = groups.entry(*month).or_default();
        group.0.push(a);
        group.1.push(p);
    }

    groups
        .into_iter()
        .map(|(month, (a, p))| {
            let month = u32::try_from(month).map_err(|_| ForecastError::ColumnType {
                column: MONTH_COLUMN.to_string(),
                expected: "month number",
            })?;
            Ok(MonthlyMetrics::new(month, compute_metrics(&a, &p)?))
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::ColumnData;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_perfect_forecast() {
        let m = compute_metrics(&[1.0, 2.0, 3.0], &[1.0, 2.0, 3.0]).unwrap();
        assert_eq!(m.rmse, 0.0);
        assert_eq!(m.mae, 0.0);
        assert_eq!(m.r2, 1.0);
    }

    #[test]
    fn test_constant_offset_forecast() {
        let m = compute_metrics(&[1.0, 2.0, 3.0], &[2.0, 3.0, 4.0]).unwrap();
        assert!(approx(m.rmse, 1.0));
        assert!(approx(m.mae, 1.0));
        // ss_res = 3, ss_tot = 2
        assert!(approx(m.r2, -0.5), "r2 = {}", m.r2);
    }

    #[test]
    fn test_rmse_weights_large_errors() {
        let m = compute_metrics(&[0.0, 0.0], &[0.0, 4.0]).unwrap();
        assert!(approx(m.mae, 2.0));
        assert!(approx(m.rmse, 8.0_f64.sqrt()));
    }

    #[test]
    fn test_constant_actuals_r2() {
        let exact = compute_metrics(&[0.0, 0.0, 0.0], &[0.0, 0.0, 0.0]).unwrap();
        assert_eq!(exact.r2, 1.0);
        let off = compute_metrics(&[0.0, 0.0, 0.0], &[0.1, 0.0, 0.0]).unwrap();
        assert_eq!(off.r2, 0.0);
    }

    #[test]
    fn test_single_value_r2_is_nan() {
        let m = compute_metrics(&[1.0], &[5.0]).unwrap();
        assert_eq!(m.rmse, 4.0);
        assert_eq!(m.mae, 4.0);
        assert!(m.r2.is_nan(), "r2 = {}", m.r2);
        assert!(compute_metrics(&[2.0], &[2.0]).unwrap().r2.is_nan());
    }

    #[test]
    fn test_rejects_length_mismatch() {
        assert_eq!(
            compute_metrics(&[1.0, 2.0], &[1.0]).unwrap_err(),
            ForecastError::LengthMismatch { expected: 2, actual: 1 }
        );
    }

    #[test]
    fn test_rejects_empty_input() {
        assert!(matches!(compute_metrics(&[], &[]), Err(ForecastError::EmptyInput(_))));
    }

    #[test]
    fn test_rejects_nan() {
        assert_eq!(
            compute_metrics(&[1.0, 2.0], &[1.0, f64::NAN]).unwrap_err(),
            ForecastError::MissingValue { column: "predicted".to_string(), row: 1 }
        );
    }

    fn scored_table() -> Table {
        Table::new()
            .with_column("month", ColumnData::Int(vec![Some(7), Some(1), Some(7), None, Some(1)]))
            .unwrap()
            .with_column("rainfall_mm", ColumnData::Float(vec![Some(4.0), Some(1.0), Some(0.0), Some(8.0), Some(3.0)]))
            .unwrap()
            .with_column("predicted", ColumnData::Float(vec![Some(3.0), Some(1.0), Some(1.0), None, Some(2.0)]))
            .unwrap()
    }

    #[test]
    fn test_by_month_is_ascending_and_matches_subsets() {
        let monthly = compute_metrics_by_month(&scored_table(), "rainfall_mm", "predicted").unwrap();
        let months: Vec<u32> = monthly.iter().map(|m| m.month).collect();
        assert_eq!(months, vec![1, 7], "row without a month is skipped");

        let january = compute_metrics(&[1.0, 3.0], &[1.0, 2.0]).unwrap();
        let july = compute_metrics(&[4.0, 0.0], &[3.0, 1.0]).unwrap();
        assert_eq!(monthly[0].metrics(), january);
        assert_eq!(monthly[1].metrics(), july);
    }

    #[test]
    fn test_by_month_with_single_row_month() {
        let table = Table::new()
            .with_column("month", ColumnData::Int(vec![Some(1), Some(2), Some(2)]))
            .unwrap()
            .with_column("rainfall_mm", ColumnData::Float(vec![Some(1.0), Some(1.0), Some(3.0)]))
            .unwrap()
            .with_column("predicted", ColumnData::Float(vec![Some(5.0), Some(1.0), Some(3.0)]))
            .unwrap();
        let monthly = compute_metrics_by_month(&table, "rainfall_mm", "predicted").unwrap();

        assert_eq!(monthly[0].month, 1);
        assert_eq!(monthly[0].rmse, 4.0);
        assert!(monthly[0].r2.is_nan(), "one-row month has no R²");
        assert_eq!(monthly[1].r2, 1.0);
    }

    #[test]
    fn test_by_month_requires_month_column() {
        let table = Table::new()
            .with_column("rainfall_mm", ColumnData::Float(vec![Some(1.0)]))
            .unwrap()
            .with_column("predicted", ColumnData::Float(vec![Some(1.0)]))
            .unwrap();
        assert_eq!(
            compute_metrics_by_month(&table, "rainfall_mm", "predicted").unwrap_err(),
            ForecastError::ColumnNotFound("month".to_string())
        );
    }

    #[test]
    fn test_by_month_rejects_missing_prediction() {
        let mut table = scored_table();
        table
            .insert_column("predicted", ColumnData::Float(vec![Some(3.0), None, Some(1.0), None, Some(2.0)]))
            .unwrap();
        assert_eq!(
            compute_metrics_by_month(&table, "rainfall_mm", "predicted").unwrap_err(),
            ForecastError::MissingValue { column: "predicted".to_string(), row: 1 }
        );
    }

    #[test]
    fn test_by_month_on_empty_table_is_empty() {
        let table = scored_table().select_rows(&[]);
        let monthly = compute_metrics_by_month(&table, "rainfall_mm", "predicted").unwrap();
        assert!(monthly.is_empty());
    }
}
