//! Model loading and prediction.
//!
//! Any tree ensemble that can score a row of features, name those features,
//! and report per-feature importance plugs in through `Forecaster`. Feature
//! construction and evaluation never see the concrete backend.
//!
//! Submodules:
//! - `lightgbm`: LightGBM JSON model dumps.

pub mod lightgbm;

pub use lightgbm::LightGbmModel;

use std::path::{Path, PathBuf};

use crate::config::{DEFAULT_MODEL_PATH, ModelConfig};
use crate::logging::{self, Component};
use crate::model::{FeatureImportance, ForecastError};
use crate::table::Table;

// ---------------------------------------------------------------------------
// Backend contract
// ---------------------------------------------------------------------------

/// A trained model that turns one row of features into a rainfall forecast.
pub trait Forecaster {
    /// Feature names in the order `predict_row` expects them.
    fn feature_names(&self) -> &[String];

    /// Scores one row. `features` has one entry per feature name, with
    /// missing values passed as `NaN`.
    fn predict_row(&self, features: &[f64]) -> f64;

    /// One entry per feature name, in declared order.
    fn feature_importance(&self) -> Vec<FeatureImportance>;
}

/// Forecast values tagged with the row labels of the table they came from.
#[derive(Debug, Clone, PartialEq)]
pub struct Forecast {
    pub index: Vec<usize>,
    pub values: Vec<f64>,
}

impl Forecast {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

/// Loads a LightGBM model dump, from `DEFAULT_MODEL_PATH` when no path is
/// given. Every call reads the file again.
pub fn load_model(path: Option<&Path>) -> Result<LightGbmModel, ForecastError> {
    let path = path.map(Path::to_path_buf).unwrap_or_else(|| PathBuf::from(DEFAULT_MODEL_PATH));

    match LightGbmModel::from_file(&path) {
        Ok(model) => {
            logging::info(
                Component::Predictor,
                &format!(
                    "Loaded model from {} ({} trees, {} features)",
                    path.display(),
                    model.num_trees(),
                    model.feature_names().len()
                ),
            );
            Ok(model)
        }
        Err(e) => {
            logging::log_failure(Component::Predictor, "load_model", &e);
            Err(e)
        }
    }
}

/// Loads the model named by a `[model]` config section.
pub fn load_model_from_config(config: &ModelConfig) -> Result<LightGbmModel, ForecastError> {
    load_model(Some(config.path.as_path()))
}

// ---------------------------------------------------------------------------
// Prediction
// ---------------------------------------------------------------------------

/// Forecasts one value per row of `table`.
///
/// Exactly the model's feature columns are used, in the model's order; any
/// other columns are ignored. Fails on the first feature the table lacks.
pub fn predict<M: Forecaster + ?Sized>(model: &M, table: &Table) -> Result<Forecast, ForecastError> {
    let names = model.feature_names();
    let columns = names
        .iter()
        .map(|name| table.floats(name))
        .collect::<Result<Vec<_>, _>>()
        .inspect_err(|e| logging::log_failure(Component::Predictor, "predict", e))?;

    let mut row = vec![0.0; names.len()];
    let values = (0..table.len())
        .map(|r| {
            for (slot, column) in row.iter_mut().zip(&columns) {
                *slot = column[r].unwrap_or(f64::NAN);
            }
            model.predict_row(&row)
        })
        .collect();

    logging::debug(Component::Predictor, &format!("Predicted {} row(s)", table.len()));

    Ok(Forecast {
        index: table.index().to_vec(),
        values,
    })
}

pub fn get_feature_names<M: Forecaster + ?Sized>(model: &M) -> Vec<String> {
    model.feature_names().to_vec()
}

/// Gain importance per feature, highest first. Ties keep the model's order.
pub fn get_feature_importance<M: Forecaster + ?Sized>(model: &M) -> Vec<FeatureImportance> {
    let mut importance = model.feature_importance();
    importance.sort_by(|a, b| b.importance.total_cmp(&a.importance));
    importance
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::ColumnData;

    /// Linear stand-in backend: `2 * a + b`.
    struct Linear {
        names: Vec<String>,
    }

    impl Linear {
        fn new() -> Self {
            Self { names: vec!["a".to_string(), "b".to_string()] }
        }
    }

    impl Forecaster for Linear {
        fn feature_names(&self) -> &[String] {
            &self.names
        }

        fn predict_row(&self, features: &[f64]) -> f64 {
            2.0 * features[0] + features[1]
        }

        fn feature_importance(&self) -> Vec<FeatureImportance> {
            vec![
                FeatureImportance { feature: "a".to_string(), importance: 1.0 },
                FeatureImportance { feature: "b".to_string(), importance: 3.0 },
            ]
        }
    }

    fn feature_table() -> Table {
        // Columns deliberately out of model order, with an extra column.
        Table::new()
            .with_column("b", ColumnData::Float(vec![Some(1.0), Some(0.0), None]))
            .unwrap()
            .with_column("extra", ColumnData::Float(vec![Some(99.0); 3]))
            .unwrap()
            .with_column("a", ColumnData::Int(vec![Some(1), Some(2), Some(3)]))
            .unwrap()
    }

    #[test]
    fn test_predict_selects_columns_in_model_order() {
        let forecast = predict(&Linear::new(), &feature_table()).unwrap();
        assert_eq!(forecast.values[0], 3.0);
        assert_eq!(forecast.values[1], 4.0);
        assert!(forecast.values[2].is_nan(), "missing feature is passed as NaN");
        assert_eq!(forecast.len(), 3);
    }

    #[test]
    fn test_predict_preserves_row_index() {
        let table = feature_table().select_rows(&[0, 2]);
        let forecast = predict(&Linear::new(), &table).unwrap();
        assert_eq!(forecast.index, vec![0, 2]);
    }

    #[test]
    fn test_predict_fails_on_missing_feature() {
        let table = Table::new()
            .with_column("a", ColumnData::Float(vec![Some(1.0)]))
            .unwrap();
        assert_eq!(
            predict(&Linear::new(), &table).unwrap_err(),
            ForecastError::ColumnNotFound("b".to_string())
        );
    }

    #[test]
    fn test_predict_on_empty_table_is_empty() {
        let table = feature_table().select_rows(&[]);
        let forecast = predict(&Linear::new(), &table).unwrap();
        assert!(forecast.is_empty());
    }

    #[test]
    fn test_works_through_trait_object() {
        let model: Box<dyn Forecaster> = Box::new(Linear::new());
        assert_eq!(get_feature_names(model.as_ref()), vec!["a", "b"]);
        assert_eq!(predict(model.as_ref(), &feature_table()).unwrap().values[1], 4.0);
    }

    #[test]
    fn test_feature_importance_sorted_descending() {
        let importance = get_feature_importance(&Linear::new());
        assert_eq!(importance[0].feature, "b");
        assert_eq!(importance[1].feature, "a");
    }

    #[test]
    fn test_load_model_reports_missing_file() {
        let err = load_model(Some(Path::new("/nonexistent/rainfall.json"))).unwrap_err();
        assert!(matches!(err, ForecastError::Io { .. }));
    }
}
