//! Daily rainfall forecasting with a pretrained gradient-boosted tree model.
//!
//! The pipeline runs in three steps, each usable on its own:
//!
//! 1. `features` turns a date-ordered observation table into model features
//!    (lagged rainfall plus calendar columns).
//! 2. `predictor` loads a LightGBM model dump and forecasts one value per row.
//! 3. `evaluate` scores forecasts against observed rainfall, overall or per
//!    calendar month.

pub mod config;
pub mod evaluate;
pub mod features;
pub mod logging;
pub mod model;
pub mod predictor;
pub mod table;

pub use config::{DEFAULT_MODEL_PATH, FeatureConfig, ForecastConfig, MissingPolicy, ModelConfig};
pub use evaluate::{compute_metrics, compute_metrics_by_month};
pub use features::{create_date_features, create_lag_features, prepare_features, prepare_features_with};
pub use model::{
    DEFAULT_DATE_COLUMN, DEFAULT_MAX_LAG, DEFAULT_RAINFALL_COLUMN, FeatureImportance, ForecastError,
    Metrics, MonthlyMetrics, Observation,
};
pub use predictor::{
    Forecast, Forecaster, LightGbmModel, get_feature_importance, get_feature_names, load_model,
    load_model_from_config, predict,
};
pub use table::{ColumnData, Table};
