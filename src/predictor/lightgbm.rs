//! LightGBM tree-ensemble backend
//!
//! Reads the JSON produced by LightGBM's `Booster.dump_model()` and scores
//! rows by walking each tree, following LightGBM's own split rules for
//! missing values and categorical splits.
//!
//! Only single-output regression objectives are supported.

use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::model::{FeatureImportance, ForecastError};
use crate::predictor::Forecaster;

/// Values with magnitude at or below this are "zero" for `missing_type = Zero`.
const ZERO_THRESHOLD: f64 = 1e-35;

// ============================================================================
// Dump Structures
// ============================================================================

#[derive(Debug, Deserialize)]
struct ModelDump {
    #[serde(default = "default_num_class")]
    num_class: usize,
    #[serde(default)]
    objective: Option<String>,
    #[serde(default)]
    average_output: bool,
    feature_names: Vec<String>,
    tree_info: Vec<TreeInfo>,
}

fn default_num_class() -> usize {
    1
}

#[derive(Debug, Deserialize)]
struct TreeInfo {
    tree_structure: RawNode,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawNode {
    Split(RawSplit),
    Leaf(RawLeaf),
}

#[derive(Debug, Deserialize)]
struct RawSplit {
    split_feature: usize,
    #[serde(default)]
    split_gain: f64,
    threshold: RawThreshold,
    #[serde(default = "default_decision_type")]
    decision_type: String,
    #[serde(default)]
    default_left: bool,
    #[serde(default)]
    missing_type: MissingType,
    left_child: Box<RawNode>,
    right_child: Box<RawNode>,
}

fn default_decision_type() -> String {
    "<=".to_string()
}

#[derive(Debug, Deserialize)]
struct RawLeaf {
    leaf_value: f64,
}

/// Numerical splits dump a number; categorical splits dump `"1||4||7"`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawThreshold {
    Value(f64),
    Categories(String),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
enum MissingType {
    #[default]
    None,
    Zero,
    NaN,
}

// ============================================================================
// Scoring Structures
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
enum Decision {
    Numerical {
        threshold: f64,
        missing_type: MissingType,
        default_left: bool,
    },
    Categorical {
        categories: Vec<i64>,
    },
}

impl Decision {
    fn goes_left(&self, value: f64) -> bool {
        match self {
            Decision::Numerical { threshold, missing_type, default_left } => {
                let value = if value.is_nan() && *missing_type != MissingType::NaN {
                    0.0
                } else {
                    value
                };
                let is_default = match missing_type {
                    MissingType::Zero => value.abs() <= ZERO_THRESHOLD,
                    MissingType::NaN => value.is_nan(),
                    MissingType::None => false,
                };
                if is_default {
                    *default_left
                } else {
                    value <= *threshold
                }
            }
            Decision::Categorical { categories } => {
                if value.is_nan() {
                    return false;
                }
                let category = value as i64;
                category >= 0 && categories.contains(&category)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum TreeNode {
    Split {
        feature: usize,
        gain: f64,
        decision: Decision,
        left: Box<TreeNode>,
        right: Box<TreeNode>,
    },
    Leaf(f64),
}

impl TreeNode {
    fn from_raw(raw: RawNode, n_features: usize) -> Result<Self, ForecastError> {
        let split = match raw {
            RawNode::Leaf(leaf) => return Ok(TreeNode::Leaf(leaf.leaf_value)),
            RawNode::Split(split) => split,
        };

        if split.split_feature >= n_features {
            return Err(ForecastError::ModelFormat(format!(
                "split on feature {} but model declares {} feature(s)",
                split.split_feature, n_features
            )));
        }

        let decision = match (split.decision_type.as_str(), split.threshold) {
            ("<=", RawThreshold::Value(threshold)) => Decision::Numerical {
                threshold,
                missing_type: split.missing_type,
                default_left: split.default_left,
            },
            ("==", RawThreshold::Categories(list)) => Decision::Categorical {
                categories: parse_categories(&list)?,
            },
            ("==", RawThreshold::Value(v)) => Decision::Categorical {
                categories: vec![v as i64],
            },
            (other, _) => {
                return Err(ForecastError::ModelFormat(format!(
                    "unsupported decision type '{}'",
                    other
                )));
            }
        };

        Ok(TreeNode::Split {
            feature: split.split_feature,
            gain: split.split_gain,
            decision,
            left: Box::new(Self::from_raw(*split.left_child, n_features)?),
            right: Box::new(Self::from_raw(*split.right_child, n_features)?),
        })
    }

    fn score(&self, features: &[f64]) -> f64 {
        let mut node = self;
        loop {
            match node {
                TreeNode::Leaf(value) => return *value,
                TreeNode::Split { feature, decision, left, right, .. } => {
                    node = if decision.goes_left(features[*feature]) { &**left } else { &**right };
                }
            }
        }
    }

    fn accumulate_gain(&self, gains: &mut [f64]) {
        if let TreeNode::Split { feature, gain, left, right, .. } = self {
            gains[*feature] += gain;
            left.accumulate_gain(gains);
            right.accumulate_gain(gains);
        }
    }
}

fn parse_categories(list: &str) -> Result<Vec<i64>, ForecastError> {
    list.split("||")
        .map(|c| {
            c.trim().parse::<i64>().map_err(|_| {
                ForecastError::ModelFormat(format!("bad category '{}' in threshold '{}'", c, list))
            })
        })
        .collect()
}

/// Output transform applied to the summed raw score.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputTransform {
    Identity,
    Exp,
    /// `sign(x) * x²`, undoing a model trained with `reg_sqrt`.
    SignedSquare,
}

impl OutputTransform {
    /// Maps a LightGBM objective string, e.g. `"tweedie tweedie_variance_power:1.5"`.
    fn from_objective(objective: Option<&str>) -> Result<Self, ForecastError> {
        let mut tokens = objective.unwrap_or("regression").split_whitespace();
        let name = tokens.next().unwrap_or("regression");
        let sqrt = tokens.any(|t| t == "sqrt");
        match name {
            "regression" | "regression_l2" | "l2" | "mse" | "mean_squared_error" | "rmse"
            | "root_mean_squared_error" | "regression_l1" | "l1" | "mae" | "mean_absolute_error"
            | "huber" | "fair" | "quantile" | "mape" | "mean_absolute_percentage_error" => {
                if sqrt {
                    Ok(OutputTransform::SignedSquare)
                } else {
                    Ok(OutputTransform::Identity)
                }
            }
            "poisson" | "gamma" | "tweedie" => Ok(OutputTransform::Exp),
            other => Err(ForecastError::ModelFormat(format!(
                "objective '{}' is not a regression objective",
                other
            ))),
        }
    }

    fn apply(self, raw: f64) -> f64 {
        match self {
            OutputTransform::Identity => raw,
            OutputTransform::Exp => raw.exp(),
            OutputTransform::SignedSquare => raw.signum() * raw * raw,
        }
    }
}

// ============================================================================
// Model
// ============================================================================

/// A loaded LightGBM regression model. Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct LightGbmModel {
    feature_names: Vec<String>,
    trees: Vec<TreeNode>,
    average_output: bool,
    transform: OutputTransform,
}

impl LightGbmModel {
    /// Reads a model dump from disk.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ForecastError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| ForecastError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::from_json_str(&content)
    }

    /// Parses a model dump already in memory.
    pub fn from_json_str(json: &str) -> Result<Self, ForecastError> {
        let dump: ModelDump =
            serde_json::from_str(json).map_err(|e| ForecastError::ModelFormat(e.to_string()))?;

        if dump.num_class != 1 {
            return Err(ForecastError::ModelFormat(format!(
                "expected a single-output model, found num_class = {}",
                dump.num_class
            )));
        }

        let transform = OutputTransform::from_objective(dump.objective.as_deref())?;
        let n_features = dump.feature_names.len();
        let trees = dump
            .tree_info
            .into_iter()
            .map(|t| TreeNode::from_raw(t.tree_structure, n_features))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            feature_names: dump.feature_names,
            trees,
            average_output: dump.average_output,
            transform,
        })
    }

    pub fn num_trees(&self) -> usize {
        self.trees.len()
    }

    pub fn transform(&self) -> OutputTransform {
        self.transform
    }

    /// Sum of leaf values before the objective transform.
    pub fn raw_score(&self, features: &[f64]) -> f64 {
        let total: f64 = self.trees.iter().map(|t| t.score(features)).sum();
        if self.average_output && !self.trees.is_empty() {
            total / self.trees.len() as f64
        } else {
            total
        }
    }
}

impl Forecaster for LightGbmModel {
    fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    fn predict_row(&self, features: &[f64]) -> f64 {
        self.transform.apply(self.raw_score(features))
    }

    fn feature_importance(&self) -> Vec<FeatureImportance> {
        let mut gains = vec![0.0; self.feature_names.len()];
        for tree in &self.trees {
            tree.accumulate_gain(&mut gains);
        }
        self.feature_names
            .iter()
            .zip(gains)
            .map(|(feature, importance)| FeatureImportance {
                feature: feature.clone(),
                importance,
            })
            .collect()
    }
}

// ============================================================================
// Tests
// ============================================================================
