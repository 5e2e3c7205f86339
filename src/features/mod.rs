//! Feature engineering and matrix extraction: table → (X, y, feature names).

mod engineer;

pub use engineer::engineer;

use crate::data::schema::{ENGINEERED_COLUMNS, FEATURE_COLUMNS, TARGET_COLUMN};
use crate::data::Dataset;
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::info;

/// Neutral midpoint of the 0–100 signal range; substitutes any missing signal.
pub const NEUTRAL_SIGNAL: f64 = 50.0;

/// Ordered numeric input for one prediction, aligned to a model's feature names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    pub names: Vec<String>,
    pub values: Vec<f64>,
}

impl FeatureVector {
    /// Pick `names` out of `signals` in order; absent or non-finite signals become 50.
    pub fn from_signals(names: &[String], signals: &HashMap<String, f64>) -> Self {
        let values = names
            .iter()
            .map(|n| {
                signals
                    .get(n)
                    .copied()
                    .filter(|v| v.is_finite())
                    .unwrap_or(NEUTRAL_SIGNAL)
            })
            .collect();
        Self {
            names: names.to_vec(),
            values,
        }
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Training matrix with its target and column names.
#[derive(Debug, Clone)]
pub struct FeatureMatrix {
    pub names: Vec<String>,
    pub x: Array2<f64>,
    pub y: Array1<f64>,
}

impl FeatureMatrix {
    pub fn n_rows(&self) -> usize {
        self.x.nrows()
    }
}

/// Base features plus any engineered features present, in canonical order.
pub fn feature_names(table: &Dataset) -> Vec<String> {
    FEATURE_COLUMNS
        .iter()
        .copied()
        .chain(ENGINEERED_COLUMNS.iter().copied().filter(|c| table.has_column(c)))
        .map(str::to_string)
        .collect()
}

/// Extract X and y. Missing or non-numeric feature cells read as 0, a missing target as 50.
pub fn feature_matrix(table: &Dataset) -> FeatureMatrix {
    let names = feature_names(table);
    let n = table.n_rows();
    let mut x = Array2::<f64>::zeros((n, names.len()));
    for (j, name) in names.iter().enumerate() {
        if let Some(col) = table.numeric(name) {
            for (i, v) in col.into_iter().enumerate() {
                x[[i, j]] = v.unwrap_or(0.0);
            }
        }
    }
    let y = match table.numeric(TARGET_COLUMN) {
        Some(col) => col.into_iter().map(|v| v.unwrap_or(NEUTRAL_SIGNAL)).collect(),
        None => Array1::from_elem(n, NEUTRAL_SIGNAL),
    };
    info!(rows = n, features = names.len(), "feature matrix built");
    FeatureMatrix { names, x, y }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Value;

    #[test]
    fn vector_defaults_missing_signals() {
        let names: Vec<String> = ["a", "b", "c"].iter().map(|s| s.to_string()).collect();
        let mut signals = HashMap::new();
        signals.insert("b".to_string(), 90.0);
        signals.insert("c".to_string(), f64::NAN);
        signals.insert("ignored".to_string(), 1.0);
        let v = FeatureVector::from_signals(&names, &signals);
        assert_eq!(v.values, vec![50.0, 90.0, 50.0]);
    }

    #[test]
    fn matrix_fills_gaps() {
        let headers = vec!["creation_output".to_string(), "skill_score".to_string()];
        let ds = Dataset::from_rows(
            &headers,
            vec![
                vec![Value::Number(70.0), Value::Null],
                vec![Value::Null, Value::Number(64.0)],
            ],
        );
        let m = feature_matrix(&ds);
        assert_eq!(m.names.len(), FEATURE_COLUMNS.len());
        assert_eq!(m.x[[0, 0]], 70.0);
        assert_eq!(m.x[[1, 0]], 0.0);
        assert_eq!(m.x[[0, 1]], 0.0);
        assert_eq!(m.y.to_vec(), vec![50.0, 64.0]);
    }
}
