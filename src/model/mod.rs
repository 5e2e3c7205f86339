//! Regression candidates and the isolation-forest anomaly detector.
//!
//! All models are plain serde values so the registry can persist them as JSON.

mod boosting;
mod forest;
mod isolation;
mod linear;
mod tree;

pub use boosting::GradientBoosting;
pub use forest::RandomForest;
pub use isolation::{AnomalyVerdict, IsolationForest};
pub use linear::LinearRegression;
pub use tree::RegressionTree;

use crate::error::Result;
use ndarray::{Array1, ArrayView1, ArrayView2};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Common surface of every skill regressor.
pub trait Regressor {
    fn fit(&mut self, x: ArrayView2<'_, f64>, y: ArrayView1<'_, f64>) -> Result<()>;

    fn predict_row(&self, row: ArrayView1<'_, f64>) -> f64;

    fn predict(&self, x: ArrayView2<'_, f64>) -> Array1<f64> {
        x.rows().into_iter().map(|r| self.predict_row(r)).collect()
    }

    /// Per-feature contribution weights: impurity importances for tree
    /// ensembles, coefficients for linear models. `None` before fitting.
    fn feature_contributions(&self) -> Option<Vec<f64>>;

    /// Input width seen at fit time (0 before fitting).
    fn n_features(&self) -> usize;
}

/// Candidate families in selection priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelKind {
    Linear,
    RandomForest,
    GradientBoosting,
}

impl ModelKind {
    /// Earlier entries win R² ties.
    pub const PRIORITY: [ModelKind; 3] = [
        ModelKind::Linear,
        ModelKind::RandomForest,
        ModelKind::GradientBoosting,
    ];

    pub fn key(self) -> &'static str {
        match self {
            ModelKind::Linear => "linear",
            ModelKind::RandomForest => "random_forest",
            ModelKind::GradientBoosting => "gradient_boosting",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            ModelKind::Linear => "LinearRegression",
            ModelKind::RandomForest => "RandomForest",
            ModelKind::GradientBoosting => "GradientBoosting",
        }
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Shared hyperparameters for the candidate families.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EnsembleParams {
    pub n_estimators: usize,
    /// Boosting only.
    pub learning_rate: f64,
    pub max_depth: usize,
    pub seed: u64,
}

impl Default for EnsembleParams {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            learning_rate: 0.1,
            max_depth: 3,
            seed: 42,
        }
    }
}

/// A fitted (or fittable) regressor of one concrete family.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SkillModel {
    Linear(LinearRegression),
    RandomForest(RandomForest),
    GradientBoosting(GradientBoosting),
}

impl SkillModel {
    pub fn new(kind: ModelKind, params: &EnsembleParams) -> Self {
        match kind {
            ModelKind::Linear => SkillModel::Linear(LinearRegression::new()),
            ModelKind::RandomForest => SkillModel::RandomForest(RandomForest::new(
                params.n_estimators,
                params.max_depth,
                params.seed,
            )),
            ModelKind::GradientBoosting => SkillModel::GradientBoosting(GradientBoosting::new(
                params.n_estimators,
                params.learning_rate,
                params.max_depth,
            )),
        }
    }

    pub fn kind(&self) -> ModelKind {
        match self {
            SkillModel::Linear(_) => ModelKind::Linear,
            SkillModel::RandomForest(_) => ModelKind::RandomForest,
            SkillModel::GradientBoosting(_) => ModelKind::GradientBoosting,
        }
    }

    fn inner(&self) -> &dyn Regressor {
        match self {
            SkillModel::Linear(m) => m,
            SkillModel::RandomForest(m) => m,
            SkillModel::GradientBoosting(m) => m,
        }
    }

    fn inner_mut(&mut self) -> &mut dyn Regressor {
        match self {
            SkillModel::Linear(m) => m,
            SkillModel::RandomForest(m) => m,
            SkillModel::GradientBoosting(m) => m,
        }
    }
}

impl Regressor for SkillModel {
    fn fit(&mut self, x: ArrayView2<'_, f64>, y: ArrayView1<'_, f64>) -> Result<()> {
        self.inner_mut().fit(x, y)
    }

    fn predict_row(&self, row: ArrayView1<'_, f64>) -> f64 {
        self.inner().predict_row(row)
    }

    fn feature_contributions(&self) -> Option<Vec<f64>> {
        self.inner().feature_contributions()
    }

    fn n_features(&self) -> usize {
        self.inner().n_features()
    }
}

/// Shape checks shared by every `fit`.
pub(crate) fn check_fit_input(x: &ArrayView2<'_, f64>, y: &ArrayView1<'_, f64>) -> Result<()> {
    use crate::error::PipelineError;
    if x.nrows() == 0 {
        return Err(PipelineError::training("cannot fit on an empty matrix"));
    }
    if x.nrows() != y.len() {
        return Err(PipelineError::training(format!(
            "row mismatch: X has {} rows, y has {}",
            x.nrows(),
            y.len()
        )));
    }
    Ok(())
}

/// Average per-tree normalised importances, then renormalise to sum 1.
pub(crate) fn ensemble_importances<'a>(
    trees: impl Iterator<Item = &'a RegressionTree>,
    n_features: usize,
) -> Vec<f64> {
    let mut total = vec![0.0; n_features];
    let mut count = 0usize;
    for t in trees {
        for (acc, v) in total.iter_mut().zip(t.feature_importances()) {
            *acc += v;
        }
        count += 1;
    }
    let sum: f64 = total.iter().sum();
    if count == 0 || sum <= 0.0 {
        return total;
    }
    total.iter().map(|v| v / sum).collect()
}
