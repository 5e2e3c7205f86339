//! Reproducible splitting, candidate comparison and anomaly fitting.

mod metrics;

pub use metrics::{evaluate, mean_absolute_error, r2_score, root_mean_squared_error, ModelMetrics};

use crate::error::{PipelineError, Result};
use crate::model::{EnsembleParams, IsolationForest, ModelKind, Regressor, SkillModel};
use crate::numeric::round_dp;
use indexmap::IndexMap;
use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::Serialize;
use tracing::info;

/// Smallest partition either side of a split may hold.
const MIN_PARTITION_ROWS: usize = 2;

/// Row-level train/test partition.
#[derive(Debug, Clone)]
pub struct SplitData {
    pub x_train: Array2<f64>,
    pub x_test: Array2<f64>,
    pub y_train: Array1<f64>,
    pub y_test: Array1<f64>,
    pub train_indices: Vec<usize>,
    pub test_indices: Vec<usize>,
}

/// Shuffle rows with `seed` and hold out `ceil(test_fraction × n)` of them.
///
/// Same seed, row count and fraction always give the same partition.
pub fn split(
    x: ArrayView2<'_, f64>,
    y: ArrayView1<'_, f64>,
    test_fraction: f64,
    seed: u64,
) -> Result<SplitData> {
    let n = x.nrows();
    if n != y.len() {
        return Err(PipelineError::training(format!(
            "row mismatch: X has {n} rows, y has {}",
            y.len()
        )));
    }
    if !(test_fraction > 0.0 && test_fraction < 1.0) {
        return Err(PipelineError::training(format!(
            "test fraction must be in (0, 1), got {test_fraction}"
        )));
    }
    let n_test = (test_fraction * n as f64).ceil() as usize;
    let n_train = n.saturating_sub(n_test);
    if n_test < MIN_PARTITION_ROWS || n_train < MIN_PARTITION_ROWS {
        return Err(PipelineError::training(format!(
            "{n} rows cannot be split at test fraction {test_fraction} ({n_train} train / {n_test} test)"
        )));
    }

    let mut order: Vec<usize> = (0..n).collect();
    order.shuffle(&mut StdRng::seed_from_u64(seed));
    let (test_indices, train_indices) = order.split_at(n_test);

    info!(train = n_train, test = n_test, seed, "split data");
    Ok(SplitData {
        x_train: x.select(Axis(0), train_indices),
        x_test: x.select(Axis(0), test_indices),
        y_train: y.select(Axis(0), train_indices),
        y_test: y.select(Axis(0), test_indices),
        train_indices: train_indices.to_vec(),
        test_indices: test_indices.to_vec(),
    })
}

/// Outcome of fitting every candidate family.
#[derive(Debug, Clone)]
pub struct Comparison {
    pub best_kind: ModelKind,
    pub best_model: SkillModel,
    pub best_metrics: ModelMetrics,
    /// Candidate key → held-out metrics, in priority order.
    pub all_metrics: IndexMap<String, ModelMetrics>,
    /// Feature name → contribution of the winner (4 decimals).
    pub feature_importances: IndexMap<String, f64>,
}

impl Comparison {
    /// Candidate key → R².
    pub fn all_models(&self) -> IndexMap<String, f64> {
        self.all_metrics
            .iter()
            .map(|(k, m)| (k.clone(), m.r2_score))
            .collect()
    }

    pub fn summary(&self) -> ComparisonSummary<'_> {
        ComparisonSummary {
            best_model_name: self.best_kind.display_name(),
            best_model_key: self.best_kind.key(),
            best_metrics: &self.best_metrics,
            all_metrics: &self.all_metrics,
        }
    }
}

/// Serializable view of a [`Comparison`] without the fitted model.
#[derive(Debug, Serialize)]
pub struct ComparisonSummary<'a> {
    pub best_model_name: &'static str,
    pub best_model_key: &'static str,
    pub best_metrics: &'a ModelMetrics,
    pub all_metrics: &'a IndexMap<String, ModelMetrics>,
}

/// Strictly highest R² wins; equal scores keep the earlier entry.
pub fn select_best(scores: &[(ModelKind, f64)]) -> Option<ModelKind> {
    let mut best: Option<(ModelKind, f64)> = None;
    for &(kind, r2) in scores {
        let r2 = if r2.is_nan() { f64::NEG_INFINITY } else { r2 };
        match best {
            Some((_, top)) if r2 <= top => {}
            _ => best = Some((kind, r2)),
        }
    }
    best.map(|(k, _)| k)
}

/// Fit linear, random-forest and boosting candidates on the train split and
/// keep the one with the best held-out R².
pub fn compare(data: &SplitData, feature_names: &[String], params: &EnsembleParams) -> Result<Comparison> {
    if feature_names.len() != data.x_train.ncols() {
        return Err(PipelineError::training(format!(
            "{} feature names for {} columns",
            feature_names.len(),
            data.x_train.ncols()
        )));
    }

    let mut fitted: Vec<(SkillModel, ModelMetrics)> = Vec::with_capacity(ModelKind::PRIORITY.len());
    for kind in ModelKind::PRIORITY {
        info!(model = %kind, "training candidate");
        let mut model = SkillModel::new(kind, params);
        model.fit(data.x_train.view(), data.y_train.view())?;
        let pred = model.predict(data.x_test.view());
        let metrics = evaluate(data.y_test.view(), pred.view());
        info!(model = %kind, r2 = metrics.r2_score, mae = metrics.mae, rmse = metrics.rmse, "candidate evaluated");
        fitted.push((model, metrics));
    }

    let scores: Vec<(ModelKind, f64)> = fitted.iter().map(|(m, s)| (m.kind(), s.r2_score)).collect();
    let best_kind = select_best(&scores).ok_or_else(|| PipelineError::training("no candidates fitted"))?;

    let all_metrics: IndexMap<String, ModelMetrics> = fitted
        .iter()
        .map(|(m, s)| (m.kind().key().to_string(), *s))
        .collect();
    let (best_model, best_metrics) = fitted
        .into_iter()
        .find(|(m, _)| m.kind() == best_kind)
        .ok_or_else(|| PipelineError::training("selected candidate missing"))?;

    let feature_importances = best_model
        .feature_contributions()
        .map(|c| {
            feature_names
                .iter()
                .cloned()
                .zip(c.into_iter().map(|v| round_dp(v, 4)))
                .collect()
        })
        .unwrap_or_default();

    info!(best = %best_kind, r2 = best_metrics.r2_score, "selected best model");
    Ok(Comparison {
        best_kind,
        best_model,
        best_metrics,
        all_metrics,
        feature_importances,
    })
}

/// Fit the anomaly detector on the full feature matrix.
pub fn fit_anomaly(
    x_full: ArrayView2<'_, f64>,
    contamination: f64,
    n_estimators: usize,
    seed: u64,
) -> Result<IsolationForest> {
    let forest = IsolationForest::fit(x_full, n_estimators, contamination, seed)?;
    info!(rows = x_full.nrows(), contamination, "fitted anomaly detector");
    Ok(forest)
}
