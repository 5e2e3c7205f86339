use crate::numeric::round_dp;
use ndarray::ArrayView1;
use serde::{Deserialize, Serialize};

/// Held-out evaluation of one candidate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModelMetrics {
    /// Coefficient of determination, 4 decimals.
    pub r2_score: f64,
    pub mae: f64,
    pub rmse: f64,
    /// R² × 100, 1 decimal.
    pub accuracy_pct: f64,
    pub samples_tested: usize,
}

/// R² with the constant-target convention: exact fit scores 1, anything else 0.
pub fn r2_score(y_true: ArrayView1<'_, f64>, y_pred: ArrayView1<'_, f64>) -> f64 {
    let mean = y_true.mean().unwrap_or(0.0);
    let ss_res: f64 = y_true
        .iter()
        .zip(y_pred.iter())
        .map(|(t, p)| (t - p).powi(2))
        .sum();
    let ss_tot: f64 = y_true.iter().map(|t| (t - mean).powi(2)).sum();
    if ss_tot == 0.0 {
        return if ss_res == 0.0 { 1.0 } else { 0.0 };
    }
    1.0 - ss_res / ss_tot
}

pub fn mean_absolute_error(y_true: ArrayView1<'_, f64>, y_pred: ArrayView1<'_, f64>) -> f64 {
    if y_true.is_empty() {
        return 0.0;
    }
    y_true
        .iter()
        .zip(y_pred.iter())
        .map(|(t, p)| (t - p).abs())
        .sum::<f64>()
        / y_true.len() as f64
}

pub fn root_mean_squared_error(y_true: ArrayView1<'_, f64>, y_pred: ArrayView1<'_, f64>) -> f64 {
    if y_true.is_empty() {
        return 0.0;
    }
    let mse = y_true
        .iter()
        .zip(y_pred.iter())
        .map(|(t, p)| (t - p).powi(2))
        .sum::<f64>()
        / y_true.len() as f64;
    mse.sqrt()
}

pub fn evaluate(y_true: ArrayView1<'_, f64>, y_pred: ArrayView1<'_, f64>) -> ModelMetrics {
    let r2 = r2_score(y_true, y_pred);
    ModelMetrics {
        r2_score: round_dp(r2, 4),
        mae: round_dp(mean_absolute_error(y_true, y_pred), 2),
        rmse: round_dp(root_mean_squared_error(y_true, y_pred), 2),
        accuracy_pct: round_dp(r2 * 100.0, 1),
        samples_tested: y_true.len(),
    }
}
