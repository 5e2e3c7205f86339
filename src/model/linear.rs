use super::{check_fit_input, Regressor};
use crate::error::{PipelineError, Result};
use nalgebra::{DMatrix, DVector};
use ndarray::{Array1, ArrayView1, ArrayView2, Axis};
use serde::{Deserialize, Serialize};

/// Ridge added to the standardized normal equations so exactly collinear
/// columns resolve instead of producing a singular system.
const RIDGE: f64 = 1e-8;
const SVD_EPS: f64 = 1e-12;

/// Ordinary least squares with intercept.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LinearRegression {
    coefficients: Vec<f64>,
    intercept: f64,
    fitted: bool,
}

impl LinearRegression {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn coefficients(&self) -> &[f64] {
        &self.coefficients
    }

    pub fn intercept(&self) -> f64 {
        self.intercept
    }
}

impl Regressor for LinearRegression {
    fn fit(&mut self, x: ArrayView2<'_, f64>, y: ArrayView1<'_, f64>) -> Result<()> {
        check_fit_input(&x, &y)?;
        let (n, p) = x.dim();
        let x_mean = x.mean_axis(Axis(0)).unwrap_or_else(|| Array1::zeros(p));
        let y_mean = y.mean().unwrap_or(0.0);

        // centre and scale columns to unit RMS; constant columns get scale 0
        let scale: Vec<f64> = (0..p)
            .map(|j| {
                let ss: f64 = x.column(j).iter().map(|v| (v - x_mean[j]).powi(2)).sum();
                (ss / n as f64).sqrt()
            })
            .collect();
        let design = DMatrix::from_fn(n, p, |i, j| {
            if scale[j] > 0.0 {
                (x[[i, j]] - x_mean[j]) / scale[j]
            } else {
                0.0
            }
        });
        let target = DVector::from_iterator(n, y.iter().map(|v| v - y_mean));

        let beta_std = if p == 0 {
            DVector::zeros(0)
        } else {
            solve_normal_equations(&design, &target)?
        };

        self.coefficients = (0..p)
            .map(|j| if scale[j] > 0.0 { beta_std[j] / scale[j] } else { 0.0 })
            .collect();
        self.intercept = y_mean
            - self
                .coefficients
                .iter()
                .zip(x_mean.iter())
                .map(|(c, m)| c * m)
                .sum::<f64>();
        self.fitted = true;
        Ok(())
    }

    fn predict_row(&self, row: ArrayView1<'_, f64>) -> f64 {
        self.intercept
            + self
                .coefficients
                .iter()
                .zip(row.iter())
                .map(|(c, v)| c * v)
                .sum::<f64>()
    }

    fn feature_contributions(&self) -> Option<Vec<f64>> {
        self.fitted.then(|| self.coefficients.clone())
    }

    fn n_features(&self) -> usize {
        self.coefficients.len()
    }
}

/// Solve `(XᵀX + λnI) β = Xᵀy`. Cholesky first; SVD when the system is not
/// numerically positive definite.
fn solve_normal_equations(design: &DMatrix<f64>, target: &DVector<f64>) -> Result<DVector<f64>> {
    let n = design.nrows() as f64;
    let mut gram = design.tr_mul(design);
    for j in 0..gram.ncols() {
        gram[(j, j)] += RIDGE * n;
    }
    let rhs = design.tr_mul(target);

    if let Some(chol) = gram.clone().cholesky() {
        return Ok(chol.solve(&rhs));
    }
    gram.svd(true, true)
        .solve(&rhs, SVD_EPS)
        .map_err(|e| PipelineError::training(format!("least-squares solve failed: {e}")))
}
