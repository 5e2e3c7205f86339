use super::{check_fit_input, ensemble_importances, RegressionTree, Regressor};
use crate::error::Result;
use ndarray::{Array1, ArrayView1, ArrayView2};
use serde::{Deserialize, Serialize};

/// Least-squares gradient boosting: mean start, residual trees scaled by the learning rate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GradientBoosting {
    n_estimators: usize,
    learning_rate: f64,
    max_depth: usize,
    init: f64,
    n_features: usize,
    trees: Vec<RegressionTree>,
}

impl GradientBoosting {
    pub fn new(n_estimators: usize, learning_rate: f64, max_depth: usize) -> Self {
        Self {
            n_estimators: n_estimators.max(1),
            learning_rate,
            max_depth,
            init: 0.0,
            n_features: 0,
            trees: Vec::new(),
        }
    }
}

impl Regressor for GradientBoosting {
    fn fit(&mut self, x: ArrayView2<'_, f64>, y: ArrayView1<'_, f64>) -> Result<()> {
        check_fit_input(&x, &y)?;
        self.n_features = x.ncols();
        self.init = y.mean().unwrap_or(0.0);
        self.trees.clear();

        let mut current = Array1::from_elem(y.len(), self.init);
        for _ in 0..self.n_estimators {
            let residual = &y - &current;
            let mut tree = RegressionTree::new(self.max_depth);
            tree.fit(x, residual.view());
            for (i, row) in x.rows().into_iter().enumerate() {
                current[i] += self.learning_rate * tree.predict_row(row);
            }
            self.trees.push(tree);
        }
        Ok(())
    }

    fn predict_row(&self, row: ArrayView1<'_, f64>) -> f64 {
        self.init
            + self.learning_rate * self.trees.iter().map(|t| t.predict_row(row)).sum::<f64>()
    }

    fn feature_contributions(&self) -> Option<Vec<f64>> {
        if self.trees.is_empty() {
            return None;
        }
        Some(ensemble_importances(self.trees.iter(), self.n_features))
    }

    fn n_features(&self) -> usize {
        self.n_features
    }
}
