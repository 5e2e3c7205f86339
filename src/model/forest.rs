use super::{check_fit_input, ensemble_importances, RegressionTree, Regressor};
use crate::error::Result;
use ndarray::{ArrayView1, ArrayView2};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// Bagged regression trees; prediction is the mean over trees.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RandomForest {
    n_estimators: usize,
    max_depth: usize,
    seed: u64,
    n_features: usize,
    trees: Vec<RegressionTree>,
}

impl RandomForest {
    pub fn new(n_estimators: usize, max_depth: usize, seed: u64) -> Self {
        Self {
            n_estimators: n_estimators.max(1),
            max_depth,
            seed,
            n_features: 0,
            trees: Vec::new(),
        }
    }
}

impl Regressor for RandomForest {
    fn fit(&mut self, x: ArrayView2<'_, f64>, y: ArrayView1<'_, f64>) -> Result<()> {
        check_fit_input(&x, &y)?;
        let n = x.nrows();
        let mut rng = StdRng::seed_from_u64(self.seed);
        self.n_features = x.ncols();
        self.trees = (0..self.n_estimators)
            .map(|_| {
                let sample: Vec<usize> = (0..n).map(|_| rng.gen_range(0..n)).collect();
                let mut tree = RegressionTree::new(self.max_depth);
                tree.fit_indices(x, y, &sample);
                tree
            })
            .collect();
        Ok(())
    }

    fn predict_row(&self, row: ArrayView1<'_, f64>) -> f64 {
        if self.trees.is_empty() {
            return 0.0;
        }
        self.trees.iter().map(|t| t.predict_row(row)).sum::<f64>() / self.trees.len() as f64
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

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{Array1, Array2};

    fn step_data() -> (Array2<f64>, Array1<f64>) {
        let x = Array2::from_shape_fn((40, 2), |(i, j)| if j == 0 { i as f64 } else { (i % 3) as f64 });
        let y = Array1::from_shape_fn(40, |i| if i < 20 { 10.0 } else { 30.0 });
        (x, y)
    }

    #[test]
    fn same_seed_same_predictions() {
        let (x, y) = step_data();
        let mut a = RandomForest::new(10, 3, 7);
        let mut b = RandomForest::new(10, 3, 7);
        a.fit(x.view(), y.view()).unwrap();
        b.fit(x.view(), y.view()).unwrap();
        assert_eq!(a.predict(x.view()), b.predict(x.view()));
    }

    #[test]
    fn learns_step_and_ranks_feature() {
        let (x, y) = step_data();
        let mut f = RandomForest::new(25, 3, 1);
        f.fit(x.view(), y.view()).unwrap();
        let p = f.predict(x.view());
        assert!(p[0] < 15.0 && p[39] > 25.0);
        let imp = f.feature_contributions().unwrap();
        assert!(imp[0] > imp[1]);
        assert!((imp.iter().sum::<f64>() - 1.0).abs() < 1e-9);
    }
}
