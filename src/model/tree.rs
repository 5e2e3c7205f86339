//! CART regression tree: variance-reduction splits, depth-limited.

use ndarray::{ArrayView1, ArrayView2};
use serde::{Deserialize, Serialize};

/// Gains at or below this are treated as no improvement.
const MIN_GAIN: f64 = 1e-12;

#[derive(Debug, Clone, Serialize, Deserialize)]
enum Node {
    Leaf {
        value: f64,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegressionTree {
    max_depth: usize,
    nodes: Vec<Node>,
    /// Raw weighted impurity decrease per feature.
    impurity_decrease: Vec<f64>,
}

struct BestSplit {
    feature: usize,
    threshold: f64,
    gain: f64,
}

impl RegressionTree {
    pub fn new(max_depth: usize) -> Self {
        Self {
            max_depth,
            nodes: Vec::new(),
            impurity_decrease: Vec::new(),
        }
    }

    /// Fit on the rows listed in `indices` (duplicates allowed, as in bootstrap samples).
    pub fn fit_indices(&mut self, x: ArrayView2<'_, f64>, y: ArrayView1<'_, f64>, indices: &[usize]) {
        self.nodes.clear();
        self.impurity_decrease = vec![0.0; x.ncols()];
        let mut idx = indices.to_vec();
        self.grow(&x, &y, &mut idx, 0);
    }

    pub fn fit(&mut self, x: ArrayView2<'_, f64>, y: ArrayView1<'_, f64>) {
        let all: Vec<usize> = (0..x.nrows()).collect();
        self.fit_indices(x, y, &all);
    }

    pub fn predict_row(&self, row: ArrayView1<'_, f64>) -> f64 {
        let mut i = 0;
        loop {
            match self.nodes.get(i) {
                Some(Node::Leaf { value }) => return *value,
                Some(Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                }) => {
                    i = if row[*feature] <= *threshold { *left } else { *right };
                }
                None => return 0.0,
            }
        }
    }

    /// Impurity importances normalised to sum 1 (all zeros for a stump).
    pub fn feature_importances(&self) -> Vec<f64> {
        let sum: f64 = self.impurity_decrease.iter().sum();
        if sum <= 0.0 {
            return vec![0.0; self.impurity_decrease.len()];
        }
        self.impurity_decrease.iter().map(|v| v / sum).collect()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    fn grow(&mut self, x: &ArrayView2<'_, f64>, y: &ArrayView1<'_, f64>, idx: &mut [usize], depth: usize) -> usize {
        let n = idx.len() as f64;
        let (sum, sum_sq) = idx
            .iter()
            .fold((0.0, 0.0), |(s, q), &i| (s + y[i], q + y[i] * y[i]));
        let mean = if idx.is_empty() { 0.0 } else { sum / n };
        let sse = (sum_sq - sum * sum / n.max(1.0)).max(0.0);

        let id = self.nodes.len();
        self.nodes.push(Node::Leaf { value: mean });

        if depth >= self.max_depth || idx.len() < 2 || sse <= MIN_GAIN {
            return id;
        }
        let Some(best) = best_split(x, y, idx, sse) else {
            return id;
        };

        self.impurity_decrease[best.feature] += best.gain;
        let mid = partition(idx, |i| x[[i, best.feature]] <= best.threshold);
        let (l_idx, r_idx) = idx.split_at_mut(mid);
        let left = self.grow(x, y, l_idx, depth + 1);
        let right = self.grow(x, y, r_idx, depth + 1);
        self.nodes[id] = Node::Split {
            feature: best.feature,
            threshold: best.threshold,
            left,
            right,
        };
        id
    }
}

/// Best variance-reduction split over all features; first feature wins ties.
fn best_split(x: &ArrayView2<'_, f64>, y: &ArrayView1<'_, f64>, idx: &[usize], sse: f64) -> Option<BestSplit> {
    let m = idx.len();
    let total: f64 = idx.iter().map(|&i| y[i]).sum();
    let total_sq: f64 = idx.iter().map(|&i| y[i] * y[i]).sum();
    let mut best: Option<BestSplit> = None;
    let mut order = idx.to_vec();

    for f in 0..x.ncols() {
        order.sort_by(|&a, &b| x[[a, f]].total_cmp(&x[[b, f]]));
        let (mut ls, mut lq) = (0.0, 0.0);
        for k in 1..m {
            let prev = order[k - 1];
            ls += y[prev];
            lq += y[prev] * y[prev];
            let (a, b) = (x[[prev, f]], x[[order[k], f]]);
            if a >= b {
                continue;
            }
            let nl = k as f64;
            let nr = (m - k) as f64;
            let sse_l = lq - ls * ls / nl;
            let sse_r = (total_sq - lq) - (total - ls) * (total - ls) / nr;
            let gain = sse - sse_l - sse_r;
            if gain > MIN_GAIN && best.as_ref().map_or(true, |b| gain > b.gain) {
                let mut threshold = (a + b) / 2.0;
                if threshold >= b {
                    threshold = a;
                }
                best = Some(BestSplit {
                    feature: f,
                    threshold,
                    gain,
                });
            }
        }
    }
    best
}

/// Reorder so rows satisfying `left` come first; returns the boundary.
fn partition(idx: &mut [usize], left: impl Fn(usize) -> bool) -> usize {
    let mut mid = 0;
    for k in 0..idx.len() {
        if left(idx[k]) {
            idx.swap(mid, k);
            mid += 1;
        }
    }
    mid
}
