//! Isolation forest: random axis-aligned partitioning; short average paths mean outliers.

use crate::error::{PipelineError, Result};
use crate::numeric::percentile;
use ndarray::{ArrayView1, ArrayView2};
use rand::rngs::StdRng;
use rand::{seq::index, Rng, SeedableRng};
use serde::{Deserialize, Serialize};

const MAX_SAMPLES: usize = 256;
const EULER_GAMMA: f64 = 0.577_215_664_901_532_9;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnomalyVerdict {
    Inlier,
    Outlier,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
enum INode {
    External {
        size: usize,
    },
    Internal {
        feature: usize,
        split: f64,
        left: usize,
        right: usize,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ITree {
    nodes: Vec<INode>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IsolationForest {
    contamination: f64,
    sample_size: usize,
    /// Anomaly score above which a row is an outlier.
    threshold: f64,
    n_features: usize,
    trees: Vec<ITree>,
}

/// Average unsuccessful-search path length in a BST of `n` points.
fn average_path_length(n: usize) -> f64 {
    match n {
        0 | 1 => 0.0,
        2 => 1.0,
        _ => {
            let n = n as f64;
            2.0 * ((n - 1.0).ln() + EULER_GAMMA) - 2.0 * (n - 1.0) / n
        }
    }
}

impl ITree {
    fn build<R: Rng>(x: &ArrayView2<'_, f64>, sample: &mut [usize], height_limit: usize, rng: &mut R) -> Self {
        let mut tree = ITree { nodes: Vec::new() };
        tree.grow(x, sample, 0, height_limit, rng);
        tree
    }

    fn grow<R: Rng>(
        &mut self,
        x: &ArrayView2<'_, f64>,
        rows: &mut [usize],
        depth: usize,
        height_limit: usize,
        rng: &mut R,
    ) -> usize {
        let id = self.nodes.len();
        self.nodes.push(INode::External { size: rows.len() });
        if depth >= height_limit || rows.len() <= 1 {
            return id;
        }

        // features that still vary inside this node
        let ranges: Vec<(usize, f64, f64)> = (0..x.ncols())
            .filter_map(|f| {
                let (lo, hi) = rows.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &i| {
                    (lo.min(x[[i, f]]), hi.max(x[[i, f]]))
                });
                (hi > lo).then_some((f, lo, hi))
            })
            .collect();
        if ranges.is_empty() {
            return id;
        }
        let (feature, lo, hi) = ranges[rng.gen_range(0..ranges.len())];
        // interpolate rather than sample lo..hi: hi - lo may overflow for wide columns
        let t: f64 = rng.gen();
        let split = (lo * (1.0 - t) + hi * t).clamp(lo, hi);

        let mut mid = 0;
        for k in 0..rows.len() {
            if x[[rows[k], feature]] < split {
                rows.swap(mid, k);
                mid += 1;
            }
        }
        let (l, r) = rows.split_at_mut(mid);
        let left = self.grow(x, l, depth + 1, height_limit, rng);
        let right = self.grow(x, r, depth + 1, height_limit, rng);
        self.nodes[id] = INode::Internal {
            feature,
            split,
            left,
            right,
        };
        id
    }

    fn path_length(&self, row: ArrayView1<'_, f64>) -> f64 {
        let mut i = 0;
        let mut depth = 0.0;
        loop {
            match self.nodes.get(i) {
                Some(INode::External { size }) => return depth + average_path_length(*size),
                Some(INode::Internal {
                    feature,
                    split,
                    left,
                    right,
                }) => {
                    i = if row[*feature] < *split { *left } else { *right };
                    depth += 1.0;
                }
                None => return depth,
            }
        }
    }
}

impl IsolationForest {
    /// Fit on every row of `x`. The outlier threshold is the score percentile
    /// that flags a `contamination` share of the training rows.
    pub fn fit(x: ArrayView2<'_, f64>, n_estimators: usize, contamination: f64, seed: u64) -> Result<Self> {
        let n = x.nrows();
        if n < 2 {
            return Err(PipelineError::training(format!(
                "isolation forest needs at least 2 rows, got {n}"
            )));
        }
        if !(contamination > 0.0 && contamination <= 0.5) {
            return Err(PipelineError::training(format!(
                "contamination must be in (0, 0.5], got {contamination}"
            )));
        }
        let sample_size = n.min(MAX_SAMPLES);
        let height_limit = (sample_size as f64).log2().ceil() as usize;
        let mut rng = StdRng::seed_from_u64(seed);

        let trees = (0..n_estimators.max(1))
            .map(|_| {
                let mut sample = index::sample(&mut rng, n, sample_size).into_vec();
                ITree::build(&x, &mut sample, height_limit, &mut rng)
            })
            .collect();

        let mut forest = Self {
            contamination,
            sample_size,
            threshold: f64::INFINITY,
            n_features: x.ncols(),
            trees,
        };
        let scores: Vec<f64> = x.rows().into_iter().map(|r| forest.score(r)).collect();
        forest.threshold = percentile(&scores, 100.0 * (1.0 - contamination)).unwrap_or(f64::INFINITY);
        Ok(forest)
    }

    /// Anomaly score in (0, 1]; higher is more anomalous.
    pub fn score(&self, row: ArrayView1<'_, f64>) -> f64 {
        if self.trees.is_empty() {
            return 0.0;
        }
        let mean_path =
            self.trees.iter().map(|t| t.path_length(row)).sum::<f64>() / self.trees.len() as f64;
        let c = average_path_length(self.sample_size).max(f64::MIN_POSITIVE);
        2f64.powf(-mean_path / c)
    }

    pub fn verdict(&self, row: ArrayView1<'_, f64>) -> AnomalyVerdict {
        if self.score(row) > self.threshold {
            AnomalyVerdict::Outlier
        } else {
            AnomalyVerdict::Inlier
        }
    }

    pub fn contamination(&self) -> f64 {
        self.contamination
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }
}
