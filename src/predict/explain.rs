//! Signed per-feature impacts around the neutral midpoint.

use crate::features::{FeatureVector, NEUTRAL_SIGNAL};
use crate::numeric::round_dp;
use serde::{Deserialize, Serialize};

const TOP_N: usize = 3;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureImpact {
    pub feature: String,
    pub value: f64,
    pub impact: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Explanation {
    /// Largest positive impact first.
    pub top_positive: Vec<FeatureImpact>,
    /// Trailing slice of the ranking; most negative last.
    pub top_negative: Vec<FeatureImpact>,
}

/// Rank `weight × (value − 50)` over the vector. Mismatched lengths yield
/// an empty explanation.
pub fn explain(vector: &FeatureVector, weights: &[f64]) -> Explanation {
    if weights.len() != vector.len() {
        return Explanation::default();
    }
    let mut ranked: Vec<FeatureImpact> = vector
        .names
        .iter()
        .zip(&vector.values)
        .zip(weights)
        .map(|((name, &value), &w)| FeatureImpact {
            feature: name.clone(),
            value: round_dp(value, 2),
            impact: round_dp(w * (value - NEUTRAL_SIGNAL), 2),
        })
        .filter(|f| f.impact.is_finite())
        .collect();
    ranked.sort_by(|a, b| b.impact.total_cmp(&a.impact));

    let top_positive = ranked
        .iter()
        .filter(|f| f.impact > 0.0)
        .take(TOP_N)
        .cloned()
        .collect();
    let negatives: Vec<&FeatureImpact> = ranked.iter().filter(|f| f.impact < 0.0).collect();
    let top_negative = negatives[negatives.len().saturating_sub(TOP_N)..]
        .iter()
        .map(|f| (*f).clone())
        .collect();
    Explanation {
        top_positive,
        top_negative,
    }
}
