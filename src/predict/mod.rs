//! Per-request scoring against a loaded bundle: bounded score, confidence,
//! anomaly flag, labels and a feature-impact explanation.
//!
//! Stateless; many predictions may share one `&TrainedModelBundle`.

mod assessment;
mod explain;

pub use assessment::{ConfidenceLevel, Grade, SkillLevel, WorkforceAssessment, GROWTH_SIGNAL};
pub use explain::{explain, Explanation, FeatureImpact};

use crate::data::schema::FEATURE_COLUMNS;
use crate::features::FeatureVector;
use crate::model::{AnomalyVerdict, Regressor};
use crate::numeric::{mean, round_dp};
use crate::registry::TrainedModelBundle;
use ndarray::ArrayView1;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, warn};

/// Confidence used when no regressor is available.
pub const FALLBACK_CONFIDENCE: f64 = 50.0;
const ANOMALY_PENALTY: f64 = 20.0;
const ANOMALY_FLOOR: f64 = 30.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trust {
    pub confidence_level: ConfidenceLevel,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    /// In [0, 100], 1 dp.
    pub score: f64,
    pub level: SkillLevel,
    /// In [0, 100], 1 dp.
    pub confidence: f64,
    pub is_anomaly: bool,
    pub domain: String,
    pub workforce_assessment: WorkforceAssessment,
    pub trust: Trust,
    pub top_positive: Vec<FeatureImpact>,
    pub top_negative: Vec<FeatureImpact>,
}

pub struct PredictionService;

impl PredictionService {
    /// Score one signal mapping. `bundle = None` (nothing trained yet) falls
    /// back to the mean of the base signals with fixed confidence.
    pub fn predict(
        bundle: Option<&TrainedModelBundle>,
        signals: &HashMap<String, f64>,
        domain: &str,
    ) -> PredictionResult {
        let default_names: Vec<String>;
        let names: &[String] = match bundle {
            Some(b) => b.feature_names(),
            None => {
                default_names = FEATURE_COLUMNS.iter().map(|s| s.to_string()).collect();
                &default_names
            }
        };
        let vector = FeatureVector::from_signals(names, signals);
        let row = ArrayView1::from(vector.as_slice());

        let regressor = bundle.filter(|b| {
            let width = b.regressor.n_features();
            if width != vector.len() {
                warn!(expected = width, got = vector.len(), "feature width mismatch; using fallback score");
                return false;
            }
            true
        });

        let mut explanation = Explanation::default();
        let (score, mut confidence) = match regressor {
            Some(b) => {
                let raw = b.regressor.predict_row(row);
                if let Some(weights) = b.regressor.feature_contributions() {
                    explanation = explain(&vector, &weights);
                }
                let score = if raw.is_nan() { 0.0 } else { raw.clamp(0.0, 100.0) };
                (score, b.training_accuracy())
            }
            None => {
                let score = mean(vector.as_slice()).unwrap_or(0.0).clamp(0.0, 100.0);
                (score, FALLBACK_CONFIDENCE)
            }
        };

        let is_anomaly = bundle
            .and_then(|b| b.anomaly.as_ref())
            .filter(|d| d.n_features() == vector.len())
            .is_some_and(|d| d.verdict(row) == AnomalyVerdict::Outlier);
        if is_anomaly {
            confidence = (confidence - ANOMALY_PENALTY).max(ANOMALY_FLOOR);
        }
        // labels read the unrounded values; only the reported numbers are rounded
        let confidence = confidence.clamp(0.0, 100.0);

        let learning_behavior = signals
            .get(GROWTH_SIGNAL)
            .copied()
            .filter(|v| v.is_finite())
            .unwrap_or(0.0);

        debug!(score, confidence, is_anomaly, domain, "prediction");
        PredictionResult {
            score: round_dp(score, 1),
            level: SkillLevel::from_score(score),
            confidence: round_dp(confidence, 1),
            is_anomaly,
            domain: domain.to_string(),
            workforce_assessment: WorkforceAssessment::new(score, learning_behavior),
            trust: Trust {
                confidence_level: ConfidenceLevel::from_confidence(confidence),
            },
            top_positive: explanation.top_positive,
            top_negative: explanation.top_negative,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{IsolationForest, LinearRegression, SkillModel};
    use crate::registry::BundleMetadata;
    use crate::training::ModelMetrics;
    use ndarray::{Array1, Array2};

    fn names() -> Vec<String> {
        vec!["a".into(), "b".into()]
    }

    fn linear_bundle(accuracy: f64) -> TrainedModelBundle {
        // y = 0.5a + 0.5b
        let x = Array2::from_shape_fn((20, 2), |(i, j)| ((i * 7 + j * 13) % 100) as f64);
        let y: Array1<f64> = x.rows().into_iter().map(|r| 0.5 * r[0] + 0.5 * r[1]).collect();
        let mut lr = LinearRegression::new();
        lr.fit(x.view(), y.view()).unwrap();
        TrainedModelBundle {
            regressor: SkillModel::Linear(lr),
            anomaly: None,
            metadata: BundleMetadata {
                features: names(),
                metrics: Some(ModelMetrics {
                    r2_score: accuracy / 100.0,
                    mae: 1.0,
                    rmse: 1.0,
                    accuracy_pct: accuracy,
                    samples_tested: 4,
                }),
                ..BundleMetadata::default()
            },
        }
    }

    fn signals(pairs: &[(&str, f64)]) -> HashMap<String, f64> {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn scores_with_regressor_and_explains() {
        let b = linear_bundle(87.5);
        let r = PredictionService::predict(Some(&b), &signals(&[("a", 90.0), ("b", 30.0)]), "Finance");
        assert!((r.score - 60.0).abs() < 0.2);
        assert_eq!(r.confidence, 87.5);
        assert!(!r.is_anomaly);
        assert_eq!(r.domain, "Finance");
        assert_eq!(r.top_positive[0].feature, "a");
        assert_eq!(r.top_negative[0].feature, "b");
        assert_eq!(r.trust.confidence_level, ConfidenceLevel::Medium);
    }

    #[test]
    fn labels_use_unrounded_score() {
        let b = linear_bundle(80.0);
        let r = PredictionService::predict(Some(&b), &signals(&[("a", 80.04), ("b", 80.04)]), "x");
        assert_eq!(r.score, 80.0);
        assert_eq!(r.level, SkillLevel::Expert);
        assert_eq!(r.workforce_assessment.risk_level, Grade::Low);

        let r = PredictionService::predict(Some(&b), &signals(&[("a", 75.03), ("b", 75.03)]), "x");
        assert_eq!(r.score, 75.0);
        assert_eq!(r.workforce_assessment.work_capacity, Grade::High);
    }

    #[test]
    fn confidence_label_uses_unrounded_confidence() {
        let b = linear_bundle(50.04);
        let r = PredictionService::predict(Some(&b), &HashMap::new(), "x");
        assert_eq!(r.confidence, 50.0);
        assert_eq!(r.trust.confidence_level, ConfidenceLevel::Medium);
    }

    #[test]
    fn extreme_signals_clip() {
        let b = linear_bundle(80.0);
        let hi = PredictionService::predict(Some(&b), &signals(&[("a", 1000.0), ("b", 1000.0)]), "x");
        assert_eq!(hi.score, 100.0);
        assert_eq!(hi.level, SkillLevel::Expert);
        let lo = PredictionService::predict(Some(&b), &signals(&[("a", -1000.0), ("b", -1000.0)]), "x");
        assert_eq!(lo.score, 0.0);
    }

    #[test]
    fn missing_signals_default_to_midpoint() {
        let b = linear_bundle(80.0);
        let r = PredictionService::predict(Some(&b), &HashMap::new(), "x");
        assert!((r.score - 50.0).abs() < 0.2);
        assert!(r.top_positive.is_empty() && r.top_negative.is_empty());
        assert_eq!(r.workforce_assessment.growth_potential, Grade::Low);
    }

    #[test]
    fn no_bundle_uses_mean_and_fixed_confidence() {
        let s = signals(&[("creation_output", 95.0), ("learning_behavior", 90.0)]);
        let r = PredictionService::predict(None, &s, "Technology");
        // 95 + 90 + 8 × 50 over 10 features
        assert_eq!(r.score, 58.5);
        assert_eq!(r.confidence, FALLBACK_CONFIDENCE);
        assert_eq!(r.trust.confidence_level, ConfidenceLevel::Low);
        assert_eq!(r.workforce_assessment.growth_potential, Grade::High);
        assert!(r.top_positive.is_empty());
    }

    fn detector() -> IsolationForest {
        use rand::rngs::StdRng;
        use rand::{Rng, SeedableRng};
        let mut rng = StdRng::seed_from_u64(11);
        let mut x = Array2::from_shape_fn((200, 2), |_| rng.gen_range(45.0..65.0));
        x[[199, 0]] = 500.0;
        x[[199, 1]] = -300.0;
        IsolationForest::fit(x.view(), 100, 0.03, 42).unwrap()
    }

    #[test]
    fn anomaly_lowers_confidence_to_floor() {
        let outlier = signals(&[("a", 500.0), ("b", -300.0)]);
        let mut b = linear_bundle(45.0);
        b.anomaly = Some(detector());
        let r = PredictionService::predict(Some(&b), &outlier, "x");
        assert!(r.is_anomaly);
        assert_eq!(r.confidence, 30.0);

        b.metadata.metrics.as_mut().unwrap().accuracy_pct = 90.0;
        let r = PredictionService::predict(Some(&b), &outlier, "x");
        assert_eq!(r.confidence, 70.0);

        let r = PredictionService::predict(Some(&b), &signals(&[("a", 55.0), ("b", 55.0)]), "x");
        assert!(!r.is_anomaly);
        assert_eq!(r.confidence, 90.0);
    }

    #[test]
    fn width_mismatch_falls_back() {
        let mut b = linear_bundle(90.0);
        b.metadata.features = vec!["a".into()];
        let r = PredictionService::predict(Some(&b), &signals(&[("a", 70.0)]), "x");
        assert_eq!(r.score, 70.0);
        assert_eq!(r.confidence, FALLBACK_CONFIDENCE);
    }

    #[test]
    fn bundle_is_shared_across_threads() {
        let b = std::sync::Arc::new(linear_bundle(80.0));
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let b = b.clone();
                std::thread::spawn(move || {
                    let s = signals(&[("a", 10.0 * i as f64), ("b", 50.0)]);
                    PredictionService::predict(Some(&b), &s, "x").score
                })
            })
            .collect();
        for h in handles {
            let score = h.join().unwrap();
            assert!((0.0..=100.0).contains(&score));
        }
    }
}
