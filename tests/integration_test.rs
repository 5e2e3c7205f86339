//! Integration test: healing, end-to-end training, persistence by tag, bounded prediction.

use rand::rngs::StdRng;
use rand::SeedableRng;
use skillgenome::{
    config::EngineConfig,
    data::{self, synthetic::generate_profiles, Dataset, SchemaSpec, Value},
    features::FeatureVector,
    model::Regressor,
    predict::PredictionService,
    registry::ModelRegistry,
    service::{ModelSource, TrainingRequest, TrainingService},
    PipelineError,
};
use std::collections::HashMap;
use std::path::Path;

fn small_config(dir: &Path) -> EngineConfig {
    let mut c = EngineConfig::default();
    c.model_dir = dir.join("models");
    c.dataset_path = dir.join("talent.csv");
    c.training.n_estimators = 15;
    c.training.anomaly_estimators = 30;
    c
}

/// Synthetic profiles without `drop`, all in one non-deprecated domain.
fn profiles_without(n: usize, drop: &str, seed: u64) -> Dataset {
    let full = generate_profiles(n, &mut StdRng::seed_from_u64(seed));
    let mut out = Dataset::with_rows(n);
    for name in full.column_names().filter(|c| *c != drop) {
        let values = if name == "domain" {
            vec![Value::from("Technology"); n]
        } else {
            full.column(name).unwrap_or_default().to_vec()
        };
        out.set_column(name, values);
    }
    out
}

fn signals(pairs: &[(&str, f64)]) -> HashMap<String, f64> {
    pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
}

#[test]
fn config_load_default() {
    let c = EngineConfig::load(Path::new("nonexistent.json"));
    assert_eq!(c.model_tag, "latest");
    assert!(c.validation.auto_heal);
    assert_eq!(c.training.test_fraction, 0.2);
}

#[test]
fn heals_missing_learning_hours() {
    let schema = SchemaSpec::default();
    let table = profiles_without(100, "learning_hours", 3);
    assert!(!table.has_column("learning_hours"));

    let healed = data::validate(&table, &schema, true, &mut StdRng::seed_from_u64(42)).unwrap();
    assert_eq!(healed.n_rows(), 100);
    let (lo, hi) = schema
        .column("learning_hours")
        .and_then(|c| c.generator.bounds())
        .unwrap();
    let col = healed.numeric("learning_hours").unwrap();
    assert_eq!(col.len(), 100);
    assert!(col.iter().all(|v| matches!(v, Some(x) if (lo..=hi).contains(x))));

    let err = data::validate(&table, &schema, false, &mut StdRng::seed_from_u64(42)).unwrap_err();
    assert!(matches!(err, PipelineError::Schema { ref missing } if missing == &["learning_hours".to_string()]));
}

#[test]
fn deprecated_domain_never_survives_validation() {
    let table = generate_profiles(300, &mut StdRng::seed_from_u64(9));
    let out = data::validate(&table, &SchemaSpec::default(), true, &mut StdRng::seed_from_u64(1)).unwrap();
    assert!(out
        .column("domain")
        .unwrap()
        .iter()
        .all(|v| v.as_str() != Some("Healthcare")));
}

#[test]
fn end_to_end_train_then_predict_without_detector() {
    let dir = tempfile::tempdir().unwrap();
    let config = small_config(dir.path());
    generate_profiles(200, &mut StdRng::seed_from_u64(21))
        .write_csv(&config.dataset_path)
        .unwrap();
    let service = TrainingService::new(config);
    let (mut bundle, report) = service
        .run_pipeline(&TrainingRequest::from_config(service.config()))
        .unwrap();
    assert_eq!(report.status, "success");
    assert_eq!(report.all_models.len(), 3);
    let best_r2 = report.all_models.values().cloned().fold(f64::NEG_INFINITY, f64::max);
    assert_eq!(report.best_metrics.r2_score, best_r2);

    bundle.anomaly = None;
    let s = signals(&[("creation_output", 95.0), ("learning_behavior", 90.0), ("learning_hours", 200.0)]);
    let r = PredictionService::predict(Some(&bundle), &s, "Technology");
    assert!(!r.is_anomaly);
    assert_eq!(r.domain, "Technology");

    let v = FeatureVector::from_signals(bundle.feature_names(), &s);
    let raw = bundle.regressor.predict_row(ndarray::ArrayView1::from(v.as_slice()));
    assert!((r.score - raw.clamp(0.0, 100.0)).abs() <= 0.05 + 1e-9);
    assert_eq!(r.confidence, bundle.training_accuracy().clamp(0.0, 100.0));

    assert!(r.top_positive.len() <= 3 && r.top_negative.len() <= 3);
    assert!(r.top_positive.iter().all(|f| f.impact > 0.0));
    assert!(r.top_negative.iter().all(|f| f.impact < 0.0));
    assert!(r.top_positive.windows(2).all(|w| w[0].impact >= w[1].impact));
    assert!(r.top_negative.windows(2).all(|w| w[0].impact >= w[1].impact));
}

#[test]
fn extreme_signals_stay_in_range() {
    let dir = tempfile::tempdir().unwrap();
    let service = TrainingService::new(small_config(dir.path()));
    let table = generate_profiles(150, &mut StdRng::seed_from_u64(8));
    let (bundle, _) = service
        .train_table(&table, &TrainingRequest::from_config(service.config()))
        .unwrap();

    let mut all: HashMap<String, f64> = bundle.feature_names().iter().map(|n| (n.clone(), 1000.0)).collect();
    let r = PredictionService::predict(Some(&bundle), &all, "Technology");
    assert!((0.0..=100.0).contains(&r.score));
    assert!((0.0..=100.0).contains(&r.confidence));

    all.values_mut().for_each(|v| *v = -1000.0);
    let r = PredictionService::predict(Some(&bundle), &all, "Technology");
    assert!((0.0..=100.0).contains(&r.score));
}

#[test]
fn loading_unknown_tag_is_model_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let err = ModelRegistry::new(dir.path()).load("nonexistent-tag").unwrap_err();
    assert!(matches!(err, PipelineError::ModelNotFound { ref tag } if tag == "nonexistent-tag"));
}

#[test]
fn startup_trains_once_then_loads() {
    let dir = tempfile::tempdir().unwrap();
    let config = small_config(dir.path());
    generate_profiles(100, &mut StdRng::seed_from_u64(4))
        .write_csv(&config.dataset_path)
        .unwrap();
    let service = TrainingService::new(config);

    let (fresh, source) = service.startup_load_or_train("v1").unwrap();
    assert_eq!(source, ModelSource::TrainedFresh);
    let (loaded, source) = service.startup_load_or_train("v1").unwrap();
    assert_eq!(source, ModelSource::Disk);
    assert_eq!(loaded.feature_names(), fresh.feature_names());
    assert_eq!(loaded.training_accuracy(), fresh.training_accuracy());
}

#[test]
fn empty_dataset_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("empty.csv");
    std::fs::write(&path, "creation_output,skill_score\n").unwrap();
    assert!(matches!(data::load_csv(&path), Err(PipelineError::EmptyDataset(_))));
    assert!(matches!(
        data::load_csv(&dir.path().join("missing.csv")),
        Err(PipelineError::NotFound(_))
    ));
}
