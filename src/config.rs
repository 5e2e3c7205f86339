//! Engine configuration. Loaded once at startup; every field has a default.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Directory holding persisted model artifacts
    pub model_dir: PathBuf,
    /// CSV dataset used when no saved model exists
    pub dataset_path: PathBuf,
    /// Tag loaded at startup and written by `train`
    pub model_tag: String,
    /// Split, candidate and anomaly-detector parameters
    pub training: TrainingConfig,
    /// Schema validation behaviour
    pub validation: ValidationConfig,
    /// Logging
    pub log: LogConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    /// Fraction of rows held out for evaluation (0, 1)
    pub test_fraction: f64,
    /// Trees per ensemble candidate
    pub n_estimators: usize,
    /// Shrinkage for gradient boosting
    pub learning_rate: f64,
    pub max_depth: usize,
    /// Seed for splitting, bagging, healing and isolation trees
    pub seed: u64,
    /// Expected outlier fraction for the isolation forest
    pub contamination: f64,
    pub anomaly_estimators: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    /// Fill missing required columns synthetically instead of failing
    pub auto_heal: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub level: String,
    pub json: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            model_dir: PathBuf::from("models/saved"),
            dataset_path: PathBuf::from("data/synthetic_talent_data.csv"),
            model_tag: "latest".to_string(),
            training: TrainingConfig::default(),
            validation: ValidationConfig::default(),
            log: LogConfig::default(),
        }
    }
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            test_fraction: 0.2,
            n_estimators: 100,
            learning_rate: 0.1,
            max_depth: 3,
            seed: 42,
            contamination: 0.03,
            anomaly_estimators: 100,
        }
    }
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self { auto_heal: true }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: true,
        }
    }
}

impl EngineConfig {
    /// Load from JSON file if present; otherwise return default
    pub fn load(path: &std::path::Path) -> Self {
        if path.exists() {
            match std::fs::read_to_string(path).map(|data| serde_json::from_str::<EngineConfig>(&data)) {
                Ok(Ok(c)) => return c,
                Ok(Err(e)) => tracing::warn!(path = %path.display(), error = %e, "invalid config; using defaults"),
                Err(e) => tracing::warn!(path = %path.display(), error = %e, "unreadable config; using defaults"),
            }
        }
        Self::default()
    }
}
