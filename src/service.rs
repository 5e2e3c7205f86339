//! Training orchestration and the startup load-or-train contract.

use crate::config::EngineConfig;
use crate::data::{self, Dataset, SchemaSpec};
use crate::error::Result;
use crate::features;
use crate::model::EnsembleParams;
use crate::numeric::round_dp;
use crate::registry::{BundleMetadata, ModelRegistry, SaveReceipt, TrainedModelBundle};
use crate::training::{self, ModelMetrics};
use chrono::Utc;
use indexmap::IndexMap;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use std::path::PathBuf;
use std::time::Instant;
use tracing::{info, warn};

/// Inputs of one training run.
#[derive(Debug, Clone)]
pub struct TrainingRequest {
    pub dataset_path: PathBuf,
    pub test_fraction: f64,
    pub params: EnsembleParams,
    /// Registry tag the bundle is saved under.
    pub tag: String,
}

impl TrainingRequest {
    pub fn from_config(config: &EngineConfig) -> Self {
        let t = &config.training;
        Self {
            dataset_path: config.dataset_path.clone(),
            test_fraction: t.test_fraction,
            params: EnsembleParams {
                n_estimators: t.n_estimators,
                learning_rate: t.learning_rate,
                max_depth: t.max_depth,
                seed: t.seed,
            },
            tag: config.model_tag.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DataInfo {
    pub samples: usize,
    pub features: usize,
    pub train_size: usize,
    pub test_size: usize,
}

/// Result record of a training run.
#[derive(Debug, Clone, Serialize)]
pub struct TrainingReport {
    pub run_id: String,
    pub status: &'static str,
    pub trained_at: String,
    pub best_model_name: String,
    pub best_metrics: ModelMetrics,
    /// Candidate key → R².
    pub all_models: IndexMap<String, f64>,
    pub all_metrics: IndexMap<String, ModelMetrics>,
    pub feature_importances: IndexMap<String, f64>,
    pub feature_names: Vec<String>,
    pub data_info: DataInfo,
    pub elapsed_seconds: f64,
    pub save_info: SaveReceipt,
}

/// Where the startup bundle came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelSource {
    Disk,
    TrainedFresh,
}

pub struct TrainingService {
    config: EngineConfig,
    schema: SchemaSpec,
    registry: ModelRegistry,
}

impl TrainingService {
    pub fn new(config: EngineConfig) -> Self {
        let registry = ModelRegistry::new(config.model_dir.clone());
        Self {
            config,
            schema: SchemaSpec::default(),
            registry,
        }
    }

    pub fn with_schema(mut self, schema: SchemaSpec) -> Self {
        self.schema = schema;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn registry(&self) -> &ModelRegistry {
        &self.registry
    }

    /// Load the dataset named in `request`, then train and save.
    pub fn run_pipeline(&self, request: &TrainingRequest) -> Result<(TrainedModelBundle, TrainingReport)> {
        let table = data::load_csv(&request.dataset_path)?;
        self.train_table(&table, request)
    }

    /// Validate → impute → engineer → split → compare → anomaly fit → save.
    pub fn train_table(
        &self,
        raw: &Dataset,
        request: &TrainingRequest,
    ) -> Result<(TrainedModelBundle, TrainingReport)> {
        let started = Instant::now();
        let run_id = uuid::Uuid::new_v4().to_string();
        let seed = request.params.seed;
        info!(%run_id, rows = raw.n_rows(), tag = %request.tag, "training run started");

        let mut heal_rng = StdRng::seed_from_u64(seed);
        let table = data::validate(raw, &self.schema, self.config.validation.auto_heal, &mut heal_rng)?;
        let table = data::impute(&table, &self.schema);
        let table = features::engineer(&table);
        let matrix = features::feature_matrix(&table);

        let split = training::split(matrix.x.view(), matrix.y.view(), request.test_fraction, seed)?;
        let comparison = training::compare(&split, &matrix.names, &request.params)?;
        let anomaly = training::fit_anomaly(
            matrix.x.view(),
            self.config.training.contamination,
            self.config.training.anomaly_estimators,
            seed,
        )?;

        let bundle = TrainedModelBundle {
            regressor: comparison.best_model.clone(),
            anomaly: Some(anomaly),
            metadata: BundleMetadata {
                features: matrix.names.clone(),
                best_model: Some(comparison.best_kind.display_name().to_string()),
                metrics: Some(comparison.best_metrics),
                feature_importances: comparison.feature_importances.clone(),
                samples: matrix.n_rows(),
                saved_at: None,
                tag: Some(request.tag.clone()),
            },
        };
        let save_info = self.registry.save(&bundle, &request.tag)?;

        let report = TrainingReport {
            run_id,
            status: "success",
            trained_at: Utc::now().to_rfc3339(),
            best_model_name: comparison.best_kind.display_name().to_string(),
            best_metrics: comparison.best_metrics,
            all_models: comparison.all_models(),
            all_metrics: comparison.all_metrics,
            feature_importances: comparison.feature_importances,
            feature_names: matrix.names,
            data_info: DataInfo {
                samples: table.n_rows(),
                features: bundle.metadata.features.len(),
                train_size: split.train_indices.len(),
                test_size: split.test_indices.len(),
            },
            elapsed_seconds: round_dp(started.elapsed().as_secs_f64(), 2),
            save_info,
        };
        info!(
            run_id = %report.run_id,
            best = %report.best_model_name,
            accuracy = report.best_metrics.accuracy_pct,
            elapsed = report.elapsed_seconds,
            "training run complete"
        );
        Ok((bundle, report))
    }

    /// Load `tag` from the registry; train from the configured dataset only
    /// when no model exists under it. Other load failures propagate.
    pub fn startup_load_or_train(&self, tag: &str) -> Result<(TrainedModelBundle, ModelSource)> {
        match self.registry.load(tag) {
            Ok(bundle) => Ok((bundle, ModelSource::Disk)),
            Err(e) if e.is_model_not_found() => {
                warn!(tag, "no saved model; training fresh");
                let request = TrainingRequest {
                    tag: tag.to_string(),
                    ..TrainingRequest::from_config(&self.config)
                };
                let (bundle, _) = self.run_pipeline(&request)?;
                Ok((bundle, ModelSource::TrainedFresh))
            }
            Err(e) => Err(e),
        }
    }
}
