//! SkillGenome: skill-score training and prediction pipeline.
//!
//! Modular structure:
//! - [`data`]: Dataset loading, schema validation/healing, imputation, normalization, synthetic profiles
//! - [`features`]: Feature engineering and matrix/vector extraction
//! - [`model`]: Linear, random-forest and boosting regressors; isolation-forest anomaly detector
//! - [`training`]: Reproducible split, candidate comparison, metrics
//! - [`registry`]: Tagged JSON model persistence
//! - [`predict`]: Bounded scoring with explanations and workforce labels
//! - [`service`]: Training runs and the startup load-or-train contract
//! - [`logging`]: Structured JSON logging

pub mod config;
pub mod data;
pub mod error;
pub mod features;
pub mod logging;
pub mod model;
pub mod numeric;
pub mod predict;
pub mod registry;
pub mod service;
pub mod training;

pub use config::EngineConfig;
pub use data::{Dataset, SchemaSpec, Value};
pub use error::{PipelineError, Result};
pub use features::{FeatureMatrix, FeatureVector};
pub use logging::StructuredLogger;
pub use model::{IsolationForest, ModelKind, Regressor, SkillModel};
pub use predict::{PredictionResult, PredictionService};
pub use registry::{ModelRegistry, TrainedModelBundle};
pub use service::{ModelSource, TrainingReport, TrainingRequest, TrainingService};
