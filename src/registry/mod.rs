//! Versioned model persistence: one regressor artifact, an optional anomaly
//! artifact and a metadata record per tag, stored as JSON files.
//!
//! Writes are three independent files and are not transactional; a crash
//! mid-save can leave a tag with a new regressor and stale metadata. One
//! writer per tag is assumed.

use crate::data::schema::FEATURE_COLUMNS;
use crate::error::{PipelineError, Result};
use crate::model::{IsolationForest, SkillModel};
use crate::numeric::round_dp;
use crate::training::ModelMetrics;
use chrono::Utc;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use walkdir::WalkDir;

const SKILL_PREFIX: &str = "skill_model_";
const ANOMALY_PREFIX: &str = "anomaly_model_";
const METADATA_PREFIX: &str = "metadata_";
const EXT: &str = ".json";

/// Descriptive record stored next to a regressor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BundleMetadata {
    /// Feature order the regressor expects.
    pub features: Vec<String>,
    pub best_model: Option<String>,
    pub metrics: Option<ModelMetrics>,
    pub feature_importances: IndexMap<String, f64>,
    /// Rows in the validated training table.
    pub samples: usize,
    pub saved_at: Option<String>,
    pub tag: Option<String>,
}

impl Default for BundleMetadata {
    fn default() -> Self {
        Self {
            features: FEATURE_COLUMNS.iter().map(|s| s.to_string()).collect(),
            best_model: None,
            metrics: None,
            feature_importances: IndexMap::new(),
            samples: 0,
            saved_at: None,
            tag: None,
        }
    }
}

/// Regressor, optional anomaly detector and metadata from one training run.
#[derive(Debug, Clone)]
pub struct TrainedModelBundle {
    pub regressor: SkillModel,
    pub anomaly: Option<IsolationForest>,
    pub metadata: BundleMetadata,
}

impl TrainedModelBundle {
    /// Held-out accuracy percentage recorded at training time (0 if unknown).
    pub fn training_accuracy(&self) -> f64 {
        self.metadata.metrics.map_or(0.0, |m| m.accuracy_pct)
    }

    pub fn feature_names(&self) -> &[String] {
        &self.metadata.features
    }
}

/// What `save` wrote.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaveReceipt {
    pub tag: String,
    pub saved_at: String,
    pub skill_model_path: PathBuf,
    pub skill_model_size_kb: f64,
    pub skill_model_sha256: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub anomaly_model_path: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub anomaly_model_size_kb: Option<f64>,
    pub metadata_path: PathBuf,
}

pub struct ModelRegistry {
    dir: PathBuf,
}

fn size_kb(bytes: usize) -> f64 {
    round_dp(bytes as f64 / 1024.0, 1)
}

fn validate_tag(tag: &str) -> Result<()> {
    let ok = !tag.is_empty()
        && tag
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
        && tag != "."
        && tag != "..";
    if ok {
        Ok(())
    } else {
        Err(PipelineError::InvalidTag(tag.to_string()))
    }
}

impl ModelRegistry {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn artifact(&self, prefix: &str, tag: &str) -> PathBuf {
        self.dir.join(format!("{prefix}{tag}{EXT}"))
    }

    /// Write all artifacts for `tag`, replacing whatever was there.
    pub fn save(&self, bundle: &TrainedModelBundle, tag: &str) -> Result<SaveReceipt> {
        validate_tag(tag)?;
        std::fs::create_dir_all(&self.dir)?;
        let saved_at = Utc::now().to_rfc3339();

        let skill_path = self.artifact(SKILL_PREFIX, tag);
        let skill_bytes = serde_json::to_vec(&bundle.regressor)?;
        std::fs::write(&skill_path, &skill_bytes)?;
        let digest = format!("{:x}", Sha256::digest(&skill_bytes));

        let anomaly_path = self.artifact(ANOMALY_PREFIX, tag);
        let (anomaly_model_path, anomaly_model_size_kb) = match &bundle.anomaly {
            Some(detector) => {
                let bytes = serde_json::to_vec(detector)?;
                std::fs::write(&anomaly_path, &bytes)?;
                (Some(anomaly_path), Some(size_kb(bytes.len())))
            }
            None => {
                if anomaly_path.exists() {
                    std::fs::remove_file(&anomaly_path)?;
                }
                (None, None)
            }
        };

        let metadata_path = self.artifact(METADATA_PREFIX, tag);
        let metadata = BundleMetadata {
            saved_at: Some(saved_at.clone()),
            tag: Some(tag.to_string()),
            ..bundle.metadata.clone()
        };
        std::fs::write(&metadata_path, serde_json::to_vec_pretty(&metadata)?)?;

        let receipt = SaveReceipt {
            tag: tag.to_string(),
            saved_at,
            skill_model_path: skill_path,
            skill_model_size_kb: size_kb(skill_bytes.len()),
            skill_model_sha256: digest,
            anomaly_model_path,
            anomaly_model_size_kb,
            metadata_path,
        };
        info!(tag, size_kb = receipt.skill_model_size_kb, "models saved");
        Ok(receipt)
    }

    /// Load the bundle under `tag`. Only the regressor is mandatory.
    pub fn load(&self, tag: &str) -> Result<TrainedModelBundle> {
        validate_tag(tag)?;
        let skill_path = self.artifact(SKILL_PREFIX, tag);
        if !skill_path.exists() {
            return Err(PipelineError::ModelNotFound { tag: tag.to_string() });
        }
        let regressor: SkillModel = serde_json::from_slice(&std::fs::read(&skill_path)?)?;

        let anomaly_path = self.artifact(ANOMALY_PREFIX, tag);
        let anomaly = if anomaly_path.exists() {
            Some(serde_json::from_slice(&std::fs::read(&anomaly_path)?)?)
        } else {
            None
        };

        let metadata_path = self.artifact(METADATA_PREFIX, tag);
        let metadata = if metadata_path.exists() {
            serde_json::from_slice(&std::fs::read(&metadata_path)?)?
        } else {
            warn!(tag, "metadata missing; using defaults");
            BundleMetadata::default()
        };

        info!(tag, model = %regressor.kind(), anomaly = anomaly.is_some(), "models loaded");
        Ok(TrainedModelBundle {
            regressor,
            anomaly,
            metadata,
        })
    }

    /// Tags that have a regressor artifact, sorted.
    pub fn list_tags(&self) -> Result<BTreeSet<String>> {
        if !self.dir.exists() {
            return Ok(BTreeSet::new());
        }
        let mut tags = BTreeSet::new();
        for entry in WalkDir::new(&self.dir).min_depth(1).max_depth(1) {
            let entry = entry.map_err(std::io::Error::from)?;
            if !entry.file_type().is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy();
            if let Some(tag) = name
                .strip_prefix(SKILL_PREFIX)
                .and_then(|rest| rest.strip_suffix(EXT))
            {
                if validate_tag(tag).is_ok() {
                    tags.insert(tag.to_string());
                }
            }
        }
        Ok(tags)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{LinearRegression, Regressor};
    use ndarray::array;

    fn bundle(with_anomaly: bool) -> TrainedModelBundle {
        let x = array![[1.0, 0.0], [2.0, 1.0], [3.0, 0.0], [4.0, 1.0]];
        let y = array![10.0, 21.0, 30.0, 41.0];
        let mut lr = LinearRegression::new();
        lr.fit(x.view(), y.view()).unwrap();
        let anomaly = with_anomaly.then(|| IsolationForest::fit(x.view(), 10, 0.1, 0).unwrap());
        TrainedModelBundle {
            regressor: SkillModel::Linear(lr),
            anomaly,
            metadata: BundleMetadata {
                features: vec!["a".into(), "b".into()],
                samples: 4,
                ..BundleMetadata::default()
            },
        }
    }

    #[test]
    fn save_and_load_by_tag() {
        let dir = tempfile::tempdir().unwrap();
        let reg = ModelRegistry::new(dir.path());
        let receipt = reg.save(&bundle(true), "v1").unwrap();
        assert_eq!(receipt.skill_model_sha256.len(), 64);
        assert!(receipt.anomaly_model_path.is_some());
        let anomaly_bytes = std::fs::metadata(dir.path().join("anomaly_model_v1.json")).unwrap().len();
        assert_eq!(receipt.anomaly_model_size_kb, Some(size_kb(anomaly_bytes as usize)));

        let loaded = reg.load("v1").unwrap();
        assert!(loaded.anomaly.is_some());
        assert_eq!(loaded.metadata.tag.as_deref(), Some("v1"));
        assert_eq!(loaded.feature_names(), ["a".to_string(), "b".to_string()]);
        let row = array![2.0, 1.0];
        let original = bundle(true).regressor.predict_row(row.view());
        assert!((loaded.regressor.predict_row(row.view()) - original).abs() < 1e-9);
    }

    #[test]
    fn missing_tag_is_model_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = ModelRegistry::new(dir.path()).load("nonexistent-tag").unwrap_err();
        assert!(err.is_model_not_found());
    }

    #[test]
    fn optional_artifacts_load_as_absent() {
        let dir = tempfile::tempdir().unwrap();
        let reg = ModelRegistry::new(dir.path());
        reg.save(&bundle(false), "bare").unwrap();
        std::fs::remove_file(dir.path().join("metadata_bare.json")).unwrap();
        let loaded = reg.load("bare").unwrap();
        assert!(loaded.anomaly.is_none());
        assert_eq!(loaded.metadata, BundleMetadata::default());
        assert_eq!(loaded.training_accuracy(), 0.0);
    }

    #[test]
    fn resave_without_detector_drops_stale_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let reg = ModelRegistry::new(dir.path());
        reg.save(&bundle(true), "v1").unwrap();
        let receipt = reg.save(&bundle(false), "v1").unwrap();
        assert_eq!(receipt.anomaly_model_size_kb, None);
        assert!(reg.load("v1").unwrap().anomaly.is_none());
    }

    #[test]
    fn lists_sorted_tags_and_rejects_bad_ones() {
        let dir = tempfile::tempdir().unwrap();
        let reg = ModelRegistry::new(dir.path());
        for tag in ["v2", "latest", "v1"] {
            reg.save(&bundle(false), tag).unwrap();
        }
        let tags: Vec<String> = reg.list_tags().unwrap().into_iter().collect();
        assert_eq!(tags, vec!["latest", "v1", "v2"]);
        assert!(matches!(reg.save(&bundle(false), "../x"), Err(PipelineError::InvalidTag(_))));
        assert!(ModelRegistry::new(dir.path().join("nope")).list_tags().unwrap().is_empty());
    }
}
