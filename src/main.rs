//! SkillGenome entrypoint.
//!
//! `skillgenome`                              load the configured tag, training it first if absent
//! `skillgenome train`                        train from the configured dataset and save
//! `skillgenome predict <signals.json> [dom]` score one signal mapping
//! `skillgenome generate <rows> <path>`       write a synthetic dataset
//! `skillgenome tags`                         list saved tags

use rand::rngs::StdRng;
use rand::SeedableRng;
use skillgenome::{
    config::EngineConfig,
    data::synthetic::generate_profiles,
    logging::{RecordLine, StructuredLogger},
    predict::PredictionService,
    service::{TrainingRequest, TrainingService},
    PipelineError, TrainedModelBundle,
};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info, warn};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

fn usage() -> BoxError {
    "usage: skillgenome [train | predict <signals.json> [domain] | generate <rows> <path> | tags]".into()
}

/// Train on a dedicated worker so the caller thread stays free.
fn train_in_background(config: EngineConfig) -> Result<TrainedModelBundle, BoxError> {
    let worker = std::thread::Builder::new()
        .name("trainer".into())
        .spawn(move || {
            let service = TrainingService::new(config);
            let request = TrainingRequest::from_config(service.config());
            service.run_pipeline(&request)
        })?;
    let (bundle, report) = worker.join().map_err(|_| "training thread panicked")??;
    StructuredLogger::emit_json(&RecordLine::new("training_report", &report), &mut std::io::stdout())?;
    Ok(bundle)
}

fn load_signals(path: &Path) -> Result<HashMap<String, f64>, BoxError> {
    let data = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&data)?)
}

fn run(config: EngineConfig, args: &[String]) -> Result<(), BoxError> {
    let tag = config.model_tag.clone();
    match args.first().map(String::as_str) {
        None => {
            let service = TrainingService::new(config);
            let (bundle, source) = service.startup_load_or_train(&tag)?;
            info!(%tag, ?source, accuracy = bundle.training_accuracy(), "model ready");
        }
        Some("train") => {
            train_in_background(config)?;
        }
        Some("predict") => {
            let path = args.get(1).ok_or_else(usage)?;
            let domain = args.get(2).map(String::as_str).unwrap_or("General");
            let signals = load_signals(Path::new(path))?;

            let service = TrainingService::new(config);
            let bundle = match service.registry().load(&tag) {
                Ok(b) => Some(Arc::new(b)),
                Err(PipelineError::ModelNotFound { .. }) => {
                    warn!(%tag, "no trained model; using fallback scoring");
                    None
                }
                Err(e) => return Err(e.into()),
            };
            let result = PredictionService::predict(bundle.as_deref(), &signals, domain);
            StructuredLogger::emit_json(&RecordLine::new("prediction", &result).with_tag(&tag), &mut std::io::stdout())?;
        }
        Some("generate") => {
            let rows: usize = args.get(1).ok_or_else(usage)?.parse()?;
            let path = PathBuf::from(args.get(2).ok_or_else(usage)?);
            let mut rng = StdRng::seed_from_u64(config.training.seed);
            generate_profiles(rows, &mut rng).write_csv(&path)?;
            info!(rows, path = %path.display(), "synthetic dataset written");
        }
        Some("tags") => {
            let service = TrainingService::new(config);
            for t in service.registry().list_tags()? {
                println!("{t}");
            }
        }
        Some(_) => return Err(usage()),
    }
    Ok(())
}

fn main() -> Result<(), BoxError> {
    let config_path = std::env::var("SKILLGENOME_CONFIG_PATH")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.json"));
    let config = EngineConfig::load(&config_path);

    StructuredLogger::init(config.log.json, &config.log.level);
    info!(model_dir = ?config.model_dir, tag = %config.model_tag, "SkillGenome starting");

    let args: Vec<String> = std::env::args().skip(1).collect();
    if let Err(e) = run(config, &args) {
        error!(error = %e, "command failed");
        return Err(e);
    }
    Ok(())
}
