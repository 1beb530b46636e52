//! The `train` job: corpus → trainer → artifacts on disk

use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use tracing::info;
use vocaltone_model::LabelSpace;
use vocaltone_train::{SaveeLoader, Trainer, TrainerConfig, TrainingOutcome};

use crate::checkpoint::FileCheckpointSink;

pub const MODEL_FILE: &str = "emotion_model.json";
pub const LABELS_FILE: &str = "labels.json";
pub const HISTORY_FILE: &str = "training_history.json";

/// Where to read the corpus, where to write artifacts, and how to train
#[derive(Debug, Clone)]
pub struct TrainingJob {
    pub data_dir: PathBuf,
    pub output_dir: PathBuf,
    pub trainer: TrainerConfig,
}

impl TrainingJob {
    pub fn model_path(&self) -> PathBuf {
        self.output_dir.join(MODEL_FILE)
    }

    pub fn labels_path(&self) -> PathBuf {
        self.output_dir.join(LABELS_FILE)
    }

    pub fn history_path(&self) -> PathBuf {
        self.output_dir.join(HISTORY_FILE)
    }
}

/// Run a blocking training job, honoring `stop` between batches
///
/// An interrupted run still writes its artifacts; `best_model.json` holds the
/// best-accuracy checkpoint reached so far.
pub fn run_training(job: &TrainingJob, stop: Arc<AtomicBool>) -> Result<TrainingOutcome> {
    std::fs::create_dir_all(&job.output_dir).with_context(|| {
        format!("Failed to create output directory {}", job.output_dir.display())
    })?;

    let corpus = SaveeLoader::default()
        .load(&job.data_dir)
        .with_context(|| format!("Failed to load dataset from {}", job.data_dir.display()))?;
    if corpus.samples.is_empty() {
        bail!("No labeled audio files found in {}", job.data_dir.display());
    }

    let labels = LabelSpace::standard().clone();
    let trainer = Trainer::new(job.trainer.clone(), labels.clone())
        .context("Invalid training configuration")?
        .with_stop_flag(stop);
    let mut sink = FileCheckpointSink::new(&job.output_dir);
    let outcome = trainer
        .train_with_sink(corpus.samples, &mut sink)
        .context("Training failed")?;

    write_artifacts(job, &labels, &outcome)?;
    info!(
        "✓ Training finished: {} epochs, test accuracy {:.4}{}",
        outcome.history.len(),
        outcome.test_report.accuracy,
        if outcome.interrupted { " (interrupted)" } else { "" }
    );
    Ok(outcome)
}

fn write_artifacts(job: &TrainingJob, labels: &LabelSpace, outcome: &TrainingOutcome) -> Result<()> {
    save(&job.model_path(), |p| outcome.weights.save_json(p).map_err(Into::into))?;
    save(&job.labels_path(), |p| labels.save_json(p).map_err(Into::into))?;
    save(&job.history_path(), |p| outcome.history.save_json(p).map_err(Into::into))?;
    Ok(())
}

fn save(path: &Path, write: impl FnOnce(&Path) -> Result<()>) -> Result<()> {
    write(path).with_context(|| format!("Failed to write {}", path.display()))?;
    info!("Saved {}", path.display());
    Ok(())
}
