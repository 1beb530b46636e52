//! Best-accuracy checkpoints written to disk

use std::path::{Path, PathBuf};

use tracing::info;
use vocaltone_model::ClassifierWeights;
use vocaltone_train::{CheckpointSink, TrainError};

/// File name of the best-validation-accuracy snapshot
pub const BEST_MODEL_FILE: &str = "best_model.json";

/// Overwrites `<dir>/best_model.json` on every improvement
pub struct FileCheckpointSink {
    path: PathBuf,
    saves: usize,
}

impl FileCheckpointSink {
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            path: dir.as_ref().join(BEST_MODEL_FILE),
            saves: 0,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn saves(&self) -> usize {
        self.saves
    }
}

impl CheckpointSink for FileCheckpointSink {
    fn save(&mut self, weights: &ClassifierWeights) -> vocaltone_train::Result<()> {
        weights.save_json(&self.path).map_err(|e| {
            TrainError::checkpoint(format!("{}: {}", self.path.display(), e))
        })?;
        self.saves += 1;
        info!(
            "💾 Checkpoint (epoch {}, val_accuracy {:.4})",
            weights.metadata.epochs_trained, weights.metadata.best_val_accuracy
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use tempfile::TempDir;
    use uuid::Uuid;
    use vocaltone_model::{ArchitectureConfig, EmotionNetwork, LabelSpace, WeightsMetadata};

    fn weights() -> ClassifierWeights {
        let config = ArchitectureConfig::default()
            .input_dim(4)
            .conv(vec![2], vec![3])
            .lstm(2, 2)
            .dense(3, 3);
        let network = EmotionNetwork::new(config, &mut StdRng::seed_from_u64(3)).unwrap();
        ClassifierWeights::new(
            network,
            LabelSpace::standard().clone(),
            WeightsMetadata::new(Uuid::new_v4(), 4, 0.5),
        )
        .unwrap()
    }

    #[test]
    fn test_writes_loadable_snapshot() {
        let dir = TempDir::new().unwrap();
        let mut sink = FileCheckpointSink::new(dir.path());
        sink.save(&weights()).unwrap();
        sink.save(&weights()).unwrap();

        assert_eq!(sink.saves(), 2);
        let loaded = ClassifierWeights::load_json(sink.path()).unwrap();
        assert_eq!(loaded.metadata.epochs_trained, 4);
    }

    #[test]
    fn test_missing_directory_is_a_checkpoint_error() {
        let dir = TempDir::new().unwrap();
        let mut sink = FileCheckpointSink::new(dir.path().join("absent"));
        assert!(matches!(
            sink.save(&weights()),
            Err(TrainError::Checkpoint(_))
        ));
    }
}
