//! Serializable snapshot of a trained classifier

use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::emotion::LabelSpace;
use crate::error::{ModelError, Result};
use crate::network::EmotionNetwork;

/// Provenance of a weight snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightsMetadata {
    /// Training run that produced the weights
    pub run_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub epochs_trained: usize,
    pub best_val_accuracy: f32,
}

impl WeightsMetadata {
    pub fn new(run_id: Uuid, epochs_trained: usize, best_val_accuracy: f32) -> Self {
        Self {
            run_id,
            created_at: Utc::now(),
            epochs_trained,
            best_val_accuracy,
        }
    }
}

/// Learned parameters plus the label space they were trained against
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifierWeights {
    pub metadata: WeightsMetadata,
    labels: LabelSpace,
    network: EmotionNetwork,
}

impl ClassifierWeights {
    /// Bundle a network with its labels, checking the output width matches
    pub fn new(network: EmotionNetwork, labels: LabelSpace, metadata: WeightsMetadata) -> Result<Self> {
        let classes = network.config().num_classes;
        if classes != labels.len() {
            return Err(ModelError::label_mismatch(format!(
                "network has {} outputs but {} labels",
                classes,
                labels.len()
            )));
        }
        Ok(Self {
            metadata,
            labels,
            network,
        })
    }

    pub fn labels(&self) -> &LabelSpace {
        &self.labels
    }

    pub fn network(&self) -> &EmotionNetwork {
        &self.network
    }

    pub fn into_network(self) -> EmotionNetwork {
        self.network
    }

    /// Features per time step the network expects
    pub fn input_dim(&self) -> usize {
        self.network.config().input_dim
    }

    /// Shape and label consistency of a deserialized snapshot
    pub fn validate(&self) -> Result<()> {
        self.network.validate_shapes()?;
        if self.network.config().num_classes != self.labels.len() {
            return Err(ModelError::label_mismatch(format!(
                "network has {} outputs but {} labels",
                self.network.config().num_classes,
                self.labels.len()
            )));
        }
        Ok(())
    }

    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let json = serde_json::to_string(self)?;
        fs::write(path, json)?;
        info!(
            "Saved weights {} ({} parameters) to {}",
            self.metadata.run_id,
            self.network.num_parameters(),
            path.display()
        );
        Ok(())
    }

    pub fn load_json<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let json = fs::read_to_string(path)?;
        let weights: Self = serde_json::from_str(&json)?;
        weights.validate()?;
        info!(
            "Loaded weights {} from {} (epochs: {}, best val accuracy: {:.3})",
            weights.metadata.run_id,
            path.display(),
            weights.metadata.epochs_trained,
            weights.metadata.best_val_accuracy
        );
        Ok(weights)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::architecture::ArchitectureConfig;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use tempfile::TempDir;

    fn tiny_weights() -> ClassifierWeights {
        let config = ArchitectureConfig::default()
            .input_dim(4)
            .conv(vec![3], vec![3])
            .lstm(3, 2)
            .dense(4, 4);
        let network = EmotionNetwork::new(config, &mut StdRng::seed_from_u64(0)).unwrap();
        ClassifierWeights::new(
            network,
            LabelSpace::standard().clone(),
            WeightsMetadata::new(Uuid::new_v4(), 3, 0.5),
        )
        .unwrap()
    }

    #[test]
    fn test_json_file_roundtrip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("emotion_model.json");
        let weights = tiny_weights();

        weights.save_json(&path).unwrap();
        let loaded = ClassifierWeights::load_json(&path).unwrap();
        assert_eq!(loaded.metadata, weights.metadata);
        assert_eq!(loaded.labels(), weights.labels());
        assert_eq!(loaded.input_dim(), 4);
    }

    #[test]
    fn test_output_width_must_match_labels() {
        let config = ArchitectureConfig::default()
            .input_dim(4)
            .conv(vec![3], vec![3])
            .lstm(3, 2)
            .dense(4, 4);
        let mut config = config;
        config.num_classes = 6;
        let network = EmotionNetwork::new(config, &mut StdRng::seed_from_u64(0)).unwrap();
        let result = ClassifierWeights::new(
            network,
            LabelSpace::standard().clone(),
            WeightsMetadata::new(Uuid::new_v4(), 0, 0.0),
        );
        assert!(matches!(result, Err(ModelError::LabelMismatch(_))));
    }

    #[test]
    fn test_load_rejects_tampered_shapes() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tampered.json");

        let mut value = serde_json::to_value(tiny_weights()).unwrap();
        value["network"]["config"]["input_dim"] = serde_json::json!(5);
        fs::write(&path, value.to_string()).unwrap();

        assert!(matches!(
            ClassifierWeights::load_json(&path),
            Err(ModelError::ShapeMismatch(_))
        ));
    }

    #[test]
    fn test_load_missing_file() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            ClassifierWeights::load_json(dir.path().join("absent.json")),
            Err(ModelError::Io(_))
        ));
    }
}
