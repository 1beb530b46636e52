//! Per-epoch training record

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpochRecord {
    /// 1-based
    pub epoch: usize,
    pub loss: f32,
    pub accuracy: f32,
    pub val_loss: f32,
    pub val_accuracy: f32,
    /// Rate in effect during the epoch
    pub learning_rate: f32,
}

/// Metrics of every completed epoch, in order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrainingHistory {
    pub epochs: Vec<EpochRecord>,
}

impl TrainingHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, record: EpochRecord) {
        self.epochs.push(record);
    }

    pub fn len(&self) -> usize {
        self.epochs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.epochs.is_empty()
    }

    pub fn last(&self) -> Option<&EpochRecord> {
        self.epochs.last()
    }

    /// Highest validation accuracy of any epoch
    pub fn best_val_accuracy(&self) -> Option<f32> {
        self.epochs
            .iter()
            .map(|r| r.val_accuracy)
            .fold(None, |best, a| Some(best.map_or(a, |b: f32| b.max(a))))
    }

    /// Epoch with the lowest validation loss
    pub fn best_val_loss_epoch(&self) -> Option<&EpochRecord> {
        self.epochs
            .iter()
            .min_by(|a, b| a.val_loss.total_cmp(&b.val_loss))
    }

    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    pub fn load_json<P: AsRef<Path>>(path: P) -> Result<Self> {
        let json = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn record(epoch: usize, val_loss: f32, val_accuracy: f32) -> EpochRecord {
        EpochRecord {
            epoch,
            loss: 1.0,
            accuracy: 0.5,
            val_loss,
            val_accuracy,
            learning_rate: 1e-3,
        }
    }

    #[test]
    fn test_best_epochs() {
        let mut history = TrainingHistory::new();
        assert_eq!(history.best_val_accuracy(), None);

        history.push(record(1, 1.2, 0.3));
        history.push(record(2, 0.8, 0.6));
        history.push(record(3, 0.9, 0.7));

        assert_eq!(history.best_val_accuracy(), Some(0.7));
        assert_eq!(history.best_val_loss_epoch().map(|r| r.epoch), Some(2));
        assert_eq!(history.last().map(|r| r.epoch), Some(3));
    }

    #[test]
    fn test_json_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("training_history.json");
        let mut history = TrainingHistory::new();
        history.push(record(1, 1.0, 0.25));

        history.save_json(&path).unwrap();
        assert_eq!(TrainingHistory::load_json(&path).unwrap(), history);
    }
}
