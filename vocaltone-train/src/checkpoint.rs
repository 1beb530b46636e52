//! Destinations for best-validation-accuracy snapshots

use vocaltone_model::ClassifierWeights;

use crate::error::Result;

/// Receives a snapshot whenever validation accuracy reaches a new best
pub trait CheckpointSink: Send {
    fn save(&mut self, weights: &ClassifierWeights) -> Result<()>;
}

/// Keeps the latest snapshot in memory
#[derive(Debug, Default)]
pub struct MemoryCheckpointSink {
    latest: Option<ClassifierWeights>,
    saves: usize,
}

impl MemoryCheckpointSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn latest(&self) -> Option<&ClassifierWeights> {
        self.latest.as_ref()
    }

    pub fn into_latest(self) -> Option<ClassifierWeights> {
        self.latest
    }

    /// Snapshots received so far
    pub fn saves(&self) -> usize {
        self.saves
    }
}

impl CheckpointSink for MemoryCheckpointSink {
    fn save(&mut self, weights: &ClassifierWeights) -> Result<()> {
        self.latest = Some(weights.clone());
        self.saves += 1;
        Ok(())
    }
}
