//! Trainer configuration

use serde::{Deserialize, Serialize};
use vocaltone_model::ArchitectureConfig;

use crate::callbacks::DEFAULT_PLATEAU_MIN_DELTA;
use crate::error::{Result, TrainError};

fn default_lr_min_delta() -> f32 {
    DEFAULT_PLATEAU_MIN_DELTA
}

/// Optimization, splitting and convergence-control parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainerConfig {
    /// Seeds the split, the per-epoch shuffles, initialization and dropout
    pub seed: u64,
    pub epochs: usize,
    pub batch_size: usize,
    /// Initial Adam step size
    pub learning_rate: f32,
    /// Share of every class held out for validation
    pub validation_fraction: f32,
    /// Share of every class held out for the final test
    pub test_fraction: f32,
    /// Epochs without validation-loss improvement before stopping
    pub early_stopping_patience: usize,
    /// Epochs without validation-loss improvement before lowering the rate
    pub lr_patience: usize,
    /// Multiplier applied on a plateau
    pub lr_factor: f32,
    /// Floor for the plateau schedule
    pub min_lr: f32,
    /// Smallest validation-loss drop the plateau schedule counts as progress
    #[serde(default = "default_lr_min_delta")]
    pub lr_min_delta: f32,
    pub architecture: ArchitectureConfig,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            epochs: 100,
            batch_size: 32,
            learning_rate: 1e-3,
            validation_fraction: 0.15,
            test_fraction: 0.15,
            early_stopping_patience: 15,
            lr_patience: 5,
            lr_factor: 0.5,
            min_lr: 1e-7,
            lr_min_delta: DEFAULT_PLATEAU_MIN_DELTA,
            architecture: ArchitectureConfig::default(),
        }
    }
}

impl TrainerConfig {
    /// Set RNG seed
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Set number of epochs
    pub fn epochs(mut self, epochs: usize) -> Self {
        self.epochs = epochs;
        self
    }

    /// Set mini-batch size
    pub fn batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Set initial learning rate
    pub fn learning_rate(mut self, learning_rate: f32) -> Self {
        self.learning_rate = learning_rate;
        self
    }

    /// Set both patience values
    pub fn patience(mut self, early_stopping: usize, lr_plateau: usize) -> Self {
        self.early_stopping_patience = early_stopping;
        self.lr_patience = lr_plateau;
        self
    }

    /// Replace the network topology
    pub fn architecture(mut self, architecture: ArchitectureConfig) -> Self {
        self.architecture = architecture;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.epochs == 0 || self.batch_size == 0 {
            return Err(TrainError::invalid_config(
                "epochs and batch_size must be positive",
            ));
        }
        if !(self.learning_rate.is_finite() && self.learning_rate > 0.0) {
            return Err(TrainError::invalid_config("learning_rate must be positive"));
        }
        let (val, test) = (self.validation_fraction, self.test_fraction);
        if !(val > 0.0 && test > 0.0 && val + test < 1.0) {
            return Err(TrainError::invalid_config(format!(
                "validation ({}) and test ({}) fractions must be positive and leave room for training",
                val, test
            )));
        }
        if self.early_stopping_patience == 0 || self.lr_patience == 0 {
            return Err(TrainError::invalid_config("patience values must be positive"));
        }
        if !(self.lr_factor > 0.0 && self.lr_factor < 1.0) {
            return Err(TrainError::invalid_config("lr_factor must be in (0, 1)"));
        }
        if !(self.min_lr >= 0.0 && self.min_lr <= self.learning_rate) {
            return Err(TrainError::invalid_config(
                "min_lr must be non-negative and at most learning_rate",
            ));
        }
        if !(self.lr_min_delta.is_finite() && self.lr_min_delta >= 0.0) {
            return Err(TrainError::invalid_config("lr_min_delta must be non-negative"));
        }
        self.architecture.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = TrainerConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.seed, 42);
        assert_eq!(config.early_stopping_patience, 15);
        assert_eq!(config.lr_patience, 5);
        assert_eq!(config.lr_min_delta, 1e-4);
    }

    #[test]
    fn test_invalid_configs() {
        assert!(TrainerConfig::default().epochs(0).validate().is_err());
        assert!(TrainerConfig::default().batch_size(0).validate().is_err());
        assert!(TrainerConfig::default().learning_rate(0.0).validate().is_err());

        let mut config = TrainerConfig::default();
        config.validation_fraction = 0.5;
        config.test_fraction = 0.5;
        assert!(config.validate().is_err());

        let mut config = TrainerConfig::default();
        config.lr_min_delta = -1e-4;
        assert!(config.validate().is_err());

        let config = TrainerConfig::default()
            .architecture(ArchitectureConfig::default().uniform_dropout(1.5));
        assert!(matches!(config.validate(), Err(TrainError::Model(_))));
    }
}
