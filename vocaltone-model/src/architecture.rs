//! Network topology parameters

use serde::{Deserialize, Serialize};

use crate::error::{ModelError, Result};

/// Hyper-parameters of the CNN-LSTM classifier
///
/// The default is the production topology: three conv blocks
/// (64/128/256 filters, kernels 5/5/3), LSTMs of 128 and 64 units,
/// and a 128 → 64 → 7 dense head.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArchitectureConfig {
    /// Features per time step (cepstral + mel)
    pub input_dim: usize,
    /// Filters of each convolutional block
    pub conv_filters: Vec<usize>,
    /// Kernel size of each convolutional block
    pub conv_kernels: Vec<usize>,
    /// Hidden units of the two recurrent layers
    pub lstm_units: [usize; 2],
    /// Units of the two hidden dense layers
    pub dense_units: [usize; 2],
    /// Dropout after every conv block
    pub conv_dropout: f32,
    /// Dropout after each recurrent layer
    pub lstm_dropout: f32,
    /// Dropout after the first and second dense layers
    pub dense_dropout: [f32; 2],
    /// Output classes
    pub num_classes: usize,
    /// Batch normalization running-average momentum
    pub bn_momentum: f32,
    /// Batch normalization variance epsilon
    pub bn_epsilon: f32,
}

impl Default for ArchitectureConfig {
    fn default() -> Self {
        Self {
            input_dim: 168,
            conv_filters: vec![64, 128, 256],
            conv_kernels: vec![5, 5, 3],
            lstm_units: [128, 64],
            dense_units: [128, 64],
            conv_dropout: 0.3,
            lstm_dropout: 0.3,
            dense_dropout: [0.4, 0.3],
            num_classes: 7,
            bn_momentum: 0.99,
            bn_epsilon: 1e-3,
        }
    }
}

impl ArchitectureConfig {
    /// Set input dimension
    pub fn input_dim(mut self, input_dim: usize) -> Self {
        self.input_dim = input_dim;
        self
    }

    /// Replace the conv stack
    pub fn conv(mut self, filters: Vec<usize>, kernels: Vec<usize>) -> Self {
        self.conv_filters = filters;
        self.conv_kernels = kernels;
        self
    }

    /// Set recurrent layer sizes
    pub fn lstm(mut self, first: usize, second: usize) -> Self {
        self.lstm_units = [first, second];
        self
    }

    /// Set hidden dense layer sizes
    pub fn dense(mut self, first: usize, second: usize) -> Self {
        self.dense_units = [first, second];
        self
    }

    /// Set every dropout rate to the same value (0 disables dropout)
    pub fn uniform_dropout(mut self, rate: f32) -> Self {
        self.conv_dropout = rate;
        self.lstm_dropout = rate;
        self.dense_dropout = [rate, rate];
        self
    }

    /// Shortest input that still has one time step after every pooling stage
    pub fn min_time_steps(&self) -> usize {
        1 << self.conv_filters.len()
    }

    pub fn validate(&self) -> Result<()> {
        if self.input_dim == 0 || self.num_classes < 2 {
            return Err(ModelError::invalid_config(
                "input_dim must be positive and num_classes at least 2",
            ));
        }
        if self.conv_filters.len() != self.conv_kernels.len() {
            return Err(ModelError::invalid_config(format!(
                "{} conv filter sizes but {} kernel sizes",
                self.conv_filters.len(),
                self.conv_kernels.len()
            )));
        }
        if self.conv_filters.contains(&0) || self.conv_kernels.contains(&0) {
            return Err(ModelError::invalid_config("conv filters and kernels must be positive"));
        }
        if self.lstm_units.contains(&0) || self.dense_units.contains(&0) {
            return Err(ModelError::invalid_config("layer sizes must be positive"));
        }
        let rates = [
            self.conv_dropout,
            self.lstm_dropout,
            self.dense_dropout[0],
            self.dense_dropout[1],
        ];
        if rates.iter().any(|r| !(0.0..1.0).contains(r)) {
            return Err(ModelError::invalid_config("dropout rates must be in [0, 1)"));
        }
        if !(0.0..1.0).contains(&self.bn_momentum) || self.bn_epsilon <= 0.0 {
            return Err(ModelError::invalid_config(
                "bn_momentum must be in [0, 1) and bn_epsilon positive",
            ));
        }
        Ok(())
    }
}
