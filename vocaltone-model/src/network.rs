//! CNN-LSTM emotion network
//!
//! ```text
//! (B, T, 168)
//!   ├─> [Conv1d → ReLU → BatchNorm → MaxPool(2) → Dropout] × 3
//!   ├─> LSTM(128, sequences) → Dropout
//!   ├─> LSTM(64, last state) → Dropout
//!   ├─> Dense(128) → ReLU → BatchNorm → Dropout(0.4)
//!   ├─> Dense(64) → ReLU → Dropout(0.3)
//!   └─> Dense(7) → softmax
//! ```

use ndarray::{Array, Array2, Array3, ArrayViewD, ArrayViewMutD, Axis, Dimension, Ix2, Ix3};
use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};

use crate::architecture::ArchitectureConfig;
use crate::error::{ModelError, Result};
use crate::layers::activation::{relu, relu_backward, softmax, softmax_cross_entropy_backward};
use crate::layers::dropout::{dropout_backward, dropout_forward};
use crate::layers::pool::{max_pool_backward, max_pool_forward};
use crate::layers::{
    BatchNorm, BatchNormCache, BatchNormGrads, Conv1d, Conv1dCache, Conv1dGrads, Dense,
    DenseGrads, Lstm, LstmCache, LstmGrads, MaxPoolCache,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct ConvBlock {
    conv: Conv1d,
    norm: BatchNorm,
}

/// All trainable and running parameters of the classifier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmotionNetwork {
    config: ArchitectureConfig,
    conv_blocks: Vec<ConvBlock>,
    lstm_seq: Lstm,
    lstm_last: Lstm,
    hidden: Dense,
    hidden_norm: BatchNorm,
    bottleneck: Dense,
    output: Dense,
}

#[derive(Debug, Clone)]
struct ConvBlockCache {
    conv: Conv1dCache,
    activated: Array3<f32>,
    norm: BatchNormCache<Ix3>,
    pool: MaxPoolCache,
    mask: Option<Array3<f32>>,
}

/// Intermediate values of a training-mode forward pass
#[derive(Debug, Clone)]
pub struct ForwardCache {
    conv: Vec<ConvBlockCache>,
    lstm_seq: LstmCache,
    lstm_seq_mask: Option<Array3<f32>>,
    lstm_last: LstmCache,
    lstm_steps: usize,
    lstm_last_mask: Option<Array2<f32>>,
    hidden_input: Array2<f32>,
    hidden_activated: Array2<f32>,
    hidden_norm: BatchNormCache<Ix2>,
    hidden_mask: Option<Array2<f32>>,
    bottleneck_input: Array2<f32>,
    bottleneck_activated: Array2<f32>,
    bottleneck_mask: Option<Array2<f32>>,
    output_input: Array2<f32>,
    probabilities: Array2<f32>,
}

/// Output of [`EmotionNetwork::forward`]
#[derive(Debug, Clone)]
pub struct ForwardPass {
    /// (batch, classes), rows sum to 1
    pub probabilities: Array2<f32>,
    /// Present only for training-mode passes
    pub cache: Option<ForwardCache>,
}

#[derive(Debug, Clone)]
struct ConvBlockGrads {
    conv: Conv1dGrads,
    norm: BatchNormGrads,
}

/// Loss gradients for every trainable parameter
#[derive(Debug, Clone)]
pub struct NetworkGradients {
    conv: Vec<ConvBlockGrads>,
    lstm_seq: LstmGrads,
    lstm_last: LstmGrads,
    hidden: DenseGrads,
    hidden_norm: BatchNormGrads,
    bottleneck: DenseGrads,
    output: DenseGrads,
}

impl NetworkGradients {
    /// Gradient tensors in the order of [`EmotionNetwork::parameters_mut`]
    pub fn tensors(&self) -> Vec<ArrayViewD<'_, f32>> {
        let mut tensors = Vec::new();
        for block in &self.conv {
            tensors.extend(block.conv.tensors());
            tensors.extend(block.norm.tensors());
        }
        tensors.extend(self.lstm_seq.tensors());
        tensors.extend(self.lstm_last.tensors());
        tensors.extend(self.hidden.tensors());
        tensors.extend(self.hidden_norm.tensors());
        tensors.extend(self.bottleneck.tensors());
        tensors.extend(self.output.tensors());
        tensors
    }
}

fn maybe_dropout<D: Dimension>(
    x: Array<f32, D>,
    rate: f32,
    rng: &mut Option<&mut dyn RngCore>,
) -> (Array<f32, D>, Option<Array<f32, D>>) {
    match rng.as_deref_mut() {
        Some(rng) => dropout_forward(x, rate, rng),
        None => (x, None),
    }
}

impl EmotionNetwork {
    /// Build a freshly initialized network
    pub fn new<R: Rng + ?Sized>(config: ArchitectureConfig, rng: &mut R) -> Result<Self> {
        config.validate()?;
        let (momentum, epsilon) = (config.bn_momentum, config.bn_epsilon);

        let mut channels = config.input_dim;
        let mut conv_blocks = Vec::with_capacity(config.conv_filters.len());
        for (&filters, &kernel) in config.conv_filters.iter().zip(&config.conv_kernels) {
            conv_blocks.push(ConvBlock {
                conv: Conv1d::new(channels, filters, kernel, rng),
                norm: BatchNorm::new(filters, momentum, epsilon),
            });
            channels = filters;
        }

        let [seq_units, last_units] = config.lstm_units;
        let [hidden_units, bottleneck_units] = config.dense_units;

        let lstm_seq = Lstm::new(channels, seq_units, rng);
        let lstm_last = Lstm::new(seq_units, last_units, rng);
        let hidden = Dense::new(last_units, hidden_units, rng);
        let hidden_norm = BatchNorm::new(hidden_units, momentum, epsilon);
        let bottleneck = Dense::new(hidden_units, bottleneck_units, rng);
        let output = Dense::new(bottleneck_units, config.num_classes, rng);

        Ok(Self {
            config,
            conv_blocks,
            lstm_seq,
            lstm_last,
            hidden,
            hidden_norm,
            bottleneck,
            output,
        })
    }

    pub fn config(&self) -> &ArchitectureConfig {
        &self.config
    }

    /// Forward pass over a (batch, time, features) tensor
    ///
    /// With `training` false, dropout is the identity, batch normalization
    /// uses running statistics and `rng` is never touched. With `training`
    /// true the returned pass carries the cache `backward` needs.
    pub fn forward<R: RngCore>(
        &self,
        x: &Array3<f32>,
        training: bool,
        rng: &mut R,
    ) -> Result<ForwardPass> {
        if training {
            self.run(x, Some(rng as &mut dyn RngCore))
        } else {
            self.run(x, None)
        }
    }

    /// Inference-mode class probabilities, shape (batch, classes)
    pub fn infer(&self, x: &Array3<f32>) -> Result<Array2<f32>> {
        Ok(self.run(x, None)?.probabilities)
    }

    fn run(&self, x: &Array3<f32>, mut rng: Option<&mut dyn RngCore>) -> Result<ForwardPass> {
        self.check_input(x)?;
        let training = rng.is_some();
        let config = &self.config;

        let mut conv_caches = Vec::with_capacity(self.conv_blocks.len());
        let mut seq = x.to_owned();
        for block in &self.conv_blocks {
            let (conv_out, conv_cache) = block.conv.forward(&seq);
            let activated = relu(conv_out);
            let (normed, norm_cache) = if training {
                let (y, cache) = block.norm.forward_train(&activated);
                (y, Some(cache))
            } else {
                (block.norm.forward_infer(&activated), None)
            };
            let (pooled, pool_cache) = max_pool_forward(&normed);
            let (dropped, mask) = maybe_dropout(pooled, config.conv_dropout, &mut rng);

            if let Some(norm) = norm_cache {
                conv_caches.push(ConvBlockCache {
                    conv: conv_cache,
                    activated,
                    norm,
                    pool: pool_cache,
                    mask,
                });
            }
            seq = dropped;
        }

        let (seq_out, lstm_seq_cache) = self.lstm_seq.forward(&seq);
        let (seq_out, lstm_seq_mask) = maybe_dropout(seq_out, config.lstm_dropout, &mut rng);

        let (last_seq, lstm_last_cache) = self.lstm_last.forward(&seq_out);
        let lstm_steps = last_seq.len_of(Axis(1));
        let last = last_seq.index_axis(Axis(1), lstm_steps - 1).to_owned();
        let (hidden_input, lstm_last_mask) = maybe_dropout(last, config.lstm_dropout, &mut rng);

        let hidden_activated = relu(self.hidden.forward(&hidden_input));
        let (hidden_normed, hidden_norm_cache) = if training {
            let (y, cache) = self.hidden_norm.forward_train(&hidden_activated);
            (y, Some(cache))
        } else {
            (self.hidden_norm.forward_infer(&hidden_activated), None)
        };
        let (bottleneck_input, hidden_mask) =
            maybe_dropout(hidden_normed, config.dense_dropout[0], &mut rng);

        let bottleneck_activated = relu(self.bottleneck.forward(&bottleneck_input));
        let (output_input, bottleneck_mask) = maybe_dropout(
            bottleneck_activated.clone(),
            config.dense_dropout[1],
            &mut rng,
        );

        let probabilities = softmax(&self.output.forward(&output_input));

        let cache = hidden_norm_cache.map(|hidden_norm| ForwardCache {
            conv: conv_caches,
            lstm_seq: lstm_seq_cache,
            lstm_seq_mask,
            lstm_last: lstm_last_cache,
            lstm_steps,
            lstm_last_mask,
            hidden_input,
            hidden_activated,
            hidden_norm,
            hidden_mask,
            bottleneck_input,
            bottleneck_activated,
            bottleneck_mask,
            output_input,
            probabilities: probabilities.clone(),
        });

        Ok(ForwardPass {
            probabilities,
            cache,
        })
    }

    /// Gradients of mean sparse categorical cross-entropy against `labels`
    pub fn backward(&self, cache: &ForwardCache, labels: &[usize]) -> Result<NetworkGradients> {
        let batch = cache.probabilities.nrows();
        if labels.len() != batch {
            return Err(ModelError::shape_mismatch(format!(
                "{} labels for a batch of {}",
                labels.len(),
                batch
            )));
        }
        if let Some(&bad) = labels.iter().find(|&&l| l >= self.config.num_classes) {
            return Err(ModelError::shape_mismatch(format!(
                "label {} outside {} classes",
                bad, self.config.num_classes
            )));
        }

        let d_logits = softmax_cross_entropy_backward(&cache.probabilities, labels);

        let (d, output) = self.output.backward(&cache.output_input, &d_logits);
        let d = dropout_backward(d, cache.bottleneck_mask.as_ref());
        let d = relu_backward(&d, &cache.bottleneck_activated);

        let (d, bottleneck) = self.bottleneck.backward(&cache.bottleneck_input, &d);
        let d = dropout_backward(d, cache.hidden_mask.as_ref());
        let (d, hidden_norm) = self.hidden_norm.backward(&cache.hidden_norm, &d);
        let d = relu_backward(&d, &cache.hidden_activated);
        let (d, hidden) = self.hidden.backward(&cache.hidden_input, &d);

        let d = dropout_backward(d, cache.lstm_last_mask.as_ref());
        let mut d_last_seq = Array3::zeros((batch, cache.lstm_steps, self.lstm_last.units()));
        d_last_seq
            .index_axis_mut(Axis(1), cache.lstm_steps - 1)
            .assign(&d);
        let (d, lstm_last) = self.lstm_last.backward(&cache.lstm_last, &d_last_seq);

        let d = dropout_backward(d, cache.lstm_seq_mask.as_ref());
        let (mut d, lstm_seq) = self.lstm_seq.backward(&cache.lstm_seq, &d);

        let mut conv = Vec::with_capacity(self.conv_blocks.len());
        for (block, block_cache) in self.conv_blocks.iter().zip(&cache.conv).rev() {
            let g = dropout_backward(d, block_cache.mask.as_ref());
            let g = max_pool_backward(&block_cache.pool, &g);
            let (g, norm) = block.norm.backward(&block_cache.norm, &g);
            let g = relu_backward(&g, &block_cache.activated);
            let (g, conv_grads) = block.conv.backward(&block_cache.conv, &g);
            conv.push(ConvBlockGrads {
                conv: conv_grads,
                norm,
            });
            d = g;
        }
        conv.reverse();

        Ok(NetworkGradients {
            conv,
            lstm_seq,
            lstm_last,
            hidden,
            hidden_norm,
            bottleneck,
            output,
        })
    }

    /// Fold the batch statistics of a training pass into the running averages
    pub fn update_running_stats(&mut self, cache: &ForwardCache) {
        for (block, block_cache) in self.conv_blocks.iter_mut().zip(&cache.conv) {
            block.norm.update_running(&block_cache.norm);
        }
        self.hidden_norm.update_running(&cache.hidden_norm);
    }

    /// Trainable tensors in a fixed order shared with [`NetworkGradients::tensors`]
    pub fn parameters_mut(&mut self) -> Vec<ArrayViewMutD<'_, f32>> {
        let mut params = Vec::new();
        for block in self.conv_blocks.iter_mut() {
            params.extend(block.conv.params_mut());
            params.extend(block.norm.params_mut());
        }
        params.extend(self.lstm_seq.params_mut());
        params.extend(self.lstm_last.params_mut());
        params.extend(self.hidden.params_mut());
        params.extend(self.hidden_norm.params_mut());
        params.extend(self.bottleneck.params_mut());
        params.extend(self.output.params_mut());
        params
    }

    pub fn num_parameters(&self) -> usize {
        self.conv_blocks
            .iter()
            .map(|b| b.conv.num_parameters() + b.norm.num_parameters())
            .sum::<usize>()
            + self.lstm_seq.num_parameters()
            + self.lstm_last.num_parameters()
            + self.hidden.num_parameters()
            + self.hidden_norm.num_parameters()
            + self.bottleneck.num_parameters()
            + self.output.num_parameters()
    }

    /// Check every stored array against the recorded architecture
    pub fn validate_shapes(&self) -> Result<()> {
        let config = &self.config;
        config.validate()?;
        if self.conv_blocks.len() != config.conv_filters.len() {
            return Err(ModelError::shape_mismatch(format!(
                "{} conv blocks stored, architecture declares {}",
                self.conv_blocks.len(),
                config.conv_filters.len()
            )));
        }

        let mut channels = config.input_dim;
        for ((block, &filters), &kernel) in self
            .conv_blocks
            .iter()
            .zip(&config.conv_filters)
            .zip(&config.conv_kernels)
        {
            block.conv.validate(channels, filters, kernel)?;
            block.norm.validate(filters)?;
            channels = filters;
        }

        let [seq_units, last_units] = config.lstm_units;
        let [hidden_units, bottleneck_units] = config.dense_units;
        self.lstm_seq.validate(channels, seq_units)?;
        self.lstm_last.validate(seq_units, last_units)?;
        self.hidden.validate(last_units, hidden_units)?;
        self.hidden_norm.validate(hidden_units)?;
        self.bottleneck.validate(hidden_units, bottleneck_units)?;
        self.output.validate(bottleneck_units, config.num_classes)
    }

    fn check_input(&self, x: &Array3<f32>) -> Result<()> {
        let (batch, steps, dim) = x.dim();
        if batch == 0 {
            return Err(ModelError::shape_mismatch("empty batch"));
        }
        if dim != self.config.input_dim {
            return Err(ModelError::shape_mismatch(format!(
                "expected {} features per step, got {}",
                self.config.input_dim, dim
            )));
        }
        let min_steps = self.config.min_time_steps();
        if steps < min_steps {
            return Err(ModelError::shape_mismatch(format!(
                "need at least {} time steps, got {}",
                min_steps, steps
            )));
        }
        Ok(())
    }
}
