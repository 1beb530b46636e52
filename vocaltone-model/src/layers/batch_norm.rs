//! Batch normalization over the last (channel) axis

use ndarray::{Array, Array1, ArrayViewD, ArrayViewMutD, Axis, Dimension, RemoveAxis, Zip};
use serde::{Deserialize, Serialize};

use crate::error::{ModelError, Result};

/// Per-channel normalization; statistics are taken over every other axis
/// (batch × time for sequences, batch for vectors)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchNorm {
    gamma: Array1<f32>,
    beta: Array1<f32>,
    running_mean: Array1<f32>,
    running_var: Array1<f32>,
    momentum: f32,
    epsilon: f32,
}

#[derive(Debug, Clone)]
pub struct BatchNormCache<D: Dimension> {
    x_hat: Array<f32, D>,
    inv_std: Array1<f32>,
    batch_mean: Array1<f32>,
    batch_var: Array1<f32>,
}

#[derive(Debug, Clone)]
pub struct BatchNormGrads {
    pub gamma: Array1<f32>,
    pub beta: Array1<f32>,
}

impl BatchNormGrads {
    pub fn tensors(&self) -> Vec<ArrayViewD<'_, f32>> {
        vec![self.gamma.view().into_dyn(), self.beta.view().into_dyn()]
    }
}

impl BatchNorm {
    pub fn new(channels: usize, momentum: f32, epsilon: f32) -> Self {
        Self {
            gamma: Array1::ones(channels),
            beta: Array1::zeros(channels),
            running_mean: Array1::zeros(channels),
            running_var: Array1::ones(channels),
            momentum,
            epsilon,
        }
    }

    pub fn channels(&self) -> usize {
        self.gamma.len()
    }

    /// Normalize with the current batch's statistics
    pub fn forward_train<D: Dimension + RemoveAxis>(
        &self,
        x: &Array<f32, D>,
    ) -> (Array<f32, D>, BatchNormCache<D>) {
        let axis = Axis(x.ndim() - 1);
        let channels = self.channels();
        let mut x_hat = Array::zeros(x.raw_dim());
        let mut y = Array::zeros(x.raw_dim());
        let mut inv_std = Array1::zeros(channels);
        let mut batch_mean = Array1::zeros(channels);
        let mut batch_var = Array1::zeros(channels);

        for c in 0..channels {
            let lane = x.index_axis(axis, c);
            let n = lane.len().max(1) as f32;
            let mean = lane.sum() / n;
            let var = lane.iter().map(|&v| (v - mean).powi(2)).sum::<f32>() / n;
            let scale = 1.0 / (var + self.epsilon).sqrt();

            let mut hat = x_hat.index_axis_mut(axis, c);
            hat.zip_mut_with(&lane, |h, &v| *h = (v - mean) * scale);

            let (g, b) = (self.gamma[c], self.beta[c]);
            y.index_axis_mut(axis, c)
                .zip_mut_with(&hat, |out, &h| *out = g * h + b);

            inv_std[c] = scale;
            batch_mean[c] = mean;
            batch_var[c] = var;
        }

        (
            y,
            BatchNormCache {
                x_hat,
                inv_std,
                batch_mean,
                batch_var,
            },
        )
    }

    /// Normalize with the running statistics
    pub fn forward_infer<D: Dimension + RemoveAxis>(&self, x: &Array<f32, D>) -> Array<f32, D> {
        let axis = Axis(x.ndim() - 1);
        let mut y = x.clone();
        for (c, mut lane) in y.axis_iter_mut(axis).enumerate() {
            let scale = self.gamma[c] / (self.running_var[c] + self.epsilon).sqrt();
            let shift = self.beta[c] - self.running_mean[c] * scale;
            lane.mapv_inplace(|v| v * scale + shift);
        }
        y
    }

    pub fn backward<D: Dimension + RemoveAxis>(
        &self,
        cache: &BatchNormCache<D>,
        dy: &Array<f32, D>,
    ) -> (Array<f32, D>, BatchNormGrads) {
        let axis = Axis(dy.ndim() - 1);
        let channels = self.channels();
        let mut dx = Array::zeros(dy.raw_dim());
        let mut d_gamma = Array1::zeros(channels);
        let mut d_beta = Array1::zeros(channels);

        for c in 0..channels {
            let dy_c = dy.index_axis(axis, c);
            let hat = cache.x_hat.index_axis(axis, c);
            let n = dy_c.len().max(1) as f32;

            let sum_dy = dy_c.sum();
            let sum_dy_hat = Zip::from(&dy_c).and(&hat).fold(0.0f32, |acc, &d, &h| acc + d * h);
            d_gamma[c] = sum_dy_hat;
            d_beta[c] = sum_dy;

            // dx = γ·σ⁻¹/N · (N·dy − Σdy − x̂·Σ(dy·x̂))
            let k = self.gamma[c] * cache.inv_std[c] / n;
            Zip::from(dx.index_axis_mut(axis, c))
                .and(&dy_c)
                .and(&hat)
                .for_each(|out, &d, &h| *out = k * (n * d - sum_dy - h * sum_dy_hat));
        }

        (
            dx,
            BatchNormGrads {
                gamma: d_gamma,
                beta: d_beta,
            },
        )
    }

    /// Fold the batch statistics of a training pass into the running averages
    pub fn update_running<D: Dimension>(&mut self, cache: &BatchNormCache<D>) {
        let m = self.momentum;
        Zip::from(&mut self.running_mean)
            .and(&cache.batch_mean)
            .for_each(|r, &b| *r = m * *r + (1.0 - m) * b);
        Zip::from(&mut self.running_var)
            .and(&cache.batch_var)
            .for_each(|r, &b| *r = m * *r + (1.0 - m) * b);
    }

    pub fn params_mut(&mut self) -> Vec<ArrayViewMutD<'_, f32>> {
        vec![
            self.gamma.view_mut().into_dyn(),
            self.beta.view_mut().into_dyn(),
        ]
    }

    pub fn num_parameters(&self) -> usize {
        self.gamma.len() + self.beta.len()
    }

    pub fn validate(&self, channels: usize) -> Result<()> {
        let lens = [
            self.gamma.len(),
            self.beta.len(),
            self.running_mean.len(),
            self.running_var.len(),
        ];
        if lens.iter().any(|&l| l != channels) {
            return Err(ModelError::shape_mismatch(format!(
                "batch norm expected {} channels, found {:?}",
                channels, lens
            )));
        }
        Ok(())
    }
}
