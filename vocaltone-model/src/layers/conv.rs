//! 1D convolution along the time axis with "same" padding

use ndarray::{s, Array1, Array2, Array3, ArrayView2, ArrayViewD, ArrayViewMutD, Axis};
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::init::glorot_uniform;
use crate::error::{ModelError, Result};

/// Conv1d over (batch, time, channels) input
///
/// The kernel is stored flattened as (kernel_size · in_channels, out_channels)
/// with row index `k · in_channels + c`, so each frame's receptive field is
/// a single matrix product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conv1d {
    kernel_size: usize,
    in_channels: usize,
    out_channels: usize,
    weight: Array2<f32>,
    bias: Array1<f32>,
}

/// Unfolded inputs, one (time, kernel_size · in_channels) matrix per batch item
#[derive(Debug, Clone)]
pub struct Conv1dCache {
    cols: Vec<Array2<f32>>,
}

#[derive(Debug, Clone)]
pub struct Conv1dGrads {
    pub weight: Array2<f32>,
    pub bias: Array1<f32>,
}

impl Conv1dGrads {
    pub fn tensors(&self) -> Vec<ArrayViewD<'_, f32>> {
        vec![self.weight.view().into_dyn(), self.bias.view().into_dyn()]
    }
}

impl Conv1d {
    pub fn new<R: Rng + ?Sized>(
        in_channels: usize,
        out_channels: usize,
        kernel_size: usize,
        rng: &mut R,
    ) -> Self {
        let rows = kernel_size * in_channels;
        Self {
            kernel_size,
            in_channels,
            out_channels,
            weight: glorot_uniform(
                (rows, out_channels),
                rows,
                kernel_size * out_channels,
                rng,
            ),
            bias: Array1::zeros(out_channels),
        }
    }

    pub fn out_channels(&self) -> usize {
        self.out_channels
    }

    /// Zeros prepended before the first frame; the rest go after the last
    fn pad_left(&self) -> usize {
        (self.kernel_size - 1) / 2
    }

    fn im2col(&self, x: ArrayView2<'_, f32>) -> Array2<f32> {
        let (steps, channels) = x.dim();
        let pad = self.pad_left() as isize;
        let mut cols = Array2::zeros((steps, self.kernel_size * channels));

        for t in 0..steps {
            for k in 0..self.kernel_size {
                let src = t as isize + k as isize - pad;
                if src < 0 || src >= steps as isize {
                    continue;
                }
                cols.slice_mut(s![t, k * channels..(k + 1) * channels])
                    .assign(&x.row(src as usize));
            }
        }
        cols
    }

    fn col2im(&self, dcols: &Array2<f32>) -> Array2<f32> {
        let steps = dcols.nrows();
        let channels = self.in_channels;
        let pad = self.pad_left() as isize;
        let mut dx = Array2::zeros((steps, channels));

        for t in 0..steps {
            for k in 0..self.kernel_size {
                let src = t as isize + k as isize - pad;
                if src < 0 || src >= steps as isize {
                    continue;
                }
                let mut row = dx.row_mut(src as usize);
                row += &dcols.slice(s![t, k * channels..(k + 1) * channels]);
            }
        }
        dx
    }

    /// (B, T, C_in) → (B, T, C_out)
    pub fn forward(&self, x: &Array3<f32>) -> (Array3<f32>, Conv1dCache) {
        let (batch, steps, _) = x.dim();
        let mut y = Array3::zeros((batch, steps, self.out_channels));
        let mut cols = Vec::with_capacity(batch);

        for (b, item) in x.axis_iter(Axis(0)).enumerate() {
            let unfolded = self.im2col(item);
            let out = unfolded.dot(&self.weight) + &self.bias;
            y.index_axis_mut(Axis(0), b).assign(&out);
            cols.push(unfolded);
        }

        (y, Conv1dCache { cols })
    }

    pub fn backward(&self, cache: &Conv1dCache, dy: &Array3<f32>) -> (Array3<f32>, Conv1dGrads) {
        let (batch, steps, _) = dy.dim();
        let mut dx = Array3::zeros((batch, steps, self.in_channels));
        let mut d_weight = Array2::zeros(self.weight.raw_dim());
        let mut d_bias = Array1::zeros(self.out_channels);

        for (b, (dy_b, cols)) in dy.axis_iter(Axis(0)).zip(&cache.cols).enumerate() {
            d_weight += &cols.t().dot(&dy_b);
            d_bias += &dy_b.sum_axis(Axis(0));
            let dcols = dy_b.dot(&self.weight.t());
            dx.index_axis_mut(Axis(0), b).assign(&self.col2im(&dcols));
        }

        (
            dx,
            Conv1dGrads {
                weight: d_weight,
                bias: d_bias,
            },
        )
    }

    pub fn params_mut(&mut self) -> Vec<ArrayViewMutD<'_, f32>> {
        vec![
            self.weight.view_mut().into_dyn(),
            self.bias.view_mut().into_dyn(),
        ]
    }

    pub fn num_parameters(&self) -> usize {
        self.weight.len() + self.bias.len()
    }

    /// Check stored arrays against the declared sizes
    pub fn validate(&self, in_channels: usize, out_channels: usize, kernel_size: usize) -> Result<()> {
        let expected = (kernel_size * in_channels, out_channels);
        if self.in_channels != in_channels
            || self.out_channels != out_channels
            || self.kernel_size != kernel_size
            || self.weight.dim() != expected
            || self.bias.len() != out_channels
        {
            return Err(ModelError::shape_mismatch(format!(
                "conv layer expected kernel {:?} and bias {}, found {:?} and {}",
                expected,
                out_channels,
                self.weight.dim(),
                self.bias.len()
            )));
        }
        Ok(())
    }
}
