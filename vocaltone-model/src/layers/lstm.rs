//! Long short-term memory layer with full backpropagation through time

use ndarray::{s, Array1, Array2, Array3, ArrayViewD, ArrayViewMutD, Axis};
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::init::glorot_uniform;
use crate::error::{ModelError, Result};

fn sigmoid(v: f32) -> f32 {
    1.0 / (1.0 + (-v).exp())
}

/// LSTM over (batch, time, features), gate order input, forget, cell, output
///
/// Zero initial state. The forget-gate bias starts at 1.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lstm {
    units: usize,
    /// (input_dim, 4·units)
    kernel: Array2<f32>,
    /// (units, 4·units)
    recurrent: Array2<f32>,
    /// (4·units)
    bias: Array1<f32>,
}

#[derive(Debug, Clone)]
struct Step {
    input: Array2<f32>,
    forget: Array2<f32>,
    candidate: Array2<f32>,
    output: Array2<f32>,
    cell: Array2<f32>,
    hidden: Array2<f32>,
}

#[derive(Debug, Clone)]
pub struct LstmCache {
    x: Array3<f32>,
    steps: Vec<Step>,
}

#[derive(Debug, Clone)]
pub struct LstmGrads {
    pub kernel: Array2<f32>,
    pub recurrent: Array2<f32>,
    pub bias: Array1<f32>,
}

impl LstmGrads {
    pub fn tensors(&self) -> Vec<ArrayViewD<'_, f32>> {
        vec![
            self.kernel.view().into_dyn(),
            self.recurrent.view().into_dyn(),
            self.bias.view().into_dyn(),
        ]
    }
}

impl Lstm {
    pub fn new<R: Rng + ?Sized>(input_dim: usize, units: usize, rng: &mut R) -> Self {
        let mut bias = Array1::zeros(4 * units);
        bias.slice_mut(s![units..2 * units]).fill(1.0);

        Self {
            units,
            kernel: glorot_uniform((input_dim, 4 * units), input_dim, 4 * units, rng),
            recurrent: glorot_uniform((units, 4 * units), units, 4 * units, rng),
            bias,
        }
    }

    pub fn units(&self) -> usize {
        self.units
    }

    /// Hidden state at every step, shape (B, T, units)
    pub fn forward(&self, x: &Array3<f32>) -> (Array3<f32>, LstmCache) {
        let (batch, time, _) = x.dim();
        let h = self.units;
        let mut hidden_seq = Array3::zeros((batch, time, h));
        let mut steps: Vec<Step> = Vec::with_capacity(time);

        let mut h_prev = Array2::<f32>::zeros((batch, h));
        let mut c_prev = Array2::<f32>::zeros((batch, h));

        for t in 0..time {
            let x_t = x.index_axis(Axis(1), t);
            let z = x_t.dot(&self.kernel) + h_prev.dot(&self.recurrent) + &self.bias;

            let input = z.slice(s![.., 0..h]).mapv(sigmoid);
            let forget = z.slice(s![.., h..2 * h]).mapv(sigmoid);
            let candidate = z.slice(s![.., 2 * h..3 * h]).mapv(f32::tanh);
            let output = z.slice(s![.., 3 * h..4 * h]).mapv(sigmoid);

            let cell = &forget * &c_prev + &input * &candidate;
            let hidden = &output * &cell.mapv(f32::tanh);

            hidden_seq.index_axis_mut(Axis(1), t).assign(&hidden);
            h_prev = hidden.clone();
            c_prev = cell.clone();
            steps.push(Step {
                input,
                forget,
                candidate,
                output,
                cell,
                hidden,
            });
        }

        (
            hidden_seq,
            LstmCache {
                x: x.clone(),
                steps,
            },
        )
    }

    /// Backpropagate a gradient on every hidden state through time
    ///
    /// For a layer that only exposes its final state, pass zeros everywhere
    /// except the last step.
    pub fn backward(&self, cache: &LstmCache, d_hidden: &Array3<f32>) -> (Array3<f32>, LstmGrads) {
        let (batch, time, input_dim) = cache.x.dim();
        let h = self.units;

        let mut dx = Array3::zeros((batch, time, input_dim));
        let mut d_kernel = Array2::zeros(self.kernel.raw_dim());
        let mut d_recurrent = Array2::zeros(self.recurrent.raw_dim());
        let mut d_bias = Array1::zeros(self.bias.raw_dim());

        let zeros = Array2::<f32>::zeros((batch, h));
        let mut dh_next = Array2::<f32>::zeros((batch, h));
        let mut dc_next = Array2::<f32>::zeros((batch, h));
        let mut dz = Array2::<f32>::zeros((batch, 4 * h));

        for t in (0..time).rev() {
            let step = &cache.steps[t];
            let (c_prev, h_prev) = if t == 0 {
                (&zeros, &zeros)
            } else {
                (&cache.steps[t - 1].cell, &cache.steps[t - 1].hidden)
            };

            let dh = &d_hidden.index_axis(Axis(1), t) + &dh_next;
            let tanh_c = step.cell.mapv(f32::tanh);

            let d_output = &dh * &tanh_c;
            let dc = &dc_next + &(&dh * &step.output * &tanh_c.mapv(|v| 1.0 - v * v));

            let d_input = &dc * &step.candidate;
            let d_forget = &dc * c_prev;
            let d_candidate = &dc * &step.input;

            dz.slice_mut(s![.., 0..h])
                .assign(&(&d_input * &step.input.mapv(|v| v * (1.0 - v))));
            dz.slice_mut(s![.., h..2 * h])
                .assign(&(&d_forget * &step.forget.mapv(|v| v * (1.0 - v))));
            dz.slice_mut(s![.., 2 * h..3 * h])
                .assign(&(&d_candidate * &step.candidate.mapv(|v| 1.0 - v * v)));
            dz.slice_mut(s![.., 3 * h..4 * h])
                .assign(&(&d_output * &step.output.mapv(|v| v * (1.0 - v))));

            let x_t = cache.x.index_axis(Axis(1), t);
            d_kernel += &x_t.t().dot(&dz);
            d_recurrent += &h_prev.t().dot(&dz);
            d_bias += &dz.sum_axis(Axis(0));

            dx.index_axis_mut(Axis(1), t)
                .assign(&dz.dot(&self.kernel.t()));
            dh_next = dz.dot(&self.recurrent.t());
            dc_next = &dc * &step.forget;
        }

        (
            dx,
            LstmGrads {
                kernel: d_kernel,
                recurrent: d_recurrent,
                bias: d_bias,
            },
        )
    }

    pub fn params_mut(&mut self) -> Vec<ArrayViewMutD<'_, f32>> {
        vec![
            self.kernel.view_mut().into_dyn(),
            self.recurrent.view_mut().into_dyn(),
            self.bias.view_mut().into_dyn(),
        ]
    }

    pub fn num_parameters(&self) -> usize {
        self.kernel.len() + self.recurrent.len() + self.bias.len()
    }

    pub fn validate(&self, input_dim: usize, units: usize) -> Result<()> {
        if self.units != units
            || self.kernel.dim() != (input_dim, 4 * units)
            || self.recurrent.dim() != (units, 4 * units)
            || self.bias.len() != 4 * units
        {
            return Err(ModelError::shape_mismatch(format!(
                "lstm expected {} inputs and {} units, found kernel {:?}, recurrent {:?}",
                input_dim,
                units,
                self.kernel.dim(),
                self.recurrent.dim()
            )));
        }
        Ok(())
    }
}
