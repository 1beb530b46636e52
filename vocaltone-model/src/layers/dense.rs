//! Fully connected layer

use ndarray::{Array1, Array2, ArrayViewD, ArrayViewMutD, Axis};
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::init::glorot_uniform;
use crate::error::{ModelError, Result};

/// `y = x·W + b` over (batch, features)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dense {
    weight: Array2<f32>,
    bias: Array1<f32>,
}

#[derive(Debug, Clone)]
pub struct DenseGrads {
    pub weight: Array2<f32>,
    pub bias: Array1<f32>,
}

impl DenseGrads {
    pub fn tensors(&self) -> Vec<ArrayViewD<'_, f32>> {
        vec![self.weight.view().into_dyn(), self.bias.view().into_dyn()]
    }
}

impl Dense {
    pub fn new<R: Rng + ?Sized>(inputs: usize, outputs: usize, rng: &mut R) -> Self {
        Self {
            weight: glorot_uniform((inputs, outputs), inputs, outputs, rng),
            bias: Array1::zeros(outputs),
        }
    }

    pub fn outputs(&self) -> usize {
        self.bias.len()
    }

    pub fn forward(&self, x: &Array2<f32>) -> Array2<f32> {
        x.dot(&self.weight) + &self.bias
    }

    /// Gradients given the forward input `x`
    pub fn backward(&self, x: &Array2<f32>, dy: &Array2<f32>) -> (Array2<f32>, DenseGrads) {
        let dx = dy.dot(&self.weight.t());
        let grads = DenseGrads {
            weight: x.t().dot(dy),
            bias: dy.sum_axis(Axis(0)),
        };
        (dx, grads)
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

    pub fn validate(&self, inputs: usize, outputs: usize) -> Result<()> {
        if self.weight.dim() != (inputs, outputs) || self.bias.len() != outputs {
            return Err(ModelError::shape_mismatch(format!(
                "dense layer expected ({}, {}), found {:?} with bias {}",
                inputs,
                outputs,
                self.weight.dim(),
                self.bias.len()
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layers::gradcheck::{assert_close, numeric_grad, random_array2};
    use ndarray::ArrayD;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_gradients_match_finite_differences() {
        let mut rng = StdRng::seed_from_u64(21);
        let dense = Dense::new(4, 3, &mut rng);
        let x = random_array2((5, 4), &mut rng);
        let r = random_array2((5, 3), &mut rng);

        let (dx, grads) = dense.backward(&x, &r);

        let numeric_dx = numeric_grad(&x.clone().into_dyn(), |v: &ArrayD<f32>| {
            let v: Array2<f32> = v.clone().into_dimensionality().unwrap();
            (dense.forward(&v) * &r).sum()
        });
        assert_close(&dx.into_dyn(), &numeric_dx);

        let numeric_w = numeric_grad(&dense.weight.clone().into_dyn(), |w: &ArrayD<f32>| {
            let mut probe = dense.clone();
            probe.weight = w.clone().into_dimensionality().unwrap();
            (probe.forward(&x) * &r).sum()
        });
        assert_close(&grads.weight.into_dyn(), &numeric_w);
        assert_close(&grads.bias.into_dyn(), &r.sum_axis(Axis(0)).into_dyn());
    }
}
