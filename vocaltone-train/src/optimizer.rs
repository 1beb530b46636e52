//! Adam optimizer over the network's parameter list

use ndarray::{ArrayD, ArrayViewD, ArrayViewMutD, Zip};

use crate::error::{Result, TrainError};

/// Adam with bias-corrected step size
///
/// Moment buffers are allocated on the first step and matched to
/// parameters by position.
#[derive(Debug, Clone)]
pub struct Adam {
    learning_rate: f32,
    beta1: f32,
    beta2: f32,
    epsilon: f32,
    step: i32,
    first_moment: Vec<ArrayD<f32>>,
    second_moment: Vec<ArrayD<f32>>,
}

impl Adam {
    pub fn new(learning_rate: f32) -> Self {
        Self {
            learning_rate,
            beta1: 0.9,
            beta2: 0.999,
            epsilon: 1e-7,
            step: 0,
            first_moment: Vec::new(),
            second_moment: Vec::new(),
        }
    }

    pub fn learning_rate(&self) -> f32 {
        self.learning_rate
    }

    pub fn set_learning_rate(&mut self, learning_rate: f32) {
        self.learning_rate = learning_rate;
    }

    /// Updates applied so far
    pub fn steps(&self) -> i32 {
        self.step
    }

    /// Apply one update; `params` and `grads` must line up one to one
    pub fn step(
        &mut self,
        params: Vec<ArrayViewMutD<'_, f32>>,
        grads: &[ArrayViewD<'_, f32>],
    ) -> Result<()> {
        if params.len() != grads.len() {
            return Err(TrainError::shape_mismatch(format!(
                "{} parameters but {} gradients",
                params.len(),
                grads.len()
            )));
        }
        if self.first_moment.is_empty() {
            self.first_moment = grads.iter().map(|g| ArrayD::zeros(g.raw_dim())).collect();
            self.second_moment = self.first_moment.clone();
        }
        if self.first_moment.len() != grads.len() {
            return Err(TrainError::shape_mismatch(
                "parameter list changed between steps",
            ));
        }

        self.step += 1;
        let (b1, b2, eps) = (self.beta1, self.beta2, self.epsilon);
        let alpha = self.learning_rate * (1.0 - b2.powi(self.step)).sqrt()
            / (1.0 - b1.powi(self.step));

        for (((mut param, grad), m), v) in params
            .into_iter()
            .zip(grads)
            .zip(&mut self.first_moment)
            .zip(&mut self.second_moment)
        {
            if param.shape() != grad.shape() || m.shape() != grad.shape() {
                return Err(TrainError::shape_mismatch(format!(
                    "parameter {:?} vs gradient {:?}",
                    param.shape(),
                    grad.shape()
                )));
            }
            Zip::from(&mut param)
                .and(grad)
                .and(m)
                .and(v)
                .for_each(|p, &g, m, v| {
                    *m = b1 * *m + (1.0 - b1) * g;
                    *v = b2 * *v + (1.0 - b2) * g * g;
                    *p -= alpha * *m / (v.sqrt() + eps);
                });
        }
        Ok(())
    }
}
