//! Inverted dropout

use ndarray::{Array, Dimension};
use rand::{Rng, RngCore};

/// Zero each element with probability `rate` and scale survivors by `1/(1-rate)`
///
/// Returns the mask so the backward pass can reuse it. A zero rate is the
/// identity and returns no mask.
pub fn dropout_forward<D: Dimension>(
    x: Array<f32, D>,
    rate: f32,
    rng: &mut dyn RngCore,
) -> (Array<f32, D>, Option<Array<f32, D>>) {
    if rate <= 0.0 {
        return (x, None);
    }
    let keep = 1.0 / (1.0 - rate);
    let mask = Array::from_shape_simple_fn(x.raw_dim(), || {
        if rng.gen::<f32>() < rate {
            0.0
        } else {
            keep
        }
    });
    (x * &mask, Some(mask))
}

pub fn dropout_backward<D: Dimension>(dy: Array<f32, D>, mask: Option<&Array<f32, D>>) -> Array<f32, D> {
    match mask {
        Some(mask) => dy * mask,
        None => dy,
    }
}
