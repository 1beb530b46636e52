//! Parameter initialization

use ndarray::Array2;
use rand::Rng;

/// Glorot/Xavier uniform: U(−l, l) with `l = sqrt(6 / (fan_in + fan_out))`
pub fn glorot_uniform<R: Rng + ?Sized>(
    shape: (usize, usize),
    fan_in: usize,
    fan_out: usize,
    rng: &mut R,
) -> Array2<f32> {
    let limit = (6.0 / (fan_in + fan_out).max(1) as f32).sqrt();
    Array2::from_shape_simple_fn(shape, || rng.gen_range(-limit..=limit))
}
