//! Finite-difference helpers shared by the layer tests

use ndarray::{Array2, Array3, ArrayD};
use rand::Rng;

const STEP: f32 = 1e-2;

pub fn random_array2<R: Rng>(shape: (usize, usize), rng: &mut R) -> Array2<f32> {
    Array2::from_shape_simple_fn(shape, || rng.gen_range(-1.0..1.0))
}

pub fn random_array3<R: Rng>(shape: (usize, usize, usize), rng: &mut R) -> Array3<f32> {
    Array3::from_shape_simple_fn(shape, || rng.gen_range(-1.0..1.0))
}

/// Central differences of a scalar function, one element at a time
pub fn numeric_grad<F: Fn(&ArrayD<f32>) -> f32>(x: &ArrayD<f32>, f: F) -> ArrayD<f32> {
    let mut grad = ArrayD::zeros(x.raw_dim());
    let mut probe = x.clone();
    for (idx, g) in grad.indexed_iter_mut() {
        let original = probe[&idx];
        probe[&idx] = original + STEP;
        let plus = f(&probe);
        probe[&idx] = original - STEP;
        let minus = f(&probe);
        probe[&idx] = original;
        *g = (plus - minus) / (2.0 * STEP);
    }
    grad
}

pub fn assert_close(analytic: &ArrayD<f32>, numeric: &ArrayD<f32>) {
    assert_eq!(analytic.shape(), numeric.shape());
    for (a, n) in analytic.iter().zip(numeric.iter()) {
        let tolerance = 2e-2 * a.abs().max(n.abs()).max(1.0);
        assert!(
            (a - n).abs() <= tolerance,
            "analytic {} vs numeric {}",
            a,
            n
        );
    }
}
