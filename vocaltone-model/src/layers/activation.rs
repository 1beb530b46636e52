//! ReLU, softmax and the cross-entropy loss

use ndarray::{Array, Array2, Axis, Dimension, Zip};

/// Guards `ln` against probabilities that underflow to zero
const LOG_FLOOR: f32 = 1e-7;

pub fn relu<D: Dimension>(x: Array<f32, D>) -> Array<f32, D> {
    x.mapv_into(|v| v.max(0.0))
}

/// Gradient through ReLU given its output
pub fn relu_backward<D: Dimension>(dy: &Array<f32, D>, y: &Array<f32, D>) -> Array<f32, D> {
    let mut dx = dy.clone();
    Zip::from(&mut dx).and(y).for_each(|d, &out| {
        if out <= 0.0 {
            *d = 0.0;
        }
    });
    dx
}

/// Row-wise softmax, max-shifted for stability
pub fn softmax(logits: &Array2<f32>) -> Array2<f32> {
    let mut out = logits.clone();
    for mut row in out.axis_iter_mut(Axis(0)) {
        let max = row.iter().fold(f32::NEG_INFINITY, |a, &b| a.max(b));
        row.mapv_inplace(|v| (v - max).exp());
        let sum = row.sum();
        row.mapv_inplace(|v| v / sum);
    }
    out
}

/// Mean sparse categorical cross-entropy
pub fn cross_entropy(probabilities: &Array2<f32>, labels: &[usize]) -> f32 {
    if labels.is_empty() {
        return 0.0;
    }
    let total: f32 = probabilities
        .axis_iter(Axis(0))
        .zip(labels)
        .map(|(row, &label)| -row[label].max(LOG_FLOOR).ln())
        .sum();
    total / labels.len() as f32
}

/// Gradient of the mean cross-entropy with respect to the softmax logits
pub fn softmax_cross_entropy_backward(probabilities: &Array2<f32>, labels: &[usize]) -> Array2<f32> {
    let batch = labels.len().max(1) as f32;
    let mut grad = probabilities.clone();
    for (mut row, &label) in grad.axis_iter_mut(Axis(0)).zip(labels) {
        row[label] -= 1.0;
    }
    grad.mapv_inplace(|g| g / batch);
    grad
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    #[test]
    fn test_softmax_rows_sum_to_one() {
        let p = softmax(&array![[1.0f32, 2.0, 3.0], [1000.0, 1000.0, 1000.0]]);
        for row in p.axis_iter(Axis(0)) {
            assert_abs_diff_eq!(row.sum(), 1.0, epsilon = 1e-6);
        }
        assert_abs_diff_eq!(p[[1, 0]], 1.0 / 3.0, epsilon = 1e-6);
    }

    #[test]
    fn test_cross_entropy_and_gradient() {
        let p = array![[0.7f32, 0.2, 0.1], [0.1, 0.1, 0.8]];
        let loss = cross_entropy(&p, &[0, 2]);
        assert_abs_diff_eq!(loss, -(0.7f32.ln() + 0.8f32.ln()) / 2.0, epsilon = 1e-6);

        let g = softmax_cross_entropy_backward(&p, &[0, 2]);
        assert_abs_diff_eq!(g[[0, 0]], -0.15, epsilon = 1e-6);
        assert_abs_diff_eq!(g[[1, 1]], 0.05, epsilon = 1e-6);
    }

    #[test]
    fn test_relu_backward_masks() {
        let y = relu(array![-1.0f32, 0.0, 2.0]);
        let dx = relu_backward(&array![1.0f32, 1.0, 1.0], &y);
        assert_eq!(dx, array![0.0, 0.0, 1.0]);
    }
}
