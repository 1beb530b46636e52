//! Orthonormal DCT-II used to turn log mel energies into cepstral coefficients

use std::f32::consts::PI;

use ndarray::Array2;

/// DCT-II basis of shape (n_out, n_in), orthonormal scaling
///
/// Row `k` is `sqrt(2/N)·cos(π·k·(2n+1) / 2N)`, with row 0 scaled by
/// `sqrt(1/N)` instead. Multiplying a length-N vector by the full (N, N)
/// matrix preserves its Euclidean norm.
pub fn dct_matrix(n_out: usize, n_in: usize) -> Array2<f32> {
    let n = n_in as f32;
    Array2::from_shape_fn((n_out, n_in), |(k, i)| {
        let scale = if k == 0 { (1.0 / n).sqrt() } else { (2.0 / n).sqrt() };
        scale * (PI * k as f32 * (2 * i + 1) as f32 / (2.0 * n)).cos()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::Array1;

    #[test]
    fn test_dct_is_orthonormal() {
        let m = dct_matrix(16, 16);
        let identity = m.dot(&m.t());
        for ((i, j), &v) in identity.indexed_iter() {
            let expected = if i == j { 1.0 } else { 0.0 };
            assert_abs_diff_eq!(v, expected, epsilon = 1e-5);
        }
    }

    #[test]
    fn test_constant_input_has_only_dc() {
        let m = dct_matrix(8, 32);
        let coeffs = m.dot(&Array1::from_elem(32, 2.0f32));
        assert_abs_diff_eq!(coeffs[0], 2.0 * 32f32.sqrt(), epsilon = 1e-4);
        for &c in coeffs.iter().skip(1) {
            assert_abs_diff_eq!(c, 0.0, epsilon = 1e-4);
        }
    }
}
