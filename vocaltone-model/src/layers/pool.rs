//! Max pooling over time, window 2, stride 2, trailing odd frame dropped

use ndarray::Array3;

#[derive(Debug, Clone)]
pub struct MaxPoolCache {
    input_steps: usize,
    /// 0 when the first frame of the pair won, 1 for the second
    winners: Array3<u8>,
}

/// (B, T, C) → (B, ⌊T/2⌋, C)
pub fn max_pool_forward(x: &Array3<f32>) -> (Array3<f32>, MaxPoolCache) {
    let (batch, steps, channels) = x.dim();
    let out_steps = steps / 2;
    let mut y = Array3::zeros((batch, out_steps, channels));
    let mut winners = Array3::zeros((batch, out_steps, channels));

    for b in 0..batch {
        for t in 0..out_steps {
            for c in 0..channels {
                let first = x[[b, 2 * t, c]];
                let second = x[[b, 2 * t + 1, c]];
                if second > first {
                    y[[b, t, c]] = second;
                    winners[[b, t, c]] = 1;
                } else {
                    y[[b, t, c]] = first;
                }
            }
        }
    }

    (
        y,
        MaxPoolCache {
            input_steps: steps,
            winners,
        },
    )
}

/// Route each gradient back to the frame that won the pooling window
pub fn max_pool_backward(cache: &MaxPoolCache, dy: &Array3<f32>) -> Array3<f32> {
    let (batch, _, channels) = dy.dim();
    let mut dx = Array3::zeros((batch, cache.input_steps, channels));

    for ((b, t, c), &g) in dy.indexed_iter() {
        let offset = cache.winners[[b, t, c]] as usize;
        dx[[b, 2 * t + offset, c]] = g;
    }
    dx
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pool_floor_and_routing() {
        let x = Array3::from_shape_vec((1, 5, 1), vec![1.0, 3.0, 4.0, 2.0, 9.0]).unwrap();
        let (y, cache) = max_pool_forward(&x);
        assert_eq!(y.iter().copied().collect::<Vec<_>>(), vec![3.0, 4.0]);

        let dy = Array3::from_shape_vec((1, 2, 1), vec![10.0, 20.0]).unwrap();
        let dx = max_pool_backward(&cache, &dy);
        assert_eq!(
            dx.iter().copied().collect::<Vec<_>>(),
            vec![0.0, 10.0, 20.0, 0.0, 0.0]
        );
    }
}
