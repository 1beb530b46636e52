//! Short-time power spectrum with a reusable FFT plan

use std::f32::consts::PI;
use std::fmt;
use std::sync::Arc;

use ndarray::Array2;
use rustfft::{num_complex::Complex, Fft, FftPlanner};

/// Framed power spectrum: Hamming window, frame length = FFT size, no centering
pub struct Stft {
    n_fft: usize,
    hop_length: usize,
    window: Vec<f32>,
    fft: Arc<dyn Fft<f32>>,
}

impl Stft {
    /// Plan the transform once; `power_spectrogram` only borrows `&self`
    pub fn new(n_fft: usize, hop_length: usize) -> Self {
        let fft = FftPlanner::new().plan_fft_forward(n_fft);
        Self {
            n_fft,
            hop_length,
            window: hamming_window(n_fft),
            fft,
        }
    }

    pub fn n_fft(&self) -> usize {
        self.n_fft
    }

    pub fn hop_length(&self) -> usize {
        self.hop_length
    }

    /// Number of complete frames in `n_samples`
    pub fn num_frames(&self, n_samples: usize) -> usize {
        if n_samples < self.n_fft || self.hop_length == 0 {
            return 0;
        }
        (n_samples - self.n_fft) / self.hop_length + 1
    }

    /// `|X|²` per frame, shape (frames, n_fft/2 + 1)
    ///
    /// Trailing samples that do not fill a whole frame are dropped.
    pub fn power_spectrogram(&self, samples: &[f32]) -> Array2<f32> {
        let num_frames = self.num_frames(samples.len());
        let n_freqs = self.n_fft / 2 + 1;
        let mut power = Array2::zeros((num_frames, n_freqs));

        let mut buffer = vec![Complex::new(0.0f32, 0.0); self.n_fft];
        let mut scratch = vec![Complex::new(0.0f32, 0.0); self.fft.get_inplace_scratch_len()];

        for (frame_idx, mut row) in power.outer_iter_mut().enumerate() {
            let start = frame_idx * self.hop_length;
            let frame = &samples[start..start + self.n_fft];

            for ((slot, &x), &w) in buffer.iter_mut().zip(frame).zip(&self.window) {
                *slot = Complex::new(x * w, 0.0);
            }

            self.fft.process_with_scratch(&mut buffer, &mut scratch);

            for (p, c) in row.iter_mut().zip(&buffer[..n_freqs]) {
                *p = c.norm_sqr();
            }
        }

        power
    }
}

impl fmt::Debug for Stft {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Stft")
            .field("n_fft", &self.n_fft)
            .field("hop_length", &self.hop_length)
            .finish()
    }
}

/// Symmetric Hamming window
pub fn hamming_window(length: usize) -> Vec<f32> {
    if length < 2 {
        return vec![1.0; length];
    }
    (0..length)
        .map(|n| 0.54 - 0.46 * (2.0 * PI * n as f32 / (length - 1) as f32).cos())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_count() {
        let stft = Stft::new(2048, 512);
        assert_eq!(stft.num_frames(66150), 126);
        assert_eq!(stft.num_frames(100), 0);
        assert_eq!(stft.power_spectrogram(&vec![0.0; 4096]).shape(), &[5, 1025]);
    }

    #[test]
    fn test_sine_peaks_at_its_bin() {
        let sr = 22050.0f32;
        let n_fft = 2048;
        // Exactly on bin 93
        let freq = 93.0 * sr / n_fft as f32;
        let samples: Vec<f32> = (0..n_fft * 2)
            .map(|i| (2.0 * PI * freq * i as f32 / sr).sin())
            .collect();

        let power = Stft::new(n_fft, 512).power_spectrogram(&samples);
        let row = power.row(0);
        let peak_bin = row
            .iter()
            .enumerate()
            .fold((0, f32::MIN), |best, (i, &p)| if p > best.1 { (i, p) } else { best })
            .0;
        assert_eq!(peak_bin, 93);
    }

    #[test]
    fn test_window_endpoints() {
        let w = hamming_window(2048);
        assert!((w[0] - 0.08).abs() < 1e-6);
        assert!((w[2047] - 0.08).abs() < 1e-6);
        assert!(w[1023] > 0.99);
    }
}
