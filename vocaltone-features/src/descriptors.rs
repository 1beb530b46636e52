//! Clip-level acoustic descriptors for reporting
//!
//! These never reach the classifier; they give a human reading a report some
//! context about the recording (brightness, loudness, noisiness).

use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::error::{FeatureError, Result};
use crate::stft::Stft;

/// Fraction of spectral energy below the roll-off frequency
pub const ROLLOFF_PERCENT: f32 = 0.85;

/// Per-clip means of frame-level descriptors
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AcousticDescriptors {
    /// Sign changes per sample
    pub zcr: f32,
    /// Magnitude-weighted mean frequency (Hz)
    pub spectral_centroid: f32,
    /// Frequency below which 85% of the magnitude lies (Hz)
    pub spectral_rolloff: f32,
    /// Mean of the per-frame max-normalized 12-bin chroma vector
    pub chroma: f32,
    /// Root-mean-square amplitude
    pub rms: f32,
}

/// Compute descriptors over the same frames the extractor uses
pub fn compute_descriptors(
    samples: &[f32],
    sample_rate: u32,
    stft: &Stft,
) -> Result<AcousticDescriptors> {
    let n_fft = stft.n_fft();
    let hop = stft.hop_length();
    let num_frames = stft.num_frames(samples.len());
    if num_frames == 0 {
        return Err(FeatureError::extraction(format!(
            "need at least {} samples for descriptors, got {}",
            n_fft,
            samples.len()
        )));
    }

    let frames = (0..num_frames).map(|i| &samples[i * hop..i * hop + n_fft]);
    let zcr = mean(frames.clone().map(zero_crossing_rate));
    let rms = mean(frames.map(root_mean_square));

    let power = stft.power_spectrogram(samples);
    let magnitude = power.mapv(f32::sqrt);
    let bin_hz = sample_rate as f32 / n_fft as f32;

    let spectral_centroid = mean(magnitude.outer_iter().map(|row| {
        let total: f32 = row.sum();
        if total <= 0.0 {
            return 0.0;
        }
        row.iter()
            .enumerate()
            .map(|(k, &m)| k as f32 * bin_hz * m)
            .sum::<f32>()
            / total
    }));

    let spectral_rolloff = mean(magnitude.outer_iter().map(|row| {
        let total: f32 = row.sum();
        if total <= 0.0 {
            return 0.0;
        }
        let threshold = ROLLOFF_PERCENT * total;
        let mut cumulative = 0.0;
        for (k, &m) in row.iter().enumerate() {
            cumulative += m;
            if cumulative >= threshold {
                return k as f32 * bin_hz;
            }
        }
        (row.len() - 1) as f32 * bin_hz
    }));

    let chroma = chroma_mean(&power, bin_hz);

    Ok(AcousticDescriptors {
        zcr,
        spectral_centroid,
        spectral_rolloff,
        chroma,
        rms,
    })
}

fn mean<I: Iterator<Item = f32>>(values: I) -> f32 {
    let (sum, count) = values.fold((0.0f32, 0usize), |(s, c), v| (s + v, c + 1));
    if count == 0 {
        0.0
    } else {
        sum / count as f32
    }
}

fn zero_crossing_rate(frame: &[f32]) -> f32 {
    let crossings = frame
        .windows(2)
        .filter(|w| (w[0] >= 0.0) != (w[1] >= 0.0))
        .count();
    crossings as f32 / frame.len() as f32
}

fn root_mean_square(frame: &[f32]) -> f32 {
    (frame.iter().map(|&x| x * x).sum::<f32>() / frame.len() as f32).sqrt()
}

/// Pitch class (C = 0) of a frequency, or `None` below A0
fn pitch_class(freq: f32) -> Option<usize> {
    if freq < 27.5 {
        return None;
    }
    let midi = 69.0 + 12.0 * (freq / 440.0).log2();
    Some((midi.round() as i64).rem_euclid(12) as usize)
}

fn chroma_mean(power: &Array2<f32>, bin_hz: f32) -> f32 {
    let classes: Vec<Option<usize>> = (0..power.ncols())
        .map(|k| pitch_class(k as f32 * bin_hz))
        .collect();

    mean(power.outer_iter().map(|row| {
        let mut bins = [0.0f32; 12];
        for (&p, class) in row.iter().zip(&classes) {
            if let Some(c) = class {
                bins[*c] += p;
            }
        }
        let peak = bins.iter().fold(0.0f32, |a, &b| a.max(b));
        if peak <= 0.0 {
            return 0.0;
        }
        bins.iter().map(|b| b / peak).sum::<f32>() / 12.0
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use std::f32::consts::PI;

    fn tone(freq: f32, amplitude: f32) -> Vec<f32> {
        (0..22050)
            .map(|i| (2.0 * PI * freq * i as f32 / 22050.0).sin() * amplitude)
            .collect()
    }

    #[test]
    fn test_pure_tone_descriptors() {
        let stft = Stft::new(2048, 512);
        let d = compute_descriptors(&tone(1000.0, 0.5), 22050, &stft).unwrap();

        assert_abs_diff_eq!(d.rms, 0.5 / 2f32.sqrt(), epsilon = 0.01);
        assert_abs_diff_eq!(d.zcr, 2.0 * 1000.0 / 22050.0, epsilon = 0.005);
        assert_abs_diff_eq!(d.spectral_centroid, 1000.0, epsilon = 150.0);
        assert_abs_diff_eq!(d.spectral_rolloff, 1000.0, epsilon = 100.0);
        assert!(d.chroma > 0.0 && d.chroma <= 1.0);
    }

    #[test]
    fn test_silence_descriptors() {
        let stft = Stft::new(2048, 512);
        let d = compute_descriptors(&vec![0.0; 4096], 22050, &stft).unwrap();

        assert_eq!(d.rms, 0.0);
        assert_eq!(d.spectral_centroid, 0.0);
        assert_eq!(d.spectral_rolloff, 0.0);
        assert_eq!(d.chroma, 0.0);
    }

    #[test]
    fn test_pitch_class() {
        assert_eq!(pitch_class(440.0), Some(9));
        assert_eq!(pitch_class(261.63), Some(0));
        assert_eq!(pitch_class(10.0), None);
    }
}
