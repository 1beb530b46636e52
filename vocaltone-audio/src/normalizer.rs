//! Decode → downmix → resample → pad/truncate → peak-normalize
//!
//! Every clip leaving this module is mono, 22.05kHz and exactly
//! `duration_secs` long, so training and inference see identical framing.

use std::path::Path;

use tracing::{debug, info};

use crate::decode::{decode, DecodedAudio};
use crate::error::{AudioError, Result};
use crate::format::AudioFormat;
use crate::resampler::Resampler;
use crate::{TARGET_DURATION_SECS, TARGET_SAMPLE_RATE};

/// Normalized, fixed-length mono audio
#[derive(Debug, Clone, PartialEq)]
pub struct AudioClip {
    samples: Vec<f32>,
    sample_rate: u32,
}

impl AudioClip {
    /// Wrap already-normalized samples
    ///
    /// No padding or scaling happens here; use [`AudioNormalizer`] for raw input.
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
        }
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn into_samples(self) -> Vec<f32> {
        self.samples
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Duration in seconds
    pub fn duration(&self) -> f32 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f32 / self.sample_rate as f32
    }

    /// True when every sample is exactly zero
    pub fn is_silent(&self) -> bool {
        self.samples.iter().all(|&s| s == 0.0)
    }
}

/// Normalizer configuration
#[derive(Debug, Clone)]
pub struct NormalizerConfig {
    /// Canonical output sample rate (default: 22050 Hz)
    pub sample_rate: u32,
    /// Fixed output duration in seconds (default: 3.0)
    pub duration_secs: f32,
    /// Added to the peak before dividing (default: 1e-6)
    pub peak_epsilon: f32,
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        Self {
            sample_rate: TARGET_SAMPLE_RATE,
            duration_secs: TARGET_DURATION_SECS,
            peak_epsilon: 1e-6,
        }
    }
}

impl NormalizerConfig {
    /// Set output sample rate
    pub fn sample_rate(mut self, sample_rate: u32) -> Self {
        self.sample_rate = sample_rate;
        self
    }

    /// Set output duration
    pub fn duration(mut self, secs: f32) -> Self {
        self.duration_secs = secs;
        self
    }

    /// Number of samples every normalized clip has
    pub fn target_len(&self) -> usize {
        (self.sample_rate as f64 * self.duration_secs as f64).round() as usize
    }

    pub fn validate(&self) -> Result<()> {
        if self.sample_rate == 0 {
            return Err(AudioError::invalid_config("sample_rate must be positive"));
        }
        if !self.duration_secs.is_finite() || self.duration_secs <= 0.0 {
            return Err(AudioError::invalid_config("duration_secs must be positive"));
        }
        if !self.peak_epsilon.is_finite() || self.peak_epsilon <= 0.0 {
            return Err(AudioError::invalid_config("peak_epsilon must be positive"));
        }
        Ok(())
    }
}

/// Turns arbitrary supported audio into a canonical [`AudioClip`]
#[derive(Debug, Clone, Default)]
pub struct AudioNormalizer {
    config: NormalizerConfig,
}

impl AudioNormalizer {
    pub fn new(config: NormalizerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &NormalizerConfig {
        &self.config
    }

    /// Normalize a raw byte stream
    ///
    /// `declared` is whatever the caller knows about the encoding: a filename,
    /// an extension (`".wav"`) or a content-type (`"audio/mpeg"`).
    pub fn normalize(&self, bytes: &[u8], declared: &str) -> Result<AudioClip> {
        let format = AudioFormat::from_declared(declared)?;
        self.normalize_format(bytes, format)
    }

    /// Normalize a raw byte stream of a known format
    pub fn normalize_format(&self, bytes: &[u8], format: AudioFormat) -> Result<AudioClip> {
        if bytes.is_empty() {
            return Err(AudioError::EmptyAudio);
        }

        let DecodedAudio {
            samples,
            sample_rate,
            channels,
        } = decode(bytes, format)?;

        self.normalize_samples(&samples, sample_rate, channels)
    }

    /// Read and normalize a file, resolving its format from the extension
    pub fn normalize_file<P: AsRef<Path>>(&self, path: P) -> Result<AudioClip> {
        let path = path.as_ref();
        let format = AudioFormat::from_path(path)?;
        let bytes = std::fs::read(path)?;
        info!("Loading {} ({} bytes)", path.display(), bytes.len());
        self.normalize_format(&bytes, format)
    }

    /// Normalize already-decoded interleaved PCM
    pub fn normalize_samples(
        &self,
        interleaved: &[f32],
        sample_rate: u32,
        channels: u16,
    ) -> Result<AudioClip> {
        if interleaved.is_empty() {
            return Err(AudioError::EmptyAudio);
        }
        if channels == 0 {
            return Err(AudioError::invalid_config("Channel count cannot be zero"));
        }

        let mono = Resampler::downmix(interleaved, channels);
        if mono.is_empty() {
            return Err(AudioError::EmptyAudio);
        }

        let mut resampler = Resampler::new(sample_rate, self.config.sample_rate, 1)?;
        let resampled = resampler.process(&mono)?;

        let mut fixed = fit_to_length(resampled, self.config.target_len());
        peak_normalize(&mut fixed, self.config.peak_epsilon);

        debug!(
            "Normalized {} frames @ {} Hz ({} ch) → {} samples @ {} Hz",
            mono.len(),
            sample_rate,
            channels,
            fixed.len(),
            self.config.sample_rate
        );

        Ok(AudioClip::new(fixed, self.config.sample_rate))
    }
}

/// Zero-pad at the tail or truncate from the end to exactly `target_len`
pub fn fit_to_length(mut samples: Vec<f32>, target_len: usize) -> Vec<f32> {
    samples.resize(target_len, 0.0);
    samples
}

/// Divide by `max(|x|) + epsilon` in place
///
/// Silence stays silence; anything else ends up inside [-1, 1].
pub fn peak_normalize(samples: &mut [f32], epsilon: f32) {
    let peak = samples.iter().fold(0.0f32, |acc, &s| acc.max(s.abs()));
    let denom = peak + epsilon;
    for s in samples.iter_mut() {
        *s /= denom;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fit_pads_at_tail() {
        let out = fit_to_length(vec![0.1, 0.2], 5);
        assert_eq!(out, vec![0.1, 0.2, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_fit_truncates_from_end() {
        let out = fit_to_length(vec![1.0, 2.0, 3.0, 4.0], 2);
        assert_eq!(out, vec![1.0, 2.0]);
    }

    #[test]
    fn test_peak_normalize_silence_unchanged() {
        let mut silent = vec![0.0f32; 64];
        peak_normalize(&mut silent, 1e-6);
        assert!(silent.iter().all(|&s| s == 0.0));
    }

    #[test]
    fn test_peak_normalize_bounds() {
        let mut loud = vec![4.0f32, -8.0, 2.0];
        peak_normalize(&mut loud, 1e-6);
        assert!(loud.iter().all(|s| s.abs() <= 1.0));
        assert!((loud[1] + 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_target_len_default() {
        assert_eq!(NormalizerConfig::default().target_len(), 66150);
    }

    #[test]
    fn test_invalid_config() {
        assert!(AudioNormalizer::new(NormalizerConfig::default().sample_rate(0)).is_err());
        assert!(AudioNormalizer::new(NormalizerConfig::default().duration(0.0)).is_err());
    }

    #[test]
    fn test_normalize_samples_native_rate() {
        let normalizer = AudioNormalizer::default();
        let input: Vec<f32> = (0..22050).map(|i| ((i % 100) as f32 / 100.0) - 0.5).collect();
        let clip = normalizer.normalize_samples(&input, 22050, 1).unwrap();

        assert_eq!(clip.len(), 66150);
        assert_eq!(clip.sample_rate(), 22050);
        assert!((clip.duration() - 3.0).abs() < 1e-6);
        assert!(clip.samples()[22050..].iter().all(|&s| s == 0.0));
        assert!(clip.samples().iter().all(|s| s.abs() <= 1.0));
    }

    #[test]
    fn test_empty_samples_rejected() {
        let normalizer = AudioNormalizer::default();
        let err = normalizer.normalize_samples(&[], 22050, 1).unwrap_err();
        assert!(matches!(err, AudioError::EmptyAudio));
    }
}
