//! Feature extractor configuration

use vocaltone_audio::TARGET_SAMPLE_RATE;

use crate::error::{FeatureError, Result};

/// Analysis parameters shared by training and inference
///
/// Changing any of these invalidates trained weights: the classifier's input
/// dimension is `n_mfcc + n_mels`.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureConfig {
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// FFT size, also the frame length
    pub n_fft: usize,
    /// Frame shift in samples
    pub hop_length: usize,
    /// Cepstral coefficients kept after the DCT
    pub n_mfcc: usize,
    /// Mel filterbank size
    pub n_mels: usize,
    /// Lower frequency bound
    pub f_min: f32,
    /// Upper frequency bound
    pub f_max: f32,
    /// Dynamic range kept by `power_to_db`, in dB below the reference peak
    pub top_db: f32,
    /// Columns with std at or below this are only mean-centred
    pub std_epsilon: f32,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            sample_rate: TARGET_SAMPLE_RATE,
            n_fft: 2048,
            hop_length: 512,
            n_mfcc: 40,
            n_mels: 128,
            f_min: 0.0,
            f_max: TARGET_SAMPLE_RATE as f32 / 2.0,
            top_db: 80.0,
            std_epsilon: 1e-6,
        }
    }
}

impl FeatureConfig {
    /// Set number of cepstral coefficients
    pub fn n_mfcc(mut self, n_mfcc: usize) -> Self {
        self.n_mfcc = n_mfcc;
        self
    }

    /// Set number of mel bands
    pub fn n_mels(mut self, n_mels: usize) -> Self {
        self.n_mels = n_mels;
        self
    }

    /// Set FFT size and hop
    pub fn frame(mut self, n_fft: usize, hop_length: usize) -> Self {
        self.n_fft = n_fft;
        self.hop_length = hop_length;
        self
    }

    /// Columns of every extracted matrix
    pub fn feature_dim(&self) -> usize {
        self.n_mfcc + self.n_mels
    }

    /// Number of frequency bins in the one-sided spectrum
    pub fn n_freqs(&self) -> usize {
        self.n_fft / 2 + 1
    }

    /// Frames produced for `n_samples` of input (no centering)
    pub fn num_frames(&self, n_samples: usize) -> usize {
        if n_samples < self.n_fft || self.hop_length == 0 {
            return 0;
        }
        (n_samples - self.n_fft) / self.hop_length + 1
    }

    pub fn validate(&self) -> Result<()> {
        if self.sample_rate == 0 {
            return Err(FeatureError::invalid_config("sample_rate must be positive"));
        }
        if self.n_fft < 2 || self.hop_length == 0 {
            return Err(FeatureError::invalid_config(
                "n_fft must be at least 2 and hop_length positive",
            ));
        }
        if self.n_mels == 0 {
            return Err(FeatureError::invalid_config("n_mels must be positive"));
        }
        if self.n_mfcc == 0 || self.n_mfcc > self.n_mels {
            return Err(FeatureError::invalid_config(format!(
                "n_mfcc must be in 1..={} (n_mels), got {}",
                self.n_mels, self.n_mfcc
            )));
        }
        let nyquist = self.sample_rate as f32 / 2.0;
        if !(self.f_min >= 0.0 && self.f_min < self.f_max && self.f_max <= nyquist) {
            return Err(FeatureError::invalid_config(format!(
                "frequency range must satisfy 0 <= f_min < f_max <= {}, got {}..{}",
                nyquist, self.f_min, self.f_max
            )));
        }
        if !self.top_db.is_finite() || self.top_db <= 0.0 {
            return Err(FeatureError::invalid_config("top_db must be positive"));
        }
        if !self.std_epsilon.is_finite() || self.std_epsilon < 0.0 {
            return Err(FeatureError::invalid_config("std_epsilon must be non-negative"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_dimensions() {
        let config = FeatureConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.feature_dim(), 168);
        assert_eq!(config.n_freqs(), 1025);
        assert_eq!(config.num_frames(66150), 126);
        assert_eq!(config.num_frames(2048), 1);
        assert_eq!(config.num_frames(2047), 0);
    }

    #[test]
    fn test_invalid_configs() {
        assert!(FeatureConfig::default().n_mfcc(0).validate().is_err());
        assert!(FeatureConfig::default().n_mfcc(200).validate().is_err());
        assert!(FeatureConfig::default().frame(2048, 0).validate().is_err());

        let mut config = FeatureConfig::default();
        config.f_max = 20000.0;
        assert!(config.validate().is_err());
    }
}
