//! Dual cepstral + mel-spectral feature extraction
//!
//! ```text
//! samples ─> STFT power (frames × 1025)
//!          ─> mel filterbank (frames × 128)
//!               ├─> power_to_db(ref = max)          ─> mel part   (128)
//!               └─> power_to_db(ref = 1) ─> DCT-II  ─> cepstra    (40)
//!          ─> [cepstra | mel] (frames × 168) ─> per-column z-score
//! ```

use ndarray::{concatenate, Array2, Axis};
use tracing::debug;
use vocaltone_audio::AudioClip;

use crate::config::FeatureConfig;
use crate::dct::dct_matrix;
use crate::descriptors::{compute_descriptors, AcousticDescriptors};
use crate::error::{FeatureError, Result};
use crate::matrix::FeatureMatrix;
use crate::mel::{power_to_db, MelFilterbank};
use crate::stft::Stft;

/// Stateless feature extractor; the FFT plan, filterbank and DCT basis are
/// built once and shared by every call
#[derive(Debug)]
pub struct FeatureExtractor {
    config: FeatureConfig,
    stft: Stft,
    mel: MelFilterbank,
    dct: Array2<f32>,
}

impl FeatureExtractor {
    /// Create a new extractor
    pub fn new(config: FeatureConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(config))
    }

    fn build(config: FeatureConfig) -> Self {
        let stft = Stft::new(config.n_fft, config.hop_length);
        let mel = MelFilterbank::new(
            config.n_mels,
            config.n_fft,
            config.sample_rate as f32,
            config.f_min,
            config.f_max,
        );
        let dct = dct_matrix(config.n_mfcc, config.n_mels);

        Self {
            config,
            stft,
            mel,
            dct,
        }
    }

    pub fn config(&self) -> &FeatureConfig {
        &self.config
    }

    /// Columns of every matrix this extractor produces
    pub fn feature_dim(&self) -> usize {
        self.config.feature_dim()
    }

    /// Extract standardized features from a normalized clip
    pub fn extract(&self, clip: &AudioClip) -> Result<FeatureMatrix> {
        self.check_rate(clip)?;
        self.extract_samples(clip.samples())
    }

    /// Extract standardized features from mono samples at the configured rate
    ///
    /// Fails with [`FeatureError::FeatureExtraction`] when there are fewer
    /// samples than one analysis frame.
    pub fn extract_samples(&self, samples: &[f32]) -> Result<FeatureMatrix> {
        if samples.len() < self.config.n_fft {
            return Err(FeatureError::extraction(format!(
                "need at least {} samples for one frame, got {}",
                self.config.n_fft,
                samples.len()
            )));
        }

        let power = self.stft.power_spectrogram(samples);
        let mel = self.mel.apply(&power);

        let mel_max = mel.iter().fold(0.0f32, |acc, &v| acc.max(v));
        let mel_db = power_to_db(&mel, mel_max, self.config.top_db);

        let log_mel = power_to_db(&mel, 1.0, self.config.top_db);
        let cepstra = log_mel.dot(&self.dct.t());

        let combined = concatenate(Axis(1), &[cepstra.view(), mel_db.view()])
            .map_err(|e| FeatureError::extraction(format!("Failed to join features: {}", e)))?;

        debug!(
            "Extracted features from {} samples: shape {:?}",
            samples.len(),
            combined.shape()
        );

        Ok(FeatureMatrix::new(combined).standardized(self.config.std_epsilon))
    }

    /// Informational acoustic descriptors of a clip
    pub fn descriptors(&self, clip: &AudioClip) -> Result<AcousticDescriptors> {
        self.check_rate(clip)?;
        compute_descriptors(clip.samples(), self.config.sample_rate, &self.stft)
    }

    fn check_rate(&self, clip: &AudioClip) -> Result<()> {
        if clip.sample_rate() != self.config.sample_rate {
            return Err(FeatureError::extraction(format!(
                "clip is {} Hz but extractor expects {} Hz",
                clip.sample_rate(),
                self.config.sample_rate
            )));
        }
        Ok(())
    }
}

impl Default for FeatureExtractor {
    fn default() -> Self {
        Self::build(FeatureConfig::default())
    }
}
