//! Bytes → normalized clip → features → prediction → satisfaction report

use std::path::Path;

use anyhow::Context;
use tracing::{debug, info};
use vocaltone_audio::AudioNormalizer;
use vocaltone_features::FeatureExtractor;
use vocaltone_model::{ClassifierWeights, EmotionClassifier, LabelSpace, SatisfactionScorer};

use crate::config::{AppConfig, DEFAULT_MAX_FILE_BYTES};
use crate::error::{PipelineError, Result};
use crate::report::EmotionReport;

/// Analysis stages shared by every command
///
/// All stages work through `&self`, so one pipeline behind an `Arc` serves
/// concurrent batch items.
pub struct EmotionPipeline {
    normalizer: AudioNormalizer,
    extractor: FeatureExtractor,
    classifier: EmotionClassifier,
    scorer: SatisfactionScorer,
    max_file_bytes: u64,
}

impl EmotionPipeline {
    /// Default audio and feature stages around `classifier`
    pub fn new(classifier: EmotionClassifier) -> Self {
        Self {
            normalizer: AudioNormalizer::default(),
            extractor: FeatureExtractor::default(),
            classifier,
            scorer: SatisfactionScorer::new(),
            max_file_bytes: DEFAULT_MAX_FILE_BYTES,
        }
    }

    pub fn with_max_file_bytes(mut self, limit: u64) -> Self {
        self.max_file_bytes = limit;
        self
    }

    /// Load the label space and trained weights named by `config`
    pub fn from_config(config: &AppConfig) -> anyhow::Result<Self> {
        info!("Loading labels from {}", config.labels_path.display());
        let labels = LabelSpace::load_json(&config.labels_path).with_context(|| {
            format!(
                "Failed to load labels from {} (run `vocaltone train` first)",
                config.labels_path.display()
            )
        })?;

        info!("Loading model from {}", config.model_path.display());
        let weights = ClassifierWeights::load_json(&config.model_path).with_context(|| {
            format!(
                "Failed to load model from {} (run `vocaltone train` first)",
                config.model_path.display()
            )
        })?;

        let classifier = EmotionClassifier::with_weights(labels, weights)
            .context("Model weights do not match the label space")?;
        info!("✓ Model loaded");

        Ok(Self::new(classifier).with_max_file_bytes(config.max_file_bytes))
    }

    pub fn classifier(&self) -> &EmotionClassifier {
        &self.classifier
    }

    pub fn max_file_bytes(&self) -> u64 {
        self.max_file_bytes
    }

    /// Analyze an in-memory recording
    ///
    /// `declared` is a filename, extension or content-type.
    pub fn analyze_bytes(
        &self,
        bytes: &[u8],
        declared: &str,
        include_descriptors: bool,
    ) -> Result<EmotionReport> {
        self.check_size(bytes.len() as u64)?;

        let clip = self.normalizer.normalize(bytes, declared)?;
        let features = self.extractor.extract(&clip)?;
        debug!("Features for {}: {:?}", declared, features.shape());

        let prediction = self.classifier.predict(&features)?;
        let score = self.scorer.score(&prediction)?;
        debug!(
            "{}: {} ({:.3}) → {:.2}",
            declared,
            prediction.emotion(),
            prediction.confidence(),
            score
        );

        let report = EmotionReport::new(&prediction, score);
        if include_descriptors {
            let descriptors = self.extractor.descriptors(&clip)?;
            return Ok(report.with_descriptors(descriptors));
        }
        Ok(report)
    }

    /// Analyze a file, rejecting it by size before reading
    pub fn analyze_file<P: AsRef<Path>>(
        &self,
        path: P,
        include_descriptors: bool,
    ) -> Result<EmotionReport> {
        let path = path.as_ref();
        self.check_size(std::fs::metadata(path)?.len())?;

        let bytes = std::fs::read(path)?;
        let declared = path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or_default();
        self.analyze_bytes(&bytes, declared, include_descriptors)
    }

    fn check_size(&self, size: u64) -> Result<()> {
        if size > self.max_file_bytes {
            return Err(PipelineError::FileTooLarge {
                size,
                limit: self.max_file_bytes,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vocaltone_model::ModelError;

    #[test]
    fn test_unloaded_classifier() {
        let pipeline = EmotionPipeline::new(EmotionClassifier::new(LabelSpace::standard().clone()));
        let wav = {
            let spec = hound::WavSpec {
                channels: 1,
                sample_rate: 22050,
                bits_per_sample: 16,
                sample_format: hound::SampleFormat::Int,
            };
            let mut cursor = std::io::Cursor::new(Vec::new());
            {
                let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
                for i in 0..22050 {
                    writer.write_sample(((i % 100) as i16 - 50) * 100).unwrap();
                }
                writer.finalize().unwrap();
            }
            cursor.into_inner()
        };

        let err = pipeline.analyze_bytes(&wav, "clip.wav", false).unwrap_err();
        assert!(matches!(err, PipelineError::Model(ModelError::ModelNotLoaded)));
    }

    #[test]
    fn test_size_limit_before_decoding() {
        let pipeline = EmotionPipeline::new(EmotionClassifier::new(LabelSpace::standard().clone()))
            .with_max_file_bytes(8);
        let err = pipeline
            .analyze_bytes(&[0u8; 9], "clip.wav", false)
            .unwrap_err();
        assert_eq!(err.kind(), "file_too_large");

        let err = pipeline.analyze_bytes(b"abc", "clip.aiff", false).unwrap_err();
        assert_eq!(err.kind(), "unsupported_format");
    }
}
