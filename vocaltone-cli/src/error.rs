//! Error types for the analysis pipeline

use thiserror::Error;
use vocaltone_audio::AudioError;
use vocaltone_features::FeatureError;
use vocaltone_model::ModelError;

pub type Result<T> = std::result::Result<T, PipelineError>;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Audio(#[from] AudioError),

    #[error(transparent)]
    Features(#[from] FeatureError),

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error("File is {size} bytes, limit is {limit}")]
    FileTooLarge { size: u64, limit: u64 },

    #[error("Batch of {count} files exceeds the limit of {limit}")]
    BatchTooLarge { count: usize, limit: usize },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl PipelineError {
    /// Stable name of the failure, used in batch reports
    pub fn kind(&self) -> &'static str {
        match self {
            PipelineError::Audio(AudioError::UnsupportedFormat(_)) => "unsupported_format",
            PipelineError::Audio(AudioError::EmptyAudio) => "empty_audio",
            PipelineError::Audio(_) => "audio",
            PipelineError::Features(FeatureError::FeatureExtraction(_)) => "feature_extraction",
            PipelineError::Features(_) => "features",
            PipelineError::Model(ModelError::ModelNotLoaded) => "model_not_loaded",
            PipelineError::Model(ModelError::InvalidPrediction(_)) => "invalid_prediction",
            PipelineError::Model(_) => "model",
            PipelineError::FileTooLarge { .. } => "file_too_large",
            PipelineError::BatchTooLarge { .. } => "batch_too_large",
            PipelineError::Io(_) => "io",
        }
    }
}
