//! Error types for feature extraction

use thiserror::Error;

pub type Result<T> = std::result::Result<T, FeatureError>;

#[derive(Error, Debug)]
pub enum FeatureError {
    /// Input shorter than one analysis frame, or otherwise unusable
    #[error("Feature extraction failed: {0}")]
    FeatureExtraction(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl FeatureError {
    pub fn extraction<S: Into<String>>(msg: S) -> Self {
        Self::FeatureExtraction(msg.into())
    }

    pub fn invalid_config<S: Into<String>>(msg: S) -> Self {
        Self::InvalidConfig(msg.into())
    }
}
