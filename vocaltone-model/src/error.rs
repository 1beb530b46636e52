//! Error types for classification and scoring

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ModelError>;

#[derive(Error, Debug)]
pub enum ModelError {
    /// Inference requested before any weights were loaded
    #[error("Model not loaded")]
    ModelNotLoaded,

    /// Prediction handed to the scorer is malformed
    #[error("Invalid prediction: {0}")]
    InvalidPrediction(String),

    /// Feature or parameter shapes disagree with the architecture
    #[error("Shape mismatch: {0}")]
    ShapeMismatch(String),

    /// Label space of the weights differs from the classifier's, or a name is unknown
    #[error("Label mismatch: {0}")]
    LabelMismatch(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ModelError {
    pub fn invalid_prediction<S: Into<String>>(msg: S) -> Self {
        Self::InvalidPrediction(msg.into())
    }

    pub fn shape_mismatch<S: Into<String>>(msg: S) -> Self {
        Self::ShapeMismatch(msg.into())
    }

    pub fn label_mismatch<S: Into<String>>(msg: S) -> Self {
        Self::LabelMismatch(msg.into())
    }

    pub fn invalid_config<S: Into<String>>(msg: S) -> Self {
        Self::InvalidConfig(msg.into())
    }
}

impl From<ndarray::ShapeError> for ModelError {
    fn from(err: ndarray::ShapeError) -> Self {
        Self::ShapeMismatch(err.to_string())
    }
}
