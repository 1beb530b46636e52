//! Error types for training

use thiserror::Error;
use vocaltone_model::ModelError;

pub type Result<T> = std::result::Result<T, TrainError>;

#[derive(Error, Debug)]
pub enum TrainError {
    /// A class has too few samples to appear in every partition
    #[error("Insufficient data: '{class}' has {count} samples, need at least {required}")]
    InsufficientData {
        class: String,
        count: usize,
        required: usize,
    },

    #[error("Training corpus is empty")]
    EmptyCorpus,

    /// Feature matrices disagree with each other or with the architecture
    #[error("Shape mismatch: {0}")]
    ShapeMismatch(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Model error: {0}")]
    Model(#[from] ModelError),

    /// The checkpoint sink refused a snapshot
    #[error("Checkpoint error: {0}")]
    Checkpoint(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl TrainError {
    pub fn insufficient_data<S: Into<String>>(class: S, count: usize, required: usize) -> Self {
        Self::InsufficientData {
            class: class.into(),
            count,
            required,
        }
    }

    pub fn shape_mismatch<S: Into<String>>(msg: S) -> Self {
        Self::ShapeMismatch(msg.into())
    }

    pub fn invalid_config<S: Into<String>>(msg: S) -> Self {
        Self::InvalidConfig(msg.into())
    }

    pub fn checkpoint<S: Into<String>>(msg: S) -> Self {
        Self::Checkpoint(msg.into())
    }
}
