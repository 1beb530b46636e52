//! Error types for audio normalization

use thiserror::Error;

pub type Result<T> = std::result::Result<T, AudioError>;

#[derive(Error, Debug)]
pub enum AudioError {
    /// Declared format is not one of wav/mp3/flac/ogg, or the bytes could not be decoded
    #[error("Unsupported audio format: {0}")]
    UnsupportedFormat(String),

    /// Decoding succeeded but produced no samples
    #[error("Audio contains no samples")]
    EmptyAudio,

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Resampling error: {0}")]
    ResampleError(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl AudioError {
    pub fn unsupported_format<S: Into<String>>(msg: S) -> Self {
        Self::UnsupportedFormat(msg.into())
    }

    pub fn invalid_config<S: Into<String>>(msg: S) -> Self {
        Self::InvalidConfig(msg.into())
    }

    pub fn resample<S: Into<String>>(msg: S) -> Self {
        Self::ResampleError(msg.into())
    }
}
