//! Supported container/codec formats and their resolution from declared names

use std::fmt;
use std::path::Path;

use crate::error::{AudioError, Result};

/// Audio encodings accepted at the core boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AudioFormat {
    Wav,
    Mp3,
    Flac,
    Ogg,
}

impl AudioFormat {
    /// All supported formats, in the order they are advertised
    pub const ALL: [AudioFormat; 4] = [
        AudioFormat::Wav,
        AudioFormat::Mp3,
        AudioFormat::Flac,
        AudioFormat::Ogg,
    ];

    /// Canonical file extension (without the dot)
    pub fn extension(self) -> &'static str {
        match self {
            AudioFormat::Wav => "wav",
            AudioFormat::Mp3 => "mp3",
            AudioFormat::Flac => "flac",
            AudioFormat::Ogg => "ogg",
        }
    }

    /// Resolve a format from an extension, with or without the leading dot
    ///
    /// Matching is case-insensitive: `"WAV"`, `".wav"` and `"wav"` all resolve.
    pub fn from_extension(ext: &str) -> Result<Self> {
        let ext = ext.trim().trim_start_matches('.').to_ascii_lowercase();
        match ext.as_str() {
            "wav" | "wave" => Ok(AudioFormat::Wav),
            "mp3" => Ok(AudioFormat::Mp3),
            "flac" => Ok(AudioFormat::Flac),
            "ogg" | "oga" => Ok(AudioFormat::Ogg),
            _ => Err(AudioError::unsupported_format(format!(
                "extension '{}' (supported: {})",
                ext,
                Self::supported_list()
            ))),
        }
    }

    /// Resolve a format from a MIME content-type such as `audio/x-wav`
    ///
    /// Parameters after `;` are ignored.
    pub fn from_content_type(content_type: &str) -> Result<Self> {
        let mime = content_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();

        match mime.as_str() {
            "audio/wav" | "audio/x-wav" | "audio/wave" | "audio/vnd.wave" => Ok(AudioFormat::Wav),
            "audio/mpeg" | "audio/mp3" => Ok(AudioFormat::Mp3),
            "audio/flac" | "audio/x-flac" => Ok(AudioFormat::Flac),
            "audio/ogg" | "audio/vorbis" | "application/ogg" => Ok(AudioFormat::Ogg),
            _ => Err(AudioError::unsupported_format(format!(
                "content-type '{}'",
                mime
            ))),
        }
    }

    /// Resolve a format from a filename or path by its extension
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let ext = path.extension().and_then(|e| e.to_str()).ok_or_else(|| {
            AudioError::unsupported_format(format!(
                "could not determine file extension of '{}'",
                path.display()
            ))
        })?;
        Self::from_extension(ext)
    }

    /// Resolve whatever the caller declared: a content-type, a filename or a bare extension
    pub fn from_declared(declared: &str) -> Result<Self> {
        let declared = declared.trim();
        if declared.contains('/') && !declared.contains('.') {
            return Self::from_content_type(declared);
        }
        if Path::new(declared).extension().is_some() {
            return Self::from_path(declared);
        }
        Self::from_extension(declared)
    }

    fn supported_list() -> String {
        Self::ALL
            .iter()
            .map(|f| format!(".{}", f.extension()))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for AudioFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension_variants() {
        assert_eq!(AudioFormat::from_extension("wav").unwrap(), AudioFormat::Wav);
        assert_eq!(AudioFormat::from_extension(".MP3").unwrap(), AudioFormat::Mp3);
        assert_eq!(AudioFormat::from_extension("Flac").unwrap(), AudioFormat::Flac);
        assert_eq!(AudioFormat::from_extension(".ogg").unwrap(), AudioFormat::Ogg);
    }

    #[test]
    fn test_unsupported_extension() {
        let err = AudioFormat::from_extension("aac").unwrap_err();
        assert!(matches!(err, AudioError::UnsupportedFormat(_)));
    }

    #[test]
    fn test_declared_forms() {
        assert_eq!(AudioFormat::from_declared("clip.wav").unwrap(), AudioFormat::Wav);
        assert_eq!(
            AudioFormat::from_declared("/tmp/uploads/JE_h12.flac").unwrap(),
            AudioFormat::Flac
        );
        assert_eq!(
            AudioFormat::from_declared("audio/mpeg").unwrap(),
            AudioFormat::Mp3
        );
        assert_eq!(
            AudioFormat::from_declared("audio/ogg; codecs=vorbis").unwrap(),
            AudioFormat::Ogg
        );
        assert_eq!(AudioFormat::from_declared(".wav").unwrap(), AudioFormat::Wav);
        assert!(AudioFormat::from_declared("notes.txt").is_err());
        assert!(AudioFormat::from_declared("video/mp4").is_err());
    }
}
