//! In-memory decoding of WAV (hound) and MP3/FLAC/OGG (symphonia) byte streams

use std::io::Cursor;

use hound::{SampleFormat, WavReader};
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use tracing::{debug, warn};

use crate::error::{AudioError, Result};
use crate::format::AudioFormat;

/// Interleaved PCM as it came out of the decoder
#[derive(Debug, Clone)]
pub struct DecodedAudio {
    /// Interleaved samples in [-1, 1]
    pub samples: Vec<f32>,
    /// Native sample rate in Hz
    pub sample_rate: u32,
    /// Channel count of the interleaved stream
    pub channels: u16,
}

impl DecodedAudio {
    /// Number of frames (samples per channel)
    pub fn frames(&self) -> usize {
        if self.channels == 0 {
            return 0;
        }
        self.samples.len() / self.channels as usize
    }
}

/// Decode a complete byte buffer in the declared format
pub fn decode(bytes: &[u8], format: AudioFormat) -> Result<DecodedAudio> {
    match format {
        AudioFormat::Wav => decode_wav(bytes),
        AudioFormat::Mp3 | AudioFormat::Flac | AudioFormat::Ogg => {
            decode_with_symphonia(bytes, format)
        }
    }
}

fn decode_wav(bytes: &[u8]) -> Result<DecodedAudio> {
    let reader = WavReader::new(Cursor::new(bytes))
        .map_err(|e| AudioError::unsupported_format(format!("Failed to open WAV: {}", e)))?;

    let spec = reader.spec();
    debug!(
        "Decoding WAV: {} Hz, {} channels, {} bits ({:?})",
        spec.sample_rate, spec.channels, spec.bits_per_sample, spec.sample_format
    );

    let samples: Vec<f32> = match (spec.sample_format, spec.bits_per_sample) {
        (SampleFormat::Float, 32) => reader
            .into_samples::<f32>()
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| AudioError::unsupported_format(format!("Failed to read samples: {}", e)))?,
        (SampleFormat::Int, bits @ 8..=32) => {
            let scale = (1u64 << (bits - 1)) as f32;
            reader
                .into_samples::<i32>()
                .map(|s| s.map(|sample| sample as f32 / scale))
                .collect::<std::result::Result<Vec<_>, _>>()
                .map_err(|e| {
                    AudioError::unsupported_format(format!("Failed to read samples: {}", e))
                })?
        }
        (format, bits) => {
            return Err(AudioError::unsupported_format(format!(
                "Unsupported WAV sample format: {:?} {} bits",
                format, bits
            )))
        }
    };

    Ok(DecodedAudio {
        samples,
        sample_rate: spec.sample_rate,
        channels: spec.channels,
    })
}

fn decode_with_symphonia(bytes: &[u8], format: AudioFormat) -> Result<DecodedAudio> {
    let mss = MediaSourceStream::new(Box::new(Cursor::new(bytes.to_vec())), Default::default());

    let mut hint = Hint::new();
    hint.with_extension(format.extension());

    let probed = symphonia::default::get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| AudioError::unsupported_format(format!("Failed to probe {}: {}", format, e)))?;

    let mut reader = probed.format;
    let track = reader
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| AudioError::unsupported_format("No audio tracks found"))?;

    let track_id = track.id;
    let codec_params = track.codec_params.clone();
    let mut sample_rate = codec_params.sample_rate.unwrap_or(0);
    let mut channels = codec_params.channels.map(|c| c.count()).unwrap_or(0);

    let mut decoder = symphonia::default::get_codecs()
        .make(&codec_params, &DecoderOptions::default())
        .map_err(|e| AudioError::unsupported_format(format!("Failed to create decoder: {}", e)))?;

    let mut samples = Vec::new();

    loop {
        let packet = match reader.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                break;
            }
            Err(SymphoniaError::ResetRequired) => break,
            Err(e) => {
                return Err(AudioError::unsupported_format(format!(
                    "Failed to read packet: {}",
                    e
                )))
            }
        };

        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(decoded) => decoded,
            Err(SymphoniaError::DecodeError(e)) => {
                warn!("Skipping corrupt {} packet: {}", format, e);
                continue;
            }
            Err(e) => {
                return Err(AudioError::unsupported_format(format!(
                    "Failed to decode: {}",
                    e
                )))
            }
        };

        let spec = *decoded.spec();
        sample_rate = spec.rate;
        channels = spec.channels.count();

        let mut buf = SampleBuffer::<f32>::new(decoded.capacity() as u64, spec);
        buf.copy_interleaved_ref(decoded);
        samples.extend_from_slice(buf.samples());
    }

    if sample_rate == 0 || channels == 0 {
        if samples.is_empty() {
            return Err(AudioError::EmptyAudio);
        }
        return Err(AudioError::unsupported_format(
            "Could not determine sample rate or channel layout",
        ));
    }

    debug!(
        "Decoded {} via Symphonia: {} Hz, {} channels, {} samples",
        format,
        sample_rate,
        channels,
        samples.len()
    );

    Ok(DecodedAudio {
        samples,
        sample_rate,
        channels: channels as u16,
    })
}
