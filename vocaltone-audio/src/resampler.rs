//! Audio resampling with rubato
//!
//! Converts whole decoded clips from their native rate to the canonical
//! 22.05kHz used by feature extraction.

use rubato::{
    Resampler as RubatoResampler, SincFixedIn, SincInterpolationParameters,
    SincInterpolationType, WindowFunction,
};
use tracing::debug;

use crate::error::{AudioError, Result};

/// Resampler for converting audio to target sample rate
pub struct Resampler {
    source_rate: u32,
    target_rate: u32,
    channels: u16,
    resampler: Option<SincFixedIn<f32>>,
}

impl Resampler {
    /// Create new resampler
    ///
    /// # Arguments
    ///
    /// * `source_rate` - Source sample rate (e.g., 44100)
    /// * `target_rate` - Target sample rate (typically 22050)
    /// * `channels` - Number of channels (1 = mono, 2 = stereo)
    pub fn new(source_rate: u32, target_rate: u32, channels: u16) -> Result<Self> {
        if source_rate == 0 || target_rate == 0 {
            return Err(AudioError::invalid_config("Sample rate cannot be zero"));
        }

        if channels == 0 {
            return Err(AudioError::invalid_config("Channel count cannot be zero"));
        }

        let resampler = if source_rate != target_rate {
            Some(Self::create_resampler(source_rate, target_rate, channels)?)
        } else {
            None
        };

        Ok(Self {
            source_rate,
            target_rate,
            channels,
            resampler,
        })
    }

    fn create_resampler(
        source_rate: u32,
        target_rate: u32,
        channels: u16,
    ) -> Result<SincFixedIn<f32>> {
        let params = SincInterpolationParameters {
            sinc_len: 256,
            f_cutoff: 0.95,
            interpolation: SincInterpolationType::Linear,
            oversampling_factor: 256,
            window: WindowFunction::BlackmanHarris2,
        };

        // 100ms of input per chunk
        let chunk_size = ((source_rate as f32 * 0.1) as usize).max(1);

        SincFixedIn::<f32>::new(
            target_rate as f64 / source_rate as f64,
            2.0,
            params,
            chunk_size,
            channels as usize,
        )
        .map_err(|e| AudioError::resample(format!("Failed to create resampler: {:?}", e)))
    }

    /// Resample a complete interleaved signal
    ///
    /// The whole input is consumed in fixed chunks, the tail is flushed, and the
    /// filter delay is trimmed so the output is time-aligned with the input and
    /// has exactly [`expected_output_len`](Self::expected_output_len) samples.
    pub fn process(&mut self, input: &[f32]) -> Result<Vec<f32>> {
        let channels = self.channels as usize;
        let expected = self.expected_output_len(input.len());

        let resampler = match self.resampler.as_mut() {
            Some(resampler) => resampler,
            None => return Ok(input.to_vec()),
        };

        if input.is_empty() {
            return Ok(Vec::new());
        }

        debug!(
            "Resampling {} frames from {} Hz to {} Hz",
            input.len() / channels,
            self.source_rate,
            self.target_rate
        );

        // rubato expects planar buffers
        let frames = input.len() / channels;
        let mut planar_input = vec![vec![0.0f32; frames]; channels];
        for (frame_idx, frame) in input.chunks_exact(channels).enumerate() {
            for (ch_idx, &sample) in frame.iter().enumerate() {
                planar_input[ch_idx][frame_idx] = sample;
            }
        }

        resampler.reset();
        let delay = resampler.output_delay();
        let chunk_size = resampler.input_frames_next();
        let mut planar_output: Vec<Vec<f32>> = vec![Vec::new(); channels];

        let mut start = 0;
        while start < frames {
            let end = (start + chunk_size).min(frames);
            let block: Vec<&[f32]> = planar_input.iter().map(|ch| &ch[start..end]).collect();

            let out = if end - start == chunk_size {
                resampler.process(&block, None)
            } else {
                resampler.process_partial(Some(&block), None)
            }
            .map_err(|e| AudioError::resample(format!("Resampling failed: {:?}", e)))?;

            for (dst, src) in planar_output.iter_mut().zip(out.iter()) {
                dst.extend_from_slice(src);
            }
            start = end;
        }

        // Flush until the delayed tail has been produced
        let needed_frames = delay + expected / channels;
        while planar_output[0].len() < needed_frames {
            let out = resampler
                .process_partial(None::<&[Vec<f32>]>, None)
                .map_err(|e| AudioError::resample(format!("Resampler flush failed: {:?}", e)))?;
            if out[0].is_empty() {
                break;
            }
            for (dst, src) in planar_output.iter_mut().zip(out.iter()) {
                dst.extend_from_slice(src);
            }
        }

        let output_frames = expected / channels;
        let mut interleaved_output = Vec::with_capacity(expected);
        for frame_idx in delay..delay + output_frames {
            for channel_data in &planar_output {
                interleaved_output.push(channel_data.get(frame_idx).copied().unwrap_or(0.0));
            }
        }

        Ok(interleaved_output)
    }

    /// Convert interleaved multi-channel audio to mono by averaging each frame
    pub fn downmix(interleaved: &[f32], channels: u16) -> Vec<f32> {
        match channels {
            0 | 1 => interleaved.to_vec(),
            n => interleaved
                .chunks_exact(n as usize)
                .map(|frame| frame.iter().sum::<f32>() / n as f32)
                .collect(),
        }
    }

    /// Convert stereo to mono by averaging channels
    pub fn stereo_to_mono(stereo: &[f32]) -> Vec<f32> {
        Self::downmix(stereo, 2)
    }

    /// Get expected output length for given input length
    pub fn expected_output_len(&self, input_len: usize) -> usize {
        if self.resampler.is_none() {
            return input_len;
        }

        let frames = input_len / self.channels as usize;
        let output_frames =
            (frames as f64 * self.target_rate as f64 / self.source_rate as f64).round() as usize;
        output_frames * self.channels as usize
    }

    pub fn source_rate(&self) -> u32 {
        self.source_rate
    }

    pub fn target_rate(&self) -> u32 {
        self.target_rate
    }
}
