// Audio ingestion
// Decodes WAV bytes into a normalized sample buffer the cue layer can slice

use hound::{SampleFormat, WavReader};
use std::io::Cursor;
use std::path::Path;
use std::time::Duration;

use super::AudioError;

/// A decoded clip: interleaved samples normalized to [-1.0, 1.0]
#[derive(Debug, Clone)]
pub struct AudioClip {
    pub samples: Vec<f32>,

    /// Sample rate in Hz (e.g., 44100, 48000)
    pub sample_rate: u32,

    /// Number of channels (1 = mono, 2 = stereo)
    pub channels: u16,

    /// Samples per channel
    pub frame_count: usize,
}

impl AudioClip {
    /// Decode a WAV file held in memory
    pub fn from_wav_bytes(data: &[u8]) -> Result<Self, AudioError> {
        let mut reader = WavReader::new(Cursor::new(data))?;
        let spec = reader.spec();

        if spec.channels == 0 || spec.sample_rate == 0 {
            return Err(AudioError::InvalidData);
        }

        let samples: Vec<f32> = match (spec.sample_format, spec.bits_per_sample) {
            // hound re-centres unsigned 8-bit PCM on read
            (SampleFormat::Int, 8) => reader
                .samples::<i8>()
                .map(|s| s.map(|s| s as f32 / 128.0))
                .collect::<Result<_, _>>()?,
            (SampleFormat::Int, 16) => reader
                .samples::<i16>()
                .map(|s| s.map(|s| s as f32 / 32768.0))
                .collect::<Result<_, _>>()?,
            (SampleFormat::Int, 24) => reader
                .samples::<i32>()
                .map(|s| s.map(|s| s as f32 / 8388608.0))
                .collect::<Result<_, _>>()?,
            (SampleFormat::Int, 32) => reader
                .samples::<i32>()
                .map(|s| s.map(|s| s as f32 / 2147483648.0))
                .collect::<Result<_, _>>()?,
            (SampleFormat::Float, 32) => reader.samples::<f32>().collect::<Result<_, _>>()?,
            (format, bits) => {
                return Err(AudioError::UnsupportedFormat(format!(
                    "{:?} {}-bit audio",
                    format, bits
                )));
            }
        };

        let frame_count = samples.len() / spec.channels as usize;
        log::info!(
            "Decoded WAV: {} Hz, {} channel(s), {} frames",
            spec.sample_rate,
            spec.channels,
            frame_count
        );

        Ok(AudioClip {
            samples,
            sample_rate: spec.sample_rate,
            channels: spec.channels,
            frame_count,
        })
    }

    /// Read and decode a WAV file from disk
    pub fn from_wav_file(path: &Path) -> Result<Self, AudioError> {
        let data = std::fs::read(path)?;
        Self::from_wav_bytes(&data)
    }

    /// Total playing time
    pub fn duration(&self) -> Duration {
        Duration::from_secs_f64(self.frame_count as f64 / self.sample_rate as f64)
    }

    /// Interleaved samples covering `offset .. offset + length`, cut to the clip
    pub fn region(&self, offset: Duration, length: Duration) -> &[f32] {
        let channels = self.channels as usize;
        let to_frame = |time: Duration| {
            let frame = time.as_nanos() * self.sample_rate as u128 / 1_000_000_000;
            usize::try_from(frame).map_or(self.frame_count, |frame| frame.min(self.frame_count))
        };

        let first = to_frame(offset);
        let last = to_frame(offset.saturating_add(length)).max(first);
        &self.samples[first * channels..last * channels]
    }

    /// Average the channels down to one
    pub fn to_mono(&self) -> Vec<f32> {
        if self.channels == 1 {
            return self.samples.clone();
        }

        let channels = self.channels as usize;
        self.samples
            .chunks_exact(channels)
            .map(|frame| frame.iter().sum::<f32>() / channels as f32)
            .collect()
    }
}
