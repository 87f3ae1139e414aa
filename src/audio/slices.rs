// Audio slice plan
// Evenly partitions a time range of the clip into one contiguous slice per identity

use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::AudioError;

/// Selected region of the clip, in seconds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AudioRange {
    pub start_secs: f64,
    pub end_secs: f64,
}

impl AudioRange {
    pub fn new(start_secs: f64, end_secs: f64) -> Self {
        Self {
            start_secs,
            end_secs,
        }
    }

    /// The whole clip
    pub fn full(duration: Duration) -> Self {
        Self::new(0.0, duration.as_secs_f64())
    }
}

/// Audio Slice Descriptor: where one identity's sound lives in the clip
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AudioSlice {
    pub start: Duration,
    pub duration: Duration,
}

impl AudioSlice {
    pub fn end(&self) -> Duration {
        self.start + self.duration
    }
}

/// One slice per identity, plus the length of the buffer they index into
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioSlicePlan {
    buffer_duration: Duration,
    slices: Vec<AudioSlice>,
}

impl AudioSlicePlan {
    /// Split `range` (whole buffer when `None`) into `count` gap-free slices
    ///
    /// The range is clamped to the buffer first; boundaries are computed in
    /// whole nanoseconds so every slice ends exactly where the next starts.
    pub fn partition(
        buffer_duration: Duration,
        range: Option<AudioRange>,
        count: usize,
    ) -> Result<Self, AudioError> {
        if count == 0 {
            return Err(AudioError::NoSlices);
        }

        let range = range.unwrap_or_else(|| AudioRange::full(buffer_duration));
        if !range.start_secs.is_finite() || !range.end_secs.is_finite() {
            return Err(AudioError::InvalidRange {
                start_secs: range.start_secs,
                end_secs: range.end_secs,
            });
        }

        let limit = buffer_duration.as_secs_f64();
        let start = Duration::from_secs_f64(range.start_secs.clamp(0.0, limit)).min(buffer_duration);
        let end = Duration::from_secs_f64(range.end_secs.clamp(0.0, limit)).min(buffer_duration);
        if end <= start {
            return Err(AudioError::InvalidRange {
                start_secs: range.start_secs,
                end_secs: range.end_secs,
            });
        }

        let span = (end - start).as_nanos();
        let origin = start.as_nanos();
        let boundary = |i: usize| -> Duration {
            let nanos = origin + span * i as u128 / count as u128;
            Duration::new(
                (nanos / 1_000_000_000) as u64,
                (nanos % 1_000_000_000) as u32,
            )
        };

        let slices = (0..count)
            .map(|i| {
                let slice_start = boundary(i);
                AudioSlice {
                    start: slice_start,
                    duration: boundary(i + 1) - slice_start,
                }
            })
            .collect();

        Ok(Self {
            buffer_duration,
            slices,
        })
    }

    pub fn buffer_duration(&self) -> Duration {
        self.buffer_duration
    }

    pub fn slices(&self) -> &[AudioSlice] {
        &self.slices
    }

    pub fn len(&self) -> usize {
        self.slices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slices.is_empty()
    }

    /// Descriptor for a slice identity
    pub fn get(&self, identity: usize) -> Option<AudioSlice> {
        self.slices.get(identity).copied()
    }

    /// Nominal slice length, used to pace playback
    pub fn slice_duration(&self) -> Duration {
        self.slices.first().map_or(Duration::ZERO, |slice| slice.duration)
    }
}
