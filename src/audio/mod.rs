// Audio module
// WAV ingestion, per-identity slice plans and the cue synchronizer that plays them

pub mod ingest;
#[cfg(feature = "playback")]
pub mod output;
pub mod slices;
pub mod sources;
pub mod sync;

use thiserror::Error;

pub use ingest::AudioClip;
#[cfg(feature = "playback")]
pub use output::RodioSink;
pub use slices::{AudioRange, AudioSlice, AudioSlicePlan};
pub use sources::SourceTable;
pub use sync::{clip_cue, AudioSink, CueSynchronizer, NullSink, PlayRequest, RecordingSink, SourceId};

#[derive(Debug, Error)]
pub enum AudioError {
    #[error("Failed to read WAV file: {0}")]
    WavReadError(#[from] hound::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Unsupported audio format: {0}")]
    UnsupportedFormat(String),

    #[error("Invalid audio data")]
    InvalidData,

    #[error("Invalid audio range {start_secs}s..{end_secs}s")]
    InvalidRange { start_secs: f64, end_secs: f64 },

    #[error("Cannot slice audio into zero pieces")]
    NoSlices,

    #[error("Audio output error: {0}")]
    Output(String),
}
