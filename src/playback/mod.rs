// Playback Scheduler
// Walks a trace on a timer; the async driver turns it into a real-time player

pub mod driver;
pub mod rate;
pub mod scheduler;

use thiserror::Error;

use crate::algorithms::SortError;

pub use driver::{run_playback, PlaybackCommand};
pub use rate::{clamp_speed, tick_interval, DEFAULT_SPEED, MAX_SPEED, MIN_SPEED};
pub use scheduler::{
    FrameLog, PlaybackState, PlaybackStatus, Scheduler, StartReport, StepRenderer, TraceCursor,
    FINAL_AUDIO_SETTLE,
};

#[derive(Debug, Error)]
pub enum PlaybackError {
    #[error("Trace generation failed: {0}")]
    Sort(#[from] SortError),
}
