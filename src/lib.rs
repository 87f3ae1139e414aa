// Sortscape - Sorting Algorithm Visualizer Core
// Module declarations

pub mod algorithms;
pub mod audio;
pub mod playback;
pub mod sandbox;
pub mod settings;
pub mod slicing;
pub mod trace;

pub use algorithms::{generate, Algorithm, AlgorithmChoice, SortError};
pub use audio::{AudioClip, AudioSink, AudioSlicePlan, CueSynchronizer};
pub use playback::{PlaybackState, Scheduler, StepRenderer};
pub use sandbox::{run_custom, SandboxLimits};
pub use settings::{SettingsStore, VisualizerSettings};
pub use trace::{Permutation, Trace, TraceStep};
