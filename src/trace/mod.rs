// Trace module
// Recorded algorithm runs: permutation snapshots plus highlighted positions

pub mod export;
pub mod model;

pub use export::{read_trace_file, ExportError, RecordedRun, TraceHeader, TraceWriter};
pub use model::{
    check_permutation, is_ascending, Permutation, Trace, TraceError, TraceRecorder, TraceStep,
};
