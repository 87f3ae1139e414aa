// Trace export
// Append-only JSONL files: one header line, then one line per recorded step

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;
use uuid::Uuid;

use super::model::{Trace, TraceError, TraceStep};

/// Errors that can occur while writing or reading exported traces
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Trace file is missing its header line")]
    MissingHeader,

    #[error("Header declares {expected} steps, file holds {found}")]
    StepCountMismatch { expected: usize, found: usize },

    #[error("Fingerprint mismatch: header {expected}, computed {computed}")]
    FingerprintMismatch { expected: String, computed: String },

    #[error("Invalid trace: {0}")]
    InvalidTrace(#[from] TraceError),
}

/// A generated trace together with the run metadata it came from
#[derive(Debug, Clone)]
pub struct RecordedRun {
    pub run_id: Uuid,
    /// Algorithm key, or "custom" for sandboxed programs
    pub algorithm: String,
    pub generated_at: DateTime<Utc>,
    pub trace: Trace,
}

impl RecordedRun {
    /// Wrap a freshly generated trace with a new run id and timestamp
    pub fn new(algorithm: impl Into<String>, trace: Trace) -> Self {
        RecordedRun {
            run_id: Uuid::new_v4(),
            algorithm: algorithm.into(),
            generated_at: Utc::now(),
            trace,
        }
    }

    fn header(&self) -> TraceHeader {
        TraceHeader {
            run_id: self.run_id,
            algorithm: self.algorithm.clone(),
            generated_at: self.generated_at,
            step_count: self.trace.len(),
            slice_count: self.trace.width(),
            fingerprint: self.trace.fingerprint(),
        }
    }
}

/// First line of every exported trace file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraceHeader {
    pub run_id: Uuid,
    pub algorithm: String,
    pub generated_at: DateTime<Utc>,
    pub step_count: usize,
    pub slice_count: usize,
    pub fingerprint: String,
}

/// Serialize any value as a JSON line (with newline)
fn to_json_line<T: Serialize>(value: &T) -> Result<String, serde_json::Error> {
    let json = serde_json::to_string(value)?;
    Ok(format!("{}\n", json))
}

/// Trace file writer
/// Each run is written as a fresh file; existing content is replaced
pub struct TraceWriter {
    file_path: PathBuf,
}

impl TraceWriter {
    pub fn new(file_path: PathBuf) -> Self {
        TraceWriter { file_path }
    }

    /// Write the header and every step of a run
    pub fn write(&self, run: &RecordedRun) -> Result<(), ExportError> {
        let mut file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&self.file_path)?;

        file.write_all(to_json_line(&run.header())?.as_bytes())?;
        for step in run.trace.steps() {
            file.write_all(to_json_line(step)?.as_bytes())?;
        }
        file.flush()?;

        log::debug!(
            "Wrote {} steps for run {} to {}",
            run.trace.len(),
            run.run_id,
            self.file_path.display()
        );
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.file_path
    }
}

/// Read a run back from a JSONL trace file
/// Verifies the step count and fingerprint against the header
pub fn read_trace_file(path: &Path) -> Result<RecordedRun, ExportError> {
    let contents = std::fs::read_to_string(path)?;
    let mut lines = contents.lines().filter(|line| !line.trim().is_empty());

    let header: TraceHeader = match lines.next() {
        Some(line) => serde_json::from_str(line)?,
        None => return Err(ExportError::MissingHeader),
    };

    let mut steps = Vec::with_capacity(header.step_count);
    for line in lines {
        let step: TraceStep = serde_json::from_str(line)?;
        steps.push(step);
    }

    if steps.len() != header.step_count {
        return Err(ExportError::StepCountMismatch {
            expected: header.step_count,
            found: steps.len(),
        });
    }

    let trace = Trace::from_steps(steps)?;
    let computed = trace.fingerprint();
    if computed != header.fingerprint {
        return Err(ExportError::FingerprintMismatch {
            expected: header.fingerprint,
            computed,
        });
    }

    Ok(RecordedRun {
        run_id: header.run_id,
        algorithm: header.algorithm,
        generated_at: header.generated_at,
        trace,
    })
}
