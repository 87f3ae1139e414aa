// Custom Algorithm Sandbox
// Runs user-written step programs in a restricted interpreter, falling back to Bubble Sort on failure
//
// Programs see a private copy of the input as `arr` and its length as `n`.
// They build their trace with `swap(i, j)`, `arr[i] = v` and
// `record(h1, h2, ...)`, then end with `return steps;` (or nothing) to hand
// back every recorded snapshot, or `return arr;` to hand back a single one.

pub mod interpreter;
pub mod lexer;
pub mod parser;

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::algorithms::bubble_sort;
use crate::trace::{Permutation, Trace, TraceStep};

use interpreter::{Interpreter, Output, RawStep};

pub use parser::parse;

/// Why a custom program was rejected
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SandboxError {
    #[error("Parse error on line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("Runtime error: {0}")]
    Runtime(String),

    #[error("Program exceeded its budget of {0} operations")]
    BudgetExhausted(u64),

    #[error("Program ran longer than {0:?}")]
    Timeout(Duration),

    #[error("Program returned no snapshots")]
    EmptyResult,

    #[error("Malformed snapshot: {0}")]
    MalformedSnapshot(String),
}

/// Execution budget for one custom program
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SandboxLimits {
    /// Statements plus expression nodes evaluated
    pub max_operations: u64,
    pub timeout_ms: u64,
    pub max_snapshots: usize,
}

impl Default for SandboxLimits {
    fn default() -> Self {
        Self {
            max_operations: 5_000_000,
            timeout_ms: 2_000,
            max_snapshots: 200_000,
        }
    }
}

impl SandboxLimits {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Result of running a custom program; always playable
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomOutcome {
    pub trace: Trace,

    /// Set when the program failed and the trace is the Bubble Sort fallback
    pub warning: Option<SandboxError>,
}

impl CustomOutcome {
    pub fn used_fallback(&self) -> bool {
        self.warning.is_some()
    }
}

/// Run `source` against `initial`, substituting the Bubble Sort trace on any failure
pub fn run_custom(source: &str, initial: &Permutation, limits: &SandboxLimits) -> CustomOutcome {
    match execute(source, initial.as_slice(), limits) {
        Ok(trace) => {
            log::info!("Custom program produced {} steps", trace.len());
            CustomOutcome {
                trace,
                warning: None,
            }
        }
        Err(error) => {
            log::warn!("Custom program failed, falling back to bubble sort: {}", error);
            CustomOutcome {
                trace: bubble_sort(initial.as_slice()),
                warning: Some(error),
            }
        }
    }
}

/// Parse, run and validate `source` without any fallback
pub fn execute(source: &str, initial: &[usize], limits: &SandboxLimits) -> Result<Trace, SandboxError> {
    let program = parse(source)?;
    let output = Interpreter::new(initial, limits).run(&program)?;

    let raw_steps = match output {
        Output::Steps(steps) => steps,
        Output::Array(snapshot) => vec![RawStep {
            snapshot,
            highlights: Vec::new(),
        }],
    };

    assemble_trace(initial, raw_steps)
}

/// Convert raw program output into a validated trace whose step 0 is `initial`
fn assemble_trace(initial: &[usize], raw_steps: Vec<RawStep>) -> Result<Trace, SandboxError> {
    if raw_steps.is_empty() {
        return Err(SandboxError::EmptyResult);
    }

    let width = initial.len();
    let mut steps = Vec::with_capacity(raw_steps.len() + 1);
    for (index, raw) in raw_steps.into_iter().enumerate() {
        let highlights = to_positions(&raw.highlights, index, "highlight")?;
        if let Some(&position) = highlights.iter().find(|&&position| position >= width) {
            return Err(SandboxError::MalformedSnapshot(format!(
                "highlight {} out of range for {} positions in snapshot {}",
                position, width, index
            )));
        }
        steps.push(TraceStep {
            snapshot: to_positions(&raw.snapshot, index, "value")?,
            highlights,
        });
    }

    // an unhighlighted copy of the input doubles as step 0
    if steps[0].snapshot != initial || !steps[0].highlights.is_empty() {
        steps.insert(
            0,
            TraceStep {
                snapshot: initial.to_vec(),
                highlights: Vec::new(),
            },
        );
    }

    Trace::from_steps(steps).map_err(|error| SandboxError::MalformedSnapshot(error.to_string()))
}

fn to_positions(values: &[i64], step: usize, what: &str) -> Result<Vec<usize>, SandboxError> {
    values
        .iter()
        .map(|&value| {
            usize::try_from(value).map_err(|_| {
                SandboxError::MalformedSnapshot(format!("negative {} {} in snapshot {}", what, value, step))
            })
        })
        .collect()
}
