// Trace model
// Permutations, recorded steps and the append-only recorder shared by every algorithm

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

/// Errors raised when a permutation or trace breaks its invariants
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TraceError {
    #[error("Permutation is empty")]
    EmptyPermutation,

    #[error("Identity {0} appears more than once")]
    DuplicateIdentity(usize),

    #[error("Identity {identity} is out of range for {len} slices")]
    IdentityOutOfRange { identity: usize, len: usize },

    #[error("Step {step} has {found} entries, expected {expected}")]
    LengthMismatch {
        step: usize,
        expected: usize,
        found: usize,
    },

    #[error("Step {step} highlights position {position}, but only {len} positions exist")]
    HighlightOutOfRange {
        step: usize,
        position: usize,
        len: usize,
    },

    #[error("Step {0} is not a rearrangement of the initial values")]
    NotARearrangement(usize),

    #[error("Step 0 must not highlight any position")]
    BadInitialStep,
}

/// Ordering of slice identities 0..N-1, indexed by position
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Vec<usize>", into = "Vec<usize>")]
pub struct Permutation(Vec<usize>);

impl Permutation {
    /// Validate and wrap a sequence of identities
    pub fn new(values: Vec<usize>) -> Result<Self, TraceError> {
        check_permutation(&values)?;
        Ok(Permutation(values))
    }

    /// The settled ordering where identity `i` sits at position `i`
    pub fn identity(len: usize) -> Result<Self, TraceError> {
        if len == 0 {
            return Err(TraceError::EmptyPermutation);
        }
        Ok(Permutation((0..len).collect()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always false for a constructed permutation; kept for API symmetry
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[usize] {
        &self.0
    }

    pub fn to_vec(&self) -> Vec<usize> {
        self.0.clone()
    }

    pub fn is_sorted(&self) -> bool {
        is_ascending(&self.0)
    }
}

impl TryFrom<Vec<usize>> for Permutation {
    type Error = TraceError;

    fn try_from(values: Vec<usize>) -> Result<Self, Self::Error> {
        Permutation::new(values)
    }
}

impl From<Permutation> for Vec<usize> {
    fn from(permutation: Permutation) -> Self {
        permutation.0
    }
}

impl AsRef<[usize]> for Permutation {
    fn as_ref(&self) -> &[usize] {
        &self.0
    }
}

/// Check that `values` holds every identity in 0..len exactly once
pub fn check_permutation(values: &[usize]) -> Result<(), TraceError> {
    if values.is_empty() {
        return Err(TraceError::EmptyPermutation);
    }

    let len = values.len();
    let mut seen = vec![false; len];
    for &identity in values {
        if identity >= len {
            return Err(TraceError::IdentityOutOfRange { identity, len });
        }
        if seen[identity] {
            return Err(TraceError::DuplicateIdentity(identity));
        }
        seen[identity] = true;
    }

    Ok(())
}

/// True when the values never decrease
pub fn is_ascending(values: &[usize]) -> bool {
    values.windows(2).all(|pair| pair[0] <= pair[1])
}

/// One recorded moment of an algorithm run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceStep {
    /// Identities by position at this step
    pub snapshot: Vec<usize>,

    /// Positions (not identities) that are active at this step
    pub highlights: Vec<usize>,
}

/// Full recorded history of an algorithm run
///
/// Steps and their highlight sets live in one sequence, so they can never
/// drift out of length sync. A trace is immutable once built; only
/// [`TraceRecorder`] appends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trace {
    steps: Vec<TraceStep>,
}

impl Trace {
    /// Build a trace from raw steps, checking every invariant
    pub fn from_steps(steps: Vec<TraceStep>) -> Result<Self, TraceError> {
        if steps.first().map_or(true, |step| step.snapshot.is_empty()) {
            return Err(TraceError::EmptyPermutation);
        }
        let trace = Trace { steps };
        trace.validate()?;
        Ok(trace)
    }

    pub fn steps(&self) -> &[TraceStep] {
        &self.steps
    }

    pub fn step(&self, index: usize) -> Option<&TraceStep> {
        self.steps.get(index)
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Number of values every snapshot holds
    pub fn width(&self) -> usize {
        self.steps.first().map_or(0, |step| step.snapshot.len())
    }

    pub fn first(&self) -> Option<&TraceStep> {
        self.steps.first()
    }

    pub fn last(&self) -> Option<&TraceStep> {
        self.steps.last()
    }

    /// Snapshot at the final step
    pub fn final_snapshot(&self) -> &[usize] {
        self.steps
            .last()
            .map(|step| step.snapshot.as_slice())
            .unwrap_or(&[])
    }

    pub fn snapshots(&self) -> impl Iterator<Item = &[usize]> + '_ {
        self.steps.iter().map(|step| step.snapshot.as_slice())
    }

    pub fn highlights(&self) -> impl Iterator<Item = &[usize]> + '_ {
        self.steps.iter().map(|step| step.highlights.as_slice())
    }

    /// True when the final snapshot is in ascending order
    pub fn is_converged(&self) -> bool {
        is_ascending(self.final_snapshot())
    }

    /// Check every structural invariant of the trace
    pub fn validate(&self) -> Result<(), TraceError> {
        let first = self.steps.first().ok_or(TraceError::EmptyPermutation)?;
        if !first.highlights.is_empty() {
            return Err(TraceError::BadInitialStep);
        }

        let width = first.snapshot.len();
        let mut baseline = first.snapshot.clone();
        baseline.sort_unstable();

        let mut scratch = Vec::with_capacity(width);
        for (index, step) in self.steps.iter().enumerate() {
            if step.snapshot.len() != width {
                return Err(TraceError::LengthMismatch {
                    step: index,
                    expected: width,
                    found: step.snapshot.len(),
                });
            }

            scratch.clear();
            scratch.extend_from_slice(&step.snapshot);
            scratch.sort_unstable();
            if scratch != baseline {
                return Err(TraceError::NotARearrangement(index));
            }

            check_highlights(index, &step.highlights, width)?;
        }

        Ok(())
    }

    /// Hex SHA-256 digest over every snapshot and highlight set
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        for step in &self.steps {
            hasher.update((step.snapshot.len() as u64).to_le_bytes());
            for &identity in &step.snapshot {
                hasher.update((identity as u64).to_le_bytes());
            }
            hasher.update((step.highlights.len() as u64).to_le_bytes());
            for &position in &step.highlights {
                hasher.update((position as u64).to_le_bytes());
            }
        }
        hex::encode(hasher.finalize())
    }
}

fn check_highlights(step: usize, highlights: &[usize], len: usize) -> Result<(), TraceError> {
    match highlights.iter().find(|&&position| position >= len) {
        Some(&position) => Err(TraceError::HighlightOutOfRange {
            step,
            position,
            len,
        }),
        None => Ok(()),
    }
}

/// Append-only builder used while an algorithm runs
///
/// The recorder owns its steps; algorithms push snapshots of their working
/// array and never see the finished [`Trace`].
#[derive(Debug)]
pub struct TraceRecorder {
    steps: Vec<TraceStep>,
}

impl TraceRecorder {
    /// Start a trace whose step 0 is `initial` with nothing highlighted
    pub fn new(initial: &[usize]) -> Self {
        TraceRecorder {
            steps: vec![TraceStep {
                snapshot: initial.to_vec(),
                highlights: Vec::new(),
            }],
        }
    }

    /// Append a snapshot with its active positions
    pub fn record(&mut self, snapshot: &[usize], highlights: &[usize]) {
        debug_assert_eq!(snapshot.len(), self.steps[0].snapshot.len());
        debug_assert!(
            highlights.iter().all(|&position| position < snapshot.len()),
            "highlight out of range"
        );

        self.steps.push(TraceStep {
            snapshot: snapshot.to_vec(),
            highlights: highlights.to_vec(),
        });
    }

    /// Append a settled step with no highlights
    pub fn settle(&mut self, snapshot: &[usize]) {
        self.record(snapshot, &[]);
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn finish(self) -> Trace {
        Trace { steps: self.steps }
    }
}
