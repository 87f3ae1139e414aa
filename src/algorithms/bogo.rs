// Bogo Sort
// Fisher-Yates shuffles until sorted or the attempt cap is reached

use rand::Rng;

use crate::trace::{is_ascending, Trace, TraceRecorder};

/// Shuffles attempted before giving up with a best-effort trace
pub const BOGO_MAX_ATTEMPTS: usize = 10_000;

/// Bogo Sort with the thread-local RNG
pub fn bogo_sort(values: &[usize]) -> Trace {
    bogo_sort_with_rng(values, &mut rand::rng(), BOGO_MAX_ATTEMPTS)
}

/// Bogo Sort drawing from `rng`
///
/// Every swap of a shuffle is a step `[i, j]`; self-swaps are skipped.
/// Hitting `max_attempts` is not an error: the trace ends wherever the last
/// shuffle left the values, and a warning is logged.
pub fn bogo_sort_with_rng<R: Rng>(values: &[usize], rng: &mut R, max_attempts: usize) -> Trace {
    let mut arr = values.to_vec();
    let mut recorder = TraceRecorder::new(values);

    let mut attempts = 0;
    while !is_ascending(&arr) && attempts < max_attempts {
        for i in (1..arr.len()).rev() {
            let j = rng.random_range(0..=i);
            if i != j {
                arr.swap(i, j);
                recorder.record(&arr, &[i, j]);
            }
        }
        attempts += 1;
    }

    if !is_ascending(&arr) {
        log::warn!(
            "Bogo sort gave up after {} attempts on {} values",
            attempts,
            arr.len()
        );
    }

    recorder.settle(&arr);
    recorder.finish()
}
