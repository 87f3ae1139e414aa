// Merge-based sorts
// Top-down Merge Sort and run-detecting Tim Sort
//
// Merging happens in place by rotation: the value taken for output slot `k`
// is rotated down from its current position, so the slots after `k` always
// hold the not-yet-merged values of both runs in order. Every snapshot stays
// a rearrangement of the input.

use crate::trace::{Trace, TraceRecorder};

use super::move_into_place;

/// Merge the adjacent sorted runs `left..=mid` and `mid+1..=right`,
/// recording one step per written output position `[k]`
pub(crate) fn merge_runs(
    arr: &mut [usize],
    left: usize,
    mid: usize,
    right: usize,
    recorder: &mut TraceRecorder,
) {
    // arr[k..j] is what remains of the left run, arr[j..=right] of the right run
    let mut j = mid + 1;

    for k in left..=right {
        let left_exhausted = k == j;
        if j <= right && (left_exhausted || arr[j] < arr[k]) {
            move_into_place(arr, j, k);
            j += 1;
        }

        recorder.record(arr, &[k]);
    }
}

/// Merge Sort, classic top-down recursion
pub fn merge_sort(values: &[usize]) -> Trace {
    let mut arr = values.to_vec();
    let mut recorder = TraceRecorder::new(values);

    let last = arr.len() - 1;
    sort_range(&mut arr, 0, last, &mut recorder);

    recorder.finish()
}

fn sort_range(arr: &mut [usize], left: usize, right: usize, recorder: &mut TraceRecorder) {
    if left < right {
        let mid = left + (right - left) / 2;
        sort_range(arr, left, mid, recorder);
        sort_range(arr, mid + 1, right, recorder);
        merge_runs(arr, left, mid, right, recorder);
    }
}

/// Inputs shorter than this are handled as a single insertion-sorted run
pub const MIN_MERGE: usize = 32;

/// Minimum run length for `n` values
///
/// Keeps the six-ish most significant bits of `n` and rounds up if any of
/// the dropped bits is set, so `n / min_run` is at or just below a power of two.
pub fn min_run_length(mut n: usize) -> usize {
    let mut dropped = 0;
    while n >= MIN_MERGE {
        dropped |= n & 1;
        n >>= 1;
    }
    n + dropped
}

/// A detected run on the merge stack
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Run {
    start: usize,
    len: usize,
}

/// Tim Sort
///
/// Detects ascending and strictly descending runs (descending runs are
/// reversed by recorded swaps), pads short runs to the minimum run length
/// with insertion sort, and merges runs under the stack-collapse rule.
pub fn tim_sort(values: &[usize]) -> Trace {
    let mut arr = values.to_vec();
    let mut recorder = TraceRecorder::new(values);
    let n = arr.len();

    let min_run = min_run_length(n);
    let mut stack: Vec<Run> = Vec::new();

    let mut start = 0;
    while start < n {
        let mut len = count_run_and_make_ascending(&mut arr, start, &mut recorder);

        if len < min_run {
            let forced = min_run.min(n - start);
            extend_run(&mut arr, start, start + len, start + forced, &mut recorder);
            len = forced;
        }

        stack.push(Run { start, len });
        merge_collapse(&mut arr, &mut stack, &mut recorder);
        start += len;
    }

    merge_force_collapse(&mut arr, &mut stack, &mut recorder);

    recorder.settle(&arr);
    recorder.finish()
}

/// Length of the run starting at `start`; a strictly descending run is reversed
fn count_run_and_make_ascending(
    arr: &mut [usize],
    start: usize,
    recorder: &mut TraceRecorder,
) -> usize {
    let n = arr.len();
    let mut end = start + 1;
    if end == n {
        return 1;
    }

    if arr[end] < arr[start] {
        while end < n && arr[end] < arr[end - 1] {
            end += 1;
        }
        reverse_range(arr, start, end - 1, recorder);
    } else {
        while end < n && arr[end] >= arr[end - 1] {
            end += 1;
        }
    }

    end - start
}

fn reverse_range(arr: &mut [usize], mut low: usize, mut high: usize, recorder: &mut TraceRecorder) {
    while low < high {
        arr.swap(low, high);
        recorder.record(arr, &[low, high]);
        low += 1;
        high -= 1;
    }
}

/// Insertion-sort `sorted_end..end` into the sorted prefix `start..sorted_end`
fn extend_run(
    arr: &mut [usize],
    start: usize,
    sorted_end: usize,
    end: usize,
    recorder: &mut TraceRecorder,
) {
    for i in sorted_end..end {
        recorder.record(arr, &[i - 1, i]);

        let mut slot = i;
        while slot > start && arr[slot - 1] > arr[slot] {
            arr.swap(slot - 1, slot);
            recorder.record(arr, &[slot - 1, slot]);
            slot -= 1;
        }

        if slot != i {
            recorder.record(arr, &[slot]);
        }
    }
}

/// Merge the runs at stack positions `at` and `at + 1`
fn merge_at(arr: &mut [usize], stack: &mut Vec<Run>, at: usize, recorder: &mut TraceRecorder) {
    let first = stack[at];
    let second = stack[at + 1];
    debug_assert_eq!(first.start + first.len, second.start);

    merge_runs(
        arr,
        first.start,
        first.start + first.len - 1,
        second.start + second.len - 1,
        recorder,
    );

    stack[at] = Run {
        start: first.start,
        len: first.len + second.len,
    };
    stack.remove(at + 1);
}

/// Collapse the stack until the run-length invariant holds again:
/// the top three collapse while the oldest is not longer than the other two
/// combined, the top two while the older is not longer than the younger
fn merge_collapse(arr: &mut [usize], stack: &mut Vec<Run>, recorder: &mut TraceRecorder) {
    while stack.len() > 1 {
        let mut n = stack.len() - 2;
        let three_rule = (n > 0 && stack[n - 1].len <= stack[n].len + stack[n + 1].len)
            || (n > 1 && stack[n - 2].len <= stack[n - 1].len + stack[n].len);

        if three_rule {
            if stack[n - 1].len < stack[n + 1].len {
                n -= 1;
            }
            merge_at(arr, stack, n, recorder);
        } else if stack[n].len <= stack[n + 1].len {
            merge_at(arr, stack, n, recorder);
        } else {
            break;
        }
    }

    debug_assert!(run_stack_invariant_holds(stack));
}

/// Flush the remaining runs pairwise, smaller neighbour first
fn merge_force_collapse(arr: &mut [usize], stack: &mut Vec<Run>, recorder: &mut TraceRecorder) {
    while stack.len() > 1 {
        let mut n = stack.len() - 2;
        if n > 0 && stack[n - 1].len < stack[n + 1].len {
            n -= 1;
        }
        merge_at(arr, stack, n, recorder);
    }
}

/// `len[i] > len[i+1] + len[i+2]` and `len[i] > len[i+1]` for every valid `i`
fn run_stack_invariant_holds(stack: &[Run]) -> bool {
    let pairs_ok = stack.windows(2).all(|w| w[0].len > w[1].len);
    let triples_ok = stack.windows(3).all(|w| w[0].len > w[1].len + w[2].len);
    pairs_ok && triples_ok
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithms::shuffled_permutation;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_merge_sort_one_step_per_write() {
        let trace = merge_sort(&[1, 0, 3, 2]);

        let highlights: Vec<Vec<usize>> = trace.highlights().map(|h| h.to_vec()).collect();
        assert_eq!(
            highlights,
            vec![
                vec![],
                vec![0],
                vec![1],
                vec![2],
                vec![3],
                vec![0],
                vec![1],
                vec![2],
                vec![3],
            ]
        );
        assert_eq!(trace.final_snapshot(), &[0, 1, 2, 3]);
    }

    #[test]
    fn test_merge_runs_keeps_pending_values_in_order() {
        let mut arr = vec![1, 4, 6, 0, 5];
        let mut recorder = TraceRecorder::new(&arr);
        merge_runs(&mut arr, 0, 2, 4, &mut recorder);

        let trace = recorder.finish();
        assert_eq!(trace.step(1).unwrap().snapshot, vec![0, 1, 4, 6, 5]);
        assert_eq!(trace.step(2).unwrap().snapshot, vec![0, 1, 4, 6, 5]);
        assert_eq!(trace.step(3).unwrap().snapshot, vec![0, 1, 4, 6, 5]);
        assert_eq!(trace.step(4).unwrap().snapshot, vec![0, 1, 4, 5, 6]);
        assert_eq!(trace.final_snapshot(), &[0, 1, 4, 5, 6]);
        assert!(trace.validate().is_ok());
    }

    #[test]
    fn test_merge_is_stable_for_equal_keys() {
        let trace = merge_sort(&[2, 1, 2, 1]);
        assert_eq!(trace.final_snapshot(), &[1, 1, 2, 2]);
    }

    #[test]
    fn test_min_run_length() {
        assert_eq!(min_run_length(10), 10);
        assert_eq!(min_run_length(31), 31);
        assert_eq!(min_run_length(32), 16);
        assert_eq!(min_run_length(33), 17);
        assert_eq!(min_run_length(64), 16);
        assert_eq!(min_run_length(100), 25);
        assert_eq!(min_run_length(400), 25);
    }

    #[test]
    fn test_tim_reverses_descending_run() {
        let trace = tim_sort(&[4, 3, 2, 1, 0]);
        assert_eq!(trace.step(1).unwrap().highlights, vec![0, 4]);
        assert_eq!(trace.step(2).unwrap().highlights, vec![1, 3]);
        assert_eq!(trace.final_snapshot(), &[0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_tim_sort_large_random_inputs() {
        let mut rng = StdRng::seed_from_u64(42);
        for n in [40, 100, 257, 400] {
            let input = shuffled_permutation(n, &mut rng).unwrap();
            let trace = tim_sort(input.as_slice());
            assert!(trace.is_converged(), "n = {}", n);
            assert!(trace.validate().is_ok());
        }
    }

    #[test]
    fn test_run_stack_invariant() {
        let run = |len| Run { start: 0, len };
        assert!(run_stack_invariant_holds(&[run(50), run(30), run(10)]));
        assert!(!run_stack_invariant_holds(&[run(30), run(20), run(15)]));
        assert!(!run_stack_invariant_holds(&[run(10), run(10)]));
        assert!(run_stack_invariant_holds(&[run(10)]));
    }

    #[test]
    fn test_merge_collapse_restores_invariant() {
        let mut arr: Vec<usize> = (0..100).collect();
        let mut recorder = TraceRecorder::new(&arr);
        let mut stack = vec![
            Run { start: 0, len: 40 },
            Run { start: 40, len: 25 },
            Run { start: 65, len: 20 },
            Run { start: 85, len: 15 },
        ];
        merge_collapse(&mut arr, &mut stack, &mut recorder);

        assert!(run_stack_invariant_holds(&stack));
        assert_eq!(stack.iter().map(|r| r.len).sum::<usize>(), 100);
        assert_eq!(arr, (0..100).collect::<Vec<_>>());
    }
}
