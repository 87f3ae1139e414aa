// Quick Sort
// Lomuto and Hoare partition schemes over an explicit range stack
//
// Only swaps are recorded here; comparisons that leave the array untouched
// are not steps, unlike the exchange family.

use crate::trace::{Trace, TraceRecorder};

/// Inclusive index range still waiting to be partitioned
type Range = (usize, usize);

/// Push `(low, high)` when it holds at least two values
fn push_range(stack: &mut Vec<Range>, low: usize, high: usize) {
    if low < high {
        stack.push((low, high));
    }
}

/// Quick Sort with the Lomuto scheme: pivot is the last value of the range
pub fn quick_sort(values: &[usize]) -> Trace {
    let mut arr = values.to_vec();
    let mut recorder = TraceRecorder::new(values);

    let mut stack = Vec::new();
    push_range(&mut stack, 0, arr.len() - 1);

    while let Some((low, high)) = stack.pop() {
        let pivot_index = lomuto_partition(&mut arr, low, high, &mut recorder);

        // right pushed first so the left side is handled first
        push_range(&mut stack, pivot_index + 1, high);
        if pivot_index > low {
            push_range(&mut stack, low, pivot_index - 1);
        }
    }

    recorder.finish()
}

fn lomuto_partition(
    arr: &mut [usize],
    low: usize,
    high: usize,
    recorder: &mut TraceRecorder,
) -> usize {
    let pivot = arr[high];
    let mut store = low;

    for j in low..high {
        if arr[j] < pivot {
            if store != j {
                arr.swap(store, j);
                recorder.record(arr, &[store, j]);
            }
            store += 1;
        }
    }

    if store != high {
        arr.swap(store, high);
        recorder.record(arr, &[store, high]);
    }

    store
}

/// Quick Sort with the Hoare scheme: pivot is the middle value of the range
pub fn quick_sort_hoare(values: &[usize]) -> Trace {
    let mut arr = values.to_vec();
    let mut recorder = TraceRecorder::new(values);

    let mut stack = Vec::new();
    push_range(&mut stack, 0, arr.len() - 1);

    while let Some((low, high)) = stack.pop() {
        let split = hoare_partition(&mut arr, low, high, &mut recorder);

        push_range(&mut stack, split + 1, high);
        push_range(&mut stack, low, split);
    }

    recorder.finish()
}

/// Returns `split` such that every value in `low..=split` is <= every value after it
fn hoare_partition(
    arr: &mut [usize],
    low: usize,
    high: usize,
    recorder: &mut TraceRecorder,
) -> usize {
    let pivot = arr[low + (high - low) / 2];
    let mut i = low;
    let mut j = high;

    loop {
        while arr[i] < pivot {
            i += 1;
        }
        while arr[j] > pivot {
            j -= 1;
        }
        if i >= j {
            return j;
        }

        arr.swap(i, j);
        recorder.record(arr, &[i, j]);
        i += 1;
        j -= 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lomuto_swap_sequence() {
        let trace = quick_sort(&[5, 3, 8, 4, 2]);

        let steps: Vec<(Vec<usize>, Vec<usize>)> = trace
            .steps()
            .iter()
            .map(|step| (step.snapshot.clone(), step.highlights.clone()))
            .collect();

        assert_eq!(
            steps,
            vec![
                (vec![5, 3, 8, 4, 2], vec![]),
                // pivot 2: nothing smaller, pivot swapped to the front
                (vec![2, 3, 8, 4, 5], vec![0, 4]),
                // pivot 5 over [1, 4]: 4 moves behind 3, then pivot lands
                (vec![2, 3, 4, 8, 5], vec![2, 3]),
                (vec![2, 3, 4, 5, 8], vec![3, 4]),
            ]
        );
    }

    #[test]
    fn test_lomuto_sorted_input_records_nothing() {
        let trace = quick_sort(&[0, 1, 2, 3, 4, 5]);
        assert_eq!(trace.len(), 1);
    }

    #[test]
    fn test_hoare_sorts() {
        let trace = quick_sort_hoare(&[9, 4, 7, 1, 8, 0, 3, 6, 2, 5]);
        assert_eq!(trace.final_snapshot(), &[0, 1, 2, 3, 4, 5, 6, 7, 8, 9]);
        assert!(trace.validate().is_ok());
        assert!(trace.steps()[1..].iter().all(|step| step.highlights.len() == 2));
    }

    #[test]
    fn test_hoare_reverse_input() {
        let trace = quick_sort_hoare(&[4, 3, 2, 1, 0]);
        assert_eq!(trace.final_snapshot(), &[0, 1, 2, 3, 4]);
        // first swap exchanges the outermost pair
        assert_eq!(trace.step(1).unwrap().highlights, vec![0, 4]);
    }

    #[test]
    fn test_partitions_handle_repeated_keys() {
        let values = [3, 1, 3, 0, 1, 3];
        assert_eq!(quick_sort(&values).final_snapshot(), &[0, 1, 1, 3, 3, 3]);
        assert_eq!(quick_sort_hoare(&values).final_snapshot(), &[0, 1, 1, 3, 3, 3]);
    }
}
