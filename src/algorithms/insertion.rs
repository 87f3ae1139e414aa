// Insertion-style sorts
// Insertion, Shell and Selection Sort

use crate::trace::{Trace, TraceRecorder};

/// Insertion Sort
///
/// Each shift is realised as an adjacent swap, so the highlighted pair
/// `[j+1, j+2]` (with `j` already decremented) names the two slots that
/// just traded places. The final placement `[j+1]` is recorded only when
/// the key actually moved.
pub fn insertion_sort(values: &[usize]) -> Trace {
    let mut arr = values.to_vec();
    let mut recorder = TraceRecorder::new(values);

    for i in 1..arr.len() {
        let mut slot = i;
        while slot > 0 && arr[slot - 1] > arr[slot] {
            arr.swap(slot - 1, slot);
            slot -= 1;
            recorder.record(&arr, &[slot, slot + 1]);
        }

        if slot != i {
            recorder.record(&arr, &[slot]);
        }
    }

    recorder.finish()
}

/// Selection Sort
///
/// Every candidate comparison is a step `[j, min]`, a new minimum is a
/// step `[min]`, and each outer pass ends with the swap `[i, min]` or a
/// no-op step `[i]`.
pub fn selection_sort(values: &[usize]) -> Trace {
    let mut arr = values.to_vec();
    let mut recorder = TraceRecorder::new(values);
    let n = arr.len();

    for i in 0..n.saturating_sub(1) {
        let mut min_idx = i;

        for j in i + 1..n {
            recorder.record(&arr, &[j, min_idx]);

            if arr[j] < arr[min_idx] {
                min_idx = j;
                recorder.record(&arr, &[min_idx]);
            }
        }

        if min_idx != i {
            arr.swap(i, min_idx);
            recorder.record(&arr, &[i, min_idx]);
        } else {
            recorder.record(&arr, &[i]);
        }
    }

    recorder.settle(&arr);
    recorder.finish()
}

/// Shell Sort with the halving gap sequence n/2, n/4, ..., 1
pub fn shell_sort(values: &[usize]) -> Trace {
    let mut arr = values.to_vec();
    let mut recorder = TraceRecorder::new(values);
    let n = arr.len();

    let mut gap = n / 2;
    while gap > 0 {
        for i in gap..n {
            recorder.record(&arr, &[i]);

            let mut j = i;
            while j >= gap && arr[j - gap] > arr[j] {
                arr.swap(j - gap, j);
                recorder.record(&arr, &[j, j - gap]);
                j -= gap;
            }

            if j != i {
                recorder.record(&arr, &[j]);
            }
        }
        gap /= 2;
    }

    recorder.settle(&arr);
    recorder.finish()
}
