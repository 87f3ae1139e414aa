// Exchange sorts
// Bubble, Cocktail, Odd-Even, Gnome and Wave (comb) record a step on every
// comparison, highlighting the compared pair whether or not it swaps

use crate::trace::{Trace, TraceRecorder};

/// Compare `arr[a]` and `arr[b]` (a < b), swap when out of order, record the pair
/// Returns true when a swap happened
fn compare_exchange(arr: &mut [usize], a: usize, b: usize, recorder: &mut TraceRecorder) -> bool {
    let swapped = arr[a] > arr[b];
    if swapped {
        arr.swap(a, b);
    }
    recorder.record(arr, &[a, b]);
    swapped
}

/// Bubble Sort: full passes, no early exit
pub fn bubble_sort(values: &[usize]) -> Trace {
    let mut arr = values.to_vec();
    let mut recorder = TraceRecorder::new(values);
    let n = arr.len();

    for i in 0..n.saturating_sub(1) {
        for j in 0..n - i - 1 {
            compare_exchange(&mut arr, j, j + 1, &mut recorder);
        }
    }

    recorder.finish()
}

/// Cocktail Shaker Sort: alternating forward and backward passes
pub fn cocktail_sort(values: &[usize]) -> Trace {
    let mut arr = values.to_vec();
    let mut recorder = TraceRecorder::new(values);

    let mut start = 0;
    let mut end = arr.len() - 1;

    loop {
        let mut swapped = false;
        for i in start..end {
            swapped |= compare_exchange(&mut arr, i, i + 1, &mut recorder);
        }
        if !swapped {
            break;
        }

        swapped = false;
        end -= 1;

        for i in (start..end).rev() {
            swapped |= compare_exchange(&mut arr, i, i + 1, &mut recorder);
        }
        start += 1;

        if !swapped {
            break;
        }
    }

    recorder.settle(&arr);
    recorder.finish()
}

/// Odd-Even Sort: odd pairs then even pairs until a clean round
pub fn odd_even_sort(values: &[usize]) -> Trace {
    let mut arr = values.to_vec();
    let mut recorder = TraceRecorder::new(values);
    let n = arr.len();

    let mut sorted = false;
    while !sorted {
        sorted = true;

        for i in (1..n.saturating_sub(1)).step_by(2) {
            if compare_exchange(&mut arr, i, i + 1, &mut recorder) {
                sorted = false;
            }
        }

        for i in (0..n.saturating_sub(1)).step_by(2) {
            if compare_exchange(&mut arr, i, i + 1, &mut recorder) {
                sorted = false;
            }
        }
    }

    recorder.settle(&arr);
    recorder.finish()
}

/// Gnome Sort: step forward while ordered, swap and step back otherwise
pub fn gnome_sort(values: &[usize]) -> Trace {
    let mut arr = values.to_vec();
    let mut recorder = TraceRecorder::new(values);

    let mut pos = 0;
    while pos < arr.len() {
        if pos == 0 || arr[pos] >= arr[pos - 1] {
            recorder.record(&arr, &[pos]);
            pos += 1;
        } else {
            arr.swap(pos, pos - 1);
            recorder.record(&arr, &[pos, pos - 1]);
            pos -= 1;
        }
    }

    recorder.settle(&arr);
    recorder.finish()
}

/// Gap for the next comb pass: floor(gap / 1.3), never below 1
pub(crate) fn shrink_gap(gap: usize) -> usize {
    (gap * 10 / 13).max(1)
}

/// Wave Sort: comb passes with a shrinking gap, until a clean pass at gap 1
pub fn wave_sort(values: &[usize]) -> Trace {
    let mut arr = values.to_vec();
    let mut recorder = TraceRecorder::new(values);
    let n = arr.len();

    let mut gap = n;
    let mut swapped = true;
    while gap > 1 || swapped {
        gap = shrink_gap(gap);
        swapped = false;

        for i in 0..n.saturating_sub(gap) {
            swapped |= compare_exchange(&mut arr, i, i + gap, &mut recorder);
        }
    }

    recorder.settle(&arr);
    recorder.finish()
}
