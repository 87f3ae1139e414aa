// Distribution sorts
// Counting, Pigeonhole, Radix and Bucket Sort over a bounded key range
//
// Write-back passes place one value at a time: the value destined for slot
// `i` is rotated down from wherever it currently sits, so the slots after
// `i` keep the values still waiting to be placed.

use crate::trace::{Trace, TraceRecorder};

use super::{find_from, move_into_place};

/// Bucket width used by Bucket Sort
pub const BUCKET_SIZE: usize = 5;

/// Place `value` at slot `position`, pulling it from later in `arr`
/// Returns true when the slot's value changed
fn place(arr: &mut [usize], position: usize, value: usize) -> bool {
    if arr[position] == value {
        return false;
    }
    let from = find_from(arr, position, value);
    move_into_place(arr, from, position);
    true
}

fn bounds(values: &[usize]) -> (usize, usize) {
    let min = values.iter().copied().min().unwrap_or(0);
    let max = values.iter().copied().max().unwrap_or(0);
    (min, max)
}

/// Counting Sort
///
/// Phase one records a step per frequency increment, highlighting the
/// position being counted. Phase two records one step per stable placement.
pub fn counting_sort(values: &[usize]) -> Trace {
    let mut arr = values.to_vec();
    let mut recorder = TraceRecorder::new(values);
    let (min, max) = bounds(values);

    let mut count = vec![0usize; max - min + 1];
    for (position, &value) in values.iter().enumerate() {
        count[value - min] += 1;
        recorder.record(&arr, &[position]);
    }

    for i in 1..count.len() {
        count[i] += count[i - 1];
    }

    // right to left keeps equal keys in input order
    let mut output = vec![0usize; values.len()];
    for &value in values.iter().rev() {
        count[value - min] -= 1;
        output[count[value - min]] = value;
    }

    for (position, &value) in output.iter().enumerate() {
        place(&mut arr, position, value);
        recorder.record(&arr, &[position]);
    }

    recorder.finish()
}

/// Pigeonhole Sort
///
/// Every value is dropped into the hole for its key (one step each), then
/// the holes are emptied in key order (one step per placement).
pub fn pigeonhole_sort(values: &[usize]) -> Trace {
    let mut arr = values.to_vec();
    let mut recorder = TraceRecorder::new(values);
    let (min, max) = bounds(values);

    let mut holes: Vec<Vec<usize>> = vec![Vec::new(); max - min + 1];
    for (position, &value) in values.iter().enumerate() {
        holes[value - min].push(value);
        recorder.record(&arr, &[position]);
    }

    let mut index = 0;
    for hole in &holes {
        for &value in hole {
            place(&mut arr, index, value);
            recorder.record(&arr, &[index]);
            index += 1;
        }
    }

    recorder.finish()
}

/// Radix Sort, least significant decimal digit first
///
/// Each digit pass is a stable counting sort; a step is recorded only for
/// positions whose value actually changes during the write-back.
pub fn radix_sort(values: &[usize]) -> Trace {
    let mut arr = values.to_vec();
    let mut recorder = TraceRecorder::new(values);
    let (_, max) = bounds(values);

    let mut exp: usize = 1;
    while max / exp > 0 {
        let output = digit_pass(&arr, exp);

        for (position, &value) in output.iter().enumerate() {
            if place(&mut arr, position, value) {
                recorder.record(&arr, &[position]);
            }
        }

        match exp.checked_mul(10) {
            Some(next) => exp = next,
            None => break,
        }
    }

    recorder.finish()
}

/// Stable counting sort of `arr` by the decimal digit at `exp`
fn digit_pass(arr: &[usize], exp: usize) -> Vec<usize> {
    let mut count = [0usize; 10];
    for &value in arr {
        count[(value / exp) % 10] += 1;
    }
    for digit in 1..10 {
        count[digit] += count[digit - 1];
    }

    let mut output = vec![0usize; arr.len()];
    for &value in arr.iter().rev() {
        let digit = (value / exp) % 10;
        count[digit] -= 1;
        output[count[digit]] = value;
    }
    output
}

/// Bucket Sort with fixed-width buckets of [`BUCKET_SIZE`] keys
///
/// Distribution records one step per scanned position; buckets are
/// insertion-sorted off-trace, then one step is recorded per value written
/// back in bucket order.
pub fn bucket_sort(values: &[usize]) -> Trace {
    let mut arr = values.to_vec();
    let mut recorder = TraceRecorder::new(values);
    let (min, max) = bounds(values);

    let bucket_count = (max - min) / BUCKET_SIZE + 1;
    let mut buckets: Vec<Vec<usize>> = vec![Vec::new(); bucket_count];
    for (position, &value) in values.iter().enumerate() {
        buckets[(value - min) / BUCKET_SIZE].push(value);
        recorder.record(&arr, &[position]);
    }

    let mut index = 0;
    for bucket in &mut buckets {
        insertion_sort_plain(bucket);
        for &value in bucket.iter() {
            place(&mut arr, index, value);
            recorder.record(&arr, &[index]);
            index += 1;
        }
    }

    recorder.finish()
}

fn insertion_sort_plain(bucket: &mut [usize]) {
    for i in 1..bucket.len() {
        let mut j = i;
        while j > 0 && bucket[j - 1] > bucket[j] {
            bucket.swap(j - 1, j);
            j -= 1;
        }
    }
}
