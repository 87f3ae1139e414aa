// Heap Sort
// Max-heap built bottom-up, then the root is swapped to the end of the unsorted part

use crate::trace::{Trace, TraceRecorder};

/// Heap Sort
///
/// A step is recorded whenever a child becomes the provisional largest
/// (`[child, previous largest]`) and for every swap.
pub fn heap_sort(values: &[usize]) -> Trace {
    let mut arr = values.to_vec();
    let mut recorder = TraceRecorder::new(values);
    let n = arr.len();

    for root in (0..n / 2).rev() {
        sift_down(&mut arr, n, root, &mut recorder);
    }

    for end in (1..n).rev() {
        arr.swap(0, end);
        recorder.record(&arr, &[0, end]);
        sift_down(&mut arr, end, 0, &mut recorder);
    }

    recorder.settle(&arr);
    recorder.finish()
}

/// Restore the heap property below `root` within `arr[..size]`
fn sift_down(arr: &mut [usize], size: usize, mut root: usize, recorder: &mut TraceRecorder) {
    loop {
        let mut largest = root;
        let left = 2 * root + 1;
        let right = left + 1;

        if left < size && arr[left] > arr[largest] {
            recorder.record(arr, &[left, largest]);
            largest = left;
        }
        if right < size && arr[right] > arr[largest] {
            recorder.record(arr, &[right, largest]);
            largest = right;
        }

        if largest == root {
            return;
        }

        arr.swap(root, largest);
        recorder.record(arr, &[root, largest]);
        root = largest;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_heap_sort_small() {
        let trace = heap_sort(&[0, 2, 1]);

        let highlights: Vec<Vec<usize>> = trace.highlights().map(|h| h.to_vec()).collect();
        assert_eq!(
            highlights,
            vec![
                vec![],
                vec![1, 0], // left child beats the root
                vec![0, 1], // heapify swap -> [2, 0, 1]
                vec![0, 2], // root to the end -> [1, 0, 2]
                vec![0, 1], // root to the end -> [0, 1, 2]
                vec![],
            ]
        );
        assert_eq!(trace.final_snapshot(), &[0, 1, 2]);
    }

    #[test]
    fn test_heap_sort_converges() {
        let trace = heap_sort(&[6, 1, 8, 3, 0, 9, 2, 7, 4, 5]);
        assert!(trace.is_converged());
        assert!(trace.validate().is_ok());
    }
}
