// Trace properties shared by every built-in algorithm

use rand::rngs::StdRng;
use rand::SeedableRng;

use sortscape_lib::algorithms::{
    bubble_sort, generate_with_rng, quick_sort, radix_sort, shuffled_permutation,
};
use sortscape_lib::sandbox::{run_custom, SandboxError};
use sortscape_lib::trace::{read_trace_file, RecordedRun, TraceWriter};
use sortscape_lib::{Algorithm, Permutation, SandboxLimits, Trace};

fn sorted(values: &[usize]) -> Vec<usize> {
    let mut values = values.to_vec();
    values.sort_unstable();
    values
}

fn assert_trace_properties(algorithm: Algorithm, input: &[usize], trace: &Trace) {
    let first = trace.first().unwrap();
    assert_eq!(first.snapshot, input, "{:?}: step 0 is not the input", algorithm);
    assert!(first.highlights.is_empty(), "{:?}: step 0 is highlighted", algorithm);

    let expected = sorted(input);
    for (index, step) in trace.steps().iter().enumerate() {
        assert_eq!(step.snapshot.len(), input.len(), "{:?}: width at step {}", algorithm, index);
        assert_eq!(
            sorted(&step.snapshot),
            expected,
            "{:?}: step {} is not a rearrangement of the input",
            algorithm,
            index
        );
        assert!(
            step.highlights.iter().all(|&position| position < input.len()),
            "{:?}: highlight out of range at step {}",
            algorithm,
            index
        );
    }

    assert_eq!(trace.snapshots().count(), trace.highlights().count());
    assert_eq!(trace.final_snapshot(), expected.as_slice(), "{:?} did not converge", algorithm);
    assert!(trace.validate().is_ok());
}

#[test]
fn test_every_algorithm_on_shuffled_inputs() {
    let mut rng = StdRng::seed_from_u64(0x5eed);

    for algorithm in Algorithm::ALL {
        let sizes: &[usize] = if algorithm == Algorithm::Bogo {
            &[1, 2, 4, 5]
        } else {
            &[1, 2, 3, 17, 40]
        };

        for &n in sizes {
            let permutation = shuffled_permutation(n, &mut rng).unwrap();
            let trace = generate_with_rng(algorithm, permutation.as_slice(), &mut rng).unwrap();
            assert_trace_properties(algorithm, permutation.as_slice(), &trace);
        }
    }
}

#[test]
fn test_every_algorithm_on_sorted_and_reversed_inputs() {
    let mut rng = StdRng::seed_from_u64(7);
    let ascending: Vec<usize> = (0..24).collect();
    let descending: Vec<usize> = (0..24).rev().collect();

    for algorithm in Algorithm::ALL.into_iter().filter(|a| *a != Algorithm::Bogo) {
        for input in [&ascending, &descending] {
            let trace = generate_with_rng(algorithm, input, &mut rng).unwrap();
            assert_trace_properties(algorithm, input, &trace);
        }
    }
}

#[test]
fn test_deterministic_algorithms_repeat_exactly() {
    let input = Permutation::new(vec![6, 2, 9, 0, 4, 8, 1, 7, 3, 5]).unwrap();

    for algorithm in Algorithm::ALL.into_iter().filter(Algorithm::is_deterministic) {
        let mut a = StdRng::seed_from_u64(1);
        let mut b = StdRng::seed_from_u64(2);
        let first = generate_with_rng(algorithm, input.as_slice(), &mut a).unwrap();
        let second = generate_with_rng(algorithm, input.as_slice(), &mut b).unwrap();
        assert_eq!(first, second, "{:?} is not deterministic", algorithm);
    }
}

#[test]
fn test_bubble_sort_on_three() {
    let trace = bubble_sort(&[3, 1, 2]);

    assert_eq!(trace.step(0).unwrap().snapshot, vec![3, 1, 2]);
    assert!(trace.step(0).unwrap().highlights.is_empty());
    assert_eq!(trace.step(1).unwrap().snapshot, vec![1, 3, 2]);
    assert_eq!(trace.step(1).unwrap().highlights, vec![0, 1]);
    assert_eq!(trace.final_snapshot(), &[1, 2, 3]);
}

#[test]
fn test_lomuto_partition_swaps() {
    let trace = quick_sort(&[5, 3, 8, 4, 2]);

    let swaps: Vec<(Vec<usize>, Vec<usize>)> = trace
        .steps()
        .iter()
        .skip(1)
        .map(|step| (step.snapshot.clone(), step.highlights.clone()))
        .collect();

    assert_eq!(
        swaps,
        vec![
            (vec![2, 3, 8, 4, 5], vec![0, 4]),
            (vec![2, 3, 4, 8, 5], vec![2, 3]),
            (vec![2, 3, 4, 5, 8], vec![3, 4]),
        ]
    );
    assert_eq!(trace.final_snapshot(), &[2, 3, 4, 5, 8]);
}

#[test]
fn test_radix_records_only_changes() {
    let input = [170, 45, 75, 90, 802, 24, 2, 66];
    let trace = radix_sort(&input);

    assert_eq!(trace.final_snapshot(), &[2, 24, 45, 66, 75, 90, 170, 802]);
    for pair in trace.steps().windows(2) {
        assert_ne!(pair[0].snapshot, pair[1].snapshot);
        let position = pair[1].highlights[0];
        assert_ne!(pair[0].snapshot[position], pair[1].snapshot[position]);
    }
}

#[test]
fn test_throwing_custom_program_matches_bubble() {
    let mut rng = StdRng::seed_from_u64(99);
    let permutation = shuffled_permutation(12, &mut rng).unwrap();

    let outcome = run_custom(
        "for i in 0..n { if i == 3 { let boom = i / 0; } }",
        &permutation,
        &SandboxLimits::default(),
    );

    assert_eq!(outcome.trace, bubble_sort(permutation.as_slice()));
    assert!(matches!(outcome.warning, Some(SandboxError::Runtime(_))));
}

#[test]
fn test_runaway_custom_program_is_stopped() {
    let permutation = Permutation::new(vec![2, 0, 1]).unwrap();
    let limits = SandboxLimits {
        max_operations: 50_000,
        ..SandboxLimits::default()
    };

    let outcome = run_custom("while 1 { }", &permutation, &limits);

    assert!(outcome.used_fallback());
    assert!(matches!(
        outcome.warning,
        Some(SandboxError::BudgetExhausted(_)) | Some(SandboxError::Timeout(_))
    ));
    assert_eq!(outcome.trace, bubble_sort(&[2, 0, 1]));
}

#[test]
fn test_export_round_trip() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("heap.jsonl");

    let trace = generate_with_rng(
        Algorithm::Heap,
        &[4, 7, 1, 0, 6, 2, 5, 3],
        &mut StdRng::seed_from_u64(3),
    )
    .unwrap();
    let run = RecordedRun::new(Algorithm::Heap.key(), trace);
    TraceWriter::new(path.clone()).write(&run).unwrap();

    let loaded = read_trace_file(&path).unwrap();
    assert_eq!(loaded.run_id, run.run_id);
    assert_eq!(loaded.algorithm, "heap");
    assert_eq!(loaded.trace, run.trace);
}
