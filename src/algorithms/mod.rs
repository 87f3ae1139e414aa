// Algorithm Trace Library
// One pure trace generator per sorting algorithm, plus the registry that names them

pub mod bogo;
pub mod distribution;
pub mod exchange;
pub mod heap;
pub mod insertion;
pub mod merge;
pub mod quick;
pub mod shuffle;

use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::trace::{Trace, TraceError};

pub use bogo::{bogo_sort, bogo_sort_with_rng, BOGO_MAX_ATTEMPTS};
pub use distribution::{bucket_sort, counting_sort, pigeonhole_sort, radix_sort, BUCKET_SIZE};
pub use exchange::{bubble_sort, cocktail_sort, gnome_sort, odd_even_sort, wave_sort};
pub use heap::heap_sort;
pub use insertion::{insertion_sort, selection_sort, shell_sort};
pub use merge::{merge_sort, tim_sort};
pub use quick::{quick_sort, quick_sort_hoare};
pub use shuffle::shuffled_permutation;

/// Largest `max - min + 1` the counting-family algorithms accept
pub const MAX_KEY_RANGE: usize = 1 << 20;

/// Errors raised before trace generation starts
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SortError {
    #[error("Invalid input: {0}")]
    InvalidInput(#[from] TraceError),

    #[error("{algorithm} needs a key range of at most {limit}, got {min}..={max}")]
    RangeTooLarge {
        algorithm: &'static str,
        min: usize,
        max: usize,
        limit: usize,
    },

    #[error("Unknown algorithm: {0}")]
    UnknownAlgorithm(String),
}

/// Built-in sorting algorithms
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Algorithm {
    Bubble,
    Selection,
    Insertion,
    Shell,
    Cocktail,
    OddEven,
    Gnome,
    /// Comb sort with a 1.3 shrink factor
    Wave,
    /// Lomuto partition, pivot at the end of the range
    Quick,
    /// Hoare partition, two converging pointers
    QuickHoare,
    Merge,
    Tim,
    Heap,
    Counting,
    Pigeonhole,
    Radix,
    Bucket,
    Bogo,
}

impl Algorithm {
    pub const ALL: [Algorithm; 18] = [
        Algorithm::Bubble,
        Algorithm::Selection,
        Algorithm::Insertion,
        Algorithm::Shell,
        Algorithm::Cocktail,
        Algorithm::OddEven,
        Algorithm::Gnome,
        Algorithm::Wave,
        Algorithm::Quick,
        Algorithm::QuickHoare,
        Algorithm::Merge,
        Algorithm::Tim,
        Algorithm::Heap,
        Algorithm::Counting,
        Algorithm::Pigeonhole,
        Algorithm::Radix,
        Algorithm::Bucket,
        Algorithm::Bogo,
    ];

    /// Stable identifier used in settings and exported traces
    pub fn key(&self) -> &'static str {
        match self {
            Algorithm::Bubble => "bubble",
            Algorithm::Selection => "selection",
            Algorithm::Insertion => "insertion",
            Algorithm::Shell => "shell",
            Algorithm::Cocktail => "cocktail",
            Algorithm::OddEven => "oddEven",
            Algorithm::Gnome => "gnome",
            Algorithm::Wave => "wave",
            Algorithm::Quick => "quick",
            Algorithm::QuickHoare => "quickHoare",
            Algorithm::Merge => "merge",
            Algorithm::Tim => "tim",
            Algorithm::Heap => "heap",
            Algorithm::Counting => "counting",
            Algorithm::Pigeonhole => "pigeonhole",
            Algorithm::Radix => "radix",
            Algorithm::Bucket => "bucket",
            Algorithm::Bogo => "bogo",
        }
    }

    /// Parse a key; case-insensitive, accepts snake_case too
    pub fn from_key(key: &str) -> Option<Self> {
        let normalized: String = key
            .chars()
            .filter(|c| *c != '_' && *c != '-')
            .flat_map(char::to_lowercase)
            .collect();

        Algorithm::ALL
            .into_iter()
            .find(|algorithm| algorithm.key().to_lowercase() == normalized)
    }

    /// Human-readable name for UI display
    pub fn display_name(&self) -> &'static str {
        match self {
            Algorithm::Bubble => "Bubble Sort",
            Algorithm::Selection => "Selection Sort",
            Algorithm::Insertion => "Insertion Sort",
            Algorithm::Shell => "Shell Sort",
            Algorithm::Cocktail => "Cocktail Shaker Sort",
            Algorithm::OddEven => "Odd-Even Sort",
            Algorithm::Gnome => "Gnome Sort",
            Algorithm::Wave => "Wave (Comb) Sort",
            Algorithm::Quick => "Quick Sort (Lomuto)",
            Algorithm::QuickHoare => "Quick Sort (Hoare)",
            Algorithm::Merge => "Merge Sort",
            Algorithm::Tim => "Tim Sort",
            Algorithm::Heap => "Heap Sort",
            Algorithm::Counting => "Counting Sort",
            Algorithm::Pigeonhole => "Pigeonhole Sort",
            Algorithm::Radix => "Radix Sort",
            Algorithm::Bucket => "Bucket Sort",
            Algorithm::Bogo => "Bogo Sort",
        }
    }

    /// Only Bogo Sort draws on randomness
    pub fn is_deterministic(&self) -> bool {
        !matches!(self, Algorithm::Bogo)
    }

    /// Algorithms that allocate a table sized by the key range
    pub fn needs_bounded_range(&self) -> bool {
        matches!(
            self,
            Algorithm::Counting | Algorithm::Pigeonhole | Algorithm::Radix | Algorithm::Bucket
        )
    }
}

/// What the scheduler is asked to run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "kind", content = "value")]
pub enum AlgorithmChoice {
    BuiltIn(Algorithm),
    /// Source text for the sandbox interpreter
    Custom(String),
}

impl AlgorithmChoice {
    /// Label stored with exported runs
    pub fn label(&self) -> &str {
        match self {
            AlgorithmChoice::BuiltIn(algorithm) => algorithm.key(),
            AlgorithmChoice::Custom(_) => "custom",
        }
    }
}

impl Default for AlgorithmChoice {
    fn default() -> Self {
        AlgorithmChoice::BuiltIn(Algorithm::Bubble)
    }
}

impl From<Algorithm> for AlgorithmChoice {
    fn from(algorithm: Algorithm) -> Self {
        AlgorithmChoice::BuiltIn(algorithm)
    }
}

/// Summary of an algorithm for listings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlgorithmSummary {
    pub key: String,
    pub name: String,
    pub deterministic: bool,
}

/// List every built-in algorithm with its display data
pub fn list_algorithms() -> Vec<AlgorithmSummary> {
    Algorithm::ALL
        .iter()
        .map(|algorithm| AlgorithmSummary {
            key: algorithm.key().to_string(),
            name: algorithm.display_name().to_string(),
            deterministic: algorithm.is_deterministic(),
        })
        .collect()
}

/// Look up an algorithm by key
pub fn get_algorithm(key: &str) -> Result<Algorithm, SortError> {
    Algorithm::from_key(key).ok_or_else(|| SortError::UnknownAlgorithm(key.to_string()))
}

/// Generate the full trace for `values` with the thread-local RNG
pub fn generate(algorithm: Algorithm, values: &[usize]) -> Result<Trace, SortError> {
    generate_with_rng(algorithm, values, &mut rand::rng())
}

/// Generate the full trace, drawing any randomness from `rng`
pub fn generate_with_rng<R: Rng>(
    algorithm: Algorithm,
    values: &[usize],
    rng: &mut R,
) -> Result<Trace, SortError> {
    validate_input(algorithm, values)?;

    let trace = match algorithm {
        Algorithm::Bubble => bubble_sort(values),
        Algorithm::Selection => selection_sort(values),
        Algorithm::Insertion => insertion_sort(values),
        Algorithm::Shell => shell_sort(values),
        Algorithm::Cocktail => cocktail_sort(values),
        Algorithm::OddEven => odd_even_sort(values),
        Algorithm::Gnome => gnome_sort(values),
        Algorithm::Wave => wave_sort(values),
        Algorithm::Quick => quick_sort(values),
        Algorithm::QuickHoare => quick_sort_hoare(values),
        Algorithm::Merge => merge_sort(values),
        Algorithm::Tim => tim_sort(values),
        Algorithm::Heap => heap_sort(values),
        Algorithm::Counting => counting_sort(values),
        Algorithm::Pigeonhole => pigeonhole_sort(values),
        Algorithm::Radix => radix_sort(values),
        Algorithm::Bucket => bucket_sort(values),
        Algorithm::Bogo => bogo_sort_with_rng(values, rng, BOGO_MAX_ATTEMPTS),
    };

    log::info!(
        "Generated {} trace: {} values, {} steps",
        algorithm.key(),
        values.len(),
        trace.len()
    );

    Ok(trace)
}

/// Reject inputs before any step is recorded
fn validate_input(algorithm: Algorithm, values: &[usize]) -> Result<(), SortError> {
    let (Some(&min), Some(&max)) = (values.iter().min(), values.iter().max()) else {
        return Err(SortError::InvalidInput(TraceError::EmptyPermutation));
    };

    if algorithm.needs_bounded_range() && max - min >= MAX_KEY_RANGE {
        return Err(SortError::RangeTooLarge {
            algorithm: algorithm.key(),
            min,
            max,
            limit: MAX_KEY_RANGE,
        });
    }

    Ok(())
}

/// Move `arr[from]` to `to` (`to <= from`), shifting the values in between
/// one slot right so the array stays a rearrangement of its values
pub(crate) fn move_into_place(arr: &mut [usize], from: usize, to: usize) {
    debug_assert!(to <= from);
    arr[to..=from].rotate_right(1);
}

/// Position of the first occurrence of `value` at or after `start`
pub(crate) fn find_from(arr: &[usize], start: usize, value: usize) -> usize {
    arr[start..]
        .iter()
        .position(|&candidate| candidate == value)
        .map_or(start, |offset| start + offset)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_keys_round_trip() {
        for algorithm in Algorithm::ALL {
            assert_eq!(Algorithm::from_key(algorithm.key()), Some(algorithm));
        }
        assert_eq!(Algorithm::from_key("odd_even"), Some(Algorithm::OddEven));
        assert_eq!(Algorithm::from_key("QUICK"), Some(Algorithm::Quick));
        assert_eq!(Algorithm::from_key("quantum"), None);
    }

    #[test]
    fn test_serde_keys_match() {
        let json = serde_json::to_string(&Algorithm::OddEven).unwrap();
        assert_eq!(json, "\"oddEven\"");
        let parsed: Algorithm = serde_json::from_str("\"quickHoare\"").unwrap();
        assert_eq!(parsed, Algorithm::QuickHoare);
    }

    #[test]
    fn test_list_algorithms() {
        let summaries = list_algorithms();
        assert_eq!(summaries.len(), Algorithm::ALL.len());
        assert_eq!(summaries.iter().filter(|s| !s.deterministic).count(), 1);
    }

    #[test]
    fn test_get_algorithm_unknown() {
        assert_eq!(
            get_algorithm("sleep"),
            Err(SortError::UnknownAlgorithm("sleep".to_string()))
        );
    }

    #[test]
    fn test_empty_input_is_rejected() {
        for algorithm in Algorithm::ALL {
            assert_eq!(
                generate(algorithm, &[]),
                Err(SortError::InvalidInput(TraceError::EmptyPermutation))
            );
        }
    }

    #[test]
    fn test_counting_family_range_limit() {
        let values = [0, MAX_KEY_RANGE];
        for algorithm in [
            Algorithm::Counting,
            Algorithm::Pigeonhole,
            Algorithm::Radix,
            Algorithm::Bucket,
        ] {
            assert!(matches!(
                generate(algorithm, &values),
                Err(SortError::RangeTooLarge { .. })
            ));
        }
        assert!(generate(Algorithm::Merge, &values).is_ok());
    }

    #[test]
    fn test_single_value_traces() {
        let mut rng = StdRng::seed_from_u64(7);
        for algorithm in Algorithm::ALL {
            let trace = generate_with_rng(algorithm, &[0], &mut rng).unwrap();
            assert!(trace.len() >= 1, "{:?}", algorithm);
            assert!(trace.highlights().all(|h| h.iter().all(|&p| p < 1)));
            assert_eq!(trace.final_snapshot(), &[0]);
        }
    }

    #[test]
    fn test_move_into_place_keeps_values() {
        let mut arr = vec![4, 5, 6, 1];
        move_into_place(&mut arr, 3, 1);
        assert_eq!(arr, vec![4, 1, 5, 6]);
        assert_eq!(find_from(&arr, 1, 6), 3);
    }

    #[test]
    fn test_choice_label() {
        assert_eq!(AlgorithmChoice::from(Algorithm::Tim).label(), "tim");
        assert_eq!(AlgorithmChoice::Custom(String::new()).label(), "custom");
    }
}
