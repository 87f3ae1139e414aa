// Initial shuffle
// Produces the scrambled starting permutation for a run

use rand::seq::SliceRandom;
use rand::Rng;

use crate::trace::{Permutation, TraceError};

/// Uniform Fisher-Yates shuffle of the identities 0..n
pub fn shuffled_permutation<R: Rng>(n: usize, rng: &mut R) -> Result<Permutation, TraceError> {
    let mut identities: Vec<usize> = Permutation::identity(n)?.into();
    identities.shuffle(rng);
    Permutation::new(identities)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_shuffle_is_a_permutation() {
        let mut rng = StdRng::seed_from_u64(3);
        let permutation = shuffled_permutation(50, &mut rng).unwrap();
        assert_eq!(permutation.len(), 50);

        let mut sorted = permutation.to_vec();
        sorted.sort_unstable();
        assert_eq!(sorted, (0..50).collect::<Vec<_>>());
    }

    #[test]
    fn test_shuffle_is_seed_deterministic() {
        let a = shuffled_permutation(20, &mut StdRng::seed_from_u64(8)).unwrap();
        let b = shuffled_permutation(20, &mut StdRng::seed_from_u64(8)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_shuffle_rejects_zero() {
        assert_eq!(
            shuffled_permutation(0, &mut StdRng::seed_from_u64(1)),
            Err(TraceError::EmptyPermutation)
        );
    }
}
