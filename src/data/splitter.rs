// ============================================================
// Layer 4 — Train/Test Splitter and Sampler
// ============================================================
// Randomly shuffles rows and splits them into two sets:
//   - Training set: used to fit scalers and update weights
//   - Test set:     held out for validation and evaluation
//
// The test set gets ceil(n * test_size) rows, the same rounding
// the usual split utilities use, so 10 rows at 0.2 → 8 / 2.
//
// Sampling keeps round(n * frac) rows of a split, chosen at
// random without replacement.
//
// Uses Fisher-Yates shuffle via rand::seq::SliceRandom.
//
// Reference: Rust Book §8 (Vectors)
//            rand crate documentation

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

/// RNG for shuffling: reproducible when a seed is given.
pub fn make_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None       => StdRng::from_entropy(),
    }
}

/// Number of rows the test partition receives.
pub fn test_len(total: usize, test_size: f64) -> usize {
    // Subtract a hair before ceil so 0.7 * 10 = 7.000000000000001 stays 7
    let n = ((total as f64) * test_size - 1e-9).ceil().max(0.0) as usize;
    n.min(total)
}

/// Shuffle `samples` and split into (train, test).
///
/// # Arguments
/// * `samples`   - All rows (consumed by this function)
/// * `test_size` - Fraction for the test set, e.g. 0.2 = 20%
/// * `rng`       - Source of randomness
pub fn split_train_test<T>(
    mut samples: Vec<T>,
    test_size:   f64,
    rng:         &mut StdRng,
) -> (Vec<T>, Vec<T>) {
    samples.shuffle(rng);

    let total    = samples.len();
    let n_test   = test_len(total, test_size);
    let split_at = total - n_test;

    // split_off(n) removes elements [n..] and returns them
    let test = samples.split_off(split_at);

    tracing::debug!(
        "Dataset split: {} training, {} test",
        samples.len(),
        test.len(),
    );

    (samples, test)
}

/// Keep a random `frac` of `samples`. `frac >= 1.0` keeps everything
/// in the original order.
pub fn sample_fraction<T>(mut samples: Vec<T>, frac: f64, rng: &mut StdRng) -> Vec<T> {
    if frac >= 1.0 {
        return samples;
    }
    let keep = ((samples.len() as f64) * frac).round().max(0.0) as usize;
    samples.shuffle(rng);
    samples.truncate(keep);
    samples
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_correct_split_sizes() {
        let items: Vec<usize> = (0..10).collect();
        let (train, test)     = split_train_test(items, 0.2, &mut make_rng(Some(7)));
        assert_eq!(train.len(), 8);
        assert_eq!(test.len(),  2);
    }

    #[test]
    fn test_partitions_are_disjoint_and_complete() {
        let items: Vec<usize> = (0..57).collect();
        let (train, test)     = split_train_test(items, 0.3, &mut make_rng(Some(1)));
        assert_eq!(train.len() + test.len(), 57);
        assert!(train.iter().all(|t| !test.contains(t)));
    }

    #[test]
    fn test_test_len_close_to_fraction() {
        for n in [1usize, 7, 10, 33, 100, 999] {
            for f in [0.1, 0.2, 0.25, 0.5, 0.7] {
                let expected = (n as f64 * f).round() as i64;
                let got      = test_len(n, f) as i64;
                assert!((got - expected).abs() <= 1, "n={n} f={f} got={got}");
            }
        }
        // Float noise must not add a row
        assert_eq!(test_len(10, 0.7), 7);
    }

    #[test]
    fn test_seed_is_reproducible() {
        let a = split_train_test((0..20).collect::<Vec<_>>(), 0.25, &mut make_rng(Some(3)));
        let b = split_train_test((0..20).collect::<Vec<_>>(), 0.25, &mut make_rng(Some(3)));
        assert_eq!(a, b);
    }

    #[test]
    fn test_empty_dataset() {
        let (train, test) = split_train_test(Vec::<usize>::new(), 0.2, &mut make_rng(None));
        assert!(train.is_empty());
        assert!(test.is_empty());
    }

    #[test]
    fn test_sample_fraction() {
        let mut rng = make_rng(Some(11));
        assert_eq!(sample_fraction((0..10).collect::<Vec<_>>(), 1.0, &mut rng).len(), 10);
        let half = sample_fraction((0..10).collect::<Vec<_>>(), 0.5, &mut rng);
        assert_eq!(half.len(), 5);
        let tenth = sample_fraction((0..30).collect::<Vec<_>>(), 0.1, &mut rng);
        assert_eq!(tenth.len(), 3);
    }
}
