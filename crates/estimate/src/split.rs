//! Randomized train/validation partition.
//!
//! Shuffle, then cut by index: `floor(N × ratio)` examples go to train and
//! the rest to validation. A non-empty dataset never yields an empty train
//! set. Pass a seed for reproducible splits.

use crate::EstimateError;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// Fraction of examples assigned to the train set by default.
pub const DEFAULT_TRAIN_RATIO: f64 = 0.8;

/// The two halves of a dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Split<T> {
    pub train: Vec<T>,
    pub validation: Vec<T>,
}

impl<T> Split<T> {
    pub fn len(&self) -> usize {
        self.train.len() + self.validation.len()
    }

    pub fn is_empty(&self) -> bool {
        self.train.is_empty() && self.validation.is_empty()
    }
}

/// Number of train examples for a dataset of `n`.
pub fn train_size(n: usize, ratio: f64) -> usize {
    if n == 0 {
        return 0;
    }
    let floored = (n as f64 * ratio).floor() as usize;
    floored.clamp(1, n)
}

fn check_ratio(ratio: f64) -> Result<(), EstimateError> {
    if ratio > 0.0 && ratio <= 1.0 {
        Ok(())
    } else {
        Err(EstimateError::InvalidRatio(ratio))
    }
}

/// Shuffle `items` with `rng` and partition them.
pub fn split_with_rng<T, R: Rng + ?Sized>(
    mut items: Vec<T>,
    ratio: f64,
    rng: &mut R,
) -> Result<Split<T>, EstimateError> {
    check_ratio(ratio)?;
    items.shuffle(rng);
    let cut = train_size(items.len(), ratio);
    let validation = items.split_off(cut);
    tracing::debug!(
        train = items.len(),
        validation = validation.len(),
        "Dataset split"
    );
    Ok(Split {
        train: items,
        validation,
    })
}

/// Shuffle and partition, seeded when `seed` is given.
pub fn split_train_validation<T>(
    items: Vec<T>,
    ratio: f64,
    seed: Option<u64>,
) -> Result<Split<T>, EstimateError> {
    match seed {
        Some(seed) => split_with_rng(items, ratio, &mut StdRng::seed_from_u64(seed)),
        None => split_with_rng(items, ratio, &mut rand::rng()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sizes_sum_to_n() {
        for n in 0..60 {
            let split =
                split_train_validation((0..n).collect::<Vec<usize>>(), DEFAULT_TRAIN_RATIO, Some(7))
                    .unwrap();
            assert_eq!(split.len(), n);
            assert_eq!(split.train.len(), train_size(n, DEFAULT_TRAIN_RATIO));
        }
    }

    #[test]
    fn empty_dataset_gives_two_empty_sets() {
        let split = split_train_validation(Vec::<u32>::new(), DEFAULT_TRAIN_RATIO, None).unwrap();
        assert!(split.train.is_empty());
        assert!(split.validation.is_empty());
    }

    #[test]
    fn single_example_goes_to_train() {
        let split = split_train_validation(vec!["only"], DEFAULT_TRAIN_RATIO, None).unwrap();
        assert_eq!(split.train, vec!["only"]);
        assert!(split.validation.is_empty());
    }

    #[test]
    fn ten_examples_split_eight_two() {
        let split = split_train_validation((0..10).collect::<Vec<_>>(), 0.8, Some(1)).unwrap();
        assert_eq!(split.train.len(), 8);
        assert_eq!(split.validation.len(), 2);
    }

    #[test]
    fn seeded_split_is_reproducible() {
        let a = split_train_validation((0..25).collect::<Vec<_>>(), 0.8, Some(42)).unwrap();
        let b = split_train_validation((0..25).collect::<Vec<_>>(), 0.8, Some(42)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn every_item_lands_exactly_once() {
        let split = split_train_validation((0..30).collect::<Vec<u32>>(), 0.8, Some(3)).unwrap();
        let mut all: Vec<u32> = split.train.iter().chain(&split.validation).copied().collect();
        all.sort_unstable();
        assert_eq!(all, (0..30).collect::<Vec<_>>());
    }

    #[test]
    fn invalid_ratio_rejected() {
        for ratio in [0.0, -0.5, 1.5, f64::NAN] {
            assert!(matches!(
                split_train_validation(vec![1, 2, 3], ratio, Some(1)),
                Err(EstimateError::InvalidRatio(_))
            ));
        }
        let all_train = split_train_validation(vec![1, 2, 3], 1.0, Some(1)).unwrap();
        assert_eq!(all_train.train.len(), 3);
    }
}
