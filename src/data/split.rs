use std::collections::BTreeMap;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use super::model::{Partition, Split, Table};
use crate::error::{HarnessError, Result};

/// Options for [`split_data`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SplitOptions {
    /// Fraction of rows that go to the test partition.
    pub test_size: f64,
    pub seed: u64,
    /// Keep class proportions equal in both partitions. Off by default.
    pub stratify: bool,
}

impl Default for SplitOptions {
    fn default() -> Self {
        Self {
            test_size: 0.2,
            seed: 42,
            stratify: false,
        }
    }
}

/// Split a table into train and test partitions on `target`.
///
/// The target column is removed from both feature tables. The same input and
/// options always produce the same partition.
pub fn split_data(table: &Table, target: &str, options: &SplitOptions) -> Result<Split> {
    let (features, labels) = table.split_off(target)?;
    let n_samples = table.n_rows();
    let n_test = test_count(n_samples, options.test_size)?;

    let mut rng = StdRng::seed_from_u64(options.seed);
    let (train_idx, test_idx) = if options.stratify {
        let (train, test) = stratified_indices(&labels.to_vec(), n_test, &mut rng);
        if train.is_empty() || test.is_empty() {
            return Err(HarnessError::InvalidParameter(format!(
                "stratified split of {n_samples} rows leaves an empty partition"
            )));
        }
        (train, test)
    } else {
        let mut indices: Vec<usize> = (0..n_samples).collect();
        indices.shuffle(&mut rng);
        let train = indices.split_off(n_test);
        (train, indices)
    };

    log::debug!(
        "Split {} rows on '{}': {} train / {} test (stratify={})",
        n_samples,
        target,
        train_idx.len(),
        test_idx.len(),
        options.stratify
    );

    Ok(Split {
        train: Partition {
            features: features.select_rows(&train_idx),
            target: labels.select_rows(&train_idx),
        },
        test: Partition {
            features: features.select_rows(&test_idx),
            target: labels.select_rows(&test_idx),
        },
    })
}

/// Number of test rows: `ceil(n * test_size)`, leaving both sides non-empty.
fn test_count(n_samples: usize, test_size: f64) -> Result<usize> {
    if !(test_size > 0.0 && test_size < 1.0) {
        return Err(HarnessError::InvalidParameter(format!(
            "test_size must be between 0 and 1, got {test_size}"
        )));
    }
    let n_test = (n_samples as f64 * test_size).ceil() as usize;
    if n_test == 0 || n_test >= n_samples {
        return Err(HarnessError::InvalidParameter(format!(
            "split of {n_samples} rows with test_size={test_size} leaves an empty partition"
        )));
    }
    Ok(n_test)
}

/// Per-class shuffle and split, then a seeded interleave of each side.
fn stratified_indices(labels: &[f64], n_test: usize, rng: &mut StdRng) -> (Vec<usize>, Vec<usize>) {
    let mut by_class: BTreeMap<i64, Vec<usize>> = BTreeMap::new();
    for (i, &label) in labels.iter().enumerate() {
        by_class.entry(label.round() as i64).or_default().push(i);
    }

    let n_samples = labels.len();
    let test_fraction = n_test as f64 / n_samples as f64;
    let mut train = Vec::with_capacity(n_samples - n_test);
    let mut test = Vec::with_capacity(n_test);

    for (_, mut members) in by_class {
        members.shuffle(rng);
        let take = ((members.len() as f64) * test_fraction).round() as usize;
        let take = take.min(members.len());
        test.extend_from_slice(&members[..take]);
        train.extend_from_slice(&members[take..]);
    }

    train.shuffle(rng);
    test.shuffle(rng);
    (train, test)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn table(n: usize) -> Table {
        let rows: Vec<Vec<f64>> = (0..n)
            .map(|i| vec![i as f64, (i % 7) as f64, (i % 3 + 1) as f64])
            .collect();
        Table::from_rows(&["id", "x", "class"], &rows).unwrap()
    }

    fn ids(p: &Partition) -> Vec<f64> {
        p.features.column("id").unwrap().to_vec()
    }

    #[test]
    fn eighty_twenty_and_target_removed() {
        let split = split_data(&table(100), "class", &SplitOptions::default()).unwrap();
        assert_eq!(split.train.len(), 80);
        assert_eq!(split.test.len(), 20);
        assert!(!split.train.features.has_column("class"));
        assert!(!split.test.features.has_column("class"));
        assert_eq!(split.target_name(), "class");
    }

    #[test]
    fn deterministic_for_same_seed() {
        let t = table(57);
        let a = split_data(&t, "class", &SplitOptions::default()).unwrap();
        let b = split_data(&t, "class", &SplitOptions::default()).unwrap();
        assert_eq!(a, b);

        let other = SplitOptions {
            seed: 7,
            ..SplitOptions::default()
        };
        let c = split_data(&t, "class", &other).unwrap();
        assert_ne!(ids(&a.test), ids(&c.test));
    }

    #[test]
    fn partitions_are_disjoint_and_complete() {
        let split = split_data(&table(41), "class", &SplitOptions::default()).unwrap();
        let train: HashSet<i64> = ids(&split.train).iter().map(|&v| v as i64).collect();
        let test: HashSet<i64> = ids(&split.test).iter().map(|&v| v as i64).collect();
        assert!(train.is_disjoint(&test));
        assert_eq!(train.len() + test.len(), 41);
        // ceil(41 * 0.2) = 9
        assert_eq!(test.len(), 9);
    }

    #[test]
    fn stratified_split_keeps_class_balance() {
        let options = SplitOptions {
            stratify: true,
            ..SplitOptions::default()
        };
        let split = split_data(&table(90), "class", &options).unwrap();
        for class in 1..=3 {
            let n = split
                .test
                .target
                .values
                .iter()
                .filter(|&&v| v == class as f64)
                .count();
            assert_eq!(n, 6);
        }
    }

    #[test]
    fn rejects_bad_test_size_and_unknown_target() {
        let t = table(10);
        let bad = SplitOptions {
            test_size: 1.5,
            ..SplitOptions::default()
        };
        assert!(matches!(
            split_data(&t, "class", &bad),
            Err(HarnessError::InvalidParameter(_))
        ));
        assert!(matches!(
            split_data(&t, "nope", &SplitOptions::default()),
            Err(HarnessError::ColumnNotFound(_))
        ));
    }
}
