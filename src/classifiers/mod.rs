//! Baseline classifiers the Bayesian networks are compared against.

pub mod decision_tree;
pub mod gaussian_nb;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::data::model::{Column, Table};
use crate::error::{HarnessError, Result};

pub use decision_tree::DecisionTree;
pub use gaussian_nb::GaussianNb;

/// Fit/predict contract shared by the baselines.
pub trait Classifier {
    /// Learn from a feature table and its labels.
    fn fit(&mut self, features: &Table, target: &Column) -> Result<()>;

    /// Predict one label per row of `features`.
    fn predict(&self, features: &Table) -> Result<Vec<f64>>;

    fn name(&self) -> &'static str;
}

/// Which baseline to run. Parsing is strict: unknown labels are errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ClassifierKind {
    GaussianNb,
    DecisionTree,
}

impl ClassifierKind {
    pub const ALL: [ClassifierKind; 2] = [ClassifierKind::GaussianNb, ClassifierKind::DecisionTree];

    pub fn label(self) -> &'static str {
        match self {
            ClassifierKind::GaussianNb => "GaussianNB",
            ClassifierKind::DecisionTree => "DecisionTree",
        }
    }

    /// Instantiate the classifier; `seed` drives the tree's feature order.
    pub fn build(self, seed: u64) -> Box<dyn Classifier> {
        match self {
            ClassifierKind::GaussianNb => Box::new(GaussianNb::new()),
            ClassifierKind::DecisionTree => Box::new(DecisionTree::new(seed)),
        }
    }
}

impl FromStr for ClassifierKind {
    type Err = HarnessError;

    fn from_str(s: &str) -> Result<Self> {
        ClassifierKind::ALL
            .into_iter()
            .find(|kind| kind.label() == s)
            .ok_or_else(|| HarnessError::UnknownClassifier(s.to_string()))
    }
}

impl fmt::Display for ClassifierKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// -- helpers shared by the baselines --

/// Sorted distinct labels.
pub(crate) fn class_labels(target: &Column) -> Vec<f64> {
    let mut classes = target.to_vec();
    classes.sort_by(f64::total_cmp);
    classes.dedup();
    classes
}

pub(crate) fn check_fit_input(features: &Table, target: &Column) -> Result<()> {
    if features.is_empty() {
        return Err(HarnessError::EmptyInput(
            "cannot fit on an empty table".to_string(),
        ));
    }
    if features.n_rows() != target.len() {
        return Err(HarnessError::LengthMismatch {
            expected: features.n_rows(),
            actual: target.len(),
        });
    }
    Ok(())
}

pub(crate) fn check_width(features: &Table, n_features: usize) -> Result<()> {
    if features.n_cols() != n_features {
        return Err(HarnessError::LengthMismatch {
            expected: n_features,
            actual: features.n_cols(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_parse_strictly() {
        assert_eq!("GaussianNB".parse::<ClassifierKind>().unwrap(), ClassifierKind::GaussianNb);
        assert_eq!(
            "DecisionTree".parse::<ClassifierKind>().unwrap(),
            ClassifierKind::DecisionTree
        );
        for bad in ["Foo", "gaussiannb", ""] {
            assert!(matches!(
                bad.parse::<ClassifierKind>(),
                Err(HarnessError::UnknownClassifier(_))
            ));
        }
    }

    #[test]
    fn build_matches_kind() {
        for kind in ClassifierKind::ALL {
            assert_eq!(kind.build(42).name(), kind.label());
        }
    }
}
