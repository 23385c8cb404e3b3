use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use ndarray::{Array2, Axis};
use serde::{Deserialize, Serialize};

use crate::data::model::Table;
use crate::error::{HarnessError, Result};

// ---------------------------------------------------------------------------
// StateSpace – the distinct values a discrete variable takes
// ---------------------------------------------------------------------------

/// Sorted distinct values observed for one variable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateSpace {
    values: Vec<f64>,
}

impl StateSpace {
    pub fn from_values(values: impl IntoIterator<Item = f64>) -> Self {
        let mut values: Vec<f64> = values.into_iter().collect();
        values.sort_by(f64::total_cmp);
        values.dedup();
        Self { values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn index_of(&self, value: f64) -> Option<usize> {
        self.values
            .binary_search_by(|state| state.total_cmp(&value))
            .ok()
    }

    pub fn value(&self, idx: usize) -> f64 {
        self.values[idx]
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }
}

// ---------------------------------------------------------------------------
// EncodedData – a table recoded as state indices
// ---------------------------------------------------------------------------

/// Every column of a table replaced by indices into its [`StateSpace`].
#[derive(Debug, Clone)]
pub struct EncodedData {
    names: Vec<String>,
    states: Vec<StateSpace>,
    /// codes[var][row]
    codes: Vec<Vec<usize>>,
    n_rows: usize,
}

impl EncodedData {
    pub fn from_table(table: &Table) -> Self {
        let mut states = Vec::with_capacity(table.n_cols());
        let mut codes = Vec::with_capacity(table.n_cols());
        for col in table.values().axis_iter(Axis(1)) {
            let space = StateSpace::from_values(col.iter().copied());
            let col_codes = col
                .iter()
                .map(|&v| space.index_of(v).unwrap_or_default())
                .collect();
            states.push(space);
            codes.push(col_codes);
        }
        Self {
            names: table.columns().to_vec(),
            states,
            codes,
            n_rows: table.n_rows(),
        }
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    pub fn state_space(&self, var: usize) -> &StateSpace {
        &self.states[var]
    }

    pub fn cardinality(&self, var: usize) -> usize {
        self.states[var].len()
    }

    /// Joint counts `N[config][state]` of `var` given `parents`.
    ///
    /// Parent configurations are indexed in mixed radix with the first parent
    /// most significant, so the table has `prod(parent cards)` rows.
    pub fn family_counts(&self, var: usize, parents: &[usize]) -> Array2<f64> {
        let cards: Vec<usize> = parents.iter().map(|&p| self.cardinality(p)).collect();
        let n_configs: usize = cards.iter().product();
        let mut counts = Array2::zeros((n_configs, self.cardinality(var)));
        for row in 0..self.n_rows {
            let config = parents
                .iter()
                .zip(&cards)
                .fold(0, |acc, (&p, &card)| acc * card + self.codes[p][row]);
            counts[[config, self.codes[var][row]]] += 1.0;
        }
        counts
    }
}

// ---------------------------------------------------------------------------
// Parameter estimation
// ---------------------------------------------------------------------------

/// Dirichlet prior used by [`Estimator::Bayesian`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Prior {
    /// Pseudo-count `ess / (r * q)` in every cell.
    BDeu,
    /// Pseudo-count 1 in every cell.
    K2,
}

/// CPD estimation strategy.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Estimator {
    MaximumLikelihood,
    Bayesian {
        prior: Prior,
        equivalent_sample_size: f64,
    },
}

impl Default for Estimator {
    fn default() -> Self {
        Estimator::Bayesian {
            prior: Prior::BDeu,
            equivalent_sample_size: 5.0,
        }
    }
}

impl FromStr for Estimator {
    type Err = HarnessError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "MaximumLikelihoodEstimator" | "mle" => Ok(Estimator::MaximumLikelihood),
            "BayesianEstimator" | "bayes" => Ok(Estimator::default()),
            other => Err(HarnessError::UnknownEstimator(other.to_string())),
        }
    }
}

impl fmt::Display for Estimator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Estimator::MaximumLikelihood => write!(f, "MaximumLikelihoodEstimator"),
            Estimator::Bayesian {
                prior,
                equivalent_sample_size,
            } => write!(f, "BayesianEstimator({prior:?}, ess={equivalent_sample_size})"),
        }
    }
}

impl Estimator {
    /// Turn family counts (`q x r`) into conditional probabilities.
    pub fn estimate(&self, counts: &Array2<f64>) -> Array2<f64> {
        let (n_configs, card) = counts.dim();
        let pseudo = match *self {
            Estimator::MaximumLikelihood => 0.0,
            Estimator::Bayesian {
                prior: Prior::BDeu,
                equivalent_sample_size,
            } => equivalent_sample_size / (n_configs * card) as f64,
            Estimator::Bayesian {
                prior: Prior::K2, ..
            } => 1.0,
        };

        let mut probs = counts.mapv(|c| c + pseudo);
        for mut row in probs.rows_mut() {
            let total = row.sum();
            if total > 0.0 {
                row /= total;
            } else {
                // Parent configuration never seen in training.
                row.fill(1.0 / card as f64);
            }
        }
        probs
    }
}

// ---------------------------------------------------------------------------
// TabularCpd
// ---------------------------------------------------------------------------

/// `P(variable | parents)` as a table with one row per parent configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TabularCpd {
    pub variable: String,
    pub states: StateSpace,
    pub parents: Vec<String>,
    pub parent_cards: Vec<usize>,
    /// `values[[config, state]]`, rows sum to one. `config` is mixed-radix
    /// over `parent_cards` with the first parent most significant.
    pub values: Array2<f64>,
}

/// Index of the largest value; the first one wins ties.
pub(crate) fn argmax(values: impl Iterator<Item = f64>) -> usize {
    values
        .enumerate()
        .fold((0, f64::NEG_INFINITY), |(best_i, best_v), (i, v)| {
            if v.partial_cmp(&best_v) == Some(Ordering::Greater) {
                (i, v)
            } else {
                (best_i, best_v)
            }
        })
        .0
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn table() -> Table {
        Table::from_rows(
            &["a", "b"],
            &[
                vec![0.0, 1.0],
                vec![0.0, 1.0],
                vec![0.0, 2.0],
                vec![1.0, 2.0],
            ],
        )
        .unwrap()
    }

    #[test]
    fn state_space_is_sorted_and_deduplicated() {
        let s = StateSpace::from_values([3.0, 1.0, 3.0, 2.0]);
        assert_eq!(s.values(), &[1.0, 2.0, 3.0]);
        assert_eq!(s.index_of(2.0), Some(1));
        assert_eq!(s.index_of(7.0), None);
    }

    #[test]
    fn family_counts_by_parent_configuration() {
        let data = EncodedData::from_table(&table());
        let counts = data.family_counts(1, &[0]);
        assert_eq!(counts, array![[2.0, 1.0], [0.0, 1.0]]);

        let marginal = data.family_counts(0, &[]);
        assert_eq!(marginal, array![[3.0, 1.0]]);
    }

    #[test]
    fn maximum_likelihood_is_relative_frequency() {
        let counts = array![[2.0, 1.0, 1.0], [0.0, 0.0, 0.0]];
        let probs = Estimator::MaximumLikelihood.estimate(&counts);
        assert_eq!(probs.row(0).to_vec(), vec![0.5, 0.25, 0.25]);
        // unseen configuration falls back to uniform
        for &p in probs.row(1).iter() {
            assert!((p - 1.0 / 3.0).abs() < 1e-12);
        }
    }

    #[test]
    fn bdeu_prior_smooths_counts() {
        let counts = array![[3.0, 0.0]];
        let est = Estimator::Bayesian {
            prior: Prior::BDeu,
            equivalent_sample_size: 2.0,
        };
        // pseudo = 2 / (1 * 2) = 1 -> (4, 1) / 5
        let probs = est.estimate(&counts);
        assert!((probs[[0, 0]] - 0.8).abs() < 1e-12);
        assert!((probs[[0, 1]] - 0.2).abs() < 1e-12);
    }

    #[test]
    fn estimator_labels() {
        assert_eq!(
            "MaximumLikelihoodEstimator".parse::<Estimator>().unwrap(),
            Estimator::MaximumLikelihood
        );
        assert_eq!("BayesianEstimator".parse::<Estimator>().unwrap(), Estimator::default());
        assert!(matches!(
            "Magic".parse::<Estimator>(),
            Err(HarnessError::UnknownEstimator(_))
        ));
    }

    #[test]
    fn argmax_prefers_first_on_ties() {
        assert_eq!(argmax([0.2, 0.4, 0.4].into_iter()), 1);
        assert_eq!(argmax(std::iter::empty()), 0);
    }
}
