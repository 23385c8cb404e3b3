use std::str::FromStr;

use ndarray::ArrayView1;
use serde::{Deserialize, Serialize};

use super::model::{Partition, Split, Table};
use crate::error::{HarnessError, Result};

// ---------------------------------------------------------------------------
// KBinsDiscretizer – equal-width ordinal binning
// ---------------------------------------------------------------------------

/// Equal-width discretizer producing ordinal bin indices `0..n_bins`.
///
/// Edges are learned by [`fit`](Self::fit) and reused unchanged by every
/// later [`transform`](Self::transform) call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KBinsDiscretizer {
    n_bins: usize,
    /// (column, edges) in fit order; `edges.len() == n_bins + 1`.
    bin_edges: Vec<(String, Vec<f64>)>,
    fitted: bool,
}

impl KBinsDiscretizer {
    pub fn new(n_bins: usize) -> Result<Self> {
        if n_bins < 2 {
            return Err(HarnessError::InvalidParameter(format!(
                "n_bins must be at least 2, got {n_bins}"
            )));
        }
        Ok(Self {
            n_bins,
            bin_edges: Vec::new(),
            fitted: false,
        })
    }

    pub fn n_bins(&self) -> usize {
        self.n_bins
    }

    pub fn is_fitted(&self) -> bool {
        self.fitted
    }

    /// Learn bin edges for `columns` from `table`. Replaces any earlier fit.
    pub fn fit<S: AsRef<str>>(&mut self, table: &Table, columns: &[S]) -> Result<&mut Self> {
        if table.is_empty() {
            return Err(HarnessError::EmptyInput(
                "cannot fit a discretizer on an empty table".to_string(),
            ));
        }
        let mut edges = Vec::with_capacity(columns.len());
        for name in columns {
            let name = name.as_ref();
            let column = table.column(name)?;
            check_finite(name, column)?;
            let min = column.iter().copied().fold(f64::INFINITY, f64::min);
            let max = column.iter().copied().fold(f64::NEG_INFINITY, f64::max);

            let col_edges = if max - min == 0.0 {
                log::warn!("Column '{name}' is constant; all values map to bin 0");
                vec![f64::NEG_INFINITY, f64::INFINITY]
            } else {
                let step = (max - min) / self.n_bins as f64;
                let mut e: Vec<f64> = (0..=self.n_bins).map(|i| min + i as f64 * step).collect();
                // Pin the last edge so rounding never leaves `max` outside.
                e[self.n_bins] = max;
                e
            };
            log::debug!("Bin edges for '{name}': {col_edges:?}");
            edges.push((name.to_string(), col_edges));
        }
        self.bin_edges = edges;
        self.fitted = true;
        Ok(self)
    }

    pub fn bin_edges(&self, column: &str) -> Option<&[f64]> {
        self.bin_edges
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, e)| e.as_slice())
    }

    /// Replace every fitted column of `table` with its bin index.
    pub fn transform(&self, table: &Table) -> Result<Table> {
        if !self.is_fitted() {
            return Err(HarnessError::NotFitted);
        }
        let mut out = table.clone();
        for (name, edges) in &self.bin_edges {
            let column = table.column(name)?;
            check_finite(name, column)?;
            let binned = column.mapv(|x| self.bin_index(edges, x) as f64);
            out.set_column(name, binned.view())?;
        }
        Ok(out)
    }

    pub fn fit_transform<S: AsRef<str>>(&mut self, table: &Table, columns: &[S]) -> Result<Table> {
        self.fit(table, columns)?;
        self.transform(table)
    }

    fn bin_index(&self, edges: &[f64], x: f64) -> usize {
        // Relative tolerance so values sitting on an edge land in the upper bin.
        let eps = 1e-8 + 1e-5 * x.abs();
        let shifted = x + eps;
        let idx = edges[1..].iter().take_while(|&&e| e <= shifted).count();
        idx.min(self.n_bins - 1)
    }
}

fn check_finite(name: &str, column: ArrayView1<'_, f64>) -> Result<()> {
    if column.iter().all(|x| x.is_finite()) {
        Ok(())
    } else {
        Err(HarnessError::InvalidParameter(format!(
            "column '{name}' contains non-finite values"
        )))
    }
}

// ---------------------------------------------------------------------------
// Split-level discretization
// ---------------------------------------------------------------------------

/// How the target column takes part in discretization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TargetPolicy {
    /// Categorical target (`class`): only features are binned.
    Class,
    /// Continuous target (`n_children`): binned jointly with the features.
    NChildren,
}

impl TargetPolicy {
    pub fn column_name(self) -> &'static str {
        match self {
            TargetPolicy::Class => "class",
            TargetPolicy::NChildren => "n_children",
        }
    }
}

impl FromStr for TargetPolicy {
    type Err = HarnessError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "class" => Ok(TargetPolicy::Class),
            "n_children" => Ok(TargetPolicy::NChildren),
            other => Err(HarnessError::UnknownTarget(other.to_string())),
        }
    }
}

/// Discretize `continuous_attrs` of a split into `n_bins` equal-width bins.
///
/// The transform is fit on the training partition only and applied to both
/// partitions. With target `n_children` the target is binned together with the
/// features and then split back out. The input split is left untouched.
pub fn discretize_data<S: AsRef<str>>(
    data: &Split,
    continuous_attrs: &[S],
    n_bins: usize,
    target: &str,
) -> Result<Split> {
    let policy: TargetPolicy = target.parse()?;
    let mut est = KBinsDiscretizer::new(n_bins)?;

    let split = match policy {
        TargetPolicy::Class => {
            est.fit(&data.train.features, continuous_attrs)?;
            Split {
                train: Partition {
                    features: est.transform(&data.train.features)?,
                    target: data.train.target.clone(),
                },
                test: Partition {
                    features: est.transform(&data.test.features)?,
                    target: data.test.target.clone(),
                },
            }
        }
        TargetPolicy::NChildren => {
            let train_ds = data.train.to_table()?;
            let test_ds = data.test.to_table()?;

            est.fit(&train_ds, continuous_attrs)?;
            let train_ds = est.transform(&train_ds)?;
            let test_ds = est.transform(&test_ds)?;

            let feature_order = data.train.features.columns();
            let target_name = &data.train.target.name;
            Split {
                train: Partition {
                    features: train_ds.select_columns(feature_order)?,
                    target: train_ds.to_column(target_name)?,
                },
                test: Partition {
                    features: test_ds.select_columns(feature_order)?,
                    target: test_ds.to_column(target_name)?,
                },
            }
        }
    };

    log::info!(
        "Discretized {} column(s) into {} bins (target '{}')",
        continuous_attrs.len(),
        n_bins,
        policy.column_name()
    );
    Ok(split)
}
