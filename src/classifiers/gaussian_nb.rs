use std::f64::consts::PI;

use ndarray::{Array1, Array2, ArrayView1, Axis};

use super::{check_fit_input, check_width, class_labels, Classifier};
use crate::data::model::{Column, Table};
use crate::error::{HarnessError, Result};
use crate::network::cpd::argmax;

/// Gaussian Naive Bayes classifier.
#[derive(Debug, Clone)]
pub struct GaussianNb {
    /// Fraction of the largest feature variance added to every variance.
    var_smoothing: f64,
    classes: Vec<f64>,
    log_priors: Vec<f64>,
    /// Per-class feature means (`n_classes x n_features`).
    means: Array2<f64>,
    variances: Array2<f64>,
}

impl Default for GaussianNb {
    fn default() -> Self {
        Self::new()
    }
}

impl GaussianNb {
    pub fn new() -> Self {
        Self {
            var_smoothing: 1e-9,
            classes: Vec::new(),
            log_priors: Vec::new(),
            means: Array2::zeros((0, 0)),
            variances: Array2::zeros((0, 0)),
        }
    }

    pub fn classes(&self) -> &[f64] {
        &self.classes
    }

    fn joint_log_likelihood(&self, x: ArrayView1<'_, f64>) -> Vec<f64> {
        (0..self.classes.len())
            .map(|c| {
                let log_likelihood: f64 = x
                    .iter()
                    .zip(self.means.row(c))
                    .zip(self.variances.row(c))
                    .map(|((&xi, &mean), &var)| {
                        -0.5 * ((2.0 * PI * var).ln() + (xi - mean).powi(2) / var)
                    })
                    .sum();
                self.log_priors[c] + log_likelihood
            })
            .collect()
    }
}

impl Classifier for GaussianNb {
    fn fit(&mut self, features: &Table, target: &Column) -> Result<()> {
        check_fit_input(features, target)?;
        let x = features.values();
        let n_samples = x.nrows();
        let n_features = x.ncols();

        let epsilon = self.var_smoothing
            * x.var_axis(Axis(0), 0.0)
                .iter()
                .copied()
                .fold(0.0, f64::max);

        self.classes = class_labels(target);
        let n_classes = self.classes.len();
        self.means = Array2::zeros((n_classes, n_features));
        self.variances = Array2::zeros((n_classes, n_features));
        self.log_priors = Vec::with_capacity(n_classes);

        for (c, &class) in self.classes.iter().enumerate() {
            let rows: Vec<usize> = target
                .values
                .iter()
                .enumerate()
                .filter(|(_, &y)| y == class)
                .map(|(i, _)| i)
                .collect();
            let subset = x.select(Axis(0), &rows);
            let mean: Array1<f64> = subset
                .mean_axis(Axis(0))
                .ok_or_else(|| HarnessError::EmptyInput(format!("class {class} has no rows")))?;
            let var = subset.var_axis(Axis(0), 0.0) + epsilon;

            self.means.row_mut(c).assign(&mean);
            self.variances.row_mut(c).assign(&var);
            self.log_priors
                .push((rows.len() as f64 / n_samples as f64).ln());
        }

        log::debug!(
            "GaussianNB fitted on {n_samples} rows, {n_features} features, {n_classes} classes"
        );
        Ok(())
    }

    fn predict(&self, features: &Table) -> Result<Vec<f64>> {
        if self.classes.is_empty() {
            return Err(HarnessError::NotFitted);
        }
        check_width(features, self.means.ncols())?;
        Ok(features
            .values()
            .rows()
            .into_iter()
            .map(|row| self.classes[argmax(self.joint_log_likelihood(row).into_iter())])
            .collect())
    }

    fn name(&self) -> &'static str {
        "GaussianNB"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn blobs() -> (Table, Column) {
        let rows = vec![
            vec![1.0, 2.0],
            vec![1.2, 1.8],
            vec![0.8, 2.2],
            vec![5.0, 6.0],
            vec![5.3, 5.9],
            vec![4.8, 6.1],
        ];
        (
            Table::from_rows(&["x", "y"], &rows).unwrap(),
            Column::new("class", array![1.0, 1.0, 1.0, 2.0, 2.0, 2.0]),
        )
    }

    #[test]
    fn separates_two_blobs() {
        let (x, y) = blobs();
        let mut nb = GaussianNb::new();
        nb.fit(&x, &y).unwrap();
        assert_eq!(nb.classes(), &[1.0, 2.0]);
        assert_eq!(nb.predict(&x).unwrap(), y.to_vec());

        let query = Table::from_rows(&["x", "y"], &[vec![0.9, 2.1], vec![5.1, 6.2]]).unwrap();
        assert_eq!(nb.predict(&query).unwrap(), vec![1.0, 2.0]);
    }

    #[test]
    fn priors_break_ties_between_identical_likelihoods() {
        let x = Table::from_rows(&["x"], &[vec![1.0], vec![1.0], vec![1.0]]).unwrap();
        let y = Column::new("class", array![3.0, 3.0, 1.0]);
        let mut nb = GaussianNb::new();
        nb.fit(&x, &y).unwrap();
        assert_eq!(nb.predict(&x).unwrap(), vec![3.0, 3.0, 3.0]);
    }

    #[test]
    fn rejects_mismatched_input() {
        let (x, _) = blobs();
        let short = Column::new("class", array![1.0]);
        assert!(GaussianNb::new().fit(&x, &short).is_err());

        let nb = GaussianNb::new();
        assert!(matches!(nb.predict(&x), Err(HarnessError::NotFitted)));
    }
}
