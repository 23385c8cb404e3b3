//! Experiment runners: fit a model on the training partition, score it on
//! the test partition.

use serde::Serialize;

use crate::classifiers::ClassifierKind;
use crate::data::model::Split;
use crate::error::Result;
use crate::metrics::{classification_report, get_metrics, Average, ClassificationReport, Metrics};
use crate::network::{BayesianNetworkModel, Estimator, Network};

/// Seed for the decision tree baseline.
pub const BASELINE_SEED: u64 = 42;

/// Decimals reported by the runners.
const PRECISION: u32 = 3;

/// Outcome of one run, as printed by the CLI.
#[derive(Debug, Clone, Serialize)]
pub struct ExperimentReport {
    pub model: String,
    pub metrics: Metrics,
    pub report: ClassificationReport,
    pub n_train: usize,
    pub n_test: usize,
}

impl ExperimentReport {
    fn new(model: String, data: &Split, y_pred: &[f64]) -> Result<Self> {
        let y_true = data.test.target.to_vec();
        Ok(Self {
            model,
            metrics: get_metrics(&y_true, y_pred, Average::Macro, PRECISION)?,
            report: classification_report(&y_true, y_pred)?,
            n_train: data.train.len(),
            n_test: data.test.len(),
        })
    }
}

// ---------------------------------------------------------------------------
// Bayesian network
// ---------------------------------------------------------------------------

/// Fit a Bayesian network with the given topology and estimator, predict
/// `target` on the test partition and return macro-averaged metrics.
pub fn run_experiment(
    data: &Split,
    network: &Network,
    estimator: Estimator,
    target: &str,
) -> Result<Metrics> {
    let y_pred = predict_network(data, network, estimator, target)?;
    get_metrics(&data.test.target.to_vec(), &y_pred, Average::Macro, PRECISION)
}

pub fn run_experiment_with_report(
    data: &Split,
    network: &Network,
    estimator: Estimator,
    target: &str,
) -> Result<ExperimentReport> {
    let y_pred = predict_network(data, network, estimator, target)?;
    ExperimentReport::new(format!("BayesianNetwork ({estimator})"), data, &y_pred)
}

fn predict_network(
    data: &Split,
    network: &Network,
    estimator: Estimator,
    target: &str,
) -> Result<Vec<f64>> {
    let train_ds = data.train.to_table()?;
    let nodes = train_ds.columns();

    let mut model = BayesianNetworkModel::new(nodes, network, estimator)?;
    model.fit(&data.train)?;
    let y_pred = model.predict(&data.test.features, target)?;

    log::info!(
        "Bayesian network ({} edges, {}) scored {} test rows",
        network.edge_count(),
        estimator,
        y_pred.len()
    );
    Ok(y_pred)
}

// ---------------------------------------------------------------------------
// Baselines
// ---------------------------------------------------------------------------

/// Fit the baseline named by `clf_label` (`GaussianNB` or `DecisionTree`)
/// and return macro-averaged metrics on the test partition.
pub fn run_baseline_experiment(data: &Split, clf_label: &str) -> Result<Metrics> {
    let y_pred = predict_baseline(data, clf_label)?;
    get_metrics(&data.test.target.to_vec(), &y_pred, Average::Macro, PRECISION)
}

/// Same as [`run_baseline_experiment`], under the name the experiment scripts
/// use for the scikit-learn style baselines.
pub fn run_scikit_experiment(data: &Split, clf_label: &str) -> Result<Metrics> {
    run_baseline_experiment(data, clf_label)
}

pub fn run_baseline_experiment_with_report(
    data: &Split,
    clf_label: &str,
) -> Result<ExperimentReport> {
    let y_pred = predict_baseline(data, clf_label)?;
    ExperimentReport::new(clf_label.to_string(), data, &y_pred)
}

fn predict_baseline(data: &Split, clf_label: &str) -> Result<Vec<f64>> {
    let kind: ClassifierKind = clf_label.parse()?;
    let mut clf = kind.build(BASELINE_SEED);
    clf.fit(&data.train.features, &data.train.target)?;
    let y_pred = clf.predict(&data.test.features)?;
    log::info!("{} scored {} test rows", clf.name(), y_pred.len());
    Ok(y_pred)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::split::{split_data, SplitOptions};
    use crate::data::synthetic::generate_cmc_like;
    use crate::error::HarnessError;

    fn split() -> Split {
        let table = generate_cmc_like(300, 3).unwrap();
        split_data(&table, "class", &SplitOptions::default()).unwrap()
    }

    fn in_unit_range(m: &Metrics) -> bool {
        [m.accuracy, m.precision, m.recall, m.f1]
            .iter()
            .all(|v| (0.0..=1.0).contains(v))
    }

    #[test]
    fn baselines_produce_bounded_metrics() {
        let data = split();
        for label in ["GaussianNB", "DecisionTree"] {
            let m = run_baseline_experiment(&data, label).unwrap();
            assert!(in_unit_range(&m), "{label}: {m:?}");
        }
    }

    #[test]
    fn unknown_baseline_is_rejected() {
        assert!(matches!(
            run_baseline_experiment(&split(), "Foo"),
            Err(HarnessError::UnknownClassifier(label)) if label == "Foo"
        ));
    }

    #[test]
    fn scikit_runner_matches_the_baseline_runner() {
        let data = split();
        assert_eq!(
            run_scikit_experiment(&data, "DecisionTree").unwrap(),
            run_baseline_experiment(&data, "DecisionTree").unwrap()
        );
        assert!(matches!(
            run_scikit_experiment(&data, "Foo"),
            Err(HarnessError::UnknownClassifier(_))
        ));
    }

    #[test]
    fn naive_bayes_network_runs() {
        let data = split();
        let features: Vec<String> = data.train.features.columns().to_vec();
        let net = Network::naive_bayes("class", &features).unwrap();
        let m = run_experiment(&data, &net, Estimator::default(), "class").unwrap();
        assert!(in_unit_range(&m), "{m:?}");
    }

    #[test]
    fn report_carries_row_counts() {
        let data = split();
        let report = run_baseline_experiment_with_report(&data, "GaussianNB").unwrap();
        assert_eq!(report.n_train, 240);
        assert_eq!(report.n_test, 60);
        assert_eq!(report.report.weighted_avg.support, 60);
        assert_eq!(report.metrics, run_baseline_experiment(&data, "GaussianNB").unwrap());
    }
}
