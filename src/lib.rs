//! Experiment harness comparing Bayesian-network classifiers with baseline
//! learners on the Contraceptive Method Choice survey data.
//!
//! ```text
//!   load_data ──► split_data ──► discretize_data ──► run_experiment ──────────► Metrics
//!                                                  └► run_baseline_experiment ─┘
//! ```

pub mod classifiers;
pub mod config;
pub mod data;
pub mod error;
pub mod experiment;
pub mod metrics;
pub mod network;
pub mod viz;

pub use classifiers::{Classifier, ClassifierKind};
pub use config::ExperimentConfig;
pub use data::discretize::discretize_data;
pub use data::loader::load_data;
pub use data::model::{Column, Partition, Split, Table};
pub use data::split::{split_data, SplitOptions};
pub use error::{HarnessError, Result};
pub use experiment::{
    run_baseline_experiment, run_experiment, run_scikit_experiment, ExperimentReport,
};
pub use metrics::{classification_report, get_metrics, Average, Metrics};
pub use network::{BayesianNetworkModel, Estimator, Network};
pub use viz::plot_network;
