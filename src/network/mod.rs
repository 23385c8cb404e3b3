//! Discrete Bayesian networks: topology, parameters, inference and
//! structure learning.

pub mod cpd;
pub mod inference;
pub mod model;
pub mod structure;
pub mod topology;

pub use cpd::{Estimator, Prior, TabularCpd};
pub use model::BayesianNetworkModel;
pub use structure::{HillClimbSearch, ScoreKind};
pub use topology::Network;
