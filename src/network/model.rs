use std::collections::HashSet;

use super::cpd::{argmax, EncodedData, Estimator, TabularCpd};
use super::inference::{variable_elimination, Factor};
use super::topology::Network;
use crate::data::model::{Partition, Table};
use crate::error::{HarnessError, Result};

// ---------------------------------------------------------------------------
// BayesianNetworkModel
// ---------------------------------------------------------------------------

/// A discrete Bayesian network over a fixed topology.
///
/// `fit` estimates one CPD per node from a training partition, `predict`
/// returns the most probable value of a target column for every row of a
/// feature table, conditioning on all feature columns that are nodes.
#[derive(Debug, Clone)]
pub struct BayesianNetworkModel {
    network: Network,
    estimator: Estimator,
    /// Indexed like `network.nodes()`; empty until fitted.
    cpds: Vec<TabularCpd>,
}

impl BayesianNetworkModel {
    /// Every node of `network` must be listed in `nodes`; listed nodes the
    /// network does not mention become isolated nodes.
    pub fn new<S: AsRef<str>>(nodes: &[S], network: &Network, estimator: Estimator) -> Result<Self> {
        let names: Vec<&str> = nodes.iter().map(|n| n.as_ref()).collect();
        if let Some(missing) = network.nodes().iter().find(|n| !names.contains(&n.as_str())) {
            return Err(HarnessError::InvalidNetwork(format!(
                "network node '{missing}' is not a data column"
            )));
        }

        let mut network = network.clone();
        for name in names {
            network.add_node(name);
        }
        Ok(Self {
            network,
            estimator,
            cpds: Vec::new(),
        })
    }

    pub fn network(&self) -> &Network {
        &self.network
    }

    pub fn estimator(&self) -> Estimator {
        self.estimator
    }

    pub fn is_fitted(&self) -> bool {
        !self.cpds.is_empty()
    }

    pub fn cpd(&self, node: &str) -> Option<&TabularCpd> {
        self.network.node_index(node).and_then(|idx| self.cpds.get(idx))
    }

    /// Estimate every CPD from the features and target of `training`.
    pub fn fit(&mut self, training: &Partition) -> Result<()> {
        if training.is_empty() {
            return Err(HarnessError::EmptyInput(
                "cannot fit a network on an empty partition".to_string(),
            ));
        }
        let table = training.to_table()?.select_columns(self.network.nodes())?;
        let data = EncodedData::from_table(&table);

        let mut cpds = Vec::with_capacity(self.network.node_count());
        for (idx, name) in self.network.nodes().iter().enumerate() {
            let parents = self.network.parent_indices(idx);
            let counts = data.family_counts(idx, &parents);
            cpds.push(TabularCpd {
                variable: name.clone(),
                states: data.state_space(idx).clone(),
                parents: parents
                    .iter()
                    .map(|&p| self.network.nodes()[p].clone())
                    .collect(),
                parent_cards: parents.iter().map(|&p| data.cardinality(p)).collect(),
                values: self.estimator.estimate(&counts),
            });
        }
        self.cpds = cpds;

        log::info!(
            "Fitted {} CPDs on {} rows with {}",
            self.cpds.len(),
            data.n_rows(),
            self.estimator
        );
        Ok(())
    }

    /// Most probable `target` value for each row of `features`.
    pub fn predict(&self, features: &Table, target: &str) -> Result<Vec<f64>> {
        if !self.is_fitted() {
            return Err(HarnessError::NotFitted);
        }
        let query = self
            .network
            .node_index(target)
            .ok_or_else(|| HarnessError::ColumnNotFound(target.to_string()))?;

        // (node, column) pairs that can serve as evidence.
        let evidence_cols: Vec<(usize, usize)> = features
            .columns()
            .iter()
            .enumerate()
            .filter_map(|(col, name)| {
                self.network
                    .node_index(name)
                    .filter(|&node| node != query)
                    .map(|node| (node, col))
            })
            .collect();

        let templates: Vec<Factor> = self
            .cpds
            .iter()
            .enumerate()
            .map(|(idx, cpd)| Factor::from_cpd(idx, &self.network.parent_indices(idx), cpd))
            .collect();
        let topo = self.network.topological_order();

        let mut predictions = Vec::with_capacity(features.n_rows());
        for row in 0..features.n_rows() {
            let values = features.row(row);
            let mut evidence = Vec::with_capacity(evidence_cols.len());
            for &(node, col) in &evidence_cols {
                match self.cpds[node].states.index_of(values[col]) {
                    Some(state) => evidence.push((node, state)),
                    None => log::debug!(
                        "row {row}: value {} of '{}' unseen in training, marginalizing",
                        values[col],
                        self.network.nodes()[node]
                    ),
                }
            }

            let posterior = self.posterior(&templates, &topo, query, &evidence);
            let state = argmax(posterior.into_iter());
            predictions.push(self.cpds[query].states.value(state));
        }

        log::debug!("Predicted '{target}' for {} rows", predictions.len());
        Ok(predictions)
    }

    fn posterior(
        &self,
        templates: &[Factor],
        topo: &[usize],
        query: usize,
        evidence: &[(usize, usize)],
    ) -> Vec<f64> {
        // Nodes that are neither ancestors of the query nor of evidence sum
        // to one and can be left out.
        let mut relevant: HashSet<usize> = HashSet::new();
        let mut stack: Vec<usize> = evidence.iter().map(|&(n, _)| n).collect();
        stack.push(query);
        while let Some(node) = stack.pop() {
            if relevant.insert(node) {
                stack.extend(self.network.parent_indices(node));
            }
        }

        let factors: Vec<Factor> = topo
            .iter()
            .filter(|&&n| relevant.contains(&n))
            .map(|&n| {
                evidence
                    .iter()
                    .fold(templates[n].clone(), |f, &(var, state)| f.reduce(var, state))
            })
            .collect();

        let observed: HashSet<usize> = evidence.iter().map(|&(n, _)| n).collect();
        let order: Vec<usize> = topo
            .iter()
            .rev()
            .copied()
            .filter(|n| relevant.contains(n) && !observed.contains(n) && *n != query)
            .collect();

        variable_elimination(factors, query, &order)
    }
}
