//! Score-based structure learning (greedy hill climbing).

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::cpd::EncodedData;
use super::topology::Network;
use crate::data::model::Table;
use crate::error::{HarnessError, Result};

// ---------------------------------------------------------------------------
// Scores
// ---------------------------------------------------------------------------

/// Decomposable structure score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ScoreKind {
    Bic,
    K2,
    BDeu { equivalent_sample_size: f64 },
}

impl FromStr for ScoreKind {
    type Err = HarnessError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "BicScore" | "bic" => Ok(ScoreKind::Bic),
            "K2Score" | "k2" => Ok(ScoreKind::K2),
            "BDeuScore" | "bdeu" => Ok(ScoreKind::BDeu {
                equivalent_sample_size: 10.0,
            }),
            other => Err(HarnessError::UnknownScore(other.to_string())),
        }
    }
}

impl fmt::Display for ScoreKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScoreKind::Bic => write!(f, "BicScore"),
            ScoreKind::K2 => write!(f, "K2Score"),
            ScoreKind::BDeu {
                equivalent_sample_size,
            } => write!(f, "BDeuScore(ess={equivalent_sample_size})"),
        }
    }
}

impl ScoreKind {
    /// Score of one family: `var` with the given parents.
    pub fn local_score(&self, data: &EncodedData, var: usize, parents: &[usize]) -> f64 {
        let counts = data.family_counts(var, parents);
        let (q, r) = counts.dim();
        let (q, r) = (q as f64, r as f64);

        match *self {
            ScoreKind::Bic => {
                let mut log_likelihood = 0.0;
                for row in counts.rows() {
                    let n_j = row.sum();
                    for &n_jk in row.iter().filter(|&&c| c > 0.0) {
                        log_likelihood += n_jk * (n_jk / n_j).ln();
                    }
                }
                let n = data.n_rows() as f64;
                log_likelihood - 0.5 * n.ln() * q * (r - 1.0)
            }
            ScoreKind::K2 => counts
                .rows()
                .into_iter()
                .map(|row| {
                    ln_gamma(r) - ln_gamma(row.sum() + r)
                        + row.iter().map(|&c| ln_gamma(c + 1.0)).sum::<f64>()
                })
                .sum(),
            ScoreKind::BDeu {
                equivalent_sample_size,
            } => {
                let alpha = equivalent_sample_size / q;
                let beta = equivalent_sample_size / (q * r);
                counts
                    .rows()
                    .into_iter()
                    .map(|row| {
                        ln_gamma(alpha) - ln_gamma(row.sum() + alpha)
                            + row
                                .iter()
                                .map(|&c| ln_gamma(c + beta) - ln_gamma(beta))
                                .sum::<f64>()
                    })
                    .sum()
            }
        }
    }
}

/// Natural log of the gamma function (Lanczos, g = 7).
pub fn ln_gamma(x: f64) -> f64 {
    const COEFFS: [f64; 9] = [
        0.999_999_999_999_809_9,
        676.520_368_121_885_1,
        -1_259.139_216_722_402_8,
        771.323_428_777_653_1,
        -176.615_029_162_140_6,
        12.507_343_278_686_905,
        -0.138_571_095_265_720_12,
        9.984_369_578_019_572e-6,
        1.505_632_735_149_311_6e-7,
    ];
    if x < 0.5 {
        // Reflection formula.
        let pi = std::f64::consts::PI;
        return (pi / (pi * x).sin()).abs().ln() - ln_gamma(1.0 - x);
    }
    let x = x - 1.0;
    let t = x + 7.5;
    let series = COEFFS[1..]
        .iter()
        .enumerate()
        .fold(COEFFS[0], |acc, (i, &c)| acc + c / (x + i as f64 + 1.0));
    0.5 * (2.0 * std::f64::consts::PI).ln() + (x + 0.5) * t.ln() - t + series.ln()
}

// ---------------------------------------------------------------------------
// HillClimbSearch
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
enum Operation {
    Add(usize, usize),
    Remove(usize, usize),
    Reverse(usize, usize),
}

/// Greedy local search over DAGs: add, remove or reverse one edge per step,
/// taking the move with the largest score gain until none gains more than
/// `epsilon`.
pub struct HillClimbSearch {
    data: EncodedData,
    max_indegree: Option<usize>,
    max_iter: usize,
    epsilon: f64,
    cache: RefCell<HashMap<(usize, Vec<usize>), f64>>,
}

impl HillClimbSearch {
    pub fn new(table: &Table) -> Result<Self> {
        if table.is_empty() {
            return Err(HarnessError::EmptyInput(
                "cannot learn a structure from an empty table".to_string(),
            ));
        }
        Ok(Self {
            data: EncodedData::from_table(table),
            max_indegree: None,
            max_iter: 1_000_000,
            epsilon: 1e-4,
            cache: RefCell::new(HashMap::new()),
        })
    }

    pub fn with_max_indegree(mut self, max_indegree: usize) -> Self {
        self.max_indegree = Some(max_indegree);
        self
    }

    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    /// Run the search from the empty graph over every column of the table.
    pub fn estimate(&self, score: ScoreKind) -> Result<Network> {
        self.estimate_from(&Network::new(), score)
    }

    /// Run the search starting from the edges of `start`, whose nodes must all
    /// be columns of the table.
    pub fn estimate_from(&self, start: &Network, score: ScoreKind) -> Result<Network> {
        let names = self.data.names();
        // Node indices must line up with the encoded column indices.
        let mut net = Network::new();
        for name in names {
            net.add_node(name);
        }
        for (parent, child) in start.edges() {
            for node in [parent, child] {
                if !names.iter().any(|n| n == node) {
                    return Err(HarnessError::InvalidNetwork(format!(
                        "start node '{node}' is not a column of the data"
                    )));
                }
            }
            net.add_edge(parent, child)?;
        }

        let mut iterations = 0;
        while iterations < self.max_iter {
            let Some((op, gain)) = self.best_operation(&net, score) else {
                break;
            };
            if gain <= self.epsilon {
                break;
            }
            match op {
                Operation::Add(u, v) => net.add_edge(&names[u], &names[v])?,
                Operation::Remove(u, v) => {
                    net.remove_edge(&names[u], &names[v]);
                }
                Operation::Reverse(u, v) => {
                    net.remove_edge(&names[u], &names[v]);
                    net.add_edge(&names[v], &names[u])?;
                }
            }
            log::debug!("Hill climb step {iterations}: {op:?} (+{gain:.4})");
            iterations += 1;
        }

        log::info!(
            "Learned structure with {} edges in {} steps using {}",
            net.edge_count(),
            iterations,
            score
        );
        Ok(net)
    }

    fn score(&self, score: ScoreKind, var: usize, parents: &[usize]) -> f64 {
        let mut key_parents = parents.to_vec();
        key_parents.sort_unstable();
        let key = (var, key_parents);
        if let Some(&cached) = self.cache.borrow().get(&key) {
            return cached;
        }
        let value = score.local_score(&self.data, var, &key.1);
        self.cache.borrow_mut().insert(key, value);
        value
    }

    fn indegree_ok(&self, parents: &[usize]) -> bool {
        self.max_indegree.map_or(true, |max| parents.len() < max)
    }

    fn best_operation(&self, net: &Network, score: ScoreKind) -> Option<(Operation, f64)> {
        let n = net.node_count();
        let mut best: Option<(Operation, f64)> = None;
        let mut consider = |op: Operation, gain: f64| {
            if best.map_or(true, |(_, g)| gain > g) {
                best = Some((op, gain));
            }
        };

        for u in 0..n {
            for v in 0..n {
                if u == v {
                    continue;
                }
                let parents_v = net.parent_indices(v);
                let old_v = self.score(score, v, &parents_v);

                if parents_v.contains(&u) {
                    let without: Vec<usize> = parents_v.iter().copied().filter(|&p| p != u).collect();
                    let remove_gain = self.score(score, v, &without) - old_v;
                    consider(Operation::Remove(u, v), remove_gain);

                    // Reversal is legal when no other path leads from u to v.
                    let parents_u = net.parent_indices(u);
                    let mut reduced = net.clone();
                    reduced.remove_edge(&net.nodes()[u], &net.nodes()[v]);
                    if !reduced.has_path(u, v) && self.indegree_ok(&parents_u) {
                        let mut with_v = parents_u.clone();
                        with_v.push(v);
                        let gain = remove_gain + self.score(score, u, &with_v)
                            - self.score(score, u, &parents_u);
                        consider(Operation::Reverse(u, v), gain);
                    }
                } else if !net.parent_indices(u).contains(&v)
                    && !net.has_path(v, u)
                    && self.indegree_ok(&parents_v)
                {
                    let mut with_u = parents_v.clone();
                    with_u.push(u);
                    consider(Operation::Add(u, v), self.score(score, v, &with_u) - old_v);
                }
            }
        }
        best
    }
}
