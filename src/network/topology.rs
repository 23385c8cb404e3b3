use std::collections::VecDeque;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{HarnessError, Result};

// ---------------------------------------------------------------------------
// Network – a DAG over column names
// ---------------------------------------------------------------------------

/// Directed acyclic graph describing which attributes condition which.
///
/// Serialized as `{"nodes": [...], "edges": [["parent", "child"], ...]}`;
/// nodes mentioned only in edges are added automatically. Deserialization
/// rejects self loops and cycles.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawNetwork", into = "RawNetwork")]
pub struct Network {
    nodes: Vec<String>,
    /// (parent, child) index pairs into `nodes`.
    edges: Vec<(usize, usize)>,
}

#[derive(Serialize, Deserialize)]
struct RawNetwork {
    #[serde(default)]
    nodes: Vec<String>,
    #[serde(default)]
    edges: Vec<(String, String)>,
}

impl TryFrom<RawNetwork> for Network {
    type Error = HarnessError;

    fn try_from(raw: RawNetwork) -> Result<Self> {
        let mut net = Network::new();
        for node in raw.nodes {
            net.add_node(&node);
        }
        for (parent, child) in raw.edges {
            net.add_edge(&parent, &child)?;
        }
        Ok(net)
    }
}

impl From<Network> for RawNetwork {
    fn from(net: Network) -> Self {
        let edges = net
            .edges
            .iter()
            .map(|&(p, c)| (net.nodes[p].clone(), net.nodes[c].clone()))
            .collect();
        RawNetwork {
            nodes: net.nodes,
            edges,
        }
    }
}

impl Network {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a network from `(parent, child)` pairs.
    pub fn from_edges<A, B>(edges: &[(A, B)]) -> Result<Self>
    where
        A: AsRef<str>,
        B: AsRef<str>,
    {
        let mut net = Network::new();
        for (parent, child) in edges {
            net.add_edge(parent.as_ref(), child.as_ref())?;
        }
        Ok(net)
    }

    /// Star-shaped naive Bayes topology: `target -> feature` for every feature.
    pub fn naive_bayes<S: AsRef<str>>(target: &str, features: &[S]) -> Result<Self> {
        let mut net = Network::new();
        net.add_node(target);
        for feature in features {
            net.add_edge(target, feature.as_ref())?;
        }
        Ok(net)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let net: Network = serde_json::from_str(&text)?;
        log::info!(
            "Loaded network with {} nodes and {} edges from {}",
            net.node_count(),
            net.edge_count(),
            path.as_ref().display()
        );
        Ok(net)
    }

    pub fn to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let text = serde_json::to_string_pretty(self)?;
        std::fs::write(path, text)?;
        Ok(())
    }

    /// Add a node if it is not already present; returns its index.
    pub fn add_node(&mut self, name: &str) -> usize {
        match self.node_index(name) {
            Some(idx) => idx,
            None => {
                self.nodes.push(name.to_string());
                self.nodes.len() - 1
            }
        }
    }

    /// Add `parent -> child`, creating missing nodes. Duplicate edges are
    /// ignored; self loops and edges closing a cycle are rejected.
    pub fn add_edge(&mut self, parent: &str, child: &str) -> Result<()> {
        if parent == child {
            return Err(HarnessError::InvalidNetwork(format!(
                "self loop on '{parent}'"
            )));
        }
        let p = self.add_node(parent);
        let c = self.add_node(child);
        if self.edges.contains(&(p, c)) {
            return Ok(());
        }
        if self.has_path(c, p) {
            return Err(HarnessError::InvalidNetwork(format!(
                "edge {parent} -> {child} would create a cycle"
            )));
        }
        self.edges.push((p, c));
        Ok(())
    }

    /// Remove `parent -> child`; returns whether the edge existed.
    pub fn remove_edge(&mut self, parent: &str, child: &str) -> bool {
        let (Some(p), Some(c)) = (self.node_index(parent), self.node_index(child)) else {
            return false;
        };
        let before = self.edges.len();
        self.edges.retain(|&e| e != (p, c));
        self.edges.len() != before
    }

    pub fn has_edge(&self, parent: &str, child: &str) -> bool {
        match (self.node_index(parent), self.node_index(child)) {
            (Some(p), Some(c)) => self.edges.contains(&(p, c)),
            _ => false,
        }
    }

    pub fn nodes(&self) -> &[String] {
        &self.nodes
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.node_index(name).is_some()
    }

    pub fn node_index(&self, name: &str) -> Option<usize> {
        self.nodes.iter().position(|n| n == name)
    }

    /// Edges as `(parent, child)` name pairs, in insertion order.
    pub fn edges(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
        self.edges
            .iter()
            .map(|&(p, c)| (self.nodes[p].as_str(), self.nodes[c].as_str()))
    }

    pub fn edge_indices(&self) -> &[(usize, usize)] {
        &self.edges
    }

    pub fn parents(&self, name: &str) -> Vec<&str> {
        self.node_index(name)
            .map(|idx| {
                self.parent_indices(idx)
                    .into_iter()
                    .map(|p| self.nodes[p].as_str())
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn children(&self, name: &str) -> Vec<&str> {
        self.node_index(name)
            .map(|idx| {
                self.child_indices(idx)
                    .into_iter()
                    .map(|c| self.nodes[c].as_str())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Parent indices of `idx`, in edge insertion order.
    pub fn parent_indices(&self, idx: usize) -> Vec<usize> {
        self.edges
            .iter()
            .filter(|&&(_, c)| c == idx)
            .map(|&(p, _)| p)
            .collect()
    }

    pub fn child_indices(&self, idx: usize) -> Vec<usize> {
        self.edges
            .iter()
            .filter(|&&(p, _)| p == idx)
            .map(|&(_, c)| c)
            .collect()
    }

    /// Whether a directed path leads from `from` to `to` (indices).
    pub fn has_path(&self, from: usize, to: usize) -> bool {
        let mut seen = vec![false; self.nodes.len()];
        let mut queue = VecDeque::from([from]);
        while let Some(node) = queue.pop_front() {
            if node == to {
                return true;
            }
            if std::mem::replace(&mut seen[node], true) {
                continue;
            }
            queue.extend(self.child_indices(node));
        }
        false
    }

    /// Kahn's algorithm; ties are broken by node insertion order.
    pub fn topological_order(&self) -> Vec<usize> {
        let n = self.nodes.len();
        let mut indegree = vec![0usize; n];
        for &(_, c) in &self.edges {
            indegree[c] += 1;
        }
        let mut ready: Vec<usize> = (0..n).filter(|&i| indegree[i] == 0).collect();
        let mut order = Vec::with_capacity(n);
        while !ready.is_empty() {
            let node = ready.remove(0);
            order.push(node);
            for child in self.child_indices(node) {
                indegree[child] -= 1;
                if indegree[child] == 0 {
                    let pos = ready.partition_point(|&r| r < child);
                    ready.insert(pos, child);
                }
            }
        }
        order
    }
}
