use crate::network::Network;

/// Barycenter sweeps (down + up) used to reduce edge crossings.
const ORDERING_PASSES: usize = 4;

/// Node coordinates of a layered (top-down) drawing.
#[derive(Debug, Clone, PartialEq)]
pub struct Layout {
    /// `[x, y]` per node, indexed like `Network::nodes`. Layer `k` sits at
    /// `y = -k`; nodes inside a layer are one unit apart, centred on `x = 0`.
    pub positions: Vec<[f64; 2]>,
    /// Layer per node; roots are layer 0.
    pub layers: Vec<usize>,
}

impl Layout {
    pub fn n_layers(&self) -> usize {
        self.layers.iter().max().map_or(0, |&l| l + 1)
    }

    /// Node closest to `point` within `radius`.
    pub fn node_at(&self, point: [f64; 2], radius: f64) -> Option<usize> {
        self.positions
            .iter()
            .enumerate()
            .map(|(i, p)| (i, (p[0] - point[0]).hypot(p[1] - point[1])))
            .filter(|&(_, d)| d <= radius)
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(i, _)| i)
    }
}

/// Hierarchical layout: longest-path layering from the roots, then
/// barycenter ordering inside each layer.
pub fn layered_layout(network: &Network) -> Layout {
    let n = network.node_count();
    let mut layers = vec![0usize; n];
    for node in network.topological_order() {
        layers[node] = network
            .parent_indices(node)
            .iter()
            .map(|&p| layers[p] + 1)
            .max()
            .unwrap_or(0);
    }

    let n_layers = layers.iter().max().map_or(0, |&l| l + 1);
    let mut rows: Vec<Vec<usize>> = vec![Vec::new(); n_layers];
    for (node, &layer) in layers.iter().enumerate() {
        rows[layer].push(node);
    }

    let mut slot = vec![0.0f64; n];
    reindex(&rows, &mut slot);

    for pass in 0..ORDERING_PASSES {
        let downward = pass % 2 == 0;
        let order: Vec<usize> = if downward {
            (1..n_layers).collect()
        } else {
            (0..n_layers.saturating_sub(1)).rev().collect()
        };
        for layer in order {
            let centre: Vec<(usize, f64)> = rows[layer]
                .iter()
                .map(|&node| {
                    let neighbours = if downward {
                        network.parent_indices(node)
                    } else {
                        network.child_indices(node)
                    };
                    (node, barycenter(&neighbours, &slot).unwrap_or(slot[node]))
                })
                .collect();
            let mut sorted = centre;
            sorted.sort_by(|a, b| a.1.total_cmp(&b.1));
            rows[layer] = sorted.into_iter().map(|(node, _)| node).collect();
            reindex(&rows[layer..=layer], &mut slot);
        }
    }

    let mut positions = vec![[0.0, 0.0]; n];
    for (layer, row) in rows.iter().enumerate() {
        let offset = (row.len() as f64 - 1.0) / 2.0;
        for (i, &node) in row.iter().enumerate() {
            positions[node] = [i as f64 - offset, -(layer as f64)];
        }
    }

    log::debug!("Laid out {n} nodes in {n_layers} layers");
    Layout { positions, layers }
}

/// Record each node's position inside its row.
fn reindex(rows: &[Vec<usize>], slot: &mut [f64]) {
    for row in rows {
        for (i, &node) in row.iter().enumerate() {
            slot[node] = i as f64;
        }
    }
}

fn barycenter(nodes: &[usize], slot: &[f64]) -> Option<f64> {
    if nodes.is_empty() {
        None
    } else {
        Some(nodes.iter().map(|&n| slot[n]).sum::<f64>() / nodes.len() as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn longest_path_layering() {
        let net = Network::from_edges(&[("a", "b"), ("b", "c"), ("a", "c")]).unwrap();
        let layout = layered_layout(&net);
        assert_eq!(layout.layers, vec![0, 1, 2]);
        assert_eq!(layout.n_layers(), 3);
        for (node, pos) in layout.positions.iter().enumerate() {
            assert_eq!(pos[1], -(layout.layers[node] as f64));
        }
    }

    #[test]
    fn naive_bayes_star_has_two_layers() {
        let features = ["wife_age", "wife_edu", "media_exposure"];
        let net = Network::naive_bayes("class", &features).unwrap();
        let layout = layered_layout(&net);
        let target = net.node_index("class").unwrap();
        assert_eq!(layout.layers[target], 0);
        assert_eq!(layout.positions[target], [0.0, 0.0]);
        assert_eq!(layout.n_layers(), 2);

        // the feature layer is centred on the target
        let xs: f64 = features
            .iter()
            .map(|f| layout.positions[net.node_index(f).unwrap()][0])
            .sum();
        assert_eq!(xs, 0.0);
    }

    #[test]
    fn barycenter_ordering_removes_crossing() {
        let mut net = Network::new();
        for name in ["a", "b", "d", "c"] {
            net.add_node(name);
        }
        net.add_edge("a", "c").unwrap();
        net.add_edge("b", "d").unwrap();

        let layout = layered_layout(&net);
        let x = |name: &str| layout.positions[net.node_index(name).unwrap()][0];
        assert!(x("a") < x("b"));
        assert!(x("c") < x("d"));
    }

    #[test]
    fn isolated_nodes_sit_on_the_top_layer() {
        let mut net = Network::from_edges(&[("x", "y")]).unwrap();
        net.add_node("lonely");
        let layout = layered_layout(&net);
        assert_eq!(layout.layers[net.node_index("lonely").unwrap()], 0);
    }

    #[test]
    fn node_at_picks_nearest_within_radius() {
        let net = Network::from_edges(&[("a", "b")]).unwrap();
        let layout = layered_layout(&net);
        assert_eq!(layout.node_at([0.05, -0.95], 0.2), net.node_index("b"));
        assert_eq!(layout.node_at([3.0, 3.0], 0.2), None);
    }
}
