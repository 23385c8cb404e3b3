use ndarray::{Array2, ArrayView1};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use super::{check_fit_input, check_width, class_labels, Classifier};
use crate::data::model::{Column, Table};
use crate::error::{HarnessError, Result};
use crate::network::cpd::argmax;

/// Minimum gap between consecutive sorted values for a threshold to sit
/// between them.
const FEATURE_THRESHOLD: f64 = 1e-7;

// ---------------------------------------------------------------------------
// TreeNode
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
enum TreeNode {
    Leaf {
        /// Training rows per class that reached this leaf.
        counts: Vec<usize>,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: Box<TreeNode>,
        right: Box<TreeNode>,
    },
}

impl TreeNode {
    fn predict(&self, x: ArrayView1<'_, f64>) -> usize {
        match self {
            TreeNode::Leaf { counts } => argmax(counts.iter().map(|&c| c as f64)),
            TreeNode::Split {
                feature,
                threshold,
                left,
                right,
            } => {
                if x[*feature] <= *threshold {
                    left.predict(x)
                } else {
                    right.predict(x)
                }
            }
        }
    }

    fn depth(&self) -> usize {
        match self {
            TreeNode::Leaf { .. } => 0,
            TreeNode::Split { left, right, .. } => 1 + left.depth().max(right.depth()),
        }
    }

    fn n_leaves(&self) -> usize {
        match self {
            TreeNode::Leaf { .. } => 1,
            TreeNode::Split { left, right, .. } => left.n_leaves() + right.n_leaves(),
        }
    }
}

fn gini(counts: &[usize], total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let n = total as f64;
    1.0 - counts
        .iter()
        .map(|&c| {
            let p = c as f64 / n;
            p * p
        })
        .sum::<f64>()
}

struct BestSplit {
    feature: usize,
    threshold: f64,
    impurity: f64,
}

// ---------------------------------------------------------------------------
// DecisionTree
// ---------------------------------------------------------------------------

/// CART classification tree with Gini impurity.
///
/// Features are visited in a seeded random order at every node; among splits
/// of equal quality the first one visited wins, so the seed fixes the tree.
#[derive(Debug, Clone)]
pub struct DecisionTree {
    max_depth: Option<usize>,
    min_samples_split: usize,
    min_samples_leaf: usize,
    seed: u64,
    classes: Vec<f64>,
    n_features: usize,
    root: Option<TreeNode>,
}

impl DecisionTree {
    pub fn new(seed: u64) -> Self {
        Self {
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            seed,
            classes: Vec::new(),
            n_features: 0,
            root: None,
        }
    }

    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    pub fn with_min_samples_split(mut self, n: usize) -> Self {
        self.min_samples_split = n.max(2);
        self
    }

    pub fn with_min_samples_leaf(mut self, n: usize) -> Self {
        self.min_samples_leaf = n.max(1);
        self
    }

    pub fn classes(&self) -> &[f64] {
        &self.classes
    }

    /// Depth of the fitted tree (a single leaf has depth 0).
    pub fn depth(&self) -> Option<usize> {
        self.root.as_ref().map(TreeNode::depth)
    }

    pub fn n_leaves(&self) -> Option<usize> {
        self.root.as_ref().map(TreeNode::n_leaves)
    }

    fn build(
        &self,
        x: &Array2<f64>,
        y: &[usize],
        rows: Vec<usize>,
        depth: usize,
        rng: &mut StdRng,
    ) -> TreeNode {
        let mut counts = vec![0usize; self.classes.len()];
        for &r in &rows {
            counts[y[r]] += 1;
        }
        let impurity = gini(&counts, rows.len());

        let stop = rows.len() < self.min_samples_split
            || rows.len() < 2 * self.min_samples_leaf
            || impurity <= 0.0
            || self.max_depth.is_some_and(|max| depth >= max);
        if stop {
            return TreeNode::Leaf { counts };
        }

        let Some(best) = self.best_split(x, y, &rows, rng) else {
            return TreeNode::Leaf { counts };
        };

        let (left_rows, right_rows): (Vec<usize>, Vec<usize>) = rows
            .into_iter()
            .partition(|&r| x[[r, best.feature]] <= best.threshold);

        log::trace!(
            "depth {depth}: feature {} <= {:.4} (gini {:.4} -> {:.4})",
            best.feature,
            best.threshold,
            impurity,
            best.impurity
        );

        let left = self.build(x, y, left_rows, depth + 1, rng);
        let right = self.build(x, y, right_rows, depth + 1, rng);
        TreeNode::Split {
            feature: best.feature,
            threshold: best.threshold,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    /// Lowest weighted child impurity over all features and thresholds.
    fn best_split(
        &self,
        x: &Array2<f64>,
        y: &[usize],
        rows: &[usize],
        rng: &mut StdRng,
    ) -> Option<BestSplit> {
        let n = rows.len();
        let n_classes = self.classes.len();
        let mut features: Vec<usize> = (0..self.n_features).collect();
        features.shuffle(rng);

        let mut total = vec![0usize; n_classes];
        for &r in rows {
            total[y[r]] += 1;
        }

        let mut best: Option<BestSplit> = None;
        let mut sorted = rows.to_vec();
        for feature in features {
            sorted.sort_by(|&a, &b| x[[a, feature]].total_cmp(&x[[b, feature]]));

            let mut left = vec![0usize; n_classes];
            for i in 0..n - 1 {
                left[y[sorted[i]]] += 1;
                let here = x[[sorted[i], feature]];
                let next = x[[sorted[i + 1], feature]];
                if next <= here + FEATURE_THRESHOLD {
                    continue;
                }
                let n_left = i + 1;
                let n_right = n - n_left;
                if n_left < self.min_samples_leaf || n_right < self.min_samples_leaf {
                    continue;
                }

                let right: Vec<usize> = total.iter().zip(&left).map(|(t, l)| t - l).collect();
                let weighted = (n_left as f64 * gini(&left, n_left)
                    + n_right as f64 * gini(&right, n_right))
                    / n as f64;

                if best.as_ref().map_or(true, |b| weighted < b.impurity) {
                    let mut threshold = here / 2.0 + next / 2.0;
                    if threshold == next || !threshold.is_finite() {
                        threshold = here;
                    }
                    best = Some(BestSplit {
                        feature,
                        threshold,
                        impurity: weighted,
                    });
                }
            }
        }
        best
    }
}

impl Classifier for DecisionTree {
    fn fit(&mut self, features: &Table, target: &Column) -> Result<()> {
        check_fit_input(features, target)?;
        self.classes = class_labels(target);
        self.n_features = features.n_cols();

        let y: Vec<usize> = target
            .values
            .iter()
            .map(|v| {
                self.classes
                    .binary_search_by(|c| c.total_cmp(v))
                    .map_err(|_| HarnessError::InvalidParameter(format!("unindexed label {v}")))
            })
            .collect::<Result<_>>()?;

        let mut rng = StdRng::seed_from_u64(self.seed);
        let rows: Vec<usize> = (0..features.n_rows()).collect();
        let root = self.build(features.values(), &y, rows, 0, &mut rng);

        log::debug!(
            "DecisionTree fitted: depth {}, {} leaves",
            root.depth(),
            root.n_leaves()
        );
        self.root = Some(root);
        Ok(())
    }

    fn predict(&self, features: &Table) -> Result<Vec<f64>> {
        let root = self.root.as_ref().ok_or(HarnessError::NotFitted)?;
        check_width(features, self.n_features)?;
        Ok(features
            .values()
            .rows()
            .into_iter()
            .map(|row| self.classes[root.predict(row)])
            .collect())
    }

    fn name(&self) -> &'static str {
        "DecisionTree"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array1;

    fn xor() -> (Table, Column) {
        let mut rows = Vec::new();
        let mut labels = Vec::new();
        for i in 0..40 {
            let a = (i % 2) as f64;
            let b = ((i / 2) % 2) as f64;
            rows.push(vec![a, b, 0.0]);
            labels.push(if a != b { 1.0 } else { 2.0 });
        }
        (
            Table::from_rows(&["a", "b", "const"], &rows).unwrap(),
            Column::new("class", Array1::from(labels)),
        )
    }

    #[test]
    fn fits_xor_exactly() {
        let (x, y) = xor();
        let mut tree = DecisionTree::new(42);
        tree.fit(&x, &y).unwrap();
        assert_eq!(tree.predict(&x).unwrap(), y.to_vec());
        assert_eq!(tree.depth(), Some(2));
        assert_eq!(tree.n_leaves(), Some(4));
    }

    #[test]
    fn same_seed_same_tree() {
        let (x, y) = xor();
        let mut a = DecisionTree::new(7);
        let mut b = DecisionTree::new(7);
        a.fit(&x, &y).unwrap();
        b.fit(&x, &y).unwrap();
        assert_eq!(format!("{:?}", a.root), format!("{:?}", b.root));
    }

    #[test]
    fn max_depth_limits_growth() {
        let (x, y) = xor();
        let mut stump = DecisionTree::new(42).with_max_depth(0);
        stump.fit(&x, &y).unwrap();
        assert_eq!(stump.depth(), Some(0));
        // a single leaf votes for the first of two equally common classes
        assert!(stump.predict(&x).unwrap().iter().all(|&p| p == 1.0));
    }

    #[test]
    fn threshold_is_the_midpoint() {
        let x = Table::from_rows(&["v"], &[vec![1.0], vec![2.0], vec![4.0], vec![5.0]]).unwrap();
        let y = Column::new("class", Array1::from(vec![0.0, 0.0, 1.0, 1.0]));
        let mut tree = DecisionTree::new(0);
        tree.fit(&x, &y).unwrap();
        match tree.root.as_ref().unwrap() {
            TreeNode::Split { threshold, .. } => assert_eq!(*threshold, 3.0),
            other => panic!("expected a split, got {other:?}"),
        }
        let query = Table::from_rows(&["v"], &[vec![2.9], vec![3.1]]).unwrap();
        assert_eq!(tree.predict(&query).unwrap(), vec![0.0, 1.0]);
    }

    fn leaf_sizes(node: &TreeNode) -> Vec<usize> {
        match node {
            TreeNode::Leaf { counts } => vec![counts.iter().sum()],
            TreeNode::Split { left, right, .. } => {
                let mut sizes = leaf_sizes(left);
                sizes.extend(leaf_sizes(right));
                sizes
            }
        }
    }

    /// Alternating labels along one feature: only singleton leaves are pure.
    fn alternating() -> (Table, Column) {
        let rows: Vec<Vec<f64>> = (1..=6).map(|v| vec![v as f64]).collect();
        let labels: Vec<f64> = (0..6).map(|i| (i % 2) as f64).collect();
        (
            Table::from_rows(&["v"], &rows).unwrap(),
            Column::new("class", Array1::from(labels)),
        )
    }

    #[test]
    fn min_samples_leaf_rejects_small_children() {
        let (x, y) = alternating();

        let mut full = DecisionTree::new(0);
        full.fit(&x, &y).unwrap();
        assert_eq!(full.n_leaves(), Some(6));

        let mut tree = DecisionTree::new(0).with_min_samples_leaf(3);
        tree.fit(&x, &y).unwrap();
        assert_eq!(tree.n_leaves(), Some(2));
        assert_eq!(leaf_sizes(tree.root.as_ref().unwrap()), vec![3, 3]);
        match tree.root.as_ref().unwrap() {
            TreeNode::Split { threshold, .. } => assert_eq!(*threshold, 3.5),
            other => panic!("expected a split, got {other:?}"),
        }
    }

    #[test]
    fn min_samples_split_stops_small_nodes() {
        let (x, y) = xor();

        let mut leaf = DecisionTree::new(42).with_min_samples_split(100);
        leaf.fit(&x, &y).unwrap();
        assert_eq!(leaf.n_leaves(), Some(1));

        // 40 rows split once into 20 + 20, which are too small to split again.
        let mut one_level = DecisionTree::new(42).with_min_samples_split(25);
        one_level.fit(&x, &y).unwrap();
        assert_eq!(one_level.depth(), Some(1));
        assert_eq!(leaf_sizes(one_level.root.as_ref().unwrap()), vec![20, 20]);
    }

    #[test]
    fn predict_checks_width_and_fit() {
        let (x, y) = xor();
        let tree = DecisionTree::new(42);
        assert!(matches!(tree.predict(&x), Err(HarnessError::NotFitted)));

        let mut tree = DecisionTree::new(42);
        tree.fit(&x, &y).unwrap();
        let narrow = Table::from_rows(&["a"], &[vec![0.0]]).unwrap();
        assert!(matches!(
            tree.predict(&narrow),
            Err(HarnessError::LengthMismatch { .. })
        ));
    }
}
