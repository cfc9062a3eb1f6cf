//! Isolation forest over row samples of one or more features.
//!
//! Trees are stored as arenas (a flat `Vec` of nodes with child indices) and
//! built with an explicit work stack, so depth never turns into recursion.
//! Each tree gets its own `StdRng` seeded from the caller's generator, which
//! makes parallel and sequential builds produce identical forests.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;

use vitalstat_core::constants::{EULER_GAMMA, MAX_ISOLATION_SAMPLES};
use vitalstat_core::errors::DetectionError;

/// Index of a node inside its tree's arena.
pub type NodeId = usize;

#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    /// Terminal partition holding `size` subsample rows.
    Leaf { size: usize },
    /// Rows with `row[feature] <= value` go left, the rest go right.
    Split {
        feature: usize,
        value: f64,
        left: NodeId,
        right: NodeId,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct IsolationNode {
    pub depth: usize,
    pub kind: NodeKind,
}

/// One randomized partition tree. Node 0 is the root.
#[derive(Debug, Clone)]
pub struct IsolationTree {
    nodes: Vec<IsolationNode>,
    max_depth: usize,
    sample_size: usize,
}

impl IsolationTree {
    /// Grow a tree over `rows[i]` for every `i` in `sample`.
    pub fn build<R: Rng>(
        rows: &[Vec<f64>],
        sample: Vec<usize>,
        max_depth: usize,
        rng: &mut R,
    ) -> Self {
        let sample_size = sample.len();
        let mut nodes = vec![IsolationNode {
            depth: 0,
            kind: NodeKind::Leaf { size: sample_size },
        }];
        let mut stack: Vec<(NodeId, Vec<usize>)> = vec![(0, sample)];

        while let Some((id, members)) = stack.pop() {
            let depth = nodes[id].depth;
            if depth >= max_depth || members.len() <= 1 {
                continue;
            }
            let Some((feature, value)) = choose_split(rows, &members, rng) else {
                continue;
            };

            let (left_rows, right_rows): (Vec<usize>, Vec<usize>) =
                members.into_iter().partition(|&i| rows[i][feature] <= value);

            let left = nodes.len();
            nodes.push(IsolationNode {
                depth: depth + 1,
                kind: NodeKind::Leaf { size: left_rows.len() },
            });
            let right = nodes.len();
            nodes.push(IsolationNode {
                depth: depth + 1,
                kind: NodeKind::Leaf { size: right_rows.len() },
            });
            nodes[id].kind = NodeKind::Split {
                feature,
                value,
                left,
                right,
            };
            stack.push((right, right_rows));
            stack.push((left, left_rows));
        }

        Self {
            nodes,
            max_depth,
            sample_size,
        }
    }

    /// Depth of the leaf `point` lands in plus the small-leaf correction.
    ///
    /// A point missing the split feature (or holding a non-finite value
    /// there) stops the walk and reports the tree's `max_depth`.
    pub fn path_length(&self, point: &[f64]) -> f64 {
        let mut id = 0;
        loop {
            let node = &self.nodes[id];
            match node.kind {
                NodeKind::Leaf { size } => return node.depth as f64 + leaf_adjustment(size),
                NodeKind::Split {
                    feature,
                    value,
                    left,
                    right,
                } => match point.get(feature) {
                    Some(x) if x.is_finite() => id = if *x <= value { left } else { right },
                    _ => return self.max_depth as f64,
                },
            }
        }
    }

    pub fn root(&self) -> &IsolationNode {
        &self.nodes[0]
    }

    pub fn nodes(&self) -> &[IsolationNode] {
        &self.nodes
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    pub fn sample_size(&self) -> usize {
        self.sample_size
    }
}

/// Uniform random feature among those with spread, then a uniform value in `[min, max)`.
/// Both sides of the resulting split are non-empty.
///
/// The value is interpolated rather than drawn from `min..max` so a span wider
/// than `f64::MAX` cannot overflow.
fn choose_split<R: Rng>(rows: &[Vec<f64>], members: &[usize], rng: &mut R) -> Option<(usize, f64)> {
    let num_features = rows[members[0]].len();
    let candidates: Vec<(usize, f64, f64)> = (0..num_features)
        .filter_map(|f| {
            let init = (f64::INFINITY, f64::NEG_INFINITY);
            let (min, max) = members.iter().fold(init, |(lo, hi), &i| {
                let v = rows[i][f];
                (lo.min(v), hi.max(v))
            });
            (max > min).then_some((f, min, max))
        })
        .collect();
    if candidates.is_empty() {
        return None;
    }
    let (feature, min, max) = candidates[rng.gen_range(0..candidates.len())];
    let t: f64 = rng.gen();
    let value = min * (1.0 - t) + max * t;
    let value = if value >= min && value < max { value } else { min };
    Some((feature, value))
}

/// Leaf-size correction added to the leaf depth: c(1)=0, c(2)=1, else ⌈log2(size)⌉.
fn leaf_adjustment(size: usize) -> f64 {
    match size {
        0 | 1 => 0.0,
        2 => 1.0,
        n => (n as f64).log2().ceil(),
    }
}

/// Expected path length of an unsuccessful BST search over `n` items.
///
/// c(n) = 2·(ln(n−1) + γ) − 2(n−1)/n for n > 2, c(2) = 1, c(≤1) = 0.
pub fn expected_path_length(n: usize) -> f64 {
    match n {
        0 | 1 => 0.0,
        2 => 1.0,
        _ => {
            let n = n as f64;
            2.0 * ((n - 1.0).ln() + EULER_GAMMA) - 2.0 * (n - 1.0) / n
        }
    }
}

/// Forest construction parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForestParams {
    pub num_trees: usize,
    /// Upper bound on the per-tree subsample size.
    pub max_samples: usize,
    /// Build trees on the rayon pool.
    pub parallel: bool,
}

impl Default for ForestParams {
    fn default() -> Self {
        Self {
            num_trees: 100,
            max_samples: MAX_ISOLATION_SAMPLES,
            parallel: true,
        }
    }
}

/// A trained ensemble of isolation trees.
#[derive(Debug, Clone)]
pub struct IsolationForest {
    trees: Vec<IsolationTree>,
    sample_size: usize,
    num_features: usize,
}

impl IsolationForest {
    /// Fit a forest to `rows` (one `Vec` per sample, all the same width).
    pub fn fit<R: Rng>(
        rows: &[Vec<f64>],
        params: &ForestParams,
        rng: &mut R,
    ) -> Result<Self, DetectionError> {
        let n = rows.len();
        if n == 0 {
            return Err(DetectionError::InvalidInput(
                "isolation forest needs at least one sample".to_string(),
            ));
        }
        if params.num_trees == 0 {
            return Err(DetectionError::InvalidInput(
                "isolation forest needs at least one tree".to_string(),
            ));
        }
        let num_features = rows[0].len();
        if num_features == 0 || rows.iter().any(|r| r.len() != num_features) {
            return Err(DetectionError::InvalidInput(
                "every sample must have the same non-zero number of features".to_string(),
            ));
        }

        let sample_size = params.max_samples.max(1).min(n);
        let max_depth = (sample_size as f64).log2().ceil() as usize;
        let seeds: Vec<u64> = (0..params.num_trees).map(|_| rng.gen()).collect();

        let grow = |seed: u64| {
            let mut tree_rng = StdRng::seed_from_u64(seed);
            let sample = rand::seq::index::sample(&mut tree_rng, n, sample_size).into_vec();
            IsolationTree::build(rows, sample, max_depth, &mut tree_rng)
        };
        let trees: Vec<IsolationTree> = if params.parallel {
            seeds.into_par_iter().map(grow).collect()
        } else {
            seeds.into_iter().map(grow).collect()
        };

        tracing::debug!(
            trees = trees.len(),
            sample_size,
            max_depth,
            num_features,
            "isolation forest built"
        );

        Ok(Self {
            trees,
            sample_size,
            num_features,
        })
    }

    /// Mean path length of `point` across all trees.
    pub fn average_path_length(&self, point: &[f64]) -> f64 {
        self.trees.iter().map(|t| t.path_length(point)).sum::<f64>() / self.trees.len() as f64
    }

    /// `2^(−path/c(s))` for a single path length.
    fn normalize(&self, path_length: f64) -> f64 {
        let c = expected_path_length(self.sample_size);
        if c <= 0.0 {
            return 0.5;
        }
        2f64.powf(-path_length / c)
    }

    /// Anomaly score in [0, 1]; values near 1 are easy to isolate.
    pub fn score_point(&self, point: &[f64]) -> f64 {
        self.normalize(self.average_path_length(point))
    }

    pub fn score_rows(&self, rows: &[Vec<f64>]) -> Vec<f64> {
        rows.iter().map(|r| self.score_point(r)).collect()
    }

    /// Per-tree normalized scores for `point`, in tree order.
    pub fn tree_scores<'a>(&'a self, point: &'a [f64]) -> impl Iterator<Item = f64> + 'a {
        self.trees.iter().map(move |t| self.normalize(t.path_length(point)))
    }

    pub fn trees(&self) -> &[IsolationTree] {
        &self.trees
    }

    pub fn sample_size(&self) -> usize {
        self.sample_size
    }

    pub fn num_features(&self) -> usize {
        self.num_features
    }
}

/// Lift a univariate series into single-feature rows.
pub fn rows_from_series(values: &[f64]) -> Vec<Vec<f64>> {
    values.iter().map(|&v| vec![v]).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cluster_with_outlier() -> Vec<f64> {
        let mut values: Vec<f64> = (0..50).map(|i| 10.0 + (i % 7) as f64 * 0.1).collect();
        values.push(500.0);
        values
    }

    #[test]
    fn test_expected_path_length_values() {
        assert_eq!(expected_path_length(0), 0.0);
        assert_eq!(expected_path_length(1), 0.0);
        assert_eq!(expected_path_length(2), 1.0);
        let c256 = expected_path_length(256);
        assert!((c256 - 10.2448).abs() < 1e-3, "c(256) = {}", c256);
    }

    #[test]
    fn test_leaf_adjustment() {
        assert_eq!(leaf_adjustment(1), 0.0);
        assert_eq!(leaf_adjustment(2), 1.0);
        assert_eq!(leaf_adjustment(3), 2.0);
        assert_eq!(leaf_adjustment(8), 3.0);
    }

    #[test]
    fn test_tree_respects_max_depth_and_arena_links() {
        let rows = rows_from_series(&cluster_with_outlier());
        let mut rng = StdRng::seed_from_u64(7);
        let tree = IsolationTree::build(&rows, (0..rows.len()).collect(), 6, &mut rng);
        assert!(tree.nodes().iter().all(|n| n.depth <= tree.max_depth()));
        for node in tree.nodes() {
            if let NodeKind::Split { left, right, .. } = node.kind {
                assert_eq!(tree.nodes()[left].depth, node.depth + 1);
                assert_eq!(tree.nodes()[right].depth, node.depth + 1);
            }
        }
        assert_eq!(tree.root().depth, 0);
    }

    #[test]
    fn test_constant_data_makes_single_leaf() {
        let rows = rows_from_series(&[3.0; 16]);
        let mut rng = StdRng::seed_from_u64(1);
        let tree = IsolationTree::build(&rows, (0..16).collect(), 4, &mut rng);
        assert_eq!(tree.nodes().len(), 1);
        assert_eq!(tree.root().kind, NodeKind::Leaf { size: 16 });
        assert_eq!(tree.path_length(&[3.0]), 4.0);
    }

    #[test]
    fn test_missing_feature_falls_back_to_max_depth() {
        let rows: Vec<Vec<f64>> = (0..8).map(|i| vec![i as f64, (i * 2) as f64]).collect();
        let mut rng = StdRng::seed_from_u64(3);
        let tree = IsolationTree::build(&rows, (0..8).collect(), 3, &mut rng);
        assert_eq!(tree.path_length(&[]), 3.0);
    }

    #[test]
    fn test_scores_bounded_and_outlier_ranks_high() {
        let values = cluster_with_outlier();
        let rows = rows_from_series(&values);
        let mut rng = StdRng::seed_from_u64(42);
        let forest = IsolationForest::fit(&rows, &ForestParams::default(), &mut rng).unwrap();
        let scores = forest.score_rows(&rows);
        assert!(scores.iter().all(|s| (0.0..=1.0).contains(s)));
        let median = crate::stats::median(&scores[..50]);
        assert!(scores[50] > median, "outlier {} vs median {}", scores[50], median);
    }

    #[test]
    fn test_parallel_and_sequential_builds_match() {
        let rows = rows_from_series(&cluster_with_outlier());
        let params = ForestParams {
            num_trees: 20,
            ..Default::default()
        };
        let parallel = IsolationForest::fit(&rows, &params, &mut StdRng::seed_from_u64(9)).unwrap();
        let sequential = IsolationForest::fit(
            &rows,
            &ForestParams {
                parallel: false,
                ..params
            },
            &mut StdRng::seed_from_u64(9),
        )
        .unwrap();
        assert_eq!(parallel.score_rows(&rows), sequential.score_rows(&rows));
    }

    #[test]
    fn test_single_sample_scores_neutral() {
        let rows = rows_from_series(&[1.0]);
        let mut rng = StdRng::seed_from_u64(0);
        let forest = IsolationForest::fit(&rows, &ForestParams::default(), &mut rng).unwrap();
        assert_eq!(forest.score_point(&[1.0]), 0.5);
    }

    #[test]
    fn test_span_beyond_f64_max_splits_without_overflow() {
        let values = [-1.0e308, 0.0, 1.0, 2.0, 1.0e308];
        let rows = rows_from_series(&values);
        let mut rng = StdRng::seed_from_u64(1);
        let forest = IsolationForest::fit(&rows, &ForestParams::default(), &mut rng).unwrap();
        let scores = forest.score_rows(&rows);
        assert_eq!(scores.len(), values.len());
        assert!(scores.iter().all(|s| (0.0..=1.0).contains(s)));
        for tree in forest.trees() {
            for node in tree.nodes() {
                if let NodeKind::Split { value, .. } = node.kind {
                    assert!(value.is_finite());
                }
            }
        }
    }

    #[test]
    fn test_rejects_ragged_rows() {
        let rows = vec![vec![1.0, 2.0], vec![3.0]];
        let mut rng = StdRng::seed_from_u64(0);
        let err = IsolationForest::fit(&rows, &ForestParams::default(), &mut rng);
        assert!(matches!(err, Err(DetectionError::InvalidInput(_))));
    }
}
