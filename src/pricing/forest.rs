//! Random forest regressor: bootstrap-sampled CART trees with a squared-error
//! criterion, every feature considered at each split.
//!
//! Trees are grown on scoped threads. Each tree's bootstrap sample is drawn
//! from its own generator seeded with `(seed, tree index)`, so the fitted
//! forest depends only on the data and the seed, never on thread count.

use std::thread;

use serde::{Deserialize, Serialize};

use crate::rng::SimpleRng;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForestParams {
    pub n_trees: usize,
    pub max_depth: usize,
    pub min_samples_split: usize,
    pub seed: u64,
}

impl Default for ForestParams {
    fn default() -> Self {
        Self {
            n_trees: 100,
            max_depth: 10,
            min_samples_split: 2,
            seed: 42,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum Node {
    Leaf {
        value: f64,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionTree {
    nodes: Vec<Node>,
}

impl RegressionTree {
    pub fn predict(&self, row: &[f64]) -> f64 {
        let mut idx = 0;
        loop {
            match &self.nodes[idx] {
                Node::Leaf { value } => return *value,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    let v = row.get(*feature).copied().unwrap_or(0.0);
                    idx = if v <= *threshold { *left } else { *right };
                }
            }
        }
    }

    /// Non-empty, every split names an existing feature, and children sit
    /// strictly after their parent so a walk from the root always ends.
    fn is_well_formed(&self, n_features: usize) -> bool {
        let len = self.nodes.len();
        len > 0
            && self.nodes.iter().enumerate().all(|(idx, node)| match node {
                Node::Leaf { value } => value.is_finite(),
                Node::Split {
                    feature,
                    left,
                    right,
                    ..
                } => *feature < n_features && (idx + 1..len).contains(left) && (idx + 1..len).contains(right),
            })
    }

    pub fn depth(&self) -> usize {
        fn walk(nodes: &[Node], idx: usize) -> usize {
            match &nodes[idx] {
                Node::Leaf { .. } => 0,
                Node::Split { left, right, .. } => 1 + walk(nodes, *left).max(walk(nodes, *right)),
            }
        }
        walk(&self.nodes, 0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForest {
    trees: Vec<RegressionTree>,
    n_features: usize,
}

/// Fitted forest plus normalised impurity-based importances.
#[derive(Debug, Clone)]
pub struct FitResult {
    pub forest: RandomForest,
    pub importances: Vec<f64>,
}

impl RandomForest {
    /// Fit on row-major features `x` and targets `y`. Both must be non-empty
    /// and the same length.
    pub fn fit(x: &[Vec<f64>], y: &[f64], params: &ForestParams) -> FitResult {
        assert_eq!(x.len(), y.len(), "feature rows and targets differ in length");
        assert!(!x.is_empty(), "cannot fit a forest on zero rows");
        let n_features = x[0].len();

        let workers = thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1)
            .clamp(1, params.n_trees.max(1));

        let mut grown: Vec<(usize, RegressionTree, Vec<f64>)> = thread::scope(|scope| {
            let handles: Vec<_> = (0..workers)
                .map(|w| {
                    scope.spawn(move || {
                        (w..params.n_trees)
                            .step_by(workers)
                            .map(|t| {
                                let (tree, imp) = grow_tree(x, y, n_features, params, t);
                                (t, tree, imp)
                            })
                            .collect::<Vec<_>>()
                    })
                })
                .collect();
            handles
                .into_iter()
                .flat_map(|h| h.join().unwrap_or_else(|e| std::panic::resume_unwind(e)))
                .collect()
        });
        grown.sort_by_key(|(t, _, _)| *t);

        let mut importances = vec![0.0; n_features];
        let mut trees = Vec::with_capacity(grown.len());
        for (_, tree, imp) in grown {
            let total: f64 = imp.iter().sum();
            if total > 0.0 {
                for (acc, v) in importances.iter_mut().zip(&imp) {
                    *acc += v / total;
                }
            }
            trees.push(tree);
        }
        let total: f64 = importances.iter().sum();
        if total > 0.0 {
            for v in &mut importances {
                *v /= total;
            }
        }

        FitResult {
            forest: RandomForest { trees, n_features },
            importances,
        }
    }

    /// Mean of the trees' predictions.
    pub fn predict(&self, row: &[f64]) -> f64 {
        if self.trees.is_empty() {
            return 0.0;
        }
        self.trees.iter().map(|t| t.predict(row)).sum::<f64>() / self.trees.len() as f64
    }

    /// Structural check for forests read back from disk.
    pub fn is_well_formed(&self) -> bool {
        !self.trees.is_empty() && self.trees.iter().all(|t| t.is_well_formed(self.n_features))
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    pub fn trees(&self) -> &[RegressionTree] {
        &self.trees
    }
}

fn tree_seed(seed: u64, tree: usize) -> u64 {
    seed ^ (tree as u64 + 1).wrapping_mul(0x9E37_79B9_7F4A_7C15)
}

fn grow_tree(
    x: &[Vec<f64>],
    y: &[f64],
    n_features: usize,
    params: &ForestParams,
    tree: usize,
) -> (RegressionTree, Vec<f64>) {
    let mut rng = SimpleRng::new(tree_seed(params.seed, tree));
    let n = y.len();
    let sample: Vec<usize> = (0..n).map(|_| rng.index(n)).collect();

    let mut builder = TreeBuilder {
        x,
        y,
        params,
        nodes: Vec::new(),
        importances: vec![0.0; n_features],
    };
    builder.build(sample, 0);
    (
        RegressionTree {
            nodes: builder.nodes,
        },
        builder.importances,
    )
}

struct TreeBuilder<'a> {
    x: &'a [Vec<f64>],
    y: &'a [f64],
    params: &'a ForestParams,
    nodes: Vec<Node>,
    importances: Vec<f64>,
}

struct BestSplit {
    feature: usize,
    threshold: f64,
    children_sse: f64,
}

impl TreeBuilder<'_> {
    /// Grow the subtree for `sample` and return its node index.
    fn build(&mut self, sample: Vec<usize>, depth: usize) -> usize {
        let n = sample.len() as f64;
        let sum: f64 = sample.iter().map(|&i| self.y[i]).sum();
        let sum_sq: f64 = sample.iter().map(|&i| self.y[i] * self.y[i]).sum();
        let mean = sum / n;
        let sse = (sum_sq - sum * sum / n).max(0.0);

        let idx = self.nodes.len();
        self.nodes.push(Node::Leaf { value: mean });

        // Pure enough to stop, relative to the target scale.
        let pure = sse <= 1e-12 * (1.0 + sum_sq);
        if depth >= self.params.max_depth || sample.len() < self.params.min_samples_split || pure {
            return idx;
        }
        let Some(best) = self.best_split(&sample) else {
            return idx;
        };

        self.importances[best.feature] += (sse - best.children_sse).max(0.0);

        let (left_sample, right_sample): (Vec<usize>, Vec<usize>) = sample
            .into_iter()
            .partition(|&i| self.x[i][best.feature] <= best.threshold);
        let left = self.build(left_sample, depth + 1);
        let right = self.build(right_sample, depth + 1);
        self.nodes[idx] = Node::Split {
            feature: best.feature,
            threshold: best.threshold,
            left,
            right,
        };
        idx
    }

    fn best_split(&self, sample: &[usize]) -> Option<BestSplit> {
        let n = sample.len();
        let total: f64 = sample.iter().map(|&i| self.y[i]).sum();
        let total_sq: f64 = sample.iter().map(|&i| self.y[i] * self.y[i]).sum();
        let mut best: Option<BestSplit> = None;
        let mut order = sample.to_vec();

        for feature in 0..self.x[sample[0]].len() {
            order.sort_by(|&a, &b| self.x[a][feature].total_cmp(&self.x[b][feature]));

            let mut left_sum = 0.0;
            let mut left_sq = 0.0;
            for k in 1..n {
                let prev = order[k - 1];
                let yv = self.y[prev];
                left_sum += yv;
                left_sq += yv * yv;

                let lo = self.x[prev][feature];
                let hi = self.x[order[k]][feature];
                if lo >= hi {
                    continue;
                }
                let nl = k as f64;
                let nr = (n - k) as f64;
                let right_sum = total - left_sum;
                let right_sq = total_sq - left_sq;
                let children_sse = (left_sq - left_sum * left_sum / nl).max(0.0)
                    + (right_sq - right_sum * right_sum / nr).max(0.0);

                let better = match &best {
                    None => true,
                    Some(b) => children_sse < b.children_sse,
                };
                if better {
                    let mid = lo + (hi - lo) / 2.0;
                    let threshold = if mid < hi { mid } else { lo };
                    best = Some(BestSplit {
                        feature,
                        threshold,
                        children_sse,
                    });
                }
            }
        }
        best
    }
}
