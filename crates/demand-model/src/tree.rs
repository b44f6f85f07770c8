//! CART Regression Tree

use crate::dataset::Dataset;
use crate::{ModelError, Regressor};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Tree growth limits
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TreeParams {
    /// Maximum depth; unlimited when `None`
    pub max_depth: Option<usize>,
    /// Minimum rows needed to split a node
    pub min_samples_split: usize,
    /// Minimum rows in each child
    pub min_samples_leaf: usize,
    /// Features sampled per split; all when `None`
    pub max_features: Option<usize>,
}

impl Default for TreeParams {
    fn default() -> Self {
        Self {
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: None,
        }
    }
}

/// Tree node; children are indices into the node table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Node {
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

/// Regression tree with squared-error splits
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTree {
    nodes: Vec<Node>,
    /// Squared-error reduction credited to each feature
    importances: Vec<f64>,
}

struct SplitCandidate {
    feature: usize,
    threshold: f64,
    score: f64,
    gain: f64,
}

/// Borrowed training inputs shared by recursive calls
struct Grower<'a, R> {
    features: &'a [Vec<f64>],
    targets: &'a [f64],
    params: &'a TreeParams,
    rng: &'a mut R,
    nodes: Vec<Node>,
    importances: Vec<f64>,
}

impl DecisionTree {
    /// Fit a tree on the whole dataset
    pub fn fit(data: &Dataset, params: &TreeParams) -> Result<Self, ModelError> {
        if data.is_empty() {
            return Err(ModelError::EmptyDataset);
        }
        let mut indices: Vec<usize> = (0..data.len()).collect();
        let mut rng = StdRng::seed_from_u64(0);
        let tree = Self::fit_rows(&data.features, &data.targets, &mut indices, params, &mut rng);
        debug!("Fitted tree: {} nodes, depth {}", tree.node_count(), tree.depth());
        Ok(tree)
    }

    /// Fit on a subset of rows; `indices` is reordered in place
    pub(crate) fn fit_rows<R: Rng>(
        features: &[Vec<f64>],
        targets: &[f64],
        indices: &mut [usize],
        params: &TreeParams,
        rng: &mut R,
    ) -> Self {
        let n_features = features.iter().map(Vec::len).max().unwrap_or(0);
        let mut grower = Grower {
            features,
            targets,
            params,
            rng,
            nodes: Vec::new(),
            importances: vec![0.0; n_features],
        };
        grower.grow(indices, 0);
        Self {
            nodes: grower.nodes,
            importances: grower.importances,
        }
    }

    /// Impurity-decrease importance per feature, summing to 1.
    ///
    /// All zeros when the tree never split.
    pub fn feature_importances(&self) -> Vec<f64> {
        normalized(&self.importances)
    }

    /// Number of nodes
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Longest root-to-leaf path, in edges
    pub fn depth(&self) -> usize {
        fn walk(nodes: &[Node], idx: usize) -> usize {
            match nodes[idx] {
                Node::Leaf { .. } => 0,
                Node::Split { left, right, .. } => 1 + walk(nodes, left).max(walk(nodes, right)),
            }
        }
        if self.nodes.is_empty() {
            0
        } else {
            walk(&self.nodes, 0)
        }
    }
}

impl Regressor for DecisionTree {
    fn predict(&self, features: &[f64]) -> f64 {
        let mut idx = 0;
        loop {
            match self.nodes.get(idx) {
                Some(Node::Leaf { value }) => return *value,
                Some(Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                }) => {
                    let x = features.get(*feature).copied().unwrap_or(0.0);
                    idx = if x <= *threshold { *left } else { *right };
                }
                None => return 0.0,
            }
        }
    }
}

impl<R: Rng> Grower<'_, R> {
    fn grow(&mut self, indices: &mut [usize], depth: usize) -> usize {
        let id = self.nodes.len();
        let n = indices.len();
        let mean = indices.iter().map(|&i| self.targets[i]).sum::<f64>() / n.max(1) as f64;
        self.nodes.push(Node::Leaf { value: mean });

        let depth_reached = self.params.max_depth.is_some_and(|d| depth >= d);
        let too_small = n < self.params.min_samples_split.max(2)
            || n < 2 * self.params.min_samples_leaf.max(1);
        if depth_reached || too_small {
            return id;
        }

        let Some(split) = self.best_split(indices) else {
            return id;
        };

        let mut mid = 0;
        for k in 0..n {
            if self.value(indices[k], split.feature) <= split.threshold {
                indices.swap(k, mid);
                mid += 1;
            }
        }
        // a threshold that separates nothing would recurse on the same rows
        if mid == 0 || mid == n {
            return id;
        }
        if let Some(total) = self.importances.get_mut(split.feature) {
            *total += split.gain;
        }
        let (left_rows, right_rows) = indices.split_at_mut(mid);
        let left = self.grow(left_rows, depth + 1);
        let right = self.grow(right_rows, depth + 1);
        self.nodes[id] = Node::Split {
            feature: split.feature,
            threshold: split.threshold,
            left,
            right,
        };
        id
    }

    fn value(&self, row: usize, feature: usize) -> f64 {
        self.features[row].get(feature).copied().unwrap_or(0.0)
    }

    /// Best split by squared-error reduction, or `None` if nothing improves
    fn best_split(&mut self, indices: &[usize]) -> Option<SplitCandidate> {
        let n = indices.len();
        let n_features = self.features[indices[0]].len();
        let candidates: Vec<usize> = match self.params.max_features {
            Some(k) if k > 0 && k < n_features => {
                rand::seq::index::sample(&mut *self.rng, n_features, k).into_vec()
            }
            _ => (0..n_features).collect(),
        };

        let total: f64 = indices.iter().map(|&i| self.targets[i]).sum();
        // maximizing sum_l^2/n_l + sum_r^2/n_r minimizes the children's SSE
        let parent_score = total * total / n as f64;
        let min_leaf = self.params.min_samples_leaf.max(1);
        let min_gain = 1e-9 * parent_score.abs().max(1.0);

        let mut best: Option<SplitCandidate> = None;
        let mut pairs: Vec<(f64, f64)> = Vec::with_capacity(n);
        for feature in candidates {
            pairs.clear();
            pairs.extend(indices.iter().map(|&i| (self.value(i, feature), self.targets[i])));
            pairs.sort_by(|a, b| a.0.total_cmp(&b.0));

            let mut left_sum = 0.0;
            for k in 1..n {
                left_sum += pairs[k - 1].1;
                if k < min_leaf || n - k < min_leaf {
                    continue;
                }
                if pairs[k - 1].0 >= pairs[k].0 {
                    continue;
                }
                let right_sum = total - left_sum;
                let score = left_sum * left_sum / k as f64 + right_sum * right_sum / (n - k) as f64;
                if score > parent_score + min_gain && best.as_ref().map_or(true, |b| score > b.score) {
                    let (lo, hi) = (pairs[k - 1].0, pairs[k].0);
                    // the midpoint of adjacent doubles can round up to `hi`
                    let mid = (lo + hi) / 2.0;
                    best = Some(SplitCandidate {
                        feature,
                        threshold: if mid < hi { mid } else { lo },
                        score,
                        gain: score - parent_score,
                    });
                }
            }
        }
        best
    }
}

/// Average normalized importances across trees, then renormalize
pub(crate) fn mean_importances(trees: &[DecisionTree]) -> Vec<f64> {
    let width = trees.iter().map(|t| t.importances.len()).max().unwrap_or(0);
    let mut sum = vec![0.0; width];
    for tree in trees {
        for (total, v) in sum.iter_mut().zip(tree.feature_importances()) {
            *total += v;
        }
    }
    normalized(&sum)
}

/// Scale non-negative weights to sum to 1; all zeros stay zero
pub(crate) fn normalized(weights: &[f64]) -> Vec<f64> {
    let total: f64 = weights.iter().sum();
    if total > 0.0 {
        weights.iter().map(|w| w / total).collect()
    } else {
        vec![0.0; weights.len()]
    }
}
