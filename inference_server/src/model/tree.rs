//! CART decision tree with Gini impurity.

use feature_processing::{Dataset, PriceChange};
use rand::SeedableRng;
use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;

use super::{ClassProbs, N_CLASSES, argmax};

#[derive(Debug, Clone)]
pub struct TreeConfig {
    /// Maximum depth of tree (None = grow until pure)
    pub max_depth: Option<usize>,
    /// Minimum samples required to split
    pub min_samples_split: usize,
    /// Minimum samples in leaf node
    pub min_samples_leaf: usize,
    /// Features examined per split (None = all)
    pub max_features: Option<usize>,
    pub seed: u64,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: None,
            seed: 42,
        }
    }
}

#[derive(Debug, Clone)]
enum Node {
    Leaf {
        probs: ClassProbs,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: Box<Node>,
        right: Box<Node>,
    },
}

struct BestSplit {
    feature: usize,
    threshold: f64,
    gain: f64,
}

#[derive(Debug, Clone)]
pub struct DecisionTree {
    root: Node,
}

impl DecisionTree {
    /// Grow a tree on every row of `data`.
    pub fn fit(config: TreeConfig, data: &Dataset) -> Self {
        let indices: Vec<usize> = (0..data.n_samples()).collect();
        let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
        let root = build(&config, data, &indices, 0, &mut rng);
        Self { root }
    }

    pub fn predict_proba_one(&self, features: &[f64]) -> ClassProbs {
        let mut node = &self.root;
        loop {
            match node {
                Node::Leaf { probs } => return *probs,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    node = if features[*feature] <= *threshold {
                        left.as_ref()
                    } else {
                        right.as_ref()
                    };
                }
            }
        }
    }

    pub fn predict_one(&self, features: &[f64]) -> PriceChange {
        let probs = self.predict_proba_one(features);
        PriceChange::from_class_index(argmax(&probs)).unwrap_or(PriceChange::Flat)
    }

    #[cfg(test)]
    pub fn depth(&self) -> usize {
        node_depth(&self.root)
    }

    #[cfg(test)]
    pub fn n_leaves(&self) -> usize {
        node_leaves(&self.root)
    }
}

fn build(
    config: &TreeConfig,
    data: &Dataset,
    indices: &[usize],
    depth: usize,
    rng: &mut ChaCha8Rng,
) -> Node {
    let counts = class_counts(data, indices);
    let impurity = gini(&counts, indices.len());

    let depth_reached = config.max_depth.is_some_and(|max| depth >= max);
    if depth_reached || indices.len() < config.min_samples_split || impurity < 1e-12 {
        return leaf(&counts, indices.len());
    }

    let Some(best) = find_best_split(config, data, indices, &counts, impurity, rng) else {
        return leaf(&counts, indices.len());
    };

    let (left, right): (Vec<usize>, Vec<usize>) = indices
        .iter()
        .partition(|&&i| data.features[[i, best.feature]] <= best.threshold);
    if left.is_empty() || right.is_empty() {
        return leaf(&counts, indices.len());
    }

    Node::Split {
        feature: best.feature,
        threshold: best.threshold,
        left: Box::new(build(config, data, &left, depth + 1, rng)),
        right: Box::new(build(config, data, &right, depth + 1, rng)),
    }
}

/// Scan a random subset of features for the threshold with the largest Gini
/// decrease. Like CART, keeps scanning past `max_features` until at least one
/// valid split has been seen.
fn find_best_split(
    config: &TreeConfig,
    data: &Dataset,
    indices: &[usize],
    parent_counts: &[usize; N_CLASSES],
    parent_impurity: f64,
    rng: &mut ChaCha8Rng,
) -> Option<BestSplit> {
    let n_features = data.n_features();
    let max_features = config.max_features.unwrap_or(n_features).max(1);

    let mut features: Vec<usize> = (0..n_features).collect();
    features.shuffle(rng);

    let n = indices.len();
    let mut best: Option<BestSplit> = None;

    for (visited, &feature) in features.iter().enumerate() {
        if visited >= max_features && best.is_some() {
            break;
        }

        let mut column: Vec<(f64, usize)> = indices
            .iter()
            .map(|&i| (data.features[[i, feature]], data.labels[i].class_index()))
            .collect();
        column.sort_by(|a, b| a.0.total_cmp(&b.0));

        let mut left_counts = [0usize; N_CLASSES];
        for split in 1..n {
            left_counts[column[split - 1].1] += 1;

            let (prev, next) = (column[split - 1].0, column[split].0);
            if prev >= next {
                continue;
            }
            if split < config.min_samples_leaf || n - split < config.min_samples_leaf {
                continue;
            }

            let mut right_counts = *parent_counts;
            for (r, l) in right_counts.iter_mut().zip(left_counts.iter()) {
                *r -= l;
            }

            let weighted = (split as f64 * gini(&left_counts, split)
                + (n - split) as f64 * gini(&right_counts, n - split))
                / n as f64;
            let gain = parent_impurity - weighted;

            if gain > 1e-12 && best.as_ref().is_none_or(|b| gain > b.gain) {
                // adjacent floats can round the midpoint up to `next`
                let mut threshold = prev + (next - prev) / 2.0;
                if threshold >= next {
                    threshold = prev;
                }
                best = Some(BestSplit {
                    feature,
                    threshold,
                    gain,
                });
            }
        }
    }

    best
}

fn class_counts(data: &Dataset, indices: &[usize]) -> [usize; N_CLASSES] {
    let mut counts = [0; N_CLASSES];
    for &i in indices {
        counts[data.labels[i].class_index()] += 1;
    }
    counts
}

fn gini(counts: &[usize; N_CLASSES], n: usize) -> f64 {
    if n == 0 {
        return 0.0;
    }
    let n = n as f64;
    1.0 - counts.iter().map(|&c| (c as f64 / n).powi(2)).sum::<f64>()
}

fn leaf(counts: &[usize; N_CLASSES], n: usize) -> Node {
    let mut probs = [0.0; N_CLASSES];
    if n > 0 {
        for (p, &c) in probs.iter_mut().zip(counts.iter()) {
            *p = c as f64 / n as f64;
        }
    }
    Node::Leaf { probs }
}

#[cfg(test)]
fn node_depth(node: &Node) -> usize {
    match node {
        Node::Leaf { .. } => 1,
        Node::Split { left, right, .. } => 1 + node_depth(left).max(node_depth(right)),
    }
}

#[cfg(test)]
fn node_leaves(node: &Node) -> usize {
    match node {
        Node::Leaf { .. } => 1,
        Node::Split { left, right, .. } => node_leaves(left) + node_leaves(right),
    }
}
