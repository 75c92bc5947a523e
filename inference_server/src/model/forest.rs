use anyhow::{Result, ensure};
use feature_processing::{Dataset, PriceChange};
use log::debug;
use rayon::prelude::*;

use super::tree::{DecisionTree, TreeConfig};
use super::{ClassProbs, N_CLASSES, argmax};

/// Random Forest configuration
#[derive(Debug, Clone)]
pub struct ForestConfig {
    /// Number of trees in the forest
    pub n_trees: usize,
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    /// Features per split (ceil(sqrt(n_features)) if None)
    pub max_features: Option<usize>,
    /// Tree `i` is seeded with `seed + i`
    pub seed: u64,
}

impl Default for ForestConfig {
    fn default() -> Self {
        Self {
            n_trees: 100,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: None,
            seed: 42,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RandomForest {
    trees: Vec<DecisionTree>,
    n_features: usize,
}

impl RandomForest {
    /// Train the forest; each tree is grown in parallel on its own bootstrap sample.
    pub fn fit(config: &ForestConfig, data: &Dataset) -> Result<Self> {
        ensure!(data.n_samples() > 0, "cannot fit a random forest on an empty training set");
        ensure!(config.n_trees > 0, "a random forest needs at least one tree");

        let n_features = data.n_features();
        let max_features = config
            .max_features
            .unwrap_or_else(|| (n_features as f64).sqrt().ceil() as usize);

        let trees: Vec<DecisionTree> = (0..config.n_trees)
            .into_par_iter()
            .map(|i| {
                let seed = config.seed.wrapping_add(i as u64);
                let tree_config = TreeConfig {
                    max_depth: config.max_depth,
                    min_samples_split: config.min_samples_split,
                    min_samples_leaf: config.min_samples_leaf,
                    max_features: Some(max_features),
                    seed,
                };

                DecisionTree::fit(tree_config, &data.bootstrap_sample(seed))
            })
            .collect();

        debug!(
            "Fitted {} trees on {} samples x {} features",
            trees.len(),
            data.n_samples(),
            n_features
        );

        Ok(Self { trees, n_features })
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    /// Mean of the per-tree class probabilities.
    pub fn predict_proba_one(&self, features: &[f64]) -> Result<ClassProbs> {
        ensure!(
            features.len() == self.n_features,
            "expected {} features, got {}",
            self.n_features,
            features.len()
        );

        let mut probs = [0.0; N_CLASSES];
        for tree in &self.trees {
            for (acc, p) in probs.iter_mut().zip(tree.predict_proba_one(features)) {
                *acc += p;
            }
        }
        let n = self.trees.len() as f64;
        for p in &mut probs {
            *p /= n;
        }
        Ok(probs)
    }

    pub fn predict_one(&self, features: &[f64]) -> Result<PriceChange> {
        let probs = self.predict_proba_one(features)?;
        Ok(PriceChange::from_class_index(argmax(&probs)).unwrap_or(PriceChange::Flat))
    }

    pub fn predict(&self, data: &Dataset) -> Result<Vec<PriceChange>> {
        (0..data.n_samples())
            .map(|i| self.predict_one(&data.row(i).to_vec()))
            .collect()
    }

    /// Fraction of rows whose predicted label matches.
    pub fn accuracy(&self, data: &Dataset) -> Result<f64> {
        ensure!(data.n_samples() > 0, "cannot score an empty dataset");
        let predictions = self.predict(data)?;
        let correct = predictions
            .iter()
            .zip(data.labels.iter())
            .filter(|(p, l)| p == l)
            .count();
        Ok(correct as f64 / data.n_samples() as f64)
    }
}
