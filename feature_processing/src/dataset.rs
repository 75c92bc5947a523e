//! Feature matrix plus labels, with the sampling helpers the classifier needs.

use ndarray::{Array2, ArrayView1, Axis};
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::label::PriceChange;

#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    /// Feature matrix (n_samples x n_features)
    pub features: Array2<f64>,
    pub labels: Vec<PriceChange>,
}

/// Train/test split result
#[derive(Debug, Clone)]
pub struct Split {
    pub train: Dataset,
    pub test: Dataset,
}

impl Dataset {
    pub fn new(features: Array2<f64>, labels: Vec<PriceChange>) -> Self {
        assert_eq!(features.nrows(), labels.len(), "one label per feature row");
        Self { features, labels }
    }

    pub fn n_samples(&self) -> usize {
        self.labels.len()
    }

    pub fn n_features(&self) -> usize {
        self.features.ncols()
    }

    pub fn row(&self, index: usize) -> ArrayView1<'_, f64> {
        self.features.row(index)
    }

    /// Sample count per class, indexed by `PriceChange::class_index`.
    pub fn class_counts(&self) -> [usize; 3] {
        let mut counts = [0; 3];
        for label in &self.labels {
            counts[label.class_index()] += 1;
        }
        counts
    }

    /// Number of distinct labels present.
    pub fn n_classes(&self) -> usize {
        self.class_counts().iter().filter(|&&c| c > 0).count()
    }

    pub fn subset(&self, indices: &[usize]) -> Dataset {
        Dataset {
            features: self.features.select(Axis(0), indices),
            labels: indices.iter().map(|&i| self.labels[i]).collect(),
        }
    }

    /// Random sample with replacement, same size as the dataset.
    pub fn bootstrap_sample(&self, seed: u64) -> Dataset {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let n = self.n_samples();
        let indices: Vec<usize> = (0..n).map(|_| rng.gen_range(0..n)).collect();
        self.subset(&indices)
    }

    /// Shuffled split. The test side gets `ceil(test_ratio * n)` rows, but
    /// both sides keep at least one row once there are two samples.
    pub fn train_test_split(&self, test_ratio: f64, seed: u64) -> Split {
        let n = self.n_samples();
        if n < 2 {
            return Split {
                train: self.clone(),
                test: self.subset(&[]),
            };
        }

        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let mut indices: Vec<usize> = (0..n).collect();
        indices.shuffle(&mut rng);

        let n_test = ((test_ratio * n as f64).ceil() as usize).clamp(1, n - 1);
        let (test_indices, train_indices) = indices.split_at(n_test);

        Split {
            train: self.subset(train_indices),
            test: self.subset(test_indices),
        }
    }
}
