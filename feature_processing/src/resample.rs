//! Synthetic minority oversampling (SMOTE).

use anyhow::Result;
use log::debug;
use ndarray::Array2;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::dataset::Dataset;
use crate::label::PriceChange;

pub const DEFAULT_K_NEIGHBORS: usize = 3;
pub const DEFAULT_SEED: u64 = 42;

#[derive(Debug, Clone, Copy)]
pub struct Smote {
    pub k_neighbors: usize,
    pub seed: u64,
}

impl Default for Smote {
    fn default() -> Self {
        Self {
            k_neighbors: DEFAULT_K_NEIGHBORS,
            seed: DEFAULT_SEED,
        }
    }
}

impl Smote {
    pub fn new(k_neighbors: usize, seed: u64) -> Self {
        Self { k_neighbors, seed }
    }

    /// Oversample every minority class up to the majority count.
    ///
    /// Original rows come first, synthetic rows are appended. A dataset with
    /// a single class is returned unchanged.
    pub fn fit_resample(&self, data: &Dataset) -> Result<Dataset> {
        if data.n_classes() < 2 {
            return Ok(data.clone());
        }

        let k = self.k_neighbors.min(data.n_samples() - 1);
        let counts = data.class_counts();
        let majority = counts.iter().copied().max().unwrap_or(0);
        let n_features = data.n_features();

        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        let mut values: Vec<f64> = data.features.iter().copied().collect();
        let mut labels = data.labels.clone();

        for class in PriceChange::ALL {
            let count = counts[class.class_index()];
            if count == 0 || count >= majority {
                continue;
            }

            let members: Vec<usize> = (0..data.n_samples())
                .filter(|&i| data.labels[i] == class)
                .collect();
            let k_class = k.min(count - 1);
            let neighbours: Vec<Vec<usize>> = members
                .iter()
                .map(|&i| nearest_neighbours(data, &members, i, k_class))
                .collect();

            let n_synthetic = majority - count;
            debug!("SMOTE: generating {} samples for {:?} (k={})", n_synthetic, class, k_class);

            for _ in 0..n_synthetic {
                let pick = rng.gen_range(0..members.len());
                let base = data.row(members[pick]);

                if neighbours[pick].is_empty() {
                    // lone member: nothing to interpolate towards
                    values.extend(base.iter().copied());
                } else {
                    let other = data.row(neighbours[pick][rng.gen_range(0..neighbours[pick].len())]);
                    let gap = rng.gen_range(0.0..1.0);
                    values.extend(base.iter().zip(other.iter()).map(|(a, b)| a + gap * (b - a)));
                }
                labels.push(class);
            }
        }

        let features = Array2::from_shape_vec((labels.len(), n_features), values)?;
        Ok(Dataset::new(features, labels))
    }
}

/// The `k` members closest to `index` (Euclidean), excluding itself.
fn nearest_neighbours(data: &Dataset, members: &[usize], index: usize, k: usize) -> Vec<usize> {
    let origin = data.row(index);
    let mut distances: Vec<(usize, f64)> = members
        .iter()
        .filter(|&&j| j != index)
        .map(|&j| {
            let d = origin
                .iter()
                .zip(data.row(j).iter())
                .map(|(a, b)| (a - b).powi(2))
                .sum::<f64>();
            (j, d)
        })
        .collect();

    distances.sort_by(|a, b| a.1.total_cmp(&b.1));
    distances.into_iter().take(k).map(|(j, _)| j).collect()
}
