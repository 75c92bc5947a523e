//! Random forest classifier over the three price-change classes.

mod forest;
mod tree;

pub use forest::{ForestConfig, RandomForest};
pub use tree::{DecisionTree, TreeConfig};

/// Number of label classes (`Down`, `Flat`, `Up`).
pub const N_CLASSES: usize = 3;

pub type ClassProbs = [f64; N_CLASSES];

/// Index of the most probable class; ties go to the lower index.
pub fn argmax(probs: &ClassProbs) -> usize {
    let mut best = 0;
    for (i, &p) in probs.iter().enumerate().skip(1) {
        if p > probs[best] {
            best = i;
        }
    }
    best
}
