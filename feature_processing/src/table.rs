use ndarray::Array2;

use crate::dataset::Dataset;
use crate::label::PriceChange;

/// Predictor columns derived from the price series.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeatureColumn {
    PriceLag1,
    PriceLag2,
    PriceMa3,
}

impl FeatureColumn {
    pub const ALL: [FeatureColumn; 3] = [
        FeatureColumn::PriceLag1,
        FeatureColumn::PriceLag2,
        FeatureColumn::PriceMa3,
    ];

    pub fn name(self) -> &'static str {
        match self {
            FeatureColumn::PriceLag1 => "price_lag_1",
            FeatureColumn::PriceLag2 => "price_lag_2",
            FeatureColumn::PriceMa3 => "price_ma_3",
        }
    }
}

/// Raw values of the last engineered row.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LastRow {
    pub price: f64,
    pub lag1: Option<f64>,
    pub ma3: Option<f64>,
}

/// Engineered rows with every null-bearing row removed.
#[derive(Debug, Clone, Default)]
pub struct FeatureTable {
    pub columns: Vec<FeatureColumn>,
    pub rows: Vec<Vec<f64>>,
    pub labels: Vec<PriceChange>,
    pub last: Option<LastRow>,
}

impl FeatureTable {
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn n_features(&self) -> usize {
        self.columns.len()
    }

    pub fn to_dataset(&self) -> Dataset {
        let n_features = self.n_features();
        let features = Array2::from_shape_fn((self.len(), n_features), |(i, j)| self.rows[i][j]);
        Dataset::new(features, self.labels.clone())
    }

    /// Feature vector for the step after the last observation: the last price
    /// becomes lag-1, the last lag-1 becomes lag-2, and the last rolling mean
    /// is reused as is. Without a rolling mean the last price stands in.
    pub fn next_step_features(&self) -> Option<Vec<f64>> {
        let last = self.last?;
        let features = self
            .columns
            .iter()
            .map(|column| match column {
                FeatureColumn::PriceLag1 => last.price,
                FeatureColumn::PriceLag2 => last.lag1.unwrap_or(last.price),
                FeatureColumn::PriceMa3 => last.ma3.unwrap_or(last.price),
            })
            .collect();
        Some(features)
    }
}
