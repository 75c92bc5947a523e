use data_ingestion::parse_price_variations;
use feature_processing::resample::{DEFAULT_K_NEIGHBORS, DEFAULT_SEED};
use feature_processing::{Smote, engineer_features};
use log::{debug, info};
use serde_json::Value;

use crate::error::PipelineError;
use crate::misc::PredictionType;
use crate::model::{ForestConfig, RandomForest};

pub const EMPTY_AFTER_PREPROCESSING: &str =
    "Dataset is empty after preprocessing. Ensure sufficient price variations.";
pub const NOT_ENOUGH_FOR_TRAINING: &str =
    "Not enough data for training. Ensure price variations are sufficient.";
pub const NOT_ENOUGH_AFTER_RESAMPLING: &str =
    "Not enough data to train the model after resampling.";
pub const NOT_ENOUGH_FOR_FORECAST: &str = "Not enough data to make a future prediction.";

/// Fit-and-predict pipeline. Holds only fixed hyper-parameters; every call
/// trains a fresh model and keeps nothing afterwards.
#[derive(Debug, Clone)]
pub struct InferenceEngine {
    pub forest: ForestConfig,
    pub smote_k_neighbors: usize,
    pub smote_seed: u64,
    pub test_ratio: f64,
    pub split_seed: u64,
}

impl Default for InferenceEngine {
    fn default() -> Self {
        Self {
            forest: ForestConfig::default(),
            smote_k_neighbors: DEFAULT_K_NEIGHBORS,
            smote_seed: DEFAULT_SEED,
            test_ratio: 0.2,
            split_seed: 42,
        }
    }
}

impl InferenceEngine {
    pub fn predict(&self, payload: &Value) -> Result<PredictionType, PipelineError> {
        let observations = parse_price_variations(payload)?;

        let table = engineer_features(&observations)?;
        if table.is_empty() {
            return Err(PipelineError::InsufficientData(EMPTY_AFTER_PREPROCESSING));
        }
        if table.len() <= 1 {
            return Err(PipelineError::InsufficientData(NOT_ENOUGH_FOR_TRAINING));
        }

        let dataset = table.to_dataset();
        let balanced = if dataset.n_classes() > 1 {
            let k = self.smote_k_neighbors.min(dataset.n_samples() - 1);
            Smote::new(k, self.smote_seed).fit_resample(&dataset)?
        } else {
            debug!("Single label class, skipping SMOTE");
            dataset
        };

        if balanced.n_samples() <= 1 {
            return Err(PipelineError::InsufficientData(NOT_ENOUGH_AFTER_RESAMPLING));
        }

        let split = balanced.train_test_split(self.test_ratio, self.split_seed);
        let forest = RandomForest::fit(&self.forest, &split.train)?;

        if split.test.n_samples() > 0 {
            let accuracy = forest.accuracy(&split.test)?;
            info!("Model Accuracy: {:.2}", accuracy);
        } else {
            info!("Not enough data for test evaluation.");
        }

        if table.len() < 2 {
            return Err(PipelineError::InsufficientData(NOT_ENOUGH_FOR_FORECAST));
        }
        let next = table
            .next_step_features()
            .ok_or(PipelineError::InsufficientData(NOT_ENOUGH_FOR_FORECAST))?;

        let change = forest.predict_one(&next)?;
        let prediction = PredictionType::from(change);
        debug!(
            "Predicted {:?} from {} observations ({} training rows)",
            prediction,
            observations.len(),
            split.train.n_samples()
        );

        Ok(prediction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const DAY_ZERO_MS: i64 = 1_704_067_200_000;
    const DAY_MS: i64 = 86_400_000;

    fn payload(prices: &[f64]) -> Value {
        let variations: Vec<Value> = prices
            .iter()
            .enumerate()
            .map(|(i, p)| json!({"price": p, "date": DAY_ZERO_MS + i as i64 * DAY_MS}))
            .collect();
        json!({ "priceVariations": variations })
    }

    fn insufficient(result: Result<PredictionType, PipelineError>) -> &'static str {
        match result {
            Err(PipelineError::InsufficientData(msg)) => msg,
            other => panic!("expected insufficient data, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_payload() {
        let engine = InferenceEngine::default();
        let err = engine.predict(&json!({"priceVariations": []})).unwrap_err();
        assert!(matches!(err, PipelineError::NoPriceVariations));
    }

    #[test]
    fn test_rejections_by_stage() {
        let engine = InferenceEngine::default();
        assert_eq!(insufficient(engine.predict(&payload(&[1.0]))), EMPTY_AFTER_PREPROCESSING);
        assert_eq!(insufficient(engine.predict(&payload(&[1.0, 2.0]))), NOT_ENOUGH_FOR_TRAINING);
    }

    #[test]
    fn test_four_point_scenario() {
        let engine = InferenceEngine::default();
        let prediction = engine.predict(&payload(&[100.0, 101.0, 99.0, 105.0])).unwrap();
        assert!(matches!(
            prediction,
            PredictionType::Yes | PredictionType::Skip | PredictionType::Wait
        ));
    }

    #[test]
    fn test_flat_prices_wait() {
        let engine = InferenceEngine::default();
        assert_eq!(engine.predict(&payload(&[50.0; 8])).unwrap(), PredictionType::Wait);
    }

    #[test]
    fn test_trends() {
        let engine = InferenceEngine::default();
        let rising: Vec<f64> = (0..20).map(|i| 100.0 + i as f64).collect();
        let falling: Vec<f64> = rising.iter().rev().copied().collect();
        assert_eq!(engine.predict(&payload(&rising)).unwrap(), PredictionType::Yes);
        assert_eq!(engine.predict(&payload(&falling)).unwrap(), PredictionType::Skip);
    }

    #[test]
    fn test_three_points_without_lag_features() {
        let engine = InferenceEngine::default();
        assert!(engine.predict(&payload(&[1.0, 2.0, 2.0])).is_ok());
    }

    #[test]
    fn test_deterministic() {
        let engine = InferenceEngine::default();
        let prices: Vec<f64> = (0..40).map(|i| 100.0 + (i as f64 * 0.7).sin() * 3.0).collect();
        let first = engine.predict(&payload(&prices)).unwrap();
        for _ in 0..3 {
            assert_eq!(engine.predict(&payload(&prices)).unwrap(), first);
        }
    }

    #[test]
    fn test_prices_at_float_resolution_limit() {
        let engine = InferenceEngine::default();
        let prices: Vec<f64> = (0..10)
            .map(|i| {
                if i % 2 == 0 {
                    9_007_199_254_740_994.0
                } else {
                    9_007_199_254_740_996.0
                }
            })
            .collect();
        assert!(engine.predict(&payload(&prices)).is_ok());
    }

    #[test]
    fn test_coercion_failure_is_internal() {
        let engine = InferenceEngine::default();
        let err = engine
            .predict(&json!({"priceVariations": [{"price": 1.0, "date": "soon"}]}))
            .unwrap_err();
        assert!(matches!(err, PipelineError::Internal(_)));
        assert_eq!(err.status(), axum::http::StatusCode::INTERNAL_SERVER_ERROR);
    }
}
