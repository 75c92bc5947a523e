use feature_processing::PriceChange;
use serde::{Deserialize, Serialize};

/// Signal returned to callers. The mapping from `PriceChange` is fixed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PredictionType {
    Yes,
    Skip,
    Wait,
}

impl From<PriceChange> for PredictionType {
    fn from(change: PriceChange) -> Self {
        match change {
            PriceChange::Up => PredictionType::Yes,
            PriceChange::Down => PredictionType::Skip,
            PriceChange::Flat => PredictionType::Wait,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictionResponse {
    pub prediction_type: PredictionType,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}
