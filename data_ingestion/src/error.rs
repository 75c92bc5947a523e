use thiserror::Error;

#[derive(Error, Debug)]
pub enum IngestionError {
    #[error("No price variations provided.")]
    NoPriceVariations,

    #[error("priceVariations must be a list, got {0}")]
    MalformedPayload(String),

    #[error("Length mismatch: price variation {index} has {found} fields, expected 2 (price, date)")]
    FieldCount { index: usize, found: usize },

    #[error("Could not convert price {value} of price variation {index} to a number")]
    InvalidPrice { index: usize, value: String },

    #[error("Unknown datetime string format, unable to parse: {value} (price variation {index})")]
    InvalidDate { index: usize, value: String },
}

impl IngestionError {
    /// Only a missing or empty payload is the caller's fault; coercion
    /// failures surface as server errors.
    pub fn is_client_error(&self) -> bool {
        matches!(self, IngestionError::NoPriceVariations)
    }
}
