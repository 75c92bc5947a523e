pub mod error;
pub mod logger;
pub mod observation;

pub use error::IngestionError;
pub use observation::{parse_price_variations, validate_observation, PriceObservation};
