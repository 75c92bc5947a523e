pub mod dataset;
pub mod label;
pub mod processor;
pub mod resample;
pub mod table;

pub use dataset::{Dataset, Split};
pub use label::PriceChange;
pub use processor::engineer_features;
pub use resample::Smote;
pub use table::{FeatureColumn, FeatureTable, LastRow};
