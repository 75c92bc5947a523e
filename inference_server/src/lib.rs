pub mod config;
pub mod engine;
pub mod error;
pub mod misc;
pub mod model;
pub mod server;

pub use engine::InferenceEngine;
pub use misc::{PredictionResponse, PredictionType};
