use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use data_ingestion::IngestionError;
use log::error;
use thiserror::Error;

use crate::misc::ErrorResponse;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("No price variations provided.")]
    NoPriceVariations,

    /// Too few rows at some pipeline stage.
    #[error("{0}")]
    InsufficientData(&'static str),

    /// Request body could not be read as JSON.
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Internal(String),
}

impl PipelineError {
    pub fn status(&self) -> StatusCode {
        match self {
            PipelineError::NoPriceVariations
            | PipelineError::InsufficientData(_)
            | PipelineError::BadRequest(_) => StatusCode::BAD_REQUEST,
            PipelineError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<IngestionError> for PipelineError {
    fn from(err: IngestionError) -> Self {
        if err.is_client_error() {
            PipelineError::NoPriceVariations
        } else {
            PipelineError::Internal(err.to_string())
        }
    }
}

impl From<JsonRejection> for PipelineError {
    fn from(rejection: JsonRejection) -> Self {
        PipelineError::BadRequest(rejection.body_text())
    }
}

impl From<anyhow::Error> for PipelineError {
    fn from(err: anyhow::Error) -> Self {
        PipelineError::Internal(format!("{:#}", err))
    }
}

impl IntoResponse for PipelineError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("Prediction failed: {}", self);
        }
        let body = ErrorResponse {
            error: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}
