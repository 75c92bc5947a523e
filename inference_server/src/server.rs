use std::sync::Arc;

use anyhow::Result;
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use log::{info, warn};
use serde_json::Value;
use tokio::signal;
use tower_http::cors::{Any, CorsLayer};

use crate::config::ServerConfig;
use crate::engine::InferenceEngine;
use crate::error::PipelineError;
use crate::misc::PredictionResponse;

/// Read-only per-process state: the engine's fixed hyper-parameters.
#[derive(Clone)]
struct AppState {
    engine: Arc<InferenceEngine>,
}

/// POST /predict trains a fresh model on the posted series and returns the signal.
async fn predict(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Response {
    let Json(payload) = match payload {
        Ok(payload) => payload,
        Err(rejection) => {
            warn!("Rejected request body: {}", rejection.body_text());
            return PipelineError::from(rejection).into_response();
        }
    };

    // fitting is CPU bound, keep it off the async workers
    let engine = state.engine.clone();
    let result = tokio::task::spawn_blocking(move || engine.predict(&payload)).await;

    match result {
        Ok(Ok(prediction_type)) => {
            info!("Prediction: {:?}", prediction_type);
            (StatusCode::OK, Json(PredictionResponse { prediction_type })).into_response()
        }
        Ok(Err(err)) => err.into_response(),
        Err(join_err) => PipelineError::Internal(join_err.to_string()).into_response(),
    }
}

/// Router with permissive CORS so browser clients on any origin can call it.
pub fn router(engine: InferenceEngine) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let state = AppState {
        engine: Arc::new(engine),
    };

    Router::new()
        .route("/predict", post(predict))
        .layer(cors)
        .with_state(state)
}

pub struct Server {
    config: ServerConfig,
    engine: InferenceEngine,
}

impl Server {
    pub fn init(config: ServerConfig, engine: InferenceEngine) -> Self {
        Self { config, engine }
    }

    pub async fn run(self) -> Result<()> {
        let addr = self.config.socket_addr()?;
        let app = router(self.engine);

        let listener = tokio::net::TcpListener::bind(addr).await?;
        info!("🚀HTTP server running on {}", addr);
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;
        Ok(())
    }
}

async fn shutdown_signal() {
    if let Err(e) = signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Received shutdown signal, initiating graceful shutdown");
}
