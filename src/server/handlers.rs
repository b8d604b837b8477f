use axum::{extract::rejection::JsonRejection, extract::State, Json};
use metrics::{counter, histogram};
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

use crate::error::InferenceError;
use crate::model::{classify, Classification};
use crate::observability::{IMAGE_FETCH_BYTES, INFERENCE_LATENCY, PREDICT_LATENCY, PREDICT_REQUESTS};
use crate::preprocessing::image::process_bytes;
use crate::server::types::*;

pub async fn health_check() -> &'static str {
    "OK"
}

/// `POST /predict`: classify the image found at `image_url`.
pub async fn predict(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<PredictResponse>, InferenceError> {
    let start = Instant::now();
    let result = run_prediction(&state, payload).await;

    let outcome = match &result {
        Ok(_) => "ok",
        Err(e) if e.status_code().is_client_error() => "client_error",
        Err(_) => "server_error",
    };
    counter!(PREDICT_REQUESTS, "outcome" => outcome).increment(1);
    histogram!(PREDICT_LATENCY).record(start.elapsed().as_secs_f64());

    let classification = result?;
    info!(
        class = %classification.label,
        confidence = classification.confidence,
        elapsed_ms = start.elapsed().as_secs_f64() * 1000.0,
        "prediction served"
    );

    Ok(Json(PredictResponse {
        class: classification.label,
        confidence: classification.confidence,
    }))
}

async fn run_prediction(
    state: &AppState,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Classification, InferenceError> {
    let Json(body) = payload.map_err(|e| InferenceError::InvalidRequest(e.body_text()))?;
    let url = image_url(&body)?;

    // 1. Fetch
    let image_bytes = state.fetcher.fetch(url).await?;
    histogram!(IMAGE_FETCH_BYTES).record(image_bytes.len() as f64);

    // 2. Preprocess, infer and decode off the async workers
    let classifier = Arc::clone(&state.classifier);
    let labels = state.labels.clone();
    let preprocess = state.preprocess.clone();

    let classification = tokio::task::spawn_blocking(move || -> Result<Classification, InferenceError> {
        let input = process_bytes(&image_bytes, &preprocess)?;

        let started = Instant::now();
        let scores = classifier.scores(input)?;
        histogram!(INFERENCE_LATENCY).record(started.elapsed().as_secs_f64());
        debug!(classes = scores.len(), "forward pass complete");

        classify(&scores, &labels)
    })
    .await??;

    Ok(classification)
}
