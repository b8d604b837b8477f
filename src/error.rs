use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use ndarray::ShapeError;
use serde_json::json;
use thiserror::Error;

/// Message returned when the request carries no usable `image_url`.
pub const MISSING_IMAGE_URL: &str = "Missing 'image_url' in request";

#[derive(Error, Debug)]
pub enum InferenceError {
    #[error("Missing 'image_url' in request")]
    MissingImageUrl,

    #[error("Invalid request body: {0}")]
    InvalidRequest(String),

    #[error("Failed to fetch image: {0}")]
    FetchError(#[from] reqwest::Error),

    #[error("Image processing error: {0}")]
    ImageError(#[from] image::ImageError),

    #[error("Preprocessing error: {0}")]
    PreprocessingError(String),

    #[error("Shape error: {0}")]
    ShapeError(#[from] ShapeError),

    #[error("ONNX Runtime error: {0}")]
    OrtError(#[from] ort::Error),

    #[error("Inference task failed: {0}")]
    TaskFailed(#[from] tokio::task::JoinError),

    #[error("Model produced an empty score vector")]
    EmptyOutput,

    #[error("Predicted index {index} is outside the label table ({len} labels)")]
    LabelOutOfRange { index: usize, len: usize },

    #[error("Model produced a non-finite score: {0}")]
    NonFiniteScore(f32),

    #[error("Model not found at path: {0}")]
    ModelNotFound(String),

    #[error("Invalid model: {0}")]
    InvalidModel(String),

    #[error("Failed to read labels from {path}: {source}")]
    LabelsUnreadable {
        path: String,
        source: std::io::Error,
    },

    #[error("Malformed label on line {line}: {content:?}")]
    MalformedLabel { line: usize, content: String },

    #[error("Label file contains no labels")]
    NoLabels,
}

impl InferenceError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            InferenceError::MissingImageUrl => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for InferenceError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "prediction failed");
        }

        let body = Json(json!({
            "error": self.to_string()
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_image_url_message() {
        assert_eq!(InferenceError::MissingImageUrl.to_string(), MISSING_IMAGE_URL);
    }

    #[test]
    fn test_label_out_of_range_error() {
        let error = InferenceError::LabelOutOfRange { index: 7, len: 2 };
        assert_eq!(
            error.to_string(),
            "Predicted index 7 is outside the label table (2 labels)"
        );
    }

    #[test]
    fn test_malformed_label_error() {
        let error = InferenceError::MalformedLabel {
            line: 3,
            content: "cat".to_string(),
        };
        assert_eq!(error.to_string(), "Malformed label on line 3: \"cat\"");
    }

    async fn body_of(error: InferenceError) -> (StatusCode, serde_json::Value) {
        let response = error.into_response();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn test_fetch_error_exposes_cause() {
        let reqwest_error = reqwest::Client::new()
            .get("not a url")
            .send()
            .await
            .unwrap_err();
        let (status, body) = body_of(InferenceError::from(reqwest_error)).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body["error"]
            .as_str()
            .unwrap()
            .starts_with("Failed to fetch image: "));
    }

    #[tokio::test]
    async fn test_panicked_task_is_server_error() {
        let join_error = tokio::task::spawn_blocking(|| panic!("decoder blew up"))
            .await
            .unwrap_err();
        let (status, body) = body_of(InferenceError::from(join_error)).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body["error"]
            .as_str()
            .unwrap()
            .starts_with("Inference task failed: "));
    }

    #[tokio::test]
    async fn test_image_error_body() {
        let image_error = image::load_from_memory(b"plain text").unwrap_err();
        let (status, body) = body_of(InferenceError::from(image_error)).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body["error"]
            .as_str()
            .unwrap()
            .starts_with("Image processing error: "));
    }

    #[test]
    fn test_only_missing_field_is_client_error() {
        assert_eq!(
            InferenceError::MissingImageUrl.into_response().status(),
            StatusCode::BAD_REQUEST
        );

        let server_errors = vec![
            InferenceError::InvalidRequest("expected value".to_string()),
            InferenceError::PreprocessingError("bad".to_string()),
            InferenceError::EmptyOutput,
            InferenceError::NonFiniteScore(f32::NAN),
            InferenceError::LabelOutOfRange { index: 1, len: 1 },
            InferenceError::InvalidModel("model declares no outputs".to_string()),
        ];
        for error in server_errors {
            assert_eq!(
                error.into_response().status(),
                StatusCode::INTERNAL_SERVER_ERROR
            );
        }
    }

    #[tokio::test]
    async fn test_error_body_carries_message() {
        let (status, body) = body_of(InferenceError::EmptyOutput).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, json!({"error": "Model produced an empty score vector"}));
    }

    #[tokio::test]
    async fn test_missing_field_body() {
        let (status, body) = body_of(InferenceError::MissingImageUrl).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({"error": MISSING_IMAGE_URL}));
    }
}
