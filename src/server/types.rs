use crate::config::AppConfig;
use crate::error::InferenceError;
use crate::fetch::ImageFetcher;
use crate::model::{loader, Classifier, LabelTable};
use crate::preprocessing::image::PreprocessConfig;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::info;

/// Shared Application State
///
/// Built once before the listener is bound and never mutated afterwards.
#[derive(Clone)]
pub struct AppState {
    pub classifier: Arc<dyn Classifier>,
    pub labels: LabelTable,
    pub fetcher: ImageFetcher,
    pub preprocess: PreprocessConfig,
}

impl AppState {
    pub fn new(
        classifier: Arc<dyn Classifier>,
        labels: LabelTable,
        fetcher: ImageFetcher,
        preprocess: PreprocessConfig,
    ) -> Self {
        Self {
            classifier,
            labels,
            fetcher,
            preprocess,
        }
    }

    /// Loads labels and model from the paths in `config`.
    pub fn from_config(config: &AppConfig) -> Result<Self, InferenceError> {
        let labels = LabelTable::load(&config.model.labels_path)?;
        info!(path = %config.model.labels_path, count = labels.len(), "loaded labels");

        let classifier = loader::load_classifier(&config.model)?;
        let fetcher = ImageFetcher::new(&config.fetch)?;

        Ok(Self::new(
            Arc::new(classifier),
            labels,
            fetcher,
            config.model.preprocess.clone(),
        ))
    }
}

// --- DTOs (Data Transfer Objects) ---

/// Pulls `image_url` out of a request body.
///
/// Absent and empty-ish values (`null`, `""`, `false`, `0`, `[]`, `{}`) are a
/// client error. A body that is not an object, or a non-string URL, is not.
pub fn image_url(body: &Value) -> Result<&str, InferenceError> {
    let object = body.as_object().ok_or_else(|| {
        InferenceError::InvalidRequest("expected a JSON object".to_string())
    })?;

    match object.get("image_url") {
        None => Err(InferenceError::MissingImageUrl),
        Some(value) if is_blank(value) => Err(InferenceError::MissingImageUrl),
        Some(Value::String(url)) => Ok(url),
        Some(other) => Err(InferenceError::InvalidRequest(format!(
            "'image_url' must be a string, got {other}"
        ))),
    }
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
    }
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct PredictResponse {
    pub class: String,
    pub confidence: f32,
}
