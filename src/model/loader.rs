use crate::config::ModelConfig;
use crate::error::InferenceError;
use crate::model::classifier::OnnxClassifier;
use ort::session::{builder::GraphOptimizationLevel, Session};
use std::path::Path;
use tracing::{debug, info};

// Initialize the global environment for ORT (only needed once)
pub fn init_ort() -> Result<(), InferenceError> {
    ort::init().with_name(env!("CARGO_PKG_NAME")).commit()?;
    debug!("onnx runtime environment initialized");
    Ok(())
}

/// Loads an ONNX model from disk and creates an inference session.
///
/// # Arguments
/// * `model_path` - Path to the .onnx file
/// * `intra_threads` - Parallelism within an op
pub fn load_model(model_path: impl AsRef<Path>, intra_threads: usize) -> Result<Session, InferenceError> {
    let path = model_path.as_ref();
    if !path.exists() {
        return Err(InferenceError::ModelNotFound(path.display().to_string()));
    }

    let session = Session::builder()?
        .with_optimization_level(GraphOptimizationLevel::Level3)?
        .with_intra_threads(intra_threads)?
        .commit_from_file(path)?;

    info!(path = %path.display(), "loaded model");
    for (i, input) in session.inputs.iter().enumerate() {
        debug!("  input {}: {} ({:?})", i, input.name, input.input_type);
    }
    for (i, output) in session.outputs.iter().enumerate() {
        debug!("  output {}: {} ({:?})", i, output.name, output.output_type);
    }

    Ok(session)
}

/// Loads the configured model and wraps it for serving.
pub fn load_classifier(config: &ModelConfig) -> Result<OnnxClassifier, InferenceError> {
    let session = load_model(&config.path, config.intra_threads)?;
    OnnxClassifier::new(session)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_model_nonexistent_file() {
        let result = load_model("nonexistent_model.onnx", 1);
        match result {
            Err(InferenceError::ModelNotFound(path)) => assert_eq!(path, "nonexistent_model.onnx"),
            _ => panic!("Expected ModelNotFound error"),
        }
    }

    #[test]
    fn test_load_classifier_uses_configured_path() {
        let config = ModelConfig {
            path: "models/missing.onnx".to_string(),
            ..ModelConfig::default()
        };
        assert!(matches!(
            load_classifier(&config),
            Err(InferenceError::ModelNotFound(_))
        ));
    }

    #[test]
    fn test_load_model_rejects_garbage() {
        init_ort().unwrap();
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"definitely not a protobuf graph").unwrap();

        let result = load_model(file.path(), 1);
        assert!(result.is_err());
        assert!(!matches!(result, Err(InferenceError::ModelNotFound(_))));
    }
}
