use crate::error::InferenceError;
use ndarray::{Array4, ArrayViewD, Axis};
use ort::{session::Session, value::Tensor};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// A loaded model that turns one batched image tensor into per-class scores.
pub trait Classifier: Send + Sync {
    /// Runs a single forward pass and returns the scores of batch row 0.
    fn scores(&self, input: Array4<f32>) -> Result<Vec<f32>, InferenceError>;
}

/// ONNX Runtime backed classifier.
///
/// `Session::run` needs exclusive access, so concurrent requests take turns
/// on the mutex.
pub struct OnnxClassifier {
    session: Mutex<Session>,
    input_name: String,
    output_name: String,
}

impl OnnxClassifier {
    pub fn new(session: Session) -> Result<Self, InferenceError> {
        let input_name = session
            .inputs
            .first()
            .map(|input| input.name.clone())
            .ok_or_else(|| InferenceError::InvalidModel("model declares no inputs".to_string()))?;
        let output_name = session
            .outputs
            .first()
            .map(|output| output.name.clone())
            .ok_or_else(|| InferenceError::InvalidModel("model declares no outputs".to_string()))?;

        Ok(Self {
            session: Mutex::new(session),
            input_name,
            output_name,
        })
    }

    pub fn input_name(&self) -> &str {
        &self.input_name
    }
}

impl Classifier for OnnxClassifier {
    fn scores(&self, input: Array4<f32>) -> Result<Vec<f32>, InferenceError> {
        let shape = input.shape().to_vec();
        let (data, _) = input.into_raw_vec_and_offset();
        let input_value = Tensor::from_array((shape, data.into_boxed_slice()))?;

        let mut session = lock_recovering(&self.session);
        let outputs = session.run(ort::inputs![self.input_name.as_str() => input_value])?;

        let output = outputs
            .get(self.output_name.as_str())
            .ok_or(InferenceError::EmptyOutput)?;
        let (shape, data) = output.try_extract_tensor::<f32>()?;
        let dims: Vec<usize> = shape.iter().map(|&x| x as usize).collect();
        let output = ArrayViewD::from_shape(dims.as_slice(), data)?;
        let scores = score_row(output)?;
        Ok(scores)
    }
}

/// A session holds no state between runs, so a panic in an earlier run leaves
/// nothing to repair.
fn lock_recovering<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Flattens batch row 0 of a model output into a score vector.
pub fn score_row(output: ArrayViewD<'_, f32>) -> Result<Vec<f32>, InferenceError> {
    let row = match output.ndim() {
        0 => return Err(InferenceError::EmptyOutput),
        1 => output,
        _ if output.len_of(Axis(0)) == 0 => return Err(InferenceError::EmptyOutput),
        _ => output.index_axis_move(Axis(0), 0),
    };
    Ok(row.iter().copied().collect())
}
