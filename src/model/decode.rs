use crate::error::InferenceError;
use crate::model::labels::LabelTable;

/// The winning class for one image.
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    pub index: usize,
    pub label: String,
    pub confidence: f32,
}

/// Index of the largest score. Ties go to the first occurrence and NaN never wins.
pub fn argmax(scores: &[f32]) -> Option<usize> {
    if scores.is_empty() {
        return None;
    }

    let mut best = 0;
    let mut top = f32::NAN;
    for (i, &score) in scores.iter().enumerate() {
        if (top.is_nan() && !score.is_nan()) || score > top {
            best = i;
            top = score;
        }
    }
    Some(best)
}

/// Maps the top score to its label. The raw score is reported as confidence.
pub fn classify(scores: &[f32], labels: &LabelTable) -> Result<Classification, InferenceError> {
    let index = argmax(scores).ok_or(InferenceError::EmptyOutput)?;
    let confidence = scores[index];
    if !confidence.is_finite() {
        return Err(InferenceError::NonFiniteScore(confidence));
    }

    let label = labels.get(index).ok_or(InferenceError::LabelOutOfRange {
        index,
        len: labels.len(),
    })?;

    Ok(Classification {
        index,
        label: label.to_string(),
        confidence,
    })
}
