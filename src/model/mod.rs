pub mod classifier;
pub mod decode;
pub mod labels;
pub mod loader;

pub use classifier::{Classifier, OnnxClassifier};
pub use decode::{classify, Classification};
pub use labels::LabelTable;
