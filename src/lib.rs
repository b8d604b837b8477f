pub mod config;
pub mod error;
pub mod fetch;
pub mod model;
pub mod observability;
pub mod preprocessing;
pub mod server;


// Re-export common types
pub use error::InferenceError;
