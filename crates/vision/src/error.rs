use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum VisionError {
    #[error("IO error: {0}")]
    IoError(#[from] io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Output shape mismatch: expected {expected}, got {actual}")]
    ShapeMismatch { expected: String, actual: String },
}
