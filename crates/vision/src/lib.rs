pub mod backend;
pub mod config;
pub mod decoder;
pub mod detector;
pub mod error;
pub mod letterbox;
pub mod nms;

// Re-export commonly used types for convenience
pub use backend::InferenceBackend;
pub use config::{DecoderKind, Thresholds, VisionConfig};
pub use detector::{Detection, Detector};
pub use error::VisionError;
pub use nms::NmsMode;
