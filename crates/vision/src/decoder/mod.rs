use ndarray::ArrayViewD;

use crate::config::Thresholds;
use crate::error::VisionError;
use crate::letterbox::RectF;

pub mod dense;
pub mod grid;

pub use dense::DenseDecoder;
pub use grid::GridDecoder;

/// One candidate extracted from the raw output tensor. The box is always
/// corner-form in padded (network input) pixel space, whatever layout the
/// tensor stored it in.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawDetection {
    pub class_id: usize,
    pub score: f32,
    pub rect: RectF,
}

/// Reads one raw output tensor layout. The implementation is selected once
/// at detector construction and bound for its lifetime; nothing in the
/// per-frame path inspects the tensor to guess its family.
pub trait OutputDecoder: Send {
    /// Check the tensor shape against the configured model parameters.
    ///
    /// Deliberately strict: a silent mismatch would misinterpret memory and
    /// produce garbage boxes without ever crashing.
    fn validate(&self, output: &ArrayViewD<'_, f32>) -> Result<(), VisionError>;

    /// Extract candidates above the configured thresholds.
    fn decode(&self, output: &ArrayViewD<'_, f32>, thresholds: &Thresholds) -> Vec<RawDetection>;
}
