use ndarray::{Array, ArrayD, IxDyn};

#[cfg(feature = "ort-backend")]
pub mod ort;

/// The external inference engine, consumed as an opaque black box: it takes
/// the preprocessed input tensor and hands back one dense float output
/// tensor with an explicit 3-dimensional shape.
///
/// `forward` blocks for the duration of the call; there is no cancellation
/// and no timeout at this layer.
pub trait InferenceBackend {
    fn load_model(path: &str) -> anyhow::Result<Self>
    where
        Self: Sized;

    /// Stage the preprocessed input tensor for the next forward pass.
    fn set_input(&mut self, tensor: Array<f32, IxDyn>) -> anyhow::Result<()>;

    /// Run inference synchronously over the staged input.
    fn forward(&mut self) -> anyhow::Result<ArrayD<f32>>;
}
