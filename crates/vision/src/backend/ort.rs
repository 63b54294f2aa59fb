use ndarray::{Array, ArrayD, IxDyn};
use ort::{
    session::{Session, builder::GraphOptimizationLevel},
    value::TensorRef,
};

use super::InferenceBackend;

pub struct OrtBackend {
    session: Session,
    input: Option<Array<f32, IxDyn>>,
}

impl InferenceBackend for OrtBackend {
    fn load_model(path: &str) -> anyhow::Result<Self> {
        // Initialize ORT environment (idempotent)
        let _ = ort::init().commit();

        let session = Session::builder()?
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .with_intra_threads(4)?
            .commit_from_file(path)?;

        tracing::info!("Model loaded from {}", path);
        Ok(Self {
            session,
            input: None,
        })
    }

    fn set_input(&mut self, tensor: Array<f32, IxDyn>) -> anyhow::Result<()> {
        self.input = Some(tensor);
        Ok(())
    }

    fn forward(&mut self) -> anyhow::Result<ArrayD<f32>> {
        let input = self
            .input
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("No input staged for forward pass"))?;

        let outputs = self
            .session
            .run(ort::inputs![TensorRef::from_array_view(input.view())?])?;

        let output = outputs[0].try_extract_array::<f32>()?;
        Ok(output.into_owned())
    }
}
