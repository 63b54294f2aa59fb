use ndarray::ArrayD;

use crate::backend::InferenceBackend;
use crate::config::{self, DecoderKind, Thresholds, VisionConfig};
use crate::decoder::{DenseDecoder, GridDecoder, OutputDecoder};
use crate::letterbox::{Letterboxer, LetterboxGeometry, Rect, from_letterbox};
use crate::nms::{self, NmsMode};

/// Final per-frame detection in source-image pixel coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    /// Resolved from the label list; empty when the class id falls outside
    /// it.
    pub label: String,
    pub score: f32,
    pub rect: Rect,
}

/// Drives one frame through preprocess -> inference -> decode -> filter ->
/// coordinate remap. Call order per frame is `input`, `forward`, `parse`;
/// the stored geometry always belongs to the frame whose output is stored,
/// never to a newer one.
pub struct Detector<B: InferenceBackend> {
    backend: B,
    decoder: Box<dyn OutputDecoder>,
    labels: Vec<String>,
    nms_mode: NmsMode,
    letterboxer: Letterboxer,
    geometry: Option<LetterboxGeometry>,
    output: Option<ArrayD<f32>>,
}

impl<B: InferenceBackend> Detector<B> {
    /// Bind a loaded backend to its label list and decoder. Fails fast on an
    /// unreadable or empty label file; nothing per-frame can fix that.
    pub fn new(backend: B, config: &VisionConfig) -> anyhow::Result<Self> {
        let labels = config::load_labels(&config.labels_path)?;
        tracing::info!(
            labels = labels.len(),
            classes = config.class_count,
            decoder = ?config.decoder,
            "Detector constructed"
        );

        let decoder: Box<dyn OutputDecoder> = match config.decoder {
            DecoderKind::Dense => Box::new(DenseDecoder::new(config.class_count)),
            DecoderKind::Grid => Box::new(GridDecoder::new(
                config.class_count,
                config.input_size.0,
                config.input_size.1,
            )),
        };

        Ok(Self {
            backend,
            decoder,
            labels,
            nms_mode: config.nms_mode,
            letterboxer: Letterboxer::new(config.input_size, config.fill_color),
            geometry: None,
            output: None,
        })
    }

    /// Letterbox one RGB frame and stage it on the backend. Records the
    /// frame's geometry and drops any previous output so a stale tensor can
    /// never be remapped with the new frame's geometry.
    pub fn input(&mut self, pixels: &[u8], width: u32, height: u32) -> anyhow::Result<()> {
        let (tensor, geometry) = self.letterboxer.letterbox(pixels, width, height)?;
        self.backend.set_input(tensor)?;
        self.geometry = Some(geometry);
        self.output = None;
        Ok(())
    }

    /// Run the external inference engine synchronously. A backend failure is
    /// fatal for this frame; retrying belongs to the caller's frame loop.
    pub fn forward(&mut self) -> anyhow::Result<()> {
        self.output = Some(self.backend.forward()?);
        Ok(())
    }

    /// Decode, filter and remap the stored output into source-image
    /// detections.
    ///
    /// With no output recorded (skipped or failed frame) this logs and
    /// returns an empty list rather than erroring; a shape mismatch is an
    /// error that drops this frame's result only.
    pub fn parse(&self, thresholds: &Thresholds) -> anyhow::Result<Vec<Detection>> {
        let (Some(output), Some(geometry)) = (&self.output, &self.geometry) else {
            tracing::warn!("No inference output available to parse");
            return Ok(Vec::new());
        };

        let view = output.view();
        self.decoder.validate(&view)?;
        let raw = self.decoder.decode(&view, thresholds);

        let keep = nms::nms_indices(&raw, thresholds.nms, self.nms_mode);

        let mut detections = Vec::with_capacity(keep.len());
        for index in keep {
            let candidate = &raw[index];
            // Boxes collapsing to nothing at the image border are dropped
            // silently.
            let Some(rect) = from_letterbox(candidate.rect, geometry) else {
                continue;
            };

            detections.push(Detection {
                label: self.label_for(candidate.class_id),
                score: candidate.score,
                rect,
            });
        }

        tracing::trace!(
            candidates = raw.len(),
            kept = detections.len(),
            "Parsed detections"
        );

        Ok(detections)
    }

    fn label_for(&self, class_id: usize) -> String {
        match self.labels.get(class_id) {
            Some(label) => label.clone(),
            None => {
                tracing::warn!(class_id, "Class id outside label list");
                String::new()
            }
        }
    }
}
