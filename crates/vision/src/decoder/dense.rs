use ndarray::ArrayViewD;

use super::{OutputDecoder, RawDetection};
use crate::config::Thresholds;
use crate::error::VisionError;
use crate::letterbox::RectF;

/// Box parameters plus one objectness channel precede the class scores.
const BOX_AND_OBJECTNESS: usize = 5;

/// Dense-anchor layout: `[1, N, class_count + 5]`, one row per candidate
/// location holding (cx, cy, w, h, objectness, class scores...).
pub struct DenseDecoder {
    class_count: usize,
}

impl DenseDecoder {
    pub fn new(class_count: usize) -> Self {
        Self { class_count }
    }

    fn attributes(&self) -> usize {
        self.class_count + BOX_AND_OBJECTNESS
    }
}

impl OutputDecoder for DenseDecoder {
    fn validate(&self, output: &ArrayViewD<'_, f32>) -> Result<(), VisionError> {
        let shape = output.shape();
        if shape.len() != 3 || shape[0] != 1 || shape[2] != self.attributes() {
            return Err(VisionError::ShapeMismatch {
                expected: format!("[1, N, {}]", self.attributes()),
                actual: format!("{:?}", shape),
            });
        }
        Ok(())
    }

    fn decode(&self, output: &ArrayViewD<'_, f32>, thresholds: &Thresholds) -> Vec<RawDetection> {
        let rows = output.shape()[1];
        let mut detections = Vec::new();

        for i in 0..rows {
            // Scanning every class score is the expensive part; the
            // objectness check skips most rows before it.
            let objectness = output[[0, i, 4]];
            if objectness < thresholds.objectness {
                continue;
            }

            let mut best_score = 0.0f32;
            let mut best_class = 0usize;
            for c in 0..self.class_count {
                let class_score = output[[0, i, BOX_AND_OBJECTNESS + c]];
                if class_score > best_score {
                    best_score = class_score;
                    best_class = c;
                }
            }

            let score = objectness * best_score;
            if score < thresholds.score {
                continue;
            }

            let cx = output[[0, i, 0]];
            let cy = output[[0, i, 1]];
            let w = output[[0, i, 2]];
            let h = output[[0, i, 3]];

            detections.push(RawDetection {
                class_id: best_class,
                score,
                rect: RectF {
                    x: cx - w / 2.0,
                    y: cy - h / 2.0,
                    width: w,
                    height: h,
                },
            });
        }

        detections
    }
}
