use ndarray::ArrayViewD;

use super::{OutputDecoder, RawDetection};
use crate::config::Thresholds;
use crate::error::VisionError;
use crate::letterbox::RectF;

/// Channels 0..4 carry (cx, cy, w, h); class scores follow.
const BOX_CHANNELS: usize = 4;

/// Downsampling strides of the detection heads feeding the flattened
/// location axis.
const STRIDES: [u32; 3] = [8, 16, 32];

/// Grid (anchor-free) layout: `[1, class_count + 4, L]`, channel-major,
/// where `L` sums the spatial locations of every detection scale. There is
/// no objectness channel; the raw per-class score stands alone.
pub struct GridDecoder {
    class_count: usize,
    locations: usize,
}

impl GridDecoder {
    pub fn new(class_count: usize, input_w: u32, input_h: u32) -> Self {
        let locations = STRIDES
            .iter()
            .map(|stride| ((input_w / stride) * (input_h / stride)) as usize)
            .sum();
        Self {
            class_count,
            locations,
        }
    }

    fn channels(&self) -> usize {
        self.class_count + BOX_CHANNELS
    }
}

impl OutputDecoder for GridDecoder {
    fn validate(&self, output: &ArrayViewD<'_, f32>) -> Result<(), VisionError> {
        let shape = output.shape();
        if shape.len() != 3
            || shape[0] != 1
            || shape[1] != self.channels()
            || shape[2] != self.locations
        {
            return Err(VisionError::ShapeMismatch {
                expected: format!("[1, {}, {}]", self.channels(), self.locations),
                actual: format!("{:?}", shape),
            });
        }
        Ok(())
    }

    fn decode(&self, output: &ArrayViewD<'_, f32>, thresholds: &Thresholds) -> Vec<RawDetection> {
        let mut detections = Vec::new();

        for i in 0..self.locations {
            let mut best_score = 0.0f32;
            let mut best_class = 0usize;
            for c in 0..self.class_count {
                let class_score = output[[0, BOX_CHANNELS + c, i]];
                if class_score > best_score {
                    best_score = class_score;
                    best_class = c;
                }
            }

            // Compared against the same threshold the dense layout uses for
            // its combined objectness*class score; there is no objectness
            // here to fold in. Known calibration difference between the two
            // detector families, kept to match their reference outputs.
            if best_score < thresholds.score {
                continue;
            }

            let cx = output[[0, 0, i]];
            let cy = output[[0, 1, i]];
            let w = output[[0, 2, i]];
            let h = output[[0, 3, i]];

            detections.push(RawDetection {
                class_id: best_class,
                score: best_score,
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

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{Array, IxDyn};

    // Small geometry keeps the fixtures readable: 64x64 input gives
    // 8x8 + 4x4 + 2x2 = 84 locations.
    const CLASS_COUNT: usize = 4;
    const INPUT: u32 = 64;
    const LOCATIONS: usize = 84;

    fn thresholds() -> Thresholds {
        Thresholds {
            score: 0.5,
            nms: 0.45,
            objectness: 0.0,
        }
    }

    fn grid_tensor(entries: &[(usize, f32, f32, f32, f32, usize, f32)]) -> Array<f32, IxDyn> {
        // entries: (location, cx, cy, w, h, class_id, score)
        let channels = CLASS_COUNT + 4;
        let mut data = vec![0.0f32; channels * LOCATIONS];
        for &(location, cx, cy, w, h, class_id, score) in entries {
            data[location] = cx;
            data[LOCATIONS + location] = cy;
            data[2 * LOCATIONS + location] = w;
            data[3 * LOCATIONS + location] = h;
            data[(4 + class_id) * LOCATIONS + location] = score;
        }
        Array::from_shape_vec(IxDyn(&[1, channels, LOCATIONS]), data).unwrap()
    }

    #[test]
    fn test_validate_accepts_configured_shape() {
        let decoder = GridDecoder::new(CLASS_COUNT, INPUT, INPUT);
        let tensor = grid_tensor(&[]);
        assert!(decoder.validate(&tensor.view()).is_ok());
    }

    #[test]
    fn test_validate_rejects_wrong_channel_count() {
        let decoder = GridDecoder::new(CLASS_COUNT, INPUT, INPUT);
        let channels = CLASS_COUNT + 3; // one short
        let tensor =
            Array::from_shape_vec(IxDyn(&[1, channels, LOCATIONS]), vec![0.0; channels * LOCATIONS])
                .unwrap();

        let err = decoder.validate(&tensor.view()).unwrap_err();
        assert!(
            matches!(err, VisionError::ShapeMismatch { .. }),
            "Channel mismatch must fail validation, got {err:?}"
        );
    }

    #[test]
    fn test_validate_rejects_wrong_location_count() {
        let decoder = GridDecoder::new(CLASS_COUNT, INPUT, INPUT);
        let channels = CLASS_COUNT + 4;
        let tensor = Array::from_shape_vec(
            IxDyn(&[1, channels, LOCATIONS + 1]),
            vec![0.0; channels * (LOCATIONS + 1)],
        )
        .unwrap();

        assert!(decoder.validate(&tensor.view()).is_err());
    }

    #[test]
    fn test_decode_reads_channel_major_layout() {
        let decoder = GridDecoder::new(CLASS_COUNT, INPUT, INPUT);
        let tensor = grid_tensor(&[(17, 32.0, 40.0, 16.0, 20.0, 2, 0.9)]);

        let detections = decoder.decode(&tensor.view(), &thresholds());

        assert_eq!(detections.len(), 1);
        assert_eq!(detections[0].class_id, 2);
        assert_eq!(detections[0].score, 0.9);
        assert_eq!(
            detections[0].rect,
            RectF {
                x: 24.0,
                y: 30.0,
                width: 16.0,
                height: 20.0
            }
        );
    }

    #[test]
    fn test_decode_applies_raw_score_threshold() {
        let decoder = GridDecoder::new(CLASS_COUNT, INPUT, INPUT);
        let tensor = grid_tensor(&[
            (3, 10.0, 10.0, 4.0, 4.0, 0, 0.45),
            (9, 20.0, 20.0, 4.0, 4.0, 1, 0.55),
        ]);

        let detections = decoder.decode(&tensor.view(), &thresholds());
        assert_eq!(detections.len(), 1);
        assert_eq!(detections[0].class_id, 1);
    }
}
