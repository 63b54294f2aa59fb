use std::cmp::Ordering;
use std::collections::BTreeMap;

use crate::decoder::RawDetection;
use crate::letterbox::RectF;

/// Whether suppression considers all classes together or runs independently
/// within each class partition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NmsMode {
    Agnostic,
    ClassAware,
}

/// Intersection-over-union of two axis-aligned rectangles. A zero-area
/// rectangle contributes nothing to the union beyond the other rectangle.
pub fn iou(a: &RectF, b: &RectF) -> f32 {
    let x1 = a.x.max(b.x);
    let y1 = a.y.max(b.y);
    let x2 = (a.x + a.width).min(b.x + b.width);
    let y2 = (a.y + a.height).min(b.y + b.height);

    let intersection = (x2 - x1).max(0.0) * (y2 - y1).max(0.0);
    let union = a.area() + b.area() - intersection;

    if union > 0.0 {
        intersection / union
    } else {
        0.0
    }
}

/// Greedy non-maximum suppression. Returns the indices of surviving
/// detections, ordered by descending score.
pub fn nms_indices(detections: &[RawDetection], iou_threshold: f32, mode: NmsMode) -> Vec<usize> {
    match mode {
        NmsMode::Agnostic => {
            let order: Vec<usize> = (0..detections.len()).collect();
            greedy(detections, order, iou_threshold)
        }
        NmsMode::ClassAware => {
            let mut partitions: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
            for (index, detection) in detections.iter().enumerate() {
                partitions.entry(detection.class_id).or_default().push(index);
            }

            let mut survivors: Vec<usize> = partitions
                .into_values()
                .flat_map(|order| greedy(detections, order, iou_threshold))
                .collect();
            // Keep output ordering identical across modes.
            survivors.sort_by(|&a, &b| rank(detections, a, b));
            survivors
        }
    }
}

fn greedy(detections: &[RawDetection], mut order: Vec<usize>, iou_threshold: f32) -> Vec<usize> {
    order.sort_by(|&a, &b| rank(detections, a, b));

    let mut suppressed = vec![false; order.len()];
    let mut keep = Vec::new();

    for i in 0..order.len() {
        if suppressed[i] {
            continue;
        }
        let best = order[i];
        keep.push(best);

        for j in (i + 1)..order.len() {
            if suppressed[j] {
                continue;
            }
            if iou(&detections[best].rect, &detections[order[j]].rect) > iou_threshold {
                suppressed[j] = true;
            }
        }
    }

    keep
}

/// Descending score; at equal score a positive-area box outranks a
/// zero-area one; remaining ties keep decode order (the sort is stable).
fn rank(detections: &[RawDetection], a: usize, b: usize) -> Ordering {
    let det_a = &detections[a];
    let det_b = &detections[b];

    det_b
        .score
        .partial_cmp(&det_a.score)
        .unwrap_or(Ordering::Equal)
        .then_with(|| (det_b.rect.area() > 0.0).cmp(&(det_a.rect.area() > 0.0)))
}
