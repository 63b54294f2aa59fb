use std::env;
use std::fs;

use anyhow::Context;

pub use common::Environment;

use crate::error::VisionError;
use crate::nms::NmsMode;

/// Which raw-output tensor layout the bound model produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecoderKind {
    /// `[1, N, class_count + 5]` rows with an objectness channel.
    Dense,
    /// `[1, class_count + 4, L]` channel-major, anchor-free.
    Grid,
}

/// Per-call filtering parameters.
#[derive(Debug, Clone, Copy)]
pub struct Thresholds {
    /// Minimum confidence (objectness folded in where the layout has one).
    pub score: f32,
    /// IoU above which two boxes of the considered class are duplicates.
    pub nms: f32,
    /// Minimum raw objectness before a candidate is even scored. Only
    /// meaningful for the dense layout; ignored otherwise.
    pub objectness: f32,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            score: 0.5,
            nms: 0.45,
            objectness: 0.0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct VisionConfig {
    pub environment: Environment,
    pub model_path: String,
    pub labels_path: String,
    pub input_size: (u32, u32),
    pub class_count: usize,
    pub decoder: DecoderKind,
    pub nms_mode: NmsMode,
    pub fill_color: [u8; 3],
    pub thresholds: Thresholds,
}

impl VisionConfig {
    /// Load configuration from environment variables with sensible defaults
    pub fn from_env() -> anyhow::Result<Self> {
        let environment = Environment::from_env();

        let model_path = env::var("MODEL_PATH").unwrap_or_else(|_| "models/model.onnx".to_string());
        let labels_path =
            env::var("LABELS_PATH").unwrap_or_else(|_| "models/labels.txt".to_string());

        let input_width = env::var("INPUT_WIDTH")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(640);

        let input_height = env::var("INPUT_HEIGHT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(640);

        let class_count = env::var("CLASS_COUNT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(80);

        let decoder = match env::var("DECODER").as_deref() {
            Ok("grid") => DecoderKind::Grid,
            Ok("dense") | Err(_) => DecoderKind::Dense,
            Ok(other) => anyhow::bail!("Unknown DECODER value: {other} (expected dense or grid)"),
        };

        let nms_mode = match env::var("NMS_MODE").as_deref() {
            Ok("class_aware") => NmsMode::ClassAware,
            _ => NmsMode::Agnostic,
        };

        let fill_color = match env::var("LETTERBOX_COLOR") {
            Ok(value) => parse_fill_color(&value)?,
            Err(_) => [114, 114, 114],
        };

        let thresholds = Thresholds {
            score: env::var("SCORE_THRESHOLD")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(0.5),
            nms: env::var("NMS_THRESHOLD")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(0.45),
            objectness: env::var("OBJECTNESS_THRESHOLD")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(0.0),
        };

        Ok(Self {
            environment,
            model_path,
            labels_path,
            input_size: (input_width, input_height),
            class_count,
            decoder,
            nms_mode,
            fill_color,
            thresholds,
        })
    }

    /// Create default configuration for testing
    #[cfg(test)]
    pub fn test_default() -> Self {
        Self {
            environment: Environment::Development,
            model_path: "/models/model.onnx".to_string(),
            labels_path: "/models/labels.txt".to_string(),
            input_size: (640, 640),
            class_count: 80,
            decoder: DecoderKind::Dense,
            nms_mode: NmsMode::Agnostic,
            fill_color: [114, 114, 114],
            thresholds: Thresholds::default(),
        }
    }
}

fn parse_fill_color(value: &str) -> anyhow::Result<[u8; 3]> {
    let channels: Vec<u8> = value
        .split(',')
        .map(|part| part.trim().parse::<u8>())
        .collect::<Result<_, _>>()
        .with_context(|| format!("Invalid LETTERBOX_COLOR: {value}"))?;

    match channels.as_slice() {
        &[r, g, b] => Ok([r, g, b]),
        _ => anyhow::bail!("LETTERBOX_COLOR needs exactly 3 channels, got {value}"),
    }
}

/// Load the label list: one label per non-empty line. An empty or missing
/// file is a construction-time configuration error, not a per-frame one.
pub fn load_labels(path: &str) -> Result<Vec<String>, VisionError> {
    let contents = fs::read_to_string(path)?;

    let labels: Vec<String> = contents
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| line.trim().to_string())
        .collect();

    if labels.is_empty() {
        return Err(VisionError::Config(format!(
            "label file {path} contains no labels"
        )));
    }

    Ok(labels)
}
