use anyhow::Context;
use common::setup_logging;
use vision::backend::{InferenceBackend, ort::OrtBackend};
use vision::{Detector, VisionConfig};

fn main() -> anyhow::Result<()> {
    let config = VisionConfig::from_env()?;
    setup_logging(config.environment.clone());

    tracing::info!(
        config = ?config,
        "Loaded configuration"
    );

    let image_path = std::env::args()
        .nth(1)
        .context("Usage: detect <image-path>")?;

    tracing::info!("Loading inference model");
    let backend = OrtBackend::load_model(&config.model_path)?;
    let mut detector = Detector::new(backend, &config)?;

    let image = image::open(&image_path)
        .with_context(|| format!("Failed to read image {image_path}"))?
        .to_rgb8();
    let (width, height) = image.dimensions();

    detector.input(image.as_raw(), width, height)?;
    detector.forward()?;
    let detections = detector.parse(&config.thresholds)?;

    tracing::info!(count = detections.len(), "Frame processed");
    for detection in &detections {
        tracing::info!(
            label = %detection.label,
            score = detection.score,
            x = detection.rect.x,
            y = detection.rect.y,
            width = detection.rect.width,
            height = detection.rect.height,
            "Detection"
        );
    }

    Ok(())
}
