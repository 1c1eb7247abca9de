//! Headless scan: one image in, text or JSON out

use std::path::Path;
use std::sync::Arc;
use tracing::info;

use crate::capture::load_image;
use crate::error::ScanError;
use crate::geometry::{Rect, SourceRect};
use crate::vision::{OcrEngine, RecognitionPipeline, RecognitionResult};

/// Output flavor of a headless scan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScanFormat {
    #[default]
    Text,
    Json,
}

/// Parse `X,Y,W,H` into a source-space rectangle
pub fn parse_roi(value: &str) -> Result<SourceRect, String> {
    let parts = value
        .split(',')
        .map(|part| part.trim().parse::<u32>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| format!("invalid ROI '{}': {}", value, e))?;

    match parts.as_slice() {
        &[x, y, width, height] => Ok(Rect::new(x, y, width, height)),
        _ => Err(format!("invalid ROI '{}': expected X,Y,W,H", value)),
    }
}

/// Decode an image and recognize it, or the ROI within it
pub fn scan(
    engine: Arc<dyn OcrEngine>,
    image: &Path,
    roi: Option<SourceRect>,
) -> Result<RecognitionResult, ScanError> {
    let raster = load_image(image)?;

    if let Some(roi) = roi {
        if roi.is_empty() || !roi.fits_within(raster.size()) {
            return Err(ScanError::NoSelection);
        }
    }

    let pipeline = RecognitionPipeline::new(engine);
    let result = pipeline.run(Some(&raster), roi)?;
    info!(
        "Scanned {:?}: {} overlays in {}ms",
        image,
        result.overlays.len(),
        result.elapsed_ms
    );

    Ok(result)
}

/// Render a result for stdout or a file
pub fn render(result: &RecognitionResult, format: ScanFormat) -> serde_json::Result<String> {
    match format {
        ScanFormat::Text => Ok(result.text.clone()),
        ScanFormat::Json => serde_json::to_string_pretty(result),
    }
}
