//! Recognition Pipeline
//!
//! Takes a raster and an optional source-space selection, crops, binarizes,
//! hands the crop to the OCR engine and turns the engine's word list into
//! overlay boxes in source space.

pub mod ocr;
pub mod preprocess;
pub mod render;
pub mod tesseract;
pub mod worker;

use image::imageops;
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

use crate::capture::Raster;
use crate::error::ScanError;
use crate::geometry::{CropRect, Rect, SourceRect};

pub use ocr::{EngineOutput, OcrEngine, OcrError, RawToken};
pub use render::OverlayRenderer;
pub use tesseract::TesseractEngine;
pub use worker::{RecognitionOutcome, RecognitionWorker};

/// Text shown when the engine finds nothing
pub const NO_TEXT_SENTINEL: &str = "No text found.";

/// Words at or below this confidence are not drawn
pub const MIN_CONFIDENCE: f64 = 30.0;

/// A word that passed filtering, still in crop space
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub text: String,
    pub confidence: f64,
    pub rect: CropRect,
}

/// A word box in source space, ready for drawing
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OverlayBox {
    pub text: String,
    #[serde(flatten)]
    pub rect: SourceRect,
}

/// Result of one pipeline run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecognitionResult {
    /// Trimmed text, or the no-text sentinel
    pub text: String,
    /// Word boxes in source space
    pub overlays: Vec<OverlayBox>,
    /// Wall time of the run
    #[serde(skip)]
    pub elapsed_ms: u64,
}

/// Crop, preprocess, recognize and remap
pub struct RecognitionPipeline {
    engine: Arc<dyn OcrEngine>,
}

impl RecognitionPipeline {
    pub fn new(engine: Arc<dyn OcrEngine>) -> Self {
        Self { engine }
    }

    /// Run OCR on the raster, or on the selected part of it
    ///
    /// The raster is never modified; the crop is a copy.
    pub fn run(
        &self,
        raster: Option<&Raster>,
        selection: Option<SourceRect>,
    ) -> Result<RecognitionResult, ScanError> {
        let raster = raster.ok_or(ScanError::NoImage)?;
        let start = Instant::now();

        let crop = match selection {
            Some(sel) => {
                debug!("Cropping to selection {}", sel);
                imageops::crop_imm(&raster.image, sel.x, sel.y, sel.width, sel.height).to_image()
            }
            None => raster.image.clone(),
        };

        let prepared = preprocess::preprocess(&crop);
        let output = self.engine.recognize(&prepared)?;

        let text = normalize_text(&output.text);
        let overlays = filter_tokens(output.tokens)
            .into_iter()
            .map(|token| {
                let rect = to_source_space(token.rect, selection);
                debug!("Word {:?} at {} ({:.1})", token.text, rect, token.confidence);
                OverlayBox {
                    rect,
                    text: token.text,
                }
            })
            .collect::<Vec<_>>();

        let elapsed_ms = start.elapsed().as_millis() as u64;
        info!(
            "Recognized {} chars, {} overlays in {}ms",
            text.len(),
            overlays.len(),
            elapsed_ms
        );

        Ok(RecognitionResult {
            text,
            overlays,
            elapsed_ms,
        })
    }
}

/// Trim engine text, substituting the sentinel when nothing is left
pub fn normalize_text(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        NO_TEXT_SENTINEL.to_string()
    } else {
        trimmed.to_string()
    }
}

/// Keep words with a numeric confidence above the cutoff and non-blank text
pub fn filter_tokens(raw: Vec<RawToken>) -> Vec<Token> {
    raw.into_iter()
        .filter_map(|token| {
            let confidence: f64 = token.confidence.trim().parse().ok()?;
            if !confidence.is_finite() || confidence <= MIN_CONFIDENCE {
                return None;
            }
            let text = token.text.trim();
            if text.is_empty() {
                return None;
            }
            Some(Token {
                text: text.to_string(),
                confidence,
                rect: token.rect,
            })
        })
        .collect()
}

/// Move a crop-space rectangle into source space
///
/// With a selection the crop starts at the selection's corner; without one the
/// crop is the whole raster and the two spaces coincide.
pub fn to_source_space(rect: CropRect, selection: Option<SourceRect>) -> SourceRect {
    let (dx, dy) = selection.map(|sel| (sel.x, sel.y)).unwrap_or((0, 0));
    Rect::new(
        rect.x.saturating_add(dx),
        rect.y.saturating_add(dy),
        rect.width,
        rect.height,
    )
}
