//! OCR engine boundary
//!
//! An engine receives the preprocessed crop and returns the plain text plus a
//! word list. Word rectangles are in the coordinate space of the image the
//! engine was given; confidence is passed through exactly as the engine
//! reported it and is interpreted by the recognition pipeline.

use image::DynamicImage;
use std::path::PathBuf;
use thiserror::Error;

use crate::geometry::CropRect;

/// One word as reported by the engine
#[derive(Debug, Clone, PartialEq)]
pub struct RawToken {
    /// Recognized text, untrimmed
    pub text: String,
    /// Confidence in the engine's own notation (Tesseract: "-1", "0" .. "100")
    pub confidence: String,
    /// Word box in crop space
    pub rect: CropRect,
}

/// Everything the engine produced for one image
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EngineOutput {
    /// Plain text, untrimmed
    pub text: String,
    /// Word list for the same image
    pub tokens: Vec<RawToken>,
}

#[derive(Debug, Error)]
pub enum OcrError {
    #[error("failed to launch {}: {source}", .command.display())]
    Launch {
        command: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to hand image to the engine: {0}")]
    Input(String),
    #[error("tesseract failed: {0}")]
    Engine(String),
}

/// Text recognition backend
pub trait OcrEngine: Send + Sync {
    /// Recognize text and word boxes in one image
    fn recognize(&self, image: &DynamicImage) -> Result<EngineOutput, OcrError>;
}
