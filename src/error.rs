//! Failure taxonomy shared by every scanner operation
//!
//! The `Display` text of each variant is what the text panel shows, so the
//! messages are written for the user rather than for logs.

use thiserror::Error;

use crate::vision::ocr::OcrError;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScanError {
    /// An operation needed a raster and none is loaded
    #[error("Error: Please load an image first.")]
    NoImage,

    /// Select ROI without a usable drag
    #[error("No ROI selected. Drag on image to select a region.")]
    NoSelection,

    /// The capture device could not be opened
    #[error("Error: Cannot open camera {index}: {reason}")]
    DeviceUnavailable { index: u32, reason: String },

    /// A poll tick failed to obtain a frame
    #[error("Error: Cannot read from camera: {0}")]
    CaptureReadFailure(String),

    /// The OCR engine reported an error
    #[error("OCR engine error: {0}")]
    EngineFailure(String),

    /// An image file could not be decoded
    #[error("Error: Could not load image {path}: {reason}")]
    DecodeFailure { path: String, reason: String },

    /// A recognition request arrived while another one is still running
    #[error("Recognition already in progress.")]
    Busy,
}

impl From<OcrError> for ScanError {
    fn from(err: OcrError) -> Self {
        ScanError::EngineFailure(err.to_string())
    }
}
