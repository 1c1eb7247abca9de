//! Raster data structures for still images and camera frames

use image::RgbaImage;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info};

use crate::error::ScanError;
use crate::geometry::{Size, SourceSpace};

/// File extensions accepted by Load Image
pub const SUPPORTED_IMAGE_FORMATS: [&str; 5] = ["jpg", "jpeg", "png", "bmp", "tiff"];

/// Where a raster came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameOrigin {
    /// Decoded from an image file
    File(PathBuf),
    /// Grabbed from a capture device
    Camera(u32),
    /// Built in memory
    Memory,
}

/// A decoded frame, either a still image or a camera frame
#[derive(Debug)]
pub struct Raster {
    /// RGBA pixel data
    pub image: RgbaImage,
    /// Origin of the pixels
    pub origin: FrameOrigin,
    /// When the frame was decoded or captured
    pub timestamp: Instant,
}

impl Raster {
    pub fn new(image: RgbaImage, origin: FrameOrigin) -> Self {
        Self {
            image,
            origin,
            timestamp: Instant::now(),
        }
    }

    pub fn from_camera(image: RgbaImage, device_index: u32) -> Self {
        Self::new(image, FrameOrigin::Camera(device_index))
    }

    /// Get frame dimensions as (width, height)
    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    /// Frame size in source space
    pub fn size(&self) -> Size<SourceSpace> {
        let (width, height) = self.dimensions();
        Size::new(width, height)
    }
}

/// Whether the path carries one of the accepted image extensions
pub fn is_supported_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            let ext = ext.to_ascii_lowercase();
            SUPPORTED_IMAGE_FORMATS.contains(&ext.as_str())
        })
        .unwrap_or(false)
}

/// Decode an image file into a raster
pub fn load_image(path: &Path) -> Result<Raster, ScanError> {
    let decode_failure = |reason: String| ScanError::DecodeFailure {
        path: path.display().to_string(),
        reason,
    };

    if !is_supported_image(path) {
        return Err(decode_failure(format!(
            "unsupported image format (expected one of: {})",
            SUPPORTED_IMAGE_FORMATS.join(", ")
        )));
    }

    debug!("Decoding image {:?}", path);
    let image = image::open(path).map_err(|e| decode_failure(e.to_string()))?;
    let image = image.to_rgba8();

    info!(
        "Loaded image {:?} ({}x{})",
        path,
        image.width(),
        image.height()
    );

    Ok(Raster::new(image, FrameOrigin::File(path.to_path_buf())))
}
