//! Scanner state shared by the command handlers and the window

use image::RgbaImage;
use std::sync::Arc;

use crate::capture::{CaptureState, Raster};
use crate::geometry::{DisplayRect, DisplaySpace, Size, SourceRect};
use crate::vision::OverlayBox;

/// A finished drag on the preview, waiting for Select ROI
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingDrag {
    /// Dragged rectangle, relative to the preview's top-left corner
    pub rect: DisplayRect,
    /// Size of the preview when the drag was made
    pub display: Size<DisplaySpace>,
}

/// Everything the scanner knows between two UI events
#[derive(Debug, Clone, Default)]
pub struct AppState {
    /// Current raster: the loaded image or the newest camera frame
    pub raster: Option<Arc<Raster>>,
    /// Region of interest in source space
    pub selection: Option<SourceRect>,
    /// Last drag on the preview
    pub pending_drag: Option<PendingDrag>,
    /// Word boxes of the last recognition
    pub overlays: Vec<OverlayBox>,
    /// Raster with the overlays drawn in, shown instead of `raster` when set
    pub annotated: Option<Arc<RgbaImage>>,
    /// Live-mode state
    pub capture: CaptureState,
    /// Whether a recognition job is in flight
    pub recognizing: bool,
    /// Text panel contents
    pub text: String,
    /// Whether `text` is an error message
    pub text_is_error: bool,
    /// One-line status under the toolbar
    pub status: Option<String>,
    /// Bumped whenever the displayed image changes
    pub revision: u64,
}

impl AppState {
    /// Image the preview should show
    pub fn displayed_image(&self) -> Option<&RgbaImage> {
        match (&self.annotated, &self.raster) {
            (Some(annotated), _) => Some(annotated.as_ref()),
            (None, Some(raster)) => Some(&raster.image),
            (None, None) => None,
        }
    }

    /// Replace the raster; stale overlays go with the old one
    pub fn set_raster(&mut self, raster: Arc<Raster>) {
        self.raster = Some(raster);
        self.overlays.clear();
        self.annotated = None;
        self.revision += 1;
    }

    /// Forget the raster together with everything derived from it
    pub fn clear_raster(&mut self) {
        self.raster = None;
        self.selection = None;
        self.pending_drag = None;
        self.overlays.clear();
        self.annotated = None;
        self.revision += 1;
    }

    /// Show a recognition's overlays drawn onto its raster
    pub fn set_annotated(&mut self, overlays: Vec<OverlayBox>, annotated: RgbaImage) {
        self.overlays = overlays;
        self.annotated = Some(Arc::new(annotated));
        self.revision += 1;
    }

    /// Set an informational status line
    pub fn set_status(&mut self, status: impl Into<String>) {
        self.status = Some(status.into());
    }

    /// Clear the status line
    pub fn clear_status(&mut self) {
        self.status = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::FrameOrigin;
    use crate::geometry::Rect;

    fn raster(width: u32, height: u32) -> Arc<Raster> {
        Arc::new(Raster::new(
            RgbaImage::new(width, height),
            FrameOrigin::Memory,
        ))
    }

    #[test]
    fn test_default_is_empty() {
        let state = AppState::default();
        assert!(state.raster.is_none());
        assert!(state.selection.is_none());
        assert!(state.displayed_image().is_none());
        assert!(!state.capture.is_streaming());
    }

    #[test]
    fn test_set_raster_drops_overlays_keeps_selection() {
        let mut state = AppState::default();
        state.set_raster(raster(10, 10));
        state.selection = Some(Rect::new(1, 1, 2, 2));
        state.set_annotated(
            vec![OverlayBox {
                text: "a".to_string(),
                rect: Rect::new(0, 0, 1, 1),
            }],
            RgbaImage::new(10, 10),
        );
        let before = state.revision;

        state.set_raster(raster(10, 10));

        assert!(state.overlays.is_empty());
        assert!(state.annotated.is_none());
        assert_eq!(state.selection, Some(Rect::new(1, 1, 2, 2)));
        assert!(state.revision > before);
    }

    #[test]
    fn test_displayed_image_prefers_annotated() {
        let mut state = AppState::default();
        state.set_raster(raster(4, 4));
        assert_eq!(state.displayed_image().map(|i| i.dimensions()), Some((4, 4)));

        state.set_annotated(Vec::new(), RgbaImage::new(2, 2));
        assert_eq!(state.displayed_image().map(|i| i.dimensions()), Some((2, 2)));
    }

    #[test]
    fn test_clear_raster_resets_selection() {
        let mut state = AppState::default();
        state.set_raster(raster(4, 4));
        state.selection = Some(Rect::new(0, 0, 1, 1));

        state.clear_raster();

        assert!(state.raster.is_none());
        assert!(state.selection.is_none());
        assert!(state.pending_drag.is_none());
    }
}
