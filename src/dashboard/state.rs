//! Window-only state: widgets, the preview texture and the drag in progress

use std::path::PathBuf;

use crate::app::CommandInput;
use crate::selection::SelectionTracker;

/// State owned by the window rather than by the scanner
#[derive(Default)]
pub struct ScannerViewState {
    /// Contents of the image path field
    pub path_input: String,
    /// Device index field for Start Camera
    pub device_index: u32,
    /// Drag on the preview
    pub tracker: SelectionTracker,
    /// Uploaded preview image
    pub preview_texture: Option<egui::TextureHandle>,
    /// Scanner revision the texture was uploaded from
    pub texture_revision: Option<u64>,
}

impl ScannerViewState {
    pub fn new(path: Option<PathBuf>, device_index: u32) -> Self {
        Self {
            path_input: path
                .map(|p| p.display().to_string())
                .unwrap_or_default(),
            device_index,
            ..Self::default()
        }
    }

    /// Command input assembled from the widgets
    pub fn command_input(&self) -> CommandInput {
        let path = self.path_input.trim();
        CommandInput {
            path: (!path.is_empty()).then(|| PathBuf::from(path)),
            device_index: self.device_index,
        }
    }
}
