//! Command surface
//!
//! Every user control maps to one row of `COMMANDS`. A handler takes the
//! current state and returns the next one together with what the text panel
//! should show. The window renders one button per row and applies the result;
//! it never changes scanner state on its own.

use std::path::PathBuf;
use std::sync::Arc;
use tokio::runtime::Handle;
use tracing::{debug, info, warn};

use crate::capture::{self, CameraBackend, FrameSource};
use crate::config::AppConfig;
use crate::error::ScanError;
use crate::geometry::{DisplayRect, DisplaySpace, Size};
use crate::selection::SelectionTracker;
use crate::shared::{AppState, PendingDrag};
use crate::vision::{
    OcrEngine, OverlayRenderer, RecognitionOutcome, RecognitionPipeline, RecognitionWorker,
};

/// User controls
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    LoadImage,
    SelectRoi,
    RunOcr,
    StartCamera,
    StopCamera,
}

/// What the text panel does after a command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive {
    /// Replace the panel with a result
    ShowText(String),
    /// Replace the panel with an error message
    ShowError(String),
    /// Leave the panel alone
    Keep,
}

impl From<ScanError> for Directive {
    fn from(err: ScanError) -> Self {
        Directive::ShowError(err.to_string())
    }
}

/// Result of a handler
#[derive(Debug, Clone)]
pub struct Transition {
    pub state: AppState,
    pub directive: Directive,
}

impl Transition {
    pub fn keep(state: AppState) -> Self {
        Self {
            state,
            directive: Directive::Keep,
        }
    }

    pub fn text(state: AppState, text: impl Into<String>) -> Self {
        Self {
            state,
            directive: Directive::ShowText(text.into()),
        }
    }

    pub fn error(state: AppState, err: ScanError) -> Self {
        warn!("{}", err);
        Self {
            state,
            directive: err.into(),
        }
    }

    /// Fold the directive into the state
    pub fn apply(self) -> AppState {
        let mut state = self.state;
        match self.directive {
            Directive::ShowText(text) => {
                state.text = text;
                state.text_is_error = false;
            }
            Directive::ShowError(message) => {
                state.text = message;
                state.text_is_error = true;
            }
            Directive::Keep => {}
        }
        state
    }
}

/// Inputs that come from widgets rather than from state
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandInput {
    /// Image path typed, dropped or passed on the command line
    pub path: Option<PathBuf>,
    /// Capture device for Start Camera
    pub device_index: u32,
}

/// Long-lived collaborators of the handlers
pub struct Services {
    pub config: AppConfig,
    pub frame_source: FrameSource,
    pub worker: RecognitionWorker,
    pub renderer: OverlayRenderer,
}

impl Services {
    pub fn new(
        config: AppConfig,
        runtime: Handle,
        engine: Arc<dyn OcrEngine>,
        backend: Arc<dyn CameraBackend>,
    ) -> Self {
        let pipeline = RecognitionPipeline::new(engine);
        Self {
            frame_source: FrameSource::new(backend, config.camera.clone(), runtime.clone()),
            worker: RecognitionWorker::new(Arc::new(pipeline), runtime),
            renderer: OverlayRenderer::new(&config.overlay),
            config,
        }
    }
}

pub type Handler = fn(AppState, &mut Services, &CommandInput) -> Transition;

/// One toolbar button
pub struct CommandEntry {
    pub command: Command,
    pub label: &'static str,
    pub tooltip: &'static str,
    pub handler: Handler,
}

pub const COMMANDS: &[CommandEntry] = &[
    CommandEntry {
        command: Command::LoadImage,
        label: "Load Image",
        tooltip: "Open the image at the given path (jpg, jpeg, png, bmp, tiff)",
        handler: load_image,
    },
    CommandEntry {
        command: Command::SelectRoi,
        label: "Select ROI",
        tooltip: "Use the last drag on the image as the region to read",
        handler: select_roi,
    },
    CommandEntry {
        command: Command::RunOcr,
        label: "Run OCR",
        tooltip: "Read text from the selected region, or the whole image",
        handler: run_ocr,
    },
    CommandEntry {
        command: Command::StartCamera,
        label: "Start Camera",
        tooltip: "Stream frames from the capture device",
        handler: start_camera,
    },
    CommandEntry {
        command: Command::StopCamera,
        label: "Stop Camera",
        tooltip: "Stop streaming and release the capture device",
        handler: stop_camera,
    },
];

impl Command {
    /// Table row of this command
    pub fn entry(self) -> Option<&'static CommandEntry> {
        COMMANDS.iter().find(|entry| entry.command == self)
    }

    /// Whether the button is clickable in this state
    pub fn is_enabled(self, state: &AppState, input: &CommandInput) -> bool {
        match self {
            Command::LoadImage => input.path.is_some(),
            Command::SelectRoi => true,
            Command::RunOcr => !state.recognizing,
            Command::StartCamera => !state.capture.is_streaming(),
            Command::StopCamera => state.capture.is_streaming(),
        }
    }
}

/// Run a command through its table row
pub fn dispatch(
    command: Command,
    state: AppState,
    services: &mut Services,
    input: &CommandInput,
) -> Transition {
    match command.entry() {
        Some(entry) => {
            debug!("Dispatching {:?}", command);
            (entry.handler)(state, services, input)
        }
        None => Transition::keep(state),
    }
}

fn load_image(mut state: AppState, services: &mut Services, input: &CommandInput) -> Transition {
    let Some(path) = input.path.as_deref() else {
        debug!("Load Image without a path");
        return Transition::keep(state);
    };

    if state.capture.is_streaming() {
        info!("Stopping camera before loading {:?}", path);
        state.capture = services.frame_source.stop();
    }

    match capture::load_image(path) {
        Ok(raster) => {
            let (width, height) = raster.dimensions();
            state.set_raster(Arc::new(raster));
            state.selection = None;
            state.pending_drag = None;
            state.set_status(format!("{} ({}x{})", path.display(), width, height));
            Transition::keep(state)
        }
        Err(err) => {
            state.clear_raster();
            state.clear_status();
            Transition::error(state, err)
        }
    }
}

fn select_roi(mut state: AppState, _: &mut Services, _: &CommandInput) -> Transition {
    let source = state.raster.as_ref().map(|raster| raster.size());
    let (Some(source), Some(drag)) = (source, state.pending_drag) else {
        return Transition::error(state, ScanError::NoSelection);
    };

    match SelectionTracker::resolve(drag.rect, drag.display, source) {
        Ok(selection) => {
            info!("ROI set: {}", selection);
            state.selection = Some(selection);
            Transition::text(state, format!("ROI set: {}", selection))
        }
        Err(err) => Transition::error(state, err),
    }
}

fn run_ocr(mut state: AppState, services: &mut Services, _: &CommandInput) -> Transition {
    match services.worker.submit(state.raster.clone(), state.selection) {
        Ok(()) => {
            state.recognizing = true;
            state.set_status("Recognizing...");
            Transition::keep(state)
        }
        Err(err) => {
            if err == ScanError::NoImage {
                state.overlays.clear();
                state.annotated = None;
            }
            Transition::error(state, err)
        }
    }
}

fn start_camera(mut state: AppState, services: &mut Services, input: &CommandInput) -> Transition {
    let was_streaming = services.frame_source.is_streaming();
    match services.frame_source.start(input.device_index) {
        Ok(capture) => {
            state.capture = capture;
            if !was_streaming {
                state.selection = None;
                state.pending_drag = None;
                state.overlays.clear();
                state.annotated = None;
                state.set_status(format!("Camera {} streaming", input.device_index));
            }
            Transition::keep(state)
        }
        Err(err) => {
            state.capture = services.frame_source.state();
            Transition::error(state, err)
        }
    }
}

fn stop_camera(mut state: AppState, services: &mut Services, _: &CommandInput) -> Transition {
    state.capture = services.frame_source.stop();
    state.set_status("Camera stopped");
    Transition::keep(state)
}

/// Take the newest camera frame as the current raster
pub fn on_frame_tick(mut state: AppState, services: &mut Services) -> Transition {
    match services.frame_source.poll() {
        Ok(Some(raster)) => {
            if let Some(selection) = state.selection {
                if !selection.fits_within(raster.size()) {
                    debug!("Frame size changed, dropping ROI {}", selection);
                    state.selection = None;
                }
            }
            state.set_raster(raster);
            Transition::keep(state)
        }
        Ok(None) => Transition::keep(state),
        Err(err) => {
            state.capture = services.frame_source.state();
            state.clear_status();
            Transition::error(state, err)
        }
    }
}

/// Apply a finished recognition job
pub fn on_recognition(
    mut state: AppState,
    services: &mut Services,
    outcome: RecognitionOutcome,
) -> Transition {
    state.recognizing = false;
    state.clear_status();

    let current = state
        .raster
        .as_ref()
        .is_some_and(|raster| Arc::ptr_eq(raster, &outcome.raster));
    if !current && !state.capture.is_streaming() {
        match &outcome.result {
            Ok(_) => debug!("Image replaced during recognition, discarding result"),
            Err(err) => warn!("Discarding failed recognition of a replaced image: {}", err),
        }
        state.set_status("Discarded OCR result for a replaced image");
        return Transition::keep(state);
    }

    let result = match outcome.result {
        Ok(result) => result,
        Err(err) => return Transition::error(state, err),
    };
    debug!(
        "Recognized {:?} frame, {}ms after capture",
        outcome.raster.origin,
        outcome.raster.timestamp.elapsed().as_millis()
    );

    let annotated = services.renderer.render(&outcome.raster.image, &result.overlays);
    state.set_annotated(result.overlays, annotated);

    if services.config.output.save_text {
        let path = &services.config.output.text_file;
        match std::fs::write(path, &result.text) {
            Ok(()) => {
                info!("Saved text to {:?}", path);
                state.set_status(format!("Saved to {}", path.display()));
            }
            Err(e) => {
                warn!("Failed to save text to {:?}: {}", path, e);
                state.set_status(format!("Could not save text to {}: {}", path.display(), e));
            }
        }
    }

    Transition::text(state, result.text)
}

/// Remember a finished drag for the next Select ROI
pub fn record_drag(mut state: AppState, rect: DisplayRect, display: Size<DisplaySpace>) -> AppState {
    state.pending_drag = Some(PendingDrag { rect, display });
    state
}

/// Release the camera; used on window close
pub fn shutdown(mut state: AppState, services: &mut Services) -> AppState {
    state.capture = services.frame_source.stop();
    state
}
