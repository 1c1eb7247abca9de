//! Scanner window entry point

use eframe::egui;
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

use crate::app::{self, Command, Services};
use crate::dashboard::components::render_toolbar;
use crate::dashboard::state::ScannerViewState;
use crate::dashboard::theme;
use crate::dashboard::views::{render_image_panel, render_text_panel};
use crate::shared::AppState;

/// How often to check on a running recognition
const RECOGNITION_POLL: Duration = Duration::from_millis(50);

/// What to do right after the window opens
#[derive(Debug, Clone, Default)]
pub struct Startup {
    /// Image to load
    pub image: Option<PathBuf>,
    /// Camera to start
    pub camera: Option<u32>,
}

/// The scanner window
pub struct ScannerApp {
    /// Scanner state, replaced wholesale by every command
    state: AppState,
    /// Handler collaborators
    services: Services,
    /// Window-only state
    view: ScannerViewState,
    /// Whether theme has been applied
    theme_applied: bool,
}

impl ScannerApp {
    pub fn new(services: Services, startup: Startup) -> Self {
        let device_index = startup
            .camera
            .unwrap_or(services.config.camera.device_index);
        let mut scanner = Self {
            state: AppState::default(),
            view: ScannerViewState::new(startup.image.clone(), device_index),
            services,
            theme_applied: false,
        };

        if startup.image.is_some() {
            scanner.run_command(Command::LoadImage);
        }
        if startup.camera.is_some() {
            scanner.run_command(Command::StartCamera);
        }
        scanner
    }

    /// Dispatch a command and apply its transition
    fn run_command(&mut self, command: Command) {
        let input = self.view.command_input();
        let state = std::mem::take(&mut self.state);
        self.state = app::dispatch(command, state, &mut self.services, &input).apply();
    }

    /// Drain camera frames and finished recognitions
    fn pump(&mut self) {
        if self.state.capture.is_streaming() {
            let state = std::mem::take(&mut self.state);
            self.state = app::on_frame_tick(state, &mut self.services).apply();
        }
        if let Some(outcome) = self.services.worker.try_collect() {
            let state = std::mem::take(&mut self.state);
            self.state = app::on_recognition(state, &mut self.services, outcome).apply();
        }
    }

    /// Load files dropped onto the window
    fn handle_dropped_files(&mut self, ctx: &egui::Context) {
        let dropped: Vec<PathBuf> = ctx.input(|i| {
            i.raw
                .dropped_files
                .iter()
                .filter_map(|file| file.path.clone())
                .collect()
        });
        if let Some(path) = dropped.into_iter().next() {
            info!("File dropped: {:?}", path);
            self.view.path_input = path.display().to_string();
            self.run_command(Command::LoadImage);
        }
    }

    fn shutdown(&mut self) {
        if self.services.frame_source.is_streaming() {
            info!("Releasing camera on close");
        }
        let state = std::mem::take(&mut self.state);
        self.state = app::shutdown(state, &mut self.services);
    }

    /// Create eframe options for the scanner window
    pub fn options(services: &Services) -> eframe::NativeOptions {
        let display = &services.config.display;
        // Room for the toolbar above and the text panel below the preview
        let width = display.width as f32 + 40.0;
        let height = display.height as f32 + 260.0;
        eframe::NativeOptions {
            viewport: egui::ViewportBuilder::default()
                .with_inner_size([width, height])
                .with_min_inner_size([640.0, 480.0])
                .with_drag_and_drop(true)
                .with_title("Text Scanner"),
            ..Default::default()
        }
    }
}

impl eframe::App for ScannerApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if !self.theme_applied {
            theme::apply_theme(ctx);
            self.theme_applied = true;
        }

        if ctx.input(|i| i.viewport().close_requested()) {
            self.shutdown();
        }

        self.handle_dropped_files(ctx);
        self.pump();

        if self.state.capture.is_streaming() {
            ctx.request_repaint_after(self.services.frame_source.poll_interval());
        } else if self.state.recognizing {
            ctx.request_repaint_after(RECOGNITION_POLL);
        }

        let mut clicked = None;
        egui::TopBottomPanel::top("toolbar").show(ctx, |ui| {
            ui.add_space(4.0);
            clicked = render_toolbar(ui, &mut self.view, &self.state);
            ui.add_space(2.0);
        });

        egui::TopBottomPanel::bottom("text_panel")
            .resizable(true)
            .default_height(180.0)
            .show(ctx, |ui| {
                render_text_panel(ui, &self.state);
            });

        let mut drag = None;
        egui::CentralPanel::default().show(ctx, |ui| {
            drag = render_image_panel(ui, &mut self.view, &self.state);
        });

        if let Some(drag) = drag {
            let state = std::mem::take(&mut self.state);
            self.state = app::record_drag(state, drag.rect, drag.display);
        }
        if let Some(command) = clicked {
            self.run_command(command);
        }
    }
}

impl Drop for ScannerApp {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Run the scanner window
pub fn run_scanner(services: Services, startup: Startup) -> Result<(), eframe::Error> {
    let options = ScannerApp::options(&services);
    let app = ScannerApp::new(services, startup);
    eframe::run_native(
        "Text Scanner",
        options,
        Box::new(|_cc| Ok(Box::new(app))),
    )
}
