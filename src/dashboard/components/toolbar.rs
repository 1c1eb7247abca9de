//! Toolbar: image path, camera device and one button per command

use egui::RichText;

use crate::app::{Command, COMMANDS};
use crate::dashboard::state::ScannerViewState;
use crate::dashboard::theme::ThemeColors;
use crate::shared::AppState;

/// Render the toolbar; returns the command whose button was clicked
pub fn render_toolbar(
    ui: &mut egui::Ui,
    view: &mut ScannerViewState,
    state: &AppState,
) -> Option<Command> {
    let mut clicked = None;

    ui.horizontal(|ui| {
        ui.label("Image:");
        ui.add(
            egui::TextEdit::singleline(&mut view.path_input)
                .hint_text("path/to/page.png, or drop a file")
                .desired_width(260.0),
        );

        ui.separator();
        ui.label("Camera:");
        ui.add_enabled(
            !state.capture.is_streaming(),
            egui::DragValue::new(&mut view.device_index).range(0..=16),
        );

        ui.separator();
        let input = view.command_input();
        for entry in COMMANDS {
            let enabled = entry.command.is_enabled(state, &input);
            let response = ui
                .add_enabled(enabled, egui::Button::new(entry.label))
                .on_hover_text(entry.tooltip);
            if response.clicked() {
                clicked = Some(entry.command);
            }
        }
    });

    ui.horizontal(|ui| {
        if state.recognizing {
            ui.spinner();
        }
        if state.capture.is_streaming() {
            ui.label(RichText::new("LIVE").color(ThemeColors::ERROR).strong());
        }
        if let Some(ref selection) = state.selection {
            ui.label(RichText::new(format!("ROI {}", selection)).color(ThemeColors::SELECTION));
        }
        if let Some(ref status) = state.status {
            ui.label(RichText::new(status).color(ThemeColors::TEXT_MUTED));
        }
    });

    clicked
}
