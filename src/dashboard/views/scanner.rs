//! Scanner view
//!
//! Image panel (scaled preview, ROI drag, selection outline) and the
//! read-only text panel.

use egui::{Pos2, RichText, Rounding, Stroke};

use crate::dashboard::state::ScannerViewState;
use crate::dashboard::theme::{color_with_alpha, ThemeColors};
use crate::geometry::{DisplayRect, DisplaySpace, Point, Size};
use crate::selection::SelectionTracker;
use crate::shared::{AppState, PendingDrag};

/// Render the image panel; returns a drag finished during this frame
pub fn render_image_panel(
    ui: &mut egui::Ui,
    view: &mut ScannerViewState,
    state: &AppState,
) -> Option<PendingDrag> {
    sync_texture(ui.ctx(), view, state);

    let Some((texture_id, tex_size)) = view
        .preview_texture
        .as_ref()
        .map(|texture| (texture.id(), texture.size_vec2()))
    else {
        ui.centered_and_justified(|ui| {
            let message = if state.capture.is_streaming() {
                "Waiting for first frame..."
            } else {
                "Load an image or start the camera"
            };
            ui.label(RichText::new(message).size(15.0).color(ThemeColors::TEXT_MUTED));
        });
        return None;
    };

    // Fit the image into the panel, keeping its aspect ratio
    let available = ui.available_size();
    let scale = (available.x / tex_size.x).min(available.y / tex_size.y);
    let scaled_size = (tex_size * scale).floor().max(egui::vec2(1.0, 1.0));
    let display: Size<DisplaySpace> = Size::new(scaled_size.x as u32, scaled_size.y as u32);

    let (image_rect, response) = ui.allocate_exact_size(scaled_size, egui::Sense::drag());
    let painter = ui.painter_at(image_rect);
    painter.image(
        texture_id,
        image_rect,
        egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0)),
        egui::Color32::WHITE,
    );

    let mut finished = None;
    let pointer = response
        .interact_pointer_pos()
        .map(|pos| to_display_point(pos, image_rect));

    if response.drag_started() {
        if let Some(point) = pointer {
            view.tracker.begin(point);
        }
    }
    if response.dragged() {
        if let Some(point) = pointer {
            view.tracker.update(point);
        }
    }
    if response.drag_stopped() {
        if let Some(point) = pointer {
            view.tracker.update(point);
        }
        finished = view
            .tracker
            .end()
            .map(|rect| PendingDrag { rect, display });
    }

    // Committed ROI
    if let (Some(selection), Some(raster)) = (state.selection, state.raster.as_ref()) {
        let shown = SelectionTracker::project(selection, raster.size(), display);
        painter.rect_stroke(
            to_screen_rect(shown, image_rect),
            Rounding::ZERO,
            Stroke::new(2.0, ThemeColors::SELECTION),
        );
    }

    // Last drag, waiting for Select ROI
    if let Some(pending) = state.pending_drag.filter(|p| p.display == display) {
        if !view.tracker.is_dragging() {
            painter.rect_stroke(
                to_screen_rect(pending.rect, image_rect),
                Rounding::ZERO,
                Stroke::new(1.0, color_with_alpha(ThemeColors::RUBBER_BAND, 160)),
            );
        }
    }

    // Rubber band
    if let Some(current) = view.tracker.current() {
        let band = to_screen_rect(current, image_rect);
        painter.rect_filled(band, Rounding::ZERO, color_with_alpha(ThemeColors::RUBBER_BAND, 50));
        painter.rect_stroke(band, Rounding::ZERO, Stroke::new(2.0, ThemeColors::RUBBER_BAND));
        painter.text(
            band.center(),
            egui::Align2::CENTER_CENTER,
            format!("{} x {}", current.width, current.height),
            egui::FontId::proportional(14.0),
            egui::Color32::WHITE,
        );
    }

    finished
}

/// Render the read-only text panel
pub fn render_text_panel(ui: &mut egui::Ui, state: &AppState) {
    let color = if state.text_is_error {
        ThemeColors::ERROR
    } else {
        ThemeColors::TEXT_PRIMARY
    };
    let mut text = state.text.as_str();

    egui::ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui| {
            ui.add(
                egui::TextEdit::multiline(&mut text)
                    .font(egui::TextStyle::Monospace)
                    .text_color(color)
                    .desired_width(f32::INFINITY)
                    .desired_rows(6),
            );
        });
}

/// Upload the displayed image when the scanner state changed
fn sync_texture(ctx: &egui::Context, view: &mut ScannerViewState, state: &AppState) {
    if view.texture_revision == Some(state.revision) {
        return;
    }
    view.texture_revision = Some(state.revision);

    let Some(image) = state.displayed_image() else {
        view.preview_texture = None;
        return;
    };

    let size = [image.width() as usize, image.height() as usize];
    let color_image = egui::ColorImage::from_rgba_unmultiplied(size, image.as_raw());

    match view.preview_texture.as_mut() {
        Some(texture) if texture.size() == size => {
            texture.set(color_image, egui::TextureOptions::LINEAR);
        }
        _ => {
            view.preview_texture =
                Some(ctx.load_texture("scanner_preview", color_image, egui::TextureOptions::LINEAR));
        }
    }
}

/// Pointer position relative to the preview's top-left corner, clamped to it
fn to_display_point(pos: Pos2, image_rect: egui::Rect) -> Point<DisplaySpace> {
    let local = pos - image_rect.min;
    let x = local.x.clamp(0.0, image_rect.width()).round();
    let y = local.y.clamp(0.0, image_rect.height()).round();
    Point::new(x as u32, y as u32)
}

fn to_screen_rect(rect: DisplayRect, image_rect: egui::Rect) -> egui::Rect {
    egui::Rect::from_min_size(
        image_rect.min + egui::vec2(rect.x as f32, rect.y as f32),
        egui::vec2(rect.width as f32, rect.height as f32),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pointer_is_relative_and_clamped() {
        let image_rect = egui::Rect::from_min_size(egui::pos2(100.0, 50.0), egui::vec2(400.0, 300.0));

        assert_eq!(to_display_point(egui::pos2(110.4, 70.6), image_rect), Point::new(10, 21));
        assert_eq!(to_display_point(egui::pos2(20.0, 10.0), image_rect), Point::new(0, 0));
        assert_eq!(to_display_point(egui::pos2(900.0, 900.0), image_rect), Point::new(400, 300));
    }

    #[test]
    fn test_screen_rect_offsets_by_preview_origin() {
        let image_rect = egui::Rect::from_min_size(egui::pos2(100.0, 50.0), egui::vec2(400.0, 300.0));
        let rect = to_screen_rect(DisplayRect::new(10, 20, 30, 40), image_rect);
        assert_eq!(rect.min, egui::pos2(110.0, 70.0));
        assert_eq!(rect.size(), egui::vec2(30.0, 40.0));
    }
}
