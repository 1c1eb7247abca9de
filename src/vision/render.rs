//! Overlay Renderer
//!
//! Burns recognized word boxes and their labels into a copy of the raster.

use ab_glyph::{FontArc, PxScale};
use image::{Rgba, RgbaImage};
use imageproc::drawing::{draw_hollow_rect_mut, draw_text_mut, text_size};
use imageproc::rect::Rect as PixelRect;
use tracing::{debug, warn};

use super::OverlayBox;
use crate::config::OverlaySettings;

const OVERLAY_COLOR: Rgba<u8> = Rgba([0, 255, 0, 255]);
/// Gap between a label and the box it belongs to
const LABEL_GAP: i32 = 2;
/// egui ships this face with its default fonts
const LABEL_FONT_NAME: &str = "Ubuntu-Light";

/// Load the label font bundled with egui
pub fn default_label_font() -> Option<FontArc> {
    let fonts = egui::FontDefinitions::default();
    let data = fonts.font_data.get(LABEL_FONT_NAME)?;
    match FontArc::try_from_vec(data.font.to_vec()) {
        Ok(font) => Some(font),
        Err(e) => {
            warn!("Bundled label font is unusable: {}", e);
            None
        }
    }
}

/// Draws overlay boxes onto rasters
#[derive(Clone)]
pub struct OverlayRenderer {
    font: Option<FontArc>,
    label_scale: PxScale,
    stroke_width: u32,
}

impl OverlayRenderer {
    pub fn new(settings: &OverlaySettings) -> Self {
        Self::with_font(default_label_font(), settings)
    }

    /// Renderer with an explicit label font; `None` draws boxes only
    pub fn with_font(font: Option<FontArc>, settings: &OverlaySettings) -> Self {
        if font.is_none() {
            warn!("No label font available; overlays will be drawn without text");
        }
        Self {
            font,
            label_scale: PxScale::from(settings.label_size.max(1.0)),
            stroke_width: settings.stroke_width.max(1),
        }
    }

    /// Draw every overlay on a copy of `raster`
    pub fn render(&self, raster: &RgbaImage, overlays: &[OverlayBox]) -> RgbaImage {
        let mut canvas = raster.clone();
        for overlay in overlays {
            self.draw_box(&mut canvas, overlay);
            self.draw_label(&mut canvas, overlay);
        }
        debug!("Rendered {} overlays", overlays.len());
        canvas
    }

    fn draw_box(&self, canvas: &mut RgbaImage, overlay: &OverlayBox) {
        let rect = overlay.rect;
        // Thicken the outline inwards, one ring per pixel of stroke
        for inset in 0..self.stroke_width {
            let width = rect.width.saturating_sub(2 * inset);
            let height = rect.height.saturating_sub(2 * inset);
            if width == 0 || height == 0 {
                break;
            }
            let ring = PixelRect::at((rect.x + inset) as i32, (rect.y + inset) as i32)
                .of_size(width, height);
            draw_hollow_rect_mut(canvas, ring, OVERLAY_COLOR);
        }
    }

    fn draw_label(&self, canvas: &mut RgbaImage, overlay: &OverlayBox) {
        let Some(font) = &self.font else {
            return;
        };
        let (_, text_height) = text_size(self.label_scale, font, &overlay.text);
        let above = overlay.rect.y as i32 - text_height as i32 - LABEL_GAP;
        // No room above the box: put the label just inside its top edge
        let y = if above >= 0 {
            above
        } else {
            overlay.rect.y as i32 + LABEL_GAP
        };
        draw_text_mut(
            canvas,
            OVERLAY_COLOR,
            overlay.rect.x as i32,
            y,
            self.label_scale,
            font,
            &overlay.text,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Rect;

    fn blank(width: u32, height: u32) -> RgbaImage {
        RgbaImage::from_pixel(width, height, Rgba([255, 255, 255, 255]))
    }

    fn overlay(text: &str, x: u32, y: u32, w: u32, h: u32) -> OverlayBox {
        OverlayBox {
            text: text.to_string(),
            rect: Rect::new(x, y, w, h),
        }
    }

    #[test]
    fn test_render_does_not_mutate_input() {
        let raster = blank(100, 60);
        let renderer = OverlayRenderer::with_font(None, &OverlaySettings::default());
        let out = renderer.render(&raster, &[overlay("Hi", 10, 30, 20, 8)]);

        assert_eq!(raster, blank(100, 60));
        assert_ne!(out, raster);
    }

    #[test]
    fn test_box_outline_is_drawn() {
        let renderer = OverlayRenderer::with_font(None, &OverlaySettings::default());
        let out = renderer.render(&blank(100, 60), &[overlay("Hi", 10, 30, 20, 8)]);

        // Outer ring and the second stroke ring
        assert_eq!(out.get_pixel(10, 30), &OVERLAY_COLOR);
        assert_eq!(out.get_pixel(29, 37), &OVERLAY_COLOR);
        assert_eq!(out.get_pixel(11, 31), &OVERLAY_COLOR);
        // Interior stays untouched
        assert_eq!(out.get_pixel(20, 34), &Rgba([255, 255, 255, 255]));
    }

    #[test]
    fn test_label_drawn_above_box() {
        let renderer = OverlayRenderer::new(&OverlaySettings::default());
        if renderer.font.is_none() {
            return;
        }
        let out = renderer.render(&blank(120, 80), &[overlay("HH", 10, 40, 30, 10)]);

        let label_ink = (0..40u32)
            .flat_map(|y| (10..60u32).map(move |x| (x, y)))
            .any(|(x, y)| out.get_pixel(x, y) != &Rgba([255, 255, 255, 255]));
        assert!(label_ink, "expected label pixels above the box");
    }

    #[test]
    fn test_tiny_and_edge_boxes() {
        let renderer = OverlayRenderer::new(&OverlaySettings::default());
        let out = renderer.render(
            &blank(20, 20),
            &[overlay("a", 0, 0, 1, 1), overlay("b", 19, 19, 1, 1)],
        );
        assert_eq!(out.get_pixel(0, 0), &OVERLAY_COLOR);
        assert_eq!(out.get_pixel(19, 19), &OVERLAY_COLOR);
    }
}
