//! Selection Tracker
//!
//! Turns a pointer drag over the scaled preview into a rectangle in display
//! space, and maps display-space rectangles onto the source raster.

use crate::error::ScanError;
use crate::geometry::{DisplayRect, DisplaySpace, Point, Rect, Size, SourceRect, SourceSpace};

/// Tracks one drag at a time
#[derive(Debug, Clone, Default)]
pub struct SelectionTracker {
    /// Where the drag started
    anchor: Option<Point<DisplaySpace>>,
    /// Latest pointer position
    cursor: Option<Point<DisplaySpace>>,
}

impl SelectionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new drag, discarding any unfinished one
    pub fn begin(&mut self, point: Point<DisplaySpace>) {
        self.anchor = Some(point);
        self.cursor = Some(point);
    }

    /// Move the free corner of the drag
    pub fn update(&mut self, point: Point<DisplaySpace>) {
        if self.anchor.is_some() {
            self.cursor = Some(point);
        }
    }

    pub fn is_dragging(&self) -> bool {
        self.anchor.is_some()
    }

    /// Rectangle of the drag in progress, for rubber-band drawing
    pub fn current(&self) -> Option<DisplayRect> {
        match (self.anchor, self.cursor) {
            (Some(anchor), Some(cursor)) => Some(Rect::from_corners(anchor, cursor)),
            _ => None,
        }
    }

    /// Finish the drag
    ///
    /// Returns `None` when no drag was active or it covered no area.
    pub fn end(&mut self) -> Option<DisplayRect> {
        let rect = self.current();
        self.anchor = None;
        self.cursor = None;
        rect.filter(|r| !r.is_empty())
    }

    /// Map a display-space rectangle onto the source raster
    ///
    /// Coordinates are scaled by `source / display` per axis, truncated, then
    /// clamped so the result is non-empty and lies inside the source.
    pub fn resolve(
        rect: DisplayRect,
        display: Size<DisplaySpace>,
        source: Size<SourceSpace>,
    ) -> Result<SourceRect, ScanError> {
        if rect.is_empty() || display.is_empty() || source.is_empty() {
            return Err(ScanError::NoSelection);
        }

        let x = scale(rect.x, source.width, display.width).min(source.width - 1);
        let y = scale(rect.y, source.height, display.height).min(source.height - 1);
        let width = scale(rect.width, source.width, display.width)
            .max(1)
            .min(source.width - x);
        let height = scale(rect.height, source.height, display.height)
            .max(1)
            .min(source.height - y);

        Ok(Rect::new(x, y, width, height))
    }

    /// Map a source-space rectangle back onto the preview, for outlining
    pub fn project(
        rect: SourceRect,
        source: Size<SourceSpace>,
        display: Size<DisplaySpace>,
    ) -> DisplayRect {
        if source.is_empty() {
            return Rect::new(0, 0, 0, 0);
        }
        let scale_x = f64::from(display.width) / f64::from(source.width);
        let scale_y = f64::from(display.height) / f64::from(source.height);
        Rect::new(
            (f64::from(rect.x) * scale_x).round() as u32,
            (f64::from(rect.y) * scale_y).round() as u32,
            (f64::from(rect.width) * scale_x).round() as u32,
            (f64::from(rect.height) * scale_y).round() as u32,
        )
    }
}

/// `value * to / from`, truncated toward zero
fn scale(value: u32, to: u32, from: u32) -> u32 {
    let scaled = u64::from(value) * u64::from(to) / u64::from(from);
    u32::try_from(scaled).unwrap_or(u32::MAX)
}
