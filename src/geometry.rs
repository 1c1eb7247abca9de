//! Coordinate spaces and integer rectangles
//!
//! Three pixel spaces exist in the scanner:
//! - display space: the scaled preview the user drags on
//! - source space: the original, unscaled raster
//! - crop space: the sub-raster handed to the OCR engine
//!
//! Rectangles, points and sizes carry their space as a type parameter, so a
//! display-space rectangle can never be passed where a source-space one is
//! expected. Translation between spaces lives in exactly two places:
//! `selection::SelectionTracker::resolve` (display -> source) and
//! `vision::to_source_space` (crop -> source).

use serde::Serialize;
use std::fmt;
use std::marker::PhantomData;

/// Pixels of the scaled preview shown on screen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DisplaySpace;

/// Pixels of the original raster
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SourceSpace;

/// Pixels of the cropped sub-raster passed to the OCR engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CropSpace;

/// A point in the given coordinate space
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Point<S> {
    pub x: u32,
    pub y: u32,
    space: PhantomData<S>,
}

impl<S> Point<S> {
    pub fn new(x: u32, y: u32) -> Self {
        Self {
            x,
            y,
            space: PhantomData,
        }
    }
}

/// Width and height of an area in the given coordinate space
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Size<S> {
    pub width: u32,
    pub height: u32,
    space: PhantomData<S>,
}

impl<S> Size<S> {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            space: PhantomData,
        }
    }

    /// True when either dimension is zero
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// Axis-aligned rectangle (x, y, width, height) in the given coordinate space
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(bound = "")]
pub struct Rect<S> {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
    #[serde(skip)]
    space: PhantomData<S>,
}

impl<S> Rect<S> {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
            space: PhantomData,
        }
    }

    /// Smallest rectangle spanning two corner points, in either drag direction
    pub fn from_corners(a: Point<S>, b: Point<S>) -> Self {
        let x = a.x.min(b.x);
        let y = a.y.min(b.y);
        Self::new(x, y, a.x.max(b.x) - x, a.y.max(b.y) - y)
    }

    /// Exclusive right edge
    pub fn right(&self) -> u32 {
        self.x.saturating_add(self.width)
    }

    /// Exclusive bottom edge
    pub fn bottom(&self) -> u32 {
        self.y.saturating_add(self.height)
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn size(&self) -> Size<S> {
        Size::new(self.width, self.height)
    }

    /// Whether the rectangle lies entirely within `[0, width) x [0, height)`
    pub fn fits_within(&self, size: Size<S>) -> bool {
        self.right() <= size.width && self.bottom() <= size.height
    }
}

impl<S> fmt::Display for Rect<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "x={}, y={}, w={}, h={}",
            self.x, self.y, self.width, self.height
        )
    }
}

pub type DisplayRect = Rect<DisplaySpace>;
pub type SourceRect = Rect<SourceSpace>;
pub type CropRect = Rect<CropSpace>;
