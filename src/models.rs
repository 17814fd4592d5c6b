use image::{GrayImage, RgbImage};
use serde::{Deserialize, Serialize};

/// A detected circle in pixel coordinates of the full image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Circle {
    pub x: u32,
    pub y: u32,
    pub radius: u32,
}

/// Axis-aligned box; `x`/`y` is the top-left pixel, extents are inclusive
/// of that pixel so a single pixel has width and height 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rectangle {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Rectangle {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }

    /// One past the last column.
    pub fn right(&self) -> u32 {
        self.x + self.width
    }

    /// One past the last row.
    pub fn bottom(&self) -> u32 {
        self.y + self.height
    }

    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    /// Boundary-inclusive containment: shared edges still count.
    pub fn contains(&self, other: &Rectangle) -> bool {
        self.x <= other.x
            && self.y <= other.y
            && self.right() >= other.right()
            && self.bottom() >= other.bottom()
    }
}

/// A square crop around one detected sign.
#[derive(Debug, Clone)]
pub struct Roi {
    pub image: RgbImage,
    /// Where the crop sits in the source image (after clamping).
    pub bounds: Rectangle,
    pub circle: Circle,
}

/// Result of locating signs in a full image. `rois[i]` was cut from `circles[i]`.
#[derive(Debug, Clone)]
pub struct SignDetection {
    pub mask: GrayImage,
    pub circles: Vec<Circle>,
    pub rois: Vec<Roi>,
}

impl SignDetection {
    pub fn is_empty(&self) -> bool {
        self.circles.is_empty()
    }
}

/// Candidate glyph boxes within one ROI, before containment filtering.
#[derive(Debug, Clone)]
pub struct GlyphRects {
    /// Copy of the ROI with every surviving box outlined.
    pub annotated: RgbImage,
    /// Ordered by contour area, largest first.
    pub rects: Vec<Rectangle>,
}

/// A cropped digit candidate handed to a downstream recognizer.
#[derive(Debug, Clone)]
pub struct Glyph {
    pub image: RgbImage,
    pub bounds: Rectangle,
}
