use image::RgbImage;
use image::imageops::crop_imm;

use crate::config::RoiConfig;
use crate::error::{DetectError, Result};
use crate::models::{Circle, Rectangle, Roi};

/// Half-extent of the inset square: the radius minus the share taken by the
/// sign's border ring, truncated to whole pixels.
pub fn inset_radius(radius: u32, config: &RoiConfig) -> u32 {
    let r = radius as f32;
    (r - r / config.inset_divisor) as u32
}

/// Cut the square around `circle`, inset to skip the sign's border ring.
///
/// The square is clamped to the image, so circles near an edge give a
/// smaller, non-square ROI. A square with no pixels inside the image is an error.
pub fn extract_roi(image: &RgbImage, circle: Circle, config: &RoiConfig) -> Result<Roi> {
    let rn = inset_radius(circle.radius, config) as i64;
    let (cx, cy) = (circle.x as i64, circle.y as i64);
    let bounds = crop_bounds(image, cx - rn, cy - rn, cx + rn, cy + rn)?;

    Ok(Roi {
        image: crop(image, bounds),
        bounds,
        circle,
    })
}

/// Clamp the half-open span `[left, right) x [top, bottom)` to the image.
pub fn crop_bounds(image: &RgbImage, left: i64, top: i64, right: i64, bottom: i64) -> Result<Rectangle> {
    let (width, height) = image.dimensions();
    let x0 = left.clamp(0, width as i64);
    let y0 = top.clamp(0, height as i64);
    let x1 = right.clamp(0, width as i64);
    let y1 = bottom.clamp(0, height as i64);

    if x1 <= x0 || y1 <= y0 {
        return Err(DetectError::EmptyCrop {
            left,
            top,
            right,
            bottom,
            width,
            height,
        });
    }

    Ok(Rectangle::new(
        x0 as u32,
        y0 as u32,
        (x1 - x0) as u32,
        (y1 - y0) as u32,
    ))
}

/// Copy out a rectangle already known to lie inside the image.
pub fn crop(image: &RgbImage, rect: Rectangle) -> RgbImage {
    crop_imm(image, rect.x, rect.y, rect.width, rect.height).to_image()
}
