use image::{GrayImage, Luma, Rgb, RgbImage};
use imageproc::edges::canny;
use imageproc::filter::gaussian_blur_f32;
use imageproc::gradients::{horizontal_sobel, vertical_sobel};
use imageproc::morphology::{Mask, grayscale_close, grayscale_open};

use crate::config::{ChannelOrder, HsvRange};

/// 8-bit HSV stored in a 3-channel buffer: hue 0..=179, saturation and value 0..=255.
pub type HsvImage = RgbImage;

/// Sigma that an OpenCV-style `kernel x kernel` Gaussian uses when no sigma is given.
pub fn kernel_sigma(kernel: u32) -> f32 {
    0.3 * ((kernel as f32 - 1.0) * 0.5 - 1.0) + 0.8
}

/// Gaussian blur of a colour image, sized by kernel extent. Kernels of 1 or less are a no-op.
pub fn blur_rgb(img: &RgbImage, kernel: u32) -> RgbImage {
    if kernel <= 1 {
        return img.clone();
    }
    gaussian_blur_f32(img, kernel_sigma(kernel))
}

/// Gaussian blur of a single-channel image, sized by kernel extent.
pub fn blur_gray(img: &GrayImage, kernel: u32) -> GrayImage {
    if kernel <= 1 {
        return img.clone();
    }
    gaussian_blur_f32(img, kernel_sigma(kernel))
}

/// Detect edges using Canny edge detector
pub fn detect_edges(img: &GrayImage, low_threshold: f32, high_threshold: f32) -> GrayImage {
    canny(img, low_threshold, high_threshold)
}

/// Canny without the built-in Gaussian pre-smoothing of [`detect_edges`].
///
/// Used where the caller controls smoothing itself. Gradient magnitude is the
/// L1 norm of the Sobel response; non-maximum suppression keeps the first of
/// two equal neighbours, so a step edge stays one pixel wide and a one pixel
/// line splits into two parallel edges.
pub fn detect_edges_sharp(img: &GrayImage, low_threshold: f32, high_threshold: f32) -> GrayImage {
    let (w, h) = img.dimensions();
    let gx = horizontal_sobel(img);
    let gy = vertical_sobel(img);

    let stride = w as usize;
    let mag: Vec<f32> = gx
        .pixels()
        .zip(gy.pixels())
        .map(|(x, y)| (x[0] as f32).abs() + (y[0] as f32).abs())
        .collect();
    let at = |x: i64, y: i64| -> f32 {
        if x < 0 || y < 0 || x >= w as i64 || y >= h as i64 {
            0.0
        } else {
            mag[y as usize * stride + x as usize]
        }
    };

    // 0 = suppressed, 1 = weak, 2 = strong
    let mut class = vec![0u8; mag.len()];
    let tan_22_5 = 0.414_213_57f32;
    for y in 0..h as i64 {
        for x in 0..w as i64 {
            let m = at(x, y);
            if m <= low_threshold {
                continue;
            }
            let vx = gx.get_pixel(x as u32, y as u32)[0] as f32;
            let vy = gy.get_pixel(x as u32, y as u32)[0] as f32;
            let (ax, ay) = (vx.abs(), vy.abs());

            let ((px, py), (nx, ny)) = if ay <= ax * tan_22_5 {
                ((x - 1, y), (x + 1, y))
            } else if ax <= ay * tan_22_5 {
                ((x, y - 1), (x, y + 1))
            } else if (vx > 0.0) == (vy > 0.0) {
                ((x - 1, y - 1), (x + 1, y + 1))
            } else {
                ((x + 1, y - 1), (x - 1, y + 1))
            };

            if m > at(px, py) && m >= at(nx, ny) {
                class[y as usize * stride + x as usize] = if m > high_threshold { 2 } else { 1 };
            }
        }
    }

    let mut edges = GrayImage::new(w, h);
    let mut stack: Vec<(u32, u32)> = Vec::new();
    for y in 0..h {
        for x in 0..w {
            if class[y as usize * stride + x as usize] == 2 {
                stack.push((x, y));
            }
        }
    }
    while let Some((x, y)) = stack.pop() {
        if edges.get_pixel(x, y)[0] != 0 {
            continue;
        }
        edges.put_pixel(x, y, Luma([255]));
        for ny in y.saturating_sub(1)..=(y + 1).min(h - 1) {
            for nx in x.saturating_sub(1)..=(x + 1).min(w - 1) {
                if class[ny as usize * stride + nx as usize] != 0 && edges.get_pixel(nx, ny)[0] == 0 {
                    stack.push((nx, ny));
                }
            }
        }
    }
    edges
}

/// Elliptical structuring element laid out the way OpenCV rasterises one,
/// anchored at `(width / 2, height / 2)`.
///
/// Small sizes are not symmetric: 2x2 keeps three cells and 3x3 is a cross.
pub fn ellipse_element(width: u32, height: u32) -> Mask {
    let r = (height / 2) as i64;
    let c = (width / 2) as i64;
    let inv_r2 = if r > 0 { 1.0 / (r * r) as f64 } else { 0.0 };

    let kernel = GrayImage::from_fn(width, height, |x, y| {
        let dy = y as i64 - r;
        if dy.abs() > r {
            return Luma([0]);
        }
        let dx = (c as f64 * (((r * r - dy * dy) as f64) * inv_r2).sqrt()).round() as i64;
        let j1 = (c - dx).max(0);
        let j2 = (c + dx + 1).min(width as i64);
        if (x as i64) >= j1 && (x as i64) < j2 {
            Luma([255])
        } else {
            Luma([0])
        }
    });

    // sizes are capped at 511 by config validation, so the anchor fits in a u8
    Mask::from_image(&kernel, c as u8, r as u8)
}

/// Morphological opening (erode then dilate); removes specks smaller than the element.
pub fn open(mask: &GrayImage, element: &Mask) -> GrayImage {
    grayscale_open(mask, element)
}

/// Morphological closing (dilate then erode); fills gaps smaller than the element.
pub fn close(mask: &GrayImage, element: &Mask) -> GrayImage {
    grayscale_close(mask, element)
}

/// Convert a colour pixel to 8-bit HSV (hue halved to fit a byte).
pub fn pixel_to_hsv(r: u8, g: u8, b: u8) -> [u8; 3] {
    let (rf, gf, bf) = (r as f32, g as f32, b as f32);
    let v = r.max(g).max(b);
    let min = r.min(g).min(b);
    let diff = (v - min) as f32;
    let vf = v as f32;

    let s = if v == 0 { 0.0 } else { 255.0 * diff / vf };

    let h = if diff == 0.0 {
        0.0
    } else if v == r {
        60.0 * (gf - bf) / diff
    } else if v == g {
        120.0 + 60.0 * (bf - rf) / diff
    } else {
        240.0 + 60.0 * (rf - gf) / diff
    };
    let h = if h < 0.0 { h + 360.0 } else { h };

    [
        ((h / 2.0).round() as u32 % 180) as u8,
        s.round() as u8,
        v,
    ]
}

/// Convert a 3-channel image to HSV, reading channels in `order`.
pub fn to_hsv(img: &RgbImage, order: ChannelOrder) -> HsvImage {
    let mut hsv = RgbImage::new(img.width(), img.height());
    for (src, dst) in img.pixels().zip(hsv.pixels_mut()) {
        let [c0, c1, c2] = src.0;
        let (r, g, b) = match order {
            ChannelOrder::Rgb => (c0, c1, c2),
            ChannelOrder::Bgr => (c2, c1, c0),
        };
        *dst = Rgb(pixel_to_hsv(r, g, b));
    }
    hsv
}

/// Binary mask of pixels whose HSV triple falls inside `range` (inclusive).
pub fn in_range(hsv: &HsvImage, range: &HsvRange) -> GrayImage {
    let mut mask = GrayImage::new(hsv.width(), hsv.height());
    for (src, dst) in hsv.pixels().zip(mask.pixels_mut()) {
        if range.contains(src.0) {
            *dst = Luma([255]);
        }
    }
    mask
}

/// Pixel-wise saturating sum of two masks of equal size.
pub fn union(a: &GrayImage, b: &GrayImage) -> GrayImage {
    let mut out = a.clone();
    for (dst, src) in out.pixels_mut().zip(b.pixels()) {
        dst.0[0] = dst.0[0].saturating_add(src.0[0]);
    }
    out
}
