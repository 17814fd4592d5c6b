//! Gradient Hough transform for circular sign borders.
//!
//! Every edge pixel votes along its gradient line, in both directions, for
//! all radii in range. Circle centers collect votes from the whole rim, so
//! accumulator peaks mark candidate centers. Each accepted center then gets
//! the radius best supported by the edge pixels around it.

use image::GrayImage;
use imageproc::gradients::{horizontal_sobel, vertical_sobel};

use crate::config::CircleConfig;
use crate::detection::preprocessing;
use crate::models::Circle;

/// Find circles in a mask produced by [`super::color_mask::red_edge_mask`].
///
/// Circles come back strongest first. An empty result is a normal outcome.
pub fn find_circles(mask: &GrayImage, config: &CircleConfig) -> Vec<Circle> {
    let (w, h) = mask.dimensions();
    if w < 3 || h < 3 {
        return Vec::new();
    }

    let min_radius = config.min_radius.max(1);
    let max_radius = config.max_radius.unwrap_or(w.max(h)).max(min_radius);

    let edges = preprocessing::detect_edges(mask, config.edge_threshold / 2.0, config.edge_threshold);
    let gx = horizontal_sobel(mask);
    let gy = vertical_sobel(mask);

    let stride = w as usize;
    let mut accum = vec![0u32; stride * h as usize];
    let mut edge_points = Vec::new();
    let (w_f, h_f) = (w as f32, h as f32);

    for (x, y, pixel) in edges.enumerate_pixels() {
        if pixel[0] == 0 {
            continue;
        }
        let vx = gx.get_pixel(x, y)[0] as f32;
        let vy = gy.get_pixel(x, y)[0] as f32;
        if vx == 0.0 && vy == 0.0 {
            continue;
        }
        edge_points.push((x as f32, y as f32));

        let mag = (vx * vx + vy * vy).sqrt();
        let (dx, dy) = (vx / mag, vy / mag);

        for sign in [1.0f32, -1.0] {
            for r in min_radius..=max_radius {
                let cx = (x as f32 + sign * dx * r as f32).round();
                let cy = (y as f32 + sign * dy * r as f32).round();
                if cx < 0.0 || cy < 0.0 || cx >= w_f || cy >= h_f {
                    break;
                }
                accum[cy as usize * stride + cx as usize] += 1;
            }
        }
    }

    if edge_points.is_empty() {
        return Vec::new();
    }

    let centers = local_maxima(&accum, w as usize, h as usize, config.center_threshold);
    tracing::debug!(
        edge_points = edge_points.len(),
        candidates = centers.len(),
        "hough accumulator filled"
    );

    let min_dist_sq = config.min_dist * config.min_dist;
    let mut circles: Vec<Circle> = Vec::new();

    for (idx, votes) in centers {
        let cx = (idx % stride) as u32;
        let cy = (idx / stride) as u32;

        let too_close = circles.iter().any(|c| {
            let dx = c.x as f32 - cx as f32;
            let dy = c.y as f32 - cy as f32;
            dx * dx + dy * dy < min_dist_sq
        });
        if too_close {
            continue;
        }

        match best_radius(&edge_points, cx, cy, min_radius, max_radius, config.center_threshold) {
            Some((radius, support)) => {
                tracing::trace!(x = cx, y = cy, radius, votes, support, "circle accepted");
                circles.push(Circle { x: cx, y: cy, radius });
            }
            None => {
                tracing::trace!(x = cx, y = cy, votes, "center rejected, no supported radius");
            }
        }
    }

    circles
}

/// Accumulator cells above `threshold` that beat their 4-neighbours
/// (strictly to the left and above, non-strictly to the right and below so a
/// flat plateau yields one peak). Sorted by votes, then raster order.
fn local_maxima(accum: &[u32], w: usize, h: usize, threshold: u32) -> Vec<(usize, u32)> {
    let mut peaks = Vec::new();
    if w < 3 || h < 3 {
        return peaks;
    }
    for y in 1..h - 1 {
        for x in 1..w - 1 {
            let idx = y * w + x;
            let v = accum[idx];
            if v > threshold
                && v > accum[idx - 1]
                && v >= accum[idx + 1]
                && v > accum[idx - w]
                && v >= accum[idx + w]
            {
                peaks.push((idx, v));
            }
        }
    }
    peaks.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
    peaks
}

/// Pick the radius whose ±1 px shell holds the densest edge support, among
/// shells holding at least `min_support` points. Density is support divided
/// by radius so large shells do not win just by being longer.
fn best_radius(
    edge_points: &[(f32, f32)],
    cx: u32,
    cy: u32,
    min_radius: u32,
    max_radius: u32,
    min_support: u32,
) -> Option<(u32, u32)> {
    let mut bins = vec![0u32; max_radius as usize + 2];
    let (cxf, cyf) = (cx as f32, cy as f32);
    let lo = min_radius as f32 - 1.5;
    let hi = max_radius as f32 + 1.5;

    for &(px, py) in edge_points {
        let d = ((px - cxf).powi(2) + (py - cyf).powi(2)).sqrt();
        if d < lo || d >= hi {
            continue;
        }
        let bin = d.round() as usize;
        if bin < bins.len() {
            bins[bin] += 1;
        }
    }

    let mut best: Option<(u32, u32, f32)> = None;
    for r in min_radius..=max_radius {
        let r_idx = r as usize;
        let support = bins[r_idx - 1] + bins[r_idx] + bins[r_idx + 1];
        if support < min_support {
            continue;
        }
        let density = support as f32 / r as f32;
        if best.is_none_or(|(_, _, d)| density > d) {
            best = Some((r, support, density));
        }
    }

    best.map(|(r, support, _)| (r, support))
}
