use image::{GrayImage, Rgb, RgbImage};
use imageproc::contours::find_contours;
use imageproc::drawing::draw_hollow_rect_mut;
use imageproc::geometry::{approximate_polygon_dp, arc_length};
use imageproc::point::Point;
use imageproc::rect::Rect;

use crate::config::{ChannelOrder, GlyphConfig};
use crate::detection::preprocessing;
use crate::models::{GlyphRects, Rectangle};

const OUTLINE: Rgb<u8> = Rgb([0, 255, 0]);

/// Edge map of the near-black strokes in an ROI.
pub fn dark_edge_mask(roi: &RgbImage, order: ChannelOrder, config: &GlyphConfig) -> GrayImage {
    let hsv = preprocessing::to_hsv(roi, order);
    let mask = preprocessing::in_range(&hsv, &config.dark_band);

    let (kw, kh) = config.close_kernel;
    let mask = preprocessing::close(&mask, &preprocessing::ellipse_element(kw, kh));

    // smoothing between the passes is explicit, so use the unsmoothed detector
    let edges = preprocessing::detect_edges_sharp(&mask, config.canny_low, config.canny_high);
    let edges = preprocessing::blur_gray(&edges, config.blur_kernel);
    preprocessing::detect_edges_sharp(&edges, config.canny_low, config.canny_high)
}

/// Bounding boxes of the largest dark contours in an ROI.
///
/// Contours are ranked by enclosed area and only the top `max_contours` are
/// looked at; boxes shorter than `min_height` are then dropped. The result
/// keeps the area ranking, not spatial order.
pub fn find_glyph_rects(roi: &RgbImage, order: ChannelOrder, config: &GlyphConfig) -> GlyphRects {
    let edges = dark_edge_mask(roi, order, config);

    let mut ranked: Vec<(Vec<Point<i32>>, f64)> = find_contours::<i32>(&edges)
        .into_iter()
        .map(|c| {
            let area = contour_area(&c.points);
            (c.points, area)
        })
        .collect();
    let total = ranked.len();
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
    ranked.truncate(config.max_contours);

    let mut annotated = roi.clone();
    let mut rects = Vec::new();

    for (points, area) in &ranked {
        let polygon = simplify(points, config.approx_epsilon);
        let Some(rect) = bounding_rect(&polygon) else {
            continue;
        };
        if rect.height < config.min_height {
            tracing::trace!(?rect, area, "contour too short for a glyph");
            continue;
        }

        // outline passes through both corner pixels
        draw_hollow_rect_mut(
            &mut annotated,
            Rect::at(rect.x as i32, rect.y as i32).of_size(rect.width + 1, rect.height + 1),
            OUTLINE,
        );
        rects.push(rect);
    }

    tracing::debug!(
        contours = total,
        ranked = ranked.len(),
        kept = rects.len(),
        "glyph contours bounded"
    );

    GlyphRects { annotated, rects }
}

/// Reduce a closed contour to a polygon within `epsilon_frac` of its perimeter.
fn simplify(points: &[Point<i32>], epsilon_frac: f64) -> Vec<Point<i32>> {
    if points.len() < 3 {
        return points.to_vec();
    }
    let perimeter = arc_length(points, true);
    if perimeter <= 0.0 {
        return points.to_vec();
    }
    approximate_polygon_dp(points, epsilon_frac * perimeter, true)
}

/// Area enclosed by a closed polygon (shoelace formula).
pub fn contour_area(points: &[Point<i32>]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }
    let mut twice_area = 0i64;
    for (i, p) in points.iter().enumerate() {
        let q = &points[(i + 1) % points.len()];
        twice_area += p.x as i64 * q.y as i64 - q.x as i64 * p.y as i64;
    }
    (twice_area as f64 / 2.0).abs()
}

/// Smallest inclusive box around a set of non-negative points.
pub fn bounding_rect(points: &[Point<i32>]) -> Option<Rectangle> {
    let first = points.first()?;
    let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.x, first.y, first.x, first.y);
    for p in &points[1..] {
        min_x = min_x.min(p.x);
        min_y = min_y.min(p.y);
        max_x = max_x.max(p.x);
        max_y = max_y.max(p.y);
    }
    if min_x < 0 || min_y < 0 {
        return None;
    }
    Some(Rectangle::new(
        min_x as u32,
        min_y as u32,
        (max_x - min_x + 1) as u32,
        (max_y - min_y + 1) as u32,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn white(w: u32, h: u32) -> RgbImage {
        RgbImage::from_pixel(w, h, Rgb([255, 255, 255]))
    }

    fn fill(img: &mut RgbImage, x: u32, y: u32, w: u32, h: u32) {
        for yy in y..y + h {
            for xx in x..x + w {
                img.put_pixel(xx, yy, Rgb([0, 0, 0]));
            }
        }
    }

    #[test]
    fn shoelace_area_of_square() {
        let square = [
            Point::new(0, 0),
            Point::new(10, 0),
            Point::new(10, 10),
            Point::new(0, 10),
        ];
        assert_eq!(contour_area(&square), 100.0);
        assert_eq!(contour_area(&square[..2]), 0.0);
    }

    #[test]
    fn bounding_rect_is_inclusive() {
        let pts = [Point::new(3, 4), Point::new(7, 4), Point::new(5, 9)];
        assert_eq!(bounding_rect(&pts), Some(Rectangle::new(3, 4, 5, 6)));
        assert_eq!(bounding_rect(&[]), None);
    }

    #[test]
    fn blank_roi_has_no_rects() {
        let found = find_glyph_rects(&white(60, 60), ChannelOrder::Rgb, &GlyphConfig::default());
        assert!(found.rects.is_empty());
        assert_eq!(found.annotated, white(60, 60));
    }

    #[test]
    fn short_marks_are_dropped() {
        let mut img = white(80, 60);
        fill(&mut img, 10, 25, 20, 6);
        fill(&mut img, 45, 25, 20, 6);
        let found = find_glyph_rects(&img, ChannelOrder::Rgb, &GlyphConfig::default());
        assert!(found.rects.is_empty(), "{:?}", found.rects);
    }

    #[test]
    fn never_more_than_max_contours() {
        let mut img = white(240, 120);
        for row in 0..2 {
            for col in 0..6 {
                fill(&mut img, 10 + col * 38, 15 + row * 55, 14, 24);
            }
        }
        let config = GlyphConfig::default();
        let found = find_glyph_rects(&img, ChannelOrder::Rgb, &config);
        assert!(!found.rects.is_empty());
        assert!(found.rects.len() <= config.max_contours);
        assert!(found.rects.iter().all(|r| r.height >= config.min_height));
    }

    #[test]
    fn tall_mark_is_boxed_and_outlined() {
        let mut img = white(60, 60);
        fill(&mut img, 20, 15, 12, 30);
        let found = find_glyph_rects(&img, ChannelOrder::Rgb, &GlyphConfig::default());

        let outer = found.rects[0];
        assert!(outer.x.abs_diff(20) <= 4 && outer.y.abs_diff(15) <= 4, "{outer:?}");
        assert!(outer.height.abs_diff(30) <= 8, "{outer:?}");
        assert_eq!(*found.annotated.get_pixel(outer.x, outer.y), OUTLINE);
    }
}
