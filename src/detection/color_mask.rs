use image::GrayImage;

use crate::config::RedMaskConfig;
use crate::detection::preprocessing::{self, HsvImage};

/// Build the edge mask of red regions from an HSV image.
///
/// Red wraps around the hue circle, so two bands are thresholded and merged.
/// The blobs are then cleaned, reduced to outlines and softened so nearby
/// edge fragments join into one band for the circle search.
pub fn red_edge_mask(hsv: &HsvImage, config: &RedMaskConfig) -> GrayImage {
    let low = preprocessing::in_range(hsv, &config.low_band);
    let high = preprocessing::in_range(hsv, &config.high_band);
    let mask = preprocessing::union(&low, &high);

    let (kw, kh) = config.open_kernel;
    let element = preprocessing::ellipse_element(kw, kh);

    let mask = preprocessing::open(&mask, &element);
    let mask = preprocessing::detect_edges(&mask, config.canny_low, config.canny_high);
    let mask = preprocessing::blur_gray(&mask, config.blur_kernel);
    preprocessing::open(&mask, &element)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ChannelOrder;
    use image::{Rgb, RgbImage};

    fn disk(color: Rgb<u8>) -> RgbImage {
        RgbImage::from_fn(80, 80, |x, y| {
            let dx = x as f32 - 40.0;
            let dy = y as f32 - 40.0;
            if dx * dx + dy * dy <= 20.0 * 20.0 {
                color
            } else {
                Rgb([255, 255, 255])
            }
        })
    }

    #[test]
    fn red_disk_produces_ring_of_edges() {
        let hsv = preprocessing::to_hsv(&disk(Rgb([230, 20, 20])), ChannelOrder::Rgb);
        let mask = red_edge_mask(&hsv, &RedMaskConfig::default());

        assert_eq!(mask.dimensions(), (80, 80));
        // edge band on the rim, nothing at the center of the filled disk
        assert!(mask.get_pixel(60, 40).0[0] > 0);
        assert!(mask.get_pixel(40, 20).0[0] > 0);
        assert_eq!(mask.get_pixel(40, 40).0[0], 0);
        assert_eq!(mask.get_pixel(2, 2).0[0], 0);
    }

    #[test]
    fn blue_disk_is_ignored() {
        let hsv = preprocessing::to_hsv(&disk(Rgb([20, 20, 230])), ChannelOrder::Rgb);
        let mask = red_edge_mask(&hsv, &RedMaskConfig::default());
        assert!(mask.pixels().all(|p| p.0[0] == 0));
    }
}
