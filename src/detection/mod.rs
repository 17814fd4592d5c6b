pub mod preprocessing;
pub mod color_mask;
pub mod circles;
pub mod roi;
pub mod contours;
pub mod rects;

use image::{GrayImage, RgbImage};
use rayon::prelude::*;

use crate::config::DetectorConfig;
use crate::error::{Result, ensure_non_empty};
use crate::models::{Glyph, GlyphRects, Roi, SignDetection};

/// Locates circular red signs and cuts digit candidates out of them.
///
/// Holds only configuration; every call is independent, so one detector can
/// be shared across threads.
#[derive(Debug, Clone)]
pub struct SignDetector {
    config: DetectorConfig,
}

impl SignDetector {
    pub fn new(config: DetectorConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    /// Red-edge mask of the denoised image.
    pub fn red_mask(&self, image: &RgbImage) -> Result<GrayImage> {
        ensure_non_empty(image.width(), image.height())?;

        let blurred = preprocessing::blur_rgb(image, self.config.pre_blur_kernel);
        let hsv = preprocessing::to_hsv(&blurred, self.config.channel_order);
        Ok(color_mask::red_edge_mask(&hsv, &self.config.red_mask))
    }

    /// Find sign candidates in a full image.
    ///
    /// ROIs are cut from the unblurred input and line up with
    /// `circles` by index. No circles is a normal, empty result.
    pub fn detect_signs(&self, image: &RgbImage) -> Result<SignDetection> {
        let mask = self.red_mask(image)?;
        let circles = circles::find_circles(&mask, &self.config.circles);

        let rois = circles
            .iter()
            .map(|&circle| roi::extract_roi(image, circle, &self.config.roi))
            .collect::<Result<Vec<Roi>>>()?;

        tracing::info!(
            width = image.width(),
            height = image.height(),
            signs = circles.len(),
            "sign detection finished"
        );

        Ok(SignDetection { mask, circles, rois })
    }

    /// Candidate glyph boxes inside an ROI plus an outlined copy for inspection.
    pub fn find_glyph_rects(&self, roi: &RgbImage) -> Result<GlyphRects> {
        ensure_non_empty(roi.width(), roi.height())?;
        Ok(contours::find_glyph_rects(
            roi,
            self.config.channel_order,
            &self.config.glyphs,
        ))
    }

    /// Crop the digit candidates out of an ROI, nested boxes removed.
    ///
    /// Glyphs follow the area ranking of their boxes. An ROI without dark
    /// marks gives an empty list.
    pub fn extract_digits(&self, roi: &RgbImage) -> Result<Vec<Glyph>> {
        let found = self.find_glyph_rects(roi)?;
        let kept = rects::eliminate_nested(&found.rects);
        tracing::debug!(
            candidates = found.rects.len(),
            kept = kept.len(),
            "nested glyph boxes removed"
        );

        kept.into_iter()
            .map(|rect| {
                let bounds = roi::crop_bounds(
                    roi,
                    rect.x as i64,
                    rect.y as i64,
                    rect.right() as i64,
                    rect.bottom() as i64,
                )?;
                Ok(Glyph {
                    image: roi::crop(roi, bounds),
                    bounds,
                })
            })
            .collect()
    }

    /// [`Self::extract_digits`] for many ROIs at once, in parallel.
    /// The outer list follows the order of `rois`.
    pub fn extract_all_digits(&self, rois: &[Roi]) -> Result<Vec<Vec<Glyph>>> {
        rois.par_iter()
            .map(|roi| self.extract_digits(&roi.image))
            .collect()
    }
}

impl Default for SignDetector {
    fn default() -> Self {
        Self {
            config: DetectorConfig::default(),
        }
    }
}

/// [`SignDetector::detect_signs`] with default settings.
pub fn detect_signs(image: &RgbImage) -> Result<SignDetection> {
    SignDetector::default().detect_signs(image)
}

/// [`SignDetector::extract_digits`] with default settings.
pub fn extract_digits(roi: &RgbImage) -> Result<Vec<Glyph>> {
    SignDetector::default().extract_digits(roi)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DetectError;

    #[test]
    fn invalid_config_is_refused() {
        let mut config = DetectorConfig::default();
        config.glyphs.max_contours = 0;
        assert!(matches!(
            SignDetector::new(config),
            Err(DetectError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn empty_inputs_fail_fast() {
        let detector = SignDetector::default();
        let empty = RgbImage::new(0, 0);
        assert!(matches!(
            detector.detect_signs(&empty),
            Err(DetectError::EmptyImage { .. })
        ));
        assert!(matches!(
            detector.extract_digits(&RgbImage::new(10, 0)),
            Err(DetectError::EmptyImage { width: 10, height: 0 })
        ));
    }

    #[test]
    fn detector_is_shareable_across_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<SignDetector>();
    }
}
