//! Tunables for every detection stage.
//!
//! Defaults are tuned for red-rimmed circular signs carrying dark digits.
//! Kernel sizes follow the usual computer-vision convention of a pixel
//! extent (`13` means a 13x13 window).

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{DetectError, Result};

/// Channel layout of the 3-channel buffers handed to the detector.
///
/// The HSV thresholds assume a true hue, so the converter has to know which
/// channel holds red. `image` decodes files as RGB; frames coming from
/// BGR-native sources must say so here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelOrder {
    #[default]
    Rgb,
    Bgr,
}

/// Inclusive per-channel bounds in 8-bit HSV (hue 0..=179, sat/val 0..=255).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HsvRange {
    pub lower: [u8; 3],
    pub upper: [u8; 3],
}

impl HsvRange {
    pub const fn new(lower: [u8; 3], upper: [u8; 3]) -> Self {
        Self { lower, upper }
    }

    pub fn contains(&self, hsv: [u8; 3]) -> bool {
        (0..3).all(|c| self.lower[c] <= hsv[c] && hsv[c] <= self.upper[c])
    }

    fn validate(&self, name: &str) -> Result<()> {
        if (0..3).any(|c| self.lower[c] > self.upper[c]) {
            return Err(DetectError::config(format!(
                "{name}: lower bound {:?} exceeds upper bound {:?}",
                self.lower, self.upper
            )));
        }
        Ok(())
    }
}

/// Red-region edge mask (first colour pass).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RedMaskConfig {
    /// Reds just above hue 0.
    pub low_band: HsvRange,
    /// Reds wrapping around below hue 180.
    pub high_band: HsvRange,
    /// Elliptical element for both openings, (width, height).
    pub open_kernel: (u32, u32),
    pub canny_low: f32,
    pub canny_high: f32,
    pub blur_kernel: u32,
}

impl Default for RedMaskConfig {
    fn default() -> Self {
        Self {
            low_band: HsvRange::new([0, 100, 65], [10, 255, 255]),
            high_band: HsvRange::new([155, 100, 70], [179, 255, 255]),
            open_kernel: (2, 2),
            canny_low: 50.0,
            canny_high: 100.0,
            blur_kernel: 13,
        }
    }
}

/// Gradient Hough circle search over the red mask.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CircleConfig {
    /// Minimum distance between accepted centers.
    pub min_dist: f32,
    /// Upper Canny threshold for the internal edge pass; the lower one is half.
    pub edge_threshold: f32,
    /// Votes a center needs, and edge support a radius needs.
    pub center_threshold: u32,
    pub min_radius: u32,
    /// `None` searches up to the larger image side.
    pub max_radius: Option<u32>,
}

impl Default for CircleConfig {
    fn default() -> Self {
        Self {
            min_dist: 100.0,
            edge_threshold: 30.0,
            center_threshold: 50,
            min_radius: 2,
            max_radius: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RoiConfig {
    /// The crop half-extent is `r - r / inset_divisor`, which trims the sign's border ring.
    pub inset_divisor: f32,
}

impl Default for RoiConfig {
    fn default() -> Self {
        Self { inset_divisor: 4.5 }
    }
}

/// Dark-glyph segmentation inside an ROI (second colour pass).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GlyphConfig {
    pub dark_band: HsvRange,
    pub close_kernel: (u32, u32),
    pub canny_low: f32,
    pub canny_high: f32,
    /// Smoothing between the two edge passes; 1 leaves the edges untouched.
    pub blur_kernel: u32,
    /// Only the largest contours by area are kept.
    pub max_contours: usize,
    /// Polygon approximation tolerance as a fraction of the contour perimeter.
    pub approx_epsilon: f64,
    pub min_height: u32,
}

impl Default for GlyphConfig {
    fn default() -> Self {
        Self {
            dark_band: HsvRange::new([0, 0, 0], [180, 255, 125]),
            close_kernel: (3, 3),
            canny_low: 100.0,
            canny_high: 300.0,
            blur_kernel: 1,
            max_contours: 5,
            approx_epsilon: 0.02,
            min_height: 15,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    pub channel_order: ChannelOrder,
    /// Denoising blur applied to the full image before the red pass.
    pub pre_blur_kernel: u32,
    pub red_mask: RedMaskConfig,
    pub circles: CircleConfig,
    pub roi: RoiConfig,
    pub glyphs: GlyphConfig,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            channel_order: ChannelOrder::default(),
            pre_blur_kernel: 7,
            red_mask: RedMaskConfig::default(),
            circles: CircleConfig::default(),
            roi: RoiConfig::default(),
            glyphs: GlyphConfig::default(),
        }
    }
}

impl DetectorConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read a JSON config file. Missing fields keep their defaults; the
    /// result is validated.
    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path).map_err(|source| DetectError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_json(&json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        validate_blur_kernel("pre_blur_kernel", self.pre_blur_kernel)?;

        let red = &self.red_mask;
        red.low_band.validate("red_mask.low_band")?;
        red.high_band.validate("red_mask.high_band")?;
        validate_structuring_element("red_mask.open_kernel", red.open_kernel)?;
        validate_canny("red_mask", red.canny_low, red.canny_high)?;
        validate_blur_kernel("red_mask.blur_kernel", red.blur_kernel)?;

        let circles = &self.circles;
        if !(circles.min_dist > 0.0) {
            return Err(DetectError::config("circles.min_dist must be positive"));
        }
        if !(circles.edge_threshold > 0.0) {
            return Err(DetectError::config("circles.edge_threshold must be positive"));
        }
        if circles.min_radius == 0 {
            return Err(DetectError::config("circles.min_radius must be at least 1"));
        }
        if let Some(max) = circles.max_radius {
            if max < circles.min_radius {
                return Err(DetectError::config(format!(
                    "circles.max_radius {max} is below min_radius {}",
                    circles.min_radius
                )));
            }
        }

        if !(self.roi.inset_divisor > 1.0) {
            return Err(DetectError::config("roi.inset_divisor must be greater than 1"));
        }
        // every accepted circle has to leave at least one pixel after the inset
        if crate::detection::roi::inset_radius(circles.min_radius, &self.roi) == 0 {
            return Err(DetectError::config(format!(
                "circles.min_radius {} leaves an empty ROI after the inset",
                circles.min_radius
            )));
        }

        let glyphs = &self.glyphs;
        glyphs.dark_band.validate("glyphs.dark_band")?;
        validate_structuring_element("glyphs.close_kernel", glyphs.close_kernel)?;
        validate_canny("glyphs", glyphs.canny_low, glyphs.canny_high)?;
        validate_blur_kernel("glyphs.blur_kernel", glyphs.blur_kernel)?;
        if glyphs.max_contours == 0 {
            return Err(DetectError::config("glyphs.max_contours must be at least 1"));
        }
        if !(glyphs.approx_epsilon > 0.0) {
            return Err(DetectError::config("glyphs.approx_epsilon must be positive"));
        }

        Ok(())
    }
}

fn validate_blur_kernel(name: &str, size: u32) -> Result<()> {
    if size == 0 || size % 2 == 0 {
        return Err(DetectError::config(format!(
            "{name} must be a positive odd size, got {size}"
        )));
    }
    Ok(())
}

fn validate_structuring_element(name: &str, (width, height): (u32, u32)) -> Result<()> {
    // imageproc masks are limited to a 511x511 footprint
    if width == 0 || height == 0 || width > 511 || height > 511 {
        return Err(DetectError::config(format!(
            "{name} must be between 1x1 and 511x511, got {width}x{height}"
        )));
    }
    Ok(())
}

fn validate_canny(name: &str, low: f32, high: f32) -> Result<()> {
    if !(low >= 0.0) || !(high >= low) {
        return Err(DetectError::config(format!(
            "{name}: canny thresholds must satisfy 0 <= low <= high, got {low}/{high}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        DetectorConfig::default().validate().unwrap();
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config = DetectorConfig::from_json(
            r#"{ "channel_order": "bgr", "glyphs": { "min_height": 20 } }"#,
        )
        .unwrap();
        assert_eq!(config.channel_order, ChannelOrder::Bgr);
        assert_eq!(config.glyphs.min_height, 20);
        assert_eq!(config.glyphs.max_contours, 5);
        assert_eq!(config.pre_blur_kernel, 7);
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        assert!(matches!(
            DetectorConfig::from_json("{ \"pre_blur_kernel\": \"seven\" }"),
            Err(DetectError::ConfigParse(_))
        ));
    }

    #[test]
    fn even_blur_kernel_is_rejected() {
        let mut config = DetectorConfig::default();
        config.red_mask.blur_kernel = 12;
        assert!(matches!(
            config.validate(),
            Err(DetectError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn inverted_hsv_range_is_rejected() {
        let mut config = DetectorConfig::default();
        config.glyphs.dark_band = HsvRange::new([0, 0, 200], [180, 255, 100]);
        assert!(config.validate().is_err());
    }

    #[test]
    fn radius_that_insets_to_nothing_is_rejected() {
        let mut config = DetectorConfig::default();
        config.circles.min_radius = 1;
        assert!(config.validate().is_err());
        config.circles.min_radius = 2;
        config.roi.inset_divisor = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn hsv_range_is_inclusive() {
        let band = HsvRange::new([0, 100, 65], [10, 255, 255]);
        assert!(band.contains([0, 100, 65]));
        assert!(band.contains([10, 255, 255]));
        assert!(!band.contains([11, 255, 255]));
        assert!(!band.contains([5, 99, 200]));
    }
}
