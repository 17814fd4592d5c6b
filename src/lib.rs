pub mod config;
pub mod detection;
pub mod error;
pub mod models;

pub use config::{ChannelOrder, DetectorConfig, HsvRange};
pub use detection::{SignDetector, detect_signs, extract_digits};
pub use error::{DetectError, Result};
pub use models::{Circle, Glyph, GlyphRects, Rectangle, Roi, SignDetection};
