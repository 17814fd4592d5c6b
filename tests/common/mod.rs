mod fixtures;
pub use fixtures::*;

// Re-export commonly used types from signglyphs for tests
pub use signglyphs::{Circle, DetectorConfig, Glyph, Rectangle, Roi, SignDetector};
