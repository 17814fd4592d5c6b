use std::path::{Path, PathBuf};

use clap::Parser;
use image::ImageReader;
use tracing_subscriber::EnvFilter;

use signglyphs::{ChannelOrder, DetectorConfig, Glyph, SignDetection, SignDetector};

#[derive(Parser)]
#[command(name = "signglyphs")]
#[command(about = "Locate circular red signs and extract digit glyphs from them")]
struct Cli {
    /// Path to input image file
    #[arg(value_name = "IMAGE")]
    image_path: PathBuf,

    /// JSON detector configuration; missing fields keep their defaults
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Treat the decoded pixels as blue-green-red
    #[arg(long)]
    bgr: bool,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Save debug outputs to directory (must be empty)
    #[arg(long, value_name = "DIR")]
    debug_out: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    let args = Cli::parse();

    let default_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    let mut config = match &args.config {
        Some(path) => DetectorConfig::load(path)?,
        None => DetectorConfig::default(),
    };
    if args.bgr {
        config.channel_order = ChannelOrder::Bgr;
    }
    let detector = SignDetector::new(config)?;

    if let Some(dir) = &args.debug_out {
        prepare_debug_dir(dir)?;
    }

    tracing::info!(path = %args.image_path.display(), "loading image");
    let img = ImageReader::open(&args.image_path)?
        .decode()
        .map_err(|e| anyhow::anyhow!("Failed to decode image: {}", e))?
        .to_rgb8();

    let detection = detector.detect_signs(&img)?;
    let glyphs = detector.extract_all_digits(&detection.rois)?;

    if let Some(dir) = &args.debug_out {
        save_debug_outputs(dir, &detector, &detection, &glyphs)?;
    }

    println!("\n=== Sign Detection Results ===");
    println!("Total signs detected: {}", detection.circles.len());

    if detection.is_empty() {
        println!("No circular signs found.");
    }
    for (i, (circle, digits)) in detection.circles.iter().zip(&glyphs).enumerate() {
        println!(
            "  Sign {} at ({}, {}) radius {} - {} glyph(s)",
            i + 1,
            circle.x,
            circle.y,
            circle.radius,
            digits.len()
        );
        for glyph in digits {
            let b = glyph.bounds;
            println!("    glyph at ({}, {}) {}x{}", b.x, b.y, b.width, b.height);
        }
    }

    Ok(())
}

/// The directory must be empty or non-existent
fn prepare_debug_dir(dir: &Path) -> anyhow::Result<()> {
    if dir.exists() {
        if std::fs::read_dir(dir)?.count() > 0 {
            anyhow::bail!("Debug directory is not empty: {}", dir.display());
        }
    } else {
        std::fs::create_dir_all(dir)?;
    }
    Ok(())
}

fn save_debug_outputs(
    dir: &Path,
    detector: &SignDetector,
    detection: &SignDetection,
    glyphs: &[Vec<Glyph>],
) -> anyhow::Result<()> {
    let save_err = |e: image::ImageError| anyhow::anyhow!("Failed to save debug image: {}", e);

    detection.mask.save(dir.join("mask.png")).map_err(save_err)?;

    for (i, (roi, digits)) in detection.rois.iter().zip(glyphs).enumerate() {
        let n = i + 1;
        roi.image.save(dir.join(format!("roi_{n:02}.png"))).map_err(save_err)?;

        let annotated = detector.find_glyph_rects(&roi.image)?.annotated;
        annotated
            .save(dir.join(format!("roi_{n:02}_annotated.png")))
            .map_err(save_err)?;

        for (j, glyph) in digits.iter().enumerate() {
            glyph
                .image
                .save(dir.join(format!("roi_{n:02}_glyph_{:02}.png", j + 1)))
                .map_err(save_err)?;
        }
    }

    tracing::debug!(dir = %dir.display(), rois = detection.rois.len(), "debug images written");
    Ok(())
}
