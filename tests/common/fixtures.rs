use image::{Rgb, RgbImage};
use imageproc::drawing::draw_filled_circle_mut;
use signglyphs::{Circle, Rectangle, Roi};
use tempfile::NamedTempFile;

/// Colour constants for tests
pub const WHITE: Rgb<u8> = Rgb([255, 255, 255]);
pub const BLACK: Rgb<u8> = Rgb([0, 0, 0]);
pub const RED: Rgb<u8> = Rgb([255, 0, 0]);
pub const BLUE: Rgb<u8> = Rgb([0, 0, 255]);

pub fn blank(width: u32, height: u32) -> RgbImage {
    RgbImage::from_pixel(width, height, WHITE)
}

/// Paint `w x h` pixels starting at `(x, y)`.
pub fn fill_rect(img: &mut RgbImage, x: u32, y: u32, w: u32, h: u32, color: Rgb<u8>) {
    for yy in y..y + h {
        for xx in x..x + w {
            img.put_pixel(xx, yy, color);
        }
    }
}

/// White scene with a solid red disk.
pub fn red_disk_scene(width: u32, height: u32, center: (i32, i32), radius: i32) -> RgbImage {
    let mut img = blank(width, height);
    draw_filled_circle_mut(&mut img, center, radius, RED);
    img
}

/// A block digit "8": solid dark slab with two stacked white counters.
///
/// The slab covers `(17, 8)` to `(43, 52)` of a 60x60 ROI.
pub fn eight_roi() -> RgbImage {
    let mut img = blank(60, 60);
    fill_rect(&mut img, 17, 8, 26, 44, BLACK);
    fill_rect(&mut img, 23, 13, 14, 15, WHITE);
    fill_rect(&mut img, 23, 32, 14, 15, WHITE);
    img
}

pub const EIGHT_BOUNDS: Rectangle = Rectangle {
    x: 17,
    y: 8,
    width: 26,
    height: 44,
};

/// Two separate 12x20 bars in an 80x50 ROI.
pub fn two_bars_roi() -> (RgbImage, [Rectangle; 2]) {
    let bars = [
        Rectangle {
            x: 15,
            y: 15,
            width: 12,
            height: 20,
        },
        Rectangle {
            x: 50,
            y: 15,
            width: 12,
            height: 20,
        },
    ];
    let mut img = blank(80, 50);
    for bar in &bars {
        fill_rect(&mut img, bar.x, bar.y, bar.width, bar.height, BLACK);
    }
    (img, bars)
}

/// A red-rimmed sign with a white face and two dark bars in the middle,
/// centered at `(120, 120)` in a 240x240 scene.
pub fn sign_scene() -> RgbImage {
    let mut img = blank(240, 240);
    draw_filled_circle_mut(&mut img, (120, 120), 80, RED);
    draw_filled_circle_mut(&mut img, (120, 120), 60, WHITE);
    fill_rect(&mut img, 100, 105, 14, 30, BLACK);
    fill_rect(&mut img, 126, 105, 14, 30, BLACK);
    img
}

/// Wraps an image as an ROI without going through circle detection.
pub fn roi_from(image: RgbImage) -> Roi {
    let (width, height) = image.dimensions();
    Roi {
        image,
        bounds: Rectangle::new(0, 0, width, height),
        circle: Circle {
            x: width / 2,
            y: height / 2,
            radius: width.max(height) / 2,
        },
    }
}

/// Writes `json` to a temp file that is cleaned up when dropped.
pub fn write_config(json: &str) -> NamedTempFile {
    let file = tempfile::Builder::new()
        .suffix(".json")
        .tempfile()
        .expect("Failed to create temp config file");
    std::fs::write(file.path(), json).expect("Failed to write config");
    file
}
