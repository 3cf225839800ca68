//! Test fixtures: generated images and request bodies.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use image::{ImageFormat, Rgb, RgbImage};
use std::io::Cursor;

/// Textured RGB image with bright and dark regions.
pub fn textured_image(width: u32, height: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
        let band = if (x / 40 + y / 30) % 2 == 0 { 200u32 } else { 40 };
        let noise = (x * 7 + y * 13) % 50;
        let v = (band + noise).min(255) as u8;
        Rgb([v, v.saturating_sub((x % 60) as u8), v / 2 + (y % 40) as u8])
    })
}

fn encode(img: &RgbImage, format: ImageFormat) -> Vec<u8> {
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, format)
        .expect("Failed to encode fixture image");
    out.into_inner()
}

pub fn png_bytes() -> Vec<u8> {
    encode(&textured_image(240, 180), ImageFormat::Png)
}

pub fn jpeg_bytes() -> Vec<u8> {
    encode(&textured_image(320, 200), ImageFormat::Jpeg)
}

pub fn base64_png() -> String {
    STANDARD.encode(png_bytes())
}

pub fn url_request(url: &str, classification: &str) -> String {
    serde_json::json!({
        "url": url,
        "classification": classification,
        "data_source": "url",
        "origin": "crawler",
        "group": "train",
    })
    .to_string()
}
