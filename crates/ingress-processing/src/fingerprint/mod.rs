//! Fingerprint engine
//!
//! Three independent fingerprints are computed over the normalized image:
//!
//! - **crop-resistant**: comma-joined gradient hashes of the image's bright and dark
//!   regions; a crop keeps most regions intact, so most segment hashes survive.
//!   This is the dedup key.
//! - **perceptual**: 64-bit DCT hash of the whole image
//! - **color**: per-bin fractions of black, gray and hue buckets

pub mod color;
pub mod crop_resistant;
pub mod perceptual;

use crate::error::ProcessingError;
use image::{DynamicImage, GrayImage, RgbImage};
use ingress_core::models::FingerprintSet;
use ingress_core::PipelineSettings;
use std::path::Path;

/// Grayscale conversion with ITU-R 601-2 luma weights, rounded.
pub(crate) fn luma_601(rgb: &RgbImage) -> GrayImage {
    GrayImage::from_fn(rgb.width(), rgb.height(), |x, y| {
        let [r, g, b] = rgb.get_pixel(x, y).0;
        let l = (r as u32 * 19595 + g as u32 * 38470 + b as u32 * 7471 + 0x8000) >> 16;
        image::Luma([l as u8])
    })
}

#[derive(Debug, Clone)]
pub struct FingerprintEngine {
    min_segment_size: usize,
    color_bin_bits: u32,
}

impl FingerprintEngine {
    pub fn new(min_segment_size: usize, color_bin_bits: u32) -> Self {
        Self {
            min_segment_size,
            color_bin_bits,
        }
    }

    pub fn from_settings(settings: &PipelineSettings) -> Self {
        Self::new(settings.min_segment_size, settings.color_hash_bin_bits)
    }

    /// Fingerprint the image stored at `path`.
    pub fn fingerprint(&self, path: &Path) -> Result<FingerprintSet, ProcessingError> {
        let start = std::time::Instant::now();
        let img = image::open(path).map_err(|e| ProcessingError::Decode(e.to_string()))?;
        let set = self.fingerprint_image(&img);

        tracing::debug!(
            path = %path.display(),
            crop_resistant_hash = %set.crop_resistant_hash,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Fingerprints computed"
        );

        Ok(set)
    }

    pub fn fingerprint_image(&self, img: &DynamicImage) -> FingerprintSet {
        FingerprintSet {
            crop_resistant_hash: crop_resistant::crop_resistant_hash(img, self.min_segment_size),
            perceptual_hash: perceptual::perceptual_hash(img),
            color_hash: color::color_hash(img, self.color_bin_bits),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgb};
    use tempfile::tempdir;

    fn gradient(width: u32, height: u32) -> RgbImage {
        RgbImage::from_fn(width, height, |x, y| {
            Rgb([(x * 255 / width) as u8, (y * 255 / height) as u8, 96])
        })
    }

    #[test]
    fn luma_uses_601_weights() {
        let img = RgbImage::from_pixel(1, 1, Rgb([255, 0, 0]));
        assert_eq!(luma_601(&img).get_pixel(0, 0).0[0], 76);

        let img = RgbImage::from_pixel(1, 1, Rgb([255, 255, 255]));
        assert_eq!(luma_601(&img).get_pixel(0, 0).0[0], 255);
    }

    #[test]
    fn fingerprint_reads_from_disk() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("img.jpeg");
        gradient(200, 150)
            .save_with_format(&path, ImageFormat::Jpeg)
            .unwrap();

        let engine = FingerprintEngine::new(500, 3);
        let from_disk = engine.fingerprint(&path).unwrap();
        let again = engine.fingerprint(&path).unwrap();

        assert_eq!(from_disk, again);
        assert!(!from_disk.crop_resistant_hash.is_empty());
        assert_eq!(from_disk.perceptual_hash.len(), 16);
        assert_eq!(from_disk.color_hash.len(), 11);
    }

    #[test]
    fn fingerprint_rejects_non_images() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("broken.jpeg");
        std::fs::write(&path, b"definitely not a jpeg").unwrap();

        let result = FingerprintEngine::new(500, 3).fingerprint(&path);
        assert!(matches!(result, Err(ProcessingError::Decode(_))));
    }
}
