//! Fixed-size derivative rendering.

use crate::error::ProcessingError;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::{self, FilterType};
use std::path::Path;

/// Renders the square thumbnail stored under `data_resized/`. The aspect ratio is
/// not preserved.
#[derive(Debug, Clone, Copy)]
pub struct DerivativeRenderer {
    size: u32,
    quality: u8,
}

impl DerivativeRenderer {
    pub fn new(size: u32, quality: u8) -> Self {
        Self { size, quality }
    }

    /// Read the normalized image at `path` and return the encoded derivative.
    pub fn render(&self, path: &Path) -> Result<Vec<u8>, ProcessingError> {
        let img = image::open(path).map_err(|e| ProcessingError::Decode(e.to_string()))?;
        let rgb = img.to_rgb8();

        // Triangle averages every source pixel under the kernel when shrinking
        let resized = imageops::resize(&rgb, self.size, self.size, FilterType::Triangle);

        let mut encoded = Vec::new();
        JpegEncoder::new_with_quality(&mut encoded, self.quality)
            .encode_image(&resized)
            .map_err(|e| ProcessingError::Encode(e.to_string()))?;

        tracing::debug!(
            path = %path.display(),
            width = self.size,
            height = self.size,
            size_bytes = encoded.len(),
            "Derivative rendered"
        );

        Ok(encoded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgb, RgbImage};
    use tempfile::tempdir;

    #[test]
    fn derivative_is_square_jpeg() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("wide.jpeg");
        RgbImage::from_fn(640, 120, |x, _| Rgb([(x % 256) as u8, 0, 0]))
            .save_with_format(&path, ImageFormat::Jpeg)
            .unwrap();

        let bytes = DerivativeRenderer::new(300, 95).render(&path).unwrap();
        let decoded = image::load_from_memory(&bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (300, 300));
        assert_eq!(image::guess_format(&bytes).unwrap(), ImageFormat::Jpeg);
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = tempdir().unwrap();
        let result = DerivativeRenderer::new(300, 95).render(&dir.path().join("missing.jpeg"));
        assert!(result.is_err());
    }
}
