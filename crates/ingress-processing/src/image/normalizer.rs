//! Normalizer - re-encodes fetched images as RGB JPEG

use crate::error::ProcessingError;
use crate::image::icc;
use image::codecs::jpeg::JpegEncoder;
use image::ImageReader;
use std::io::Cursor;
use std::path::{Path, PathBuf};

/// Converts any decodable image into an RGB JPEG at a fixed quality, keeping the
/// embedded ICC profile. Alpha is discarded.
#[derive(Debug, Clone, Copy)]
pub struct Normalizer {
    quality: u8,
}

impl Normalizer {
    pub fn new(quality: u8) -> Self {
        Self { quality }
    }

    /// Normalize the file at `input` and write the result next to it with a `.jpeg`
    /// extension. Returns the output path; a `.jpeg` input is overwritten in place.
    pub fn normalize(&self, input: &Path) -> Result<PathBuf, ProcessingError> {
        let data = std::fs::read(input)?;
        let jpeg = self.normalize_bytes(&data)?;

        let output = input.with_extension("jpeg");
        std::fs::write(&output, &jpeg)?;

        tracing::debug!(
            input = %input.display(),
            output = %output.display(),
            input_bytes = data.len(),
            output_bytes = jpeg.len(),
            "Image normalized"
        );

        Ok(output)
    }

    pub fn normalize_bytes(&self, data: &[u8]) -> Result<Vec<u8>, ProcessingError> {
        let img = ImageReader::new(Cursor::new(data))
            .with_guessed_format()
            .map_err(|e| ProcessingError::Decode(e.to_string()))?
            .decode()
            .map_err(|e| ProcessingError::Decode(e.to_string()))?;

        let rgb = img.to_rgb8();
        let mut encoded = Vec::with_capacity((rgb.width() * rgb.height()) as usize);
        JpegEncoder::new_with_quality(&mut encoded, self.quality)
            .encode_image(&rgb)
            .map_err(|e| ProcessingError::Encode(e.to_string()))?;

        match icc::read_icc_profile(data) {
            Some(profile) => icc::embed_icc_profile(encoded, profile),
            None => Ok(encoded),
        }
    }
}
