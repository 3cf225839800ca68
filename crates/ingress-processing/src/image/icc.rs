//! ICC profile carry-over between the source container and the normalized JPEG.

use crate::error::ProcessingError;
use bytes::Bytes;
use img_parts::jpeg::Jpeg;
use img_parts::{DynImage, ImageICC};

/// Embedded ICC profile of a JPEG, PNG or WebP container, if any.
pub fn read_icc_profile(data: &[u8]) -> Option<Bytes> {
    DynImage::from_bytes(Bytes::copy_from_slice(data))
        .ok()
        .flatten()
        .and_then(|image| image.icc_profile())
}

/// Attach `profile` to an encoded JPEG.
pub fn embed_icc_profile(jpeg: Vec<u8>, profile: Bytes) -> Result<Vec<u8>, ProcessingError> {
    let mut jpeg =
        Jpeg::from_bytes(jpeg.into()).map_err(|e| ProcessingError::Encode(e.to_string()))?;
    jpeg.set_icc_profile(Some(profile));
    Ok(jpeg.encoder().bytes().to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{codecs::jpeg::JpegEncoder, RgbImage};

    fn jpeg_bytes() -> Vec<u8> {
        let img = RgbImage::from_pixel(16, 16, image::Rgb([10, 200, 30]));
        let mut out = Vec::new();
        JpegEncoder::new_with_quality(&mut out, 90)
            .encode_image(&img)
            .unwrap();
        out
    }

    #[test]
    fn plain_jpeg_has_no_profile() {
        assert!(read_icc_profile(&jpeg_bytes()).is_none());
    }

    #[test]
    fn embedded_profile_is_readable() {
        let profile = Bytes::from_static(b"fake icc profile payload");
        let tagged = embed_icc_profile(jpeg_bytes(), profile.clone()).unwrap();
        assert_eq!(read_icc_profile(&tagged), Some(profile));
    }

    #[test]
    fn garbage_has_no_profile() {
        assert!(read_icc_profile(b"not an image").is_none());
    }
}
