use image::DynamicImage;
use image_hasher::{HashAlg, HasherConfig};

const HASH_SIZE: u32 = 8;

/// 64-bit DCT hash: low-frequency coefficients compared against their median.
pub fn perceptual_hash(img: &DynamicImage) -> String {
    let hasher = HasherConfig::new()
        .hash_size(HASH_SIZE, HASH_SIZE)
        .hash_alg(HashAlg::Median)
        .preproc_dct()
        .to_hasher();

    hex::encode(hasher.hash_image(img).as_bytes())
}
