//! Fixed pipeline parameters.

/// JPEG quality used when re-encoding the normalized image.
pub const NORMALIZED_JPEG_QUALITY: u8 = 75;

/// Minimum number of pixels a segment needs before it contributes a hash.
pub const MIN_SEGMENT_SIZE: usize = 500;

/// Edge length of the square image the crop-resistant hash segments.
pub const SEGMENTATION_IMAGE_SIZE: u32 = 300;

/// Grayscale threshold separating "hill" and "valley" segments.
pub const SEGMENT_THRESHOLD: u8 = 128;

/// Bits per bin in the color hash.
pub const COLOR_HASH_BIN_BITS: u32 = 3;

/// Width and height of the uploaded derivative.
pub const DERIVATIVE_SIZE: u32 = 300;

/// JPEG quality of the uploaded derivative.
pub const DERIVATIVE_JPEG_QUALITY: u8 = 95;

/// Per-request timeout for HEAD and GET against remote links.
pub const HTTP_TIMEOUT_SECS: u64 = 10;

/// Maximum number of 301 hops followed while validating a link.
pub const MAX_REDIRECTS: u32 = 5;

/// Content types accepted for `url` sources.
pub const ALLOWED_CONTENT_TYPES: [&str; 2] = ["image/jpeg", "image/png"];

/// Prefix under which derivatives are written in the object store.
pub const DERIVATIVE_PREFIX: &str = "data_resized";

/// Suffix appended to keys of `s3_bucket` sourced images.
pub const SOURCE_OBJECT_SUFFIX: &str = ".jpg";

/// Message returned by the batch entrypoint for every batch.
pub const BATCH_ACK_MESSAGE: &str = "Batch processed";
