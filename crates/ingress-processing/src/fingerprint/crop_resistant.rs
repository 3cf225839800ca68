//! Crop-resistant hash
//!
//! The image is reduced to a blurred 300x300 grayscale map and thresholded. Every
//! 4-connected bright region ("hill") and then every dark region ("valley") larger
//! than the minimum segment size becomes a segment. Each segment's bounding box is
//! mapped back onto the original image, and the crop is hashed with a gradient hash.
//! The result is the list of segment hashes in discovery order, comma-joined.

use super::luma_601;
use image::imageops::{self, FilterType};
use image::{DynamicImage, GrayImage};
use image_hasher::{HashAlg, HasherConfig};
use imageproc::filter::median_filter;
use ingress_core::constants::{SEGMENTATION_IMAGE_SIZE, SEGMENT_THRESHOLD};

const BLUR_SIGMA: f32 = 2.0;
const SEGMENT_HASH_SIZE: u32 = 8;

/// Bounding box and size of one connected region of the segmentation map.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment {
    pub min_row: u32,
    pub min_col: u32,
    pub max_row: u32,
    pub max_col: u32,
    pub pixels: usize,
}

impl Segment {
    fn whole(size: u32) -> Self {
        Segment {
            min_row: 0,
            min_col: 0,
            max_row: size - 1,
            max_col: size - 1,
            pixels: (size * size) as usize,
        }
    }
}

/// Flood fill from `start` over unassigned pixels with the same threshold class.
fn fill_region(
    bright: &[bool],
    assigned: &mut [bool],
    width: usize,
    height: usize,
    start: usize,
) -> Segment {
    let class = bright[start];
    let mut segment = Segment {
        min_row: u32::MAX,
        min_col: u32::MAX,
        max_row: 0,
        max_col: 0,
        pixels: 0,
    };

    let mut stack = vec![start];
    assigned[start] = true;

    while let Some(index) = stack.pop() {
        let row = index / width;
        let col = index % width;

        segment.pixels += 1;
        segment.min_row = segment.min_row.min(row as u32);
        segment.max_row = segment.max_row.max(row as u32);
        segment.min_col = segment.min_col.min(col as u32);
        segment.max_col = segment.max_col.max(col as u32);

        let mut visit = |neighbor: usize| {
            if !assigned[neighbor] && bright[neighbor] == class {
                assigned[neighbor] = true;
                stack.push(neighbor);
            }
        };

        if row > 0 {
            visit(index - width);
        }
        if row + 1 < height {
            visit(index + width);
        }
        if col > 0 {
            visit(index - 1);
        }
        if col + 1 < width {
            visit(index + 1);
        }
    }

    segment
}

/// Segment a thresholded map: hills first, then valleys, each in row-major order of
/// their first pixel. Only segments with more than `min_segment_size` pixels are kept.
pub fn find_segments(map: &GrayImage, threshold: u8, min_segment_size: usize) -> Vec<Segment> {
    let width = map.width() as usize;
    let height = map.height() as usize;
    let bright: Vec<bool> = map.pixels().map(|p| p.0[0] > threshold).collect();
    let mut assigned = vec![false; bright.len()];
    let mut segments = Vec::new();

    for wanted in [true, false] {
        for start in 0..bright.len() {
            if assigned[start] || bright[start] != wanted {
                continue;
            }
            let segment = fill_region(&bright, &mut assigned, width, height, start);
            if segment.pixels > min_segment_size {
                segments.push(segment);
            }
        }
    }

    segments
}

/// Blurred, median-filtered grayscale map the segments are found on.
fn segmentation_map(img: &DynamicImage) -> GrayImage {
    let gray = luma_601(&img.to_rgb8());
    let resized = imageops::resize(
        &gray,
        SEGMENTATION_IMAGE_SIZE,
        SEGMENTATION_IMAGE_SIZE,
        FilterType::Lanczos3,
    );
    let blurred = imageops::blur(&resized, BLUR_SIGMA);
    median_filter(&blurred, 1, 1)
}

/// Pixel rectangle `(x, y, width, height)` of `segment` in an image of the given size.
fn crop_box(segment: &Segment, width: u32, height: u32) -> (u32, u32, u32, u32) {
    let scale_w = width as f64 / SEGMENTATION_IMAGE_SIZE as f64;
    let scale_h = height as f64 / SEGMENTATION_IMAGE_SIZE as f64;

    let x0 = (segment.min_col as f64 * scale_w).round() as u32;
    let y0 = (segment.min_row as f64 * scale_h).round() as u32;
    let x1 = ((segment.max_col + 1) as f64 * scale_w).round() as u32;
    let y1 = ((segment.max_row + 1) as f64 * scale_h).round() as u32;

    let x0 = x0.min(width.saturating_sub(1));
    let y0 = y0.min(height.saturating_sub(1));
    let x1 = x1.clamp(x0 + 1, width.max(1));
    let y1 = y1.clamp(y0 + 1, height.max(1));

    (x0, y0, x1 - x0, y1 - y0)
}

pub fn crop_resistant_hash(img: &DynamicImage, min_segment_size: usize) -> String {
    let map = segmentation_map(img);
    let mut segments = find_segments(&map, SEGMENT_THRESHOLD, min_segment_size);
    if segments.is_empty() {
        segments.push(Segment::whole(SEGMENTATION_IMAGE_SIZE));
    }

    let hasher = HasherConfig::new()
        .hash_size(SEGMENT_HASH_SIZE, SEGMENT_HASH_SIZE)
        .hash_alg(HashAlg::Gradient)
        .to_hasher();

    let (width, height) = (img.width(), img.height());

    segments
        .iter()
        .map(|segment| {
            let (x, y, w, h) = crop_box(segment, width, height);
            let crop = img.crop_imm(x, y, w, h);
            hex::encode(hasher.hash_image(&crop).as_bytes())
        })
        .collect::<Vec<_>>()
        .join(",")
}
