//! Color distribution hash
//!
//! Pixels fall into 14 bins: black, gray, six hues of faint color and six hues of
//! bright color. The fraction of pixels in each bin is quantized to `bin_bits` bits
//! and the bits are concatenated, most significant first, into a hex string.

use super::luma_601;
use image::DynamicImage;

const HUE_BINS: usize = 6;
const BLACK_BELOW: u8 = (256 / 8) as u8; // 32
const GRAY_BELOW: u8 = (256 / 3) as u8; // 85
const BRIGHT_ABOVE: u8 = (256 * 2 / 3) as u8; // 170

/// Hue and saturation on a 0-255 scale.
fn hue_saturation(r: u8, g: u8, b: u8) -> (u8, u8) {
    let maxc = r.max(g).max(b);
    let minc = r.min(g).min(b);
    if maxc == minc {
        return (0, 0);
    }

    let cr = (maxc - minc) as f32;
    let s = cr / maxc as f32;
    let rc = (maxc - r) as f32 / cr;
    let gc = (maxc - g) as f32 / cr;
    let bc = (maxc - b) as f32 / cr;

    let h = if r == maxc {
        bc - gc
    } else if g == maxc {
        2.0 + rc - bc
    } else {
        4.0 + gc - rc
    };
    let h = (h / 6.0 + 1.0) % 1.0;

    (
        ((h * 255.0) as i32).clamp(0, 255) as u8,
        ((s * 255.0) as i32).clamp(0, 255) as u8,
    )
}

fn hue_bin(hue: u8) -> usize {
    (hue as usize * HUE_BINS / 255).min(HUE_BINS - 1)
}

/// Quantized bin fractions: black, gray, six faint hues, six bright hues.
fn bin_values(img: &DynamicImage, bin_bits: u32) -> Vec<u32> {
    let rgb = img.to_rgb8();
    let intensity = luma_601(&rgb);
    let total = (rgb.width() as u64 * rgb.height() as u64).max(1);

    let mut black = 0u64;
    let mut gray = 0u64;
    let mut colored = 0u64;
    let mut faint = [0u64; HUE_BINS];
    let mut bright = [0u64; HUE_BINS];

    for (pixel, luma) in rgb.pixels().zip(intensity.pixels()) {
        let [r, g, b] = pixel.0;
        let (h, s) = hue_saturation(r, g, b);

        if luma.0[0] < BLACK_BELOW {
            black += 1;
            continue;
        }
        if s < GRAY_BELOW {
            gray += 1;
            continue;
        }
        colored += 1;
        // Saturation exactly at the boundary is counted as colored but lands in
        // neither the faint nor the bright histogram.
        if s < BRIGHT_ABOVE {
            faint[hue_bin(h)] += 1;
        } else if s > BRIGHT_ABOVE {
            bright[hue_bin(h)] += 1;
        }
    }

    let max_value = 1u64 << bin_bits;
    let colored = colored.max(1);
    let quantize = |count: u64, of: u64| ((count * max_value / of).min(max_value - 1)) as u32;

    let mut values = vec![quantize(black, total), quantize(gray, total)];
    values.extend(faint.iter().chain(bright.iter()).map(|&c| quantize(c, colored)));
    values
}

pub fn color_hash(img: &DynamicImage, bin_bits: u32) -> String {
    let bits: Vec<bool> = bin_values(img, bin_bits)
        .into_iter()
        .flat_map(|v| {
            (0..bin_bits).map(move |i| (v >> (bin_bits - i - 1)) % (1 << (bin_bits - i)) > 0)
        })
        .collect();

    let width = bits.len().div_ceil(4);
    let mut nibbles = vec![0u8; width];
    // Right-align the bit string so leading padding is zero.
    let offset = width * 4 - bits.len();
    for (i, bit) in bits.iter().enumerate() {
        if *bit {
            let pos = i + offset;
            nibbles[pos / 4] |= 8 >> (pos % 4);
        }
    }

    nibbles
        .iter()
        .map(|n| char::from_digit(*n as u32, 16).unwrap_or('0'))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    fn solid(color: [u8; 3]) -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_pixel(20, 20, Rgb(color)))
    }

    #[test]
    fn hue_saturation_matches_reference_points() {
        assert_eq!(hue_saturation(255, 0, 0), (0, 255));
        assert_eq!(hue_saturation(255, 255, 0).1, 255);
        assert_eq!(hue_saturation(128, 128, 128), (0, 0));
    }

    #[test]
    fn hue_bins_cover_full_range() {
        assert_eq!(hue_bin(0), 0);
        assert_eq!(hue_bin(42), 0);
        assert_eq!(hue_bin(43), 1);
        assert_eq!(hue_bin(170), 4);
        assert_eq!(hue_bin(255), 5);
    }

    #[test]
    fn black_image() {
        assert_eq!(color_hash(&solid([0, 0, 0]), 3), "38000000000");
    }

    #[test]
    fn white_image_is_gray() {
        assert_eq!(color_hash(&solid([255, 255, 255]), 3), "07000000000");
    }

    #[test]
    fn pure_red_is_bright_first_hue() {
        assert_eq!(color_hash(&solid([255, 0, 0]), 3), "00000038000");
    }

    #[test]
    fn half_black_half_gray() {
        let img = DynamicImage::ImageRgb8(RgbImage::from_fn(20, 20, |x, _| {
            if x < 10 {
                Rgb([0, 0, 0])
            } else {
                Rgb([128, 128, 128])
            }
        }));
        let values = bin_values(&img, 3);
        assert_eq!(values[0], 4);
        assert_eq!(values[1], 4);
        assert!(values[2..].iter().all(|v| *v == 0));
        // 4 encodes as 110
        assert_eq!(color_hash(&img, 3), "36000000000");
    }
}
