//! Image preprocessing before OCR
//!
//! The crop is reduced to single-channel intensity and binarized at its own
//! Otsu level.

use image::{DynamicImage, GrayImage, Luma, RgbaImage};
use imageproc::contrast::otsu_level;
use tracing::debug;

/// Prepare a crop for the OCR engine: single-channel, binarized
pub fn preprocess(crop: &RgbaImage) -> DynamicImage {
    let gray = DynamicImage::ImageRgba8(crop.clone()).to_luma8();
    let (binary, level) = binarize_otsu(&gray);
    debug!(
        "Binarized {}x{} crop at Otsu level {}",
        gray.width(),
        gray.height(),
        level
    );
    DynamicImage::ImageLuma8(binary)
}

/// Binarize with the Otsu level of the image itself
///
/// Pixels strictly above the level become white, the rest black.
/// Returns the binary image and the level used.
pub fn binarize_otsu(gray: &GrayImage) -> (GrayImage, u8) {
    let level = otsu_level(gray);
    let mut binary = gray.clone();
    for pixel in binary.pixels_mut() {
        *pixel = if pixel[0] > level { Luma([255]) } else { Luma([0]) };
    }
    (binary, level)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    /// Dark "ink" block on a light page, with mild noise on both
    fn page_with_ink(ink: u8, paper: u8) -> RgbaImage {
        RgbaImage::from_fn(40, 20, |x, y| {
            let jitter = ((x + y) % 3) as u8;
            if (10..30).contains(&x) && (5..15).contains(&y) {
                Rgba([ink + jitter, ink + jitter, ink + jitter, 255])
            } else {
                Rgba([paper - jitter, paper - jitter, paper - jitter, 255])
            }
        })
    }

    #[test]
    fn test_binarize_separates_ink_from_paper() {
        let gray = DynamicImage::ImageRgba8(page_with_ink(30, 220)).to_luma8();
        let (binary, level) = binarize_otsu(&gray);

        assert!(level >= 30 && level < 220, "level {} outside modes", level);
        assert_eq!(binary.get_pixel(20, 10), &Luma([0]));
        assert_eq!(binary.get_pixel(2, 2), &Luma([255]));
        assert!(binary.pixels().all(|p| p[0] == 0 || p[0] == 255));
    }

    #[test]
    fn test_threshold_follows_lighting() {
        // Same page under dim light: a fixed mid-gray cutoff would blacken it all
        let dim = DynamicImage::ImageRgba8(page_with_ink(10, 90)).to_luma8();
        let (binary, level) = binarize_otsu(&dim);

        assert!(level < 90);
        assert_eq!(binary.get_pixel(20, 10), &Luma([0]));
        assert_eq!(binary.get_pixel(2, 2), &Luma([255]));
    }

    #[test]
    fn test_preprocess_is_binary_luma() {
        let out = preprocess(&page_with_ink(30, 220));
        let luma = out.as_luma8().expect("expected single-channel output");
        assert_eq!(luma.dimensions(), (40, 20));
        assert!(luma.pixels().all(|p| p[0] == 0 || p[0] == 255));
        assert_eq!(luma.get_pixel(20, 10), &Luma([0]));
    }

    #[test]
    fn test_preprocess_binarizes_colored_crop() {
        // Blue ink on a yellow page still comes out black on white
        let crop = RgbaImage::from_fn(30, 10, |x, _| {
            if (10..20).contains(&x) {
                Rgba([20, 20, 160, 255])
            } else {
                Rgba([250, 230, 120, 255])
            }
        });
        let out = preprocess(&crop);
        let luma = out.as_luma8().expect("expected single-channel output");
        assert_eq!(luma.get_pixel(15, 5), &Luma([0]));
        assert_eq!(luma.get_pixel(2, 5), &Luma([255]));
    }
}
