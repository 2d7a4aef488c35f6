//! Image preprocessing for OCR and segmentation

use image::imageops::{self, FilterType};
use image::{GrayImage, Rgba, RgbaImage};
use imageproc::contrast::{otsu_level, threshold, ThresholdType};
use imageproc::edges::canny;

/// Text lines shorter than this are upscaled before thresholding
pub const MIN_TEXT_HEIGHT: u32 = 40;
/// Height small text is upscaled to
pub const UPSCALED_TEXT_HEIGHT: u32 = 45;

/// Canny hysteresis thresholds
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EdgeThresholds {
    pub low: f32,
    pub high: f32,
}

impl Default for EdgeThresholds {
    fn default() -> Self {
        Self {
            low: 30.0,
            high: 50.0,
        }
    }
}

/// Two-tone mask for OCR: grayscale, Otsu threshold, optionally inverted
/// so that light text on dark panels becomes dark on light.
pub fn binarize(image: &RgbaImage, invert: bool) -> GrayImage {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return GrayImage::new(0, 0);
    }

    let gray = if height < MIN_TEXT_HEIGHT {
        let scale = UPSCALED_TEXT_HEIGHT as f32 / height as f32;
        let scaled_width = ((width as f32 * scale).round() as u32).max(1);
        let scaled = imageops::resize(image, scaled_width, UPSCALED_TEXT_HEIGHT, FilterType::CatmullRom);
        imageops::grayscale(&scaled)
    } else {
        imageops::grayscale(image)
    };

    let level = otsu_level(&gray);
    let kind = if invert {
        ThresholdType::BinaryInverted
    } else {
        ThresholdType::Binary
    };
    threshold(&gray, level, kind)
}

/// Edge map with the default thresholds
pub fn detect_edges(image: &RgbaImage) -> GrayImage {
    detect_edges_with(image, EdgeThresholds::default())
}

/// Canny edge map of the grayscale image
pub fn detect_edges_with(image: &RgbaImage, thresholds: EdgeThresholds) -> GrayImage {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return GrayImage::new(0, 0);
    }
    canny(&imageops::grayscale(image), thresholds.low, thresholds.high)
}

/// True if `color` is closer to `reference` than to `other`
pub fn closer_to(color: Rgba<u8>, reference: Rgba<u8>, other: Rgba<u8>) -> bool {
    squared_distance(color, reference) < squared_distance(color, other)
}

fn squared_distance(a: Rgba<u8>, b: Rgba<u8>) -> u32 {
    a.0.iter()
        .zip(b.0.iter())
        .take(3)
        .map(|(&x, &y)| {
            let d = u32::from(x.abs_diff(y));
            d * d
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;
    use imageproc::drawing::draw_filled_rect_mut;
    use imageproc::rect::Rect;

    fn text_like(width: u32, height: u32) -> RgbaImage {
        let mut image = RgbaImage::from_pixel(width, height, Rgba([40, 30, 20, 255]));
        draw_filled_rect_mut(
            &mut image,
            Rect::at(width as i32 / 4, height as i32 / 4).of_size(width / 2, height / 2),
            Rgba([230, 220, 200, 255]),
        );
        image
    }

    #[test]
    fn test_binarize_separates_text_from_panel() {
        let mask = binarize(&text_like(80, 60), false);
        assert_eq!(mask.dimensions(), (80, 60));
        assert_eq!(*mask.get_pixel(40, 30), Luma([255]));
        assert_eq!(*mask.get_pixel(2, 2), Luma([0]));

        let inverted = binarize(&text_like(80, 60), true);
        assert_eq!(*inverted.get_pixel(40, 30), Luma([0]));
        assert_eq!(*inverted.get_pixel(2, 2), Luma([255]));
    }

    #[test]
    fn test_binarize_upscales_small_text() {
        let mask = binarize(&text_like(60, 20), true);
        assert_eq!(mask.height(), UPSCALED_TEXT_HEIGHT);
        assert_eq!(mask.width(), 135);
    }

    #[test]
    fn test_empty_inputs() {
        assert_eq!(binarize(&RgbaImage::new(0, 0), true).dimensions(), (0, 0));
        assert_eq!(detect_edges(&RgbaImage::new(5, 0)).dimensions(), (0, 0));
    }

    #[test]
    fn test_detect_edges_outlines_rectangle() {
        let edges = detect_edges(&text_like(80, 60));
        let edge_pixels = edges.pixels().filter(|p| p[0] > 0).count();
        assert!(edge_pixels > 0);
        assert_eq!(*edges.get_pixel(40, 30), Luma([0]));
    }

    #[test]
    fn test_closer_to() {
        let brown = Rgba([216, 179, 126, 255]);
        let blue = Rgba([40, 60, 90, 255]);
        assert!(closer_to(Rgba([200, 170, 120, 255]), brown, blue));
        assert!(!closer_to(Rgba([50, 60, 80, 255]), brown, blue));
    }
}
