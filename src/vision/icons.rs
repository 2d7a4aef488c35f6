//! Icon classification
//!
//! Observed icons are compared against the reference icons of the catalog.
//! Reference icons carry an alpha channel and are composited over the UI
//! background colour of the surface they appear on before comparison.

use image::imageops::{self, FilterType};
use image::{GrayImage, Rgba, RgbaImage};

use super::preprocess::detect_edges;
use super::GuidMatch;
use crate::catalog::{Guid, IconSet};

/// Largest accepted mean distance, summed over the four channels
pub const MAX_ICON_DISTANCE: f32 = 150.0;

/// Strategy for matching an observed icon against reference icons
pub trait IconMatcher {
    fn classify(&self, icon: &RgbaImage, references: &IconSet, background: Rgba<u8>) -> GuidMatch;
}

/// Alpha-composite `icon` over `background`, resized to the icon's size.
/// The result keeps the background's alpha.
pub fn blend_icon(icon: &RgbaImage, background: &RgbaImage) -> RgbaImage {
    let (width, height) = icon.dimensions();
    let backdrop = resized(background, width, height);

    RgbaImage::from_fn(width, height, |x, y| {
        let fg = icon.get_pixel(x, y);
        let bg = backdrop.get_pixel(x, y);
        let alpha = f32::from(fg[3]) / 255.0;
        let mix = |c: usize| (f32::from(bg[c]) * (1.0 - alpha) + f32::from(fg[c]) * alpha).round() as u8;
        Rgba([mix(0), mix(1), mix(2), bg[3]])
    })
}

fn resized(image: &RgbaImage, width: u32, height: u32) -> RgbaImage {
    if image.dimensions() == (width, height) {
        image.clone()
    } else {
        imageops::resize(image, width, height, FilterType::Triangle)
    }
}

/// Mean over all pixels of the absolute difference summed over the channels
fn mean_distance(a: &RgbaImage, b: &RgbaImage) -> f32 {
    let pixels = u64::from(a.width()) * u64::from(a.height());
    if pixels == 0 {
        return f32::MAX;
    }
    let total: u64 = a
        .as_raw()
        .iter()
        .zip(b.as_raw().iter())
        .map(|(&x, &y)| u64::from(x.abs_diff(y)))
        .sum();
    (total as f64 / pixels as f64) as f32
}

/// Pixel-wise comparison against composited templates
///
/// An icon showing only the background scores as well as any template that
/// is no closer, so empty slots do not match.
#[derive(Debug, Clone, Copy, Default)]
pub struct TemplateMatcher;

impl IconMatcher for TemplateMatcher {
    fn classify(&self, icon: &RgbaImage, references: &IconSet, background: Rgba<u8>) -> GuidMatch {
        let (width, height) = icon.dimensions();
        if width == 0 || height == 0 {
            return GuidMatch::NoMatch;
        }

        let backdrop = RgbaImage::from_pixel(width, height, background);
        let mut best = mean_distance(icon, &backdrop);
        let mut candidates = Vec::new();

        for (&guid, template) in references {
            if template.width() == 0 || template.height() == 0 {
                continue;
            }
            let composited = blend_icon(&resized(template, width, height), &backdrop);
            let score = mean_distance(icon, &composited);

            if score == best {
                candidates.push(guid);
            } else if score < best {
                candidates.clear();
                candidates.push(guid);
                best = score;
            }
        }

        log::trace!("Icon scores best {:.1} for {:?}", best, candidates);
        if best > MAX_ICON_DISTANCE {
            return GuidMatch::NoMatch;
        }
        GuidMatch::from_candidates(candidates)
    }
}

/// Shape comparison through the Hu invariants of the icon outline
///
/// Insensitive to scale and colour, but also to details that tell similar
/// icons apart, so the template matcher stays the default.
#[derive(Debug, Clone, Copy, Default)]
pub struct HuMomentMatcher;

const HU_EPSILON: f64 = 1e-5;

/// Seven Hu invariants of the edge map of `image`
pub fn hu_moments(image: &RgbaImage) -> [f64; 7] {
    invariants(&detect_edges(image))
}

fn invariants(edges: &GrayImage) -> [f64; 7] {
    let mut m = [[0.0f64; 4]; 4];
    for (x, y, p) in edges.enumerate_pixels() {
        let w = f64::from(p[0]);
        if w == 0.0 {
            continue;
        }
        let (x, y) = (f64::from(x), f64::from(y));
        for (i, row) in m.iter_mut().enumerate() {
            for (j, value) in row.iter_mut().enumerate().take(4 - i) {
                *value += w * x.powi(i as i32) * y.powi(j as i32);
            }
        }
    }

    let m00 = m[0][0];
    if m00 == 0.0 {
        return [0.0; 7];
    }
    let (cx, cy) = (m[1][0] / m00, m[0][1] / m00);

    let mu20 = m[2][0] - cx * m[1][0];
    let mu02 = m[0][2] - cy * m[0][1];
    let mu11 = m[1][1] - cx * m[0][1];
    let mu30 = m[3][0] - 3.0 * cx * m[2][0] + 2.0 * cx * cx * m[1][0];
    let mu03 = m[0][3] - 3.0 * cy * m[0][2] + 2.0 * cy * cy * m[0][1];
    let mu21 = m[2][1] - 2.0 * cx * m[1][1] - cy * m[2][0] + 2.0 * cx * cx * m[0][1];
    let mu12 = m[1][2] - 2.0 * cy * m[1][1] - cx * m[0][2] + 2.0 * cy * cy * m[1][0];

    let norm2 = m00 * m00;
    let norm3 = norm2 * m00.sqrt();
    let (n20, n02, n11) = (mu20 / norm2, mu02 / norm2, mu11 / norm2);
    let (n30, n03, n21, n12) = (mu30 / norm3, mu03 / norm3, mu21 / norm3, mu12 / norm3);

    let (a, b) = (n30 + n12, n21 + n03);
    [
        n20 + n02,
        (n20 - n02).powi(2) + 4.0 * n11 * n11,
        (n30 - 3.0 * n12).powi(2) + (3.0 * n21 - n03).powi(2),
        a * a + b * b,
        (n30 - 3.0 * n12) * a * (a * a - 3.0 * b * b)
            + (3.0 * n21 - n03) * b * (3.0 * a * a - b * b),
        (n20 - n02) * (a * a - b * b) + 4.0 * n11 * a * b,
        (3.0 * n21 - n03) * a * (a * a - 3.0 * b * b)
            - (n30 - 3.0 * n12) * b * (3.0 * a * a - b * b),
    ]
}

/// Log-scaled distance between two sets of invariants
pub fn hu_distance(a: &[f64; 7], b: &[f64; 7]) -> f64 {
    let log_scaled = |h: f64| h.signum() * h.abs().log10();
    let mut any_a = false;
    let mut any_b = false;
    let mut distance = 0.0;

    for (&ha, &hb) in a.iter().zip(b.iter()) {
        // Emptiness counts any non-zero invariant, the sum only significant ones
        any_a |= ha != 0.0;
        any_b |= hb != 0.0;
        if ha.abs() > HU_EPSILON && hb.abs() > HU_EPSILON {
            distance += (log_scaled(hb) - log_scaled(ha)).abs();
        }
    }

    if any_a != any_b {
        f64::INFINITY
    } else {
        distance
    }
}

impl IconMatcher for HuMomentMatcher {
    fn classify(&self, icon: &RgbaImage, references: &IconSet, background: Rgba<u8>) -> GuidMatch {
        let (width, height) = icon.dimensions();
        if width == 0 || height == 0 {
            return GuidMatch::NoMatch;
        }

        let observed = hu_moments(icon);
        let backdrop = RgbaImage::from_pixel(width, height, background);
        let mut best = f64::INFINITY;
        let mut candidates: Vec<Guid> = Vec::new();

        for (&guid, template) in references {
            if template.width() == 0 || template.height() == 0 {
                continue;
            }
            let composited = blend_icon(&resized(template, width, height), &backdrop);
            let distance = hu_distance(&observed, &hu_moments(&composited));
            if !distance.is_finite() {
                continue;
            }

            if distance == best {
                candidates.push(guid);
            } else if distance < best {
                candidates.clear();
                candidates.push(guid);
                best = distance;
            }
        }

        GuidMatch::from_candidates(candidates)
    }
}
