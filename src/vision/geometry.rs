//! Resolution independent layout geometry
//!
//! The game lays out its UI in a 16:9 safe area whose size follows the
//! window height. Panels are pinned to the left edge, the center or the
//! right edge of the window, so the pixel position of a panel depends on
//! where its center lies in the reference frame.

use image::imageops;
use image::RgbaImage;
use imageproc::point::Point;
use serde::{Deserialize, Serialize};

/// Rectangle in normalized coordinates of the 16:9 reference frame
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NormalizedRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl NormalizedRect {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Rectangle spanned by its top-left and bottom-right corners
    pub const fn from_corners(left: f32, top: f32, right: f32, bottom: f32) -> Self {
        Self::new(left, top, right - left, bottom - top)
    }

    /// Horizontal center in the reference frame
    pub fn horizontal_center(&self) -> f32 {
        self.x + 0.5 * self.width
    }

    /// Window edge the rectangle is pinned to
    pub fn anchor(&self) -> Anchor {
        let center = self.horizontal_center();
        if center > 0.66 {
            Anchor::Right
        } else if center > 0.33 {
            Anchor::Center
        } else {
            Anchor::Left
        }
    }
}

/// Window edge a panel is pinned to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anchor {
    Left,
    Center,
    Right,
}

/// Axis-aligned pixel rectangle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Region {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Region {
    pub const fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// First column past the region
    pub fn right(&self) -> u32 {
        self.x + self.width
    }

    /// First row past the region
    pub fn bottom(&self) -> u32 {
        self.y + self.height
    }

    /// True if the region has no pixels
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// True if the overlap has a positive area
    pub fn intersects(&self, other: &Region) -> bool {
        self.x < other.right()
            && other.x < self.right()
            && self.y < other.bottom()
            && other.y < self.bottom()
    }

    /// Restrict to an image of the given size
    pub fn clamp_to(&self, width: u32, height: u32) -> Region {
        let x = self.x.min(width);
        let y = self.y.min(height);
        Region::new(
            x,
            y,
            self.width.min(width - x),
            self.height.min(height - y),
        )
    }

    /// Bounding box of a point set
    pub fn bounding(points: &[Point<i32>]) -> Option<Region> {
        let first = points.first()?;
        let (mut left, mut top, mut right, mut bottom) = (first.x, first.y, first.x, first.y);
        for p in points {
            left = left.min(p.x);
            top = top.min(p.y);
            right = right.max(p.x);
            bottom = bottom.max(p.y);
        }
        let left = left.max(0);
        let top = top.max(0);
        Some(Region::new(
            left as u32,
            top as u32,
            (right - left + 1).max(0) as u32,
            (bottom - top + 1).max(0) as u32,
        ))
    }
}

/// Left edge of `rect` in pixels, before clamping
fn anchored_left(width: u32, height: u32, rect: &NormalizedRect) -> f32 {
    let cols = width as f32 - 1.0;
    let rows = height as f32 - 1.0;
    let normal_cols = 16.0 * rows / 9.0;
    let x = normal_cols * rect.x;

    match rect.anchor() {
        Anchor::Right => cols - normal_cols + x,
        Anchor::Center => x - 0.5 * normal_cols + 0.5 * cols,
        Anchor::Left => x,
    }
}

/// Pixel region of a pane inside an image of size `dims`
pub fn pane_region(dims: (u32, u32), rect: &NormalizedRect) -> Option<Region> {
    let (width, height) = dims;
    if width == 0 || height == 0 {
        return None;
    }

    let rows = height as f32 - 1.0;
    let normal_cols = 16.0 * rows / 9.0;
    let region = Region::new(
        anchored_left(width, height, rect) as u32,
        (rect.y * rows) as u32,
        (rect.width * normal_cols) as u32,
        (rect.height * rows) as u32,
    );
    Some(region.clamp_to(width, height))
}

/// Square region whose side follows the rectangle's height
pub fn square_region(dims: (u32, u32), rect: &NormalizedRect) -> Option<Region> {
    let (width, height) = dims;
    if width == 0 || height == 0 {
        return None;
    }

    let side = (rect.height * height as f32).round() as u32;
    let region = Region::new(
        anchored_left(width, height, rect) as u32,
        (rect.y * height as f32) as u32,
        side,
        side,
    );
    Some(region.clamp_to(width, height))
}

/// Text cell of a table row: `width` of the row starting at `crop_left`,
/// with `crop_vertical` of the height split evenly between top and bottom
pub fn cell_region(dims: (u32, u32), crop_left: f32, width: f32, crop_vertical: f32) -> Option<Region> {
    let (cols, rows) = dims;
    if cols == 0 || rows == 0 {
        return None;
    }

    let region = Region::new(
        (crop_left * cols as f32) as u32,
        (0.5 * crop_vertical * rows as f32) as u32,
        (width * cols as f32) as u32,
        ((1.0 - crop_vertical) * rows as f32) as u32,
    );
    Some(region.clamp_to(cols, rows))
}

/// Copy `region` out of `image`; an absent region gives an empty image
pub fn crop(image: &RgbaImage, region: Option<Region>) -> RgbaImage {
    match region {
        Some(r) if !r.is_empty() => imageops::crop_imm(image, r.x, r.y, r.width, r.height).to_image(),
        _ => RgbaImage::new(0, 0),
    }
}

/// Crop the pane `rect` out of a screenshot
pub fn pane(image: &RgbaImage, rect: &NormalizedRect) -> RgbaImage {
    crop(image, pane_region(image.dimensions(), rect))
}

/// Crop the square icon region `rect` out of a row or pane
pub fn square(image: &RgbaImage, rect: &NormalizedRect) -> RgbaImage {
    crop(image, square_region(image.dimensions(), rect))
}

/// Crop the text cell of a table row, see [`cell_region`]
pub fn cell(image: &RgbaImage, crop_left: f32, width: f32, crop_vertical: f32) -> RgbaImage {
    crop(image, cell_region(image.dimensions(), crop_left, width, crop_vertical))
}
