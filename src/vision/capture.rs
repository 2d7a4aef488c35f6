//! Screenshot handling
//!
//! Receives raw capture buffers from the window capture collaborator and
//! keeps them as shared, read-only frames for one update cycle.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use image::{EncodableLayout, ImageBuffer, Pixel, PixelWithColorType, RgbaImage};

use super::VisionError;

/// Channel order of a raw capture buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PixelOrder {
    #[default]
    Rgba,
    /// Native order of most desktop capture APIs
    Bgra,
}

/// One captured frame. Cloning shares the pixels.
#[derive(Debug, Clone)]
pub struct Screenshot {
    image: Arc<RgbaImage>,
}

impl Screenshot {
    /// Build a screenshot from a raw 4-channel buffer
    pub fn from_raw(
        frame_data: &[u8],
        width: u32,
        height: u32,
        order: PixelOrder,
    ) -> Result<Self, VisionError> {
        if width == 0 || height == 0 {
            return Err(VisionError::EmptyFrame);
        }

        let expected = width as usize * height as usize * 4;
        if frame_data.len() != expected {
            return Err(VisionError::InvalidFrameData {
                expected,
                actual: frame_data.len(),
            });
        }

        let mut pixels = frame_data.to_vec();
        if order == PixelOrder::Bgra {
            for pixel in pixels.chunks_exact_mut(4) {
                pixel.swap(0, 2);
            }
        }

        let image = ImageBuffer::from_raw(width, height, pixels).ok_or(
            VisionError::InvalidFrameData {
                expected,
                actual: frame_data.len(),
            },
        )?;
        Ok(Self::from_image(image))
    }

    /// Wrap a decoded RGBA image
    pub fn from_image(image: RgbaImage) -> Self {
        Self {
            image: Arc::new(image),
        }
    }

    /// Decode a screenshot file
    pub fn open(path: impl AsRef<Path>) -> Result<Self, VisionError> {
        let image = image::open(path)?.to_rgba8();
        Ok(Self::from_image(image))
    }

    /// Pixels of the screenshot
    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    /// Width and height in pixels
    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    /// True if the screenshot has no pixels
    pub fn is_empty(&self) -> bool {
        self.image.width() == 0 || self.image.height() == 0
    }
}

/// Writes intermediate images for offline inspection when enabled
#[derive(Debug, Clone, Default)]
pub struct DebugDump {
    dir: Option<PathBuf>,
}

impl DebugDump {
    /// Dump that writes nothing
    pub fn disabled() -> Self {
        Self { dir: None }
    }

    /// Dump writing PNG files into `dir`
    pub fn to_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: Some(dir.into()),
        }
    }

    /// True if images are written
    pub fn is_enabled(&self) -> bool {
        self.dir.is_some()
    }

    /// Save `image` as `<dir>/<name>.png`. Failures are logged and ignored.
    pub fn save<P>(&self, name: &str, image: &ImageBuffer<P, Vec<P::Subpixel>>)
    where
        P: Pixel + PixelWithColorType,
        [P::Subpixel]: EncodableLayout,
    {
        let Some(dir) = &self.dir else {
            return;
        };
        if image.width() == 0 || image.height() == 0 {
            return;
        }

        let path = dir.join(format!("{name}.png"));
        let result = fs::create_dir_all(dir)
            .map_err(image::ImageError::IoError)
            .and_then(|()| image.save(&path));
        if let Err(e) = result {
            log::debug!("Failed to write debug image {}: {}", path.display(), e);
        }
    }
}
