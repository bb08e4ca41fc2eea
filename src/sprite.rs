//! Decoded sprite bitmaps and pixel geometry.

use image::RgbaImage;

/// A 2D size in pixel units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SizePx {
    pub width: u32,
    pub height: u32,
}

impl SizePx {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Returns this size multiplied by an integer scale factor, saturating
    /// at `u32::MAX`.
    pub fn scaled(&self, factor: u32) -> Self {
        Self::new(self.width.saturating_mul(factor), self.height.saturating_mul(factor))
    }

    /// Returns true if either dimension is zero.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// An in-memory decoded bitmap.
///
/// Sprites are produced by the loader or by snapshotting a
/// [`Surface`](crate::Surface) and are never mutated afterwards. Each pipeline
/// run owns its own sprites; nothing is cached between runs.
#[derive(Debug, Clone, PartialEq)]
pub struct SpriteImage {
    /// The image data in straight (non-premultiplied) RGBA.
    pub data: RgbaImage,
}

impl SpriteImage {
    /// Wraps decoded RGBA pixels.
    pub fn new(data: RgbaImage) -> Self {
        Self { data }
    }

    /// Creates a fully transparent sprite of the given size.
    ///
    /// Used as the placeholder for parts that fail to load.
    pub fn transparent(size: SizePx) -> Self {
        Self::new(RgbaImage::new(size.width, size.height))
    }

    /// Returns the natural pixel dimensions of the sprite.
    pub fn natural_size(&self) -> SizePx {
        SizePx::new(self.data.width(), self.data.height())
    }

    /// Returns true if every pixel has zero alpha.
    pub fn is_fully_transparent(&self) -> bool {
        self.data.pixels().all(|p| p[3] == 0)
    }

    /// Returns the RGBA value at `(x, y)`, or `None` when out of bounds.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        self.data.get_pixel_checked(x, y).map(|p| p.0)
    }
}

impl From<RgbaImage> for SpriteImage {
    fn from(data: RgbaImage) -> Self {
        Self::new(data)
    }
}
