//! Offscreen raster surfaces with 2D-canvas drawing semantics.
//!
//! A [`Surface`] is the per-run replacement for a shared canvas element: each
//! pipeline stage allocates its own, draws on it, and hands a decoded
//! [`SpriteImage`] snapshot to the next stage.

use std::io::Cursor;

use base64::Engine;
use image::{ImageFormat, Rgba, RgbaImage};

use crate::color::{DEFAULT_FILL, parse_css_color};
use crate::error::{RenderError, RenderResult};
use crate::sprite::{SizePx, SpriteImage};

/// Prefix of every data URL produced by [`Surface::to_data_url`].
pub const PNG_DATA_URL_PREFIX: &str = "data:image/png;base64,";

// ============================================================================
// CompositeMode
// ============================================================================

/// How drawn pixels combine with the pixels already on the surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CompositeMode {
    /// Draw on top of existing content.
    #[default]
    SourceOver,
    /// Keep the new drawing only where the surface is already covered,
    /// scaled by the existing alpha. Everything else becomes transparent.
    SourceIn,
}

// ============================================================================
// Surface
// ============================================================================

/// A fixed-size RGBA drawing surface.
#[derive(Debug, Clone)]
pub struct Surface {
    pixels: RgbaImage,
    mode: CompositeMode,
    fill_style: Rgba<u8>,
}

impl Surface {
    /// Creates a transparent surface.
    pub fn new(size: SizePx) -> Self {
        Self {
            pixels: RgbaImage::new(size.width, size.height),
            mode: CompositeMode::SourceOver,
            fill_style: DEFAULT_FILL,
        }
    }

    /// Creates a surface holding a copy of a sprite's pixels.
    pub fn from_sprite(sprite: &SpriteImage) -> Self {
        Self {
            pixels: sprite.data.clone(),
            mode: CompositeMode::SourceOver,
            fill_style: DEFAULT_FILL,
        }
    }

    pub fn size(&self) -> SizePx {
        SizePx::new(self.pixels.width(), self.pixels.height())
    }

    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }

    /// Resets every pixel to transparent.
    pub fn clear(&mut self) {
        for pixel in self.pixels.pixels_mut() {
            pixel.0 = [0, 0, 0, 0];
        }
    }

    pub fn composite_mode(&self) -> CompositeMode {
        self.mode
    }

    pub fn set_composite_mode(&mut self, mode: CompositeMode) {
        self.mode = mode;
    }

    pub fn fill_style(&self) -> Rgba<u8> {
        self.fill_style
    }

    /// Sets the fill style from a CSS color string.
    ///
    /// An unparsable string leaves the current fill style unchanged and
    /// returns `false`.
    pub fn set_fill_style(&mut self, color: &str) -> bool {
        match parse_css_color(color) {
            Some(rgba) => {
                self.fill_style = rgba;
                true
            }
            None => {
                tracing::debug!(color, "ignoring unparsable fill style");
                false
            }
        }
    }

    /// Fills the whole surface with the current fill style.
    pub fn fill(&mut self) {
        let color = self.fill_style;
        let mode = self.mode;
        for pixel in self.pixels.pixels_mut() {
            *pixel = blend(mode, color, *pixel);
        }
    }

    /// Draws a sprite at its natural size with its top-left corner at `(x, y)`.
    pub fn draw_image(&mut self, sprite: &SpriteImage, x: i32, y: i32) {
        self.draw_rgba(&sprite.data, x, y);
    }

    /// Draws a sprite scaled to `size` with nearest-neighbor sampling.
    ///
    /// Sprites are pixel art, so scaling never interpolates between texels.
    pub fn draw_image_scaled(&mut self, sprite: &SpriteImage, x: i32, y: i32, size: SizePx) {
        if size.is_empty() {
            return;
        }
        let natural = sprite.natural_size();
        if natural.is_empty() {
            return;
        }
        if size == natural {
            self.draw_rgba(&sprite.data, x, y);
            return;
        }

        // Only the part of the scaled sprite that lands on the surface is
        // resampled, so the work is bounded by the surface size.
        let left = i64::from(x).max(0);
        let top = i64::from(y).max(0);
        let right = (i64::from(x) + i64::from(size.width)).min(i64::from(self.pixels.width()));
        let bottom = (i64::from(y) + i64::from(size.height)).min(i64::from(self.pixels.height()));
        if left >= right || top >= bottom {
            // Nothing visible; source-in still clears the surface.
            self.draw_rgba(&RgbaImage::new(0, 0), 0, 0);
            return;
        }

        let sample = |offset: i64, natural: u32, scaled: u32| -> u32 {
            let texel = offset * i64::from(natural) / i64::from(scaled);
            texel.clamp(0, i64::from(natural) - 1) as u32
        };
        let window = RgbaImage::from_fn((right - left) as u32, (bottom - top) as u32, |wx, wy| {
            let sx = sample(left - i64::from(x) + i64::from(wx), natural.width, size.width);
            let sy = sample(top - i64::from(y) + i64::from(wy), natural.height, size.height);
            *sprite.data.get_pixel(sx, sy)
        });
        self.draw_rgba(&window, left as i32, top as i32);
    }

    fn draw_rgba(&mut self, src: &RgbaImage, x: i32, y: i32) {
        let dest_width = self.pixels.width() as i32;
        let dest_height = self.pixels.height() as i32;
        let src_width = src.width() as i32;
        let src_height = src.height() as i32;

        // Source-in clears everything the drawing does not cover.
        if self.mode == CompositeMode::SourceIn {
            for (dx, dy, pixel) in self.pixels.enumerate_pixels_mut() {
                let (dx, dy) = (dx as i32, dy as i32);
                if dx < x || dy < y || dx >= x + src_width || dy >= y + src_height {
                    pixel.0 = [0, 0, 0, 0];
                }
            }
        }

        for sy in 0..src_height {
            for sx in 0..src_width {
                let dx = x + sx;
                let dy = y + sy;

                if dx < 0 || dy < 0 || dx >= dest_width || dy >= dest_height {
                    continue;
                }

                let src_pixel = *src.get_pixel(sx as u32, sy as u32);
                let dst_pixel = self.pixels.get_pixel_mut(dx as u32, dy as u32);
                *dst_pixel = blend(self.mode, src_pixel, *dst_pixel);
            }
        }
    }

    /// Captures the surface as a freshly decoded sprite.
    ///
    /// The pixels go through a PNG encode and decode, so the result is an
    /// independent flattened raster that later drawing cannot affect.
    pub fn snapshot(&self) -> RenderResult<SpriteImage> {
        let png = self.encode_png()?;
        let decoded = image::load_from_memory_with_format(&png, ImageFormat::Png)
            .map_err(RenderError::Snapshot)?;
        Ok(SpriteImage::new(decoded.to_rgba8()))
    }

    /// Encodes the surface as a `data:image/png;base64,` URL.
    pub fn to_data_url(&self) -> RenderResult<String> {
        let png = self.encode_png()?;
        let encoded = base64::engine::general_purpose::STANDARD.encode(png);
        Ok(format!("{PNG_DATA_URL_PREFIX}{encoded}"))
    }

    /// Encodes the surface as PNG bytes.
    pub fn encode_png(&self) -> RenderResult<Vec<u8>> {
        let mut out = Cursor::new(Vec::new());
        self.pixels
            .write_to(&mut out, ImageFormat::Png)
            .map_err(RenderError::Encode)?;
        Ok(out.into_inner())
    }

    /// Consumes the surface, returning its pixels as a sprite.
    pub fn into_sprite(self) -> SpriteImage {
        SpriteImage::new(self.pixels)
    }
}

// ============================================================================
// Blending
// ============================================================================

fn blend(mode: CompositeMode, src: Rgba<u8>, dst: Rgba<u8>) -> Rgba<u8> {
    match mode {
        CompositeMode::SourceOver => source_over(src, dst),
        CompositeMode::SourceIn => source_in(src, dst),
    }
}

/// Alpha blends two RGBA pixels (source over destination).
fn source_over(src: Rgba<u8>, dst: Rgba<u8>) -> Rgba<u8> {
    if src[3] == 255 {
        return src;
    }
    if src[3] == 0 {
        return dst;
    }

    let sa = src[3] as f32 / 255.0;
    let da = dst[3] as f32 / 255.0;
    let out_a = sa + da * (1.0 - sa);

    let blend = |s: u8, d: u8| -> u8 {
        let sf = s as f32 / 255.0;
        let df = d as f32 / 255.0;
        let out = (sf * sa + df * da * (1.0 - sa)) / out_a;
        (out * 255.0).round() as u8
    };

    Rgba([
        blend(src[0], dst[0]),
        blend(src[1], dst[1]),
        blend(src[2], dst[2]),
        (out_a * 255.0).round() as u8,
    ])
}

/// Source color, alpha scaled by the destination alpha.
fn source_in(src: Rgba<u8>, dst: Rgba<u8>) -> Rgba<u8> {
    let a = (src[3] as u16 * dst[3] as u16 + 127) / 255;
    if a == 0 {
        return Rgba([0, 0, 0, 0]);
    }
    Rgba([src[0], src[1], src[2], a as u8])
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn solid(w: u32, h: u32, rgba: [u8; 4]) -> SpriteImage {
        SpriteImage::new(RgbaImage::from_pixel(w, h, Rgba(rgba)))
    }

    #[test]
    fn draw_opaque_over() {
        let mut surface = Surface::new(SizePx::new(10, 10));
        surface.draw_image(&solid(10, 10, [255, 0, 0, 255]), 0, 0);
        surface.draw_image(&solid(4, 4, [0, 0, 255, 255]), 3, 3);

        assert_eq!(surface.pixels().get_pixel(5, 5).0, [0, 0, 255, 255]);
        assert_eq!(surface.pixels().get_pixel(0, 0).0, [255, 0, 0, 255]);
    }

    #[test]
    fn draw_with_transparency_blends() {
        let mut surface = Surface::new(SizePx::new(4, 4));
        surface.draw_image(&solid(4, 4, [255, 0, 0, 255]), 0, 0);
        surface.draw_image(&solid(4, 4, [0, 0, 255, 128]), 0, 0);

        let pixel = surface.pixels().get_pixel(0, 0);
        assert!(pixel[0] > 0, "Should have some red");
        assert!(pixel[2] > 0, "Should have some blue");
        assert_eq!(pixel[3], 255);
    }

    #[test]
    fn draw_clips_at_edges() {
        let mut surface = Surface::new(SizePx::new(4, 4));
        surface.draw_image(&solid(4, 4, [0, 255, 0, 255]), -2, 3);

        assert_eq!(surface.pixels().get_pixel(1, 3).0, [0, 255, 0, 255]);
        assert_eq!(surface.pixels().get_pixel(2, 3).0, [0, 0, 0, 0]);
        assert_eq!(surface.pixels().get_pixel(0, 2).0, [0, 0, 0, 0]);
    }

    #[test]
    fn scaled_draw_is_nearest_neighbor() {
        let mut src = RgbaImage::new(2, 1);
        src.put_pixel(0, 0, Rgba([255, 0, 0, 255]));
        src.put_pixel(1, 0, Rgba([0, 0, 255, 255]));

        let mut surface = Surface::new(SizePx::new(8, 4));
        surface.draw_image_scaled(&SpriteImage::new(src), 0, 0, SizePx::new(8, 4));

        assert_eq!(surface.pixels().get_pixel(3, 3).0, [255, 0, 0, 255]);
        assert_eq!(surface.pixels().get_pixel(4, 0).0, [0, 0, 255, 255]);
    }

    #[test]
    fn huge_scaled_draw_only_touches_visible_pixels() {
        let mut src = RgbaImage::new(2, 2);
        src.put_pixel(0, 0, Rgba([255, 0, 0, 255]));
        src.put_pixel(1, 1, Rgba([0, 0, 255, 255]));

        let mut surface = Surface::new(SizePx::new(4, 4));
        let size = SizePx::new(1 << 30, 1 << 30);
        surface.draw_image_scaled(&SpriteImage::new(src.clone()), 0, 0, size);
        assert_eq!(surface.pixels().get_pixel(3, 3).0, [255, 0, 0, 255]);

        let mut surface = Surface::new(SizePx::new(4, 4));
        surface.draw_image_scaled(&SpriteImage::new(src), -(1 << 29), -(1 << 29), size);
        assert_eq!(surface.pixels().get_pixel(0, 0).0, [0, 0, 255, 255]);
    }

    #[test]
    fn offscreen_scaled_draw_in_source_in_clears() {
        let mut surface = Surface::new(SizePx::new(4, 4));
        surface.draw_image(&solid(4, 4, [9, 9, 9, 255]), 0, 0);
        surface.set_composite_mode(CompositeMode::SourceIn);
        surface.draw_image_scaled(&solid(2, 2, [1, 2, 3, 255]), 100, 100, SizePx::new(4, 4));
        assert!(surface.pixels().pixels().all(|p| p.0 == [0, 0, 0, 0]));
    }

    #[test]
    fn source_in_fill_recolors_coverage_only() {
        let mut surface = Surface::new(SizePx::new(6, 6));
        surface.draw_image(&solid(2, 2, [10, 20, 30, 255]), 2, 2);
        surface.draw_image(&solid(1, 1, [10, 20, 30, 128]), 0, 0);

        surface.set_composite_mode(CompositeMode::SourceIn);
        assert!(surface.set_fill_style("#00ff00"));
        surface.fill();
        surface.set_composite_mode(CompositeMode::SourceOver);

        assert_eq!(surface.pixels().get_pixel(2, 2).0, [0, 255, 0, 255]);
        assert_eq!(surface.pixels().get_pixel(0, 0).0, [0, 255, 0, 128]);
        assert_eq!(surface.pixels().get_pixel(5, 5).0, [0, 0, 0, 0]);
    }

    #[test]
    fn source_in_draw_clears_uncovered_area() {
        let mut surface = Surface::new(SizePx::new(4, 4));
        surface.draw_image(&solid(4, 4, [255, 255, 255, 255]), 0, 0);
        surface.set_composite_mode(CompositeMode::SourceIn);
        surface.draw_image(&solid(2, 2, [255, 0, 0, 255]), 0, 0);

        assert_eq!(surface.pixels().get_pixel(1, 1).0, [255, 0, 0, 255]);
        assert_eq!(surface.pixels().get_pixel(3, 3).0, [0, 0, 0, 0]);
    }

    #[test]
    fn invalid_fill_style_keeps_previous() {
        let mut surface = Surface::new(SizePx::new(1, 1));
        assert_eq!(surface.fill_style(), DEFAULT_FILL);
        assert!(surface.set_fill_style("rgb(1, 2, 3)"));
        assert!(!surface.set_fill_style("definitely not a color"));
        assert_eq!(surface.fill_style(), Rgba([1, 2, 3, 255]));
    }

    #[test]
    fn clear_resets_pixels() {
        let mut surface = Surface::new(SizePx::new(3, 3));
        surface.fill();
        surface.clear();
        assert!(surface.into_sprite().is_fully_transparent());
    }

    #[test]
    fn snapshot_matches_pixels() {
        let mut surface = Surface::new(SizePx::new(5, 3));
        surface.draw_image(&solid(2, 2, [1, 2, 3, 200]), 1, 1);

        let snapshot = surface.snapshot().unwrap();
        assert_eq!(&snapshot.data, surface.pixels());
    }

    #[test]
    fn data_url_has_png_prefix() {
        let surface = Surface::new(SizePx::new(2, 2));
        let url = surface.to_data_url().unwrap();
        assert!(url.starts_with(PNG_DATA_URL_PREFIX));
        assert!(url.len() > PNG_DATA_URL_PREFIX.len());
    }
}
