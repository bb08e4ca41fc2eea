//! SVG part rasterization using resvg/usvg.
//!
//! Part references may point at SVG documents as well as raster images.
//! SVG parts are rendered at their intrinsic size so they line up with
//! raster parts drawn at the same native resolution.

use image::{Rgba, RgbaImage};
use resvg::tiny_skia::{Pixmap, Transform};
use resvg::usvg::{Options, Tree};

use crate::error::{LoadError, LoadResult};

/// Returns true if the bytes look like an SVG document.
pub fn looks_like_svg(bytes: &[u8]) -> bool {
    // Lossy, since a multi-byte character may be cut at the boundary.
    let head = String::from_utf8_lossy(&bytes[..bytes.len().min(256)]);
    let text = head.trim_start_matches('\u{feff}').trim_start();
    text.starts_with("<svg") || (text.starts_with("<?xml") && text.contains("<svg"))
}

/// Renders SVG bytes to an RGBA image at the document's intrinsic size.
pub fn rasterize_svg(bytes: &[u8]) -> LoadResult<RgbaImage> {
    let opts = Options::default();
    let tree = Tree::from_data(bytes, &opts).map_err(|e| LoadError::Svg(e.to_string()))?;

    let size = tree.size();
    let width = size.width().ceil() as u32;
    let height = size.height().ceil() as u32;

    let mut pixmap = Pixmap::new(width, height)
        .ok_or_else(|| LoadError::Svg(format!("invalid canvas size {width}x{height}")))?;
    resvg::render(&tree, Transform::identity(), &mut pixmap.as_mut());

    Ok(pixmap_to_rgba_image(&pixmap))
}

/// Converts a tiny_skia Pixmap to an image::RgbaImage.
fn pixmap_to_rgba_image(pixmap: &Pixmap) -> RgbaImage {
    let width = pixmap.width();
    let height = pixmap.height();
    let mut img = RgbaImage::new(width, height);

    for (i, pixel) in pixmap.pixels().iter().enumerate() {
        let x = i as u32 % width;
        let y = i as u32 / width;
        // tiny_skia uses premultiplied alpha, we need to unpremultiply
        let c = pixel.demultiply();
        img.put_pixel(x, y, Rgba([c.red(), c.green(), c.blue(), c.alpha()]));
    }

    img
}
