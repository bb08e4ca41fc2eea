//! Fixtures shared by the unit tests.

use std::collections::HashMap;
use std::future::Future;
use std::time::Duration;

use image::{Rgba, RgbaImage};

use crate::error::{LoadError, LoadResult};
use crate::loader::ImageSource;
use crate::sprite::SpriteImage;
use crate::surface::Surface;

pub fn solid(w: u32, h: u32, rgba: [u8; 4]) -> SpriteImage {
    SpriteImage::new(RgbaImage::from_pixel(w, h, Rgba(rgba)))
}

/// A transparent `w`x`h` sprite with one opaque `size`x`size` square at `(x, y)`.
pub fn square(w: u32, h: u32, x: u32, y: u32, size: u32, rgba: [u8; 4]) -> SpriteImage {
    let mut img = RgbaImage::new(w, h);
    for py in y..(y + size).min(h) {
        for px in x..(x + size).min(w) {
            img.put_pixel(px, py, Rgba(rgba));
        }
    }
    SpriteImage::new(img)
}

pub fn png_bytes(sprite: &SpriteImage) -> Vec<u8> {
    let mut surface = Surface::new(sprite.natural_size());
    surface.draw_image(sprite, 0, 0);
    surface.encode_png().unwrap()
}

pub fn png_data_url(sprite: &SpriteImage) -> String {
    let mut surface = Surface::new(sprite.natural_size());
    surface.draw_image(sprite, 0, 0);
    surface.to_data_url().unwrap()
}

/// An in-memory source that answers each reference after a fixed delay.
///
/// References registered as stalled never answer.
#[derive(Default)]
pub struct DelayedSource {
    assets: HashMap<String, (Vec<u8>, Duration)>,
    stalled: Vec<String>,
}

impl DelayedSource {
    pub fn with_asset(mut self, reference: &str, sprite: &SpriteImage, delay: Duration) -> Self {
        self.assets.insert(reference.to_string(), (png_bytes(sprite), delay));
        self
    }

    pub fn with_stalled(mut self, reference: &str) -> Self {
        self.stalled.push(reference.to_string());
        self
    }
}

impl ImageSource for DelayedSource {
    fn fetch(&self, reference: &str) -> impl Future<Output = LoadResult<Vec<u8>>> + Send {
        let stalled = self.stalled.iter().any(|s| s == reference);
        let entry = self.assets.get(reference).cloned();
        let reference = reference.to_string();
        async move {
            if stalled {
                std::future::pending::<()>().await;
            }
            match entry {
                Some((bytes, delay)) => {
                    tokio::time::sleep(delay).await;
                    Ok(bytes)
                }
                None => Err(LoadError::NotFound(reference)),
            }
        }
    }
}
