//! Part image loading.
//!
//! [`load_parts`] fetches and decodes every reference of a part stack
//! concurrently and returns the decoded sprites index-aligned with the input.
//! A reference that cannot be loaded never fails the run: its slot gets a
//! transparent placeholder and a warning is logged.
//!
//! Where the bytes come from is decided by an [`ImageSource`]:
//!
//! - [`AssetSource`] reads `data:` URLs inline and everything else from an
//!   asset directory.
//! - [`MemorySource`] serves preloaded bytes from a map.

use std::collections::HashMap;
use std::future::Future;
use std::path::{Component, Path, PathBuf};

use base64::Engine;
use futures::future::join_all;

use crate::config::PipelineConfig;
use crate::error::{LoadError, LoadResult};
use crate::part::PartRef;
use crate::sprite::SpriteImage;
use crate::svg::{looks_like_svg, rasterize_svg};

// ============================================================================
// ImageSource
// ============================================================================

/// Resolves a part reference to encoded image bytes.
pub trait ImageSource {
    /// Fetches the encoded bytes behind `reference`.
    fn fetch(&self, reference: &str) -> impl Future<Output = LoadResult<Vec<u8>>> + Send;
}

// ============================================================================
// AssetSource
// ============================================================================

/// Loads `data:` URLs inline and other references from an asset directory.
///
/// Web-style absolute paths (`/sprites/hat.png`) are resolved against the
/// asset root, never against the filesystem root. References with `..` or
/// other non-plain components are rejected with [`LoadError::OutsideRoot`].
#[derive(Debug, Clone)]
pub struct AssetSource {
    root: PathBuf,
}

impl AssetSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve_path(&self, reference: &str) -> LoadResult<PathBuf> {
        let relative = Path::new(
            reference
                .strip_prefix("file://")
                .unwrap_or(reference)
                .trim_start_matches('/'),
        );
        let contained = relative
            .components()
            .all(|component| matches!(component, Component::Normal(_) | Component::CurDir));
        if !contained {
            return Err(LoadError::OutsideRoot(reference.to_string()));
        }
        Ok(self.root.join(relative))
    }
}

impl ImageSource for AssetSource {
    fn fetch(&self, reference: &str) -> impl Future<Output = LoadResult<Vec<u8>>> + Send {
        let reference = reference.to_string();
        let path = if reference.starts_with("data:") {
            None
        } else {
            Some(self.resolve_path(&reference))
        };
        async move {
            let path = match path {
                None => return decode_data_url(&reference),
                Some(path) => path?,
            };
            tokio::fs::read(&path).await.map_err(|source| {
                if source.kind() == std::io::ErrorKind::NotFound {
                    LoadError::NotFound(reference.clone())
                } else {
                    LoadError::Io { reference: reference.clone(), source }
                }
            })
        }
    }
}

// ============================================================================
// MemorySource
// ============================================================================

/// Serves preloaded encoded images keyed by reference.
///
/// `data:` URLs are decoded inline even when not inserted.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    assets: HashMap<String, Vec<u8>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, reference: impl Into<String>, bytes: Vec<u8>) {
        self.assets.insert(reference.into(), bytes);
    }

    pub fn with_asset(mut self, reference: impl Into<String>, bytes: Vec<u8>) -> Self {
        self.insert(reference, bytes);
        self
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }
}

impl ImageSource for MemorySource {
    fn fetch(&self, reference: &str) -> impl Future<Output = LoadResult<Vec<u8>>> + Send {
        let result = match self.assets.get(reference) {
            Some(bytes) => Ok(bytes.clone()),
            None if reference.starts_with("data:") => decode_data_url(reference),
            None => Err(LoadError::NotFound(reference.to_string())),
        };
        std::future::ready(result)
    }
}

// ============================================================================
// Data URLs
// ============================================================================

/// Decodes the payload of a `data:` URL.
///
/// Supports base64 (`data:image/png;base64,...`) and percent-encoded
/// payloads (`data:image/svg+xml,%3Csvg...`).
pub fn decode_data_url(url: &str) -> LoadResult<Vec<u8>> {
    let rest = url
        .strip_prefix("data:")
        .ok_or_else(|| LoadError::InvalidDataUrl("not a data URL".into()))?;

    let (metadata, payload) = rest
        .split_once(',')
        .ok_or_else(|| LoadError::InvalidDataUrl("missing comma".into()))?;

    if metadata.split(';').any(|p| p.eq_ignore_ascii_case("base64")) {
        base64::engine::general_purpose::STANDARD
            .decode(payload.trim())
            .map_err(|e| LoadError::InvalidDataUrl(format!("bad base64: {e}")))
    } else {
        percent_decode(payload)
    }
}

fn percent_decode(input: &str) -> LoadResult<Vec<u8>> {
    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] == b'%' {
            let byte = bytes
                .get(i + 1..i + 3)
                .and_then(|hex| std::str::from_utf8(hex).ok())
                .and_then(|hex| u8::from_str_radix(hex, 16).ok())
                .ok_or_else(|| LoadError::InvalidDataUrl("bad percent escape".into()))?;
            out.push(byte);
            i += 3;
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }

    Ok(out)
}

// ============================================================================
// Decoding
// ============================================================================

/// Decodes encoded image bytes into a sprite.
///
/// SVG documents are rasterized at their intrinsic size; everything else is
/// decoded by the `image` crate.
pub fn decode_part(bytes: &[u8]) -> LoadResult<SpriteImage> {
    if looks_like_svg(bytes) {
        return rasterize_svg(bytes).map(SpriteImage::new);
    }
    let decoded = image::load_from_memory(bytes)?;
    Ok(SpriteImage::new(decoded.to_rgba8()))
}

async fn fetch_and_decode<S: ImageSource>(source: &S, reference: &str) -> LoadResult<SpriteImage> {
    if reference.trim().is_empty() {
        return Err(LoadError::EmptyReference);
    }
    let bytes = source.fetch(reference).await?;
    decode_part(&bytes)
}

// ============================================================================
// Loading
// ============================================================================

/// Loads one image, bounded by the configured timeout.
///
/// Returns the error instead of a placeholder; see [`load_single`] for the
/// absorbing variant.
pub async fn try_load<S: ImageSource>(
    source: &S,
    reference: &str,
    config: &PipelineConfig,
) -> LoadResult<SpriteImage> {
    match config.load_timeout() {
        Some(limit) => tokio::time::timeout(limit, fetch_and_decode(source, reference))
            .await
            .map_err(|_| LoadError::Timeout(limit))?,
        None => fetch_and_decode(source, reference).await,
    }
}

/// Loads one image, substituting a transparent placeholder on failure.
pub async fn load_single<S: ImageSource>(
    source: &S,
    reference: &str,
    config: &PipelineConfig,
) -> SpriteImage {
    match try_load(source, reference, config).await {
        Ok(sprite) => sprite,
        Err(error) => {
            tracing::warn!(reference, %error, "image failed to load, using transparent placeholder");
            SpriteImage::transparent(config.part_size())
        }
    }
}

/// Loads every part concurrently, preserving input order.
///
/// `result[i]` always corresponds to `parts[i]`, whatever order the loads
/// finish in. Failed slots hold transparent placeholders of
/// [`PipelineConfig::part_size`].
pub async fn load_parts<S: ImageSource>(
    source: &S,
    parts: &[PartRef],
    config: &PipelineConfig,
) -> Vec<SpriteImage> {
    let tasks = parts.iter().enumerate().map(|(index, part)| async move {
        (index, load_single(source, part.as_str(), config).await)
    });

    let mut slots: Vec<Option<SpriteImage>> = vec![None; parts.len()];
    for (index, sprite) in join_all(tasks).await {
        slots[index] = Some(sprite);
    }

    slots
        .into_iter()
        .map(|slot| slot.unwrap_or_else(|| SpriteImage::transparent(config.part_size())))
        .collect()
}

// ============================================================================
// Tests
// ============================================================================
