//! Error types for loading, rendering and configuration.

use std::time::Duration;

use thiserror::Error;

/// Result type for part loading.
pub type LoadResult<T> = Result<T, LoadError>;

/// Result type for pipeline stages and surface export.
pub type RenderResult<T> = Result<T, RenderError>;

/// Errors raised while fetching or decoding a single part image.
///
/// These never escape the pipeline: the loader substitutes a transparent
/// placeholder for the failed slot and logs the error.
#[derive(Debug, Error)]
pub enum LoadError {
    /// The reference string was empty.
    #[error("empty image reference")]
    EmptyReference,

    /// The source has no asset under this reference.
    #[error("image not found: {0}")]
    NotFound(String),

    /// The reference points outside the asset root.
    #[error("image reference escapes the asset root: {0}")]
    OutsideRoot(String),

    /// Reading the asset failed.
    #[error("failed to read {reference}: {source}")]
    Io {
        reference: String,
        #[source]
        source: std::io::Error,
    },

    /// A `data:` URL could not be parsed.
    #[error("invalid data URL: {0}")]
    InvalidDataUrl(String),

    /// The bytes are not a decodable raster image.
    #[error("failed to decode image: {0}")]
    Decode(#[from] image::ImageError),

    /// The bytes looked like SVG but could not be rasterized.
    #[error("failed to rasterize SVG: {0}")]
    Svg(String),

    /// The load did not finish within the configured bound.
    #[error("image load timed out after {0:?}")]
    Timeout(Duration),
}

/// Errors raised by the compositing stages.
#[derive(Debug, Error)]
pub enum RenderError {
    /// PNG encoding of a surface failed.
    #[error("failed to encode surface: {0}")]
    Encode(#[source] image::ImageError),

    /// Re-decoding a surface snapshot failed.
    #[error("failed to decode surface snapshot: {0}")]
    Snapshot(#[source] image::ImageError),

    /// A stage ran before the stage that produces its input.
    #[error("stage `{stage}` is missing its `{input}` input")]
    MissingStageInput {
        stage: &'static str,
        input: &'static str,
    },
}

/// Errors raised while loading or validating a [`PipelineConfig`](crate::PipelineConfig).
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}
