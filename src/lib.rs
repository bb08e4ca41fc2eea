//! sprite-renderer: layered character sprite compositing
//!
//! This crate renders a character sprite from an ordered stack of part images
//! (body, clothing, hair, ...) and wraps it in a solid-colored outline over a
//! drop shadow.
//!
//! Every render runs four stages in sequence:
//!
//! 1. **Loading** - all part images are fetched and decoded concurrently,
//!    keeping input order. Failed or timed-out loads become transparent
//!    placeholders.
//! 2. **Staging** - parts are drawn bottom to top onto one upscaled image.
//! 3. **Bordering** - the staged image is stamped in 8 directions and
//!    recolored with the border color, producing an outline silhouette.
//! 4. **Composing** - shadow, outline and character are drawn back to front.
//!
//! # Example
//!
//! ```no_run
//! use sprite_renderer::{AssetSource, PipelineConfig, RenderProps, run_pipeline};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let source = AssetSource::new("assets");
//! let config = PipelineConfig::default();
//! let props = RenderProps::new()
//!     .with_parts(["sprites/body/pale.png", "sprites/armor/leather.png"])
//!     .with_border_color("#3fa9f5");
//!
//! let sprite = run_pipeline(&source, &config, &props).await?;
//! sprite.output.data.save("hero.png")?;
//! # Ok(())
//! # }
//! ```
//!
//! # Live Rendering
//!
//! For a UI that re-renders on every input change, use [`SpriteRenderer`]. It
//! drops results of runs that were overtaken by newer input, so the visible
//! output always reflects the latest props:
//!
//! ```no_run
//! use sprite_renderer::{MemorySource, PipelineConfig, RenderProps, SpriteRenderer};
//!
//! # async fn example(png: Vec<u8>) -> Result<(), Box<dyn std::error::Error>> {
//! let source = MemorySource::new().with_asset("body.png", png);
//! let renderer = SpriteRenderer::new(source, PipelineConfig::default())?;
//!
//! renderer.update(RenderProps::new().with_part("body.png")).await;
//! let download = renderer.download_url()?;
//! # Ok(())
//! # }
//! ```

mod color;
mod config;
mod error;
mod loader;
mod part;
mod pipeline;
mod profile;
mod renderer;
mod sprite;
mod stage;
mod surface;
mod svg;

#[cfg(test)]
mod testing;

pub use color::{DEFAULT_FILL, parse_css_color};
pub use config::{MAX_CANVAS_SIDE, MAX_SCALE_FACTOR, PipelineConfig};
pub use error::{ConfigError, LoadError, LoadResult, RenderError, RenderResult};
pub use loader::{
    AssetSource, ImageSource, MemorySource, decode_data_url, decode_part, load_parts, load_single,
    try_load,
};
pub use part::{PartRef, PartStack};
pub use pipeline::{RenderedSprite, run_pipeline};
pub use profile::RenderProps;
pub use renderer::{Configurable, RenderOutcome, SpriteRenderer};
pub use sprite::{SizePx, SpriteImage};
pub use stage::{
    BorderSilhouette, BorderSynthesizer, EffectsComposer, RenderContext, RenderedOutput, RunState,
    Stage, StagedComposite, StagingCompositor,
};
pub use surface::{CompositeMode, PNG_DATA_URL_PREFIX, Surface};
