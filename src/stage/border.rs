//! Border synthesizer: builds a solid-colored outline around the character.
//!
//! The staged composite is stamped at the 8 compass offsets, which dilates its
//! silhouette by `thickness` pixels. A source-in fill then recolors every
//! covered pixel with the border color while keeping its coverage.

use super::{BorderSilhouette, RenderContext, Stage, StagedComposite};
use crate::config::PipelineConfig;
use crate::error::RenderResult;
use crate::surface::{CompositeMode, Surface};

/// Unit offsets of the 8 compass directions.
pub const STAMP_OFFSETS: [(i32, i32); 8] = [
    (-1, -1),
    (0, -1),
    (1, -1),
    (-1, 0),
    (1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
];

/// Produces a [`BorderSilhouette`] from the [`StagedComposite`].
#[derive(Debug, Clone)]
pub struct BorderSynthesizer {
    /// CSS color string. Unparsable values leave the surface's default
    /// fill style (opaque black) in effect.
    pub color: String,

    /// Stamp distance in output pixels. Must equal the pipeline scale factor.
    pub thickness: i32,
}

impl BorderSynthesizer {
    pub fn from_config(config: &PipelineConfig, color: impl Into<String>) -> Self {
        Self {
            color: color.into(),
            thickness: config.border_thickness(),
        }
    }
}

impl Stage for BorderSynthesizer {
    fn name(&self) -> &'static str {
        "border"
    }

    fn apply(&self, ctx: &mut RenderContext) -> RenderResult<()> {
        let staged = &ctx.require::<StagedComposite>(self.name())?.0;

        let mut surface = Surface::new(ctx.canvas_size);
        surface.clear();

        for (dx, dy) in STAMP_OFFSETS {
            surface.draw_image(staged, dx * self.thickness, dy * self.thickness);
        }

        surface.set_composite_mode(CompositeMode::SourceIn);
        if !surface.set_fill_style(&self.color) {
            tracing::warn!(color = %self.color, "border color is not a valid CSS color");
        }
        surface.fill();
        surface.set_composite_mode(CompositeMode::SourceOver);

        let silhouette = surface.snapshot()?;
        ctx.set(BorderSilhouette(silhouette));
        Ok(())
    }
}
