//! Staging compositor: flattens the part stack into one image.

use super::{RenderContext, Stage, StagedComposite};
use crate::config::PipelineConfig;
use crate::error::RenderResult;
use crate::surface::Surface;

/// Draws every part, in order, onto a fresh surface.
///
/// All parts share one native resolution, so every layer gets the same
/// placement: `x = 0`, `y = part_offset_y * scale`, size `natural * scale`.
#[derive(Debug, Clone, Copy)]
pub struct StagingCompositor {
    pub scale_factor: u32,
    pub offset_y: i32,
}

impl StagingCompositor {
    pub fn from_config(config: &PipelineConfig) -> Self {
        Self {
            scale_factor: config.scale_factor,
            offset_y: config.scaled_part_offset_y(),
        }
    }
}

impl Stage for StagingCompositor {
    fn name(&self) -> &'static str {
        "staging"
    }

    fn apply(&self, ctx: &mut RenderContext) -> RenderResult<()> {
        let mut surface = Surface::new(ctx.canvas_size);
        surface.clear();

        // Index 0 is the bottom layer.
        for part in &ctx.parts {
            let size = part.natural_size().scaled(self.scale_factor);
            surface.draw_image_scaled(part, 0, self.offset_y, size);
        }

        ctx.set(StagedComposite(surface.snapshot()?));
        Ok(())
    }
}
