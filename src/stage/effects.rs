//! Effects composer: shadow, outline and character on the final surface.

use super::{BorderSilhouette, RenderContext, RenderedOutput, Stage, StagedComposite};
use crate::config::PipelineConfig;
use crate::error::RenderResult;
use crate::sprite::SpriteImage;
use crate::surface::Surface;

/// Composites the final sprite, back to front:
///
/// 1. the shadow sprite, scaled and offset like a part;
/// 2. the border silhouette at the origin, unscaled;
/// 3. the staged composite at the origin, unscaled.
///
/// The order is fixed: the shadow never covers the outline or the character,
/// and the character's own colors cover the recolored interior of the outline.
#[derive(Debug, Clone)]
pub struct EffectsComposer {
    pub shadow: SpriteImage,
    pub scale_factor: u32,
    pub shadow_offset_y: i32,
}

impl EffectsComposer {
    pub fn from_config(config: &PipelineConfig, shadow: SpriteImage) -> Self {
        Self {
            shadow,
            scale_factor: config.scale_factor,
            shadow_offset_y: config.scaled_shadow_offset_y(),
        }
    }
}

impl Stage for EffectsComposer {
    fn name(&self) -> &'static str {
        "effects"
    }

    fn apply(&self, ctx: &mut RenderContext) -> RenderResult<()> {
        let staged = &ctx.require::<StagedComposite>(self.name())?.0;
        let border = &ctx.require::<BorderSilhouette>(self.name())?.0;

        let mut surface = Surface::new(ctx.canvas_size);
        surface.clear();

        let shadow_size = self.shadow.natural_size().scaled(self.scale_factor);
        surface.draw_image_scaled(&self.shadow, 0, self.shadow_offset_y, shadow_size);
        surface.draw_image(border, 0, 0);
        surface.draw_image(staged, 0, 0);

        ctx.set(RenderedOutput(surface.into_sprite()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RenderError;
    use crate::sprite::SizePx;
    use crate::testing::{solid, square};

    const SHADOW: [u8; 4] = [0, 0, 0, 120];

    fn compose(staged: SpriteImage, border: SpriteImage, shadow: SpriteImage) -> SpriteImage {
        let mut ctx = RenderContext::new(SizePx::new(12, 12), Vec::new());
        ctx.set(StagedComposite(staged));
        ctx.set(BorderSilhouette(border));
        EffectsComposer { shadow, scale_factor: 2, shadow_offset_y: 2 }
            .apply(&mut ctx)
            .unwrap();
        ctx.take::<RenderedOutput>().unwrap().0
    }

    #[test]
    fn shadow_is_scaled_and_offset() {
        let out = compose(
            SpriteImage::transparent(SizePx::new(12, 12)),
            SpriteImage::transparent(SizePx::new(12, 12)),
            solid(3, 2, SHADOW),
        );

        assert_eq!(out.pixel(0, 2), Some(SHADOW));
        assert_eq!(out.pixel(5, 5), Some(SHADOW));
        assert_eq!(out.pixel(0, 1).unwrap()[3], 0);
        assert_eq!(out.pixel(6, 2).unwrap()[3], 0);
    }

    #[test]
    fn character_over_border_over_shadow() {
        let staged = square(12, 12, 4, 4, 2, [0, 0, 255, 255]);
        let border = square(12, 12, 3, 3, 4, [255, 0, 0, 255]);
        let out = compose(staged, border, solid(6, 6, [0, 0, 0, 255]));

        // Character pixel.
        assert_eq!(out.pixel(4, 4), Some([0, 0, 255, 255]));
        // Ring pixel.
        assert_eq!(out.pixel(3, 3), Some([255, 0, 0, 255]));
        // Shadow only.
        assert_eq!(out.pixel(10, 10), Some([0, 0, 0, 255]));
        // Nothing.
        assert_eq!(out.pixel(0, 0).unwrap()[3], 0);
    }

    #[test]
    fn requires_border() {
        let mut ctx = RenderContext::new(SizePx::new(4, 4), Vec::new());
        ctx.set(StagedComposite(SpriteImage::transparent(SizePx::new(4, 4))));
        let err = EffectsComposer {
            shadow: SpriteImage::transparent(SizePx::new(1, 1)),
            scale_factor: 1,
            shadow_offset_y: 0,
        }
        .apply(&mut ctx)
        .unwrap_err();
        assert!(matches!(
            err,
            RenderError::MissingStageInput { stage: "effects", input: "BorderSilhouette" }
        ));
    }
}
