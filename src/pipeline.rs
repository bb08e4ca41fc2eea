//! One full pipeline run.
//!
//! ```text
//! Idle → Loading → Staging → Bordering → Composing → Idle
//! ```
//!
//! The stages run strictly in sequence. Loading is the only step with
//! internal concurrency (all part loads are in flight together) and the only
//! suspension point.

use crate::config::PipelineConfig;
use crate::error::{RenderError, RenderResult};
use crate::loader::{ImageSource, load_parts, load_single};
use crate::profile::RenderProps;
use crate::sprite::SpriteImage;
use crate::stage::{
    BorderSilhouette, BorderSynthesizer, EffectsComposer, RenderContext, RenderedOutput, RunState,
    Stage, StagedComposite, StagingCompositor,
};

/// Every artifact produced by one run.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedSprite {
    /// All parts flattened in draw order.
    pub staged: SpriteImage,
    /// The recolored, dilated silhouette.
    pub border: SpriteImage,
    /// Shadow, border and character. The only artifact a renderer publishes.
    pub output: SpriteImage,
}

/// Runs the whole pipeline on private surfaces.
///
/// Part and shadow load failures are absorbed as transparent placeholders, so
/// an error here means a surface could not be encoded or decoded.
#[tracing::instrument(skip_all, fields(parts = props.images_to_render.len()))]
pub async fn run_pipeline<S: ImageSource>(
    source: &S,
    config: &PipelineConfig,
    props: &RenderProps,
) -> RenderResult<RenderedSprite> {
    let stack = props.part_stack();

    enter(RunState::Loading);
    let (parts, shadow) = futures::join!(
        load_parts(source, stack.as_slice(), config),
        load_single(source, &config.shadow_sprite, config),
    );

    let mut ctx = RenderContext::new(config.canvas_size(), parts);
    let stages: [(RunState, Box<dyn Stage>); 3] = [
        (RunState::Staging, Box::new(StagingCompositor::from_config(config))),
        (
            RunState::Bordering,
            Box::new(BorderSynthesizer::from_config(config, props.border_color.as_str())),
        ),
        (RunState::Composing, Box::new(EffectsComposer::from_config(config, shadow))),
    ];

    for (state, stage) in &stages {
        enter(*state);
        stage.apply(&mut ctx)?;
        tracing::trace!(stage = stage.name(), "stage finished");
    }
    enter(RunState::Idle);

    let missing = |input| RenderError::MissingStageInput { stage: "pipeline", input };
    let staged = ctx
        .take::<StagedComposite>()
        .ok_or_else(|| missing("StagedComposite"))?;
    let border = ctx
        .take::<BorderSilhouette>()
        .ok_or_else(|| missing("BorderSilhouette"))?;
    let output = ctx
        .take::<RenderedOutput>()
        .ok_or_else(|| missing("RenderedOutput"))?;

    Ok(RenderedSprite {
        staged: staged.0,
        border: border.0,
        output: output.0,
    })
}

fn enter(state: RunState) {
    tracing::debug!(%state, "pipeline state");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::MemorySource;
    use crate::testing::{png_bytes, solid, square};

    fn config() -> PipelineConfig {
        PipelineConfig {
            canvas_width: 16,
            canvas_height: 16,
            scale_factor: 2,
            part_offset_y: 1,
            shadow_offset_y: 5,
            part_width: 8,
            part_height: 8,
            load_timeout_ms: Some(1000),
            shadow_sprite: "shadow.png".into(),
        }
    }

    #[tokio::test]
    async fn produces_all_artifacts() {
        let source = MemorySource::new()
            .with_asset("body.png", png_bytes(&square(8, 8, 2, 2, 4, [0, 0, 255, 255])))
            .with_asset("shadow.png", png_bytes(&solid(8, 2, [0, 0, 0, 100])));
        let props = RenderProps::new().with_part("body.png").with_border_color("#ff0000");

        let sprite = run_pipeline(&source, &config(), &props).await.unwrap();

        // Body square is drawn at (4, 6)..(12, 14) after scaling and offset.
        assert_eq!(sprite.staged.pixel(4, 6), Some([0, 0, 255, 255]));
        assert_eq!(sprite.border.pixel(2, 4), Some([255, 0, 0, 255]));
        assert_eq!(sprite.output.pixel(4, 6), Some([0, 0, 255, 255]));
        assert_eq!(sprite.output.pixel(2, 4), Some([255, 0, 0, 255]));
        assert_eq!(sprite.output.natural_size(), config().canvas_size());
    }

    #[tokio::test]
    async fn missing_shadow_is_absorbed() {
        let source = MemorySource::new();
        let props = RenderProps::new();

        let sprite = run_pipeline(&source, &config(), &props).await.unwrap();
        assert!(sprite.output.is_fully_transparent());
    }
}
