//! The renderer a UI component talks to.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::config::PipelineConfig;
use crate::error::{ConfigError, RenderResult};
use crate::loader::ImageSource;
use crate::pipeline::run_pipeline;
use crate::profile::RenderProps;
use crate::sprite::SpriteImage;
use crate::surface::Surface;

// ============================================================================
// Configurable Trait
// ============================================================================

/// Trait for types whose inputs can be set from, and exported as, [`RenderProps`].
pub trait Configurable {
    /// Replaces the current inputs without rendering.
    fn apply_props(&mut self, props: &RenderProps);

    /// Returns a copy of the current inputs.
    fn export_props(&self) -> RenderProps;
}

// ============================================================================
// RenderOutcome
// ============================================================================

/// What happened to one requested render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderOutcome {
    /// The run finished and its output is now the visible output.
    Published { run_id: u64 },
    /// A newer run was started while this one was in flight; its result was
    /// discarded.
    Superseded { run_id: u64, latest: u64 },
    /// The props were identical to the ones the visible output was rendered
    /// from; nothing ran.
    Unchanged,
    /// The run hit an internal error; the previous output stays visible and
    /// the next `update` with the same props retries.
    Failed { run_id: u64 },
}

impl RenderOutcome {
    pub fn is_published(&self) -> bool {
        matches!(self, Self::Published { .. })
    }
}

// ============================================================================
// SpriteRenderer
// ============================================================================

struct Published {
    run_id: u64,
    /// Inputs the visible image was rendered from, `None` for the blank canvas.
    props: Option<RenderProps>,
    image: SpriteImage,
}

/// Renders a character sprite whenever its part list or border color changes.
///
/// Every run computes into its own surfaces. When it finishes, it publishes
/// its output only if no newer run has been started in the meantime, so rapid
/// input changes can never tear the visible output: the latest input wins and
/// stale results are dropped.
///
/// # Example
///
/// ```no_run
/// use sprite_renderer::{AssetSource, PipelineConfig, RenderProps, SpriteRenderer};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let renderer = SpriteRenderer::new(AssetSource::new("assets"), PipelineConfig::default())?;
///
/// let props = RenderProps::new()
///     .with_part("sprites/body/pale.png")
///     .with_part("sprites/hair/short_brown.png")
///     .with_border_color("#ffcc00");
/// renderer.update(props).await;
///
/// let url = renderer.download_url()?;
/// assert!(url.starts_with("data:image/png;base64,"));
/// # Ok(())
/// # }
/// ```
pub struct SpriteRenderer<S: ImageSource> {
    source: S,
    config: PipelineConfig,
    props: Mutex<RenderProps>,
    runs_started: AtomicU64,
    published: Mutex<Published>,
}

impl<S: ImageSource> SpriteRenderer<S> {
    /// Creates a renderer showing a blank canvas.
    pub fn new(source: S, config: PipelineConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let blank = SpriteImage::transparent(config.canvas_size());
        Ok(Self {
            source,
            config,
            props: Mutex::new(RenderProps::default()),
            runs_started: AtomicU64::new(0),
            published: Mutex::new(Published { run_id: 0, props: None, image: blank }),
        })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Returns a copy of the current inputs.
    pub fn props(&self) -> RenderProps {
        lock(&self.props).clone()
    }

    /// Sets new inputs and re-renders unless the visible output was already
    /// rendered from exactly these inputs.
    pub async fn update(&self, props: RenderProps) -> RenderOutcome {
        let run_id = {
            let mut current = lock(&self.props);
            if *current == props && lock(&self.published).props.as_ref() == Some(&props) {
                return RenderOutcome::Unchanged;
            }
            *current = props.clone();
            self.start_run()
        };
        self.run(run_id, props).await
    }

    /// Re-renders the current inputs.
    pub async fn rerun(&self) -> RenderOutcome {
        let (run_id, props) = {
            let current = lock(&self.props);
            (self.start_run(), current.clone())
        };
        self.run(run_id, props).await
    }

    /// Takes the next run id. Callers hold the `props` lock so that run ids
    /// are ordered the same way as the inputs they render.
    fn start_run(&self) -> u64 {
        self.runs_started.fetch_add(1, Ordering::SeqCst) + 1
    }

    async fn run(&self, run_id: u64, props: RenderProps) -> RenderOutcome {
        tracing::debug!(run_id, "render run started");

        let result = run_pipeline(&self.source, &self.config, &props).await;

        let mut published = lock(&self.published);
        let latest = self.runs_started.load(Ordering::SeqCst);
        if run_id != latest || run_id <= published.run_id {
            tracing::debug!(run_id, latest, "discarding superseded render");
            return RenderOutcome::Superseded { run_id, latest };
        }

        match result {
            Ok(sprite) => {
                *published = Published { run_id, props: Some(props), image: sprite.output };
                tracing::debug!(run_id, "render published");
                RenderOutcome::Published { run_id }
            }
            Err(error) => {
                tracing::error!(run_id, %error, "render failed, keeping previous output");
                RenderOutcome::Failed { run_id }
            }
        }
    }

    /// Returns the id of the run whose output is visible (0 before any run).
    pub fn published_run(&self) -> u64 {
        lock(&self.published).run_id
    }

    /// Returns a copy of the visible output.
    pub fn output(&self) -> SpriteImage {
        lock(&self.published).image.clone()
    }

    /// Encodes the visible output as a PNG data URL.
    pub fn download_url(&self) -> RenderResult<String> {
        let surface = Surface::from_sprite(&lock(&self.published).image);
        surface.to_data_url()
    }
}

impl<S: ImageSource> Configurable for SpriteRenderer<S> {
    fn apply_props(&mut self, props: &RenderProps) {
        *self.props.get_mut().unwrap_or_else(PoisonError::into_inner) = props.clone();
    }

    fn export_props(&self) -> RenderProps {
        self.props()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

// ============================================================================
// Tests
// ============================================================================
