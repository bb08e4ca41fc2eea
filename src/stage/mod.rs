//! Compositing stages of the sprite pipeline.
//!
//! Each stage implements [`Stage`]: it reads what upstream stages produced
//! from the [`RenderContext`], draws on a surface it allocates itself, and
//! emits its own output back into the context.
//!
//! # Data Flow
//!
//! ```text
//! decoded parts
//!      │
//!      ▼
//! ┌──────────┐
//! │ Staging  │ ──► StagedComposite ──────────┐
//! └────┬─────┘                               │
//!      ▼                                     │
//! ┌──────────┐                               │
//! │  Border  │ ──► BorderSilhouette ──┐      │
//! └──────────┘                        ▼      ▼
//!                                ┌──────────────┐
//!        shadow sprite ────────► │   Effects    │ ──► RenderedOutput
//!                                └──────────────┘
//! ```

pub mod border;
pub mod effects;
pub mod staging;

pub use border::BorderSynthesizer;
pub use effects::EffectsComposer;
pub use staging::StagingCompositor;

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;

use crate::error::{RenderError, RenderResult};
use crate::sprite::{SizePx, SpriteImage};

// ============================================================================
// Render Context
// ============================================================================

/// Per-run state that flows through the stages.
///
/// Owned by exactly one pipeline run and dropped when it ends, so two runs
/// never share intermediate images.
pub struct RenderContext {
    /// Size of every surface allocated during this run.
    pub canvas_size: SizePx,

    /// Decoded parts in draw order.
    pub parts: Vec<SpriteImage>,

    /// Typed outputs of the stages that already ran.
    properties: HashMap<TypeId, Box<dyn Any + Send + Sync>>,
}

impl RenderContext {
    pub fn new(canvas_size: SizePx, parts: Vec<SpriteImage>) -> Self {
        Self {
            canvas_size,
            parts,
            properties: HashMap::new(),
        }
    }

    /// Stores a stage output for downstream stages.
    pub fn set<T: Any + Send + Sync>(&mut self, value: T) {
        self.properties.insert(TypeId::of::<T>(), Box::new(value));
    }

    pub fn get<T: Any + Send + Sync>(&self) -> Option<&T> {
        self.properties
            .get(&TypeId::of::<T>())
            .and_then(|b| b.downcast_ref())
    }

    pub fn has<T: Any + Send + Sync>(&self) -> bool {
        self.properties.contains_key(&TypeId::of::<T>())
    }

    /// Removes and returns a stage output.
    pub fn take<T: Any + Send + Sync>(&mut self) -> Option<T> {
        self.properties
            .remove(&TypeId::of::<T>())
            .and_then(|b| b.downcast::<T>().ok())
            .map(|b| *b)
    }

    /// Fetches an upstream output, or fails naming the stage that needed it.
    pub fn require<T: Any + Send + Sync>(&self, stage: &'static str) -> RenderResult<&T> {
        self.get::<T>().ok_or(RenderError::MissingStageInput {
            stage,
            input: short_type_name::<T>(),
        })
    }
}

fn short_type_name<T>() -> &'static str {
    let full = std::any::type_name::<T>();
    full.rsplit("::").next().unwrap_or(full)
}

// ============================================================================
// Stage Outputs
// ============================================================================

/// All parts flattened in draw order.
#[derive(Debug, Clone, PartialEq)]
pub struct StagedComposite(pub SpriteImage);

/// The dilated character silhouette filled with the border color.
#[derive(Debug, Clone, PartialEq)]
pub struct BorderSilhouette(pub SpriteImage);

/// Shadow, border and character composited back to front.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedOutput(pub SpriteImage);

// ============================================================================
// Stage Trait
// ============================================================================

/// One step of the pipeline.
pub trait Stage {
    /// Name used in logs and errors.
    fn name(&self) -> &'static str;

    /// Reads upstream outputs from `ctx` and emits this stage's output.
    fn apply(&self, ctx: &mut RenderContext) -> RenderResult<()>;
}

// ============================================================================
// Run State
// ============================================================================

/// Where a pipeline run currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Loading,
    Staging,
    Bordering,
    Composing,
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Loading => "loading",
            Self::Staging => "staging",
            Self::Bordering => "bordering",
            Self::Composing => "composing",
        };
        f.write_str(name)
    }
}
