//! Pipeline configuration.
//!
//! Every geometric constant of the pipeline lives in [`PipelineConfig`]. The
//! defaults describe 32x32 character parts upscaled 4x onto a 128x144 canvas.
//!
//! # JSON Format
//!
//! ```json
//! {
//!   "canvasWidth": 128,
//!   "canvasHeight": 144,
//!   "scaleFactor": 4,
//!   "partOffsetY": 2,
//!   "shadowOffsetY": 4,
//!   "partWidth": 32,
//!   "partHeight": 32,
//!   "loadTimeoutMs": 5000,
//!   "shadowSprite": "sprites/shadow.png"
//! }
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::sprite::SizePx;

/// Largest accepted [`PipelineConfig::scale_factor`].
pub const MAX_SCALE_FACTOR: u32 = 64;

/// Largest accepted canvas width or height, in output pixels.
pub const MAX_CANVAS_SIDE: u32 = 8192;

/// Geometry, timing and asset settings shared by every pipeline run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
pub struct PipelineConfig {
    /// Width of every surface, in output pixels.
    pub canvas_width: u32,

    /// Height of every surface, in output pixels.
    pub canvas_height: u32,

    /// Upscale applied to every part and to the shadow sprite.
    ///
    /// This is also the border thickness, see [`Self::border_thickness`].
    pub scale_factor: u32,

    /// Vertical offset of every part, in native (unscaled) pixels.
    pub part_offset_y: i32,

    /// Vertical offset of the shadow sprite, in native pixels.
    pub shadow_offset_y: i32,

    /// Native width shared by all parts. Used for placeholders.
    pub part_width: u32,

    /// Native height shared by all parts. Used for placeholders.
    pub part_height: u32,

    /// Upper bound on a single image load, in milliseconds.
    ///
    /// `None` waits forever, so one unreachable reference blocks the run.
    pub load_timeout_ms: Option<u64>,

    /// Reference of the shadow sprite drawn beneath the character.
    pub shadow_sprite: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            canvas_width: 128,
            canvas_height: 144,
            scale_factor: 4,
            part_offset_y: 2,
            shadow_offset_y: 4,
            part_width: 32,
            part_height: 32,
            load_timeout_ms: Some(5000),
            shadow_sprite: "sprites/shadow.png".to_string(),
        }
    }
}

impl PipelineConfig {
    pub fn canvas_size(&self) -> SizePx {
        SizePx::new(self.canvas_width, self.canvas_height)
    }

    pub fn part_size(&self) -> SizePx {
        SizePx::new(self.part_width, self.part_height)
    }

    /// Outline thickness in output pixels.
    ///
    /// Always equal to the scale factor: the 8-direction stamping kernel
    /// steps one upscaled texel at a time, and any other radius leaves seams.
    pub fn border_thickness(&self) -> i32 {
        i32::try_from(self.scale_factor).unwrap_or(i32::MAX)
    }

    /// Vertical offset of parts in output pixels.
    pub fn scaled_part_offset_y(&self) -> i32 {
        self.part_offset_y.saturating_mul(self.border_thickness())
    }

    /// Vertical offset of the shadow in output pixels.
    pub fn scaled_shadow_offset_y(&self) -> i32 {
        self.shadow_offset_y.saturating_mul(self.border_thickness())
    }

    fn scale_fits(&self, value: i64) -> bool {
        value
            .checked_mul(i64::from(self.scale_factor))
            .and_then(|scaled| i32::try_from(scaled).ok())
            .is_some()
    }

    pub fn load_timeout(&self) -> Option<Duration> {
        self.load_timeout_ms.map(Duration::from_millis)
    }

    /// Sets the per-image load bound.
    pub fn with_load_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.load_timeout_ms = timeout.map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX));
        self
    }

    /// Sets the shadow sprite reference.
    pub fn with_shadow_sprite(mut self, reference: impl Into<String>) -> Self {
        self.shadow_sprite = reference.into();
        self
    }

    /// Checks that the geometry is usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=MAX_SCALE_FACTOR).contains(&self.scale_factor) {
            return Err(ConfigError::Invalid(format!(
                "scaleFactor {} is outside 1..={MAX_SCALE_FACTOR}",
                self.scale_factor
            )));
        }
        if self.canvas_size().is_empty() {
            return Err(ConfigError::Invalid(format!(
                "canvas size {}x{} has a zero dimension",
                self.canvas_width, self.canvas_height
            )));
        }
        if self.canvas_width > MAX_CANVAS_SIDE || self.canvas_height > MAX_CANVAS_SIDE {
            return Err(ConfigError::Invalid(format!(
                "canvas size {}x{} exceeds {MAX_CANVAS_SIDE} pixels per side",
                self.canvas_width, self.canvas_height
            )));
        }
        if self.part_size().is_empty() {
            return Err(ConfigError::Invalid(format!(
                "part size {}x{} has a zero dimension",
                self.part_width, self.part_height
            )));
        }
        let scaled = [
            ("partWidth", i64::from(self.part_width)),
            ("partHeight", i64::from(self.part_height)),
            ("partOffsetY", i64::from(self.part_offset_y)),
            ("shadowOffsetY", i64::from(self.shadow_offset_y)),
        ];
        if let Some((field, _)) = scaled.iter().find(|(_, value)| !self.scale_fits(*value)) {
            return Err(ConfigError::Invalid(format!(
                "{field} times scaleFactor {} overflows the pixel range",
                self.scale_factor
            )));
        }
        Ok(())
    }

    /// Parses and validates a config from JSON. Missing fields take defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a JSON config file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = PipelineConfig::default();
        config.validate().unwrap();
        assert_eq!(config.canvas_size(), SizePx::new(128, 144));
        assert_eq!(config.border_thickness(), 4);
        assert_eq!(config.scaled_part_offset_y(), 8);
        assert_eq!(config.scaled_shadow_offset_y(), 16);
        assert_eq!(config.load_timeout(), Some(Duration::from_secs(5)));
    }

    #[test]
    fn partial_json_takes_defaults() {
        let config = PipelineConfig::from_json(r#"{"scaleFactor": 2, "loadTimeoutMs": null}"#).unwrap();
        assert_eq!(config.scale_factor, 2);
        assert_eq!(config.border_thickness(), 2);
        assert_eq!(config.load_timeout(), None);
        assert_eq!(config.canvas_width, 128);
    }

    #[test]
    fn zero_scale_is_rejected() {
        let err = PipelineConfig::from_json(r#"{"scaleFactor": 0}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn oversized_scale_is_rejected() {
        let err = PipelineConfig::from_json(r#"{"scaleFactor": 3000000000}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));

        let huge = PipelineConfig { scale_factor: 3_000_000_000, ..PipelineConfig::default() };
        assert_eq!(huge.border_thickness(), i32::MAX);
        assert_eq!(huge.scaled_part_offset_y(), i32::MAX);
    }

    #[test]
    fn scaled_geometry_must_fit_pixel_range() {
        let config = PipelineConfig {
            scale_factor: MAX_SCALE_FACTOR,
            part_width: u32::MAX / 2,
            ..PipelineConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let config = PipelineConfig { shadow_offset_y: i32::MIN, ..PipelineConfig::default() };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let config = PipelineConfig { canvas_width: MAX_CANVAS_SIDE + 1, ..PipelineConfig::default() };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let config = PipelineConfig { scale_factor: MAX_SCALE_FACTOR, ..PipelineConfig::default() };
        config.validate().unwrap();
    }

    #[test]
    fn zero_canvas_is_rejected() {
        let err = PipelineConfig::from_json(r#"{"canvasWidth": 0}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn json_uses_camel_case() {
        let json = PipelineConfig::default().to_json_pretty().unwrap();
        assert!(json.contains("\"scaleFactor\""));
        assert!(json.contains("\"shadowSprite\""));
        let restored = PipelineConfig::from_json(&json).unwrap();
        assert_eq!(restored, PipelineConfig::default());
    }
}
