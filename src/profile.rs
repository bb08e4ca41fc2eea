//! Serializable render inputs.
//!
//! [`RenderProps`] is what the UI boundary hands to the renderer: the part
//! references in draw order and the outline color. It serializes to JSON for
//! passing between a frontend and a rendering backend.
//!
//! # Example
//!
//! ```
//! use sprite_renderer::RenderProps;
//!
//! let props = RenderProps::new()
//!     .with_part("sprites/body/pale.png")
//!     .with_part("sprites/hair/short_brown.png")
//!     .with_border_color("#ffcc00");
//!
//! let json = props.to_json().unwrap();
//! let restored = RenderProps::from_json(&json).unwrap();
//! assert_eq!(restored, props);
//! ```

use serde::{Deserialize, Serialize};

use crate::part::{PartRef, PartStack};

/// Inputs of one render: ordered part references and a border color.
///
/// # JSON Format
///
/// ```json
/// {
///   "imagesToRender": ["sprites/body/pale.png", "sprites/hair/short_brown.png"],
///   "borderColor": "#ffcc00"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
pub struct RenderProps {
    /// Part references, bottom layer first.
    #[serde(default)]
    pub images_to_render: Vec<String>,

    /// CSS color of the outline. Not validated.
    #[serde(default = "default_border_color")]
    pub border_color: String,
}

fn default_border_color() -> String {
    "#000000".to_string()
}

impl Default for RenderProps {
    fn default() -> Self {
        Self {
            images_to_render: Vec::new(),
            border_color: default_border_color(),
        }
    }
}

impl RenderProps {
    /// Creates props with no parts and a black border.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a part on top of the current ones.
    pub fn with_part(mut self, reference: impl Into<String>) -> Self {
        self.images_to_render.push(reference.into());
        self
    }

    /// Replaces all parts.
    pub fn with_parts<I, S>(mut self, parts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.images_to_render = parts.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_border_color(mut self, color: impl Into<String>) -> Self {
        self.border_color = color.into();
        self
    }

    /// Returns the dense part stack, with blank references removed.
    pub fn part_stack(&self) -> PartStack {
        self.images_to_render.iter().map(|r| PartRef::new(r.as_str())).collect()
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
