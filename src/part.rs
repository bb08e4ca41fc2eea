//! Part image references and the ordered stack they form.

use std::fmt;

use serde::{Deserialize, Serialize};

/// An opaque locator for one sprite layer.
///
/// Usually an asset path (`sprites/hair/short.png`) or a `data:` URL. The
/// reference has no identity beyond its string value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
pub struct PartRef(String);

impl PartRef {
    pub fn new(reference: impl Into<String>) -> Self {
        Self(reference.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for PartRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<S: Into<String>> From<S> for PartRef {
    fn from(s: S) -> Self {
        Self::new(s)
    }
}

/// Parts in draw order: index 0 is drawn first (bottom), the last entry on top.
///
/// The stack is always dense. Layer slots the character does not use are
/// omitted rather than stored as empty placeholders. Duplicates are kept and
/// drawn once per occurrence.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PartStack {
    parts: Vec<PartRef>,
}

impl PartStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a dense stack from sparse layer slots, keeping slot order and
    /// dropping absent or blank slots.
    pub fn from_slots<I, R>(slots: I) -> Self
    where
        I: IntoIterator<Item = Option<R>>,
        R: Into<PartRef>,
    {
        slots.into_iter().flatten().collect()
    }

    /// Appends a part on top of the stack.
    pub fn push(&mut self, part: impl Into<PartRef>) {
        let part = part.into();
        if !part.is_empty() {
            self.parts.push(part);
        }
    }

    pub fn len(&self) -> usize {
        self.parts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PartRef> {
        self.parts.iter()
    }

    pub fn as_slice(&self) -> &[PartRef] {
        &self.parts
    }
}

impl<R: Into<PartRef>> FromIterator<R> for PartStack {
    fn from_iter<T: IntoIterator<Item = R>>(iter: T) -> Self {
        let mut stack = Self::new();
        for part in iter {
            stack.push(part);
        }
        stack
    }
}

impl<'a> IntoIterator for &'a PartStack {
    type Item = &'a PartRef;
    type IntoIter = std::slice::Iter<'a, PartRef>;

    fn into_iter(self) -> Self::IntoIter {
        self.parts.iter()
    }
}
