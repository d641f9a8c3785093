//! Resolved node styles.
//!
//! Only the properties the renderer consumes are modelled. Cascade and
//! property parsing beyond colors belong to an outer styling layer.

use anyhow::{Result as AnyResult, anyhow};
use raster::{Color, Point, rgba};

/// Style properties of a node.
///
/// The same type holds the declared values and the computed result. During a
/// restyle the foreground color inherits from the parent's computed style;
/// background and position never inherit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Style {
    /// Fill drawn behind the node, if any.
    pub background: Option<Color>,
    /// Color used for the node's content.
    pub foreground: Option<Color>,
    /// Explicit position overriding the allocated position of a viewport.
    pub position: Option<Point>,
}

impl Style {
    /// Style with only a background.
    #[inline]
    #[must_use]
    pub const fn with_background(color: Color) -> Self {
        Self {
            background: Some(color),
            foreground: None,
            position: None,
        }
    }

    /// Resolve this declared style against the parent's computed style.
    #[inline]
    #[must_use]
    pub fn compute(&self, parent: Option<&Self>) -> Self {
        Self {
            background: self.background,
            foreground: self
                .foreground
                .or_else(|| parent.and_then(|inherited| inherited.foreground)),
            position: self.position,
        }
    }

    /// True when the background fully covers whatever is beneath it.
    #[inline]
    #[must_use]
    pub fn has_opaque_background(&self) -> bool {
        self.background.is_some_and(|color| color.0[3] == u8::MAX)
    }
}

/// Parse a CSS color string (`#rrggbb`, `rgb(...)`, named colors, ...).
///
/// # Errors
/// Returns an error if the string is not a valid CSS color.
pub fn parse_color(input: &str) -> AnyResult<Color> {
    let parsed = csscolorparser::parse(input.trim())
        .map_err(|err| anyhow!("invalid color {input:?}: {err}"))?;
    let [red, green, blue, alpha] = parsed.to_rgba8();
    Ok(rgba(red, green, blue, alpha))
}
