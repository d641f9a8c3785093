//! Runtime configuration for viewport allocation and trace verbosity.
//!
//! Configuration can be loaded from environment variables or constructed
//! programmatically.

use log::{Level, warn};
use raster::{Color, DEFAULT_MAX_PIXELS, Size, rgba};
use scene::parse_color;
use std::env;

/// Buffer size given to viewports that have no allocated size yet.
pub const DEFAULT_MIN_SIZE: Size = Size::new(64, 64);

/// Runtime configuration for a [`crate::Window`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ViewportConfig {
    /// Buffer size for viewports with a zero allocation.
    pub min_size: Size,
    /// Largest pixel count any single surface may allocate.
    pub max_pixels: u64,
    /// Fill color for filled viewports without a background style.
    pub background: Color,
    /// Log classifier decisions at `info` instead of `debug`.
    pub update_trace: bool,
    /// Log per-viewport render steps at `info` instead of `debug`.
    pub render_trace: bool,
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            min_size: DEFAULT_MIN_SIZE,
            max_pixels: DEFAULT_MAX_PIXELS,
            background: rgba(255, 255, 255, 255),
            update_trace: false,
            render_trace: false,
        }
    }
}

impl ViewportConfig {
    /// Load configuration from environment variables.
    ///
    /// Reads the following environment variables:
    /// - `VIEWPORT_MIN_SIZE`: `WxH` buffer for unsized viewports (default: 64x64)
    /// - `VIEWPORT_MAX_PIXELS`: per-surface pixel limit (default: 268435456)
    /// - `VIEWPORT_BACKGROUND`: CSS color for filled viewports (default: #ffffff)
    /// - `VIEWPORT_UPDATE_TRACE`: Set to "1" to log classifier decisions at info
    /// - `VIEWPORT_RENDER_TRACE`: Set to "1" to log render steps at info
    ///
    /// Unparseable values fall back to the defaults.
    #[inline]
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let min_size = env::var("VIEWPORT_MIN_SIZE")
            .ok()
            .and_then(|val| parse_size(&val))
            .unwrap_or(defaults.min_size);
        let max_pixels = env::var("VIEWPORT_MAX_PIXELS")
            .ok()
            .and_then(|val| val.trim().parse::<u64>().ok())
            .and_then(|limit| (limit > 0).then_some(limit))
            .unwrap_or(defaults.max_pixels);
        let background = env::var("VIEWPORT_BACKGROUND")
            .ok()
            .and_then(|val| {
                parse_color(&val)
                    .inspect_err(|err| warn!(target: "viewport::config", "ignoring VIEWPORT_BACKGROUND: {err}"))
                    .ok()
            })
            .unwrap_or(defaults.background);
        let update_trace = env::var("VIEWPORT_UPDATE_TRACE").ok().as_deref() == Some("1");
        let render_trace = env::var("VIEWPORT_RENDER_TRACE").ok().as_deref() == Some("1");
        Self {
            min_size,
            max_pixels,
            background,
            update_trace,
            render_trace,
        }
    }

    /// Log level for classifier decisions.
    #[inline]
    #[must_use]
    pub const fn update_level(&self) -> Level {
        if self.update_trace {
            Level::Info
        } else {
            Level::Debug
        }
    }

    /// Log level for render steps.
    #[inline]
    #[must_use]
    pub const fn render_level(&self) -> Level {
        if self.render_trace {
            Level::Info
        } else {
            Level::Debug
        }
    }
}

/// Parse a `WxH` size with both dimensions non-zero.
#[must_use]
pub fn parse_size(input: &str) -> Option<Size> {
    let (width, height) = input.trim().split_once(['x', 'X'])?;
    let width = width.trim().parse::<u32>().ok()?;
    let height = height.trim().parse::<u32>().ok()?;
    (width > 0 && height > 0).then_some(Size::new(width, height))
}
