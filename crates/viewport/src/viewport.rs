//! Viewports: a pixel surface plus the coordinate frame it is placed with.

use crate::config::ViewportConfig;
use crate::frame::CoordinateFrame;
use anyhow::Result as AnyResult;
use core::ops::BitOr;
use core::sync::atomic::{AtomicU64, Ordering};
use raster::{ClipScope, Color, PixelSurface, Point, Rect, Size};
use scene::{NodeId, Style};

/// Identity of the window a viewport renders into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WindowId(u64);

impl WindowId {
    /// Allocate a process-unique id.
    #[inline]
    #[must_use]
    pub fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

/// Role and behavior flags of a viewport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ViewportFlags(u8);

impl ViewportFlags {
    /// No flags.
    pub const NONE: Self = Self(0);
    /// Attached directly to the window, placed by popup placement.
    pub const POPUP: Self = Self(1 << 0);
    /// Popup acting as a menu.
    pub const MENU: Self = Self(1 << 1);
    /// Drawn unclipped over its parent.
    pub const OVERLAY: Self = Self(1 << 2);
    /// Vector canvas; keeps its current buffer when nested with no
    /// allocated size.
    pub const SVG: Self = Self(1 << 3);
    /// Destroy, rather than detach, the layout container's children on close.
    pub const DESTROY_CHILDREN_ON_CLOSE: Self = Self(1 << 4);
    /// Fill the surface before painting children.
    pub const FILL: Self = Self(1 << 5);

    /// Combine two flag sets.
    #[inline]
    #[must_use]
    pub const fn or(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    /// Check if all flags in `other` are present.
    #[inline]
    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        (self.0 & other.0) == other.0
    }
}

impl BitOr for ViewportFlags {
    type Output = Self;

    #[inline]
    fn bitor(self, other: Self) -> Self {
        self.or(other)
    }
}

/// A renderable pixel buffer rooted at a scene node.
#[derive(Debug, Clone)]
pub struct Viewport {
    /// Owned pixels, sized to the frame's `vp_box`.
    pub(crate) surface: PixelSurface,
    /// Placement of the surface.
    pub(crate) frame: CoordinateFrame,
    /// Role flags.
    pub(crate) flags: ViewportFlags,
    /// Explicit fill color, overriding the style background.
    pub(crate) fill: Option<Color>,
    /// Window this viewport last rendered for, set during layout.
    pub(crate) window: Option<WindowId>,
    /// Node whose window origin a popup's open position is relative to.
    pub(crate) placement_parent: Option<NodeId>,
}

impl Viewport {
    /// Create a viewport at `origin` with an explicit pixel size.
    ///
    /// A zero size falls back to the configured minimum buffer.
    ///
    /// # Errors
    /// Returns an error if the surface cannot be allocated.
    pub fn new(
        origin: Point,
        size: Size,
        flags: ViewportFlags,
        config: &ViewportConfig,
    ) -> AnyResult<Self> {
        let size = effective_size(size, config);
        let mut frame = CoordinateFrame::new(Rect::from_origin_size(origin, size));
        frame.set_surface_size(size);
        Ok(Self {
            surface: PixelSurface::allocate(size, config.max_pixels)?,
            frame,
            flags,
            fill: None,
            window: None,
            placement_parent: None,
        })
    }

    /// Use `color` as the fill, enabling [`ViewportFlags::FILL`].
    #[inline]
    #[must_use]
    pub fn with_fill(mut self, color: Color) -> Self {
        self.fill = Some(color);
        self.flags = self.flags | ViewportFlags::FILL;
        self
    }

    /// Pixels of the last render.
    #[inline]
    #[must_use]
    pub const fn surface(&self) -> &PixelSurface {
        &self.surface
    }

    /// Placement of the viewport.
    #[inline]
    #[must_use]
    pub const fn frame(&self) -> &CoordinateFrame {
        &self.frame
    }

    /// Role flags.
    #[inline]
    #[must_use]
    pub const fn flags(&self) -> ViewportFlags {
        self.flags
    }

    /// Window this viewport last rendered for.
    #[inline]
    #[must_use]
    pub const fn window(&self) -> Option<WindowId> {
        self.window
    }

    /// Node whose window origin a popup's open position is relative to.
    #[inline]
    #[must_use]
    pub const fn placement_parent(&self) -> Option<NodeId> {
        self.placement_parent
    }

    /// True for popups.
    #[inline]
    #[must_use]
    pub const fn is_popup(&self) -> bool {
        self.flags.contains(ViewportFlags::POPUP)
    }

    /// True for overlays.
    #[inline]
    #[must_use]
    pub const fn is_overlay(&self) -> bool {
        self.flags.contains(ViewportFlags::OVERLAY)
    }

    /// Fill color for this render, if the viewport fills.
    #[inline]
    #[must_use]
    pub fn fill_color(&self, style: &Style, config: &ViewportConfig) -> Option<Color> {
        self.flags
            .contains(ViewportFlags::FILL)
            .then(|| self.fill.or(style.background).unwrap_or(config.background))
    }

    /// True when the fill hides everything beneath the viewport.
    #[inline]
    #[must_use]
    pub fn is_opaque(&self, style: &Style, config: &ViewportConfig) -> bool {
        self.fill_color(style, config)
            .is_some_and(|color| color.0[3] == u8::MAX)
    }

    /// Resize the surface to `size`, or to the configured minimum when
    /// `size` is empty. The frame follows a successful resize.
    ///
    /// Returns `Ok(false)` when the size did not change.
    ///
    /// # Errors
    /// Returns an error if the new buffer cannot be allocated; the previous
    /// buffer and frame are kept.
    pub fn resize(&mut self, size: Size, config: &ViewportConfig) -> AnyResult<bool> {
        let size = effective_size(size, config);
        let resized = self.surface.resize(size, config.max_pixels)?;
        if resized {
            self.frame.set_surface_size(size);
        }
        Ok(resized)
    }

    /// Open the clip scope for a render of this viewport.
    ///
    /// Overlays always proceed with their own full bounds. An overlay reaches
    /// its host through an unclipped copy, so the host's bounds would never
    /// restrict it and its own surface is the only limit. Other viewports do
    /// not proceed when their `vp_box` is empty or, when `parent_win` is
    /// given, when their window box misses it.
    pub fn push_bounds(&mut self, parent_win: Option<Rect>) -> Option<ClipScope<'_>> {
        let vp_box = self.frame.vp_box();
        if self.is_overlay() {
            return Some(self.surface.push_bounds(self.surface.bounds()));
        }
        if vp_box.is_empty() {
            return None;
        }
        if let Some(parent) = parent_win {
            let win_box = self.frame.win_box()?;
            if win_box.intersect(parent).is_empty() {
                return None;
            }
        }
        Some(self.surface.push_bounds(vp_box))
    }
}

/// Substitute the configured minimum for an empty size.
fn effective_size(size: Size, config: &ViewportConfig) -> Size {
    if size.is_empty() { config.min_size } else { size }
}

#[cfg(test)]
mod tests {
    use super::*;
    use raster::rgba;

    #[allow(clippy::unwrap_used, reason = "test setup")]
    fn viewport(flags: ViewportFlags) -> Viewport {
        Viewport::new(Point::ZERO, Size::new(20, 10), flags, &ViewportConfig::default()).unwrap()
    }

    /// Test that a zero size yields the configured minimum buffer.
    ///
    /// # Panics
    /// Panics if the buffer is not the minimum size.
    #[test]
    #[allow(clippy::unwrap_used, reason = "test assertions")]
    fn zero_size_gets_minimum() {
        let config = ViewportConfig {
            min_size: Size::new(3, 4),
            ..ViewportConfig::default()
        };
        let mut vp = Viewport::new(Point::ZERO, Size::new(0, 0), ViewportFlags::NONE, &config).unwrap();
        assert_eq!(vp.surface().size(), Size::new(3, 4));
        assert!(!vp.resize(Size::new(0, 9), &config).unwrap());
        assert!(vp.resize(Size::new(5, 5), &config).unwrap());
        assert_eq!(vp.frame().vp_box(), Rect::new(0, 0, 5, 5));
    }

    /// Test that an offscreen viewport does not proceed, and overlays always do.
    ///
    /// # Panics
    /// Panics if the gate lets an offscreen viewport render.
    #[test]
    fn push_bounds_gate() {
        let mut vp = viewport(ViewportFlags::NONE);
        vp.frame.complete_layout(Some(Point::new(500, 500)));
        let screen = Some(Rect::new(0, 0, 100, 100));
        assert!(vp.push_bounds(screen).is_none());
        assert!(vp.push_bounds(None).is_some());
        assert_eq!(vp.surface().clip_depth(), 0);

        let mut overlay = viewport(ViewportFlags::OVERLAY);
        overlay.frame.complete_layout(Some(Point::new(500, 500)));
        let scope = overlay.push_bounds(screen);
        assert!(scope.is_some_and(|clip| clip.clip_rect() == Rect::new(0, 0, 20, 10)));
    }

    /// Test fill selection order: explicit fill, style, configured default.
    ///
    /// # Panics
    /// Panics if the wrong color is chosen.
    #[test]
    fn fill_precedence() {
        let config = ViewportConfig::default();
        let styled = Style::with_background(rgba(1, 1, 1, 255));
        assert_eq!(viewport(ViewportFlags::NONE).fill_color(&styled, &config), None);
        let filled = viewport(ViewportFlags::FILL);
        assert_eq!(filled.fill_color(&styled, &config), styled.background);
        assert_eq!(filled.fill_color(&Style::default(), &config), Some(config.background));
        let explicit = filled.with_fill(rgba(0, 0, 0, 0));
        assert!(!explicit.is_opaque(&styled, &config));
    }
}
