//! Widget capabilities consumed by the renderer.

use crate::style::Style;
use core::fmt::Debug;
use raster::{Blend, Color, PixelSurface, Rect};
use std::any::Any;

/// Drawing context handed to [`Widget::paint`].
///
/// The surface already has the node's visible box pushed as its clip, so
/// widgets may draw anywhere within `bounds` without checking visibility.
#[derive(Debug)]
pub struct PaintContext<'paint> {
    /// Target surface of the enclosing viewport.
    pub surface: &'paint mut PixelSurface,
    /// Allocated layout box in viewport coordinates.
    pub bounds: Rect,
    /// Computed style of the node.
    pub style: &'paint Style,
}

impl PaintContext<'_> {
    /// Fill `rect` within the clip.
    #[inline]
    pub fn fill(&mut self, rect: Rect, color: Color) {
        self.surface.fill_rect(rect, color, Blend::Over);
    }

    /// Fill the whole allocated box, replacing what was there.
    #[inline]
    pub fn cover(&mut self, color: Color) {
        self.surface.fill_rect(self.bounds, color, Blend::Copy);
    }

    /// Paint the style background over the allocated box, if any.
    #[inline]
    pub fn paint_background(&mut self) {
        if let Some(color) = self.style.background {
            self.surface.fill_rect(self.bounds, color, Blend::Over);
        }
    }
}

/// How a value change can be repainted without touching the rest of the
/// viewport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RerenderScope {
    /// Recompute the boxes of the node's subtree before repainting.
    pub relayout: bool,
}

/// A drawable scene node.
pub trait Widget: Debug + Any {
    /// Draw the node itself. Children are painted afterwards by the renderer.
    fn paint(&self, ctx: &mut PaintContext<'_>);

    /// Repaint contract for value changes.
    ///
    /// Returning `Some` promises that painting this subtree fully covers the
    /// node's box, so it can be redrawn in place.
    fn rerender_scope(&self, _style: &Style) -> Option<RerenderScope> {
        None
    }

    /// True when repainting this node reconstructs the whole region of its
    /// descendants.
    fn is_render_anchor(&self, _style: &Style) -> bool {
        false
    }

    /// True for layout containers.
    fn is_layout(&self) -> bool {
        false
    }

    /// Upcast for downcasting to the concrete widget.
    fn as_any(&self) -> &dyn Any;

    /// Mutable upcast for downcasting to the concrete widget.
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Layout container. Paints its background and anchors re-renders when the
/// background is opaque.
#[derive(Debug, Clone, Copy, Default)]
pub struct Frame;

impl Widget for Frame {
    fn paint(&self, ctx: &mut PaintContext<'_>) {
        ctx.paint_background();
    }

    fn is_render_anchor(&self, style: &Style) -> bool {
        style.has_opaque_background()
    }

    fn is_layout(&self) -> bool {
        true
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// A solid rectangle.
#[derive(Debug, Clone, Copy)]
pub struct Block {
    /// Fill color.
    pub color: Color,
    /// Advertise in-place repaints for value changes.
    pub self_render: bool,
}

impl Block {
    /// A block that repaints in place when its color is opaque.
    #[inline]
    #[must_use]
    pub const fn new(color: Color) -> Self {
        Self {
            color,
            self_render: true,
        }
    }
}

impl Widget for Block {
    fn paint(&self, ctx: &mut PaintContext<'_>) {
        ctx.paint_background();
        ctx.fill(ctx.bounds, self.color);
    }

    fn rerender_scope(&self, style: &Style) -> Option<RerenderScope> {
        let covers = self.color.0[3] == u8::MAX || style.has_opaque_background();
        (self.self_render && covers).then_some(RerenderScope { relayout: false })
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
