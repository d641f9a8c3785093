//! Node payloads stored in the scene arena.

use crate::flags::NodeFlags;
use crate::style::Style;
use crate::widget::Widget;
use raster::{Point, Rect, Size};

/// Allocated layout box, positioned in the containing viewport's coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LayoutBox {
    /// Allocated top-left corner.
    pub pos: Point,
    /// Allocated extent.
    pub size: Size,
}

impl LayoutBox {
    /// Create a new layout box.
    #[inline]
    #[must_use]
    pub const fn new(pos: Point, size: Size) -> Self {
        Self { pos, size }
    }

    /// The box as a rectangle.
    #[inline]
    #[must_use]
    pub const fn rect(self) -> Rect {
        Rect::from_origin_size(self.pos, self.size)
    }
}

/// Boxes derived from the layout box during a layout pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NodeBoxes {
    /// Visible part of the layout box in viewport coordinates.
    pub vp_box: Rect,
    /// `vp_box` in window coordinates.
    pub win_box: Rect,
}

/// What a node draws.
#[derive(Debug)]
pub enum NodeKind {
    /// A drawable widget.
    Widget(Box<dyn Widget>),
    /// A nested or root viewport; its pixels are owned by the window.
    Viewport,
    /// A destroyed node whose payload has been released.
    Destroyed,
}

/// One node of the scene graph.
#[derive(Debug)]
pub struct SceneNode {
    /// Debugging name.
    pub name: String,
    /// Lifecycle and change flags.
    pub flags: NodeFlags,
    /// Allocated layout box.
    pub layout: LayoutBox,
    /// Derived boxes from the last layout pass.
    pub boxes: NodeBoxes,
    /// Declared style.
    pub declared: Style,
    /// Computed style from the last restyle.
    pub computed: Style,
    /// Number of restyles applied to this node.
    pub restyles: u64,
    /// Node payload.
    pub kind: NodeKind,
}

impl SceneNode {
    /// Create a fresh node with default layout and style.
    #[inline]
    #[must_use]
    pub fn new(name: impl Into<String>, kind: NodeKind) -> Self {
        Self {
            name: name.into(),
            flags: NodeFlags::NONE,
            layout: LayoutBox::default(),
            boxes: NodeBoxes::default(),
            declared: Style::default(),
            computed: Style::default(),
            restyles: 0,
            kind,
        }
    }

    /// The widget payload, if this node is a live widget.
    #[inline]
    #[must_use]
    pub fn widget(&self) -> Option<&dyn Widget> {
        match &self.kind {
            NodeKind::Widget(widget) => Some(widget.as_ref()),
            NodeKind::Viewport | NodeKind::Destroyed => None,
        }
    }

    /// True for viewport nodes.
    #[inline]
    #[must_use]
    pub const fn is_viewport(&self) -> bool {
        matches!(self.kind, NodeKind::Viewport)
    }

    /// True when the node may be rendered and may signal.
    #[inline]
    #[must_use]
    pub const fn is_live(&self) -> bool {
        !self.flags.is_gone()
    }
}
