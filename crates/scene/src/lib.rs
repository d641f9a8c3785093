//! Retained scene graph consumed by the viewport engine.
//!
//! Nodes live in an [`indextree::Arena`]; parents are arena indices rather
//! than owning references. Each node carries a declared and a computed
//! [`Style`], an allocated [`LayoutBox`], derived [`NodeBoxes`] and
//! [`NodeFlags`]. Mutations happen inside update brackets whose outermost end
//! yields a [`Signal`] for the enclosing viewport to classify.

pub mod flags;
pub mod node;
pub mod signal;
pub mod style;
pub mod tree;
pub mod widget;

pub use flags::NodeFlags;
pub use indextree::NodeId;
pub use node::{LayoutBox, NodeBoxes, NodeKind, SceneNode};
pub use signal::{Signal, SignalKind};
pub use style::{Style, parse_color};
pub use tree::{SceneTree, UpdateToken};
pub use widget::{Block, Frame, PaintContext, RerenderScope, Widget};
