//! The scene arena and its mutation API.
//!
//! Every structural change goes through [`SceneTree`] so change flags stay in
//! sync with the arena. Destroyed nodes keep their arena slot as a tombstone,
//! which keeps stale [`NodeId`]s from aliasing newly created nodes.

use crate::flags::NodeFlags;
use crate::node::{LayoutBox, NodeKind, SceneNode};
use crate::signal::{Signal, SignalKind};
use crate::style::Style;
use crate::widget::Widget;
use anyhow::{Result as AnyResult, anyhow};
use indextree::{Arena, Node as ArenaNode, NodeId};
use log::debug;

/// Proof that an update bracket was opened on a node.
///
/// Only the outermost bracket on a subtree emits when it is closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use = "close the bracket with `update_end` or `update_end_no_signal`"]
pub struct UpdateToken {
    /// Bracketed node.
    node: NodeId,
    /// Whether this bracket set the `UPDATING` flag.
    outermost: bool,
}

impl UpdateToken {
    /// Bracketed node.
    #[inline]
    #[must_use]
    pub const fn node(self) -> NodeId {
        self.node
    }

    /// True when this bracket is the outermost one on its node.
    #[inline]
    #[must_use]
    pub const fn is_outermost(self) -> bool {
        self.outermost
    }
}

/// Arena-backed scene graph.
#[derive(Debug, Default)]
pub struct SceneTree {
    /// Node storage. Tree links live in the arena.
    arena: Arena<SceneNode>,
}

impl SceneTree {
    /// Create an empty tree.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a detached widget node.
    pub fn add_widget(&mut self, name: impl Into<String>, widget: impl Widget) -> NodeId {
        self.arena
            .new_node(SceneNode::new(name, NodeKind::Widget(Box::new(widget))))
    }

    /// Create a detached viewport node. Its pixels are owned elsewhere.
    pub fn add_viewport_node(&mut self, name: impl Into<String>) -> NodeId {
        self.arena.new_node(SceneNode::new(name, NodeKind::Viewport))
    }

    /// Borrow a node, including tombstones.
    #[inline]
    #[must_use]
    pub fn node(&self, id: NodeId) -> Option<&SceneNode> {
        self.arena
            .get(id)
            .filter(|entry| !entry.is_removed())
            .map(ArenaNode::get)
    }

    /// Mutably borrow a node, including tombstones.
    #[inline]
    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut SceneNode> {
        self.arena
            .get_mut(id)
            .filter(|entry| !entry.is_removed())
            .map(ArenaNode::get_mut)
    }

    /// Borrow a live node or fail.
    fn live(&self, id: NodeId) -> AnyResult<&SceneNode> {
        self.node(id)
            .filter(|node| !node.flags.contains(NodeFlags::DESTROYED))
            .ok_or_else(|| anyhow!("node {id:?} does not exist or was destroyed"))
    }

    /// Mutably borrow a live node or fail.
    fn live_mut(&mut self, id: NodeId) -> AnyResult<&mut SceneNode> {
        self.node_mut(id)
            .filter(|node| !node.flags.contains(NodeFlags::DESTROYED))
            .ok_or_else(|| anyhow!("node {id:?} does not exist or was destroyed"))
    }

    /// Parent of `id`, if attached.
    #[inline]
    #[must_use]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.arena.get(id)?.parent()
    }

    /// Children of `id` in paint order.
    #[inline]
    #[must_use]
    pub fn children(&self, id: NodeId) -> Vec<NodeId> {
        if self.node(id).is_none() {
            return Vec::new();
        }
        id.children(&self.arena).collect()
    }

    /// `id` and all its descendants in pre-order.
    #[inline]
    #[must_use]
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        if self.node(id).is_none() {
            return Vec::new();
        }
        id.descendants(&self.arena).collect()
    }

    /// Check if the node exists and is neither deleted nor destroyed.
    #[inline]
    #[must_use]
    pub fn is_live(&self, id: NodeId) -> bool {
        self.node(id).is_some_and(SceneNode::is_live)
    }

    /// Check if the node is a viewport.
    #[inline]
    #[must_use]
    pub fn is_viewport(&self, id: NodeId) -> bool {
        self.node(id).is_some_and(SceneNode::is_viewport)
    }

    /// Nearest viewport at or above `id`.
    #[must_use]
    pub fn enclosing_viewport(&self, id: NodeId) -> Option<NodeId> {
        self.node(id)?;
        id.ancestors(&self.arena)
            .find(|ancestor| self.is_viewport(*ancestor))
    }

    /// Nearest ancestor of `id`, strictly below `stop`, whose widget is a
    /// render anchor for its computed style.
    #[must_use]
    pub fn render_anchor(&self, id: NodeId, stop: NodeId) -> Option<NodeId> {
        id.ancestors(&self.arena)
            .skip(1)
            .take_while(|ancestor| *ancestor != stop)
            .find(|ancestor| {
                self.node(*ancestor).is_some_and(|node| {
                    node.is_live()
                        && node
                            .widget()
                            .is_some_and(|widget| widget.is_render_anchor(&node.computed))
                })
            })
    }

    /// Attach `child` as the last child of `parent`.
    ///
    /// A child that is attached elsewhere is moved. The parent gets
    /// `CHILD_ADDED`; a previous parent gets `CHILD_DELETED`.
    ///
    /// # Errors
    /// Returns an error if either node is destroyed or the move would create
    /// a cycle.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> AnyResult<()> {
        self.live(parent)?;
        self.live(child)?;
        if parent.ancestors(&self.arena).any(|ancestor| ancestor == child) {
            return Err(anyhow!("cannot append {child:?} under its own descendant {parent:?}"));
        }
        if let Some(previous) = self.parent(child) {
            child.detach(&mut self.arena);
            self.live_mut(previous)?.flags.insert(NodeFlags::CHILD_DELETED);
        }
        parent.checked_append(child, &mut self.arena)?;
        self.live_mut(child)?.flags.remove(NodeFlags::DELETED);
        self.live_mut(parent)?.flags.insert(NodeFlags::CHILD_ADDED);
        Ok(())
    }

    /// Detach `child` from `parent`, destroying it when `destroy` is set.
    ///
    /// Returns the ids of destroyed nodes (empty when only detached).
    ///
    /// # Errors
    /// Returns an error if `child` is not a child of `parent`.
    pub fn delete_child(
        &mut self,
        parent: NodeId,
        child: NodeId,
        destroy: bool,
    ) -> AnyResult<Vec<NodeId>> {
        if self.parent(child) != Some(parent) {
            return Err(anyhow!("{child:?} is not a child of {parent:?}"));
        }
        child.detach(&mut self.arena);
        self.live_mut(parent)?.flags.insert(NodeFlags::CHILD_DELETED);
        self.live_mut(child)?.flags.insert(NodeFlags::DELETED);
        Ok(if destroy { self.destroy(child) } else { Vec::new() })
    }

    /// Detach every child of `parent`, destroying them when `destroy` is set.
    ///
    /// Returns the detached children in their former order.
    ///
    /// # Errors
    /// Returns an error if `parent` does not exist.
    pub fn delete_children(&mut self, parent: NodeId, destroy: bool) -> AnyResult<Vec<NodeId>> {
        self.live(parent)?;
        let children = self.children(parent);
        for child in &children {
            self.delete_child(parent, *child, destroy)?;
        }
        Ok(children)
    }

    /// Destroy `id` and its subtree, releasing widget payloads.
    ///
    /// Returns every destroyed id. Destroying twice is a no-op.
    pub fn destroy(&mut self, id: NodeId) -> Vec<NodeId> {
        if self.node(id).is_none_or(|node| node.flags.contains(NodeFlags::DESTROYED)) {
            return Vec::new();
        }
        if let Some(parent) = self.parent(id) {
            id.detach(&mut self.arena);
            if let Some(node) = self.node_mut(parent) {
                node.flags.insert(NodeFlags::CHILD_DELETED);
            }
        }
        let doomed = self.descendants(id);
        for victim in &doomed {
            if let Some(node) = self.node_mut(*victim) {
                node.flags.insert(NodeFlags::DELETED | NodeFlags::DESTROYED);
                node.flags.remove(NodeFlags::UPDATING);
                node.kind = NodeKind::Destroyed;
            }
        }
        debug!(target: "scene::tree", "destroyed {} node(s) under {id:?}", doomed.len());
        doomed
    }

    /// Replace the allocated layout box, flagging the node when it moved or
    /// resized.
    ///
    /// # Errors
    /// Returns an error if the node is destroyed.
    pub fn set_layout(&mut self, id: NodeId, layout: LayoutBox) -> AnyResult<()> {
        let node = self.live_mut(id)?;
        if node.layout != layout {
            node.layout = layout;
            node.flags.insert(NodeFlags::LAYOUT_CHANGED);
        }
        Ok(())
    }

    /// Replace the declared style. Takes effect on the next restyle.
    ///
    /// # Errors
    /// Returns an error if the node is destroyed.
    pub fn set_style(&mut self, id: NodeId, style: Style) -> AnyResult<()> {
        self.live_mut(id)?.declared = style;
        Ok(())
    }

    /// Recompute styles of `id` and its descendants, top-down.
    pub fn restyle_subtree(&mut self, id: NodeId) {
        for current in self.descendants(id) {
            let inherited = self
                .parent(current)
                .and_then(|parent| self.node(parent))
                .map(|parent| parent.computed);
            if let Some(node) = self.node_mut(current) {
                node.computed = node.declared.compute(inherited.as_ref());
                node.restyles += 1;
            }
        }
    }

    /// Borrow the concrete widget of `id`.
    #[must_use]
    pub fn widget<W: Widget>(&self, id: NodeId) -> Option<&W> {
        self.node(id)?.widget()?.as_any().downcast_ref::<W>()
    }

    /// Mutably borrow the concrete widget of `id` and mark its value changed.
    pub fn widget_mut<W: Widget>(&mut self, id: NodeId) -> Option<&mut W> {
        let node = self.node_mut(id)?;
        node.flags.insert(NodeFlags::VALUE_CHANGED);
        match &mut node.kind {
            NodeKind::Widget(widget) => widget.as_any_mut().downcast_mut::<W>(),
            NodeKind::Viewport | NodeKind::Destroyed => None,
        }
    }

    /// Open an update bracket on `id`, marking its subtree `UPDATING`.
    ///
    /// Nested brackets return a token that will not emit.
    pub fn update_start(&mut self, id: NodeId) -> UpdateToken {
        let outermost = self
            .node(id)
            .is_some_and(|node| node.is_live() && !node.flags.contains(NodeFlags::UPDATING));
        if outermost {
            self.set_subtree_flags(id, NodeFlags::UPDATING, true);
        }
        UpdateToken { node: id, outermost }
    }

    /// Close an update bracket.
    ///
    /// The outermost bracket clears `UPDATING` and the change flags of the
    /// subtree and yields a signal: `StructureChanged` when any node in it had
    /// children added or removed or its layout changed, `ValueChanged`
    /// otherwise. Inner brackets and dead nodes yield nothing.
    pub fn update_end(&mut self, token: UpdateToken) -> Option<Signal> {
        let changes = self.close_bracket(token)?;
        let kind = if changes.intersects(NodeFlags::STRUCTURAL) {
            SignalKind::StructureChanged
        } else {
            SignalKind::ValueChanged
        };
        self.is_live(token.node).then_some(Signal {
            kind,
            sender: token.node,
        })
    }

    /// Close an update bracket without emitting.
    pub fn update_end_no_signal(&mut self, token: UpdateToken) {
        self.close_bracket(token);
    }

    /// Clear bracket state; returns the accumulated change flags of the
    /// subtree for an outermost bracket.
    fn close_bracket(&mut self, token: UpdateToken) -> Option<NodeFlags> {
        if !token.outermost || self.node(token.node).is_none() {
            return None;
        }
        let mut changes = NodeFlags::NONE;
        for current in self.descendants(token.node) {
            if let Some(node) = self.node_mut(current) {
                changes.insert(node.flags);
                node.flags.remove(NodeFlags::UPDATING.or(NodeFlags::CHANGES));
            }
        }
        Some(changes)
    }

    /// Set or clear `flags` on `id` and its descendants.
    pub fn set_subtree_flags(&mut self, id: NodeId, flags: NodeFlags, on: bool) {
        for current in self.descendants(id) {
            if let Some(node) = self.node_mut(current) {
                if on {
                    node.flags.insert(flags);
                } else {
                    node.flags.remove(flags);
                }
            }
        }
    }
}
