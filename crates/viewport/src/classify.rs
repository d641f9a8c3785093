//! Damage classification: maps an update signal to the cheapest correct
//! re-render action.
//!
//! Checks run cheapest first and the first match wins. Anything the cheaper
//! paths cannot prove correct falls through to a subtree repaint.

use scene::{NodeFlags, NodeId, SceneTree, Signal, SignalKind};

/// Why a signal was dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IgnoreReason {
    /// The destination viewport is deleted, destroyed or unknown.
    ViewportGone,
    /// The destination viewport is itself inside an update bracket.
    ViewportUpdating,
    /// The sender is unknown, deleted or destroyed.
    SenderGone,
    /// The sender is still inside its update bracket.
    SenderUpdating,
    /// The sender is not attached under any rendered viewport.
    Detached,
    /// An inner update bracket closed; only the outermost one signals.
    NestedBracket,
}

/// What to re-render in response to a signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RenderAction {
    /// Do nothing.
    Ignore(IgnoreReason),
    /// Restyle, resize, relayout and repaint the whole viewport.
    FullTree,
    /// Repaint one node's subtree in place, optionally recomputing its boxes.
    Node {
        /// Node to repaint.
        node: NodeId,
        /// Recompute the subtree's boxes first.
        relayout: bool,
    },
    /// Restyle `node` and repaint from its nearest render anchor.
    Anchor {
        /// Signal sender.
        node: NodeId,
        /// Ancestor that repaints the region.
        anchor: NodeId,
    },
    /// Restyle `node` and repaint the whole viewport without layout.
    Subtree {
        /// Signal sender.
        node: NodeId,
    },
}

impl RenderAction {
    /// True for [`RenderAction::Ignore`].
    #[inline]
    #[must_use]
    pub const fn is_ignore(self) -> bool {
        matches!(self, Self::Ignore(_))
    }
}

/// Classify `signal` for the viewport rooted at `viewport`.
#[must_use]
pub fn classify(scene: &SceneTree, viewport: NodeId, signal: &Signal) -> RenderAction {
    let Some(target) = scene.node(viewport) else {
        return RenderAction::Ignore(IgnoreReason::ViewportGone);
    };
    if !target.is_live() {
        return RenderAction::Ignore(IgnoreReason::ViewportGone);
    }
    let Some(sender) = scene.node(signal.sender) else {
        return RenderAction::Ignore(IgnoreReason::SenderGone);
    };
    if !sender.is_live() {
        return RenderAction::Ignore(IgnoreReason::SenderGone);
    }
    if sender.flags.contains(NodeFlags::UPDATING) {
        return RenderAction::Ignore(IgnoreReason::SenderUpdating);
    }
    if target.flags.contains(NodeFlags::UPDATING) {
        return RenderAction::Ignore(IgnoreReason::ViewportUpdating);
    }

    if signal.kind == SignalKind::StructureChanged || signal.sender == viewport {
        return RenderAction::FullTree;
    }

    if let Some(scope) = sender
        .widget()
        .and_then(|widget| widget.rerender_scope(&sender.computed))
    {
        return RenderAction::Node {
            node: signal.sender,
            relayout: scope.relayout,
        };
    }

    scene.render_anchor(signal.sender, viewport).map_or(
        RenderAction::Subtree {
            node: signal.sender,
        },
        |anchor| RenderAction::Anchor {
            node: signal.sender,
            anchor,
        },
    )
}
