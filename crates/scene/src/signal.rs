//! Update signals emitted when an update bracket closes.

use indextree::NodeId;

/// What kind of change a signal reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SignalKind {
    /// A leaf property changed; no children or geometry changed.
    ValueChanged,
    /// Children were added or removed, or layout changed.
    StructureChanged,
}

/// A change notification from a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Signal {
    /// Change category.
    pub kind: SignalKind,
    /// Node that emitted the signal.
    pub sender: NodeId,
}

impl Signal {
    /// A value-changed signal from `sender`.
    #[inline]
    #[must_use]
    pub const fn value(sender: NodeId) -> Self {
        Self {
            kind: SignalKind::ValueChanged,
            sender,
        }
    }

    /// A structure-changed signal from `sender`.
    #[inline]
    #[must_use]
    pub const fn structure(sender: NodeId) -> Self {
        Self {
            kind: SignalKind::StructureChanged,
            sender,
        }
    }
}
