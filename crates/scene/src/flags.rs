//! Per-node state and change flags.

use core::ops::BitOr;

/// Bit set describing a node's lifecycle state and pending changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct NodeFlags(u32);

impl NodeFlags {
    /// No flags.
    pub const NONE: Self = Self(0);
    /// Removed from its parent; may be re-attached.
    pub const DELETED: Self = Self(1 << 0);
    /// Torn down for good; never rendered or signaled again.
    pub const DESTROYED: Self = Self(1 << 1);
    /// Inside an update bracket.
    pub const UPDATING: Self = Self(1 << 2);
    /// Drawn by the overlay pass.
    pub const OVERLAY: Self = Self(1 << 3);
    /// A child was attached since the last bracket end.
    pub const CHILD_ADDED: Self = Self(1 << 4);
    /// A child was detached since the last bracket end.
    pub const CHILD_DELETED: Self = Self(1 << 5);
    /// The allocated layout box changed.
    pub const LAYOUT_CHANGED: Self = Self(1 << 6);
    /// A leaf value changed.
    pub const VALUE_CHANGED: Self = Self(1 << 7);

    /// Changes that force a structural re-render.
    pub const STRUCTURAL: Self = Self(Self::CHILD_ADDED.0 | Self::CHILD_DELETED.0 | Self::LAYOUT_CHANGED.0);
    /// Every change flag.
    pub const CHANGES: Self = Self(Self::STRUCTURAL.0 | Self::VALUE_CHANGED.0);

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

    /// Check if any flag in `other` is present.
    #[inline]
    #[must_use]
    pub const fn intersects(self, other: Self) -> bool {
        (self.0 & other.0) != 0
    }

    /// Set the flags in `other`.
    #[inline]
    pub const fn insert(&mut self, other: Self) {
        self.0 |= other.0;
    }

    /// Clear the flags in `other`.
    #[inline]
    pub const fn remove(&mut self, other: Self) {
        self.0 &= !other.0;
    }

    /// True when the node is deleted or destroyed.
    #[inline]
    #[must_use]
    pub const fn is_gone(self) -> bool {
        self.intersects(Self::DELETED.or(Self::DESTROYED))
    }
}

impl BitOr for NodeFlags {
    type Output = Self;

    #[inline]
    fn bitor(self, other: Self) -> Self {
        self.or(other)
    }
}
