//! Integer pixel geometry shared by surfaces, frames and the compositor.
//!
//! Rectangles are half-open: a rect covers `x..x + width` and `y..y + height`.
//! Edge arithmetic saturates so that boxes placed far outside a surface never
//! wrap around into it.

use core::ops::{Add, Sub};

/// A pixel position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Point {
    /// Horizontal coordinate in pixels.
    pub x: i32,
    /// Vertical coordinate in pixels.
    pub y: i32,
}

impl Point {
    /// The origin.
    pub const ZERO: Self = Self::new(0, 0);

    /// Create a new point.
    #[inline]
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl Add for Point {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Self::new(self.x.saturating_add(other.x), self.y.saturating_add(other.y))
    }
}

impl Sub for Point {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Self::new(self.x.saturating_sub(other.x), self.y.saturating_sub(other.y))
    }
}

/// A pixel extent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Size {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Size {
    /// Create a new size.
    #[inline]
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// True when either dimension is zero.
    #[inline]
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Number of pixels covered.
    #[inline]
    #[must_use]
    pub fn area(self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }
}

/// Right or bottom edge of a span, saturating at `i32::MAX`.
fn span_end(start: i32, len: u32) -> i32 {
    start.saturating_add(i32::try_from(len).unwrap_or(i32::MAX))
}

/// Length between two edges, zero when `end` is not past `start`.
fn span_len(start: i32, end: i32) -> u32 {
    u32::try_from(end.saturating_sub(start)).unwrap_or(0)
}

/// An axis-aligned pixel rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rect {
    /// X coordinate of the left edge.
    pub x: i32,
    /// Y coordinate of the top edge.
    pub y: i32,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Rect {
    /// The canonical empty rectangle.
    pub const EMPTY: Self = Self::new(0, 0, 0, 0);

    /// Create a new rectangle.
    #[inline]
    #[must_use]
    pub const fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Rectangle at `origin` with the given size.
    #[inline]
    #[must_use]
    pub const fn from_origin_size(origin: Point, size: Size) -> Self {
        Self::new(origin.x, origin.y, size.width, size.height)
    }

    /// Rectangle anchored at the origin with the given size.
    #[inline]
    #[must_use]
    pub const fn from_size(size: Size) -> Self {
        Self::new(0, 0, size.width, size.height)
    }

    /// Top-left corner.
    #[inline]
    #[must_use]
    pub const fn origin(self) -> Point {
        Point::new(self.x, self.y)
    }

    /// Extent of the rectangle.
    #[inline]
    #[must_use]
    pub const fn size(self) -> Size {
        Size::new(self.width, self.height)
    }

    /// Exclusive right edge.
    #[inline]
    #[must_use]
    pub fn right(self) -> i32 {
        span_end(self.x, self.width)
    }

    /// Exclusive bottom edge.
    #[inline]
    #[must_use]
    pub fn bottom(self) -> i32 {
        span_end(self.y, self.height)
    }

    /// True when the rectangle covers no pixels.
    #[inline]
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Number of pixels covered.
    #[inline]
    #[must_use]
    pub fn area(self) -> u64 {
        self.size().area()
    }

    /// Check if this rectangle overlaps another by at least one pixel.
    #[inline]
    #[must_use]
    pub fn intersects(self, other: Self) -> bool {
        !self.is_empty()
            && !other.is_empty()
            && self.x < other.right()
            && other.x < self.right()
            && self.y < other.bottom()
            && other.y < self.bottom()
    }

    /// Overlapping region of two rectangles, [`Rect::EMPTY`] when disjoint.
    #[inline]
    #[must_use]
    pub fn intersect(self, other: Self) -> Self {
        if !self.intersects(other) {
            return Self::EMPTY;
        }
        let left = self.x.max(other.x);
        let top = self.y.max(other.y);
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());
        Self::new(left, top, span_len(left, right), span_len(top, bottom))
    }

    /// Smallest rectangle containing both. Empty inputs are ignored.
    #[inline]
    #[must_use]
    pub fn union(self, other: Self) -> Self {
        if self.is_empty() {
            return other;
        }
        if other.is_empty() {
            return self;
        }
        let left = self.x.min(other.x);
        let top = self.y.min(other.y);
        let right = self.right().max(other.right());
        let bottom = self.bottom().max(other.bottom());
        Self::new(left, top, span_len(left, right), span_len(top, bottom))
    }

    /// Move the rectangle by `delta`.
    #[inline]
    #[must_use]
    pub fn translate(self, delta: Point) -> Self {
        let origin = self.origin() + delta;
        Self::new(origin.x, origin.y, self.width, self.height)
    }

    /// True when `point` lies inside the rectangle.
    #[inline]
    #[must_use]
    pub fn contains(self, point: Point) -> bool {
        point.x >= self.x && point.x < self.right() && point.y >= self.y && point.y < self.bottom()
    }
}
