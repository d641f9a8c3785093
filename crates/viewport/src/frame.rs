//! Per-viewport coordinate frames.
//!
//! A frame holds three rectangles: `view_box` in the parent viewport's
//! coordinates, `vp_box` in the viewport's own 0,0-origin space, and
//! `win_box` in window coordinates. `win_box` is derived during a layout pass
//! and reads as `None` while a pass is in flight.

use raster::{Point, Rect, Size};

/// Coordinate frame of one viewport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CoordinateFrame {
    /// Position and size in the parent viewport (window for roots).
    view_box: Rect,
    /// Own drawable rectangle; always the surface bounds.
    vp_box: Rect,
    /// Absolute window rectangle, unset mid-layout.
    win_box: Option<Rect>,
}

impl CoordinateFrame {
    /// Frame for a freshly created viewport at `view_box`, before any layout
    /// pass has run.
    #[inline]
    #[must_use]
    pub const fn new(view_box: Rect) -> Self {
        Self {
            view_box,
            vp_box: Rect::EMPTY,
            win_box: None,
        }
    }

    /// Position and size in the parent's coordinates.
    #[inline]
    #[must_use]
    pub const fn view_box(&self) -> Rect {
        self.view_box
    }

    /// Own 0,0-origin drawable rectangle.
    #[inline]
    #[must_use]
    pub const fn vp_box(&self) -> Rect {
        self.vp_box
    }

    /// Absolute window rectangle, `None` during a layout pass.
    #[inline]
    #[must_use]
    pub const fn win_box(&self) -> Option<Rect> {
        self.win_box
    }

    /// Window origin, or the parent-relative origin when no pass has
    /// completed yet.
    #[inline]
    #[must_use]
    pub fn win_origin(&self) -> Point {
        self.win_box.map_or(self.view_box.origin(), Rect::origin)
    }

    /// Invalidate the window box for the duration of a layout pass.
    #[inline]
    pub const fn begin_layout(&mut self) {
        self.win_box = None;
    }

    /// Move the view box without resizing.
    #[inline]
    pub const fn set_view_origin(&mut self, origin: Point) {
        self.view_box = Rect::from_origin_size(origin, self.view_box.size());
    }

    /// Request a new size for roots, whose allocation follows the view box.
    #[inline]
    pub const fn set_view_size(&mut self, size: Size) {
        self.view_box = Rect::from_origin_size(self.view_box.origin(), size);
    }

    /// Track a surface resize: view box and viewport box take the new size.
    #[inline]
    pub const fn set_surface_size(&mut self, size: Size) {
        self.view_box = Rect::from_origin_size(self.view_box.origin(), size);
        self.vp_box = Rect::from_size(size);
    }

    /// Finish a layout pass.
    ///
    /// `parent_origin` is the parent viewport's window origin; `None` places
    /// the frame directly in window coordinates (roots and popups).
    #[inline]
    pub fn complete_layout(&mut self, parent_origin: Option<Point>) {
        let origin = parent_origin.map_or(self.view_box.origin(), |parent| {
            parent + self.view_box.origin()
        });
        self.win_box = Some(Rect::from_origin_size(origin, self.vp_box.size()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Test that the window box is unreadable mid-pass and accumulates the
    /// parent origin afterwards.
    ///
    /// # Panics
    /// Panics if the window box is readable mid-pass or misplaced after.
    #[test]
    fn layout_pass_brackets_win_box() {
        let mut frame = CoordinateFrame::new(Rect::new(5, 7, 10, 10));
        frame.set_surface_size(Size::new(10, 10));
        frame.complete_layout(Some(Point::new(100, 200)));
        assert_eq!(frame.win_box(), Some(Rect::new(105, 207, 10, 10)));

        frame.begin_layout();
        assert_eq!(frame.win_box(), None);
        frame.set_view_origin(Point::new(1, 1));
        frame.complete_layout(None);
        assert_eq!(frame.win_box(), Some(Rect::new(1, 1, 10, 10)));
        assert_eq!(frame.vp_box(), Rect::new(0, 0, 10, 10));
    }
}
