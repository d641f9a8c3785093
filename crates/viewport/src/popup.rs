//! Popup lifecycle: creation, placement, z-order and close.
//!
//! Popups are root viewports attached to the window rather than to the paint
//! tree. Closing a popup detaches the items of its layout container so a menu
//! can hand them to the next popup, unless the popup asks for them to be
//! destroyed with it.

use crate::display::DisplaySurface;
use crate::viewport::{Viewport, ViewportFlags};
use crate::window::Window;
use anyhow::{Result as AnyResult, anyhow};
use log::{debug, info};
use raster::{Point, Size};
use scene::NodeId;

impl<D: DisplaySurface> Window<D> {
    /// Create a closed popup of `size`. When it opens, its position is
    /// taken relative to `placement_parent`, or to the window when `None`.
    ///
    /// # Errors
    /// Returns an error if the popup surface cannot be allocated.
    pub fn new_popup(
        &mut self,
        name: &str,
        size: Size,
        flags: ViewportFlags,
        placement_parent: Option<NodeId>,
    ) -> AnyResult<NodeId> {
        let mut vp = Viewport::new(
            Point::ZERO,
            size,
            ViewportFlags::POPUP | ViewportFlags::FILL | flags,
            &self.config,
        )?;
        vp.placement_parent = placement_parent;
        let id = self.scene.add_viewport_node(name);
        self.viewports.insert(id, vp);
        Ok(id)
    }

    /// Show `popup` with its top-left corner near `at`, on top of every open
    /// popup.
    ///
    /// `at` is relative to the window origin of the popup's placement
    /// parent. The result is clamped so the popup stays inside the window.
    ///
    /// # Errors
    /// Returns an error if `popup` is not a popup of this window.
    pub fn open_popup(&mut self, popup: NodeId, at: Point) -> AnyResult<()> {
        let screen = self.display.size();
        let parent = self
            .viewports
            .get(&popup)
            .filter(|vp| vp.is_popup())
            .ok_or_else(|| anyhow!("{popup:?} is not a popup"))?
            .placement_parent;
        let base = parent.map_or(Point::ZERO, |node| self.placement_origin(node));
        let wanted = base + at;
        let Some(vp) = self.viewports.get_mut(&popup) else {
            return Err(anyhow!("{popup:?} is not a popup"));
        };
        let size = vp.frame.view_box().size();
        let origin = Point::new(
            clamp_axis(wanted.x, size.width, screen.width),
            clamp_axis(wanted.y, size.height, screen.height),
        );
        vp.frame.set_view_origin(origin);
        self.popups.retain(|open| *open != popup);
        self.popups.push(popup);
        info!(target: "viewport::popup", "open {popup:?} at {origin:?}");
        self.full_render(popup);
        self.display.publish();
        Ok(())
    }

    /// Close and destroy `popup`.
    ///
    /// When the popup holds a single layout container and does not carry
    /// [`ViewportFlags::DESTROY_CHILDREN_ON_CLOSE`], the container's children
    /// are detached first and returned for reuse.
    ///
    /// # Errors
    /// Returns an error if `popup` is not a popup of this window.
    pub fn close_popup(&mut self, popup: NodeId) -> AnyResult<Vec<NodeId>> {
        let flags = self
            .viewports
            .get(&popup)
            .filter(|vp| vp.is_popup())
            .ok_or_else(|| anyhow!("{popup:?} is not a popup"))?
            .flags;
        let mut detached = Vec::new();
        if !flags.contains(ViewportFlags::DESTROY_CHILDREN_ON_CLOSE)
            && let [layout] = self.scene.children(popup)[..]
            && self
                .scene
                .node(layout)
                .and_then(|node| node.widget())
                .is_some_and(|widget| widget.is_layout())
        {
            detached = self.scene.delete_children(layout, false)?;
        }
        let destroyed = self.scene.destroy(popup);
        self.forget(&destroyed);
        info!(
            target: "viewport::popup",
            "closed {popup:?}: {} item(s) detached, {} node(s) destroyed",
            detached.len(),
            destroyed.len()
        );
        self.upload_all();
        self.display.publish();
        Ok(detached)
    }

    /// Window position of a placement parent's top-left corner, before any
    /// clipping. Detached or destroyed parents place relative to the window.
    fn placement_origin(&self, node: NodeId) -> Point {
        if !self.scene.is_live(node) {
            debug!(target: "viewport::popup", "placement parent {node:?} is gone");
            return Point::ZERO;
        }
        if let Some(vp) = self.viewports.get(&node) {
            return vp.frame.win_origin();
        }
        let host = self
            .scene
            .enclosing_viewport(node)
            .and_then(|host| self.viewports.get(&host))
            .map_or(Point::ZERO, |host| host.frame.win_origin());
        self.scene
            .node(node)
            .map_or(host, |entry| host + entry.layout.pos)
    }

    /// The topmost open popup when it is a menu.
    #[must_use]
    pub fn top_menu(&self) -> Option<NodeId> {
        self.popups.last().copied().filter(|popup| {
            self.viewports
                .get(popup)
                .is_some_and(|vp| vp.flags.contains(ViewportFlags::MENU))
        })
    }
}

/// Clamp a popup's leading edge so `extent` fits inside `limit`, never
/// below zero.
fn clamp_axis(at: i32, extent: u32, limit: u32) -> i32 {
    let room = i64::from(limit) - i64::from(extent);
    let clamped = i64::from(at).min(room).max(0);
    i32::try_from(clamped).unwrap_or(i32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Test that placement keeps popups inside the window.
    ///
    /// # Panics
    /// Panics if a popup edge is clamped wrongly.
    #[test]
    fn clamp_keeps_popup_inside() {
        assert_eq!(clamp_axis(10, 20, 100), 10);
        assert_eq!(clamp_axis(90, 20, 100), 80);
        assert_eq!(clamp_axis(-5, 20, 100), 0);
        assert_eq!(clamp_axis(50, 200, 100), 0);
    }
}
