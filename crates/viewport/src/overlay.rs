//! The overlay pass: re-renders the window-sized transparent overlay layer
//! that is blended over the main viewport and every popup.

use crate::display::DisplaySurface;
use crate::window::Window;
use log::{error, log};
use scene::NodeFlags;
use tracing::info_span;

impl<D: DisplaySurface> Window<D> {
    /// Size the overlay layer to the display, place its children and
    /// repaint it. Nothing is uploaded.
    pub(crate) fn overlay_pass(&mut self) {
        let _span = info_span!("viewport.overlay_pass").entered();
        let overlay = self.overlay;
        let size = self.display.size();
        if let Some(vp) = self.viewports.get_mut(&overlay) {
            if let Err(err) = vp.resize(size, &self.config) {
                error!(target: "viewport::render", "overlay layer keeps its buffer: {err:#}");
            }
            vp.window = Some(self.id);
            vp.frame.begin_layout();
            vp.frame.complete_layout(None);
        }
        let kids = self.scene.children(overlay);
        log!(
            target: "viewport::render",
            self.config.render_level(),
            "overlay pass over {} node(s)",
            kids.len()
        );
        for kid in kids {
            if !self.scene.is_live(kid) {
                continue;
            }
            self.scene.set_subtree_flags(kid, NodeFlags::OVERLAY, true);
            if self.scene.node(kid).is_some_and(|node| node.restyles == 0) {
                self.scene.restyle_subtree(kid);
            }
            self.place_node(overlay, kid);
        }
        self.painter().paint_viewport(overlay, None);
    }

    /// Re-render the overlay layer and blend it over everything on screen.
    pub fn render_overlays(&mut self) {
        self.overlay_pass();
        self.upload_all();
        self.display.publish();
    }
}
