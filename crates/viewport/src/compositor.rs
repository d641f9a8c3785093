//! Compositing: drawing finished viewport surfaces into their hosts and
//! uploading root layers to the display.
//!
//! Root layers stack bottom to top as main viewport, open popups in z-order,
//! then the overlay layer. A region upload replays every layer that
//! intersects the region, so popups and overlays stay on top of a repaint
//! underneath them.

use crate::display::{DisplaySurface, UploadKind, UploadRequest};
use crate::render::host_viewport;
use crate::viewport::Viewport;
use crate::window::Window;
use log::trace;
use raster::{Blend, PixelSurface, Point, Rect};
use scene::{NodeId, SceneTree};
use smallvec::SmallVec;

/// Draw a rendered nested viewport into its host surface.
///
/// `dirty` is the host region being repainted. Overlays ignore the host clip
/// but stay inside `dirty`, since host pixels outside it still hold their
/// last blend. Other viewports draw the part of their visible box inside the
/// host clip. Returns the host rectangle written.
pub(crate) fn draw_into_parent(
    scene: &SceneTree,
    id: NodeId,
    vp: &Viewport,
    parent: &mut PixelSurface,
    dirty: Rect,
) -> Rect {
    let origin = vp.frame.view_box().origin();
    if vp.is_overlay() {
        let placed = Rect::from_origin_size(origin, vp.surface.size()).intersect(dirty);
        return parent.draw_from(
            &vp.surface,
            placed.translate(Point::ZERO - origin),
            placed.origin(),
            Blend::Over,
        );
    }
    let Some(node) = scene.node(id) else {
        return Rect::EMPTY;
    };
    let visible = node
        .boxes
        .vp_box
        .intersect(parent.clip_rect())
        .intersect(dirty);
    if visible.is_empty() {
        trace!(target: "viewport::render", "{id:?} clipped out of its host");
        return Rect::EMPTY;
    }
    parent.draw_from(
        &vp.surface,
        visible.translate(Point::ZERO - origin),
        visible.origin(),
        Blend::Over,
    )
}

impl<D: DisplaySurface> Window<D> {
    /// Root layers currently on screen, bottom to top.
    pub(crate) fn layers(&self) -> SmallVec<NodeId, 8> {
        let mut layers = SmallVec::new();
        layers.push(self.main);
        layers.extend(self.popups.iter().copied());
        if self
            .scene
            .children(self.overlay)
            .into_iter()
            .any(|kid| self.scene.is_live(kid))
        {
            layers.push(self.overlay);
        }
        layers
    }

    /// Make a rendered region of viewport `id` visible.
    ///
    /// `region` is in the viewport's own coordinates; `None` means the whole
    /// viewport. Nested viewports propagate into their host, roots upload.
    pub(crate) fn compose(&mut self, id: NodeId, region: Option<Rect>) {
        if host_viewport(&self.scene, id).is_some() {
            self.propagate_nested(id, region);
            return;
        }
        if id == self.main && region.is_none() {
            self.upload_all();
            return;
        }
        let Some(vp) = self.viewports.get(&id) else {
            return;
        };
        let Some(win) = vp.frame.win_box() else {
            return;
        };
        let style = self
            .scene
            .node(id)
            .map(|node| node.computed)
            .unwrap_or_default();
        let opaque = vp.is_opaque(&style, &self.config);
        let rect = region.map_or(win, |part| part.translate(win.origin()).intersect(win));
        if rect.is_empty() {
            return;
        }
        let layers = self.layers();
        let Some(index) = layers.iter().position(|layer| *layer == id) else {
            trace!(target: "viewport::render", "{id:?} is not on screen");
            return;
        };
        self.upload_from(if opaque { index } else { 0 }, rect);
    }

    /// Carry a rendered region of a nested viewport into its host, then
    /// compose the touched host region.
    ///
    /// An opaque viewport is drawn straight into the host and whatever the
    /// host paints after it is repainted over the region. Translucent
    /// viewports and overlays repaint the host region from scratch.
    fn propagate_nested(&mut self, id: NodeId, region: Option<Rect>) {
        let Some(host) = host_viewport(&self.scene, id) else {
            return;
        };
        let Some(node) = self.scene.node(id) else {
            return;
        };
        let node_box = node.boxes.vp_box;
        let style = node.computed;
        let Some(vp) = self.viewports.get(&id) else {
            return;
        };
        let overlay = vp.is_overlay();
        let origin = vp.frame.view_box().origin();
        let host_rect = if overlay {
            Rect::from_origin_size(origin, vp.surface.size())
        } else {
            region
                .unwrap_or(vp.frame.vp_box())
                .translate(origin)
                .intersect(node_box)
        };
        if host_rect.is_empty() {
            return;
        }

        let painted = if !overlay && vp.is_opaque(&style, &self.config) {
            self.painter().repaint_from(host, id, host_rect, true)
        } else {
            self.painter().paint_viewport(host, Some(host_rect))
        };
        if painted {
            self.compose(host, Some(host_rect));
        }
    }

    /// Upload the main viewport in full, then every layer above it.
    pub(crate) fn upload_all(&mut self) {
        let Some(main) = self.viewports.get(&self.main) else {
            return;
        };
        let dest = main.frame.win_origin();
        self.display.upload(&UploadRequest {
            source: &main.surface,
            source_rect: main.surface.bounds(),
            dest,
            blend: Blend::Copy,
            kind: UploadKind::Full,
        });
        let screen = Rect::from_size(self.display.size());
        self.upload_from(1, screen);
    }

    /// Upload the window rectangle `rect` from every layer at or above
    /// `start`.
    pub(crate) fn upload_from(&mut self, start: usize, rect: Rect) {
        for layer in self.layers().into_iter().skip(start) {
            let Some(vp) = self.viewports.get(&layer) else {
                continue;
            };
            let Some(win) = vp.frame.win_box() else {
                continue;
            };
            let part = rect.intersect(win);
            if part.is_empty() {
                continue;
            }
            self.display.upload(&UploadRequest {
                source: &vp.surface,
                source_rect: part.translate(Point::ZERO - win.origin()),
                dest: part.origin(),
                blend: if layer == self.main {
                    Blend::Copy
                } else {
                    Blend::Over
                },
                kind: UploadKind::Region,
            });
        }
    }
}
