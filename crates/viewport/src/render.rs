//! Layout-box derivation and paint traversal.
//!
//! Layout here means deriving `vp_box`/`win_box` from the allocated layout
//! boxes and sizing viewport surfaces; the allocation itself comes from an
//! outer layout engine. Painting walks the scene in child order, pushing each
//! node's visible box as a clip scope and rendering nested viewports into
//! their own surfaces before drawing them into the host.

use crate::classify::RenderAction;
use crate::compositor::draw_into_parent;
use crate::config::ViewportConfig;
use crate::display::DisplaySurface;
use crate::viewport::{Viewport, ViewportFlags};
use crate::window::Window;
use log::{error, log};
use raster::{Blend, PixelSurface, Point, Rect, TRANSPARENT};
use scene::{NodeBoxes, NodeId, PaintContext, SceneTree};
use std::collections::HashMap;
use tracing::info_span;

/// Viewport whose surface `id` is drawn into, `None` for roots.
pub(crate) fn host_viewport(scene: &SceneTree, id: NodeId) -> Option<NodeId> {
    scene
        .parent(id)
        .and_then(|parent| scene.enclosing_viewport(parent))
}

/// Paint traversal over the scene with exclusive access to viewport surfaces.
///
/// A viewport being painted is moved out of the map for the duration, so a
/// nested viewport can be rendered and drawn into it without aliasing.
#[derive(Debug)]
pub(crate) struct Painter<'win> {
    /// Scene being painted.
    pub(crate) scene: &'win SceneTree,
    /// Viewport surfaces by node.
    pub(crate) viewports: &'win mut HashMap<NodeId, Viewport>,
    /// Runtime configuration.
    pub(crate) config: &'win ViewportConfig,
    /// Display rectangle in window coordinates.
    pub(crate) screen: Rect,
}

impl Painter<'_> {
    /// Window rectangle the viewport must intersect to be drawn, `None` for
    /// popups which are placed independently.
    fn gate_for(&self, id: NodeId, vp: &Viewport) -> Option<Rect> {
        if vp.is_popup() {
            return None;
        }
        Some(
            host_viewport(self.scene, id).map_or(self.screen, |host| {
                self.viewports
                    .get(&host)
                    .and_then(|host_vp| host_vp.frame.win_box())
                    .unwrap_or(Rect::EMPTY)
            }),
        )
    }

    /// Repaint a whole viewport, restricted to `region` (viewport
    /// coordinates) when given. Returns false when the viewport is not drawn.
    pub(crate) fn paint_viewport(&mut self, id: NodeId, region: Option<Rect>) -> bool {
        let Some(mut vp) = self.viewports.remove(&id) else {
            return false;
        };
        let gate = self.gate_for(id, &vp);
        let painted = self.paint_into(id, &mut vp, region, gate);
        self.viewports.insert(id, vp);
        painted
    }

    /// Repaint `root` and everything painted after it inside viewport `id`,
    /// all restricted to `region` (viewport coordinates). Nodes painted
    /// before `root` are left alone.
    ///
    /// With `rendered` set, `root` is a nested viewport whose surface is
    /// already current and is only drawn in. Returns false when the viewport
    /// is not drawn.
    pub(crate) fn repaint_from(
        &mut self,
        id: NodeId,
        root: NodeId,
        region: Rect,
        rendered: bool,
    ) -> bool {
        let Some(mut vp) = self.viewports.remove(&id) else {
            return false;
        };
        let gate = self.gate_for(id, &vp);
        let host_win = vp.frame.win_box();
        let painted = match vp.push_bounds(gate) {
            Some(mut bounds) => {
                let mut scope = bounds.push_bounds(region);
                let dirty = scope.clip_rect();
                if rendered {
                    self.draw_rendered(&mut scope, root, dirty);
                } else {
                    self.paint_node(&mut scope, root, host_win, dirty);
                }
                self.paint_following(&mut scope, id, root, host_win, dirty);
                true
            }
            None => false,
        };
        self.viewports.insert(id, vp);
        painted
    }

    /// Draw the current surface of nested viewport `id` into `host`.
    fn draw_rendered(&self, host: &mut PixelSurface, id: NodeId, dirty: Rect) {
        if let Some(child) = self.viewports.get(&id) {
            draw_into_parent(self.scene, id, child, host, dirty);
        }
    }

    /// Paint the later siblings of `from` and of each of its ancestors up to
    /// viewport `id`, in paint order.
    fn paint_following(
        &mut self,
        surface: &mut PixelSurface,
        id: NodeId,
        from: NodeId,
        host_win: Option<Rect>,
        dirty: Rect,
    ) {
        let scene = self.scene;
        let mut current = from;
        while current != id {
            let Some(parent) = scene.parent(current) else {
                return;
            };
            let later = scene
                .children(parent)
                .into_iter()
                .skip_while(|sibling| *sibling != current)
                .skip(1);
            for sibling in later {
                self.paint_node(surface, sibling, host_win, dirty);
            }
            current = parent;
        }
    }

    /// Fill and paint every child of a viewport that has been moved out of
    /// the map.
    fn paint_into(
        &mut self,
        id: NodeId,
        vp: &mut Viewport,
        region: Option<Rect>,
        gate: Option<Rect>,
    ) -> bool {
        let scene = self.scene;
        let style = scene.node(id).map(|node| node.computed).unwrap_or_default();
        let fill = vp.fill_color(&style, self.config).unwrap_or(TRANSPARENT);
        let host_win = vp.frame.win_box();
        let full = vp.frame.vp_box();
        let Some(mut bounds) = vp.push_bounds(gate) else {
            log!(
                target: "viewport::render",
                self.config.render_level(),
                "skip {id:?}: empty or offscreen"
            );
            return false;
        };
        let mut scope = bounds.push_bounds(region.unwrap_or(full));
        let clip = scope.clip_rect();
        log!(
            target: "viewport::render",
            self.config.render_level(),
            "paint {id:?} within {clip:?}"
        );
        scope.fill_rect(clip, fill, Blend::Copy);
        for child in scene.children(id) {
            self.paint_node(&mut scope, child, host_win, clip);
        }
        true
    }

    /// Paint one node and its subtree onto `surface`, where `dirty` is the
    /// part of the surface being repainted.
    fn paint_node(
        &mut self,
        surface: &mut PixelSurface,
        id: NodeId,
        host_win: Option<Rect>,
        dirty: Rect,
    ) {
        let scene = self.scene;
        let Some(node) = scene.node(id) else {
            return;
        };
        if !node.is_live() {
            return;
        }
        if node.is_viewport() {
            self.render_nested(surface, id, host_win, dirty);
            return;
        }
        if node.boxes.vp_box.is_empty() {
            return;
        }
        let mut scope = surface.push_bounds(node.boxes.vp_box);
        if let Some(widget) = node.widget() {
            widget.paint(&mut PaintContext {
                surface: &mut scope,
                bounds: node.layout.rect(),
                style: &node.computed,
            });
        }
        for child in scene.children(id) {
            self.paint_node(&mut scope, child, host_win, dirty);
        }
    }

    /// Render a nested viewport into its own surface, then draw it into the
    /// host surface currently being painted.
    fn render_nested(
        &mut self,
        host: &mut PixelSurface,
        id: NodeId,
        host_win: Option<Rect>,
        dirty: Rect,
    ) {
        let Some(mut vp) = self.viewports.remove(&id) else {
            return;
        };
        let gate = (!vp.is_popup()).then_some(host_win.unwrap_or(Rect::EMPTY));
        if self.paint_into(id, &mut vp, None, gate) {
            draw_into_parent(self.scene, id, &vp, host, dirty);
        }
        self.viewports.insert(id, vp);
    }
}

impl<D: DisplaySurface> Window<D> {
    /// Painter over this window's scene and surfaces.
    pub(crate) fn painter(&mut self) -> Painter<'_> {
        Painter {
            scene: &self.scene,
            viewports: &mut self.viewports,
            config: &self.config,
            screen: Rect::from_size(self.display.size()),
        }
    }

    /// Size a viewport's surface and complete its coordinate frame, then
    /// derive the boxes of everything it contains.
    ///
    /// A nested SVG viewport with no allocated size keeps its current
    /// buffer. Returns false when the surface cannot be allocated; the
    /// previous buffer is kept and the frame is still completed, so the
    /// caller only skips painting.
    pub(crate) fn layout_viewport(&mut self, id: NodeId) -> bool {
        let parent_origin = host_viewport(&self.scene, id)
            .and_then(|host| self.viewports.get(&host))
            .map(|host| host.frame.win_origin());
        let Some(node) = self.scene.node(id) else {
            return false;
        };
        let layout = node.layout;
        let position = node.computed.position;
        let Some(vp) = self.viewports.get_mut(&id) else {
            return false;
        };
        vp.window = Some(self.id);
        vp.frame.begin_layout();

        let nested = parent_origin.is_some();
        let alloc = if nested && !layout.size.is_empty() {
            layout.size
        } else if nested && vp.flags.contains(ViewportFlags::SVG) {
            vp.surface.size()
        } else {
            vp.frame.view_box().size()
        };
        let allocated = vp
            .resize(alloc, &self.config)
            .inspect_err(|err| {
                error!(
                    target: "viewport::render",
                    "keeping previous buffer of {id:?}: {err:#}"
                );
            })
            .is_ok();
        let origin = position.unwrap_or(if nested {
            layout.pos
        } else {
            vp.frame.view_box().origin()
        });
        vp.frame.set_view_origin(origin);
        vp.frame.complete_layout(parent_origin);
        let clip = vp.frame.vp_box();
        let win_origin = vp.frame.win_origin();
        log!(
            target: "viewport::render",
            self.config.render_level(),
            "layout {id:?}: win_box {:?}",
            vp.frame.win_box()
        );
        self.layout_boxes(id, clip, win_origin);
        allocated
    }

    /// Derive boxes for the children of `parent`, all inside one viewport.
    fn layout_boxes(&mut self, parent: NodeId, clip: Rect, win_origin: Point) {
        for child in self.scene.children(parent) {
            if self.scene.is_live(child) {
                self.place_child(child, clip, win_origin);
            }
        }
    }

    /// Derive the boxes of one node; nested viewports get their own layout
    /// pass first so their view box is current.
    fn place_child(&mut self, id: NodeId, clip: Rect, win_origin: Point) -> bool {
        let is_viewport = self.scene.is_viewport(id);
        let laid_out = !is_viewport || self.layout_viewport(id);
        let rect = if is_viewport {
            self.viewports
                .get(&id)
                .map_or(Rect::EMPTY, |vp| vp.frame.view_box())
        } else {
            self.scene
                .node(id)
                .map_or(Rect::EMPTY, |node| node.layout.rect())
        };
        let vp_box = rect.intersect(clip);
        if let Some(node) = self.scene.node_mut(id) {
            node.boxes = NodeBoxes {
                vp_box,
                win_box: vp_box.translate(win_origin),
            };
        }
        if !is_viewport {
            self.layout_boxes(id, vp_box, win_origin);
        }
        laid_out
    }

    /// Re-derive the boxes of `id` in place, using its parent's current
    /// boxes as the clip.
    pub(crate) fn place_node(&mut self, host: NodeId, id: NodeId) -> bool {
        let Some(host_vp) = self.viewports.get(&host) else {
            return false;
        };
        let win_origin = host_vp.frame.win_origin();
        let clip = match self.scene.parent(id) {
            Some(parent) if parent != host => self
                .scene
                .node(parent)
                .map_or(Rect::EMPTY, |node| node.boxes.vp_box),
            _ => host_vp.frame.vp_box(),
        };
        self.place_child(id, clip, win_origin)
    }

    /// Restyle, resize, relayout and repaint a viewport, then composite it.
    ///
    /// A nested viewport whose box in the host moved or resized repaints the
    /// host over both boxes instead.
    pub(crate) fn full_render(&mut self, id: NodeId) {
        let _span = info_span!("viewport.full_render").entered();
        self.scene.restyle_subtree(id);
        let Some(host) = host_viewport(&self.scene, id) else {
            if self.layout_viewport(id) && self.painter().paint_viewport(id, None) {
                self.compose(id, None);
            }
            return;
        };
        let before = self.node_box(id);
        if !self.place_node(host, id) {
            return;
        }
        let after = self.node_box(id);
        if before == after {
            if self.painter().paint_viewport(id, None) {
                self.compose(id, None);
            }
        } else {
            let region = before.union(after);
            if self.painter().paint_viewport(host, Some(region)) {
                self.compose(host, Some(region));
            }
        }
    }

    /// Visible box of `id` in its viewport.
    fn node_box(&self, id: NodeId) -> Rect {
        self.scene
            .node(id)
            .map_or(Rect::EMPTY, |node| node.boxes.vp_box)
    }

    /// Repaint one self-rendering node and upload its rectangle.
    pub(crate) fn rerender_node(&mut self, id: NodeId, node: NodeId, relayout: bool) {
        let _span = info_span!("viewport.rerender_node").entered();
        self.scene.restyle_subtree(node);
        if relayout {
            self.place_node(id, node);
        }
        self.repaint_region(id, node);
    }

    /// Restyle the sender and repaint from its anchor.
    pub(crate) fn rerender_anchor(&mut self, id: NodeId, node: NodeId, anchor: NodeId) {
        let _span = info_span!("viewport.rerender_anchor").entered();
        self.scene.restyle_subtree(node);
        self.repaint_region(id, anchor);
    }

    /// Restyle the sender and repaint the whole viewport without layout.
    pub(crate) fn rerender_subtree(&mut self, id: NodeId, node: NodeId) {
        let _span = info_span!("viewport.rerender_subtree").entered();
        self.scene.restyle_subtree(node);
        if self.painter().paint_viewport(id, None) {
            self.compose(id, None);
        }
    }

    /// Repaint the subtree at `root`, plus anything painted over it later,
    /// and composite its visible box.
    fn repaint_region(&mut self, id: NodeId, root: NodeId) {
        let region = self.node_box(root);
        if region.is_empty() {
            return;
        }
        if self.painter().repaint_from(id, root, region, false) {
            self.compose(id, Some(region));
        }
    }

    /// Run a classified action against viewport `id`.
    pub(crate) fn execute(&mut self, id: NodeId, action: RenderAction) {
        match action {
            RenderAction::Ignore(_) => return,
            _ if id == self.overlay => {
                self.overlay_pass();
                self.upload_all();
            }
            RenderAction::FullTree => self.full_render(id),
            RenderAction::Node { node, relayout } => self.rerender_node(id, node, relayout),
            RenderAction::Anchor { node, anchor } => self.rerender_anchor(id, node, anchor),
            RenderAction::Subtree { node } => self.rerender_subtree(id, node),
        }
        self.display.publish();
    }
}
