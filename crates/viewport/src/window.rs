//! The window context: scene, viewport surfaces, display and root layers.
//!
//! Every tree mutation goes through [`Window`] inside an update bracket, and
//! closing the outermost bracket classifies and executes the resulting
//! signal before the call returns.

use crate::classify::{IgnoreReason, RenderAction, classify};
use crate::config::ViewportConfig;
use crate::display::DisplaySurface;
use crate::viewport::{Viewport, ViewportFlags, WindowId};
use anyhow::{Result as AnyResult, anyhow};
use core::iter;
use log::log;
use raster::{PixelSurface, Point, Size};
use scene::{LayoutBox, NodeId, SceneTree, Signal, Style, UpdateToken, Widget};
use smallvec::SmallVec;
use std::collections::HashMap;
use std::io::Write;
use std::path::Path;
use tracing::info_span;

/// A window: one scene, the surfaces of its viewports and a display.
#[derive(Debug)]
pub struct Window<D> {
    /// Process-unique identity.
    pub(crate) id: WindowId,
    /// Runtime configuration.
    pub(crate) config: ViewportConfig,
    /// Scene graph.
    pub(crate) scene: SceneTree,
    /// Surfaces of every viewport node.
    pub(crate) viewports: HashMap<NodeId, Viewport>,
    /// Presentable window image.
    pub(crate) display: D,
    /// Main viewport, the bottom layer.
    pub(crate) main: NodeId,
    /// Open popups in z-order, topmost last.
    pub(crate) popups: SmallVec<NodeId, 4>,
    /// Window-sized transparent overlay layer, always on top.
    pub(crate) overlay: NodeId,
}

impl<D: DisplaySurface> Window<D> {
    /// Create a window over `display` with an empty main viewport and
    /// overlay layer sized to the display.
    ///
    /// # Errors
    /// Returns an error if the root surfaces cannot be allocated.
    pub fn new(display: D, config: ViewportConfig) -> AnyResult<Self> {
        let size = display.size();
        let mut scene = SceneTree::new();
        let main = scene.add_viewport_node("main");
        let overlay = scene.add_viewport_node("overlay");
        let mut viewports = HashMap::new();
        viewports.insert(
            main,
            Viewport::new(Point::ZERO, size, ViewportFlags::FILL, &config)?,
        );
        viewports.insert(
            overlay,
            Viewport::new(Point::ZERO, size, ViewportFlags::OVERLAY, &config)?,
        );
        Ok(Self {
            id: WindowId::next(),
            config,
            scene,
            viewports,
            display,
            main,
            popups: SmallVec::new(),
            overlay,
        })
    }

    /// Window identity.
    #[inline]
    #[must_use]
    pub const fn id(&self) -> WindowId {
        self.id
    }

    /// Runtime configuration.
    #[inline]
    #[must_use]
    pub const fn config(&self) -> &ViewportConfig {
        &self.config
    }

    /// The scene graph.
    #[inline]
    #[must_use]
    pub const fn scene(&self) -> &SceneTree {
        &self.scene
    }

    /// Mutable scene access for building a tree before the first render.
    /// Changes made here do not signal.
    #[inline]
    pub const fn scene_mut(&mut self) -> &mut SceneTree {
        &mut self.scene
    }

    /// Main viewport node.
    #[inline]
    #[must_use]
    pub const fn main(&self) -> NodeId {
        self.main
    }

    /// Overlay layer node; overlays are attached under it.
    #[inline]
    #[must_use]
    pub const fn overlay_layer(&self) -> NodeId {
        self.overlay
    }

    /// Open popups, topmost last.
    #[inline]
    #[must_use]
    pub fn popups(&self) -> &[NodeId] {
        &self.popups
    }

    /// Surface and frame of a viewport node.
    #[inline]
    #[must_use]
    pub fn viewport(&self, id: NodeId) -> Option<&Viewport> {
        self.viewports.get(&id)
    }

    /// The display.
    #[inline]
    #[must_use]
    pub const fn display(&self) -> &D {
        &self.display
    }

    /// Mutable display access.
    #[inline]
    pub const fn display_mut(&mut self) -> &mut D {
        &mut self.display
    }

    /// Create a detached widget node.
    pub fn add_widget(&mut self, name: &str, widget: impl Widget) -> NodeId {
        self.scene.add_widget(name, widget)
    }

    /// Create a detached nested viewport of `size`. Attach it with
    /// [`Window::append_child`]; an allocated layout size overrides `size`.
    ///
    /// # Errors
    /// Returns an error if the surface cannot be allocated.
    pub fn new_viewport(&mut self, name: &str, size: Size, flags: ViewportFlags) -> AnyResult<NodeId> {
        let vp = Viewport::new(Point::ZERO, size, flags, &self.config)?;
        let id = self.scene.add_viewport_node(name);
        self.viewports.insert(id, vp);
        Ok(id)
    }

    /// Open an update bracket on `id`.
    pub fn update_start(&mut self, id: NodeId) -> UpdateToken {
        self.scene.update_start(id)
    }

    /// Close an update bracket and render the resulting signal.
    pub fn update_end(&mut self, token: UpdateToken) -> RenderAction {
        let outermost = token.is_outermost();
        match self.scene.update_end(token) {
            Some(signal) => self.signal(signal),
            None if outermost => RenderAction::Ignore(IgnoreReason::SenderGone),
            None => RenderAction::Ignore(IgnoreReason::NestedBracket),
        }
    }

    /// Close an update bracket without rendering.
    pub fn update_end_no_signal(&mut self, token: UpdateToken) {
        self.scene.update_end_no_signal(token);
    }

    /// Run `apply` inside an update bracket on `id`. A failed edit closes
    /// the bracket silently.
    fn edit<F>(&mut self, id: NodeId, apply: F) -> AnyResult<RenderAction>
    where
        F: FnOnce(&mut SceneTree) -> AnyResult<()>,
    {
        let token = self.scene.update_start(id);
        if let Err(err) = apply(&mut self.scene) {
            self.scene.update_end_no_signal(token);
            return Err(err);
        }
        Ok(self.update_end(token))
    }

    /// Attach `child` under `parent` and render the structure change. A
    /// child moved from another parent also closes a bracket on the old
    /// parent, which re-renders its viewport and clears its change flags.
    ///
    /// # Errors
    /// Returns an error if the append is invalid.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> AnyResult<RenderAction> {
        let previous = self.scene.parent(child);
        let action = self.edit(parent, |scene| scene.append_child(parent, child))?;
        if let Some(old) = previous.filter(|old| *old != parent) {
            let token = self.scene.update_start(old);
            self.update_end(token);
        }
        Ok(action)
    }

    /// Detach `child` from `parent`, destroying it when `destroy` is set, and
    /// render the structure change.
    ///
    /// # Errors
    /// Returns an error if `child` is not a child of `parent`.
    pub fn delete_child(&mut self, parent: NodeId, child: NodeId, destroy: bool) -> AnyResult<RenderAction> {
        let mut destroyed = Vec::new();
        let action = self.edit(parent, |scene| {
            destroyed = scene.delete_child(parent, child, destroy)?;
            Ok(())
        })?;
        self.forget(&destroyed);
        Ok(action)
    }

    /// Replace the allocated layout box of `id` and render the change.
    ///
    /// # Errors
    /// Returns an error if the node is destroyed.
    pub fn set_layout(&mut self, id: NodeId, layout: LayoutBox) -> AnyResult<RenderAction> {
        self.edit(id, |scene| scene.set_layout(id, layout))
    }

    /// Replace the declared style of `id` and render the change.
    ///
    /// # Errors
    /// Returns an error if the node is destroyed.
    pub fn set_style(&mut self, id: NodeId, style: Style) -> AnyResult<RenderAction> {
        self.edit(id, |scene| scene.set_style(id, style))
    }

    /// Mutate the widget of `id` as a `W` and render the value change.
    ///
    /// # Errors
    /// Returns an error if `id` has no live widget of type `W`.
    pub fn update_widget<W, F>(&mut self, id: NodeId, update: F) -> AnyResult<RenderAction>
    where
        W: Widget,
        F: FnOnce(&mut W),
    {
        self.edit(id, |scene| {
            let widget = scene
                .widget_mut::<W>(id)
                .ok_or_else(|| anyhow!("{id:?} has no widget of the requested type"))?;
            update(widget);
            Ok(())
        })
    }

    /// Classify a signal for the viewport enclosing its sender, render the
    /// result and publish.
    pub fn signal(&mut self, signal: Signal) -> RenderAction {
        let level = self.config.update_level();
        if !self.scene.is_live(signal.sender) {
            log!(target: "viewport::update", level, "{signal:?}: sender gone");
            return RenderAction::Ignore(IgnoreReason::SenderGone);
        }
        let Some(target) = self
            .scene
            .enclosing_viewport(signal.sender)
            .filter(|vp| self.is_on_screen(*vp))
        else {
            log!(target: "viewport::update", level, "{signal:?}: not under a rendered viewport");
            return RenderAction::Ignore(IgnoreReason::Detached);
        };
        let action = classify(&self.scene, target, &signal);
        log!(target: "viewport::update", level, "{signal:?} in {target:?}: {action:?}");
        self.execute(target, action);
        action
    }

    /// True when `id` hangs under the main viewport, an open popup or the
    /// overlay layer.
    fn is_on_screen(&self, id: NodeId) -> bool {
        let mut root = id;
        while let Some(parent) = self.scene.parent(root) {
            root = parent;
        }
        root == self.main || root == self.overlay || self.popups.contains(&root)
    }

    /// Drop the surfaces and popup entries of destroyed nodes.
    pub(crate) fn forget(&mut self, destroyed: &[NodeId]) {
        for id in destroyed {
            if *id == self.main || *id == self.overlay {
                continue;
            }
            self.viewports.remove(id);
            self.popups.retain(|popup| popup != id);
        }
    }

    /// Lay out, paint and upload every root layer, then publish.
    pub fn render_all(&mut self) {
        let _span = info_span!("viewport.render_all").entered();
        let roots: Vec<NodeId> = iter::once(self.main)
            .chain(self.popups.iter().copied())
            .collect();
        for root in roots {
            self.scene.restyle_subtree(root);
            if self.layout_viewport(root) {
                self.painter().paint_viewport(root, None);
            }
        }
        self.overlay_pass();
        self.upload_all();
        self.display.publish();
    }

    /// Resize the display and main viewport, then re-render everything.
    ///
    /// # Errors
    /// Returns an error if the display cannot be resized.
    pub fn resize(&mut self, size: Size) -> AnyResult<()> {
        self.display.resize(size)?;
        if let Some(main) = self.viewports.get_mut(&self.main) {
            main.frame.set_view_size(size);
        }
        self.render_all();
        Ok(())
    }

    /// Write the last render of viewport `id` to a PNG file.
    ///
    /// # Errors
    /// Returns an error if `id` is not a viewport or writing fails.
    pub fn save_png(&self, id: NodeId, path: &Path) -> AnyResult<()> {
        self.surface_of(id)?.save_png(path)
    }

    /// Encode the last render of viewport `id` as PNG into `out`.
    ///
    /// # Errors
    /// Returns an error if `id` is not a viewport or encoding fails.
    pub fn encode_png<W: Write>(&self, id: NodeId, out: W) -> AnyResult<()> {
        self.surface_of(id)?.encode_png(out)
    }

    /// Surface of viewport `id` or an error.
    fn surface_of(&self, id: NodeId) -> AnyResult<&PixelSurface> {
        self.viewports
            .get(&id)
            .map(Viewport::surface)
            .ok_or_else(|| anyhow!("{id:?} is not a viewport"))
    }
}
