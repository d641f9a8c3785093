//! Shared scene fixture for the viewport integration tests.
#![allow(dead_code, reason = "not every test binary uses every helper")]
#![allow(
    clippy::expect_used,
    clippy::let_underscore_must_use,
    reason = "test fixture setup"
)]

use core::any::Any;
use raster::{Color, Point, Rect, Size, rgba};
use scene::{Block, Frame, LayoutBox, NodeId, PaintContext, RerenderScope, Style, Widget};
use viewport::{MemoryDisplay, ViewportConfig, ViewportFlags, Window};

pub const WINDOW: Size = Size::new(100, 60);
pub const PANEL: Color = rgba(200, 200, 200, 255);
pub const TRACK: Color = rgba(40, 40, 40, 255);
pub const THUMB: Color = rgba(250, 200, 0, 255);
pub const LABEL: Color = rgba(255, 0, 0, 255);
pub const INNER: Color = rgba(0, 0, 255, 255);
pub const DOT: Color = rgba(0, 255, 0, 255);

/// Horizontal value slider that always repaints its whole box.
#[derive(Debug, Clone, Copy)]
pub struct Slider {
    /// Position in percent.
    pub value: u32,
}

impl Widget for Slider {
    fn paint(&self, ctx: &mut PaintContext<'_>) {
        ctx.cover(TRACK);
        let bounds = ctx.bounds;
        let filled = bounds.width * self.value.min(100) / 100;
        ctx.fill(Rect::new(bounds.x, bounds.y, filled, bounds.height), THUMB);
    }

    fn rerender_scope(&self, _style: &Style) -> Option<RerenderScope> {
        Some(RerenderScope { relayout: false })
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// A rendered window holding:
///
/// ```text
/// main
/// └ panel   Frame, opaque grey, 0,0 100x60
///   ├ slider  10,10 50x10
///   ├ label   Block red, 10,30 20x10
///   └ inner   nested viewport, blue fill, 60,20 30x30
///     └ dot   Block green, 5,5 10x10
/// ```
pub struct Fixture {
    pub window: Window<MemoryDisplay>,
    pub panel: NodeId,
    pub slider: NodeId,
    pub label: NodeId,
    pub inner: NodeId,
    pub dot: NodeId,
}

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn layout(x: i32, y: i32, width: u32, height: u32) -> LayoutBox {
    LayoutBox::new(Point::new(x, y), Size::new(width, height))
}

pub fn window() -> Window<MemoryDisplay> {
    let config = ViewportConfig::default();
    let display = MemoryDisplay::new(WINDOW, config.max_pixels).expect("display");
    Window::new(display, config).expect("window")
}

pub fn fixture() -> Fixture {
    init_logger();
    let mut window = window();
    let main = window.main();
    let panel = window.add_widget("panel", Frame);
    let slider = window.add_widget("slider", Slider { value: 20 });
    let label = window.add_widget("label", Block::new(LABEL));
    let inner = window
        .new_viewport("inner", Size::new(30, 30), ViewportFlags::FILL)
        .expect("inner viewport");
    let dot = window.add_widget("dot", Block::new(DOT));

    let scene = window.scene_mut();
    scene.append_child(main, panel).expect("attach panel");
    scene.append_child(panel, slider).expect("attach slider");
    scene.append_child(panel, label).expect("attach label");
    scene.append_child(panel, inner).expect("attach inner");
    scene.append_child(inner, dot).expect("attach dot");
    scene.set_layout(panel, layout(0, 0, 100, 60)).expect("panel layout");
    scene.set_layout(slider, layout(10, 10, 50, 10)).expect("slider layout");
    scene.set_layout(label, layout(10, 30, 20, 10)).expect("label layout");
    scene.set_layout(inner, layout(60, 20, 30, 30)).expect("inner layout");
    scene.set_layout(dot, layout(5, 5, 10, 10)).expect("dot layout");
    scene.set_style(panel, Style::with_background(PANEL)).expect("panel style");
    scene.set_style(inner, Style::with_background(INNER)).expect("inner style");

    settle(&mut window);
    window.render_all();
    Fixture {
        window,
        panel,
        slider,
        label,
        inner,
        dot,
    }
}

/// Clear change flags accumulated while building without signals.
pub fn settle(window: &mut Window<MemoryDisplay>) {
    let main = window.main();
    let token = window.update_start(main);
    window.update_end_no_signal(token);
}

/// Displayed color at `x`,`y`.
pub fn shown(window: &Window<MemoryDisplay>, x: i32, y: i32) -> Color {
    window
        .display()
        .image()
        .pixel(Point::new(x, y))
        .expect("pixel inside the display")
}

/// Check that the displayed image equals a from-scratch render of the same
/// scene.
pub fn assert_matches_full_render(window: &mut Window<MemoryDisplay>) {
    let incremental = window.display().image().pixels().clone();
    window.render_all();
    assert!(
        incremental == *window.display().image().pixels(),
        "incremental output differs from a full render"
    );
}
