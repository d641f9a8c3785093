//! Criterion benchmarks comparing a single-node re-render with a full render.
//!
//! The scene is a panel holding a grid of opaque blocks. The node case flips
//! one block's color, which classifies as an in-place node re-render; the full
//! case lays out, paints and uploads every layer.

#![allow(clippy::expect_used, reason = "benchmark setup")]

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use raster::{Point, Size, rgba};
use scene::{Block, Frame, LayoutBox, NodeId, Style};
use std::hint::black_box;
use viewport::{MemoryDisplay, ViewportConfig, Window};

const CELL: u32 = 8;

/// Build a window with a `side` x `side` grid of blocks; returns the window
/// and one block in the middle.
fn build_grid(side: u32) -> (Window<MemoryDisplay>, NodeId) {
    let config = ViewportConfig::default();
    let size = Size::new(side * CELL, side * CELL);
    let display = MemoryDisplay::new(size, config.max_pixels).expect("display");
    let mut window = Window::new(display, config).expect("window");
    let main = window.main();
    let panel = window.add_widget("panel", Frame);
    let scene = window.scene_mut();
    scene.append_child(main, panel).expect("attach panel");
    scene
        .set_layout(panel, LayoutBox::new(Point::ZERO, size))
        .expect("panel layout");
    scene
        .set_style(panel, Style::with_background(rgba(30, 30, 30, 255)))
        .expect("panel style");

    let mut middle = panel;
    for row in 0..side {
        for column in 0..side {
            let shade = u8::try_from((row * side + column) % 256).unwrap_or(0);
            let block = window.add_widget("cell", Block::new(rgba(shade, 90, 160, 255)));
            let pos = Point::new(
                i32::try_from(column * CELL).unwrap_or(0),
                i32::try_from(row * CELL).unwrap_or(0),
            );
            let scene = window.scene_mut();
            scene.append_child(panel, block).expect("attach cell");
            scene
                .set_layout(block, LayoutBox::new(pos, Size::new(CELL - 1, CELL - 1)))
                .expect("cell layout");
            if row == side / 2 && column == side / 2 {
                middle = block;
            }
        }
    }
    let token = window.update_start(main);
    window.update_end_no_signal(token);
    window.render_all();
    (window, middle)
}

fn bench_rerender(crit: &mut Criterion) {
    let mut group = crit.benchmark_group("viewport_rerender");
    for &side in &[16u32, 64u32] {
        let (mut window, middle) = build_grid(side);
        let mut flip = false;

        group.bench_with_input(BenchmarkId::new("node_rerender", side), &side, |bencher, &_side| {
            bencher.iter(|| {
                flip = !flip;
                let red = if flip { 255 } else { 0 };
                let action = window
                    .update_widget::<Block, _>(middle, |block| block.color = rgba(red, 0, 0, 255));
                black_box(action.is_ok());
            });
        });

        group.bench_with_input(BenchmarkId::new("full_render", side), &side, |bencher, &_side| {
            bencher.iter(|| {
                window.render_all();
                black_box(window.display().publishes());
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_rerender);
criterion_main!(benches);
