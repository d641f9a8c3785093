#![allow(
    clippy::expect_used,
    clippy::assertions_on_result_states,
    reason = "test assertions"
)]

mod common;

use common::{
    INNER, LABEL, PANEL, assert_matches_full_render, fixture, init_logger, layout, shown, window,
};
use raster::{Blend, Color, Point, Rect, Size, rgba};
use scene::{Block, Frame, NodeFlags, NodeId, Style};
use viewport::{
    IgnoreReason, MemoryDisplay, RenderAction, UploadKind, UploadRecord, ViewportFlags, Window,
};

const BADGE: Color = rgba(255, 0, 255, 255);
const ITEM_A: Color = rgba(10, 120, 10, 255);
const ITEM_B: Color = rgba(120, 10, 10, 255);

struct Menu {
    popup: NodeId,
    list: NodeId,
    items: [NodeId; 2],
}

fn menu(window: &mut Window<MemoryDisplay>, flags: ViewportFlags, anchor: NodeId) -> Menu {
    let popup = window
        .new_popup("menu", Size::new(30, 20), ViewportFlags::MENU | flags, Some(anchor))
        .expect("popup");
    let list = window.add_widget("list", Frame);
    let first = window.add_widget("first", Block::new(ITEM_A));
    let second = window.add_widget("second", Block::new(ITEM_B));
    let scene = window.scene_mut();
    scene.append_child(list, first).expect("attach first");
    scene.append_child(list, second).expect("attach second");
    scene.set_layout(list, layout(0, 0, 30, 20)).expect("list layout");
    scene.set_layout(first, layout(0, 0, 30, 10)).expect("first layout");
    scene.set_layout(second, layout(0, 10, 30, 10)).expect("second layout");
    let action = window.append_child(popup, list).expect("attach list");
    assert_eq!(action, RenderAction::Ignore(IgnoreReason::Detached));
    Menu {
        popup,
        list,
        items: [first, second],
    }
}

#[test]
fn overlay_viewport_draws_past_its_parent_clip() {
    let mut fix = fixture();
    let badge = fix
        .window
        .new_viewport("badge", Size::new(10, 10), ViewportFlags::OVERLAY | ViewportFlags::FILL)
        .expect("badge");
    let scene = fix.window.scene_mut();
    scene.set_layout(badge, layout(25, 35, 10, 10)).expect("badge layout");
    scene.set_style(badge, Style::with_background(BADGE)).expect("badge style");
    let action = fix.window.append_child(fix.label, badge).expect("attach badge");
    assert_eq!(action, RenderAction::FullTree);

    assert_eq!(shown(&fix.window, 26, 36), BADGE);
    assert_eq!(shown(&fix.window, 33, 43), BADGE);
    assert_eq!(shown(&fix.window, 36, 43), PANEL);
    assert_matches_full_render(&mut fix.window);
}

#[test]
fn overlay_hanging_outside_an_anchor_blends_once() {
    let mut fix = fixture();
    let tray = fix.window.add_widget("tray", Frame);
    let leaf = fix.window.add_widget("leaf", Block::new(rgba(255, 0, 0, 128)));
    let shade = fix
        .window
        .new_viewport("shade", Size::new(20, 10), ViewportFlags::OVERLAY | ViewportFlags::FILL)
        .expect("shade");
    let scene = fix.window.scene_mut();
    scene.append_child(tray, leaf).expect("attach leaf");
    scene.append_child(tray, shade).expect("attach shade");
    scene.set_layout(tray, layout(10, 42, 30, 15)).expect("tray layout");
    scene.set_layout(leaf, layout(12, 44, 5, 5)).expect("leaf layout");
    scene.set_layout(shade, layout(30, 45, 20, 10)).expect("shade layout");
    scene
        .set_style(tray, Style::with_background(rgba(90, 90, 90, 255)))
        .expect("tray style");
    scene
        .set_style(shade, Style::with_background(rgba(0, 0, 0, 128)))
        .expect("shade style");
    fix.window.append_child(fix.panel, tray).expect("attach tray");
    let outside = shown(&fix.window, 45, 50);
    assert_ne!(outside, PANEL);

    let action = fix
        .window
        .update_widget::<Block, _>(leaf, |block| block.color = rgba(0, 0, 255, 128))
        .expect("leaf update");
    assert_eq!(action, RenderAction::Anchor { node: leaf, anchor: tray });
    assert_eq!(shown(&fix.window, 45, 50), outside);
    fix.window.render_overlays();
    assert_eq!(shown(&fix.window, 45, 50), outside);
    assert_matches_full_render(&mut fix.window);
}

#[test]
fn overlay_layer_blends_over_main_and_ignores_the_screen_edge() {
    let mut fix = fixture();
    let layer = fix.window.overlay_layer();
    let tip = fix
        .window
        .new_viewport("tip", Size::new(20, 10), ViewportFlags::OVERLAY | ViewportFlags::FILL)
        .expect("tip");
    let scene = fix.window.scene_mut();
    scene.set_layout(tip, layout(90, 55, 20, 10)).expect("tip layout");
    scene.set_style(tip, Style::with_background(BADGE)).expect("tip style");
    fix.window.append_child(layer, tip).expect("attach tip");

    assert_eq!(shown(&fix.window, 95, 58), BADGE);
    assert_eq!(shown(&fix.window, 85, 58), PANEL);
    assert!(
        fix.window
            .scene()
            .node(tip)
            .is_some_and(|node| node.flags.contains(NodeFlags::OVERLAY))
    );
    let last = fix.window.display().uploads().last().copied();
    assert_eq!(last.map(|upload| upload.blend), Some(Blend::Over));

    fix.window.delete_child(layer, tip, true).expect("remove tip");
    assert_eq!(shown(&fix.window, 95, 58), PANEL);
    assert_matches_full_render(&mut fix.window);
}

#[test]
fn popup_opens_clamped_and_stays_above_main_repaints() {
    let mut fix = fixture();
    let menu = menu(&mut fix.window, ViewportFlags::NONE, fix.slider);
    fix.window
        .open_popup(menu.popup, Point::new(90, 50))
        .expect("open");
    let vp = fix.window.viewport(menu.popup).expect("popup viewport");
    assert_eq!(vp.frame().win_box(), Some(Rect::new(70, 40, 30, 20)));
    assert_eq!(vp.placement_parent(), Some(fix.slider));
    assert_eq!(fix.window.top_menu(), Some(menu.popup));
    assert_eq!(
        fix.window.display().uploads(),
        &[UploadRecord {
            dest: Rect::new(70, 40, 30, 20),
            kind: UploadKind::Region,
            blend: Blend::Over,
        }]
    );
    assert_eq!(shown(&fix.window, 75, 45), ITEM_A);
    assert_eq!(shown(&fix.window, 75, 55), ITEM_B);

    fix.window
        .set_style(fix.inner, Style::with_background(rgba(0, 0, 90, 255)))
        .expect("restyle inner");
    assert_eq!(fix.window.display().uploads().len(), 2);
    assert_eq!(shown(&fix.window, 75, 45), ITEM_A);
    assert_eq!(shown(&fix.window, 61, 21), rgba(0, 0, 90, 255));

    let action = fix
        .window
        .update_widget::<Block, _>(menu.items[1], |block| block.color = LABEL)
        .expect("item update");
    assert_eq!(
        action,
        RenderAction::Node {
            node: menu.items[1],
            relayout: false
        }
    );
    assert_eq!(shown(&fix.window, 75, 55), LABEL);
    assert_matches_full_render(&mut fix.window);
}

#[test]
fn popup_opens_relative_to_its_placement_parent() {
    let mut fix = fixture();
    let beside_label = menu(&mut fix.window, ViewportFlags::NONE, fix.label);
    fix.window
        .open_popup(beside_label.popup, Point::new(2, 3))
        .expect("open by the label");
    assert_eq!(
        fix.window
            .viewport(beside_label.popup)
            .and_then(|vp| vp.frame().win_box()),
        Some(Rect::new(12, 33, 30, 20))
    );
    assert_eq!(shown(&fix.window, 13, 34), ITEM_A);

    let beside_dot = fix
        .window
        .new_popup("tip", Size::new(10, 10), ViewportFlags::NONE, Some(fix.dot))
        .expect("tip");
    fix.window
        .scene_mut()
        .set_style(beside_dot, Style::with_background(BADGE))
        .expect("tip style");
    fix.window
        .open_popup(beside_dot, Point::new(1, 1))
        .expect("open by the dot");
    assert_eq!(
        fix.window
            .viewport(beside_dot)
            .and_then(|vp| vp.frame().win_box()),
        Some(Rect::new(66, 26, 10, 10))
    );
    assert_eq!(shown(&fix.window, 67, 27), BADGE);
    assert_matches_full_render(&mut fix.window);
}

#[test]
fn closing_a_menu_detaches_reusable_items() {
    let mut fix = fixture();
    let menu = menu(&mut fix.window, ViewportFlags::NONE, fix.slider);
    fix.window.open_popup(menu.popup, Point::new(70, 40)).expect("open");

    let detached = fix.window.close_popup(menu.popup).expect("close");
    assert_eq!(detached, menu.items.to_vec());
    assert!(fix.window.popups().is_empty());
    assert_eq!(fix.window.top_menu(), None);
    assert!(fix.window.viewport(menu.popup).is_none());
    assert!(!fix.window.scene().is_live(menu.popup));
    assert!(!fix.window.scene().is_live(menu.list));
    assert_eq!(shown(&fix.window, 75, 45), INNER);

    let item = menu.items[0];
    assert!(fix.window.scene().widget::<Block>(item).is_some());
    fix.window
        .scene_mut()
        .set_layout(item, layout(10, 45, 10, 5))
        .expect("reuse layout");
    let action = fix.window.append_child(fix.panel, item).expect("reuse item");
    assert_eq!(action, RenderAction::FullTree);
    assert_eq!(shown(&fix.window, 12, 47), ITEM_A);
    assert_matches_full_render(&mut fix.window);
}

#[test]
fn destroy_children_on_close_destroys_items() {
    let mut fix = fixture();
    let menu = menu(
        &mut fix.window,
        ViewportFlags::DESTROY_CHILDREN_ON_CLOSE,
        fix.label,
    );
    fix.window.open_popup(menu.popup, Point::new(0, 0)).expect("open");
    let detached = fix.window.close_popup(menu.popup).expect("close");
    assert!(detached.is_empty());
    for item in menu.items {
        assert!(fix.window.scene().widget::<Block>(item).is_none());
    }
    assert!(fix.window.close_popup(menu.popup).is_err());
}

#[test]
fn popups_stack_in_open_order() {
    init_logger();
    let mut window = window();
    window.render_all();
    let main = window.main();
    let lower = menu(&mut window, ViewportFlags::NONE, main);
    let upper = window
        .new_popup("tooltip", Size::new(10, 10), ViewportFlags::NONE, None)
        .expect("tooltip");
    window
        .scene_mut()
        .set_style(upper, Style::with_background(BADGE))
        .expect("tooltip style");
    window.open_popup(lower.popup, Point::new(0, 0)).expect("open lower");
    window.open_popup(upper, Point::new(5, 5)).expect("open upper");
    assert_eq!(window.popups(), &[lower.popup, upper]);
    assert_eq!(window.top_menu(), None);
    assert_eq!(shown(&window, 6, 6), BADGE);
    assert_eq!(shown(&window, 20, 6), ITEM_A);

    window.close_popup(upper).expect("close upper");
    assert_eq!(window.top_menu(), Some(lower.popup));
    assert_eq!(shown(&window, 6, 6), ITEM_A);
    assert_matches_full_render(&mut window);
}
