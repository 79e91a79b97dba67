//! Tests for viewport scrolling and adjustments.

use std::cell::RefCell;
use std::rc::Rc;

use trellis_layout::{
    AdjustmentRef, Leaf, Orientation, Rect, ScrollablePolicy, TextDirection, WidgetId, WidgetTree,
};

fn assert_close(actual: f64, expected: f64, what: &str) {
    assert!((actual - expected).abs() < f64::EPSILON, "{what}: {actual} != {expected}");
}

/// A viewport scrolling `child`, with both adjustments returned.
fn viewport_with(leaf: Leaf) -> (WidgetTree, WidgetId, WidgetId, AdjustmentRef, AdjustmentRef) {
    let mut tree = WidgetTree::new();
    let hadjustment = AdjustmentRef::default();
    let vadjustment = AdjustmentRef::default();
    let viewport = tree.new_viewport("viewport", Some(hadjustment.clone()), Some(vadjustment.clone()));
    let child = tree.new_leaf("content", leaf);
    tree.viewport_mut(viewport).unwrap().set_child(Some(child)).unwrap();
    (tree, viewport, child, hadjustment, vadjustment)
}

// ========== scrolling ==========

#[test]
fn test_large_child_publishes_its_size() {
    let (mut tree, viewport, child, h, v) = viewport_with(Leaf::fixed(400, 400));
    let mut handle = tree.viewport_mut(viewport).unwrap();
    handle.set_hscroll_policy(ScrollablePolicy::Natural).unwrap();
    let _ = tree.allocate(viewport, Rect::new(0, 0, 200, 200), None).unwrap();

    assert_close(h.upper(), 400.0, "h upper");
    assert_close(h.page_size(), 200.0, "h page size");
    assert_close(h.value(), 0.0, "h value");
    assert_close(v.upper(), 400.0, "v upper");
    assert_eq!(tree.allocation(child).unwrap(), Rect::new(0, 0, 400, 400));
}

#[test]
fn test_value_change_moves_the_bin() {
    let (mut tree, viewport, child, h, _) = viewport_with(Leaf::fixed(400, 400));
    let _ = tree.allocate(viewport, Rect::new(0, 0, 200, 200), None).unwrap();

    h.set_value(50.0);
    assert_eq!(
        tree.as_viewport(viewport).unwrap().bin_rect(),
        Rect::new(-50, 0, 400, 400)
    );
    let _ = tree.allocate(viewport, Rect::new(0, 0, 200, 200), None).unwrap();
    assert_eq!(tree.allocation(child).unwrap(), Rect::new(-50, 0, 400, 400));
}

#[test]
fn test_bin_follows_the_view_origin() {
    let (mut tree, viewport, child, _, v) = viewport_with(Leaf::fixed(100, 300));
    let _ = tree.allocate(viewport, Rect::new(10, 20, 100, 100), None).unwrap();
    v.set_value(30.0);
    let _ = tree.allocate(viewport, Rect::new(10, 20, 100, 100), None).unwrap();
    assert_close(v.value(), 30.0, "value kept");
    assert_eq!(tree.allocation(child).unwrap(), Rect::new(10, -10, 100, 300));
    assert_eq!(tree.as_viewport(viewport).unwrap().view_rect(), Rect::new(10, 20, 100, 100));
}

#[test]
fn test_small_child_fills_the_view() {
    let (mut tree, viewport, child, h, _) = viewport_with(Leaf::fixed(50, 50));
    let _ = tree.allocate(viewport, Rect::new(0, 0, 200, 120), None).unwrap();
    assert_close(h.upper(), 200.0, "upper is the view");
    assert_eq!(tree.allocation(child).unwrap(), Rect::new(0, 0, 200, 120));
}

#[test]
fn test_scroll_policy_picks_the_extent() {
    let (mut tree, viewport, _, h, _) = viewport_with(Leaf::new(100, 400, 10, 10));
    let _ = tree.allocate(viewport, Rect::new(0, 0, 200, 100), None).unwrap();
    assert_close(h.upper(), 200.0, "minimum policy");

    tree.viewport_mut(viewport)
        .unwrap()
        .set_hscroll_policy(ScrollablePolicy::Natural)
        .unwrap();
    let _ = tree.allocate(viewport, Rect::new(0, 0, 200, 100), None).unwrap();
    assert_close(h.upper(), 400.0, "natural policy");
}

#[test]
fn test_shrinking_content_clamps_the_value() {
    let (mut tree, viewport, _, h, _) = viewport_with(Leaf::fixed(400, 100));
    let _ = tree.allocate(viewport, Rect::new(0, 0, 200, 100), None).unwrap();
    h.set_value(150.0);
    assert_close(h.value(), 150.0, "within range");

    let _ = tree.allocate(viewport, Rect::new(0, 0, 300, 100), None).unwrap();
    assert_close(h.value(), 100.0, "clamped to upper - page");
}

#[test]
fn test_rtl_starts_at_the_right_edge() {
    let (mut tree, viewport, child, h, _) = viewport_with(Leaf::fixed(400, 100));
    tree.set_direction(viewport, TextDirection::Rtl).unwrap();
    let _ = tree.allocate(viewport, Rect::new(0, 0, 200, 100), None).unwrap();
    assert_close(h.value(), 200.0, "scrolled to the end");
    assert_eq!(tree.allocation(child).unwrap().x, -200);
}

#[test]
fn test_viewport_measures_its_child() {
    let (tree, viewport, _, _, _) = viewport_with(Leaf::new(30, 80, 10, 40));
    let width = tree.measure(viewport, Orientation::Horizontal, None).unwrap();
    assert_eq!((width.minimum, width.natural), (30, 80));
}

#[test]
fn test_hidden_child_is_not_allocated() {
    let (mut tree, viewport, child, h, _) = viewport_with(Leaf::fixed(400, 400));
    tree.set_visible(child, false).unwrap();
    let _ = tree.allocate(viewport, Rect::new(0, 0, 200, 200), None).unwrap();
    assert_close(h.upper(), 200.0, "view only");
    assert_eq!(tree.allocation(child).unwrap(), Rect::default());
}

#[test]
fn test_replacing_the_adjustment() {
    let (mut tree, viewport, _, old, _) = viewport_with(Leaf::fixed(400, 400));
    let fresh = AdjustmentRef::new(0.0, 0.0, 10.0, 1.0, 1.0, 10.0);
    tree.viewport_mut(viewport)
        .unwrap()
        .set_hadjustment(Some(fresh.clone()))
        .unwrap();
    let _ = tree.allocate(viewport, Rect::new(0, 0, 200, 200), None).unwrap();
    assert_close(fresh.upper(), 400.0, "new adjustment configured");
    assert_close(old.upper(), 0.0, "old adjustment untouched");
    assert!(tree.as_viewport(viewport).unwrap().hadjustment().ptr_eq(&fresh));
}

// ========== adjustments ==========

#[test]
fn test_value_stays_in_range() {
    let adjustment = AdjustmentRef::new(0.0, 0.0, 100.0, 1.0, 10.0, 20.0);
    for (requested, expected) in [(-5.0, 0.0), (50.0, 50.0), (95.0, 80.0)] {
        adjustment.set_value(requested);
        assert_close(adjustment.value(), expected, "set_value");
    }
    adjustment.set_page_size(150.0);
    assert_close(adjustment.value(), 0.0, "page larger than the range");
}

#[test]
fn test_clamp_page_scrolls_the_least() {
    let adjustment = AdjustmentRef::new(0.0, 0.0, 100.0, 1.0, 10.0, 20.0);
    adjustment.clamp_page(30.0, 40.0);
    assert_close(adjustment.value(), 20.0, "shows the bottom");
    adjustment.clamp_page(5.0, 10.0);
    assert_close(adjustment.value(), 5.0, "shows the top");
    adjustment.clamp_page(50.0, 90.0);
    assert_close(adjustment.value(), 50.0, "a range over a page shows its start");
    adjustment.clamp_page(55.0, 60.0);
    assert_close(adjustment.value(), 50.0, "already visible");
}

#[test]
fn test_allocation_notifies_observers() {
    let (mut tree, viewport, _, h, _) = viewport_with(Leaf::fixed(400, 400));
    let changed = Rc::new(RefCell::new(Vec::new()));
    let log = Rc::clone(&changed);
    let id = h.connect_changed(move |values| log.borrow_mut().push(values.upper));

    let _ = tree.allocate(viewport, Rect::new(0, 0, 200, 200), None).unwrap();
    let _ = tree.allocate(viewport, Rect::new(0, 0, 200, 200), None).unwrap();
    assert_eq!(*changed.borrow(), vec![400.0], "repeat allocations change nothing");

    assert!(h.disconnect(id));
    let _ = tree.allocate(viewport, Rect::new(0, 0, 100, 200), None).unwrap();
    assert_eq!(changed.borrow().len(), 1);
}
