//! Tests for box and button box layout.

use trellis_layout::{
    Border, BoxChild, ButtonBoxStyle, LayoutError, Leaf, Orientation, PackType, Rect, Style,
    TextDirection, WidgetId, WidgetTree,
};

/// A horizontal box holding one leaf per `(minimum, natural)` width, all
/// 10 pixels tall.
fn row_of(widths: &[(i32, i32)], spacing: i32) -> (WidgetTree, WidgetId, Vec<WidgetId>) {
    let mut tree = WidgetTree::new();
    let container = tree.new_box("row", Orientation::Horizontal);
    let children: Vec<WidgetId> = widths
        .iter()
        .enumerate()
        .map(|(index, (min, nat))| tree.new_leaf(format!("leaf{index}"), Leaf::new(*min, *nat, 10, 10)))
        .collect();
    let mut handle = tree.box_mut(container).unwrap();
    handle.set_spacing(spacing).unwrap();
    for child in &children {
        handle.pack_start(*child, true, true, 0).unwrap();
    }
    (tree, container, children)
}

fn xs_and_widths(tree: &WidgetTree, children: &[WidgetId]) -> Vec<(i32, i32)> {
    children
        .iter()
        .map(|child| {
            let rect = tree.allocation(*child).unwrap();
            (rect.x, rect.width)
        })
        .collect()
}

// ========== measurement ==========

#[test]
fn test_minimum_is_sum_of_children_plus_spacing() {
    let (tree, container, _) = row_of(&[(20, 30), (20, 60), (20, 30)], 10);
    let width = tree.measure(container, Orientation::Horizontal, None).unwrap();
    assert_eq!(width.minimum, 80);
    assert_eq!(width.natural, 140);
    let height = tree.measure(container, Orientation::Vertical, None).unwrap();
    assert_eq!((height.minimum, height.natural), (10, 10));
}

#[test]
fn test_hidden_children_take_no_space() {
    let (mut tree, container, children) = row_of(&[(20, 30), (20, 60), (20, 30)], 10);
    tree.set_visible(children[1], false).unwrap();
    let width = tree.measure(container, Orientation::Horizontal, None).unwrap();
    assert_eq!(width.minimum, 50, "one child and one gap fewer");
}

#[test]
fn test_invalid_child_geometry_is_an_error() {
    let mut tree = WidgetTree::new();
    let container = tree.new_box("row", Orientation::Horizontal);
    let broken = tree.new_leaf("broken", Leaf::new(30, 20, 10, 10));
    tree.box_mut(container).unwrap().add(broken).unwrap();

    let err = tree.measure(container, Orientation::Horizontal, None).unwrap_err();
    assert!(matches!(err, LayoutError::InvalidChildGeometry { ref widget, .. } if widget == "broken"));
    assert!(tree.allocate(container, Rect::new(0, 0, 100, 10), None).is_err());
}

#[test]
fn test_style_extents_wrap_the_content() {
    let (mut tree, container, children) = row_of(&[(20, 20)], 0);
    let style = Style {
        margin: Border::uniform(5),
        border: Border::uniform(1),
        padding: Border::uniform(2),
        ..Style::default()
    };
    tree.set_style(container, style).unwrap();

    let width = tree.measure(container, Orientation::Horizontal, None).unwrap();
    assert_eq!(width.minimum, 36);
    let _ = tree.allocate(container, Rect::new(0, 0, 36, 26), None).unwrap();
    assert_eq!(tree.allocation(children[0]).unwrap(), Rect::new(8, 8, 20, 10));
}

// ========== allocation ==========

#[test]
fn test_expanding_children_share_extra_space() {
    let (mut tree, container, children) = row_of(&[(20, 30), (20, 60), (20, 30)], 10);
    let _ = tree.allocate(container, Rect::new(0, 0, 200, 10), None).unwrap();
    assert_eq!(
        xs_and_widths(&tree, &children),
        vec![(0, 50), (60, 80), (150, 50)],
        "naturals first, then the 60 leftover pixels split evenly"
    );
}

#[test]
fn test_homogeneous_children_get_equal_slots() {
    let (mut tree, container, children) = row_of(&[(30, 30), (30, 30), (30, 30)], 10);
    tree.box_mut(container).unwrap().set_homogeneous(true).unwrap();
    let _ = tree.allocate(container, Rect::new(0, 0, 200, 10), None).unwrap();
    assert_eq!(xs_and_widths(&tree, &children), vec![(0, 60), (70, 60), (140, 60)]);
}

#[test]
fn test_children_stay_inside_the_box() {
    let (mut tree, container, children) = row_of(&[(20, 30), (25, 60), (15, 30)], 4);
    for width in [68, 80, 117, 200, 333] {
        let _ = tree.allocate(container, Rect::new(3, 0, width, 10), None).unwrap();
        let bounds = tree.allocation(container).unwrap();
        for child in &children {
            let rect = tree.allocation(*child).unwrap();
            assert!(bounds.contains_rect(&rect), "{rect:?} escapes {bounds:?} at width {width}");
        }
    }
}

#[test]
fn test_allocation_is_idempotent() {
    let (mut tree, container, children) = row_of(&[(20, 30), (20, 60), (20, 30)], 10);
    let _ = tree.allocate(container, Rect::new(0, 0, 170, 10), None).unwrap();
    let first = xs_and_widths(&tree, &children);
    let _ = tree.allocate(container, Rect::new(0, 0, 170, 10), None).unwrap();
    assert_eq!(xs_and_widths(&tree, &children), first);
}

#[test]
fn test_end_packed_children_fill_from_the_end() {
    let mut tree = WidgetTree::new();
    let container = tree.new_box("row", Orientation::Horizontal);
    let start = tree.new_leaf("start", Leaf::fixed(30, 10));
    let end = tree.new_leaf("end", Leaf::fixed(40, 10));
    let mut handle = tree.box_mut(container).unwrap();
    handle.pack_start(start, false, true, 0).unwrap();
    handle.pack_end(end, false, true, 0).unwrap();

    let _ = tree.allocate(container, Rect::new(0, 0, 200, 10), None).unwrap();
    assert_eq!(tree.allocation(start).unwrap().x, 0);
    assert_eq!(tree.allocation(end).unwrap().x, 160);
}

#[test]
fn test_center_child_is_centered() {
    let mut tree = WidgetTree::new();
    let container = tree.new_box("row", Orientation::Horizontal);
    let start = tree.new_leaf("start", Leaf::fixed(50, 10));
    let end = tree.new_leaf("end", Leaf::fixed(50, 10));
    let center = tree.new_leaf("center", Leaf::fixed(100, 10));
    let mut handle = tree.box_mut(container).unwrap();
    handle.pack_start(start, false, true, 0).unwrap();
    handle.pack_end(end, false, true, 0).unwrap();
    handle.set_center(Some(center)).unwrap();

    let _ = tree.allocate(container, Rect::new(0, 0, 300, 10), None).unwrap();
    assert_eq!(tree.allocation(center).unwrap(), Rect::new(100, 0, 100, 10));
    assert_eq!(tree.allocation(end).unwrap().x, 250);
}

#[test]
fn test_rtl_mirrors_positions() {
    let (mut tree, container, children) = row_of(&[(20, 30), (20, 60), (20, 30)], 10);
    tree.set_direction(container, TextDirection::Rtl).unwrap();
    let _ = tree.allocate(container, Rect::new(0, 0, 200, 10), None).unwrap();
    assert_eq!(xs_and_widths(&tree, &children), vec![(150, 50), (60, 80), (0, 50)]);
}

// ========== child management ==========

#[test]
fn test_reorder_round_trip() {
    let (mut tree, container, children) = row_of(&[(10, 10), (10, 10), (10, 10)], 0);
    tree.box_mut(container).unwrap().reorder(children[0], Some(2)).unwrap();
    assert_eq!(
        tree.as_box(container).unwrap().child_order(),
        &[children[1], children[2], children[0]]
    );
    tree.box_mut(container).unwrap().reorder(children[0], Some(0)).unwrap();
    assert_eq!(tree.as_box(container).unwrap().child_order(), children.as_slice());
}

#[test]
fn test_remove_then_pack_restores_layout() {
    let (mut tree, container, children) = row_of(&[(20, 30), (20, 60), (20, 30)], 10);
    let _ = tree.allocate(container, Rect::new(0, 0, 200, 10), None).unwrap();
    let before = xs_and_widths(&tree, &children);

    tree.box_mut(container).unwrap().remove(children[2]).unwrap();
    assert_eq!(tree.parent(children[2]), None);
    tree.box_mut(container).unwrap().pack_start(children[2], true, true, 0).unwrap();

    let _ = tree.allocate(container, Rect::new(0, 0, 200, 10), None).unwrap();
    assert_eq!(xs_and_widths(&tree, &children), before);
}

#[test]
fn test_packing_round_trip() {
    let (mut tree, container, children) = row_of(&[(10, 10)], 0);
    let packing = BoxChild::new(false, false, 3).packed(PackType::End);
    let mut handle = tree.box_mut(container).unwrap();
    handle.set_packing(children[0], packing).unwrap();
    assert_eq!(handle.query_packing(children[0]).unwrap(), packing);
}

#[test]
fn test_spacing_round_trip() {
    let (mut tree, container, _) = row_of(&[(10, 10)], 0);
    tree.box_mut(container).unwrap().set_spacing(7).unwrap();
    assert_eq!(tree.as_box(container).unwrap().spacing(), 7);
}

#[test]
fn test_adding_a_parented_child_is_rejected() {
    let (mut tree, _, children) = row_of(&[(10, 10)], 0);
    let other = tree.new_box("other", Orientation::Vertical);
    let _ = trellis_common::take_reports();

    let err = tree.box_mut(other).unwrap().add(children[0]).unwrap_err();
    assert!(matches!(err, LayoutError::Precondition(_)));
    assert!(tree.as_box(other).unwrap().child_order().is_empty(), "no state change");
    assert_eq!(trellis_common::take_reports().len(), 1);
}

#[test]
fn test_negative_padding_is_rejected() {
    let mut tree = WidgetTree::new();
    let container = tree.new_box("row", Orientation::Horizontal);
    let child = tree.new_leaf("child", Leaf::fixed(10, 10));
    let err = tree.box_mut(container).unwrap().pack_start(child, false, false, -1).unwrap_err();
    assert!(matches!(err, LayoutError::Precondition(_)));
    assert_eq!(tree.parent(child), None);
}

#[test]
fn test_wrong_kind_is_reported() {
    let mut tree = WidgetTree::new();
    let grid = tree.new_grid("grid");
    assert!(matches!(tree.box_mut(grid), Err(LayoutError::WrongKind { .. })));
}

// ========== button box ==========

fn button_box(layout: ButtonBoxStyle, spacing: i32) -> (WidgetTree, WidgetId, Vec<WidgetId>) {
    let mut tree = WidgetTree::new();
    let container = tree.new_button_box("buttons", Orientation::Horizontal);
    let buttons: Vec<WidgetId> = (0..3)
        .map(|index| tree.new_leaf(format!("button{index}"), Leaf::fixed(50, 20)))
        .collect();
    let mut handle = tree.box_mut(container).unwrap();
    handle.set_spacing(spacing).unwrap();
    for button in &buttons {
        handle.add(*button).unwrap();
    }
    let mut handle = tree.button_box_mut(container).unwrap();
    handle.set_layout(layout).unwrap();
    handle.set_child_min_size(0, 0).unwrap();
    handle.set_child_ipadding(0, 0).unwrap();
    (tree, container, buttons)
}

#[test]
fn test_button_box_edge_layout() {
    let (mut tree, container, buttons) = button_box(ButtonBoxStyle::Edge, 0);
    let width = tree.measure(container, Orientation::Horizontal, None).unwrap();
    assert_eq!(width.minimum, 150);

    let _ = tree.allocate(container, Rect::new(0, 0, 300, 20), None).unwrap();
    assert_eq!(xs_and_widths(&tree, &buttons), vec![(0, 50), (125, 50), (250, 50)]);
}

#[test]
fn test_button_box_spread_layout() {
    let (mut tree, container, buttons) = button_box(ButtonBoxStyle::Spread, 0);
    let _ = tree.allocate(container, Rect::new(0, 0, 300, 20), None).unwrap();
    assert_eq!(xs_and_widths(&tree, &buttons), vec![(37, 50), (124, 50), (211, 50)]);
}

#[test]
fn test_button_box_secondary_child_moves_to_the_other_end() {
    let (mut tree, container, buttons) = button_box(ButtonBoxStyle::Start, 10);
    let mut handle = tree.button_box_mut(container).unwrap();
    handle.set_child_secondary(buttons[2], true).unwrap();
    assert!(handle.child_secondary(buttons[2]).unwrap());

    let _ = tree.allocate(container, Rect::new(0, 0, 300, 20), None).unwrap();
    assert_eq!(xs_and_widths(&tree, &buttons), vec![(0, 50), (60, 50), (250, 50)]);
}

#[test]
fn test_button_box_children_share_the_largest_size() {
    let (mut tree, container, buttons) = button_box(ButtonBoxStyle::Start, 0);
    tree.set_leaf(buttons[1], Leaf::fixed(70, 20)).unwrap();
    let _ = tree.allocate(container, Rect::new(0, 0, 300, 20), None).unwrap();
    assert_eq!(xs_and_widths(&tree, &buttons), vec![(0, 70), (70, 70), (140, 70)]);
}
