//! Tests for grid attachment, sizing and allocation.

use trellis_layout::{
    Align, GridAttach, LayoutError, Leaf, Orientation, PositionType, Rect, TextDirection, WidgetId,
    WidgetTree,
};

/// Two 40px cells on row 0 and a 100px cell spanning both columns on row 1.
fn spanning_grid() -> (WidgetTree, WidgetId, [WidgetId; 3]) {
    let mut tree = WidgetTree::new();
    let grid = tree.new_grid("grid");
    let a = tree.new_leaf("a", Leaf::fixed(40, 10));
    let b = tree.new_leaf("b", Leaf::fixed(40, 10));
    let c = tree.new_leaf("c", Leaf::fixed(100, 10));
    let mut handle = tree.grid_mut(grid).unwrap();
    handle.set_column_spacing(4).unwrap();
    handle.set_row_spacing(2).unwrap();
    handle.attach(a, 0, 0, 1, 1).unwrap();
    handle.attach(b, 1, 0, 1, 1).unwrap();
    handle.attach(c, 0, 1, 2, 1).unwrap();
    (tree, grid, [a, b, c])
}

// ========== sizing ==========

#[test]
fn test_spanning_child_widens_its_columns() {
    let (tree, grid, _) = spanning_grid();
    let width = tree.measure(grid, Orientation::Horizontal, None).unwrap();
    assert_eq!(width.minimum, 100, "two 48px columns and one gap");
    let height = tree.measure(grid, Orientation::Vertical, None).unwrap();
    assert_eq!(height.minimum, 22);
}

#[test]
fn test_spanning_allocation() {
    let (mut tree, grid, [a, b, c]) = spanning_grid();
    let _ = tree.allocate(grid, Rect::new(0, 0, 100, 22), None).unwrap();
    assert_eq!(tree.allocation(a).unwrap(), Rect::new(0, 0, 48, 10));
    assert_eq!(tree.allocation(b).unwrap(), Rect::new(52, 0, 48, 10));
    assert_eq!(tree.allocation(c).unwrap(), Rect::new(0, 12, 100, 10));
}

#[test]
fn test_span_deficit_is_split_across_unequal_columns() {
    let mut tree = WidgetTree::new();
    let grid = tree.new_grid("grid");
    let a = tree.new_leaf("a", Leaf::fixed(30, 10));
    let b = tree.new_leaf("b", Leaf::fixed(40, 10));
    let c = tree.new_leaf("c", Leaf::fixed(100, 10));
    let mut handle = tree.grid_mut(grid).unwrap();
    handle.set_column_spacing(4).unwrap();
    handle.set_row_spacing(2).unwrap();
    handle.attach(a, 0, 0, 1, 1).unwrap();
    handle.attach(b, 1, 0, 1, 1).unwrap();
    handle.attach(c, 0, 1, 2, 1).unwrap();

    // 100 - (30 + 4 + 40) = 26, split 13 and 13.
    let width = tree.measure(grid, Orientation::Horizontal, None).unwrap();
    assert_eq!((width.minimum, width.natural), (100, 100));

    let _ = tree.allocate(grid, Rect::new(0, 0, 120, 30), None).unwrap();
    assert_eq!(tree.allocation(a).unwrap(), Rect::new(0, 0, 43, 10));
    assert_eq!(tree.allocation(b).unwrap(), Rect::new(47, 0, 53, 10));
    assert_eq!(tree.allocation(c).unwrap(), Rect::new(0, 12, 100, 10), "no column expands");
}

#[test]
fn test_children_stay_inside_the_grid() {
    let (mut tree, grid, children) = spanning_grid();
    tree.set_hexpand(children[1], Some(true)).unwrap();
    for width in [100, 131, 250] {
        let _ = tree.allocate(grid, Rect::new(5, 5, width, 40), None).unwrap();
        let bounds = tree.allocation(grid).unwrap();
        for child in children {
            let rect = tree.allocation(child).unwrap();
            assert!(bounds.contains_rect(&rect), "{rect:?} escapes {bounds:?}");
        }
    }
}

#[test]
fn test_expanding_column_takes_extra_width() {
    let (mut tree, grid, [a, b, _]) = spanning_grid();
    tree.set_hexpand(b, Some(true)).unwrap();
    let _ = tree.allocate(grid, Rect::new(0, 0, 140, 22), None).unwrap();
    assert_eq!(tree.allocation(a).unwrap().width, 48);
    assert_eq!(tree.allocation(b).unwrap(), Rect::new(52, 0, 88, 10));
}

#[test]
fn test_homogeneous_columns() {
    let mut tree = WidgetTree::new();
    let grid = tree.new_grid("grid");
    let wide = tree.new_leaf("wide", Leaf::fixed(40, 10));
    let narrow = tree.new_leaf("narrow", Leaf::fixed(20, 10));
    let mut handle = tree.grid_mut(grid).unwrap();
    handle.set_column_homogeneous(true).unwrap();
    handle.add(wide).unwrap();
    handle.add(narrow).unwrap();

    let width = tree.measure(grid, Orientation::Horizontal, None).unwrap();
    assert_eq!(width.minimum, 80);
    let _ = tree.allocate(grid, Rect::new(0, 0, 100, 10), None).unwrap();
    assert_eq!(tree.allocation(wide).unwrap(), Rect::new(0, 0, 50, 10));
    assert_eq!(tree.allocation(narrow).unwrap(), Rect::new(50, 0, 50, 10));
}

#[test]
fn test_baseline_aligned_row_height() {
    let mut tree = WidgetTree::new();
    let grid = tree.new_grid("grid");
    let low = tree.new_leaf("low", Leaf::fixed(20, 20).with_baseline(15));
    let high = tree.new_leaf("high", Leaf::fixed(20, 30).with_baseline(5));
    tree.set_valign(low, Align::Baseline).unwrap();
    tree.set_valign(high, Align::Baseline).unwrap();
    let mut handle = tree.grid_mut(grid).unwrap();
    handle.add(low).unwrap();
    handle.add(high).unwrap();

    let height = tree.measure(grid, Orientation::Vertical, None).unwrap();
    assert_eq!(height.minimum, 40, "15 above the baseline and 25 below");
    assert_eq!(height.minimum_baseline, Some(15));
}

#[test]
fn test_rtl_mirrors_columns() {
    let (mut tree, grid, [a, b, _]) = spanning_grid();
    tree.set_direction(grid, TextDirection::Rtl).unwrap();
    let _ = tree.allocate(grid, Rect::new(0, 0, 100, 22), None).unwrap();
    assert_eq!(tree.allocation(a).unwrap().x, 52);
    assert_eq!(tree.allocation(b).unwrap().x, 0);
}

// ========== attachment ==========

#[test]
fn test_add_appends_on_row_zero() {
    let mut tree = WidgetTree::new();
    let grid = tree.new_grid("grid");
    let a = tree.new_leaf("a", Leaf::default());
    let b = tree.new_leaf("b", Leaf::default());
    let mut handle = tree.grid_mut(grid).unwrap();
    handle.add(a).unwrap();
    handle.add(b).unwrap();
    let state = tree.as_grid(grid).unwrap();
    assert_eq!(state.child_position(b), Some(GridAttach::new(1, 0, 1, 1)));
    assert_eq!(state.child_at(1, 0), Some(b));
}

#[test]
fn test_attach_next_to_sibling() {
    let (mut tree, grid, [a, _, c]) = spanning_grid();
    let d = tree.new_leaf("d", Leaf::default());
    let e = tree.new_leaf("e", Leaf::default());
    let mut handle = tree.grid_mut(grid).unwrap();
    handle.attach_next_to(d, Some(c), PositionType::Bottom, 1, 1).unwrap();
    handle.attach_next_to(e, Some(a), PositionType::Left, 2, 1).unwrap();
    let state = tree.as_grid(grid).unwrap();
    assert_eq!(state.child_position(d), Some(GridAttach::new(0, 2, 1, 1)));
    assert_eq!(state.child_position(e), Some(GridAttach::new(-2, 0, 2, 1)));
}

#[test]
fn test_attach_next_to_without_sibling() {
    let (mut tree, grid, _) = spanning_grid();
    let d = tree.new_leaf("d", Leaf::default());
    tree.grid_mut(grid)
        .unwrap()
        .attach_next_to(d, None, PositionType::Right, 1, 1)
        .unwrap();
    assert_eq!(
        tree.as_grid(grid).unwrap().child_position(d),
        Some(GridAttach::new(2, 0, 1, 1))
    );
}

#[test]
fn test_zero_span_is_rejected() {
    let mut tree = WidgetTree::new();
    let grid = tree.new_grid("grid");
    let a = tree.new_leaf("a", Leaf::default());
    let _ = trellis_common::take_reports();
    let err = tree.grid_mut(grid).unwrap().attach(a, 0, 0, 0, 1).unwrap_err();
    assert!(matches!(err, LayoutError::Precondition(_)));
    assert_eq!(tree.parent(a), None, "nothing attached");
    assert_eq!(trellis_common::take_reports().len(), 1);
}

#[test]
fn test_unknown_sibling_is_rejected() {
    let (mut tree, grid, _) = spanning_grid();
    let stranger = tree.new_leaf("stranger", Leaf::default());
    let d = tree.new_leaf("d", Leaf::default());
    let result = tree
        .grid_mut(grid)
        .unwrap()
        .attach_next_to(d, Some(stranger), PositionType::Right, 1, 1);
    assert!(result.is_err());
    assert_eq!(tree.parent(d), None);
}

// ========== rows and columns ==========

#[test]
fn test_insert_then_remove_row_round_trip() {
    let (mut tree, grid, [a, b, c]) = spanning_grid();
    let before: Vec<_> = [a, b, c]
        .iter()
        .map(|child| tree.as_grid(grid).unwrap().child_position(*child))
        .collect();

    tree.grid_mut(grid).unwrap().insert_row(1).unwrap();
    assert_eq!(tree.as_grid(grid).unwrap().child_position(c).unwrap().top, 2);
    assert_eq!(tree.as_grid(grid).unwrap().child_position(a).unwrap().top, 0);

    tree.grid_mut(grid).unwrap().remove_row(1).unwrap();
    let after: Vec<_> = [a, b, c]
        .iter()
        .map(|child| tree.as_grid(grid).unwrap().child_position(*child))
        .collect();
    assert_eq!(after, before);
}

#[test]
fn test_insert_row_grows_spanning_children() {
    let mut tree = WidgetTree::new();
    let grid = tree.new_grid("grid");
    let tall = tree.new_leaf("tall", Leaf::default());
    tree.grid_mut(grid).unwrap().attach(tall, 0, 0, 1, 2).unwrap();
    tree.grid_mut(grid).unwrap().insert_row(1).unwrap();
    assert_eq!(
        tree.as_grid(grid).unwrap().child_position(tall),
        Some(GridAttach::new(0, 0, 1, 3))
    );
}

#[test]
fn test_remove_row_drops_its_children() {
    let (mut tree, grid, [a, b, c]) = spanning_grid();
    tree.grid_mut(grid).unwrap().remove_row(0).unwrap();
    let state = tree.as_grid(grid).unwrap();
    assert_eq!(state.child_order(), vec![c]);
    assert_eq!(state.child_position(c), Some(GridAttach::new(0, 0, 2, 1)));
    assert_eq!(tree.parent(a), None);
    assert_eq!(tree.parent(b), None);
}

#[test]
fn test_remove_column_shrinks_spanning_children() {
    let (mut tree, grid, [a, b, c]) = spanning_grid();
    tree.grid_mut(grid).unwrap().remove_column(0).unwrap();
    let state = tree.as_grid(grid).unwrap();
    assert_eq!(state.child_position(a), None);
    assert_eq!(state.child_position(b), Some(GridAttach::new(0, 0, 1, 1)));
    assert_eq!(state.child_position(c), Some(GridAttach::new(0, 1, 1, 1)));
}

#[test]
fn test_insert_next_to_sibling() {
    let (mut tree, grid, [a, b, _]) = spanning_grid();
    tree.grid_mut(grid).unwrap().insert_next_to(a, PositionType::Right).unwrap();
    assert_eq!(tree.as_grid(grid).unwrap().child_position(b).unwrap().left, 2);
}
