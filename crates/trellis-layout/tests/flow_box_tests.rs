//! Tests for flow box reflow, selection and navigation.

use std::cell::RefCell;
use std::rc::Rc;

use trellis_layout::{
    AdjustmentRef, CreateWidget, LayoutError, Leaf, ListModel, ModelItem, Modifiers, MovementStep,
    Orientation, Rect, ScrollType, SelectionMode, VecModel, WidgetId, WidgetTree,
};

/// Seven 50x20 children, at most four per line, 5px spacing both ways.
/// Returns the wrappers.
fn seven_children() -> (WidgetTree, WidgetId, Vec<WidgetId>) {
    let mut tree = WidgetTree::new();
    let flow = tree.new_flow_box("flow");
    let leaves: Vec<WidgetId> = (0..7)
        .map(|index| tree.new_leaf(format!("item{index}"), Leaf::fixed(50, 20)))
        .collect();
    let mut handle = tree.flow_box_mut(flow).unwrap();
    handle.set_max_children_per_line(4).unwrap();
    handle.set_row_spacing(5).unwrap();
    handle.set_column_spacing(5).unwrap();
    let wrappers = leaves
        .into_iter()
        .map(|leaf| handle.insert(leaf, None).unwrap())
        .collect();
    (tree, flow, wrappers)
}

fn allocated(tree: &mut WidgetTree, flow: WidgetId) {
    let _ = tree.allocate(flow, Rect::new(0, 0, 215, 45), None).unwrap();
}

// ========== layout ==========

#[test]
fn test_height_for_width_wraps_into_lines() {
    let (tree, flow, _) = seven_children();
    let height = tree.measure(flow, Orientation::Vertical, Some(215)).unwrap();
    assert_eq!((height.minimum, height.natural), (45, 45), "two 20px lines and one gap");

    let width = tree.measure(flow, Orientation::Horizontal, None).unwrap();
    assert_eq!(width.minimum, 50, "one child per line at minimum");
    assert_eq!(width.natural, 215, "four children per line at natural size");
}

#[test]
fn test_children_are_placed_in_lines() {
    let (mut tree, flow, wrappers) = seven_children();
    allocated(&mut tree, flow);
    assert_eq!(tree.as_flow_box(flow).unwrap().line_length(), 4);

    let xs: Vec<i32> = wrappers[..4]
        .iter()
        .map(|child| tree.allocation(*child).unwrap().x)
        .collect();
    assert_eq!(xs, vec![0, 55, 110, 165]);
    assert_eq!(tree.allocation(wrappers[4]).unwrap(), Rect::new(0, 25, 50, 20));
    assert_eq!(tree.allocation(wrappers[6]).unwrap(), Rect::new(110, 25, 50, 20));
}

#[test]
fn test_wrapped_widget_fills_its_wrapper() {
    let (mut tree, flow, wrappers) = seven_children();
    allocated(&mut tree, flow);
    let leaf = tree.as_flow_box_child(wrappers[5]).unwrap().child().unwrap();
    assert_eq!(tree.allocation(leaf).unwrap(), tree.allocation(wrappers[5]).unwrap());
}

#[test]
fn test_homogeneous_children_share_one_width() {
    let mut tree = WidgetTree::new();
    let flow = tree.new_flow_box("flow");
    let mut wrappers = Vec::new();
    for (index, width) in [30, 50, 40, 45, 35].into_iter().enumerate() {
        let leaf = tree.new_leaf(format!("item{index}"), Leaf::fixed(width, 10));
        let mut handle = tree.flow_box_mut(flow).unwrap();
        handle.set_homogeneous(true).unwrap();
        wrappers.push(handle.insert(leaf, None).unwrap());
    }
    let _ = tree.allocate(flow, Rect::new(0, 0, 301, 10), None).unwrap();

    let widths: Vec<i32> = wrappers
        .iter()
        .map(|child| tree.allocation(*child).unwrap().width)
        .collect();
    let (narrowest, widest) = (widths.iter().min().unwrap(), widths.iter().max().unwrap());
    assert!(widest - narrowest <= 1, "widths {widths:?} differ by more than a pixel");
    assert!(*narrowest >= 50);
}

#[test]
fn test_allocation_is_idempotent() {
    let (mut tree, flow, wrappers) = seven_children();
    allocated(&mut tree, flow);
    let first: Vec<Rect> = wrappers.iter().map(|c| tree.allocation(*c).unwrap()).collect();
    allocated(&mut tree, flow);
    let second: Vec<Rect> = wrappers.iter().map(|c| tree.allocation(*c).unwrap()).collect();
    assert_eq!(first, second);
}

#[test]
fn test_negative_spacing_is_rejected() {
    let (mut tree, flow, _) = seven_children();
    let err = tree.flow_box_mut(flow).unwrap().set_row_spacing(-1).unwrap_err();
    assert!(matches!(err, LayoutError::Precondition(_)));
    assert_eq!(tree.as_flow_box(flow).unwrap().row_spacing(), 5);
}

// ========== filtering and sorting ==========

#[test]
fn test_filtered_children_are_skipped() {
    let (mut tree, flow, wrappers) = seven_children();
    tree.flow_box_mut(flow)
        .unwrap()
        .set_filter_func(Some(Box::new(|tree: &WidgetTree, child: WidgetId| {
            tree.name(child) != "item1-child"
        })))
        .unwrap();
    assert!(!tree.is_drawable(wrappers[1]));

    allocated(&mut tree, flow);
    assert_eq!(tree.allocation(wrappers[2]).unwrap().x, 55, "moves into the hidden slot");
    assert_eq!(tree.allocation(wrappers[5]).unwrap().y, 25);

    tree.flow_box_mut(flow).unwrap().set_filter_func(None).unwrap();
    assert!(tree.is_drawable(wrappers[1]));
}

#[test]
fn test_sort_orders_children_and_is_idempotent() {
    let (mut tree, flow, wrappers) = seven_children();
    tree.flow_box_mut(flow)
        .unwrap()
        .set_sort_func(Some(Box::new(|tree: &WidgetTree, a: WidgetId, b: WidgetId| {
            tree.name(b).cmp(&tree.name(a))
        })))
        .unwrap();
    let sorted: Vec<WidgetId> = tree.as_flow_box(flow).unwrap().children().iter().collect();
    let mut reversed = wrappers;
    reversed.reverse();
    assert_eq!(sorted, reversed);

    tree.flow_box_mut(flow).unwrap().invalidate_sort().unwrap();
    let again: Vec<WidgetId> = tree.as_flow_box(flow).unwrap().children().iter().collect();
    assert_eq!(again, sorted);
}

#[test]
fn test_sorted_insert_ignores_position() {
    let (mut tree, flow, _) = seven_children();
    tree.flow_box_mut(flow)
        .unwrap()
        .set_sort_func(Some(Box::new(|tree: &WidgetTree, a: WidgetId, b: WidgetId| {
            tree.name(a).cmp(&tree.name(b))
        })))
        .unwrap();
    let late = tree.new_leaf("item9", Leaf::fixed(50, 20));
    let wrapper = tree.flow_box_mut(flow).unwrap().insert(late, Some(0)).unwrap();
    assert_eq!(tree.as_flow_box(flow).unwrap().child_index(wrapper), Some(7));
}

#[test]
fn test_bound_model_drives_the_children() {
    let mut tree = WidgetTree::new();
    let flow = tree.new_flow_box("flow");
    let items: Vec<ModelItem> = vec![Rc::new(1_i32), Rc::new(2_i32), Rc::new(3_i32)];
    let model = Rc::new(VecModel::new(items));
    let create: CreateWidget = Box::new(|tree: &mut WidgetTree, item: &ModelItem| {
        let n = item.downcast_ref::<i32>().copied().unwrap_or_default();
        tree.new_leaf(format!("item{n}"), Leaf::fixed(10, 10))
    });
    let shared: Rc<dyn ListModel> = model.clone();
    tree.flow_box_mut(flow).unwrap().bind_model(Some((shared, create))).unwrap();
    assert!(tree.as_flow_box(flow).unwrap().is_bound());
    assert_eq!(tree.as_flow_box(flow).unwrap().children().len(), 3);

    model.splice(1, 1, vec![Rc::new(20_i32), Rc::new(21_i32)]);
    tree.flow_box_mut(flow).unwrap().model_items_changed(1, 1, 2).unwrap();
    let names: Vec<String> = tree
        .as_flow_box(flow)
        .unwrap()
        .children()
        .iter()
        .map(|child| tree.name(child))
        .collect();
    assert_eq!(names, ["item1-child", "item20-child", "item21-child", "item3-child"]);

    tree.flow_box_mut(flow).unwrap().bind_model(None).unwrap();
    assert!(tree.as_flow_box(flow).unwrap().children().is_empty());
}

#[test]
fn test_model_changes_free_the_replaced_children() {
    let mut tree = WidgetTree::new();
    let flow = tree.new_flow_box("flow");
    let items: Vec<ModelItem> = vec![Rc::new(1_i32), Rc::new(2_i32), Rc::new(3_i32)];
    let model = Rc::new(VecModel::new(items));
    let create: CreateWidget = Box::new(|tree: &mut WidgetTree, item: &ModelItem| {
        let n = item.downcast_ref::<i32>().copied().unwrap_or_default();
        tree.new_leaf(format!("item{n}"), Leaf::fixed(10, 10))
    });
    let shared: Rc<dyn ListModel> = model.clone();
    tree.flow_box_mut(flow).unwrap().bind_model(Some((shared, create))).unwrap();
    assert_eq!(tree.len(), 7, "the box plus a wrapper and a leaf per item");

    for _ in 0..10 {
        tree.flow_box_mut(flow).unwrap().model_items_changed(0, 3, 3).unwrap();
    }
    assert_eq!(tree.len(), 7);

    tree.flow_box_mut(flow).unwrap().bind_model(None).unwrap();
    assert_eq!(tree.len(), 1);
}

// ========== selection ==========

#[test]
fn test_single_mode_replaces_the_selection() {
    let (mut tree, flow, wrappers) = seven_children();
    let mut handle = tree.flow_box_mut(flow).unwrap();
    handle.select_child(wrappers[0]).unwrap();
    handle.select_child(wrappers[3]).unwrap();
    assert_eq!(tree.as_flow_box(flow).unwrap().selected_children(), vec![wrappers[3]]);
}

#[test]
fn test_none_mode_selects_nothing() {
    let (mut tree, flow, wrappers) = seven_children();
    let mut handle = tree.flow_box_mut(flow).unwrap();
    handle.set_selection_mode(SelectionMode::None).unwrap();
    handle.select_child(wrappers[0]).unwrap();
    assert!(tree.as_flow_box(flow).unwrap().selected_children().is_empty());
}

#[test]
fn test_browse_mode_keeps_its_selection() {
    let (mut tree, flow, wrappers) = seven_children();
    let mut handle = tree.flow_box_mut(flow).unwrap();
    handle.set_selection_mode(SelectionMode::Browse).unwrap();
    handle.select_child(wrappers[2]).unwrap();
    handle.unselect_child(wrappers[2]).unwrap();
    handle.unselect_all().unwrap();
    assert!(tree.as_flow_box(flow).unwrap().is_selected(wrappers[2]));
}

#[test]
fn test_select_all_needs_multiple_mode() {
    let (mut tree, flow, _) = seven_children();
    let mut handle = tree.flow_box_mut(flow).unwrap();
    handle.select_all().unwrap();
    assert!(tree.as_flow_box(flow).unwrap().selected_children().is_empty());

    let mut handle = tree.flow_box_mut(flow).unwrap();
    handle.set_selection_mode(SelectionMode::Multiple).unwrap();
    handle.select_all().unwrap();
    assert_eq!(tree.as_flow_box(flow).unwrap().selected_children().len(), 7);

    tree.flow_box_mut(flow).unwrap().set_selection_mode(SelectionMode::Single).unwrap();
    assert!(
        tree.as_flow_box(flow).unwrap().selected_children().is_empty(),
        "leaving multiple mode clears"
    );
}

#[test]
fn test_selection_changes_are_observed() {
    let (mut tree, flow, wrappers) = seven_children();
    let count = Rc::new(RefCell::new(0));
    let seen = Rc::clone(&count);
    let mut handle = tree.flow_box_mut(flow).unwrap();
    let id = handle
        .connect_selected_children_changed(move |_| *seen.borrow_mut() += 1)
        .unwrap();
    handle.select_child(wrappers[0]).unwrap();
    handle.select_child(wrappers[0]).unwrap();
    assert_eq!(*count.borrow(), 1, "selecting a selected child changes nothing");

    assert!(handle.disconnect(id).unwrap());
    handle.unselect_child(wrappers[0]).unwrap();
    assert_eq!(*count.borrow(), 1);
}

#[test]
fn test_removing_a_selected_child_updates_the_selection() {
    let (mut tree, flow, wrappers) = seven_children();
    let mut handle = tree.flow_box_mut(flow).unwrap();
    handle.select_child(wrappers[1]).unwrap();
    handle.remove(wrappers[1]).unwrap();
    assert!(tree.as_flow_box(flow).unwrap().selected_children().is_empty());
    assert_eq!(tree.parent(wrappers[1]), None);
}

#[test]
fn test_removing_the_inserted_widget_restores_the_order() {
    let (mut tree, flow, wrappers) = seven_children();
    let widget = tree.new_leaf("late", Leaf::fixed(50, 20));
    let len = tree.len();

    let wrapper = tree.flow_box_mut(flow).unwrap().insert(widget, Some(2)).unwrap();
    assert_eq!(tree.as_flow_box(flow).unwrap().child_index(wrapper), Some(2));
    tree.flow_box_mut(flow).unwrap().remove(widget).unwrap();

    assert_eq!(tree.as_flow_box(flow).unwrap().children().as_slice(), wrappers.as_slice());
    assert_eq!(tree.parent(widget), None);
    assert!(!tree.contains(wrapper), "the wrapper the box built is gone");
    assert_eq!(tree.len(), len);

    let again = tree.flow_box_mut(flow).unwrap().insert(widget, None).unwrap();
    assert_eq!(tree.bin_child(again).unwrap(), Some(widget), "free to go back in");
}

#[test]
fn test_removing_a_stranger_is_rejected() {
    let (mut tree, flow, _) = seven_children();
    let stranger = tree.new_leaf("stranger", Leaf::fixed(10, 10));
    assert!(matches!(
        tree.flow_box_mut(flow).unwrap().remove(stranger),
        Err(LayoutError::Precondition(_))
    ));
}

// ========== pointer ==========

#[test]
fn test_click_activates_and_selects() {
    let (mut tree, flow, wrappers) = seven_children();
    allocated(&mut tree, flow);
    let activated = Rc::new(RefCell::new(Vec::new()));
    let log = Rc::clone(&activated);
    let mut handle = tree.flow_box_mut(flow).unwrap();
    let _ = handle
        .connect_child_activated(move |child| log.borrow_mut().push(*child))
        .unwrap();

    handle.press(60, 30, 1).unwrap();
    handle.release(60, 30, Modifiers::NONE).unwrap();
    assert_eq!(*activated.borrow(), vec![wrappers[5]]);
    let state = tree.as_flow_box(flow).unwrap();
    assert_eq!(state.selected_children(), vec![wrappers[5]]);
    assert_eq!(state.cursor_child(), Some(wrappers[5]));
}

#[test]
fn test_release_elsewhere_does_nothing() {
    let (mut tree, flow, _) = seven_children();
    allocated(&mut tree, flow);
    let mut handle = tree.flow_box_mut(flow).unwrap();
    handle.press(10, 10, 1).unwrap();
    handle.release(120, 10, Modifiers::NONE).unwrap();
    assert!(tree.as_flow_box(flow).unwrap().selected_children().is_empty());
}

#[test]
fn test_double_click_activates_without_single_click() {
    let (mut tree, flow, wrappers) = seven_children();
    allocated(&mut tree, flow);
    let mut handle = tree.flow_box_mut(flow).unwrap();
    handle.set_activate_on_single_click(false).unwrap();
    handle.press(10, 10, 1).unwrap();
    handle.release(10, 10, Modifiers::NONE).unwrap();
    assert_eq!(tree.as_flow_box(flow).unwrap().selected_children(), vec![wrappers[0]]);

    let activated = Rc::new(RefCell::new(0));
    let count = Rc::clone(&activated);
    let mut handle = tree.flow_box_mut(flow).unwrap();
    let _ = handle.connect_child_activated(move |_| *count.borrow_mut() += 1).unwrap();
    handle.press(10, 10, 2).unwrap();
    assert_eq!(*activated.borrow(), 1);
}

#[test]
fn test_rubberband_selects_a_range() {
    let (mut tree, flow, wrappers) = seven_children();
    allocated(&mut tree, flow);
    let mut handle = tree.flow_box_mut(flow).unwrap();
    handle.set_selection_mode(SelectionMode::Multiple).unwrap();
    handle.drag_begin(10, 10, Modifiers::NONE).unwrap();
    handle.drag_update(3, 3).unwrap();
    assert!(!tree.as_flow_box(flow).unwrap().rubberband_active(), "below the start distance");

    let mut handle = tree.flow_box_mut(flow).unwrap();
    handle.drag_update(110, 30).unwrap();
    assert!(tree.as_flow_box(flow).unwrap().rubberband_active());
    tree.flow_box_mut(flow).unwrap().drag_end().unwrap();

    let selected = tree.as_flow_box(flow).unwrap().selected_children();
    assert_eq!(selected, wrappers[..=6].to_vec());
    assert!(!tree.as_flow_box(flow).unwrap().rubberband_active());
}

#[test]
fn test_huge_drag_offsets_start_the_rubberband() {
    let (mut tree, flow, wrappers) = seven_children();
    allocated(&mut tree, flow);
    let mut handle = tree.flow_box_mut(flow).unwrap();
    handle.set_selection_mode(SelectionMode::Multiple).unwrap();
    handle.select_child(wrappers[3]).unwrap();
    handle.drag_begin(10, 10, Modifiers::NONE).unwrap();
    handle.drag_update(i32::MAX, i32::MAX).unwrap();
    handle.drag_update(i32::MIN, i32::MIN).unwrap();
    handle.drag_end().unwrap();
    assert!(
        tree.as_flow_box(flow).unwrap().selected_children().is_empty(),
        "the band went active and replaced the selection"
    );
}

#[test]
fn test_rubberband_needs_multiple_mode() {
    let (mut tree, flow, _) = seven_children();
    allocated(&mut tree, flow);
    let mut handle = tree.flow_box_mut(flow).unwrap();
    handle.drag_begin(10, 10, Modifiers::NONE).unwrap();
    handle.drag_update(100, 20).unwrap();
    assert!(!tree.as_flow_box(flow).unwrap().rubberband_active());
}

#[test]
fn test_cancelled_rubberband_keeps_the_selection() {
    let (mut tree, flow, wrappers) = seven_children();
    allocated(&mut tree, flow);
    let mut handle = tree.flow_box_mut(flow).unwrap();
    handle.set_selection_mode(SelectionMode::Multiple).unwrap();
    handle.select_child(wrappers[3]).unwrap();
    handle.drag_begin(10, 10, Modifiers::NONE).unwrap();
    handle.drag_update(60, 0).unwrap();
    handle.cancel_rubberband().unwrap();
    handle.drag_end().unwrap();
    assert_eq!(tree.as_flow_box(flow).unwrap().selected_children(), vec![wrappers[3]]);
}

#[test]
fn test_autoscroll_past_the_visible_edge() {
    let (mut tree, flow, _) = seven_children();
    let adjustment = AdjustmentRef::new(0.0, 0.0, 100.0, 10.0, 40.0, 45.0);
    let mut handle = tree.flow_box_mut(flow).unwrap();
    handle.set_vadjustment(Some(adjustment.clone())).unwrap();
    handle.set_selection_mode(SelectionMode::Multiple).unwrap();
    allocated(&mut tree, flow);

    let mut handle = tree.flow_box_mut(flow).unwrap();
    handle.drag_begin(10, 10, Modifiers::NONE).unwrap();
    handle.drag_update(0, 60).unwrap();
    assert_eq!(tree.as_flow_box(flow).unwrap().autoscroll_mode(), ScrollType::StepForward);

    assert!(tree.flow_box_mut(flow).unwrap().autoscroll_tick().unwrap());
    assert!((adjustment.value() - 1.0).abs() < f64::EPSILON, "never less than the minimum increment");

    tree.flow_box_mut(flow).unwrap().drag_end().unwrap();
    assert_eq!(tree.as_flow_box(flow).unwrap().autoscroll_mode(), ScrollType::None);
}

// ========== keyboard ==========

#[test]
fn test_cursor_moves_by_positions_and_lines() {
    let (mut tree, flow, wrappers) = seven_children();
    allocated(&mut tree, flow);
    let mut handle = tree.flow_box_mut(flow).unwrap();

    assert!(handle.move_cursor(MovementStep::VisualPositions, 1, Modifiers::NONE).unwrap());
    assert_eq!(tree.as_flow_box(flow).unwrap().cursor_child(), Some(wrappers[0]));

    let mut handle = tree.flow_box_mut(flow).unwrap();
    assert!(handle.move_cursor(MovementStep::DisplayLines, 1, Modifiers::NONE).unwrap());
    assert_eq!(tree.as_flow_box(flow).unwrap().cursor_child(), Some(wrappers[4]));

    let mut handle = tree.flow_box_mut(flow).unwrap();
    assert!(handle.move_cursor(MovementStep::VisualPositions, 2, Modifiers::NONE).unwrap());
    assert_eq!(tree.as_flow_box(flow).unwrap().cursor_child(), Some(wrappers[6]));

    let mut handle = tree.flow_box_mut(flow).unwrap();
    assert!(!handle.move_cursor(MovementStep::VisualPositions, 1, Modifiers::NONE).unwrap(), "already last");
    assert!(handle.move_cursor(MovementStep::BufferEnds, -1, Modifiers::NONE).unwrap());
    let state = tree.as_flow_box(flow).unwrap();
    assert_eq!(state.cursor_child(), Some(wrappers[0]));
    assert_eq!(state.selected_children(), vec![wrappers[0]]);
}

#[test]
fn test_cursor_with_modify_leaves_the_selection() {
    let (mut tree, flow, wrappers) = seven_children();
    allocated(&mut tree, flow);
    let mut handle = tree.flow_box_mut(flow).unwrap();
    handle.select_child(wrappers[0]).unwrap();
    assert!(handle.move_cursor(MovementStep::BufferEnds, 1, Modifiers::MODIFY).unwrap());
    let state = tree.as_flow_box(flow).unwrap();
    assert_eq!(state.cursor_child(), Some(wrappers[6]));
    assert_eq!(state.selected_children(), vec![wrappers[0]]);
}

#[test]
fn test_cursor_with_extend_selects_a_range() {
    let (mut tree, flow, wrappers) = seven_children();
    allocated(&mut tree, flow);
    let mut handle = tree.flow_box_mut(flow).unwrap();
    handle.set_selection_mode(SelectionMode::Multiple).unwrap();
    assert!(handle.move_cursor(MovementStep::VisualPositions, 1, Modifiers::NONE).unwrap());
    assert!(handle.move_cursor(MovementStep::VisualPositions, 2, Modifiers::EXTEND).unwrap());
    assert_eq!(tree.as_flow_box(flow).unwrap().selected_children(), wrappers[..3].to_vec());
}
