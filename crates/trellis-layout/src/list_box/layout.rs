use crate::error::Result;
use crate::geometry::Rect;
use crate::tree::{Placement, WidgetTree};
use crate::types::Orientation;
use crate::widget::{Measurement, WidgetId};

use super::ListBox;

/// Drawable widgets of the list in layout order, paired with the row they
/// belong to (`None` for headers and the placeholder).
fn laid_out(tree: &WidgetTree, state: &ListBox) -> Vec<(WidgetId, Option<WidgetId>)> {
    let mut widgets = Vec::new();
    if let Some(placeholder) = state.placeholder.filter(|p| tree.is_drawable(*p)) {
        widgets.push((placeholder, None));
    }
    for row in state.visible_rows(tree) {
        if let Some(header) = state.row_header(row).filter(|h| tree.is_drawable(*h)) {
            widgets.push((header, None));
        }
        widgets.push((row, Some(row)));
    }
    widgets
}

fn width(tree: &WidgetTree, state: &ListBox) -> Result<Measurement> {
    let mut measured = Measurement::default();
    for (widget, _) in laid_out(tree, state) {
        let child = tree.measure(widget, Orientation::Horizontal, None)?;
        measured.minimum = measured.minimum.max(child.minimum);
        measured.natural = measured.natural.max(child.natural);
    }
    Ok(measured)
}

/// Rows and headers stack at their minimum height for `width`, so the
/// natural height equals the minimum.
fn height_for_width(tree: &WidgetTree, state: &ListBox, width: i32) -> Result<i32> {
    let mut height = 0;
    for (widget, _) in laid_out(tree, state) {
        height += tree.measure(widget, Orientation::Vertical, Some(width))?.minimum;
    }
    Ok(height)
}

pub(crate) fn measure(
    tree: &WidgetTree,
    state: &ListBox,
    orientation: Orientation,
    for_size: Option<i32>,
) -> Result<Measurement> {
    let measured = match orientation {
        Orientation::Horizontal => width(tree, state)?,
        Orientation::Vertical => {
            let width = match for_size {
                Some(width) => width,
                None => width(tree, state)?.natural,
            };
            let height = height_for_width(tree, state, width)?;
            Measurement::new(height, height)
        }
    };

    #[cfg(feature = "layout-trace")]
    tracing::trace!(target: "trellis::listbox", %orientation, ?for_size, ?measured, "measure");

    Ok(measured)
}

pub(crate) fn allocate(tree: &mut WidgetTree, id: WidgetId, content: Rect) -> Result<Rect> {
    let view: &WidgetTree = tree;
    let state = view.as_list_box(id)?;
    let mut placements = Vec::new();
    let mut rows = Vec::new();
    let mut y = 0;
    for (widget, row) in laid_out(view, state) {
        let height = view
            .measure(widget, Orientation::Vertical, Some(content.width))?
            .minimum;
        // The placeholder spans the whole list but only pushes rows down by
        // its minimum height.
        let slot = if Some(widget) == state.placeholder {
            content.height.max(height)
        } else {
            height
        };
        placements.push(Placement::new(
            widget,
            Rect::new(content.x, content.y + y, content.width, slot),
            None,
        ));
        if let Some(row) = row {
            rows.push((row, y, height));
        }
        y += height;
    }

    #[cfg(feature = "layout-trace")]
    tracing::trace!(target: "trellis::listbox", rows = rows.len(), height = y, "allocate");

    for &(row, y, height) in &rows {
        let state = tree.list_box_row_state_mut(row)?;
        state.y = y;
        state.height = height;
    }
    tree.list_box_state_mut(id)?.row_offsets = rows;
    tree.allocate_placements(&placements)
}
