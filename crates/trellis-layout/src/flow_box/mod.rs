//! Reflowing layout.
//!
//! A flow box places its children in lines along its orientation and wraps
//! to a new line when the current one is full. Every child is wrapped in a
//! [`FlowBoxChild`]; the wrappers are the entries of the box's
//! [`Sequence`] and the unit of selection, filtering and sorting.
//!
//! Lines are *aligned*: child `i` always sits in column `i mod n` where `n`
//! is the line length, so columns line up across lines.

mod interaction;
mod layout;

use std::cmp::Ordering;
use std::rc::Rc;

use rustc_hash::FxHashMap;
use trellis_common::warn_once;
use trellis_tree::Sequence;

use crate::adjustment::AdjustmentRef;
use crate::error::{Result, precondition};
use crate::geometry::Rect;
use crate::model::{self, CreateWidget, FilterFunc, ListModel, ModelBinding, Origin, SortFunc};
use crate::observer::{ObserverId, Observers};
use crate::selection::Selection;
use crate::tree::WidgetTree;
use crate::types::{Modifiers, Orientation, ScrollType, SelectionMode};
use crate::widget::{WidgetId, WidgetType};

pub(crate) use layout::{allocate, measure};

/// Default upper bound on children per line.
pub const DEFAULT_MAX_CHILDREN_PER_LINE: usize = 7;

/// Squared pointer travel after which a drag starts a rubber-band selection.
pub const RUBBERBAND_START_DISTANCE: i32 = 32;

/// How far a page-wise cursor move travels when no adjustment is set.
pub const DEFAULT_PAGE_SIZE: i32 = 100;

/// Autoscroll speed while a rubber band is dragged past the visible edge.
///
/// Within `fast_distance` of the edge each tick moves the adjustment by
/// `step_increment / step_factor`; further out by
/// `page_increment / page_factor`. A tick never moves less than
/// `min_increment`.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct AutoscrollConfig {
    /// Distance past the edge at which scrolling switches to page speed.
    pub fast_distance: i32,
    /// Divisor applied to the step increment.
    pub step_factor: f64,
    /// Divisor applied to the page increment.
    pub page_factor: f64,
    /// Smallest movement per tick.
    pub min_increment: f64,
}

impl Default for AutoscrollConfig {
    fn default() -> Self {
        Self {
            fast_distance: 32,
            step_factor: 20.0,
            page_factor: 10.0,
            min_increment: 1.0,
        }
    }
}

/// Wrapper around one flow box entry.
#[derive(Debug, Default)]
pub struct FlowBoxChild {
    child: Option<WidgetId>,
}

impl FlowBoxChild {
    /// The wrapped widget.
    #[must_use]
    pub const fn child(&self) -> Option<WidgetId> {
        self.child
    }

    pub(crate) const fn set_child(&mut self, child: Option<WidgetId>) {
        self.child = child;
    }
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct Rubberband {
    /// Drag origin, relative to the content box.
    pub origin: (i32, i32),
    /// Current pointer offset from `origin`.
    pub offset: (i32, i32),
    pub active: bool,
    pub first: Option<WidgetId>,
    pub last: Option<WidgetId>,
    pub modifiers: Modifiers,
}

/// State of a flow box.
pub struct FlowBox {
    orientation: Orientation,
    homogeneous: bool,
    row_spacing: i32,
    column_spacing: i32,
    min_children_per_line: usize,
    max_children_per_line: usize,
    activate_on_single_click: bool,
    children: Sequence<WidgetId>,
    /// Children the box built itself.
    origins: FxHashMap<WidgetId, Origin>,
    selection: Selection,
    cursor: Option<WidgetId>,
    active: Option<WidgetId>,
    filter: Option<FilterFunc>,
    sort: Option<SortFunc>,
    binding: Option<ModelBinding>,
    hadjustment: Option<AdjustmentRef>,
    vadjustment: Option<AdjustmentRef>,
    rubberband: Option<Rubberband>,
    autoscroll: ScrollType,
    autoscroll_config: AutoscrollConfig,
    content: Rect,
    line_length: usize,
    child_activated: Observers<WidgetId>,
    selected_children_changed: Observers<()>,
}

impl Default for FlowBox {
    fn default() -> Self {
        Self {
            orientation: Orientation::Horizontal,
            homogeneous: false,
            row_spacing: 0,
            column_spacing: 0,
            min_children_per_line: 1,
            max_children_per_line: DEFAULT_MAX_CHILDREN_PER_LINE,
            activate_on_single_click: true,
            children: Sequence::new(),
            origins: FxHashMap::default(),
            selection: Selection::default(),
            cursor: None,
            active: None,
            filter: None,
            sort: None,
            binding: None,
            hadjustment: None,
            vadjustment: None,
            rubberband: None,
            autoscroll: ScrollType::None,
            autoscroll_config: AutoscrollConfig::default(),
            content: Rect::default(),
            line_length: 1,
            child_activated: Observers::default(),
            selected_children_changed: Observers::default(),
        }
    }
}

impl std::fmt::Debug for FlowBox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FlowBox")
            .field("orientation", &self.orientation)
            .field("homogeneous", &self.homogeneous)
            .field("children", &self.children.len())
            .field("selection_mode", &self.selection.mode())
            .field("has_filter", &self.filter.is_some())
            .field("has_sort", &self.sort.is_some())
            .field("binding", &self.binding)
            .finish_non_exhaustive()
    }
}

impl FlowBox {
    /// Direction lines run in.
    #[must_use]
    pub const fn orientation(&self) -> Orientation {
        self.orientation
    }

    /// Whether every child gets the same size.
    #[must_use]
    pub const fn homogeneous(&self) -> bool {
        self.homogeneous
    }

    /// Space between rows.
    #[must_use]
    pub const fn row_spacing(&self) -> i32 {
        self.row_spacing
    }

    /// Space between columns.
    #[must_use]
    pub const fn column_spacing(&self) -> i32 {
        self.column_spacing
    }

    /// Fewest children per line.
    #[must_use]
    pub const fn min_children_per_line(&self) -> usize {
        self.min_children_per_line
    }

    /// Most children per line.
    #[must_use]
    pub const fn max_children_per_line(&self) -> usize {
        self.max_children_per_line
    }

    /// Whether a single click activates a child.
    #[must_use]
    pub const fn activate_on_single_click(&self) -> bool {
        self.activate_on_single_click
    }

    /// Selection policy.
    #[must_use]
    pub const fn selection_mode(&self) -> SelectionMode {
        self.selection.mode()
    }

    /// The wrapper children, including filtered and hidden ones.
    #[must_use]
    pub const fn children(&self) -> &Sequence<WidgetId> {
        &self.children
    }

    /// The wrapper at `index`.
    #[must_use]
    pub fn child_at_index(&self, index: usize) -> Option<WidgetId> {
        self.children.get(index)
    }

    /// Index of a wrapper.
    #[must_use]
    pub fn child_index(&self, child: WidgetId) -> Option<usize> {
        self.children.position(child)
    }

    /// Whether a wrapper is selected.
    #[must_use]
    pub fn is_selected(&self, child: WidgetId) -> bool {
        self.selection.is_selected(child)
    }

    /// Selected wrappers in sequence order.
    #[must_use]
    pub fn selected_children(&self) -> Vec<WidgetId> {
        self.selection.selected_in(self.children.iter())
    }

    /// The keyboard cursor.
    #[must_use]
    pub const fn cursor_child(&self) -> Option<WidgetId> {
        self.cursor
    }

    /// Children per line at the last allocation.
    #[must_use]
    pub const fn line_length(&self) -> usize {
        self.line_length
    }

    /// Horizontal adjustment used for paging and autoscroll.
    #[must_use]
    pub const fn hadjustment(&self) -> Option<&AdjustmentRef> {
        self.hadjustment.as_ref()
    }

    /// Vertical adjustment used for paging and autoscroll.
    #[must_use]
    pub const fn vadjustment(&self) -> Option<&AdjustmentRef> {
        self.vadjustment.as_ref()
    }

    /// Autoscroll speed settings.
    #[must_use]
    pub const fn autoscroll_config(&self) -> AutoscrollConfig {
        self.autoscroll_config
    }

    /// The scroll action the next autoscroll tick performs.
    #[must_use]
    pub const fn autoscroll_mode(&self) -> ScrollType {
        self.autoscroll
    }

    /// Whether a rubber-band selection is in progress.
    #[must_use]
    pub fn rubberband_active(&self) -> bool {
        self.rubberband.is_some_and(|band| band.active)
    }

    /// Whether a list model drives the children.
    #[must_use]
    pub const fn is_bound(&self) -> bool {
        self.binding.is_some()
    }

    /// The visible wrapper whose allocation contains `(x, y)`, relative to
    /// the flow box's content box.
    #[must_use]
    pub fn child_at_pos(&self, tree: &WidgetTree, x: i32, y: i32) -> Option<WidgetId> {
        let (x, y) = (self.content.x.saturating_add(x), self.content.y.saturating_add(y));
        self.children.iter().find(|child| {
            tree.is_drawable(*child)
                && tree
                    .allocation(*child)
                    .is_ok_and(|rect| rect.contains(x, y))
        })
    }

    /// The adjustment scrolling across lines.
    fn line_adjustment(&self) -> Option<&AdjustmentRef> {
        match self.orientation {
            Orientation::Horizontal => self.vadjustment.as_ref(),
            Orientation::Vertical => self.hadjustment.as_ref(),
        }
    }

    /// Visible wrappers in order; the units of navigation and selection.
    fn focusable(&self, tree: &WidgetTree) -> Vec<WidgetId> {
        self.children
            .iter()
            .filter(|child| tree.is_drawable(*child))
            .collect()
    }
}

/// Mutable access to a flow box.
#[derive(Debug)]
pub struct FlowBoxMut<'t> {
    tree: &'t mut WidgetTree,
    id: WidgetId,
}

impl WidgetTree {
    /// Mutate a flow box.
    ///
    /// # Errors
    ///
    /// [`LayoutError::WrongKind`](crate::LayoutError::WrongKind) if `id` is
    /// not a flow box.
    pub fn flow_box_mut(&mut self, id: WidgetId) -> Result<FlowBoxMut<'_>> {
        let _ = self.as_flow_box(id)?;
        Ok(FlowBoxMut { tree: self, id })
    }
}

impl FlowBoxMut<'_> {
    fn state(&self) -> Result<&FlowBox> {
        self.tree.as_flow_box(self.id)
    }

    fn state_mut(&mut self) -> Result<&mut FlowBox> {
        self.tree.flow_box_state_mut(self.id)
    }

    /// Insert `widget` at `position` (`None` appends), wrapping it in a
    /// [`FlowBoxChild`] unless it is one. With a sort function the position
    /// is ignored. Returns the wrapper.
    ///
    /// # Errors
    ///
    /// A precondition error if `widget` already has a parent.
    pub fn insert(&mut self, widget: WidgetId, position: Option<usize>) -> Result<WidgetId> {
        self.insert_child(widget, position, false)
    }

    /// Children created for a bound model keep the model's order and skip
    /// the filter.
    fn insert_child(&mut self, widget: WidgetId, position: Option<usize>, from_model: bool) -> Result<WidgetId> {
        if self.tree.parent(widget).is_some() {
            return Err(precondition(
                "flowbox",
                format!("'{}' already has a parent", self.tree.name(widget)),
            ));
        }
        let wrapper = if self.tree.widget_type(widget)? == WidgetType::FlowBoxChild {
            widget
        } else {
            let name = format!("{}-child", self.tree.name(widget));
            let wrapper = self.tree.new_flow_box_child(name);
            self.tree.set_bin_child(wrapper, Some(widget))?;
            wrapper
        };
        self.tree.adopt(self.id, wrapper, "flowbox")?;

        let view: &WidgetTree = self.tree;
        let state = view.as_flow_box(self.id)?;
        let position = match (&state.sort, &state.binding) {
            (Some(sort), None) if !from_model => Some(
                state
                    .children
                    .as_slice()
                    .partition_point(|probe| sort(view, *probe, wrapper) != Ordering::Greater),
            ),
            _ => position,
        };
        let visible = match (&state.filter, &state.binding) {
            (Some(filter), None) if !from_model => filter(view, wrapper),
            _ => true,
        };
        let origin = if from_model {
            Some(Origin::Model)
        } else {
            (wrapper != widget).then_some(Origin::Wrapped)
        };
        let state = self.state_mut()?;
        let index = state.children.insert(wrapper, position);
        if let Some(origin) = origin {
            let _ = state.origins.insert(wrapper, origin);
        }
        self.tree.set_child_visible(wrapper, visible)?;
        tracing::debug!(target: "trellis::flowbox", index, visible, "inserted child");
        Ok(wrapper)
    }

    /// Remove a child, given either its wrapper or the widget that was
    /// inserted. A wrapper the box built is dropped and the inserted widget
    /// comes back without a parent.
    ///
    /// # Errors
    ///
    /// A precondition error if `child` is not in this flow box.
    pub fn remove(&mut self, child: WidgetId) -> Result<()> {
        remove(self.tree, self.id, child)
    }

    /// Set the direction lines run in.
    ///
    /// # Errors
    ///
    /// Only fails for stale handles.
    pub fn set_orientation(&mut self, orientation: Orientation) -> Result<()> {
        self.state_mut()?.orientation = orientation;
        Ok(())
    }

    /// Give every child the same size.
    ///
    /// # Errors
    ///
    /// Only fails for stale handles.
    pub fn set_homogeneous(&mut self, homogeneous: bool) -> Result<()> {
        self.state_mut()?.homogeneous = homogeneous;
        Ok(())
    }

    /// Space between rows.
    ///
    /// # Errors
    ///
    /// A precondition error for negative spacing.
    pub fn set_row_spacing(&mut self, spacing: i32) -> Result<()> {
        check_spacing(spacing)?;
        self.state_mut()?.row_spacing = spacing;
        Ok(())
    }

    /// Space between columns.
    ///
    /// # Errors
    ///
    /// A precondition error for negative spacing.
    pub fn set_column_spacing(&mut self, spacing: i32) -> Result<()> {
        check_spacing(spacing)?;
        self.state_mut()?.column_spacing = spacing;
        Ok(())
    }

    /// Fewest children per line; values below one act as one.
    ///
    /// # Errors
    ///
    /// Only fails for stale handles.
    pub fn set_min_children_per_line(&mut self, n: usize) -> Result<()> {
        self.state_mut()?.min_children_per_line = n;
        Ok(())
    }

    /// Most children per line; values below the minimum act as the minimum.
    ///
    /// # Errors
    ///
    /// Only fails for stale handles.
    pub fn set_max_children_per_line(&mut self, n: usize) -> Result<()> {
        self.state_mut()?.max_children_per_line = n;
        Ok(())
    }

    /// Activate children on a single click instead of a double click.
    ///
    /// # Errors
    ///
    /// Only fails for stale handles.
    pub fn set_activate_on_single_click(&mut self, single: bool) -> Result<()> {
        self.state_mut()?.activate_on_single_click = single;
        Ok(())
    }

    /// Change the selection policy. Entering `None` or leaving `Multiple`
    /// clears the selection.
    ///
    /// # Errors
    ///
    /// Only fails for stale handles.
    pub fn set_selection_mode(&mut self, mode: SelectionMode) -> Result<()> {
        let state = self.state_mut()?;
        if state.selection.set_mode(mode) {
            state.selected_children_changed.emit(&());
        }
        Ok(())
    }

    /// Autoscroll speed settings.
    ///
    /// # Errors
    ///
    /// Only fails for stale handles.
    pub fn set_autoscroll_config(&mut self, config: AutoscrollConfig) -> Result<()> {
        self.state_mut()?.autoscroll_config = config;
        Ok(())
    }

    /// Horizontal adjustment of the surrounding scroller.
    ///
    /// # Errors
    ///
    /// Only fails for stale handles.
    pub fn set_hadjustment(&mut self, adjustment: Option<AdjustmentRef>) -> Result<()> {
        self.state_mut()?.hadjustment = adjustment;
        Ok(())
    }

    /// Vertical adjustment of the surrounding scroller.
    ///
    /// # Errors
    ///
    /// Only fails for stale handles.
    pub fn set_vadjustment(&mut self, adjustment: Option<AdjustmentRef>) -> Result<()> {
        self.state_mut()?.vadjustment = adjustment;
        Ok(())
    }

    /// Set the filter and re-filter every child. Ignored while a model is
    /// bound.
    ///
    /// # Errors
    ///
    /// Only fails for stale handles.
    pub fn set_filter_func(&mut self, filter: Option<FilterFunc>) -> Result<()> {
        let state = self.state_mut()?;
        if state.binding.is_some() && filter.is_some() {
            warn_once("flowbox", "filter function ignored while a list model is bound");
        }
        state.filter = filter;
        self.invalidate_filter()
    }

    /// Set the sort function and re-sort. Ignored while a model is bound.
    ///
    /// # Errors
    ///
    /// Only fails for stale handles.
    pub fn set_sort_func(&mut self, sort: Option<SortFunc>) -> Result<()> {
        let state = self.state_mut()?;
        if state.binding.is_some() && sort.is_some() {
            warn_once("flowbox", "sort function ignored while a list model is bound");
        }
        state.sort = sort;
        self.invalidate_sort()
    }

    /// Run the filter on every child again.
    ///
    /// # Errors
    ///
    /// Only fails for stale handles.
    pub fn invalidate_filter(&mut self) -> Result<()> {
        let children: Vec<WidgetId> = self.state()?.children.iter().collect();
        self.refilter(&children)
    }

    fn refilter(&mut self, children: &[WidgetId]) -> Result<()> {
        let view: &WidgetTree = self.tree;
        let state = view.as_flow_box(self.id)?;
        let results: Vec<(WidgetId, bool)> = children
            .iter()
            .map(|child| {
                let visible = match (&state.filter, &state.binding) {
                    (Some(filter), None) => filter(view, *child),
                    _ => true,
                };
                (*child, visible)
            })
            .collect();
        for (child, visible) in results {
            self.tree.set_child_visible(child, visible)?;
        }
        Ok(())
    }

    /// Re-sort every child. Sorting is stable, so repeating it changes
    /// nothing.
    ///
    /// # Errors
    ///
    /// Only fails for stale handles.
    pub fn invalidate_sort(&mut self) -> Result<()> {
        let view: &WidgetTree = self.tree;
        let state = view.as_flow_box(self.id)?;
        let (Some(sort), None) = (&state.sort, &state.binding) else {
            return Ok(());
        };
        let mut order: Vec<WidgetId> = state.children.iter().collect();
        order.sort_by(|a, b| sort(view, *a, *b));
        self.state_mut()?.children = order.into_iter().collect();
        Ok(())
    }

    /// Re-filter and re-sort one child after its content changed.
    ///
    /// # Errors
    ///
    /// A precondition error if `child` is not in this flow box.
    pub fn child_changed(&mut self, child: WidgetId) -> Result<()> {
        if !self.state()?.children.contains(child) {
            return Err(self.tree.not_a_child("flowbox", self.id, child));
        }
        self.refilter(&[child])?;

        let view: &WidgetTree = self.tree;
        let state = view.as_flow_box(self.id)?;
        let (Some(sort), None) = (&state.sort, &state.binding) else {
            return Ok(());
        };
        let others: Vec<WidgetId> = state.children.iter().filter(|c| *c != child).collect();
        let position = others.partition_point(|probe| sort(view, *probe, child) != Ordering::Greater);
        let _ = self.state_mut()?.children.move_to(child, Some(position));
        Ok(())
    }

    /// Mirror `model`, creating one child per item with `create`. Existing
    /// children are removed. `None` unbinds and leaves the box empty.
    ///
    /// # Errors
    ///
    /// Propagates errors from removing or inserting children.
    pub fn bind_model(&mut self, binding: Option<(Rc<dyn ListModel>, CreateWidget)>) -> Result<()> {
        let children: Vec<WidgetId> = self.state()?.children.iter().collect();
        for child in children {
            self.remove(child)?;
        }
        let state = self.state_mut()?;
        state.binding = binding.map(|(model, create)| ModelBinding { model, create });
        if state.binding.is_some() && (state.filter.is_some() || state.sort.is_some()) {
            warn_once("flowbox", "filter and sort functions are ignored while a list model is bound");
        }
        let len = state.binding.as_ref().map_or(0, |binding| binding.model.len());
        self.model_items_changed(0, 0, len)
    }

    /// Apply a change of the bound model: `removed` children at `position`
    /// are dropped and `added` new ones created there.
    ///
    /// # Errors
    ///
    /// Propagates errors from removing or inserting children.
    pub fn model_items_changed(&mut self, position: usize, removed: usize, added: usize) -> Result<()> {
        let Some(mut binding) = self.state_mut()?.binding.take() else {
            return Ok(());
        };
        let result = self.apply_model_change(&mut binding, position, removed, added);
        self.state_mut()?.binding = Some(binding);
        result
    }

    fn apply_model_change(
        &mut self,
        binding: &mut ModelBinding,
        position: usize,
        removed: usize,
        added: usize,
    ) -> Result<()> {
        for _ in 0..removed {
            let Some(child) = self.state()?.children.get(position) else {
                break;
            };
            self.remove(child)?;
        }
        let widgets = model::create_widgets(self.tree, binding, position, added);
        for (offset, widget) in widgets.into_iter().enumerate() {
            let _ = self.insert_child(widget, Some(position + offset), true)?;
        }
        Ok(())
    }

    /// Notify when a child is activated.
    ///
    /// # Errors
    ///
    /// Only fails for stale handles.
    pub fn connect_child_activated<F>(&mut self, handler: F) -> Result<ObserverId>
    where
        F: FnMut(&WidgetId) + 'static,
    {
        Ok(self.state_mut()?.child_activated.connect(handler))
    }

    /// Notify when the set of selected children changes.
    ///
    /// # Errors
    ///
    /// Only fails for stale handles.
    pub fn connect_selected_children_changed<F>(&mut self, handler: F) -> Result<ObserverId>
    where
        F: FnMut(&()) + 'static,
    {
        Ok(self.state_mut()?.selected_children_changed.connect(handler))
    }

    /// Disconnect a handler from either notification.
    ///
    /// # Errors
    ///
    /// Only fails for stale handles.
    pub fn disconnect(&mut self, id: ObserverId) -> Result<bool> {
        let state = self.state_mut()?;
        Ok(state.child_activated.disconnect(id) || state.selected_children_changed.disconnect(id))
    }
}

fn check_spacing(spacing: i32) -> Result<()> {
    if spacing < 0 {
        return Err(precondition("flowbox", format!("spacing must be >= 0, got {spacing}")));
    }
    Ok(())
}

pub(crate) fn remove(tree: &mut WidgetTree, container: WidgetId, widget: WidgetId) -> Result<()> {
    let view: &WidgetTree = tree;
    let Some(child) = model::holder(view, &view.as_flow_box(container)?.children, widget) else {
        return Err(view.not_a_child("flowbox", container, widget));
    };
    let state = tree.flow_box_state_mut(container)?;
    let _ = state.children.remove(child);
    let origin = state.origins.remove(&child);
    let was_selected = state.selection.forget(child);
    if state.cursor == Some(child) {
        state.cursor = None;
    }
    if state.active == Some(child) {
        state.active = None;
    }
    if let Some(band) = state
        .rubberband
        .as_mut()
        .filter(|band| band.first == Some(child) || band.last == Some(child))
    {
        band.first = None;
        band.last = None;
    }
    if was_selected {
        state.selected_children_changed.emit(&());
    }
    tree.orphan(child)?;
    model::release(tree, child, origin)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::widget::Leaf;

    #[test]
    fn test_insert_wraps_plain_widgets() {
        let mut tree = WidgetTree::new();
        let flow = tree.new_flow_box("flow");
        let leaf = tree.new_leaf("leaf", Leaf::fixed(10, 10));
        let wrapper = tree
            .flow_box_mut(flow)
            .and_then(|mut f| f.insert(leaf, None))
            .expect("insert");
        assert_eq!(tree.widget_type(wrapper).ok(), Some(WidgetType::FlowBoxChild));
        assert_eq!(tree.bin_child(wrapper).ok().flatten(), Some(leaf));
        assert_eq!(tree.parent(wrapper), Some(flow));
    }

    #[test]
    fn test_default_autoscroll_config() {
        let config = AutoscrollConfig::default();
        assert_eq!(config.fast_distance, 32);
        assert!((config.step_factor - 20.0).abs() < f64::EPSILON);
    }
}
