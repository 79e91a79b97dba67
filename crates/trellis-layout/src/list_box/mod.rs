//! Vertical list of rows.
//!
//! Every child is wrapped in a [`ListBoxRow`]. A row may own a header
//! widget, produced by the header function, that is laid out right above
//! it. An optional placeholder is shown while no row is visible.

mod interaction;
mod layout;

use std::cmp::Ordering;
use std::fmt;
use std::rc::Rc;

use rustc_hash::FxHashMap;
use trellis_common::warn_once;
use trellis_tree::Sequence;

use crate::adjustment::AdjustmentRef;
use crate::error::{Result, precondition};
use crate::model::{self, CreateWidget, FilterFunc, ListModel, ModelBinding, Origin, SortFunc};
use crate::observer::{ObserverId, Observers};
use crate::selection::Selection;
use crate::tree::WidgetTree;
use crate::types::SelectionMode;
use crate::widget::{WidgetId, WidgetType};

pub(crate) use layout::{allocate, measure};

/// How far a page-wise cursor move travels when no adjustment is set.
pub const DEFAULT_PAGE_SIZE: i32 = 100;

/// Produces the header shown above `row`, given the previous visible row.
/// Returning the row's current header keeps it.
pub type HeaderFunc = Box<dyn FnMut(&mut WidgetTree, WidgetId, Option<WidgetId>) -> Option<WidgetId>>;

/// Runs instead of the `row-activated` notification for a row bound to an
/// action.
pub type RowAction = Box<dyn FnMut(WidgetId)>;

/// Wrapper around one list box entry.
pub struct ListBoxRow {
    child: Option<WidgetId>,
    selectable: bool,
    activatable: bool,
    action: Option<RowAction>,
    /// Offset from the list's content top at the last allocation.
    y: i32,
    height: i32,
}

impl Default for ListBoxRow {
    fn default() -> Self {
        Self {
            child: None,
            selectable: true,
            activatable: true,
            action: None,
            y: 0,
            height: 0,
        }
    }
}

impl fmt::Debug for ListBoxRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListBoxRow")
            .field("child", &self.child)
            .field("selectable", &self.selectable)
            .field("activatable", &self.activatable)
            .field("has_action", &self.action.is_some())
            .field("y", &self.y)
            .field("height", &self.height)
            .finish()
    }
}

impl ListBoxRow {
    /// The wrapped widget.
    #[must_use]
    pub const fn child(&self) -> Option<WidgetId> {
        self.child
    }

    pub(crate) const fn set_child(&mut self, child: Option<WidgetId>) {
        self.child = child;
    }

    /// Whether the row can be selected.
    #[must_use]
    pub const fn selectable(&self) -> bool {
        self.selectable
    }

    /// Whether activating the row does anything.
    #[must_use]
    pub const fn activatable(&self) -> bool {
        self.activatable
    }

    /// Whether an action replaces the `row-activated` notification.
    #[must_use]
    pub const fn has_action(&self) -> bool {
        self.action.is_some()
    }

    /// Top of the row relative to the list's content box, as of the last
    /// allocation.
    #[must_use]
    pub const fn y(&self) -> i32 {
        self.y
    }

    /// Height at the last allocation.
    #[must_use]
    pub const fn height(&self) -> i32 {
        self.height
    }
}

/// State of a list box.
pub struct ListBox {
    children: Sequence<WidgetId>,
    /// Rows the list built itself.
    origins: FxHashMap<WidgetId, Origin>,
    /// Row to its header.
    headers: FxHashMap<WidgetId, WidgetId>,
    /// Visible rows with their `y` and height at the last allocation.
    row_offsets: Vec<(WidgetId, i32, i32)>,
    /// Headers dropped during the current refresh. Freed at its end
    /// unless the header function handed them to another row.
    dropped_headers: Vec<WidgetId>,
    placeholder: Option<WidgetId>,
    header_func: Option<HeaderFunc>,
    filter: Option<FilterFunc>,
    sort: Option<SortFunc>,
    binding: Option<ModelBinding>,
    adjustment: Option<AdjustmentRef>,
    selection: Selection,
    cursor: Option<WidgetId>,
    active: Option<WidgetId>,
    activate_on_single_click: bool,
    row_selected: Observers<Option<WidgetId>>,
    row_activated: Observers<WidgetId>,
    selected_rows_changed: Observers<()>,
}

impl Default for ListBox {
    fn default() -> Self {
        Self {
            children: Sequence::new(),
            origins: FxHashMap::default(),
            headers: FxHashMap::default(),
            row_offsets: Vec::new(),
            dropped_headers: Vec::new(),
            placeholder: None,
            header_func: None,
            filter: None,
            sort: None,
            binding: None,
            adjustment: None,
            selection: Selection::default(),
            cursor: None,
            active: None,
            activate_on_single_click: true,
            row_selected: Observers::default(),
            row_activated: Observers::default(),
            selected_rows_changed: Observers::default(),
        }
    }
}

impl fmt::Debug for ListBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListBox")
            .field("rows", &self.children.len())
            .field("headers", &self.headers.len())
            .field("placeholder", &self.placeholder)
            .field("selection_mode", &self.selection.mode())
            .field("binding", &self.binding)
            .finish_non_exhaustive()
    }
}

impl ListBox {
    /// Every owned widget in drawing order: the placeholder, then each
    /// row's header followed by the row.
    #[must_use]
    pub fn forall(&self) -> Vec<WidgetId> {
        let mut all: Vec<WidgetId> = self.placeholder.into_iter().collect();
        for row in self.children.iter() {
            all.extend(self.headers.get(&row).copied());
            all.push(row);
        }
        all
    }

    /// The rows, including filtered and hidden ones.
    #[must_use]
    pub const fn rows(&self) -> &Sequence<WidgetId> {
        &self.children
    }

    /// The row at `index`.
    #[must_use]
    pub fn row_at_index(&self, index: usize) -> Option<WidgetId> {
        self.children.get(index)
    }

    /// Index of a row.
    #[must_use]
    pub fn row_index(&self, row: WidgetId) -> Option<usize> {
        self.children.position(row)
    }

    /// The header above `row`.
    #[must_use]
    pub fn row_header(&self, row: WidgetId) -> Option<WidgetId> {
        self.headers.get(&row).copied()
    }

    /// Widget shown while no row is visible.
    #[must_use]
    pub const fn placeholder(&self) -> Option<WidgetId> {
        self.placeholder
    }

    /// Selection policy.
    #[must_use]
    pub const fn selection_mode(&self) -> SelectionMode {
        self.selection.mode()
    }

    /// Whether a single click activates a row.
    #[must_use]
    pub const fn activate_on_single_click(&self) -> bool {
        self.activate_on_single_click
    }

    /// Adjustment used for paging.
    #[must_use]
    pub const fn adjustment(&self) -> Option<&AdjustmentRef> {
        self.adjustment.as_ref()
    }

    /// Whether a list model drives the rows.
    #[must_use]
    pub const fn is_bound(&self) -> bool {
        self.binding.is_some()
    }

    /// The keyboard cursor.
    #[must_use]
    pub const fn cursor_row(&self) -> Option<WidgetId> {
        self.cursor
    }

    /// Whether `row` is selected.
    #[must_use]
    pub fn is_selected(&self, row: WidgetId) -> bool {
        self.selection.is_selected(row)
    }

    /// The first selected row.
    #[must_use]
    pub fn selected_row(&self) -> Option<WidgetId> {
        self.children.iter().find(|row| self.selection.is_selected(*row))
    }

    /// Selected rows in list order.
    #[must_use]
    pub fn selected_rows(&self) -> Vec<WidgetId> {
        self.selection.selected_in(self.children.iter())
    }

    /// Visible rows in order.
    fn visible_rows(&self, tree: &WidgetTree) -> Vec<WidgetId> {
        self.children
            .iter()
            .filter(|row| tree.is_drawable(*row))
            .collect()
    }

    /// The visible row whose allocation covers `y`, relative to the content
    /// top. Binary search over the geometry of the last allocation.
    #[must_use]
    pub fn row_at_y(&self, tree: &WidgetTree, y: i32) -> Option<WidgetId> {
        let index = self
            .row_offsets
            .partition_point(|(_, top, height)| top + height <= y);
        self.row_offsets
            .get(index)
            .filter(|(row, top, _)| *top <= y && tree.is_drawable(*row))
            .map(|(row, _, _)| *row)
    }

    fn previous_visible(&self, tree: &WidgetTree, row: WidgetId) -> Option<WidgetId> {
        let mut current = self.children.prev(row);
        while let Some(candidate) = current {
            if tree.is_drawable(candidate) {
                return Some(candidate);
            }
            current = self.children.prev(candidate);
        }
        None
    }

    fn next_visible(&self, tree: &WidgetTree, row: WidgetId) -> Option<WidgetId> {
        let mut current = self.children.next(row);
        while let Some(candidate) = current {
            if tree.is_drawable(candidate) {
                return Some(candidate);
            }
            current = self.children.next(candidate);
        }
        None
    }

    fn filter_allows(&self, tree: &WidgetTree, row: WidgetId) -> bool {
        match (&self.filter, &self.binding) {
            (Some(filter), None) => filter(tree, row),
            _ => true,
        }
    }
}

/// Mutable access to a list box.
#[derive(Debug)]
pub struct ListBoxMut<'t> {
    tree: &'t mut WidgetTree,
    id: WidgetId,
}

impl WidgetTree {
    /// Mutate a list box.
    ///
    /// # Errors
    ///
    /// [`LayoutError::WrongKind`](crate::LayoutError::WrongKind) if `id` is
    /// not a list box.
    pub fn list_box_mut(&mut self, id: WidgetId) -> Result<ListBoxMut<'_>> {
        let _ = self.as_list_box(id)?;
        Ok(ListBoxMut { tree: self, id })
    }
}

impl ListBoxMut<'_> {
    fn state(&self) -> Result<&ListBox> {
        self.tree.as_list_box(self.id)
    }

    fn state_mut(&mut self) -> Result<&mut ListBox> {
        self.tree.list_box_state_mut(self.id)
    }

    fn check_row(&self, row: WidgetId) -> Result<()> {
        if self.state()?.children.contains(row) {
            Ok(())
        } else {
            Err(self.tree.not_a_child("listbox", self.id, row))
        }
    }

    /// Insert `widget` at `position` (`None` appends), wrapping it in a
    /// [`ListBoxRow`] unless it is one. With a sort function the position
    /// is ignored. Returns the row.
    ///
    /// # Errors
    ///
    /// A precondition error if `widget` already has a parent.
    pub fn insert(&mut self, widget: WidgetId, position: Option<usize>) -> Result<WidgetId> {
        self.insert_row(widget, position, false)
    }

    /// Rows created for a bound model keep the model's order and skip the
    /// filter.
    fn insert_row(&mut self, widget: WidgetId, position: Option<usize>, from_model: bool) -> Result<WidgetId> {
        if self.tree.parent(widget).is_some() {
            return Err(precondition(
                "listbox",
                format!("'{}' already has a parent", self.tree.name(widget)),
            ));
        }
        let row = if self.tree.widget_type(widget)? == WidgetType::ListBoxRow {
            widget
        } else {
            let name = format!("{}-row", self.tree.name(widget));
            let row = self.tree.new_list_box_row(name);
            self.tree.set_bin_child(row, Some(widget))?;
            row
        };
        self.tree.adopt(self.id, row, "listbox")?;

        let view: &WidgetTree = self.tree;
        let state = view.as_list_box(self.id)?;
        let position = match (&state.sort, &state.binding) {
            (Some(sort), None) if !from_model => Some(
                state
                    .children
                    .as_slice()
                    .partition_point(|probe| sort(view, *probe, row) != Ordering::Greater),
            ),
            _ => position,
        };
        let visible = from_model || state.filter_allows(view, row);
        let origin = if from_model {
            Some(Origin::Model)
        } else {
            (row != widget).then_some(Origin::Wrapped)
        };
        let state = self.state_mut()?;
        let index = state.children.insert(row, position);
        if let Some(origin) = origin {
            let _ = state.origins.insert(row, origin);
        }
        self.tree.set_child_visible(row, visible)?;
        tracing::debug!(target: "trellis::listbox", index, visible, "inserted row");

        self.update_header(row)?;
        let view: &WidgetTree = self.tree;
        if let Some(next) = view.as_list_box(self.id)?.next_visible(view, row) {
            self.update_header(next)?;
        }
        self.free_dropped_headers()?;
        self.update_placeholder()?;
        Ok(row)
    }

    /// Insert `widget` at the top.
    ///
    /// # Errors
    ///
    /// A precondition error if `widget` already has a parent.
    pub fn prepend(&mut self, widget: WidgetId) -> Result<WidgetId> {
        self.insert(widget, Some(0))
    }

    /// Remove a row, a header or the placeholder. A row may be named by
    /// the widget that was inserted; a row the list built is then dropped
    /// and the widget comes back without a parent.
    ///
    /// # Errors
    ///
    /// A precondition error if `child` does not belong to this list box.
    pub fn remove(&mut self, child: WidgetId) -> Result<()> {
        remove(self.tree, self.id, child)
    }

    /// Show `placeholder` while no row is visible. The previous one is
    /// unparented.
    ///
    /// # Errors
    ///
    /// A precondition error if `placeholder` already has a parent.
    pub fn set_placeholder(&mut self, placeholder: Option<WidgetId>) -> Result<()> {
        let previous = self.state()?.placeholder;
        if previous == placeholder {
            return Ok(());
        }
        if let Some(placeholder) = placeholder {
            self.tree.adopt(self.id, placeholder, "listbox")?;
        }
        if let Some(previous) = previous {
            self.tree.orphan(previous)?;
        }
        self.state_mut()?.placeholder = placeholder;
        self.update_placeholder()
    }

    fn update_placeholder(&mut self) -> Result<()> {
        let view: &WidgetTree = self.tree;
        let state = view.as_list_box(self.id)?;
        let Some(placeholder) = state.placeholder else {
            return Ok(());
        };
        let empty = state.visible_rows(view).is_empty();
        self.tree.set_child_visible(placeholder, empty)
    }

    /// Set the header function and recompute every header.
    ///
    /// # Errors
    ///
    /// Propagates errors from adopting the returned headers.
    pub fn set_header_func(&mut self, header_func: Option<HeaderFunc>) -> Result<()> {
        self.state_mut()?.header_func = header_func;
        self.invalidate_headers()
    }

    /// Run the header function for every row again.
    ///
    /// # Errors
    ///
    /// A precondition error if the function returns a widget that belongs
    /// elsewhere.
    pub fn invalidate_headers(&mut self) -> Result<()> {
        let rows: Vec<WidgetId> = self.state()?.children.iter().collect();
        for row in rows {
            self.update_header(row)?;
        }
        self.free_dropped_headers()
    }

    fn update_header(&mut self, row: WidgetId) -> Result<()> {
        let view: &WidgetTree = self.tree;
        let state = view.as_list_box(self.id)?;
        let old = state.row_header(row);
        let before = state.previous_visible(view, row);
        let new = if view.is_drawable(row) {
            let header_func = self.state_mut()?.header_func.take();
            match header_func {
                Some(mut header_func) => {
                    let header = header_func(self.tree, row, before);
                    self.state_mut()?.header_func = Some(header_func);
                    header
                }
                None => None,
            }
        } else {
            None
        };
        self.set_row_header(row, old, new)
    }

    fn set_row_header(&mut self, row: WidgetId, old: Option<WidgetId>, new: Option<WidgetId>) -> Result<()> {
        if old == new {
            return Ok(());
        }
        if let Some(old) = old {
            let state = self.state_mut()?;
            let _ = state.headers.remove(&row);
            let reused = state.headers.values().any(|header| *header == old);
            if !reused {
                state.dropped_headers.push(old);
                self.tree.orphan(old)?;
            }
        }
        if let Some(new) = new {
            let state = self.state_mut()?;
            let owner = state
                .headers
                .iter()
                .find(|(_, header)| **header == new)
                .map(|(owner, _)| *owner);
            match owner {
                Some(owner) => {
                    let _ = state.headers.remove(&owner);
                }
                None => self.tree.adopt(self.id, new, "listbox")?,
            }
            let _ = self.state_mut()?.headers.insert(row, new);
        }
        Ok(())
    }

    /// Destroy the headers dropped since the last call that no row took back.
    fn free_dropped_headers(&mut self) -> Result<()> {
        let dropped = std::mem::take(&mut self.state_mut()?.dropped_headers);
        for header in dropped {
            if self.tree.contains(header) && self.tree.parent(header).is_none() {
                self.tree.destroy(header)?;
            }
        }
        Ok(())
    }

    /// Set the filter and re-filter every row. Ignored while a model is
    /// bound.
    ///
    /// # Errors
    ///
    /// Propagates header function errors.
    pub fn set_filter_func(&mut self, filter: Option<FilterFunc>) -> Result<()> {
        let state = self.state_mut()?;
        if state.binding.is_some() && filter.is_some() {
            warn_once("listbox", "filter function ignored while a list model is bound");
        }
        state.filter = filter;
        self.invalidate_filter()
    }

    /// Set the sort function and re-sort. Ignored while a model is bound.
    ///
    /// # Errors
    ///
    /// Propagates header function errors.
    pub fn set_sort_func(&mut self, sort: Option<SortFunc>) -> Result<()> {
        let state = self.state_mut()?;
        if state.binding.is_some() && sort.is_some() {
            warn_once("listbox", "sort function ignored while a list model is bound");
        }
        state.sort = sort;
        self.invalidate_sort()
    }

    /// Run the filter on every row again.
    ///
    /// # Errors
    ///
    /// Propagates header function errors.
    pub fn invalidate_filter(&mut self) -> Result<()> {
        let rows: Vec<WidgetId> = self.state()?.children.iter().collect();
        self.refilter(&rows)?;
        self.invalidate_headers()?;
        self.update_placeholder()
    }

    fn refilter(&mut self, rows: &[WidgetId]) -> Result<()> {
        let view: &WidgetTree = self.tree;
        let state = view.as_list_box(self.id)?;
        let results: Vec<(WidgetId, bool)> = rows
            .iter()
            .map(|row| (*row, state.filter_allows(view, *row)))
            .collect();
        for (row, visible) in results {
            self.tree.set_child_visible(row, visible)?;
        }
        Ok(())
    }

    /// Re-sort every row. Sorting is stable, so repeating it changes
    /// nothing.
    ///
    /// # Errors
    ///
    /// Propagates header function errors.
    pub fn invalidate_sort(&mut self) -> Result<()> {
        let view: &WidgetTree = self.tree;
        let state = view.as_list_box(self.id)?;
        let (Some(sort), None) = (&state.sort, &state.binding) else {
            return Ok(());
        };
        let mut order: Vec<WidgetId> = state.children.iter().collect();
        order.sort_by(|a, b| sort(view, *a, *b));
        self.state_mut()?.children = order.into_iter().collect();
        self.invalidate_headers()
    }

    /// Re-filter, re-sort and refresh headers after `row`'s content
    /// changed.
    ///
    /// # Errors
    ///
    /// A precondition error if `row` is not in this list box.
    pub fn row_changed(&mut self, row: WidgetId) -> Result<()> {
        self.check_row(row)?;
        self.refilter(&[row])?;

        let view: &WidgetTree = self.tree;
        let state = view.as_list_box(self.id)?;
        if let (Some(sort), None) = (&state.sort, &state.binding) {
            let others: Vec<WidgetId> = state.children.iter().filter(|r| *r != row).collect();
            let position = others.partition_point(|probe| sort(view, *probe, row) != Ordering::Greater);
            let _ = self.state_mut()?.children.move_to(row, Some(position));
        }
        self.invalidate_headers()?;
        self.update_placeholder()
    }

    /// Whether `row` can be selected. Making a selected row unselectable
    /// unselects it.
    ///
    /// # Errors
    ///
    /// A precondition error if `row` is not in this list box.
    pub fn set_row_selectable(&mut self, row: WidgetId, selectable: bool) -> Result<()> {
        self.check_row(row)?;
        self.tree.list_box_row_state_mut(row)?.selectable = selectable;
        if !selectable {
            let changed = self.state_mut()?.selection.forget(row);
            self.emit_selection_changed(changed)?;
        }
        Ok(())
    }

    /// Whether activating `row` does anything.
    ///
    /// # Errors
    ///
    /// A precondition error if `row` is not in this list box.
    pub fn set_row_activatable(&mut self, row: WidgetId, activatable: bool) -> Result<()> {
        self.check_row(row)?;
        self.tree.list_box_row_state_mut(row)?.activatable = activatable;
        Ok(())
    }

    /// Run `action` when `row` is activated, instead of notifying
    /// `row-activated` observers.
    ///
    /// # Errors
    ///
    /// A precondition error if `row` is not in this list box.
    pub fn set_row_action(&mut self, row: WidgetId, action: Option<RowAction>) -> Result<()> {
        self.check_row(row)?;
        self.tree.list_box_row_state_mut(row)?.action = action;
        Ok(())
    }

    /// Adjustment used for page-wise cursor movement.
    ///
    /// # Errors
    ///
    /// Only fails for stale handles.
    pub fn set_adjustment(&mut self, adjustment: Option<AdjustmentRef>) -> Result<()> {
        self.state_mut()?.adjustment = adjustment;
        Ok(())
    }

    /// Activate rows on a single click instead of a double click.
    ///
    /// # Errors
    ///
    /// Only fails for stale handles.
    pub fn set_activate_on_single_click(&mut self, single: bool) -> Result<()> {
        self.state_mut()?.activate_on_single_click = single;
        Ok(())
    }

    /// Mirror `model`, creating one row per item with `create`. Existing
    /// rows are removed. `None` unbinds and leaves the list empty.
    ///
    /// # Errors
    ///
    /// Propagates errors from removing or inserting rows.
    pub fn bind_model(&mut self, binding: Option<(Rc<dyn ListModel>, CreateWidget)>) -> Result<()> {
        let rows: Vec<WidgetId> = self.state()?.children.iter().collect();
        for row in rows {
            self.remove(row)?;
        }
        let state = self.state_mut()?;
        state.binding = binding.map(|(model, create)| ModelBinding { model, create });
        if state.binding.is_some() && (state.filter.is_some() || state.sort.is_some()) {
            warn_once("listbox", "filter and sort functions are ignored while a list model is bound");
        }
        let len = state.binding.as_ref().map_or(0, |binding| binding.model.len());
        self.model_items_changed(0, 0, len)
    }

    /// Apply a change of the bound model: `removed` rows at `position` are
    /// dropped and `added` new ones created there.
    ///
    /// # Errors
    ///
    /// Propagates errors from removing or inserting rows.
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
            let Some(row) = self.state()?.children.get(position) else {
                break;
            };
            self.remove(row)?;
        }
        let widgets = model::create_widgets(self.tree, binding, position, added);
        for (offset, widget) in widgets.into_iter().enumerate() {
            let _ = self.insert_row(widget, Some(position + offset), true)?;
        }
        Ok(())
    }

    /// Notify with the selected row whenever it changes in single or
    /// browse mode.
    ///
    /// # Errors
    ///
    /// Only fails for stale handles.
    pub fn connect_row_selected<F>(&mut self, handler: F) -> Result<ObserverId>
    where
        F: FnMut(&Option<WidgetId>) + 'static,
    {
        Ok(self.state_mut()?.row_selected.connect(handler))
    }

    /// Notify when a row without an action is activated.
    ///
    /// # Errors
    ///
    /// Only fails for stale handles.
    pub fn connect_row_activated<F>(&mut self, handler: F) -> Result<ObserverId>
    where
        F: FnMut(&WidgetId) + 'static,
    {
        Ok(self.state_mut()?.row_activated.connect(handler))
    }

    /// Notify when the set of selected rows changes.
    ///
    /// # Errors
    ///
    /// Only fails for stale handles.
    pub fn connect_selected_rows_changed<F>(&mut self, handler: F) -> Result<ObserverId>
    where
        F: FnMut(&()) + 'static,
    {
        Ok(self.state_mut()?.selected_rows_changed.connect(handler))
    }

    /// Disconnect a handler from any notification.
    ///
    /// # Errors
    ///
    /// Only fails for stale handles.
    pub fn disconnect(&mut self, id: ObserverId) -> Result<bool> {
        let state = self.state_mut()?;
        Ok(state.row_selected.disconnect(id)
            || state.row_activated.disconnect(id)
            || state.selected_rows_changed.disconnect(id))
    }
}

pub(crate) fn remove(tree: &mut WidgetTree, container: WidgetId, child: WidgetId) -> Result<()> {
    let state = tree.list_box_state_mut(container)?;
    if state.placeholder == Some(child) {
        state.placeholder = None;
        return tree.orphan(child);
    }
    if let Some(row) = state
        .headers
        .iter()
        .find(|(_, header)| **header == child)
        .map(|(row, _)| *row)
    {
        let _ = state.headers.remove(&row);
        return tree.orphan(child);
    }

    let view: &WidgetTree = tree;
    let state = view.as_list_box(container)?;
    let Some(row) = model::holder(view, &state.children, child) else {
        return Err(view.not_a_child("listbox", container, child));
    };
    let next = state.next_visible(view, row);
    let state = tree.list_box_state_mut(container)?;
    let _ = state.children.remove(row);
    state.row_offsets.retain(|(offset_row, _, _)| *offset_row != row);
    let origin = state.origins.remove(&row);
    let was_selected = state.selection.forget(row);
    if state.cursor == Some(row) {
        state.cursor = None;
    }
    if state.active == Some(row) {
        state.active = None;
    }
    let header = state.headers.remove(&row);
    if let Some(header) = header {
        state.dropped_headers.push(header);
    }
    tree.orphan(row)?;
    if let Some(header) = header {
        tree.orphan(header)?;
    }

    let mut list = tree.list_box_mut(container)?;
    if was_selected {
        list.emit_selection_changed(true)?;
    }
    if let Some(next) = next {
        list.update_header(next)?;
    }
    list.free_dropped_headers()?;
    list.update_placeholder()?;
    model::release(tree, row, origin)
}

/// A child of `list` was shown or hidden.
pub(crate) fn row_visibility_changed(tree: &mut WidgetTree, list: WidgetId, child: WidgetId) -> Result<()> {
    if !tree.as_list_box(list)?.children.contains(child) {
        return Ok(());
    }
    let mut list = tree.list_box_mut(list)?;
    list.invalidate_headers()?;
    list.update_placeholder()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::widget::Leaf;

    #[test]
    fn test_forall_puts_headers_before_rows() {
        let mut tree = WidgetTree::new();
        let list = tree.new_list_box("list");
        let a = tree.new_leaf("a", Leaf::fixed(10, 10));
        let b = tree.new_leaf("b", Leaf::fixed(10, 10));
        let mut handle = tree.list_box_mut(list).expect("list box");
        let row_a = handle.insert(a, None).expect("insert a");
        let row_b = handle.insert(b, None).expect("insert b");
        handle
            .set_header_func(Some(Box::new(|tree: &mut WidgetTree, _row: WidgetId, before: Option<WidgetId>| {
                before.map(|_| tree.new_leaf("separator", Leaf::fixed(0, 1)))
            })))
            .expect("header func");

        let state = tree.as_list_box(list).expect("list box");
        assert_eq!(state.row_header(row_a), None);
        let header = state.row_header(row_b).expect("second row has a header");
        assert_eq!(state.forall(), vec![row_a, header, row_b]);
        assert_eq!(tree.parent(header), Some(list));
    }

    #[test]
    fn test_placeholder_tracks_visible_rows() {
        let mut tree = WidgetTree::new();
        let list = tree.new_list_box("list");
        let placeholder = tree.new_leaf("empty", Leaf::fixed(10, 10));
        let leaf = tree.new_leaf("a", Leaf::fixed(10, 10));
        let mut handle = tree.list_box_mut(list).expect("list box");
        handle.set_placeholder(Some(placeholder)).expect("placeholder");
        let row = handle.insert(leaf, None).expect("insert");
        assert!(!tree.is_drawable(placeholder), "rows hide the placeholder");
        tree.set_visible(row, false).expect("hide");
        assert!(tree.is_drawable(placeholder), "no visible rows shows it");
    }
}
