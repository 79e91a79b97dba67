//! Row selection, activation and keyboard navigation.

use crate::error::Result;
use crate::tree::WidgetTree;
use crate::types::{Modifiers, MovementStep, SelectionMode};
use crate::widget::WidgetId;

use super::{DEFAULT_PAGE_SIZE, ListBox, ListBoxMut};

impl ListBox {
    /// Visible, selectable rows; the units of range selection.
    fn selectable_rows(&self, tree: &WidgetTree) -> Vec<WidgetId> {
        self.visible_rows(tree)
            .into_iter()
            .filter(|row| tree.as_list_box_row(*row).is_ok_and(|state| state.selectable))
            .collect()
    }
}

impl ListBoxMut<'_> {
    pub(super) fn emit_selection_changed(&mut self, changed: bool) -> Result<()> {
        if !changed {
            return Ok(());
        }
        let state = self.state_mut()?;
        tracing::debug!(target: "trellis::listbox", selected = state.selection.len(), "selection changed");
        if state.selection.mode() != SelectionMode::Multiple {
            let selected = state.selected_row();
            state.row_selected.emit(&selected);
        }
        state.selected_rows_changed.emit(&());
        Ok(())
    }

    fn is_selectable(&self, row: WidgetId) -> Result<bool> {
        Ok(self.tree.as_list_box_row(row)?.selectable)
    }

    fn update_selection(&mut self, row: WidgetId, modifiers: Modifiers) -> Result<()> {
        if !self.is_selectable(row)? {
            return Ok(());
        }
        let view: &WidgetTree = self.tree;
        let order = view.as_list_box(self.id)?.selectable_rows(view);
        let changed = self.state_mut()?.selection.update(&order, row, modifiers);
        self.emit_selection_changed(changed)
    }

    /// Select `row`. Outside multiple mode the previous selection is
    /// replaced. Unselectable rows and `None` mode are ignored.
    ///
    /// # Errors
    ///
    /// A precondition error if `row` is not in this list box.
    pub fn select_row(&mut self, row: WidgetId) -> Result<()> {
        self.check_row(row)?;
        if !self.is_selectable(row)? {
            return Ok(());
        }
        let changed = self.state_mut()?.selection.select(row);
        self.emit_selection_changed(changed)
    }

    /// Unselect `row`. Browse mode keeps its selection.
    ///
    /// # Errors
    ///
    /// A precondition error if `row` is not in this list box.
    pub fn unselect_row(&mut self, row: WidgetId) -> Result<()> {
        self.check_row(row)?;
        let changed = self.state_mut()?.selection.unselect(row);
        self.emit_selection_changed(changed)
    }

    /// Select every visible selectable row. Only multiple mode allows it.
    ///
    /// # Errors
    ///
    /// Only fails for stale handles.
    pub fn select_all(&mut self) -> Result<()> {
        let view: &WidgetTree = self.tree;
        let order = view.as_list_box(self.id)?.selectable_rows(view);
        let changed = self.state_mut()?.selection.select_all(&order);
        self.emit_selection_changed(changed)
    }

    /// Clear the selection. Browse mode keeps its selection.
    ///
    /// # Errors
    ///
    /// Only fails for stale handles.
    pub fn unselect_all(&mut self) -> Result<()> {
        let changed = self.state_mut()?.selection.unselect_all();
        self.emit_selection_changed(changed)
    }

    /// Change the selection policy. Entering `None` or leaving `Multiple`
    /// clears the selection.
    ///
    /// # Errors
    ///
    /// Only fails for stale handles.
    pub fn set_selection_mode(&mut self, mode: SelectionMode) -> Result<()> {
        let changed = self.state_mut()?.selection.set_mode(mode);
        self.emit_selection_changed(changed)
    }

    /// Make `row` the cursor, select it as a plain click would, then
    /// activate it: its action runs if it has one, otherwise `row-activated`
    /// observers are notified. Rows that are not activatable are only
    /// selected.
    ///
    /// # Errors
    ///
    /// A precondition error if `row` is not in this list box.
    pub fn activate_row(&mut self, row: WidgetId) -> Result<()> {
        self.check_row(row)?;
        self.state_mut()?.cursor = Some(row);
        self.update_selection(row, Modifiers::NONE)?;
        if !self.tree.as_list_box_row(row)?.activatable {
            return Ok(());
        }
        tracing::debug!(target: "trellis::listbox", row = %self.tree.name(row), "row activated");
        let action = self.tree.list_box_row_state_mut(row)?.action.take();
        match action {
            Some(mut action) => {
                action(row);
                let state = self.tree.list_box_row_state_mut(row)?;
                if state.action.is_none() {
                    state.action = Some(action);
                }
            }
            None => self.state_mut()?.row_activated.emit(&row),
        }
        Ok(())
    }

    /// Pointer press at `y`, relative to the content top. `n_press` is the
    /// click count; a double click activates when single-click activation
    /// is off.
    ///
    /// # Errors
    ///
    /// Only fails for stale handles.
    pub fn press(&mut self, y: i32, n_press: u32) -> Result<()> {
        let view: &WidgetTree = self.tree;
        let state = view.as_list_box(self.id)?;
        let row = state.row_at_y(view, y);
        let double_click = n_press == 2 && !state.activate_on_single_click;
        self.state_mut()?.active = row;
        match row {
            Some(row) if double_click => self.activate_row(row),
            _ => Ok(()),
        }
    }

    /// Pointer release at `y`. Completes a click on the row pressed before.
    ///
    /// # Errors
    ///
    /// Only fails for stale handles.
    pub fn release(&mut self, y: i32, modifiers: Modifiers) -> Result<()> {
        let view: &WidgetTree = self.tree;
        let state = view.as_list_box(self.id)?;
        let row = state.row_at_y(view, y);
        let single_click = state.activate_on_single_click;
        let active = self.state_mut()?.active.take();
        let Some(row) = row.filter(|row| active == Some(*row)) else {
            return Ok(());
        };
        if single_click {
            self.activate_row(row)
        } else {
            self.state_mut()?.cursor = Some(row);
            self.update_selection(row, modifiers)
        }
    }

    /// Move the keyboard cursor by `count` rows, pages or to either end
    /// (negative counts move up). The new cursor row is selected unless
    /// `modify` is held; `extend` selects the range from the anchor.
    /// Returns whether the cursor moved.
    ///
    /// # Errors
    ///
    /// Only fails for stale handles.
    pub fn move_cursor(&mut self, step: MovementStep, count: i32, modifiers: Modifiers) -> Result<bool> {
        let view: &WidgetTree = self.tree;
        let state = view.as_list_box(self.id)?;
        let rows = state.visible_rows(view);
        if rows.is_empty() || count == 0 {
            return Ok(false);
        }
        let last = rows.len() - 1;
        let current = state
            .cursor
            .and_then(|cursor| rows.iter().position(|row| *row == cursor));

        let target = match (step, current) {
            (MovementStep::BufferEnds, _) => {
                if count < 0 {
                    0
                } else {
                    last
                }
            }
            // Without a cursor a move enters from the edge it heads away from.
            (_, None) => {
                if count > 0 {
                    0
                } else {
                    last
                }
            }
            (MovementStep::Pages, Some(current)) => self.page_target(&rows, current, count)?,
            (_, Some(current)) => {
                let index = current as i64 + i64::from(count);
                index.clamp(0, last as i64) as usize
            }
        };
        if current == Some(target) {
            return Ok(false);
        }
        let row = rows[target];

        let geometry = |index: usize| {
            self.tree
                .as_list_box_row(rows[index])
                .map(|state| (state.y, state.height))
        };
        let (y, height) = geometry(target)?;
        let start = match current {
            Some(current) => Some(geometry(current)?.0),
            None => None,
        };
        if let Some(adjustment) = self.state()?.adjustment.clone() {
            match (step, start) {
                (MovementStep::Pages, Some(start)) => {
                    adjustment.set_value(adjustment.value() + f64::from(y - start));
                }
                _ => adjustment.clamp_page(f64::from(y), f64::from(y + height)),
            }
        }

        self.state_mut()?.cursor = Some(row);
        tracing::debug!(target: "trellis::listbox", %step, count, "cursor moved");
        if !modifiers.modify {
            self.update_selection(
                row,
                Modifiers {
                    modify: false,
                    extend: modifiers.extend,
                },
            )?;
        }
        Ok(true)
    }

    /// Furthest row within a page of `current` in the direction of `count`.
    fn page_target(&self, rows: &[WidgetId], current: usize, count: i32) -> Result<usize> {
        let state = self.state()?;
        let page = state
            .adjustment
            .as_ref()
            .map(|adjustment| adjustment.page_increment() as i32)
            .filter(|page| *page > 0)
            .unwrap_or(DEFAULT_PAGE_SIZE);
        let start = self.tree.as_list_box_row(rows[current])?.y;
        let mut target = current;
        if count < 0 {
            for index in (0..current).rev() {
                if self.tree.as_list_box_row(rows[index])?.y < start - page {
                    break;
                }
                target = index;
            }
        } else {
            for (index, row) in rows.iter().enumerate().skip(current + 1) {
                if self.tree.as_list_box_row(*row)?.y > start + page {
                    break;
                }
                target = index;
            }
        }
        Ok(target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::widget::Leaf;

    #[test]
    fn test_unselectable_rows_are_skipped() {
        let mut tree = WidgetTree::new();
        let list = tree.new_list_box("list");
        let a = tree.new_leaf("a", Leaf::fixed(10, 10));
        let mut handle = tree.list_box_mut(list).expect("list box");
        let row = handle.insert(a, None).expect("insert");
        handle.set_row_selectable(row, false).expect("selectable");
        handle.select_row(row).expect("select");
        assert_eq!(tree.as_list_box(list).expect("list box").selected_row(), None);
    }
}
