//! Selection bookkeeping shared by flow boxes and list boxes.
//!
//! The selected set lives in the container, keyed by child id. Callers pass
//! the current order of selectable children whenever a range is involved.

use rustc_hash::FxHashSet;

use crate::types::{Modifiers, SelectionMode};
use crate::widget::WidgetId;

#[derive(Debug, Default)]
pub(crate) struct Selection {
    mode: SelectionMode,
    selected: FxHashSet<WidgetId>,
    /// Last child selected without extending; ranges start here.
    anchor: Option<WidgetId>,
}

impl Selection {
    pub(crate) const fn mode(&self) -> SelectionMode {
        self.mode
    }

    /// Switch mode. Leaving multiple selection, or entering none, clears
    /// the selection. Returns whether the selected set changed.
    pub(crate) fn set_mode(&mut self, mode: SelectionMode) -> bool {
        if mode == self.mode {
            return false;
        }
        let clear = mode == SelectionMode::None || self.mode == SelectionMode::Multiple;
        self.mode = mode;
        clear && self.clear()
    }

    pub(crate) fn is_selected(&self, child: WidgetId) -> bool {
        self.selected.contains(&child)
    }

    pub(crate) const fn anchor(&self) -> Option<WidgetId> {
        self.anchor
    }

    pub(crate) fn len(&self) -> usize {
        self.selected.len()
    }

    /// Selected children in `order`.
    pub(crate) fn selected_in(&self, order: impl IntoIterator<Item = WidgetId>) -> Vec<WidgetId> {
        order
            .into_iter()
            .filter(|child| self.selected.contains(child))
            .collect()
    }

    fn clear(&mut self) -> bool {
        let changed = !self.selected.is_empty();
        self.selected.clear();
        self.anchor = None;
        changed
    }

    pub(crate) fn select(&mut self, child: WidgetId) -> bool {
        if self.mode == SelectionMode::None || self.selected.contains(&child) {
            return false;
        }
        if self.mode != SelectionMode::Multiple {
            let _ = self.clear();
        }
        let _ = self.selected.insert(child);
        self.anchor = Some(child);
        true
    }

    /// Browse mode keeps its single selection.
    pub(crate) fn unselect(&mut self, child: WidgetId) -> bool {
        if self.mode == SelectionMode::Browse || !self.selected.remove(&child) {
            return false;
        }
        if self.anchor == Some(child) {
            self.anchor = None;
        }
        true
    }

    pub(crate) fn select_all(&mut self, order: &[WidgetId]) -> bool {
        if self.mode != SelectionMode::Multiple {
            return false;
        }
        let before = self.selected.len();
        self.selected.extend(order.iter().copied());
        self.selected.len() != before
    }

    pub(crate) fn unselect_all(&mut self) -> bool {
        if self.mode == SelectionMode::Browse {
            return false;
        }
        self.clear()
    }

    /// Drop a removed child.
    pub(crate) fn forget(&mut self, child: WidgetId) -> bool {
        if self.anchor == Some(child) {
            self.anchor = None;
        }
        self.selected.remove(&child)
    }

    /// Select every child of `order` between `from` and `to` inclusive.
    pub(crate) fn select_range(&mut self, order: &[WidgetId], from: WidgetId, to: WidgetId) -> bool {
        let (Some(a), Some(b)) = (
            order.iter().position(|c| *c == from),
            order.iter().position(|c| *c == to),
        ) else {
            return false;
        };
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        let before = self.selected.len();
        self.selected.extend(order[lo..=hi].iter().copied());
        self.selected.len() != before
    }

    /// Apply a click or cursor move on `child`.
    ///
    /// - browse: `child` becomes the only selection;
    /// - single: `child` becomes the only selection, or with `modify` its
    ///   state toggles;
    /// - multiple: `modify` toggles `child`, `extend` selects the range from
    ///   the anchor to `child` (added to the selection with `modify`,
    ///   replacing it otherwise), and without modifiers `child` replaces
    ///   the selection.
    ///
    /// Returns whether the selected set changed.
    pub(crate) fn update(&mut self, order: &[WidgetId], child: WidgetId, modifiers: Modifiers) -> bool {
        let before = self.selected.clone();
        match self.mode {
            SelectionMode::None => return false,
            SelectionMode::Browse => {
                let _ = self.clear();
                let _ = self.selected.insert(child);
                self.anchor = Some(child);
            }
            SelectionMode::Single => {
                let was_selected = self.selected.contains(&child);
                let _ = self.clear();
                if !(modifiers.modify && was_selected) {
                    let _ = self.selected.insert(child);
                    self.anchor = Some(child);
                }
            }
            SelectionMode::Multiple => {
                let anchor = self.anchor.filter(|anchor| order.contains(anchor));
                match (modifiers.extend, anchor) {
                    (true, Some(anchor)) => {
                        if !modifiers.modify {
                            self.selected.clear();
                        }
                        let _ = self.select_range(order, anchor, child);
                    }
                    _ if modifiers.modify => {
                        if !self.selected.remove(&child) {
                            let _ = self.selected.insert(child);
                        }
                        self.anchor = Some(child);
                    }
                    _ => {
                        let _ = self.clear();
                        let _ = self.selected.insert(child);
                        self.anchor = Some(child);
                    }
                }
            }
        }
        before != self.selected
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trellis_tree::Tree;

    fn ids(n: usize) -> Vec<WidgetId> {
        let mut tree: Tree<()> = Tree::new();
        (0..n).map(|_| tree.insert(())).collect()
    }

    #[test]
    fn test_single_toggles_with_modify() {
        let order = ids(3);
        let mut selection = Selection::default();
        assert!(selection.update(&order, order[1], Modifiers::NONE));
        assert!(selection.is_selected(order[1]));
        assert!(selection.update(&order, order[1], Modifiers::MODIFY));
        assert_eq!(selection.len(), 0);
    }

    #[test]
    fn test_multiple_extend_selects_range_from_anchor() {
        let order = ids(5);
        let mut selection = Selection::default();
        let _ = selection.set_mode(SelectionMode::Multiple);
        let _ = selection.update(&order, order[1], Modifiers::NONE);
        let _ = selection.update(&order, order[3], Modifiers::EXTEND);
        assert_eq!(selection.selected_in(order.iter().copied()), order[1..=3].to_vec());
        assert_eq!(selection.anchor(), Some(order[1]));
    }

    #[test]
    fn test_browse_keeps_selection() {
        let order = ids(2);
        let mut selection = Selection::default();
        let _ = selection.set_mode(SelectionMode::Browse);
        let _ = selection.update(&order, order[0], Modifiers::NONE);
        assert!(!selection.unselect(order[0]));
        assert!(!selection.unselect_all());
        assert!(selection.is_selected(order[0]));
    }

    #[test]
    fn test_leaving_multiple_clears() {
        let order = ids(3);
        let mut selection = Selection::default();
        let _ = selection.set_mode(SelectionMode::Multiple);
        assert!(selection.select_all(&order));
        assert!(selection.set_mode(SelectionMode::Single));
        assert_eq!(selection.len(), 0);
    }
}
