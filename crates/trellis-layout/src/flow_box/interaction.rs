//! Selection, activation, pointer gestures and keyboard navigation.

use crate::error::Result;
use crate::geometry::Rect;
use crate::tree::WidgetTree;
use crate::types::{Modifiers, MovementStep, Orientation, ScrollType, SelectionMode};
use crate::widget::WidgetId;

use super::{DEFAULT_PAGE_SIZE, FlowBox, FlowBoxMut, RUBBERBAND_START_DISTANCE, Rubberband};

/// Coordinate of `point` along `orientation`.
const fn along(orientation: Orientation, point: (i32, i32)) -> i32 {
    match orientation {
        Orientation::Horizontal => point.0,
        Orientation::Vertical => point.1,
    }
}

impl FlowBox {
    /// Which way to autoscroll for a pointer at `position` along the line
    /// axis, relative to the content box.
    fn autoscroll_for(&self, position: i32) -> ScrollType {
        let line_axis = self.orientation.opposite();
        let (low, high) = match self.line_adjustment() {
            Some(adjustment) => {
                let values = adjustment.values();
                (values.value as i32, (values.value + values.page_size) as i32)
            }
            None => (0, self.content.size(line_axis)),
        };
        let fast = self.autoscroll_config.fast_distance;
        if position < low - fast {
            ScrollType::PageBackward
        } else if position < low {
            ScrollType::StepBackward
        } else if position > high + fast {
            ScrollType::PageForward
        } else if position > high {
            ScrollType::StepForward
        } else {
            ScrollType::None
        }
    }
}

impl FlowBoxMut<'_> {
    fn check_child(&self, child: WidgetId) -> Result<()> {
        if self.state()?.children.contains(child) {
            Ok(())
        } else {
            Err(self.tree.not_a_child("flowbox", self.id, child))
        }
    }

    fn order(&self) -> Result<Vec<WidgetId>> {
        let view: &WidgetTree = self.tree;
        Ok(view.as_flow_box(self.id)?.focusable(view))
    }

    fn emit_selection_changed(&mut self, changed: bool) -> Result<()> {
        if changed {
            tracing::debug!(target: "trellis::flowbox", "selected children changed");
            self.state_mut()?.selected_children_changed.emit(&());
        }
        Ok(())
    }

    fn update_selection(&mut self, child: WidgetId, modifiers: Modifiers) -> Result<()> {
        let order = self.order()?;
        let changed = self.state_mut()?.selection.update(&order, child, modifiers);
        self.emit_selection_changed(changed)
    }

    /// Select `child`. Outside multiple mode the previous selection is
    /// replaced; in `None` mode nothing happens.
    ///
    /// # Errors
    ///
    /// A precondition error if `child` is not in this flow box.
    pub fn select_child(&mut self, child: WidgetId) -> Result<()> {
        self.check_child(child)?;
        let changed = self.state_mut()?.selection.select(child);
        self.emit_selection_changed(changed)
    }

    /// Unselect `child`. Browse mode keeps its selection.
    ///
    /// # Errors
    ///
    /// A precondition error if `child` is not in this flow box.
    pub fn unselect_child(&mut self, child: WidgetId) -> Result<()> {
        self.check_child(child)?;
        let changed = self.state_mut()?.selection.unselect(child);
        self.emit_selection_changed(changed)
    }

    /// Select every visible child. Only multiple mode allows it.
    ///
    /// # Errors
    ///
    /// Only fails for stale handles.
    pub fn select_all(&mut self) -> Result<()> {
        let order = self.order()?;
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

    /// Activate `child`: it becomes the cursor and the selection as a plain
    /// click would make it, then `child-activated` fires.
    ///
    /// # Errors
    ///
    /// A precondition error if `child` is not in this flow box.
    pub fn activate_child(&mut self, child: WidgetId) -> Result<()> {
        self.check_child(child)?;
        self.update_selection(child, Modifiers::NONE)?;
        let state = self.state_mut()?;
        state.cursor = Some(child);
        tracing::debug!(target: "trellis::flowbox", "child activated");
        state.child_activated.emit(&child);
        Ok(())
    }

    /// Pointer press at `(x, y)` relative to the content box. `n_press` is
    /// the click count; a double click activates when single-click
    /// activation is off.
    ///
    /// # Errors
    ///
    /// Only fails for stale handles.
    pub fn press(&mut self, x: i32, y: i32, n_press: u32) -> Result<()> {
        let view: &WidgetTree = self.tree;
        let state = view.as_flow_box(self.id)?;
        let child = state.child_at_pos(view, x, y);
        let double_click = n_press == 2 && !state.activate_on_single_click;
        self.state_mut()?.active = child;
        match child {
            Some(child) if double_click => self.activate_child(child),
            _ => Ok(()),
        }
    }

    /// Pointer release at `(x, y)`. Completes a click on the child pressed
    /// before, unless a rubber band took over the gesture.
    ///
    /// # Errors
    ///
    /// Only fails for stale handles.
    pub fn release(&mut self, x: i32, y: i32, modifiers: Modifiers) -> Result<()> {
        let view: &WidgetTree = self.tree;
        let state = view.as_flow_box(self.id)?;
        if state.rubberband_active() {
            return Ok(());
        }
        let child = state.child_at_pos(view, x, y);
        let single_click = state.activate_on_single_click;
        let active = self.state_mut()?.active.take();
        let Some(child) = child.filter(|child| active == Some(*child)) else {
            return Ok(());
        };
        if single_click {
            self.activate_child(child)
        } else {
            self.state_mut()?.cursor = Some(child);
            self.update_selection(child, modifiers)
        }
    }

    /// Start tracking a drag at `(x, y)`. Only multiple selection mode
    /// supports rubber-band selection.
    ///
    /// # Errors
    ///
    /// Only fails for stale handles.
    pub fn drag_begin(&mut self, x: i32, y: i32, modifiers: Modifiers) -> Result<()> {
        let state = self.state_mut()?;
        if state.selection.mode() != SelectionMode::Multiple {
            return Ok(());
        }
        state.rubberband = Some(Rubberband {
            origin: (x, y),
            offset: (0, 0),
            active: false,
            first: None,
            last: None,
            modifiers,
        });
        Ok(())
    }

    /// Pointer moved by `(dx, dy)` since [`drag_begin`](Self::drag_begin).
    /// The rubber band becomes active once the squared distance exceeds
    /// [`RUBBERBAND_START_DISTANCE`].
    ///
    /// # Errors
    ///
    /// Only fails for stale handles.
    pub fn drag_update(&mut self, dx: i32, dy: i32) -> Result<()> {
        let Some(mut band) = self.state()?.rubberband else {
            return Ok(());
        };
        band.offset = (dx, dy);
        let distance = i64::from(dx).pow(2).saturating_add(i64::from(dy).pow(2));
        if !band.active && distance > i64::from(RUBBERBAND_START_DISTANCE) {
            band.active = true;
            tracing::debug!(target: "trellis::flowbox", "rubberband started");
        }
        self.state_mut()?.rubberband = Some(band);
        if band.active {
            self.track_rubberband()?;
        }
        Ok(())
    }

    /// Update the ends of an active rubber band and the autoscroll mode from
    /// the current pointer position.
    fn track_rubberband(&mut self) -> Result<()> {
        let view: &WidgetTree = self.tree;
        let state = view.as_flow_box(self.id)?;
        let Some(mut band) = state.rubberband else {
            return Ok(());
        };
        let pointer = (
            band.origin.0.saturating_add(band.offset.0),
            band.origin.1.saturating_add(band.offset.1),
        );
        if band.first.is_none() {
            band.first = state.child_at_pos(view, band.origin.0, band.origin.1);
        }
        if let Some(child) = state.child_at_pos(view, pointer.0, pointer.1) {
            band.last = Some(child);
        }
        if band.first.is_none() {
            band.first = band.last;
        }
        let autoscroll = state.autoscroll_for(along(state.orientation.opposite(), pointer));
        let state = self.state_mut()?;
        state.rubberband = Some(band);
        state.autoscroll = autoscroll;
        Ok(())
    }

    /// One autoscroll frame: move the line adjustment per the autoscroll
    /// mode, then re-evaluate the child under the pointer. Returns whether
    /// the adjustment moved.
    ///
    /// # Errors
    ///
    /// Only fails for stale handles.
    pub fn autoscroll_tick(&mut self) -> Result<bool> {
        let state = self.state()?;
        let Some(adjustment) = state.line_adjustment().cloned() else {
            return Ok(false);
        };
        let config = state.autoscroll_config;
        let values = adjustment.values();
        let (increment, forward) = match state.autoscroll {
            ScrollType::None => return Ok(false),
            ScrollType::StepForward => (values.step_increment / config.step_factor, true),
            ScrollType::StepBackward => (values.step_increment / config.step_factor, false),
            ScrollType::PageForward => (values.page_increment / config.page_factor, true),
            ScrollType::PageBackward => (values.page_increment / config.page_factor, false),
        };
        let increment = increment.max(config.min_increment);
        let target = if forward {
            values.value + increment
        } else {
            values.value - increment
        };
        adjustment.set_value(target);
        let moved = (adjustment.value() - values.value) as i32;
        if moved == 0 {
            return Ok(false);
        }

        // The pointer stays put on screen while the content moves under it.
        let line_axis = state.orientation.opposite();
        let state = self.state_mut()?;
        if let Some(band) = state.rubberband.as_mut() {
            match line_axis {
                Orientation::Horizontal => band.offset.0 = band.offset.0.saturating_add(moved),
                Orientation::Vertical => band.offset.1 = band.offset.1.saturating_add(moved),
            }
        }
        self.track_rubberband()?;
        Ok(true)
    }

    /// Finish a drag. An active rubber band selects every visible child
    /// between its first and last child, replacing the selection unless a
    /// modifier was held at [`drag_begin`](Self::drag_begin).
    ///
    /// # Errors
    ///
    /// Only fails for stale handles.
    pub fn drag_end(&mut self) -> Result<()> {
        let order = self.order()?;
        let state = self.state_mut()?;
        state.autoscroll = ScrollType::None;
        let Some(band) = state.rubberband.take() else {
            return Ok(());
        };
        if !band.active {
            return Ok(());
        }
        let before = state.selection.selected_in(order.iter().copied());
        if !band.modifiers.modify && !band.modifiers.extend {
            let _ = state.selection.unselect_all();
        }
        if let (Some(first), Some(last)) = (band.first, band.last) {
            let _ = state.selection.select_range(&order, first, last);
        }
        let changed = before != state.selection.selected_in(order.iter().copied());
        tracing::debug!(target: "trellis::flowbox", changed, "rubberband finished");
        self.emit_selection_changed(changed)
    }

    /// Abort a drag without touching the selection.
    ///
    /// # Errors
    ///
    /// Only fails for stale handles.
    pub fn cancel_rubberband(&mut self) -> Result<()> {
        let state = self.state_mut()?;
        state.rubberband = None;
        state.autoscroll = ScrollType::None;
        Ok(())
    }

    /// Move the keyboard cursor by `count` units of `step` (negative counts
    /// move backwards). The new cursor child is selected unless `modify` is
    /// held; `extend` selects the range from the anchor. Returns whether
    /// the cursor moved.
    ///
    /// # Errors
    ///
    /// Only fails for stale handles.
    pub fn move_cursor(&mut self, step: MovementStep, count: i32, modifiers: Modifiers) -> Result<bool> {
        let order = self.order()?;
        if order.is_empty() || count == 0 {
            return Ok(false);
        }
        let rtl = self.tree.widget(self.id)?.style().is_rtl();
        let state = self.state()?;
        let count = if rtl && step == MovementStep::VisualPositions {
            -count
        } else {
            count
        };
        let step = match (state.orientation, step) {
            (Orientation::Vertical, MovementStep::VisualPositions) => MovementStep::DisplayLines,
            (Orientation::Vertical, MovementStep::DisplayLines) => MovementStep::VisualPositions,
            (_, step) => step,
        };
        let last = order.len() as i64 - 1;
        let current = state
            .cursor
            .and_then(|cursor| order.iter().position(|child| *child == cursor));
        let line_length = state.line_length.max(1) as i64;

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
            (MovementStep::VisualPositions, Some(current)) => current as i64 + i64::from(count),
            (MovementStep::DisplayLines, Some(current)) => {
                current as i64 + i64::from(count) * line_length
            }
            (MovementStep::Pages, Some(current)) => {
                self.page_target(&order, current, count.signum(), line_length)?
            }
        };
        let target = order[target.clamp(0, last) as usize];
        if current.map(|index| order[index]) == Some(target) {
            return Ok(false);
        }

        self.state_mut()?.cursor = Some(target);
        self.scroll_to(target)?;
        tracing::debug!(target: "trellis::flowbox", %step, count, "cursor moved");
        if modifiers.modify {
            return Ok(true);
        }
        self.update_selection(
            target,
            Modifiers {
                modify: false,
                extend: modifiers.extend,
            },
        )?;
        Ok(true)
    }

    /// The child a page away from `current`, in the same column: the first
    /// whose line-axis position differs by at least a page, or the last one
    /// available in that direction.
    fn page_target(&self, order: &[WidgetId], current: usize, direction: i32, line_length: i64) -> Result<i64> {
        let state = self.state()?;
        let line_axis = state.orientation.opposite();
        let page = state
            .line_adjustment()
            .map(|adjustment| adjustment.page_increment() as i32)
            .filter(|page| *page > 0)
            .unwrap_or(DEFAULT_PAGE_SIZE);
        let start = self.tree.allocation(order[current])?.start(line_axis);
        let last = order.len() as i64 - 1;
        let mut index = current as i64;
        loop {
            let next = index + i64::from(direction) * line_length;
            if next < 0 || next > last {
                return Ok(index);
            }
            index = next;
            let position = self.tree.allocation(order[index as usize])?.start(line_axis);
            if (position - start).abs() >= page {
                return Ok(index);
            }
        }
    }

    /// Scroll the line adjustment so `child` is visible.
    fn scroll_to(&self, child: WidgetId) -> Result<()> {
        let state = self.state()?;
        let Some(adjustment) = state.line_adjustment() else {
            return Ok(());
        };
        let line_axis = state.orientation.opposite();
        let rect: Rect = self.tree.allocation(child)?;
        let start = rect.start(line_axis) - state.content.start(line_axis);
        adjustment.clamp_page(f64::from(start), f64::from(start + rect.size(line_axis)));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_autoscroll_bands() {
        let mut state = FlowBox::default();
        state.content = Rect::new(0, 0, 100, 200);
        assert_eq!(state.autoscroll_for(100), ScrollType::None);
        assert_eq!(state.autoscroll_for(-10), ScrollType::StepBackward);
        assert_eq!(state.autoscroll_for(-40), ScrollType::PageBackward);
        assert_eq!(state.autoscroll_for(210), ScrollType::StepForward);
        assert_eq!(state.autoscroll_for(240), ScrollType::PageForward);
    }
}
