//! Linear packing.
//!
//! A box lays its children out in a single row or column. Children are
//! packed against the start or the end edge; an optional center child is
//! kept in the middle of whatever space the two groups leave. Along the
//! orientation each child gets a slot: in homogeneous mode all slots are
//! equal, otherwise every child is first grown towards its natural size
//! with [`distribute_natural`] and what remains is shared by the children
//! that expand.

use rustc_hash::FxHashMap;

use crate::distribute::{RequestedSize, distribute_natural, split_evenly};
use crate::error::{Result, precondition};
use crate::geometry::Rect;
use crate::tree::{Placement, WidgetTree};
use crate::types::{Align, BaselinePosition, Orientation, PackType};
use crate::widget::{Measurement, WidgetId, WidgetType};

/// Packing record for one box child.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoxChild {
    /// Whether the child shares surplus space.
    pub expand: bool,
    /// Whether the child fills its slot along the orientation, or is
    /// centered in it at its minimum size.
    pub fill: bool,
    /// Extra space on both sides of the child along the orientation.
    pub padding: i32,
    /// Edge the child is packed against. Ignored for the center child.
    pub pack: PackType,
}

impl Default for BoxChild {
    fn default() -> Self {
        Self {
            expand: false,
            fill: true,
            padding: 0,
            pack: PackType::Start,
        }
    }
}

impl BoxChild {
    /// A start-packed child with the given flags.
    #[must_use]
    pub const fn new(expand: bool, fill: bool, padding: i32) -> Self {
        Self {
            expand,
            fill,
            padding,
            pack: PackType::Start,
        }
    }

    /// The same record packed against `pack`.
    #[must_use]
    pub const fn packed(mut self, pack: PackType) -> Self {
        self.pack = pack;
        self
    }
}

/// State of a box container.
#[derive(Debug, Default)]
pub struct BoxLayout {
    orientation: Orientation,
    spacing: i32,
    homogeneous: bool,
    baseline_position: BaselinePosition,
    children: Vec<WidgetId>,
    center: Option<WidgetId>,
    packing: FxHashMap<WidgetId, BoxChild>,
}

impl BoxLayout {
    /// An empty box.
    #[must_use]
    pub fn new(orientation: Orientation) -> Self {
        Self {
            orientation,
            ..Self::default()
        }
    }

    /// Layout axis.
    #[must_use]
    pub const fn orientation(&self) -> Orientation {
        self.orientation
    }

    /// Space between neighbouring children.
    #[must_use]
    pub const fn spacing(&self) -> i32 {
        self.spacing
    }

    /// Whether every child gets the same slot size.
    #[must_use]
    pub const fn homogeneous(&self) -> bool {
        self.homogeneous
    }

    /// Where the baseline sits when the box has extra height.
    #[must_use]
    pub const fn baseline_position(&self) -> BaselinePosition {
        self.baseline_position
    }

    /// Packed children in insertion order, without the center child.
    #[must_use]
    pub fn child_order(&self) -> &[WidgetId] {
        &self.children
    }

    /// The center child.
    #[must_use]
    pub const fn center(&self) -> Option<WidgetId> {
        self.center
    }

    /// Packing record of a child (including the center child).
    #[must_use]
    pub fn query_packing(&self, child: WidgetId) -> Option<BoxChild> {
        self.packing.get(&child).copied()
    }

    /// Whether `child` is packed in this box or is its center.
    #[must_use]
    pub fn contains(&self, child: WidgetId) -> bool {
        self.packing.contains_key(&child)
    }

    /// Children in visual order: the start group forwards, the center, then
    /// the end group from the outside in. Right-to-left horizontal boxes
    /// reverse the whole sequence.
    #[must_use]
    pub fn css_sibling_order(&self, rtl: bool) -> Vec<WidgetId> {
        let mut order = self.forall();
        if rtl && self.orientation == Orientation::Horizontal {
            order.reverse();
        }
        order
    }

    /// Every child: start group, center, end group reversed.
    pub(crate) fn forall(&self) -> Vec<WidgetId> {
        let mut order = Vec::with_capacity(self.children.len() + 1);
        order.extend(self.group(PackType::Start));
        order.extend(self.center);
        let mut end: Vec<WidgetId> = self.group(PackType::End).collect();
        end.reverse();
        order.extend(end);
        order
    }

    fn group(&self, pack: PackType) -> impl Iterator<Item = WidgetId> + '_ {
        self.children
            .iter()
            .copied()
            .filter(move |child| self.packing(*child).pack == pack)
    }

    fn packing(&self, child: WidgetId) -> BoxChild {
        self.packing.get(&child).copied().unwrap_or_default()
    }

    pub(crate) fn set_homogeneous(&mut self, homogeneous: bool) {
        self.homogeneous = homogeneous;
    }

    /// Move `child` to `position` in the insertion order (`None` = last).
    pub(crate) fn reorder(&mut self, child: WidgetId, position: Option<usize>) -> bool {
        let Some(current) = self.children.iter().position(|c| *c == child) else {
            return false;
        };
        let _ = self.children.remove(current);
        let index = position.map_or(self.children.len(), |p| p.min(self.children.len()));
        self.children.insert(index, child);
        true
    }

    fn forget(&mut self, child: WidgetId) -> bool {
        if self.center == Some(child) {
            self.center = None;
        } else if let Some(index) = self.children.iter().position(|c| *c == child) {
            let _ = self.children.remove(index);
        } else {
            return false;
        }
        let _ = self.packing.remove(&child);
        true
    }
}

/// Mutable access to a box (or the box part of a button box).
#[derive(Debug)]
pub struct BoxMut<'t> {
    tree: &'t mut WidgetTree,
    id: WidgetId,
}

impl WidgetTree {
    /// Mutate a box or button box.
    ///
    /// # Errors
    ///
    /// [`LayoutError::WrongKind`](crate::LayoutError::WrongKind) if `id` is
    /// neither.
    pub fn box_mut(&mut self, id: WidgetId) -> Result<BoxMut<'_>> {
        let _ = self.as_box(id)?;
        Ok(BoxMut { tree: self, id })
    }
}

impl BoxMut<'_> {
    /// Pack `child` with default packing at the start.
    ///
    /// # Errors
    ///
    /// A precondition error if `child` already has a parent.
    pub fn add(&mut self, child: WidgetId) -> Result<()> {
        self.pack(child, BoxChild::default())
    }

    /// Pack `child` against the start edge.
    ///
    /// # Errors
    ///
    /// A precondition error if `child` already has a parent or `padding`
    /// is negative.
    pub fn pack_start(&mut self, child: WidgetId, expand: bool, fill: bool, padding: i32) -> Result<()> {
        self.pack(child, BoxChild::new(expand, fill, padding))
    }

    /// Pack `child` against the end edge.
    ///
    /// # Errors
    ///
    /// A precondition error if `child` already has a parent or `padding`
    /// is negative.
    pub fn pack_end(&mut self, child: WidgetId, expand: bool, fill: bool, padding: i32) -> Result<()> {
        self.pack(child, BoxChild::new(expand, fill, padding).packed(PackType::End))
    }

    /// Pack `child` with an explicit record.
    ///
    /// # Errors
    ///
    /// A precondition error if `child` already has a parent or the padding
    /// is negative.
    pub fn pack(&mut self, child: WidgetId, packing: BoxChild) -> Result<()> {
        check_padding(packing.padding)?;
        self.tree.adopt(self.id, child, "box")?;
        let state = self.tree.box_state_mut(self.id)?;
        state.children.push(child);
        let _ = state.packing.insert(child, packing);
        tracing::debug!(target: "trellis::box", pack = %packing.pack, "packed child");
        Ok(())
    }

    /// Move `child` to `position` among the packed children (`None` moves
    /// it last).
    ///
    /// # Errors
    ///
    /// A precondition error if `child` is not packed in this box.
    pub fn reorder(&mut self, child: WidgetId, position: Option<usize>) -> Result<()> {
        if self.tree.box_state_mut(self.id)?.reorder(child, position) {
            Ok(())
        } else {
            Err(self.tree.not_a_child("box", self.id, child))
        }
    }

    /// Replace the center child. The previous center is unparented.
    ///
    /// # Errors
    ///
    /// A precondition error if the new center already has a parent.
    pub fn set_center(&mut self, center: Option<WidgetId>) -> Result<()> {
        let previous = self.tree.as_box(self.id)?.center;
        if previous == center {
            return Ok(());
        }
        if let Some(center) = center {
            self.tree.adopt(self.id, center, "box")?;
        }
        if let Some(previous) = previous {
            self.tree.orphan(previous)?;
        }
        let state = self.tree.box_state_mut(self.id)?;
        if let Some(previous) = previous {
            let _ = state.packing.remove(&previous);
        }
        state.center = center;
        if let Some(center) = center {
            let _ = state.packing.insert(center, BoxChild::default());
        }
        Ok(())
    }

    /// Change how `child` is packed.
    ///
    /// # Errors
    ///
    /// A precondition error if `child` is not in this box or the padding
    /// is negative.
    pub fn set_packing(&mut self, child: WidgetId, packing: BoxChild) -> Result<()> {
        check_padding(packing.padding)?;
        let state = self.tree.box_state_mut(self.id)?;
        match state.packing.get_mut(&child) {
            Some(record) => {
                *record = packing;
                Ok(())
            }
            None => Err(self.tree.not_a_child("box", self.id, child)),
        }
    }

    /// Packing record of `child`.
    ///
    /// # Errors
    ///
    /// A precondition error if `child` is not in this box.
    pub fn query_packing(&self, child: WidgetId) -> Result<BoxChild> {
        self.tree
            .as_box(self.id)?
            .query_packing(child)
            .ok_or_else(|| self.tree.not_a_child("box", self.id, child))
    }

    /// Give every child the same slot size.
    ///
    /// # Errors
    ///
    /// Only fails for stale handles.
    pub fn set_homogeneous(&mut self, homogeneous: bool) -> Result<()> {
        self.tree.box_state_mut(self.id)?.homogeneous = homogeneous;
        Ok(())
    }

    /// Space between neighbouring children.
    ///
    /// # Errors
    ///
    /// A precondition error for negative spacing.
    pub fn set_spacing(&mut self, spacing: i32) -> Result<()> {
        if spacing < 0 {
            return Err(precondition("box", format!("spacing must be >= 0, got {spacing}")));
        }
        self.tree.box_state_mut(self.id)?.spacing = spacing;
        Ok(())
    }

    /// Where the baseline sits when the box is taller than needed.
    ///
    /// # Errors
    ///
    /// Only fails for stale handles.
    pub fn set_baseline_position(&mut self, position: BaselinePosition) -> Result<()> {
        self.tree.box_state_mut(self.id)?.baseline_position = position;
        Ok(())
    }

    /// Change the layout axis.
    ///
    /// # Errors
    ///
    /// Only fails for stale handles.
    pub fn set_orientation(&mut self, orientation: Orientation) -> Result<()> {
        self.tree.box_state_mut(self.id)?.orientation = orientation;
        Ok(())
    }

    /// Remove `child` from the box.
    ///
    /// # Errors
    ///
    /// A precondition error if `child` is not in this box.
    pub fn remove(&mut self, child: WidgetId) -> Result<()> {
        remove(self.tree, self.id, child)
    }
}

fn check_padding(padding: i32) -> Result<()> {
    if padding < 0 {
        return Err(precondition("box", format!("padding must be >= 0, got {padding}")));
    }
    Ok(())
}

pub(crate) fn remove(tree: &mut WidgetTree, container: WidgetId, child: WidgetId) -> Result<()> {
    if !tree.box_state_mut(container)?.forget(child) {
        return Err(tree.not_a_child("box", container, child));
    }
    if tree.widget_type(container)? == WidgetType::ButtonBox {
        tree.button_box_state_mut(container)?.forget(child);
    }
    tree.orphan(child)
}

// --- Measurement ---

/// Cross-axis extent with baseline tracking.
#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct CrossExtent {
    minimum: i32,
    natural: i32,
    minimum_above: i32,
    minimum_below: i32,
    natural_above: i32,
    natural_below: i32,
    have_baseline: bool,
}

impl CrossExtent {
    /// Fold in one child's cross-axis measurement. Baselines only count
    /// for baseline-aligned children measured vertically.
    pub(crate) fn add(&mut self, measured: Measurement, cross: Orientation, valign: Align) {
        let baseline = if cross == Orientation::Vertical && valign == Align::Baseline {
            measured.minimum_baseline
        } else {
            None
        };
        if let Some(minimum_baseline) = baseline {
            let natural_baseline = measured.natural_baseline.unwrap_or(minimum_baseline);
            self.have_baseline = true;
            self.minimum_below = self.minimum_below.max(measured.minimum - minimum_baseline);
            self.natural_below = self.natural_below.max(measured.natural - natural_baseline);
            self.minimum_above = self.minimum_above.max(minimum_baseline);
            self.natural_above = self.natural_above.max(natural_baseline);
        } else {
            self.minimum = self.minimum.max(measured.minimum);
            self.natural = self.natural.max(measured.natural);
        }
    }

    pub(crate) fn finish(&self, position: BaselinePosition) -> Measurement {
        let minimum = self.minimum.max(self.minimum_above + self.minimum_below);
        let natural = self.natural.max(self.natural_above + self.natural_below);
        if !self.have_baseline {
            return Measurement::new(minimum, natural);
        }
        Measurement::with_baselines(
            minimum,
            natural,
            Some(self.baseline_in(position, minimum)),
            Some(place_baseline(
                position,
                self.natural_above,
                self.natural_below,
                natural,
            )),
        )
    }

    /// Baseline for a box of `height` pixels.
    pub(crate) fn baseline_in(&self, position: BaselinePosition, height: i32) -> i32 {
        place_baseline(position, self.minimum_above, self.minimum_below, height)
    }

    pub(crate) const fn have_baseline(&self) -> bool {
        self.have_baseline
    }
}

pub(crate) fn place_baseline(position: BaselinePosition, above: i32, below: i32, height: i32) -> i32 {
    match position {
        BaselinePosition::Top => above,
        BaselinePosition::Center => above + ((height - (above + below)) / 2).max(0),
        BaselinePosition::Bottom => height - below,
    }
}

pub(crate) fn measure(
    tree: &WidgetTree,
    state: &BoxLayout,
    orientation: Orientation,
    for_size: Option<i32>,
) -> Result<Measurement> {
    let measured = if orientation == state.orientation {
        measure_along(tree, state, for_size)?
    } else {
        match for_size {
            Some(size) => measure_across_for(tree, state, size)?,
            None => measure_across(tree, state)?,
        }
    };
    #[cfg(feature = "layout-trace")]
    tracing::trace!(target: "trellis::box", %orientation, ?for_size, ?measured, "measure");
    Ok(measured)
}

fn visible_children<'s>(
    tree: &'s WidgetTree,
    state: &'s BoxLayout,
) -> impl Iterator<Item = (WidgetId, BoxChild)> + 's {
    state
        .children
        .iter()
        .copied()
        .filter(|child| tree.is_drawable(*child))
        .map(|child| (child, state.packing(child)))
}

fn visible_center(tree: &WidgetTree, state: &BoxLayout) -> Option<(WidgetId, BoxChild)> {
    state
        .center
        .filter(|center| tree.is_drawable(*center))
        .map(|center| (center, state.packing(center)))
}

fn measure_along(tree: &WidgetTree, state: &BoxLayout, for_size: Option<i32>) -> Result<Measurement> {
    let orientation = state.orientation;
    let mut minimum = 0;
    let mut natural = 0;
    let mut count = 0;
    for (child, packing) in visible_children(tree, state) {
        let measured = tree.measure(child, orientation, for_size)?;
        let child_minimum = measured.minimum + 2 * packing.padding;
        let child_natural = measured.natural + 2 * packing.padding;
        if state.homogeneous {
            minimum = minimum.max(child_minimum);
            natural = natural.max(child_natural);
        } else {
            minimum += child_minimum;
            natural += child_natural;
        }
        count += 1;
    }

    if state.homogeneous {
        minimum *= count;
        natural *= count;
    }
    if let Some((center, packing)) = visible_center(tree, state) {
        let measured = tree.measure(center, orientation, for_size)?;
        minimum += measured.minimum + 2 * packing.padding;
        natural += measured.natural + 2 * packing.padding;
        count += 1;
    }
    if count > 0 {
        minimum += (count - 1) * state.spacing;
        natural += (count - 1) * state.spacing;
    }
    Ok(Measurement::new(minimum, natural))
}

fn measure_across(tree: &WidgetTree, state: &BoxLayout) -> Result<Measurement> {
    let cross = state.orientation.opposite();
    let mut extent = CrossExtent::default();
    for (child, _) in visible_children(tree, state).chain(visible_center(tree, state)) {
        let measured = tree.measure(child, cross, None)?;
        extent.add(measured, cross, tree.widget(child)?.valign());
    }
    Ok(extent.finish(state.baseline_position))
}

fn measure_across_for(tree: &WidgetTree, state: &BoxLayout, size: i32) -> Result<Measurement> {
    let cross = state.orientation.opposite();
    let slots = plan_slots(tree, state, size, None)?;
    let mut extent = CrossExtent::default();
    for slot in &slots {
        let measured = tree.measure(slot.widget, cross, Some(slot.child_size()))?;
        extent.add(measured, cross, tree.widget(slot.widget)?.valign());
    }
    Ok(extent.finish(state.baseline_position))
}

// --- Allocation ---

/// Space assigned to one child along the orientation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Slot {
    pub widget: WidgetId,
    pub packing: BoxChild,
    /// The child's own minimum, without padding.
    pub minimum: i32,
    /// Slot size including padding.
    pub size: i32,
    pub is_center: bool,
}

impl Slot {
    /// Size the child itself receives along the orientation.
    pub(crate) fn child_size(&self) -> i32 {
        if self.packing.fill {
            (self.size - 2 * self.packing.padding).max(1)
        } else {
            self.minimum
        }
    }
}

struct Requested {
    widget: WidgetId,
    packing: BoxChild,
    measured: Measurement,
    expand: bool,
}

fn requests(
    tree: &WidgetTree,
    state: &BoxLayout,
    children: impl Iterator<Item = (WidgetId, BoxChild)>,
    cross: Option<i32>,
) -> Result<Vec<Requested>> {
    children
        .map(|(widget, packing)| {
            Ok(Requested {
                widget,
                packing,
                measured: tree.measure(widget, state.orientation, cross)?,
                expand: packing.expand || tree.compute_expand(widget, state.orientation)?,
            })
        })
        .collect()
}

/// Slots for every visible child: the start group, then the end group,
/// then the center child if it is visible.
pub(crate) fn plan_slots(
    tree: &WidgetTree,
    state: &BoxLayout,
    total: i32,
    cross: Option<i32>,
) -> Result<Vec<Slot>> {
    let visible = visible_children(tree, state);
    let (start, end): (Vec<_>, Vec<_>) = visible.partition(|(_, packing)| packing.pack == PackType::Start);
    let start = requests(tree, state, start.into_iter(), cross)?;
    let end = requests(tree, state, end.into_iter(), cross)?;

    match visible_center(tree, state) {
        Some(center) => {
            let center = requests(tree, state, std::iter::once(center), cross)?;
            Ok(slots_with_center(state, &start, &end, &center[0], total))
        }
        None => {
            let ordered: Vec<&Requested> = start.iter().chain(end.iter()).collect();
            let available = total - (ordered.len() as i32 - 1).max(0) * state.spacing;
            Ok(distribute_slots(state.homogeneous, &ordered, available))
        }
    }
}

/// Share `available` pixels (spacing already removed) among `children`.
fn distribute_slots(homogeneous: bool, children: &[&Requested], available: i32) -> Vec<Slot> {
    if children.is_empty() {
        return Vec::new();
    }
    let sizes = if homogeneous {
        split_evenly(available.max(0), children.len())
    } else {
        let mut remaining = available;
        let mut requested: Vec<RequestedSize> = children
            .iter()
            .enumerate()
            .map(|(index, child)| {
                remaining -= child.measured.minimum + 2 * child.packing.padding;
                RequestedSize::new(index, child.measured.minimum, child.measured.natural)
            })
            .collect();
        let remaining = distribute_natural(remaining.max(0), &mut requested);
        let expanding = children.iter().filter(|child| child.expand).count();
        let mut extra = split_evenly(remaining, expanding).into_iter();
        children
            .iter()
            .zip(&requested)
            .map(|(child, size)| {
                let grow = if child.expand {
                    extra.next().unwrap_or(0)
                } else {
                    0
                };
                size.minimum + 2 * child.packing.padding + grow
            })
            .collect()
    };

    children
        .iter()
        .zip(sizes)
        .map(|(child, size)| Slot {
            widget: child.widget,
            packing: child.packing,
            minimum: child.measured.minimum,
            size,
            is_center: false,
        })
        .collect()
}

fn slots_with_center(
    state: &BoxLayout,
    start: &[Requested],
    end: &[Requested],
    center: &Requested,
    total: i32,
) -> Vec<Slot> {
    let spacing = state.spacing;
    let sides = [start, end];
    let largest_minimum = start
        .iter()
        .chain(end)
        .map(|child| child.measured.minimum + 2 * child.packing.padding)
        .max()
        .unwrap_or(0);
    let largest_natural = start
        .iter()
        .chain(end)
        .map(|child| child.measured.natural + 2 * child.packing.padding)
        .max()
        .unwrap_or(0);
    let side_extent = |side: &[Requested], natural: bool| -> i32 {
        let children: i32 = if state.homogeneous {
            let largest = if natural { largest_natural } else { largest_minimum };
            largest * side.len() as i32
        } else {
            side.iter()
                .map(|child| {
                    let size = if natural {
                        child.measured.natural
                    } else {
                        child.measured.minimum
                    };
                    size + 2 * child.packing.padding
                })
                .sum()
        };
        children + side.len() as i32 * spacing
    };
    let minimum = sides.map(|side| side_extent(side, false));
    let natural = sides.map(|side| side_extent(side, true));

    let center_minimum = center.measured.minimum + 2 * center.packing.padding;
    let center_natural = center.measured.natural + 2 * center.packing.padding;
    let center_size = if center.expand {
        (total - 2 * natural[0].max(natural[1])).max(center_minimum)
    } else {
        center_natural
            .min(total - minimum[0] - minimum[1])
            .max(center_minimum)
    };

    let mut slots = Vec::with_capacity(start.len() + end.len() + 1);
    if state.homogeneous {
        let ordered: Vec<&Requested> = start.iter().chain(end).collect();
        let available = total - center_size - ordered.len() as i32 * spacing;
        slots.extend(distribute_slots(true, &ordered, available));
    } else {
        let region = (total - center_size) / 2;
        for side in sides {
            let ordered: Vec<&Requested> = side.iter().collect();
            let available = region - side.len() as i32 * spacing;
            slots.extend(distribute_slots(false, &ordered, available));
        }
    }
    slots.push(Slot {
        widget: center.widget,
        packing: center.packing,
        minimum: center.measured.minimum,
        size: center_size,
        is_center: true,
    });
    slots
}

/// Main-axis position and size of each slot's child, relative to the start
/// of the content box, in slot order.
pub(crate) fn position_slots(slots: &[Slot], total: i32, spacing: i32) -> Vec<(i32, i32)> {
    let mut positions = vec![(0, 0); slots.len()];
    let mut start_cursor = 0;
    let mut end_cursor = total;
    for (index, slot) in slots.iter().enumerate() {
        if slot.is_center {
            continue;
        }
        let offset = if slot.packing.fill {
            slot.packing.padding
        } else {
            (slot.size - slot.minimum) / 2
        };
        if slot.packing.pack == PackType::Start {
            positions[index] = (start_cursor + offset, slot.child_size());
            start_cursor += slot.size + spacing;
        } else {
            end_cursor -= slot.size;
            positions[index] = (end_cursor + offset, slot.child_size());
            end_cursor -= spacing;
        }
    }

    if let Some(index) = slots.iter().position(|slot| slot.is_center) {
        let slot = &slots[index];
        let mut pos = (total - slot.size) / 2;
        if pos < start_cursor {
            pos = start_cursor;
        } else if pos + slot.size > end_cursor {
            pos = end_cursor - slot.size;
        }
        let offset = if slot.packing.fill {
            slot.packing.padding
        } else {
            (slot.size - slot.minimum) / 2
        };
        positions[index] = (pos + offset, slot.child_size());
    }
    positions
}

pub(crate) fn plan_allocation(
    tree: &WidgetTree,
    state: &BoxLayout,
    content: Rect,
    baseline: Option<i32>,
    rtl: bool,
) -> Result<Vec<Placement>> {
    let orientation = state.orientation;
    let cross = orientation.opposite();
    let total = content.size(orientation);
    let cross_size = content.size(cross);

    let slots = plan_slots(tree, state, total, Some(cross_size))?;
    let positions = position_slots(&slots, total, state.spacing);

    let baseline = if orientation == Orientation::Horizontal {
        match baseline {
            Some(baseline) => Some(baseline),
            None => {
                let mut extent = CrossExtent::default();
                for (slot, (_, size)) in slots.iter().zip(&positions) {
                    let valign = tree.widget(slot.widget)?.valign();
                    if valign == Align::Baseline {
                        extent.add(tree.measure(slot.widget, cross, Some(*size))?, cross, valign);
                    }
                }
                extent
                    .have_baseline()
                    .then(|| extent.baseline_in(state.baseline_position, cross_size))
            }
        }
    } else {
        None
    };

    #[cfg(feature = "layout-trace")]
    tracing::trace!(target: "trellis::box", ?content, ?baseline, slots = slots.len(), "allocate");

    Ok(slots
        .iter()
        .zip(positions)
        .map(|(slot, (pos, size))| {
            let mut rect = Rect::from_axes(
                orientation,
                content.start(orientation) + pos,
                content.start(cross),
                size,
                cross_size,
            );
            if rtl && orientation == Orientation::Horizontal {
                rect = rect.mirrored_in(&content);
            }
            Placement::new(slot.widget, rect, baseline)
        })
        .collect())
}

pub(crate) fn allocate(
    tree: &mut WidgetTree,
    id: WidgetId,
    content: Rect,
    baseline: Option<i32>,
) -> Result<Rect> {
    let view: &WidgetTree = tree;
    let rtl = view.widget(id)?.style().is_rtl();
    let placements = plan_allocation(view, view.as_box(id)?, content, baseline, rtl)?;
    tree.allocate_placements(&placements)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::widget::Leaf;

    #[test]
    fn test_place_baseline() {
        assert_eq!(place_baseline(BaselinePosition::Top, 10, 5, 40), 10);
        assert_eq!(place_baseline(BaselinePosition::Center, 10, 5, 40), 22);
        assert_eq!(place_baseline(BaselinePosition::Bottom, 10, 5, 40), 35);
    }

    #[test]
    fn test_non_fill_child_is_centered_in_slot() {
        let mut tree = WidgetTree::new();
        let hbox = tree.new_box("box", Orientation::Horizontal);
        let child = tree.new_leaf("child", Leaf::new(20, 40, 10, 10));
        tree.box_mut(hbox).unwrap().pack_start(child, true, false, 0).unwrap();
        let _ = tree.allocate(hbox, Rect::new(0, 0, 100, 10), None).unwrap();
        assert_eq!(tree.allocation(child).unwrap(), Rect::new(40, 0, 20, 10));
    }

    #[test]
    fn test_css_sibling_order_reverses_end_group() {
        let mut tree = WidgetTree::new();
        let hbox = tree.new_box("box", Orientation::Horizontal);
        let a = tree.new_leaf("a", Leaf::default());
        let b = tree.new_leaf("b", Leaf::default());
        let c = tree.new_leaf("c", Leaf::default());
        let d = tree.new_leaf("d", Leaf::default());
        let mut handle = tree.box_mut(hbox).unwrap();
        handle.pack_end(a, false, true, 0).unwrap();
        handle.pack_start(b, false, true, 0).unwrap();
        handle.pack_end(c, false, true, 0).unwrap();
        handle.set_center(Some(d)).unwrap();
        let state = tree.as_box(hbox).unwrap();
        assert_eq!(state.css_sibling_order(false), vec![b, d, c, a]);
        assert_eq!(state.css_sibling_order(true), vec![a, c, d, b]);
    }
}
