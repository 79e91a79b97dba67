//! Two-dimensional layout.
//!
//! Grid children occupy a rectangle of cells given by a position and a span
//! on each axis. Positions are arbitrary integers, so children can be
//! attached at negative rows or columns. Sizing works on *lines* (rows or
//! columns):
//!
//! 1. children spanning one line set that line's minimum and natural size,
//!    folding baseline-aligned children into per-row above/below extents;
//! 2. homogeneous axes equalise all lines;
//! 3. spanning children that do not fit grow the lines they cover,
//!    preferring lines that expand;
//! 4. allocation grows lines towards their natural size and shares what is
//!    left among expanding lines, optionally splitting around the baseline
//!    row so that its baseline lands on the one imposed by the parent.
//!
//! A row or column that no visible child occupies is *empty*: it gets no
//! size and no spacing.

use std::collections::BTreeMap;

use rustc_hash::FxHashMap;

use crate::distribute::{RequestedSize, distribute_natural, split_evenly};
use crate::error::{Result, precondition};
use crate::geometry::Rect;
use crate::tree::{Placement, WidgetTree};
use crate::types::{Align, BaselinePosition, Orientation, PositionType, RequestMode};
use crate::widget::{Measurement, WidgetId};

/// Cell rectangle a grid child occupies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GridAttach {
    /// First column.
    pub left: i32,
    /// First row.
    pub top: i32,
    /// Number of columns.
    pub width: i32,
    /// Number of rows.
    pub height: i32,
}

impl GridAttach {
    /// Create an attachment.
    #[must_use]
    pub const fn new(left: i32, top: i32, width: i32, height: i32) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    /// First line along `orientation` (column for horizontal).
    #[must_use]
    pub const fn pos(&self, orientation: Orientation) -> i32 {
        match orientation {
            Orientation::Horizontal => self.left,
            Orientation::Vertical => self.top,
        }
    }

    /// Number of lines along `orientation`.
    #[must_use]
    pub const fn span(&self, orientation: Orientation) -> i32 {
        match orientation {
            Orientation::Horizontal => self.width,
            Orientation::Vertical => self.height,
        }
    }

    const fn covers(&self, left: i32, top: i32) -> bool {
        self.left <= left
            && self.left + self.width > left
            && self.top <= top
            && self.top + self.height > top
    }
}

/// State of a grid container.
#[derive(Debug, Default)]
pub struct Grid {
    children: Vec<WidgetId>,
    attach: FxHashMap<WidgetId, GridAttach>,
    row_spacing: i32,
    column_spacing: i32,
    row_homogeneous: bool,
    column_homogeneous: bool,
    row_baselines: BTreeMap<i32, BaselinePosition>,
    baseline_row: i32,
}

impl Grid {
    /// Children in attach order.
    #[must_use]
    pub fn child_order(&self) -> Vec<WidgetId> {
        self.children.clone()
    }

    /// Cells occupied by `child`.
    #[must_use]
    pub fn child_position(&self, child: WidgetId) -> Option<GridAttach> {
        self.attach.get(&child).copied()
    }

    /// The first child covering cell `(left, top)`.
    #[must_use]
    pub fn child_at(&self, left: i32, top: i32) -> Option<WidgetId> {
        self.children
            .iter()
            .copied()
            .find(|child| self.attach[child].covers(left, top))
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

    /// Whether all rows get the same height.
    #[must_use]
    pub const fn row_homogeneous(&self) -> bool {
        self.row_homogeneous
    }

    /// Whether all columns get the same width.
    #[must_use]
    pub const fn column_homogeneous(&self) -> bool {
        self.column_homogeneous
    }

    /// Baseline position of `row`; rows without one use
    /// [`BaselinePosition::Center`].
    #[must_use]
    pub fn row_baseline_position(&self, row: i32) -> BaselinePosition {
        self.row_baselines.get(&row).copied().unwrap_or_default()
    }

    /// Row whose baseline becomes the grid's baseline.
    #[must_use]
    pub const fn baseline_row(&self) -> i32 {
        self.baseline_row
    }

    const fn spacing(&self, orientation: Orientation) -> i32 {
        match orientation {
            Orientation::Horizontal => self.column_spacing,
            Orientation::Vertical => self.row_spacing,
        }
    }

    const fn homogeneous(&self, orientation: Orientation) -> bool {
        match orientation {
            Orientation::Horizontal => self.column_homogeneous,
            Orientation::Vertical => self.row_homogeneous,
        }
    }

    /// Where a new child spanning `op_span` lines from `op_pos` on the
    /// opposite axis touches the existing children along `orientation`:
    /// after the last one (`max`) or before the first one.
    fn find_attach_position(&self, orientation: Orientation, op_pos: i32, op_span: i32, max: bool) -> i32 {
        let opposite = orientation.opposite();
        let touching = self.attach.values().filter(|attach| {
            attach.pos(opposite) <= op_pos + op_span && op_pos <= attach.pos(opposite) + attach.span(opposite)
        });
        let found = if max {
            touching.map(|attach| attach.pos(orientation) + attach.span(orientation)).max()
        } else {
            touching.map(|attach| attach.pos(orientation)).min()
        };
        found.unwrap_or(0)
    }

    /// Shift lines at or after `position` along `orientation` by one, and
    /// stretch children crossing it.
    fn insert_line(&mut self, orientation: Orientation, position: i32) {
        for attach in self.attach.values_mut() {
            let (pos, span) = (attach.pos(orientation), attach.span(orientation));
            if pos >= position {
                set_axis(attach, orientation, pos + 1, span);
            } else if pos + span > position {
                set_axis(attach, orientation, pos, span + 1);
            }
        }
        if orientation == Orientation::Vertical {
            self.row_baselines = std::mem::take(&mut self.row_baselines)
                .into_iter()
                .map(|(row, pos)| if row >= position { (row + 1, pos) } else { (row, pos) })
                .collect();
        }
    }

    /// Remove line `position`; returns the children left with no lines.
    fn remove_line(&mut self, orientation: Orientation, position: i32) -> Vec<WidgetId> {
        let mut emptied = Vec::new();
        for child in &self.children {
            let Some(attach) = self.attach.get_mut(child) else {
                continue;
            };
            let (mut pos, mut span) = (attach.pos(orientation), attach.span(orientation));
            if pos <= position && pos + span > position {
                span -= 1;
            }
            if pos > position {
                pos -= 1;
            }
            if span <= 0 {
                emptied.push(*child);
            } else {
                set_axis(attach, orientation, pos, span);
            }
        }
        if orientation == Orientation::Vertical {
            self.row_baselines = std::mem::take(&mut self.row_baselines)
                .into_iter()
                .filter(|(row, _)| *row != position)
                .map(|(row, pos)| if row > position { (row - 1, pos) } else { (row, pos) })
                .collect();
        }
        emptied
    }
}

fn set_axis(attach: &mut GridAttach, orientation: Orientation, pos: i32, span: i32) {
    match orientation {
        Orientation::Horizontal => {
            attach.left = pos;
            attach.width = span;
        }
        Orientation::Vertical => {
            attach.top = pos;
            attach.height = span;
        }
    }
}

/// Mutable access to a grid.
#[derive(Debug)]
pub struct GridMut<'t> {
    tree: &'t mut WidgetTree,
    id: WidgetId,
}

impl WidgetTree {
    /// Mutate a grid.
    ///
    /// # Errors
    ///
    /// [`LayoutError::WrongKind`](crate::LayoutError::WrongKind) if `id` is
    /// not a grid.
    pub fn grid_mut(&mut self, id: WidgetId) -> Result<GridMut<'_>> {
        let _ = self.as_grid(id)?;
        Ok(GridMut { tree: self, id })
    }
}

impl GridMut<'_> {
    /// Attach `child` at the end of row 0.
    ///
    /// # Errors
    ///
    /// A precondition error if `child` already has a parent.
    pub fn add(&mut self, child: WidgetId) -> Result<()> {
        let left = self
            .tree
            .as_grid(self.id)?
            .find_attach_position(Orientation::Horizontal, 0, 1, true);
        self.attach(child, left, 0, 1, 1)
    }

    /// Attach `child` covering `width` x `height` cells from
    /// `(left, top)`.
    ///
    /// # Errors
    ///
    /// A precondition error if `child` already has a parent or a span is
    /// smaller than one.
    pub fn attach(&mut self, child: WidgetId, left: i32, top: i32, width: i32, height: i32) -> Result<()> {
        check_span(width, height)?;
        self.tree.adopt(self.id, child, "grid")?;
        let state = self.tree.grid_state_mut(self.id)?;
        state.children.push(child);
        let _ = state
            .attach
            .insert(child, GridAttach::new(left, top, width, height));
        tracing::debug!(target: "trellis::grid", left, top, width, height, "attached child");
        Ok(())
    }

    /// Attach `child` next to `sibling` on `side`. Without a sibling the
    /// child goes next to the existing children in row 0 (left/right) or
    /// column 0 (top/bottom).
    ///
    /// # Errors
    ///
    /// A precondition error if `child` already has a parent, `sibling` is
    /// not in this grid, or a span is smaller than one.
    pub fn attach_next_to(
        &mut self,
        child: WidgetId,
        sibling: Option<WidgetId>,
        side: PositionType,
        width: i32,
        height: i32,
    ) -> Result<()> {
        check_span(width, height)?;
        let state = self.tree.as_grid(self.id)?;
        let (left, top) = match sibling {
            Some(sibling) => {
                let Some(at) = state.child_position(sibling) else {
                    return Err(self.tree.not_a_child("grid", self.id, sibling));
                };
                match side {
                    PositionType::Left => (at.left - width, at.top),
                    PositionType::Right => (at.left + at.width, at.top),
                    PositionType::Top => (at.left, at.top - height),
                    PositionType::Bottom => (at.left, at.top + at.height),
                }
            }
            None => match side {
                PositionType::Left => (
                    state.find_attach_position(Orientation::Horizontal, 0, height, false) - width,
                    0,
                ),
                PositionType::Right => (
                    state.find_attach_position(Orientation::Horizontal, 0, height, true),
                    0,
                ),
                PositionType::Top => (
                    0,
                    state.find_attach_position(Orientation::Vertical, 0, width, false) - height,
                ),
                PositionType::Bottom => (
                    0,
                    state.find_attach_position(Orientation::Vertical, 0, width, true),
                ),
            },
        };
        self.attach(child, left, top, width, height)
    }

    /// Insert a row or column next to `sibling` on `side`, moving children
    /// out of the way.
    ///
    /// # Errors
    ///
    /// A precondition error if `sibling` is not in this grid.
    pub fn insert_next_to(&mut self, sibling: WidgetId, side: PositionType) -> Result<()> {
        let Some(at) = self.tree.as_grid(self.id)?.child_position(sibling) else {
            return Err(self.tree.not_a_child("grid", self.id, sibling));
        };
        match side {
            PositionType::Left => self.insert_column(at.left),
            PositionType::Right => self.insert_column(at.left + at.width),
            PositionType::Top => self.insert_row(at.top),
            PositionType::Bottom => self.insert_row(at.top + at.height),
        }
    }

    /// Move `child` to other cells.
    ///
    /// # Errors
    ///
    /// A precondition error if `child` is not in this grid or a span is
    /// smaller than one.
    pub fn set_child_position(&mut self, child: WidgetId, attach: GridAttach) -> Result<()> {
        check_span(attach.width, attach.height)?;
        let state = self.tree.grid_state_mut(self.id)?;
        match state.attach.get_mut(&child) {
            Some(current) => {
                *current = attach;
                Ok(())
            }
            None => Err(self.tree.not_a_child("grid", self.id, child)),
        }
    }

    /// Insert an empty row at `position`.
    ///
    /// # Errors
    ///
    /// Only fails for stale handles.
    pub fn insert_row(&mut self, position: i32) -> Result<()> {
        self.tree
            .grid_state_mut(self.id)?
            .insert_line(Orientation::Vertical, position);
        Ok(())
    }

    /// Insert an empty column at `position`.
    ///
    /// # Errors
    ///
    /// Only fails for stale handles.
    pub fn insert_column(&mut self, position: i32) -> Result<()> {
        self.tree
            .grid_state_mut(self.id)?
            .insert_line(Orientation::Horizontal, position);
        Ok(())
    }

    /// Remove row `position`. Children only in that row are removed from
    /// the grid.
    ///
    /// # Errors
    ///
    /// Only fails for stale handles.
    pub fn remove_row(&mut self, position: i32) -> Result<()> {
        let emptied = self
            .tree
            .grid_state_mut(self.id)?
            .remove_line(Orientation::Vertical, position);
        emptied.into_iter().try_for_each(|child| self.remove(child))
    }

    /// Remove column `position`. Children only in that column are removed
    /// from the grid.
    ///
    /// # Errors
    ///
    /// Only fails for stale handles.
    pub fn remove_column(&mut self, position: i32) -> Result<()> {
        let emptied = self
            .tree
            .grid_state_mut(self.id)?
            .remove_line(Orientation::Horizontal, position);
        emptied.into_iter().try_for_each(|child| self.remove(child))
    }

    /// Remove `child` from the grid.
    ///
    /// # Errors
    ///
    /// A precondition error if `child` is not in this grid.
    pub fn remove(&mut self, child: WidgetId) -> Result<()> {
        remove(self.tree, self.id, child)
    }

    /// Space between rows.
    ///
    /// # Errors
    ///
    /// A precondition error for negative spacing.
    pub fn set_row_spacing(&mut self, spacing: i32) -> Result<()> {
        check_spacing(spacing)?;
        self.tree.grid_state_mut(self.id)?.row_spacing = spacing;
        Ok(())
    }

    /// Space between columns.
    ///
    /// # Errors
    ///
    /// A precondition error for negative spacing.
    pub fn set_column_spacing(&mut self, spacing: i32) -> Result<()> {
        check_spacing(spacing)?;
        self.tree.grid_state_mut(self.id)?.column_spacing = spacing;
        Ok(())
    }

    /// Give all rows the same height.
    ///
    /// # Errors
    ///
    /// Only fails for stale handles.
    pub fn set_row_homogeneous(&mut self, homogeneous: bool) -> Result<()> {
        self.tree.grid_state_mut(self.id)?.row_homogeneous = homogeneous;
        Ok(())
    }

    /// Give all columns the same width.
    ///
    /// # Errors
    ///
    /// Only fails for stale handles.
    pub fn set_column_homogeneous(&mut self, homogeneous: bool) -> Result<()> {
        self.tree.grid_state_mut(self.id)?.column_homogeneous = homogeneous;
        Ok(())
    }

    /// Where baseline children sit in `row` when it has spare height.
    ///
    /// # Errors
    ///
    /// Only fails for stale handles.
    pub fn set_row_baseline_position(&mut self, row: i32, position: BaselinePosition) -> Result<()> {
        let _ = self
            .tree
            .grid_state_mut(self.id)?
            .row_baselines
            .insert(row, position);
        Ok(())
    }

    /// Row whose baseline becomes the grid's own baseline.
    ///
    /// # Errors
    ///
    /// Only fails for stale handles.
    pub fn set_baseline_row(&mut self, row: i32) -> Result<()> {
        self.tree.grid_state_mut(self.id)?.baseline_row = row;
        Ok(())
    }
}

fn check_span(width: i32, height: i32) -> Result<()> {
    if width < 1 || height < 1 {
        return Err(precondition(
            "grid",
            format!("spans must be >= 1, got {width}x{height}"),
        ));
    }
    Ok(())
}

fn check_spacing(spacing: i32) -> Result<()> {
    if spacing < 0 {
        return Err(precondition("grid", format!("spacing must be >= 0, got {spacing}")));
    }
    Ok(())
}

pub(crate) fn remove(tree: &mut WidgetTree, container: WidgetId, child: WidgetId) -> Result<()> {
    let state = tree.grid_state_mut(container)?;
    if state.attach.remove(&child).is_none() {
        return Err(tree.not_a_child("grid", container, child));
    }
    state.children.retain(|c| *c != child);
    tree.orphan(child)
}

// --- Sizing ---

#[derive(Debug, Clone, Copy, Default)]
struct Line {
    minimum: i32,
    natural: i32,
    minimum_above: Option<i32>,
    minimum_below: Option<i32>,
    natural_above: Option<i32>,
    natural_below: Option<i32>,
    position: i32,
    allocation: i32,
    allocated_baseline: Option<i32>,
    need_expand: bool,
    expand: bool,
    empty: bool,
}

#[derive(Debug, Default)]
struct Lines {
    min: i32,
    max: i32,
    lines: Vec<Line>,
}

impl Lines {
    fn index(&self, pos: i32) -> usize {
        (pos - self.min) as usize
    }

    fn line(&self, pos: i32) -> &Line {
        &self.lines[self.index(pos)]
    }

    fn line_mut(&mut self, pos: i32) -> &mut Line {
        let index = self.index(pos);
        &mut self.lines[index]
    }

    fn contains(&self, pos: i32) -> bool {
        pos >= self.min && pos < self.max
    }
}

#[derive(Debug, Clone, Copy)]
struct RequestChild {
    widget: WidgetId,
    attach: GridAttach,
    visible: bool,
}

/// Scratch state for one measure or allocate pass.
struct GridRequest<'a> {
    tree: &'a WidgetTree,
    grid: &'a Grid,
    children: Vec<RequestChild>,
    lines: [Lines; 2],
}

fn max_opt(a: Option<i32>, b: i32) -> Option<i32> {
    Some(a.map_or(b, |a| a.max(b)))
}

impl<'a> GridRequest<'a> {
    fn new(tree: &'a WidgetTree, grid: &'a Grid) -> Self {
        let children = grid
            .children
            .iter()
            .map(|widget| RequestChild {
                widget: *widget,
                attach: grid.attach[widget],
                visible: tree.is_drawable(*widget),
            })
            .collect();
        Self {
            tree,
            grid,
            children,
            lines: [Lines::default(), Lines::default()],
        }
    }

    fn lines(&self, orientation: Orientation) -> &Lines {
        &self.lines[orientation.index()]
    }

    fn lines_mut(&mut self, orientation: Orientation) -> &mut Lines {
        &mut self.lines[orientation.index()]
    }

    fn count_lines(&mut self, orientation: Orientation) {
        let min = self
            .children
            .iter()
            .map(|child| child.attach.pos(orientation))
            .min()
            .unwrap_or(0);
        let max = self
            .children
            .iter()
            .map(|child| child.attach.pos(orientation) + child.attach.span(orientation))
            .max()
            .unwrap_or(0);
        *self.lines_mut(orientation) = Lines {
            min,
            max,
            lines: vec![Line::default(); (max - min).max(0) as usize],
        };
    }

    fn init(&mut self, orientation: Orientation) -> Result<()> {
        for line in &mut self.lines_mut(orientation).lines {
            *line = Line {
                empty: true,
                ..Line::default()
            };
        }
        for index in 0..self.children.len() {
            let child = self.children[index];
            if !child.visible || child.attach.span(orientation) != 1 {
                continue;
            }
            if self.tree.compute_expand(child.widget, orientation)? {
                self.lines_mut(orientation)
                    .line_mut(child.attach.pos(orientation))
                    .expand = true;
            }
        }
        Ok(())
    }

    /// Lines and spacing currently allocated to `attach` along
    /// `orientation`.
    fn allocation_for(&self, attach: &GridAttach, orientation: Orientation) -> i32 {
        let lines = self.lines(orientation);
        let pos = attach.pos(orientation);
        let span = attach.span(orientation);
        (span - 1) * self.grid.spacing(orientation)
            + (pos..pos + span).map(|p| lines.line(p).allocation).sum::<i32>()
    }

    fn request_for_child(
        &self,
        child: &RequestChild,
        orientation: Orientation,
        contextual: bool,
    ) -> Result<Measurement> {
        let for_size = contextual.then(|| self.allocation_for(&child.attach, orientation.opposite()));
        let mut measured = self.tree.measure(child.widget, orientation, for_size)?;
        if orientation != Orientation::Vertical
            || self.tree.widget(child.widget)?.valign() != Align::Baseline
        {
            measured.minimum_baseline = None;
            measured.natural_baseline = None;
        }
        Ok(measured)
    }

    fn non_spanning(&mut self, orientation: Orientation, contextual: bool) -> Result<()> {
        for index in 0..self.children.len() {
            let child = self.children[index];
            if !child.visible || child.attach.span(orientation) != 1 {
                continue;
            }
            let measured = self.request_for_child(&child, orientation, contextual)?;
            let line = self
                .lines_mut(orientation)
                .line_mut(child.attach.pos(orientation));
            if let Some(minimum_baseline) = measured.minimum_baseline {
                let natural_baseline = measured.natural_baseline.unwrap_or(minimum_baseline);
                line.minimum_above = max_opt(line.minimum_above, minimum_baseline);
                line.minimum_below = max_opt(line.minimum_below, measured.minimum - minimum_baseline);
                line.natural_above = max_opt(line.natural_above, natural_baseline);
                line.natural_below = max_opt(line.natural_below, measured.natural - natural_baseline);
            } else {
                line.minimum = line.minimum.max(measured.minimum);
                line.natural = line.natural.max(measured.natural);
            }
        }

        let min = self.lines(orientation).min;
        let grid = self.grid;
        for (index, line) in self.lines_mut(orientation).lines.iter_mut().enumerate() {
            let (Some(minimum_above), Some(minimum_below), Some(natural_above), Some(natural_below)) = (
                line.minimum_above,
                line.minimum_below,
                line.natural_above,
                line.natural_below,
            ) else {
                continue;
            };
            line.minimum = line.minimum.max(minimum_above + minimum_below);
            line.natural = line.natural.max(natural_above + natural_below);

            let spare_minimum = line.minimum - (minimum_above + minimum_below);
            let spare_natural = line.natural - (natural_above + natural_below);
            let ((min_above, min_below), (nat_above, nat_below)) =
                match grid.row_baseline_position(min + index as i32) {
                    BaselinePosition::Top => ((0, spare_minimum), (0, spare_natural)),
                    BaselinePosition::Center => (
                        (spare_minimum / 2, spare_minimum / 2),
                        (spare_natural / 2, spare_natural / 2),
                    ),
                    BaselinePosition::Bottom => ((spare_minimum, 0), (spare_natural, 0)),
                };
            line.minimum_above = Some(minimum_above + min_above);
            line.minimum_below = Some(minimum_below + min_below);
            line.natural_above = Some(natural_above + nat_above);
            line.natural_below = Some(natural_below + nat_below);
        }
        Ok(())
    }

    fn homogeneous(&mut self, orientation: Orientation) {
        if !self.grid.homogeneous(orientation) {
            return;
        }
        let lines = self.lines_mut(orientation);
        let minimum = lines.lines.iter().map(|l| l.minimum).max().unwrap_or(0);
        let natural = lines.lines.iter().map(|l| l.natural).max().unwrap_or(0);
        for line in &mut lines.lines {
            line.minimum = minimum;
            line.natural = natural;
            // The natural size changed, so the baseline split no longer holds.
            line.minimum_above = None;
            line.minimum_below = None;
            line.natural_above = None;
            line.natural_below = None;
        }
    }

    fn spanning(&mut self, orientation: Orientation, contextual: bool) -> Result<()> {
        let spacing = self.grid.spacing(orientation);
        let homogeneous = self.grid.homogeneous(orientation);
        for index in 0..self.children.len() {
            let child = self.children[index];
            let span = child.attach.span(orientation);
            if !child.visible || span == 1 {
                continue;
            }
            let measured = self.request_for_child(&child, orientation, contextual)?;
            let pos = child.attach.pos(orientation);
            let lines = self.lines_mut(orientation);

            let mut span_minimum = (span - 1) * spacing;
            let mut span_natural = (span - 1) * spacing;
            let mut span_expand = 0;
            for p in pos..pos + span {
                let line = lines.line(p);
                span_minimum += line.minimum;
                span_natural += line.natural;
                if line.expand {
                    span_expand += 1;
                }
            }
            let force_expand = span_expand == 0;
            if force_expand {
                span_expand = span;
            }

            let grow = |lines: &mut Lines, wanted: i32, have: i32, natural: bool| {
                if have >= wanted {
                    return;
                }
                if homogeneous {
                    let total = wanted - (span - 1) * spacing;
                    let share = total / span + i32::from(total % span != 0);
                    for p in pos..pos + span {
                        let line = lines.line_mut(p);
                        if natural {
                            line.natural = line.natural.max(share);
                        } else {
                            line.minimum = line.minimum.max(share);
                        }
                    }
                } else {
                    let mut extra = wanted - have;
                    let mut expand = span_expand;
                    for p in pos..pos + span {
                        let line = lines.line_mut(p);
                        if force_expand || line.expand {
                            let line_extra = extra / expand;
                            if natural {
                                line.natural += line_extra;
                            } else {
                                line.minimum += line_extra;
                            }
                            extra -= line_extra;
                            expand -= 1;
                        }
                    }
                }
            };
            grow(&mut *lines, measured.minimum, span_minimum, false);
            grow(&mut *lines, measured.natural, span_natural, true);
        }
        Ok(())
    }

    /// Mark empty and expanding lines in `[min, max)`. Returns the number of
    /// non-empty lines and of expanding lines in that range.
    fn compute_expand(&mut self, orientation: Orientation, min: i32, max: i32) -> Result<(i32, i32)> {
        let lines = self.lines_mut(orientation);
        let (lo, hi) = (min.max(lines.min), max.min(lines.max));
        for p in lo..hi {
            let line = lines.line_mut(p);
            line.need_expand = false;
            line.expand = false;
            line.empty = true;
        }

        for index in 0..self.children.len() {
            let child = self.children[index];
            let (pos, span) = (child.attach.pos(orientation), child.attach.span(orientation));
            if !child.visible || span != 1 || pos >= max || pos + span <= min {
                continue;
            }
            let expand = self.tree.compute_expand(child.widget, orientation)?;
            let line = self.lines_mut(orientation).line_mut(pos);
            line.empty = false;
            if expand {
                line.expand = true;
            }
        }

        for index in 0..self.children.len() {
            let child = self.children[index];
            let (pos, span) = (child.attach.pos(orientation), child.attach.span(orientation));
            if !child.visible || span == 1 {
                continue;
            }
            let mut has_expand = false;
            for p in pos..pos + span {
                if p >= max || p < min {
                    continue;
                }
                let line = self.lines_mut(orientation).line_mut(p);
                line.empty = false;
                has_expand |= line.expand;
            }
            if !has_expand && self.tree.compute_expand(child.widget, orientation)? {
                for p in pos..pos + span {
                    if p >= max || p < min {
                        continue;
                    }
                    self.lines_mut(orientation).line_mut(p).need_expand = true;
                }
            }
        }

        let mut empty = 0;
        let mut expand = 0;
        for p in lo..hi {
            let line = self.lines_mut(orientation).line_mut(p);
            if line.need_expand {
                line.expand = true;
            }
            if line.empty {
                empty += 1;
            }
            if line.expand {
                expand += 1;
            }
        }
        Ok(((hi - lo).max(0) - empty, expand))
    }

    fn run(&mut self, orientation: Orientation, contextual: bool) -> Result<()> {
        self.init(orientation)?;
        self.non_spanning(orientation, contextual)?;
        self.homogeneous(orientation);
        self.spanning(orientation, contextual)?;
        self.homogeneous(orientation);
        Ok(())
    }

    fn sum(&mut self, orientation: Orientation) -> Result<Measurement> {
        let (nonempty, _) = self.compute_expand(orientation, i32::MIN, i32::MAX)?;
        let spacing = self.grid.spacing(orientation);
        let baseline_row = self.grid.baseline_row;
        let lines = self.lines(orientation);

        let mut minimum = 0;
        let mut natural = 0;
        let mut minimum_baseline = None;
        let mut natural_baseline = None;
        for (index, line) in lines.lines.iter().enumerate() {
            let is_baseline_row =
                orientation == Orientation::Vertical && lines.min + index as i32 == baseline_row;
            if let (true, Some(min_above), Some(nat_above)) =
                (is_baseline_row, line.minimum_above, line.natural_above)
            {
                minimum_baseline = Some(minimum + min_above);
                natural_baseline = Some(natural + nat_above);
            }
            minimum += line.minimum;
            natural += line.natural;
            if !line.empty {
                minimum += spacing;
                natural += spacing;
            }
        }
        if nonempty > 0 {
            minimum -= spacing;
            natural -= spacing;
        }
        Ok(Measurement::with_baselines(
            minimum,
            natural,
            minimum_baseline,
            natural_baseline,
        ))
    }

    fn allocate(&mut self, orientation: Orientation, total: i32, baseline: Option<i32>) -> Result<()> {
        let spacing = self.grid.spacing(orientation);
        let baseline_row = self.grid.baseline_row;
        let (lines_min, lines_max) = (self.lines(orientation).min, self.lines(orientation).max);

        let split_at = match baseline {
            Some(baseline)
                if orientation == Orientation::Vertical
                    && self.lines(orientation).contains(baseline_row) =>
            {
                self.lines(orientation)
                    .line(baseline_row)
                    .minimum_above
                    .map(|above| (baseline_row, baseline - above))
            }
            _ => None,
        };

        let (split, size1, size2, nonempty1, nonempty2, expand1, expand2) = match split_at {
            Some((split, split_pos)) => {
                let (nonempty1, expand1) = self.compute_expand(orientation, lines_min, split)?;
                let (nonempty2, expand2) = self.compute_expand(orientation, split, lines_max)?;
                if nonempty2 > 0 {
                    (
                        split,
                        split_pos - nonempty1 * spacing,
                        (total - split_pos) - (nonempty2 - 1) * spacing,
                        nonempty1,
                        nonempty2,
                        expand1,
                        expand2,
                    )
                } else {
                    (split, total - (nonempty1 - 1) * spacing, 0, nonempty1, 0, expand1, 0)
                }
            }
            None => {
                let (nonempty1, expand1) = self.compute_expand(orientation, lines_min, lines_max)?;
                (lines_max, total - (nonempty1 - 1) * spacing, 0, nonempty1, 0, expand1, 0)
            }
        };

        if nonempty1 == 0 && nonempty2 == 0 {
            return Ok(());
        }
        let homogeneous = self.grid.homogeneous(orientation);
        let lines = self.lines_mut(orientation);

        if homogeneous {
            let mut extra = if nonempty1 > 0 { size1 / nonempty1 } else { 0 };
            let mut rest = if nonempty1 > 0 { size1 % nonempty1 } else { 0 };
            if nonempty2 > 0 {
                let extra2 = size2 / nonempty2;
                if extra2 < extra || nonempty1 == 0 {
                    extra = extra2;
                    rest = size2 % nonempty2;
                }
            }
            for line in &mut lines.lines {
                if line.empty {
                    line.allocation = 0;
                    continue;
                }
                line.allocation = extra;
                if rest > 0 {
                    line.allocation += 1;
                    rest -= 1;
                }
            }
            return Ok(());
        }

        let mut sizes: Vec<RequestedSize> = Vec::with_capacity(lines.lines.len());
        let (mut size1, mut size2) = (size1, size2);
        for (index, line) in lines.lines.iter().enumerate() {
            if line.empty {
                sizes.push(RequestedSize::new(index, 0, 0));
                continue;
            }
            if lines.min + (index as i32) < split {
                size1 -= line.minimum;
            } else {
                size2 -= line.minimum;
            }
            sizes.push(RequestedSize::new(index, line.minimum, line.natural));
        }
        let split_index = lines.index(split).min(sizes.len());
        let (first, second) = sizes.split_at_mut(split_index);
        let size1 = distribute_natural(size1.max(0), first);
        let size2 = distribute_natural(size2.max(0), second);

        let mut extra1 = split_evenly(size1, expand1.max(0) as usize).into_iter();
        let mut extra2 = split_evenly(size2, expand2.max(0) as usize).into_iter();
        for (index, line) in lines.lines.iter_mut().enumerate() {
            if line.empty {
                line.allocation = 0;
                continue;
            }
            line.allocation = sizes[index].minimum;
            if line.expand {
                let extra = if (index as i32) < split - lines.min {
                    extra1.next()
                } else {
                    extra2.next()
                };
                line.allocation += extra.unwrap_or(0);
            }
        }
        Ok(())
    }

    fn position(&mut self, orientation: Orientation, baseline: Option<i32>) {
        let spacing = self.grid.spacing(orientation);
        let baseline_row = self.grid.baseline_row;
        let grid = self.grid;
        let lines = self.lines_mut(orientation);
        let min = lines.min;

        let mut position = 0;
        for (index, line) in lines.lines.iter_mut().enumerate() {
            let row = min + index as i32;
            line.allocated_baseline = None;
            if line.empty {
                line.position = position;
                continue;
            }
            if orientation == Orientation::Vertical {
                if let (Some(above), Some(below)) = (line.minimum_above, line.minimum_below) {
                    line.allocated_baseline = Some(match grid.row_baseline_position(row) {
                        BaselinePosition::Top => above,
                        BaselinePosition::Center => above + (line.allocation - (above + below)) / 2,
                        BaselinePosition::Bottom => line.allocation - below,
                    });
                }
                if let (true, Some(imposed), Some(own)) =
                    (row == baseline_row, baseline, line.allocated_baseline)
                {
                    position = imposed - own;
                }
            }
            line.position = position;
            position += line.allocation + spacing;
        }
    }

    /// Position, size and baseline of `attach` along `orientation`.
    fn child_span(&self, attach: &GridAttach, orientation: Orientation) -> (i32, i32, Option<i32>) {
        let lines = self.lines(orientation);
        let first = lines.line(attach.pos(orientation));
        let baseline = if attach.span(orientation) == 1 {
            first.allocated_baseline
        } else {
            None
        };
        (
            first.position,
            self.allocation_for(attach, orientation),
            baseline,
        )
    }

    fn get_size(&mut self, orientation: Orientation) -> Result<Measurement> {
        self.count_lines(orientation);
        self.run(orientation, false)?;
        self.sum(orientation)
    }

    fn get_size_for_size(&mut self, orientation: Orientation, size: i32) -> Result<Measurement> {
        let other = orientation.opposite();
        self.count_lines(Orientation::Horizontal);
        self.count_lines(Orientation::Vertical);
        self.run(other, false)?;
        let other_minimum = self.sum(other)?.minimum;
        self.allocate(other, size.max(other_minimum), None)?;
        self.run(orientation, true)?;
        self.sum(orientation)
    }
}

pub(crate) fn measure(
    tree: &WidgetTree,
    state: &Grid,
    orientation: Orientation,
    for_size: Option<i32>,
) -> Result<Measurement> {
    if state.children.is_empty() {
        return Ok(Measurement::default());
    }
    let mode = tree.children_request_mode(state.children.iter().copied())?;
    let contextual_mode = match orientation {
        Orientation::Horizontal => RequestMode::WidthForHeight,
        Orientation::Vertical => RequestMode::HeightForWidth,
    };
    let mut request = GridRequest::new(tree, state);
    let measured = match for_size {
        None if mode == contextual_mode => {
            let other = request.get_size(orientation.opposite())?.minimum;
            request.get_size_for_size(orientation, other)?
        }
        None => request.get_size(orientation)?,
        Some(_) if mode != contextual_mode && mode != RequestMode::Constant => {
            request.get_size(orientation)?
        }
        Some(size) => request.get_size_for_size(orientation, size)?,
    };

    #[cfg(feature = "layout-trace")]
    tracing::trace!(target: "trellis::grid", %orientation, ?for_size, ?measured, "measure");

    Ok(measured)
}

fn plan_allocation(
    tree: &WidgetTree,
    state: &Grid,
    content: Rect,
    baseline: Option<i32>,
    rtl: bool,
) -> Result<Vec<Placement>> {
    if state.children.is_empty() {
        return Ok(Vec::new());
    }
    let mode = tree.children_request_mode(state.children.iter().copied())?;
    let first = if mode == RequestMode::WidthForHeight {
        Orientation::Vertical
    } else {
        Orientation::Horizontal
    };
    let second = first.opposite();

    let mut request = GridRequest::new(tree, state);
    request.count_lines(Orientation::Horizontal);
    request.count_lines(Orientation::Vertical);
    request.run(first, false)?;
    request.allocate(first, content.size(first), baseline)?;
    request.run(second, true)?;
    request.allocate(second, content.size(second), baseline)?;
    request.position(Orientation::Horizontal, baseline);
    request.position(Orientation::Vertical, baseline);

    #[cfg(feature = "layout-trace")]
    for orientation in [Orientation::Horizontal, Orientation::Vertical] {
        let lines = request.lines(orientation);
        tracing::trace!(
            target: "trellis::grid",
            %orientation,
            allocations = ?lines.lines.iter().map(|l| l.allocation).collect::<Vec<_>>(),
            "lines"
        );
    }

    let mut placements = Vec::with_capacity(request.children.len());
    for child in &request.children {
        if !child.visible {
            continue;
        }
        let (x, width, _) = request.child_span(&child.attach, Orientation::Horizontal);
        let (y, height, row_baseline) = request.child_span(&child.attach, Orientation::Vertical);
        let mut rect = Rect::new(
            content.x + x,
            content.y + y,
            width.max(1),
            height.max(1),
        );
        if rtl {
            rect = rect.mirrored_in(&content);
        }
        placements.push(Placement::new(child.widget, rect, row_baseline));
    }
    Ok(placements)
}

pub(crate) fn allocate(
    tree: &mut WidgetTree,
    id: WidgetId,
    content: Rect,
    baseline: Option<i32>,
) -> Result<Rect> {
    let view: &WidgetTree = tree;
    let rtl = view.widget(id)?.style().is_rtl();
    let placements = plan_allocation(view, view.as_grid(id)?, content, baseline, rtl)?;
    tree.allocate_placements(&placements)
}
