//! Button boxes.
//!
//! A button box is a [`BoxLayout`] whose children are usually buttons. It
//! gives every child a common size (at least the configured child minimum)
//! and spreads the children according to a [`ButtonBoxStyle`]. Children can
//! be marked secondary, which moves them to the opposite end of the box.
//! The `Expand` style hands layout back to the plain box algorithm in
//! homogeneous mode.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

use crate::box_layout::{self, BoxLayout, place_baseline};
use crate::error::{Result, precondition};
use crate::geometry::Rect;
use crate::tree::{Placement, WidgetTree};
use crate::types::{Align, BaselinePosition, Orientation};
use crate::widget::{Measurement, WidgetId};

/// Default minimum child width.
pub const DEFAULT_CHILD_MIN_WIDTH: i32 = 85;
/// Default minimum child height.
pub const DEFAULT_CHILD_MIN_HEIGHT: i32 = 27;
/// Default horizontal padding added inside each child.
pub const DEFAULT_CHILD_IPAD_X: i32 = 4;
/// Default vertical padding added inside each child.
pub const DEFAULT_CHILD_IPAD_Y: i32 = 0;
/// A non-homogeneous child keeps its own size when it is this many times
/// larger than the average child.
pub const NON_HOMOGENEOUS_THRESHOLD: f64 = 1.5;

/// How a button box spreads its children.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ButtonBoxStyle {
    /// Equal gaps before, between and after the children.
    Spread,
    /// First child at the start, last at the end, equal gaps between.
    #[default]
    Edge,
    /// Primaries packed at the start, secondaries at the end.
    Start,
    /// Primaries packed at the end, secondaries at the start.
    End,
    /// Primaries centered, secondaries at the start.
    Center,
    /// Plain homogeneous box layout.
    Expand,
}

/// Button-box specific record for one child.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ButtonBoxChild {
    /// Placed in the secondary group.
    pub secondary: bool,
    /// Exempt from the common child size when much larger than average.
    pub non_homogeneous: bool,
}

/// State of a button box.
#[derive(Debug)]
pub struct ButtonBox {
    base: BoxLayout,
    layout: ButtonBoxStyle,
    child_min_width: i32,
    child_min_height: i32,
    child_ipad_x: i32,
    child_ipad_y: i32,
    children: FxHashMap<WidgetId, ButtonBoxChild>,
}

impl ButtonBox {
    /// An empty button box with the default style.
    #[must_use]
    pub fn new(orientation: Orientation) -> Self {
        Self {
            base: BoxLayout::new(orientation),
            layout: ButtonBoxStyle::default(),
            child_min_width: DEFAULT_CHILD_MIN_WIDTH,
            child_min_height: DEFAULT_CHILD_MIN_HEIGHT,
            child_ipad_x: DEFAULT_CHILD_IPAD_X,
            child_ipad_y: DEFAULT_CHILD_IPAD_Y,
            children: FxHashMap::default(),
        }
    }

    /// The underlying box.
    #[must_use]
    pub const fn base(&self) -> &BoxLayout {
        &self.base
    }

    pub(crate) fn base_mut(&mut self) -> &mut BoxLayout {
        &mut self.base
    }

    /// Current layout style.
    #[must_use]
    pub const fn layout(&self) -> ButtonBoxStyle {
        self.layout
    }

    /// Minimum child size as `(width, height)`.
    #[must_use]
    pub const fn child_min_size(&self) -> (i32, i32) {
        (self.child_min_width, self.child_min_height)
    }

    /// Internal child padding as `(x, y)`.
    #[must_use]
    pub const fn child_ipadding(&self) -> (i32, i32) {
        (self.child_ipad_x, self.child_ipad_y)
    }

    /// Button-box record of a child; unrecorded children are primary and
    /// homogeneous.
    #[must_use]
    pub fn child(&self, child: WidgetId) -> ButtonBoxChild {
        self.children.get(&child).copied().unwrap_or_default()
    }

    pub(crate) fn forget(&mut self, child: WidgetId) {
        let _ = self.children.remove(&child);
    }
}

/// Mutable access to the button-box specific properties. Packing goes
/// through [`WidgetTree::box_mut`].
#[derive(Debug)]
pub struct ButtonBoxMut<'t> {
    tree: &'t mut WidgetTree,
    id: WidgetId,
}

impl WidgetTree {
    /// Mutate a button box.
    ///
    /// # Errors
    ///
    /// [`LayoutError::WrongKind`](crate::LayoutError::WrongKind) if `id` is
    /// not a button box.
    pub fn button_box_mut(&mut self, id: WidgetId) -> Result<ButtonBoxMut<'_>> {
        let _ = self.as_button_box(id)?;
        Ok(ButtonBoxMut { tree: self, id })
    }
}

impl ButtonBoxMut<'_> {
    /// Change the layout style. `Expand` turns on the box's homogeneous
    /// mode; every other style turns it off.
    ///
    /// # Errors
    ///
    /// Only fails for stale handles.
    pub fn set_layout(&mut self, layout: ButtonBoxStyle) -> Result<()> {
        let state = self.tree.button_box_state_mut(self.id)?;
        if state.layout != layout {
            state.layout = layout;
            state.base.set_homogeneous(layout == ButtonBoxStyle::Expand);
        }
        Ok(())
    }

    /// Move `child` into or out of the secondary group. With the `Expand`
    /// style the child is also reordered: secondaries first.
    ///
    /// # Errors
    ///
    /// A precondition error if `child` is not in this button box.
    pub fn set_child_secondary(&mut self, child: WidgetId, secondary: bool) -> Result<()> {
        let state = self.state_with(child)?;
        state.children.entry(child).or_default().secondary = secondary;
        if state.layout == ButtonBoxStyle::Expand {
            let position = if secondary { Some(0) } else { None };
            let _ = state.base.reorder(child, position);
        }
        Ok(())
    }

    /// Whether `child` is in the secondary group.
    ///
    /// # Errors
    ///
    /// A precondition error if `child` is not in this button box.
    pub fn child_secondary(&mut self, child: WidgetId) -> Result<bool> {
        Ok(self.state_with(child)?.child(child).secondary)
    }

    /// Exempt `child` from the common child size.
    ///
    /// # Errors
    ///
    /// A precondition error if `child` is not in this button box.
    pub fn set_child_non_homogeneous(&mut self, child: WidgetId, non_homogeneous: bool) -> Result<()> {
        self.state_with(child)?
            .children
            .entry(child)
            .or_default()
            .non_homogeneous = non_homogeneous;
        Ok(())
    }

    /// Whether `child` is exempt from the common child size.
    ///
    /// # Errors
    ///
    /// A precondition error if `child` is not in this button box.
    pub fn child_non_homogeneous(&mut self, child: WidgetId) -> Result<bool> {
        Ok(self.state_with(child)?.child(child).non_homogeneous)
    }

    /// Smallest size any homogeneous child gets.
    ///
    /// # Errors
    ///
    /// A precondition error for negative sizes.
    pub fn set_child_min_size(&mut self, width: i32, height: i32) -> Result<()> {
        if width < 0 || height < 0 {
            return Err(precondition(
                "button_box",
                format!("child minimum size must be >= 0, got {width}x{height}"),
            ));
        }
        let state = self.tree.button_box_state_mut(self.id)?;
        state.child_min_width = width;
        state.child_min_height = height;
        Ok(())
    }

    /// Padding added on both sides of every child's natural size.
    ///
    /// # Errors
    ///
    /// A precondition error for negative padding.
    pub fn set_child_ipadding(&mut self, x: i32, y: i32) -> Result<()> {
        if x < 0 || y < 0 {
            return Err(precondition(
                "button_box",
                format!("child padding must be >= 0, got {x}x{y}"),
            ));
        }
        let state = self.tree.button_box_state_mut(self.id)?;
        state.child_ipad_x = x;
        state.child_ipad_y = y;
        Ok(())
    }

    fn state_with(&mut self, child: WidgetId) -> Result<&mut ButtonBox> {
        if !self.tree.as_button_box(self.id)?.base.contains(child) {
            return Err(self.tree.not_a_child("button_box", self.id, child));
        }
        self.tree.button_box_state_mut(self.id)
    }
}

/// Per-child sizes shared by measurement and allocation.
struct Requisition {
    children: Vec<(WidgetId, bool)>,
    widths: Vec<i32>,
    heights: Vec<i32>,
    baselines: Vec<Option<i32>>,
    baseline: Option<i32>,
    baseline_height: i32,
}

impl Requisition {
    fn sizes(&self, orientation: Orientation) -> &[i32] {
        match orientation {
            Orientation::Horizontal => &self.widths,
            Orientation::Vertical => &self.heights,
        }
    }
}

/// A child's natural size and baseline.
struct Natural {
    widget: WidgetId,
    width: i32,
    height: i32,
    baseline: Option<i32>,
}

/// Whether a child with `size` along one axis gets the common size.
fn is_uniform(homogeneous: bool, non_homogeneous: bool, size: i32, average: i32) -> bool {
    homogeneous || !non_homogeneous || f64::from(size) < f64::from(average) * NON_HOMOGENEOUS_THRESHOLD
}

fn child_requisition(tree: &WidgetTree, state: &ButtonBox) -> Result<Requisition> {
    let horizontal = state.base.orientation() == Orientation::Horizontal;
    let ipad_w = state.child_ipad_x * 2;
    let ipad_h = state.child_ipad_y * 2;
    let homogeneous = state.base.homogeneous();

    let mut naturals = Vec::new();
    for widget in state.base.forall() {
        if !tree.is_drawable(widget) {
            continue;
        }
        let (width, height) = tree.preferred_size(widget)?;
        let baseline = if horizontal && tree.widget(widget)?.valign() == Align::Baseline {
            height.natural_baseline
        } else {
            None
        };
        naturals.push(Natural {
            widget,
            width: width.natural,
            height: height.natural,
            baseline,
        });
    }

    let count = naturals.len().max(1) as i32;
    let average_width = naturals.iter().map(|n| n.width + ipad_w).sum::<i32>() / count;
    let average_height = naturals.iter().map(|n| n.height + ipad_h).sum::<i32>() / count;

    let mut max_above = 0;
    let mut max_below = 0;
    let mut have_baseline = false;
    for natural in &naturals {
        if let Some(baseline) = natural.baseline {
            have_baseline = true;
            max_above = max_above.max(baseline + state.child_ipad_y);
            max_below = max_below.max(natural.height + ipad_h - (baseline + state.child_ipad_y));
        }
    }

    let mut needed_width = state.child_min_width;
    let mut needed_height = state.child_min_height;
    let mut widths = Vec::with_capacity(naturals.len());
    let mut heights = Vec::with_capacity(naturals.len());
    let mut children = Vec::with_capacity(naturals.len());
    let mut baselines = Vec::with_capacity(naturals.len());
    for natural in &naturals {
        let record = state.child(natural.widget);
        children.push((natural.widget, record.secondary));
        let width = natural.width + ipad_w;
        if is_uniform(homogeneous, record.non_homogeneous, width, average_width) {
            widths.push(None);
            needed_width = needed_width.max(width);
        } else {
            widths.push(Some(width));
        }
        let height = natural.height + ipad_h;
        if is_uniform(homogeneous, record.non_homogeneous, height, average_height) {
            heights.push(None);
            needed_height = needed_height.max(height);
        } else {
            heights.push(Some(height));
        }
        baselines.push(natural.baseline.map(|b| b + state.child_ipad_y));
    }

    Ok(Requisition {
        children,
        widths: widths.into_iter().map(|w| w.unwrap_or(needed_width)).collect(),
        heights: heights.into_iter().map(|h| h.unwrap_or(needed_height)).collect(),
        baselines,
        baseline: have_baseline.then_some(max_above),
        baseline_height: max_above + max_below,
    })
}

pub(crate) fn measure(
    tree: &WidgetTree,
    state: &ButtonBox,
    orientation: Orientation,
    for_size: Option<i32>,
) -> Result<Measurement> {
    if state.layout == ButtonBoxStyle::Expand {
        return box_layout::measure(tree, &state.base, orientation, for_size);
    }

    let box_orientation = state.base.orientation();
    let requisition = child_requisition(tree, state)?;
    let count = requisition.children.len() as i32;
    if count == 0 {
        return Ok(Measurement::default());
    }

    if orientation == box_orientation {
        let mut total: i32 = requisition.sizes(orientation).iter().sum();
        total += match state.layout {
            ButtonBoxStyle::Spread => (count + 1) * state.base.spacing(),
            _ => (count - 1) * state.base.spacing(),
        };
        return Ok(Measurement::new(total, total));
    }

    let mut size = requisition.sizes(orientation).iter().copied().max().unwrap_or(0);
    if orientation == Orientation::Vertical {
        let mut max_above = 0;
        let mut max_below = 0;
        for (height, baseline) in requisition.heights.iter().zip(&requisition.baselines) {
            if let Some(baseline) = baseline {
                max_above = max_above.max(*baseline);
                max_below = max_below.max(height - baseline);
            }
        }
        if requisition.baseline.is_some() {
            size = size.max(max_above + max_below);
            let baseline = place_baseline(state.base.baseline_position(), max_above, max_below, size);
            return Ok(Measurement::with_baselines(size, size, Some(baseline), Some(baseline)));
        }
    }
    Ok(Measurement::new(size, size))
}

fn plan_allocation(
    tree: &WidgetTree,
    state: &ButtonBox,
    content: Rect,
    rtl: bool,
) -> Result<Vec<Placement>> {
    let orientation = state.base.orientation();
    let cross = orientation.opposite();
    let requisition = child_requisition(tree, state)?;
    let sizes = requisition.sizes(orientation);
    let spacing = state.base.spacing();

    let baseline = requisition.baseline.map(|baseline| {
        match state.base.baseline_position() {
            BaselinePosition::Top => baseline,
            BaselinePosition::Center => {
                baseline + (content.height - requisition.baseline_height) / 2
            }
            BaselinePosition::Bottom => {
                content.height - (requisition.baseline_height - baseline)
            }
        }
    });

    let count = requisition.children.len() as i32;
    let n_secondaries = requisition.children.iter().filter(|(_, s)| *s).count() as i32;
    let n_primaries = count - n_secondaries;
    let (mut primary_size, mut secondary_size) = (0, 0);
    for ((_, secondary), size) in requisition.children.iter().zip(sizes) {
        if *secondary {
            secondary_size += size;
        } else {
            primary_size += size;
        }
    }
    let total_size = primary_size + secondary_size;
    let extent = content.size(orientation);

    let (child_spacing, mut primary_pos, mut secondary_pos) = match state.layout {
        ButtonBoxStyle::Spread => {
            let gap = (extent - total_size) / (count + 1);
            (gap, gap, gap + primary_size + n_primaries * gap)
        }
        ButtonBoxStyle::Edge if count >= 2 => {
            let gap = (extent - total_size) / (count - 1);
            (gap, 0, primary_size + n_primaries * gap)
        }
        ButtonBoxStyle::Edge => {
            let first = sizes.first().copied().unwrap_or(0);
            let pos = (extent - first) / 2;
            (extent, pos, pos)
        }
        ButtonBoxStyle::Start => (
            spacing,
            0,
            extent - secondary_size - spacing * (n_secondaries - 1),
        ),
        ButtonBoxStyle::End => (
            spacing,
            extent - primary_size - spacing * (n_primaries - 1),
            0,
        ),
        ButtonBoxStyle::Center | ButtonBoxStyle::Expand => (
            spacing,
            (extent - (primary_size + spacing * (n_primaries - 1))) / 2
                + (secondary_size + n_secondaries * spacing) / 2,
            0,
        ),
    };

    let cross_extent = content.size(cross);
    let mut placements = Vec::with_capacity(requisition.children.len());
    for (index, (widget, secondary)) in requisition.children.iter().enumerate() {
        let main_size = sizes[index];
        let cross_size = requisition.sizes(cross)[index];
        let main_pos = if *secondary {
            let pos = secondary_pos;
            secondary_pos += main_size + child_spacing;
            pos
        } else {
            let pos = primary_pos;
            primary_pos += main_size + child_spacing;
            pos
        };

        let mut cross_pos = (cross_extent - cross_size) / 2;
        let mut child_baseline = None;
        if let (Orientation::Horizontal, Some(baseline), Some(own)) =
            (orientation, baseline, requisition.baselines[index])
        {
            cross_pos = baseline - own;
            child_baseline = Some(own);
        }

        let mut rect = Rect::from_axes(
            orientation,
            content.start(orientation) + main_pos,
            content.start(cross) + cross_pos,
            main_size,
            cross_size,
        );
        if rtl && orientation == Orientation::Horizontal {
            rect = rect.mirrored_in(&content);
        }
        placements.push(Placement::new(*widget, rect, child_baseline));
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
    let state = view.as_button_box(id)?;
    if state.layout == ButtonBoxStyle::Expand {
        return box_layout::allocate(tree, id, content, baseline);
    }
    let rtl = view.widget(id)?.style().is_rtl();
    let placements = plan_allocation(view, state, content, rtl)?;

    #[cfg(feature = "layout-trace")]
    tracing::trace!(target: "trellis::button_box", ?content, layout = %state.layout, children = placements.len(), "allocate");

    tree.allocate_placements(&placements)
}
