//! The widget tree and the two-pass protocol.
//!
//! [`WidgetTree`] owns every widget. Containers keep their own child order
//! and per-child records; the tree only knows parent links. Measuring and
//! allocating go through [`WidgetTree::measure`] and
//! [`WidgetTree::allocate`], which wrap each widget's own layout in its
//! style [`Gadget`] and dispatch on the widget kind.

use trellis_tree::Tree;

use crate::adjustment::AdjustmentRef;
use crate::box_layout::{self, BoxLayout};
use crate::button_box::{self, ButtonBox};
use crate::error::{LayoutError, Result, precondition};
use crate::flow_box::{self, FlowBox, FlowBoxChild};
use crate::gadget::Gadget;
use crate::geometry::Rect;
use crate::grid::{self, Grid};
use crate::list_box::{self, ListBox, ListBoxRow};
use crate::style::Style;
use crate::types::{Align, Orientation, RequestMode, TextDirection};
use crate::viewport::{self, Viewport};
use crate::widget::{Leaf, Measurement, Widget, WidgetId, WidgetKind, WidgetType};

/// Where a container wants one of its children.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Placement {
    pub widget: WidgetId,
    pub rect: Rect,
    pub baseline: Option<i32>,
}

impl Placement {
    pub const fn new(widget: WidgetId, rect: Rect, baseline: Option<i32>) -> Self {
        Self {
            widget,
            rect,
            baseline,
        }
    }
}

/// Arena of widgets.
#[derive(Debug, Default)]
pub struct WidgetTree {
    tree: Tree<Widget>,
}

impl WidgetTree {
    /// An empty tree.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a widget; it starts without a parent.
    pub fn insert(&mut self, widget: Widget) -> WidgetId {
        self.tree.insert(widget)
    }

    /// Create a leaf widget.
    pub fn new_leaf(&mut self, name: impl Into<String>, leaf: Leaf) -> WidgetId {
        self.insert(Widget::new(name, WidgetKind::Leaf(leaf)))
    }

    /// Create an empty box.
    pub fn new_box(&mut self, name: impl Into<String>, orientation: Orientation) -> WidgetId {
        self.insert(Widget::new(
            name,
            WidgetKind::Box(BoxLayout::new(orientation)),
        ))
    }

    /// Create an empty button box.
    pub fn new_button_box(&mut self, name: impl Into<String>, orientation: Orientation) -> WidgetId {
        self.insert(Widget::new(
            name,
            WidgetKind::ButtonBox(ButtonBox::new(orientation)),
        ))
    }

    /// Create an empty grid.
    pub fn new_grid(&mut self, name: impl Into<String>) -> WidgetId {
        self.insert(Widget::new(name, WidgetKind::Grid(Grid::default())))
    }

    /// Create an empty flow box.
    pub fn new_flow_box(&mut self, name: impl Into<String>) -> WidgetId {
        self.insert(Widget::new(name, WidgetKind::FlowBox(FlowBox::default())))
    }

    /// Create an empty flow box child wrapper.
    pub fn new_flow_box_child(&mut self, name: impl Into<String>) -> WidgetId {
        self.insert(Widget::new(
            name,
            WidgetKind::FlowBoxChild(FlowBoxChild::default()),
        ))
    }

    /// Create an empty list box.
    pub fn new_list_box(&mut self, name: impl Into<String>) -> WidgetId {
        self.insert(Widget::new(name, WidgetKind::ListBox(ListBox::default())))
    }

    /// Create an empty list box row.
    pub fn new_list_box_row(&mut self, name: impl Into<String>) -> WidgetId {
        self.insert(Widget::new(
            name,
            WidgetKind::ListBoxRow(ListBoxRow::default()),
        ))
    }

    /// Create an empty viewport. Missing adjustments are created.
    pub fn new_viewport(
        &mut self,
        name: impl Into<String>,
        hadjustment: Option<AdjustmentRef>,
        vadjustment: Option<AdjustmentRef>,
    ) -> WidgetId {
        self.insert(Widget::new(
            name,
            WidgetKind::Viewport(Viewport::new(
                hadjustment.unwrap_or_default(),
                vadjustment.unwrap_or_default(),
            )),
        ))
    }

    /// Whether `id` refers to a live widget.
    #[must_use]
    pub fn contains(&self, id: WidgetId) -> bool {
        self.tree.contains(id)
    }

    /// Number of live widgets.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tree.len()
    }

    /// Whether the tree holds no widgets.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }

    /// Look up a widget.
    ///
    /// # Errors
    ///
    /// [`LayoutError::NoSuchWidget`] for stale handles.
    pub fn widget(&self, id: WidgetId) -> Result<&Widget> {
        self.tree
            .get(id)
            .ok_or_else(|| LayoutError::NoSuchWidget(format!("{id:?}")))
    }

    pub(crate) fn widget_mut(&mut self, id: WidgetId) -> Result<&mut Widget> {
        self.tree
            .get_mut(id)
            .ok_or_else(|| LayoutError::NoSuchWidget(format!("{id:?}")))
    }

    /// The widget's name, or its handle when it is gone.
    #[must_use]
    pub fn name(&self, id: WidgetId) -> String {
        self.tree
            .get(id)
            .map_or_else(|| format!("{id:?}"), |widget| widget.name.clone())
    }

    /// The container currently holding `id`.
    #[must_use]
    pub fn parent(&self, id: WidgetId) -> Option<WidgetId> {
        self.tree.parent(id)
    }

    /// The kind tag of `id`.
    ///
    /// # Errors
    ///
    /// [`LayoutError::NoSuchWidget`] for stale handles.
    pub fn widget_type(&self, id: WidgetId) -> Result<WidgetType> {
        Ok(self.widget(id)?.widget_type())
    }

    /// Rectangle assigned by the last allocation.
    ///
    /// # Errors
    ///
    /// [`LayoutError::NoSuchWidget`] for stale handles.
    pub fn allocation(&self, id: WidgetId) -> Result<Rect> {
        Ok(self.widget(id)?.allocation)
    }

    /// Baseline assigned by the last allocation.
    ///
    /// # Errors
    ///
    /// [`LayoutError::NoSuchWidget`] for stale handles.
    pub fn allocated_baseline(&self, id: WidgetId) -> Result<Option<i32>> {
        Ok(self.widget(id)?.allocated_baseline)
    }

    /// Clip reported by the last allocation.
    ///
    /// # Errors
    ///
    /// [`LayoutError::NoSuchWidget`] for stale handles.
    pub fn clip(&self, id: WidgetId) -> Result<Rect> {
        Ok(self.widget(id)?.clip)
    }

    /// Drop a widget and everything it contains.
    ///
    /// # Errors
    ///
    /// A precondition error if the widget still has a parent.
    pub fn destroy(&mut self, id: WidgetId) -> Result<()> {
        if let Some(parent) = self.parent(id) {
            return Err(precondition(
                "tree",
                format!(
                    "cannot destroy '{}' while it is inside '{}'",
                    self.name(id),
                    self.name(parent)
                ),
            ));
        }
        for child in self.children(id)? {
            let _ = self.tree.unparent(child)?;
            self.destroy(child)?;
        }
        let _ = self.tree.remove(id)?;
        Ok(())
    }

    // --- Widget properties ---

    /// Show or hide a widget.
    ///
    /// # Errors
    ///
    /// [`LayoutError::NoSuchWidget`] for stale handles.
    pub fn set_visible(&mut self, id: WidgetId, visible: bool) -> Result<()> {
        let widget = self.widget_mut(id)?;
        if widget.visible == visible {
            return Ok(());
        }
        widget.visible = visible;
        self.visibility_changed(id)
    }

    pub(crate) fn set_child_visible(&mut self, id: WidgetId, child_visible: bool) -> Result<()> {
        self.widget_mut(id)?.child_visible = child_visible;
        Ok(())
    }

    fn visibility_changed(&mut self, id: WidgetId) -> Result<()> {
        let Some(parent) = self.parent(id) else {
            return Ok(());
        };
        if self.widget_type(parent)? == WidgetType::ListBox {
            list_box::row_visibility_changed(self, parent, id)?;
        }
        Ok(())
    }

    /// Set horizontal alignment.
    ///
    /// # Errors
    ///
    /// [`LayoutError::NoSuchWidget`] for stale handles.
    pub fn set_halign(&mut self, id: WidgetId, align: Align) -> Result<()> {
        self.widget_mut(id)?.halign = align;
        Ok(())
    }

    /// Set vertical alignment.
    ///
    /// # Errors
    ///
    /// [`LayoutError::NoSuchWidget`] for stale handles.
    pub fn set_valign(&mut self, id: WidgetId, align: Align) -> Result<()> {
        self.widget_mut(id)?.valign = align;
        Ok(())
    }

    /// Set or clear the explicit horizontal expand flag.
    ///
    /// # Errors
    ///
    /// [`LayoutError::NoSuchWidget`] for stale handles.
    pub fn set_hexpand(&mut self, id: WidgetId, expand: Option<bool>) -> Result<()> {
        self.widget_mut(id)?.hexpand = expand;
        Ok(())
    }

    /// Set or clear the explicit vertical expand flag.
    ///
    /// # Errors
    ///
    /// [`LayoutError::NoSuchWidget`] for stale handles.
    pub fn set_vexpand(&mut self, id: WidgetId, expand: Option<bool>) -> Result<()> {
        self.widget_mut(id)?.vexpand = expand;
        Ok(())
    }

    /// Replace the widget's resolved style.
    ///
    /// # Errors
    ///
    /// [`LayoutError::NoSuchWidget`] for stale handles.
    pub fn set_style(&mut self, id: WidgetId, style: Style) -> Result<()> {
        self.widget_mut(id)?.style = style;
        Ok(())
    }

    /// Set the reading direction of a widget and everything inside it.
    ///
    /// # Errors
    ///
    /// [`LayoutError::NoSuchWidget`] for stale handles.
    pub fn set_direction(&mut self, id: WidgetId, direction: TextDirection) -> Result<()> {
        self.widget_mut(id)?.style.direction = direction;
        for child in self.children(id)? {
            self.set_direction(child, direction)?;
        }
        Ok(())
    }

    /// Replace a leaf's size requests.
    ///
    /// # Errors
    ///
    /// [`LayoutError::WrongKind`] if `id` is not a leaf.
    pub fn set_leaf(&mut self, id: WidgetId, leaf: Leaf) -> Result<()> {
        *self.leaf_state_mut(id)? = leaf;
        Ok(())
    }

    // --- Generic child management ---

    /// Every widget `container` owns, in drawing order. Includes internal
    /// children such as list box headers and placeholders.
    ///
    /// # Errors
    ///
    /// [`LayoutError::NoSuchWidget`] for stale handles.
    pub fn children(&self, container: WidgetId) -> Result<Vec<WidgetId>> {
        let widget = self.widget(container)?;
        Ok(match &widget.kind {
            WidgetKind::Leaf(_) => Vec::new(),
            WidgetKind::Box(state) => state.forall(),
            WidgetKind::ButtonBox(state) => state.base().forall(),
            WidgetKind::Grid(state) => state.child_order(),
            WidgetKind::FlowBox(state) => state.children().iter().collect(),
            WidgetKind::ListBox(state) => state.forall(),
            WidgetKind::FlowBoxChild(state) => state.child().into_iter().collect(),
            WidgetKind::ListBoxRow(state) => state.child().into_iter().collect(),
            WidgetKind::Viewport(state) => state.child().into_iter().collect(),
        })
    }

    /// Add `child` with the container's default placement.
    ///
    /// # Errors
    ///
    /// A precondition error if `child` already has a parent or the
    /// container cannot take another child.
    pub fn add(&mut self, container: WidgetId, child: WidgetId) -> Result<()> {
        match self.widget_type(container)? {
            WidgetType::Box | WidgetType::ButtonBox => self.box_mut(container)?.add(child),
            WidgetType::Grid => self.grid_mut(container)?.add(child),
            WidgetType::FlowBox => self.flow_box_mut(container)?.insert(child, None).map(|_| ()),
            WidgetType::ListBox => self.list_box_mut(container)?.insert(child, None).map(|_| ()),
            WidgetType::FlowBoxChild | WidgetType::ListBoxRow | WidgetType::Viewport => {
                self.set_bin_child(container, Some(child))
            }
            WidgetType::Leaf => Err(precondition(
                "tree",
                format!("'{}' cannot hold children", self.name(container)),
            )),
        }
    }

    /// Remove `child` from `container`, clearing the container's record of
    /// it so it can be added elsewhere.
    ///
    /// # Errors
    ///
    /// A precondition error if `child` is not inside `container`.
    pub fn remove(&mut self, container: WidgetId, child: WidgetId) -> Result<()> {
        match self.widget_type(container)? {
            WidgetType::Box | WidgetType::ButtonBox => box_layout::remove(self, container, child),
            WidgetType::Grid => grid::remove(self, container, child),
            WidgetType::FlowBox => flow_box::remove(self, container, child),
            WidgetType::ListBox => list_box::remove(self, container, child),
            WidgetType::FlowBoxChild | WidgetType::ListBoxRow | WidgetType::Viewport => {
                if self.bin_child(container)? != Some(child) {
                    return Err(self.not_a_child("tree", container, child));
                }
                self.set_bin_child(container, None)
            }
            WidgetType::Leaf => Err(self.not_a_child("tree", container, child)),
        }
    }

    /// The single child of a flow box child, list box row or viewport.
    ///
    /// # Errors
    ///
    /// [`LayoutError::WrongKind`] for other widgets.
    pub fn bin_child(&self, bin: WidgetId) -> Result<Option<WidgetId>> {
        let widget = self.widget(bin)?;
        match &widget.kind {
            WidgetKind::FlowBoxChild(state) => Ok(state.child()),
            WidgetKind::ListBoxRow(state) => Ok(state.child()),
            WidgetKind::Viewport(state) => Ok(state.child()),
            other => Err(LayoutError::WrongKind {
                widget: widget.name.clone(),
                expected: WidgetType::Viewport,
                actual: WidgetType::from(other),
            }),
        }
    }

    /// Replace the single child of a flow box child, list box row or
    /// viewport. The previous child is unparented.
    ///
    /// # Errors
    ///
    /// A precondition error if the new child already has a parent.
    pub fn set_bin_child(&mut self, bin: WidgetId, child: Option<WidgetId>) -> Result<()> {
        let previous = self.bin_child(bin)?;
        if previous == child {
            return Ok(());
        }
        if let Some(child) = child {
            self.adopt(bin, child, "bin")?;
        }
        if let Some(previous) = previous {
            self.orphan(previous)?;
        }
        match &mut self.widget_mut(bin)?.kind {
            WidgetKind::FlowBoxChild(state) => state.set_child(child),
            WidgetKind::ListBoxRow(state) => state.set_child(child),
            WidgetKind::Viewport(state) => state.set_child(child),
            _ => {}
        }
        Ok(())
    }

    pub(crate) fn adopt(
        &mut self,
        parent: WidgetId,
        child: WidgetId,
        component: &str,
    ) -> Result<()> {
        let _ = self.widget(child)?;
        if let Some(current) = self.parent(child) {
            return Err(precondition(
                component,
                format!(
                    "'{}' already has a parent ('{}')",
                    self.name(child),
                    self.name(current)
                ),
            ));
        }
        self.tree.set_parent(child, parent)?;
        Ok(())
    }

    pub(crate) fn orphan(&mut self, child: WidgetId) -> Result<()> {
        let _ = self.tree.unparent(child)?;
        Ok(())
    }

    pub(crate) fn not_a_child(
        &self,
        component: &str,
        container: WidgetId,
        child: WidgetId,
    ) -> LayoutError {
        precondition(
            component,
            format!(
                "'{}' is not a child of '{}'",
                self.name(child),
                self.name(container)
            ),
        )
    }

    /// Whether a widget takes part in layout.
    #[must_use]
    pub fn is_drawable(&self, id: WidgetId) -> bool {
        self.tree.get(id).is_some_and(Widget::is_drawable)
    }

    // --- Size negotiation ---

    /// How the widget trades width against height.
    ///
    /// # Errors
    ///
    /// [`LayoutError::NoSuchWidget`] for stale handles.
    pub fn request_mode(&self, id: WidgetId) -> Result<RequestMode> {
        let widget = self.widget(id)?;
        match &widget.kind {
            WidgetKind::Leaf(leaf) => Ok(leaf.request_mode()),
            WidgetKind::FlowBox(state) => Ok(match state.orientation() {
                Orientation::Horizontal => RequestMode::HeightForWidth,
                Orientation::Vertical => RequestMode::WidthForHeight,
            }),
            WidgetKind::ListBox(_) => Ok(RequestMode::HeightForWidth),
            _ => self.children_request_mode(self.children(id)?),
        }
    }

    /// Majority request mode of the visible widgets in `children`.
    pub(crate) fn children_request_mode(
        &self,
        children: impl IntoIterator<Item = WidgetId>,
    ) -> Result<RequestMode> {
        let mut height_for_width = 0;
        let mut width_for_height = 0;
        for child in children {
            if !self.is_drawable(child) {
                continue;
            }
            match self.request_mode(child)? {
                RequestMode::HeightForWidth => height_for_width += 1,
                RequestMode::WidthForHeight => width_for_height += 1,
                RequestMode::Constant => {}
            }
        }
        Ok(if height_for_width == 0 && width_for_height == 0 {
            RequestMode::Constant
        } else if width_for_height > height_for_width {
            RequestMode::WidthForHeight
        } else {
            RequestMode::HeightForWidth
        })
    }

    /// Whether the widget wants extra space along `orientation`: its
    /// explicit flag if set, otherwise whether any visible child wants it.
    ///
    /// # Errors
    ///
    /// [`LayoutError::NoSuchWidget`] for stale handles.
    pub fn compute_expand(&self, id: WidgetId, orientation: Orientation) -> Result<bool> {
        let widget = self.widget(id)?;
        if let Some(expand) = widget.expand_set(orientation) {
            return Ok(expand);
        }
        for child in self.children(id)? {
            if self.is_drawable(child) && self.compute_expand(child, orientation)? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Measure a widget along `orientation`, given `for_size` on the other
    /// axis. Hidden widgets measure as zero.
    ///
    /// # Errors
    ///
    /// [`LayoutError::InvalidChildGeometry`] if any widget in the subtree
    /// reports inconsistent sizes.
    pub fn measure(
        &self,
        id: WidgetId,
        orientation: Orientation,
        for_size: Option<i32>,
    ) -> Result<Measurement> {
        let widget = self.widget(id)?;
        if !widget.visible {
            return Ok(Measurement::default());
        }
        Gadget::new(&widget.style).measure(orientation, for_size, |for_size| {
            let content = self.measure_content(widget, orientation, for_size)?;
            if content.minimum < 0 || content.natural < content.minimum {
                tracing::warn!(
                    target: "trellis",
                    widget = %widget.name,
                    %orientation,
                    minimum = content.minimum,
                    natural = content.natural,
                    "invalid size request"
                );
                return Err(LayoutError::InvalidChildGeometry {
                    widget: widget.name.clone(),
                    orientation,
                    minimum: content.minimum,
                    natural: content.natural,
                });
            }
            Ok(content)
        })
    }

    fn measure_content(
        &self,
        widget: &Widget,
        orientation: Orientation,
        for_size: Option<i32>,
    ) -> Result<Measurement> {
        match &widget.kind {
            WidgetKind::Leaf(leaf) => Ok(leaf.measure(orientation, for_size)),
            WidgetKind::Box(state) => box_layout::measure(self, state, orientation, for_size),
            WidgetKind::ButtonBox(state) => button_box::measure(self, state, orientation, for_size),
            WidgetKind::Grid(state) => grid::measure(self, state, orientation, for_size),
            WidgetKind::FlowBox(state) => {
                flow_box::measure(self, state, widget.halign, widget.valign, orientation, for_size)
            }
            WidgetKind::ListBox(state) => list_box::measure(self, state, orientation, for_size),
            WidgetKind::FlowBoxChild(state) => self.measure_bin(state.child(), orientation, for_size),
            WidgetKind::ListBoxRow(state) => self.measure_bin(state.child(), orientation, for_size),
            WidgetKind::Viewport(state) => self.measure_bin(state.child(), orientation, for_size),
        }
    }

    fn measure_bin(
        &self,
        child: Option<WidgetId>,
        orientation: Orientation,
        for_size: Option<i32>,
    ) -> Result<Measurement> {
        match child {
            Some(child) if self.is_drawable(child) => {
                let measured = self.measure(child, orientation, for_size)?;
                Ok(measured)
            }
            _ => Ok(Measurement::default()),
        }
    }

    /// Preferred (minimum, natural) sizes in both axes, honouring the
    /// widget's request mode: the primary axis is measured unconstrained
    /// and the other axis for the primary axis' result.
    ///
    /// # Errors
    ///
    /// Propagates measurement errors.
    pub fn preferred_size(&self, id: WidgetId) -> Result<(Measurement, Measurement)> {
        if self.request_mode(id)? == RequestMode::WidthForHeight {
            let height = self.measure(id, Orientation::Vertical, None)?;
            let width = self.measure(id, Orientation::Horizontal, Some(height.natural))?;
            Ok((width, height))
        } else {
            let width = self.measure(id, Orientation::Horizontal, None)?;
            let height = self.measure(id, Orientation::Vertical, Some(width.natural))?;
            Ok((width, height))
        }
    }

    /// Assign `rect` to a widget and lay out its subtree.
    ///
    /// `baseline` is dropped unless the widget's `valign` is
    /// [`Align::Baseline`]. A widget whose alignment is not
    /// [`Align::Fill`] is shrunk to its natural size within `rect`.
    /// Hidden widgets are skipped. Returns the widget's clip.
    ///
    /// # Errors
    ///
    /// Propagates measurement errors from the subtree; nothing below the
    /// failing container is allocated.
    pub fn allocate(&mut self, id: WidgetId, rect: Rect, baseline: Option<i32>) -> Result<Rect> {
        let widget = self.widget(id)?;
        if !widget.visible {
            return Ok(Rect::default());
        }
        let style = widget.style;
        let widget_type = widget.widget_type();
        let baseline = if widget.valign == Align::Baseline {
            baseline
        } else {
            None
        };
        let (rect, baseline) = self.adjust_for_alignment(id, rect, baseline)?;

        #[cfg(feature = "layout-trace")]
        tracing::trace!(target: "trellis", widget = %self.name(id), ?rect, ?baseline, "allocate");

        {
            let widget = self.widget_mut(id)?;
            widget.allocation = rect;
            widget.allocated_baseline = baseline;
        }
        let clip = Gadget::new(&style).allocate(rect, baseline, |content, baseline| {
            self.allocate_content(id, widget_type, content, baseline)
        })?;
        self.widget_mut(id)?.clip = clip;
        Ok(clip)
    }

    fn allocate_content(
        &mut self,
        id: WidgetId,
        widget_type: WidgetType,
        content: Rect,
        baseline: Option<i32>,
    ) -> Result<Rect> {
        match widget_type {
            WidgetType::Leaf => Ok(content),
            WidgetType::Box => box_layout::allocate(self, id, content, baseline),
            WidgetType::ButtonBox => button_box::allocate(self, id, content, baseline),
            WidgetType::Grid => grid::allocate(self, id, content, baseline),
            WidgetType::FlowBox => flow_box::allocate(self, id, content),
            WidgetType::ListBox => list_box::allocate(self, id, content),
            WidgetType::Viewport => viewport::allocate(self, id, content),
            WidgetType::FlowBoxChild | WidgetType::ListBoxRow => {
                match self.bin_child(id)? {
                    Some(child) if self.is_drawable(child) => {
                        self.allocate(child, content, baseline)
                    }
                    _ => Ok(Rect::default()),
                }
            }
        }
    }

    /// Shrink `rect` to the widget's natural size on every axis whose
    /// alignment is not fill, and position it inside `rect`.
    fn adjust_for_alignment(
        &self,
        id: WidgetId,
        rect: Rect,
        baseline: Option<i32>,
    ) -> Result<(Rect, Option<i32>)> {
        let widget = self.widget(id)?;
        let (halign, valign) = (widget.halign, widget.valign);
        let shrink_h = !matches!(halign, Align::Fill | Align::Baseline);
        let shrink_v = valign != Align::Fill && !(valign == Align::Baseline && baseline.is_none());
        if !shrink_h && !shrink_v {
            return Ok((rect, baseline));
        }
        let rtl = widget.style.is_rtl();

        let (natural_width, height) = if self.request_mode(id)? == RequestMode::WidthForHeight {
            let height = self.measure(id, Orientation::Vertical, None)?;
            let for_height = if shrink_v {
                rect.height.min(height.natural)
            } else {
                rect.height
            };
            let width = self.measure(id, Orientation::Horizontal, Some(for_height))?;
            (width.natural, height)
        } else {
            let width = self.measure(id, Orientation::Horizontal, None)?;
            let for_width = if shrink_h {
                rect.width.min(width.natural)
            } else {
                rect.width
            };
            let height = self.measure(id, Orientation::Vertical, Some(for_width))?;
            (width.natural, height)
        };

        let mut adjusted = rect;
        let (x, width) = align_span(halign, rtl, rect.x, rect.width, natural_width);
        adjusted.x = x;
        adjusted.width = width;

        let mut baseline = baseline;
        if valign == Align::Baseline {
            if let (Some(imposed), Some(own)) = (baseline, height.natural_baseline) {
                let size = rect.height.min(height.natural);
                let offset = (imposed - own).clamp(0, rect.height - size);
                adjusted.y = rect.y + offset;
                adjusted.height = size;
                baseline = Some(imposed - offset);
            }
        } else {
            let (y, height) = align_span(valign, false, rect.y, rect.height, height.natural);
            adjusted.y = y;
            adjusted.height = height;
        }
        Ok((adjusted, baseline))
    }

    pub(crate) fn allocate_placements(&mut self, placements: &[Placement]) -> Result<Rect> {
        let mut clip = Rect::default();
        for placement in placements {
            let child_clip = self.allocate(placement.widget, placement.rect, placement.baseline)?;
            clip = clip.union(&child_clip);
        }
        Ok(clip)
    }
}

/// Position and size of a widget along one axis of its slot.
fn align_span(align: Align, rtl: bool, pos: i32, size: i32, natural: i32) -> (i32, i32) {
    let align = match (align, rtl) {
        (Align::Start, true) => Align::End,
        (Align::End, true) => Align::Start,
        (align, _) => align,
    };
    match align {
        Align::Fill | Align::Baseline => (pos, size),
        Align::Start => (pos, size.min(natural)),
        Align::End => {
            if size > natural {
                (pos + size - natural, natural)
            } else {
                (pos, size)
            }
        }
        Align::Center => {
            if size > natural {
                (pos + (size - natural) / 2, natural)
            } else {
                (pos, size)
            }
        }
    }
}

macro_rules! kind_accessors {
    ($($variant:ident => $state:ty, $get:ident $(, $get_mut:ident)?;)*) => {
        impl WidgetTree {
            $(
                #[doc = concat!("The ", stringify!($variant), " state of `id`.")]
                ///
                /// # Errors
                ///
                /// [`LayoutError::WrongKind`] if `id` is another kind of widget.
                pub fn $get(&self, id: WidgetId) -> Result<&$state> {
                    let widget = self.widget(id)?;
                    match &widget.kind {
                        WidgetKind::$variant(state) => Ok(state),
                        other => Err(LayoutError::WrongKind {
                            widget: widget.name.clone(),
                            expected: WidgetType::$variant,
                            actual: WidgetType::from(other),
                        }),
                    }
                }

                $(
                    pub(crate) fn $get_mut(&mut self, id: WidgetId) -> Result<&mut $state> {
                        let widget = self.widget_mut(id)?;
                        match &mut widget.kind {
                            WidgetKind::$variant(state) => Ok(state),
                            other => Err(LayoutError::WrongKind {
                                widget: widget.name.clone(),
                                expected: WidgetType::$variant,
                                actual: WidgetType::from(&*other),
                            }),
                        }
                    }
                )?
            )*
        }
    };
}

kind_accessors! {
    Leaf => Leaf, as_leaf, leaf_state_mut;
    ButtonBox => ButtonBox, as_button_box, button_box_state_mut;
    Grid => Grid, as_grid, grid_state_mut;
    FlowBox => FlowBox, as_flow_box, flow_box_state_mut;
    FlowBoxChild => FlowBoxChild, as_flow_box_child;
    ListBox => ListBox, as_list_box, list_box_state_mut;
    ListBoxRow => ListBoxRow, as_list_box_row, list_box_row_state_mut;
    Viewport => Viewport, as_viewport, viewport_state_mut;
}

impl WidgetTree {
    /// The linear layout state of a box or button box.
    ///
    /// # Errors
    ///
    /// [`LayoutError::WrongKind`] if `id` is neither.
    pub fn as_box(&self, id: WidgetId) -> Result<&BoxLayout> {
        let widget = self.widget(id)?;
        match &widget.kind {
            WidgetKind::Box(state) => Ok(state),
            WidgetKind::ButtonBox(state) => Ok(state.base()),
            other => Err(LayoutError::WrongKind {
                widget: widget.name.clone(),
                expected: WidgetType::Box,
                actual: WidgetType::from(other),
            }),
        }
    }

    pub(crate) fn box_state_mut(&mut self, id: WidgetId) -> Result<&mut BoxLayout> {
        let widget = self.widget_mut(id)?;
        match &mut widget.kind {
            WidgetKind::Box(state) => Ok(state),
            WidgetKind::ButtonBox(state) => Ok(state.base_mut()),
            other => Err(LayoutError::WrongKind {
                widget: widget.name.clone(),
                expected: WidgetType::Box,
                actual: WidgetType::from(&*other),
            }),
        }
    }
}
