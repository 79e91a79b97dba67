//! Scroll adapter around a single child.
//!
//! A viewport gives its child the larger of the visible area and the
//! child's requested size, and publishes that extent through a horizontal
//! and a vertical [`AdjustmentRef`]. The child's rectangle is the *bin*:
//! the scrollable area shifted by the adjustment values.

use crate::adjustment::AdjustmentRef;
use crate::error::Result;
use crate::geometry::Rect;
use crate::tree::WidgetTree;
use crate::types::{Orientation, ScrollablePolicy, ShadowType};
use crate::widget::WidgetId;

/// State of a viewport.
#[derive(Debug)]
pub struct Viewport {
    hadjustment: AdjustmentRef,
    vadjustment: AdjustmentRef,
    hscroll_policy: ScrollablePolicy,
    vscroll_policy: ScrollablePolicy,
    shadow_type: ShadowType,
    child: Option<WidgetId>,
    /// Visible area at the last allocation.
    view: Rect,
}

impl Viewport {
    /// A viewport scrolled by the given adjustments.
    #[must_use]
    pub fn new(hadjustment: AdjustmentRef, vadjustment: AdjustmentRef) -> Self {
        Self {
            hadjustment,
            vadjustment,
            hscroll_policy: ScrollablePolicy::default(),
            vscroll_policy: ScrollablePolicy::default(),
            shadow_type: ShadowType::default(),
            child: None,
            view: Rect::default(),
        }
    }

    /// The scrolled widget.
    #[must_use]
    pub const fn child(&self) -> Option<WidgetId> {
        self.child
    }

    pub(crate) const fn set_child(&mut self, child: Option<WidgetId>) {
        self.child = child;
    }

    /// Horizontal adjustment.
    #[must_use]
    pub const fn hadjustment(&self) -> &AdjustmentRef {
        &self.hadjustment
    }

    /// Vertical adjustment.
    #[must_use]
    pub const fn vadjustment(&self) -> &AdjustmentRef {
        &self.vadjustment
    }

    /// Which horizontal size becomes the scrollable width.
    #[must_use]
    pub const fn hscroll_policy(&self) -> ScrollablePolicy {
        self.hscroll_policy
    }

    /// Which vertical size becomes the scrollable height.
    #[must_use]
    pub const fn vscroll_policy(&self) -> ScrollablePolicy {
        self.vscroll_policy
    }

    /// Frame style; not used by layout.
    #[must_use]
    pub const fn shadow_type(&self) -> ShadowType {
        self.shadow_type
    }

    /// The visible area at the last allocation.
    #[must_use]
    pub const fn view_rect(&self) -> Rect {
        self.view
    }

    /// The scrollable area positioned by the current adjustment values.
    /// Follows value changes without another allocation.
    #[must_use]
    pub fn bin_rect(&self) -> Rect {
        let h = self.hadjustment.values();
        let v = self.vadjustment.values();
        Rect::new(
            self.view.x - h.value as i32,
            self.view.y - v.value as i32,
            h.upper as i32,
            v.upper as i32,
        )
    }

    const fn adjustment(&self, orientation: Orientation) -> &AdjustmentRef {
        match orientation {
            Orientation::Horizontal => &self.hadjustment,
            Orientation::Vertical => &self.vadjustment,
        }
    }

    const fn policy(&self, orientation: Orientation) -> ScrollablePolicy {
        match orientation {
            Orientation::Horizontal => self.hscroll_policy,
            Orientation::Vertical => self.vscroll_policy,
        }
    }
}

/// Mutable access to a viewport.
#[derive(Debug)]
pub struct ViewportMut<'t> {
    tree: &'t mut WidgetTree,
    id: WidgetId,
}

impl WidgetTree {
    /// Mutate a viewport.
    ///
    /// # Errors
    ///
    /// [`LayoutError::WrongKind`](crate::LayoutError::WrongKind) if `id` is
    /// not a viewport.
    pub fn viewport_mut(&mut self, id: WidgetId) -> Result<ViewportMut<'_>> {
        let _ = self.as_viewport(id)?;
        Ok(ViewportMut { tree: self, id })
    }
}

impl ViewportMut<'_> {
    fn state_mut(&mut self) -> Result<&mut Viewport> {
        self.tree.viewport_state_mut(self.id)
    }

    /// Replace the scrolled widget.
    ///
    /// # Errors
    ///
    /// A precondition error if `child` already has a parent.
    pub fn set_child(&mut self, child: Option<WidgetId>) -> Result<()> {
        self.tree.set_bin_child(self.id, child)
    }

    /// Scroll horizontally with `adjustment`; `None` installs a fresh one.
    ///
    /// # Errors
    ///
    /// Only fails for stale handles.
    pub fn set_hadjustment(&mut self, adjustment: Option<AdjustmentRef>) -> Result<()> {
        self.state_mut()?.hadjustment = adjustment.unwrap_or_default();
        Ok(())
    }

    /// Scroll vertically with `adjustment`; `None` installs a fresh one.
    ///
    /// # Errors
    ///
    /// Only fails for stale handles.
    pub fn set_vadjustment(&mut self, adjustment: Option<AdjustmentRef>) -> Result<()> {
        self.state_mut()?.vadjustment = adjustment.unwrap_or_default();
        Ok(())
    }

    /// Which horizontal size becomes the scrollable width.
    ///
    /// # Errors
    ///
    /// Only fails for stale handles.
    pub fn set_hscroll_policy(&mut self, policy: ScrollablePolicy) -> Result<()> {
        self.state_mut()?.hscroll_policy = policy;
        Ok(())
    }

    /// Which vertical size becomes the scrollable height.
    ///
    /// # Errors
    ///
    /// Only fails for stale handles.
    pub fn set_vscroll_policy(&mut self, policy: ScrollablePolicy) -> Result<()> {
        self.state_mut()?.vscroll_policy = policy;
        Ok(())
    }

    /// Frame style.
    ///
    /// # Errors
    ///
    /// Only fails for stale handles.
    pub fn set_shadow_type(&mut self, shadow_type: ShadowType) -> Result<()> {
        self.state_mut()?.shadow_type = shadow_type;
        Ok(())
    }
}

/// Scrollable extent along `orientation`: the child's size for the larger
/// of the view and its requested size on the other axis, never less than
/// the view.
fn scroll_extent(
    tree: &WidgetTree,
    state: &Viewport,
    child: Option<WidgetId>,
    orientation: Orientation,
    view: Rect,
) -> Result<i32> {
    let view_size = view.size(orientation);
    let Some(child) = child.filter(|child| tree.is_drawable(*child)) else {
        return Ok(view_size);
    };
    let other = orientation.opposite();
    let other_request = tree.measure(child, other, None)?;
    let other_size = match state.policy(other) {
        ScrollablePolicy::Minimum => other_request.minimum,
        ScrollablePolicy::Natural => other_request.natural,
    };
    let request = tree.measure(child, orientation, Some(view.size(other).max(other_size)))?;
    let size = match state.policy(orientation) {
        ScrollablePolicy::Minimum => request.minimum,
        ScrollablePolicy::Natural => request.natural,
    };
    Ok(view_size.max(size))
}

/// Publish the view and scrollable sizes through `adjustment`, keeping the
/// value where possible. Right-to-left viewports keep the distance from the
/// right edge instead.
fn configure_adjustment(adjustment: &AdjustmentRef, view_size: i32, upper: i32, rtl: bool) {
    let current = adjustment.values();
    let view_size = f64::from(view_size);
    let upper = f64::from(upper);
    let value = if rtl {
        let distance = current.upper - current.value - current.page_size;
        upper - distance - view_size
    } else {
        current.value
    };
    adjustment.configure(value, 0.0, upper, view_size * 0.1, view_size * 0.9, view_size);
}

pub(crate) fn allocate(tree: &mut WidgetTree, id: WidgetId, content: Rect) -> Result<Rect> {
    let view: &WidgetTree = tree;
    let rtl = view.widget(id)?.style().is_rtl();
    let state = view.as_viewport(id)?;
    let child = state.child;
    let width = scroll_extent(view, state, child, Orientation::Horizontal, content)?;
    let height = scroll_extent(view, state, child, Orientation::Vertical, content)?;
    let hadjustment = state.adjustment(Orientation::Horizontal).clone();
    let vadjustment = state.adjustment(Orientation::Vertical).clone();

    tree.viewport_state_mut(id)?.view = content;
    configure_adjustment(&hadjustment, content.width, width, rtl);
    configure_adjustment(&vadjustment, content.height, height, false);

    tracing::debug!(
        target: "trellis::viewport",
        width,
        height,
        hvalue = hadjustment.value(),
        vvalue = vadjustment.value(),
        "scrollable area"
    );

    let bin = tree.as_viewport(id)?.bin_rect();
    if let Some(child) = child.filter(|child| tree.is_drawable(*child)) {
        let _ = tree.allocate(child, bin, None)?;
    }
    Ok(content)
}
