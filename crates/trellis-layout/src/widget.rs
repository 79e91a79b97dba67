//! Widgets and the size-request contract.

use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumDiscriminants};

use crate::box_layout::BoxLayout;
use crate::button_box::ButtonBox;
use crate::flow_box::{FlowBox, FlowBoxChild};
use crate::geometry::Rect;
use crate::grid::Grid;
use crate::list_box::{ListBox, ListBoxRow};
use crate::style::Style;
use crate::types::{Align, Orientation, RequestMode};
use crate::viewport::Viewport;

/// Handle to a widget in a [`WidgetTree`](crate::WidgetTree).
pub type WidgetId = trellis_tree::NodeId;

/// Result of measuring one axis.
///
/// Baselines are offsets from the top of the measured box; they only exist
/// for vertical measurements.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Measurement {
    /// Smallest usable size.
    pub minimum: i32,
    /// Preferred size.
    pub natural: i32,
    /// Baseline at the minimum size.
    pub minimum_baseline: Option<i32>,
    /// Baseline at the natural size.
    pub natural_baseline: Option<i32>,
}

impl Measurement {
    /// A measurement without baselines.
    #[must_use]
    pub const fn new(minimum: i32, natural: i32) -> Self {
        Self {
            minimum,
            natural,
            minimum_baseline: None,
            natural_baseline: None,
        }
    }

    /// A measurement with baselines.
    #[must_use]
    pub const fn with_baselines(
        minimum: i32,
        natural: i32,
        minimum_baseline: Option<i32>,
        natural_baseline: Option<i32>,
    ) -> Self {
        Self {
            minimum,
            natural,
            minimum_baseline,
            natural_baseline,
        }
    }
}

/// A leaf widget with fixed size requests.
///
/// Leaves stand in for buttons, labels and other content the layout engine
/// does not implement itself. A leaf with `wrap_area` behaves like wrapping
/// text: its height for a given width is `ceil(wrap_area / width)`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Leaf {
    /// Minimum width.
    pub min_width: i32,
    /// Natural width.
    pub nat_width: i32,
    /// Minimum height.
    pub min_height: i32,
    /// Natural height.
    pub nat_height: i32,
    /// Baseline offset from the top, if the leaf has text.
    pub baseline: Option<i32>,
    /// Area to wrap into the available width (height-for-width leaves).
    pub wrap_area: Option<i32>,
}

impl Leaf {
    /// A leaf with the given minimum and natural sizes.
    #[must_use]
    pub const fn new(min_width: i32, nat_width: i32, min_height: i32, nat_height: i32) -> Self {
        Self {
            min_width,
            nat_width,
            min_height,
            nat_height,
            baseline: None,
            wrap_area: None,
        }
    }

    /// A leaf whose minimum and natural sizes coincide.
    #[must_use]
    pub const fn fixed(width: i32, height: i32) -> Self {
        Self::new(width, width, height, height)
    }

    /// A height-for-width leaf that wraps `area` pixels into whatever
    /// width it gets, never narrower than `min_width`.
    #[must_use]
    pub const fn wrapping(min_width: i32, nat_width: i32, area: i32) -> Self {
        Self {
            min_width,
            nat_width,
            min_height: 0,
            nat_height: 0,
            baseline: None,
            wrap_area: Some(area),
        }
    }

    /// Set the baseline offset.
    #[must_use]
    pub const fn with_baseline(mut self, baseline: i32) -> Self {
        self.baseline = Some(baseline);
        self
    }

    /// How this leaf trades width against height.
    #[must_use]
    pub const fn request_mode(&self) -> RequestMode {
        if self.wrap_area.is_some() {
            RequestMode::HeightForWidth
        } else {
            RequestMode::Constant
        }
    }

    pub(crate) fn measure(&self, orientation: Orientation, for_size: Option<i32>) -> Measurement {
        match orientation {
            Orientation::Horizontal => Measurement::new(self.min_width, self.nat_width),
            Orientation::Vertical => {
                if let Some(area) = self.wrap_area {
                    let width = for_size
                        .unwrap_or(self.nat_width)
                        .max(self.min_width)
                        .max(1);
                    let height = (area + width - 1) / width;
                    let height = height.max(self.min_height);
                    return Measurement::new(height, height.max(self.nat_height));
                }
                Measurement::with_baselines(
                    self.min_height,
                    self.nat_height,
                    self.baseline,
                    self.baseline,
                )
            }
        }
    }
}

/// Per-kind widget state.
#[derive(Debug, EnumDiscriminants)]
#[strum_discriminants(name(WidgetType), derive(Display, Hash))]
pub enum WidgetKind {
    /// Content with fixed size requests.
    Leaf(Leaf),
    /// Linear packing container.
    Box(BoxLayout),
    /// Linear container with button layout styles.
    ButtonBox(ButtonBox),
    /// Two-dimensional container.
    Grid(Grid),
    /// Reflowing container.
    FlowBox(FlowBox),
    /// Wrapper around one flow box child.
    FlowBoxChild(FlowBoxChild),
    /// Vertical list container.
    ListBox(ListBox),
    /// Wrapper around one list box row.
    ListBoxRow(ListBoxRow),
    /// Scrolling adapter around one child.
    Viewport(Viewport),
}

/// A node in the widget tree: the state every widget carries plus its kind.
#[derive(Debug)]
pub struct Widget {
    pub(crate) name: String,
    pub(crate) visible: bool,
    pub(crate) child_visible: bool,
    pub(crate) halign: Align,
    pub(crate) valign: Align,
    pub(crate) hexpand: Option<bool>,
    pub(crate) vexpand: Option<bool>,
    pub(crate) style: Style,
    pub(crate) allocation: Rect,
    pub(crate) allocated_baseline: Option<i32>,
    pub(crate) clip: Rect,
    pub(crate) kind: WidgetKind,
}

impl Widget {
    /// A visible widget with default alignment and style.
    #[must_use]
    pub fn new(name: impl Into<String>, kind: WidgetKind) -> Self {
        Self {
            name: name.into(),
            visible: true,
            child_visible: true,
            halign: Align::Fill,
            valign: Align::Fill,
            hexpand: None,
            vexpand: None,
            style: Style::default(),
            allocation: Rect::default(),
            allocated_baseline: None,
            clip: Rect::default(),
            kind,
        }
    }

    /// Diagnostic name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The widget's own visibility flag.
    #[must_use]
    pub const fn visible(&self) -> bool {
        self.visible
    }

    /// Visibility as controlled by the parent (filtering).
    #[must_use]
    pub const fn child_visible(&self) -> bool {
        self.child_visible
    }

    /// Whether the widget takes part in layout.
    #[must_use]
    pub const fn is_drawable(&self) -> bool {
        self.visible && self.child_visible
    }

    /// Horizontal alignment.
    #[must_use]
    pub const fn halign(&self) -> Align {
        self.halign
    }

    /// Vertical alignment.
    #[must_use]
    pub const fn valign(&self) -> Align {
        self.valign
    }

    /// Alignment along `orientation`.
    #[must_use]
    pub const fn align(&self, orientation: Orientation) -> Align {
        match orientation {
            Orientation::Horizontal => self.halign,
            Orientation::Vertical => self.valign,
        }
    }

    /// Explicit expand flag along `orientation`, if set.
    #[must_use]
    pub const fn expand_set(&self, orientation: Orientation) -> Option<bool> {
        match orientation {
            Orientation::Horizontal => self.hexpand,
            Orientation::Vertical => self.vexpand,
        }
    }

    /// The resolved style.
    #[must_use]
    pub const fn style(&self) -> &Style {
        &self.style
    }

    /// Rectangle assigned by the last allocation.
    #[must_use]
    pub const fn allocation(&self) -> Rect {
        self.allocation
    }

    /// Baseline assigned by the last allocation, relative to the
    /// allocation's top.
    #[must_use]
    pub const fn allocated_baseline(&self) -> Option<i32> {
        self.allocated_baseline
    }

    /// Clip reported by the last allocation.
    #[must_use]
    pub const fn clip(&self) -> Rect {
        self.clip
    }

    /// Per-kind state.
    #[must_use]
    pub const fn kind(&self) -> &WidgetKind {
        &self.kind
    }

    /// The kind tag.
    #[must_use]
    pub fn widget_type(&self) -> WidgetType {
        WidgetType::from(&self.kind)
    }
}
