//! Container layout for the Trellis engine.
//!
//! # Scope
//!
//! Every widget lives in a [`WidgetTree`] and takes part in a two-pass
//! negotiation:
//! - **Measure** ([`WidgetTree::measure`]): minimum and natural size along
//!   one axis, optionally for a given size on the other axis, plus
//!   baselines where they apply.
//! - **Allocate** ([`WidgetTree::allocate`]): a rectangle and an optional
//!   baseline, handed down from parent to children.
//!
//! Both passes go through the widget's style [`Gadget`], which adds and
//! strips margin, border and padding around the container's own layout.
//!
//! Containers:
//! - **Box** ([`BoxLayout`]): linear packing from both ends with an optional
//!   centre widget
//! - **`ButtonBox`** ([`ButtonBox`]): a box with uniform child sizes and
//!   spread/edge/expand styles
//! - **Grid** ([`Grid`]): rows and columns with spanning and per-row
//!   baselines
//! - **`FlowBox`** ([`FlowBox`]): children reflowed into aligned lines, with
//!   selection, rubber-band and keyboard navigation
//! - **`ListBox`** ([`ListBox`]): a vertical list with headers, filtering,
//!   sorting and selection
//! - **Viewport** ([`Viewport`]): scrolls one child through a pair of
//!   [`AdjustmentRef`]s
//!
//! Space beyond minimum sizes is shared by [`distribute_natural`].

pub mod adjustment;
pub mod box_layout;
pub mod button_box;
pub mod distribute;
pub mod error;
pub mod flow_box;
pub mod gadget;
pub mod geometry;
pub mod grid;
pub mod list_box;
pub mod model;
pub mod observer;
pub mod style;
pub mod tree;
pub mod types;
pub mod viewport;
pub mod widget;

mod selection;

pub use adjustment::{AdjustmentRef, AdjustmentValues};
pub use box_layout::{BoxChild, BoxLayout, BoxMut};
pub use button_box::{ButtonBox, ButtonBoxMut, ButtonBoxStyle};
pub use distribute::{RequestedSize, distribute_natural};
pub use error::{LayoutError, Result};
pub use flow_box::{AutoscrollConfig, FlowBox, FlowBoxChild, FlowBoxMut};
pub use gadget::Gadget;
pub use geometry::{Border, Rect};
pub use grid::{Grid, GridAttach, GridMut};
pub use list_box::{HeaderFunc, ListBox, ListBoxMut, ListBoxRow, RowAction};
pub use model::{CreateWidget, FilterFunc, ListModel, ModelItem, SortFunc, VecModel};
pub use observer::ObserverId;
pub use style::Style;
pub use tree::WidgetTree;
pub use types::{
    Align, BaselinePosition, Modifiers, MovementStep, Orientation, PackType, PositionType,
    RequestMode, ScrollType, ScrollablePolicy, SelectionMode, ShadowType, TextDirection,
};
pub use viewport::{Viewport, ViewportMut};
pub use widget::{Leaf, Measurement, Widget, WidgetId, WidgetKind, WidgetType};
