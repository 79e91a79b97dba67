//! Enumerations shared across containers.
//!
//! Every enum renders and parses as its lowercase (`snake_case`) name so log
//! lines and scene files use the same vocabulary.

use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

/// The axis a container lays out along.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Orientation {
    /// Left to right.
    #[default]
    Horizontal,
    /// Top to bottom.
    Vertical,
}

impl Orientation {
    /// The other axis.
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::Horizontal => Self::Vertical,
            Self::Vertical => Self::Horizontal,
        }
    }

    /// Index usable for per-axis arrays (`0` horizontal, `1` vertical).
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Horizontal => 0,
            Self::Vertical => 1,
        }
    }
}

/// Reading direction.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TextDirection {
    /// Left to right.
    #[default]
    Ltr,
    /// Right to left; horizontal start edges are on the right.
    Rtl,
}

/// Which edge of a linear container a child is grouped against.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PackType {
    /// Leading edge.
    #[default]
    Start,
    /// Trailing edge.
    End,
}

/// A side of a widget, used for relative placement in a grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PositionType {
    /// Left side.
    Left,
    /// Right side.
    Right,
    /// Top side.
    Top,
    /// Bottom side.
    Bottom,
}

/// How a widget uses extra space in a slot.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Align {
    /// Stretch to fill the slot.
    #[default]
    Fill,
    /// Natural size at the leading edge.
    Start,
    /// Natural size at the trailing edge.
    End,
    /// Natural size, centered.
    Center,
    /// Align the widget's baseline with the slot's baseline (vertical axis
    /// only; behaves as `Fill` horizontally).
    Baseline,
}

/// Where a baseline sits when a row has more room than its baseline
/// children need.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum BaselinePosition {
    /// Pack baseline children at the top.
    Top,
    /// Center baseline children.
    #[default]
    Center,
    /// Pack baseline children at the bottom.
    Bottom,
}

/// Selection policy of a flow box or list box.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum SelectionMode {
    /// Nothing can be selected.
    None,
    /// Zero or one child selected.
    #[default]
    Single,
    /// Exactly one child selected once a selection exists.
    Browse,
    /// Any number of children selected.
    Multiple,
}

/// Scroll action requested by autoscroll.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ScrollType {
    /// No scrolling.
    #[default]
    None,
    /// One step increment forward.
    StepForward,
    /// One step increment backward.
    StepBackward,
    /// Faster, page-sized scrolling forward.
    PageForward,
    /// Faster, page-sized scrolling backward.
    PageBackward,
}

/// How a widget's size request depends on the opposite axis.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum RequestMode {
    /// Height depends on the allocated width.
    #[default]
    HeightForWidth,
    /// Width depends on the allocated height.
    WidthForHeight,
    /// Neither axis depends on the other.
    Constant,
}

/// Which size a viewport uses as its scrollable extent.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ScrollablePolicy {
    /// Scroll over the child's minimum size.
    #[default]
    Minimum,
    /// Scroll over the child's natural size.
    Natural,
}

/// Frame drawn around a viewport. Layout passes it through untouched.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ShadowType {
    /// No frame.
    None,
    /// Sunken frame.
    #[default]
    In,
    /// Raised frame.
    Out,
    /// Sunken outline.
    EtchedIn,
    /// Raised outline.
    EtchedOut,
}

/// Units of keyboard cursor movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum MovementStep {
    /// Neighbouring children along a line.
    VisualPositions,
    /// Whole lines.
    DisplayLines,
    /// Page-sized jumps along the scrolling axis.
    Pages,
    /// First or last child.
    BufferEnds,
}

/// Keyboard modifiers that change how selection reacts to a click or
/// cursor move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Modifiers {
    /// Toggle instead of replace (Ctrl-like).
    pub modify: bool,
    /// Select a contiguous range (Shift-like).
    pub extend: bool,
}

impl Modifiers {
    /// No modifiers held.
    pub const NONE: Self = Self {
        modify: false,
        extend: false,
    };
    /// Modify (toggle) held.
    pub const MODIFY: Self = Self {
        modify: true,
        extend: false,
    };
    /// Extend (range) held.
    pub const EXTEND: Self = Self {
        modify: false,
        extend: true,
    };
}
