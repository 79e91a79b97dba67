//! Resolved style values consumed by layout.
//!
//! Style resolution happens elsewhere; a widget carries the already
//! computed box-model values that its gadget applies around the content.

use serde::{Deserialize, Serialize};

use crate::geometry::Border;
use crate::types::{Orientation, TextDirection};

/// The style values layout reads from a widget.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Style {
    /// Outer spacing, outside the border.
    pub margin: Border,
    /// Border widths.
    pub border: Border,
    /// Inner spacing, between border and content.
    pub padding: Border,
    /// Lower bound on the content width.
    pub min_width: i32,
    /// Lower bound on the content height.
    pub min_height: i32,
    /// Reading direction.
    pub direction: TextDirection,
}

impl Style {
    /// Combined margin, border and padding on each side.
    #[must_use]
    pub fn extents(&self) -> Border {
        self.margin + self.border + self.padding
    }

    /// The CSS minimum content size along `orientation`.
    #[must_use]
    pub const fn min_size(&self, orientation: Orientation) -> i32 {
        match orientation {
            Orientation::Horizontal => self.min_width,
            Orientation::Vertical => self.min_height,
        }
    }

    /// Whether horizontal start edges are on the right.
    #[must_use]
    pub fn is_rtl(&self) -> bool {
        self.direction == TextDirection::Rtl
    }
}
