//! Pixel geometry shared by every container.

use serde::{Deserialize, Serialize};

use crate::types::Orientation;

/// A rectangle in integer pixels.
///
/// A widget's rectangle is expressed in the same coordinate space as its
/// parent's rectangle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rect {
    /// Horizontal position of the top-left corner.
    pub x: i32,
    /// Vertical position of the top-left corner.
    pub y: i32,
    /// Width of the rectangle.
    pub width: i32,
    /// Height of the rectangle.
    pub height: i32,
}

impl Rect {
    /// Create a rectangle.
    #[must_use]
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Whether the rectangle covers no pixels.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }

    /// Extent along `orientation`.
    #[must_use]
    pub const fn size(&self, orientation: Orientation) -> i32 {
        match orientation {
            Orientation::Horizontal => self.width,
            Orientation::Vertical => self.height,
        }
    }

    /// Leading coordinate along `orientation`.
    #[must_use]
    pub const fn start(&self, orientation: Orientation) -> i32 {
        match orientation {
            Orientation::Horizontal => self.x,
            Orientation::Vertical => self.y,
        }
    }

    /// Build a rectangle from main/cross coordinates relative to
    /// `orientation`.
    #[must_use]
    pub const fn from_axes(
        orientation: Orientation,
        main_pos: i32,
        cross_pos: i32,
        main_size: i32,
        cross_size: i32,
    ) -> Self {
        match orientation {
            Orientation::Horizontal => Self::new(main_pos, cross_pos, main_size, cross_size),
            Orientation::Vertical => Self::new(cross_pos, main_pos, cross_size, main_size),
        }
    }

    /// Whether the point lies inside the rectangle.
    #[must_use]
    pub const fn contains(&self, x: i32, y: i32) -> bool {
        x >= self.x && x < self.x + self.width && y >= self.y && y < self.y + self.height
    }

    /// Whether `other` lies entirely within this rectangle.
    #[must_use]
    pub const fn contains_rect(&self, other: &Self) -> bool {
        other.x >= self.x
            && other.y >= self.y
            && other.x + other.width <= self.x + self.width
            && other.y + other.height <= self.y + self.height
    }

    /// Smallest rectangle covering both; empty rectangles are ignored.
    #[must_use]
    pub fn union(&self, other: &Self) -> Self {
        if other.is_empty() {
            return *self;
        }
        if self.is_empty() {
            return *other;
        }
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        let right = (self.x + self.width).max(other.x + other.width);
        let bottom = (self.y + self.height).max(other.y + other.height);
        Self::new(x, y, right - x, bottom - y)
    }

    /// Shrink by `edges` on every side; sizes never go negative.
    #[must_use]
    pub fn shrink(&self, edges: &Border) -> Self {
        Self::new(
            self.x + edges.left,
            self.y + edges.top,
            (self.width - edges.horizontal()).max(0),
            (self.height - edges.vertical()).max(0),
        )
    }

    /// Mirror this rectangle horizontally within `container`.
    #[must_use]
    pub const fn mirrored_in(&self, container: &Self) -> Self {
        Self::new(
            container.x + container.width - (self.x - container.x) - self.width,
            self.y,
            self.width,
            self.height,
        )
    }
}

/// Edge sizes for margin, border, or padding.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Border {
    /// Top edge size.
    pub top: i32,
    /// Right edge size.
    pub right: i32,
    /// Bottom edge size.
    pub bottom: i32,
    /// Left edge size.
    pub left: i32,
}

impl Border {
    /// The same size on all four edges.
    #[must_use]
    pub const fn uniform(size: i32) -> Self {
        Self {
            top: size,
            right: size,
            bottom: size,
            left: size,
        }
    }

    /// Left plus right.
    #[must_use]
    pub const fn horizontal(&self) -> i32 {
        self.left + self.right
    }

    /// Top plus bottom.
    #[must_use]
    pub const fn vertical(&self) -> i32 {
        self.top + self.bottom
    }

    /// Total thickness along `orientation`.
    #[must_use]
    pub const fn along(&self, orientation: Orientation) -> i32 {
        match orientation {
            Orientation::Horizontal => self.horizontal(),
            Orientation::Vertical => self.vertical(),
        }
    }
}

impl std::ops::Add for Border {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self {
            top: self.top + rhs.top,
            right: self.right + rhs.right,
            bottom: self.bottom + rhs.bottom,
            left: self.left + rhs.left,
        }
    }
}
