//! The style gadget.
//!
//! A gadget applies the CSS box model around a widget's own layout
//! callbacks. Measuring adds margin, border and padding to whatever the
//! content reports; allocating strips them before handing the content
//! rectangle on.
//!
//! ```text
//! ┌────────────── allocation ──────────────┐
//! │ margin                                 │
//! │   ┌────────── border box ──────────┐   │
//! │   │ border + padding               │   │
//! │   │   ┌──── content rectangle ──┐  │   │
//! │   │   │  container layout runs  │  │   │
//! │   │   │  here                   │  │   │
//! │   │   └─────────────────────────┘  │   │
//! │   └────────────────────────────────┘   │
//! └────────────────────────────────────────┘
//! ```

use crate::error::Result;
use crate::geometry::Rect;
use crate::style::Style;
use crate::types::Orientation;
use crate::widget::Measurement;

/// Applies a borrowed [`Style`] around content measure/allocate callbacks.
#[derive(Debug, Clone, Copy)]
pub struct Gadget<'s> {
    style: &'s Style,
}

impl<'s> Gadget<'s> {
    /// Wrap a style for the duration of one pass.
    #[must_use]
    pub const fn new(style: &'s Style) -> Self {
        Self { style }
    }

    /// Measure along `orientation`.
    ///
    /// `for_size` is the full size available on the opposite axis; the
    /// content callback receives it with the opposite-axis box extents
    /// removed. The CSS minimum size is applied to the content result
    /// before the box extents are added back.
    ///
    /// # Errors
    ///
    /// Propagates the content callback's error.
    pub fn measure<F>(
        &self,
        orientation: Orientation,
        for_size: Option<i32>,
        content: F,
    ) -> Result<Measurement>
    where
        F: FnOnce(Option<i32>) -> Result<Measurement>,
    {
        let extents = self.style.extents();
        let extra = extents.along(orientation);
        let extra_opposite = extents.along(orientation.opposite());
        let content_for_size = for_size.map(|size| (size - extra_opposite).max(0));

        let mut measured = content(content_for_size)?;
        measured.minimum = measured.minimum.max(self.style.min_size(orientation));
        measured.natural = measured.natural.max(measured.minimum);
        measured.minimum += extra;
        measured.natural += extra;

        if orientation == Orientation::Vertical {
            measured.minimum_baseline = measured.minimum_baseline.map(|b| b + extents.top);
            measured.natural_baseline = measured.natural_baseline.map(|b| b + extents.top);
        } else {
            measured.minimum_baseline = None;
            measured.natural_baseline = None;
        }
        Ok(measured)
    }

    /// The content rectangle inside `allocation`.
    #[must_use]
    pub fn content_rect(&self, allocation: Rect) -> Rect {
        allocation.shrink(&self.style.extents())
    }

    /// The border box inside `allocation` (margins removed).
    #[must_use]
    pub fn border_rect(&self, allocation: Rect) -> Rect {
        allocation.shrink(&self.style.margin)
    }

    /// Allocate `allocation`, handing the content rectangle and the
    /// baseline (shifted into content coordinates) to `content`.
    ///
    /// Returns the clip: the content's clip united with the border box.
    ///
    /// # Errors
    ///
    /// Propagates the content callback's error.
    pub fn allocate<F>(&self, allocation: Rect, baseline: Option<i32>, content: F) -> Result<Rect>
    where
        F: FnOnce(Rect, Option<i32>) -> Result<Rect>,
    {
        let extents = self.style.extents();
        let content_rect = self.content_rect(allocation);
        let content_baseline = baseline.map(|b| b - extents.top);
        let content_clip = content(content_rect, content_baseline)?;
        Ok(content_clip.union(&self.border_rect(allocation)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Border;

    fn padded_style() -> Style {
        Style {
            margin: Border::uniform(1),
            border: Border::uniform(2),
            padding: Border {
                top: 3,
                right: 4,
                bottom: 3,
                left: 4,
            },
            ..Style::default()
        }
    }

    #[test]
    fn test_measure_adds_extents_and_strips_for_size() {
        let style = padded_style();
        let gadget = Gadget::new(&style);
        let mut seen_for_size = None;
        let measured = gadget
            .measure(Orientation::Horizontal, Some(50), |for_size| {
                seen_for_size = for_size;
                Ok(Measurement::new(10, 20))
            })
            .unwrap();
        assert_eq!(seen_for_size, Some(50 - 12), "vertical extents are 1+2+3 on both sides");
        assert_eq!(measured.minimum, 10 + 14);
        assert_eq!(measured.natural, 20 + 14);
    }

    #[test]
    fn test_measure_applies_css_minimum() {
        let style = Style {
            min_height: 30,
            ..Style::default()
        };
        let gadget = Gadget::new(&style);
        let measured = gadget
            .measure(Orientation::Vertical, None, |_| Ok(Measurement::new(10, 20)))
            .unwrap();
        assert_eq!((measured.minimum, measured.natural), (30, 30));
    }

    #[test]
    fn test_baselines_shift_by_top_extent() {
        let style = padded_style();
        let gadget = Gadget::new(&style);
        let measured = gadget
            .measure(Orientation::Vertical, None, |_| {
                Ok(Measurement::with_baselines(10, 10, Some(7), Some(7)))
            })
            .unwrap();
        assert_eq!(measured.minimum_baseline, Some(13));
    }

    #[test]
    fn test_allocate_strips_extents() {
        let style = padded_style();
        let gadget = Gadget::new(&style);
        let mut content = Rect::default();
        let clip = gadget
            .allocate(Rect::new(0, 0, 100, 50), Some(20), |rect, baseline| {
                content = rect;
                assert_eq!(baseline, Some(14));
                Ok(rect)
            })
            .unwrap();
        assert_eq!(content, Rect::new(7, 6, 86, 38));
        assert_eq!(clip, Rect::new(1, 1, 98, 48));
    }
}
