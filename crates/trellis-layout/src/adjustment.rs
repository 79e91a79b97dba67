//! Range models.
//!
//! An adjustment describes a scrollable range: the visible window of size
//! `page_size` starts at `value` inside `[lower, upper]`. It is shared
//! between the widget that scrolls (a viewport) and widgets that want to
//! follow or drive the scroll position (list and flow boxes), so handles
//! are reference counted.

use std::cell::RefCell;
use std::rc::Rc;

use crate::observer::{ObserverId, Observers};

/// The six numbers of a range model.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AdjustmentValues {
    /// Start of the visible window.
    pub value: f64,
    /// Lower bound of the range.
    pub lower: f64,
    /// Upper bound of the range.
    pub upper: f64,
    /// Increment for small steps.
    pub step_increment: f64,
    /// Increment for page steps.
    pub page_increment: f64,
    /// Size of the visible window.
    pub page_size: f64,
}

impl AdjustmentValues {
    /// Largest valid `value`.
    #[must_use]
    pub fn max_value(&self) -> f64 {
        (self.upper - self.page_size).max(self.lower)
    }

    fn clamped(&self, value: f64) -> f64 {
        value.min(self.upper - self.page_size).max(self.lower)
    }
}

#[derive(Debug, Default)]
struct Adjustment {
    values: AdjustmentValues,
    value_changed: Observers<f64>,
    changed: Observers<AdjustmentValues>,
}

/// Shared handle to a range model.
///
/// Invariant: `lower <= value <= max(lower, upper - page_size)` after every
/// mutation.
#[derive(Debug, Clone, Default)]
pub struct AdjustmentRef(Rc<RefCell<Adjustment>>);

impl AdjustmentRef {
    /// Create an adjustment; `value` is clamped into range.
    #[must_use]
    pub fn new(
        value: f64,
        lower: f64,
        upper: f64,
        step_increment: f64,
        page_increment: f64,
        page_size: f64,
    ) -> Self {
        let mut values = AdjustmentValues {
            value,
            lower,
            upper,
            step_increment,
            page_increment,
            page_size,
        };
        values.value = values.clamped(value);
        Self(Rc::new(RefCell::new(Adjustment {
            values,
            ..Adjustment::default()
        })))
    }

    /// Whether both handles refer to the same adjustment.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// Snapshot of all six numbers.
    #[must_use]
    pub fn values(&self) -> AdjustmentValues {
        self.0.borrow().values
    }

    /// Start of the visible window.
    #[must_use]
    pub fn value(&self) -> f64 {
        self.values().value
    }

    /// Lower bound.
    #[must_use]
    pub fn lower(&self) -> f64 {
        self.values().lower
    }

    /// Upper bound.
    #[must_use]
    pub fn upper(&self) -> f64 {
        self.values().upper
    }

    /// Small step size.
    #[must_use]
    pub fn step_increment(&self) -> f64 {
        self.values().step_increment
    }

    /// Page step size.
    #[must_use]
    pub fn page_increment(&self) -> f64 {
        self.values().page_increment
    }

    /// Visible window size.
    #[must_use]
    pub fn page_size(&self) -> f64 {
        self.values().page_size
    }

    /// Move the visible window, clamped into range.
    pub fn set_value(&self, value: f64) {
        self.update(|values| values.value = value);
    }

    /// Set all six numbers at once; emits `changed` and then
    /// `value-changed` as appropriate.
    pub fn configure(
        &self,
        value: f64,
        lower: f64,
        upper: f64,
        step_increment: f64,
        page_increment: f64,
        page_size: f64,
    ) {
        self.update(|values| {
            *values = AdjustmentValues {
                value,
                lower,
                upper,
                step_increment,
                page_increment,
                page_size,
            };
        });
    }

    /// Set the lower bound.
    pub fn set_lower(&self, lower: f64) {
        self.update(|values| values.lower = lower);
    }

    /// Set the upper bound.
    pub fn set_upper(&self, upper: f64) {
        self.update(|values| values.upper = upper);
    }

    /// Set the small step size.
    pub fn set_step_increment(&self, step_increment: f64) {
        self.update(|values| values.step_increment = step_increment);
    }

    /// Set the page step size.
    pub fn set_page_increment(&self, page_increment: f64) {
        self.update(|values| values.page_increment = page_increment);
    }

    /// Set the visible window size.
    pub fn set_page_size(&self, page_size: f64) {
        self.update(|values| values.page_size = page_size);
    }

    /// Scroll the minimum distance needed to show `[lower, upper]`,
    /// preferring to show `lower` when the range exceeds a page.
    pub fn clamp_page(&self, lower: f64, upper: f64) {
        let current = self.values();
        let lower = lower.clamp(current.lower, current.upper.max(current.lower));
        let upper = upper.clamp(current.lower, current.upper.max(current.lower));
        let mut value = current.value;
        if value + current.page_size < upper {
            value = upper - current.page_size;
        }
        if value > lower {
            value = lower;
        }
        self.set_value(value);
    }

    /// Observe value changes. The handler receives the new value.
    pub fn connect_value_changed<F>(&self, handler: F) -> ObserverId
    where
        F: FnMut(&f64) + 'static,
    {
        self.0.borrow_mut().value_changed.connect(handler)
    }

    /// Observe changes to anything but the value.
    pub fn connect_changed<F>(&self, handler: F) -> ObserverId
    where
        F: FnMut(&AdjustmentValues) + 'static,
    {
        self.0.borrow_mut().changed.connect(handler)
    }

    /// Disconnect a handler from either notification.
    pub fn disconnect(&self, id: ObserverId) -> bool {
        let mut adjustment = self.0.borrow_mut();
        adjustment.value_changed.disconnect(id) || adjustment.changed.disconnect(id)
    }

    #[allow(clippy::float_cmp)]
    fn update<F>(&self, mutate: F)
    where
        F: FnOnce(&mut AdjustmentValues),
    {
        let (old, new) = {
            let mut adjustment = self.0.borrow_mut();
            let old = adjustment.values;
            mutate(&mut adjustment.values);
            let requested = adjustment.values.value;
            adjustment.values.value = adjustment.values.clamped(requested);
            (old, adjustment.values)
        };

        let bounds_changed = old.lower != new.lower
            || old.upper != new.upper
            || old.step_increment != new.step_increment
            || old.page_increment != new.page_increment
            || old.page_size != new.page_size;
        if bounds_changed {
            tracing::trace!(target: "trellis::adjustment", lower = new.lower, upper = new.upper, page_size = new.page_size, "changed");
            let mut handlers = self.0.borrow_mut().changed.take();
            handlers.emit(&new);
            self.0.borrow_mut().changed.restore(handlers);
        }
        if old.value != new.value {
            tracing::trace!(target: "trellis::adjustment", value = new.value, "value-changed");
            let mut handlers = self.0.borrow_mut().value_changed.take();
            handlers.emit(&new.value);
            self.0.borrow_mut().value_changed.restore(handlers);
        }
    }
}
