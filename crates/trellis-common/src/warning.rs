//! Layout diagnostics.
//!
//! Two channels exist:
//! - [`warn_once`] for configuration problems that would otherwise repeat on
//!   every pass (a bound list model next to a filter function, for example).
//! - [`report_precondition`] for programmer errors rejected by a container
//!   operation. Every report is logged, and the most recent ones are kept in
//!   a per-thread log that [`take_reports`] drains.

use std::cell::RefCell;
use std::collections::HashSet;
use std::sync::{Mutex, PoisonError};

/// Upper bound on retained precondition reports per thread.
const MAX_REPORTS: usize = 256;

/// Global set of warnings we've already emitted (to deduplicate)
static WARNED: Mutex<Option<HashSet<String>>> = Mutex::new(None);

thread_local! {
    static REPORTS: RefCell<Vec<String>> = const { RefCell::new(Vec::new()) };
}

/// Warn about a configuration problem (emitted once per unique message).
///
/// # Example
/// ```
/// trellis_common::warn_once("listbox", "filter function ignored while a model is bound");
/// ```
pub fn warn_once(component: &str, message: &str) {
    let key = format!("[{component}] {message}");
    let should_emit = WARNED
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .get_or_insert_with(HashSet::new)
        .insert(key);

    if should_emit {
        tracing::warn!(target: "trellis", component, "{message}");
    }
}

/// Clear all recorded warnings so they may be emitted again.
pub fn clear_warnings() {
    let mut guard = WARNED.lock().unwrap_or_else(PoisonError::into_inner);
    if let Some(set) = guard.as_mut() {
        set.clear();
    }
}

/// Report a rejected operation.
///
/// The caller is expected to return without mutating any state after
/// reporting.
pub fn report_precondition(component: &str, message: &str) {
    tracing::warn!(target: "trellis", component, "precondition failed: {message}");
    REPORTS.with(|reports| {
        let mut reports = reports.borrow_mut();
        if reports.len() == MAX_REPORTS {
            let _ = reports.remove(0);
        }
        reports.push(format!("[{component}] {message}"));
    });
}

/// Drain the precondition reports recorded on the current thread.
#[must_use]
pub fn take_reports() -> Vec<String> {
    REPORTS.with(|reports| std::mem::take(&mut *reports.borrow_mut()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reports_are_drained() {
        let _ = take_reports();
        report_precondition("box", "widget already has a parent");
        report_precondition("grid", "span must be at least 1");

        let reports = take_reports();
        assert_eq!(reports.len(), 2);
        assert_eq!(reports[0], "[box] widget already has a parent");
        assert!(take_reports().is_empty());
    }

    #[test]
    fn test_report_log_is_bounded() {
        let _ = take_reports();
        for i in 0..(MAX_REPORTS + 10) {
            report_precondition("test", &format!("report {i}"));
        }
        let reports = take_reports();
        assert_eq!(reports.len(), MAX_REPORTS);
        assert_eq!(reports[0], "[test] report 10");
    }
}
