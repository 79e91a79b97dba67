//! Common utilities for the Trellis layout engine.
//!
//! This crate provides shared infrastructure used by every layout crate:
//! - **Warning System** - deduplicated warnings routed through `tracing`
//! - **Precondition Sink** - reports of programmer errors caught at API
//!   boundaries, kept per thread so callers can inspect them

pub mod warning;

pub use warning::{clear_warnings, report_precondition, take_reports, warn_once};
