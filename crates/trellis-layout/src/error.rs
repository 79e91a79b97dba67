//! Layout error type.

use trellis_common::report_precondition;
use trellis_tree::TreeError;

use crate::types::Orientation;
use crate::widget::WidgetType;

/// Errors produced by container operations and layout passes.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LayoutError {
    /// A widget reported sizes that break `0 <= minimum <= natural`.
    #[error(
        "widget '{widget}' reported invalid {orientation} size (minimum {minimum}, natural {natural})"
    )]
    InvalidChildGeometry {
        /// Name of the offending widget.
        widget: String,
        /// Axis that was measured.
        orientation: Orientation,
        /// Reported minimum.
        minimum: i32,
        /// Reported natural size.
        natural: i32,
    },
    /// An operation was rejected because its preconditions did not hold.
    #[error("precondition failed: {0}")]
    Precondition(String),
    /// The widget handle is stale or was never valid.
    #[error("no such widget: {0}")]
    NoSuchWidget(String),
    /// The widget exists but is not the kind of container the operation
    /// needs.
    #[error("widget '{widget}' is a {actual}, expected a {expected}")]
    WrongKind {
        /// Name of the widget.
        widget: String,
        /// Kind the operation required.
        expected: WidgetType,
        /// Kind the widget actually is.
        actual: WidgetType,
    },
}

/// Result alias for layout operations.
pub type Result<T> = std::result::Result<T, LayoutError>;

/// Report a rejected operation to the diagnostic sink and build the error
/// the caller returns.
pub(crate) fn precondition(component: &str, message: impl Into<String>) -> LayoutError {
    let message = message.into();
    report_precondition(component, &message);
    LayoutError::Precondition(message)
}

impl From<TreeError> for LayoutError {
    fn from(err: TreeError) -> Self {
        match err {
            TreeError::NoSuchNode(id) => Self::NoSuchWidget(format!("{id:?}")),
            other => precondition("tree", other.to_string()),
        }
    }
}
