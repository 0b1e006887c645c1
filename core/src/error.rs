//! Recoverable errors.
//!
//! Invariant violations (tree membership, self-containment, dangling relay identifiers) are not
//! represented here; they panic at the call site.

use crate::creator::CreatorId;
use crate::widget::WidgetId;
use thiserror::Error;

/// Errors that may occur when mutating the widget hierarchy.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum HierarchyError {
    #[error("widget {0} cannot be its own subview")]
    SelfInsertion(WidgetId),

    #[error("inserting widget {0} would make it its own ancestor")]
    Cycle(WidgetId),

    #[error("subview index {index} out of bounds (subview count: {len})")]
    IndexOutOfBounds { index: usize, len: usize },
}

/// Errors that may occur when materializing a creator's widget.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CreatorError {
    #[error("creator {id} ({kind}) has neither a construction closure nor a default maker")]
    NoConstructionStrategy { id: CreatorId, kind: String },
}
