//! Error types for spark-fiber.

use thiserror::Error;

use crate::engine::FiberId;

/// Result type alias for reconciler operations.
pub type Result<T> = std::result::Result<T, ReconcileError>;

/// Errors that can abort a render pass or reject an update request.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReconcileError {
    /// Hooks were called in a different order than in the previous render.
    #[error("hooks must be called in the same order: slot {index} was \"{expected}\" but \"{found}\" was called")]
    HookOrder {
        index: usize,
        expected: &'static str,
        found: &'static str,
    },

    /// Hook name matched but the stored payload has a different type.
    #[error("hook \"{name}\" at slot {index} changed its state type between renders")]
    HookType { index: usize, name: &'static str },

    /// A stateful call was made without a node to attribute it to.
    #[error("hook \"{hook}\" must be called while a component is rendering")]
    MissingContext { hook: &'static str },

    /// The update target no longer exists in the fiber arena.
    #[error("unknown fiber: {0:?}")]
    UnknownFiber(FiberId),

    /// A component failed to render.
    #[error("component \"{name}\" failed to render: {message}")]
    Component { name: &'static str, message: String },
}

impl ReconcileError {
    /// Convenience constructor for component-level failures.
    pub fn component(name: &'static str, message: impl Into<String>) -> Self {
        Self::Component {
            name,
            message: message.into(),
        }
    }
}
