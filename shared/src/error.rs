//! Domain rule violations

use thiserror::Error;
use uuid::Uuid;

use crate::models::{Capability, Role};

/// A workflow rule was violated.
///
/// These are always detected before any write happens; the backend maps each
/// variant onto a distinct HTTP status.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WorkflowError {
    #[error("role '{role}' is not allowed to {capability}")]
    Forbidden { role: Role, capability: Capability },

    #[error("invalid {field}: {message}")]
    Validation { field: &'static str, message: String },

    #[error("{0}")]
    InvalidState(String),

    #[error("insufficient stock for item {item_id}: {on_hand} on hand, {requested} requested")]
    InsufficientStock {
        item_id: Uuid,
        on_hand: i32,
        requested: i32,
    },
}

impl WorkflowError {
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        WorkflowError::Validation {
            field,
            message: message.into(),
        }
    }

    pub fn invalid_state(message: impl Into<String>) -> Self {
        WorkflowError::InvalidState(message.into())
    }
}

pub type WorkflowResult<T> = Result<T, WorkflowError>;
