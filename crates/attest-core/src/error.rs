//! # Error Types
//!
//! Every lifecycle operation fails in one of two ways: a referenced record
//! does not exist, or the request would violate an invariant. Notification
//! failures are not errors at this level; they are logged and dropped by
//! the sender.

use thiserror::Error;

/// Top-level error type for domain operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AttestError {
    /// A referenced entity id does not resolve.
    #[error("{resource} not found: {id}")]
    NotFound {
        /// Kind of record that was looked up ("employee", "policy", ...).
        resource: &'static str,
        /// The identifier as supplied by the caller.
        id: String,
    },

    /// The request violates an invariant at the boundary.
    #[error("validation failed: {0}")]
    Validation(String),
}

impl AttestError {
    /// Shorthand for a [`AttestError::NotFound`] on any displayable id.
    pub fn not_found(resource: &'static str, id: impl std::fmt::Display) -> Self {
        Self::NotFound {
            resource,
            id: id.to_string(),
        }
    }

    /// Shorthand for a [`AttestError::Validation`].
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_display_names_resource() {
        let err = AttestError::not_found("policy", "abc");
        assert_eq!(err.to_string(), "policy not found: abc");
    }

    #[test]
    fn validation_display_carries_message() {
        let err = AttestError::validation("duplicate acknowledgement");
        assert_eq!(
            err.to_string(),
            "validation failed: duplicate acknowledgement"
        );
    }
}
