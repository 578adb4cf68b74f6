//! # API Route Modules
//!
//! One router per resource, merged in [`crate::app`].

pub mod acknowledgements;
pub mod compliances;
pub mod configurations;
pub mod customer_compliance;
pub mod customers;
pub mod employees;
pub mod policies;
pub mod templates;

use crate::error::AppError;

/// Log a failed write-through and hide the details from the client.
pub(crate) fn persist_error(what: &'static str, err: sqlx::Error) -> AppError {
    tracing::error!(error = %err, resource = what, "failed to persist");
    AppError::Internal(format!("failed to persist {what}: {err}"))
}
