//! # Collaborator Contracts
//!
//! The lifecycle never owns employee or template storage. It asks these
//! traits, which the service layer implements over whatever store it has.

use attest_core::{AttestError, EmployeeId, TemplateId};
use chrono::{DateTime, Utc};

use crate::template::TemplateVersion;

/// What the lifecycle needs to know about an employee.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmployeeProfile {
    pub id: EmployeeId,
    pub name: String,
    pub email: String,
    pub join_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl EmployeeProfile {
    /// Join date when recorded, otherwise the moment the employee record
    /// was created.
    pub fn effective_join(&self) -> DateTime<Utc> {
        self.join_date.unwrap_or(self.created_at)
    }
}

/// Employee lookup.
pub trait EmployeeDirectory {
    /// Resolve an employee or fail with `NotFound`.
    fn resolve_employee(&self, id: EmployeeId) -> Result<EmployeeProfile, AttestError>;
}

/// Template lookup.
pub trait TemplateDirectory {
    /// A specific template version, by id.
    fn template(&self, id: TemplateId) -> Option<TemplateVersion>;

    /// The version currently flagged latest for `name`, if any.
    fn latest_template(&self, name: &str) -> Option<TemplateVersion>;
}
