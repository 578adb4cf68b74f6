//! # Policy Versioning and Approval
//!
//! A *default* policy is bound to a template family and always points at
//! that family's latest version; its `version` mirrors the template's
//! `version_number`. A *custom* policy is authored by an employee with its
//! own document link and versions independently.
//!
//! Binding maintenance is resolve-on-write: every mutating operation on a
//! [`Policy`] starts with [`resolve_template_binding`], so an unrelated
//! edit still moves a default policy onto the newest template.
//!
//! Approval state:
//!
//! ```text
//!   pending ──► approved   (approved_at set if absent)
//!      ▲  ╲        │
//!      │   ╲       ▼
//!      └──── rejected      (approved_at cleared)
//! ```

use std::str::FromStr;

use attest_core::{AttestError, CustomerComplianceId, EmployeeId, PolicyId, TemplateId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::directory::{EmployeeDirectory, TemplateDirectory};
use crate::template::TemplateVersion;

/// Where a policy's content comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyType {
    /// Derived from a template family.
    Default,
    /// Authored directly by an employee.
    Custom,
}

impl PolicyType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Custom => "custom",
        }
    }
}

impl std::fmt::Display for PolicyType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PolicyType {
    type Err = AttestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "default" => Ok(Self::Default),
            "custom" => Ok(Self::Custom),
            other => Err(AttestError::validation(format!(
                "invalid policy type: {other:?}"
            ))),
        }
    }
}

/// Review state of a policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

impl ApprovalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }
}

impl std::fmt::Display for ApprovalStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ApprovalStatus {
    type Err = AttestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            other => Err(AttestError::validation(format!(
                "invalid approval status: {other:?}"
            ))),
        }
    }
}

/// Caller-supplied descriptive fields shared by both policy types.
#[derive(Debug, Clone, Default)]
pub struct PolicyDraft {
    pub title: String,
    pub description: Option<String>,
    pub customer_compliance: Option<CustomerComplianceId>,
    pub document_link: Option<String>,
}

/// Partial update of a policy's descriptive fields.
#[derive(Debug, Clone, Default)]
pub struct PolicyPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub document_link: Option<String>,
    pub customer_compliance: Option<CustomerComplianceId>,
}

/// A compliance policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Policy {
    pub id: PolicyId,
    pub policy_type: PolicyType,
    pub title: String,
    pub description: Option<String>,
    pub customer_compliance: Option<CustomerComplianceId>,
    /// Bound template version (default policies only).
    pub template: Option<TemplateId>,
    /// Author (custom policies only).
    pub created_by: Option<EmployeeId>,
    pub version: u32,
    pub document_link: Option<String>,
    pub approval_status: ApprovalStatus,
    pub approved_by: Option<EmployeeId>,
    pub approved_at: Option<DateTime<Utc>>,
    pub approval_requested_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub is_deleted: bool,
}

/// Rebind a default policy to the latest version of its template family.
///
/// Returns the version the policy is now bound to, or `None` when the
/// policy is custom, unbound, or its family has no latest version (the
/// existing binding is left alone in that case).
pub fn resolve_template_binding(
    policy: &mut Policy,
    templates: &impl TemplateDirectory,
) -> Option<TemplateVersion> {
    if policy.policy_type != PolicyType::Default {
        return None;
    }
    let current = templates.template(policy.template?)?;
    let latest = templates.latest_template(&current.name)?;
    policy.template = Some(latest.id);
    policy.version = latest.version_number;
    Some(latest)
}

impl Policy {
    fn blank(policy_type: PolicyType, draft: PolicyDraft, now: DateTime<Utc>) -> Result<Self, AttestError> {
        let title = draft.title.trim().to_string();
        if title.is_empty() {
            return Err(AttestError::validation("policy title must not be empty"));
        }
        Ok(Self {
            id: PolicyId::new(),
            policy_type,
            title,
            description: draft.description,
            customer_compliance: draft.customer_compliance,
            template: None,
            created_by: None,
            version: 1,
            document_link: draft.document_link,
            approval_status: ApprovalStatus::Pending,
            approved_by: None,
            approved_at: None,
            approval_requested_at: now,
            created_at: now,
            updated_at: now,
            is_deleted: false,
        })
    }

    /// Create a default policy bound to the latest version of `template`'s
    /// family. The supplied id only selects the family.
    pub fn create_default(
        draft: PolicyDraft,
        template: Option<TemplateId>,
        templates: &impl TemplateDirectory,
        now: DateTime<Utc>,
    ) -> Result<Self, AttestError> {
        let template_id = template.ok_or_else(|| {
            AttestError::validation("template is required for default policies")
        })?;
        let selected = templates
            .template(template_id)
            .ok_or_else(|| AttestError::not_found("template", template_id))?;
        if templates.latest_template(&selected.name).is_none() {
            return Err(AttestError::not_found("latest template", &selected.name));
        }

        let mut policy = Self::blank(PolicyType::Default, draft, now)?;
        policy.template = Some(template_id);
        resolve_template_binding(&mut policy, templates)
            .ok_or_else(|| AttestError::not_found("latest template", &selected.name))?;
        Ok(policy)
    }

    /// Create a custom policy authored by `created_by`.
    pub fn create_custom(
        draft: PolicyDraft,
        created_by: Option<EmployeeId>,
        employees: &impl EmployeeDirectory,
        now: DateTime<Utc>,
    ) -> Result<Self, AttestError> {
        let has_link = draft
            .document_link
            .as_deref()
            .is_some_and(|l| !l.trim().is_empty());
        let author = match created_by {
            Some(author) if has_link => author,
            _ => {
                return Err(AttestError::validation(
                    "created_by and document_link are required for custom policies",
                ))
            }
        };
        if employees.resolve_employee(author).is_err() {
            return Err(AttestError::validation(format!(
                "created_by does not resolve to an employee: {author}"
            )));
        }

        let mut policy = Self::blank(PolicyType::Custom, draft, now)?;
        policy.created_by = Some(author);
        Ok(policy)
    }

    /// Update descriptive fields. Rebinds the template first.
    pub fn update(
        &mut self,
        patch: PolicyPatch,
        templates: &impl TemplateDirectory,
        now: DateTime<Utc>,
    ) -> Result<(), AttestError> {
        let title = match patch.title {
            Some(title) if title.trim().is_empty() => {
                return Err(AttestError::validation("policy title must not be empty"))
            }
            other => other.map(|t| t.trim().to_string()),
        };
        resolve_template_binding(self, templates);
        if let Some(title) = title {
            self.title = title;
        }
        if let Some(description) = patch.description {
            self.description = Some(description);
        }
        if let Some(link) = patch.document_link {
            self.document_link = Some(link);
        }
        if let Some(cc) = patch.customer_compliance {
            self.customer_compliance = Some(cc);
        }
        self.updated_at = now;
        Ok(())
    }

    /// Move the approval state. Rebinds the template first.
    ///
    /// `approved_at` is stamped only when absent, so a policy that goes
    /// approved → pending → approved keeps its first approval time. Only a
    /// rejection clears it.
    pub fn update_approval(
        &mut self,
        status: ApprovalStatus,
        approved_by: Option<EmployeeId>,
        templates: &impl TemplateDirectory,
        now: DateTime<Utc>,
    ) {
        resolve_template_binding(self, templates);
        self.approval_status = status;
        if approved_by.is_some() {
            self.approved_by = approved_by;
        }
        match status {
            ApprovalStatus::Approved => {
                if self.approved_at.is_none() {
                    self.approved_at = Some(now);
                }
            }
            ApprovalStatus::Rejected => self.approved_at = None,
            ApprovalStatus::Pending => {}
        }
        self.updated_at = now;
    }

    /// Write a configuration-driven version bump. Only the version moves;
    /// the template binding is not re-resolved here.
    pub fn push_version(&mut self, version: u32, now: DateTime<Utc>) {
        self.version = version;
        self.updated_at = now;
    }

    pub fn soft_delete(&mut self, now: DateTime<Utc>) {
        self.is_deleted = true;
        self.updated_at = now;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::EmployeeProfile;
    use crate::template::{TemplateCatalog, TemplateDraft, TemplatePatch};
    use chrono::{Duration, TimeZone};
    use std::collections::HashMap;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 2, 1, 9, 0, 0).unwrap()
    }

    fn publish(catalog: &mut TemplateCatalog, name: &str, v: u32, latest: bool) -> TemplateVersion {
        catalog
            .publish(
                TemplateDraft {
                    name: name.to_string(),
                    description: None,
                    document_link: None,
                    version_number: v,
                    is_active: true,
                    change_log: None,
                },
                latest,
                now(),
            )
            .unwrap()
    }

    fn draft(title: &str) -> PolicyDraft {
        PolicyDraft {
            title: title.to_string(),
            ..PolicyDraft::default()
        }
    }

    struct Staff(HashMap<EmployeeId, EmployeeProfile>);

    impl EmployeeDirectory for Staff {
        fn resolve_employee(&self, id: EmployeeId) -> Result<EmployeeProfile, AttestError> {
            self.0
                .get(&id)
                .cloned()
                .ok_or_else(|| AttestError::not_found("employee", id))
        }
    }

    fn staff_with_one() -> (Staff, EmployeeId) {
        let id = EmployeeId::new();
        let profile = EmployeeProfile {
            id,
            name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
            join_date: None,
            created_at: now(),
        };
        (Staff(HashMap::from([(id, profile)])), id)
    }

    #[test]
    fn default_policy_binds_to_latest_regardless_of_selected_version() {
        let mut catalog = TemplateCatalog::new();
        let v1 = publish(&mut catalog, "infosec", 1, false);
        let v3 = publish(&mut catalog, "infosec", 3, true);

        let policy = Policy::create_default(draft("Infosec"), Some(v1.id), &catalog, now()).unwrap();
        assert_eq!(policy.template, Some(v3.id));
        assert_eq!(policy.version, 3);
        assert_eq!(policy.approval_status, ApprovalStatus::Pending);
        assert_eq!(policy.approval_requested_at, now());
    }

    #[test]
    fn default_policy_requires_template() {
        let catalog = TemplateCatalog::new();
        let err = Policy::create_default(draft("Infosec"), None, &catalog, now()).unwrap_err();
        assert!(matches!(err, AttestError::Validation(_)));
    }

    #[test]
    fn default_policy_without_latest_is_not_found() {
        let mut catalog = TemplateCatalog::new();
        let v1 = publish(&mut catalog, "infosec", 1, false);
        let err = Policy::create_default(draft("Infosec"), Some(v1.id), &catalog, now()).unwrap_err();
        assert!(matches!(err, AttestError::NotFound { .. }));

        let err = Policy::create_default(draft("Infosec"), Some(TemplateId::new()), &catalog, now())
            .unwrap_err();
        assert!(matches!(err, AttestError::NotFound { resource: "template", .. }));
    }

    #[test]
    fn unrelated_update_rebinds_to_new_latest() {
        let mut catalog = TemplateCatalog::new();
        let v1 = publish(&mut catalog, "infosec", 1, true);
        let mut policy = Policy::create_default(draft("Infosec"), Some(v1.id), &catalog, now()).unwrap();
        assert_eq!(policy.version, 1);

        let v2 = publish(&mut catalog, "infosec", 2, true);
        let patch = PolicyPatch {
            description: Some("clarified scope".to_string()),
            ..PolicyPatch::default()
        };
        policy.update(patch, &catalog, now() + Duration::days(1)).unwrap();

        assert_eq!(policy.template, Some(v2.id));
        assert_eq!(policy.version, v2.version_number);
        assert_eq!(policy.description.as_deref(), Some("clarified scope"));
    }

    #[test]
    fn binding_survives_family_without_latest() {
        let mut catalog = TemplateCatalog::new();
        let v1 = publish(&mut catalog, "infosec", 1, true);
        let mut policy = Policy::create_default(draft("Infosec"), Some(v1.id), &catalog, now()).unwrap();

        let release = TemplatePatch {
            is_latest: Some(false),
            ..TemplatePatch::default()
        };
        catalog.update(v1.id, release, now()).unwrap();
        assert!(resolve_template_binding(&mut policy, &catalog).is_none());
        assert_eq!(policy.template, Some(v1.id));
        assert_eq!(policy.version, 1);
    }

    #[test]
    fn custom_policy_requires_author_and_link() {
        let (staff, author) = staff_with_one();

        let missing_link = Policy::create_custom(draft("BYOD"), Some(author), &staff, now());
        assert!(matches!(missing_link, Err(AttestError::Validation(_))));

        let mut with_link = draft("BYOD");
        with_link.document_link = Some("https://docs.example.com/byod".to_string());
        let missing_author = Policy::create_custom(with_link.clone(), None, &staff, now());
        assert!(matches!(missing_author, Err(AttestError::Validation(_))));

        let unknown = Policy::create_custom(with_link.clone(), Some(EmployeeId::new()), &staff, now());
        assert!(matches!(unknown, Err(AttestError::Validation(_))));

        let policy = Policy::create_custom(with_link, Some(author), &staff, now()).unwrap();
        assert_eq!(policy.policy_type, PolicyType::Custom);
        assert_eq!(policy.created_by, Some(author));
        assert!(policy.template.is_none());
    }

    #[test]
    fn approval_sets_timestamp_once_and_rejection_clears_it() {
        let catalog = TemplateCatalog::new();
        let (staff, author) = staff_with_one();
        let mut d = draft("BYOD");
        d.document_link = Some("https://docs.example.com/byod".to_string());
        let mut policy = Policy::create_custom(d, Some(author), &staff, now()).unwrap();

        let t1 = now() + Duration::hours(1);
        policy.update_approval(ApprovalStatus::Approved, Some(author), &catalog, t1);
        assert_eq!(policy.approved_at, Some(t1));
        assert_eq!(policy.approved_by, Some(author));

        let t2 = now() + Duration::hours(2);
        policy.update_approval(ApprovalStatus::Approved, None, &catalog, t2);
        assert_eq!(policy.approved_at, Some(t1));

        policy.update_approval(ApprovalStatus::Rejected, None, &catalog, t2);
        assert_eq!(policy.approved_at, None);

        let t3 = now() + Duration::hours(3);
        policy.update_approval(ApprovalStatus::Approved, None, &catalog, t3);
        assert_eq!(policy.approved_at, Some(t3));
    }

    /// Returning to pending keeps the first approval time; a second
    /// approval does not refresh it. This is the literal set-if-absent rule.
    #[test]
    fn pending_after_approval_preserves_first_approval_time() {
        let catalog = TemplateCatalog::new();
        let (staff, author) = staff_with_one();
        let mut d = draft("BYOD");
        d.document_link = Some("https://docs.example.com/byod".to_string());
        let mut policy = Policy::create_custom(d, Some(author), &staff, now()).unwrap();

        let first = now() + Duration::days(1);
        policy.update_approval(ApprovalStatus::Approved, None, &catalog, first);
        policy.update_approval(ApprovalStatus::Pending, None, &catalog, now() + Duration::days(2));
        assert_eq!(policy.approved_at, Some(first));

        policy.update_approval(ApprovalStatus::Approved, None, &catalog, now() + Duration::days(3));
        assert_eq!(policy.approved_at, Some(first));
    }

    #[test]
    fn approval_update_also_rebinds_template() {
        let mut catalog = TemplateCatalog::new();
        let v1 = publish(&mut catalog, "aup", 1, true);
        let mut policy = Policy::create_default(draft("AUP"), Some(v1.id), &catalog, now()).unwrap();
        let v5 = publish(&mut catalog, "aup", 5, true);

        policy.update_approval(ApprovalStatus::Approved, None, &catalog, now());
        assert_eq!(policy.template, Some(v5.id));
        assert_eq!(policy.version, 5);
    }

    #[test]
    fn invalid_approval_status_is_validation_error() {
        assert!(matches!(
            "archived".parse::<ApprovalStatus>(),
            Err(AttestError::Validation(_))
        ));
        assert_eq!("rejected".parse::<ApprovalStatus>().unwrap(), ApprovalStatus::Rejected);
        assert!(matches!("template".parse::<PolicyType>(), Err(AttestError::Validation(_))));
    }

    #[test]
    fn blank_title_is_rejected() {
        let mut catalog = TemplateCatalog::new();
        let v1 = publish(&mut catalog, "aup", 1, true);
        let err = Policy::create_default(draft("  "), Some(v1.id), &catalog, now()).unwrap_err();
        assert!(matches!(err, AttestError::Validation(_)));
    }
}
