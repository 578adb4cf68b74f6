//! # attest-state: Acknowledgement Lifecycle State Machines
//!
//! Pure domain logic. Nothing in this crate performs I/O: collaborators
//! (employee lookup, template lookup, time) arrive as trait objects or
//! plain values, and every operation returns the state it produced so the
//! caller decides how to persist it and whom to notify.
//!
//! ## State Machines
//!
//! - **Template families** (`template.rs`): versions grouped by name with a
//!   single derived `latest()` pointer.
//!
//! - **Policies** (`policy.rs`): default policies track their template
//!   family's latest version on every write; custom policies carry their own
//!   document. Approval moves between `pending`, `approved` and `rejected`.
//!
//! - **Configurations** (`configuration.rs`): creating a configuration bumps
//!   the parent policy's version exactly once.
//!
//! - **Acknowledgements** (`acknowledgement.rs`, `escalation.rs`):
//!   `pending → acknowledged`, with an escalation tier that advances
//!   `none → escalated_to_hr → escalated_to_cxo` one step per save while the
//!   record is overdue.
//!
//! - **Audit trail** (`audit.rs`): a declared table of observed transitions
//!   that produce append-only history rows.
//!
//! ## Design
//!
//! Escalation is split into a pure decision (`evaluate_escalation`) and an
//! application step (`Acknowledgement::apply_transition`). Notifications are
//! the caller's business; [`lifecycle::SaveOutcome`] tells it what happened.

pub mod acknowledgement;
pub mod audit;
pub mod configuration;
pub mod directory;
pub mod escalation;
pub mod lifecycle;
pub mod policy;
pub mod rules;
pub mod template;

// ─── Template re-exports ────────────────────────────────────────────

pub use template::{TemplateCatalog, TemplateDraft, TemplateFamily, TemplatePatch, TemplateVersion};

// ─── Policy re-exports ──────────────────────────────────────────────

pub use configuration::{ConfigurationPatch, ConfigurationStatus, PolicyConfiguration};
pub use policy::{
    resolve_template_binding, ApprovalStatus, Policy, PolicyDraft, PolicyPatch, PolicyType,
};

// ─── Acknowledgement re-exports ─────────────────────────────────────

pub use acknowledgement::{
    compute_due_date, check_new_joiner_window, Acknowledgement, AcknowledgementPatch,
    AcknowledgementStatus, AcknowledgementType, PatchEffect, Submission,
};
pub use audit::{observe, AuditContext, HistoryRecord, ObservedTransition, OBSERVED_TRANSITIONS};
pub use escalation::{evaluate_escalation, EscalationStatus, EscalationTier, EscalationTransition};
pub use lifecycle::{save, SaveOutcome};

// ─── Collaborators and rules ────────────────────────────────────────

pub use directory::{EmployeeDirectory, EmployeeProfile, TemplateDirectory};
pub use rules::{LifecycleRules, MAX_RULE_DAYS};
