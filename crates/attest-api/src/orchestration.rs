//! # Lifecycle Orchestration
//!
//! Runs the `attest-state` operations against the shared stores. Each
//! function here is synchronous, takes the locks it needs in the order
//! documented in [`crate::state`], and returns the records the caller must
//! write through to the database.
//!
//! Notifications are not sent from inside these functions. Handlers persist
//! first and then call [`dispatch_notifications`], so a single-record
//! notification never describes a change that failed to commit. The
//! escalation sweep commits each record on its own and notifies every
//! advanced record, since the in-memory stores already reflect the step.

use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use attest_core::{AttestError, CustomerComplianceId, EmployeeId, PolicyId, TemplateId};
use attest_notify::{confirmation, escalation_notice};
use attest_state::{
    lifecycle, Acknowledgement, AcknowledgementPatch, ApprovalStatus, AuditContext, ConfigurationPatch,
    ConfigurationStatus, EmployeeDirectory, Policy, PolicyConfiguration, PolicyDraft, PolicyPatch,
    PolicyType, SaveOutcome, Submission, TemplateDraft, TemplatePatch, TemplateVersion,
};

use crate::state::AppState;

// ─── Templates ──────────────────────────────────────────────────────

/// A template version after a write, with its family's latest pointer.
#[derive(Debug, Clone)]
pub struct TemplateWrite {
    pub version: TemplateVersion,
    pub family_latest: Option<TemplateId>,
}

impl TemplateWrite {
    pub fn is_latest(&self) -> bool {
        self.family_latest == Some(self.version.id)
    }
}

pub fn publish_template(
    state: &AppState,
    draft: TemplateDraft,
    is_latest: bool,
) -> Result<TemplateWrite, AttestError> {
    let now = state.now();
    let mut catalog = state.templates.write();
    let version = catalog.publish(draft, is_latest, now)?;
    let family_latest = catalog.family(&version.name).and_then(|f| f.latest_id());
    tracing::info!(
        template = %version.id,
        name = %version.name,
        version_number = version.version_number,
        is_latest,
        "template version published"
    );
    Ok(TemplateWrite {
        version,
        family_latest,
    })
}

pub fn update_template(
    state: &AppState,
    id: TemplateId,
    patch: TemplatePatch,
) -> Result<TemplateWrite, AttestError> {
    let now = state.now();
    let mut catalog = state.templates.write();
    let version = catalog.update(id, patch, now)?;
    let family_latest = catalog.family(&version.name).and_then(|f| f.latest_id());
    Ok(TemplateWrite {
        version,
        family_latest,
    })
}

// ─── Policies ───────────────────────────────────────────────────────

/// Input for [`create_policy`].
#[derive(Debug, Clone)]
pub struct NewPolicy {
    pub policy_type: PolicyType,
    pub draft: PolicyDraft,
    pub template: Option<TemplateId>,
    pub created_by: Option<EmployeeId>,
}

fn check_customer_compliance(
    state: &AppState,
    id: Option<CustomerComplianceId>,
) -> Result<(), AttestError> {
    match id {
        Some(id) if !state.customer_compliances.contains(id.as_uuid()) => {
            Err(AttestError::not_found("customer compliance", id))
        }
        _ => Ok(()),
    }
}

fn live_policy(policy: &Policy) -> Result<(), AttestError> {
    if policy.is_deleted {
        return Err(AttestError::not_found("policy", policy.id));
    }
    Ok(())
}

pub fn create_policy(state: &AppState, input: NewPolicy) -> Result<Policy, AttestError> {
    check_customer_compliance(state, input.draft.customer_compliance)?;
    let now = state.now();
    let policy = match input.policy_type {
        PolicyType::Default => {
            let catalog = state.templates.read();
            Policy::create_default(input.draft, input.template, &*catalog, now)?
        }
        PolicyType::Custom => {
            Policy::create_custom(input.draft, input.created_by, &state.employees, now)?
        }
    };
    state.policies.insert(policy.id.0, policy.clone());
    tracing::info!(
        policy = %policy.id,
        policy_type = policy.policy_type.as_str(),
        version = policy.version,
        "policy created"
    );
    Ok(policy)
}

/// Update descriptive fields; default policies are rebound to their
/// family's latest template.
pub fn update_policy(
    state: &AppState,
    id: PolicyId,
    patch: PolicyPatch,
    approved_by: Option<EmployeeId>,
) -> Result<Policy, AttestError> {
    check_customer_compliance(state, patch.customer_compliance)?;
    if let Some(approver) = approved_by {
        state.employees.resolve_employee(approver)?;
    }
    let now = state.now();
    state
        .policies
        .try_update(id.as_uuid(), |policy| {
            live_policy(policy)?;
            let catalog = state.templates.read();
            policy.update(patch, &*catalog, now)?;
            if approved_by.is_some() {
                policy.approved_by = approved_by;
            }
            Ok(policy.clone())
        })
        .unwrap_or_else(|| Err(AttestError::not_found("policy", id)))
}

pub fn update_policy_approval(
    state: &AppState,
    id: PolicyId,
    status: ApprovalStatus,
    approved_by: Option<EmployeeId>,
) -> Result<Policy, AttestError> {
    if let Some(approver) = approved_by {
        state.employees.resolve_employee(approver)?;
    }
    let now = state.now();
    state
        .policies
        .try_update(id.as_uuid(), |policy| {
            live_policy(policy)?;
            let catalog = state.templates.read();
            policy.update_approval(status, approved_by, &*catalog, now);
            tracing::info!(policy = %policy.id, status = status.as_str(), "policy approval updated");
            Ok(policy.clone())
        })
        .unwrap_or_else(|| Err(AttestError::not_found("policy", id)))
}

pub fn delete_policy(state: &AppState, id: PolicyId) -> Result<Policy, AttestError> {
    let now = state.now();
    state
        .policies
        .try_update(id.as_uuid(), |policy| {
            live_policy(policy)?;
            policy.soft_delete(now);
            Ok(policy.clone())
        })
        .unwrap_or_else(|| Err(AttestError::not_found("policy", id)))
}

// ─── Configurations ─────────────────────────────────────────────────

/// Create a configuration and bump its policy. Returns both records.
///
/// The policy's row lock is held across the read of `version`, the bump,
/// and the configuration insert, so concurrent creates for one policy get
/// consecutive versions.
pub fn create_configuration(
    state: &AppState,
    policy_id: PolicyId,
    key: String,
    value: String,
    status: ConfigurationStatus,
) -> Result<(PolicyConfiguration, Policy), AttestError> {
    let now = state.now();
    state
        .policies
        .try_update(policy_id.as_uuid(), |policy| {
            let configuration = PolicyConfiguration::create(policy, key, value, status, now)?;
            state
                .configurations
                .insert(configuration.id.0, configuration.clone());
            tracing::info!(
                policy = %policy.id,
                configuration = %configuration.id,
                version = configuration.version,
                "policy version bumped by configuration"
            );
            Ok((configuration, policy.clone()))
        })
        .unwrap_or_else(|| Err(AttestError::not_found("policy", policy_id)))
}

pub fn update_configuration(
    state: &AppState,
    id: Uuid,
    patch: ConfigurationPatch,
) -> Result<PolicyConfiguration, AttestError> {
    let now = state.now();
    state
        .configurations
        .try_update(&id, |configuration| {
            configuration.update(patch, now)?;
            Ok(configuration.clone())
        })
        .unwrap_or_else(|| Err(AttestError::not_found("policy configuration", id)))
}

// ─── Acknowledgements ───────────────────────────────────────────────

/// An acknowledgement after one pass through the save pipeline.
#[derive(Debug, Clone)]
pub struct AcknowledgementWrite {
    pub acknowledgement: Acknowledgement,
    pub outcome: SaveOutcome,
    /// The save moved the record from pending to acknowledged.
    pub confirmed: bool,
}

/// Open a new acknowledgement.
///
/// The uniqueness check, due-date computation, first escalation pass and
/// insert all run under the acknowledgement store's write lock.
pub fn submit_acknowledgement(
    state: &AppState,
    submission: Submission,
) -> Result<AcknowledgementWrite, AttestError> {
    let employee = state.employees.resolve_employee(submission.employee_id)?;
    match state.policies.get(submission.policy_id.as_uuid()) {
        Some(policy) if !policy.is_deleted => {}
        _ => return Err(AttestError::not_found("policy", submission.policy_id)),
    }
    let rules = state.config.rules;
    let now = state.now();

    state.acknowledgements.write(|acks| {
        let key = (
            submission.employee_id,
            submission.policy_id,
            submission.policy_version,
        );
        if acks.values().any(|a| a.uniqueness_key() == key) {
            return Err(AttestError::validation(format!(
                "an acknowledgement already exists for {} on {} version {}",
                submission.employee_id, submission.policy_id, submission.policy_version
            )));
        }

        let mut ack = Acknowledgement::open(&submission, &employee, &rules, now)?;
        let outcome = lifecycle::save(&mut ack, None, &rules, now);
        acks.insert(ack.id.0, ack.clone());
        tracing::info!(
            acknowledgement = %ack.id,
            kind = ack.acknowledgement_type.as_str(),
            due_date = %ack.due_date,
            "acknowledgement submitted"
        );
        Ok(AcknowledgementWrite {
            acknowledgement: ack,
            outcome,
            confirmed: false,
        })
    })
}

/// Save an existing acknowledgement: mutate a working copy, run the save
/// pipeline, append any history row, then commit the copy. A failing
/// mutation leaves the stored record untouched.
fn save_existing(
    state: &AppState,
    id: Uuid,
    mutate: impl FnOnce(&mut Acknowledgement) -> Result<bool, AttestError>,
) -> Result<AcknowledgementWrite, AttestError> {
    let rules = state.config.rules;
    let now = state.now();
    state
        .acknowledgements
        .try_update(&id, |stored| {
            let mut working = stored.clone();
            let confirmed = mutate(&mut working)?;

            let mut history = state.history.write();
            let audit = AuditContext {
                has_history: history.iter().any(|h| h.acknowledgement_id == working.id),
                previous_acknowledged_at: stored.acknowledged_at,
            };
            let outcome = lifecycle::save(&mut working, Some(audit), &rules, now);
            if let Some(row) = &outcome.history {
                history.push(row.clone());
            }

            *stored = working.clone();
            Ok(AcknowledgementWrite {
                acknowledgement: working,
                outcome,
                confirmed,
            })
        })
        .unwrap_or_else(|| Err(AttestError::not_found("acknowledgement", id)))
}

/// Generic save with an optional patch.
pub fn save_acknowledgement(
    state: &AppState,
    id: Uuid,
    patch: AcknowledgementPatch,
) -> Result<AcknowledgementWrite, AttestError> {
    let now = state.now();
    save_existing(state, id, |ack| {
        Ok(ack.apply_patch(&patch, now)?.became_acknowledged)
    })
}

pub fn acknowledge(state: &AppState, id: Uuid) -> Result<AcknowledgementWrite, AttestError> {
    let now = state.now();
    save_existing(state, id, |ack| {
        ack.acknowledge(now)?;
        Ok(true)
    })
}

/// Save every pending acknowledgement once.
///
/// Each record advances at most one escalation tier per sweep.
pub fn sweep_escalations(state: &AppState) -> Vec<AcknowledgementWrite> {
    let mut pending: Vec<Acknowledgement> = state.acknowledgements.filter(|a| a.is_pending());
    pending.sort_by_key(|a| (a.due_date, a.id));

    let mut writes = Vec::with_capacity(pending.len());
    for ack in pending {
        match save_existing(state, ack.id.0, |_| Ok(false)) {
            Ok(write) => writes.push(write),
            Err(e) => tracing::warn!(acknowledgement = %ack.id, error = %e, "sweep skipped record"),
        }
    }
    let escalated = writes.iter().filter(|w| w.outcome.escalation.is_some()).count();
    tracing::info!(saved = writes.len(), escalated, "escalation sweep finished");
    writes
}

/// One escalation applied by a save, as reported to API clients.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct EscalationReport {
    pub acknowledgement_id: Uuid,
    pub from: String,
    pub to: String,
    pub overdue_days: i64,
    /// The write-through for this record succeeded (always true in-memory).
    pub persisted: bool,
}

impl EscalationReport {
    pub fn from_write(write: &AcknowledgementWrite) -> Option<Self> {
        let t = write.outcome.escalation?;
        Some(Self {
            acknowledgement_id: write.acknowledgement.id.0,
            from: t.from.as_str().to_string(),
            to: t.to.as_str().to_string(),
            overdue_days: t.overdue_days,
            persisted: true,
        })
    }
}

// ─── Notifications ──────────────────────────────────────────────────

/// Send whatever notifications a committed save calls for.
pub fn dispatch_notifications(state: &AppState, write: &AcknowledgementWrite) {
    let ack = &write.acknowledgement;
    if write.outcome.escalation.is_none() && !write.confirmed {
        return;
    }
    let (Some(policy), Some(employee)) = (
        state.policies.get(ack.policy_id.as_uuid()),
        state.employees.get(ack.employee_id.as_uuid()),
    ) else {
        tracing::warn!(
            acknowledgement = %ack.id,
            "policy or employee missing; notification skipped"
        );
        return;
    };
    let notify = &state.config.notify;

    if let Some(transition) = write.outcome.escalation {
        tracing::info!(
            acknowledgement = %ack.id,
            tier = transition.tier.as_str(),
            overdue_days = transition.overdue_days,
            "acknowledgement escalated"
        );
        metrics::counter!("attest_escalations_total", "tier" => transition.tier.as_str())
            .increment(1);
        state.notifier.send(escalation_notice(
            transition.tier,
            &policy.title,
            &employee.name,
            notify,
        ));
    }

    if write.confirmed {
        state.notifier.send(confirmation(
            &employee.name,
            &employee.email,
            &policy.title,
            ack.policy_version,
            notify,
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use attest_core::{EmployeeStatus, ManualClock};
    use attest_notify::RecordingNotifier;
    use attest_state::{AcknowledgementStatus, AcknowledgementType, EscalationStatus};
    use chrono::{DateTime, Duration, TimeZone, Utc};

    use crate::state::EmployeeRecord;

    fn day0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
    }

    fn fixture() -> (AppState, Arc<ManualClock>, RecordingNotifier, EmployeeId, PolicyId) {
        let clock = Arc::new(ManualClock::new(day0()));
        let notifier = RecordingNotifier::new();
        let state = AppState::new()
            .with_clock(clock.clone())
            .with_notifier(Arc::new(notifier.clone()));

        let employee = EmployeeRecord {
            id: Uuid::new_v4(),
            customer_id: Uuid::new_v4(),
            name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
            role: "engineer".to_string(),
            status: EmployeeStatus::Active,
            join_date: Some(day0()),
            created_at: day0(),
            updated_at: day0(),
        };
        state.employees.insert(employee.id, employee.clone());
        let employee_id = EmployeeId::from_uuid(employee.id);

        let policy = create_policy(
            &state,
            NewPolicy {
                policy_type: PolicyType::Custom,
                draft: PolicyDraft {
                    title: "Infosec".to_string(),
                    document_link: Some("https://docs.example.com/infosec".to_string()),
                    ..PolicyDraft::default()
                },
                template: None,
                created_by: Some(employee_id),
            },
        )
        .unwrap();
        (state, clock, notifier, employee_id, policy.id)
    }

    fn submission(employee: EmployeeId, policy: PolicyId, kind: AcknowledgementType) -> Submission {
        Submission {
            employee_id: employee,
            policy_id: policy,
            policy_version: 1,
            acknowledgement_type: kind,
        }
    }

    #[test]
    fn duplicate_submission_is_rejected() {
        let (state, _clock, _n, employee, policy) = fixture();
        submit_acknowledgement(&state, submission(employee, policy, AcknowledgementType::Manual))
            .unwrap();
        let err = submit_acknowledgement(
            &state,
            submission(employee, policy, AcknowledgementType::Periodic),
        )
        .unwrap_err();
        assert!(matches!(err, AttestError::Validation(_)));
        assert_eq!(state.acknowledgements.len(), 1);
    }

    #[test]
    fn sweep_notifies_each_tier_once() {
        let (state, clock, notifier, employee, policy) = fixture();
        let write =
            submit_acknowledgement(&state, submission(employee, policy, AcknowledgementType::Manual))
                .unwrap();
        let due = write.acknowledgement.due_date;

        clock.set(due + Duration::days(20));
        for w in sweep_escalations(&state) {
            dispatch_notifications(&state, &w);
        }
        for w in sweep_escalations(&state) {
            dispatch_notifications(&state, &w);
        }
        for w in sweep_escalations(&state) {
            dispatch_notifications(&state, &w);
        }

        let stored = state.acknowledgements.get(&write.acknowledgement.id.0).unwrap();
        assert_eq!(stored.escalation_status, EscalationStatus::EscalatedToCxo);
        let subjects: Vec<String> = notifier.sent().into_iter().map(|n| n.subject).collect();
        assert_eq!(
            subjects,
            vec![
                "Overdue Acknowledgment - Escalated to HR",
                "Overdue Acknowledgment - Escalated to CXO/CTO",
            ]
        );
    }

    #[test]
    fn pending_timestamp_is_audited_once_across_sweeps() {
        let (state, clock, _n, employee, policy) = fixture();
        let write =
            submit_acknowledgement(&state, submission(employee, policy, AcknowledgementType::Manual))
                .unwrap();
        let id = write.acknowledgement.id.0;

        let patch = AcknowledgementPatch {
            acknowledged_at: Some(day0()),
            ..AcknowledgementPatch::default()
        };
        save_acknowledgement(&state, id, patch).unwrap();
        for day in [2, 3, 4] {
            clock.set(day0() + Duration::days(day));
            sweep_escalations(&state);
        }

        let history = state.history_of(id);
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].field, "acknowledged_at");
        assert_eq!(history[0].new_value.as_deref(), Some("2024-01-01T00:00:00Z"));
    }

    #[test]
    fn acknowledge_records_history_and_confirms() {
        let (state, clock, notifier, employee, policy) = fixture();
        let write =
            submit_acknowledgement(&state, submission(employee, policy, AcknowledgementType::Manual))
                .unwrap();
        clock.advance(Duration::days(3));

        let done = acknowledge(&state, write.acknowledgement.id.0).unwrap();
        dispatch_notifications(&state, &done);

        assert_eq!(done.acknowledgement.status, AcknowledgementStatus::Acknowledged);
        let history = state.history_of(done.acknowledgement.id.0);
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].field, "status");
        assert_eq!(notifier.sent()[0].recipients, vec!["ada@example.com"]);

        // A second acknowledge fails and leaves the trail alone.
        assert!(acknowledge(&state, done.acknowledgement.id.0).is_err());
        assert_eq!(state.history_of(done.acknowledgement.id.0).len(), 1);
    }

    #[test]
    fn configuration_bumps_policy_version() {
        let (state, _clock, _n, _employee, policy) = fixture();
        let (cfg, bumped) = create_configuration(
            &state,
            policy,
            "retention_days".to_string(),
            "90".to_string(),
            ConfigurationStatus::Pending,
        )
        .unwrap();
        assert_eq!(cfg.version, 2);
        assert_eq!(bumped.version, 2);
        assert_eq!(state.policies.get(policy.as_uuid()).unwrap().version, 2);
    }

    #[test]
    fn deleted_policy_refuses_new_acknowledgements() {
        let (state, _clock, _n, employee, policy) = fixture();
        delete_policy(&state, policy).unwrap();
        let err = submit_acknowledgement(
            &state,
            submission(employee, policy, AcknowledgementType::Manual),
        )
        .unwrap_err();
        assert!(matches!(err, AttestError::NotFound { .. }));
    }
}
