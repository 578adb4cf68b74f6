//! # Acknowledgement Save Pipeline
//!
//! Every write of an acknowledgement goes through [`save`]:
//!
//! 1. while pending, decide and apply at most one escalation step;
//! 2. for records that already exist in storage, run the audit table;
//! 3. bump `updated_at`.
//!
//! The caller persists the record and the history row, then sends whatever
//! notification the returned [`SaveOutcome`] calls for.

use chrono::{DateTime, Utc};

use crate::acknowledgement::Acknowledgement;
use crate::audit::{self, AuditContext, HistoryRecord};
use crate::escalation::EscalationTransition;
use crate::rules::LifecycleRules;

/// Side effects a save produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SaveOutcome {
    pub escalation: Option<EscalationTransition>,
    pub history: Option<HistoryRecord>,
}

impl SaveOutcome {
    pub fn is_noop(&self) -> bool {
        self.escalation.is_none() && self.history.is_none()
    }
}

/// Run one save of `ack`.
///
/// `audit` is `None` only for the first write of a new submission; otherwise
/// it describes the stored record the save starts from.
pub fn save(
    ack: &mut Acknowledgement,
    audit: Option<AuditContext>,
    rules: &LifecycleRules,
    now: DateTime<Utc>,
) -> SaveOutcome {
    let mut outcome = SaveOutcome::default();

    if let Some(transition) = ack.evaluate_escalation(now, rules) {
        // Decided against `ack` itself, so `from` always matches.
        if ack.apply_transition(&transition).is_ok() {
            tracing::debug!(
                acknowledgement = %ack.id,
                tier = transition.tier.as_str(),
                overdue_days = transition.overdue_days,
                "escalation step applied"
            );
            outcome.escalation = Some(transition);
        }
    }

    if let Some(ctx) = audit {
        outcome.history = audit::observe(ack, &ctx, now);
    }

    ack.updated_at = now;
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::acknowledgement::{AcknowledgementStatus, AcknowledgementType, Submission};
    use crate::directory::EmployeeProfile;
    use crate::escalation::EscalationStatus;
    use attest_core::{EmployeeId, PolicyId};
    use chrono::{Duration, TimeZone};

    fn day0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
    }

    /// A manual acknowledgement opened at day 0, due at day 30.
    fn manual_ack() -> Acknowledgement {
        let employee = EmployeeProfile {
            id: EmployeeId::new(),
            name: "Linus".to_string(),
            email: "linus@example.com".to_string(),
            join_date: Some(day0()),
            created_at: day0(),
        };
        let submission = Submission {
            employee_id: employee.id,
            policy_id: PolicyId::new(),
            policy_version: 1,
            acknowledgement_type: AcknowledgementType::Manual,
        };
        Acknowledgement::open(&submission, &employee, &LifecycleRules::default(), day0()).unwrap()
    }

    fn stored(ack: &Acknowledgement, has_history: bool) -> AuditContext {
        AuditContext {
            has_history,
            previous_acknowledged_at: ack.acknowledged_at,
        }
    }

    #[test]
    fn escalation_steps_once_per_save() {
        let rules = LifecycleRules::default();
        let mut ack = manual_ack();
        let due = ack.due_date;

        let ctx = stored(&ack, false);
        let out = save(&mut ack, Some(ctx), &rules, due + Duration::days(6));
        assert!(out.is_noop());
        assert_eq!(ack.escalation_status, EscalationStatus::NotEscalated);

        let ctx = stored(&ack, false);
        let out = save(&mut ack, Some(ctx), &rules, due + Duration::days(7));
        assert_eq!(ack.escalation_status, EscalationStatus::EscalatedToHr);
        assert_eq!(out.escalation.map(|t| t.to), Some(EscalationStatus::EscalatedToHr));

        let ctx = stored(&ack, false);
        let out = save(&mut ack, Some(ctx), &rules, due + Duration::days(20));
        assert_eq!(ack.escalation_status, EscalationStatus::EscalatedToCxo);
        assert!(out.escalation.is_some());

        let ctx = stored(&ack, false);
        let out = save(&mut ack, Some(ctx), &rules, due + Duration::days(40));
        assert!(out.escalation.is_none());
        assert_eq!(ack.updated_at, due + Duration::days(40));
    }

    #[test]
    fn both_thresholds_passed_still_takes_two_saves() {
        let rules = LifecycleRules::default();
        let mut ack = manual_ack();
        let late = ack.due_date + Duration::days(30);

        let ctx = stored(&ack, false);
        save(&mut ack, Some(ctx), &rules, late);
        assert_eq!(ack.escalation_status, EscalationStatus::EscalatedToHr);
        let ctx = stored(&ack, false);
        save(&mut ack, Some(ctx), &rules, late);
        assert_eq!(ack.escalation_status, EscalationStatus::EscalatedToCxo);
    }

    #[test]
    fn first_save_of_backdated_submission_escalates_without_audit() {
        let rules = LifecycleRules::default();
        let mut ack = manual_ack();
        ack.acknowledged_at = Some(day0());
        let late = ack.due_date + Duration::days(8);
        let out = save(&mut ack, None, &rules, late);
        assert!(out.escalation.is_some());
        assert!(out.history.is_none());
    }

    #[test]
    fn acknowledged_record_freezes_escalation_and_audits_once() {
        let rules = LifecycleRules::default();
        let mut ack = manual_ack();
        let due = ack.due_date;
        let ctx = stored(&ack, false);
        save(&mut ack, Some(ctx), &rules, due + Duration::days(8));
        assert_eq!(ack.escalation_status, EscalationStatus::EscalatedToHr);

        let at = due + Duration::days(9);
        ack.acknowledge(at).unwrap();
        let ctx = stored(&ack, false);
        let out = save(&mut ack, Some(ctx), &rules, at);
        assert_eq!(ack.status, AcknowledgementStatus::Acknowledged);
        assert!(out.escalation.is_none());
        let row = out.history.unwrap();
        assert_eq!(row.field, "status");

        let ctx = stored(&ack, true);
        let again = save(&mut ack, Some(ctx), &rules, due + Duration::days(30));
        assert!(again.is_noop());
        assert_eq!(ack.escalation_status, EscalationStatus::EscalatedToHr);
    }
}
