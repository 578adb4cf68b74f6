//! # Audit Trail
//!
//! Append-only history of acknowledgement field transitions.
//!
//! Only the transitions declared in [`OBSERVED_TRANSITIONS`] are recorded;
//! this is not a general field diff. Entries are checked in order and at
//! most one row is produced per save.

use attest_core::{AcknowledgementId, HistoryId};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::acknowledgement::{Acknowledgement, AcknowledgementStatus};

/// One audit row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryRecord {
    pub id: HistoryId,
    pub acknowledgement_id: AcknowledgementId,
    pub field: String,
    pub old_value: Option<String>,
    pub new_value: Option<String>,
    pub updated_at: DateTime<Utc>,
}

/// What the audit step may know beyond the record itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AuditContext {
    /// The acknowledgement already has at least one history row.
    pub has_history: bool,
    /// `acknowledged_at` as stored before this save.
    pub previous_acknowledged_at: Option<DateTime<Utc>>,
}

/// A declared field transition worth recording.
#[derive(Clone, Copy)]
pub struct ObservedTransition {
    pub field: &'static str,
    pub applies: fn(&Acknowledgement, &AuditContext) -> bool,
    pub old_value: fn(&Acknowledgement) -> Option<String>,
    pub new_value: fn(&Acknowledgement) -> Option<String>,
}

impl std::fmt::Debug for ObservedTransition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObservedTransition")
            .field("field", &self.field)
            .finish_non_exhaustive()
    }
}

/// The tracked transitions, in evaluation order.
pub const OBSERVED_TRANSITIONS: &[ObservedTransition] = &[
    ObservedTransition {
        field: "status",
        applies: status_became_acknowledged,
        old_value: pending_literal,
        new_value: status_value,
    },
    ObservedTransition {
        field: "acknowledged_at",
        applies: timestamp_set_while_pending,
        old_value: nothing,
        new_value: acknowledged_at_value,
    },
];

fn status_became_acknowledged(ack: &Acknowledgement, ctx: &AuditContext) -> bool {
    ack.status == AcknowledgementStatus::Acknowledged
        && ack.acknowledged_at.is_some()
        && !ctx.has_history
}

fn timestamp_set_while_pending(ack: &Acknowledgement, ctx: &AuditContext) -> bool {
    ack.status == AcknowledgementStatus::Pending
        && ack.acknowledged_at.is_some()
        && ack.acknowledged_at != ctx.previous_acknowledged_at
}

fn pending_literal(_ack: &Acknowledgement) -> Option<String> {
    Some(AcknowledgementStatus::Pending.as_str().to_string())
}

fn status_value(ack: &Acknowledgement) -> Option<String> {
    Some(ack.status.as_str().to_string())
}

fn nothing(_ack: &Acknowledgement) -> Option<String> {
    None
}

fn acknowledged_at_value(ack: &Acknowledgement) -> Option<String> {
    ack.acknowledged_at
        .map(|at| at.to_rfc3339_opts(SecondsFormat::Secs, true))
}

/// Run the declared transitions against a saved record.
///
/// Callers invoke this only for records that already exist in storage.
pub fn observe(
    ack: &Acknowledgement,
    ctx: &AuditContext,
    now: DateTime<Utc>,
) -> Option<HistoryRecord> {
    OBSERVED_TRANSITIONS
        .iter()
        .find(|t| (t.applies)(ack, ctx))
        .map(|t| HistoryRecord {
            id: HistoryId::new(),
            acknowledgement_id: ack.id,
            field: t.field.to_string(),
            old_value: (t.old_value)(ack),
            new_value: (t.new_value)(ack),
            updated_at: now,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::acknowledgement::AcknowledgementType;
    use crate::escalation::EscalationStatus;
    use attest_core::{EmployeeId, PolicyId};
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 7, 1, 8, 30, 0).unwrap()
    }

    fn ack() -> Acknowledgement {
        Acknowledgement {
            id: AcknowledgementId::new(),
            policy_id: PolicyId::new(),
            employee_id: EmployeeId::new(),
            policy_version: 1,
            acknowledgement_type: AcknowledgementType::Manual,
            status: AcknowledgementStatus::Pending,
            escalation_status: EscalationStatus::NotEscalated,
            due_date: now(),
            acknowledged_at: None,
            created_at: now(),
            updated_at: now(),
        }
    }

    #[test]
    fn acknowledged_without_history_records_status() {
        let mut a = ack();
        a.acknowledge(now()).unwrap();
        let row = observe(&a, &AuditContext::default(), now()).unwrap();
        assert_eq!(row.field, "status");
        assert_eq!(row.old_value.as_deref(), Some("pending"));
        assert_eq!(row.new_value.as_deref(), Some("acknowledged"));
        assert_eq!(row.acknowledgement_id, a.id);
    }

    #[test]
    fn acknowledged_with_history_records_nothing() {
        let mut a = ack();
        a.acknowledge(now()).unwrap();
        let ctx = AuditContext {
            has_history: true,
            ..AuditContext::default()
        };
        assert!(observe(&a, &ctx, now()).is_none());
    }

    #[test]
    fn timestamp_while_pending_records_acknowledged_at() {
        let mut a = ack();
        a.acknowledged_at = Some(now());
        let ctx = AuditContext {
            has_history: true,
            ..AuditContext::default()
        };
        let row = observe(&a, &ctx, now()).unwrap();
        assert_eq!(row.field, "acknowledged_at");
        assert_eq!(row.old_value, None);
        assert_eq!(row.new_value.as_deref(), Some("2024-07-01T08:30:00Z"));
    }

    #[test]
    fn unchanged_timestamp_while_pending_records_nothing() {
        let mut a = ack();
        a.acknowledged_at = Some(now());
        let ctx = AuditContext {
            has_history: true,
            previous_acknowledged_at: Some(now()),
        };
        assert!(observe(&a, &ctx, now()).is_none());

        // A different timestamp is a new transition.
        let moved = AuditContext {
            has_history: true,
            previous_acknowledged_at: Some(now() - chrono::Duration::days(1)),
        };
        assert_eq!(observe(&a, &moved, now()).unwrap().field, "acknowledged_at");
    }

    #[test]
    fn plain_pending_records_nothing() {
        assert!(observe(&ack(), &AuditContext::default(), now()).is_none());
    }

    #[test]
    fn exactly_two_transitions_are_declared() {
        let fields: Vec<&str> = OBSERVED_TRANSITIONS.iter().map(|t| t.field).collect();
        assert_eq!(fields, vec!["status", "acknowledged_at"]);
    }
}
