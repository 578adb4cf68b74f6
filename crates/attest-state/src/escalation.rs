//! # Escalation Engine
//!
//! Decides whether a pending, overdue acknowledgement moves up one tier.
//!
//! | From               | Condition              | To                 |
//! |--------------------|------------------------|--------------------|
//! | `none`             | overdue ≥ 7 whole days | `escalated_to_hr`  |
//! | `escalated_to_hr`  | overdue ≥ 14 whole days| `escalated_to_cxo` |
//! | `escalated_to_cxo` | never                  |                    |
//!
//! At most one step per evaluation, even when both thresholds are already
//! behind. [`evaluate_escalation`] is pure; applying the result and
//! notifying are separate steps.

use std::str::FromStr;

use attest_core::{elapsed_whole_days, AttestError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::acknowledgement::{Acknowledgement, AcknowledgementStatus};
use crate::rules::LifecycleRules;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EscalationStatus {
    #[default]
    #[serde(rename = "none")]
    NotEscalated,
    EscalatedToHr,
    EscalatedToCxo,
}

impl EscalationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotEscalated => "none",
            Self::EscalatedToHr => "escalated_to_hr",
            Self::EscalatedToCxo => "escalated_to_cxo",
        }
    }

    /// No tier above this one.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::EscalatedToCxo)
    }
}

impl std::fmt::Display for EscalationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EscalationStatus {
    type Err = AttestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "none" => Ok(Self::NotEscalated),
            "escalated_to_hr" => Ok(Self::EscalatedToHr),
            "escalated_to_cxo" => Ok(Self::EscalatedToCxo),
            other => Err(AttestError::validation(format!(
                "invalid escalation status: {other:?}"
            ))),
        }
    }
}

/// Audience of an escalation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EscalationTier {
    Hr,
    Cxo,
}

impl EscalationTier {
    /// Role named in the notification.
    pub fn role(&self) -> &'static str {
        match self {
            Self::Hr => "HR",
            Self::Cxo => "CXO/CTO",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Hr => "hr",
            Self::Cxo => "cxo",
        }
    }

    /// Escalation status after reaching this tier.
    pub fn status(&self) -> EscalationStatus {
        match self {
            Self::Hr => EscalationStatus::EscalatedToHr,
            Self::Cxo => EscalationStatus::EscalatedToCxo,
        }
    }
}

impl std::fmt::Display for EscalationTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.role())
    }
}

/// One tier step decided by [`evaluate_escalation`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EscalationTransition {
    pub from: EscalationStatus,
    pub to: EscalationStatus,
    pub tier: EscalationTier,
    pub overdue_days: i64,
}

/// Decide the next escalation step, if any.
///
/// Fires only while `status` is pending and `now` is strictly past
/// `due_date`.
pub fn evaluate_escalation(
    status: AcknowledgementStatus,
    due_date: DateTime<Utc>,
    escalation_status: EscalationStatus,
    now: DateTime<Utc>,
    rules: &LifecycleRules,
) -> Option<EscalationTransition> {
    if status != AcknowledgementStatus::Pending || now <= due_date {
        return None;
    }
    let overdue_days = elapsed_whole_days(due_date, now);
    let tier = match escalation_status {
        EscalationStatus::NotEscalated if overdue_days >= rules.hr_escalation_after_days => {
            EscalationTier::Hr
        }
        EscalationStatus::EscalatedToHr if overdue_days >= rules.cxo_escalation_after_days => {
            EscalationTier::Cxo
        }
        _ => return None,
    };
    Some(EscalationTransition {
        from: escalation_status,
        to: tier.status(),
        tier,
        overdue_days,
    })
}

impl Acknowledgement {
    /// [`evaluate_escalation`] on this record's fields.
    pub fn evaluate_escalation(
        &self,
        now: DateTime<Utc>,
        rules: &LifecycleRules,
    ) -> Option<EscalationTransition> {
        evaluate_escalation(self.status, self.due_date, self.escalation_status, now, rules)
    }

    /// Apply a transition decided against this record.
    ///
    /// Rejects a transition whose `from` no longer matches, which means it
    /// was decided against a stale copy.
    pub fn apply_transition(&mut self, transition: &EscalationTransition) -> Result<(), AttestError> {
        if self.escalation_status != transition.from {
            return Err(AttestError::validation(format!(
                "stale escalation for {}: expected {}, found {}",
                self.id, transition.from, self.escalation_status
            )));
        }
        self.escalation_status = transition.to;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn due() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap()
    }

    fn eval(esc: EscalationStatus, days: i64) -> Option<EscalationTransition> {
        evaluate_escalation(
            AcknowledgementStatus::Pending,
            due(),
            esc,
            due() + Duration::days(days),
            &LifecycleRules::default(),
        )
    }

    #[test]
    fn six_days_overdue_does_nothing() {
        assert!(eval(EscalationStatus::NotEscalated, 6).is_none());
    }

    #[test]
    fn seven_days_overdue_goes_to_hr() {
        let t = eval(EscalationStatus::NotEscalated, 7).unwrap();
        assert_eq!(t.to, EscalationStatus::EscalatedToHr);
        assert_eq!(t.tier, EscalationTier::Hr);
        assert_eq!(t.overdue_days, 7);
    }

    #[test]
    fn twenty_days_overdue_still_steps_one_tier() {
        let first = eval(EscalationStatus::NotEscalated, 20).unwrap();
        assert_eq!(first.to, EscalationStatus::EscalatedToHr);

        let second = eval(first.to, 20).unwrap();
        assert_eq!(second.from, EscalationStatus::EscalatedToHr);
        assert_eq!(second.to, EscalationStatus::EscalatedToCxo);
        assert_eq!(second.tier.role(), "CXO/CTO");
    }

    #[test]
    fn hr_tier_waits_for_fourteen_days() {
        assert!(eval(EscalationStatus::EscalatedToHr, 13).is_none());
        assert!(eval(EscalationStatus::EscalatedToHr, 14).is_some());
    }

    #[test]
    fn cxo_is_terminal() {
        assert!(eval(EscalationStatus::EscalatedToCxo, 400).is_none());
        assert!(EscalationStatus::EscalatedToCxo.is_terminal());
    }

    #[test]
    fn partial_days_are_floored() {
        let now = due() + Duration::days(7) - Duration::minutes(1);
        let t = evaluate_escalation(
            AcknowledgementStatus::Pending,
            due(),
            EscalationStatus::NotEscalated,
            now,
            &LifecycleRules::default(),
        );
        assert!(t.is_none());
    }

    #[test]
    fn not_yet_due_and_acknowledged_never_escalate() {
        assert!(eval(EscalationStatus::NotEscalated, -10).is_none());
        assert!(eval(EscalationStatus::NotEscalated, 0).is_none());
        let acknowledged = evaluate_escalation(
            AcknowledgementStatus::Acknowledged,
            due(),
            EscalationStatus::NotEscalated,
            due() + Duration::days(30),
            &LifecycleRules::default(),
        );
        assert!(acknowledged.is_none());
    }

    #[test]
    fn custom_thresholds_are_honoured() {
        let rules = LifecycleRules {
            hr_escalation_after_days: 1,
            cxo_escalation_after_days: 2,
            ..LifecycleRules::default()
        };
        let t = evaluate_escalation(
            AcknowledgementStatus::Pending,
            due(),
            EscalationStatus::NotEscalated,
            due() + Duration::days(1),
            &rules,
        );
        assert_eq!(t.map(|t| t.tier), Some(EscalationTier::Hr));
    }

    #[test]
    fn escalation_status_wire_names() {
        assert_eq!(
            serde_json::to_value(EscalationStatus::NotEscalated).unwrap(),
            serde_json::json!("none")
        );
        assert_eq!(
            serde_json::to_value(EscalationStatus::EscalatedToCxo).unwrap(),
            serde_json::json!("escalated_to_cxo")
        );
        assert_eq!("none".parse::<EscalationStatus>().unwrap(), EscalationStatus::NotEscalated);
    }
}
