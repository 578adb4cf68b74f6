//! # Acknowledgement Lifecycle
//!
//! One employee's confirmation of one policy version.
//!
//! ```text
//!   pending ──acknowledge──► acknowledged
//!      │
//!      └─ escalation_status: none → escalated_to_hr → escalated_to_cxo
//!         (advances only while pending; see escalation.rs)
//! ```
//!
//! The due date is fixed at submission and never changes afterwards. The
//! `(employee, policy, policy_version)` triple is unique across all records;
//! that check needs the whole store and lives with the caller, which gets
//! the key from [`Acknowledgement::uniqueness_key`].

use std::str::FromStr;

use attest_core::{AcknowledgementId, AttestError, EmployeeId, PolicyId};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::directory::EmployeeProfile;
use crate::escalation::EscalationStatus;
use crate::rules::LifecycleRules;

/// Why an acknowledgement was requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AcknowledgementType {
    NewJoiner,
    Periodic,
    Manual,
}

impl AcknowledgementType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NewJoiner => "new_joiner",
            Self::Periodic => "periodic",
            Self::Manual => "manual",
        }
    }
}

impl std::fmt::Display for AcknowledgementType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AcknowledgementType {
    type Err = AttestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "new_joiner" => Ok(Self::NewJoiner),
            "periodic" => Ok(Self::Periodic),
            "manual" => Ok(Self::Manual),
            other => Err(AttestError::validation(format!(
                "invalid acknowledgement type: {other:?}"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AcknowledgementStatus {
    #[default]
    Pending,
    Acknowledged,
}

impl AcknowledgementStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Acknowledged => "acknowledged",
        }
    }
}

impl std::fmt::Display for AcknowledgementStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AcknowledgementStatus {
    type Err = AttestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "acknowledged" => Ok(Self::Acknowledged),
            other => Err(AttestError::validation(format!(
                "invalid acknowledgement status: {other:?}"
            ))),
        }
    }
}

/// Input of `submit`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub employee_id: EmployeeId,
    pub policy_id: PolicyId,
    pub policy_version: u32,
    pub acknowledgement_type: AcknowledgementType,
}

/// Partial update applied by a generic save.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AcknowledgementPatch {
    pub status: Option<AcknowledgementStatus>,
    pub acknowledged_at: Option<DateTime<Utc>>,
}

/// What a patch changed, as far as side effects are concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PatchEffect {
    /// The record moved from pending to acknowledged.
    pub became_acknowledged: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Acknowledgement {
    pub id: AcknowledgementId,
    pub policy_id: PolicyId,
    pub employee_id: EmployeeId,
    /// Policy version at submission time.
    pub policy_version: u32,
    pub acknowledgement_type: AcknowledgementType,
    pub status: AcknowledgementStatus,
    pub escalation_status: EscalationStatus,
    pub due_date: DateTime<Utc>,
    pub acknowledged_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Due date of a new acknowledgement.
///
/// `new_joiner` and `periodic` count from the employee's effective join
/// date; `manual` counts from `now`.
pub fn compute_due_date(
    kind: AcknowledgementType,
    employee: &EmployeeProfile,
    now: DateTime<Utc>,
    rules: &LifecycleRules,
) -> DateTime<Utc> {
    match kind {
        AcknowledgementType::NewJoiner => {
            employee.effective_join() + Duration::days(rules.new_joiner_due_days)
        }
        AcknowledgementType::Periodic => {
            employee.effective_join() + Duration::days(rules.periodic_due_days)
        }
        AcknowledgementType::Manual => now + Duration::days(rules.manual_due_days),
    }
}

/// New-joiner acknowledgements must be opened within the intake window.
pub fn check_new_joiner_window(
    employee: &EmployeeProfile,
    now: DateTime<Utc>,
    rules: &LifecycleRules,
) -> Result<(), AttestError> {
    let closes = employee.effective_join() + Duration::days(rules.new_joiner_window_days);
    if closes < now {
        return Err(AttestError::validation(format!(
            "new joiner acknowledgement must be initiated within {} days of joining",
            rules.new_joiner_window_days
        )));
    }
    Ok(())
}

impl Acknowledgement {
    /// Build a fresh pending record for `submission`.
    ///
    /// Does not check uniqueness and does not evaluate escalation; the
    /// caller runs the record through [`crate::lifecycle::save`] before its
    /// first write.
    pub fn open(
        submission: &Submission,
        employee: &EmployeeProfile,
        rules: &LifecycleRules,
        now: DateTime<Utc>,
    ) -> Result<Self, AttestError> {
        if submission.employee_id != employee.id {
            return Err(AttestError::validation(
                "submission employee does not match resolved profile",
            ));
        }
        if submission.acknowledgement_type == AcknowledgementType::NewJoiner {
            check_new_joiner_window(employee, now, rules)?;
        }
        let due_date = compute_due_date(submission.acknowledgement_type, employee, now, rules);

        Ok(Self {
            id: AcknowledgementId::new(),
            policy_id: submission.policy_id,
            employee_id: submission.employee_id,
            policy_version: submission.policy_version,
            acknowledgement_type: submission.acknowledgement_type,
            status: AcknowledgementStatus::Pending,
            escalation_status: EscalationStatus::NotEscalated,
            due_date,
            acknowledged_at: None,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn uniqueness_key(&self) -> (EmployeeId, PolicyId, u32) {
        (self.employee_id, self.policy_id, self.policy_version)
    }

    pub fn is_pending(&self) -> bool {
        self.status == AcknowledgementStatus::Pending
    }

    /// Mark acknowledged at `now`.
    pub fn acknowledge(&mut self, now: DateTime<Utc>) -> Result<(), AttestError> {
        if !self.is_pending() {
            return Err(AttestError::validation(format!(
                "{} is already acknowledged",
                self.id
            )));
        }
        self.status = AcknowledgementStatus::Acknowledged;
        self.acknowledged_at = Some(now);
        Ok(())
    }

    /// Apply a generic patch.
    ///
    /// Moving to `acknowledged` without a timestamp stamps `now`. Moving an
    /// acknowledged record back to pending is rejected.
    pub fn apply_patch(
        &mut self,
        patch: &AcknowledgementPatch,
        now: DateTime<Utc>,
    ) -> Result<PatchEffect, AttestError> {
        let was_pending = self.is_pending();
        if !was_pending && patch.status == Some(AcknowledgementStatus::Pending) {
            return Err(AttestError::validation(format!(
                "{} is already acknowledged and cannot return to pending",
                self.id
            )));
        }
        if let Some(at) = patch.acknowledged_at {
            self.acknowledged_at = Some(at);
        }
        if let Some(status) = patch.status {
            self.status = status;
        }
        if self.status == AcknowledgementStatus::Acknowledged && self.acknowledged_at.is_none() {
            self.acknowledged_at = Some(now);
        }
        Ok(PatchEffect {
            became_acknowledged: was_pending && !self.is_pending(),
        })
    }

    /// True iff acknowledged no later than the due date.
    pub fn is_acknowledged_on_time(&self) -> bool {
        self.acknowledged_at.is_some_and(|at| at <= self.due_date)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn day0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap()
    }

    fn employee(join_date: Option<DateTime<Utc>>) -> EmployeeProfile {
        EmployeeProfile {
            id: EmployeeId::new(),
            name: "Grace".to_string(),
            email: "grace@example.com".to_string(),
            join_date,
            created_at: day0() - Duration::days(400),
        }
    }

    fn submission(emp: &EmployeeProfile, kind: AcknowledgementType) -> Submission {
        Submission {
            employee_id: emp.id,
            policy_id: PolicyId::new(),
            policy_version: 2,
            acknowledgement_type: kind,
        }
    }

    #[test]
    fn due_dates_by_type() {
        let rules = LifecycleRules::default();
        let emp = employee(Some(day0()));
        let now = day0() + Duration::days(3);

        assert_eq!(
            compute_due_date(AcknowledgementType::NewJoiner, &emp, now, &rules),
            day0() + Duration::days(30)
        );
        assert_eq!(
            compute_due_date(AcknowledgementType::Periodic, &emp, now, &rules),
            day0() + Duration::days(365)
        );
        assert_eq!(
            compute_due_date(AcknowledgementType::Manual, &emp, now, &rules),
            now + Duration::days(30)
        );
    }

    #[test]
    fn missing_join_date_falls_back_to_creation() {
        let rules = LifecycleRules::default();
        let emp = employee(None);
        assert_eq!(
            compute_due_date(AcknowledgementType::Periodic, &emp, day0(), &rules),
            emp.created_at + Duration::days(365)
        );
    }

    #[test]
    fn new_joiner_on_day_31_is_rejected() {
        let rules = LifecycleRules::default();
        let emp = employee(Some(day0()));
        let sub = submission(&emp, AcknowledgementType::NewJoiner);

        let err = Acknowledgement::open(&sub, &emp, &rules, day0() + Duration::days(31)).unwrap_err();
        assert!(matches!(err, AttestError::Validation(_)));
    }

    #[test]
    fn new_joiner_on_day_30_is_accepted() {
        let rules = LifecycleRules::default();
        let emp = employee(Some(day0()));
        let sub = submission(&emp, AcknowledgementType::NewJoiner);

        let ack = Acknowledgement::open(&sub, &emp, &rules, day0() + Duration::days(30)).unwrap();
        assert_eq!(ack.due_date, day0() + Duration::days(30));
        assert_eq!(ack.status, AcknowledgementStatus::Pending);
        assert_eq!(ack.escalation_status, EscalationStatus::NotEscalated);
        assert_eq!(ack.policy_version, 2);
    }

    #[test]
    fn window_does_not_apply_to_other_types() {
        let rules = LifecycleRules::default();
        let emp = employee(Some(day0()));
        let sub = submission(&emp, AcknowledgementType::Periodic);
        assert!(Acknowledgement::open(&sub, &emp, &rules, day0() + Duration::days(200)).is_ok());
    }

    #[test]
    fn acknowledge_stamps_time_once() {
        let rules = LifecycleRules::default();
        let emp = employee(Some(day0()));
        let mut ack = Acknowledgement::open(
            &submission(&emp, AcknowledgementType::Manual),
            &emp,
            &rules,
            day0(),
        )
        .unwrap();

        let at = day0() + Duration::days(2);
        ack.acknowledge(at).unwrap();
        assert_eq!(ack.status, AcknowledgementStatus::Acknowledged);
        assert_eq!(ack.acknowledged_at, Some(at));
        assert!(ack.acknowledge(at + Duration::days(1)).is_err());
        assert_eq!(ack.acknowledged_at, Some(at));
    }

    #[test]
    fn on_time_query() {
        let rules = LifecycleRules::default();
        let emp = employee(Some(day0()));
        let mut ack = Acknowledgement::open(
            &submission(&emp, AcknowledgementType::Manual),
            &emp,
            &rules,
            day0(),
        )
        .unwrap();
        assert!(!ack.is_acknowledged_on_time());

        let mut exactly_due = ack.clone();
        exactly_due.acknowledge(ack.due_date).unwrap();
        assert!(exactly_due.is_acknowledged_on_time());

        ack.acknowledge(ack.due_date + Duration::seconds(1)).unwrap();
        assert!(!ack.is_acknowledged_on_time());
    }

    #[test]
    fn patch_to_acknowledged_stamps_now() {
        let rules = LifecycleRules::default();
        let emp = employee(Some(day0()));
        let mut ack = Acknowledgement::open(
            &submission(&emp, AcknowledgementType::Manual),
            &emp,
            &rules,
            day0(),
        )
        .unwrap();

        let patch = AcknowledgementPatch {
            status: Some(AcknowledgementStatus::Acknowledged),
            acknowledged_at: None,
        };
        let effect = ack.apply_patch(&patch, day0() + Duration::days(1)).unwrap();
        assert!(effect.became_acknowledged);
        assert_eq!(ack.acknowledged_at, Some(day0() + Duration::days(1)));

        let back = AcknowledgementPatch {
            status: Some(AcknowledgementStatus::Pending),
            acknowledged_at: None,
        };
        assert!(ack.apply_patch(&back, day0()).is_err());
    }

    #[test]
    fn patch_timestamp_only_keeps_status_pending() {
        let rules = LifecycleRules::default();
        let emp = employee(Some(day0()));
        let mut ack = Acknowledgement::open(
            &submission(&emp, AcknowledgementType::Manual),
            &emp,
            &rules,
            day0(),
        )
        .unwrap();
        let patch = AcknowledgementPatch {
            status: None,
            acknowledged_at: Some(day0()),
        };
        let effect = ack.apply_patch(&patch, day0()).unwrap();
        assert!(!effect.became_acknowledged);
        assert!(ack.is_pending());
        assert_eq!(ack.acknowledged_at, Some(day0()));
    }

    #[test]
    fn uniqueness_key_is_employee_policy_version() {
        let rules = LifecycleRules::default();
        let emp = employee(Some(day0()));
        let sub = submission(&emp, AcknowledgementType::Manual);
        let ack = Acknowledgement::open(&sub, &emp, &rules, day0()).unwrap();
        assert_eq!(ack.uniqueness_key(), (emp.id, sub.policy_id, 2));
    }
}
