//! # Lifecycle Rules
//!
//! Day counts that drive due dates, the new-joiner intake window, and the
//! escalation thresholds. The defaults are the production values; a
//! deployment may override them through its YAML configuration.

use serde::{Deserialize, Serialize};

use attest_core::AttestError;

/// Upper bound for every day count, about a century.
pub const MAX_RULE_DAYS: i64 = 36_500;

/// Day-count parameters of the acknowledgement lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LifecycleRules {
    /// `new_joiner` due date = effective join + this many days.
    pub new_joiner_due_days: i64,
    /// `periodic` due date = effective join + this many days.
    pub periodic_due_days: i64,
    /// `manual` due date = submission time + this many days.
    pub manual_due_days: i64,
    /// A `new_joiner` submission is rejected once this many days have
    /// passed since the employee joined.
    pub new_joiner_window_days: i64,
    /// Whole days overdue before the first (HR) escalation.
    pub hr_escalation_after_days: i64,
    /// Whole days overdue before the second (CXO/CTO) escalation.
    pub cxo_escalation_after_days: i64,
}

impl Default for LifecycleRules {
    fn default() -> Self {
        Self {
            new_joiner_due_days: 30,
            periodic_due_days: 365,
            manual_due_days: 30,
            new_joiner_window_days: 30,
            hr_escalation_after_days: 7,
            cxo_escalation_after_days: 14,
        }
    }
}

impl LifecycleRules {
    /// Reject rule sets that would make the state machine incoherent, or
    /// whose day counts could not be added to a timestamp.
    pub fn validate(&self) -> Result<(), AttestError> {
        let counts = [
            ("new_joiner_due_days", self.new_joiner_due_days),
            ("periodic_due_days", self.periodic_due_days),
            ("manual_due_days", self.manual_due_days),
            ("new_joiner_window_days", self.new_joiner_window_days),
            ("hr_escalation_after_days", self.hr_escalation_after_days),
            ("cxo_escalation_after_days", self.cxo_escalation_after_days),
        ];
        for (name, days) in counts {
            if !(0..=MAX_RULE_DAYS).contains(&days) {
                return Err(AttestError::validation(format!(
                    "{name} must be between 0 and {MAX_RULE_DAYS}, got {days}"
                )));
            }
        }
        if self.cxo_escalation_after_days <= self.hr_escalation_after_days {
            return Err(AttestError::validation(format!(
                "cxo_escalation_after_days ({}) must exceed hr_escalation_after_days ({})",
                self.cxo_escalation_after_days, self.hr_escalation_after_days
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(LifecycleRules::default().validate().is_ok());
    }

    #[test]
    fn thresholds_must_be_ordered() {
        let rules = LifecycleRules {
            hr_escalation_after_days: 14,
            cxo_escalation_after_days: 7,
            ..LifecycleRules::default()
        };
        assert!(matches!(rules.validate(), Err(AttestError::Validation(_))));
    }

    #[test]
    fn negative_counts_are_rejected() {
        let rules = LifecycleRules {
            manual_due_days: -1,
            ..LifecycleRules::default()
        };
        assert!(matches!(rules.validate(), Err(AttestError::Validation(_))));
    }

    #[test]
    fn huge_counts_are_rejected() {
        let rules: LifecycleRules =
            serde_json::from_str(r#"{"periodic_due_days": 100000000000000}"#).unwrap();
        assert!(matches!(rules.validate(), Err(AttestError::Validation(_))));

        let rules = LifecycleRules {
            cxo_escalation_after_days: MAX_RULE_DAYS + 1,
            ..LifecycleRules::default()
        };
        assert!(rules.validate().is_err());

        let edge = LifecycleRules {
            periodic_due_days: MAX_RULE_DAYS,
            ..LifecycleRules::default()
        };
        assert!(edge.validate().is_ok());
    }

    #[test]
    fn partial_override_keeps_other_defaults() {
        let rules: LifecycleRules =
            serde_json::from_str(r#"{"manual_due_days": 10}"#).unwrap();
        assert_eq!(rules.manual_due_days, 10);
        assert_eq!(rules.periodic_due_days, 365);
    }
}
