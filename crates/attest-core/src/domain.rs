//! # Lookup Enums
//!
//! Closed value sets shared by the tenant-side records: the subscription
//! tier of a customer and the kind of compliance domain a customer
//! subscribes to, plus the status fields of employees and customer
//! compliance records. Unknown strings are rejected with a validation error.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::AttestError;

/// Subscription tier of a customer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionType {
    #[default]
    Free,
    Standard,
    Premium,
}

impl SubscriptionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Free => "free",
            Self::Standard => "standard",
            Self::Premium => "premium",
        }
    }
}

impl std::fmt::Display for SubscriptionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SubscriptionType {
    type Err = AttestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "free" => Ok(Self::Free),
            "standard" => Ok(Self::Standard),
            "premium" => Ok(Self::Premium),
            other => Err(AttestError::validation(format!(
                "invalid subscription type: {other:?}"
            ))),
        }
    }
}

/// Kind of compliance domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComplianceType {
    /// Information security policy.
    #[default]
    Infosec,
    /// Acceptable use policy.
    AcceptableUse,
    /// Cryptographic controls policy.
    Cryptographic,
}

impl ComplianceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Infosec => "infosec",
            Self::AcceptableUse => "acceptable_use",
            Self::Cryptographic => "cryptographic",
        }
    }

    /// Human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Infosec => "Infosec Policy",
            Self::AcceptableUse => "Acceptable Use Policy",
            Self::Cryptographic => "Cryptographic Policy",
        }
    }
}

impl std::fmt::Display for ComplianceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ComplianceType {
    type Err = AttestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "infosec" => Ok(Self::Infosec),
            "acceptable_use" => Ok(Self::AcceptableUse),
            "cryptographic" => Ok(Self::Cryptographic),
            other => Err(AttestError::validation(format!(
                "invalid compliance type: {other:?}"
            ))),
        }
    }
}

/// Employment state of an employee.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmployeeStatus {
    #[default]
    Active,
    Inactive,
}

impl EmployeeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Inactive => "inactive",
        }
    }
}

impl std::fmt::Display for EmployeeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EmployeeStatus {
    type Err = AttestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(Self::Active),
            "inactive" => Ok(Self::Inactive),
            other => Err(AttestError::validation(format!(
                "invalid employee status: {other:?}"
            ))),
        }
    }
}

/// Progress of a customer towards a compliance domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressStatus {
    #[default]
    Pending,
    InProgress,
    Completed,
}

impl ProgressStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
        }
    }
}

impl std::fmt::Display for ProgressStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProgressStatus {
    type Err = AttestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "in_progress" => Ok(Self::InProgress),
            "completed" => Ok(Self::Completed),
            other => Err(AttestError::validation(format!(
                "invalid progress status: {other:?}"
            ))),
        }
    }
}

/// Outcome of the last audit of a customer compliance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditStatus {
    #[default]
    Pending,
    Completed,
}

impl AuditStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Completed => "completed",
        }
    }
}

impl std::fmt::Display for AuditStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AuditStatus {
    type Err = AttestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "completed" => Ok(Self::Completed),
            other => Err(AttestError::validation(format!(
                "invalid audit status: {other:?}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compliance_type_string_forms_agree() {
        for ty in [
            ComplianceType::Infosec,
            ComplianceType::AcceptableUse,
            ComplianceType::Cryptographic,
        ] {
            let json = serde_json::to_value(ty).unwrap();
            assert_eq!(json.as_str(), Some(ty.as_str()));
            assert_eq!(ty.as_str().parse::<ComplianceType>().unwrap(), ty);
        }
    }

    #[test]
    fn unknown_values_are_validation_errors() {
        assert!(matches!(
            "gold".parse::<SubscriptionType>(),
            Err(AttestError::Validation(_))
        ));
        assert!(matches!(
            "hipaa".parse::<ComplianceType>(),
            Err(AttestError::Validation(_))
        ));
    }

    #[test]
    fn progress_status_uses_snake_case() {
        let json = serde_json::to_value(ProgressStatus::InProgress).unwrap();
        assert_eq!(json, "in_progress");
        assert_eq!("in_progress".parse::<ProgressStatus>().unwrap(), ProgressStatus::InProgress);
        assert!("done".parse::<AuditStatus>().is_err());
        assert_eq!("inactive".parse::<EmployeeStatus>().unwrap(), EmployeeStatus::Inactive);
    }

    #[test]
    fn defaults_match_intake_defaults() {
        assert_eq!(SubscriptionType::default(), SubscriptionType::Free);
        assert_eq!(ComplianceType::default(), ComplianceType::Infosec);
    }
}
