//! # Policy Configuration Versioning
//!
//! A configuration is a keyed value attached to a policy. Creating one is a
//! policy version bump: the configuration takes `policy.version + 1` and the
//! policy is moved to the same number. The version is fixed at creation, so
//! later edits to the configuration never bump again.

use std::str::FromStr;

use attest_core::{AttestError, ConfigurationId, PolicyId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::policy::Policy;

/// Review state of a configuration value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfigurationStatus {
    #[default]
    Pending,
    Active,
    Rejected,
}

impl ConfigurationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Active => "active",
            Self::Rejected => "rejected",
        }
    }
}

impl std::fmt::Display for ConfigurationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConfigurationStatus {
    type Err = AttestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "active" => Ok(Self::Active),
            "rejected" => Ok(Self::Rejected),
            other => Err(AttestError::validation(format!(
                "invalid configuration status: {other:?}"
            ))),
        }
    }
}

/// Keyed configuration value of a policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyConfiguration {
    pub id: ConfigurationId,
    pub policy_id: PolicyId,
    pub key: String,
    pub value: String,
    /// Policy version this configuration introduced.
    pub version: u32,
    pub status: ConfigurationStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Partial update. The version is not editable.
#[derive(Debug, Clone, Default)]
pub struct ConfigurationPatch {
    pub key: Option<String>,
    pub value: Option<String>,
    pub status: Option<ConfigurationStatus>,
}

impl PolicyConfiguration {
    /// Create a configuration and bump `policy` to the new version.
    ///
    /// Both writes happen against the borrowed policy; the caller must hold
    /// the policy's row lock for the duration so concurrent bumps serialize.
    pub fn create(
        policy: &mut Policy,
        key: String,
        value: String,
        status: ConfigurationStatus,
        now: DateTime<Utc>,
    ) -> Result<Self, AttestError> {
        if policy.is_deleted {
            return Err(AttestError::not_found("policy", policy.id));
        }
        let key = key.trim().to_string();
        if key.is_empty() {
            return Err(AttestError::validation("configuration key must not be empty"));
        }
        let version = policy.version.checked_add(1).ok_or_else(|| {
            AttestError::validation(format!("policy {} version overflow", policy.id))
        })?;
        policy.push_version(version, now);

        Ok(Self {
            id: ConfigurationId::new(),
            policy_id: policy.id,
            key,
            value,
            version,
            status,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn update(&mut self, patch: ConfigurationPatch, now: DateTime<Utc>) -> Result<(), AttestError> {
        if let Some(key) = &patch.key {
            if key.trim().is_empty() {
                return Err(AttestError::validation("configuration key must not be empty"));
            }
        }
        if let Some(key) = patch.key {
            self.key = key.trim().to_string();
        }
        if let Some(value) = patch.value {
            self.value = value;
        }
        if let Some(status) = patch.status {
            self.status = status;
        }
        self.updated_at = now;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::{ApprovalStatus, PolicyType};
    use attest_core::EmployeeId;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 4, 2, 10, 0, 0).unwrap()
    }

    fn policy_at(version: u32) -> Policy {
        Policy {
            id: PolicyId::new(),
            policy_type: PolicyType::Custom,
            title: "Remote work".to_string(),
            description: None,
            customer_compliance: None,
            template: None,
            created_by: Some(EmployeeId::new()),
            version,
            document_link: Some("https://docs.example.com/remote".to_string()),
            approval_status: ApprovalStatus::Pending,
            approved_by: None,
            approved_at: None,
            approval_requested_at: now(),
            created_at: now(),
            updated_at: now(),
            is_deleted: false,
        }
    }

    #[test]
    fn create_bumps_policy_version() {
        let mut policy = policy_at(3);
        let config = PolicyConfiguration::create(
            &mut policy,
            "vpn_required".to_string(),
            "true".to_string(),
            ConfigurationStatus::Pending,
            now(),
        )
        .unwrap();
        assert_eq!(config.version, 4);
        assert_eq!(policy.version, 4);
        assert_eq!(config.policy_id, policy.id);
    }

    #[test]
    fn successive_configurations_each_bump_once() {
        let mut policy = policy_at(1);
        for expected in 2..=4 {
            let c = PolicyConfiguration::create(
                &mut policy,
                format!("k{expected}"),
                "v".to_string(),
                ConfigurationStatus::Active,
                now(),
            )
            .unwrap();
            assert_eq!(c.version, expected);
        }
        assert_eq!(policy.version, 4);
    }

    #[test]
    fn update_does_not_touch_version() {
        let mut policy = policy_at(3);
        let mut config = PolicyConfiguration::create(
            &mut policy,
            "retention_days".to_string(),
            "30".to_string(),
            ConfigurationStatus::Pending,
            now(),
        )
        .unwrap();

        config
            .update(
                ConfigurationPatch {
                    value: Some("90".to_string()),
                    status: Some(ConfigurationStatus::Active),
                    ..ConfigurationPatch::default()
                },
                now(),
            )
            .unwrap();
        assert_eq!(config.version, 4);
        assert_eq!(config.value, "90");
        assert_eq!(config.status, ConfigurationStatus::Active);
        assert_eq!(policy.version, 4);
    }

    #[test]
    fn deleted_policy_and_blank_key_are_rejected() {
        let mut policy = policy_at(1);
        let blank = PolicyConfiguration::create(
            &mut policy,
            " ".to_string(),
            "v".to_string(),
            ConfigurationStatus::Pending,
            now(),
        );
        assert!(matches!(blank, Err(AttestError::Validation(_))));
        assert_eq!(policy.version, 1);

        policy.is_deleted = true;
        let deleted = PolicyConfiguration::create(
            &mut policy,
            "k".to_string(),
            "v".to_string(),
            ConfigurationStatus::Pending,
            now(),
        );
        assert!(matches!(deleted, Err(AttestError::NotFound { .. })));
    }
}
