//! Notification texts.

use attest_state::EscalationTier;
use serde::{Deserialize, Serialize};

use crate::config::NotifyConfig;

/// One outbound message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub subject: String,
    pub body: String,
    pub from: String,
    pub recipients: Vec<String>,
}

/// Tell HR or the executives that an acknowledgement is overdue.
pub fn escalation_notice(
    tier: EscalationTier,
    policy_title: &str,
    employee_name: &str,
    config: &NotifyConfig,
) -> Notification {
    let role = tier.role();
    let recipients = match tier {
        EscalationTier::Hr => config.hr_recipients.clone(),
        EscalationTier::Cxo => config.cxo_recipients.clone(),
    };
    Notification {
        subject: format!("Overdue Acknowledgment - Escalated to {role}"),
        body: format!(
            "Dear {role},\n\nThe acknowledgment for the policy '{policy_title}' by {employee_name} is overdue and has been escalated."
        ),
        from: config.from.clone(),
        recipients,
    }
}

/// Confirm to the employee that their acknowledgement was recorded.
pub fn confirmation(
    employee_name: &str,
    employee_email: &str,
    policy_title: &str,
    policy_version: u32,
    config: &NotifyConfig,
) -> Notification {
    Notification {
        subject: "Policy Acknowledgment Confirmation".to_string(),
        body: format!(
            "Dear {employee_name},\n\nYou have successfully acknowledged the policy '{policy_title}' (Version {policy_version}). Thank you!"
        ),
        from: config.from.clone(),
        recipients: vec![employee_email.to_string()],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hr_escalation_text() {
        let n = escalation_notice(EscalationTier::Hr, "Infosec", "Ada", &NotifyConfig::default());
        assert_eq!(n.subject, "Overdue Acknowledgment - Escalated to HR");
        assert_eq!(
            n.body,
            "Dear HR,\n\nThe acknowledgment for the policy 'Infosec' by Ada is overdue and has been escalated."
        );
        assert_eq!(n.recipients, vec!["hr@company.com"]);
        assert_eq!(n.from, "no-reply@company.com");
    }

    #[test]
    fn cxo_escalation_goes_to_both_executives() {
        let n = escalation_notice(EscalationTier::Cxo, "AUP", "Ada", &NotifyConfig::default());
        assert_eq!(n.subject, "Overdue Acknowledgment - Escalated to CXO/CTO");
        assert!(n.body.starts_with("Dear CXO/CTO,"));
        assert_eq!(n.recipients, vec!["cxo@company.com", "cto@company.com"]);
    }

    #[test]
    fn confirmation_text() {
        let n = confirmation("Ada", "ada@example.com", "Infosec", 3, &NotifyConfig::default());
        assert_eq!(n.subject, "Policy Acknowledgment Confirmation");
        assert_eq!(
            n.body,
            "Dear Ada,\n\nYou have successfully acknowledged the policy 'Infosec' (Version 3). Thank you!"
        );
        assert_eq!(n.recipients, vec!["ada@example.com"]);
    }

    #[test]
    fn configured_sender_is_used() {
        let cfg = NotifyConfig {
            from: "compliance@acme.test".to_string(),
            hr_recipients: vec!["people@acme.test".to_string()],
            ..NotifyConfig::default()
        };
        let n = escalation_notice(EscalationTier::Hr, "Infosec", "Ada", &cfg);
        assert_eq!(n.from, "compliance@acme.test");
        assert_eq!(n.recipients, vec!["people@acme.test"]);
    }
}
