//! Notification configuration.
//!
//! Sender address and escalation recipients come from the deployment's YAML
//! file (`notify:` section) or the defaults below; the relay endpoint only
//! from the environment, since it may embed credentials.

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::NotifyError;

/// Where notifications come from and go to.
///
/// Custom `Debug` redacts `relay_url`.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotifyConfig {
    /// Sender address on every notification.
    pub from: String,
    /// Recipients of the first escalation tier.
    pub hr_recipients: Vec<String>,
    /// Recipients of the second escalation tier.
    pub cxo_recipients: Vec<String>,
    /// HTTP relay; `None` means log-only delivery.
    #[serde(skip)]
    pub relay_url: Option<Url>,
    /// Relay request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            from: "no-reply@company.com".to_string(),
            hr_recipients: vec!["hr@company.com".to_string()],
            cxo_recipients: vec!["cxo@company.com".to_string(), "cto@company.com".to_string()],
            relay_url: None,
            timeout_secs: 10,
        }
    }
}

impl std::fmt::Debug for NotifyConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotifyConfig")
            .field("from", &self.from)
            .field("hr_recipients", &self.hr_recipients)
            .field("cxo_recipients", &self.cxo_recipients)
            .field("relay_url", &self.relay_url.as_ref().map(|_| "[REDACTED]"))
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl NotifyConfig {
    /// Overlay environment variables onto `self`.
    ///
    /// Variables:
    /// - `ATTEST_NOTIFY_FROM`
    /// - `ATTEST_NOTIFY_RELAY_URL`
    /// - `ATTEST_NOTIFY_TIMEOUT_SECS`
    pub fn with_env(mut self) -> Result<Self, NotifyError> {
        if let Ok(from) = std::env::var("ATTEST_NOTIFY_FROM") {
            self.from = from;
        }
        if let Some(url) = env_url("ATTEST_NOTIFY_RELAY_URL")? {
            self.relay_url = Some(url);
        }
        if let Some(secs) = std::env::var("ATTEST_NOTIFY_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
        {
            self.timeout_secs = secs;
        }
        Ok(self)
    }

    /// Defaults overlaid with the environment.
    pub fn from_env() -> Result<Self, NotifyError> {
        Self::default().with_env()
    }
}

fn env_url(var: &str) -> Result<Option<Url>, NotifyError> {
    match std::env::var(var) {
        Ok(raw) if !raw.trim().is_empty() => Url::parse(&raw)
            .map(Some)
            .map_err(|e| NotifyError::InvalidUrl(var.to_string(), e.to_string())),
        _ => Ok(None),
    }
}
