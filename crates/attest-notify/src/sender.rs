//! Notification senders.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use url::Url;

use crate::config::NotifyConfig;
use crate::error::NotifyError;
use crate::messages::Notification;

/// Best-effort notification sink.
///
/// `send` must return promptly and must not fail; implementations log and
/// swallow delivery errors.
pub trait Notifier: Send + Sync {
    fn send(&self, notification: Notification);
}

/// Writes each notification to the tracing log.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn send(&self, notification: Notification) {
        tracing::info!(
            subject = %notification.subject,
            from = %notification.from,
            recipients = ?notification.recipients,
            "notification dispatched (log only)"
        );
    }
}

/// Keeps every notification in memory.
#[derive(Debug, Clone, Default)]
pub struct RecordingNotifier {
    sent: Arc<Mutex<Vec<Notification>>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything sent so far, oldest first.
    pub fn sent(&self) -> Vec<Notification> {
        self.sent.lock().clone()
    }

    pub fn clear(&self) {
        self.sent.lock().clear();
    }
}

impl Notifier for RecordingNotifier {
    fn send(&self, notification: Notification) {
        self.sent.lock().push(notification);
    }
}

/// POSTs notifications as JSON to an HTTP mail relay.
#[derive(Debug, Clone)]
pub struct RelayNotifier {
    http: reqwest::Client,
    endpoint: Url,
}

impl RelayNotifier {
    pub fn new(endpoint: Url, timeout_secs: u64) -> Result<Self, NotifyError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| NotifyError::Http {
                endpoint: "client_init".into(),
                source: e,
            })?;
        Ok(Self { http, endpoint })
    }

    /// Deliver one notification and wait for the relay's answer.
    pub async fn deliver(&self, notification: &Notification) -> Result<(), NotifyError> {
        let endpoint = self.endpoint.to_string();
        let response = self
            .http
            .post(self.endpoint.clone())
            .json(notification)
            .send()
            .await
            .map_err(|e| NotifyError::Http {
                endpoint: endpoint.clone(),
                source: e,
            })?;
        let status = response.status();
        if !status.is_success() {
            return Err(NotifyError::Rejected {
                endpoint,
                status: status.as_u16(),
            });
        }
        Ok(())
    }
}

impl Notifier for RelayNotifier {
    fn send(&self, notification: Notification) {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            tracing::warn!(
                subject = %notification.subject,
                "no async runtime available; notification dropped"
            );
            return;
        };
        let relay = self.clone();
        runtime.spawn(async move {
            match relay.deliver(&notification).await {
                Ok(()) => tracing::info!(
                    subject = %notification.subject,
                    recipients = ?notification.recipients,
                    "notification relayed"
                ),
                Err(e) => tracing::warn!(
                    subject = %notification.subject,
                    error = %e,
                    "notification delivery failed"
                ),
            }
        });
    }
}

/// Pick a sender for `config`: the HTTP relay when one is configured,
/// otherwise log-only delivery.
pub fn notifier_from_config(config: &NotifyConfig) -> Result<Arc<dyn Notifier>, NotifyError> {
    match &config.relay_url {
        Some(url) => {
            tracing::info!("notification relay configured");
            Ok(Arc::new(RelayNotifier::new(url.clone(), config.timeout_secs)?))
        }
        None => {
            tracing::info!("no notification relay configured; notifications are logged only");
            Ok(Arc::new(TracingNotifier))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Notification {
        Notification {
            subject: "s".to_string(),
            body: "b".to_string(),
            from: "no-reply@company.com".to_string(),
            recipients: vec!["hr@company.com".to_string()],
        }
    }

    #[test]
    fn recording_notifier_keeps_order() {
        let rec = RecordingNotifier::new();
        let mut second = sample();
        second.subject = "t".to_string();
        rec.send(sample());
        rec.send(second);
        let subjects: Vec<String> = rec.sent().into_iter().map(|n| n.subject).collect();
        assert_eq!(subjects, vec!["s", "t"]);
        rec.clear();
        assert!(rec.sent().is_empty());
    }

    #[test]
    fn relay_without_runtime_drops_quietly() {
        let relay = RelayNotifier::new(Url::parse("http://127.0.0.1:1/send").unwrap(), 1).unwrap();
        relay.send(sample());
    }

    #[test]
    fn tracing_notifier_never_fails() {
        TracingNotifier.send(sample());
    }
}
