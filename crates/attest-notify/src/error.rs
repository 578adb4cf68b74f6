//! Notification errors. These stay inside the sender; the lifecycle never
//! sees them.

/// Errors raised while configuring or delivering notifications.
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("invalid URL for {0}: {1}")]
    InvalidUrl(String, String),

    #[error("HTTP error delivering to {endpoint}: {source}")]
    Http {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("relay {endpoint} rejected notification with status {status}")]
    Rejected { endpoint: String, status: u16 },
}
