//! # attest-notify: Notification Collaborator
//!
//! The lifecycle decides *that* someone must be told something and *who*.
//! This crate turns those decisions into [`Notification`] values and hands
//! them to a [`Notifier`].
//!
//! ## Delivery
//!
//! Sending is fire-and-forget. A [`Notifier`] never returns an error to the
//! caller; failures are logged at `warn` and dropped, so a broken mail relay
//! can never roll back an acknowledgement or an escalation.
//!
//! - [`TracingNotifier`] logs each notification (default when no relay is
//!   configured).
//! - [`RelayNotifier`] POSTs the notification as JSON to an HTTP relay.
//! - [`RecordingNotifier`] keeps notifications in memory for assertions.

pub mod config;
pub mod error;
pub mod messages;
pub mod sender;

pub use config::NotifyConfig;
pub use error::NotifyError;
pub use messages::{confirmation, escalation_notice, Notification};
pub use sender::{
    notifier_from_config, Notifier, RecordingNotifier, RelayNotifier, TracingNotifier,
};
