//! # attest-core: Foundational Types for the Acknowledgement Tracker
//!
//! Every other crate in the workspace depends on `attest-core`; it depends
//! on nothing internal.
//!
//! ## Key Design Principles
//!
//! 1. **Newtype identifiers.** `PolicyId`, `EmployeeId`, `AcknowledgementId`
//!    and friends wrap a `Uuid`. You cannot pass an employee id where a
//!    policy id is expected.
//!
//! 2. **Two-variant error taxonomy.** Domain operations fail with either
//!    `NotFound` or `Validation`. Transport layers map these onto their own
//!    status codes.
//!
//! 3. **Injected time.** Due-date and escalation math never calls
//!    `Utc::now()` directly; it asks a [`Clock`].
//!
//! ## Crate Policy
//!
//! - No dependencies on other `attest-*` crates.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod domain;
pub mod error;
pub mod identity;
pub mod temporal;

pub use domain::{AuditStatus, ComplianceType, EmployeeStatus, ProgressStatus, SubscriptionType};
pub use error::AttestError;
pub use identity::{
    AcknowledgementId, ComplianceId, ConfigurationId, CustomerComplianceId, CustomerId,
    EmployeeId, HistoryId, PolicyId, TemplateId,
};
pub use temporal::{elapsed_whole_days, Clock, ManualClock, SystemClock};
