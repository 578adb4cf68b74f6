//! # Due-Date Subcommand
//!
//! Computes what `submit` would assign without touching a service: the
//! due date for an acknowledgement type and, for new joiners, whether the
//! intake window is still open.

use std::path::PathBuf;

use anyhow::{Context, Result};
use attest_core::EmployeeId;
use attest_state::{
    check_new_joiner_window, compute_due_date, AcknowledgementType, EmployeeProfile,
    LifecycleRules,
};
use chrono::{DateTime, Utc};
use clap::Args;
use serde::Serialize;

/// Arguments for `attest due-date`.
#[derive(Args, Debug)]
pub struct DueDateArgs {
    /// Acknowledgement type: new_joiner, periodic or manual.
    #[arg(long = "type", value_name = "TYPE")]
    pub kind: String,

    /// Employee join date (RFC 3339).
    #[arg(long)]
    pub join_date: Option<DateTime<Utc>>,

    /// Employee record creation time, used when no join date is given.
    #[arg(long)]
    pub created_at: Option<DateTime<Utc>>,

    /// Submission time (RFC 3339). Defaults to now.
    #[arg(long)]
    pub now: Option<DateTime<Utc>>,

    /// YAML file overriding the lifecycle rules.
    #[arg(long)]
    pub rules: Option<PathBuf>,
}

/// Result printed as JSON.
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct DueDateReport {
    pub acknowledgement_type: &'static str,
    pub effective_join: DateTime<Utc>,
    pub due_date: DateTime<Utc>,
    /// `None` for types without an intake window.
    pub window_open: Option<bool>,
}

pub fn compute(
    kind: AcknowledgementType,
    join_date: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    now: DateTime<Utc>,
    rules: &LifecycleRules,
) -> DueDateReport {
    let employee = EmployeeProfile {
        id: EmployeeId::new(),
        name: String::new(),
        email: String::new(),
        join_date,
        created_at,
    };
    let window_open = (kind == AcknowledgementType::NewJoiner)
        .then(|| check_new_joiner_window(&employee, now, rules).is_ok());
    DueDateReport {
        acknowledgement_type: kind.as_str(),
        effective_join: employee.effective_join(),
        due_date: compute_due_date(kind, &employee, now, rules),
        window_open,
    }
}

/// Execute the due-date subcommand. Exit code 1 when a new-joiner window
/// has closed.
pub fn run_due_date(args: &DueDateArgs) -> Result<u8> {
    let kind: AcknowledgementType = args
        .kind
        .parse()
        .with_context(|| format!("unknown acknowledgement type {:?}", args.kind))?;
    let rules = crate::load_rules(args.rules.as_deref())?;
    let now = args.now.unwrap_or_else(Utc::now);
    let created_at = args.created_at.unwrap_or(now);

    let report = compute(kind, args.join_date, created_at, now, &rules);
    println!("{}", serde_json::to_string_pretty(&report)?);

    Ok(if report.window_open == Some(false) { 1 } else { 0 })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn day0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
    }

    #[test]
    fn new_joiner_counts_from_join_date() {
        let rules = LifecycleRules::default();
        let r = compute(
            AcknowledgementType::NewJoiner,
            Some(day0()),
            day0() + Duration::days(5),
            day0() + Duration::days(10),
            &rules,
        );
        assert_eq!(r.effective_join, day0());
        assert_eq!(r.due_date, day0() + Duration::days(30));
        assert_eq!(r.window_open, Some(true));
    }

    #[test]
    fn new_joiner_window_closes_after_thirty_days() {
        let r = compute(
            AcknowledgementType::NewJoiner,
            Some(day0()),
            day0(),
            day0() + Duration::days(31),
            &LifecycleRules::default(),
        );
        assert_eq!(r.window_open, Some(false));
    }

    #[test]
    fn manual_counts_from_now_and_has_no_window() {
        let now = day0() + Duration::days(100);
        let r = compute(AcknowledgementType::Manual, None, day0(), now, &LifecycleRules::default());
        assert_eq!(r.due_date, now + Duration::days(30));
        assert_eq!(r.window_open, None);
    }

    #[test]
    fn periodic_falls_back_to_created_at() {
        let r = compute(
            AcknowledgementType::Periodic,
            None,
            day0(),
            day0() + Duration::days(3),
            &LifecycleRules::default(),
        );
        assert_eq!(r.due_date, day0() + Duration::days(365));
    }
}
