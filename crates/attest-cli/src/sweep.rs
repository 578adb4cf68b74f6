//! # Sweep Subcommand
//!
//! Triggers `POST /v1/acknowledgements/escalations/sweep` on a running
//! service and prints the escalations it applied. Meant for a scheduler
//! (cron, a Kubernetes CronJob) so the service itself needs no timer.

use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Args;
use serde::Deserialize;
use url::Url;

#[derive(Args, Debug)]
pub struct SweepArgs {
    /// Base URL of the attest-api service.
    #[arg(long, default_value = "http://localhost:8080")]
    pub url: Url,

    /// Request timeout in seconds.
    #[arg(long, default_value_t = 30)]
    pub timeout_secs: u64,
}

/// One escalation reported by the service.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct Escalation {
    pub acknowledgement_id: String,
    pub from: String,
    pub to: String,
    pub overdue_days: i64,
}

/// Call the sweep endpoint once.
pub async fn trigger(base: &Url, timeout: Duration) -> Result<Vec<Escalation>> {
    let endpoint = base
        .join("/v1/acknowledgements/escalations/sweep")
        .context("invalid service URL")?;
    let client = reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .context("failed to build HTTP client")?;

    let response = client
        .post(endpoint.clone())
        .send()
        .await
        .with_context(|| format!("request to {endpoint} failed"))?;
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        bail!("sweep rejected by {endpoint}: {status} {body}");
    }
    response
        .json()
        .await
        .context("unexpected sweep response body")
}

pub fn run_sweep(args: &SweepArgs) -> Result<u8> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;
    let escalations = runtime.block_on(trigger(&args.url, Duration::from_secs(args.timeout_secs)))?;

    for e in &escalations {
        println!(
            "{}  {} -> {}  ({} days overdue)",
            e.acknowledgement_id, e.from, e.to, e.overdue_days
        );
    }
    tracing::info!(escalated = escalations.len(), "sweep complete");
    Ok(0)
}
