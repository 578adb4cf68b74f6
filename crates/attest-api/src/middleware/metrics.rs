//! # Prometheus Metrics
//!
//! Request counters and latency histograms recorded through the `metrics`
//! facade, plus the acknowledgement gauges refreshed on each scrape of
//! `/metrics`. Without an installed recorder every macro is a no-op.

use std::time::Instant;

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;

use attest_state::{AcknowledgementStatus, EscalationStatus};

use crate::error::AppError;
use crate::state::AppState;

const ACK_STATUSES: [AcknowledgementStatus; 2] = [
    AcknowledgementStatus::Pending,
    AcknowledgementStatus::Acknowledged,
];

const ESCALATION_TIERS: [EscalationStatus; 3] = [
    EscalationStatus::NotEscalated,
    EscalationStatus::EscalatedToHr,
    EscalationStatus::EscalatedToCxo,
];

/// Middleware that counts requests by method and status and records latency.
pub async fn metrics_middleware(request: Request, next: Next) -> Response {
    let method = request.method().as_str().to_owned();
    let started = Instant::now();

    let response = next.run(request).await;

    let status = response.status().as_u16().to_string();
    metrics::counter!("attest_http_requests_total", "method" => method.clone(), "status" => status)
        .increment(1);
    metrics::histogram!("attest_http_request_duration_seconds", "method" => method)
        .record(started.elapsed().as_secs_f64());

    response
}

/// Set the acknowledgement gauges from the current store contents.
pub fn refresh_gauges(state: &AppState) {
    let acks = state.acknowledgements.list();
    for status in ACK_STATUSES {
        let n = acks.iter().filter(|a| a.status == status).count();
        metrics::gauge!("attest_acknowledgements", "status" => status.as_str()).set(n as f64);
    }
    for tier in ESCALATION_TIERS {
        let n = acks
            .iter()
            .filter(|a| a.is_pending() && a.escalation_status == tier)
            .count();
        metrics::gauge!("attest_pending_acknowledgements", "escalation" => tier.as_str())
            .set(n as f64);
    }
}

/// GET /metrics: Prometheus text exposition.
pub async fn render(State(state): State<AppState>) -> Result<String, AppError> {
    let handle = state
        .metrics
        .as_ref()
        .ok_or_else(|| AppError::ServiceUnavailable("metrics recorder is not installed".into()))?;
    refresh_gauges(&state);
    Ok(handle.render())
}
