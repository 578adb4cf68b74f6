//! # Acknowledgements
//!
//! Employee acknowledgements of a specific policy version, with overdue
//! escalation and an append-only audit trail.
//!
//! - `POST /v1/acknowledgements`: submit
//! - `GET /v1/acknowledgements`: list
//! - `GET /v1/acknowledgements/{id}`: get, with the on-time flag
//! - `PUT /v1/acknowledgements/{id}`: save with an optional patch
//! - `POST /v1/acknowledgements/{id}/acknowledge`: acknowledge now
//! - `GET /v1/acknowledgements/{id}/history`: audit trail
//! - `POST /v1/acknowledgements/escalations/sweep`: save every pending record once
//!
//! Every write persists before any notification goes out.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use attest_core::{AcknowledgementId, AttestError, EmployeeId, PolicyId};
use attest_state::{Acknowledgement, AcknowledgementPatch, AcknowledgementType, HistoryRecord, Submission};

use crate::error::AppError;
use crate::extractors::{extract_validated_json, parse_opt, require_text, Validate};
use crate::orchestration::{self, AcknowledgementWrite, EscalationReport};
use crate::routes::persist_error;
use crate::state::AppState;

// ── DTOs ────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize, ToSchema)]
pub struct SubmitAcknowledgementRequest {
    pub employee_id: Uuid,
    pub policy_id: Uuid,
    /// Version being acknowledged; defaults to the policy's current version.
    pub policy_version: Option<u32>,
    /// new_joiner, periodic or manual.
    pub acknowledgement_type: String,
}

impl Validate for SubmitAcknowledgementRequest {
    fn validate(&self) -> Result<(), String> {
        require_text("acknowledgement_type", &self.acknowledgement_type)?;
        if self.policy_version == Some(0) {
            return Err("policy_version must be at least 1".to_string());
        }
        Ok(())
    }
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct SaveAcknowledgementRequest {
    /// pending or acknowledged.
    pub status: Option<String>,
    pub acknowledged_at: Option<DateTime<Utc>>,
}

impl Validate for SaveAcknowledgementRequest {
    fn validate(&self) -> Result<(), String> {
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AcknowledgementView {
    pub id: Uuid,
    pub policy_id: Uuid,
    pub employee_id: Uuid,
    pub policy_version: u32,
    pub acknowledgement_type: String,
    pub status: String,
    /// none, escalated_to_hr or escalated_to_cxo.
    pub escalation_status: String,
    pub due_date: DateTime<Utc>,
    pub acknowledged_at: Option<DateTime<Utc>>,
    /// Acknowledged no later than the due date.
    pub acknowledged_on_time: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Acknowledgement> for AcknowledgementView {
    fn from(a: &Acknowledgement) -> Self {
        Self {
            id: a.id.0,
            policy_id: a.policy_id.0,
            employee_id: a.employee_id.0,
            policy_version: a.policy_version,
            acknowledgement_type: a.acknowledgement_type.as_str().to_string(),
            status: a.status.as_str().to_string(),
            escalation_status: a.escalation_status.as_str().to_string(),
            due_date: a.due_date,
            acknowledged_at: a.acknowledged_at,
            acknowledged_on_time: a.is_acknowledged_on_time(),
            created_at: a.created_at,
            updated_at: a.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct HistoryView {
    pub id: Uuid,
    pub acknowledgement_id: Uuid,
    pub field: String,
    pub old_value: Option<String>,
    pub new_value: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl From<&HistoryRecord> for HistoryView {
    fn from(h: &HistoryRecord) -> Self {
        Self {
            id: h.id.0,
            acknowledgement_id: h.acknowledgement_id.0,
            field: h.field.clone(),
            old_value: h.old_value.clone(),
            new_value: h.new_value.clone(),
            updated_at: h.updated_at,
        }
    }
}

// ── Router ──────────────────────────────────────────────────────────

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/v1/acknowledgements",
            get(list_acknowledgements).post(submit_acknowledgement),
        )
        .route(
            "/v1/acknowledgements/escalations/sweep",
            post(sweep_escalations),
        )
        .route(
            "/v1/acknowledgements/{id}",
            get(get_acknowledgement).put(save_acknowledgement),
        )
        .route(
            "/v1/acknowledgements/{id}/acknowledge",
            post(acknowledge),
        )
        .route("/v1/acknowledgements/{id}/history", get(get_history))
}

async fn persist(state: &AppState, write: &AcknowledgementWrite) -> Result<(), AppError> {
    if let Some(pool) = &state.db_pool {
        crate::db::acknowledgements::save(pool, &write.acknowledgement, write.outcome.history.as_ref())
            .await
            .map_err(|e| persist_error("acknowledgement", e))?;
    }
    Ok(())
}

/// Write through, then notify.
async fn commit(state: &AppState, write: &AcknowledgementWrite) -> Result<(), AppError> {
    persist(state, write).await?;
    orchestration::dispatch_notifications(state, write);
    Ok(())
}

fn not_found(id: Uuid) -> AppError {
    AttestError::not_found("acknowledgement", AcknowledgementId::from_uuid(id)).into()
}

// ── Handlers ────────────────────────────────────────────────────────

/// POST /v1/acknowledgements
#[utoipa::path(
    post,
    path = "/v1/acknowledgements",
    request_body = SubmitAcknowledgementRequest,
    responses(
        (status = 201, description = "Acknowledgement opened", body = AcknowledgementView),
        (status = 400, description = "Duplicate, window exceeded, or invalid input", body = crate::error::ErrorBody),
        (status = 404, description = "Employee or policy not found", body = crate::error::ErrorBody),
    ),
    tag = "acknowledgements"
)]
pub(crate) async fn submit_acknowledgement(
    State(state): State<AppState>,
    body: Result<Json<SubmitAcknowledgementRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<AcknowledgementView>), AppError> {
    let req = extract_validated_json(body)?;
    let acknowledgement_type: AcknowledgementType = req.acknowledgement_type.trim().parse()?;
    let policy_id = PolicyId::from_uuid(req.policy_id);
    let policy_version = match req.policy_version {
        Some(v) => v,
        None => state
            .policies
            .get(policy_id.as_uuid())
            .filter(|p| !p.is_deleted)
            .map(|p| p.version)
            .ok_or_else(|| AttestError::not_found("policy", policy_id))?,
    };

    let write = orchestration::submit_acknowledgement(
        &state,
        Submission {
            employee_id: EmployeeId::from_uuid(req.employee_id),
            policy_id,
            policy_version,
            acknowledgement_type,
        },
    )?;
    commit(&state, &write).await?;
    Ok((
        StatusCode::CREATED,
        Json(AcknowledgementView::from(&write.acknowledgement)),
    ))
}

/// GET /v1/acknowledgements
#[utoipa::path(
    get,
    path = "/v1/acknowledgements",
    responses((status = 200, description = "All acknowledgements", body = Vec<AcknowledgementView>)),
    tag = "acknowledgements"
)]
pub(crate) async fn list_acknowledgements(
    State(state): State<AppState>,
) -> Json<Vec<AcknowledgementView>> {
    let mut all = state.acknowledgements.list();
    all.sort_by_key(|a| (a.created_at, a.id));
    Json(all.iter().map(AcknowledgementView::from).collect())
}

/// GET /v1/acknowledgements/{id}
#[utoipa::path(
    get,
    path = "/v1/acknowledgements/{id}",
    params(("id" = Uuid, Path, description = "Acknowledgement ID")),
    responses(
        (status = 200, description = "Acknowledgement found", body = AcknowledgementView),
        (status = 404, description = "Acknowledgement not found", body = crate::error::ErrorBody),
    ),
    tag = "acknowledgements"
)]
pub(crate) async fn get_acknowledgement(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<AcknowledgementView>, AppError> {
    state
        .acknowledgements
        .get(&id)
        .map(|a| Json(AcknowledgementView::from(&a)))
        .ok_or_else(|| not_found(id))
}

/// PUT /v1/acknowledgements/{id}
#[utoipa::path(
    put,
    path = "/v1/acknowledgements/{id}",
    params(("id" = Uuid, Path, description = "Acknowledgement ID")),
    request_body = SaveAcknowledgementRequest,
    responses(
        (status = 200, description = "Acknowledgement saved", body = AcknowledgementView),
        (status = 400, description = "Validation error", body = crate::error::ErrorBody),
        (status = 404, description = "Acknowledgement not found", body = crate::error::ErrorBody),
    ),
    tag = "acknowledgements"
)]
pub(crate) async fn save_acknowledgement(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    body: Result<Json<SaveAcknowledgementRequest>, JsonRejection>,
) -> Result<Json<AcknowledgementView>, AppError> {
    let req = extract_validated_json(body)?;
    let patch = AcknowledgementPatch {
        status: parse_opt(req.status.as_deref())?,
        acknowledged_at: req.acknowledged_at,
    };
    let write = orchestration::save_acknowledgement(&state, id, patch)?;
    commit(&state, &write).await?;
    Ok(Json(AcknowledgementView::from(&write.acknowledgement)))
}

/// POST /v1/acknowledgements/{id}/acknowledge
#[utoipa::path(
    post,
    path = "/v1/acknowledgements/{id}/acknowledge",
    params(("id" = Uuid, Path, description = "Acknowledgement ID")),
    responses(
        (status = 200, description = "Acknowledged", body = AcknowledgementView),
        (status = 400, description = "Already acknowledged", body = crate::error::ErrorBody),
        (status = 404, description = "Acknowledgement not found", body = crate::error::ErrorBody),
    ),
    tag = "acknowledgements"
)]
pub(crate) async fn acknowledge(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<AcknowledgementView>, AppError> {
    let write = orchestration::acknowledge(&state, id)?;
    commit(&state, &write).await?;
    Ok(Json(AcknowledgementView::from(&write.acknowledgement)))
}

/// GET /v1/acknowledgements/{id}/history
#[utoipa::path(
    get,
    path = "/v1/acknowledgements/{id}/history",
    params(("id" = Uuid, Path, description = "Acknowledgement ID")),
    responses(
        (status = 200, description = "Audit trail, oldest first", body = Vec<HistoryView>),
        (status = 404, description = "Acknowledgement not found", body = crate::error::ErrorBody),
    ),
    tag = "acknowledgements"
)]
pub(crate) async fn get_history(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<HistoryView>>, AppError> {
    if !state.acknowledgements.contains(&id) {
        return Err(not_found(id));
    }
    let rows = state.history_of(id);
    Ok(Json(rows.iter().map(HistoryView::from).collect()))
}

/// POST /v1/acknowledgements/escalations/sweep
#[utoipa::path(
    post,
    path = "/v1/acknowledgements/escalations/sweep",
    responses(
        (status = 200, description = "Escalations applied by this sweep; `persisted` is false where the write-through failed", body = Vec<EscalationReport>),
    ),
    tag = "acknowledgements"
)]
pub(crate) async fn sweep_escalations(
    State(state): State<AppState>,
) -> Result<Json<Vec<EscalationReport>>, AppError> {
    let writes = orchestration::sweep_escalations(&state);
    let mut reports = Vec::new();
    let mut failed = 0usize;
    for write in &writes {
        // Each record has already advanced in memory; it is notified even
        // when its own write-through fails.
        let persisted = match persist(&state, write).await {
            Ok(()) => true,
            Err(e) => {
                failed += 1;
                tracing::warn!(
                    acknowledgement = %write.acknowledgement.id,
                    error = %e,
                    "sweep write-through failed"
                );
                false
            }
        };
        orchestration::dispatch_notifications(&state, write);
        if let Some(mut report) = EscalationReport::from_write(write) {
            report.persisted = persisted;
            reports.push(report);
        }
    }
    if failed > 0 {
        tracing::error!(failed, saved = writes.len(), "escalation sweep had write-through failures");
    }
    Ok(Json(reports))
}
