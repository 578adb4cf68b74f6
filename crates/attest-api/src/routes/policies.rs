//! # Policies
//!
//! Default policies are bound to the latest version of a template family
//! and take that version's number; custom policies are authored by an
//! employee and start at version 1. Configuration changes bump the
//! version separately (see [`super::configurations`]).
//!
//! - `POST /v1/policies`: create
//! - `GET /v1/policies`: list non-deleted
//! - `GET /v1/policies/{id}`: get
//! - `PUT /v1/policies/{id}`: update, re-resolving the template binding
//! - `DELETE /v1/policies/{id}`: soft delete
//! - `PUT /v1/policies/{id}/approval`: record an approval decision

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, put};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use attest_core::{AttestError, CustomerComplianceId, EmployeeId, PolicyId, TemplateId};
use attest_state::{ApprovalStatus, Policy, PolicyDraft, PolicyPatch, PolicyType};

use crate::error::AppError;
use crate::extractors::{extract_validated_json, require_text, Validate};
use crate::orchestration::{self, NewPolicy};
use crate::routes::persist_error;
use crate::state::AppState;

// ── DTOs ────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreatePolicyRequest {
    /// default or custom.
    pub policy_type: String,
    pub title: String,
    pub description: Option<String>,
    pub customer_compliance_id: Option<Uuid>,
    pub document_link: Option<String>,
    /// Any version of the template family to bind (default policies).
    pub template_id: Option<Uuid>,
    /// Authoring employee (custom policies).
    pub created_by: Option<Uuid>,
}

impl Validate for CreatePolicyRequest {
    fn validate(&self) -> Result<(), String> {
        require_text("title", &self.title)
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdatePolicyRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub document_link: Option<String>,
    pub customer_compliance_id: Option<Uuid>,
    pub approved_by: Option<Uuid>,
}

impl Validate for UpdatePolicyRequest {
    fn validate(&self) -> Result<(), String> {
        match &self.title {
            Some(title) => require_text("title", title),
            None => Ok(()),
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateApprovalRequest {
    /// pending, approved or rejected.
    pub approval_status: String,
    pub approved_by: Option<Uuid>,
}

impl Validate for UpdateApprovalRequest {
    fn validate(&self) -> Result<(), String> {
        require_text("approval_status", &self.approval_status)
    }
}

/// Wire shape of a policy.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PolicyView {
    pub id: Uuid,
    pub policy_type: String,
    pub title: String,
    pub description: Option<String>,
    pub customer_compliance_id: Option<Uuid>,
    pub template_id: Option<Uuid>,
    pub created_by: Option<Uuid>,
    pub version: u32,
    pub document_link: Option<String>,
    pub approval_status: String,
    pub approved_by: Option<Uuid>,
    pub approved_at: Option<DateTime<Utc>>,
    pub approval_requested_at: DateTime<Utc>,
    pub is_deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Policy> for PolicyView {
    fn from(p: &Policy) -> Self {
        Self {
            id: p.id.0,
            policy_type: p.policy_type.as_str().to_string(),
            title: p.title.clone(),
            description: p.description.clone(),
            customer_compliance_id: p.customer_compliance.map(|id| id.0),
            template_id: p.template.map(|id| id.0),
            created_by: p.created_by.map(|id| id.0),
            version: p.version,
            document_link: p.document_link.clone(),
            approval_status: p.approval_status.as_str().to_string(),
            approved_by: p.approved_by.map(|id| id.0),
            approved_at: p.approved_at,
            approval_requested_at: p.approval_requested_at,
            is_deleted: p.is_deleted,
            created_at: p.created_at,
            updated_at: p.updated_at,
        }
    }
}

// ── Router ──────────────────────────────────────────────────────────

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/policies", get(list_policies).post(create_policy))
        .route(
            "/v1/policies/{id}",
            get(get_policy).put(update_policy).delete(delete_policy),
        )
        .route("/v1/policies/{id}/approval", put(update_approval))
}

async fn persist(state: &AppState, policy: &Policy) -> Result<(), AppError> {
    if let Some(pool) = &state.db_pool {
        crate::db::policies::save(pool, policy)
            .await
            .map_err(|e| persist_error("policy", e))?;
    }
    Ok(())
}

// ── Handlers ────────────────────────────────────────────────────────

/// POST /v1/policies
#[utoipa::path(
    post,
    path = "/v1/policies",
    request_body = CreatePolicyRequest,
    responses(
        (status = 201, description = "Policy created", body = PolicyView),
        (status = 400, description = "Validation error", body = crate::error::ErrorBody),
        (status = 404, description = "Referenced record not found", body = crate::error::ErrorBody),
    ),
    tag = "policies"
)]
pub(crate) async fn create_policy(
    State(state): State<AppState>,
    body: Result<Json<CreatePolicyRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<PolicyView>), AppError> {
    let req = extract_validated_json(body)?;
    let policy_type: PolicyType = req.policy_type.parse()?;
    let input = NewPolicy {
        policy_type,
        draft: PolicyDraft {
            title: req.title,
            description: req.description,
            customer_compliance: req.customer_compliance_id.map(CustomerComplianceId::from_uuid),
            document_link: req.document_link,
        },
        template: req.template_id.map(TemplateId::from_uuid),
        created_by: req.created_by.map(EmployeeId::from_uuid),
    };
    let policy = orchestration::create_policy(&state, input)?;
    persist(&state, &policy).await?;
    Ok((StatusCode::CREATED, Json(PolicyView::from(&policy))))
}

/// GET /v1/policies
#[utoipa::path(
    get,
    path = "/v1/policies",
    responses((status = 200, description = "Non-deleted policies", body = Vec<PolicyView>)),
    tag = "policies"
)]
pub(crate) async fn list_policies(State(state): State<AppState>) -> Json<Vec<PolicyView>> {
    let mut policies = state.policies.filter(|p| !p.is_deleted);
    policies.sort_by_key(|p| (p.created_at, p.id));
    Json(policies.iter().map(PolicyView::from).collect())
}

/// GET /v1/policies/{id}
#[utoipa::path(
    get,
    path = "/v1/policies/{id}",
    params(("id" = Uuid, Path, description = "Policy ID")),
    responses(
        (status = 200, description = "Policy found", body = PolicyView),
        (status = 404, description = "Policy not found", body = crate::error::ErrorBody),
    ),
    tag = "policies"
)]
pub(crate) async fn get_policy(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<PolicyView>, AppError> {
    state
        .policies
        .get(&id)
        .filter(|p| !p.is_deleted)
        .map(|p| Json(PolicyView::from(&p)))
        .ok_or_else(|| AttestError::not_found("policy", PolicyId::from_uuid(id)).into())
}

/// PUT /v1/policies/{id}
#[utoipa::path(
    put,
    path = "/v1/policies/{id}",
    params(("id" = Uuid, Path, description = "Policy ID")),
    request_body = UpdatePolicyRequest,
    responses(
        (status = 200, description = "Policy updated", body = PolicyView),
        (status = 400, description = "Validation error", body = crate::error::ErrorBody),
        (status = 404, description = "Policy not found", body = crate::error::ErrorBody),
    ),
    tag = "policies"
)]
pub(crate) async fn update_policy(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    body: Result<Json<UpdatePolicyRequest>, JsonRejection>,
) -> Result<Json<PolicyView>, AppError> {
    let req = extract_validated_json(body)?;
    let patch = PolicyPatch {
        title: req.title,
        description: req.description,
        document_link: req.document_link,
        customer_compliance: req.customer_compliance_id.map(CustomerComplianceId::from_uuid),
    };
    let policy = orchestration::update_policy(
        &state,
        PolicyId::from_uuid(id),
        patch,
        req.approved_by.map(EmployeeId::from_uuid),
    )?;
    persist(&state, &policy).await?;
    Ok(Json(PolicyView::from(&policy)))
}

/// PUT /v1/policies/{id}/approval
#[utoipa::path(
    put,
    path = "/v1/policies/{id}/approval",
    params(("id" = Uuid, Path, description = "Policy ID")),
    request_body = UpdateApprovalRequest,
    responses(
        (status = 200, description = "Approval recorded", body = PolicyView),
        (status = 400, description = "Validation error", body = crate::error::ErrorBody),
        (status = 404, description = "Policy not found", body = crate::error::ErrorBody),
    ),
    tag = "policies"
)]
pub(crate) async fn update_approval(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    body: Result<Json<UpdateApprovalRequest>, JsonRejection>,
) -> Result<Json<PolicyView>, AppError> {
    let req = extract_validated_json(body)?;
    let status: ApprovalStatus = req.approval_status.trim().parse()?;
    let policy = orchestration::update_policy_approval(
        &state,
        PolicyId::from_uuid(id),
        status,
        req.approved_by.map(EmployeeId::from_uuid),
    )?;
    persist(&state, &policy).await?;
    Ok(Json(PolicyView::from(&policy)))
}

/// DELETE /v1/policies/{id}
#[utoipa::path(
    delete,
    path = "/v1/policies/{id}",
    params(("id" = Uuid, Path, description = "Policy ID")),
    responses(
        (status = 204, description = "Policy deleted"),
        (status = 404, description = "Policy not found", body = crate::error::ErrorBody),
    ),
    tag = "policies"
)]
pub(crate) async fn delete_policy(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    let policy = orchestration::delete_policy(&state, PolicyId::from_uuid(id))?;
    persist(&state, &policy).await?;
    tracing::info!(policy = %policy.id, "policy deleted");
    Ok(StatusCode::NO_CONTENT)
}
