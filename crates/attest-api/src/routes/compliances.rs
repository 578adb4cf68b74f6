//! # Compliance Domains
//!
//! - `POST /v1/compliances`: create
//! - `GET /v1/compliances`: list non-deleted
//! - `GET /v1/compliances/{id}`: get
//! - `PUT /v1/compliances/{id}`: update
//! - `DELETE /v1/compliances/{id}`: soft delete

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

use attest_core::ComplianceType;

use crate::error::AppError;
use crate::extractors::{extract_validated_json, parse_opt, require_text, Validate};
use crate::routes::persist_error;
use crate::state::{AppState, ComplianceRecord};

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateComplianceRequest {
    pub compliance_title: String,
    /// infosec (default), acceptable_use or cryptographic.
    pub compliance_type: Option<String>,
    pub description: Option<String>,
}

impl Validate for CreateComplianceRequest {
    fn validate(&self) -> Result<(), String> {
        require_text("compliance_title", &self.compliance_title)
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateComplianceRequest {
    pub compliance_title: Option<String>,
    pub compliance_type: Option<String>,
    pub description: Option<String>,
}

impl Validate for UpdateComplianceRequest {
    fn validate(&self) -> Result<(), String> {
        match &self.compliance_title {
            Some(title) => require_text("compliance_title", title),
            None => Ok(()),
        }
    }
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/compliances", get(list_compliances).post(create_compliance))
        .route(
            "/v1/compliances/{id}",
            get(get_compliance)
                .put(update_compliance)
                .delete(delete_compliance),
        )
}

fn title_taken(existing: &ComplianceRecord, title: &str, except: Option<Uuid>) -> bool {
    !existing.is_deleted && existing.compliance_title == title && Some(existing.id) != except
}

fn not_found(id: Uuid) -> AppError {
    AppError::NotFound(format!("compliance {id} not found"))
}

async fn persist(state: &AppState, record: &ComplianceRecord) -> Result<(), AppError> {
    if let Some(pool) = &state.db_pool {
        crate::db::compliances::save(pool, record)
            .await
            .map_err(|e| persist_error("compliance", e))?;
    }
    Ok(())
}

/// POST /v1/compliances
#[utoipa::path(
    post,
    path = "/v1/compliances",
    request_body = CreateComplianceRequest,
    responses(
        (status = 201, description = "Compliance created", body = ComplianceRecord),
        (status = 400, description = "Validation error", body = crate::error::ErrorBody),
    ),
    tag = "compliances"
)]
pub(crate) async fn create_compliance(
    State(state): State<AppState>,
    body: Result<Json<CreateComplianceRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ComplianceRecord>), AppError> {
    let req = extract_validated_json(body)?;
    let compliance_type: ComplianceType =
        parse_opt(req.compliance_type.as_deref())?.unwrap_or_default();
    let title = req.compliance_title.trim().to_string();
    let now = state.now();

    let record = state.compliances.write(|all| {
        if all.values().any(|c| title_taken(c, &title, None)) {
            return Err(AppError::Validation(format!(
                "compliance title {title:?} is already in use"
            )));
        }
        let record = ComplianceRecord {
            id: Uuid::new_v4(),
            compliance_type,
            compliance_title: title.clone(),
            description: req.description,
            is_deleted: false,
            deleted_at: None,
            created_at: now,
            updated_at: now,
        };
        all.insert(record.id, record.clone());
        Ok(record)
    })?;

    persist(&state, &record).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

/// GET /v1/compliances
#[utoipa::path(
    get,
    path = "/v1/compliances",
    responses((status = 200, description = "Non-deleted compliances", body = Vec<ComplianceRecord>)),
    tag = "compliances"
)]
pub(crate) async fn list_compliances(State(state): State<AppState>) -> Json<Vec<ComplianceRecord>> {
    let mut all = state.compliances.filter(|c| !c.is_deleted);
    all.sort_by_key(|c| (c.created_at, c.id));
    Json(all)
}

/// GET /v1/compliances/{id}
#[utoipa::path(
    get,
    path = "/v1/compliances/{id}",
    params(("id" = Uuid, Path, description = "Compliance ID")),
    responses(
        (status = 200, description = "Compliance found", body = ComplianceRecord),
        (status = 404, description = "Compliance not found", body = crate::error::ErrorBody),
    ),
    tag = "compliances"
)]
pub(crate) async fn get_compliance(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ComplianceRecord>, AppError> {
    state
        .compliances
        .get(&id)
        .filter(|c| !c.is_deleted)
        .map(Json)
        .ok_or_else(|| not_found(id))
}

/// PUT /v1/compliances/{id}
#[utoipa::path(
    put,
    path = "/v1/compliances/{id}",
    params(("id" = Uuid, Path, description = "Compliance ID")),
    request_body = UpdateComplianceRequest,
    responses(
        (status = 200, description = "Compliance updated", body = ComplianceRecord),
        (status = 400, description = "Validation error", body = crate::error::ErrorBody),
        (status = 404, description = "Compliance not found", body = crate::error::ErrorBody),
    ),
    tag = "compliances"
)]
pub(crate) async fn update_compliance(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    body: Result<Json<UpdateComplianceRequest>, JsonRejection>,
) -> Result<Json<ComplianceRecord>, AppError> {
    let req = extract_validated_json(body)?;
    let compliance_type: Option<ComplianceType> = parse_opt(req.compliance_type.as_deref())?;
    let title = req.compliance_title.map(|t| t.trim().to_string());
    let now = state.now();

    let record = state.compliances.write(|all| {
        if let Some(title) = &title {
            if all.values().any(|c| title_taken(c, title, Some(id))) {
                return Err(AppError::Validation(format!(
                    "compliance title {title:?} is already in use"
                )));
            }
        }
        let record = all
            .get_mut(&id)
            .filter(|c| !c.is_deleted)
            .ok_or_else(|| not_found(id))?;
        if let Some(title) = title {
            record.compliance_title = title;
        }
        if let Some(kind) = compliance_type {
            record.compliance_type = kind;
        }
        if let Some(description) = req.description {
            record.description = Some(description);
        }
        record.updated_at = now;
        Ok(record.clone())
    })?;

    persist(&state, &record).await?;
    Ok(Json(record))
}

/// DELETE /v1/compliances/{id}
#[utoipa::path(
    delete,
    path = "/v1/compliances/{id}",
    params(("id" = Uuid, Path, description = "Compliance ID")),
    responses(
        (status = 204, description = "Compliance deleted"),
        (status = 404, description = "Compliance not found", body = crate::error::ErrorBody),
    ),
    tag = "compliances"
)]
pub(crate) async fn delete_compliance(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    let now = state.now();
    let record = state
        .compliances
        .try_update(&id, |c| {
            if c.is_deleted {
                return Err(not_found(id));
            }
            c.is_deleted = true;
            c.deleted_at = Some(now);
            c.updated_at = now;
            Ok(c.clone())
        })
        .unwrap_or_else(|| Err(not_found(id)))?;

    persist(&state, &record).await?;
    Ok(StatusCode::NO_CONTENT)
}
