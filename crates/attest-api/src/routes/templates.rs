//! # Templates
//!
//! Versioned document templates grouped into families by name. At most one
//! version per family carries the latest flag; default policies bind to it.
//!
//! - `POST /v1/templates`: publish a version
//! - `GET /v1/templates`: list active versions
//! - `GET /v1/templates/{id}`: get version
//! - `PUT /v1/templates/{id}`: update version, optionally claiming latest
//! - `GET /v1/templates/latest/{name}`: latest version of a family

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use attest_core::{AttestError, TemplateId};
use attest_state::{TemplateDraft, TemplatePatch, TemplateVersion};

use crate::error::AppError;
use crate::extractors::{extract_validated_json, require_text, Validate};
use crate::orchestration::{self, TemplateWrite};
use crate::routes::persist_error;
use crate::state::AppState;

// ── DTOs ────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize, ToSchema)]
pub struct PublishTemplateRequest {
    pub name: String,
    pub description: Option<String>,
    pub document_link: Option<String>,
    /// Must be at least 1 and unused within the family.
    pub version_number: u32,
    #[serde(default)]
    pub is_latest: bool,
    #[serde(default = "default_active")]
    pub is_active: bool,
    pub change_log: Option<String>,
}

fn default_active() -> bool {
    true
}

impl Validate for PublishTemplateRequest {
    fn validate(&self) -> Result<(), String> {
        require_text("name", &self.name)?;
        if self.version_number == 0 {
            return Err("version_number must be at least 1".to_string());
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateTemplateRequest {
    pub description: Option<String>,
    pub document_link: Option<String>,
    pub is_active: Option<bool>,
    pub change_log: Option<String>,
    /// `true` moves the family's latest flag to this version.
    pub is_latest: Option<bool>,
}

impl Validate for UpdateTemplateRequest {
    fn validate(&self) -> Result<(), String> {
        Ok(())
    }
}

/// A template version with its derived latest flag.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TemplateView {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub document_link: Option<String>,
    pub version_number: u32,
    pub is_latest: bool,
    pub is_active: bool,
    pub change_log: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TemplateView {
    fn new(version: &TemplateVersion, is_latest: bool) -> Self {
        Self {
            id: version.id.0,
            name: version.name.clone(),
            description: version.description.clone(),
            document_link: version.document_link.clone(),
            version_number: version.version_number,
            is_latest,
            is_active: version.is_active,
            change_log: version.change_log.clone(),
            created_at: version.created_at,
            updated_at: version.updated_at,
        }
    }
}

impl From<&TemplateWrite> for TemplateView {
    fn from(write: &TemplateWrite) -> Self {
        Self::new(&write.version, write.is_latest())
    }
}

// ── Router ──────────────────────────────────────────────────────────

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/templates", get(list_templates).post(publish_template))
        .route("/v1/templates/latest/{name}", get(get_latest_template))
        .route(
            "/v1/templates/{id}",
            get(get_template).put(update_template),
        )
}

async fn persist(state: &AppState, write: &TemplateWrite) -> Result<(), AppError> {
    if let Some(pool) = &state.db_pool {
        crate::db::templates::save(pool, &write.version, write.family_latest)
            .await
            .map_err(|e| persist_error("template", e))?;
    }
    Ok(())
}

// ── Handlers ────────────────────────────────────────────────────────

/// POST /v1/templates
#[utoipa::path(
    post,
    path = "/v1/templates",
    request_body = PublishTemplateRequest,
    responses(
        (status = 201, description = "Template version published", body = TemplateView),
        (status = 400, description = "Validation error", body = crate::error::ErrorBody),
    ),
    tag = "templates"
)]
pub(crate) async fn publish_template(
    State(state): State<AppState>,
    body: Result<Json<PublishTemplateRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<TemplateView>), AppError> {
    let req = extract_validated_json(body)?;
    let draft = TemplateDraft {
        name: req.name,
        description: req.description,
        document_link: req.document_link,
        version_number: req.version_number,
        is_active: req.is_active,
        change_log: req.change_log,
    };
    let write = orchestration::publish_template(&state, draft, req.is_latest)?;
    persist(&state, &write).await?;
    Ok((StatusCode::CREATED, Json(TemplateView::from(&write))))
}

/// GET /v1/templates
#[utoipa::path(
    get,
    path = "/v1/templates",
    responses((status = 200, description = "Active template versions", body = Vec<TemplateView>)),
    tag = "templates"
)]
pub(crate) async fn list_templates(State(state): State<AppState>) -> Json<Vec<TemplateView>> {
    let catalog = state.templates.read();
    let mut views: Vec<TemplateView> = catalog
        .active_versions()
        .map(|v| TemplateView::new(v, catalog.is_latest(v.id)))
        .collect();
    views.sort_by(|a, b| {
        a.name
            .cmp(&b.name)
            .then(a.version_number.cmp(&b.version_number))
    });
    Json(views)
}

/// GET /v1/templates/{id}
#[utoipa::path(
    get,
    path = "/v1/templates/{id}",
    params(("id" = Uuid, Path, description = "Template version ID")),
    responses(
        (status = 200, description = "Template version found", body = TemplateView),
        (status = 404, description = "Template not found", body = crate::error::ErrorBody),
    ),
    tag = "templates"
)]
pub(crate) async fn get_template(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<TemplateView>, AppError> {
    let id = TemplateId::from_uuid(id);
    let catalog = state.templates.read();
    catalog
        .get(id)
        .map(|v| Json(TemplateView::new(v, catalog.is_latest(id))))
        .ok_or_else(|| AppError::from(AttestError::not_found("template", id)))
}

/// GET /v1/templates/latest/{name}
#[utoipa::path(
    get,
    path = "/v1/templates/latest/{name}",
    params(("name" = String, Path, description = "Template family name")),
    responses(
        (status = 200, description = "Latest version of the family", body = TemplateView),
        (status = 404, description = "No latest version", body = crate::error::ErrorBody),
    ),
    tag = "templates"
)]
pub(crate) async fn get_latest_template(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<TemplateView>, AppError> {
    let catalog = state.templates.read();
    catalog
        .latest(&name)
        .map(|v| Json(TemplateView::new(v, true)))
        .ok_or_else(|| AppError::NotFound(format!("no latest version of template {name:?}")))
}

/// PUT /v1/templates/{id}
#[utoipa::path(
    put,
    path = "/v1/templates/{id}",
    params(("id" = Uuid, Path, description = "Template version ID")),
    request_body = UpdateTemplateRequest,
    responses(
        (status = 200, description = "Template version updated", body = TemplateView),
        (status = 404, description = "Template not found", body = crate::error::ErrorBody),
    ),
    tag = "templates"
)]
pub(crate) async fn update_template(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    body: Result<Json<UpdateTemplateRequest>, JsonRejection>,
) -> Result<Json<TemplateView>, AppError> {
    let req = extract_validated_json(body)?;
    let patch = TemplatePatch {
        description: req.description,
        document_link: req.document_link,
        is_active: req.is_active,
        change_log: req.change_log,
        is_latest: req.is_latest,
    };
    let write = orchestration::update_template(&state, TemplateId::from_uuid(id), patch)?;
    persist(&state, &write).await?;
    Ok(Json(TemplateView::from(&write)))
}
