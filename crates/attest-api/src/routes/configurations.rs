//! # Policy Configurations
//!
//! Creating a configuration bumps its policy to the next version and
//! stamps that version on the configuration. Updates never bump.
//!
//! - `POST /v1/policy-configurations`
//! - `GET /v1/policy-configurations`
//! - `GET /v1/policy-configurations/{id}`
//! - `PUT /v1/policy-configurations/{id}`

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use attest_core::{AttestError, ConfigurationId, PolicyId};
use attest_state::{ConfigurationPatch, ConfigurationStatus, PolicyConfiguration};

use crate::error::AppError;
use crate::extractors::{extract_validated_json, parse_opt, require_text, Validate};
use crate::orchestration;
use crate::routes::persist_error;
use crate::state::AppState;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateConfigurationRequest {
    pub policy_id: Uuid,
    pub key: String,
    pub value: String,
    /// pending (default), active or rejected.
    pub status: Option<String>,
}

impl Validate for CreateConfigurationRequest {
    fn validate(&self) -> Result<(), String> {
        require_text("key", &self.key)
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateConfigurationRequest {
    pub key: Option<String>,
    pub value: Option<String>,
    pub status: Option<String>,
}

impl Validate for UpdateConfigurationRequest {
    fn validate(&self) -> Result<(), String> {
        match &self.key {
            Some(key) => require_text("key", key),
            None => Ok(()),
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ConfigurationView {
    pub id: Uuid,
    pub policy_id: Uuid,
    pub key: String,
    pub value: String,
    /// Policy version this configuration introduced.
    pub version: u32,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&PolicyConfiguration> for ConfigurationView {
    fn from(c: &PolicyConfiguration) -> Self {
        Self {
            id: c.id.0,
            policy_id: c.policy_id.0,
            key: c.key.clone(),
            value: c.value.clone(),
            version: c.version,
            status: c.status.as_str().to_string(),
            created_at: c.created_at,
            updated_at: c.updated_at,
        }
    }
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/v1/policy-configurations",
            get(list_configurations).post(create_configuration),
        )
        .route(
            "/v1/policy-configurations/{id}",
            get(get_configuration).put(update_configuration),
        )
}

/// POST /v1/policy-configurations
#[utoipa::path(
    post,
    path = "/v1/policy-configurations",
    request_body = CreateConfigurationRequest,
    responses(
        (status = 201, description = "Configuration created and policy version bumped", body = ConfigurationView),
        (status = 400, description = "Validation error", body = crate::error::ErrorBody),
        (status = 404, description = "Policy not found", body = crate::error::ErrorBody),
    ),
    tag = "configurations"
)]
pub(crate) async fn create_configuration(
    State(state): State<AppState>,
    body: Result<Json<CreateConfigurationRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ConfigurationView>), AppError> {
    let req = extract_validated_json(body)?;
    let status: ConfigurationStatus = parse_opt(req.status.as_deref())?.unwrap_or_default();
    let (configuration, policy) = orchestration::create_configuration(
        &state,
        PolicyId::from_uuid(req.policy_id),
        req.key,
        req.value,
        status,
    )?;

    if let Some(pool) = &state.db_pool {
        crate::db::configurations::insert_with_bump(pool, &configuration, &policy)
            .await
            .map_err(|e| persist_error("policy configuration", e))?;
    }
    Ok((StatusCode::CREATED, Json(ConfigurationView::from(&configuration))))
}

/// GET /v1/policy-configurations
#[utoipa::path(
    get,
    path = "/v1/policy-configurations",
    responses((status = 200, description = "All configurations", body = Vec<ConfigurationView>)),
    tag = "configurations"
)]
pub(crate) async fn list_configurations(
    State(state): State<AppState>,
) -> Json<Vec<ConfigurationView>> {
    let mut all = state.configurations.list();
    all.sort_by_key(|c| (c.policy_id, c.version));
    Json(all.iter().map(ConfigurationView::from).collect())
}

/// GET /v1/policy-configurations/{id}
#[utoipa::path(
    get,
    path = "/v1/policy-configurations/{id}",
    params(("id" = Uuid, Path, description = "Configuration ID")),
    responses(
        (status = 200, description = "Configuration found", body = ConfigurationView),
        (status = 404, description = "Configuration not found", body = crate::error::ErrorBody),
    ),
    tag = "configurations"
)]
pub(crate) async fn get_configuration(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ConfigurationView>, AppError> {
    state
        .configurations
        .get(&id)
        .map(|c| Json(ConfigurationView::from(&c)))
        .ok_or_else(|| {
            AttestError::not_found("policy configuration", ConfigurationId::from_uuid(id)).into()
        })
}

/// PUT /v1/policy-configurations/{id}
#[utoipa::path(
    put,
    path = "/v1/policy-configurations/{id}",
    params(("id" = Uuid, Path, description = "Configuration ID")),
    request_body = UpdateConfigurationRequest,
    responses(
        (status = 200, description = "Configuration updated", body = ConfigurationView),
        (status = 400, description = "Validation error", body = crate::error::ErrorBody),
        (status = 404, description = "Configuration not found", body = crate::error::ErrorBody),
    ),
    tag = "configurations"
)]
pub(crate) async fn update_configuration(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    body: Result<Json<UpdateConfigurationRequest>, JsonRejection>,
) -> Result<Json<ConfigurationView>, AppError> {
    let req = extract_validated_json(body)?;
    let patch = ConfigurationPatch {
        key: req.key,
        value: req.value,
        status: parse_opt(req.status.as_deref())?,
    };
    let configuration = orchestration::update_configuration(&state, id, patch)?;

    if let Some(pool) = &state.db_pool {
        crate::db::configurations::save(pool, &configuration)
            .await
            .map_err(|e| persist_error("policy configuration", e))?;
    }
    Ok(Json(ConfigurationView::from(&configuration)))
}
