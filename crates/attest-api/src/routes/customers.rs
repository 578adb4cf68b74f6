//! # Customers
//!
//! Tenant organizations.
//!
//! - `POST /v1/customers`: create customer
//! - `GET /v1/customers`: list non-deleted customers
//! - `GET /v1/customers/{id}`: get customer
//! - `PUT /v1/customers/{id}`: update customer
//! - `DELETE /v1/customers/{id}`: soft delete

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

use attest_core::SubscriptionType;

use crate::error::AppError;
use crate::extractors::{extract_validated_json, parse_opt, require_text, Validate};
use crate::routes::persist_error;
use crate::state::{AppState, CustomerRecord};

// ── Request DTOs ────────────────────────────────────────────────────

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateCustomerRequest {
    pub name: String,
    /// free (default), standard or premium.
    pub subscription_type: Option<String>,
}

impl Validate for CreateCustomerRequest {
    fn validate(&self) -> Result<(), String> {
        require_text("name", &self.name)
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateCustomerRequest {
    pub name: Option<String>,
    pub subscription_type: Option<String>,
}

impl Validate for UpdateCustomerRequest {
    fn validate(&self) -> Result<(), String> {
        match &self.name {
            Some(name) => require_text("name", name),
            None => Ok(()),
        }
    }
}

// ── Router ──────────────────────────────────────────────────────────

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/customers", get(list_customers).post(create_customer))
        .route(
            "/v1/customers/{id}",
            get(get_customer).put(update_customer).delete(delete_customer),
        )
}

fn name_taken(existing: &CustomerRecord, name: &str, except: Option<Uuid>) -> bool {
    !existing.is_deleted && existing.name == name && Some(existing.id) != except
}

// ── Handlers ────────────────────────────────────────────────────────

/// POST /v1/customers
#[utoipa::path(
    post,
    path = "/v1/customers",
    request_body = CreateCustomerRequest,
    responses(
        (status = 201, description = "Customer created", body = CustomerRecord),
        (status = 400, description = "Validation error", body = crate::error::ErrorBody),
    ),
    tag = "customers"
)]
pub(crate) async fn create_customer(
    State(state): State<AppState>,
    body: Result<Json<CreateCustomerRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<CustomerRecord>), AppError> {
    let req = extract_validated_json(body)?;
    let subscription_type: SubscriptionType =
        parse_opt(req.subscription_type.as_deref())?.unwrap_or_default();
    let name = req.name.trim().to_string();
    let now = state.now();

    let record = state.customers.write(|customers| {
        if customers.values().any(|c| name_taken(c, &name, None)) {
            return Err(AppError::Validation(format!(
                "customer name {name:?} is already in use"
            )));
        }
        let record = CustomerRecord {
            id: Uuid::new_v4(),
            name: name.clone(),
            subscription_type,
            is_deleted: false,
            deleted_at: None,
            created_at: now,
            updated_at: now,
        };
        customers.insert(record.id, record.clone());
        Ok(record)
    })?;

    if let Some(pool) = &state.db_pool {
        crate::db::customers::save(pool, &record)
            .await
            .map_err(|e| persist_error("customer", e))?;
    }
    Ok((StatusCode::CREATED, Json(record)))
}

/// GET /v1/customers
#[utoipa::path(
    get,
    path = "/v1/customers",
    responses((status = 200, description = "Non-deleted customers", body = Vec<CustomerRecord>)),
    tag = "customers"
)]
pub(crate) async fn list_customers(State(state): State<AppState>) -> Json<Vec<CustomerRecord>> {
    let mut customers = state.customers.filter(|c| !c.is_deleted);
    customers.sort_by_key(|c| (c.created_at, c.id));
    Json(customers)
}

/// GET /v1/customers/{id}
#[utoipa::path(
    get,
    path = "/v1/customers/{id}",
    params(("id" = Uuid, Path, description = "Customer ID")),
    responses(
        (status = 200, description = "Customer found", body = CustomerRecord),
        (status = 404, description = "Customer not found", body = crate::error::ErrorBody),
    ),
    tag = "customers"
)]
pub(crate) async fn get_customer(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<CustomerRecord>, AppError> {
    state
        .customers
        .get(&id)
        .filter(|c| !c.is_deleted)
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("customer {id} not found")))
}

/// PUT /v1/customers/{id}
#[utoipa::path(
    put,
    path = "/v1/customers/{id}",
    params(("id" = Uuid, Path, description = "Customer ID")),
    request_body = UpdateCustomerRequest,
    responses(
        (status = 200, description = "Customer updated", body = CustomerRecord),
        (status = 400, description = "Validation error", body = crate::error::ErrorBody),
        (status = 404, description = "Customer not found", body = crate::error::ErrorBody),
    ),
    tag = "customers"
)]
pub(crate) async fn update_customer(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    body: Result<Json<UpdateCustomerRequest>, JsonRejection>,
) -> Result<Json<CustomerRecord>, AppError> {
    let req = extract_validated_json(body)?;
    let subscription_type: Option<SubscriptionType> = parse_opt(req.subscription_type.as_deref())?;
    let name = req.name.map(|n| n.trim().to_string());
    let now = state.now();

    let record = state.customers.write(|customers| {
        if let Some(name) = &name {
            if customers.values().any(|c| name_taken(c, name, Some(id))) {
                return Err(AppError::Validation(format!(
                    "customer name {name:?} is already in use"
                )));
            }
        }
        let customer = customers
            .get_mut(&id)
            .filter(|c| !c.is_deleted)
            .ok_or_else(|| AppError::NotFound(format!("customer {id} not found")))?;
        if let Some(name) = name {
            customer.name = name;
        }
        if let Some(tier) = subscription_type {
            customer.subscription_type = tier;
        }
        customer.updated_at = now;
        Ok(customer.clone())
    })?;

    if let Some(pool) = &state.db_pool {
        crate::db::customers::save(pool, &record)
            .await
            .map_err(|e| persist_error("customer", e))?;
    }
    Ok(Json(record))
}

/// DELETE /v1/customers/{id}
#[utoipa::path(
    delete,
    path = "/v1/customers/{id}",
    params(("id" = Uuid, Path, description = "Customer ID")),
    responses(
        (status = 204, description = "Customer deleted"),
        (status = 404, description = "Customer not found", body = crate::error::ErrorBody),
    ),
    tag = "customers"
)]
pub(crate) async fn delete_customer(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    let now = state.now();
    let record = state
        .customers
        .try_update(&id, |c| {
            if c.is_deleted {
                return Err(AppError::NotFound(format!("customer {id} not found")));
            }
            c.is_deleted = true;
            c.deleted_at = Some(now);
            c.updated_at = now;
            Ok(c.clone())
        })
        .unwrap_or_else(|| Err(AppError::NotFound(format!("customer {id} not found"))))?;

    if let Some(pool) = &state.db_pool {
        crate::db::customers::save(pool, &record)
            .await
            .map_err(|e| persist_error("customer", e))?;
    }
    Ok(StatusCode::NO_CONTENT)
}
