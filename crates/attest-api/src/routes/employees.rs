//! # Employees
//!
//! - `POST /v1/employees`: register an employee under a customer
//! - `GET /v1/employees`: list employees
//! - `GET /v1/employees/{id}`: get employee
//! - `PUT /v1/employees/{id}`: update employee
//!
//! Email addresses are unique across all customers.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

use attest_core::EmployeeStatus;

use crate::error::AppError;
use crate::extractors::{extract_validated_json, parse_opt, require_text, Validate};
use crate::routes::persist_error;
use crate::state::{AppState, EmployeeRecord};

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateEmployeeRequest {
    pub customer_id: Uuid,
    pub name: String,
    pub email: String,
    pub role: String,
    /// active (default) or inactive.
    pub status: Option<String>,
    /// Start of the new-joiner window; falls back to the creation time.
    pub join_date: Option<DateTime<Utc>>,
}

impl Validate for CreateEmployeeRequest {
    fn validate(&self) -> Result<(), String> {
        require_text("name", &self.name)?;
        require_text("role", &self.role)?;
        validate_email(&self.email)
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateEmployeeRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub role: Option<String>,
    pub status: Option<String>,
    pub join_date: Option<DateTime<Utc>>,
}

impl Validate for UpdateEmployeeRequest {
    fn validate(&self) -> Result<(), String> {
        if let Some(name) = &self.name {
            require_text("name", name)?;
        }
        if let Some(role) = &self.role {
            require_text("role", role)?;
        }
        match &self.email {
            Some(email) => validate_email(email),
            None => Ok(()),
        }
    }
}

fn validate_email(email: &str) -> Result<(), String> {
    let email = email.trim();
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(()),
        _ => Err(format!("email {email:?} is not a valid address")),
    }
}

fn email_taken(existing: &EmployeeRecord, email: &str, except: Option<Uuid>) -> bool {
    existing.email.eq_ignore_ascii_case(email) && Some(existing.id) != except
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/employees", get(list_employees).post(create_employee))
        .route(
            "/v1/employees/{id}",
            get(get_employee).put(update_employee),
        )
}

/// POST /v1/employees
#[utoipa::path(
    post,
    path = "/v1/employees",
    request_body = CreateEmployeeRequest,
    responses(
        (status = 201, description = "Employee created", body = EmployeeRecord),
        (status = 400, description = "Validation error", body = crate::error::ErrorBody),
        (status = 404, description = "Customer not found", body = crate::error::ErrorBody),
    ),
    tag = "employees"
)]
pub(crate) async fn create_employee(
    State(state): State<AppState>,
    body: Result<Json<CreateEmployeeRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<EmployeeRecord>), AppError> {
    let req = extract_validated_json(body)?;
    if !state
        .customers
        .get(&req.customer_id)
        .is_some_and(|c| !c.is_deleted)
    {
        return Err(AppError::NotFound(format!(
            "customer {} not found",
            req.customer_id
        )));
    }
    let status: EmployeeStatus = parse_opt(req.status.as_deref())?.unwrap_or_default();
    let email = req.email.trim().to_string();
    let now = state.now();

    let record = state.employees.write(|employees| {
        if employees.values().any(|e| email_taken(e, &email, None)) {
            return Err(AppError::Validation(format!(
                "email {email:?} is already registered"
            )));
        }
        let record = EmployeeRecord {
            id: Uuid::new_v4(),
            customer_id: req.customer_id,
            name: req.name.trim().to_string(),
            email: email.clone(),
            role: req.role.trim().to_string(),
            status,
            join_date: req.join_date,
            created_at: now,
            updated_at: now,
        };
        employees.insert(record.id, record.clone());
        Ok(record)
    })?;

    if let Some(pool) = &state.db_pool {
        crate::db::employees::save(pool, &record)
            .await
            .map_err(|e| persist_error("employee", e))?;
    }
    tracing::debug!(employee = %record.id, customer = %record.customer_id, "employee registered");
    Ok((StatusCode::CREATED, Json(record)))
}

/// GET /v1/employees
#[utoipa::path(
    get,
    path = "/v1/employees",
    responses((status = 200, description = "All employees", body = Vec<EmployeeRecord>)),
    tag = "employees"
)]
pub(crate) async fn list_employees(State(state): State<AppState>) -> Json<Vec<EmployeeRecord>> {
    let mut employees = state.employees.list();
    employees.sort_by_key(|e| (e.created_at, e.id));
    Json(employees)
}

/// GET /v1/employees/{id}
#[utoipa::path(
    get,
    path = "/v1/employees/{id}",
    params(("id" = Uuid, Path, description = "Employee ID")),
    responses(
        (status = 200, description = "Employee found", body = EmployeeRecord),
        (status = 404, description = "Employee not found", body = crate::error::ErrorBody),
    ),
    tag = "employees"
)]
pub(crate) async fn get_employee(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<EmployeeRecord>, AppError> {
    state
        .employees
        .get(&id)
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("employee {id} not found")))
}

/// PUT /v1/employees/{id}
#[utoipa::path(
    put,
    path = "/v1/employees/{id}",
    params(("id" = Uuid, Path, description = "Employee ID")),
    request_body = UpdateEmployeeRequest,
    responses(
        (status = 200, description = "Employee updated", body = EmployeeRecord),
        (status = 400, description = "Validation error", body = crate::error::ErrorBody),
        (status = 404, description = "Employee not found", body = crate::error::ErrorBody),
    ),
    tag = "employees"
)]
pub(crate) async fn update_employee(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    body: Result<Json<UpdateEmployeeRequest>, JsonRejection>,
) -> Result<Json<EmployeeRecord>, AppError> {
    let req = extract_validated_json(body)?;
    let status: Option<EmployeeStatus> = parse_opt(req.status.as_deref())?;
    let now = state.now();

    let record = state.employees.write(|employees| {
        if let Some(email) = &req.email {
            let email = email.trim();
            if employees.values().any(|e| email_taken(e, email, Some(id))) {
                return Err(AppError::Validation(format!(
                    "email {email:?} is already registered"
                )));
            }
        }
        let rec = employees
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound(format!("employee {id} not found")))?;
        if let Some(name) = &req.name {
            rec.name = name.trim().to_string();
        }
        if let Some(email) = &req.email {
            rec.email = email.trim().to_string();
        }
        if let Some(role) = &req.role {
            rec.role = role.trim().to_string();
        }
        if let Some(status) = status {
            rec.status = status;
        }
        if let Some(join) = req.join_date {
            rec.join_date = Some(join);
        }
        rec.updated_at = now;
        Ok(rec.clone())
    })?;

    if let Some(pool) = &state.db_pool {
        crate::db::employees::save(pool, &record)
            .await
            .map_err(|e| persist_error("employee", e))?;
    }
    Ok(Json(record))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_needs_both_halves() {
        assert!(validate_email("ada@example.com").is_ok());
        assert!(validate_email("ada").is_err());
        assert!(validate_email("@example.com").is_err());
        assert!(validate_email("ada@").is_err());
    }

    #[test]
    fn email_comparison_ignores_case_and_self() {
        let now = Utc::now();
        let rec = EmployeeRecord {
            id: Uuid::new_v4(),
            customer_id: Uuid::new_v4(),
            name: "Ada".into(),
            email: "Ada@Example.com".into(),
            role: "engineer".into(),
            status: EmployeeStatus::Active,
            join_date: None,
            created_at: now,
            updated_at: now,
        };
        assert!(email_taken(&rec, "ada@example.com", None));
        assert!(!email_taken(&rec, "ada@example.com", Some(rec.id)));
    }
}
