//! # Customer Compliance
//!
//! Links a customer to a compliance domain and tracks its progress.
//!
//! - `POST /v1/customer-compliance`: create link
//! - `GET /v1/customer-compliance`: list links
//! - `GET /v1/customer-compliance/{id}`: get link
//! - `PUT /v1/customer-compliance/{id}`: update progress fields

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

use attest_core::{AuditStatus, ProgressStatus};

use crate::error::AppError;
use crate::extractors::{extract_validated_json, parse_opt, Validate};
use crate::routes::persist_error;
use crate::state::{AppState, CustomerComplianceRecord};

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateCustomerComplianceRequest {
    pub customer_id: Uuid,
    pub compliance_id: Uuid,
    /// pending (default), in_progress or completed.
    pub status: Option<String>,
    /// Decimal string, 0 to 100, at most two fraction digits. Defaults to "0.00".
    pub compliance_percentage: Option<String>,
    pub audit_date: Option<DateTime<Utc>>,
    /// pending (default) or completed.
    pub audit_status: Option<String>,
}

impl Validate for CreateCustomerComplianceRequest {
    fn validate(&self) -> Result<(), String> {
        match &self.compliance_percentage {
            Some(p) => validate_percentage(p),
            None => Ok(()),
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateCustomerComplianceRequest {
    pub status: Option<String>,
    pub compliance_percentage: Option<String>,
    pub audit_date: Option<DateTime<Utc>>,
    pub audit_status: Option<String>,
    pub acknowledged_count: Option<u32>,
    pub pending_count: Option<u32>,
    pub compliance_updated: Option<bool>,
}

impl Validate for UpdateCustomerComplianceRequest {
    fn validate(&self) -> Result<(), String> {
        match &self.compliance_percentage {
            Some(p) => validate_percentage(p),
            None => Ok(()),
        }
    }
}

/// `0`..=`100` with up to two fraction digits.
pub fn validate_percentage(raw: &str) -> Result<(), String> {
    let invalid = || format!("compliance_percentage must be a number between 0 and 100 with at most two decimals, got {raw:?}");
    let (whole, fraction) = match raw.split_once('.') {
        Some((w, f)) => (w, Some(f)),
        None => (raw, None),
    };
    if whole.is_empty() || !whole.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }
    if let Some(f) = fraction {
        if f.is_empty() || f.len() > 2 || !f.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
    }
    let whole: u32 = whole.parse().map_err(|_| invalid())?;
    let fraction_is_zero = fraction.map_or(true, |f| f.bytes().all(|b| b == b'0'));
    if whole > 100 || (whole == 100 && !fraction_is_zero) {
        return Err(invalid());
    }
    Ok(())
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/v1/customer-compliance",
            get(list_customer_compliances).post(create_customer_compliance),
        )
        .route(
            "/v1/customer-compliance/{id}",
            get(get_customer_compliance).put(update_customer_compliance),
        )
}

async fn persist(state: &AppState, record: &CustomerComplianceRecord) -> Result<(), AppError> {
    if let Some(pool) = &state.db_pool {
        crate::db::customer_compliances::save(pool, record)
            .await
            .map_err(|e| persist_error("customer compliance", e))?;
    }
    Ok(())
}

/// POST /v1/customer-compliance
#[utoipa::path(
    post,
    path = "/v1/customer-compliance",
    request_body = CreateCustomerComplianceRequest,
    responses(
        (status = 201, description = "Link created", body = CustomerComplianceRecord),
        (status = 400, description = "Validation error", body = crate::error::ErrorBody),
        (status = 404, description = "Customer or compliance not found", body = crate::error::ErrorBody),
    ),
    tag = "customer_compliance"
)]
pub(crate) async fn create_customer_compliance(
    State(state): State<AppState>,
    body: Result<Json<CreateCustomerComplianceRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<CustomerComplianceRecord>), AppError> {
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
    if !state
        .compliances
        .get(&req.compliance_id)
        .is_some_and(|c| !c.is_deleted)
    {
        return Err(AppError::NotFound(format!(
            "compliance {} not found",
            req.compliance_id
        )));
    }
    let status: ProgressStatus = parse_opt(req.status.as_deref())?.unwrap_or_default();
    let audit_status: AuditStatus = parse_opt(req.audit_status.as_deref())?.unwrap_or_default();
    let now = state.now();

    let record = CustomerComplianceRecord {
        id: Uuid::new_v4(),
        customer_id: req.customer_id,
        compliance_id: req.compliance_id,
        status,
        compliance_percentage: req
            .compliance_percentage
            .unwrap_or_else(|| "0.00".to_string()),
        audit_date: req.audit_date,
        audit_status,
        acknowledged_count: 0,
        pending_count: 0,
        compliance_updated: false,
        created_at: now,
        updated_at: now,
    };
    state.customer_compliances.insert(record.id, record.clone());

    persist(&state, &record).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

/// GET /v1/customer-compliance
#[utoipa::path(
    get,
    path = "/v1/customer-compliance",
    responses((status = 200, description = "All links", body = Vec<CustomerComplianceRecord>)),
    tag = "customer_compliance"
)]
pub(crate) async fn list_customer_compliances(
    State(state): State<AppState>,
) -> Json<Vec<CustomerComplianceRecord>> {
    let mut all = state.customer_compliances.list();
    all.sort_by_key(|c| (c.created_at, c.id));
    Json(all)
}

/// GET /v1/customer-compliance/{id}
#[utoipa::path(
    get,
    path = "/v1/customer-compliance/{id}",
    params(("id" = Uuid, Path, description = "Customer compliance ID")),
    responses(
        (status = 200, description = "Link found", body = CustomerComplianceRecord),
        (status = 404, description = "Link not found", body = crate::error::ErrorBody),
    ),
    tag = "customer_compliance"
)]
pub(crate) async fn get_customer_compliance(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<CustomerComplianceRecord>, AppError> {
    state
        .customer_compliances
        .get(&id)
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("customer compliance {id} not found")))
}

/// PUT /v1/customer-compliance/{id}
#[utoipa::path(
    put,
    path = "/v1/customer-compliance/{id}",
    params(("id" = Uuid, Path, description = "Customer compliance ID")),
    request_body = UpdateCustomerComplianceRequest,
    responses(
        (status = 200, description = "Link updated", body = CustomerComplianceRecord),
        (status = 400, description = "Validation error", body = crate::error::ErrorBody),
        (status = 404, description = "Link not found", body = crate::error::ErrorBody),
    ),
    tag = "customer_compliance"
)]
pub(crate) async fn update_customer_compliance(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    body: Result<Json<UpdateCustomerComplianceRequest>, JsonRejection>,
) -> Result<Json<CustomerComplianceRecord>, AppError> {
    let req = extract_validated_json(body)?;
    let status: Option<ProgressStatus> = parse_opt(req.status.as_deref())?;
    let audit_status: Option<AuditStatus> = parse_opt(req.audit_status.as_deref())?;
    let now = state.now();

    let record = state
        .customer_compliances
        .try_update(&id, |rec| {
            if let Some(status) = status {
                rec.status = status;
            }
            if let Some(p) = req.compliance_percentage {
                rec.compliance_percentage = p;
            }
            if let Some(at) = req.audit_date {
                rec.audit_date = Some(at);
            }
            if let Some(audit) = audit_status {
                rec.audit_status = audit;
            }
            if let Some(n) = req.acknowledged_count {
                rec.acknowledged_count = n;
            }
            if let Some(n) = req.pending_count {
                rec.pending_count = n;
            }
            if let Some(flag) = req.compliance_updated {
                rec.compliance_updated = flag;
            }
            rec.updated_at = now;
            Ok::<_, AppError>(rec.clone())
        })
        .unwrap_or_else(|| {
            Err(AppError::NotFound(format!(
                "customer compliance {id} not found"
            )))
        })?;

    persist(&state, &record).await?;
    Ok(Json(record))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percentage_bounds() {
        for ok in ["0", "0.00", "55.5", "99.99", "100", "100.00"] {
            assert!(validate_percentage(ok).is_ok(), "{ok}");
        }
        for bad in ["", "-1", "100.01", "101", "12.345", "1.", ".5", "abc", "1e2"] {
            assert!(validate_percentage(bad).is_err(), "{bad}");
        }
    }
}
