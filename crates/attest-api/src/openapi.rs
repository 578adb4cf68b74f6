//! # OpenAPI Specification Assembly
//!
//! Collects every utoipa-documented handler into one OpenAPI document,
//! served at `/openapi.json` and printed by `attest-cli openapi`.

use axum::routing::get;
use axum::{Json, Router};
use utoipa::OpenApi;

use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Attest API",
        version = "0.1.0",
        description = "Policy acknowledgement tracker: template and policy versioning, employee acknowledgements, overdue escalation, and the audit trail.",
        license(name = "AGPL-3.0-or-later")
    ),
    paths(
        // Customers
        crate::routes::customers::create_customer,
        crate::routes::customers::list_customers,
        crate::routes::customers::get_customer,
        crate::routes::customers::update_customer,
        crate::routes::customers::delete_customer,
        // Compliances
        crate::routes::compliances::create_compliance,
        crate::routes::compliances::list_compliances,
        crate::routes::compliances::get_compliance,
        crate::routes::compliances::update_compliance,
        crate::routes::compliances::delete_compliance,
        // Customer compliance
        crate::routes::customer_compliance::create_customer_compliance,
        crate::routes::customer_compliance::list_customer_compliances,
        crate::routes::customer_compliance::get_customer_compliance,
        crate::routes::customer_compliance::update_customer_compliance,
        // Employees
        crate::routes::employees::create_employee,
        crate::routes::employees::list_employees,
        crate::routes::employees::get_employee,
        crate::routes::employees::update_employee,
        // Templates
        crate::routes::templates::publish_template,
        crate::routes::templates::list_templates,
        crate::routes::templates::get_template,
        crate::routes::templates::get_latest_template,
        crate::routes::templates::update_template,
        // Policies
        crate::routes::policies::create_policy,
        crate::routes::policies::list_policies,
        crate::routes::policies::get_policy,
        crate::routes::policies::update_policy,
        crate::routes::policies::update_approval,
        crate::routes::policies::delete_policy,
        // Configurations
        crate::routes::configurations::create_configuration,
        crate::routes::configurations::list_configurations,
        crate::routes::configurations::get_configuration,
        crate::routes::configurations::update_configuration,
        // Acknowledgements
        crate::routes::acknowledgements::submit_acknowledgement,
        crate::routes::acknowledgements::list_acknowledgements,
        crate::routes::acknowledgements::get_acknowledgement,
        crate::routes::acknowledgements::save_acknowledgement,
        crate::routes::acknowledgements::acknowledge,
        crate::routes::acknowledgements::get_history,
        crate::routes::acknowledgements::sweep_escalations,
    ),
    components(schemas(
        // Records
        crate::state::CustomerRecord,
        crate::state::ComplianceRecord,
        crate::state::CustomerComplianceRecord,
        crate::state::EmployeeRecord,
        crate::routes::templates::TemplateView,
        crate::routes::policies::PolicyView,
        crate::routes::configurations::ConfigurationView,
        crate::routes::acknowledgements::AcknowledgementView,
        crate::routes::acknowledgements::HistoryView,
        crate::orchestration::EscalationReport,
        // Error types
        crate::error::ErrorBody,
        crate::error::ErrorDetail,
        // Request DTOs
        crate::routes::customers::CreateCustomerRequest,
        crate::routes::customers::UpdateCustomerRequest,
        crate::routes::compliances::CreateComplianceRequest,
        crate::routes::compliances::UpdateComplianceRequest,
        crate::routes::customer_compliance::CreateCustomerComplianceRequest,
        crate::routes::customer_compliance::UpdateCustomerComplianceRequest,
        crate::routes::employees::CreateEmployeeRequest,
        crate::routes::employees::UpdateEmployeeRequest,
        crate::routes::templates::PublishTemplateRequest,
        crate::routes::templates::UpdateTemplateRequest,
        crate::routes::policies::CreatePolicyRequest,
        crate::routes::policies::UpdatePolicyRequest,
        crate::routes::policies::UpdateApprovalRequest,
        crate::routes::configurations::CreateConfigurationRequest,
        crate::routes::configurations::UpdateConfigurationRequest,
        crate::routes::acknowledgements::SubmitAcknowledgementRequest,
        crate::routes::acknowledgements::SaveAcknowledgementRequest,
    )),
    tags(
        (name = "customers", description = "Tenant organizations"),
        (name = "compliances", description = "Compliance domains"),
        (name = "customer_compliance", description = "Customer progress per compliance domain"),
        (name = "employees", description = "Employees of a customer"),
        (name = "templates", description = "Versioned policy templates"),
        (name = "policies", description = "Default and custom policies"),
        (name = "configurations", description = "Policy configuration values"),
        (name = "acknowledgements", description = "Acknowledgements, escalation and audit trail"),
    )
)]
pub struct ApiDoc;

/// Serves the document at `/openapi.json`.
pub fn router() -> Router<AppState> {
    Router::new().route("/openapi.json", get(openapi_json))
}

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
