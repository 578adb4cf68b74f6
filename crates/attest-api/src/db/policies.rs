//! Policy persistence (`policies` table).

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use attest_core::{CustomerComplianceId, EmployeeId, PolicyId, TemplateId};
use attest_state::Policy;

use super::{from_db_int, parse_column, to_db_int};

/// Insert or replace a policy row.
pub async fn save(pool: &PgPool, policy: &Policy) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO policies (id, policy_type, title, description, customer_compliance_id,
         template_id, created_by, version, document_link, approval_status, approved_by,
         approved_at, approval_requested_at, is_deleted, created_at, updated_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
         ON CONFLICT (id) DO UPDATE SET
            title = EXCLUDED.title,
            description = EXCLUDED.description,
            customer_compliance_id = EXCLUDED.customer_compliance_id,
            template_id = EXCLUDED.template_id,
            version = EXCLUDED.version,
            document_link = EXCLUDED.document_link,
            approval_status = EXCLUDED.approval_status,
            approved_by = EXCLUDED.approved_by,
            approved_at = EXCLUDED.approved_at,
            is_deleted = EXCLUDED.is_deleted,
            updated_at = EXCLUDED.updated_at",
    )
    .bind(policy.id.0)
    .bind(policy.policy_type.as_str())
    .bind(&policy.title)
    .bind(&policy.description)
    .bind(policy.customer_compliance.map(|id| id.0))
    .bind(policy.template.map(|id| id.0))
    .bind(policy.created_by.map(|id| id.0))
    .bind(to_db_int(policy.version))
    .bind(&policy.document_link)
    .bind(policy.approval_status.as_str())
    .bind(policy.approved_by.map(|id| id.0))
    .bind(policy.approved_at)
    .bind(policy.approval_requested_at)
    .bind(policy.is_deleted)
    .bind(policy.created_at)
    .bind(policy.updated_at)
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn load_all(pool: &PgPool) -> Result<Vec<Policy>, sqlx::Error> {
    let rows = sqlx::query_as::<_, PolicyRow>(
        "SELECT id, policy_type, title, description, customer_compliance_id, template_id,
         created_by, version, document_link, approval_status, approved_by, approved_at,
         approval_requested_at, is_deleted, created_at, updated_at
         FROM policies ORDER BY created_at",
    )
    .fetch_all(pool)
    .await?;

    rows.into_iter().map(PolicyRow::into_policy).collect()
}

#[derive(sqlx::FromRow)]
struct PolicyRow {
    id: Uuid,
    policy_type: String,
    title: String,
    description: Option<String>,
    customer_compliance_id: Option<Uuid>,
    template_id: Option<Uuid>,
    created_by: Option<Uuid>,
    version: i32,
    document_link: Option<String>,
    approval_status: String,
    approved_by: Option<Uuid>,
    approved_at: Option<DateTime<Utc>>,
    approval_requested_at: DateTime<Utc>,
    is_deleted: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl PolicyRow {
    fn into_policy(self) -> Result<Policy, sqlx::Error> {
        Ok(Policy {
            id: PolicyId::from_uuid(self.id),
            policy_type: parse_column("policy_type", &self.policy_type)?,
            title: self.title,
            description: self.description,
            customer_compliance: self.customer_compliance_id.map(CustomerComplianceId::from_uuid),
            template: self.template_id.map(TemplateId::from_uuid),
            created_by: self.created_by.map(EmployeeId::from_uuid),
            version: from_db_int("version", self.version)?,
            document_link: self.document_link,
            approval_status: parse_column("approval_status", &self.approval_status)?,
            approved_by: self.approved_by.map(EmployeeId::from_uuid),
            approved_at: self.approved_at,
            approval_requested_at: self.approval_requested_at,
            created_at: self.created_at,
            updated_at: self.updated_at,
            is_deleted: self.is_deleted,
        })
    }
}
