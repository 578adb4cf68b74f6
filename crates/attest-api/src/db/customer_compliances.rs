//! Customer compliance persistence (`customer_compliances` table).

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::{from_db_int, parse_column, to_db_int};
use crate::state::CustomerComplianceRecord;

/// Insert or replace a customer compliance row.
pub async fn save(pool: &PgPool, record: &CustomerComplianceRecord) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO customer_compliances (id, customer_id, compliance_id, status,
         compliance_percentage, audit_date, audit_status, acknowledged_count, pending_count,
         compliance_updated, created_at, updated_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
         ON CONFLICT (id) DO UPDATE SET
            status = EXCLUDED.status,
            compliance_percentage = EXCLUDED.compliance_percentage,
            audit_date = EXCLUDED.audit_date,
            audit_status = EXCLUDED.audit_status,
            acknowledged_count = EXCLUDED.acknowledged_count,
            pending_count = EXCLUDED.pending_count,
            compliance_updated = EXCLUDED.compliance_updated,
            updated_at = EXCLUDED.updated_at",
    )
    .bind(record.id)
    .bind(record.customer_id)
    .bind(record.compliance_id)
    .bind(record.status.as_str())
    .bind(&record.compliance_percentage)
    .bind(record.audit_date)
    .bind(record.audit_status.as_str())
    .bind(to_db_int(record.acknowledged_count))
    .bind(to_db_int(record.pending_count))
    .bind(record.compliance_updated)
    .bind(record.created_at)
    .bind(record.updated_at)
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn load_all(pool: &PgPool) -> Result<Vec<CustomerComplianceRecord>, sqlx::Error> {
    let rows = sqlx::query_as::<_, CustomerComplianceRow>(
        "SELECT id, customer_id, compliance_id, status, compliance_percentage, audit_date,
         audit_status, acknowledged_count, pending_count, compliance_updated,
         created_at, updated_at
         FROM customer_compliances ORDER BY created_at",
    )
    .fetch_all(pool)
    .await?;

    rows.into_iter()
        .map(CustomerComplianceRow::into_record)
        .collect()
}

#[derive(sqlx::FromRow)]
struct CustomerComplianceRow {
    id: Uuid,
    customer_id: Uuid,
    compliance_id: Uuid,
    status: String,
    compliance_percentage: String,
    audit_date: Option<DateTime<Utc>>,
    audit_status: String,
    acknowledged_count: i32,
    pending_count: i32,
    compliance_updated: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl CustomerComplianceRow {
    fn into_record(self) -> Result<CustomerComplianceRecord, sqlx::Error> {
        Ok(CustomerComplianceRecord {
            id: self.id,
            customer_id: self.customer_id,
            compliance_id: self.compliance_id,
            status: parse_column("status", &self.status)?,
            compliance_percentage: self.compliance_percentage,
            audit_date: self.audit_date,
            audit_status: parse_column("audit_status", &self.audit_status)?,
            acknowledged_count: from_db_int("acknowledged_count", self.acknowledged_count)?,
            pending_count: from_db_int("pending_count", self.pending_count)?,
            compliance_updated: self.compliance_updated,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}
