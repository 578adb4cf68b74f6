//! Compliance domain persistence. All functions operate on the
//! `compliances` table.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::parse_column;
use crate::state::ComplianceRecord;

/// Insert or replace a compliance row.
pub async fn save(pool: &PgPool, record: &ComplianceRecord) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO compliances (id, compliance_type, compliance_title, description,
         is_deleted, deleted_at, created_at, updated_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
         ON CONFLICT (id) DO UPDATE SET
            compliance_type = EXCLUDED.compliance_type,
            compliance_title = EXCLUDED.compliance_title,
            description = EXCLUDED.description,
            is_deleted = EXCLUDED.is_deleted,
            deleted_at = EXCLUDED.deleted_at,
            updated_at = EXCLUDED.updated_at",
    )
    .bind(record.id)
    .bind(record.compliance_type.as_str())
    .bind(&record.compliance_title)
    .bind(&record.description)
    .bind(record.is_deleted)
    .bind(record.deleted_at)
    .bind(record.created_at)
    .bind(record.updated_at)
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn load_all(pool: &PgPool) -> Result<Vec<ComplianceRecord>, sqlx::Error> {
    let rows = sqlx::query_as::<_, ComplianceRow>(
        "SELECT id, compliance_type, compliance_title, description, is_deleted, deleted_at,
         created_at, updated_at
         FROM compliances ORDER BY created_at",
    )
    .fetch_all(pool)
    .await?;

    rows.into_iter().map(ComplianceRow::into_record).collect()
}

#[derive(sqlx::FromRow)]
struct ComplianceRow {
    id: Uuid,
    compliance_type: String,
    compliance_title: String,
    description: Option<String>,
    is_deleted: bool,
    deleted_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ComplianceRow {
    fn into_record(self) -> Result<ComplianceRecord, sqlx::Error> {
        Ok(ComplianceRecord {
            id: self.id,
            compliance_type: parse_column("compliance_type", &self.compliance_type)?,
            compliance_title: self.compliance_title,
            description: self.description,
            is_deleted: self.is_deleted,
            deleted_at: self.deleted_at,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}
