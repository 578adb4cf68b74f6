//! Acknowledgement persistence (`acknowledgements` table).
//!
//! `due_date` is written on insert only; the upsert never touches it.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use attest_core::{AcknowledgementId, EmployeeId, PolicyId};
use attest_state::{Acknowledgement, HistoryRecord};

use super::{from_db_int, parse_column, to_db_int};

/// Upsert an acknowledgement and, if the save produced one, append its
/// history row in the same transaction.
pub async fn save(
    pool: &PgPool,
    ack: &Acknowledgement,
    history: Option<&HistoryRecord>,
) -> Result<(), sqlx::Error> {
    let mut tx = pool.begin().await?;

    sqlx::query(
        "INSERT INTO acknowledgements (id, policy_id, employee_id, policy_version,
         acknowledgement_type, status, escalation_status, due_date, acknowledged_at,
         created_at, updated_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
         ON CONFLICT (id) DO UPDATE SET
            status = EXCLUDED.status,
            escalation_status = EXCLUDED.escalation_status,
            acknowledged_at = EXCLUDED.acknowledged_at,
            updated_at = EXCLUDED.updated_at",
    )
    .bind(ack.id.0)
    .bind(ack.policy_id.0)
    .bind(ack.employee_id.0)
    .bind(to_db_int(ack.policy_version))
    .bind(ack.acknowledgement_type.as_str())
    .bind(ack.status.as_str())
    .bind(ack.escalation_status.as_str())
    .bind(ack.due_date)
    .bind(ack.acknowledged_at)
    .bind(ack.created_at)
    .bind(ack.updated_at)
    .execute(&mut *tx)
    .await?;

    if let Some(row) = history {
        super::history::insert(&mut *tx, row).await?;
    }

    tx.commit().await?;
    Ok(())
}

pub async fn load_all(pool: &PgPool) -> Result<Vec<Acknowledgement>, sqlx::Error> {
    let rows = sqlx::query_as::<_, AcknowledgementRow>(
        "SELECT id, policy_id, employee_id, policy_version, acknowledgement_type, status,
         escalation_status, due_date, acknowledged_at, created_at, updated_at
         FROM acknowledgements ORDER BY created_at",
    )
    .fetch_all(pool)
    .await?;

    rows.into_iter().map(AcknowledgementRow::into_acknowledgement).collect()
}

#[derive(sqlx::FromRow)]
struct AcknowledgementRow {
    id: Uuid,
    policy_id: Uuid,
    employee_id: Uuid,
    policy_version: i32,
    acknowledgement_type: String,
    status: String,
    escalation_status: String,
    due_date: DateTime<Utc>,
    acknowledged_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl AcknowledgementRow {
    fn into_acknowledgement(self) -> Result<Acknowledgement, sqlx::Error> {
        Ok(Acknowledgement {
            id: AcknowledgementId::from_uuid(self.id),
            policy_id: PolicyId::from_uuid(self.policy_id),
            employee_id: EmployeeId::from_uuid(self.employee_id),
            policy_version: from_db_int("policy_version", self.policy_version)?,
            acknowledgement_type: parse_column("acknowledgement_type", &self.acknowledgement_type)?,
            status: parse_column("status", &self.status)?,
            escalation_status: parse_column("escalation_status", &self.escalation_status)?,
            due_date: self.due_date,
            acknowledged_at: self.acknowledged_at,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}
