//! Acknowledgement audit trail (`acknowledgement_history` table).
//! Insert-only.

use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use attest_core::{AcknowledgementId, HistoryId};
use attest_state::HistoryRecord;

/// Append one history row.
pub async fn insert(conn: &mut PgConnection, row: &HistoryRecord) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO acknowledgement_history (id, acknowledgement_id, field, old_value,
         new_value, updated_at)
         VALUES ($1, $2, $3, $4, $5, $6)",
    )
    .bind(row.id.0)
    .bind(row.acknowledgement_id.0)
    .bind(&row.field)
    .bind(&row.old_value)
    .bind(&row.new_value)
    .bind(row.updated_at)
    .execute(conn)
    .await?;

    Ok(())
}

/// Every history row, oldest first.
pub async fn load_all(pool: &PgPool) -> Result<Vec<HistoryRecord>, sqlx::Error> {
    let rows = sqlx::query_as::<_, HistoryRow>(
        "SELECT id, acknowledgement_id, field, old_value, new_value, updated_at
         FROM acknowledgement_history ORDER BY updated_at, id",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(HistoryRow::into_record).collect())
}

#[derive(sqlx::FromRow)]
struct HistoryRow {
    id: Uuid,
    acknowledgement_id: Uuid,
    field: String,
    old_value: Option<String>,
    new_value: Option<String>,
    updated_at: DateTime<Utc>,
}

impl HistoryRow {
    fn into_record(self) -> HistoryRecord {
        HistoryRecord {
            id: HistoryId::from_uuid(self.id),
            acknowledgement_id: AcknowledgementId::from_uuid(self.acknowledgement_id),
            field: self.field,
            old_value: self.old_value,
            new_value: self.new_value,
            updated_at: self.updated_at,
        }
    }
}
