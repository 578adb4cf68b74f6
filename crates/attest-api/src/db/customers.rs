//! Customer persistence. All functions operate on the `customers` table.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::parse_column;
use crate::state::CustomerRecord;

/// Insert or replace a customer row.
pub async fn save(pool: &PgPool, record: &CustomerRecord) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO customers (id, name, subscription_type, is_deleted, deleted_at,
         created_at, updated_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7)
         ON CONFLICT (id) DO UPDATE SET
            name = EXCLUDED.name,
            subscription_type = EXCLUDED.subscription_type,
            is_deleted = EXCLUDED.is_deleted,
            deleted_at = EXCLUDED.deleted_at,
            updated_at = EXCLUDED.updated_at",
    )
    .bind(record.id)
    .bind(&record.name)
    .bind(record.subscription_type.as_str())
    .bind(record.is_deleted)
    .bind(record.deleted_at)
    .bind(record.created_at)
    .bind(record.updated_at)
    .execute(pool)
    .await?;

    Ok(())
}

/// Load every customer, deleted ones included.
pub async fn load_all(pool: &PgPool) -> Result<Vec<CustomerRecord>, sqlx::Error> {
    let rows = sqlx::query_as::<_, CustomerRow>(
        "SELECT id, name, subscription_type, is_deleted, deleted_at, created_at, updated_at
         FROM customers ORDER BY created_at",
    )
    .fetch_all(pool)
    .await?;

    rows.into_iter().map(CustomerRow::into_record).collect()
}

#[derive(sqlx::FromRow)]
struct CustomerRow {
    id: Uuid,
    name: String,
    subscription_type: String,
    is_deleted: bool,
    deleted_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl CustomerRow {
    fn into_record(self) -> Result<CustomerRecord, sqlx::Error> {
        Ok(CustomerRecord {
            id: self.id,
            name: self.name,
            subscription_type: parse_column("subscription_type", &self.subscription_type)?,
            is_deleted: self.is_deleted,
            deleted_at: self.deleted_at,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}
