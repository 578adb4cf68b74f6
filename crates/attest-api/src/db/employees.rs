//! Employee persistence (`employees` table).

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::parse_column;
use crate::state::EmployeeRecord;

/// Insert or replace an employee row.
pub async fn save(pool: &PgPool, record: &EmployeeRecord) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO employees (id, customer_id, name, email, role, status, join_date,
         created_at, updated_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
         ON CONFLICT (id) DO UPDATE SET
            name = EXCLUDED.name,
            email = EXCLUDED.email,
            role = EXCLUDED.role,
            status = EXCLUDED.status,
            join_date = EXCLUDED.join_date,
            updated_at = EXCLUDED.updated_at",
    )
    .bind(record.id)
    .bind(record.customer_id)
    .bind(&record.name)
    .bind(&record.email)
    .bind(&record.role)
    .bind(record.status.as_str())
    .bind(record.join_date)
    .bind(record.created_at)
    .bind(record.updated_at)
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn load_all(pool: &PgPool) -> Result<Vec<EmployeeRecord>, sqlx::Error> {
    let rows = sqlx::query_as::<_, EmployeeRow>(
        "SELECT id, customer_id, name, email, role, status, join_date, created_at, updated_at
         FROM employees ORDER BY created_at",
    )
    .fetch_all(pool)
    .await?;

    rows.into_iter().map(EmployeeRow::into_record).collect()
}

#[derive(sqlx::FromRow)]
struct EmployeeRow {
    id: Uuid,
    customer_id: Uuid,
    name: String,
    email: String,
    role: String,
    status: String,
    join_date: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl EmployeeRow {
    fn into_record(self) -> Result<EmployeeRecord, sqlx::Error> {
        Ok(EmployeeRecord {
            id: self.id,
            customer_id: self.customer_id,
            name: self.name,
            email: self.email,
            role: self.role,
            status: parse_column("status", &self.status)?,
            join_date: self.join_date,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}
