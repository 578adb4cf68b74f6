//! Policy configuration persistence (`policy_configurations` table).

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use attest_core::{ConfigurationId, PolicyId};
use attest_state::{Policy, PolicyConfiguration};

use super::{from_db_int, parse_column, to_db_int};

/// Insert or replace a configuration row.
pub async fn save(pool: &PgPool, configuration: &PolicyConfiguration) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO policy_configurations (id, policy_id, key, value, version, status,
         created_at, updated_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
         ON CONFLICT (id) DO UPDATE SET
            key = EXCLUDED.key,
            value = EXCLUDED.value,
            status = EXCLUDED.status,
            updated_at = EXCLUDED.updated_at",
    )
    .bind(configuration.id.0)
    .bind(configuration.policy_id.0)
    .bind(&configuration.key)
    .bind(&configuration.value)
    .bind(to_db_int(configuration.version))
    .bind(configuration.status.as_str())
    .bind(configuration.created_at)
    .bind(configuration.updated_at)
    .execute(pool)
    .await?;

    Ok(())
}

/// Insert a new configuration and write its version onto the parent
/// policy in one transaction.
pub async fn insert_with_bump(
    pool: &PgPool,
    configuration: &PolicyConfiguration,
    policy: &Policy,
) -> Result<(), sqlx::Error> {
    let mut tx = pool.begin().await?;

    sqlx::query(
        "INSERT INTO policy_configurations (id, policy_id, key, value, version, status,
         created_at, updated_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
    )
    .bind(configuration.id.0)
    .bind(configuration.policy_id.0)
    .bind(&configuration.key)
    .bind(&configuration.value)
    .bind(to_db_int(configuration.version))
    .bind(configuration.status.as_str())
    .bind(configuration.created_at)
    .bind(configuration.updated_at)
    .execute(&mut *tx)
    .await?;

    sqlx::query("UPDATE policies SET version = $1, updated_at = $2 WHERE id = $3")
        .bind(to_db_int(policy.version))
        .bind(policy.updated_at)
        .bind(policy.id.0)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(())
}

pub async fn load_all(pool: &PgPool) -> Result<Vec<PolicyConfiguration>, sqlx::Error> {
    let rows = sqlx::query_as::<_, ConfigurationRow>(
        "SELECT id, policy_id, key, value, version, status, created_at, updated_at
         FROM policy_configurations ORDER BY created_at",
    )
    .fetch_all(pool)
    .await?;

    rows.into_iter().map(ConfigurationRow::into_configuration).collect()
}

#[derive(sqlx::FromRow)]
struct ConfigurationRow {
    id: Uuid,
    policy_id: Uuid,
    key: String,
    value: String,
    version: i32,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ConfigurationRow {
    fn into_configuration(self) -> Result<PolicyConfiguration, sqlx::Error> {
        Ok(PolicyConfiguration {
            id: ConfigurationId::from_uuid(self.id),
            policy_id: PolicyId::from_uuid(self.policy_id),
            key: self.key,
            value: self.value,
            version: from_db_int("version", self.version)?,
            status: parse_column("status", &self.status)?,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}
