//! Template persistence (`templates` table).
//!
//! The in-memory catalog derives "latest" from its family pointer; the
//! table stores it as a flag. Every write clears the family's flag and
//! sets it on the current holder inside one transaction, which keeps the
//! partial unique index on `(name) WHERE is_latest` satisfied.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use attest_core::TemplateId;
use attest_state::TemplateVersion;

use super::{from_db_int, to_db_int};

/// Upsert `version` and rewrite its family's `is_latest` column so that
/// only `family_latest` carries it.
pub async fn save(
    pool: &PgPool,
    version: &TemplateVersion,
    family_latest: Option<TemplateId>,
) -> Result<(), sqlx::Error> {
    let mut tx = pool.begin().await?;

    sqlx::query("UPDATE templates SET is_latest = FALSE WHERE name = $1 AND is_latest")
        .bind(&version.name)
        .execute(&mut *tx)
        .await?;

    sqlx::query(
        "INSERT INTO templates (id, name, description, document_link, version_number,
         is_latest, is_active, change_log, created_at, updated_at)
         VALUES ($1, $2, $3, $4, $5, FALSE, $6, $7, $8, $9)
         ON CONFLICT (id) DO UPDATE SET
            description = EXCLUDED.description,
            document_link = EXCLUDED.document_link,
            is_active = EXCLUDED.is_active,
            change_log = EXCLUDED.change_log,
            updated_at = EXCLUDED.updated_at",
    )
    .bind(version.id.0)
    .bind(&version.name)
    .bind(&version.description)
    .bind(&version.document_link)
    .bind(to_db_int(version.version_number))
    .bind(version.is_active)
    .bind(&version.change_log)
    .bind(version.created_at)
    .bind(version.updated_at)
    .execute(&mut *tx)
    .await?;

    if let Some(latest) = family_latest {
        sqlx::query("UPDATE templates SET is_latest = TRUE WHERE id = $1")
            .bind(latest.0)
            .execute(&mut *tx)
            .await?;
    }

    tx.commit().await?;
    Ok(())
}

/// Load every version with its stored latest flag, oldest first.
pub async fn load_all(pool: &PgPool) -> Result<Vec<(TemplateVersion, bool)>, sqlx::Error> {
    let rows = sqlx::query_as::<_, TemplateRow>(
        "SELECT id, name, description, document_link, version_number, is_latest, is_active,
         change_log, created_at, updated_at
         FROM templates ORDER BY name, version_number",
    )
    .fetch_all(pool)
    .await?;

    rows.into_iter().map(TemplateRow::into_version).collect()
}

#[derive(sqlx::FromRow)]
struct TemplateRow {
    id: Uuid,
    name: String,
    description: Option<String>,
    document_link: Option<String>,
    version_number: i32,
    is_latest: bool,
    is_active: bool,
    change_log: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TemplateRow {
    fn into_version(self) -> Result<(TemplateVersion, bool), sqlx::Error> {
        let version = TemplateVersion {
            id: TemplateId::from_uuid(self.id),
            name: self.name,
            description: self.description,
            document_link: self.document_link,
            version_number: from_db_int("version_number", self.version_number)?,
            is_active: self.is_active,
            change_log: self.change_log,
            created_at: self.created_at,
            updated_at: self.updated_at,
        };
        Ok((version, self.is_latest))
    }
}
