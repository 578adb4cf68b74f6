//! # Database Persistence Layer
//!
//! Optional Postgres write-through via SQLx.
//!
//! ## Architecture
//!
//! When `DATABASE_URL` is set, every successful mutation is upserted into
//! Postgres and the in-memory stores are hydrated from it at startup. When
//! it is absent the API runs in-memory only (development and tests).
//!
//! Acknowledgement history is insert-only. Template writes rewrite the
//! family's `is_latest` column inside one transaction.

pub mod acknowledgements;
pub mod compliances;
pub mod configurations;
pub mod customer_compliances;
pub mod customers;
pub mod employees;
pub mod history;
pub mod policies;
pub mod templates;

use sqlx::postgres::{PgPool, PgPoolOptions};

/// Initialize the database connection pool and run migrations.
///
/// Returns `None` if `DATABASE_URL` is not set (in-memory-only mode).
/// Returns `Err` if the URL is set but the connection or migration fails.
pub async fn init_pool() -> Result<Option<PgPool>, sqlx::Error> {
    let url = match std::env::var("DATABASE_URL") {
        Ok(url) => url,
        Err(_) => {
            tracing::warn!(
                "DATABASE_URL not set; running in-memory only. State will not survive restarts."
            );
            return Ok(None);
        }
    };

    let pool = PgPoolOptions::new()
        .max_connections(20)
        .min_connections(2)
        .acquire_timeout(std::time::Duration::from_secs(5))
        .connect(&url)
        .await?;

    tracing::info!("Connected to PostgreSQL");

    sqlx::migrate!("./migrations").run(&pool).await?;
    tracing::info!("Database migrations applied");

    Ok(Some(pool))
}

/// Postgres has no unsigned integers; counters and versions are stored as
/// `INTEGER`.
pub(crate) fn to_db_int(value: u32) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}

pub(crate) fn from_db_int(column: &'static str, value: i32) -> Result<u32, sqlx::Error> {
    u32::try_from(value).map_err(|_| decode_error(column, format!("negative value {value}")))
}

/// Parse a stored enum column, surfacing bad values as decode errors.
pub(crate) fn parse_column<T>(column: &'static str, raw: &str) -> Result<T, sqlx::Error>
where
    T: std::str::FromStr<Err = attest_core::AttestError>,
{
    raw.parse().map_err(|e: attest_core::AttestError| decode_error(column, e.to_string()))
}

fn decode_error(column: &'static str, message: String) -> sqlx::Error {
    sqlx::Error::ColumnDecode {
        index: column.to_string(),
        source: message.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use attest_state::EscalationStatus;

    #[test]
    fn int_conversions_clamp_and_reject() {
        assert_eq!(to_db_int(4), 4);
        assert_eq!(to_db_int(u32::MAX), i32::MAX);
        assert_eq!(from_db_int("version", 7).unwrap(), 7);
        assert!(from_db_int("version", -1).is_err());
    }

    #[test]
    fn enum_columns_parse() {
        let status: EscalationStatus = parse_column("escalation_status", "escalated_to_hr").unwrap();
        assert_eq!(status, EscalationStatus::EscalatedToHr);
        assert!(parse_column::<EscalationStatus>("escalation_status", "bogus").is_err());
    }
}
