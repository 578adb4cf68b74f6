//! # Request Extraction & Validation
//!
//! The [`Validate`] trait for request DTOs and helpers that turn JSON
//! rejections and business-rule failures into [`AppError`]s.

use axum::extract::rejection::JsonRejection;
use axum::Json;

use crate::error::AppError;

/// Request types that check shape rules serde cannot express.
pub trait Validate {
    fn validate(&self) -> Result<(), String>;
}

/// Extract a JSON body, mapping deserialization errors to [`AppError::BadRequest`].
pub fn extract_json<T>(result: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    result
        .map(|Json(v)| v)
        .map_err(|err| AppError::BadRequest(err.body_text()))
}

/// Extract a JSON body and run its [`Validate`] rules.
pub fn extract_validated_json<T: Validate>(
    result: Result<Json<T>, JsonRejection>,
) -> Result<T, AppError> {
    let value = extract_json(result)?;
    value.validate().map_err(AppError::Validation)?;
    Ok(value)
}

/// Parse an optional wire string into a domain enum.
pub fn parse_opt<T>(raw: Option<&str>) -> Result<Option<T>, AppError>
where
    T: std::str::FromStr<Err = attest_core::AttestError>,
{
    raw.map(str::parse).transpose().map_err(AppError::from)
}

/// Shared check for required text fields.
pub fn require_text(field: &str, value: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        return Err(format!("{field} must not be empty"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use attest_state::ApprovalStatus;

    #[test]
    fn parse_opt_passes_none_through() {
        let parsed: Option<ApprovalStatus> = parse_opt(None).unwrap();
        assert!(parsed.is_none());
    }

    #[test]
    fn parse_opt_rejects_unknown_values() {
        let err = parse_opt::<ApprovalStatus>(Some("maybe")).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn require_text_rejects_whitespace() {
        assert!(require_text("name", "  ").is_err());
        assert!(require_text("name", "Acme").is_ok());
    }
}
