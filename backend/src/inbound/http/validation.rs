//! Shared validation helpers for inbound HTTP adapters.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer};
use serde_json::json;
use uuid::Uuid;

use crate::domain::Error;

/// Validation error codes for HTTP request failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ErrorCode {
    MissingField,
    InvalidUuid,
    InvalidTimestamp,
    InvalidDate,
    InvalidValue,
}

impl ErrorCode {
    fn as_str(self) -> &'static str {
        match self {
            ErrorCode::MissingField => "missing_field",
            ErrorCode::InvalidUuid => "invalid_uuid",
            ErrorCode::InvalidTimestamp => "invalid_timestamp",
            ErrorCode::InvalidDate => "invalid_date",
            ErrorCode::InvalidValue => "invalid_value",
        }
    }
}

/// Newtype wrapper for HTTP field names to provide type safety.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct FieldName(&'static str);

impl FieldName {
    pub(crate) const fn new(name: &'static str) -> Self {
        Self(name)
    }

    fn as_str(&self) -> &str {
        self.0
    }
}

/// Builder for validation errors with field context.
struct ValidationError {
    field: String,
    message: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }

    fn with_code(self, code: ErrorCode) -> Error {
        Error::invalid_request(self.message).with_details(json!({
            "field": self.field,
            "code": code.as_str(),
        }))
    }

    fn with_value(self, code: ErrorCode, value: impl Into<String>) -> Error {
        Error::invalid_request(self.message).with_details(json!({
            "field": self.field,
            "value": value.into(),
            "code": code.as_str(),
        }))
    }
}

pub(crate) fn missing_field_error(field: FieldName) -> Error {
    let field = field.as_str();
    ValidationError::new(field, format!("missing required field: {field}"))
        .with_code(ErrorCode::MissingField)
}

/// A domain validation failure reported against one request field.
pub(crate) fn field_error(field: FieldName, error: impl std::fmt::Display) -> Error {
    ValidationError::new(field.as_str(), error.to_string()).with_code(ErrorCode::InvalidValue)
}

pub(crate) fn invalid_uuid_error(field: FieldName, value: &str) -> Error {
    let field = field.as_str();
    ValidationError::new(field, format!("{field} must be a valid UUID"))
        .with_value(ErrorCode::InvalidUuid, value)
}

pub(crate) fn parse_uuid(value: &str, field: FieldName) -> Result<Uuid, Error> {
    Uuid::parse_str(value).map_err(|_| invalid_uuid_error(field, value))
}

pub(crate) fn invalid_timestamp_error(field: FieldName, value: &str) -> Error {
    let field = field.as_str();
    ValidationError::new(field, format!("{field} must be an RFC 3339 timestamp"))
        .with_value(ErrorCode::InvalidTimestamp, value)
}

pub(crate) fn parse_rfc3339_timestamp(
    value: &str,
    field: FieldName,
) -> Result<DateTime<Utc>, Error> {
    DateTime::parse_from_rfc3339(value)
        .map(|timestamp| timestamp.with_timezone(&Utc))
        .map_err(|_| invalid_timestamp_error(field, value))
}

pub(crate) fn parse_optional_rfc3339_timestamp(
    value: Option<&str>,
    field: FieldName,
) -> Result<Option<DateTime<Utc>>, Error> {
    value
        .map(|raw| parse_rfc3339_timestamp(raw, field))
        .transpose()
}

pub(crate) fn parse_date(value: &str, field: FieldName) -> Result<NaiveDate, Error> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|_| {
        let name = field.as_str();
        ValidationError::new(name, format!("{name} must be a YYYY-MM-DD date"))
            .with_value(ErrorCode::InvalidDate, value)
    })
}

/// Deserialise a field that distinguishes "absent" (`None`) from an explicit
/// `null` (`Some(None)`). Use with `#[serde(default)]`.
pub(crate) fn nullable<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ErrorCode as ApiErrorCode;
    use rstest::rstest;
    use serde_json::Value;

    const FIELD: FieldName = FieldName::new("scheduledAt");

    fn detail<'a>(error: &'a Error, key: &str) -> Option<&'a str> {
        error.details().and_then(|d| d.get(key)).and_then(Value::as_str)
    }

    #[rstest]
    fn missing_fields_name_the_field() {
        let error = missing_field_error(FIELD);
        assert_eq!(error.code(), ApiErrorCode::InvalidRequest);
        assert_eq!(error.message(), "missing required field: scheduledAt");
        assert_eq!(detail(&error, "code"), Some("missing_field"));
    }

    #[rstest]
    #[case("2026-03-01T08:00:00Z", true)]
    #[case("2026-03-01T16:00:00+08:00", true)]
    #[case("2026-03-01 08:00", false)]
    #[case("tomorrow", false)]
    fn timestamps_must_be_rfc3339(#[case] raw: &str, #[case] valid: bool) {
        let parsed = parse_rfc3339_timestamp(raw, FIELD);
        assert_eq!(parsed.is_ok(), valid);
        if let Err(error) = parsed {
            assert_eq!(detail(&error, "value"), Some(raw));
            assert_eq!(detail(&error, "code"), Some("invalid_timestamp"));
        }
    }

    #[rstest]
    fn offsets_are_normalised_to_utc() {
        let parsed = parse_rfc3339_timestamp("2026-03-01T16:00:00+08:00", FIELD)
            .expect("valid timestamp");
        assert_eq!(parsed.to_rfc3339(), "2026-03-01T08:00:00+00:00");
    }

    #[rstest]
    #[case("2026-02-28", true)]
    #[case("2026-02-30", false)]
    #[case("28/02/2026", false)]
    fn dates_use_iso_format(#[case] raw: &str, #[case] valid: bool) {
        assert_eq!(parse_date(raw, FieldName::new("productionDate")).is_ok(), valid);
    }

    #[rstest]
    fn bad_uuids_echo_the_value() {
        let error = parse_uuid("abc", FieldName::new("id")).expect_err("invalid");
        assert_eq!(detail(&error, "value"), Some("abc"));
        assert_eq!(error.message(), "id must be a valid UUID");
    }

    #[derive(Debug, serde::Deserialize)]
    struct Patch {
        #[serde(default, deserialize_with = "nullable")]
        usage: Option<Option<String>>,
    }

    #[rstest]
    #[case("{}", None)]
    #[case(r#"{"usage":null}"#, Some(None))]
    #[case(r#"{"usage":"twice daily"}"#, Some(Some("twice daily")))]
    fn nullable_fields_distinguish_absent_from_null(
        #[case] json: &str,
        #[case] expected: Option<Option<&str>>,
    ) {
        let patch: Patch = serde_json::from_str(json).expect("valid patch");
        assert_eq!(
            patch.usage.as_ref().map(|inner| inner.as_deref()),
            expected
        );
    }
}
