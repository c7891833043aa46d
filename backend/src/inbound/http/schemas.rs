//! OpenAPI stand-ins for domain types.
//!
//! The domain does not derive `ToSchema`; these mirrors are registered under
//! the domain type names instead.

use utoipa::ToSchema;

/// OpenAPI schema for [`crate::domain::ErrorCode`].
///
/// Stable machine-readable error codes returned in API error responses.
#[derive(ToSchema)]
#[schema(as = crate::domain::ErrorCode)]
pub enum ErrorCodeSchema {
    /// The request is malformed or fails validation.
    #[schema(rename = "invalid_request")]
    InvalidRequest,
    /// Authentication failed or is missing.
    #[schema(rename = "unauthorized")]
    Unauthorized,
    /// Authenticated but not permitted to perform this action.
    #[schema(rename = "forbidden")]
    Forbidden,
    /// The requested resource does not exist.
    #[schema(rename = "not_found")]
    NotFound,
    /// The request conflicts with existing state.
    #[schema(rename = "conflict")]
    Conflict,
    /// A dependency such as the database or an SMS gateway is unavailable.
    #[schema(rename = "service_unavailable")]
    ServiceUnavailable,
    /// An unexpected error occurred on the server.
    #[schema(rename = "internal_error")]
    InternalError,
}

/// OpenAPI schema for [`crate::domain::Error`], the body of every non-2xx
/// response.
#[derive(ToSchema)]
#[schema(as = crate::domain::Error, rename_all = "camelCase")]
#[expect(
    dead_code,
    reason = "Used only for OpenAPI schema generation via utoipa"
)]
pub struct ErrorSchema {
    /// Stable machine-readable error code.
    #[schema(example = "invalid_request")]
    code: ErrorCodeSchema,
    /// Human-readable message returned to clients.
    #[schema(example = "Something went wrong")]
    message: String,
    /// Correlation identifier for tracing this error across systems.
    #[schema(example = "3fa85f64-5717-4562-b3fc-2c963f66afa6")]
    trace_id: Option<String>,
    /// Field-level context, e.g. `{"field": "scheduledAt", "code": "invalid_timestamp"}`.
    details: Option<serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::Value;
    use utoipa::PartialSchema;

    fn schema_json<T: PartialSchema>() -> Value {
        serde_json::to_value(T::schema()).expect("schema serialises to JSON")
    }

    #[rstest]
    fn schemas_are_named_after_domain_types() {
        // utoipa replaces :: with . in schema names
        assert_eq!(ErrorCodeSchema::name(), "crate.domain.ErrorCode");
        assert_eq!(ErrorSchema::name(), "crate.domain.Error");
    }

    #[rstest]
    #[case(crate::domain::ErrorCode::InvalidRequest)]
    #[case(crate::domain::ErrorCode::Unauthorized)]
    #[case(crate::domain::ErrorCode::Forbidden)]
    #[case(crate::domain::ErrorCode::NotFound)]
    #[case(crate::domain::ErrorCode::Conflict)]
    #[case(crate::domain::ErrorCode::ServiceUnavailable)]
    #[case(crate::domain::ErrorCode::InternalError)]
    fn every_domain_code_is_documented(#[case] code: crate::domain::ErrorCode) {
        let wire = serde_json::to_value(code).expect("code serialises");
        let documented = schema_json::<ErrorCodeSchema>().to_string();
        let name = wire.as_str().expect("codes serialise as strings");
        assert!(documented.contains(name), "{name} missing from schema");
    }

    #[rstest]
    #[case("code")]
    #[case("message")]
    #[case("traceId")]
    #[case("details")]
    fn error_schema_lists_wire_fields(#[case] field: &str) {
        let schema = schema_json::<ErrorSchema>();
        assert!(
            schema["properties"].get(field).is_some(),
            "{field} missing from error schema"
        );
    }
}
