//! `Idempotency-Key` header parsing for mutating handlers.

use actix_web::http::header::HeaderMap;
use serde_json::json;

use crate::domain::{Error, IdempotencyKey, IdempotencyKeyValidationError};

/// HTTP header name for idempotency keys.
pub const IDEMPOTENCY_KEY_HEADER: &str = "Idempotency-Key";

/// Extract the idempotency key from request headers.
///
/// A missing header is not an error: the request simply runs without replay
/// protection.
pub fn extract_idempotency_key(
    headers: &HeaderMap,
) -> Result<Option<IdempotencyKey>, IdempotencyKeyValidationError> {
    let Some(header_value) = headers.get(IDEMPOTENCY_KEY_HEADER) else {
        return Ok(None);
    };

    let key_str = header_value
        .to_str()
        .map_err(|_| IdempotencyKeyValidationError::InvalidKey)?;

    IdempotencyKey::new(key_str).map(Some)
}

/// Map idempotency key validation errors to domain errors.
pub fn map_idempotency_key_error(err: IdempotencyKeyValidationError) -> Error {
    let message = match err {
        IdempotencyKeyValidationError::EmptyKey => "idempotency-key header must not be empty",
        IdempotencyKeyValidationError::InvalidKey => "idempotency-key header must be a valid uuid",
    };
    Error::invalid_request(message)
        .with_details(json!({ "field": IDEMPOTENCY_KEY_HEADER, "code": "invalid_idempotency_key" }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::header::{HeaderName, HeaderValue};
    use rstest::rstest;

    fn headers_with(value: Option<&'static str>) -> HeaderMap {
        let mut headers = HeaderMap::new();
        if let Some(value) = value {
            headers.insert(
                HeaderName::from_static("idempotency-key"),
                HeaderValue::from_static(value),
            );
        }
        headers
    }

    #[rstest]
    fn absent_header_yields_none() {
        let key = extract_idempotency_key(&headers_with(None)).expect("absent header is fine");
        assert!(key.is_none());
    }

    #[rstest]
    fn valid_uuid_is_accepted() {
        let key = extract_idempotency_key(&headers_with(Some(
            "550e8400-e29b-41d4-a716-446655440000",
        )))
        .expect("valid key")
        .expect("present");
        assert_eq!(key.as_ref(), "550e8400-e29b-41d4-a716-446655440000");
    }

    #[rstest]
    #[case("", IdempotencyKeyValidationError::EmptyKey)]
    #[case("not-a-uuid", IdempotencyKeyValidationError::InvalidKey)]
    fn malformed_values_are_rejected(
        #[case] raw: &'static str,
        #[case] expected: IdempotencyKeyValidationError,
    ) {
        let err = extract_idempotency_key(&headers_with(Some(raw))).expect_err("must fail");
        assert_eq!(err, expected);
        let mapped = map_idempotency_key_error(err);
        assert_eq!(mapped.code(), crate::domain::ErrorCode::InvalidRequest);
    }
}
