//! Shared validation helpers for inbound HTTP adapters.
//!
//! Request bodies are decoded leniently (every field optional) so that a
//! missing field produces the panel's error schema rather than a bare
//! deserialisation failure.

use serde_json::json;

use crate::domain::{Error, ForwardPrefix};

/// Validation error codes for HTTP request failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ErrorCode {
    MissingField,
    InvalidId,
    InvalidForwardPrefix,
}

impl ErrorCode {
    fn as_str(self) -> &'static str {
        match self {
            ErrorCode::MissingField => "missing_field",
            ErrorCode::InvalidId => "invalid_id",
            ErrorCode::InvalidForwardPrefix => "invalid_forward_prefix",
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

pub(crate) fn require<T>(value: Option<T>, field: FieldName) -> Result<T, Error> {
    value.ok_or_else(|| missing_field_error(field))
}

/// Database identifiers are positive.
pub(crate) fn parse_positive_id(value: i64, field: FieldName) -> Result<i64, Error> {
    if value > 0 {
        Ok(value)
    } else {
        let name = field.as_str();
        Err(
            ValidationError::new(name, format!("{name} must be a positive identifier"))
                .with_value(ErrorCode::InvalidId, value.to_string()),
        )
    }
}

pub(crate) fn parse_forward_prefix(value: &str, field: FieldName) -> Result<ForwardPrefix, Error> {
    value.parse().map_err(|_| {
        let name = field.as_str();
        ValidationError::new(name, format!("{name} must be one of http://, https://, ftp://"))
            .with_value(ErrorCode::InvalidForwardPrefix, value)
    })
}
