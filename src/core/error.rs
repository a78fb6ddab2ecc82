//! Typed error handling for query resolution
//!
//! Caller-input faults ([`QueryError::UnknownParameter`], [`QueryError::Conversion`],
//! [`QueryError::Arity`]) are raised before any repository call is issued.
//! Backend failures are carried opaquely in [`QueryError::Backend`].
//!
//! # Example
//!
//! ```rust,ignore
//! match dispatcher.resolve(&request).await {
//!     Ok(response) => render(response),
//!     Err(QueryError::UnknownParameter { parameter }) => {
//!         println!("no such filter: {}", parameter);
//!     }
//!     Err(e) => eprintln!("query failed: {}", e),
//! }
//! ```

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use thiserror::Error;

use crate::core::field::FieldType;
use crate::core::predicate::Operator;

/// Failure to turn a raw string into a typed value
#[derive(Debug, Clone, Error, PartialEq)]
#[error("cannot convert '{value}' to {target_type}: {message}")]
pub struct ConversionError {
    pub value: String,
    pub target_type: FieldType,
    pub message: String,
}

impl ConversionError {
    pub fn new(value: &str, target_type: &FieldType, message: impl Into<String>) -> Self {
        Self {
            value: value.to_string(),
            target_type: target_type.clone(),
            message: message.into(),
        }
    }
}

/// The error type returned by criteria building and request dispatch
#[derive(Debug, Error)]
pub enum QueryError {
    /// A filter name that the entity does not declare
    #[error("Invalid request parameter: {parameter}")]
    UnknownParameter { parameter: String },

    /// A raw value that does not parse as the target field's type
    #[error("Cannot convert '{parameter}' value '{value}' to {target_type}: {message}")]
    Conversion {
        parameter: String,
        target_type: FieldType,
        value: String,
        message: String,
    },

    /// Fewer raw values than the operator requires
    #[error("'{parameter}' ({operator}) needs {expected} value(s), got {actual}")]
    Arity {
        parameter: String,
        operator: Operator,
        expected: usize,
        actual: usize,
    },

    /// A predicate payload whose shape does not fit its operator
    #[error("Payload does not match the arity of operator {operator} on field '{field}'")]
    PayloadMismatch { field: String, operator: Operator },

    /// A find-one request matched nothing
    #[error("No {entity_type} matches the request")]
    NotFound { entity_type: String },

    /// Opaque storage backend failure
    #[error("Backend error: {0}")]
    Backend(#[source] anyhow::Error),
}

/// Error response structure for HTTP responses
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error code for programmatic handling
    pub code: String,
    /// Human-readable error message
    pub message: String,
    /// Optional additional details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl QueryError {
    /// Wrap a conversion failure with the parameter it came from
    pub fn conversion(parameter: &str, err: ConversionError) -> Self {
        QueryError::Conversion {
            parameter: parameter.to_string(),
            target_type: err.target_type,
            value: err.value,
            message: err.message,
        }
    }

    /// Whether the error was caused by the caller's input
    pub fn is_caller_error(&self) -> bool {
        matches!(
            self,
            QueryError::UnknownParameter { .. }
                | QueryError::Conversion { .. }
                | QueryError::Arity { .. }
                | QueryError::NotFound { .. }
        )
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            QueryError::UnknownParameter { .. }
            | QueryError::Conversion { .. }
            | QueryError::Arity { .. } => StatusCode::BAD_REQUEST,
            QueryError::NotFound { .. } => StatusCode::NOT_FOUND,
            QueryError::PayloadMismatch { .. } | QueryError::Backend(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Get the error code for this error
    pub fn error_code(&self) -> &'static str {
        match self {
            QueryError::UnknownParameter { .. } => "UNKNOWN_PARAMETER",
            QueryError::Conversion { .. } => "CONVERSION_ERROR",
            QueryError::Arity { .. } => "ARITY_ERROR",
            QueryError::PayloadMismatch { .. } => "PAYLOAD_MISMATCH",
            QueryError::NotFound { .. } => "NOT_FOUND",
            QueryError::Backend(_) => "BACKEND_ERROR",
        }
    }

    /// Convert to an error response
    pub fn to_response(&self) -> ErrorResponse {
        ErrorResponse {
            code: self.error_code().to_string(),
            message: self.to_string(),
            details: self.details(),
        }
    }

    fn details(&self) -> Option<serde_json::Value> {
        match self {
            QueryError::UnknownParameter { parameter } => {
                Some(serde_json::json!({ "parameter": parameter }))
            }
            QueryError::Conversion {
                parameter,
                target_type,
                value,
                ..
            } => Some(serde_json::json!({
                "parameter": parameter,
                "target_type": target_type.to_string(),
                "value": value,
            })),
            QueryError::NotFound { entity_type } => {
                Some(serde_json::json!({ "entity_type": entity_type }))
            }
            QueryError::Arity {
                parameter,
                operator,
                expected,
                actual,
            } => Some(serde_json::json!({
                "parameter": parameter,
                "operator": operator,
                "expected": expected,
                "actual": actual,
            })),
            _ => None,
        }
    }
}

impl IntoResponse for QueryError {
    fn into_response(self) -> Response {
        if self.is_caller_error() {
            tracing::debug!(code = self.error_code(), "rejecting query: {}", self);
        } else {
            tracing::error!(code = self.error_code(), "query failed: {}", self);
        }
        let status = self.status_code();
        let body = Json(self.to_response());
        (status, body).into_response()
    }
}
