//! Error responses.
//!
//! Every failure that reaches the client goes through [`AppError`], which
//! renders as `{"detail": ...}`: a plain message for routing and handler
//! errors, the list of findings for validation errors.

use axum::{
    Json,
    http::{HeaderValue, Method, StatusCode, header::ALLOW},
    response::{IntoResponse, Response},
};
use parambind_core::{BoundError, DispatchError, Finding, ShapeError, ValidationError};
use serde::Serialize;
use std::fmt;

/// Payload of the `detail` key.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Detail {
    /// Human-readable message
    Message(String),
    /// Validation findings
    Findings(Vec<Finding>),
}

/// Application error type for endpoints and dispatch.
///
/// # Examples
///
/// ```
/// use axum::http::StatusCode;
/// use parambind_web::AppError;
///
/// let err = AppError::new(StatusCode::NOT_FOUND, "Item not found");
/// assert_eq!(err.status(), StatusCode::NOT_FOUND);
/// assert_eq!(err.to_string(), "404 Not Found: Item not found");
/// ```
#[derive(Debug)]
pub struct AppError {
    status: StatusCode,
    detail: Detail,
    allow: Vec<Method>,
    /// Internal error (logged, never sent to the client)
    source: Option<anyhow::Error>,
}

impl AppError {
    /// Error with a status code and a message.
    #[must_use]
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            detail: Detail::Message(message.into()),
            allow: Vec::new(),
            source: None,
        }
    }

    /// Attach the underlying cause.
    #[must_use]
    pub fn with_source(mut self, source: anyhow::Error) -> Self {
        self.source = Some(source);
        self
    }

    /// 400 Bad Request.
    #[must_use]
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    /// 404 with the canonical `Not Found` detail.
    #[must_use]
    pub fn not_found() -> Self {
        Self::new(StatusCode::NOT_FOUND, "Not Found")
    }

    /// 405 listing the methods the path does accept.
    #[must_use]
    pub fn method_not_allowed(allowed: Vec<Method>) -> Self {
        Self {
            allow: allowed,
            ..Self::new(StatusCode::METHOD_NOT_ALLOWED, "Method Not Allowed")
        }
    }

    /// 422 carrying every finding.
    #[must_use]
    pub fn validation(err: ValidationError) -> Self {
        Self {
            status: StatusCode::UNPROCESSABLE_ENTITY,
            detail: Detail::Findings(err.into_findings()),
            allow: Vec::new(),
            source: None,
        }
    }

    /// 500 Internal Server Error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    /// HTTP status.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    /// Response detail.
    #[must_use]
    pub const fn detail(&self) -> &Detail {
        &self.detail
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.detail {
            Detail::Message(message) => write!(f, "{}: {message}", self.status),
            Detail::Findings(findings) => {
                write!(f, "{}: {} validation finding(s)", self.status, findings.len())
            }
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

#[derive(Serialize)]
struct ErrorBody {
    detail: Detail,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            match &self.source {
                Some(source) => tracing::error!(
                    status = %self.status,
                    error = %source,
                    "Internal server error"
                ),
                None => tracing::error!(status = %self.status, "Internal server error"),
            }
        }

        let allow = self
            .allow
            .iter()
            .map(Method::as_str)
            .collect::<Vec<_>>()
            .join(", ");
        let mut response = (self.status, Json(ErrorBody { detail: self.detail })).into_response();
        if !allow.is_empty() {
            if let Ok(value) = HeaderValue::from_str(&allow) {
                response.headers_mut().insert(ALLOW, value);
            }
        }
        response
    }
}

impl From<DispatchError> for AppError {
    fn from(err: DispatchError) -> Self {
        match err {
            DispatchError::NotFound => Self::not_found(),
            DispatchError::MethodNotAllowed(allowed) => Self::method_not_allowed(allowed),
            DispatchError::Validation(findings) => Self::validation(findings),
        }
    }
}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        Self::validation(err)
    }
}

/// A handler reading a value it never declared is a server bug.
impl From<BoundError> for AppError {
    fn from(err: BoundError) -> Self {
        Self::internal("Internal Server Error").with_source(err.into())
    }
}

impl From<ShapeError> for AppError {
    fn from(err: ShapeError) -> Self {
        let findings: Vec<String> = err.0.findings().iter().map(ToString::to_string).collect();
        Self::internal("Internal Server Error")
            .with_source(anyhow::Error::new(err).context(findings.join("; ")))
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        Self::internal("Internal Server Error").with_source(err)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use parambind_core::ErrorKind;

    #[test]
    fn test_not_found_detail() {
        let err = AppError::not_found();
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
        assert_eq!(err.detail(), &Detail::Message("Not Found".to_string()));
    }

    #[test]
    fn test_validation_detail_serializes_findings() {
        let err = AppError::validation(ValidationError::single(
            ErrorKind::Missing.at(vec!["query".into(), "size".into()]),
        ));
        assert_eq!(err.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body = serde_json::to_value(ErrorBody { detail: err.detail }).unwrap();
        assert_eq!(
            body,
            serde_json::json!({
                "detail": [{"loc": ["query", "size"], "msg": "field required", "type": "value_error.missing"}]
            })
        );
    }

    #[test]
    fn test_method_not_allowed_sets_allow_header() {
        let response = AppError::method_not_allowed(vec![Method::GET, Method::PUT]).into_response();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(response.headers().get(ALLOW).unwrap(), "GET, PUT");
    }

    #[test]
    fn test_dispatch_error_conversion() {
        let err: AppError = DispatchError::NotFound.into();
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
        let err: AppError = DispatchError::MethodNotAllowed(vec![Method::POST]).into();
        assert_eq!(err.status(), StatusCode::METHOD_NOT_ALLOWED);
        let missing = ErrorKind::Missing.at(vec!["query".into(), "q".into()]);
        let err: AppError = DispatchError::Validation(ValidationError::single(missing.clone())).into();
        assert_eq!(err.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(err.detail(), &Detail::Findings(vec![missing]));
    }

    #[test]
    fn test_shape_error_is_internal() {
        let shape_err = ShapeError(ValidationError::single(
            ErrorKind::Missing.at(vec!["response".into(), "email".into()]),
        ));
        let err: AppError = shape_err.into();
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.to_string(), "500 Internal Server Error: Internal Server Error");
        assert!(std::error::Error::source(&err).is_some());
    }
}
