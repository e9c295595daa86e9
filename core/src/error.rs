//! Error types for route declaration and request dispatch.

use crate::finding::ValidationError;
use http::Method;
use thiserror::Error;

/// A route declaration that cannot be compiled.
///
/// These surface when an application is built, never while serving.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RouteError {
    /// Pattern does not start with `/`
    #[error("route pattern must start with '/': {0}")]
    MissingLeadingSlash(String),

    /// Placeholder syntax is wrong (empty name, stray brace, empty segment)
    #[error("malformed segment '{segment}' in route pattern {pattern}")]
    MalformedPlaceholder {
        /// Offending pattern
        pattern: String,
        /// Offending segment
        segment: String,
    },

    /// Placeholder convertor other than `str` or `path`
    #[error("unknown convertor '{convertor}' in route pattern {pattern}")]
    UnknownConvertor {
        /// Offending pattern
        pattern: String,
        /// Convertor name
        convertor: String,
    },

    /// Same placeholder name used twice
    #[error("placeholder '{name}' appears twice in route pattern {pattern}")]
    DuplicatePlaceholder {
        /// Offending pattern
        pattern: String,
        /// Repeated name
        name: String,
    },

    /// `:path` placeholder followed by more segments
    #[error("path-capturing placeholder must be the last segment: {0}")]
    PathCaptureNotLast(String),

    /// Same method and pattern registered twice
    #[error("route {method} {pattern} is already registered")]
    Duplicate {
        /// HTTP method
        method: String,
        /// Pattern
        pattern: String,
    },

    /// Parameter declared as a path parameter but absent from the pattern
    #[error("path parameter '{name}' is not a placeholder of {pattern}")]
    UnknownPathParam {
        /// Pattern
        pattern: String,
        /// Parameter name
        name: String,
    },

    /// Two parameters share a name
    #[error("parameter '{name}' declared twice for {pattern}")]
    DuplicateParam {
        /// Pattern
        pattern: String,
        /// Parameter name
        name: String,
    },
}

/// Why a request did not reach its handler.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DispatchError {
    /// No pattern matches the path
    #[error("no route matches the request path")]
    NotFound,

    /// A pattern matches the path but not for this method
    #[error("method not allowed (allowed: {})", join_methods(.0))]
    MethodNotAllowed(Vec<Method>),

    /// Binding or coercion failed
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

fn join_methods(methods: &[Method]) -> String {
    methods
        .iter()
        .map(Method::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

/// A handler's output that does not fit its declared response shape.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("response does not match its declared shape: {0}")]
pub struct ShapeError(#[source] pub ValidationError);

/// A bound value that cannot be read as the requested Rust type.
#[derive(Error, Debug)]
pub enum BoundError {
    /// No value was bound under this name
    #[error("no parameter named '{0}' was bound")]
    Unknown(String),

    /// Value exists but does not deserialize into the requested type
    #[error("parameter '{name}' cannot be read: {source}")]
    Decode {
        /// Parameter name
        name: String,
        /// Deserialization error
        #[source]
        source: serde_json::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::finding::ErrorKind;

    #[test]
    fn test_method_not_allowed_display() {
        let err = DispatchError::MethodNotAllowed(vec![Method::GET, Method::POST]);
        assert_eq!(err.to_string(), "method not allowed (allowed: GET, POST)");
    }

    #[test]
    fn test_validation_is_transparent() {
        let err: DispatchError =
            ValidationError::single(ErrorKind::Missing.at(vec!["query".into(), "size".into()])).into();
        assert_eq!(err.to_string(), "1 validation finding(s)");
    }

    #[test]
    fn test_route_error_display() {
        let err = RouteError::UnknownPathParam {
            pattern: "/items/{item_id}".to_string(),
            name: "id".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "path parameter 'id' is not a placeholder of /items/{item_id}"
        );
    }
}
