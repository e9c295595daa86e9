//! # Parambind Testing
//!
//! In-process HTTP client for parambind applications.
//!
//! Requests are driven straight through the `axum::Router` with
//! `tower::ServiceExt::oneshot`; no socket is opened. Responses come back
//! fully buffered with the body already parsed as JSON.
//!
//! ## Example
//!
//! ```
//! use parambind_testing::TestClient;
//! use parambind_web::{App, AppError, Endpoint};
//! use serde_json::json;
//!
//! # tokio_test::block_on(async {
//! let app = App::new().get(
//!     "/",
//!     Endpoint::sync(|_| Ok::<_, AppError>(json!({"message": "hello world"}))),
//! );
//! let client = TestClient::from_app(app);
//! let response = client.get("/").send().await;
//! assert_eq!(response.status, 200);
//! assert_eq!(response.json, json!({"message": "hello world"}));
//! # });
//! ```

// Test infrastructure: malformed test input is a bug in the test and panics.
#![allow(clippy::expect_used, clippy::missing_panics_doc)]

use axum::Router;
use axum::body::{Body, to_bytes};
use http::header::{CONTENT_TYPE, COOKIE};
use http::{HeaderMap, HeaderName, HeaderValue, Method, Request, StatusCode};
use parambind_core::{Finding, RouteError};
use parambind_web::App;
use serde::Serialize;
use serde_json::Value;
use tower::ServiceExt;

/// Client bound to one router.
#[derive(Debug, Clone)]
pub struct TestClient {
    router: Router,
}

impl TestClient {
    /// Wrap an already-built router.
    #[must_use]
    pub const fn new(router: Router) -> Self {
        Self { router }
    }

    /// Compile `app` and wrap its router. Panics on invalid route declarations.
    #[must_use]
    pub fn from_app(app: App) -> Self {
        Self::try_from_app(app).expect("test application routes should compile")
    }

    /// Compile `app` and wrap its router.
    ///
    /// # Errors
    ///
    /// Returns the [`RouteError`] reported while compiling routes.
    pub fn try_from_app(app: App) -> Result<Self, RouteError> {
        app.into_router().map(Self::new)
    }

    /// Start a request with any method.
    #[must_use]
    pub fn request(&self, method: Method, uri: &str) -> RequestBuilder {
        RequestBuilder {
            router: self.router.clone(),
            method,
            uri: uri.to_string(),
            headers: HeaderMap::new(),
            cookies: Vec::new(),
            body: Vec::new(),
        }
    }

    /// Start a `GET` request.
    #[must_use]
    pub fn get(&self, uri: &str) -> RequestBuilder {
        self.request(Method::GET, uri)
    }

    /// Start a `POST` request.
    #[must_use]
    pub fn post(&self, uri: &str) -> RequestBuilder {
        self.request(Method::POST, uri)
    }

    /// Start a `PUT` request.
    #[must_use]
    pub fn put(&self, uri: &str) -> RequestBuilder {
        self.request(Method::PUT, uri)
    }

    /// Start a `PATCH` request.
    #[must_use]
    pub fn patch(&self, uri: &str) -> RequestBuilder {
        self.request(Method::PATCH, uri)
    }

    /// Start a `DELETE` request.
    #[must_use]
    pub fn delete(&self, uri: &str) -> RequestBuilder {
        self.request(Method::DELETE, uri)
    }
}

/// A request being assembled.
#[derive(Debug)]
pub struct RequestBuilder {
    router: Router,
    method: Method,
    uri: String,
    headers: HeaderMap,
    cookies: Vec<String>,
    body: Vec<u8>,
}

impl RequestBuilder {
    /// Append a header; repeated calls with the same name add values.
    #[must_use]
    pub fn header(mut self, name: &str, value: &str) -> Self {
        let name = HeaderName::from_bytes(name.as_bytes()).expect("test header name should be valid");
        let value = HeaderValue::from_str(value).expect("test header value should be valid");
        self.headers.append(name, value);
        self
    }

    /// Add a cookie; all cookies are sent in one `Cookie` header.
    #[must_use]
    pub fn cookie(mut self, name: &str, value: &str) -> Self {
        self.cookies.push(format!("{name}={value}"));
        self
    }

    /// Serialize `body` as the JSON request body.
    #[must_use]
    pub fn json<T: Serialize + ?Sized>(mut self, body: &T) -> Self {
        self.body = serde_json::to_vec(body).expect("test body should serialize");
        self.headers
            .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        self
    }

    /// Send raw bytes as the request body.
    #[must_use]
    pub fn body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    /// Send the request and buffer the response.
    pub async fn send(self) -> TestResponse {
        let mut request = Request::builder()
            .method(self.method)
            .uri(&self.uri)
            .body(Body::from(self.body))
            .expect("test request should be valid");
        *request.headers_mut() = self.headers;
        if !self.cookies.is_empty() {
            let cookies = HeaderValue::from_str(&self.cookies.join("; "))
                .expect("test cookies should be valid header text");
            request.headers_mut().insert(COOKIE, cookies);
        }

        let response = match self.router.oneshot(request).await {
            Ok(response) => response,
            Err(never) => match never {},
        };
        let (parts, body) = response.into_parts();
        let body = to_bytes(body, usize::MAX)
            .await
            .expect("response body should be readable")
            .to_vec();
        let json = serde_json::from_slice(&body).unwrap_or(Value::Null);
        TestResponse {
            status: parts.status,
            headers: parts.headers,
            body,
            json,
        }
    }
}

/// A buffered response.
#[derive(Debug, Clone)]
pub struct TestResponse {
    /// Status code
    pub status: StatusCode,
    /// Response headers
    pub headers: HeaderMap,
    /// Raw body
    pub body: Vec<u8>,
    /// Body parsed as JSON (`null` when it is not JSON)
    pub json: Value,
}

impl TestResponse {
    /// Body as text.
    #[must_use]
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// First value of a response header.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Findings of a 422 response; empty for any other body.
    #[must_use]
    pub fn findings(&self) -> Vec<Finding> {
        self.json
            .get("detail")
            .and_then(|detail| serde_json::from_value(detail.clone()).ok())
            .unwrap_or_default()
    }
}
