//! Application builder.
//!
//! An [`App`] is a list of route declarations. Each declaration pairs a
//! method and a pattern with an [`Endpoint`]: the handler, the parameters it
//! declares and an optional response model. Nothing is compiled until
//! [`App::build`] (or [`App::into_router`]), which is where malformed
//! patterns and inconsistent parameter declarations are reported.

use crate::dispatch::{CompiledRoute, Dispatcher};
use crate::error::AppError;
use crate::middleware::correlation_id_layer;
use axum::Router;
use axum::http::{Method, StatusCode};
use parambind_core::{BindPlan, Bound, Param, ResponseModel, RouteError, RoutePattern, RouteTable};
use serde::Serialize;
use serde_json::Value;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// Default maximum request body size (2 MiB).
pub const DEFAULT_BODY_LIMIT: usize = 2 * 1024 * 1024;

/// Future returned by a type-erased handler.
pub type HandlerFuture = Pin<Box<dyn Future<Output = Result<Value, AppError>> + Send>>;

pub(crate) type BoxedHandler = Arc<dyn Fn(Bound) -> HandlerFuture + Send + Sync>;

/// A handler plus its parameter declarations.
///
/// # Examples
///
/// ```
/// use parambind_core::{Bound, Param, Shape};
/// use parambind_web::{AppError, Endpoint};
/// use serde_json::{Value, json};
///
/// async fn read_item(params: Bound) -> Result<Value, AppError> {
///     let item_id: i64 = params.get("item_id")?;
///     Ok(json!({"item_id": item_id}))
/// }
///
/// let endpoint = Endpoint::new(read_item).param(Param::new("item_id", Shape::int()));
/// assert_eq!(endpoint.declared_params().len(), 1);
/// ```
#[derive(Clone)]
pub struct Endpoint {
    handler: BoxedHandler,
    params: Vec<Param>,
    response_model: Option<ResponseModel>,
    status: StatusCode,
}

impl Endpoint {
    /// Wrap an async handler.
    pub fn new<F, Fut, T>(handler: F) -> Self
    where
        F: Fn(Bound) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, AppError>> + Send + 'static,
        T: Serialize,
    {
        let handler: BoxedHandler = Arc::new(move |bound: Bound| -> HandlerFuture {
            let fut = handler(bound);
            Box::pin(async move { to_json(&fut.await?) })
        });
        Self {
            handler,
            params: Vec::new(),
            response_model: None,
            status: StatusCode::OK,
        }
    }

    /// Wrap a synchronous handler; it runs on the request task.
    pub fn sync<F, T>(handler: F) -> Self
    where
        F: Fn(Bound) -> Result<T, AppError> + Send + Sync + 'static,
        T: Serialize,
    {
        let handler: BoxedHandler = Arc::new(move |bound: Bound| -> HandlerFuture {
            let output = handler(bound).and_then(|out| to_json(&out));
            Box::pin(futures::future::ready(output))
        });
        Self {
            handler,
            params: Vec::new(),
            response_model: None,
            status: StatusCode::OK,
        }
    }

    /// Declare one parameter.
    #[must_use]
    pub fn param(mut self, param: Param) -> Self {
        self.params.push(param);
        self
    }

    /// Declare several parameters.
    #[must_use]
    pub fn params(mut self, params: impl IntoIterator<Item = Param>) -> Self {
        self.params.extend(params);
        self
    }

    /// Shape the handler output before sending it.
    #[must_use]
    pub fn response_model(mut self, model: ResponseModel) -> Self {
        self.response_model = Some(model);
        self
    }

    /// Status code of a successful response (200 by default).
    #[must_use]
    pub const fn status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    /// Declared parameters.
    #[must_use]
    pub fn declared_params(&self) -> &[Param] {
        &self.params
    }

    pub(crate) async fn call(&self, bound: Bound) -> Result<Value, AppError> {
        (self.handler)(bound).await
    }

    pub(crate) const fn response_shape(&self) -> Option<&ResponseModel> {
        self.response_model.as_ref()
    }

    pub(crate) const fn success_status(&self) -> StatusCode {
        self.status
    }
}

impl std::fmt::Debug for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Endpoint")
            .field("params", &self.params)
            .field("response_model", &self.response_model)
            .field("status", &self.status)
            .finish_non_exhaustive()
    }
}

fn to_json<T: Serialize>(output: &T) -> Result<Value, AppError> {
    serde_json::to_value(output)
        .map_err(|e| AppError::internal("Internal Server Error").with_source(e.into()))
}

#[derive(Debug, Clone)]
struct RouteDecl {
    method: Method,
    pattern: String,
    endpoint: Endpoint,
}

/// Route declarations plus dispatch settings.
///
/// # Examples
///
/// ```
/// use parambind_web::{App, AppError, Endpoint};
/// use serde_json::json;
///
/// let app = App::new().get(
///     "/",
///     Endpoint::sync(|_| Ok::<_, AppError>(json!({"message": "hello world"}))),
/// );
/// assert!(app.into_router().is_ok());
/// ```
#[derive(Debug, Clone)]
pub struct App {
    routes: Vec<RouteDecl>,
    redirect_slashes: bool,
    body_limit: usize,
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}

impl App {
    /// Empty application with slash retry enabled.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            routes: Vec::new(),
            redirect_slashes: true,
            body_limit: DEFAULT_BODY_LIMIT,
        }
    }

    /// Declare a route for an arbitrary method.
    #[must_use]
    pub fn route(mut self, method: Method, pattern: impl Into<String>, endpoint: Endpoint) -> Self {
        self.routes.push(RouteDecl {
            method,
            pattern: pattern.into(),
            endpoint,
        });
        self
    }

    /// Declare a `GET` route.
    #[must_use]
    pub fn get(self, pattern: impl Into<String>, endpoint: Endpoint) -> Self {
        self.route(Method::GET, pattern, endpoint)
    }

    /// Declare a `POST` route.
    #[must_use]
    pub fn post(self, pattern: impl Into<String>, endpoint: Endpoint) -> Self {
        self.route(Method::POST, pattern, endpoint)
    }

    /// Declare a `PUT` route.
    #[must_use]
    pub fn put(self, pattern: impl Into<String>, endpoint: Endpoint) -> Self {
        self.route(Method::PUT, pattern, endpoint)
    }

    /// Declare a `PATCH` route.
    #[must_use]
    pub fn patch(self, pattern: impl Into<String>, endpoint: Endpoint) -> Self {
        self.route(Method::PATCH, pattern, endpoint)
    }

    /// Declare a `DELETE` route.
    #[must_use]
    pub fn delete(self, pattern: impl Into<String>, endpoint: Endpoint) -> Self {
        self.route(Method::DELETE, pattern, endpoint)
    }

    /// Mount every route of `other` under `prefix`.
    ///
    /// A trailing slash on `prefix` is ignored: `/c01` plus `/items/` gives
    /// `/c01/items/`.
    #[must_use]
    pub fn nest(mut self, prefix: &str, other: Self) -> Self {
        let prefix = prefix.trim_end_matches('/');
        self.routes.extend(other.routes.into_iter().map(|decl| RouteDecl {
            pattern: format!("{prefix}{}", decl.pattern),
            ..decl
        }));
        self
    }

    /// Retry an unmatched path with its trailing slash toggled.
    #[must_use]
    pub const fn redirect_slashes(mut self, enabled: bool) -> Self {
        self.redirect_slashes = enabled;
        self
    }

    /// Maximum accepted body size in bytes.
    #[must_use]
    pub const fn body_limit(mut self, limit: usize) -> Self {
        self.body_limit = limit;
        self
    }

    /// Number of declared routes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// Whether no route is declared.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Compile every declaration into a dispatcher.
    ///
    /// # Errors
    ///
    /// Returns the first [`RouteError`]: a malformed pattern, a duplicate
    /// route, or parameters inconsistent with their pattern.
    pub fn build(self) -> Result<Dispatcher, RouteError> {
        let mut table = RouteTable::new();
        for decl in self.routes {
            let pattern = RoutePattern::parse(&decl.pattern)?;
            let plan = BindPlan::new(&pattern, decl.endpoint.declared_params().to_vec())?;
            tracing::debug!(method = %decl.method, pattern = %pattern, "route registered");
            table.insert(
                decl.method,
                pattern,
                CompiledRoute {
                    plan,
                    endpoint: decl.endpoint,
                },
            )?;
        }
        Ok(Dispatcher::new(table, self.redirect_slashes, self.body_limit))
    }

    /// Compile into an axum [`Router`] whose fallback performs dispatch,
    /// wrapped in the correlation-id layer.
    ///
    /// # Errors
    ///
    /// Same as [`App::build`].
    pub fn into_router(self) -> Result<Router, RouteError> {
        let dispatcher = self.build()?;
        Ok(Router::new()
            .fallback_service(dispatcher)
            .layer(correlation_id_layer()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use parambind_core::Shape;
    use serde_json::json;

    fn hello() -> Endpoint {
        Endpoint::sync(|_| Ok::<_, AppError>(json!({"message": "hello world"})))
    }

    #[test]
    fn test_nest_prefixes_patterns() {
        let app = App::new().nest("/c01/", App::new().get("/", hello()).get("/items/{id}", hello()));
        let patterns: Vec<&str> = app.routes.iter().map(|d| d.pattern.as_str()).collect();
        assert_eq!(patterns, ["/c01/", "/c01/items/{id}"]);
    }

    #[test]
    fn test_build_rejects_bad_declarations() {
        let err = App::new().get("items", hello()).build().unwrap_err();
        assert!(matches!(err, RouteError::MissingLeadingSlash(_)));

        let err = App::new()
            .get("/items/{id}", hello().param(Param::path("item_id", Shape::int())))
            .build()
            .unwrap_err();
        assert!(matches!(err, RouteError::UnknownPathParam { .. }));

        let err = App::new().get("/", hello()).get("/", hello()).build().unwrap_err();
        assert!(matches!(err, RouteError::Duplicate { .. }));
    }

    #[test]
    fn test_sync_and_async_handlers_share_interface() {
        let sync = hello();
        let asynchronous = Endpoint::new(|_| async { Ok::<_, AppError>(json!({"message": "hello world"})) });
        let empty = Bound::from_value(json!({})).unwrap();
        let (a, b) = tokio_test::block_on(async {
            (sync.call(empty.clone()).await.unwrap(), asynchronous.call(empty).await.unwrap())
        });
        assert_eq!(a, b);
    }

    #[test]
    fn test_endpoint_builder() {
        let endpoint = hello()
            .param(Param::new("q", Shape::str()).optional())
            .status(StatusCode::CREATED);
        assert_eq!(endpoint.declared_params().len(), 1);
        assert_eq!(endpoint.success_status(), StatusCode::CREATED);
        assert!(endpoint.response_shape().is_none());
    }
}
