//! Request dispatch.
//!
//! The [`Dispatcher`] owns the compiled route table and runs the request
//! pipeline: read the body, resolve the route, bind parameters, call the
//! handler, shape the output. It is a plain tower [`Service`] so it can sit
//! behind any axum router as the fallback.

use crate::app::Endpoint;
use crate::error::AppError;
use axum::Json;
use axum::body::to_bytes;
use axum::extract::Request;
use axum::http::{Method, StatusCode};
use axum::response::{IntoResponse, Response};
use parambind_core::{BindPlan, Captures, DispatchError, Lookup, RawRequest, RoutePattern, RouteTable};
use std::convert::Infallible;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tower::Service;

#[derive(Debug)]
pub(crate) struct CompiledRoute {
    pub(crate) plan: BindPlan,
    pub(crate) endpoint: Endpoint,
}

#[derive(Debug)]
struct Routes {
    table: RouteTable<CompiledRoute>,
    redirect_slashes: bool,
    body_limit: usize,
}

/// Compiled application, cheap to clone.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    routes: Arc<Routes>,
}

type Resolved<'a> = (&'a CompiledRoute, &'a RoutePattern, Captures);

impl Dispatcher {
    pub(crate) fn new(table: RouteTable<CompiledRoute>, redirect_slashes: bool, body_limit: usize) -> Self {
        Self {
            routes: Arc::new(Routes {
                table,
                redirect_slashes,
                body_limit,
            }),
        }
    }

    /// Number of compiled routes.
    #[must_use]
    pub fn route_count(&self) -> usize {
        self.routes.table.len()
    }

    /// Find the route for `method` and `path`, toggling the trailing slash
    /// once when nothing matches and slash retry is enabled.
    fn resolve(&self, method: &Method, path: &str) -> Result<Resolved<'_>, DispatchError> {
        match self.routes.table.lookup(method, path) {
            Lookup::Found {
                pattern,
                target,
                captures,
            } => return Ok((target, pattern, captures)),
            Lookup::MethodNotAllowed(allowed) => return Err(DispatchError::MethodNotAllowed(allowed)),
            Lookup::NotFound => {}
        }
        if !self.routes.redirect_slashes || path == "/" {
            return Err(DispatchError::NotFound);
        }
        let alternate = match path.strip_suffix('/') {
            Some(stripped) => stripped.to_string(),
            None => format!("{path}/"),
        };
        match self.routes.table.lookup(method, &alternate) {
            Lookup::Found {
                pattern,
                target,
                captures,
            } => {
                tracing::debug!(path, alternate = %alternate, "matched after toggling trailing slash");
                Ok((target, pattern, captures))
            }
            Lookup::MethodNotAllowed(allowed) => Err(DispatchError::MethodNotAllowed(allowed)),
            Lookup::NotFound => Err(DispatchError::NotFound),
        }
    }

    /// Run the pipeline for an already-buffered request.
    ///
    /// # Errors
    ///
    /// Returns an [`AppError`] for an unknown path (404), a wrong method
    /// (405), failed binding (422), a handler error, or output that does not
    /// fit the response model (500).
    pub async fn dispatch(&self, request: RawRequest) -> Result<Response, AppError> {
        let (route, pattern, captures) = self.resolve(request.method(), request.path())?;
        tracing::debug!(pattern = %pattern, "route matched");

        let bound = route.plan.bind(&captures, &request).map_err(|err| {
            tracing::info!(pattern = %pattern, findings = err.len(), "request rejected by validation");
            DispatchError::Validation(err)
        })?;

        let output = route.endpoint.call(bound).await?;
        let body = match route.endpoint.response_shape() {
            Some(model) => model.render(&output)?,
            None => output,
        };
        Ok((route.endpoint.success_status(), Json(body)).into_response())
    }

    /// Buffer the body of an axum request and dispatch it. Never fails:
    /// errors become their HTTP response.
    pub async fn serve(&self, request: Request) -> Response {
        let (parts, body) = request.into_parts();
        let result = match to_bytes(body, self.routes.body_limit).await {
            Ok(bytes) => {
                let raw = RawRequest::from_parts(
                    parts.method,
                    parts.uri.path(),
                    parts.uri.query(),
                    parts.headers,
                    bytes.to_vec(),
                );
                self.dispatch(raw).await
            }
            Err(err) => Err(AppError::bad_request("There was an error parsing the body")
                .with_source(anyhow::Error::new(err))),
        };

        let outcome = match &result {
            Ok(_) => "ok",
            Err(err) => match err.status() {
                StatusCode::NOT_FOUND => "not_found",
                StatusCode::METHOD_NOT_ALLOWED => "method_not_allowed",
                StatusCode::UNPROCESSABLE_ENTITY => "validation",
                _ => "error",
            },
        };
        metrics::counter!("parambind.requests", "outcome" => outcome).increment(1);

        result.unwrap_or_else(IntoResponse::into_response)
    }
}

impl Service<Request> for Dispatcher {
    type Response = Response;
    type Error = Infallible;
    type Future = Pin<Box<dyn Future<Output = Result<Response, Infallible>> + Send>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, request: Request) -> Self::Future {
        let dispatcher = self.clone();
        Box::pin(async move { Ok(dispatcher.serve(request).await) })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::app::App;
    use axum::body::Body;
    use axum::http::header::ALLOW;
    use parambind_core::{Bound, FieldSpec, ModelSchema, Param, ResponseModel, Shape};
    use serde_json::{Value, json};
    use tower::ServiceExt;

    async fn send(app: App, method: Method, uri: &str, body: Option<&str>) -> (Response, Value) {
        let router = app.into_router().unwrap();
        let body = body.map_or_else(Body::empty, |b| Body::from(b.to_string()));
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(body)
            .unwrap();
        let response = router.oneshot(request).await.unwrap();
        let (parts, body) = response.into_parts();
        let bytes = to_bytes(body, usize::MAX).await.unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (Response::from_parts(parts, Body::empty()), json)
    }

    fn echo(name: &'static str) -> Endpoint {
        Endpoint::sync(move |bound| Ok::<_, AppError>(json!({ name: bound.value(name) })))
    }

    fn users_app() -> App {
        App::new()
            .get("/users/{user_id}", echo("user_id"))
            .get("/users/me", Endpoint::sync(|_| Ok::<_, AppError>(json!({"user_id": "the current user"}))))
    }

    #[tokio::test]
    async fn test_static_route_beats_placeholder() {
        let (response, json) = send(users_app(), Method::GET, "/users/me", None).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json, json!({"user_id": "the current user"}));

        let (_, json) = send(users_app(), Method::GET, "/users/leo", None).await;
        assert_eq!(json, json!({"user_id": "leo"}));
    }

    #[tokio::test]
    async fn test_not_found_and_method_not_allowed() {
        let (response, json) = send(users_app(), Method::GET, "/nope", None).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(json, json!({"detail": "Not Found"}));

        let (response, json) = send(users_app(), Method::POST, "/users/me", None).await;
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(json, json!({"detail": "Method Not Allowed"}));
        assert_eq!(response.headers().get(ALLOW).unwrap(), "GET");
    }

    #[tokio::test]
    async fn test_validation_findings_are_reported_together() {
        let app = App::new().get(
            "/items/{item_id}",
            echo("item_id").params([
                Param::new("item_id", Shape::int()),
                Param::new("size", Shape::float().ge(0).lt(10.5)),
            ]),
        );
        let (response, json) = send(app, Method::GET, "/items/foo?size=11.5", None).await;
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(
            json,
            json!({"detail": [
                {"loc": ["path", "item_id"], "msg": "value is not a valid integer", "type": "type_error.integer"},
                {
                    "loc": ["query", "size"],
                    "msg": "ensure this value is less than 10.5",
                    "type": "value_error.number.not_lt",
                    "ctx": {"limit_value": 10.5}
                }
            ]})
        );
    }

    #[tokio::test]
    async fn test_trailing_slash_retry() {
        let app = || App::new().get("/items/", echo("q").param(Param::new("q", Shape::str()).optional()));
        let (response, json) = send(app(), Method::GET, "/items?q=x", None).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json, json!({"q": "x"}));

        let (response, _) = send(app().redirect_slashes(false), Method::GET, "/items", None).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_malformed_json_body() {
        let item = ModelSchema::new("Item", vec![FieldSpec::required("name", Shape::str())]);
        let app = App::new().post("/items/", echo("item").param(Param::new("item", Shape::model(item))));
        let (response, json) = send(app, Method::POST, "/items/", Some("{\"name\": ")).await;
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let detail = json["detail"].as_array().unwrap();
        assert_eq!(detail.len(), 1);
        assert_eq!(detail[0]["loc"], json!(["body"]));
        assert_eq!(detail[0]["type"], json!("value_error.jsondecode"));
    }

    #[tokio::test]
    async fn test_response_model_mismatch_is_internal_error() {
        let user = ModelSchema::new("User", vec![FieldSpec::required("email", Shape::Email)]);
        let app = App::new().get(
            "/user",
            Endpoint::sync(|_| Ok::<_, AppError>(json!({"name": "leo"})))
                .response_model(ResponseModel::new(Shape::model(user))),
        );
        let (response, json) = send(app, Method::GET, "/user", None).await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json, json!({"detail": "Internal Server Error"}));
    }

    #[tokio::test]
    async fn test_exclude_unset_drops_fields_the_client_did_not_send() {
        let item = ModelSchema::new(
            "Item",
            vec![
                FieldSpec::required("name", Shape::str()),
                FieldSpec::optional("description", Shape::str()),
                FieldSpec::required("price", Shape::float()),
                FieldSpec::with_default("tax", Shape::float(), json!(10.5)),
            ],
        );
        let shape = Shape::model(item);
        let app = App::new()
            .patch(
                "/items/sent",
                Endpoint::sync(|bound: Bound| Ok::<_, AppError>(bound.sent("item").cloned()))
                    .param(Param::new("item", shape.clone()))
                    .response_model(ResponseModel::new(shape.clone()).exclude_unset()),
            )
            .patch(
                "/items/filled",
                Endpoint::sync(|bound: Bound| Ok::<_, AppError>(bound.value("item").cloned()))
                    .param(Param::new("item", shape.clone()))
                    .response_model(ResponseModel::new(shape).exclude_unset()),
            );
        let body = r#"{"name": "Foo", "price": 3}"#;

        let (response, json) = send(app.clone(), Method::PATCH, "/items/sent", Some(body)).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json, json!({"name": "Foo", "price": 3.0}));

        let (_, json) = send(app, Method::PATCH, "/items/filled", Some(body)).await;
        assert_eq!(json, json!({"name": "Foo", "description": null, "price": 3.0, "tax": 10.5}));
    }

    #[tokio::test]
    async fn test_success_status_and_handler_errors() {
        let app = App::new()
            .post(
                "/items/",
                Endpoint::sync(|_| Ok::<_, AppError>(json!({"created": true}))).status(StatusCode::CREATED),
            )
            .get(
                "/items/{item_id}",
                Endpoint::sync(|_| Err::<Value, _>(AppError::new(StatusCode::NOT_FOUND, "Item not found"))),
            );
        let (response, _) = send(app.clone(), Method::POST, "/items/", None).await;
        assert_eq!(response.status(), StatusCode::CREATED);

        let (response, json) = send(app, Method::GET, "/items/bar", None).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(json, json!({"detail": "Item not found"}));
    }

    #[tokio::test]
    async fn test_dispatch_without_router() {
        let dispatcher = App::new().get("/", echo("q")).build().unwrap();
        assert_eq!(dispatcher.route_count(), 1);
        let response = dispatcher
            .dispatch(RawRequest::new(Method::GET, "/"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
