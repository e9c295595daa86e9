//! Axum integration for parambind.
//!
//! Endpoints are declared on an [`App`] as a handler plus its parameters;
//! [`App::into_router`] compiles them into an `axum::Router` whose fallback
//! service is the [`Dispatcher`].
//!
//! # Request Flow
//!
//! 1. **Correlation** id read or minted, request span opened
//! 2. **Body** buffered up to the configured limit
//! 3. **Route** resolved (404 / 405 otherwise), trailing slash retried once
//! 4. **Parameters** bound and validated (422 with every finding otherwise)
//! 5. **Handler** called with the [`Bound`](parambind_core::Bound) values
//! 6. **Output** shaped by the response model (500 if it does not fit)
//!
//! # Example
//!
//! ```no_run
//! use parambind_core::{Bound, Param, Shape};
//! use parambind_web::{App, AppError, Endpoint, ServerConfig};
//! use serde_json::{Value, json};
//!
//! async fn read_item(params: Bound) -> Result<Value, AppError> {
//!     let item_id: i64 = params.get("item_id")?;
//!     Ok(json!({"item_id": item_id}))
//! }
//!
//! # async fn run() -> anyhow::Result<()> {
//! let config = ServerConfig::from_env();
//! let router = App::new()
//!     .get("/items/{item_id}", Endpoint::new(read_item).param(Param::new("item_id", Shape::int())))
//!     .redirect_slashes(config.redirect_slashes)
//!     .into_router()?;
//! let listener = tokio::net::TcpListener::bind(config.addr()).await?;
//! axum::serve(listener, router).await?;
//! # Ok(())
//! # }
//! ```

#![allow(clippy::module_name_repetitions)]

pub mod app;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod middleware;
pub mod telemetry;

pub use app::{App, DEFAULT_BODY_LIMIT, Endpoint, HandlerFuture};
pub use config::ServerConfig;
pub use dispatch::Dispatcher;
pub use error::{AppError, Detail};
pub use middleware::{CORRELATION_ID_HEADER, CorrelationId, correlation_id_layer};
pub use telemetry::init_tracing;

/// Result type alias for handlers.
pub type WebResult<T> = Result<T, AppError>;
