//! First steps: one route, one JSON answer.
//!
//! Handlers can be async or plain functions; both go through the same
//! interface.

use parambind_core::Bound;
use parambind_web::{App, Endpoint, WebResult};
use serde_json::{Value, json};

async fn index(_: Bound) -> WebResult<Value> {
    Ok(json!({"message": "hello world"}))
}

fn index_sync(_: Bound) -> WebResult<Value> {
    Ok(json!({"message": "hello world"}))
}

/// `GET /` (async) and `GET /sync` (plain function).
#[must_use]
pub fn app() -> App {
    App::new()
        .get("/", Endpoint::new(index))
        .get("/sync", Endpoint::sync(index_sync))
}
