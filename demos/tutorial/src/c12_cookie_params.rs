//! Cookie parameters.

use parambind_core::{Bound, Param, Shape};
use parambind_web::{App, Endpoint, WebResult};
use serde_json::{Value, json};

async fn read_items(params: Bound) -> WebResult<Value> {
    let ads_id: Option<String> = params.get("ads_id")?;
    Ok(json!({"ads_id": ads_id}))
}

/// `GET /items/` reading the optional `ads_id` cookie.
#[must_use]
pub fn app() -> App {
    App::new().get(
        "/items/",
        Endpoint::new(read_items).param(Param::cookie("ads_id", Shape::str()).optional()),
    )
}
