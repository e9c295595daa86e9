//! Query parameters.
//!
//! Scalars that are not path placeholders come from the query string.
//! A default makes a parameter optional.

use parambind_core::{Bound, Param, Shape};
use parambind_web::{App, Endpoint, WebResult};
use serde_json::{Map, Value, json};

const FAKE_ITEMS: [&str; 3] = ["Foo", "Bar", "Baz"];

async fn read_items(params: Bound) -> WebResult<Value> {
    let skip: usize = params.get("skip")?;
    let limit: usize = params.get("limit")?;
    let items: Vec<Value> = FAKE_ITEMS
        .iter()
        .skip(skip)
        .take(limit)
        .map(|name| json!({"item_name": name}))
        .collect();
    Ok(Value::Array(items))
}

async fn read_item(params: Bound) -> WebResult<Value> {
    let item_id: String = params.get("item_id")?;
    let q: Option<String> = params.get("q")?;
    let short: Option<bool> = params.get("short")?;

    let mut item = Map::new();
    item.insert("item_id".to_string(), json!(item_id));
    if let Some(q) = q.filter(|q| !q.is_empty()) {
        item.insert("q".to_string(), json!(q));
    }
    if !short.unwrap_or(false) {
        item.insert(
            "description".to_string(),
            json!("This is an amazing item that has a long description"),
        );
    }
    Ok(Value::Object(item))
}

/// Paged fixture list and a single item with optional flags.
#[must_use]
pub fn app() -> App {
    App::new()
        .get(
            "/items/",
            Endpoint::new(read_items).params([
                Param::new("skip", Shape::int().ge(0)).default(json!(0)),
                Param::new("limit", Shape::int().ge(0)).default(json!(10)),
            ]),
        )
        .get(
            "/items/{item_id}",
            Endpoint::new(read_item).params([
                Param::new("item_id", Shape::str()),
                Param::new("q", Shape::str()).optional(),
                Param::new("short", Shape::Bool).optional(),
            ]),
        )
}
