//! Validation declared on model fields.

use parambind_core::{Bound, FieldSpec, ModelSchema, Param, Shape};
use parambind_web::{App, Endpoint, WebResult};
use serde_json::{Value, json};

fn item_schema() -> ModelSchema {
    ModelSchema::new(
        "Item",
        vec![
            FieldSpec::required("name", Shape::str()),
            FieldSpec::optional("description", Shape::str().max_length(300)),
            FieldSpec::required("price", Shape::float().gt(0)),
            FieldSpec::optional("tax", Shape::float()),
        ],
    )
}

async fn update_item(params: Bound) -> WebResult<Value> {
    let item_id: i64 = params.get("item_id")?;
    let item: Value = params.get("item")?;
    Ok(json!({"item_id": item_id, "item": item}))
}

/// `PUT /items/{item_id}` with the item embedded under `"item"`.
#[must_use]
pub fn app() -> App {
    App::new().put(
        "/items/{item_id}",
        Endpoint::new(update_item).params([
            Param::new("item_id", Shape::int()),
            Param::body("item", Shape::model(item_schema())).embed(),
        ]),
    )
}
