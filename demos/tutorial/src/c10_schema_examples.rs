//! Example values attached to models, fields and parameters.
//!
//! Examples are documentation metadata. They never change how a request
//! binds; the three endpoints here behave identically.

use parambind_core::{Bound, FieldSpec, ModelSchema, Param, Shape};
use parambind_web::{App, Endpoint, WebResult};
use serde_json::{Value, json};

/// Example payload shared by the model-level and parameter-level examples.
#[must_use]
pub fn item_example() -> Value {
    json!({
        "name": "Foo",
        "description": "A very nice Item",
        "price": 35.4,
        "tax": 3.2
    })
}

fn item_fields() -> Vec<FieldSpec> {
    vec![
        FieldSpec::required("name", Shape::str()),
        FieldSpec::optional("description", Shape::str()),
        FieldSpec::required("price", Shape::float()),
        FieldSpec::optional("tax", Shape::float()),
    ]
}

/// Item carrying one example for the whole model.
#[must_use]
pub fn item_schema() -> ModelSchema {
    ModelSchema::new("Item", item_fields()).example(item_example())
}

/// Item carrying an example on each field.
#[must_use]
pub fn item_with_field_examples() -> ModelSchema {
    let example = item_example();
    let fields = item_fields()
        .into_iter()
        .map(|field| {
            let value = example[field.name()].clone();
            field.example(value)
        })
        .collect();
    ModelSchema::new("ItemWithExample", fields)
}

/// Body parameter with the example attached at the parameter.
#[must_use]
pub fn item_param_with_example() -> Param {
    Param::body("item", Shape::model(ModelSchema::new("Item", item_fields()))).example(item_example())
}

async fn echo_item(params: Bound) -> WebResult<Value> {
    let item_id: i64 = params.get("item_id")?;
    let item: Value = params.get("item")?;
    Ok(json!({"item_id": item_id, "item": item}))
}

/// `PUT`, `POST` and `PATCH` on `/items/{item_id}`.
#[must_use]
pub fn app() -> App {
    let item_id = || Param::new("item_id", Shape::int());
    App::new()
        .put(
            "/items/{item_id}",
            Endpoint::new(echo_item).params([item_id(), Param::new("item", Shape::model(item_schema()))]),
        )
        .post(
            "/items/{item_id}",
            Endpoint::new(echo_item).params([
                item_id(),
                Param::new("item", Shape::model(item_with_field_examples())),
            ]),
        )
        .patch(
            "/items/{item_id}",
            Endpoint::new(echo_item).params([item_id(), item_param_with_example()]),
        )
}
