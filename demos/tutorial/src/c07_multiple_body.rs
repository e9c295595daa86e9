//! Several body parameters on one endpoint.
//!
//! With more than one body parameter the body is an object keyed by
//! parameter name. A lone model parameter can ask for the same layout with
//! [`Param::embed`].

use crate::c04_body::item_schema;
use parambind_core::{Bound, FieldSpec, ModelSchema, Param, Shape};
use parambind_web::{App, Endpoint, WebResult};
use serde_json::{Map, Value};

fn user_schema() -> ModelSchema {
    ModelSchema::new(
        "User",
        vec![
            FieldSpec::required("username", Shape::str()),
            FieldSpec::optional("full_name", Shape::str()),
        ],
    )
}

async fn echo_all(params: Bound) -> WebResult<Value> {
    Ok(params.into_value())
}

fn item_and_user(item_id: Param) -> [Param; 3] {
    [
        item_id,
        Param::new("item", Shape::model(item_schema())),
        Param::new("user", Shape::model(user_schema())),
    ]
}

async fn body_embed(params: Bound) -> WebResult<Value> {
    let mut out = Map::new();
    out.insert("item_id".to_string(), params.value("item_id").cloned().unwrap_or_default());
    out.insert("item".to_string(), params.value("item").cloned().unwrap_or_default());
    Ok(Value::Object(out))
}

/// `POST /multi_body/{item_id}`, `/body_mark/{item_id}` and `/body_embed/{item_id}`.
#[must_use]
pub fn app() -> App {
    App::new()
        .post(
            "/multi_body/{item_id}",
            Endpoint::new(echo_all).params(item_and_user(Param::new("item_id", Shape::int()))),
        )
        .post(
            "/body_mark/{item_id}",
            Endpoint::new(echo_all)
                .params(item_and_user(Param::new("item_id", Shape::int())))
                .param(Param::body("importance", Shape::int())),
        )
        .post(
            "/body_embed/{item_id}",
            Endpoint::new(body_embed).params([
                Param::new("item_id", Shape::int()),
                Param::new("item", Shape::model(item_schema())).embed(),
            ]),
        )
}
