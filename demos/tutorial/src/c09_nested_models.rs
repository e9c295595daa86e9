//! Nested models, sets, lists and maps.

use parambind_core::{Bound, FieldSpec, ModelSchema, Param, Shape};
use parambind_web::{App, Endpoint, WebResult};
use serde::Serialize;
use serde_json::{Map, Value};

fn image_schema() -> ModelSchema {
    ModelSchema::new(
        "Image",
        vec![
            FieldSpec::required("url", Shape::http_url()),
            FieldSpec::required("name", Shape::str()),
        ],
    )
}

fn item_schema() -> ModelSchema {
    ModelSchema::new(
        "Item",
        vec![
            FieldSpec::required("name", Shape::str()),
            FieldSpec::optional("description", Shape::str()),
            FieldSpec::required("price", Shape::float()),
            FieldSpec::optional("tax", Shape::float()),
            FieldSpec::with_default("tags", Shape::set(Shape::str()), Value::Array(Vec::new())),
            FieldSpec::optional("images", Shape::list(Shape::model(image_schema()))),
        ],
    )
}

fn offer_schema() -> ModelSchema {
    ModelSchema::new(
        "Offer",
        vec![
            FieldSpec::required("name", Shape::str()),
            FieldSpec::optional("description", Shape::str()),
            FieldSpec::required("price", Shape::float()),
            FieldSpec::required("items", Shape::list(Shape::model(item_schema()))),
        ],
    )
}

#[derive(Serialize)]
struct IndexWeights {
    data: Map<String, Value>,
    all_keys_int: bool,
    all_values_float: bool,
}

async fn create_offer(mut params: Bound) -> WebResult<Value> {
    Ok(params.take("offer").unwrap_or_default())
}

async fn create_multiple_images(mut params: Bound) -> WebResult<Value> {
    Ok(params.take("images").unwrap_or_default())
}

async fn index_weights(params: Bound) -> WebResult<IndexWeights> {
    let data: Map<String, Value> = params.get("weights")?;
    Ok(IndexWeights {
        all_keys_int: data.keys().all(|key| key.parse::<i64>().is_ok()),
        all_values_float: data.values().all(Value::is_f64),
        data,
    })
}

/// `POST /offers/`, `/images/multiple/` and `/index-weights/`.
#[must_use]
pub fn app() -> App {
    App::new()
        .post(
            "/offers/",
            Endpoint::new(create_offer).param(Param::new("offer", Shape::model(offer_schema()))),
        )
        .post(
            "/images/multiple/",
            Endpoint::new(create_multiple_images)
                .param(Param::new("images", Shape::list(Shape::model(image_schema())))),
        )
        .post(
            "/index-weights/",
            Endpoint::new(index_weights)
                .param(Param::new("weights", Shape::map(Shape::int(), Shape::float()))),
        )
}
