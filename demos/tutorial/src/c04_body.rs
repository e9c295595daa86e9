//! Request bodies.
//!
//! A model-typed parameter is read from the JSON body. Path, query and body
//! parameters can be mixed on one endpoint.

use parambind_core::{Bound, FieldSpec, ModelSchema, Param, Shape};
use parambind_web::{App, Endpoint, WebResult};
use serde::{Deserialize, Serialize};

/// An item as sent by clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    /// Display name
    pub name: String,
    /// Free text
    pub description: Option<String>,
    /// Unit price
    pub price: f64,
    /// Tax amount, when taxed
    pub tax: Option<f64>,
}

/// Declared shape of [`Item`].
#[must_use]
pub fn item_schema() -> ModelSchema {
    ModelSchema::new(
        "Item",
        vec![
            FieldSpec::required("name", Shape::str()),
            FieldSpec::optional("description", Shape::str()),
            FieldSpec::required("price", Shape::float()),
            FieldSpec::optional("tax", Shape::float()),
        ],
    )
}

#[derive(Serialize)]
struct CreatedItem {
    #[serde(flatten)]
    item: Item,
    #[serde(skip_serializing_if = "Option::is_none")]
    price_with_tax: Option<f64>,
}

#[derive(Serialize)]
struct UpdatedItem {
    item_id: i64,
    #[serde(flatten)]
    item: Item,
    #[serde(skip_serializing_if = "Option::is_none")]
    q: Option<String>,
}

async fn create_item(params: Bound) -> WebResult<CreatedItem> {
    let item: Item = params.get("item")?;
    let price_with_tax = item
        .tax
        .filter(|tax| tax.abs() > f64::EPSILON)
        .map(|tax| item.price + tax);
    Ok(CreatedItem { item, price_with_tax })
}

async fn update_item(params: Bound) -> WebResult<UpdatedItem> {
    Ok(UpdatedItem {
        item_id: params.get("item_id")?,
        item: params.get("item")?,
        q: params.get::<Option<String>>("q")?.filter(|q| !q.is_empty()),
    })
}

/// `POST /items/` and `PUT /items/{item_id}`.
#[must_use]
pub fn app() -> App {
    App::new()
        .post(
            "/items/",
            Endpoint::new(create_item).param(Param::new("item", Shape::model(item_schema()))),
        )
        .put(
            "/items/{item_id}",
            Endpoint::new(update_item).params([
                Param::new("item_id", Shape::int()),
                Param::new("item", Shape::model(item_schema())),
                Param::new("q", Shape::str()).optional(),
            ]),
        )
}
