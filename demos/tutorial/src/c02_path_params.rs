//! Path parameters.
//!
//! - an untyped placeholder keeps the raw text, a typed one is coerced
//! - `/users/me` wins over `/users/{user_id}` regardless of declaration order
//! - an enumeration accepts only its literals
//! - `{file_path:path}` captures separators, `{file_path}` does not

use parambind_core::{Bound, EnumShape, Param, Shape};
use parambind_web::{App, Endpoint, WebResult};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// Known model names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelName {
    /// `alexnet`
    Alexnet,
    /// `resnet`
    Resnet,
    /// `lenet`
    Lenet,
}

impl ModelName {
    /// Literals in declaration order.
    pub const LITERALS: [&'static str; 3] = ["alexnet", "resnet", "lenet"];

    fn shape() -> Shape {
        Shape::Enum(EnumShape::new("ModelName", Self::LITERALS))
    }

    const fn message(self) -> &'static str {
        match self {
            Self::Alexnet => "Deep Learning FTW!",
            Self::Lenet => "LeCNN all the images",
            Self::Resnet => "Have some residuals",
        }
    }
}

fn echo(name: &'static str) -> impl Fn(Bound) -> WebResult<Value> + Send + Sync + 'static {
    move |params| Ok(json!({ name: params.value(name) }))
}

async fn read_user_me(_: Bound) -> WebResult<Value> {
    Ok(json!({"user_id": "the current user"}))
}

async fn get_model(params: Bound) -> WebResult<Value> {
    let model_name: ModelName = params.get("model_name")?;
    Ok(json!({"model_name": model_name, "message": model_name.message()}))
}

/// Path parameter routes.
#[must_use]
pub fn app() -> App {
    App::new()
        .get(
            "/items/{item_id}",
            Endpoint::sync(echo("item_id")).param(Param::new("item_id", Shape::Any)),
        )
        .post(
            "/items/{item_id}",
            Endpoint::sync(echo("item_id")).param(Param::new("item_id", Shape::int())),
        )
        .get(
            "/users/{user_id}",
            Endpoint::sync(echo("user_id")).param(Param::new("user_id", Shape::str())),
        )
        .get("/users/me", Endpoint::new(read_user_me))
        .get(
            "/models/{model_name}",
            Endpoint::new(get_model).param(Param::new("model_name", ModelName::shape())),
        )
        .get(
            "/files/{file_path:path}",
            Endpoint::sync(echo("file_path")).param(Param::new("file_path", Shape::str())),
        )
        .get(
            "/not_path/{file_path}",
            Endpoint::sync(echo("file_path")).param(Param::new("file_path", Shape::str())),
        )
}
