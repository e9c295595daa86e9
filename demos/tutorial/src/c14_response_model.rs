//! Response models.
//!
//! The declared output shape filters what the handler returns: undeclared
//! fields are dropped and excluded fields never leave the server.

use parambind_core::{Bound, FieldSpec, ModelSchema, Param, ResponseModel, Shape};
use parambind_web::{App, Endpoint, WebResult};
use serde_json::Value;

fn user_out_fields() -> Vec<FieldSpec> {
    vec![
        FieldSpec::required("user_name", Shape::str()),
        FieldSpec::required("email", Shape::str()),
        FieldSpec::optional("full_name", Shape::str()),
    ]
}

fn user_out() -> ModelSchema {
    ModelSchema::new("UserOut", user_out_fields())
}

fn user_in() -> ModelSchema {
    let mut fields = user_out_fields();
    fields.insert(1, FieldSpec::required("password", Shape::str()));
    ModelSchema::new("UserIn", fields)
}

async fn echo_user(mut params: Bound) -> WebResult<Value> {
    Ok(params.take("user").unwrap_or_default())
}

fn user_endpoint(model: ResponseModel) -> Endpoint {
    Endpoint::new(echo_user)
        .param(Param::new("user", Shape::model(user_in())))
        .response_model(model)
}

/// `POST /users/` and `PUT /users/` return the submitted user without its
/// password; `POST /users/compact/` also drops null fields.
#[must_use]
pub fn app() -> App {
    App::new()
        .post("/users/", user_endpoint(ResponseModel::new(Shape::model(user_out()))))
        .put(
            "/users/",
            user_endpoint(ResponseModel::new(Shape::model(user_in())).exclude(["password"])),
        )
        .post(
            "/users/compact/",
            user_endpoint(ResponseModel::new(Shape::model(user_out())).exclude_none()),
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use parambind_testing::TestClient;
    use serde_json::json;

    fn user_without_password() -> Value {
        json!({"user_name": "leo", "email": "leo@github.com", "full_name": "leo leo"})
    }

    #[tokio::test]
    async fn test_user_out() {
        let client = TestClient::from_app(app());
        let mut user = user_without_password();
        user["password"] = json!("pass_w0rd");

        let response = client.post("/users/").json(&user).send().await;
        assert_eq!(response.status, 200);
        assert_eq!(response.json, user_without_password());

        let response = client.put("/users/").json(&user).send().await;
        assert_eq!(response.status, 200);
        assert_eq!(response.json, user_without_password());
    }

    #[tokio::test]
    async fn test_exclude_none() {
        let client = TestClient::from_app(app());
        let user = json!({"user_name": "leo", "password": "pw", "email": "leo@github.com"});

        let response = client.post("/users/").json(&user).send().await;
        assert_eq!(response.json["full_name"], Value::Null);
        assert!(response.json.as_object().is_some_and(|o| o.contains_key("full_name")));

        let response = client.post("/users/compact/").json(&user).send().await;
        assert_eq!(response.json, json!({"user_name": "leo", "email": "leo@github.com"}));
    }
}
