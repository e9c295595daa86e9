//! Related models built by extension, and non-model response shapes.
//!
//! `UserIn`, `UserOut` and `UserInDB` all extend `UserBase`. Responses can be
//! declared as a union of models, a list of models or a plain map.

use parambind_core::{Bound, FieldSpec, ModelSchema, Param, ResponseModel, Shape};
use parambind_web::{App, Endpoint, WebResult};
use serde_json::{Value, json};

fn user_base() -> ModelSchema {
    ModelSchema::new(
        "UserBase",
        vec![
            FieldSpec::required("username", Shape::str()),
            FieldSpec::required("email", Shape::Email),
            FieldSpec::optional("full_name", Shape::str()),
        ],
    )
}

fn user_in() -> ModelSchema {
    ModelSchema::extend(&user_base(), "UserIn", vec![FieldSpec::required("password", Shape::str())])
}

fn user_out() -> ModelSchema {
    ModelSchema::extend(&user_base(), "UserOut", Vec::new())
}

fn user_in_db() -> ModelSchema {
    ModelSchema::extend(
        &user_base(),
        "UserInDB",
        vec![FieldSpec::required("hashed_password", Shape::str())],
    )
}

fn fake_password_hasher(raw_password: &str) -> String {
    format!("supersecret{raw_password}")
}

/// Pretend to persist the user; returns the stored record.
fn fake_save_user(mut user_in: Value) -> Value {
    let hashed = user_in
        .get("password")
        .and_then(Value::as_str)
        .map(fake_password_hasher);
    if let (Some(record), Some(hashed)) = (user_in.as_object_mut(), hashed) {
        record.remove("password");
        record.insert("hashed_password".to_string(), Value::String(hashed));
    }
    tracing::info!("User saved! ..not really");
    user_in
}

async fn create_user(mut params: Bound) -> WebResult<Value> {
    Ok(fake_save_user(params.take("user_in").unwrap_or_default()))
}

async fn put_user(mut params: Bound) -> WebResult<Value> {
    Ok(params.take("user_in").unwrap_or_default())
}

async fn patch_users(mut params: Bound) -> WebResult<Value> {
    let user = params.take("user_in").unwrap_or_default();
    Ok(Value::Array(vec![user; 3]))
}

async fn read_keyword_weights(_params: Bound) -> WebResult<Value> {
    Ok(json!({"foo": 2.3, "bar": 3.4}))
}

fn user_in_param() -> Param {
    Param::new("user_in", Shape::model(user_in()))
}

/// User endpoints under `/user/` and `/users/`, plus `GET /keyword-weights/`.
#[must_use]
pub fn app() -> App {
    App::new()
        .post(
            "/user/",
            Endpoint::new(create_user)
                .param(user_in_param())
                .response_model(ResponseModel::new(Shape::model(user_out()))),
        )
        .put(
            "/user/",
            Endpoint::new(put_user).param(user_in_param()).response_model(ResponseModel::new(
                Shape::Union(vec![Shape::model(user_in_db()), Shape::model(user_out())]),
            )),
        )
        .patch(
            "/users/",
            Endpoint::new(patch_users)
                .param(user_in_param())
                .response_model(ResponseModel::new(Shape::list(Shape::model(user_out())))),
        )
        .get(
            "/keyword-weights/",
            Endpoint::new(read_keyword_weights)
                .response_model(ResponseModel::new(Shape::map(Shape::str(), Shape::float()))),
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use parambind_testing::TestClient;

    fn user_in_body() -> Value {
        json!({
            "username": "john",
            "password": "secret",
            "email": "john.doe@example.com",
            "full_name": "John Doe"
        })
    }

    fn user_out_body() -> Value {
        json!({"username": "john", "email": "john.doe@example.com", "full_name": "John Doe"})
    }

    fn client() -> TestClient {
        TestClient::from_app(app())
    }

    #[test]
    fn test_extension_keeps_base_fields_first() {
        let model = user_in_db();
        let names: Vec<&str> = model.fields().iter().map(FieldSpec::name).collect();
        assert_eq!(names, ["username", "email", "full_name", "hashed_password"]);
    }

    #[test]
    fn test_saved_user_has_hash_instead_of_password() {
        let saved = fake_save_user(user_in_body());
        assert_eq!(saved["hashed_password"], json!("supersecretsecret"));
        assert!(saved.get("password").is_none());
    }

    #[tokio::test]
    async fn test_create_user_hides_secrets() {
        let response = client().post("/user/").json(&user_in_body()).send().await;
        assert_eq!(response.status, 200);
        assert_eq!(response.json, user_out_body());
    }

    #[tokio::test]
    async fn test_union_falls_back_to_second_member() {
        let response = client().put("/user/").json(&user_in_body()).send().await;
        assert_eq!(response.status, 200);
        assert_eq!(response.json, user_out_body());
    }

    #[tokio::test]
    async fn test_list_response() {
        let response = client().patch("/users/").json(&user_in_body()).send().await;
        assert_eq!(response.status, 200);
        assert_eq!(response.json, json!([user_out_body(), user_out_body(), user_out_body()]));
    }

    #[tokio::test]
    async fn test_keyword_weights() {
        let response = client().get("/keyword-weights/").send().await;
        assert_eq!(response.json, json!({"foo": 2.3, "bar": 3.4}));
    }

    #[tokio::test]
    async fn test_invalid_email() {
        let mut body = user_in_body();
        body["email"] = json!("john.doe");
        let response = client().post("/user/").json(&body).send().await;
        assert_eq!(response.status, 422);
        assert_eq!(
            response.json,
            json!({"detail": [{
                "loc": ["body", "email"],
                "msg": "value is not a valid email address",
                "type": "value_error.email"
            }]})
        );
    }
}
