//! Tutorial chapters.
//!
//! Each module is one chapter: a handful of endpoints exposed through
//! `app()`, and tests showing how requests bind, fail validation and get
//! shaped on the way out. [`app`] mounts every chapter under its own prefix
//! (`/c01`, `/c02`, ...; the hello chapter under `/hello`).

#![allow(clippy::module_name_repetitions)]

use parambind_web::App;

pub mod c01_first_steps;
pub mod c02_path_params;
pub mod c03_query_params;
pub mod c04_body;
pub mod c05_query_validations;
pub mod c06_numeric_validations;
pub mod c07_multiple_body;
pub mod c08_body_fields;
pub mod c09_nested_models;
pub mod c10_schema_examples;
pub mod c11_extra_types;
pub mod c12_cookie_params;
pub mod c13_header_params;
pub mod c14_response_model;
pub mod c15_extra_models;
pub mod hello;

/// Every chapter, each under its own prefix.
///
/// # Errors
///
/// Fails if a chapter's declared patterns do not compile.
pub fn app() -> Result<App, regex::Error> {
    Ok(App::new()
        .nest("/hello", hello::app())
        .nest("/c01", c01_first_steps::app())
        .nest("/c02", c02_path_params::app())
        .nest("/c03", c03_query_params::app())
        .nest("/c04", c04_body::app())
        .nest("/c05", c05_query_validations::app()?)
        .nest("/c06", c06_numeric_validations::app())
        .nest("/c07", c07_multiple_body::app())
        .nest("/c08", c08_body_fields::app())
        .nest("/c09", c09_nested_models::app())
        .nest("/c10", c10_schema_examples::app())
        .nest("/c11", c11_extra_types::app())
        .nest("/c12", c12_cookie_params::app())
        .nest("/c13", c13_header_params::app())
        .nest("/c14", c14_response_model::app())
        .nest("/c15", c15_extra_models::app()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use parambind_testing::TestClient;
    use serde_json::json;

    #[test]
    fn test_all_chapters_compile_together() {
        let dispatcher = app().unwrap().build().unwrap();
        assert!(dispatcher.route_count() > 30);
    }

    #[tokio::test]
    async fn test_chapters_are_mounted_under_prefixes() {
        let client = TestClient::from_app(app().unwrap());
        let response = client.get("/c01").send().await;
        assert_eq!(response.status, 200);
        assert_eq!(response.json, json!({"message": "hello world"}));

        let response = client.get("/c02/users/me").send().await;
        assert_eq!(response.json, json!({"user_id": "the current user"}));

        let response = client.get("/c99/").send().await;
        assert_eq!(response.status, 404);
    }
}
