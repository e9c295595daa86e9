//! Header parameters.
//!
//! Header names are matched case-insensitively, and `_` in a parameter name
//! stands for `-` unless the parameter keeps its underscores.

use parambind_core::{Bound, Param, Shape};
use parambind_web::{App, Endpoint, WebResult};
use serde_json::{Value, json};

async fn user_agent(params: Bound) -> WebResult<Value> {
    let user_agent: Value = params.get("user_agent")?;
    Ok(json!({"User-Agent": user_agent}))
}

/// `GET`, `POST` and `PATCH` on `/items/`, each reading `user_agent`
/// differently.
#[must_use]
pub fn app() -> App {
    App::new()
        .get(
            "/items/",
            Endpoint::new(user_agent).param(Param::header("user_agent", Shape::str()).optional()),
        )
        .post(
            "/items/",
            Endpoint::new(user_agent)
                .param(Param::header("user_agent", Shape::str()).optional().keep_underscores()),
        )
        .patch(
            "/items/",
            Endpoint::new(user_agent)
                .param(Param::header("user_agent", Shape::list(Shape::str())).optional()),
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use parambind_testing::TestClient;

    const AGENT: &str = "parambind test client";

    fn client() -> TestClient {
        TestClient::from_app(app())
    }

    #[tokio::test]
    async fn test_header() {
        let response = client().get("/items/").header("User-Agent", AGENT).send().await;
        assert_eq!(response.json, json!({"User-Agent": AGENT}));

        let response = client().get("/items/").send().await;
        assert_eq!(response.json, json!({"User-Agent": null}));
    }

    #[tokio::test]
    async fn test_header_not_convert_underscores() {
        let response = client().post("/items/").header("User-Agent", AGENT).send().await;
        assert_eq!(response.json, json!({"User-Agent": null}));

        let response = client().post("/items/").header("User_Agent", AGENT).send().await;
        assert_eq!(response.json, json!({"User-Agent": AGENT}));
    }

    #[tokio::test]
    async fn test_header_value_list() {
        let response = client().patch("/items/").header("User-Agent", AGENT).send().await;
        assert_eq!(response.json, json!({"User-Agent": [AGENT]}));

        let response = client()
            .patch("/items/")
            .header("X-Token", "a")
            .header("user-agent", "first")
            .header("user-agent", "second")
            .send()
            .await;
        assert_eq!(response.json, json!({"User-Agent": ["first", "second"]}));
    }
}
