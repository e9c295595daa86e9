//! String validations on query parameters.

use parambind_core::{Bound, Param, Shape};
use parambind_web::{App, Endpoint, WebResult};
use regex::Regex;
use serde_json::{Map, Value, json};

async fn read_items(params: Bound) -> WebResult<Value> {
    let mut out = Map::new();
    if let Some(q) = params.get::<Option<String>>("q")?.filter(|q| !q.is_empty()) {
        out.insert("q".to_string(), json!(q));
    }
    Ok(Value::Object(out))
}

async fn multi_q(params: Bound) -> WebResult<Value> {
    let q: Option<Vec<String>> = params.get("q")?;
    Ok(json!({"q": q}))
}

/// Length-limited, pattern-checked and repeated query parameters.
///
/// # Errors
///
/// Fails if the `/fixed/` pattern does not compile.
pub fn app() -> Result<App, regex::Error> {
    let fixed = Regex::new("^fixedquery$")?;
    Ok(App::new()
        .get(
            "/items/",
            Endpoint::new(read_items).param(Param::new("q", Shape::str().max_length(5)).optional()),
        )
        .get(
            "/fixed/",
            Endpoint::new(read_items)
                .param(Param::new("q", Shape::str().min_length(3).pattern(fixed)).optional()),
        )
        .get(
            "/multi_q/",
            Endpoint::new(multi_q).param(Param::query("q", Shape::list(Shape::str())).optional()),
        ))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use parambind_testing::TestClient;

    fn client() -> TestClient {
        TestClient::from_app(app().unwrap())
    }

    #[tokio::test]
    async fn test_optional_q() {
        assert_eq!(client().get("/items/").send().await.json, json!({}));
        assert_eq!(client().get("/items/?q=four").send().await.json, json!({"q": "four"}));
        assert_eq!(
            client().get("/items/?q=four&q=five").send().await.json,
            json!({"q": "five"})
        );

        let response = client().get("/items/?q=eleven").send().await;
        assert_eq!(response.status, 422);
        assert_eq!(
            response.json,
            json!({"detail": [{
                "loc": ["query", "q"],
                "msg": "ensure this value has at most 5 characters",
                "type": "value_error.any_str.max_length",
                "ctx": {"limit_value": 5}
            }]})
        );
    }

    #[tokio::test]
    async fn test_pattern_and_min_length() {
        let response = client().get("/fixed/?q=fixedquery").send().await;
        assert_eq!(response.json, json!({"q": "fixedquery"}));

        let response = client().get("/fixed/?q=fq").send().await;
        assert_eq!(response.findings()[0].kind, "value_error.any_str.min_length");

        let response = client().get("/fixed/?q=otherquery").send().await;
        assert_eq!(response.status, 422);
        let finding = &response.findings()[0];
        assert_eq!(finding.kind, "value_error.str.regex");
        assert_eq!(finding.ctx.as_ref().map(|ctx| ctx["pattern"].clone()), Some(json!("^fixedquery$")));
    }

    #[tokio::test]
    async fn test_optional_multi_q() {
        assert_eq!(client().get("/multi_q/").send().await.json, json!({"q": null}));
        assert_eq!(client().get("/multi_q/?q=four").send().await.json, json!({"q": ["four"]}));
        assert_eq!(
            client().get("/multi_q/?q=four&q=five").send().await.json,
            json!({"q": ["four", "five"]})
        );
    }
}
