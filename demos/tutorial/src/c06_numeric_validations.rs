//! Numeric validations and aliases.

use parambind_core::{Bound, Param, Shape};
use parambind_web::{App, Endpoint, WebResult};
use serde_json::{Map, Value, json};

async fn read_items(params: Bound) -> WebResult<Value> {
    let mut out = Map::new();
    out.insert("item_id".to_string(), json!(params.get::<i64>("item_id")?));
    if let Some(q) = params.get::<Option<String>>("q")?.filter(|q| !q.is_empty()) {
        out.insert("q".to_string(), json!(q));
    }
    out.insert("size".to_string(), json!(params.get::<f64>("size")?));
    Ok(Value::Object(out))
}

/// `GET /items/{item_id}` with a bounded id, an aliased query and a bounded size.
#[must_use]
pub fn app() -> App {
    App::new().get(
        "/items/{item_id}",
        Endpoint::new(read_items).params([
            Param::path("item_id", Shape::int().gt(0).le(1000)),
            Param::query("q", Shape::str()).optional().alias("item-query"),
            Param::query("size", Shape::float().ge(0).lt(10.5)),
        ]),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use parambind_testing::TestClient;

    fn client() -> TestClient {
        TestClient::from_app(app())
    }

    #[tokio::test]
    async fn test_alias() {
        let response = client().get("/items/42?q=query&size=1").send().await;
        assert!(response.json.get("q").is_none());

        let response = client().get("/items/42?item-query=query&size=1").send().await;
        assert_eq!(response.json["q"], json!("query"));
    }

    #[tokio::test]
    async fn test_numeric_validation() {
        let response = client().get("/items/42?size=10").send().await;
        assert_eq!(response.json, json!({"item_id": 42, "size": 10.0}));

        let response = client().get("/items/42?size=11.5").send().await;
        assert_eq!(response.status, 422);
        assert_eq!(
            response.json,
            json!({"detail": [{
                "loc": ["query", "size"],
                "msg": "ensure this value is less than 10.5",
                "type": "value_error.number.not_lt",
                "ctx": {"limit_value": 10.5}
            }]})
        );
    }

    #[tokio::test]
    async fn test_path_bounds_and_missing_size() {
        let response = client().get("/items/0").send().await;
        assert_eq!(response.status, 422);
        assert_eq!(
            response.json,
            json!({"detail": [
                {
                    "loc": ["path", "item_id"],
                    "msg": "ensure this value is greater than 0",
                    "type": "value_error.number.not_gt",
                    "ctx": {"limit_value": 0}
                },
                {"loc": ["query", "size"], "msg": "field required", "type": "value_error.missing"}
            ]})
        );
    }
}
