//! A handler that suspends on a timer before answering.

use parambind_core::{Bound, Param, Shape};
use parambind_web::{App, Endpoint, WebResult};
use serde_json::{Value, json};
use std::time::Duration;

async fn hello(params: Bound) -> WebResult<Value> {
    let delay_ms: u64 = params.get("delay_ms")?;
    tracing::info!("Hello ...");
    tokio::time::sleep(Duration::from_millis(delay_ms)).await;
    tracing::info!("... World!");
    Ok(json!({"message": "Hello ... World!", "slept_ms": delay_ms}))
}

/// `GET /?delay_ms=` sleeps (one second by default) and greets.
#[must_use]
pub fn app() -> App {
    App::new().get(
        "/",
        Endpoint::new(hello).param(
            Param::query("delay_ms", Shape::int().ge(0).le(5_000)).default(json!(1_000)),
        ),
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use parambind_testing::TestClient;

    #[tokio::test]
    async fn test_hello_after_sleep() {
        let client = TestClient::from_app(app());
        let response = client.get("/?delay_ms=5").send().await;
        assert_eq!(response.status, 200);
        assert_eq!(response.json, json!({"message": "Hello ... World!", "slept_ms": 5}));
    }

    #[tokio::test]
    async fn test_delay_is_bounded() {
        let client = TestClient::from_app(app());
        let response = client.get("/?delay_ms=60000").send().await;
        assert_eq!(response.status, 422);
        assert_eq!(response.findings()[0].kind, "value_error.number.not_le");
    }
}
