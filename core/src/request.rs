//! Transport-independent view of an incoming request.

use http::{HeaderMap, Method, header::COOKIE};
use percent_encoding::percent_decode_str;
use serde_json::Value;

/// The parts of a request the binder reads.
///
/// The path is percent-decoded on construction; query entries keep their
/// order so repeated keys can be read as "last wins" or as a list.
///
/// # Examples
///
/// ```
/// use http::Method;
/// use parambind_core::RawRequest;
///
/// let request = RawRequest::new(Method::GET, "/items/?q=four&q=five");
/// assert_eq!(request.path(), "/items/");
/// assert_eq!(request.query_last("q"), Some("five"));
/// assert_eq!(request.query_all("q"), vec!["four", "five"]);
/// ```
#[derive(Debug, Clone)]
pub struct RawRequest {
    method: Method,
    path: String,
    query: Vec<(String, String)>,
    headers: HeaderMap,
    cookies: Vec<(String, String)>,
    body: Vec<u8>,
}

impl RawRequest {
    /// Build from a method and a request target (`/path?query`).
    #[must_use]
    pub fn new(method: Method, target: &str) -> Self {
        let (path, query) = match target.split_once('?') {
            Some((path, query)) => (path, Some(query)),
            None => (target, None),
        };
        Self::from_parts(method, path, query, HeaderMap::new(), Vec::new())
    }

    /// Build from already-separated parts.
    #[must_use]
    pub fn from_parts(
        method: Method,
        raw_path: &str,
        raw_query: Option<&str>,
        headers: HeaderMap,
        body: Vec<u8>,
    ) -> Self {
        let path = percent_decode_str(raw_path).decode_utf8_lossy().into_owned();
        let query = raw_query
            .map(|q| {
                url::form_urlencoded::parse(q.as_bytes())
                    .map(|(k, v)| (k.into_owned(), v.into_owned()))
                    .collect()
            })
            .unwrap_or_default();
        let cookies = parse_cookies(&headers);
        Self {
            method,
            path,
            query,
            headers,
            cookies,
            body,
        }
    }

    /// Replace the headers (cookies are re-read from them).
    #[must_use]
    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.cookies = parse_cookies(&headers);
        self.headers = headers;
        self
    }

    /// Replace the body.
    #[must_use]
    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    /// Request method.
    #[must_use]
    pub const fn method(&self) -> &Method {
        &self.method
    }

    /// Decoded request path.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Last query value for `key`.
    #[must_use]
    pub fn query_last(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .rev()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Every query value for `key`, in order.
    #[must_use]
    pub fn query_all(&self, key: &str) -> Vec<&str> {
        self.query
            .iter()
            .filter(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
            .collect()
    }

    /// First value of header `name` (case-insensitive). Non-UTF-8 values are
    /// treated as absent.
    #[must_use]
    pub fn header_first(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Every value of header `name`.
    #[must_use]
    pub fn header_all(&self, name: &str) -> Vec<&str> {
        self.headers
            .get_all(name)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .collect()
    }

    /// Cookie value; the last occurrence wins.
    #[must_use]
    pub fn cookie(&self, name: &str) -> Option<&str> {
        self.cookies
            .iter()
            .rev()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Raw body bytes.
    #[must_use]
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Body parsed as JSON; an empty body is `None`.
    ///
    /// # Errors
    ///
    /// Returns the JSON parser's error for a malformed body.
    pub fn json_body(&self) -> Result<Option<Value>, serde_json::Error> {
        if self.body.iter().all(u8::is_ascii_whitespace) {
            return Ok(None);
        }
        serde_json::from_slice(&self.body).map(Some)
    }
}

fn parse_cookies(headers: &HeaderMap) -> Vec<(String, String)> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|line| line.split(';'))
        .filter_map(|pair| {
            let (name, value) = pair.split_once('=')?;
            let name = name.trim();
            if name.is_empty() {
                return None;
            }
            let value = value.trim();
            let value = value
                .strip_prefix('"')
                .and_then(|v| v.strip_suffix('"'))
                .unwrap_or(value);
            Some((name.to_string(), value.to_string()))
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use http::HeaderValue;

    #[test]
    fn test_path_is_decoded() {
        let request = RawRequest::new(Method::GET, "/files/a%20b/~%2F");
        assert_eq!(request.path(), "/files/a b/~/");
    }

    #[test]
    fn test_query_plus_and_escapes() {
        let request = RawRequest::new(Method::GET, "/items?item-query=a+b&x=%26");
        assert_eq!(request.query_last("item-query"), Some("a b"));
        assert_eq!(request.query_last("x"), Some("&"));
        assert_eq!(request.query_last("missing"), None);
    }

    #[test]
    fn test_headers_are_case_insensitive() {
        let mut headers = HeaderMap::new();
        headers.insert("User-Agent", HeaderValue::from_static("test client"));
        let request = RawRequest::new(Method::GET, "/").with_headers(headers);
        assert_eq!(request.header_first("user-agent"), Some("test client"));
        assert_eq!(request.header_all("USER-AGENT"), vec!["test client"]);
    }

    #[test]
    fn test_cookie_parsing() {
        let mut headers = HeaderMap::new();
        headers.append(COOKIE, HeaderValue::from_static("ads_id=abc; theme=\"dark\""));
        headers.append(COOKIE, HeaderValue::from_static("ads_id=xyz"));
        let request = RawRequest::new(Method::GET, "/").with_headers(headers);
        assert_eq!(request.cookie("ads_id"), Some("xyz"));
        assert_eq!(request.cookie("theme"), Some("dark"));
        assert_eq!(request.cookie("none"), None);
    }

    #[test]
    fn test_json_body() {
        let empty = RawRequest::new(Method::POST, "/").with_body("  ");
        assert!(empty.json_body().unwrap().is_none());

        let valid = RawRequest::new(Method::POST, "/").with_body(r#"{"a":1}"#);
        assert_eq!(valid.json_body().unwrap(), Some(serde_json::json!({"a": 1})));

        let broken = RawRequest::new(Method::POST, "/").with_body("{");
        assert!(broken.json_body().is_err());
    }
}
