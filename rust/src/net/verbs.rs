// File: net/verbs.rs
// One helper per HTTP verb, each a thin call into the dispatcher.

use crate::core::error::CoreError;
use crate::core::http::{HttpConfig, DEFAULT_CONFIG};
use crate::core::json::parse_json_from_text;
use crate::core::request_impl::{dispatch, dispatch_raw, Body, Content, HttpRequest, TextEncoding};
use serde::de::DeserializeOwned;
use std::collections::HashMap;

pub type Headers = Option<HashMap<String, String>>;

/// Verb helpers bound to one configuration.
///
/// Every call blocks the current thread. From async code use
/// [`dispatch_async`](crate::core::request_impl::dispatch_async) instead.
#[derive(Debug, Clone, Default)]
pub struct Http {
    config: HttpConfig,
}

impl Http {
    pub fn new(config: HttpConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &HttpConfig {
        &self.config
    }

    fn send(&self, request: HttpRequest) -> Result<String, CoreError> {
        dispatch(&self.config, &request)?.into_text()
    }

    /// GET with an explicit encoding; `None` yields raw bytes.
    pub fn get_encoded(
        &self,
        url: &str,
        headers: Headers,
        encoding: Option<TextEncoding>,
    ) -> Result<Content, CoreError> {
        let request = HttpRequest::new(url).headers(headers).encoding(encoding);
        dispatch(&self.config, &request)
    }

    pub fn get(&self, url: &str, headers: Headers) -> Result<String, CoreError> {
        self.get_encoded(url, headers, Some(TextEncoding::Utf8))?.into_text()
    }

    pub fn get_bytes(&self, url: &str, headers: Headers) -> Result<Vec<u8>, CoreError> {
        Ok(self.get_encoded(url, headers, None)?.into_bytes())
    }

    pub fn get_json<T: DeserializeOwned>(&self, url: &str, headers: Headers) -> Result<T, CoreError> {
        parse_json_from_text(&self.get(url, headers)?, "GET")
    }

    /// POST `body`; pass `Body::empty()` to send nothing.
    pub fn post(
        &self,
        url: &str,
        body: impl Into<Body>,
        headers: Headers,
    ) -> Result<String, CoreError> {
        self.send(HttpRequest::new(url).method("POST").headers(headers).body(body))
    }

    pub fn post_json<T: DeserializeOwned>(
        &self,
        url: &str,
        body: impl Into<Body>,
        headers: Headers,
    ) -> Result<T, CoreError> {
        parse_json_from_text(&self.post(url, body, headers)?, "POST")
    }

    pub fn put(
        &self,
        url: &str,
        body: impl Into<Body>,
        headers: Headers,
    ) -> Result<String, CoreError> {
        self.send(HttpRequest::new(url).method("PUT").headers(headers).body(body))
    }

    pub fn put_json<T: DeserializeOwned>(
        &self,
        url: &str,
        body: impl Into<Body>,
        headers: Headers,
    ) -> Result<T, CoreError> {
        parse_json_from_text(&self.put(url, body, headers)?, "PUT")
    }

    pub fn delete(
        &self,
        url: &str,
        body: Option<Body>,
        headers: Headers,
    ) -> Result<String, CoreError> {
        let mut request = HttpRequest::new(url).method("DELETE").headers(headers);
        request.body = body;
        self.send(request)
    }

    pub fn delete_json<T: DeserializeOwned>(
        &self,
        url: &str,
        body: Option<Body>,
        headers: Headers,
    ) -> Result<T, CoreError> {
        parse_json_from_text(&self.delete(url, body, headers)?, "DELETE")
    }

    /// Response headers of an OPTIONS request. A repeated header keeps its last value.
    pub fn options(&self, url: &str, headers: Headers) -> Result<HashMap<String, String>, CoreError> {
        let request = HttpRequest::new(url).method("OPTIONS").headers(headers);
        let response = dispatch_raw(&self.config, &request)?;
        Ok(header_map(response.headers()))
    }
}

// Module-level shortcuts using DEFAULT_CONFIG.

pub fn get(url: &str, headers: Headers) -> Result<String, CoreError> {
    default_http().get(url, headers)
}

pub fn get_bytes(url: &str, headers: Headers) -> Result<Vec<u8>, CoreError> {
    default_http().get_bytes(url, headers)
}

pub fn get_json<T: DeserializeOwned>(url: &str, headers: Headers) -> Result<T, CoreError> {
    default_http().get_json(url, headers)
}

pub fn post(url: &str, body: impl Into<Body>, headers: Headers) -> Result<String, CoreError> {
    default_http().post(url, body, headers)
}

pub fn post_json<T: DeserializeOwned>(
    url: &str,
    body: impl Into<Body>,
    headers: Headers,
) -> Result<T, CoreError> {
    default_http().post_json(url, body, headers)
}

pub fn put(url: &str, body: impl Into<Body>, headers: Headers) -> Result<String, CoreError> {
    default_http().put(url, body, headers)
}

pub fn put_json<T: DeserializeOwned>(
    url: &str,
    body: impl Into<Body>,
    headers: Headers,
) -> Result<T, CoreError> {
    default_http().put_json(url, body, headers)
}

pub fn delete(url: &str, body: Option<Body>, headers: Headers) -> Result<String, CoreError> {
    default_http().delete(url, body, headers)
}

pub fn delete_json<T: DeserializeOwned>(
    url: &str,
    body: Option<Body>,
    headers: Headers,
) -> Result<T, CoreError> {
    default_http().delete_json(url, body, headers)
}

pub fn options(url: &str, headers: Headers) -> Result<HashMap<String, String>, CoreError> {
    default_http().options(url, headers)
}

fn default_http() -> Http {
    Http::new(DEFAULT_CONFIG.clone())
}

fn header_map(headers: &reqwest::header::HeaderMap) -> HashMap<String, String> {
    let mut map = HashMap::new();
    for (name, value) in headers {
        map.insert(
            name.to_string(),
            String::from_utf8_lossy(value.as_bytes()).into_owned(),
        );
    }
    map
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::{HeaderMap, HeaderValue};
    use serde_json::{json, Value};
    use wiremock::matchers::{body_string, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn local() -> Http {
        Http::new(HttpConfig::default().without_system_proxy())
    }

    // Verb helpers block, so they run off the runtime workers.
    async fn run_blocking<T, F>(f: F) -> T
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        tokio::task::spawn_blocking(f)
            .await
            .expect("blocking task panicked")
    }

    #[test]
    fn test_header_map_last_value_wins() {
        let mut headers = HeaderMap::new();
        headers.append("X-A", HeaderValue::from_static("1"));
        headers.append("X-A", HeaderValue::from_static("2"));
        headers.append("X-B", HeaderValue::from_static("b"));

        let map = header_map(&headers);
        assert_eq!(map.len(), 2);
        assert_eq!(map["x-a"], "2");
        assert_eq!(map["x-b"], "b");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_get_json_decodes_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/data"))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"a":1}"#))
            .expect(1)
            .mount(&server)
            .await;

        let url = format!("{}/data", server.uri());
        let value: Value = run_blocking(move || local().get_json(&url, None))
            .await
            .unwrap();
        assert_eq!(value, json!({"a": 1}));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_get_json_rejects_invalid_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>not json</html>"))
            .mount(&server)
            .await;

        let url = server.uri();
        let result: Result<Value, _> = run_blocking(move || local().get_json(&url, None)).await;
        assert!(matches!(result, Err(CoreError::Parse(_))));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_get_bytes() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"bytes".to_vec()))
            .mount(&server)
            .await;

        let url = server.uri();
        let bytes = run_blocking(move || local().get_bytes(&url, None)).await;
        assert_eq!(bytes.unwrap(), b"bytes".to_vec());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_post_json_with_json_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/submit"))
            .and(header("content-type", "application/json"))
            .and(body_string(r#"{"k": "v"}"#))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
            .expect(1)
            .mount(&server)
            .await;

        let url = format!("{}/submit", server.uri());
        let headers = HashMap::from([(
            "Content-Type".to_string(),
            "application/json".to_string(),
        )]);
        let value: Value =
            run_blocking(move || local().post_json(&url, json!({"k": "v"}), Some(headers)))
                .await
                .unwrap();
        assert_eq!(value, json!({"ok": true}));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_put_empty_body_sends_nothing() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/x"))
            .respond_with(ResponseTemplate::new(200).set_body_string("updated"))
            .expect(1)
            .mount(&server)
            .await;

        let url = format!("{}/x", server.uri());
        let text = run_blocking(move || local().put(&url, Body::empty(), None)).await;
        assert_eq!(text.unwrap(), "updated");

        let received = server.received_requests().await.unwrap();
        assert_eq!(received.len(), 1);
        assert!(received[0].body.is_empty());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_delete_json() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/x/1"))
            .respond_with(ResponseTemplate::new(200).set_body_string("[1, 2, 3]"))
            .expect(1)
            .mount(&server)
            .await;

        let url = format!("{}/x/1", server.uri());
        let value: Vec<u32> = run_blocking(move || local().delete_json(&url, None, None))
            .await
            .unwrap();
        assert_eq!(value, vec![1, 2, 3]);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_options_collapses_repeated_headers() {
        let server = MockServer::start().await;
        Mock::given(method("OPTIONS"))
            .respond_with(
                ResponseTemplate::new(200)
                    .append_header("X-A", "1")
                    .append_header("X-A", "2")
                    .insert_header("Allow", "GET, OPTIONS"),
            )
            .expect(1)
            .mount(&server)
            .await;

        let url = server.uri();
        let headers = run_blocking(move || local().options(&url, None))
            .await
            .unwrap();
        assert_eq!(headers["x-a"], "2");
        assert_eq!(headers["allow"], "GET, OPTIONS");
    }
}
