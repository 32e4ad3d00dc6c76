// File: core/request_impl.rs
// The dispatcher: one synchronous HTTP request per call.

use super::error::CoreError;
use super::http::HttpConfig;
use super::json::to_body_json;
use log::debug;
use reqwest::{
    blocking,
    header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE},
    Method,
};
use std::collections::HashMap;
use std::str::FromStr;
use url::Url;

const JSON_MEDIA_TYPE: &str = "application/json";

/// How a response body is turned into text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextEncoding {
    #[default]
    Utf8,
    Ascii,
    Latin1,
}

impl TextEncoding {
    /// Looks up an encoding by one of its common labels (`"utf-8"`, `"latin-1"`, ...).
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "utf-8" | "utf8" => Some(TextEncoding::Utf8),
            "ascii" | "us-ascii" => Some(TextEncoding::Ascii),
            "latin-1" | "latin1" | "iso-8859-1" | "iso8859-1" => Some(TextEncoding::Latin1),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            TextEncoding::Utf8 => "utf-8",
            TextEncoding::Ascii => "ascii",
            TextEncoding::Latin1 => "latin-1",
        }
    }

    pub fn decode(self, bytes: Vec<u8>) -> Result<String, CoreError> {
        match self {
            TextEncoding::Utf8 => String::from_utf8(bytes).map_err(|e| CoreError::Decode {
                encoding: self.name(),
                message: e.utf8_error().to_string(),
            }),
            TextEncoding::Ascii => match bytes.iter().position(|b| !b.is_ascii()) {
                Some(pos) => Err(CoreError::Decode {
                    encoding: self.name(),
                    message: format!("byte {:#04x} at offset {}", bytes[pos], pos),
                }),
                None => Ok(bytes.into_iter().map(char::from).collect()),
            },
            TextEncoding::Latin1 => Ok(bytes.into_iter().map(char::from).collect()),
        }
    }
}

/// Request payload.
#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    Text(String),
    Bytes(Vec<u8>),
    /// Serialized only when the request declares a JSON content type.
    Json(serde_json::Value),
}

impl Body {
    /// The default POST/PUT payload; sends nothing.
    pub fn empty() -> Self {
        Body::Text(String::new())
    }
}

impl From<&str> for Body {
    fn from(s: &str) -> Self {
        Body::Text(s.to_string())
    }
}

impl From<String> for Body {
    fn from(s: String) -> Self {
        Body::Text(s)
    }
}

impl From<Vec<u8>> for Body {
    fn from(b: Vec<u8>) -> Self {
        Body::Bytes(b)
    }
}

impl From<serde_json::Value> for Body {
    fn from(v: serde_json::Value) -> Self {
        Body::Json(v)
    }
}

#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub url: String,
    pub method: String,
    pub headers: HashMap<String, String>,
    pub body: Option<Body>,
    /// `None` returns the body as raw bytes.
    pub encoding: Option<TextEncoding>,
}

impl HttpRequest {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method: "GET".to_string(),
            headers: HashMap::new(),
            body: None,
            encoding: Some(TextEncoding::Utf8),
        }
    }

    pub fn method(mut self, method: impl Into<String>) -> Self {
        self.method = method.into();
        self
    }

    /// Sets a header, replacing any entry whose name differs only in case.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let name = name.into();
        self.headers.retain(|k, _| !k.eq_ignore_ascii_case(&name));
        self.headers.insert(name, value.into());
        self
    }

    /// Merges `headers` as given. Names that collide case-insensitively are
    /// rejected when the request is sent.
    pub fn headers(mut self, headers: Option<HashMap<String, String>>) -> Self {
        if let Some(headers) = headers {
            self.headers.extend(headers);
        }
        self
    }

    pub fn body(mut self, body: impl Into<Body>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn encoding(mut self, encoding: Option<TextEncoding>) -> Self {
        self.encoding = encoding;
        self
    }

    fn content_type(&self) -> Result<Option<&str>, CoreError> {
        let mut found = self
            .headers
            .iter()
            .filter(|(k, _)| k.eq_ignore_ascii_case(CONTENT_TYPE.as_str()));
        let first = found.next().map(|(_, v)| v.as_str());
        if found.next().is_some() {
            return Err(duplicate_header(CONTENT_TYPE.as_str()));
        }
        Ok(first)
    }

    /// True when the declared media type is JSON, parameters ignored.
    fn declares_json(&self) -> Result<bool, CoreError> {
        Ok(self
            .content_type()?
            .and_then(|ct| ct.split(';').next())
            .map(|essence| essence.trim().eq_ignore_ascii_case(JSON_MEDIA_TYPE))
            .unwrap_or(false))
    }

    /// Bytes to transmit, or `None` when there is no (or an empty) body.
    pub fn body_bytes(&self) -> Result<Option<Vec<u8>>, CoreError> {
        let bytes = match &self.body {
            None => return Ok(None),
            Some(Body::Text(s)) => s.as_bytes().to_vec(),
            Some(Body::Bytes(b)) => b.clone(),
            Some(Body::Json(value)) => {
                if !self.declares_json()? {
                    return Err(CoreError::InvalidBody(format!(
                        "structured body requires Content-Type {}",
                        JSON_MEDIA_TYPE
                    )));
                }
                to_body_json(value)?.into_bytes()
            }
        };
        Ok(if bytes.is_empty() { None } else { Some(bytes) })
    }

    fn parts(&self) -> Result<(Method, Url, HeaderMap, Option<Vec<u8>>), CoreError> {
        let url = Url::parse(&self.url).map_err(CoreError::UrlParse)?;
        let method = Method::from_str(&self.method)
            .map_err(|_| CoreError::InvalidMethod(self.method.clone()))?;
        let headers = build_header_map(&self.headers)?;
        let body = self.body_bytes()?;
        Ok((method, url, headers, body))
    }
}

/// Response body after the encoding step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Content {
    Text(String),
    Bytes(Vec<u8>),
}

impl Content {
    /// The text, or the bytes read as UTF-8.
    pub fn into_text(self) -> Result<String, CoreError> {
        match self {
            Content::Text(s) => Ok(s),
            Content::Bytes(b) => TextEncoding::Utf8.decode(b),
        }
    }

    pub fn into_bytes(self) -> Vec<u8> {
        match self {
            Content::Text(s) => s.into_bytes(),
            Content::Bytes(b) => b,
        }
    }
}

fn duplicate_header(name: &str) -> CoreError {
    CoreError::InvalidHeader(format!("Duplicate header ({}) differing only in case", name))
}

fn build_header_map(headers: &HashMap<String, String>) -> Result<HeaderMap, CoreError> {
    let mut map = HeaderMap::new();
    for (k, v) in headers {
        let name = HeaderName::from_str(k)
            .map_err(|e| CoreError::InvalidHeader(format!("Invalid header name ({}): {}", k, e)))?;
        let value = HeaderValue::from_str(v)
            .map_err(|e| CoreError::InvalidHeader(format!("Invalid header value for {}: {}", k, e)))?;
        // HeaderName is lower-cased, so `Accept` and `accept` land on the same key.
        if map.insert(name, value).is_some() {
            return Err(duplicate_header(k));
        }
    }
    Ok(map)
}

fn decode(bytes: Vec<u8>, encoding: Option<TextEncoding>) -> Result<Content, CoreError> {
    match encoding {
        Some(enc) => enc.decode(bytes).map(Content::Text),
        None => Ok(Content::Bytes(bytes)),
    }
}

/// Sends the request and returns the response handle unread.
/// Non-success statuses are errors.
///
/// Blocks the calling thread; inside a tokio runtime use [`dispatch_async`]
/// or move the call to `spawn_blocking`.
pub fn dispatch_raw(
    config: &HttpConfig,
    request: &HttpRequest,
) -> Result<blocking::Response, CoreError> {
    debug!("Dispatching [{}] {}", request.method, request.url);

    let (method, url, headers, body) = request.parts()?;
    let client = config.blocking_client()?;

    let mut builder = client.request(method, url).headers(headers);
    if let Some(body) = body {
        builder = builder.body(body);
    }

    let response = builder.send()?.error_for_status()?;
    debug!("[{}] {} -> {}", request.method, request.url, response.status());
    Ok(response)
}

/// Sends the request and reads the whole body.
///
/// Blocking like [`dispatch_raw`]; async callers want [`dispatch_async`].
pub fn dispatch(config: &HttpConfig, request: &HttpRequest) -> Result<Content, CoreError> {
    let response = dispatch_raw(config, request)?;
    let bytes = response.bytes()?.to_vec();
    decode(bytes, request.encoding)
}

/// Async counterpart of [`dispatch`].
pub async fn dispatch_async(
    config: &HttpConfig,
    request: &HttpRequest,
) -> Result<Content, CoreError> {
    debug!("Dispatching (async) [{}] {}", request.method, request.url);

    let (method, url, headers, body) = request.parts()?;
    let client = config.async_client()?;

    let mut builder = client.request(method, url).headers(headers);
    if let Some(body) = body {
        builder = builder.body(body);
    }

    let bytes = builder
        .send()
        .await?
        .error_for_status()?
        .bytes()
        .await?
        .to_vec();
    decode(bytes, request.encoding)
}
