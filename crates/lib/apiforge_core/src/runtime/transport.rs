//! HTTP transport seam.
//!
//! The runtime builds an [`HttpRequest`] and hands it to an
//! [`HttpTransport`]. [`ReqwestTransport`] is the production implementation;
//! tests plug in scripted transports.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

/// A fully resolved outgoing request.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    /// Upper-case HTTP verb.
    pub method: String,
    /// Absolute URL without the query string.
    pub url: String,
    pub query: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
    /// JSON body, if any.
    pub body: Option<Value>,
}

impl HttpRequest {
    /// First header named `name` (case-insensitive).
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Set `name`, replacing any existing value (case-insensitive).
    pub fn set_header(&mut self, name: &str, value: impl Into<String>) {
        self.headers.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
        self.headers.push((name.to_string(), value.into()));
    }
}

/// A successful (2xx) response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    /// Body parsed as JSON; non-JSON text becomes a string and an empty
    /// body becomes `null`.
    pub fn into_value(self) -> Value {
        if self.body.trim().is_empty() {
            return Value::Null;
        }
        serde_json::from_str(&self.body).unwrap_or(Value::String(self.body))
    }
}

#[derive(Debug, Clone, Error)]
pub enum TransportError {
    /// The server answered with a non-2xx status.
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// Connection, TLS, timeout or request-construction failure.
    #[error("Network error: {0}")]
    Network(String),
}

impl TransportError {
    /// 401 or 403.
    pub fn is_auth_failure(&self) -> bool {
        matches!(self, TransportError::Status { status: 401 | 403, .. })
    }
}

/// Sends HTTP requests.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError>;
}

/// [`HttpTransport`] backed by a shared `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// Build a transport whose requests time out after `timeout`.
    pub fn new(timeout: Option<Duration>) -> Result<Self, TransportError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| TransportError::Network(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self { client })
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let method = reqwest::Method::from_bytes(request.method.as_bytes())
            .map_err(|e| {
                TransportError::Network(format!("Invalid method {}: {e}", request.method))
            })?;
        let url = url::Url::parse(&request.url)
            .map_err(|e| TransportError::Network(format!("Invalid URL {}: {e}", request.url)))?;

        debug!(method = %method, url = %url, "sending request");

        let mut builder = self.client.request(method, url);
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let resp = builder
            .send()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;

        if !status.is_success() {
            return Err(TransportError::Status {
                status: status.as_u16(),
                body,
            });
        }

        Ok(HttpResponse {
            status: status.as_u16(),
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn response_body_parsing() {
        let json_resp = HttpResponse {
            status: 200,
            body: r#"{"id": 7}"#.into(),
        };
        assert_eq!(json_resp.into_value(), json!({"id": 7}));

        let text = HttpResponse {
            status: 200,
            body: "pong".into(),
        };
        assert_eq!(text.into_value(), json!("pong"));

        let empty = HttpResponse {
            status: 204,
            body: String::new(),
        };
        assert_eq!(empty.into_value(), Value::Null);
    }

    #[test]
    fn set_header_replaces_case_insensitively() {
        let mut request = HttpRequest {
            method: "GET".into(),
            url: "https://api.example.com/x".into(),
            query: vec![],
            headers: vec![("authorization".into(), "old".into())],
            body: None,
        };
        request.set_header("Authorization", "Bearer new");
        assert_eq!(request.headers.len(), 1);
        assert_eq!(request.header("AUTHORIZATION"), Some("Bearer new"));
    }

    #[test]
    fn auth_failures_are_401_and_403() {
        let status = |status| TransportError::Status {
            status,
            body: String::new(),
        };
        assert!(status(401).is_auth_failure());
        assert!(status(403).is_auth_failure());
        assert!(!status(500).is_auth_failure());
        assert!(!TransportError::Network("reset".into()).is_auth_failure());
    }

    #[tokio::test]
    async fn invalid_url_is_a_network_error() {
        let transport = ReqwestTransport::new(None).expect("client builds");
        let err = transport
            .send(HttpRequest {
                method: "GET".into(),
                url: "not a url".into(),
                query: vec![],
                headers: vec![],
                body: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, TransportError::Network(msg) if msg.contains("Invalid URL")));
    }
}
