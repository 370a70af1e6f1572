// @zen-component: TOOL-InvocationRuntime
//
//! Invocation runtime: turns a tool call into an HTTP request.
//!
//! `invoke` decodes the tool id, partitions the arguments by their bound
//! locations, substitutes path placeholders, attaches auth headers and sends
//! the request. An auth failure gets at most one retry, and only when the
//! [`AuthProvider`] says credentials changed.

pub mod auth;
pub mod oauth;
pub mod transport;

use std::fmt::Write;
use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::error::InvokeError;
use crate::registry::{BodyShape, ParameterLocation, ToolDefinition, ToolRegistry};
use crate::tool_id::{self, PARAM_MARKER};

pub use auth::{
    AuthFailure, AuthProvider, Headers, NoAuth, RefreshingAuth, StaticAuth, TokenSource,
};
pub use oauth::RefreshTokenGrant;
pub use transport::{HttpRequest, HttpResponse, HttpTransport, ReqwestTransport, TransportError};

/// Executes tool invocations against one API.
///
/// Cheap to share: every collaborator sits behind an `Arc` and `invoke`
/// takes `&self`.
#[derive(Clone)]
pub struct ApiClient {
    base_url: String,
    registry: Arc<ToolRegistry>,
    transport: Arc<dyn HttpTransport>,
    auth: Arc<dyn AuthProvider>,
    default_headers: Headers,
}

impl ApiClient {
    pub fn new(
        base_url: impl Into<String>,
        registry: Arc<ToolRegistry>,
        transport: Arc<dyn HttpTransport>,
    ) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            registry,
            transport,
            auth: Arc::new(NoAuth),
            default_headers: Vec::new(),
        }
    }

    pub fn with_auth(mut self, auth: Arc<dyn AuthProvider>) -> Self {
        self.auth = auth;
        self
    }

    /// Headers sent with every request. Header arguments and auth headers
    /// override them.
    pub fn with_default_headers(mut self, headers: Headers) -> Self {
        self.default_headers = headers;
        self
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Invoke the tool with compressed name `name`.
    pub async fn invoke_by_name(&self, name: &str, args: &Value) -> Result<Value, InvokeError> {
        let (tool_id, _) = self
            .registry
            .find_by_name(name)
            .ok_or_else(|| InvokeError::UnknownTool(name.to_string()))?;
        let tool_id = tool_id.to_string();
        self.invoke(&tool_id, args).await
    }

    // @zen-impl: TOOL-InvocationRuntime single auth retry
    /// Invoke `tool_id` with a JSON object of arguments.
    ///
    /// Ids absent from the registry are still callable: their arguments fill
    /// matching path placeholders and everything else goes to the query.
    pub async fn invoke(&self, tool_id: &str, args: &Value) -> Result<Value, InvokeError> {
        let decoded = tool_id::decode(tool_id).ok_or_else(|| {
            InvokeError::Validation(format!("'{tool_id}' is not a METHOD::path tool id"))
        })?;
        let args = match args {
            Value::Object(map) => map.clone(),
            Value::Null => Map::new(),
            other => {
                return Err(InvokeError::Validation(format!(
                    "arguments must be a JSON object, got {other}"
                )));
            }
        };

        let definition = self.registry.get(tool_id);
        if definition.is_none() {
            debug!(tool_id, "no tool definition; binding arguments by name");
        }

        let mut request =
            build_request(&self.base_url, &decoded.method, &decoded.path, definition, args)?;
        for (name, value) in &self.default_headers {
            if request.header(name).is_none() {
                request.headers.push((name.clone(), value.clone()));
            }
        }

        let headers = self.auth.auth_headers().await.map_err(InvokeError::Auth)?;
        apply_headers(&mut request, headers);

        info!(tool_id, method = %request.method, url = %request.url, "invoking tool");
        let first = self.transport.send(request.clone()).await;

        let failure = match first {
            Ok(resp) => return Ok(resp.into_value()),
            Err(e) if !e.is_auth_failure() => return Err(invoke_error(e)),
            Err(TransportError::Status { status, body }) => AuthFailure {
                status,
                body,
                sent_headers: request.headers.clone(),
            },
            Err(e) => return Err(invoke_error(e)),
        };

        let retry = self
            .auth
            .handle_auth_error(&failure)
            .await
            .map_err(InvokeError::AuthRecovery)?;
        if !retry {
            return Err(InvokeError::Request {
                status: failure.status,
                body: failure.body,
            });
        }

        warn!(
            tool_id,
            status = failure.status,
            "auth failure, retrying with refreshed credentials"
        );
        let headers = self
            .auth
            .auth_headers()
            .await
            .map_err(InvokeError::AuthRecovery)?;
        apply_headers(&mut request, headers);

        self.transport
            .send(request)
            .await
            .map(HttpResponse::into_value)
            .map_err(invoke_error)
    }
}

fn apply_headers(request: &mut HttpRequest, headers: Headers) {
    for (name, value) in headers {
        request.set_header(&name, value);
    }
}

fn invoke_error(err: TransportError) -> InvokeError {
    match err {
        TransportError::Status { status, body } => InvokeError::Request { status, body },
        TransportError::Network(msg) => InvokeError::Transport(msg),
    }
}

// @zen-impl: TOOL-InvocationRuntime argument partitioning
/// Resolve arguments into a request (without auth headers).
fn build_request(
    base_url: &str,
    method: &str,
    path: &str,
    definition: Option<&ToolDefinition>,
    args: Map<String, Value>,
) -> Result<HttpRequest, InvokeError> {
    let placeholders = match definition {
        Some(d) => braced_names(&d.original_path),
        None => marked_names(path),
    };
    let mut path = path.to_string();
    let mut query = Vec::new();
    let mut headers = Vec::new();
    let mut cookies = Vec::new();
    let mut body_fields = Map::new();
    let mut body = None;

    let wrapped = match definition.map(|d| &d.body) {
        Some(BodyShape::Wrapped { property }) => Some(property.as_str()),
        _ => None,
    };

    for (key, value) in args {
        let binding = definition.and_then(|d| d.binding(&key));
        let (location, wire_name) = match binding {
            Some(b) => (b.location, b.wire_name.clone()),
            None if has_placeholder(&path, &key) => (ParameterLocation::Path, key.clone()),
            None => (ParameterLocation::Query, key.clone()),
        };

        match location {
            ParameterLocation::Path => {
                if value.is_null() {
                    continue;
                }
                let encoded = percent_encode_path_param(&value_to_string(&value));
                path = replace_placeholder(&path, &wire_name, &encoded);
            }
            ParameterLocation::Query => match &value {
                Value::Null => {}
                Value::Array(items) => {
                    let joined: Vec<String> = items.iter().map(value_to_string).collect();
                    query.push((wire_name, joined.join(",")));
                }
                other => query.push((wire_name, value_to_string(other))),
            },
            ParameterLocation::Header => {
                if !value.is_null() {
                    headers.push((wire_name, header_value(&value)));
                }
            }
            ParameterLocation::Cookie => {
                if !value.is_null() {
                    cookies.push(format!("{wire_name}={}", value_to_string(&value)));
                }
            }
            ParameterLocation::Body => {
                if wrapped == Some(key.as_str()) {
                    body = Some(value);
                } else {
                    body_fields.insert(wire_name, value);
                }
            }
        }
    }

    if let Some(missing) = placeholders.iter().find(|name| has_placeholder(&path, name)) {
        return Err(InvokeError::Validation(format!(
            "missing required path parameter '{missing}'"
        )));
    }

    if !cookies.is_empty() {
        headers.push(("Cookie".to_string(), cookies.join("; ")));
    }
    if body.is_none() && !body_fields.is_empty() {
        body = Some(Value::Object(body_fields));
    }

    Ok(HttpRequest {
        method: method.to_string(),
        url: format!("{base_url}{path}"),
        query,
        headers,
        body,
    })
}

/// Stringify a scalar; objects and arrays become compact JSON.
fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn header_value(value: &Value) -> String {
    match value {
        Value::Array(items) => items.iter().map(value_to_string).collect::<Vec<_>>().join(","),
        other => value_to_string(other),
    }
}

/// Percent-encode everything except RFC 3986 unreserved characters.
fn percent_encode_path_param(s: &str) -> String {
    let mut encoded = String::with_capacity(s.len());
    for byte in s.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                encoded.push(byte as char)
            }
            _ => {
                let _ = write!(encoded, "%{byte:02X}");
            }
        }
    }
    encoded
}

// @zen-impl: TOOL-InvocationRuntime boundary-aware placeholders
/// Start offsets of `token` in `path` that end at `/`, `.` or end of string.
fn placeholder_matches(path: &str, token: &str) -> Vec<usize> {
    path.match_indices(token)
        .filter(|(start, _)| {
            let end = start + token.len();
            end == path.len() || path[end..].starts_with(['/', '.'])
        })
        .map(|(start, _)| start)
        .collect()
}

fn placeholder_tokens(name: &str) -> [String; 2] {
    [format!("{PARAM_MARKER}{name}"), format!("{{{name}}}")]
}

fn has_placeholder(path: &str, name: &str) -> bool {
    placeholder_tokens(name)
        .iter()
        .any(|token| !placeholder_matches(path, token).is_empty())
}

/// Replace `---name` and `{name}` only where the placeholder ends at a
/// segment or extension boundary, so `---user` never matches inside
/// `---userId`.
fn replace_placeholder(path: &str, name: &str, value: &str) -> String {
    let mut result = path.to_string();
    for token in placeholder_tokens(name) {
        for start in placeholder_matches(&result, &token).into_iter().rev() {
            result.replace_range(start..start + token.len(), value);
        }
    }
    result
}

/// Names written as `{name}` in a path template.
fn braced_names(path: &str) -> Vec<String> {
    let mut names = Vec::new();
    let mut rest = path;
    while let Some(open) = rest.find('{') {
        let Some(len) = rest[open..].find('}') else {
            break;
        };
        let name = &rest[open + 1..open + len];
        if !name.is_empty() && !names.iter().any(|n| n == name) {
            names.push(name.to_string());
        }
        rest = &rest[open + len + 1..];
    }
    names
}

/// Names marked `---name` in a decoded path; a name ends at `/` or `.`.
fn marked_names(path: &str) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for (start, _) in path.match_indices(PARAM_MARKER) {
        let tail = &path[start + PARAM_MARKER.len()..];
        let name = tail.split(['/', '.']).next().unwrap_or_default();
        if !name.is_empty() && !name.starts_with('-') && !names.iter().any(|n| n == name) {
            names.push(name.to_string());
        }
    }
    names
}
