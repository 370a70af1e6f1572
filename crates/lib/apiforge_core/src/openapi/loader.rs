//! OpenAPI document acquisition from a file, URL, stdin or inline text.

use std::fmt;
use std::path::PathBuf;

use tokio::io::AsyncReadExt;
use tracing::debug;

use super::OpenApiDoc;
use crate::error::SpecLoadError;

/// Where to read the OpenAPI document from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentSource {
    Url(String),
    File(PathBuf),
    Stdin,
    Inline(String),
}

impl fmt::Display for DocumentSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocumentSource::Url(url) => write!(f, "url {url}"),
            DocumentSource::File(path) => write!(f, "file {}", path.display()),
            DocumentSource::Stdin => f.write_str("stdin"),
            DocumentSource::Inline(_) => f.write_str("inline content"),
        }
    }
}

/// Read the raw document text from `source`.
pub async fn load(source: &DocumentSource) -> Result<String, SpecLoadError> {
    debug!(source = %source, "loading OpenAPI document");
    match source {
        DocumentSource::Url(url) => fetch(url).await,
        DocumentSource::File(path) => {
            tokio::fs::read_to_string(path)
                .await
                .map_err(|e| SpecLoadError::Read {
                    source_name: source.to_string(),
                    message: e.to_string(),
                })
        }
        DocumentSource::Stdin => {
            let mut text = String::new();
            tokio::io::stdin()
                .read_to_string(&mut text)
                .await
                .map_err(|e| SpecLoadError::Read {
                    source_name: source.to_string(),
                    message: e.to_string(),
                })?;
            Ok(text)
        }
        DocumentSource::Inline(text) => {
            if text.trim().is_empty() {
                return Err(SpecLoadError::Read {
                    source_name: source.to_string(),
                    message: "inline content is empty".into(),
                });
            }
            Ok(text.clone())
        }
    }
}

/// Load and parse a document in one step.
pub async fn load_document(source: &DocumentSource) -> Result<OpenApiDoc, SpecLoadError> {
    let text = load(source).await?;
    parse_document(&text, &source.to_string())
}

/// Parse document text as JSON, falling back to YAML.
///
/// Rejects documents that declare a non-3.x `openapi` version or a Swagger
/// 2.0 `swagger` field.
pub fn parse_document(text: &str, source_name: &str) -> Result<OpenApiDoc, SpecLoadError> {
    let mut raw: serde_json::Value = match serde_json::from_str(text) {
        Ok(value) => value,
        Err(json_err) => serde_yaml::from_str(text).map_err(|yaml_err| SpecLoadError::Parse {
            source_name: source_name.to_string(),
            message: format!("JSON: {json_err}; YAML: {yaml_err}"),
        })?,
    };

    if let Some(swagger) = raw.get("swagger").and_then(|v| v.as_str()) {
        return Err(SpecLoadError::Unsupported(swagger.to_string()));
    }

    // YAML reads unquoted `3.0` or `1.0` as numbers.
    stringify_number(raw.get_mut("openapi"));
    stringify_number(raw.get_mut("info").and_then(|info| info.get_mut("version")));

    let doc: OpenApiDoc = serde_json::from_value(raw).map_err(|e| SpecLoadError::Parse {
        source_name: source_name.to_string(),
        message: e.to_string(),
    })?;

    if !doc.openapi.is_empty() && !doc.openapi.starts_with("3.") {
        return Err(SpecLoadError::Unsupported(doc.openapi));
    }

    Ok(doc)
}

fn stringify_number(value: Option<&mut serde_json::Value>) {
    if let Some(v) = value
        && v.is_number()
    {
        *v = serde_json::Value::String(v.to_string());
    }
}

async fn fetch(url: &str) -> Result<String, SpecLoadError> {
    let fetch_err = |message: String| SpecLoadError::Fetch {
        url: url.to_string(),
        message,
    };

    let resp = reqwest::get(url).await.map_err(|e| fetch_err(e.to_string()))?;
    if !resp.status().is_success() {
        let status = resp.status();
        return Err(fetch_err(format!("HTTP {status}")));
    }
    resp.text().await.map_err(|e| fetch_err(e.to_string()))
}
