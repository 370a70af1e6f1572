//! Serde-deserializable structs matching the OpenAPI 3.x subset we need.
//!
//! Schemas stay as raw `serde_json::Value` trees; the compiler dereferences
//! them. Parameters and request bodies are modelled as
//! `Reference | Direct | Malformed` so one bad entry never fails the whole
//! document.

pub mod loader;

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub use loader::{DocumentSource, load, load_document, parse_document};

/// Top-level OpenAPI document (subset).
#[derive(Debug, Default, Deserialize)]
pub struct OpenApiDoc {
    #[serde(default)]
    pub openapi: String,
    #[serde(default)]
    pub info: Info,
    #[serde(default)]
    pub servers: Vec<Server>,
    #[serde(default)]
    pub paths: BTreeMap<String, PathItem>,
    #[serde(default)]
    pub components: Components,
}

impl OpenApiDoc {
    /// URL of the first declared server, if any.
    pub fn first_server_url(&self) -> Option<&str> {
        self.servers.first().map(|s| s.url.as_str())
    }
}

/// API metadata.
#[derive(Debug, Default, Deserialize)]
pub struct Info {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Server {
    pub url: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// A single path item (one URL template).
#[derive(Debug, Default, Deserialize)]
pub struct PathItem {
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub parameters: Vec<RawParameter>,
    #[serde(default)]
    pub get: Option<Operation>,
    #[serde(default)]
    pub put: Option<Operation>,
    #[serde(default)]
    pub post: Option<Operation>,
    #[serde(default)]
    pub delete: Option<Operation>,
    #[serde(default)]
    pub options: Option<Operation>,
    #[serde(default)]
    pub head: Option<Operation>,
    #[serde(default)]
    pub patch: Option<Operation>,
    #[serde(default)]
    pub trace: Option<Operation>,
}

impl PathItem {
    /// Declared operations with their lower-case HTTP verb.
    pub fn operations(&self) -> Vec<(&'static str, &Operation)> {
        [
            ("get", &self.get),
            ("put", &self.put),
            ("post", &self.post),
            ("delete", &self.delete),
            ("options", &self.options),
            ("head", &self.head),
            ("patch", &self.patch),
            ("trace", &self.trace),
        ]
        .into_iter()
        .filter_map(|(verb, op)| op.as_ref().map(|op| (verb, op)))
        .collect()
    }
}

/// An HTTP operation.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Operation {
    #[serde(default)]
    pub operation_id: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub parameters: Vec<RawParameter>,
    #[serde(default)]
    pub request_body: Option<RawRequestBody>,
}

/// Where an argument travels in the HTTP request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterLocation {
    Path,
    Query,
    Header,
    Cookie,
    Body,
}

impl ParameterLocation {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParameterLocation::Path => "path",
            ParameterLocation::Query => "query",
            ParameterLocation::Header => "header",
            ParameterLocation::Cookie => "cookie",
            ParameterLocation::Body => "body",
        }
    }
}

impl fmt::Display for ParameterLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A parameter entry as written in the document.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawParameter {
    Reference {
        #[serde(rename = "$ref")]
        reference: String,
    },
    Direct(Parameter),
    Malformed(Value),
}

/// A concrete parameter definition.
#[derive(Debug, Clone, Deserialize)]
pub struct Parameter {
    pub name: String,
    #[serde(rename = "in")]
    pub location: ParameterLocation,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub schema: Option<Value>,
    #[serde(default)]
    pub content: BTreeMap<String, MediaType>,
}

impl Parameter {
    /// Declared schema, falling back to the first `content` media schema.
    pub fn declared_schema(&self) -> Option<&Value> {
        self.schema
            .as_ref()
            .or_else(|| self.content.values().find_map(|m| m.schema.as_ref()))
    }
}

/// A request body entry as written in the document.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawRequestBody {
    Reference {
        #[serde(rename = "$ref")]
        reference: String,
    },
    Direct(RequestBody),
    Malformed(Value),
}

#[derive(Debug, Clone, Deserialize)]
pub struct RequestBody {
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub content: BTreeMap<String, MediaType>,
}

impl RequestBody {
    /// Media type used for tool input: `application/json`, then any JSON
    /// flavour, then whatever comes first.
    pub fn preferred_media(&self) -> Option<(&str, &MediaType)> {
        self.content
            .get_key_value("application/json")
            .or_else(|| self.content.iter().find(|(k, _)| k.contains("json")))
            .or_else(|| self.content.iter().next())
            .map(|(k, v)| (k.as_str(), v))
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MediaType {
    #[serde(default)]
    pub schema: Option<Value>,
}

/// Components section.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Components {
    #[serde(default)]
    pub schemas: Map<String, Value>,
    #[serde(default)]
    pub parameters: BTreeMap<String, RawParameter>,
    #[serde(default)]
    pub request_bodies: BTreeMap<String, RawRequestBody>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parameter_variants_are_distinguished() {
        let params: Vec<RawParameter> = serde_json::from_value(json!([
            {"$ref": "#/components/parameters/Limit"},
            {"name": "id", "in": "path", "required": true, "schema": {"type": "string"}},
            {"name": "broken"}
        ]))
        .expect("parameters deserialize");

        assert!(matches!(
            &params[0],
            RawParameter::Reference { reference } if reference.ends_with("Limit")
        ));
        assert!(matches!(
            &params[1],
            RawParameter::Direct(p) if p.location == ParameterLocation::Path
        ));
        assert!(matches!(&params[2], RawParameter::Malformed(_)));
    }

    #[test]
    fn unknown_location_is_malformed() {
        let param: RawParameter =
            serde_json::from_value(json!({"name": "x", "in": "matrix"})).expect("deserializes");
        assert!(matches!(param, RawParameter::Malformed(_)));
    }

    #[test]
    fn operations_lists_declared_verbs_only() {
        let item: PathItem = serde_json::from_value(json!({
            "summary": "ignored",
            "get": {"operationId": "a"},
            "delete": {"operationId": "b"}
        }))
        .expect("path item deserializes");
        let verbs: Vec<&str> = item.operations().iter().map(|(v, _)| *v).collect();
        assert_eq!(verbs, vec!["get", "delete"]);
    }

    #[test]
    fn preferred_media_favours_json() {
        let body: RequestBody = serde_json::from_value(json!({
            "content": {
                "application/xml": {"schema": {"type": "string"}},
                "application/vnd.api+json": {"schema": {"type": "object"}},
            }
        }))
        .expect("body deserializes");
        assert_eq!(body.preferred_media().map(|(k, _)| k), Some("application/vnd.api+json"));
    }

    #[test]
    fn parameter_schema_falls_back_to_content() {
        let param: Parameter = serde_json::from_value(json!({
            "name": "filter",
            "in": "query",
            "content": {"application/json": {"schema": {"type": "object"}}}
        }))
        .expect("parameter deserializes");
        assert_eq!(param.declared_schema(), Some(&json!({"type": "object"})));
    }
}
