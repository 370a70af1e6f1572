// @zen-component: TOOL-Registry
//
//! Compiled tool definitions and the read-only registry that holds them.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::Serialize;
use serde_json::Value;

pub use crate::openapi::ParameterLocation;

/// Schema key carrying a property's [`ParameterLocation`].
pub const LOCATION_KEY: &str = "x-parameter-location";

/// How one input property maps onto the HTTP request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArgumentBinding {
    pub location: ParameterLocation,
    /// Name on the wire; differs from the property name after a
    /// `body_` rename.
    pub wire_name: String,
}

/// Shape of the request body the tool sends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum BodyShape {
    None,
    /// Object properties flattened into the input schema.
    Flattened,
    /// The whole body is the value of a single input property.
    Wrapped { property: String },
}

/// One invocable tool, derived from one HTTP operation.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub input_schema: Value,
    pub original_path: String,
    pub http_method: String,
    pub tags: BTreeSet<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_name: Option<String>,
    pub bindings: BTreeMap<String, ArgumentBinding>,
    pub body: BodyShape,
}

impl ToolDefinition {
    /// Binding for the input property `name`.
    pub fn binding(&self, name: &str) -> Option<&ArgumentBinding> {
        self.bindings.get(name)
    }

    /// Names listed in the input schema's `required` array.
    pub fn required(&self) -> Vec<&str> {
        self.input_schema
            .get("required")
            .and_then(Value::as_array)
            .map(|r| r.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default()
    }
}

/// Selects which operations become tools. Empty lists impose no constraint;
/// every non-empty list must match.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolFilter {
    /// Tool ids or tool names.
    pub tools: Vec<String>,
    pub tags: Vec<String>,
    pub resources: Vec<String>,
    /// HTTP verbs.
    pub operations: Vec<String>,
}

impl ToolFilter {
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
            && self.tags.is_empty()
            && self.resources.is_empty()
            && self.operations.is_empty()
    }

    /// Whether the tool passes every configured constraint.
    pub fn matches(&self, tool_id: &str, tool: &ToolDefinition) -> bool {
        let tool_ok = self.tools.is_empty()
            || self
                .tools
                .iter()
                .any(|t| t == tool_id || t.eq_ignore_ascii_case(&tool.name));
        let tag_ok = self.tags.is_empty()
            || self
                .tags
                .iter()
                .any(|t| tool.tags.iter().any(|tag| tag.eq_ignore_ascii_case(t)));
        let resource_ok = self.resources.is_empty()
            || tool.resource_name.as_deref().is_some_and(|r| {
                self.resources.iter().any(|want| want.eq_ignore_ascii_case(r))
            });
        let operation_ok = self.operations.is_empty()
            || self
                .operations
                .iter()
                .any(|op| op.eq_ignore_ascii_case(&tool.http_method));
        tool_ok && tag_ok && resource_ok && operation_ok
    }
}

/// Read-only map from tool id to tool definition.
///
/// Built once by the compiler, then shared behind an `Arc`. A reload builds
/// a fresh registry instead of mutating this one.
#[derive(Debug, Clone, Default)]
pub struct ToolRegistry {
    tools: HashMap<String, ToolDefinition>,
    by_name: HashMap<String, String>,
}

impl ToolRegistry {
    /// Assemble a registry. Callers guarantee unique ids and names.
    pub(crate) fn from_entries(entries: Vec<(String, ToolDefinition)>) -> Self {
        let by_name = entries
            .iter()
            .map(|(id, tool)| (tool.name.clone(), id.clone()))
            .collect();
        Self {
            tools: entries.into_iter().collect(),
            by_name,
        }
    }

    pub fn get(&self, tool_id: &str) -> Option<&ToolDefinition> {
        self.tools.get(tool_id)
    }

    /// Look up a tool by its compressed name; returns `(tool_id, tool)`.
    pub fn find_by_name(&self, name: &str) -> Option<(&str, &ToolDefinition)> {
        let id = self.by_name.get(name)?;
        self.tools.get(id).map(|tool| (id.as_str(), tool))
    }

    pub fn contains(&self, tool_id: &str) -> bool {
        self.tools.contains_key(tool_id)
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// All tools ordered by tool id.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ToolDefinition)> {
        let mut entries: Vec<_> = self.tools.iter().map(|(k, v)| (k.as_str(), v)).collect();
        entries.sort_by(|a, b| a.0.cmp(b.0));
        entries.into_iter()
    }
}
