// @zen-component: TOOL-SpecCompiler
//
//! Compiles an OpenAPI document into a [`ToolRegistry`].
//!
//! One tool per operation. Parameters and the request body are flattened
//! into a single object input schema whose top-level properties each carry
//! their [`ParameterLocation`]. Problems with individual entries become
//! [`Diagnostic`]s; only a name collision under
//! [`CollisionPolicy::Reject`] fails compilation.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;

use serde_json::{Map, Value, json};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::error::CompileError;
use crate::naming::NameCompressor;
use crate::openapi::{
    Components, OpenApiDoc, Operation, Parameter, ParameterLocation, PathItem, RawParameter,
    RawRequestBody, RequestBody,
};
use crate::registry::{
    ArgumentBinding, BodyShape, LOCATION_KEY, ToolDefinition, ToolFilter, ToolRegistry,
};
use crate::schema::{self, ComponentSchemas};
use crate::tool_id;

const PARAMETER_REF_PREFIX: &str = "#/components/parameters/";
const REQUEST_BODY_REF_PREFIX: &str = "#/components/requestBodies/";

/// Name given to operations with a blank name source.
pub const UNNAMED_TOOL: &str = "unnamed-tool";

/// Property that carries a non-flattened request body.
const BODY_PROPERTY: &str = "body";

/// What to do when two tools compress to the same name.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CollisionPolicy {
    /// Suffix the later tool's name with a hash of its tool id.
    #[default]
    Disambiguate,
    /// Fail compilation.
    Reject,
}

impl FromStr for CollisionPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "disambiguate" | "suffix" => Ok(CollisionPolicy::Disambiguate),
            "reject" | "error" => Ok(CollisionPolicy::Reject),
            other => Err(format!("unknown collision policy '{other}'")),
        }
    }
}

impl fmt::Display for CollisionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CollisionPolicy::Disambiguate => f.write_str("disambiguate"),
            CollisionPolicy::Reject => f.write_str("reject"),
        }
    }
}

/// Compiler settings.
#[derive(Debug, Clone, Default)]
pub struct CompileOptions {
    pub compressor: NameCompressor,
    pub filter: ToolFilter,
    pub collisions: CollisionPolicy,
}

/// Non-fatal problem found while compiling.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Diagnostic {
    #[error("{tool_id}: unresolved reference {reference}")]
    UnresolvedReference { tool_id: String, reference: String },

    #[error("{tool_id}: skipped malformed parameter: {detail}")]
    MalformedParameter { tool_id: String, detail: String },

    #[error("{tool_id}: {dropped} canonicalizes to the same tool id as {kept}; keeping the first")]
    ToolIdCollision {
        tool_id: String,
        kept: String,
        dropped: String,
    },

    #[error("tool name '{name}' of {second} already used by {first}; renamed to '{renamed}'")]
    ToolNameCollision {
        name: String,
        first: String,
        second: String,
        renamed: String,
    },
}

/// Compilation output.
#[derive(Debug, Default)]
pub struct CompiledTools {
    pub registry: ToolRegistry,
    pub diagnostics: Vec<Diagnostic>,
}

// @zen-impl: TOOL-SpecCompiler tool per operation, collision handling
/// Compile every operation in `doc` into a tool.
pub fn compile(doc: &OpenApiDoc, options: &CompileOptions) -> Result<CompiledTools, CompileError> {
    let mut diagnostics = Vec::new();
    let mut entries: Vec<(String, ToolDefinition)> = Vec::new();
    let mut origins: HashMap<String, String> = HashMap::new();
    let mut names: HashMap<String, String> = HashMap::new();

    for (path, item) in &doc.paths {
        for (verb, operation) in item.operations() {
            let method = verb.to_ascii_uppercase();
            let tool_id = tool_id::encode(&method, path);
            let origin = format!("{method} {path}");

            if let Some(kept) = origins.get(&tool_id) {
                diagnostics.push(Diagnostic::ToolIdCollision {
                    tool_id: tool_id.clone(),
                    kept: kept.clone(),
                    dropped: origin,
                });
                continue;
            }

            let mut ctx = OperationContext {
                tool_id: &tool_id,
                components: &doc.components,
                diagnostics: &mut diagnostics,
            };
            let mut tool = ctx.build(&method, path, item, operation, &options.compressor);

            if !options.filter.matches(&tool_id, &tool) {
                debug!(tool_id = %tool_id, "excluded by filter");
                continue;
            }

            if let Some(first) = names.get(&tool.name) {
                match options.collisions {
                    CollisionPolicy::Reject => {
                        return Err(CompileError::ToolNameCollision {
                            name: tool.name,
                            first: first.clone(),
                            second: tool_id,
                        });
                    }
                    CollisionPolicy::Disambiguate => {
                        let renamed =
                            unique_name(&options.compressor, &tool.name, &tool_id, &names);
                        diagnostics.push(Diagnostic::ToolNameCollision {
                            name: tool.name.clone(),
                            first: first.clone(),
                            second: tool_id.clone(),
                            renamed: renamed.clone(),
                        });
                        tool.name = renamed;
                    }
                }
            }

            origins.insert(tool_id.clone(), origin);
            names.insert(tool.name.clone(), tool_id.clone());
            entries.push((tool_id, tool));
        }
    }

    for diagnostic in &diagnostics {
        warn!("{diagnostic}");
    }
    info!(
        tools = entries.len(),
        diagnostics = diagnostics.len(),
        "compiled OpenAPI document"
    );

    Ok(CompiledTools {
        registry: ToolRegistry::from_entries(entries),
        diagnostics,
    })
}

fn unique_name(
    compressor: &NameCompressor,
    name: &str,
    tool_id: &str,
    taken: &HashMap<String, String>,
) -> String {
    let mut candidate = compressor.disambiguate(name, tool_id);
    let mut round = 1;
    while taken.contains_key(&candidate) {
        candidate = compressor.disambiguate(name, &format!("{tool_id}#{round}"));
        round += 1;
    }
    candidate
}

/// Per-operation state threaded through tool construction.
struct OperationContext<'a> {
    tool_id: &'a str,
    components: &'a Components,
    diagnostics: &'a mut Vec<Diagnostic>,
}

/// Accumulates the input schema and its bindings.
#[derive(Default)]
struct InputBuilder {
    properties: Map<String, Value>,
    required: Vec<String>,
    bindings: BTreeMap<String, ArgumentBinding>,
}

impl InputBuilder {
    fn add(
        &mut self,
        property: String,
        wire_name: &str,
        location: ParameterLocation,
        schema: Value,
        required: bool,
    ) {
        if required && !self.required.contains(&property) {
            self.required.push(property.clone());
        }
        self.bindings.insert(
            property.clone(),
            ArgumentBinding {
                location,
                wire_name: wire_name.to_string(),
            },
        );
        self.properties.insert(property, tag_location(schema, location));
    }

    // @zen-impl: TOOL-SpecCompiler location-prefixed renames, never overwrite
    /// `name` if no property owns it yet, otherwise `name` with `prefix_`
    /// prepended until it is free.
    fn free_name(&self, name: &str, prefix: &str) -> String {
        let mut candidate = name.to_string();
        while self.properties.contains_key(&candidate) {
            candidate = format!("{prefix}_{candidate}");
        }
        candidate
    }

    fn into_schema(self) -> (Value, BTreeMap<String, ArgumentBinding>) {
        let mut schema = json!({
            "type": "object",
            "properties": Value::Object(self.properties),
        });
        if !self.required.is_empty() {
            schema["required"] = json!(self.required);
        }
        (schema, self.bindings)
    }
}

impl OperationContext<'_> {
    fn build(
        &mut self,
        method: &str,
        path: &str,
        item: &PathItem,
        operation: &Operation,
        compressor: &NameCompressor,
    ) -> ToolDefinition {
        let mut input = InputBuilder::default();

        for param in self.merged_parameters(item, operation) {
            let required = param.required || param.location == ParameterLocation::Path;
            let schema = self.parameter_schema(&param);
            let property = input.free_name(&param.name, param.location.as_str());
            input.add(property, &param.name, param.location, schema, required);
        }

        for placeholder in path_placeholders(path) {
            let declared = input
                .bindings
                .values()
                .any(|b| b.location == ParameterLocation::Path && b.wire_name == placeholder);
            if !declared && !input.properties.contains_key(&placeholder) {
                debug!(
                    tool_id = self.tool_id,
                    name = %placeholder,
                    "synthesizing undeclared path parameter"
                );
                input.add(
                    placeholder.clone(),
                    &placeholder,
                    ParameterLocation::Path,
                    json!({"type": "string"}),
                    true,
                );
            }
        }

        let body = match operation
            .request_body
            .as_ref()
            .and_then(|raw| self.resolve_request_body(raw))
        {
            Some(request_body) => self.add_request_body(&request_body, &mut input),
            None => BodyShape::None,
        };

        let (input_schema, bindings) = input.into_schema();
        let fallback = format!("{method} {path}");

        ToolDefinition {
            name: tool_name(operation, &fallback, compressor),
            description: operation
                .description
                .clone()
                .or_else(|| operation.summary.clone())
                .unwrap_or(fallback),
            input_schema,
            original_path: path.to_string(),
            http_method: method.to_string(),
            tags: operation.tags.iter().cloned().collect(),
            resource_name: resource_name(path),
            bindings,
            body,
        }
    }

    /// Path-item parameters overridden by operation parameters with the same
    /// name and location.
    fn merged_parameters(&mut self, item: &PathItem, operation: &Operation) -> Vec<Parameter> {
        let mut merged: Vec<Parameter> = Vec::new();
        for raw in item.parameters.iter().chain(&operation.parameters) {
            let Some(param) = self.resolve_parameter(raw) else {
                continue;
            };
            match merged
                .iter_mut()
                .find(|p| p.name == param.name && p.location == param.location)
            {
                Some(existing) => *existing = param,
                None => merged.push(param),
            }
        }
        merged
    }

    fn resolve_parameter(&mut self, raw: &RawParameter) -> Option<Parameter> {
        match raw {
            RawParameter::Direct(param) => Some(param.clone()),
            RawParameter::Reference { reference } => {
                let target = local_component(reference, PARAMETER_REF_PREFIX)
                    .and_then(|name| self.components.parameters.get(&name));
                match target {
                    Some(RawParameter::Direct(param)) => Some(param.clone()),
                    _ => {
                        self.unresolved(reference);
                        None
                    }
                }
            }
            RawParameter::Malformed(value) => {
                self.diagnostics.push(Diagnostic::MalformedParameter {
                    tool_id: self.tool_id.to_string(),
                    detail: describe_malformed(value),
                });
                None
            }
        }
    }

    fn resolve_request_body(&mut self, raw: &RawRequestBody) -> Option<RequestBody> {
        match raw {
            RawRequestBody::Direct(body) => Some(body.clone()),
            RawRequestBody::Reference { reference } => {
                let target = local_component(reference, REQUEST_BODY_REF_PREFIX)
                    .and_then(|name| self.components.request_bodies.get(&name));
                match target {
                    Some(RawRequestBody::Direct(body)) => Some(body.clone()),
                    _ => {
                        self.unresolved(reference);
                        None
                    }
                }
            }
            RawRequestBody::Malformed(value) => {
                debug!(tool_id = self.tool_id, body = %value, "ignoring malformed request body");
                None
            }
        }
    }

    fn unresolved(&mut self, reference: &str) {
        self.diagnostics.push(Diagnostic::UnresolvedReference {
            tool_id: self.tool_id.to_string(),
            reference: reference.to_string(),
        });
    }

    fn parameter_schema(&self, param: &Parameter) -> Value {
        let mut schema = match param.declared_schema() {
            Some(declared) => schema::inline_root(declared, &self.components.schemas),
            None => json!({"type": "string"}),
        };
        if let Some(description) = &param.description
            && let Some(obj) = schema.as_object_mut()
        {
            obj.entry("description")
                .or_insert_with(|| Value::String(description.clone()));
        }
        schema
    }

    // @zen-impl: TOOL-SpecCompiler flattened or wrapped request body
    fn add_request_body(&mut self, body: &RequestBody, input: &mut InputBuilder) -> BodyShape {
        let Some((media_type, media)) = body.preferred_media() else {
            return BodyShape::None;
        };
        debug!(tool_id = self.tool_id, media_type, "using request body media type");

        let schemas: &ComponentSchemas = &self.components.schemas;
        let schema = media
            .schema
            .as_ref()
            .map(|s| schema::inline_root(s, schemas))
            .unwrap_or_else(|| json!({}));

        if let Some(properties) = flattenable_properties(&schema) {
            let body_required: Vec<&str> = schema
                .get("required")
                .and_then(Value::as_array)
                .map(|r| r.iter().filter_map(Value::as_str).collect())
                .unwrap_or_default();

            for (name, property_schema) in properties {
                let property = input.free_name(name, BODY_PROPERTY);
                let required = body_required.contains(&name.as_str());
                input.add(
                    property,
                    name,
                    ParameterLocation::Body,
                    property_schema.clone(),
                    required,
                );
            }
            return BodyShape::Flattened;
        }

        let property = input.free_name(BODY_PROPERTY, BODY_PROPERTY);
        let mut wrapped = schema;
        if let Some(description) = &body.description
            && let Some(obj) = wrapped.as_object_mut()
        {
            obj.entry("description")
                .or_insert_with(|| Value::String(description.clone()));
        }
        input.add(
            property.clone(),
            BODY_PROPERTY,
            ParameterLocation::Body,
            wrapped,
            true,
        );
        BodyShape::Wrapped { property }
    }
}

/// Properties of an object schema that can be spread into the input schema.
fn flattenable_properties(schema: &Value) -> Option<&Map<String, Value>> {
    let obj = schema.as_object()?;
    if obj.contains_key("oneOf") || obj.contains_key("anyOf") {
        return None;
    }
    match obj.get("type") {
        None => {}
        Some(Value::String(t)) if t == "object" => {}
        Some(_) => return None,
    }
    obj.get("properties")
        .and_then(Value::as_object)
        .filter(|props| !props.is_empty())
}

fn tag_location(schema: Value, location: ParameterLocation) -> Value {
    let mut obj = match schema {
        Value::Object(obj) => obj,
        _ => Map::new(),
    };
    obj.insert(LOCATION_KEY.to_string(), json!(location.as_str()));
    Value::Object(obj)
}

// @zen-impl: TOOL-SpecCompiler name source fallback chain
fn tool_name(operation: &Operation, fallback: &str, compressor: &NameCompressor) -> String {
    let source = non_blank(&operation.operation_id)
        .or_else(|| non_blank(&operation.summary))
        .unwrap_or(fallback);
    if source.trim().is_empty() {
        UNNAMED_TOOL.to_string()
    } else {
        compressor.compress(source)
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.trim().is_empty())
}

/// Last path segment that is not a `{placeholder}`.
fn resource_name(path: &str) -> Option<String> {
    path.split('/')
        .filter(|segment| !segment.is_empty() && !segment.starts_with('{'))
        .next_back()
        .map(str::to_string)
}

fn path_placeholders(path: &str) -> Vec<String> {
    let mut names = Vec::new();
    let mut rest = path;
    while let Some(start) = rest.find('{') {
        let Some(len) = rest[start..].find('}') else {
            break;
        };
        let name = &rest[start + 1..start + len];
        if !name.is_empty() && !names.iter().any(|n| n == name) {
            names.push(name.to_string());
        }
        rest = &rest[start + len + 1..];
    }
    names
}

fn local_component(reference: &str, prefix: &str) -> Option<String> {
    let raw = reference.strip_prefix(prefix)?;
    if raw.is_empty() || raw.contains('/') {
        return None;
    }
    Some(schema::unescape_pointer(raw))
}

fn describe_malformed(value: &Value) -> String {
    match value.get("name").and_then(Value::as_str) {
        Some(name) => format!("parameter '{name}' has no valid location"),
        None => {
            let text = value.to_string();
            if text.chars().count() > 80 {
                format!("{}...", text.chars().take(80).collect::<String>())
            } else {
                text
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::openapi::parse_document;

    fn compile_json(doc: Value) -> CompiledTools {
        compile_with(doc, &CompileOptions::default())
    }

    fn compile_with(doc: Value, options: &CompileOptions) -> CompiledTools {
        let doc = parse_document(&doc.to_string(), "test").expect("document parses");
        compile(&doc, options).expect("compiles")
    }

    #[test]
    fn simple_get_operation() {
        let compiled = compile_json(json!({
            "openapi": "3.0.0",
            "paths": {"/users": {"get": {"operationId": "getUsers"}}}
        }));

        let tool = compiled.registry.get("GET::users").expect("tool exists");
        assert_eq!(tool.name, "get-usrs");
        assert_eq!(tool.input_schema, json!({"type": "object", "properties": {}}));
        assert_eq!(tool.http_method, "GET");
        assert_eq!(tool.original_path, "/users");
        assert_eq!(tool.resource_name.as_deref(), Some("users"));
        assert_eq!(tool.body, BodyShape::None);
        assert!(compiled.diagnostics.is_empty());
    }

    #[test]
    fn path_parameter_is_required_and_tagged() {
        let compiled = compile_json(json!({
            "openapi": "3.0.0",
            "paths": {"/users/{id}": {"get": {
                "operationId": "getUser",
                "parameters": [{"name": "id", "in": "path", "required": true, "schema": {"type": "string"}}]
            }}}
        }));

        let tool = compiled.registry.get("GET::users__---id").expect("tool exists");
        assert_eq!(tool.input_schema["required"], json!(["id"]));
        assert_eq!(tool.input_schema["properties"]["id"][LOCATION_KEY], "path");
        assert_eq!(tool.resource_name.as_deref(), Some("users"));
    }

    #[test]
    fn array_body_is_wrapped() {
        let compiled = compile_json(json!({
            "openapi": "3.0.0",
            "paths": {"/list": {"post": {
                "operationId": "postList",
                "requestBody": {"content": {"application/json": {
                    "schema": {"type": "array", "items": {"type": "string"}}
                }}}
            }}}
        }));

        let tool = compiled.registry.get("POST::list").expect("tool exists");
        let properties = tool.input_schema["properties"].as_object().expect("properties");
        assert_eq!(properties.len(), 1);
        assert_eq!(properties["body"]["type"], "array");
        assert_eq!(properties["body"][LOCATION_KEY], "body");
        assert_eq!(tool.input_schema["required"], json!(["body"]));
        assert_eq!(
            tool.body,
            BodyShape::Wrapped {
                property: "body".into()
            }
        );
    }

    // @zen-test: TOOL-SpecCompiler body flattening
    #[test]
    fn object_body_is_flattened_with_prefix_on_collision() {
        let compiled = compile_json(json!({
            "openapi": "3.0.0",
            "paths": {"/users/{id}": {"put": {
                "operationId": "updateUser",
                "parameters": [{"name": "id", "in": "path", "required": true}],
                "requestBody": {"content": {"application/json": {"schema": {
                    "type": "object",
                    "required": ["id", "email"],
                    "properties": {
                        "id": {"type": "integer"},
                        "email": {"type": "string"},
                        "nickname": {"type": "string"}
                    }
                }}}}
            }}}
        }));

        let tool = compiled.registry.get("PUT::users__---id").expect("tool exists");
        let properties = tool.input_schema["properties"].as_object().expect("properties");
        assert_eq!(properties["id"]["type"], "string");
        assert_eq!(properties["body_id"]["type"], "integer");
        assert_eq!(properties["body_id"][LOCATION_KEY], "body");
        let mut required = tool.required();
        required.sort_unstable();
        assert_eq!(required, vec!["body_id", "email", "id"]);
        assert_eq!(tool.body, BodyShape::Flattened);

        let binding = tool.binding("body_id").expect("binding");
        assert_eq!(binding.wire_name, "id");
        assert_eq!(binding.location, ParameterLocation::Body);
    }

    #[test]
    fn operation_parameters_override_path_item_parameters() {
        let compiled = compile_json(json!({
            "openapi": "3.0.0",
            "paths": {"/items": {
                "parameters": [
                    {"name": "limit", "in": "query", "schema": {"type": "string"}},
                    {"name": "limit", "in": "header", "schema": {"type": "string"}}
                ],
                "get": {
                    "operationId": "listItems",
                    "parameters": [{"name": "limit", "in": "query", "required": true, "schema": {"type": "integer"}}]
                }
            }}
        }));

        let tool = compiled.registry.get("GET::items").expect("tool exists");
        let properties = tool.input_schema["properties"].as_object().expect("properties");
        assert_eq!(properties.len(), 2);
        assert_eq!(properties["limit"]["type"], "integer");
        assert_eq!(properties["limit"][LOCATION_KEY], "query");
        assert_eq!(properties["header_limit"]["type"], "string");
        assert_eq!(properties["header_limit"][LOCATION_KEY], "header");
        assert_eq!(tool.input_schema["required"], json!(["limit"]));

        let header = tool.binding("header_limit").expect("binding");
        assert_eq!(header.wire_name, "limit");
        assert_eq!(header.location, ParameterLocation::Header);
    }

    // @zen-test: TOOL-SpecCompiler same name in two locations
    #[test]
    fn same_name_in_two_locations_keeps_both() {
        let compiled = compile_json(json!({
            "openapi": "3.0.0",
            "paths": {"/items": {"get": {
                "operationId": "listItems",
                "parameters": [
                    {"name": "limit", "in": "query", "required": true, "schema": {"type": "integer"}},
                    {"name": "limit", "in": "header", "required": true, "schema": {"type": "string"}}
                ]
            }}}
        }));

        let tool = compiled.registry.get("GET::items").expect("tool exists");
        let mut required = tool.required();
        required.sort_unstable();
        assert_eq!(required, vec!["header_limit", "limit"]);
        assert_eq!(tool.binding("limit").map(|b| b.location), Some(ParameterLocation::Query));
        assert_eq!(
            tool.binding("header_limit").map(|b| b.location),
            Some(ParameterLocation::Header)
        );
    }

    // @zen-test: TOOL-SpecCompiler prefixed body field never overwrites
    #[test]
    fn body_prefix_never_overwrites_an_existing_body_field() {
        let compiled = compile_json(json!({
            "openapi": "3.0.0",
            "paths": {"/things/{id}": {"put": {
                "operationId": "updateThing",
                "parameters": [{"name": "id", "in": "path", "required": true}],
                "requestBody": {"content": {"application/json": {"schema": {
                    "type": "object",
                    "properties": {
                        "id": {"type": "integer"},
                        "body_id": {"type": "boolean"}
                    }
                }}}}
            }}}
        }));

        let tool = compiled.registry.get("PUT::things__---id").expect("tool exists");
        let properties = tool.input_schema["properties"].as_object().expect("properties");
        assert_eq!(properties.len(), 3);
        assert_eq!(properties["id"][LOCATION_KEY], "path");
        assert_eq!(properties["body_id"]["type"], "boolean");
        assert_eq!(properties["body_body_id"]["type"], "integer");
        assert_eq!(tool.binding("body_id").map(|b| b.wire_name.as_str()), Some("body_id"));
        assert_eq!(tool.binding("body_body_id").map(|b| b.wire_name.as_str()), Some("id"));
    }

    #[test]
    fn parameter_references_resolve_and_failures_are_diagnosed() {
        let compiled = compile_json(json!({
            "openapi": "3.0.0",
            "components": {
                "parameters": {"Limit": {"name": "limit", "in": "query", "description": "Page size", "schema": {"type": "integer"}}},
                "schemas": {}
            },
            "paths": {"/items": {"get": {
                "operationId": "listItems",
                "parameters": [
                    {"$ref": "#/components/parameters/Limit"},
                    {"$ref": "#/components/parameters/Missing"},
                    {"name": "broken"}
                ]
            }}}
        }));

        let tool = compiled.registry.get("GET::items").expect("tool exists");
        let limit = &tool.input_schema["properties"]["limit"];
        assert_eq!(limit["type"], "integer");
        assert_eq!(limit["description"], "Page size");
        assert_eq!(limit[LOCATION_KEY], "query");

        assert_eq!(compiled.diagnostics.len(), 2);
        assert!(matches!(
            &compiled.diagnostics[0],
            Diagnostic::UnresolvedReference { reference, .. } if reference.ends_with("Missing")
        ));
        assert!(matches!(
            &compiled.diagnostics[1],
            Diagnostic::MalformedParameter { detail, .. } if detail.contains("broken")
        ));
    }

    #[test]
    fn request_body_reference_and_schema_ref_are_inlined() {
        let compiled = compile_json(json!({
            "openapi": "3.0.0",
            "components": {
                "schemas": {"Pet": {"type": "object", "required": ["name"], "properties": {"name": {"type": "string"}}}},
                "requestBodies": {"PetBody": {"content": {"application/json": {"schema": {"$ref": "#/components/schemas/Pet"}}}}}
            },
            "paths": {"/pets": {"post": {
                "operationId": "createPet",
                "requestBody": {"$ref": "#/components/requestBodies/PetBody"}
            }}}
        }));

        let tool = compiled.registry.get("POST::pets").expect("tool exists");
        assert_eq!(tool.input_schema["properties"]["name"][LOCATION_KEY], "body");
        assert_eq!(tool.input_schema["required"], json!(["name"]));
    }

    #[test]
    fn names_fall_back_to_summary_then_method_and_path() {
        let compiled = compile_json(json!({
            "openapi": "3.0.0",
            "paths": {
                "/a": {"get": {"summary": "List widgets"}},
                "/b": {"get": {}},
                "/c": {"get": {"operationId": "   "}},
                "/d": {"get": {"operationId": "", "summary": "Fetch gadgets"}}
            }
        }));

        let name = |id: &str| compiled.registry.get(id).map(|t| t.name.clone());
        assert_eq!(name("GET::a").as_deref(), Some("list-widgets"));
        assert_eq!(name("GET::b").as_deref(), Some("get-b"));
        assert_eq!(name("GET::c").as_deref(), Some("get-c"));
        assert_eq!(name("GET::d").as_deref(), Some("fetch-gadgets"));
        assert_eq!(
            compiled.registry.get("GET::b").map(|t| t.description.as_str()),
            Some("GET /b")
        );
    }

    #[test]
    fn undeclared_path_placeholders_are_synthesized() {
        let compiled = compile_json(json!({
            "openapi": "3.0.0",
            "paths": {"/orgs/{org}/repos": {"get": {"operationId": "listRepos"}}}
        }));
        let tool = compiled.registry.get("GET::orgs__---org__repos").expect("tool exists");
        assert_eq!(tool.input_schema["required"], json!(["org"]));
        assert_eq!(tool.resource_name.as_deref(), Some("repos"));
    }

    #[test]
    fn tool_id_collision_keeps_first() {
        let compiled = compile_json(json!({
            "openapi": "3.0.0",
            "paths": {
                "/users": {"get": {"operationId": "first"}},
                "/users/": {"get": {"operationId": "second"}}
            }
        }));
        assert_eq!(compiled.registry.len(), 1);
        assert_eq!(
            compiled.registry.get("GET::users").map(|t| t.name.as_str()),
            Some("first")
        );
        assert!(matches!(
            &compiled.diagnostics[..],
            [Diagnostic::ToolIdCollision { dropped, .. }] if dropped == "GET /users/"
        ));
    }

    fn colliding_names() -> Value {
        json!({
            "openapi": "3.0.0",
            "paths": {
                "/a": {"get": {"operationId": "listThings"}},
                "/b": {"get": {"operationId": "listThings"}}
            }
        })
    }

    #[test]
    fn name_collision_is_disambiguated_by_default() {
        let compiled = compile_json(colliding_names());
        let first = compiled.registry.get("GET::a").expect("first");
        let second = compiled.registry.get("GET::b").expect("second");
        assert_eq!(first.name, "list-things");
        assert_ne!(second.name, first.name);
        assert!(second.name.starts_with("list-things-"));
        assert!(matches!(
            &compiled.diagnostics[..],
            [Diagnostic::ToolNameCollision { second, .. }] if second == "GET::b"
        ));
    }

    #[test]
    fn name_collision_can_be_rejected() {
        let doc = parse_document(&colliding_names().to_string(), "test").expect("parses");
        let options = CompileOptions {
            collisions: CollisionPolicy::Reject,
            ..CompileOptions::default()
        };
        let err = compile(&doc, &options).unwrap_err();
        assert!(matches!(
            err,
            CompileError::ToolNameCollision { ref name, .. } if name == "list-things"
        ));
    }

    #[test]
    fn filter_limits_compiled_tools() {
        let options = CompileOptions {
            filter: ToolFilter {
                operations: vec!["post".into()],
                ..ToolFilter::default()
            },
            ..CompileOptions::default()
        };
        let compiled = compile_with(
            json!({
                "openapi": "3.0.0",
                "paths": {"/users": {
                    "get": {"operationId": "getUsers"},
                    "post": {"operationId": "createUser"}
                }}
            }),
            &options,
        );
        assert_eq!(compiled.registry.len(), 1);
        assert!(compiled.registry.contains("POST::users"));
    }

    #[test]
    fn collision_policy_parses() {
        assert_eq!("Reject".parse::<CollisionPolicy>(), Ok(CollisionPolicy::Reject));
        assert_eq!(
            "disambiguate".parse::<CollisionPolicy>(),
            Ok(CollisionPolicy::Disambiguate)
        );
        assert!("explode".parse::<CollisionPolicy>().is_err());
    }
}
