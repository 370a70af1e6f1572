// @zen-component: TOOL-SchemaDereferencer
//
//! Schema dereferencing: inlines `$ref` pointers and flattens `allOf`.
//!
//! Operates on raw `serde_json::Value` schema trees so unknown keywords
//! (`format`, `enum`, `description`, ...) pass through untouched. Resolution
//! never fails: anything that cannot be resolved degrades to `{}`.

use std::collections::HashSet;

use serde_json::{Map, Value, json};
use tracing::warn;

/// Pointer prefix of local component schemas.
const SCHEMA_REF_PREFIX: &str = "#/components/schemas/";

/// Component schemas keyed by name.
pub type ComponentSchemas = Map<String, Value>;

// @zen-impl: TOOL-SchemaDereferencer per-branch cycle guard
/// Dereference `schema` against `components`.
///
/// `visited` holds the component names already expanded on the current
/// branch. It is copied on every `$ref` descent, so sibling branches never
/// share cycle state.
pub fn inline(
    schema: &Value,
    components: &ComponentSchemas,
    visited: &HashSet<String>,
) -> Value {
    let Some(obj) = schema.as_object() else {
        return schema.clone();
    };

    if let Some(reference) = obj.get("$ref") {
        return inline_reference(reference, components, visited);
    }

    if let Some(Value::Array(branches)) = obj.get("allOf") {
        return merge_all_of(obj, branches, components, visited);
    }

    let mut out = obj.clone();

    for keyword in ["oneOf", "anyOf"] {
        if let Some(Value::Array(branches)) = obj.get(keyword) {
            let resolved = branches
                .iter()
                .map(|b| inline(b, components, visited))
                .collect();
            out.insert(keyword.to_string(), Value::Array(resolved));
        }
    }

    if let Some(not) = obj.get("not") {
        out.insert("not".to_string(), inline(not, components, visited));
    }

    if let Some(Value::Object(props)) = obj.get("properties") {
        let resolved: Map<String, Value> = props
            .iter()
            .map(|(name, prop)| (name.clone(), inline(prop, components, visited)))
            .collect();
        out.insert("properties".to_string(), Value::Object(resolved));
    }

    if let Some(items) = obj.get("items") {
        out.insert("items".to_string(), inline(items, components, visited));
    }

    if let Some(extra @ Value::Object(_)) = obj.get("additionalProperties") {
        out.insert(
            "additionalProperties".to_string(),
            inline(extra, components, visited),
        );
    }

    Value::Object(out)
}

/// Convenience wrapper starting with an empty `visited` set.
pub fn inline_root(schema: &Value, components: &ComponentSchemas) -> Value {
    inline(schema, components, &HashSet::new())
}

/// Extract the component name from a local schema pointer.
///
/// Returns `None` for external documents, other component namespaces and
/// malformed pointers.
pub fn component_name(reference: &str) -> Option<String> {
    let raw = reference.strip_prefix(SCHEMA_REF_PREFIX)?;
    if raw.is_empty() || raw.contains('/') {
        return None;
    }
    Some(unescape_pointer(raw))
}

/// Decode JSON-pointer escapes (`~1` → `/`, `~0` → `~`).
pub(crate) fn unescape_pointer(token: &str) -> String {
    token.replace("~1", "/").replace("~0", "~")
}

fn inline_reference(
    reference: &Value,
    components: &ComponentSchemas,
    visited: &HashSet<String>,
) -> Value {
    let Some(pointer) = reference.as_str() else {
        warn!(reference = %reference, "non-string $ref, degrading to empty schema");
        return empty();
    };

    let Some(name) = component_name(pointer) else {
        warn!(reference = pointer, "unsupported $ref, degrading to empty schema");
        return empty();
    };

    if visited.contains(&name) {
        return empty();
    }

    let Some(target) = components.get(&name) else {
        warn!(reference = pointer, "unresolved $ref, degrading to empty schema");
        return empty();
    };

    let mut branch = visited.clone();
    branch.insert(name);
    inline(target, components, &branch)
}

fn merge_all_of(
    obj: &Map<String, Value>,
    branches: &[Value],
    components: &ComponentSchemas,
    visited: &HashSet<String>,
) -> Value {
    let mut merged: Map<String, Value> = obj
        .iter()
        .filter(|(k, _)| !matches!(k.as_str(), "allOf" | "properties" | "required" | "type"))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();

    let mut properties = Map::new();
    let mut required: Vec<String> = Vec::new();

    // Properties declared next to `allOf` take part in the merge.
    let own = json!({
        "properties": obj.get("properties").cloned().unwrap_or_else(|| json!({})),
        "required": obj.get("required").cloned().unwrap_or_else(|| json!([])),
    });
    let resolved_own = inline(&own, components, visited);

    let resolved_branches = branches.iter().map(|b| inline(b, components, visited));

    for branch in std::iter::once(resolved_own).chain(resolved_branches) {
        if let Some(Value::Object(props)) = branch.get("properties") {
            for (name, prop) in props {
                properties.entry(name.clone()).or_insert_with(|| prop.clone());
            }
        }
        if let Some(Value::Array(req)) = branch.get("required") {
            for name in req.iter().filter_map(Value::as_str) {
                if !required.iter().any(|r| r == name) {
                    required.push(name.to_string());
                }
            }
        }
        if let Some(desc) = branch.get("description")
            && !merged.contains_key("description")
        {
            merged.insert("description".to_string(), desc.clone());
        }
    }

    merged.insert("type".to_string(), json!("object"));
    merged.insert("properties".to_string(), Value::Object(properties));
    if !required.is_empty() {
        merged.insert("required".to_string(), json!(required));
    }
    Value::Object(merged)
}

fn empty() -> Value {
    Value::Object(Map::new())
}
