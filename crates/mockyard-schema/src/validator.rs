//! Validation of [`Value`]s against a [`CompiledSchema`].
//!
//! Every violation is collected instead of stopping at the first one, so a
//! single pass reports all problems of a definition.

use crate::schema::{Additional, CompiledSchema, InstanceKind, JsonType, Node};
use crate::types::{SchemaViolation, ValidationError};
use crate::value::Value;

impl CompiledSchema {
    /// Validate `value`, returning every violation found.
    pub fn validate(&self, value: &Value) -> Result<(), Vec<SchemaViolation>> {
        let mut violations = Vec::new();
        check(&self.root, value, "", &mut violations);
        if violations.is_empty() {
            Ok(())
        } else {
            Err(violations)
        }
    }

    /// Validate `value` and wrap violations into a [`ValidationError`] whose
    /// message starts with `prefix`.
    pub fn validate_with(&self, value: &Value, prefix: &str) -> Result<(), ValidationError> {
        self.validate(value)
            .map_err(|violations| ValidationError::new(prefix, violations))
    }
}

fn check(node: &Node, value: &Value, path: &str, out: &mut Vec<SchemaViolation>) {
    if node.never {
        out.push(SchemaViolation::new(path, "false schema", "boolean schema is false"));
        return;
    }

    if let Some(kind) = node.instance_of {
        let ok = matches!(
            (kind, value),
            (InstanceKind::Function, Value::Function(_)) | (InstanceKind::RegExp, Value::Regex(_))
        );
        if !ok {
            out.push(SchemaViolation::new(
                path,
                "instanceof",
                format!("must pass \"instanceof\" keyword validation ({})", kind.as_str()),
            ));
            return;
        }
    }

    if let Some(types) = &node.types {
        if !types.iter().any(|t| type_matches(*t, value)) {
            let names = types.iter().map(JsonType::as_str).collect::<Vec<_>>().join(",");
            out.push(SchemaViolation::new(path, "type", format!("must be {names}")));
            return;
        }
    }

    if let Some(allowed) = &node.enum_values {
        let json = value.to_json();
        let native = matches!(value, Value::Regex(_) | Value::Function(_));
        if native || !allowed.contains(&json) {
            let list = allowed
                .iter()
                .map(|v| match v {
                    serde_json::Value::String(s) => s.clone(),
                    other => other.to_string(),
                })
                .collect::<Vec<_>>()
                .join(", ");
            out.push(SchemaViolation::new(
                path,
                "enum",
                format!("must be equal to one of the allowed values: {list}"),
            ));
        }
    }

    if let (Some(minimum), Some(n)) = (node.minimum, value.as_f64()) {
        if n < minimum {
            out.push(SchemaViolation::new(path, "minimum", format!("must be >= {minimum}")));
        }
    }

    if let (Some(min), Some(s)) = (node.min_length, value.as_str()) {
        if s.chars().count() < min {
            out.push(SchemaViolation::new(
                path,
                "minLength",
                format!("must NOT have fewer than {min} characters"),
            ));
        }
    }

    if let Value::Object(map) = value {
        for name in &node.required {
            if !map.contains_key(name) {
                out.push(SchemaViolation::new(
                    path,
                    "required",
                    format!("must have required property '{name}'"),
                ));
            }
        }
        for (key, child) in map {
            let child_path = format!("{path}/{}", escape_pointer(key));
            match node.properties.iter().find(|(name, _)| name == key) {
                Some((_, sub)) => check(sub, child, &child_path, out),
                None => match &node.additional {
                    Additional::Allow => {}
                    Additional::Deny => out.push(SchemaViolation::new(
                        path,
                        "additionalProperties",
                        format!("must NOT have additional property '{key}'"),
                    )),
                    Additional::Schema(sub) => check(sub, child, &child_path, out),
                },
            }
        }
    }

    if let Value::Array(items) = value {
        if let Some(item_schema) = &node.items {
            for (i, item) in items.iter().enumerate() {
                check(item_schema, item, &format!("{path}/{i}"), out);
            }
        }
        if node.unique_items {
            if let Some((i, j)) = first_duplicate(items) {
                out.push(SchemaViolation::new(
                    path,
                    "uniqueItems",
                    format!("must NOT have duplicate items (items ## {j} and {i} are identical)"),
                ));
            }
        }
    }

    if !node.one_of.is_empty() {
        check_branches(&node.one_of, value, path, "oneOf", out);
    }
    if !node.any_of.is_empty() {
        check_branches(&node.any_of, value, path, "anyOf", out);
    }
}

/// `oneOf` requires exactly one passing branch, `anyOf` at least one. When no
/// branch passes, the violations of the closest branch are reported.
fn check_branches(
    branches: &[Node],
    value: &Value,
    path: &str,
    keyword: &str,
    out: &mut Vec<SchemaViolation>,
) {
    let results: Vec<Vec<SchemaViolation>> = branches
        .iter()
        .map(|branch| {
            let mut local = Vec::new();
            check(branch, value, path, &mut local);
            local
        })
        .collect();

    let passing = results.iter().filter(|r| r.is_empty()).count();

    if passing == 0 {
        if let Some(closest) = results.into_iter().min_by_key(Vec::len) {
            out.extend(closest);
        }
    } else if keyword == "oneOf" && passing > 1 {
        out.push(SchemaViolation::new(
            path,
            keyword,
            "must match exactly one schema in oneOf",
        ));
    }
}

fn type_matches(expected: JsonType, value: &Value) -> bool {
    match (expected, value) {
        (JsonType::Null, Value::Null) => true,
        (JsonType::Boolean, Value::Bool(_)) => true,
        (JsonType::Integer, Value::Number(n)) => {
            n.is_i64() || n.is_u64() || n.as_f64().map(|f| f.fract() == 0.0).unwrap_or(false)
        }
        (JsonType::Number, Value::Number(_)) => true,
        (JsonType::String, Value::String(_)) => true,
        (JsonType::Array, Value::Array(_)) => true,
        (JsonType::Object, Value::Object(_)) => true,
        _ => false,
    }
}

fn first_duplicate(items: &[Value]) -> Option<(usize, usize)> {
    for j in 1..items.len() {
        for i in 0..j {
            if items[i] == items[j] {
                return Some((i, j));
            }
        }
    }
    None
}

fn escape_pointer(key: &str) -> String {
    key.replace('~', "~0").replace('/', "~1")
}
