//! Schema document compilation.
//!
//! Schemas are written as JSON-schema documents and compiled once into a
//! [`CompiledSchema`] tree. Only the keywords the definition schemas need are
//! supported; annotation keywords (`title`, `description`, `$schema`, ...) are
//! ignored. The non-standard `instanceof` keyword accepts `"Function"` or
//! `"RegExp"` and matches the native members of [`crate::Value`].

use crate::types::SchemaError;
use serde_json::Value as Json;

/// Primitive types accepted by the `type` keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum JsonType {
    Null,
    Boolean,
    Integer,
    Number,
    String,
    Array,
    Object,
}

impl JsonType {
    fn parse(name: &str) -> Option<Self> {
        match name {
            "null" => Some(JsonType::Null),
            "boolean" => Some(JsonType::Boolean),
            "integer" => Some(JsonType::Integer),
            "number" => Some(JsonType::Number),
            "string" => Some(JsonType::String),
            "array" => Some(JsonType::Array),
            "object" => Some(JsonType::Object),
            _ => None,
        }
    }

    pub(crate) fn as_str(&self) -> &'static str {
        match self {
            JsonType::Null => "null",
            JsonType::Boolean => "boolean",
            JsonType::Integer => "integer",
            JsonType::Number => "number",
            JsonType::String => "string",
            JsonType::Array => "array",
            JsonType::Object => "object",
        }
    }
}

/// Native kinds accepted by the `instanceof` keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstanceKind {
    Function,
    RegExp,
}

impl InstanceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            InstanceKind::Function => "Function",
            InstanceKind::RegExp => "RegExp",
        }
    }
}

#[derive(Debug, Clone, Default)]
pub(crate) enum Additional {
    #[default]
    Allow,
    Deny,
    Schema(Box<Node>),
}

/// One compiled schema node.
#[derive(Debug, Clone, Default)]
pub(crate) struct Node {
    /// `false` schema: nothing validates.
    pub(crate) never: bool,
    pub(crate) types: Option<Vec<JsonType>>,
    pub(crate) enum_values: Option<Vec<Json>>,
    pub(crate) minimum: Option<f64>,
    pub(crate) min_length: Option<usize>,
    pub(crate) properties: Vec<(String, Node)>,
    pub(crate) required: Vec<String>,
    pub(crate) additional: Additional,
    pub(crate) items: Option<Box<Node>>,
    pub(crate) unique_items: bool,
    pub(crate) one_of: Vec<Node>,
    pub(crate) any_of: Vec<Node>,
    pub(crate) instance_of: Option<InstanceKind>,
}

/// A schema ready to validate [`crate::Value`]s.
#[derive(Debug, Clone)]
pub struct CompiledSchema {
    pub(crate) root: Node,
}

impl CompiledSchema {
    /// Compile a schema document.
    pub fn compile(document: &Json) -> Result<Self, SchemaError> {
        Ok(Self {
            root: compile_node(document, "#")?,
        })
    }
}

fn compile_node(document: &Json, path: &str) -> Result<Node, SchemaError> {
    let map = match document {
        Json::Bool(true) => return Ok(Node::default()),
        Json::Bool(false) => {
            return Ok(Node {
                never: true,
                ..Default::default()
            })
        }
        Json::Object(map) => map,
        _ => return Err(SchemaError::NotASchema(path.to_string())),
    };

    let mut node = Node::default();

    for (keyword, value) in map {
        let here = format!("{path}/{keyword}");
        match keyword.as_str() {
            "type" => node.types = Some(compile_types(value, &here)?),
            "enum" => {
                let values = value
                    .as_array()
                    .ok_or_else(|| invalid("enum", &here, "must be an array"))?;
                node.enum_values = Some(values.clone());
            }
            "const" => node.enum_values = Some(vec![value.clone()]),
            "minimum" => {
                node.minimum = Some(
                    value
                        .as_f64()
                        .ok_or_else(|| invalid("minimum", &here, "must be a number"))?,
                )
            }
            "minLength" => {
                node.min_length = Some(
                    value
                        .as_u64()
                        .ok_or_else(|| invalid("minLength", &here, "must be a non-negative integer"))?
                        as usize,
                )
            }
            "properties" => {
                let props = value
                    .as_object()
                    .ok_or_else(|| invalid("properties", &here, "must be an object"))?;
                for (name, sub) in props {
                    node.properties
                        .push((name.clone(), compile_node(sub, &format!("{here}/{name}"))?));
                }
            }
            "required" => {
                let names = value
                    .as_array()
                    .ok_or_else(|| invalid("required", &here, "must be an array"))?;
                for name in names {
                    let name = name
                        .as_str()
                        .ok_or_else(|| invalid("required", &here, "entries must be strings"))?;
                    node.required.push(name.to_string());
                }
            }
            "additionalProperties" => {
                node.additional = match value {
                    Json::Bool(true) => Additional::Allow,
                    Json::Bool(false) => Additional::Deny,
                    other => Additional::Schema(Box::new(compile_node(other, &here)?)),
                }
            }
            "items" => node.items = Some(Box::new(compile_node(value, &here)?)),
            "uniqueItems" => node.unique_items = value.as_bool().unwrap_or(false),
            "oneOf" => node.one_of = compile_list(value, "oneOf", &here)?,
            "anyOf" => node.any_of = compile_list(value, "anyOf", &here)?,
            "instanceof" => {
                let name = value
                    .as_str()
                    .ok_or_else(|| invalid("instanceof", &here, "must be a string"))?;
                node.instance_of = Some(match name {
                    "Function" => InstanceKind::Function,
                    "RegExp" => InstanceKind::RegExp,
                    other => {
                        return Err(SchemaError::UnknownInstance {
                            name: other.to_string(),
                            path: here,
                        })
                    }
                });
            }
            // annotations and unsupported vocabularies
            _ => {}
        }
    }

    Ok(node)
}

fn compile_types(value: &Json, path: &str) -> Result<Vec<JsonType>, SchemaError> {
    let names: Vec<&str> = match value {
        Json::String(name) => vec![name.as_str()],
        Json::Array(names) => names
            .iter()
            .map(|n| n.as_str().ok_or_else(|| invalid("type", path, "entries must be strings")))
            .collect::<Result<_, _>>()?,
        _ => return Err(invalid("type", path, "must be a string or an array")),
    };

    names
        .into_iter()
        .map(|name| {
            JsonType::parse(name).ok_or_else(|| SchemaError::UnknownType {
                name: name.to_string(),
                path: path.to_string(),
            })
        })
        .collect()
}

fn compile_list(value: &Json, keyword: &str, path: &str) -> Result<Vec<Node>, SchemaError> {
    let branches = value
        .as_array()
        .ok_or_else(|| invalid(keyword, path, "must be an array"))?;
    if branches.is_empty() {
        return Err(invalid(keyword, path, "must not be empty"));
    }
    branches
        .iter()
        .enumerate()
        .map(|(i, branch)| compile_node(branch, &format!("{path}/{i}")))
        .collect()
}

fn invalid(keyword: &str, path: &str, reason: &str) -> SchemaError {
    SchemaError::InvalidKeyword {
        keyword: keyword.to_string(),
        path: path.to_string(),
        reason: reason.to_string(),
    }
}
