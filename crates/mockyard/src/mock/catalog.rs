//! Definition schemas bound to a set of handler kinds.
//!
//! The route schema's variant `type` enum depends on which kinds are
//! registered, so it is compiled from a [`VariantHandlerRegistry`]. A new
//! catalog has to be built whenever the registry changes.

use super::types::{MockError, METHODS};
use crate::variant_handlers::VariantHandlerRegistry;
use mockyard_schema::CompiledSchema;
use serde_json::{json, Value as Json};
use std::collections::HashMap;

const VARIANT_TYPES_POINTER: &str = "/properties/variants/items/oneOf/0/properties/type/enum";

fn method_tokens() -> Vec<String> {
    METHODS
        .iter()
        .flat_map(|m| [m.to_lowercase(), m.to_string()])
        .collect()
}

fn route_schema_template() -> Json {
    let methods = method_tokens();
    let mut with_all = methods.clone();
    with_all.push("*".to_string());
    json!({
        "type": "object",
        "properties": {
            "id": {"type": "string", "minLength": 1},
            "url": {"anyOf": [{"type": "string"}, {"instanceof": "RegExp"}]},
            "method": {
                "anyOf": [
                    {"enum": with_all},
                    {"type": "array", "items": {"enum": methods}, "uniqueItems": true}
                ]
            },
            "delay": {"type": ["integer", "null"], "minimum": 0},
            "variants": {
                "type": "array",
                "items": {
                    "oneOf": [
                        {
                            "type": "object",
                            "properties": {
                                "id": {"type": "string", "minLength": 1},
                                "type": {"enum": []},
                                "delay": {"type": ["integer", "null"], "minimum": 0},
                                "options": {},
                                "disabled": {"const": false}
                            },
                            "required": ["id", "type"],
                            "additionalProperties": false
                        },
                        {
                            "type": "object",
                            "properties": {
                                "id": {"type": "string", "minLength": 1},
                                "disabled": {"const": true}
                            },
                            "required": ["id", "disabled"],
                            "additionalProperties": false
                        }
                    ]
                }
            }
        },
        "required": ["id", "url", "method", "variants"],
        "additionalProperties": false
    })
}

fn collection_schema() -> Json {
    json!({
        "type": "object",
        "properties": {
            "id": {"type": "string", "minLength": 1},
            "from": {"type": ["string", "null"]},
            "routes": {
                "type": "array",
                "items": {"type": "string"},
                "uniqueItems": true
            }
        },
        "required": ["id", "routes"],
        "additionalProperties": false
    })
}

/// Compiled schemas plus the registry they were compiled for.
pub(crate) struct HandlerCatalog {
    pub(crate) registry: VariantHandlerRegistry,
    pub(crate) route_schema: CompiledSchema,
    pub(crate) collection_schema: CompiledSchema,
    options_schemas: HashMap<String, CompiledSchema>,
}

impl HandlerCatalog {
    pub(crate) fn new(registry: VariantHandlerRegistry) -> Result<Self, MockError> {
        let mut document = route_schema_template();
        if let Some(slot) = document.pointer_mut(VARIANT_TYPES_POINTER) {
            *slot = Json::Array(registry.ids().into_iter().map(Json::String).collect());
        }
        let route_schema = CompiledSchema::compile(&document)?;
        let collection_schema = CompiledSchema::compile(&collection_schema())?;

        let mut options_schemas = HashMap::new();
        for kind in registry.iter() {
            if options_schemas.contains_key(kind.id()) {
                continue;
            }
            if let Some(schema) = kind.options_schema() {
                options_schemas.insert(kind.id().to_string(), CompiledSchema::compile(&schema)?);
            }
        }

        Ok(Self {
            registry,
            route_schema,
            collection_schema,
            options_schemas,
        })
    }

    /// Options schema of the first kind registered as `kind`.
    pub(crate) fn options_schema(&self, kind: &str) -> Option<&CompiledSchema> {
        self.options_schemas.get(kind)
    }
}
