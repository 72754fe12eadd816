//! Building live routes and variants from raw definitions.

use super::catalog::HandlerCatalog;
use super::path::PathMatcher;
use super::types::{composite_id, Route, Variant, METHODS};
use crate::alerts::Alerts;
use crate::variant_handlers::VariantContext;
use hyper::Method;
use mockyard_schema::{SchemaViolation, ValidationError, Value};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::debug;

/// Routes and variants built from one load.
#[derive(Default)]
pub(crate) struct RoutesBuild {
    pub(crate) routes: Vec<Arc<Route>>,
    pub(crate) variants: HashMap<String, Arc<Variant>>,
    pub(crate) invalid: usize,
}

/// Validate and build every route definition, in order.
///
/// Invalid routes are dropped; invalid variants are dropped from an
/// otherwise valid route. Every problem is raised as an alert.
pub(crate) fn build_routes(raw: &[Value], catalog: &HandlerCatalog, alerts: &Alerts) -> RoutesBuild {
    let mut build = RoutesBuild::default();
    let mut seen = HashSet::new();

    for (index, definition) in raw.iter().enumerate() {
        let id = definition.get("id").and_then(Value::as_str);
        let alert_key = id.map(str::to_string).unwrap_or_else(|| index.to_string());

        if let Err(violations) = catalog.route_schema.validate(definition) {
            let prefix = match id {
                Some(id) => format!("Route with id \"{id}\" is invalid"),
                None => format!("Route at index {index} is invalid"),
            };
            let error = ValidationError::new(prefix, name_variants(definition, violations));
            alerts.set(&format!("validation:{alert_key}"), error.message.clone(), None);
            build.invalid += 1;
            continue;
        }
        // the schema guarantees an id from here on
        let Some(id) = id else { continue };

        if !seen.insert(id.to_string()) {
            alerts.set(
                &format!("duplicated:{id}"),
                format!("Route with duplicated id \"{id}\" detected. It has been ignored"),
                None,
            );
            build.invalid += 1;
            continue;
        }

        let url = definition.get("url").cloned().unwrap_or_default();
        let matcher = match &url {
            Value::Regex(regex) => Ok(PathMatcher::from_regex(regex.clone())),
            other => PathMatcher::parse(other.as_str().unwrap_or_default()),
        };
        let matcher = match matcher {
            Ok(matcher) => matcher,
            Err(e) => {
                alerts.set(
                    &format!("url:{id}"),
                    format!("Route with id \"{id}\" has an invalid url"),
                    Some(&e),
                );
                build.invalid += 1;
                continue;
            }
        };

        let method = definition.get("method").cloned().unwrap_or_default();
        let delay = definition.get("delay").and_then(Value::as_u64);

        let mut variants = Vec::new();
        let mut variant_ids = HashSet::new();
        let empty = Vec::new();
        let variant_definitions = definition
            .get("variants")
            .and_then(Value::as_array)
            .unwrap_or(&empty);
        for variant_definition in variant_definitions {
            let Some(variant) =
                build_variant(id, variant_definition, catalog, alerts, &mut variant_ids)
            else {
                build.invalid += 1;
                continue;
            };
            // `a:b` + `c` and `a` + `b:c` share a composite id
            if let Some(existing) = build.variants.get(&variant.id) {
                alerts.set(
                    &format!("variants:{}", variant.id),
                    format!(
                        "Variant with id \"{}\" in route \"{id}\" has the same identifier \"{}\" as a variant of route \"{}\". It has been ignored",
                        variant.variant_id, variant.id, existing.route_id
                    ),
                    None,
                );
                build.invalid += 1;
                continue;
            }
            variants.push(Arc::new(variant));
        }

        debug!(route = id, variants = variants.len(), "Route loaded");
        for variant in &variants {
            build.variants.insert(variant.id.clone(), Arc::clone(variant));
        }
        build.routes.push(Arc::new(Route {
            id: id.to_string(),
            url,
            methods: normalize_methods(&method),
            method,
            delay,
            variants,
            matcher,
        }));
    }

    build
}

fn build_variant(
    route_id: &str,
    definition: &Value,
    catalog: &HandlerCatalog,
    alerts: &Alerts,
    seen: &mut HashSet<String>,
) -> Option<Variant> {
    let variant_id = definition.get("id").and_then(Value::as_str)?;
    let id = composite_id(route_id, variant_id);
    let alert_key = format!("variants:{id}");

    if !seen.insert(variant_id.to_string()) {
        alerts.set(
            &alert_key,
            format!(
                "Variant with duplicated id \"{variant_id}\" detected in route \"{route_id}\". It has been ignored"
            ),
            None,
        );
        return None;
    }

    let delay = definition.get("delay").and_then(Value::as_u64);
    if definition.get("disabled").and_then(Value::as_bool) == Some(true) {
        return Some(Variant {
            id,
            variant_id: variant_id.to_string(),
            route_id: route_id.to_string(),
            kind: None,
            disabled: true,
            delay,
            preview: None,
            handler: None,
        });
    }

    let kind_id = definition.get("type").and_then(Value::as_str)?;
    let kind = catalog.registry.find(kind_id)?;
    let options = definition.get("options").cloned().unwrap_or_default();
    let prefix =
        format!("Variant with id \"{variant_id}\" in route with id \"{route_id}\" is invalid");

    if let Some(schema) = catalog.options_schema(kind_id) {
        if let Err(violations) = schema.validate(&options) {
            let violations = violations
                .into_iter()
                .map(|v| SchemaViolation {
                    instance_path: format!("/options{}", v.instance_path),
                    ..v
                })
                .collect();
            alerts.set(&alert_key, ValidationError::new(&prefix, violations).message, None);
            return None;
        }
    }

    let context = VariantContext {
        route_id: route_id.to_string(),
        variant_id: variant_id.to_string(),
    };
    let handler = match kind.build(&options, &context) {
        Ok(handler) => handler,
        Err(e) => {
            alerts.set(&alert_key, format!("{prefix}: {e}"), None);
            return None;
        }
    };

    Some(Variant {
        id,
        variant_id: variant_id.to_string(),
        route_id: route_id.to_string(),
        kind: Some(kind_id.to_string()),
        disabled: false,
        delay,
        preview: handler.preview(),
        handler: Some(handler),
    })
}

/// Replace `/variants/N` prefixes with the variant's id, so messages name
/// the offending variant.
fn name_variants(definition: &Value, violations: Vec<SchemaViolation>) -> Vec<SchemaViolation> {
    let variants = definition.get("variants").and_then(Value::as_array);
    violations
        .into_iter()
        .map(|violation| {
            let Some(rest) = violation.instance_path.strip_prefix("/variants/") else {
                return violation;
            };
            let (index, tail) = rest.split_once('/').unwrap_or((rest, ""));
            let variant_id = index
                .parse::<usize>()
                .ok()
                .and_then(|i| variants.and_then(|v| v.get(i)))
                .and_then(|v| v.get("id"))
                .and_then(Value::as_str);
            match variant_id {
                Some(variant_id) => SchemaViolation {
                    instance_path: format!("variant \"{variant_id}\" /{tail}")
                        .trim_end_matches(" /")
                        .to_string(),
                    ..violation
                },
                None => violation,
            }
        })
        .collect()
}

/// Upper-cased method set; `*` expands to every verb.
fn normalize_methods(method: &Value) -> Vec<Method> {
    let tokens: Vec<&str> = match method {
        Value::String(s) => vec![s.as_str()],
        Value::Array(items) => items.iter().filter_map(Value::as_str).collect(),
        _ => Vec::new(),
    };
    let mut methods = Vec::new();
    for token in tokens {
        let names: Vec<String> = if token == "*" {
            METHODS.iter().map(|m| m.to_string()).collect()
        } else {
            vec![token.to_ascii_uppercase()]
        };
        for name in names {
            if let Ok(method) = Method::from_bytes(name.as_bytes()) {
                if !methods.contains(&method) {
                    methods.push(method);
                }
            }
        }
    }
    methods
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::variant_handlers::VariantHandlerRegistry;
    use serde_json::json;

    fn catalog() -> HandlerCatalog {
        HandlerCatalog::new(VariantHandlerRegistry::with_builtins()).unwrap()
    }

    #[test]
    fn test_normalize_methods() {
        assert_eq!(normalize_methods(&Value::from("get")), vec![Method::GET]);
        assert_eq!(
            normalize_methods(&Value::from(json!(["post", "PUT", "post"]))),
            vec![Method::POST, Method::PUT]
        );
        assert_eq!(normalize_methods(&Value::from("*")).len(), 8);
    }

    #[test]
    fn test_invalid_option_drops_only_the_variant() {
        let alerts = Alerts::new("routes");
        let raw = vec![Value::from(json!({
            "id": "users",
            "url": "/users",
            "method": "GET",
            "variants": [
                {"id": "ok", "type": "json", "options": {"status": 200, "body": []}},
                {"id": "bad", "type": "json", "options": {"status": "200"}}
            ]
        }))];
        let build = build_routes(&raw, &catalog(), &alerts);

        assert_eq!(build.routes.len(), 1);
        assert_eq!(build.routes[0].variants.len(), 1);
        assert!(build.variants.contains_key("users:ok"));
        assert_eq!(build.invalid, 1);

        let listed = alerts.list();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, "routes:variants:users:bad");
        assert!(listed[0]
            .message
            .starts_with("Variant with id \"bad\" in route with id \"users\" is invalid:"));
        assert!(listed[0].message.contains("/options/status: must be integer"));
        assert!(listed[0].message.contains("must have required property 'body'"));
    }

    #[test]
    fn test_duplicated_ids_are_ignored() {
        let alerts = Alerts::new("routes");
        let route = json!({
            "id": "users", "url": "/users", "method": "GET",
            "variants": [
                {"id": "ok", "type": "status", "options": {"status": 200}},
                {"id": "ok", "type": "status", "options": {"status": 500}}
            ]
        });
        let raw = vec![Value::from(route.clone()), Value::from(route)];
        let build = build_routes(&raw, &catalog(), &alerts);

        assert_eq!(build.routes.len(), 1);
        assert_eq!(build.routes[0].variants.len(), 1);
        assert_eq!(build.invalid, 2);
        let ids: Vec<String> = alerts.list().into_iter().map(|a| a.id).collect();
        assert!(ids.contains(&"routes:duplicated:users".to_string()));
        assert!(ids.contains(&"routes:variants:users:ok".to_string()));
    }

    #[test]
    fn test_colliding_composite_ids_are_ignored() {
        let alerts = Alerts::new("routes");
        let raw = vec![
            Value::from(json!({
                "id": "a:b", "url": "/first", "method": "GET",
                "variants": [{"id": "c", "type": "status", "options": {"status": 200}}]
            })),
            Value::from(json!({
                "id": "a", "url": "/second", "method": "GET",
                "variants": [
                    {"id": "b:c", "type": "status", "options": {"status": 500}},
                    {"id": "d", "type": "status", "options": {"status": 204}}
                ]
            })),
        ];
        let build = build_routes(&raw, &catalog(), &alerts);

        assert_eq!(build.routes.len(), 2);
        assert_eq!(build.variants.len(), 2);
        assert_eq!(build.variants["a:b:c"].route_id, "a:b");
        assert!(build.variants.contains_key("a:d"));
        assert_eq!(build.routes[1].variants.len(), 1);
        assert_eq!(build.invalid, 1);

        let listed = alerts.list();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, "routes:variants:a:b:c");
        assert!(listed[0].message.contains("as a variant of route \"a:b\""));
    }
}
