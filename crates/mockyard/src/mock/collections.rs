//! Building collections and resolving their `from` chains.

use super::types::{Collection, Route, Variant};
use crate::alerts::Alerts;
use mockyard_schema::{CompiledSchema, Value};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::debug;

pub(crate) struct CollectionsBuild {
    pub(crate) collections: Vec<Arc<Collection>>,
    pub(crate) invalid: usize,
}

/// Validate every collection definition against the live routes, then
/// resolve each collection through its ancestors.
pub(crate) fn build_collections(
    raw: &[Value],
    schema: &CompiledSchema,
    routes: &[Arc<Route>],
    variants: &HashMap<String, Arc<Variant>>,
    alerts: &Alerts,
) -> CollectionsBuild {
    let mut invalid = 0;
    let mut defined: Vec<Collection> = Vec::new();
    let mut seen = HashSet::new();

    for (index, definition) in raw.iter().enumerate() {
        let id = definition.get("id").and_then(Value::as_str);
        let alert_key = id.map(str::to_string).unwrap_or_else(|| index.to_string());

        let prefix = match id {
            Some(id) => format!("Collection with id \"{id}\" is invalid"),
            None => format!("Collection at index {index} is invalid"),
        };
        if let Err(error) = schema.validate_with(definition, &prefix) {
            alerts.set(&format!("validation:{alert_key}"), error.message, None);
            invalid += 1;
            continue;
        }
        let Some(id) = id else { continue };

        if !seen.insert(id.to_string()) {
            alerts.set(
                &format!("duplicated:{id}"),
                format!("Collection with duplicated id \"{id}\" detected. It has been ignored"),
                None,
            );
            invalid += 1;
            continue;
        }

        let listed: Vec<&str> = definition
            .get("routes")
            .and_then(Value::as_array)
            .map(|items| items.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default();

        let mut problems = Vec::new();
        let mut used_routes = HashSet::new();
        let mut defined_routes = Vec::new();
        for composite in listed {
            match variants.get(composite) {
                None => problems.push(format!(
                    "\"{composite}\": not found, use a valid \"routeId:variantId\" identifier"
                )),
                Some(variant) if !used_routes.insert(variant.route_id.as_str()) => {
                    problems.push(format!(
                        "\"{composite}\": route is used more than once in the same collection"
                    ))
                }
                Some(_) => defined_routes.push(composite.to_string()),
            }
        }
        if !problems.is_empty() {
            alerts.set(
                &format!("validation:{id}"),
                format!("{prefix}: {}", problems.join(". ")),
                None,
            );
            invalid += 1;
        }

        defined.push(Collection {
            id: id.to_string(),
            from: definition
                .get("from")
                .and_then(Value::as_str)
                .map(str::to_string),
            defined_routes,
            routes: Vec::new(),
            by_route: HashMap::new(),
        });
    }

    let index: HashMap<&str, usize> = defined
        .iter()
        .enumerate()
        .map(|(i, c)| (c.id.as_str(), i))
        .collect();

    let mut resolved = Vec::with_capacity(defined.len());
    for (position, collection) in defined.iter().enumerate() {
        let routes = match ancestor_chain(position, &defined, &index) {
            Ok(chain) => resolve(&chain, &defined, routes, variants),
            Err(message) => {
                alerts.set(&format!("from:{}", collection.id), message, None);
                invalid += 1;
                Vec::new()
            }
        };
        let by_route = routes
            .iter()
            .filter_map(|composite| {
                variants
                    .get(composite)
                    .map(|v| (v.route_id.clone(), composite.clone()))
            })
            .collect();
        debug!(collection = %collection.id, routes = routes.len(), "Collection resolved");
        resolved.push(Arc::new(Collection {
            routes,
            by_route,
            ..collection.clone()
        }));
    }

    CollectionsBuild {
        collections: resolved,
        invalid,
    }
}

/// Indexes of the collection and its ancestors, nearest first. The walk is
/// bounded by the number of collections.
fn ancestor_chain(
    start: usize,
    collections: &[Collection],
    index: &HashMap<&str, usize>,
) -> Result<Vec<usize>, String> {
    let id = &collections[start].id;
    let mut chain = vec![start];
    let mut current = start;

    for _ in 0..collections.len() {
        let Some(parent_id) = collections[current].from.as_deref() else {
            return Ok(chain);
        };
        let Some(&parent) = index.get(parent_id) else {
            return Err(format!(
                "Collection with id \"{id}\" is invalid: \"from\" collection \"{parent_id}\" was not found"
            ));
        };
        if chain.contains(&parent) {
            let mut path: Vec<&str> = chain.iter().map(|&i| collections[i].id.as_str()).collect();
            path.push(parent_id);
            return Err(format!(
                "Collection with id \"{id}\" is invalid: \"from\" chain is circular ({})",
                path.join(" -> ")
            ));
        }
        chain.push(parent);
        current = parent;
    }

    Err(format!(
        "Collection with id \"{id}\" is invalid: \"from\" chain does not terminate"
    ))
}

/// For every route in definition order, the first variant found walking
/// the chain. Routes no collection in the chain defines are omitted.
fn resolve(
    chain: &[usize],
    collections: &[Collection],
    routes: &[Arc<Route>],
    variants: &HashMap<String, Arc<Variant>>,
) -> Vec<String> {
    let per_collection: Vec<HashMap<&str, &str>> = chain
        .iter()
        .map(|&i| {
            collections[i]
                .defined_routes
                .iter()
                .filter_map(|composite| {
                    variants
                        .get(composite)
                        .map(|v| (v.route_id.as_str(), composite.as_str()))
                })
                .collect()
        })
        .collect();

    routes
        .iter()
        .filter_map(|route| {
            per_collection
                .iter()
                .find_map(|defined| defined.get(route.id.as_str()))
                .map(|composite| composite.to_string())
        })
        .collect()
}
