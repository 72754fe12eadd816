//! Type definitions for the mock engine.

use super::path::PathMatcher;
use crate::variant_handlers::{MockResponse, VariantHandler};
use hyper::Method;
use mockyard_schema::{SchemaError, Value};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;

/// Verbs a route may answer, in the order `*` expands to.
pub const METHODS: [&str; 8] = [
    "GET", "POST", "PUT", "PATCH", "DELETE", "OPTIONS", "HEAD", "TRACE",
];

/// `routeId:variantId`
pub fn composite_id(route_id: &str, variant_id: &str) -> String {
    format!("{route_id}:{variant_id}")
}

/// Engine errors returned to administrative callers.
#[derive(Debug, thiserror::Error)]
pub enum MockError {
    #[error("Collection \"{0}\" was not found")]
    CollectionNotFound(String),

    #[error("Route variant \"{0}\" was not found")]
    VariantNotFound(String),

    #[error("{count} invalid definition(s) found, load rejected in strict mode")]
    InvalidDefinitions { count: usize },

    #[error("failed to compile definition schemas: {0}")]
    Schema(#[from] SchemaError),
}

/// Options read by the engine.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MockOptions {
    /// Collection to activate; the first one loaded when unset or missing.
    pub selected_collection: Option<String>,
    /// Global delay in ms, used when neither variant nor route sets one.
    pub delay: u64,
    /// Reject a whole load when any definition is invalid.
    pub strict: bool,
}

/// A live route.
#[derive(Debug)]
pub struct Route {
    pub id: String,
    /// Url as defined (string pattern or regex).
    pub url: Value,
    /// Method as defined.
    pub method: Value,
    pub methods: Vec<Method>,
    pub delay: Option<u64>,
    pub variants: Vec<Arc<Variant>>,
    pub(crate) matcher: PathMatcher,
}

impl Route {
    pub fn accepts(&self, method: &Method) -> bool {
        self.methods.contains(method)
    }
}

/// A live variant of a route.
#[derive(Debug)]
pub struct Variant {
    /// Composite id.
    pub id: String,
    /// Id inside its route.
    pub variant_id: String,
    pub route_id: String,
    pub kind: Option<String>,
    pub disabled: bool,
    pub delay: Option<u64>,
    pub preview: Option<serde_json::Value>,
    pub(crate) handler: Option<VariantHandler>,
}

/// A live collection.
#[derive(Debug, Clone)]
pub struct Collection {
    pub id: String,
    pub from: Option<String>,
    /// Composite ids listed in this collection's own definition.
    pub defined_routes: Vec<String>,
    /// Resolved composite ids, one per route at most, in route order.
    pub routes: Vec<String>,
    /// Route id to composite id, over `routes`.
    pub(crate) by_route: HashMap<String, String>,
}

impl Collection {
    pub fn variant_for(&self, route_id: &str) -> Option<&str> {
        self.by_route.get(route_id).map(String::as_str)
    }
}

/// Route as listed by the administrative surface.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteSummary {
    pub id: String,
    pub url: serde_json::Value,
    pub method: serde_json::Value,
    pub delay: Option<u64>,
    pub variants: Vec<String>,
}

/// Variant as listed by the administrative surface.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VariantSummary {
    pub id: String,
    pub route: String,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub disabled: bool,
    pub delay: Option<u64>,
    pub preview: Option<serde_json::Value>,
}

/// Collection as listed by the administrative surface.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionSummary {
    pub id: String,
    pub from: Option<String>,
    pub defined_routes: Vec<String>,
    pub routes: Vec<String>,
}

impl From<&Route> for RouteSummary {
    fn from(route: &Route) -> Self {
        Self {
            id: route.id.clone(),
            url: route.url.to_json(),
            method: route.method.to_json(),
            delay: route.delay,
            variants: route.variants.iter().map(|v| v.id.clone()).collect(),
        }
    }
}

impl From<&Variant> for VariantSummary {
    fn from(variant: &Variant) -> Self {
        Self {
            id: variant.id.clone(),
            route: variant.route_id.clone(),
            kind: variant.kind.clone(),
            disabled: variant.disabled,
            delay: variant.delay,
            preview: variant.preview.clone(),
        }
    }
}

impl From<&Collection> for CollectionSummary {
    fn from(collection: &Collection) -> Self {
        Self {
            id: collection.id.clone(),
            from: collection.from.clone(),
            defined_routes: collection.defined_routes.clone(),
            routes: collection.routes.clone(),
        }
    }
}

/// Counts reported after a load.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LoadSummary {
    pub routes: usize,
    pub variants: usize,
    pub collections: usize,
    /// Definitions dropped because they were invalid.
    pub invalid: usize,
}

/// Why a request was not answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unhandled {
    NoRouteMatched,
    NoVariantSelected,
    VariantDisabled,
    PassedByHandler,
}

/// Result of dispatching one request.
#[derive(Debug)]
pub enum DispatchOutcome {
    Responded(MockResponse),
    Unhandled(Unhandled),
}
