//! The immutable model swapped on every load.

use super::catalog::HandlerCatalog;
use super::collections::build_collections;
use super::routes::build_routes;
use super::types::{Collection, LoadSummary, Route, Variant};
use crate::alerts::Alerts;
use mockyard_schema::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// Routes, variants and collections of one load, plus the raw definitions
/// they were built from.
#[derive(Clone, Default)]
pub(crate) struct MockModel {
    pub(crate) raw_routes: Arc<Vec<Value>>,
    pub(crate) raw_collections: Arc<Vec<Value>>,
    pub(crate) routes: Vec<Arc<Route>>,
    pub(crate) variants: HashMap<String, Arc<Variant>>,
    pub(crate) collections: Vec<Arc<Collection>>,
    pub(crate) active: Option<usize>,
    pub(crate) invalid: usize,
}

impl MockModel {
    /// Build a model off to the side. `alerts` is the engine scope; routes,
    /// collections and selection each clean their own child scope first.
    pub(crate) fn build(
        catalog: &HandlerCatalog,
        raw_routes: Arc<Vec<Value>>,
        raw_collections: Arc<Vec<Value>>,
        selected: Option<&str>,
        alerts: &Alerts,
    ) -> Self {
        let route_alerts = alerts.collection("routes");
        route_alerts.clean();
        let routes = build_routes(&raw_routes, catalog, &route_alerts);

        let collection_alerts = alerts.collection("collections");
        collection_alerts.clean();
        let collections = build_collections(
            &raw_collections,
            &catalog.collection_schema,
            &routes.routes,
            &routes.variants,
            &collection_alerts,
        );

        let active = select(&collections.collections, selected, alerts);

        Self {
            raw_routes,
            raw_collections,
            routes: routes.routes,
            variants: routes.variants,
            collections: collections.collections,
            active,
            invalid: routes.invalid + collections.invalid,
        }
    }

    /// Same model with another active collection.
    pub(crate) fn with_active(&self, index: usize) -> Self {
        Self {
            active: Some(index),
            ..self.clone()
        }
    }

    pub(crate) fn active_collection(&self) -> Option<&Arc<Collection>> {
        self.active.and_then(|i| self.collections.get(i))
    }

    pub(crate) fn collection_index(&self, id: &str) -> Option<usize> {
        self.collections.iter().position(|c| c.id == id)
    }

    pub(crate) fn summary(&self) -> LoadSummary {
        LoadSummary {
            routes: self.routes.len(),
            variants: self.variants.len(),
            collections: self.collections.len(),
            invalid: self.invalid,
        }
    }
}

fn select(collections: &[Arc<Collection>], selected: Option<&str>, alerts: &Alerts) -> Option<usize> {
    alerts.remove("settings");
    if collections.is_empty() {
        alerts.set("settings", "No collections found", None);
        return None;
    }
    match selected {
        Some(id) => match collections.iter().position(|c| c.id == id) {
            Some(index) => Some(index),
            None => {
                alerts.set(
                    "settings",
                    format!("Collection \"{id}\" was not found. Selecting the first one found"),
                    None,
                );
                Some(0)
            }
        },
        None => {
            alerts.set(
                "settings",
                "Option \"mock.collections.selected\" was not defined. Selecting the first collection found",
                None,
            );
            Some(0)
        }
    }
}
