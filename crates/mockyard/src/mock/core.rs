//! The mock engine.

use super::catalog::HandlerCatalog;
use super::dispatch::dispatch;
use super::model::MockModel;
use super::overrides::Overrides;
use super::request::MockRequest;
use super::types::{
    CollectionSummary, DispatchOutcome, LoadSummary, MockError, MockOptions, RouteSummary,
    VariantSummary,
};
use crate::alerts::Alerts;
use crate::metrics;
use crate::variant_handlers::{HandlerError, VariantHandlerKind, VariantHandlerRegistry};
use arc_swap::ArcSwap;
use mockyard_schema::Value;
use parking_lot::{Mutex, RwLock};
use std::sync::Arc;
use tracing::{info, warn};

/// Routes, collections and overrides, served to concurrent requests.
///
/// The model (routes, variants, collections) and the overrides are each
/// swapped atomically as a whole. Administrative operations are serialized
/// by an internal mutex and never hold it across I/O.
pub struct Mock {
    catalog: ArcSwap<HandlerCatalog>,
    model: ArcSwap<MockModel>,
    overrides: ArcSwap<Overrides>,
    options: RwLock<MockOptions>,
    alerts: Alerts,
    admin: Mutex<()>,
}

impl Mock {
    /// An engine with the built-in handler kinds and no definitions.
    pub fn new(options: MockOptions, alerts: Alerts) -> Result<Self, MockError> {
        Self::with_registry(VariantHandlerRegistry::with_builtins(), options, alerts)
    }

    /// An engine with the given handler kinds.
    pub fn with_registry(
        registry: VariantHandlerRegistry,
        options: MockOptions,
        alerts: Alerts,
    ) -> Result<Self, MockError> {
        let catalog = HandlerCatalog::new(registry)?;
        Ok(Self {
            catalog: ArcSwap::from_pointee(catalog),
            model: ArcSwap::from_pointee(MockModel::default()),
            overrides: ArcSwap::from_pointee(Overrides::default()),
            options: RwLock::new(options),
            alerts,
            admin: Mutex::new(()),
        })
    }

    pub fn alerts(&self) -> &Alerts {
        &self.alerts
    }

    // ----- loading -----

    /// Replace the route definitions, keeping the current collections.
    pub fn load_routes(&self, routes: Vec<Value>) -> Result<LoadSummary, MockError> {
        let _guard = self.admin.lock();
        let collections = Arc::clone(&self.model.load().raw_collections);
        self.apply(Arc::new(routes), collections)
    }

    /// Replace the collection definitions, keeping the current routes.
    pub fn load_collections(&self, collections: Vec<Value>) -> Result<LoadSummary, MockError> {
        let _guard = self.admin.lock();
        let routes = Arc::clone(&self.model.load().raw_routes);
        self.apply(routes, Arc::new(collections))
    }

    /// Replace routes and collections in one swap.
    pub fn load_definitions(
        &self,
        routes: Vec<Value>,
        collections: Vec<Value>,
    ) -> Result<LoadSummary, MockError> {
        let _guard = self.admin.lock();
        self.apply(Arc::new(routes), Arc::new(collections))
    }

    /// Register more handler kinds and re-run the current definitions
    /// against the new schemas.
    pub fn register_handler_kinds(
        &self,
        kinds: impl IntoIterator<Item = Arc<dyn VariantHandlerKind>>,
    ) -> Result<LoadSummary, MockError> {
        let _guard = self.admin.lock();
        let mut registry = self.catalog.load().registry.clone();
        registry.register(kinds);
        self.catalog.store(Arc::new(HandlerCatalog::new(registry)?));

        let current = self.model.load_full();
        self.apply(
            Arc::clone(&current.raw_routes),
            Arc::clone(&current.raw_collections),
        )
    }

    fn apply(
        &self,
        raw_routes: Arc<Vec<Value>>,
        raw_collections: Arc<Vec<Value>>,
    ) -> Result<LoadSummary, MockError> {
        let catalog = self.catalog.load_full();
        let options = self.options();
        let model = MockModel::build(
            &catalog,
            raw_routes,
            raw_collections,
            options.selected_collection.as_deref(),
            &self.alerts,
        );
        let summary = model.summary();

        if options.strict && summary.invalid > 0 {
            metrics::record_definition_load(false);
            warn!(
                invalid = summary.invalid,
                "Invalid definitions found in strict mode, keeping previous definitions"
            );
            return Err(MockError::InvalidDefinitions {
                count: summary.invalid,
            });
        }

        self.check_overrides(&model, &self.overrides.load());
        self.model.store(Arc::new(model));
        metrics::record_definition_load(true);
        info!(
            routes = summary.routes,
            variants = summary.variants,
            collections = summary.collections,
            invalid = summary.invalid,
            "Mock definitions loaded"
        );
        Ok(summary)
    }

    /// Alert on overrides pointing to variants that no longer exist. They
    /// are kept and become effective again if the variant comes back.
    fn check_overrides(&self, model: &MockModel, overrides: &Overrides) {
        let alerts = self.alerts.collection("overrides");
        alerts.clean();
        for id in overrides.ids() {
            if !model.variants.contains_key(&id) {
                alerts.set(
                    &id,
                    format!("Route variant \"{id}\" set as override was not found. It is ignored"),
                    None,
                );
            }
        }
    }

    // ----- administration -----

    /// Activate a collection. Overrides are left untouched.
    pub fn select_collection(&self, id: &str) -> Result<(), MockError> {
        let _guard = self.admin.lock();
        let current = self.model.load_full();
        let index = current
            .collection_index(id)
            .ok_or_else(|| MockError::CollectionNotFound(id.to_string()))?;
        self.options.write().selected_collection = Some(id.to_string());
        self.alerts.remove("settings");
        self.model.store(Arc::new(current.with_active(index)));
        info!(collection = id, "Collection selected");
        Ok(())
    }

    /// Force a variant for its route, replacing any earlier override of the
    /// same route.
    pub fn set_override(&self, id: &str) -> Result<(), MockError> {
        let _guard = self.admin.lock();
        let model = self.model.load();
        let variant = model
            .variants
            .get(id)
            .ok_or_else(|| MockError::VariantNotFound(id.to_string()))?;
        let next = self.overrides.load().with(&variant.route_id, id);
        self.overrides.store(Arc::new(next));
        info!(variant = id, "Route variant override set");
        Ok(())
    }

    /// Drop every override. The active collection is left untouched.
    pub fn restore_overrides(&self) {
        let _guard = self.admin.lock();
        self.overrides.store(Arc::new(Overrides::default()));
        self.alerts.collection("overrides").clean();
        info!("Route variant overrides restored");
    }

    pub fn set_delay(&self, delay: u64) {
        self.options.write().delay = delay;
    }

    // ----- introspection -----

    pub fn options(&self) -> MockOptions {
        self.options.read().clone()
    }

    /// Id of the active collection.
    pub fn selected_collection(&self) -> Option<String> {
        self.model.load().active_collection().map(|c| c.id.clone())
    }

    /// Composite ids of the current overrides.
    pub fn overrides(&self) -> Vec<String> {
        self.overrides.load().ids()
    }

    /// Registered handler kind ids, in registration order.
    pub fn handler_kinds(&self) -> Vec<String> {
        self.catalog.load().registry.ids()
    }

    pub fn list_routes(&self) -> Vec<RouteSummary> {
        self.model
            .load()
            .routes
            .iter()
            .map(|r| RouteSummary::from(r.as_ref()))
            .collect()
    }

    /// Variants in route order, then variant order.
    pub fn list_variants(&self) -> Vec<VariantSummary> {
        self.model
            .load()
            .routes
            .iter()
            .flat_map(|r| r.variants.iter().map(|v| VariantSummary::from(v.as_ref())))
            .collect()
    }

    pub fn list_collections(&self) -> Vec<CollectionSummary> {
        self.model
            .load()
            .collections
            .iter()
            .map(|c| CollectionSummary::from(c.as_ref()))
            .collect()
    }

    pub fn route(&self, id: &str) -> Option<RouteSummary> {
        let model = self.model.load();
        let route = model.routes.iter().find(|r| r.id == id)?;
        Some(RouteSummary::from(route.as_ref()))
    }

    pub fn variant(&self, id: &str) -> Option<VariantSummary> {
        let model = self.model.load();
        model.variants.get(id).map(|v| VariantSummary::from(v.as_ref()))
    }

    pub fn collection(&self, id: &str) -> Option<CollectionSummary> {
        let model = self.model.load();
        let index = model.collection_index(id)?;
        Some(CollectionSummary::from(model.collections[index].as_ref()))
    }

    // ----- serving -----

    /// Dispatch one request against the current model and overrides.
    pub async fn dispatch(&self, request: MockRequest) -> Result<DispatchOutcome, HandlerError> {
        let model = self.model.load_full();
        let overrides = self.overrides.load_full();
        let delay = self.options.read().delay;
        dispatch(&model, &overrides, delay, request).await
    }
}
