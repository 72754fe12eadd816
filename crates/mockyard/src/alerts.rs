//! Scoped alert store.
//!
//! Alerts are non-fatal diagnostics (invalid definitions, missing
//! collections, unreadable files, ...). Every component receives an
//! [`Alerts`] handle scoped to its own id prefix; scopes are nested with
//! [`Alerts::collection`] and share one underlying store, so clearing a
//! scope never touches alerts raised by unrelated components.

use parking_lot::RwLock;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// A single alert as exposed by the admin API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Alert {
    /// Fully qualified id, e.g. `mock:routes:validation:users`.
    pub id: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Handle to one scope of the shared alert store.
#[derive(Debug, Clone, Default)]
pub struct Alerts {
    scope: String,
    store: Arc<RwLock<BTreeMap<String, Alert>>>,
}

impl Alerts {
    /// Create a new, empty store whose root scope is `scope`.
    pub fn new(scope: impl Into<String>) -> Self {
        Self {
            scope: scope.into(),
            store: Arc::new(RwLock::new(BTreeMap::new())),
        }
    }

    /// Scope id of this handle.
    pub fn scope(&self) -> &str {
        &self.scope
    }

    /// A child scope sharing the same store.
    pub fn collection(&self, id: &str) -> Alerts {
        Alerts {
            scope: self.qualify(id),
            store: Arc::clone(&self.store),
        }
    }

    fn qualify(&self, id: &str) -> String {
        if self.scope.is_empty() {
            id.to_string()
        } else {
            format!("{}:{}", self.scope, id)
        }
    }

    /// Raise (or replace) the alert `id` in this scope.
    pub fn set(&self, id: &str, message: impl Into<String>, error: Option<&dyn std::error::Error>) {
        let alert = Alert {
            id: self.qualify(id),
            message: message.into(),
            error: error.map(ToString::to_string),
        };
        match &alert.error {
            Some(error) => warn!(alert = %alert.id, error = %error, "{}", alert.message),
            None => warn!(alert = %alert.id, "{}", alert.message),
        }
        let total = {
            let mut store = self.store.write();
            store.insert(alert.id.clone(), alert);
            store.len()
        };
        crate::metrics::set_alerts(total);
    }

    /// Remove the alert `id` from this scope.
    pub fn remove(&self, id: &str) {
        let id = self.qualify(id);
        let total = {
            let mut store = self.store.write();
            store.remove(&id);
            store.len()
        };
        crate::metrics::set_alerts(total);
    }

    /// Remove every alert in this scope and its children.
    pub fn clean(&self) {
        let total = {
            let mut store = self.store.write();
            let before = store.len();
            store.retain(|id, _| !self.contains(id));
            if before != store.len() {
                debug!(scope = %self.scope, removed = before - store.len(), "Cleaned alerts");
            }
            store.len()
        };
        crate::metrics::set_alerts(total);
    }

    /// Alerts in this scope and its children, ordered by id.
    pub fn list(&self) -> Vec<Alert> {
        self.store
            .read()
            .values()
            .filter(|alert| self.contains(&alert.id))
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.store
            .read()
            .keys()
            .filter(|id| self.contains(id))
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn contains(&self, id: &str) -> bool {
        if self.scope.is_empty() {
            return true;
        }
        id == self.scope
            || id
                .strip_prefix(self.scope.as_str())
                .is_some_and(|rest| rest.starts_with(':'))
    }
}
