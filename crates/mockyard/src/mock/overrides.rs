//! Runtime variant overrides.

/// Ordered set of forced variants, at most one per route.
///
/// Values are immutable; every change produces a new set so the engine can
/// swap it atomically.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Overrides {
    /// `(route id, composite variant id)`
    entries: Vec<(String, String)>,
}

impl Overrides {
    /// A copy with `composite` forced for `route_id`, replacing any earlier
    /// override of that route.
    pub fn with(&self, route_id: &str, composite: &str) -> Self {
        let mut entries: Vec<(String, String)> = self
            .entries
            .iter()
            .filter(|(route, _)| route != route_id)
            .cloned()
            .collect();
        entries.push((route_id.to_string(), composite.to_string()));
        Self { entries }
    }

    pub fn get(&self, route_id: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(route, _)| route == route_id)
            .map(|(_, composite)| composite.as_str())
    }

    /// Composite ids, in the order they were set.
    pub fn ids(&self) -> Vec<String> {
        self.entries.iter().map(|(_, c)| c.clone()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
