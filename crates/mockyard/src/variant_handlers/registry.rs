//! Ordered registry of variant handler kinds.

use super::{builtin_kinds, VariantHandlerKind};
use std::sync::Arc;
use tracing::debug;

/// Available handler kinds, in registration order.
///
/// Registering a kind whose id already exists appends it anyway: the id
/// list used by route validation keeps every entry, while [`find`] always
/// returns the first registration of an id.
///
/// [`find`]: VariantHandlerRegistry::find
#[derive(Clone, Default)]
pub struct VariantHandlerRegistry {
    kinds: Vec<Arc<dyn VariantHandlerKind>>,
}

impl VariantHandlerRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding the built-in kinds.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(builtin_kinds());
        registry
    }

    pub fn register(&mut self, kinds: impl IntoIterator<Item = Arc<dyn VariantHandlerKind>>) {
        for kind in kinds {
            debug!(kind = kind.id(), "Registering variant handler kind");
            self.kinds.push(kind);
        }
    }

    pub fn find(&self, id: &str) -> Option<&Arc<dyn VariantHandlerKind>> {
        self.kinds.iter().find(|kind| kind.id() == id)
    }

    /// Every registered id, duplicates included.
    pub fn ids(&self) -> Vec<String> {
        self.kinds.iter().map(|kind| kind.id().to_string()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn VariantHandlerKind>> {
        self.kinds.iter()
    }

    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::variant_handlers::{HandlerError, VariantContext, VariantHandler};
    use mockyard_schema::Value;

    struct Named(&'static str, u16);

    impl VariantHandlerKind for Named {
        fn id(&self) -> &str {
            self.0
        }

        fn build(&self, _: &Value, _: &VariantContext) -> Result<VariantHandler, HandlerError> {
            Err(HandlerError::Options(format!("kind {}", self.1)))
        }
    }

    #[test]
    fn test_builtins_registered_in_order() {
        let registry = VariantHandlerRegistry::with_builtins();
        assert_eq!(registry.len(), 7);
        assert_eq!(registry.ids()[0], "json");
        assert!(registry.find("proxy").is_some());
        assert!(registry.find("graphql").is_none());
    }

    #[test]
    fn test_duplicate_ids_are_appended_and_first_wins() {
        let mut registry = VariantHandlerRegistry::new();
        registry.register([
            Arc::new(Named("custom", 1)) as Arc<dyn VariantHandlerKind>,
            Arc::new(Named("custom", 2)),
        ]);
        assert_eq!(registry.ids(), vec!["custom", "custom"]);

        let context = VariantContext {
            route_id: "r".to_string(),
            variant_id: "v".to_string(),
        };
        let err = registry
            .find("custom")
            .unwrap()
            .build(&Value::Null, &context)
            .unwrap_err();
        assert_eq!(err.to_string(), "invalid options: kind 1");
    }
}
