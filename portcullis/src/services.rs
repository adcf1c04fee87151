use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::Arc;

/// Type-keyed registry of cross-cutting services shared by every topology.
///
/// Contributors and rewrite steps resolve collaborators by trait
/// (`services.get::<dyn CryptoService>()`) instead of by string key, so a
/// missing or mistyped registration is caught at the lookup site with a
/// precise type name. Registration happens once at process start through
/// [`GatewayServicesBuilder`]; the built registry is immutable, which keeps
/// the read path lock-free for unbounded concurrent callers.
pub struct GatewayServices {
    entries: HashMap<TypeId, Box<dyn Any + Send + Sync>>,
}

impl GatewayServices {
    #[must_use]
    pub fn builder() -> GatewayServicesBuilder {
        GatewayServicesBuilder {
            entries: HashMap::new(),
        }
    }

    /// Look up a service by its trait type.
    #[must_use]
    pub fn get<S: ?Sized + Send + Sync + 'static>(&self) -> Option<Arc<S>> {
        self.entries
            .get(&TypeId::of::<S>())
            .and_then(|entry| entry.downcast_ref::<Arc<S>>())
            .cloned()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl std::fmt::Debug for GatewayServices {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayServices")
            .field("registered", &self.entries.len())
            .finish()
    }
}

pub struct GatewayServicesBuilder {
    entries: HashMap<TypeId, Box<dyn Any + Send + Sync>>,
}

impl GatewayServicesBuilder {
    /// Register a shared service under its trait type. A later registration
    /// of the same type replaces the earlier one.
    #[must_use]
    pub fn register<S: ?Sized + Send + Sync + 'static>(mut self, service: Arc<S>) -> Self {
        self.entries.insert(TypeId::of::<S>(), Box::new(service));
        self
    }

    #[must_use]
    pub fn build(self) -> Arc<GatewayServices> {
        Arc::new(GatewayServices {
            entries: self.entries,
        })
    }
}
