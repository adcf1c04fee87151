use std::sync::Arc;

use crate::services::GatewayServices;

/// The symbolic name under which the rewrite environment exposes the shared
/// service registry. External integrations that mirror the environment as a
/// generic attribute map use this key; in-process callers use the typed
/// [`RewriteEnvironment::services`] accessor directly.
pub const GATEWAY_SERVICES_ATTRIBUTE: &str = "portcullis.gateway.services";

/// What a rewrite rule sees at evaluation time.
///
/// Rules resolve shared services (crypto, alias store) through this
/// environment on every invocation rather than caching instances, so an
/// administrative secret rotation is observed by the very next request.
#[derive(Clone)]
pub struct RewriteEnvironment {
    topology_name: String,
    services: Arc<GatewayServices>,
}

impl RewriteEnvironment {
    #[must_use]
    pub fn new(topology_name: impl Into<String>, services: Arc<GatewayServices>) -> Self {
        Self {
            topology_name: topology_name.into(),
            services,
        }
    }

    #[must_use]
    pub fn topology_name(&self) -> &str {
        &self.topology_name
    }

    #[must_use]
    pub fn services(&self) -> &Arc<GatewayServices> {
        &self.services
    }

    /// Convenience lookup for a shared service by trait.
    #[must_use]
    pub fn service<S: ?Sized + Send + Sync + 'static>(&self) -> Option<Arc<S>> {
        self.services.get::<S>()
    }
}

impl std::fmt::Debug for RewriteEnvironment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RewriteEnvironment")
            .field("topology_name", &self.topology_name)
            .finish()
    }
}
