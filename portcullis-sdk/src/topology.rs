use std::collections::HashMap;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Provider
// ---------------------------------------------------------------------------

/// A role-tagged configuration unit contributing behavior to the pipeline.
///
/// The role selects a pipeline stage (e.g. `authentication`, `rewrite`),
/// the name selects a specific implementation within that role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Provider {
    role: String,
    name: String,
    enabled: bool,
    params: HashMap<String, String>,
}

impl Provider {
    #[must_use]
    pub fn new(role: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            name: name.into(),
            enabled: true,
            params: HashMap::new(),
        }
    }

    #[must_use]
    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    #[must_use]
    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }

    #[must_use]
    pub fn role(&self) -> &str {
        &self.role
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn enabled(&self) -> bool {
        self.enabled
    }

    #[must_use]
    pub fn params(&self) -> &HashMap<String, String> {
        &self.params
    }

    #[must_use]
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }
}

// ---------------------------------------------------------------------------
// Service
// ---------------------------------------------------------------------------

/// A backend service endpoint group. Consumed by dispatch, never mutated
/// by the deployment core.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Service {
    role: String,
    params: HashMap<String, String>,
    urls: Vec<String>,
}

impl Service {
    #[must_use]
    pub fn new(role: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            params: HashMap::new(),
            urls: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.urls.push(url.into());
        self
    }

    #[must_use]
    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }

    #[must_use]
    pub fn role(&self) -> &str {
        &self.role
    }

    #[must_use]
    pub fn params(&self) -> &HashMap<String, String> {
        &self.params
    }

    #[must_use]
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    #[must_use]
    pub fn urls(&self) -> &[String] {
        &self.urls
    }
}

// ---------------------------------------------------------------------------
// Topology
// ---------------------------------------------------------------------------

/// Immutable per-cluster configuration: an ordered list of providers and an
/// ordered list of backend services.
///
/// A new descriptor version produces a new `Topology` instance; there is no
/// in-place mutation after `build()`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Topology {
    name: String,
    providers: Vec<Provider>,
    services: Vec<Service>,
}

impl Topology {
    #[must_use]
    pub fn builder(name: impl Into<String>) -> TopologyBuilder {
        TopologyBuilder {
            name: name.into(),
            providers: Vec::new(),
            services: Vec::new(),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn providers(&self) -> &[Provider] {
        &self.providers
    }

    #[must_use]
    pub fn services(&self) -> &[Service] {
        &self.services
    }

    /// Providers participating in the compiled pipeline, in declared order.
    pub fn enabled_providers(&self) -> impl Iterator<Item = &Provider> {
        self.providers.iter().filter(|p| p.enabled())
    }

    /// The first *enabled* provider of the given role, if any.
    #[must_use]
    pub fn provider_of_role(&self, role: &str) -> Option<&Provider> {
        self.enabled_providers().find(|p| p.role() == role)
    }
}

#[derive(Debug)]
pub struct TopologyBuilder {
    name: String,
    providers: Vec<Provider>,
    services: Vec<Service>,
}

impl TopologyBuilder {
    #[must_use]
    pub fn provider(mut self, provider: Provider) -> Self {
        self.providers.push(provider);
        self
    }

    #[must_use]
    pub fn service(mut self, service: Service) -> Self {
        self.services.push(service);
        self
    }

    #[must_use]
    pub fn build(self) -> Topology {
        Topology {
            name: self.name,
            providers: self.providers,
            services: self.services,
        }
    }
}
