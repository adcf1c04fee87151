use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::Arc;

use portcullis_sdk::Topology;
use uuid::Uuid;

use crate::rewrite::RewriteStep;
use crate::services::GatewayServices;

// ---------------------------------------------------------------------------
// Pipeline role ordering
// ---------------------------------------------------------------------------

/// Fixed pipeline position per provider role. Filter chains are sorted by
/// this position at descriptor build, independent of descriptor order:
/// authentication runs before rewrite, rewrite before identity-assertion,
/// identity-assertion before authorization, and everything before dispatch.
/// Unknown roles land after authorization, before dispatch.
pub(crate) fn pipeline_position(role: &str) -> u32 {
    match role {
        "authentication" => 100,
        "rewrite" => 200,
        "identity-assertion" => 300,
        "authorization" => 400,
        "dispatch" => 1000,
        _ => 900,
    }
}

// ---------------------------------------------------------------------------
// Filter chains
// ---------------------------------------------------------------------------

/// One filter slot in a service's chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterBinding {
    pub role: String,
    pub name: String,
    pub params: HashMap<String, String>,
}

/// Collects filter bindings for one service during the contribute stage.
#[derive(Debug)]
pub struct FilterChainBuilder {
    service_role: String,
    bindings: Vec<FilterBinding>,
}

impl FilterChainBuilder {
    fn new(service_role: &str) -> Self {
        Self {
            service_role: service_role.to_string(),
            bindings: Vec::new(),
        }
    }

    #[must_use]
    pub fn service_role(&self) -> &str {
        &self.service_role
    }

    pub fn add_filter(
        &mut self,
        role: impl Into<String>,
        name: impl Into<String>,
        params: HashMap<String, String>,
    ) {
        self.bindings.push(FilterBinding {
            role: role.into(),
            name: name.into(),
            params,
        });
    }

    /// Sort bindings into fixed pipeline order. The sort is stable, so
    /// bindings sharing a role keep their contribution order.
    fn build(self) -> ResourceDescriptor {
        let mut filters = self.bindings;
        filters.sort_by_key(|binding| pipeline_position(&binding.role));
        ResourceDescriptor {
            service_role: self.service_role,
            filters,
        }
    }
}

/// A service's compiled request-processing chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceDescriptor {
    pub service_role: String,
    pub filters: Vec<FilterBinding>,
}

/// The output artifact of one compilation pass.
#[derive(Debug, Clone)]
pub struct DeploymentDescriptor {
    pub topology_name: String,
    pub version: Uuid,
    pub resources: Vec<ResourceDescriptor>,
}

impl DeploymentDescriptor {
    #[must_use]
    pub fn resource(&self, service_role: &str) -> Option<&ResourceDescriptor> {
        self.resources
            .iter()
            .find(|r| r.service_role == service_role)
    }
}

// ---------------------------------------------------------------------------
// DeploymentContext
// ---------------------------------------------------------------------------

/// The compiler's working state for one topology compilation pass.
///
/// Exclusively owned by that pass: dropped wholesale if any stage fails, so
/// partial contributions are never observable. Contributors reach shared
/// services through [`gateway_services`](Self::gateway_services) and stash
/// per-pass state in the typed attribute bag.
pub struct DeploymentContext {
    topology: Arc<Topology>,
    services: Arc<GatewayServices>,
    chains: Vec<Option<FilterChainBuilder>>,
    rewrite_steps: Vec<Arc<dyn RewriteStep>>,
    attributes: HashMap<TypeId, Box<dyn Any + Send + Sync>>,
}

impl DeploymentContext {
    pub(crate) fn new(topology: Arc<Topology>, services: Arc<GatewayServices>) -> Self {
        let chains = topology
            .services()
            .iter()
            .map(|s| Some(FilterChainBuilder::new(s.role())))
            .collect();
        Self {
            topology,
            services,
            chains,
            rewrite_steps: Vec::new(),
            attributes: HashMap::new(),
        }
    }

    #[must_use]
    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    #[must_use]
    pub fn gateway_services(&self) -> &Arc<GatewayServices> {
        &self.services
    }

    /// Bind a rewrite step into the artifact, applied in registration order
    /// at request time.
    pub fn add_rewrite_step(&mut self, step: Arc<dyn RewriteStep>) {
        self.rewrite_steps.push(step);
    }

    /// Stash per-pass state under its type. A second value of the same type
    /// replaces the first.
    pub fn set_attribute<T: Send + Sync + 'static>(&mut self, value: T) {
        self.attributes.insert(TypeId::of::<T>(), Box::new(value));
    }

    #[must_use]
    pub fn attribute<T: Send + Sync + 'static>(&self) -> Option<&T> {
        self.attributes
            .get(&TypeId::of::<T>())
            .and_then(|v| v.downcast_ref::<T>())
    }

    pub(crate) fn chain_count(&self) -> usize {
        self.chains.len()
    }

    pub(crate) fn take_chain(&mut self, index: usize) -> Option<FilterChainBuilder> {
        self.chains.get_mut(index).and_then(Option::take)
    }

    pub(crate) fn restore_chain(&mut self, index: usize, chain: FilterChainBuilder) {
        if let Some(slot) = self.chains.get_mut(index) {
            *slot = Some(chain);
        }
    }

    pub(crate) fn into_artifact(self) -> (DeploymentDescriptor, Vec<Arc<dyn RewriteStep>>) {
        let resources = self
            .chains
            .into_iter()
            .flatten()
            .map(FilterChainBuilder::build)
            .collect();
        let descriptor = DeploymentDescriptor {
            topology_name: self.topology.name().to_string(),
            version: Uuid::new_v4(),
            resources,
        };
        (descriptor, self.rewrite_steps)
    }
}
