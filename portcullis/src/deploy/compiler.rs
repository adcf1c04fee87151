use std::collections::HashSet;
use std::sync::Arc;

use portcullis_sdk::{DeploymentError, LifecycleStage, Provider, RewriteError, Topology};
use tracing::{error, info};
use uuid::Uuid;

use super::context::{DeploymentContext, DeploymentDescriptor, FilterBinding};
use super::contributor::ProviderContributor;
use super::registry::ContributorRegistry;
use crate::rewrite::{Direction, RewriteEnvironment, UrlRewriteEngine};
use crate::services::GatewayServices;

// ---------------------------------------------------------------------------
// CompiledPipeline
// ---------------------------------------------------------------------------

/// The published artifact of a successful compilation pass.
///
/// Immutable after publish: many in-flight requests read it concurrently
/// while a redeployment compiles its successor off to the side.
pub struct CompiledPipeline {
    topology: Arc<Topology>,
    descriptor: DeploymentDescriptor,
    engine: UrlRewriteEngine,
    environment: RewriteEnvironment,
}

impl CompiledPipeline {
    #[must_use]
    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    #[must_use]
    pub fn version(&self) -> Uuid {
        self.descriptor.version
    }

    #[must_use]
    pub fn descriptor(&self) -> &DeploymentDescriptor {
        &self.descriptor
    }

    /// The compiled filter chain for a backend service role.
    #[must_use]
    pub fn filter_chain(&self, service_role: &str) -> Option<&[FilterBinding]> {
        self.descriptor
            .resource(service_role)
            .map(|r| r.filters.as_slice())
    }

    /// Run a URL through the pipeline's rewrite chain.
    ///
    /// # Errors
    /// Propagates the failing step's `RewriteError`.
    pub async fn rewrite(&self, direction: Direction, url: &str) -> Result<String, RewriteError> {
        self.engine.rewrite(direction, url, &self.environment).await
    }

    /// Rewrite a URL arriving from the client.
    ///
    /// # Errors
    /// Propagates the failing step's `RewriteError`.
    pub async fn rewrite_inbound(&self, url: &str) -> Result<String, RewriteError> {
        self.rewrite(Direction::Inbound, url).await
    }

    /// Rewrite a URL leaving in a response.
    ///
    /// # Errors
    /// Propagates the failing step's `RewriteError`.
    pub async fn rewrite_outbound(&self, url: &str) -> Result<String, RewriteError> {
        self.rewrite(Direction::Outbound, url).await
    }
}

impl std::fmt::Debug for CompiledPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompiledPipeline")
            .field("topology", &self.descriptor.topology_name)
            .field("version", &self.descriptor.version)
            .field("resources", &self.descriptor.resources.len())
            .field("rewrite_steps", &self.engine.len())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// DeploymentCompiler
// ---------------------------------------------------------------------------

/// Turns a topology plus the contribution registry into a compiled pipeline.
///
/// Stages run strictly in order: every enabled provider is initialized, then
/// every one contributes, then every one finalizes. A failure at any point
/// aborts the pass and the partially built context is dropped, so nothing
/// partial can ever be published.
pub struct DeploymentCompiler {
    registry: Arc<ContributorRegistry>,
    services: Arc<GatewayServices>,
}

impl DeploymentCompiler {
    #[must_use]
    pub fn new(registry: Arc<ContributorRegistry>, services: Arc<GatewayServices>) -> Self {
        Self { registry, services }
    }

    /// Compile one topology version.
    ///
    /// # Errors
    /// Returns `DiscoveryFailure` if any enabled provider has no registered
    /// contributor, `DuplicateEnabledRole` if a role is enabled twice, or
    /// the first lifecycle error raised by a contributor.
    pub async fn compile(&self, topology: Topology) -> Result<CompiledPipeline, DeploymentError> {
        let topology = Arc::new(topology);
        let providers = select_enabled(&topology)?;

        // Resolve every contributor before any lifecycle stage runs, so a
        // missing registration aborts with zero side effects.
        let mut contributors: Vec<Arc<dyn ProviderContributor>> =
            Vec::with_capacity(providers.len());
        for provider in &providers {
            let contributor = self
                .registry
                .find(provider.role(), provider.name())
                .ok_or_else(|| DeploymentError::DiscoveryFailure {
                    role: provider.role().to_string(),
                    name: provider.name().to_string(),
                })?;
            contributors.push(contributor);
        }

        info!(
            topology = topology.name(),
            providers = providers.len(),
            services = topology.services().len(),
            "Compiling topology"
        );

        let mut ctx = DeploymentContext::new(topology.clone(), self.services.clone());

        for (provider, contributor) in providers.iter().zip(&contributors) {
            contributor
                .initialize_contribution(&mut ctx)
                .await
                .map_err(|e| abort(&topology, provider, LifecycleStage::Initialize, e))?;
        }

        for (provider, contributor) in providers.iter().zip(&contributors) {
            contributor
                .contribute_provider(&mut ctx, provider)
                .await
                .map_err(|e| abort(&topology, provider, LifecycleStage::Contribute, e))?;

            for index in 0..ctx.chain_count() {
                let service = &topology.services()[index];
                let mut chain = ctx.take_chain(index).ok_or_else(|| {
                    DeploymentError::lifecycle(
                        LifecycleStage::Contribute,
                        provider.role(),
                        format!("filter chain for '{}' unavailable", service.role()),
                    )
                })?;
                let contributed = contributor
                    .contribute_filter(&mut ctx, provider, service, &mut chain)
                    .await;
                ctx.restore_chain(index, chain);
                contributed
                    .map_err(|e| abort(&topology, provider, LifecycleStage::Contribute, e))?;
            }
        }

        for (provider, contributor) in providers.iter().zip(&contributors) {
            contributor
                .finalize_contribution(&mut ctx)
                .await
                .map_err(|e| abort(&topology, provider, LifecycleStage::Finalize, e))?;
        }

        let (descriptor, steps) = ctx.into_artifact();
        let environment = RewriteEnvironment::new(topology.name(), self.services.clone());

        info!(
            topology = topology.name(),
            version = %descriptor.version,
            rewrite_steps = steps.len(),
            "Topology compiled"
        );

        Ok(CompiledPipeline {
            topology,
            descriptor,
            engine: UrlRewriteEngine::new(steps),
            environment,
        })
    }
}

/// Enabled providers in declared order; a role enabled more than once is a
/// descriptor mistake and rejects the whole compilation.
fn select_enabled(topology: &Topology) -> Result<Vec<Provider>, DeploymentError> {
    let mut roles: HashSet<&str> = HashSet::new();
    for provider in topology.enabled_providers() {
        if !roles.insert(provider.role()) {
            return Err(DeploymentError::DuplicateEnabledRole {
                topology: topology.name().to_string(),
                role: provider.role().to_string(),
            });
        }
    }
    Ok(topology.enabled_providers().cloned().collect())
}

fn abort(
    topology: &Topology,
    provider: &Provider,
    stage: LifecycleStage,
    e: DeploymentError,
) -> DeploymentError {
    error!(
        topology = topology.name(),
        role = provider.role(),
        name = provider.name(),
        stage = %stage,
        error = %e,
        "Provider contribution failed; aborting compilation"
    );
    e
}
