use async_trait::async_trait;
use portcullis_sdk::{DeploymentError, Provider, Service};

use super::context::{DeploymentContext, FilterChainBuilder};

/// The executable implementation bound to a provider's `(role, name)` pair.
///
/// The compiler owns the staged iteration: it drives every enabled provider
/// through `initialize_contribution`, then `contribute_provider` /
/// `contribute_filter`, then `finalize_contribution`, completing each stage
/// for all providers before the next stage begins. A contributor can
/// therefore assume in `finalize_contribution` that every other provider has
/// already contributed.
///
/// Registry-held contributor instances are shared across compilations and
/// must stay stateless; per-pass state prepared during
/// `initialize_contribution` belongs in the context's attribute bag.
#[async_trait]
pub trait ProviderContributor: Send + Sync {
    /// The pipeline stage this contributor serves (e.g. `authentication`).
    fn role(&self) -> &str;

    /// The implementation name within the role (e.g. `directory`).
    fn name(&self) -> &str;

    /// Prepare per-pass state: resolve and validate parameters. Must not
    /// mutate the output artifact yet.
    ///
    /// # Errors
    /// A failure here is fatal to the whole compilation pass.
    async fn initialize_contribution(
        &self,
        _ctx: &mut DeploymentContext,
    ) -> Result<(), DeploymentError> {
        Ok(())
    }

    /// Register topology-wide bindings (rewrite steps, shared resources)
    /// into the artifact.
    ///
    /// # Errors
    /// A failure here is fatal to the whole compilation pass.
    async fn contribute_provider(
        &self,
        _ctx: &mut DeploymentContext,
        _provider: &Provider,
    ) -> Result<(), DeploymentError> {
        Ok(())
    }

    /// Bind filters into one service's chain. Invoked once per
    /// `(provider, service)` pairing during the contribute stage.
    ///
    /// # Errors
    /// A failure here is fatal to the whole compilation pass.
    async fn contribute_filter(
        &self,
        _ctx: &mut DeploymentContext,
        _provider: &Provider,
        _service: &Service,
        _chain: &mut FilterChainBuilder,
    ) -> Result<(), DeploymentError> {
        Ok(())
    }

    /// Cross-provider validation or cleanup, after every provider has
    /// contributed.
    ///
    /// # Errors
    /// A failure here is fatal to the whole compilation pass.
    async fn finalize_contribution(
        &self,
        _ctx: &mut DeploymentContext,
    ) -> Result<(), DeploymentError> {
        Ok(())
    }
}
