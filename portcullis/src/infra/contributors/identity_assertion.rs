use std::collections::HashMap;

use async_trait::async_trait;
use portcullis_sdk::{DeploymentError, LifecycleStage, Provider, Service};

use super::dir_auth::AUTHENTICATION_ROLE;
use crate::deploy::{DeploymentContext, FilterChainBuilder, ProviderContributor};

pub const IDENTITY_ASSERTION_ROLE: &str = "identity-assertion";
pub const DEFAULT_ASSERTION_NAME: &str = "default";

/// Default identity assertion: propagates the authenticated principal to
/// the dispatched request, applying `principal.mapping` when configured.
///
/// Asserting an identity only makes sense after one was established, so
/// `finalize_contribution` verifies an enabled authentication provider
/// participated in the same topology.
pub struct IdentityAssertionContributor;

#[async_trait]
impl ProviderContributor for IdentityAssertionContributor {
    fn role(&self) -> &str {
        IDENTITY_ASSERTION_ROLE
    }

    fn name(&self) -> &str {
        DEFAULT_ASSERTION_NAME
    }

    async fn contribute_filter(
        &self,
        _ctx: &mut DeploymentContext,
        provider: &Provider,
        _service: &Service,
        chain: &mut FilterChainBuilder,
    ) -> Result<(), DeploymentError> {
        let mut params = HashMap::new();
        if let Some(mapping) = provider.param("principal.mapping") {
            params.insert("principal.mapping".to_string(), mapping.to_string());
        }
        chain.add_filter(IDENTITY_ASSERTION_ROLE, DEFAULT_ASSERTION_NAME, params);
        Ok(())
    }

    async fn finalize_contribution(
        &self,
        ctx: &mut DeploymentContext,
    ) -> Result<(), DeploymentError> {
        if ctx.topology().provider_of_role(AUTHENTICATION_ROLE).is_none() {
            return Err(DeploymentError::lifecycle(
                LifecycleStage::Finalize,
                IDENTITY_ASSERTION_ROLE,
                "requires an enabled authentication provider in the same topology",
            ));
        }
        Ok(())
    }
}
