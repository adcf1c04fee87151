use std::collections::HashMap;

use async_trait::async_trait;
use portcullis_sdk::{DeploymentError, Provider, Service};

use crate::deploy::{DeploymentContext, FilterChainBuilder, ProviderContributor};

pub const AUTHORIZATION_ROLE: &str = "authorization";
pub const ACLS_AUTHZ_NAME: &str = "acls";

/// ACL-based authorization. Rules are declared per service role on the
/// provider: `<SERVICE_ROLE>.acl = user;group;ip` with an optional
/// `<SERVICE_ROLE>.acl.mode = AND|OR`. A service without a rule gets the
/// filter anyway and falls back to allowing any authenticated principal.
pub struct AclAuthzContributor;

#[async_trait]
impl ProviderContributor for AclAuthzContributor {
    fn role(&self) -> &str {
        AUTHORIZATION_ROLE
    }

    fn name(&self) -> &str {
        ACLS_AUTHZ_NAME
    }

    async fn contribute_filter(
        &self,
        _ctx: &mut DeploymentContext,
        provider: &Provider,
        service: &Service,
        chain: &mut FilterChainBuilder,
    ) -> Result<(), DeploymentError> {
        let mut params = HashMap::new();
        if let Some(acl) = provider.param(&format!("{}.acl", service.role())) {
            params.insert("acl".to_string(), acl.to_string());
        }
        if let Some(mode) = provider.param(&format!("{}.acl.mode", service.role())) {
            let mode = mode.to_ascii_uppercase();
            if mode != "AND" && mode != "OR" {
                return Err(DeploymentError::InvalidParameter {
                    role: AUTHORIZATION_ROLE.to_string(),
                    param: format!("{}.acl.mode", service.role()),
                    detail: format!("expected AND or OR, got '{mode}'"),
                });
            }
            params.insert("acl.mode".to_string(), mode);
        }
        chain.add_filter(AUTHORIZATION_ROLE, ACLS_AUTHZ_NAME, params);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use portcullis_sdk::Topology;

    use crate::deploy::FilterBinding;
    use crate::services::GatewayServices;

    async fn contribute(
        provider: &Provider,
        service: &Service,
    ) -> Result<FilterBinding, DeploymentError> {
        let topology = Topology::builder("t").service(service.clone()).build();
        let mut ctx =
            DeploymentContext::new(Arc::new(topology), GatewayServices::builder().build());

        let mut chain = ctx.take_chain(0).unwrap();
        AclAuthzContributor
            .contribute_filter(&mut ctx, provider, service, &mut chain)
            .await?;
        ctx.restore_chain(0, chain);

        let (descriptor, _) = ctx.into_artifact();
        Ok(descriptor.resources[0].filters[0].clone())
    }

    #[tokio::test]
    async fn copies_service_scoped_acl_params() {
        let provider = Provider::new(AUTHORIZATION_ROLE, ACLS_AUTHZ_NAME)
            .with_param("WEATHER.acl", "bob;admins;*")
            .with_param("WEATHER.acl.mode", "or")
            .with_param("OTHER.acl", "nobody;;");

        let binding = contribute(&provider, &Service::new("WEATHER")).await.unwrap();
        assert_eq!(binding.params.get("acl").unwrap(), "bob;admins;*");
        assert_eq!(binding.params.get("acl.mode").unwrap(), "OR");
        assert!(!binding.params.contains_key("OTHER.acl"));
    }

    #[tokio::test]
    async fn service_without_rule_still_gets_filter() {
        let provider = Provider::new(AUTHORIZATION_ROLE, ACLS_AUTHZ_NAME);
        let binding = contribute(&provider, &Service::new("WEATHER")).await.unwrap();
        assert_eq!(binding.role, AUTHORIZATION_ROLE);
        assert!(binding.params.is_empty());
    }

    #[tokio::test]
    async fn invalid_mode_is_rejected() {
        let provider = Provider::new(AUTHORIZATION_ROLE, ACLS_AUTHZ_NAME)
            .with_param("WEATHER.acl.mode", "XOR");
        let err = contribute(&provider, &Service::new("WEATHER"))
            .await
            .unwrap_err();
        assert!(matches!(err, DeploymentError::InvalidParameter { .. }));
    }
}
