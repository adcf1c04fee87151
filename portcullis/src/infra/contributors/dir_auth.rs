use std::collections::HashMap;

use async_trait::async_trait;
use portcullis_sdk::{DeploymentError, Provider, Service};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::deploy::{DeploymentContext, FilterChainBuilder, ProviderContributor};

pub const AUTHENTICATION_ROLE: &str = "authentication";
pub const DIRECTORY_AUTH_NAME: &str = "directory";

pub const PARAM_DIRECTORY_URL: &str = "directory.url";
pub const PARAM_SYSTEM_USERNAME: &str = "directory.system_username";
pub const PARAM_SYSTEM_PASSWORD: &str = "directory.system_password";
pub const PARAM_USER_DN_TEMPLATE: &str = "directory.user_dn_template";

/// Typed view over the provider's parameter map.
#[derive(Debug, Deserialize)]
struct DirectoryAuthConfig {
    #[serde(rename = "directory.url")]
    #[allow(dead_code)] // Consumed by the authentication filter at request time.
    url: String,
    #[serde(rename = "directory.system_username", default)]
    system_username: Option<String>,
    #[serde(rename = "directory.system_password", default)]
    system_password: Option<String>,
}

/// Directory-backed authentication.
///
/// Requires `directory.url`. The system credentials
/// (`directory.system_username` / `directory.system_password`) only feed the
/// administrative bind check: when absent, each missing parameter is warned
/// about by name and the check is disabled, but compilation proceeds. This
/// degraded mode is deliberate and specific to this provider.
pub struct DirectoryAuthContributor;

#[async_trait]
impl ProviderContributor for DirectoryAuthContributor {
    fn role(&self) -> &str {
        AUTHENTICATION_ROLE
    }

    fn name(&self) -> &str {
        DIRECTORY_AUTH_NAME
    }

    async fn initialize_contribution(
        &self,
        ctx: &mut DeploymentContext,
    ) -> Result<(), DeploymentError> {
        let Some(provider) = ctx.topology().provider_of_role(AUTHENTICATION_ROLE) else {
            return Ok(());
        };

        let config: DirectoryAuthConfig = serde_json::to_value(provider.params())
            .and_then(serde_json::from_value)
            .map_err(|e| DeploymentError::InvalidParameter {
                role: AUTHENTICATION_ROLE.to_string(),
                param: PARAM_DIRECTORY_URL.to_string(),
                detail: format!("invalid directory auth config: {e}"),
            })?;

        if config.system_username.is_none() {
            warn!(
                topology = ctx.topology().name(),
                "{PARAM_SYSTEM_USERNAME} is not present; system bind check disabled"
            );
        }
        if config.system_password.is_none() {
            warn!(
                topology = ctx.topology().name(),
                "{PARAM_SYSTEM_PASSWORD} is not present; system bind check disabled"
            );
        }

        Ok(())
    }

    async fn contribute_filter(
        &self,
        ctx: &mut DeploymentContext,
        provider: &Provider,
        service: &Service,
        chain: &mut FilterChainBuilder,
    ) -> Result<(), DeploymentError> {
        let params: HashMap<String, String> = provider
            .params()
            .iter()
            .filter(|(key, _)| key.starts_with("directory."))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();

        debug!(
            topology = ctx.topology().name(),
            service = service.role(),
            "Binding authentication filter"
        );
        chain.add_filter(AUTHENTICATION_ROLE, DIRECTORY_AUTH_NAME, params);
        Ok(())
    }
}
