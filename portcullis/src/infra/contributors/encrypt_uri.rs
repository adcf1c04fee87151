use std::sync::Arc;

use async_trait::async_trait;
use portcullis_sdk::{
    CryptoService, DeploymentError, LifecycleStage, OpaqueToken, Provider, RewriteError,
};
use tracing::debug;
use url::Url;

use crate::deploy::{DeploymentContext, ProviderContributor};
use crate::rewrite::{Direction, RewriteEnvironment, RewriteStep};

pub const ENCRYPT_URI_ROLE: &str = "encrypt-uri";
pub const ENCRYPT_URI_NAME: &str = "default";

/// Provider parameter naming the alias whose secret keys the tokens.
pub const PARAM_ALIAS: &str = "alias";
/// Alias used when the provider does not configure one.
pub const DEFAULT_ALIAS: &str = "encrypt-url";
/// Query parameter carrying the opaque token on rewritten URLs.
pub const ENCRYPTED_QUERY_PARAM: &str = "_enc";
const ENCRYPTED_QUERY_PREFIX: &str = "_enc=";

/// Per-pass settings resolved during initialization. Only the alias *name*
/// is cached; the secret itself is resolved lazily, per request, through
/// the crypto service, so rotation takes effect immediately.
#[derive(Debug, Clone)]
struct EncryptUriSettings {
    alias: String,
}

/// Opaques backend-revealing query strings in outbound URLs and restores
/// them on the way back in.
///
/// If the configured alias cannot be resolved at use time, the rewrite
/// fails the request rather than passing the URL through unmodified:
/// leaking backend topology is worse than an availability failure.
pub struct EncryptUriContributor;

#[async_trait]
impl ProviderContributor for EncryptUriContributor {
    fn role(&self) -> &str {
        ENCRYPT_URI_ROLE
    }

    fn name(&self) -> &str {
        ENCRYPT_URI_NAME
    }

    async fn initialize_contribution(
        &self,
        ctx: &mut DeploymentContext,
    ) -> Result<(), DeploymentError> {
        let alias = ctx
            .topology()
            .provider_of_role(ENCRYPT_URI_ROLE)
            .and_then(|p| p.param(PARAM_ALIAS))
            .unwrap_or(DEFAULT_ALIAS)
            .to_string();

        if alias.is_empty()
            || !alias
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-')
        {
            return Err(DeploymentError::InvalidParameter {
                role: ENCRYPT_URI_ROLE.to_string(),
                param: PARAM_ALIAS.to_string(),
                detail: "alias must be non-empty and use only [a-zA-Z0-9_-]".to_string(),
            });
        }

        ctx.set_attribute(EncryptUriSettings { alias });
        Ok(())
    }

    async fn contribute_provider(
        &self,
        ctx: &mut DeploymentContext,
        _provider: &Provider,
    ) -> Result<(), DeploymentError> {
        let settings = ctx
            .attribute::<EncryptUriSettings>()
            .cloned()
            .ok_or_else(|| {
                DeploymentError::lifecycle(
                    LifecycleStage::Contribute,
                    ENCRYPT_URI_ROLE,
                    "initialization did not run",
                )
            })?;

        debug!(
            topology = ctx.topology().name(),
            alias = %settings.alias,
            "Binding URI encryption steps"
        );
        ctx.add_rewrite_step(Arc::new(EncryptQueryStep {
            alias: settings.alias.clone(),
        }));
        ctx.add_rewrite_step(Arc::new(DecryptQueryStep {
            alias: settings.alias,
        }));
        Ok(())
    }
}

fn crypto_service(env: &RewriteEnvironment) -> Result<Arc<dyn CryptoService>, RewriteError> {
    env.service::<dyn CryptoService>()
        .ok_or_else(|| RewriteError::Internal("crypto service not registered".into()))
}

fn parse_url(url: &str) -> Result<Url, RewriteError> {
    Url::parse(url).map_err(|e| RewriteError::invalid_url(url, e.to_string()))
}

// ---------------------------------------------------------------------------
// Steps
// ---------------------------------------------------------------------------

/// OUTBOUND: replace the query string with `_enc=<token>`.
struct EncryptQueryStep {
    alias: String,
}

#[async_trait]
impl RewriteStep for EncryptQueryStep {
    fn name(&self) -> &str {
        "encrypt-query"
    }

    fn direction(&self) -> Direction {
        Direction::Outbound
    }

    async fn apply(&self, url: &str, env: &RewriteEnvironment) -> Result<String, RewriteError> {
        let mut parsed = parse_url(url)?;
        let Some(query) = parsed.query().map(str::to_owned) else {
            return Ok(url.to_string());
        };
        if query.is_empty() || query.starts_with(ENCRYPTED_QUERY_PREFIX) {
            return Ok(url.to_string());
        }

        let crypto = crypto_service(env)?;
        let token = crypto
            .encrypt_for_topology(env.topology_name(), &self.alias, query.as_bytes())
            .await?;

        parsed.set_query(Some(&format!("{ENCRYPTED_QUERY_PARAM}={token}")));
        Ok(parsed.into())
    }
}

/// INBOUND: detect `_enc=<token>` and restore the plaintext query.
struct DecryptQueryStep {
    alias: String,
}

#[async_trait]
impl RewriteStep for DecryptQueryStep {
    fn name(&self) -> &str {
        "decrypt-query"
    }

    fn direction(&self) -> Direction {
        Direction::Inbound
    }

    async fn apply(&self, url: &str, env: &RewriteEnvironment) -> Result<String, RewriteError> {
        let mut parsed = parse_url(url)?;
        let Some(query) = parsed.query().map(str::to_owned) else {
            return Ok(url.to_string());
        };
        let Some(encoded) = query.strip_prefix(ENCRYPTED_QUERY_PREFIX) else {
            return Ok(url.to_string());
        };

        let token = OpaqueToken::parse(encoded)?;
        let crypto = crypto_service(env)?;
        let plaintext = crypto
            .decrypt_for_topology(env.topology_name(), &self.alias, &token)
            .await?;
        let restored = String::from_utf8(plaintext)
            .map_err(|_| RewriteError::Internal("decrypted query is not valid UTF-8".into()))?;

        parsed.set_query(Some(&restored));
        Ok(parsed.into())
    }
}
