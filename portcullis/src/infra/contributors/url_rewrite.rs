use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use portcullis_sdk::{DeploymentError, Provider, Service};
use tracing::debug;

use crate::deploy::{DeploymentContext, FilterChainBuilder, ProviderContributor};
use crate::rewrite::{Direction, PatternRule};

pub const REWRITE_ROLE: &str = "rewrite";
pub const URL_REWRITE_NAME: &str = "url-rewrite";

/// Prefix marking a provider parameter as a rewrite rule declaration.
const RULE_PARAM_PREFIX: &str = "rule.";

/// Declarative URL rewriting from provider parameters.
///
/// Each `rule.<name>` parameter declares one rule as
/// `<inbound|outbound>:<pattern>-><replacement>`. Provider parameters carry
/// no order, so rules are bound sorted by name; descriptors that care about
/// relative order encode it in the rule names.
pub struct UrlRewriteContributor;

fn parse_rule(name: &str, value: &str) -> Result<(Direction, String, String), String> {
    let (direction, rest) = value
        .split_once(':')
        .ok_or_else(|| format!("rule '{name}' missing '<direction>:' prefix"))?;
    let direction = match direction.to_ascii_lowercase().as_str() {
        "inbound" => Direction::Inbound,
        "outbound" => Direction::Outbound,
        other => return Err(format!("rule '{name}' has unknown direction '{other}'")),
    };
    let (pattern, replacement) = rest
        .split_once("->")
        .ok_or_else(|| format!("rule '{name}' missing '->' separator"))?;
    Ok((direction, pattern.to_string(), replacement.to_string()))
}

#[async_trait]
impl ProviderContributor for UrlRewriteContributor {
    fn role(&self) -> &str {
        REWRITE_ROLE
    }

    fn name(&self) -> &str {
        URL_REWRITE_NAME
    }

    async fn contribute_provider(
        &self,
        ctx: &mut DeploymentContext,
        provider: &Provider,
    ) -> Result<(), DeploymentError> {
        let mut rule_params: Vec<(&String, &String)> = provider
            .params()
            .iter()
            .filter(|(key, _)| key.starts_with(RULE_PARAM_PREFIX))
            .collect();
        rule_params.sort_by(|a, b| a.0.cmp(b.0));

        for (key, value) in rule_params {
            let rule_name = &key[RULE_PARAM_PREFIX.len()..];
            let (direction, pattern, replacement) =
                parse_rule(rule_name, value).map_err(|detail| {
                    DeploymentError::InvalidParameter {
                        role: REWRITE_ROLE.to_string(),
                        param: key.clone(),
                        detail,
                    }
                })?;

            let rule = PatternRule::new(rule_name, direction, &pattern, replacement).map_err(
                |e| DeploymentError::InvalidParameter {
                    role: REWRITE_ROLE.to_string(),
                    param: key.clone(),
                    detail: e.to_string(),
                },
            )?;

            debug!(
                topology = ctx.topology().name(),
                rule = rule_name,
                "Binding rewrite rule"
            );
            ctx.add_rewrite_step(Arc::new(rule));
        }
        Ok(())
    }

    async fn contribute_filter(
        &self,
        _ctx: &mut DeploymentContext,
        _provider: &Provider,
        _service: &Service,
        chain: &mut FilterChainBuilder,
    ) -> Result<(), DeploymentError> {
        chain.add_filter(REWRITE_ROLE, URL_REWRITE_NAME, HashMap::new());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use portcullis_sdk::Topology;

    use crate::rewrite::RewriteEnvironment;
    use crate::services::GatewayServices;

    fn context(provider: Provider) -> DeploymentContext {
        DeploymentContext::new(
            Arc::new(Topology::builder("t").provider(provider).build()),
            GatewayServices::builder().build(),
        )
    }

    #[tokio::test]
    async fn binds_rules_from_params() {
        let provider = Provider::new(REWRITE_ROLE, URL_REWRITE_NAME)
            .with_param("rule.10-host", "outbound:internal-host->gateway")
            .with_param("rule.20-scheme", "outbound:^http:->https:");
        let mut ctx = context(provider.clone());

        UrlRewriteContributor
            .contribute_provider(&mut ctx, &provider)
            .await
            .unwrap();

        let (_, steps) = ctx.into_artifact();
        assert_eq!(steps.len(), 2);
        // Sorted by rule name: 10-host before 20-scheme.
        assert_eq!(steps[0].name(), "10-host");
        assert_eq!(steps[1].name(), "20-scheme");

        let env = RewriteEnvironment::new("t", GatewayServices::builder().build());
        let mut url = "http://internal-host/x".to_string();
        for step in &steps {
            url = step.apply(&url, &env).await.unwrap();
        }
        assert_eq!(url, "https://gateway/x");
    }

    #[tokio::test]
    async fn malformed_rule_fails_compilation() {
        for bad in ["no-direction-prefix", "sideways:a->b", "inbound:no-separator"] {
            let provider =
                Provider::new(REWRITE_ROLE, URL_REWRITE_NAME).with_param("rule.r", bad);
            let mut ctx = context(provider.clone());

            let err = UrlRewriteContributor
                .contribute_provider(&mut ctx, &provider)
                .await
                .unwrap_err();
            assert!(matches!(err, DeploymentError::InvalidParameter { .. }), "{bad}");
        }
    }
}
