use std::collections::HashMap;
use std::fmt;

use portcullis_sdk::{AliasService, AliasServiceError, SecretValue};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Configuration for the gateway core, handed over by the host process
/// already deserialized.
#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GatewayConfig {
    /// Aliases to pre-load into the alias store, keyed as
    /// topology → alias → secret. Intended for development and testing
    /// only; production aliases are created through the administrative
    /// surface.
    #[serde(default)]
    pub aliases: HashMap<String, HashMap<String, String>>,
}

impl GatewayConfig {
    /// Load the configured aliases into a store.
    ///
    /// # Errors
    /// Propagates the first `AliasServiceError` from the store.
    pub async fn seed_aliases(&self, store: &dyn AliasService) -> Result<(), AliasServiceError> {
        for (topology, aliases) in &self.aliases {
            for (alias, secret) in aliases {
                info!(topology, alias, "Seeding alias from configuration");
                store
                    .assign(topology, alias, SecretValue::from(secret.clone()))
                    .await?;
            }
        }
        Ok(())
    }
}

impl fmt::Debug for GatewayConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let aliases: HashMap<&str, Vec<(&str, &str)>> = self
            .aliases
            .iter()
            .map(|(topology, entries)| {
                (
                    topology.as_str(),
                    entries
                        .keys()
                        .map(|alias| (alias.as_str(), "[REDACTED]"))
                        .collect(),
                )
            })
            .collect();
        f.debug_struct("GatewayConfig")
            .field("aliases", &aliases)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::secrets::InMemoryAliasService;

    #[test]
    fn debug_redacts_secrets() {
        let config: GatewayConfig = serde_json::from_value(serde_json::json!({
            "aliases": {
                "cluster-a": { "encrypt-url": "super-secret-value" }
            }
        }))
        .unwrap();

        let debug_output = format!("{config:?}");
        assert!(
            !debug_output.contains("super-secret-value"),
            "Debug output must not contain secret values"
        );
        assert!(debug_output.contains("encrypt-url"));
        assert!(debug_output.contains("[REDACTED]"));
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let result: Result<GatewayConfig, _> =
            serde_json::from_value(serde_json::json!({ "alias": {} }));
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn seeds_aliases_into_store() {
        let config: GatewayConfig = serde_json::from_value(serde_json::json!({
            "aliases": {
                "cluster-a": { "encrypt-url": "secret-a" },
                "cluster-b": { "signing": "secret-b" }
            }
        }))
        .unwrap();

        let store = InMemoryAliasService::new();
        config.seed_aliases(&store).await.unwrap();

        assert_eq!(
            store
                .resolve("cluster-a", "encrypt-url")
                .await
                .unwrap()
                .as_bytes(),
            b"secret-a"
        );
        assert_eq!(
            store.resolve("cluster-b", "signing").await.unwrap().as_bytes(),
            b"secret-b"
        );
    }
}
