use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::Mutex;
use portcullis_sdk::{AliasService, AliasServiceError, SecretValue};
use rand::RngCore;
use tracing::info;

/// Length of generated key material in bytes.
const GENERATED_SECRET_LEN: usize = 32;

/// Alias store keyed by `(topology, alias)`.
///
/// Reads are lock-free and support unbounded concurrent callers.
/// Administrative writes are serialized behind `admin_lock` so that two
/// concurrent rotations cannot interleave; a reader racing a rotation
/// observes either the old or the new value, never a torn one.
pub struct InMemoryAliasService {
    entries: DashMap<(String, String), SecretValue>,
    admin_lock: Mutex<()>,
}

impl InMemoryAliasService {
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
            admin_lock: Mutex::new(()),
        }
    }

    /// Pre-load aliases, e.g. from development configuration.
    #[must_use]
    pub fn with_aliases<I>(aliases: I) -> Self
    where
        I: IntoIterator<Item = (String, String, SecretValue)>,
    {
        let store = Self::new();
        for (topology, alias, value) in aliases {
            store.entries.insert((topology, alias), value);
        }
        store
    }
}

impl Default for InMemoryAliasService {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AliasService for InMemoryAliasService {
    async fn resolve(
        &self,
        topology: &str,
        alias: &str,
    ) -> Result<SecretValue, AliasServiceError> {
        self.entries
            .get(&(topology.to_string(), alias.to_string()))
            .map(|entry| entry.value().clone())
            .ok_or_else(|| AliasServiceError::not_found(topology, alias))
    }

    async fn assign(
        &self,
        topology: &str,
        alias: &str,
        value: SecretValue,
    ) -> Result<(), AliasServiceError> {
        let _guard = self.admin_lock.lock();
        self.entries
            .insert((topology.to_string(), alias.to_string()), value);
        info!(topology, alias, "Alias assigned");
        Ok(())
    }

    async fn generate(&self, topology: &str, alias: &str) -> Result<(), AliasServiceError> {
        let mut material = vec![0u8; GENERATED_SECRET_LEN];
        rand::rng().fill_bytes(&mut material);

        let _guard = self.admin_lock.lock();
        self.entries
            .insert((topology.to_string(), alias.to_string()), SecretValue::new(material));
        info!(topology, alias, "Alias generated");
        Ok(())
    }

    async fn remove(&self, topology: &str, alias: &str) -> Result<(), AliasServiceError> {
        let _guard = self.admin_lock.lock();
        self.entries
            .remove(&(topology.to_string(), alias.to_string()))
            .map(|_| ())
            .ok_or_else(|| AliasServiceError::not_found(topology, alias))
    }

    async fn list(&self, topology: &str) -> Result<Vec<String>, AliasServiceError> {
        let mut aliases: Vec<String> = self
            .entries
            .iter()
            .filter(|entry| entry.key().0 == topology)
            .map(|entry| entry.key().1.clone())
            .collect();
        aliases.sort();
        Ok(aliases)
    }
}
