use async_trait::async_trait;

// ---------------------------------------------------------------------------
// SecretValue
// ---------------------------------------------------------------------------

/// A secret with redacted `Debug`/`Display` output.
///
/// Wraps opaque bytes and guarantees the content is never leaked through
/// formatting. Intentionally does not implement `Serialize`/`Deserialize`.
#[derive(Clone, PartialEq, Eq)]
pub struct SecretValue(Vec<u8>);

impl SecretValue {
    #[must_use]
    pub fn new(value: Vec<u8>) -> Self {
        Self(value)
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl From<Vec<u8>> for SecretValue {
    fn from(value: Vec<u8>) -> Self {
        Self(value)
    }
}

impl From<String> for SecretValue {
    fn from(value: String) -> Self {
        Self(value.into_bytes())
    }
}

impl From<&str> for SecretValue {
    fn from(value: &str) -> Self {
        Self(value.as_bytes().to_vec())
    }
}

impl std::fmt::Debug for SecretValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl std::fmt::Display for SecretValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("[REDACTED]")
    }
}

// ---------------------------------------------------------------------------
// AliasService
// ---------------------------------------------------------------------------

/// Errors from alias resolution and administration.
#[derive(Debug, Clone, thiserror::Error)]
pub enum AliasServiceError {
    #[error("alias '{alias}' not found for topology '{topology}'")]
    NotFound { topology: String, alias: String },

    #[error("alias store error: {0}")]
    Internal(String),
}

impl AliasServiceError {
    #[must_use]
    pub fn not_found(topology: impl Into<String>, alias: impl Into<String>) -> Self {
        Self::NotFound {
            topology: topology.into(),
            alias: alias.into(),
        }
    }
}

/// Per-topology named-secret storage.
///
/// Secrets are namespaced by topology name so that compromise of one
/// cluster's key material does not expose another's. Aliases are created
/// through the administrative surface (`assign`/`generate`), never
/// implicitly by a resolution path: absence is a hard failure.
#[async_trait]
pub trait AliasService: Send + Sync {
    /// Resolve an alias to its secret value.
    ///
    /// # Errors
    /// Returns `AliasServiceError::NotFound` if the alias does not exist
    /// for the topology.
    async fn resolve(&self, topology: &str, alias: &str)
    -> Result<SecretValue, AliasServiceError>;

    /// Create or replace an alias with the given value (administrative path).
    ///
    /// # Errors
    /// Returns `AliasServiceError::Internal` on store failure.
    async fn assign(
        &self,
        topology: &str,
        alias: &str,
        value: SecretValue,
    ) -> Result<(), AliasServiceError>;

    /// Create or replace an alias with randomly generated key material.
    ///
    /// # Errors
    /// Returns `AliasServiceError::Internal` on store failure.
    async fn generate(&self, topology: &str, alias: &str) -> Result<(), AliasServiceError>;

    /// Remove an alias.
    ///
    /// # Errors
    /// Returns `AliasServiceError::NotFound` if the alias does not exist.
    async fn remove(&self, topology: &str, alias: &str) -> Result<(), AliasServiceError>;

    /// List the alias names stored for a topology.
    ///
    /// # Errors
    /// Returns `AliasServiceError::Internal` on store failure.
    async fn list(&self, topology: &str) -> Result<Vec<String>, AliasServiceError>;
}
