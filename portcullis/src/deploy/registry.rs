use std::collections::HashMap;
use std::sync::Arc;

use portcullis_sdk::DeploymentError;

use super::contributor::ProviderContributor;
use crate::infra::contributors::{
    AclAuthzContributor, DirectoryAuthContributor, EncryptUriContributor,
    IdentityAssertionContributor, UrlRewriteContributor,
};

/// Indexes contributor implementations by their declared `(role, name)` pair.
///
/// Built once at process start from an explicitly enumerated list; there is
/// no implicit scanning. Lookup is O(1). Two contributors declaring the same
/// pair is a configuration error surfaced at build time, never resolved by
/// priority.
pub struct ContributorRegistry {
    contributors: HashMap<(String, String), Arc<dyn ProviderContributor>>,
}

impl ContributorRegistry {
    #[must_use]
    pub fn builder() -> ContributorRegistryBuilder {
        ContributorRegistryBuilder {
            contributors: HashMap::new(),
        }
    }

    /// A registry holding the built-in contributors: directory
    /// authentication, identity assertion, ACL authorization, URL rewrite,
    /// and URI encryption.
    ///
    /// # Errors
    /// Cannot fail for the built-in set; the `Result` mirrors
    /// [`ContributorRegistryBuilder::register`] for callers extending it.
    pub fn with_builtins() -> Result<Self, DeploymentError> {
        Ok(Self::builder()
            .register(Arc::new(DirectoryAuthContributor))?
            .register(Arc::new(IdentityAssertionContributor))?
            .register(Arc::new(AclAuthzContributor))?
            .register(Arc::new(UrlRewriteContributor))?
            .register(Arc::new(EncryptUriContributor))?
            .build())
    }

    /// Resolve the contributor declared for `(role, name)`.
    #[must_use]
    pub fn find(&self, role: &str, name: &str) -> Option<Arc<dyn ProviderContributor>> {
        self.contributors
            .get(&(role.to_string(), name.to_string()))
            .cloned()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.contributors.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.contributors.is_empty()
    }
}

pub struct ContributorRegistryBuilder {
    contributors: HashMap<(String, String), Arc<dyn ProviderContributor>>,
}

impl std::fmt::Debug for ContributorRegistryBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContributorRegistryBuilder")
            .field("contributors", &self.contributors.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl ContributorRegistryBuilder {
    /// Register a contributor under its self-declared `(role, name)` pair.
    ///
    /// # Errors
    /// Returns `DeploymentError::DuplicateContributor` if the pair is
    /// already taken.
    pub fn register(
        mut self,
        contributor: Arc<dyn ProviderContributor>,
    ) -> Result<Self, DeploymentError> {
        let key = (
            contributor.role().to_string(),
            contributor.name().to_string(),
        );
        if self.contributors.contains_key(&key) {
            return Err(DeploymentError::DuplicateContributor {
                role: key.0,
                name: key.1,
            });
        }
        self.contributors.insert(key, contributor);
        Ok(self)
    }

    #[must_use]
    pub fn build(self) -> ContributorRegistry {
        ContributorRegistry {
            contributors: self.contributors,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_builtin_contributors() {
        let registry = ContributorRegistry::with_builtins().unwrap();
        assert!(registry.find("authentication", "directory").is_some());
        assert!(registry.find("identity-assertion", "default").is_some());
        assert!(registry.find("authorization", "acls").is_some());
        assert!(registry.find("rewrite", "url-rewrite").is_some());
        assert!(registry.find("encrypt-uri", "default").is_some());
        assert_eq!(registry.len(), 5);
    }

    #[test]
    fn unknown_pair_returns_none() {
        let registry = ContributorRegistry::with_builtins().unwrap();
        assert!(registry.find("authentication", "nope").is_none());
        assert!(registry.find("nope", "directory").is_none());
    }

    #[test]
    fn duplicate_registration_is_a_build_error() {
        let err = ContributorRegistry::builder()
            .register(Arc::new(EncryptUriContributor))
            .unwrap()
            .register(Arc::new(EncryptUriContributor))
            .unwrap_err();
        assert!(matches!(err, DeploymentError::DuplicateContributor { .. }));
    }
}
