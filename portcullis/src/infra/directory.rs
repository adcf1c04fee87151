use std::collections::HashMap;

use async_trait::async_trait;
use portcullis_sdk::SecretValue;

/// Errors from a directory bind attempt.
#[derive(Debug, Clone, thiserror::Error)]
pub enum DirectoryError {
    #[error("invalid credentials for '{0}'")]
    InvalidCredentials(String),

    #[error("directory server '{0}' unreachable")]
    Unreachable(String),
}

/// Boundary to the authentication realm's directory server.
///
/// The gateway core never speaks the directory protocol itself; it only
/// needs to know whether a simple bind with the given credentials succeeds.
#[async_trait]
pub trait DirectoryService: Send + Sync {
    /// Attempt a simple bind as `user_dn` against the server at `url`.
    ///
    /// # Errors
    /// Returns `DirectoryError::InvalidCredentials` for a rejected bind and
    /// `DirectoryError::Unreachable` when the server cannot be contacted.
    async fn bind(
        &self,
        url: &str,
        user_dn: &str,
        password: &SecretValue,
    ) -> Result<(), DirectoryError>;
}

/// Directory fake for tests and development: a fixed URL and a set of
/// `(dn, password)` entries.
pub struct InMemoryDirectory {
    url: String,
    entries: HashMap<String, SecretValue>,
}

impl InMemoryDirectory {
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            entries: HashMap::new(),
        }
    }

    #[must_use]
    pub fn with_user(mut self, dn: impl Into<String>, password: impl Into<SecretValue>) -> Self {
        self.entries.insert(dn.into(), password.into());
        self
    }
}

#[async_trait]
impl DirectoryService for InMemoryDirectory {
    async fn bind(
        &self,
        url: &str,
        user_dn: &str,
        password: &SecretValue,
    ) -> Result<(), DirectoryError> {
        if url != self.url {
            return Err(DirectoryError::Unreachable(url.to_string()));
        }
        match self.entries.get(user_dn) {
            Some(stored) if stored == password => Ok(()),
            _ => Err(DirectoryError::InvalidCredentials(user_dn.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn directory() -> InMemoryDirectory {
        InMemoryDirectory::new("ldap://localhost:33389")
            .with_user("uid=guest,ou=people,dc=example,dc=org", "guest-password")
    }

    #[tokio::test]
    async fn bind_succeeds_with_correct_credentials() {
        let result = directory()
            .bind(
                "ldap://localhost:33389",
                "uid=guest,ou=people,dc=example,dc=org",
                &SecretValue::from("guest-password"),
            )
            .await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn bind_rejects_wrong_password() {
        let err = directory()
            .bind(
                "ldap://localhost:33389",
                "uid=guest,ou=people,dc=example,dc=org",
                &SecretValue::from("wrong"),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DirectoryError::InvalidCredentials(_)));
    }

    #[tokio::test]
    async fn bind_rejects_unknown_server() {
        let err = directory()
            .bind(
                "ldap://elsewhere:636",
                "uid=guest,ou=people,dc=example,dc=org",
                &SecretValue::from("guest-password"),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DirectoryError::Unreachable(_)));
    }
}
