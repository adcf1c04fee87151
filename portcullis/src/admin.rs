use std::sync::Arc;

use portcullis_sdk::SecretValue;
use tracing::{info, warn};

use crate::gateway::Gateway;
use crate::infra::contributors::dir_auth::{
    AUTHENTICATION_ROLE, PARAM_DIRECTORY_URL, PARAM_SYSTEM_PASSWORD, PARAM_SYSTEM_USERNAME,
};
use crate::infra::directory::DirectoryService;

/// Outcome of an administrative check. The line contents are observable
/// contracts for the external CLI, which prints them verbatim.
#[derive(Debug, Clone)]
pub struct CheckReport {
    lines: Vec<String>,
    success: bool,
}

impl CheckReport {
    fn failed(lines: Vec<String>) -> Self {
        Self {
            lines,
            success: false,
        }
    }

    #[must_use]
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    #[must_use]
    pub fn success(&self) -> bool {
        self.success
    }

    #[must_use]
    pub fn contains(&self, needle: &str) -> bool {
        self.lines.iter().any(|line| line.contains(needle))
    }
}

impl std::fmt::Display for CheckReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for line in &self.lines {
            writeln!(f, "{line}")?;
        }
        Ok(())
    }
}

/// Backend for the external administrative tool.
///
/// The CLI binary itself is an external collaborator; this service performs
/// the checks and returns the report lines the tool prints.
pub struct AdminService {
    gateway: Arc<Gateway>,
}

impl AdminService {
    #[must_use]
    pub fn new(gateway: Arc<Gateway>) -> Self {
        Self { gateway }
    }

    /// Validate the system credentials of a topology's directory-backed
    /// authentication provider by attempting a bind.
    ///
    /// Missing system credentials are reported as warnings, one line per
    /// missing parameter, matching the provider's degraded-mode policy.
    pub async fn system_auth_check(&self, topology_name: &str) -> CheckReport {
        let Some(pipeline) = self.gateway.pipeline(topology_name) else {
            warn!(topology = topology_name, "System auth check for unknown topology");
            return CheckReport::failed(vec![format!("Topology {topology_name} does not exist")]);
        };
        let topology = pipeline.topology();

        let Some(provider) = topology.provider_of_role(AUTHENTICATION_ROLE) else {
            return CheckReport::failed(vec![format!(
                "Topology {topology_name} has no enabled authentication provider"
            )]);
        };

        let mut lines = Vec::new();
        let username = provider.param(PARAM_SYSTEM_USERNAME);
        let password = provider.param(PARAM_SYSTEM_PASSWORD);
        if username.is_none() {
            lines.push(format!("Warn: {PARAM_SYSTEM_USERNAME} is not present"));
        }
        if password.is_none() {
            lines.push(format!("Warn: {PARAM_SYSTEM_PASSWORD} is not present"));
        }
        let (Some(username), Some(password)) = (username, password) else {
            warn!(
                topology = topology_name,
                "System auth check skipped: system credentials not configured"
            );
            return CheckReport::failed(lines);
        };

        let Some(url) = provider.param(PARAM_DIRECTORY_URL) else {
            lines.push(format!("Warn: {PARAM_DIRECTORY_URL} is not present"));
            return CheckReport::failed(lines);
        };

        let Some(directory) = self.gateway.services().get::<dyn DirectoryService>() else {
            lines.push("Error: directory service is not available".to_string());
            return CheckReport::failed(lines);
        };

        match directory
            .bind(url, username, &SecretValue::from(password))
            .await
        {
            Ok(()) => {
                info!(topology = topology_name, "System LDAP Bind successful");
                lines.push("System LDAP Bind successful".to_string());
                CheckReport {
                    lines,
                    success: true,
                }
            }
            Err(e) => {
                warn!(topology = topology_name, error = %e, "System LDAP Bind failed");
                lines.push("LDAP authentication failed".to_string());
                lines.push(format!(
                    "Unable to successfully bind to LDAP server with topology credentials: {e}"
                ));
                CheckReport::failed(lines)
            }
        }
    }
}
