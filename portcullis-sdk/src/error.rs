use crate::crypto::CryptoError;
use crate::secrets::AliasServiceError;

/// Lifecycle stage names, used in failure reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleStage {
    Initialize,
    Contribute,
    Finalize,
}

impl std::fmt::Display for LifecycleStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Initialize => f.write_str("initialize"),
            Self::Contribute => f.write_str("contribute"),
            Self::Finalize => f.write_str("finalize"),
        }
    }
}

/// Compilation-time errors. Any of these aborts the whole pass for the
/// topology; a previously published pipeline, if any, stays in service.
#[derive(Debug, Clone, thiserror::Error)]
pub enum DeploymentError {
    #[error("no contributor registered for provider role '{role}' name '{name}'")]
    DiscoveryFailure { role: String, name: String },

    #[error("contributor for role '{role}' name '{name}' registered twice")]
    DuplicateContributor { role: String, name: String },

    #[error("topology '{topology}' declares more than one enabled provider for role '{role}'")]
    DuplicateEnabledRole { topology: String, role: String },

    #[error("provider '{role}' failed during {stage}: {detail}")]
    LifecycleFailure {
        stage: LifecycleStage,
        role: String,
        detail: String,
    },

    #[error("provider '{role}' parameter '{param}' is invalid: {detail}")]
    InvalidParameter {
        role: String,
        param: String,
        detail: String,
    },

    #[error(transparent)]
    SecretResolution(#[from] AliasServiceError),
}

impl DeploymentError {
    #[must_use]
    pub fn lifecycle(stage: LifecycleStage, role: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::LifecycleFailure {
            stage,
            role: role.into(),
            detail: detail.into(),
        }
    }
}

/// Request-time errors from rewrite rule evaluation.
///
/// A failed rewrite propagates as a failed request outcome, never as a
/// silently-unmodified pass-through.
#[derive(Debug, Clone, thiserror::Error)]
pub enum RewriteError {
    #[error(transparent)]
    Crypto(#[from] CryptoError),

    #[error("cannot rewrite '{url}': {detail}")]
    InvalidUrl { url: String, detail: String },

    #[error("rewrite error: {0}")]
    Internal(String),
}

impl RewriteError {
    #[must_use]
    pub fn invalid_url(url: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::InvalidUrl {
            url: url.into(),
            detail: detail.into(),
        }
    }
}
