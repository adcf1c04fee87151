use std::sync::Arc;

use async_trait::async_trait;
use portcullis_sdk::RewriteError;
use regex::Regex;

use super::environment::RewriteEnvironment;

/// Which way a URL is flowing through the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Client → gateway: applied before further pipeline stages.
    Inbound,
    /// Gateway → client: applied to response content before it leaves.
    Outbound,
}

/// A single directional URL transformation.
///
/// Steps are pure functions of `(input, environment)`: they hold no
/// request-crossing mutable state and resolve any services they need
/// through the environment on each invocation.
#[async_trait]
pub trait RewriteStep: Send + Sync {
    fn name(&self) -> &str;

    fn direction(&self) -> Direction;

    /// Transform `url`, or fail the request.
    ///
    /// # Errors
    /// Returns `RewriteError` when the transformation cannot be performed;
    /// the engine propagates this as a failed request outcome.
    async fn apply(&self, url: &str, env: &RewriteEnvironment) -> Result<String, RewriteError>;
}

// ---------------------------------------------------------------------------
// PatternRule
// ---------------------------------------------------------------------------

/// A declarative match/replace rule. URLs not matching the pattern pass
/// through unchanged; this is the plain-rewrite counterpart to the
/// encrypting steps, which fail closed instead.
#[derive(Debug)]
pub struct PatternRule {
    name: String,
    direction: Direction,
    pattern: Regex,
    replacement: String,
}

impl PatternRule {
    /// # Errors
    /// Returns `RewriteError::Internal` if `pattern` is not a valid regex.
    pub fn new(
        name: impl Into<String>,
        direction: Direction,
        pattern: &str,
        replacement: impl Into<String>,
    ) -> Result<Self, RewriteError> {
        let pattern = Regex::new(pattern)
            .map_err(|e| RewriteError::Internal(format!("invalid rewrite pattern: {e}")))?;
        Ok(Self {
            name: name.into(),
            direction,
            pattern,
            replacement: replacement.into(),
        })
    }
}

#[async_trait]
impl RewriteStep for PatternRule {
    fn name(&self) -> &str {
        &self.name
    }

    fn direction(&self) -> Direction {
        self.direction
    }

    async fn apply(&self, url: &str, _env: &RewriteEnvironment) -> Result<String, RewriteError> {
        Ok(self
            .pattern
            .replace_all(url, self.replacement.as_str())
            .into_owned())
    }
}

// ---------------------------------------------------------------------------
// UrlRewriteEngine
// ---------------------------------------------------------------------------

/// Applies every bound step whose direction matches, in declaration order.
/// Immutable once built into a compiled pipeline.
pub struct UrlRewriteEngine {
    steps: Vec<Arc<dyn RewriteStep>>,
}

impl UrlRewriteEngine {
    #[must_use]
    pub fn new(steps: Vec<Arc<dyn RewriteStep>>) -> Self {
        Self { steps }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Run `url` through the chain for `direction`.
    ///
    /// # Errors
    /// Propagates the first failing step's `RewriteError`; later steps do
    /// not run.
    pub async fn rewrite(
        &self,
        direction: Direction,
        url: &str,
        env: &RewriteEnvironment,
    ) -> Result<String, RewriteError> {
        let mut current = url.to_string();
        for step in self.steps.iter().filter(|s| s.direction() == direction) {
            current = step.apply(&current, env).await?;
        }
        Ok(current)
    }
}

impl std::fmt::Debug for UrlRewriteEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UrlRewriteEngine")
            .field("steps", &self.steps.len())
            .finish()
    }
}
