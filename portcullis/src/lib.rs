// === PUBLIC API (from SDK) ===
pub use portcullis_sdk::{
    AliasService, AliasServiceError, CryptoError, CryptoService, DeploymentError, LifecycleStage,
    OpaqueToken, Provider, RewriteError, SecretValue, Service, Topology,
};

// === ENGINE MODULES ===
pub mod admin;
pub mod config;
pub mod deploy;
pub mod gateway;
pub mod rewrite;
pub mod services;

pub mod infra;

pub use deploy::{
    CompiledPipeline, ContributorRegistry, DeploymentCompiler, DeploymentContext,
    FilterChainBuilder, ProviderContributor,
};
pub use gateway::Gateway;
pub use services::GatewayServices;
