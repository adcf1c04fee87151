//! The topology-to-pipeline compiler: contributor SPI, contribution
//! registry, per-pass deployment context, and the staged compiler itself.

pub mod compiler;
pub mod context;
pub mod contributor;
pub mod registry;

pub use compiler::{CompiledPipeline, DeploymentCompiler};
pub use context::{
    DeploymentContext, DeploymentDescriptor, FilterBinding, FilterChainBuilder, ResourceDescriptor,
};
pub use contributor::ProviderContributor;
pub use registry::{ContributorRegistry, ContributorRegistryBuilder};
