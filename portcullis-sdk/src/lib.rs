//! Public contracts for the portcullis gateway core.
//!
//! This crate carries everything an external collaborator (HTTP listener,
//! backend dispatch, administrative tooling) needs to talk to the engine:
//! the topology model, the secret-store and crypto-service traits, the
//! opaque-token framing, and the error taxonomy. No engine logic lives here.

pub mod crypto;
pub mod error;
pub mod secrets;
pub mod topology;

pub use crypto::{CryptoError, CryptoService, OpaqueToken};
pub use error::{DeploymentError, LifecycleStage, RewriteError};
pub use secrets::{AliasService, AliasServiceError, SecretValue};
pub use topology::{Provider, Service, Topology, TopologyBuilder};
