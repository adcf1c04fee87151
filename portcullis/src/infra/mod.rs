//! Concrete service implementations and the built-in contributors.

pub mod contributors;
pub mod crypto;
pub mod directory;
pub mod secrets;

pub use crypto::AliasKeyCryptoService;
pub use directory::{DirectoryError, DirectoryService, InMemoryDirectory};
pub use secrets::InMemoryAliasService;
