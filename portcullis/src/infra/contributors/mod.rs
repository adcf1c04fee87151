//! Built-in provider contributors.

pub mod acl_authz;
pub mod dir_auth;
pub mod encrypt_uri;
pub mod identity_assertion;
pub mod url_rewrite;

pub use acl_authz::AclAuthzContributor;
pub use dir_auth::DirectoryAuthContributor;
pub use encrypt_uri::EncryptUriContributor;
pub use identity_assertion::IdentityAssertionContributor;
pub use url_rewrite::UrlRewriteContributor;
