use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;

use crate::secrets::AliasServiceError;

/// Token framing version. Bumped if the layout ever changes.
const TOKEN_VERSION: u8 = 1;
/// AES-GCM nonce length in bytes.
pub const TOKEN_NONCE_LEN: usize = 12;
/// Key-derivation salt length in bytes.
pub const TOKEN_SALT_LEN: usize = 16;
/// Minimum ciphertext length: the AEAD authentication tag alone.
const MIN_CIPHERTEXT_LEN: usize = 16;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors from the crypto service.
///
/// Decryption of a tampered, truncated, or wrong-key token is always a
/// distinguishable `IntegrityFailure`, never a decode that silently
/// returns garbage plaintext.
#[derive(Debug, Clone, thiserror::Error)]
pub enum CryptoError {
    #[error("alias '{alias}' not found for topology '{topology}'")]
    AliasNotFound { topology: String, alias: String },

    #[error("malformed token: {0}")]
    MalformedToken(String),

    #[error("token failed integrity check")]
    IntegrityFailure,

    #[error("crypto error: {0}")]
    Internal(String),
}

impl From<AliasServiceError> for CryptoError {
    fn from(e: AliasServiceError) -> Self {
        match e {
            AliasServiceError::NotFound { topology, alias } => {
                Self::AliasNotFound { topology, alias }
            }
            AliasServiceError::Internal(message) => Self::Internal(message),
        }
    }
}

// ---------------------------------------------------------------------------
// OpaqueToken
// ---------------------------------------------------------------------------

/// An encrypted, self-contained substitute for a sensitive URL segment.
///
/// Wire layout, base64url-encoded without padding so the token can travel
/// inside a URL: `version(1) ‖ nonce(12) ‖ salt(16) ‖ ciphertext`. The
/// nonce and salt are enough to decrypt given only the `(topology, alias)`
/// pair; no out-of-band metadata is needed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpaqueToken {
    raw: Vec<u8>,
}

impl OpaqueToken {
    /// Assemble a token from its cryptographic parts.
    #[must_use]
    pub fn from_parts(
        nonce: &[u8; TOKEN_NONCE_LEN],
        salt: &[u8; TOKEN_SALT_LEN],
        ciphertext: &[u8],
    ) -> Self {
        let mut raw = Vec::with_capacity(1 + TOKEN_NONCE_LEN + TOKEN_SALT_LEN + ciphertext.len());
        raw.push(TOKEN_VERSION);
        raw.extend_from_slice(nonce);
        raw.extend_from_slice(salt);
        raw.extend_from_slice(ciphertext);
        Self { raw }
    }

    /// Parse and validate the framing of an encoded token.
    ///
    /// Framing problems (bad encoding, truncation, unknown version) are
    /// rejected here, before any cryptographic work runs.
    ///
    /// # Errors
    /// Returns `CryptoError::MalformedToken` on any framing violation.
    pub fn parse(encoded: &str) -> Result<Self, CryptoError> {
        let raw = URL_SAFE_NO_PAD
            .decode(encoded)
            .map_err(|e| CryptoError::MalformedToken(format!("invalid encoding: {e}")))?;
        if raw.len() < 1 + TOKEN_NONCE_LEN + TOKEN_SALT_LEN + MIN_CIPHERTEXT_LEN {
            return Err(CryptoError::MalformedToken("token truncated".into()));
        }
        if raw[0] != TOKEN_VERSION {
            return Err(CryptoError::MalformedToken(format!(
                "unsupported token version {}",
                raw[0]
            )));
        }
        Ok(Self { raw })
    }

    #[must_use]
    pub fn encoded(&self) -> String {
        URL_SAFE_NO_PAD.encode(&self.raw)
    }

    #[must_use]
    pub fn nonce(&self) -> &[u8] {
        &self.raw[1..1 + TOKEN_NONCE_LEN]
    }

    #[must_use]
    pub fn salt(&self) -> &[u8] {
        &self.raw[1 + TOKEN_NONCE_LEN..1 + TOKEN_NONCE_LEN + TOKEN_SALT_LEN]
    }

    #[must_use]
    pub fn ciphertext(&self) -> &[u8] {
        &self.raw[1 + TOKEN_NONCE_LEN + TOKEN_SALT_LEN..]
    }
}

impl std::fmt::Display for OpaqueToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.encoded())
    }
}

// ---------------------------------------------------------------------------
// CryptoService
// ---------------------------------------------------------------------------

/// Authenticated symmetric encryption and integrity primitives, keyed by
/// secrets resolved through the alias service.
///
/// The service holds no key storage of its own: every operation resolves
/// the `(topology, alias)` pair freshly, so a rotated secret is observed
/// by the very next call.
#[async_trait]
pub trait CryptoService: Send + Sync {
    /// Encrypt `plaintext` under the key derived from the topology's alias.
    ///
    /// # Errors
    /// Returns `CryptoError::AliasNotFound` if the alias cannot be resolved.
    async fn encrypt_for_topology(
        &self,
        topology: &str,
        alias: &str,
        plaintext: &[u8],
    ) -> Result<OpaqueToken, CryptoError>;

    /// Decrypt a token produced by [`encrypt_for_topology`](Self::encrypt_for_topology).
    ///
    /// # Errors
    /// Returns `CryptoError::IntegrityFailure` for a tampered or mismatched
    /// token and `CryptoError::AliasNotFound` if the alias cannot be resolved.
    async fn decrypt_for_topology(
        &self,
        topology: &str,
        alias: &str,
        token: &OpaqueToken,
    ) -> Result<Vec<u8>, CryptoError>;

    /// Compute a keyed integrity tag over `data`.
    ///
    /// # Errors
    /// Returns `CryptoError::AliasNotFound` if the alias cannot be resolved.
    async fn checksum_for_topology(
        &self,
        topology: &str,
        alias: &str,
        data: &[u8],
    ) -> Result<String, CryptoError>;

    /// Verify an integrity tag produced by
    /// [`checksum_for_topology`](Self::checksum_for_topology).
    ///
    /// # Errors
    /// Returns `CryptoError::AliasNotFound` if the alias cannot be resolved.
    async fn verify_for_topology(
        &self,
        topology: &str,
        alias: &str,
        data: &[u8],
        checksum: &str,
    ) -> Result<bool, CryptoError>;
}
