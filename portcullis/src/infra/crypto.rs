use std::sync::Arc;

use aes_gcm::aead::{Aead, KeyInit, Payload};
use aes_gcm::{Aes256Gcm, Nonce};
use async_trait::async_trait;
use hkdf::Hkdf;
use hmac::{Hmac, Mac};
use portcullis_sdk::crypto::{TOKEN_NONCE_LEN, TOKEN_SALT_LEN};
use portcullis_sdk::{AliasService, CryptoError, CryptoService, OpaqueToken, SecretValue};
use rand::RngCore;
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Crypto service keyed entirely through the alias store.
///
/// Every operation resolves the `(topology, alias)` secret freshly and
/// derives the working key with HKDF-SHA256 over a per-token random salt;
/// the topology name is the derivation info and, together with the alias
/// name, the AEAD associated data. A token minted under one topology's
/// alias therefore cannot decrypt under another's, even if the underlying
/// secrets were to collide.
pub struct AliasKeyCryptoService {
    aliases: Arc<dyn AliasService>,
}

impl AliasKeyCryptoService {
    #[must_use]
    pub fn new(aliases: Arc<dyn AliasService>) -> Self {
        Self { aliases }
    }

    async fn resolve(&self, topology: &str, alias: &str) -> Result<SecretValue, CryptoError> {
        Ok(self.aliases.resolve(topology, alias).await?)
    }
}

fn derive_key(secret: &SecretValue, salt: &[u8], topology: &str) -> Result<[u8; 32], CryptoError> {
    let hkdf = Hkdf::<Sha256>::new(Some(salt), secret.as_bytes());
    let mut key = [0u8; 32];
    hkdf.expand(topology.as_bytes(), &mut key)
        .map_err(|_| CryptoError::Internal("key derivation failed".into()))?;
    Ok(key)
}

fn associated_data(topology: &str, alias: &str) -> Vec<u8> {
    let mut aad = Vec::with_capacity(topology.len() + alias.len() + 1);
    aad.extend_from_slice(topology.as_bytes());
    aad.push(0x1f);
    aad.extend_from_slice(alias.as_bytes());
    aad
}

#[async_trait]
impl CryptoService for AliasKeyCryptoService {
    async fn encrypt_for_topology(
        &self,
        topology: &str,
        alias: &str,
        plaintext: &[u8],
    ) -> Result<OpaqueToken, CryptoError> {
        let secret = self.resolve(topology, alias).await?;

        let mut salt = [0u8; TOKEN_SALT_LEN];
        let mut nonce = [0u8; TOKEN_NONCE_LEN];
        rand::rng().fill_bytes(&mut salt);
        rand::rng().fill_bytes(&mut nonce);

        let key = derive_key(&secret, &salt, topology)?;
        let cipher = Aes256Gcm::new_from_slice(&key)
            .map_err(|_| CryptoError::Internal("invalid derived key length".into()))?;

        let aad = associated_data(topology, alias);
        let ciphertext = cipher
            .encrypt(
                Nonce::from_slice(&nonce),
                Payload {
                    msg: plaintext,
                    aad: &aad,
                },
            )
            .map_err(|_| CryptoError::Internal("encryption failed".into()))?;

        Ok(OpaqueToken::from_parts(&nonce, &salt, &ciphertext))
    }

    async fn decrypt_for_topology(
        &self,
        topology: &str,
        alias: &str,
        token: &OpaqueToken,
    ) -> Result<Vec<u8>, CryptoError> {
        let secret = self.resolve(topology, alias).await?;
        let key = derive_key(&secret, token.salt(), topology)?;
        let cipher = Aes256Gcm::new_from_slice(&key)
            .map_err(|_| CryptoError::Internal("invalid derived key length".into()))?;

        let aad = associated_data(topology, alias);
        cipher
            .decrypt(
                Nonce::from_slice(token.nonce()),
                Payload {
                    msg: token.ciphertext(),
                    aad: &aad,
                },
            )
            .map_err(|_| CryptoError::IntegrityFailure)
    }

    async fn checksum_for_topology(
        &self,
        topology: &str,
        alias: &str,
        data: &[u8],
    ) -> Result<String, CryptoError> {
        let secret = self.resolve(topology, alias).await?;
        let mut mac = <HmacSha256 as Mac>::new_from_slice(secret.as_bytes())
            .map_err(|_| CryptoError::Internal("invalid mac key".into()))?;
        mac.update(&associated_data(topology, alias));
        mac.update(data);
        Ok(hex::encode(mac.finalize().into_bytes()))
    }

    async fn verify_for_topology(
        &self,
        topology: &str,
        alias: &str,
        data: &[u8],
        checksum: &str,
    ) -> Result<bool, CryptoError> {
        let Ok(expected) = hex::decode(checksum) else {
            return Ok(false);
        };
        let secret = self.resolve(topology, alias).await?;
        let mut mac = <HmacSha256 as Mac>::new_from_slice(secret.as_bytes())
            .map_err(|_| CryptoError::Internal("invalid mac key".into()))?;
        mac.update(&associated_data(topology, alias));
        mac.update(data);
        Ok(mac.verify_slice(&expected).is_ok())
    }
}
