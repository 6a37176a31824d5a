//! AES-256-GCM cipher operations.
//!
//! Secrets are sealed with a detached 16-byte tag so ciphertext, IV, and tag
//! can be stored as separate fields.

use aes_gcm::{
    aead::{AeadInPlace, KeyInit},
    Aes256Gcm, Nonce, Tag,
};
use rand::RngCore;
use serde::{Deserialize, Serialize};

use crate::encoding::{base64_array, base64_bytes, Encoding};
use crate::error::{CryptoError, CryptoResult};
use crate::keys::SymmetricKey;

/// AES-GCM IV length in bytes.
pub const IV_LENGTH: usize = 12;

/// AES-GCM authentication tag length in bytes.
pub const TAG_LENGTH: usize = 16;

/// Generate cryptographically secure random bytes.
pub fn generate_random<const N: usize>() -> [u8; N] {
    let mut bytes = [0u8; N];
    rand::thread_rng().fill_bytes(&mut bytes);
    bytes
}

/// Generate a random IV (12 bytes).
pub fn generate_iv() -> [u8; IV_LENGTH] {
    generate_random()
}

/// Output of one encryption call.
///
/// The three fields are only ever produced together.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedPayload {
    #[serde(with = "base64_bytes")]
    pub ciphertext: Vec<u8>,
    #[serde(with = "base64_array")]
    pub iv: [u8; IV_LENGTH],
    #[serde(with = "base64_array")]
    pub auth_tag: [u8; TAG_LENGTH],
}

impl EncryptedPayload {
    /// Rebuild a payload from separately encoded fields.
    pub fn from_encoded(
        ciphertext: &str,
        iv: &str,
        auth_tag: &str,
        encoding: Encoding,
    ) -> CryptoResult<Self> {
        Ok(Self {
            ciphertext: encoding.decode("ciphertext", ciphertext)?,
            iv: encoding.decode_array("iv", iv)?,
            auth_tag: encoding.decode_array("auth_tag", auth_tag)?,
        })
    }
}

impl std::fmt::Debug for EncryptedPayload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EncryptedPayload")
            .field("ciphertext_len", &self.ciphertext.len())
            .field("iv", &hex::encode(self.iv))
            .finish()
    }
}

/// Encrypt plaintext with a fresh random IV and empty associated data.
pub fn encrypt(plaintext: &[u8], key: &SymmetricKey) -> CryptoResult<EncryptedPayload> {
    encrypt_with_aad(plaintext, key.as_bytes(), &[])
}

/// Decrypt a payload sealed by [`encrypt`].
///
/// Every failure is [`CryptoError::IntegrityCheckFailed`].
pub fn decrypt(payload: &EncryptedPayload, key: &SymmetricKey) -> CryptoResult<Vec<u8>> {
    decrypt_with_aad(payload, key.as_bytes(), &[])
}

/// Encrypt with explicit associated data.
pub fn encrypt_with_aad(
    plaintext: &[u8],
    key: &[u8; 32],
    aad: &[u8],
) -> CryptoResult<EncryptedPayload> {
    let cipher =
        Aes256Gcm::new_from_slice(key).map_err(|e| CryptoError::Encryption(e.to_string()))?;

    let iv = generate_iv();
    let mut buffer = plaintext.to_vec();
    let tag = cipher
        .encrypt_in_place_detached(Nonce::from_slice(&iv), aad, &mut buffer)
        .map_err(|_| CryptoError::Encryption("AES-GCM encryption failed".into()))?;

    let mut auth_tag = [0u8; TAG_LENGTH];
    auth_tag.copy_from_slice(tag.as_slice());

    Ok(EncryptedPayload {
        ciphertext: buffer,
        iv,
        auth_tag,
    })
}

/// Decrypt with explicit associated data.
pub fn decrypt_with_aad(
    payload: &EncryptedPayload,
    key: &[u8; 32],
    aad: &[u8],
) -> CryptoResult<Vec<u8>> {
    let cipher = Aes256Gcm::new_from_slice(key).map_err(|_| CryptoError::IntegrityCheckFailed)?;

    let mut buffer = payload.ciphertext.clone();
    cipher
        .decrypt_in_place_detached(
            Nonce::from_slice(&payload.iv),
            aad,
            &mut buffer,
            Tag::from_slice(&payload.auth_tag),
        )
        .map_err(|_| CryptoError::IntegrityCheckFailed)?;

    Ok(buffer)
}
