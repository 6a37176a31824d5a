//! Deterministic key material from wallet signatures.
//!
//! A connected wallet only exposes a signing capability, so key material is
//! recovered from a signature over a fixed message. Two derivations exist:
//!
//! - **Vault key**: Argon2id over `message || signature` with a fixed salt,
//!   for data only the signer ever reads.
//! - **Recipient keypair**: the first 32 bytes of the signature seed an
//!   X25519 secret, used to open wrapped keys.
//!
//! Both are deterministic; the derivation message must never change for a
//! deployment or previously wrapped keys become unreachable.

use argon2::{Algorithm, Argon2, Params, Version};
use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::cipher::{decrypt_with_aad, encrypt_with_aad, EncryptedPayload};
use crate::error::{CryptoError, CryptoResult};
use crate::keys::{DerivedKeypair, KEY_LENGTH};
use crate::wallet::SIGNATURE_LENGTH;

/// Default message the wallet signs to recover decryption keys.
pub const DERIVATION_MESSAGE: &str = "derive-decryption-key";

/// Fixed application salt for the vault key.
pub const VAULT_KEY_SALT: &[u8] = b"solkey-vault-key-v1";

/// Associated data bound to every vault-key ciphertext.
pub const VAULT_AAD: &[u8] = b"solkey-encrypted-data";

/// Argon2id parameters.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct KdfParams {
    /// Memory in KiB (default: 65536 = 64 MiB).
    pub memory_kib: u32,
    /// Time iterations (default: 3).
    pub iterations: u32,
    /// Parallelism degree (default: 4).
    pub parallelism: u32,
}

impl Default for KdfParams {
    fn default() -> Self {
        Self {
            memory_kib: 65536, // 64 MiB
            iterations: 3,
            parallelism: 4,
        }
    }
}

impl KdfParams {
    /// Create low-memory parameters (for resource-constrained environments).
    pub fn low_memory() -> Self {
        Self {
            memory_kib: 32768, // 32 MiB
            iterations: 4,
            parallelism: 4,
        }
    }

    /// Minimal parameters for tests. Not for production.
    pub fn insecure_fast() -> Self {
        Self {
            memory_kib: 64,
            iterations: 1,
            parallelism: 1,
        }
    }
}

/// Symmetric key for the signer's own data, zeroized on drop.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct VaultKey {
    key: [u8; KEY_LENGTH],
}

impl VaultKey {
    /// Get the key bytes.
    pub fn as_bytes(&self) -> &[u8; KEY_LENGTH] {
        &self.key
    }

    /// Seal data for the signer only.
    pub fn encrypt(&self, plaintext: &[u8]) -> CryptoResult<EncryptedPayload> {
        encrypt_with_aad(plaintext, &self.key, VAULT_AAD)
    }

    /// Open data sealed by [`VaultKey::encrypt`].
    pub fn decrypt(&self, payload: &EncryptedPayload) -> CryptoResult<Vec<u8>> {
        decrypt_with_aad(payload, &self.key, VAULT_AAD)
    }
}

impl std::fmt::Debug for VaultKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VaultKey")
            .field("key", &"[REDACTED]")
            .finish()
    }
}

/// Turns wallet signatures into key material.
#[derive(Debug, Clone, Default)]
pub struct SignatureKeyDeriver {
    params: KdfParams,
}

impl SignatureKeyDeriver {
    pub fn new(params: KdfParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &KdfParams {
        &self.params
    }

    /// Derive the signer's vault key from `message || signature`.
    pub fn derive_vault_key(&self, message: &[u8], signature: &[u8]) -> CryptoResult<VaultKey> {
        check_signature(signature)?;

        let argon2_params = Params::new(
            self.params.memory_kib,
            self.params.iterations,
            self.params.parallelism,
            Some(KEY_LENGTH),
        )
        .map_err(|e| CryptoError::Derivation(e.to_string()))?;

        let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, argon2_params);

        let mut material = Vec::with_capacity(message.len() + signature.len());
        material.extend_from_slice(message);
        material.extend_from_slice(signature);

        let mut key = [0u8; KEY_LENGTH];
        let result = argon2.hash_password_into(&material, VAULT_KEY_SALT, &mut key);
        material.zeroize();
        result.map_err(|e| CryptoError::Derivation(e.to_string()))?;

        Ok(VaultKey { key })
    }

    /// Derive the recipient keypair from the first 32 bytes of `signature`.
    pub fn derive_recipient_keypair(&self, signature: &[u8]) -> CryptoResult<DerivedKeypair> {
        check_signature(signature)?;

        let mut seed = [0u8; KEY_LENGTH];
        seed.copy_from_slice(&signature[..KEY_LENGTH]);
        let keypair = DerivedKeypair::from_seed(seed);
        seed.zeroize();

        Ok(keypair)
    }
}

fn check_signature(signature: &[u8]) -> CryptoResult<()> {
    if signature.len() != SIGNATURE_LENGTH {
        return Err(CryptoError::Derivation(format!(
            "signature must be {} bytes, got {}",
            SIGNATURE_LENGTH,
            signature.len()
        )));
    }
    if signature.iter().all(|&b| b == 0) {
        return Err(CryptoError::Derivation("signature is all zeros".into()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wallet::WalletKeypair;

    fn fast() -> SignatureKeyDeriver {
        SignatureKeyDeriver::new(KdfParams::insecure_fast())
    }

    #[test]
    fn test_recipient_keypair_deterministic() {
        let wallet = WalletKeypair::generate();
        let sig = wallet.sign(DERIVATION_MESSAGE.as_bytes());

        let a = fast().derive_recipient_keypair(sig.as_bytes()).unwrap();
        let b = fast().derive_recipient_keypair(sig.as_bytes()).unwrap();

        assert_eq!(a.public, b.public);
        assert_eq!(a.secret.as_bytes(), b.secret.as_bytes());
    }

    #[test]
    fn test_recipient_keypair_differs_per_wallet() {
        let a = WalletKeypair::generate().sign(DERIVATION_MESSAGE.as_bytes());
        let b = WalletKeypair::generate().sign(DERIVATION_MESSAGE.as_bytes());

        let ka = fast().derive_recipient_keypair(a.as_bytes()).unwrap();
        let kb = fast().derive_recipient_keypair(b.as_bytes()).unwrap();
        assert_ne!(ka.public, kb.public);
    }

    #[test]
    fn test_recipient_keypair_uses_first_half_only() {
        let mut sig = [7u8; 64];
        let a = fast().derive_recipient_keypair(&sig).unwrap();
        sig[40] = 0;
        let b = fast().derive_recipient_keypair(&sig).unwrap();
        assert_eq!(a.public, b.public);
    }

    #[test]
    fn test_short_signature_rejected() {
        let result = fast().derive_recipient_keypair(&[1u8; 31]);
        assert!(matches!(result, Err(CryptoError::Derivation(_))));

        let result = fast().derive_vault_key(b"m", &[1u8; 63]);
        assert!(matches!(result, Err(CryptoError::Derivation(_))));
    }

    #[test]
    fn test_zero_signature_rejected() {
        let result = fast().derive_recipient_keypair(&[0u8; 64]);
        assert!(matches!(result, Err(CryptoError::Derivation(_))));
    }

    #[test]
    fn test_vault_key_deterministic() {
        let wallet = WalletKeypair::generate();
        let sig = wallet.sign(DERIVATION_MESSAGE.as_bytes());

        let a = fast()
            .derive_vault_key(DERIVATION_MESSAGE.as_bytes(), sig.as_bytes())
            .unwrap();
        let b = fast()
            .derive_vault_key(DERIVATION_MESSAGE.as_bytes(), sig.as_bytes())
            .unwrap();
        assert_eq!(a.as_bytes(), b.as_bytes());
    }

    #[test]
    fn test_vault_key_depends_on_message() {
        let sig = [5u8; 64];
        let a = fast().derive_vault_key(b"message-a", &sig).unwrap();
        let b = fast().derive_vault_key(b"message-b", &sig).unwrap();
        assert_ne!(a.as_bytes(), b.as_bytes());
    }

    #[test]
    fn test_vault_key_seal_roundtrip() {
        let key = fast().derive_vault_key(b"m", &[3u8; 64]).unwrap();
        let sealed = key.encrypt(b"personal note").unwrap();
        assert_eq!(key.decrypt(&sealed).unwrap(), b"personal note");

        let other = fast().derive_vault_key(b"m", &[4u8; 64]).unwrap();
        assert!(matches!(
            other.decrypt(&sealed),
            Err(CryptoError::IntegrityCheckFailed)
        ));
    }

    #[test]
    fn test_vault_key_and_keypair_independent() {
        let sig = [6u8; 64];
        let vault = fast().derive_vault_key(b"m", &sig).unwrap();
        let keypair = fast().derive_recipient_keypair(&sig).unwrap();
        assert_ne!(vault.as_bytes(), keypair.secret.as_bytes());
    }

    #[test]
    fn test_invalid_kdf_params() {
        let deriver = SignatureKeyDeriver::new(KdfParams {
            memory_kib: 1,
            iterations: 0,
            parallelism: 0,
        });
        assert!(matches!(
            deriver.derive_vault_key(b"m", &[1u8; 64]),
            Err(CryptoError::Derivation(_))
        ));
    }

    #[test]
    fn test_debug_redacted() {
        let key = fast().derive_vault_key(b"m", &[1u8; 64]).unwrap();
        assert!(format!("{:?}", key).contains("REDACTED"));
    }
}
