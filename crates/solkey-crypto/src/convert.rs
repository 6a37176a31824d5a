//! Ed25519 to X25519 key conversion.
//!
//! Used when wrapping for a member who has never signed the derivation
//! message, so only their wallet address is known. The recipient can only
//! open such a record with the matching converted secret key.

use curve25519_dalek::edwards::CompressedEdwardsY;

use crate::error::{CryptoError, CryptoResult};
use crate::keys::{EncryptionPublicKey, EncryptionSecretKey};
use crate::wallet::{WalletAddress, WalletKeypair, PUBLIC_KEY_LENGTH};
use crate::wrap::{RecipientKey, WrapMethod};

/// Convert an Ed25519 public key to its X25519 form.
///
/// Returns `None` for a wrong length, an encoding that is not a curve
/// point, or a small-order point. Never substitutes other key material.
pub fn public_key_to_x25519(signing_public_key: &[u8]) -> Option<EncryptionPublicKey> {
    try_public_key_to_x25519(signing_public_key).ok()
}

/// Like [`public_key_to_x25519`] but reports why conversion failed.
pub fn try_public_key_to_x25519(signing_public_key: &[u8]) -> CryptoResult<EncryptionPublicKey> {
    if signing_public_key.len() != PUBLIC_KEY_LENGTH {
        return Err(CryptoError::Conversion(format!(
            "expected {} bytes, got {}",
            PUBLIC_KEY_LENGTH,
            signing_public_key.len()
        )));
    }

    let edwards_point = CompressedEdwardsY::from_slice(signing_public_key)
        .map_err(|_| CryptoError::Conversion("invalid edwards point".into()))?
        .decompress()
        .ok_or_else(|| CryptoError::Conversion("point is not on the curve".into()))?;

    if edwards_point.is_small_order() {
        return Err(CryptoError::Conversion("small-order point".into()));
    }

    Ok(EncryptionPublicKey::from_bytes(
        edwards_point.to_montgomery().to_bytes(),
    ))
}

/// Convert a wallet address to its X25519 wrapping key.
pub fn address_to_x25519(address: &WalletAddress) -> CryptoResult<EncryptionPublicKey> {
    try_public_key_to_x25519(&address.public_key_bytes()?)
}

/// Convert a wallet signing key to the X25519 secret matching
/// [`public_key_to_x25519`].
pub fn signing_key_to_x25519(wallet: &WalletKeypair) -> EncryptionSecretKey {
    EncryptionSecretKey::from_bytes(wallet.scalar_bytes())
}

/// Recipient key for records wrapped to a converted wallet key.
#[derive(Debug, Clone)]
pub struct ConvertedKeypair {
    pub public: EncryptionPublicKey,
    pub secret: EncryptionSecretKey,
}

impl ConvertedKeypair {
    /// Build the converted keypair for a locally held wallet.
    pub fn from_wallet(wallet: &WalletKeypair) -> Self {
        let secret = signing_key_to_x25519(wallet);
        let public = secret.public_key();
        Self { public, secret }
    }
}

impl RecipientKey for ConvertedKeypair {
    fn method(&self) -> WrapMethod {
        WrapMethod::ConvertedWalletKey
    }

    fn public_key(&self) -> EncryptionPublicKey {
        self.public
    }

    fn secret_key(&self) -> &EncryptionSecretKey {
        &self.secret
    }
}
