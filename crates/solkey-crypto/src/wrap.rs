//! Per-recipient key wrapping with an X25519 + XSalsa20-Poly1305 box.
//!
//! Each wrap uses a fresh ephemeral keypair and a fresh 24-byte nonce. The
//! ephemeral public key travels with the record; the ephemeral secret is
//! dropped as soon as the box is sealed.

use std::fmt;

use crypto_box::aead::Aead;
use crypto_box::{PublicKey as BoxPublicKey, SalsaBox, SecretKey as BoxSecretKey};
use serde::{Deserialize, Serialize};

use crate::cipher::generate_random;
use crate::encoding::{base64_array, base64_bytes};
use crate::error::{CryptoError, CryptoResult};
use crate::keys::{EncryptionPublicKey, EncryptionSecretKey, SymmetricKey, KEY_LENGTH};

/// Box nonce length in bytes.
pub const NONCE_LENGTH: usize = 24;

/// How the recipient's wrapping key was obtained.
///
/// Sender and recipient must agree on this per record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WrapMethod {
    /// Recipient key derived from a wallet signature over the derivation message.
    SignatureDerived,
    /// Recipient key converted from the wallet's Ed25519 public key.
    ConvertedWalletKey,
}

impl fmt::Display for WrapMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SignatureDerived => f.write_str("signature_derived"),
            Self::ConvertedWalletKey => f.write_str("converted_wallet_key"),
        }
    }
}

/// Key material able to open wrapped keys.
pub trait RecipientKey {
    /// Which kind of record this key opens.
    fn method(&self) -> WrapMethod;

    /// Public half, as published to senders.
    fn public_key(&self) -> EncryptionPublicKey;

    /// Secret half used for the box exchange.
    fn secret_key(&self) -> &EncryptionSecretKey;
}

/// A symmetric key sealed for one recipient.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WrappedKey {
    #[serde(with = "base64_bytes")]
    pub wrapped_key: Vec<u8>,
    #[serde(with = "base64_array")]
    pub nonce: [u8; NONCE_LENGTH],
    pub ephemeral_public_key: EncryptionPublicKey,
    pub method: WrapMethod,
}

impl fmt::Debug for WrappedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WrappedKey")
            .field("len", &self.wrapped_key.len())
            .field("ephemeral", &self.ephemeral_public_key)
            .field("method", &self.method)
            .finish()
    }
}

/// Seal `key` for `recipient`.
pub fn wrap_for_recipient(
    key: &SymmetricKey,
    recipient: &EncryptionPublicKey,
    method: WrapMethod,
) -> CryptoResult<WrappedKey> {
    let ephemeral_secret = BoxSecretKey::from(generate_random::<KEY_LENGTH>());
    let ephemeral_public = ephemeral_secret.public_key();
    let nonce: [u8; NONCE_LENGTH] = generate_random();

    let salsa_box = SalsaBox::new(&BoxPublicKey::from(*recipient.as_bytes()), &ephemeral_secret);
    let wrapped_key = salsa_box
        .encrypt(crypto_box::Nonce::from_slice(&nonce), &key.as_bytes()[..])
        .map_err(|_| CryptoError::Encryption("box encryption failed".into()))?;

    Ok(WrappedKey {
        wrapped_key,
        nonce,
        ephemeral_public_key: EncryptionPublicKey::from_bytes(*ephemeral_public.as_bytes()),
        method,
    })
}

/// Open a wrapped key.
///
/// Any failure to open is [`CryptoError::AccessDenied`]; nothing about the
/// opened bytes is revealed when they are not a valid key.
pub fn unwrap(wrapped: &WrappedKey, recipient: &impl RecipientKey) -> CryptoResult<SymmetricKey> {
    if wrapped.method != recipient.method() {
        return Err(CryptoError::MethodMismatch {
            record: wrapped.method,
            presented: recipient.method(),
        });
    }

    let secret = BoxSecretKey::from(*recipient.secret_key().as_bytes());
    let ephemeral = BoxPublicKey::from(*wrapped.ephemeral_public_key.as_bytes());
    let salsa_box = SalsaBox::new(&ephemeral, &secret);

    let mut opened = salsa_box
        .decrypt(
            crypto_box::Nonce::from_slice(&wrapped.nonce),
            wrapped.wrapped_key.as_slice(),
        )
        .map_err(|_| CryptoError::AccessDenied)?;

    let key = SymmetricKey::from_slice(&opened).map_err(|_| CryptoError::AccessDenied);
    zeroize::Zeroize::zeroize(&mut opened);
    key
}
