//! Key types for secret encryption and key wrapping.
//!
//! This module provides:
//! - `SymmetricKey`: the per-secret AES-256 key
//! - `EncryptionPublicKey` / `EncryptionSecretKey`: X25519 keys used for wrapping
//! - `DerivedKeypair`: the X25519 keypair recovered from a wallet signature
//!
//! # Security
//!
//! - Secret keys are zeroized on drop
//! - `Debug` output never includes secret bytes
//! - Public keys print as a short BLAKE3 fingerprint

use serde::{Deserialize, Serialize};
use x25519_dalek::{PublicKey as X25519Public, StaticSecret};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::cipher::generate_random;
use crate::encoding::Encoding;
use crate::error::{CryptoError, CryptoResult};
use crate::wrap::{RecipientKey, WrapMethod};

/// Length of every key in this module.
pub const KEY_LENGTH: usize = 32;

/// Per-secret AES-256 key.
///
/// Generated once per secret and never persisted in raw form.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SymmetricKey([u8; KEY_LENGTH]);

impl SymmetricKey {
    /// Generate a fresh random key.
    pub fn generate() -> Self {
        Self(generate_random())
    }

    /// Create a key from raw bytes.
    pub fn from_bytes(bytes: [u8; KEY_LENGTH]) -> Self {
        Self(bytes)
    }

    /// Create a key from a slice, which must be exactly 32 bytes.
    pub fn from_slice(bytes: &[u8]) -> CryptoResult<Self> {
        let arr: [u8; KEY_LENGTH] = bytes.try_into().map_err(|_| {
            CryptoError::InvalidInput(format!(
                "symmetric key must be {} bytes, got {}",
                KEY_LENGTH,
                bytes.len()
            ))
        })?;
        Ok(Self(arr))
    }

    /// Get the key bytes.
    pub fn as_bytes(&self) -> &[u8; KEY_LENGTH] {
        &self.0
    }
}

impl std::fmt::Debug for SymmetricKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SymmetricKey")
            .field("key", &"[REDACTED]")
            .finish()
    }
}

/// X25519 public key used as a wrapping recipient.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct EncryptionPublicKey([u8; KEY_LENGTH]);

impl EncryptionPublicKey {
    /// Create a public key from raw bytes.
    pub fn from_bytes(bytes: [u8; KEY_LENGTH]) -> Self {
        Self(bytes)
    }

    /// Get the raw bytes of the public key.
    pub fn as_bytes(&self) -> &[u8; KEY_LENGTH] {
        &self.0
    }

    /// Parse a base64-encoded public key.
    pub fn from_base64(s: &str) -> CryptoResult<Self> {
        Ok(Self(Encoding::Base64.decode_array("encryption_public_key", s)?))
    }

    /// Encode as base64.
    pub fn to_base64(&self) -> String {
        Encoding::Base64.encode(&self.0)
    }

    /// Short BLAKE3 fingerprint, safe for logs.
    pub fn fingerprint(&self) -> String {
        let hash = blake3::hash(&self.0);
        hex::encode(&hash.as_bytes()[..8])
    }
}

impl std::fmt::Debug for EncryptionPublicKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "EncryptionPublicKey({})", self.fingerprint())
    }
}

impl Serialize for EncryptionPublicKey {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_base64())
    }
}

impl<'de> Deserialize<'de> for EncryptionPublicKey {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::from_base64(&s).map_err(serde::de::Error::custom)
    }
}

/// X25519 secret key with automatic zeroization.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct EncryptionSecretKey([u8; KEY_LENGTH]);

impl EncryptionSecretKey {
    /// Create a secret key from raw bytes.
    pub fn from_bytes(bytes: [u8; KEY_LENGTH]) -> Self {
        Self(bytes)
    }

    /// Get the raw bytes of the secret key.
    pub fn as_bytes(&self) -> &[u8; KEY_LENGTH] {
        &self.0
    }

    /// Derive the corresponding public key.
    pub fn public_key(&self) -> EncryptionPublicKey {
        let secret = StaticSecret::from(self.0);
        let public = X25519Public::from(&secret);
        EncryptionPublicKey(*public.as_bytes())
    }
}

impl std::fmt::Debug for EncryptionSecretKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EncryptionSecretKey")
            .field("key", &"[REDACTED]")
            .finish()
    }
}

/// X25519 keypair recovered from a wallet signature.
///
/// The same signature always yields the same keypair, so a recipient can
/// recover keys wrapped for them in earlier sessions.
#[derive(Clone, Debug)]
pub struct DerivedKeypair {
    /// The public key (published at enrollment).
    pub public: EncryptionPublicKey,
    /// The secret key (lives only for the session).
    pub secret: EncryptionSecretKey,
}

impl DerivedKeypair {
    /// Build a keypair from a 32-byte seed.
    pub fn from_seed(seed: [u8; KEY_LENGTH]) -> Self {
        let secret = EncryptionSecretKey::from_bytes(seed);
        let public = secret.public_key();
        Self { public, secret }
    }
}

impl RecipientKey for DerivedKeypair {
    fn method(&self) -> WrapMethod {
        WrapMethod::SignatureDerived
    }

    fn public_key(&self) -> EncryptionPublicKey {
        self.public
    }

    fn secret_key(&self) -> &EncryptionSecretKey {
        &self.secret
    }
}
