//! Wallet identities: addresses, detached signatures, and local signing keys.
//!
//! A wallet address is the base58 encoding of a 32-byte Ed25519 public key.
//! Application code normally never sees the wallet's signing key; it receives
//! detached signatures over fixed messages instead. `WalletKeypair` exists for
//! command-line wallets and tests that do hold the signing key.

use std::fmt;
use std::str::FromStr;

use ed25519_dalek::{Signature, Signer, SigningKey, VerifyingKey};
use serde::{Deserialize, Serialize};

use crate::cipher::generate_random;
use crate::encoding::Encoding;
use crate::error::{CryptoError, CryptoResult};

/// Length of an Ed25519 public key.
pub const PUBLIC_KEY_LENGTH: usize = 32;

/// Length of an Ed25519 detached signature.
pub const SIGNATURE_LENGTH: usize = 64;

/// Base58-encoded Ed25519 public key identifying a wallet.
///
/// Addresses are not required to be valid curve points: program-derived
/// addresses are off-curve and simply cannot be converted for wrapping.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WalletAddress(String);

impl WalletAddress {
    /// Parse and validate a base58 wallet address.
    pub fn parse(s: &str) -> CryptoResult<Self> {
        let bytes = bs58::decode(s)
            .into_vec()
            .map_err(|e| CryptoError::InvalidAddress(e.to_string()))?;

        if bytes.len() != PUBLIC_KEY_LENGTH {
            return Err(CryptoError::InvalidAddress(format!(
                "expected {} bytes, got {}",
                PUBLIC_KEY_LENGTH,
                bytes.len()
            )));
        }

        Ok(Self(s.to_string()))
    }

    /// Build an address from raw public key bytes.
    pub fn from_public_key(bytes: &[u8; PUBLIC_KEY_LENGTH]) -> Self {
        Self(bs58::encode(bytes).into_string())
    }

    /// Get the address as a string reference.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Raw Ed25519 public key bytes.
    pub fn public_key_bytes(&self) -> CryptoResult<[u8; PUBLIC_KEY_LENGTH]> {
        let bytes = bs58::decode(&self.0)
            .into_vec()
            .map_err(|e| CryptoError::InvalidAddress(e.to_string()))?;
        bytes
            .try_into()
            .map_err(|_| CryptoError::InvalidAddress("wrong public key length".into()))
    }
}

impl fmt::Display for WalletAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for WalletAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "WalletAddress({})", self.0)
    }
}

impl FromStr for WalletAddress {
    type Err = CryptoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for WalletAddress {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for WalletAddress {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}

/// Detached Ed25519 signature produced by a wallet.
#[derive(Clone, PartialEq, Eq)]
pub struct WalletSignature([u8; SIGNATURE_LENGTH]);

impl WalletSignature {
    /// Create from exactly 64 bytes.
    ///
    /// Anything else is a [`CryptoError::Derivation`] since no key material
    /// can be recovered from it.
    pub fn from_slice(bytes: &[u8]) -> CryptoResult<Self> {
        let arr: [u8; SIGNATURE_LENGTH] = bytes.try_into().map_err(|_| {
            CryptoError::Derivation(format!(
                "signature must be {} bytes, got {}",
                SIGNATURE_LENGTH,
                bytes.len()
            ))
        })?;
        Ok(Self(arr))
    }

    /// Decode a signature from its wire encoding.
    pub fn decode(s: &str, encoding: Encoding) -> CryptoResult<Self> {
        Self::from_slice(&encoding.decode("signature", s)?)
    }

    /// Get the signature bytes.
    pub fn as_bytes(&self) -> &[u8; SIGNATURE_LENGTH] {
        &self.0
    }

    /// Verify this signature over `message` for `address`.
    pub fn verify(&self, address: &WalletAddress, message: &[u8]) -> CryptoResult<()> {
        let verifying_key = VerifyingKey::from_bytes(&address.public_key_bytes()?)
            .map_err(|_| CryptoError::InvalidSignature)?;
        let signature = Signature::from_bytes(&self.0);
        verifying_key
            .verify_strict(message, &signature)
            .map_err(|_| CryptoError::InvalidSignature)
    }
}

impl fmt::Debug for WalletSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Signatures double as key seeds here, so never print them.
        f.write_str("WalletSignature([REDACTED])")
    }
}

/// Ed25519 wallet keypair held locally.
pub struct WalletKeypair {
    signing_key: SigningKey,
}

impl WalletKeypair {
    /// Generate a new random wallet.
    pub fn generate() -> Self {
        Self::from_secret_bytes(generate_random())
    }

    /// Restore a wallet from its 32-byte secret seed.
    pub fn from_secret_bytes(secret: [u8; 32]) -> Self {
        Self {
            signing_key: SigningKey::from_bytes(&secret),
        }
    }

    /// The 32-byte secret seed.
    pub fn secret_bytes(&self) -> [u8; 32] {
        self.signing_key.to_bytes()
    }

    /// The wallet's public address.
    pub fn address(&self) -> WalletAddress {
        WalletAddress::from_public_key(self.signing_key.verifying_key().as_bytes())
    }

    /// Produce a detached signature over `message`.
    pub fn sign(&self, message: &[u8]) -> WalletSignature {
        WalletSignature(self.signing_key.sign(message).to_bytes())
    }

    /// Expanded Ed25519 scalar, usable as an X25519 secret.
    pub(crate) fn scalar_bytes(&self) -> [u8; 32] {
        self.signing_key.to_scalar_bytes()
    }
}

impl fmt::Debug for WalletKeypair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WalletKeypair")
            .field("address", &self.address())
            .field("secret", &"[REDACTED]")
            .finish()
    }
}
