//! Error types for cryptographic operations.

use thiserror::Error;

use crate::encoding::Encoding;
use crate::wrap::WrapMethod;

/// Cryptographic operation errors.
///
/// Every failure mode has its own variant so callers can tell "wrong key"
/// apart from "corrupted ciphertext" apart from "bad encoding".
#[derive(Error, Debug)]
pub enum CryptoError {
    /// Signature input could not be turned into key material.
    #[error("Key derivation failed: {0}")]
    Derivation(String),

    /// Signing public key could not be mapped to an encryption key.
    #[error("Key conversion failed: {0}")]
    Conversion(String),

    /// Wrapped key could not be opened with the presented key.
    #[error("Access denied: wrapped key could not be opened")]
    AccessDenied,

    /// Wrapped key was produced for a different kind of recipient key.
    #[error("Wrap method mismatch: record uses {record}, presented key is {presented}")]
    MethodMismatch {
        record: WrapMethod,
        presented: WrapMethod,
    },

    /// AEAD tag verification failed.
    #[error("Integrity check failed: ciphertext, IV, or tag do not match the key")]
    IntegrityCheckFailed,

    /// Wallet signature did not verify.
    #[error("Signature verification failed")]
    InvalidSignature,

    /// Malformed wallet address.
    #[error("Invalid wallet address: {0}")]
    InvalidAddress(String),

    /// A binary field could not be decoded from its wire encoding.
    #[error("Invalid {encoding} in field '{field}': {reason}")]
    Encoding {
        field: &'static str,
        encoding: Encoding,
        reason: String,
    },

    /// Encryption failed.
    #[error("Encryption failed: {0}")]
    Encryption(String),

    /// Invalid input.
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl CryptoError {
    /// Stable, machine-readable name of the failure kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Derivation(_) => "derivation",
            Self::Conversion(_) => "conversion",
            Self::AccessDenied => "access_denied",
            Self::MethodMismatch { .. } => "method_mismatch",
            Self::IntegrityCheckFailed => "integrity_check_failed",
            Self::InvalidSignature => "invalid_signature",
            Self::InvalidAddress(_) => "invalid_address",
            Self::Encoding { .. } => "encoding",
            Self::Encryption(_) => "encryption",
            Self::InvalidInput(_) => "invalid_input",
        }
    }
}

/// Result type for cryptographic operations.
pub type CryptoResult<T> = Result<T, CryptoError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = CryptoError::AccessDenied;
        assert!(err.to_string().contains("Access denied"));
    }

    #[test]
    fn test_encoding_error_names_field() {
        let err = CryptoError::Encoding {
            field: "iv",
            encoding: Encoding::Hex,
            reason: "odd length".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("'iv'"));
        assert!(msg.contains("hex"));
        assert!(!msg.contains("Integrity"));
    }

    #[test]
    fn test_method_mismatch_display() {
        let err = CryptoError::MethodMismatch {
            record: WrapMethod::ConvertedWalletKey,
            presented: WrapMethod::SignatureDerived,
        };
        assert!(err.to_string().contains("converted_wallet_key"));
        assert!(err.to_string().contains("signature_derived"));
    }

    #[test]
    fn test_kind_is_stable() {
        assert_eq!(CryptoError::IntegrityCheckFailed.kind(), "integrity_check_failed");
        assert_eq!(CryptoError::Derivation("short".into()).kind(), "derivation");
        assert_eq!(CryptoError::InvalidSignature.kind(), "invalid_signature");
    }
}
