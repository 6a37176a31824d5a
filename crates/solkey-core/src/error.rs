//! Error types for SolKey.

use solkey_crypto::{CryptoError, WalletAddress, WrapMethod};
use thiserror::Error;
use uuid::Uuid;

/// Result type alias using SolKey's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for SolKey operations.
///
/// Each access failure implies a different remedy, so they stay separate:
/// `NoAccess` (request access), `AccessDenied` (re-authenticate),
/// `IntegrityCheckFailed` (stored data is corrupted).
#[derive(Error, Debug)]
pub enum Error {
    /// No wrapped-key record exists for this wallet
    #[error("No access: {wallet} has no key for secret {secret_id}")]
    NoAccess {
        secret_id: Uuid,
        wallet: WalletAddress,
    },

    /// Wrapped key did not open with the presented key material
    #[error("Access denied: signature does not match the key this secret was shared with")]
    AccessDenied,

    /// Record was wrapped for a different kind of recipient key
    #[error("Wrap method mismatch: record uses {record}, caller presented {presented}")]
    MethodMismatch {
        record: WrapMethod,
        presented: WrapMethod,
    },

    /// Stored ciphertext failed authentication
    #[error("Integrity check failed: stored ciphertext is corrupted")]
    IntegrityCheckFailed,

    /// Signature could not be turned into key material
    #[error("Key derivation failed: {0}")]
    Derivation(String),

    /// Wallet public key could not be converted for wrapping
    #[error("Key conversion failed: {0}")]
    Conversion(String),

    /// Signature does not verify for the claimed wallet
    #[error("Signature verification failed for {0}")]
    SignatureVerification(WalletAddress),

    /// Not every recipient record was written
    #[error("Partial write failure for secret {secret_id}: {written}/{expected} records ({reason})")]
    PartialWriteFailure {
        secret_id: Uuid,
        written: usize,
        expected: usize,
        reason: String,
    },

    /// User rejected the signature request
    #[error("User declined the signature request")]
    UserDeclined,

    /// Wallet is disconnected or not installed
    #[error("Wallet unavailable: {0}")]
    WalletUnavailable(String),

    /// Session was closed or its wallet disconnected
    #[error("Session closed")]
    SessionClosed,

    /// Secret not found
    #[error("Secret not found: {0}")]
    SecretNotFound(Uuid),

    /// Name already used in this project and environment
    #[error("Already exists: {0}")]
    AlreadyExists(String),

    /// Wallet is not a member of the project
    #[error("{wallet} is not a member of project {project_id}")]
    NotAMember {
        project_id: Uuid,
        wallet: WalletAddress,
    },

    /// Member has no enrolled key and converted-key wrapping is disabled
    #[error("{0} has not enrolled an encryption key")]
    NotEnrolled(WalletAddress),

    /// Revoking would leave the secret unrecoverable
    #[error("Cannot revoke the last recipient of secret {0}")]
    LastRecipient(Uuid),

    /// Storage collaborator failed
    #[error("Store error: {0}")]
    Store(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Other cryptographic failure
    #[error("Crypto error: {0}")]
    Crypto(CryptoError),
}

impl Error {
    /// Stable, machine-readable name of the failure kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NoAccess { .. } => "no_access",
            Self::AccessDenied => "access_denied",
            Self::MethodMismatch { .. } => "method_mismatch",
            Self::IntegrityCheckFailed => "integrity_check_failed",
            Self::Derivation(_) => "derivation",
            Self::Conversion(_) => "conversion",
            Self::SignatureVerification(_) => "signature_verification",
            Self::PartialWriteFailure { .. } => "partial_write_failure",
            Self::UserDeclined => "user_declined",
            Self::WalletUnavailable(_) => "wallet_unavailable",
            Self::SessionClosed => "session_closed",
            Self::SecretNotFound(_) => "secret_not_found",
            Self::AlreadyExists(_) => "already_exists",
            Self::NotAMember { .. } => "not_a_member",
            Self::NotEnrolled(_) => "not_enrolled",
            Self::LastRecipient(_) => "last_recipient",
            Self::Store(_) => "store",
            Self::Config(_) => "config",
            Self::InvalidInput(_) => "invalid_input",
            Self::Crypto(e) => e.kind(),
        }
    }
}

impl From<CryptoError> for Error {
    fn from(err: CryptoError) -> Self {
        match err {
            CryptoError::AccessDenied => Self::AccessDenied,
            CryptoError::IntegrityCheckFailed => Self::IntegrityCheckFailed,
            CryptoError::MethodMismatch { record, presented } => {
                Self::MethodMismatch { record, presented }
            }
            CryptoError::Derivation(msg) => Self::Derivation(msg),
            CryptoError::Conversion(msg) => Self::Conversion(msg),
            CryptoError::InvalidInput(msg) => Self::InvalidInput(msg),
            other => Self::Crypto(other),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::InvalidInput(err.to_string())
    }
}
