//! Domain models for SolKey.
//!
//! Binary fields serialize as base64. Plaintext never appears in any of
//! these types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use solkey_crypto::encoding::{base64_array, base64_bytes};
use solkey_crypto::{EncryptedPayload, EncryptionPublicKey, WalletAddress, WrapMethod, WrappedKey};
use uuid::Uuid;

use crate::error::{Error, Result};

/// Kind of value a secret holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SecretType {
    String,
    Password,
    ApiKey,
    Json,
    Array,
}

impl SecretType {
    /// Check that `plaintext` is well-formed for this type.
    pub fn validate(&self, plaintext: &[u8]) -> Result<()> {
        match self {
            Self::String | Self::Password | Self::ApiKey => {
                std::str::from_utf8(plaintext)
                    .map_err(|_| Error::InvalidInput(format!("{} value must be UTF-8", self)))?;
            }
            Self::Json => {
                serde_json::from_slice::<serde_json::Value>(plaintext)
                    .map_err(|e| Error::InvalidInput(format!("json value: {}", e)))?;
            }
            Self::Array => {
                let value: serde_json::Value = serde_json::from_slice(plaintext)
                    .map_err(|e| Error::InvalidInput(format!("array value: {}", e)))?;
                if !value.is_array() {
                    return Err(Error::InvalidInput("array value must be a JSON array".into()));
                }
            }
        }
        Ok(())
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Password => "password",
            Self::ApiKey => "api_key",
            Self::Json => "json",
            Self::Array => "array",
        }
    }
}

impl std::fmt::Display for SecretType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An encrypted secret.
///
/// `ciphertext`, `iv` and `auth_tag` always come from the same encryption call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Secret {
    pub id: Uuid,
    pub project_id: Uuid,
    pub environment_id: Uuid,
    pub name: String,
    pub secret_type: SecretType,
    #[serde(with = "base64_bytes")]
    pub ciphertext: Vec<u8>,
    #[serde(with = "base64_array")]
    pub iv: [u8; 12],
    #[serde(with = "base64_array")]
    pub auth_tag: [u8; 16],
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Secret {
    /// Ciphertext fields as one payload.
    pub fn payload(&self) -> EncryptedPayload {
        EncryptedPayload {
            ciphertext: self.ciphertext.clone(),
            iv: self.iv,
            auth_tag: self.auth_tag,
        }
    }

    /// Replace all three ciphertext fields at once.
    pub fn set_payload(&mut self, payload: EncryptedPayload) {
        self.ciphertext = payload.ciphertext;
        self.iv = payload.iv;
        self.auth_tag = payload.auth_tag;
    }

    pub fn summary(&self) -> SecretSummary {
        SecretSummary {
            id: self.id,
            project_id: self.project_id,
            environment_id: self.environment_id,
            name: self.name.clone(),
            secret_type: self.secret_type,
            updated_at: self.updated_at,
        }
    }
}

/// Metadata-only view of a secret.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecretSummary {
    pub id: Uuid,
    pub project_id: Uuid,
    pub environment_id: Uuid,
    pub name: String,
    pub secret_type: SecretType,
    pub updated_at: DateTime<Utc>,
}

/// One recipient's access to one secret.
///
/// Unique on `(secret_id, recipient_wallet)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WrappedKeyRecord {
    pub secret_id: Uuid,
    pub recipient_wallet: WalletAddress,
    #[serde(flatten)]
    pub wrapped: WrappedKey,
    pub created_at: DateTime<Utc>,
}

impl WrappedKeyRecord {
    pub fn new(secret_id: Uuid, recipient_wallet: WalletAddress, wrapped: WrappedKey) -> Self {
        Self {
            secret_id,
            recipient_wallet,
            wrapped,
            created_at: Utc::now(),
        }
    }

    pub fn method(&self) -> WrapMethod {
        self.wrapped.method
    }
}

/// A project member as reported by the membership directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectMember {
    pub wallet_address: WalletAddress,
    /// Signature-derived key published at enrollment, if any.
    #[serde(default)]
    pub encryption_key: Option<EncryptionPublicKey>,
}

impl ProjectMember {
    pub fn new(wallet_address: WalletAddress) -> Self {
        Self {
            wallet_address,
            encryption_key: None,
        }
    }

    pub fn enrolled(wallet_address: WalletAddress, key: EncryptionPublicKey) -> Self {
        Self {
            wallet_address,
            encryption_key: Some(key),
        }
    }
}

/// Request for creating a new secret.
#[derive(Clone)]
pub struct CreateSecretRequest {
    pub project_id: Uuid,
    pub environment_id: Uuid,
    pub name: String,
    pub secret_type: SecretType,
    pub plaintext: Vec<u8>,
    /// Must be a member of the project.
    pub creator: WalletAddress,
}

impl std::fmt::Debug for CreateSecretRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CreateSecretRequest")
            .field("project_id", &self.project_id)
            .field("environment_id", &self.environment_id)
            .field("name", &self.name)
            .field("secret_type", &self.secret_type)
            .field("plaintext", &"[REDACTED]")
            .field("creator", &self.creator)
            .finish()
    }
}
