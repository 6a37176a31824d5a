//! Core traits for SolKey collaborators.
//!
//! Membership, wallet signing and persistence live outside the vault. These
//! traits are the whole contract the vault relies on.

use async_trait::async_trait;
use solkey_crypto::{WalletAddress, WalletSignature};
use uuid::Uuid;

use crate::error::Result;
use crate::models::*;

// =============================================================================
// MEMBERSHIP
// =============================================================================

/// Source of truth for who belongs to a project.
#[async_trait]
pub trait MemberDirectory: Send + Sync {
    /// List all current members of a project.
    async fn list_project_members(&self, project_id: Uuid) -> Result<Vec<ProjectMember>>;

    /// Look up one member, `None` if the wallet is not in the project.
    async fn get_member(
        &self,
        project_id: Uuid,
        wallet: &WalletAddress,
    ) -> Result<Option<ProjectMember>>;

    /// Publish a member's signature-derived encryption key.
    async fn set_encryption_key(
        &self,
        project_id: Uuid,
        wallet: &WalletAddress,
        key: solkey_crypto::EncryptionPublicKey,
    ) -> Result<()>;
}

// =============================================================================
// WALLET
// =============================================================================

/// A connected wallet that can sign messages on the user's behalf.
///
/// Signing is user-interactive. Implementations return
/// [`crate::Error::UserDeclined`] or [`crate::Error::WalletUnavailable`],
/// and dropping the returned future cancels the request.
#[async_trait]
pub trait WalletSigner: Send + Sync {
    /// Address of the connected wallet.
    fn address(&self) -> WalletAddress;

    /// Whether the wallet is still connected.
    fn is_connected(&self) -> bool;

    /// Request a detached signature over `message`.
    async fn sign_message(&self, message: &[u8]) -> Result<WalletSignature>;
}

// =============================================================================
// STORAGE
// =============================================================================

/// Durable storage for secrets and wrapped-key records.
#[async_trait]
pub trait SecretStore: Send + Sync {
    /// Insert or replace a secret.
    async fn persist_secret(&self, secret: &Secret) -> Result<()>;

    /// Get a secret by ID.
    async fn get_secret(&self, id: Uuid) -> Result<Option<Secret>>;

    /// Delete a secret. Returns whether it existed.
    async fn delete_secret(&self, id: Uuid) -> Result<bool>;

    /// Find a secret by its name within a project environment.
    async fn find_secret_by_name(
        &self,
        project_id: Uuid,
        environment_id: Uuid,
        name: &str,
    ) -> Result<Option<Secret>>;

    /// List secrets in a project.
    async fn list_secrets(&self, project_id: Uuid) -> Result<Vec<Secret>>;

    /// Insert a record, replacing any record for the same (secret, wallet).
    async fn persist_wrapped_key(&self, record: &WrappedKeyRecord) -> Result<()>;

    /// Get the record for (secret, wallet).
    async fn get_wrapped_key(
        &self,
        secret_id: Uuid,
        wallet: &WalletAddress,
    ) -> Result<Option<WrappedKeyRecord>>;

    /// Delete the record for (secret, wallet). Returns whether it existed.
    async fn delete_wrapped_key(&self, secret_id: Uuid, wallet: &WalletAddress) -> Result<bool>;

    /// List every record for a secret.
    async fn list_wrapped_keys(&self, secret_id: Uuid) -> Result<Vec<WrappedKeyRecord>>;

    /// List every record held by a wallet.
    async fn list_wrapped_keys_for_wallet(
        &self,
        wallet: &WalletAddress,
    ) -> Result<Vec<WrappedKeyRecord>>;
}
