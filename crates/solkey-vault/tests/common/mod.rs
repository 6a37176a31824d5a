//! Shared fixtures for vault integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use solkey_core::{
    CreateSecretRequest, Error, ProjectMember, Result, Secret, SecretStore, SecretType,
    VaultConfig, WalletSigner, WrappedKeyRecord,
};
use solkey_crypto::{KdfParams, WalletAddress, WalletKeypair, WalletSignature};
use solkey_vault::{AccessProtocol, MemoryDirectory, MemoryStore};
use uuid::Uuid;

pub fn test_config() -> VaultConfig {
    VaultConfig {
        kdf: KdfParams::insecure_fast(),
        ..VaultConfig::default()
    }
}

/// A project member with a local wallet.
pub struct Member {
    pub wallet: WalletKeypair,
}

impl Member {
    pub fn new() -> Self {
        Self {
            wallet: WalletKeypair::generate(),
        }
    }

    pub fn address(&self) -> WalletAddress {
        self.wallet.address()
    }

    pub fn signature(&self, config: &VaultConfig) -> WalletSignature {
        self.wallet.sign(config.derivation_message.as_bytes())
    }
}

pub struct Fixture {
    pub vault: Arc<AccessProtocol>,
    pub store: Arc<MemoryStore>,
    pub directory: Arc<MemoryDirectory>,
    pub project: Uuid,
    pub environment: Uuid,
}

impl Fixture {
    pub fn new() -> Self {
        Self::with_config(test_config())
    }

    pub fn with_config(config: VaultConfig) -> Self {
        let store = Arc::new(MemoryStore::new());
        let directory = Arc::new(MemoryDirectory::new());
        let vault = Arc::new(AccessProtocol::new(store.clone(), directory.clone(), config));
        Self {
            vault,
            store,
            directory,
            project: Uuid::now_v7(),
            environment: Uuid::now_v7(),
        }
    }

    /// Add a member who has enrolled their signature-derived key.
    pub async fn enrolled(&self) -> Member {
        let member = Member::new();
        self.directory
            .add_member(self.project, ProjectMember::new(member.address()))
            .await;
        self.vault
            .enroll_member(
                self.project,
                &member.address(),
                &member.signature(self.vault.config()),
            )
            .await
            .unwrap();
        member
    }

    /// Add a member who has never signed anything.
    pub async fn unenrolled(&self) -> Member {
        let member = Member::new();
        self.directory
            .add_member(self.project, ProjectMember::new(member.address()))
            .await;
        member
    }

    pub fn request(&self, name: &str, value: &str, creator: &Member) -> CreateSecretRequest {
        CreateSecretRequest {
            project_id: self.project,
            environment_id: self.environment,
            name: name.to_string(),
            secret_type: SecretType::String,
            plaintext: value.as_bytes().to_vec(),
            creator: creator.address(),
        }
    }

    pub async fn create(&self, name: &str, value: &str, creator: &Member) -> Uuid {
        self.vault
            .create_secret(self.request(name, value, creator))
            .await
            .unwrap()
    }

    pub async fn decrypt(&self, id: Uuid, member: &Member) -> Result<Vec<u8>> {
        self.vault
            .decrypt_secret(id, &member.address(), &member.signature(self.vault.config()))
            .await
    }
}

/// Store that fails every wrapped-key write after the first `allowed`.
pub struct FlakyStore {
    pub inner: MemoryStore,
    allowed: usize,
    writes: AtomicUsize,
}

impl FlakyStore {
    pub fn new(allowed: usize) -> Self {
        Self {
            inner: MemoryStore::new(),
            allowed,
            writes: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl SecretStore for FlakyStore {
    async fn persist_secret(&self, secret: &Secret) -> Result<()> {
        self.inner.persist_secret(secret).await
    }

    async fn get_secret(&self, id: Uuid) -> Result<Option<Secret>> {
        self.inner.get_secret(id).await
    }

    async fn delete_secret(&self, id: Uuid) -> Result<bool> {
        self.inner.delete_secret(id).await
    }

    async fn find_secret_by_name(
        &self,
        project_id: Uuid,
        environment_id: Uuid,
        name: &str,
    ) -> Result<Option<Secret>> {
        self.inner
            .find_secret_by_name(project_id, environment_id, name)
            .await
    }

    async fn list_secrets(&self, project_id: Uuid) -> Result<Vec<Secret>> {
        self.inner.list_secrets(project_id).await
    }

    async fn persist_wrapped_key(&self, record: &WrappedKeyRecord) -> Result<()> {
        if self.writes.fetch_add(1, Ordering::SeqCst) >= self.allowed {
            return Err(Error::Store("connection reset".into()));
        }
        self.inner.persist_wrapped_key(record).await
    }

    async fn get_wrapped_key(
        &self,
        secret_id: Uuid,
        wallet: &WalletAddress,
    ) -> Result<Option<WrappedKeyRecord>> {
        self.inner.get_wrapped_key(secret_id, wallet).await
    }

    async fn delete_wrapped_key(&self, secret_id: Uuid, wallet: &WalletAddress) -> Result<bool> {
        self.inner.delete_wrapped_key(secret_id, wallet).await
    }

    async fn list_wrapped_keys(&self, secret_id: Uuid) -> Result<Vec<WrappedKeyRecord>> {
        self.inner.list_wrapped_keys(secret_id).await
    }

    async fn list_wrapped_keys_for_wallet(
        &self,
        wallet: &WalletAddress,
    ) -> Result<Vec<WrappedKeyRecord>> {
        self.inner.list_wrapped_keys_for_wallet(wallet).await
    }
}

/// Store that yields around lookups and writes the way a networked
/// database would, so concurrent tasks interleave between them.
#[derive(Default)]
pub struct SlowStore {
    pub inner: MemoryStore,
}

#[async_trait]
impl SecretStore for SlowStore {
    async fn persist_secret(&self, secret: &Secret) -> Result<()> {
        tokio::task::yield_now().await;
        self.inner.persist_secret(secret).await
    }

    async fn get_secret(&self, id: Uuid) -> Result<Option<Secret>> {
        self.inner.get_secret(id).await
    }

    async fn delete_secret(&self, id: Uuid) -> Result<bool> {
        self.inner.delete_secret(id).await
    }

    async fn find_secret_by_name(
        &self,
        project_id: Uuid,
        environment_id: Uuid,
        name: &str,
    ) -> Result<Option<Secret>> {
        let found = self
            .inner
            .find_secret_by_name(project_id, environment_id, name)
            .await;
        tokio::task::yield_now().await;
        found
    }

    async fn list_secrets(&self, project_id: Uuid) -> Result<Vec<Secret>> {
        let secrets = self.inner.list_secrets(project_id).await;
        tokio::task::yield_now().await;
        secrets
    }

    async fn persist_wrapped_key(&self, record: &WrappedKeyRecord) -> Result<()> {
        self.inner.persist_wrapped_key(record).await
    }

    async fn get_wrapped_key(
        &self,
        secret_id: Uuid,
        wallet: &WalletAddress,
    ) -> Result<Option<WrappedKeyRecord>> {
        let record = self.inner.get_wrapped_key(secret_id, wallet).await;
        tokio::task::yield_now().await;
        record
    }

    async fn delete_wrapped_key(&self, secret_id: Uuid, wallet: &WalletAddress) -> Result<bool> {
        tokio::task::yield_now().await;
        self.inner.delete_wrapped_key(secret_id, wallet).await
    }

    async fn list_wrapped_keys(&self, secret_id: Uuid) -> Result<Vec<WrappedKeyRecord>> {
        let records = self.inner.list_wrapped_keys(secret_id).await;
        tokio::task::yield_now().await;
        records
    }

    async fn list_wrapped_keys_for_wallet(
        &self,
        wallet: &WalletAddress,
    ) -> Result<Vec<WrappedKeyRecord>> {
        self.inner.list_wrapped_keys_for_wallet(wallet).await
    }
}

/// Vault over a [`SlowStore`] with members added to one project.
pub struct SlowFixture {
    pub vault: Arc<AccessProtocol>,
    pub store: Arc<SlowStore>,
    pub project: Uuid,
    pub environment: Uuid,
}

impl SlowFixture {
    pub async fn with_members(count: usize) -> (Self, Vec<Member>) {
        let store = Arc::new(SlowStore::default());
        let directory = Arc::new(MemoryDirectory::new());
        let vault = Arc::new(AccessProtocol::new(
            store.clone(),
            directory.clone(),
            test_config(),
        ));
        let project = Uuid::now_v7();

        let members: Vec<Member> = (0..count).map(|_| Member::new()).collect();
        for m in &members {
            directory
                .add_member(project, ProjectMember::new(m.address()))
                .await;
            vault
                .enroll_member(project, &m.address(), &m.signature(vault.config()))
                .await
                .unwrap();
        }

        let fixture = Self {
            vault,
            store,
            project,
            environment: Uuid::now_v7(),
        };
        (fixture, members)
    }

    pub fn request(&self, name: &str, value: &str, creator: &Member) -> CreateSecretRequest {
        CreateSecretRequest {
            project_id: self.project,
            environment_id: self.environment,
            name: name.to_string(),
            secret_type: SecretType::String,
            plaintext: value.as_bytes().to_vec(),
            creator: creator.address(),
        }
    }
}

/// Signer whose user always rejects the prompt.
pub struct DecliningSigner {
    pub wallet: WalletKeypair,
}

#[async_trait]
impl WalletSigner for DecliningSigner {
    fn address(&self) -> WalletAddress {
        self.wallet.address()
    }

    fn is_connected(&self) -> bool {
        true
    }

    async fn sign_message(&self, _message: &[u8]) -> Result<WalletSignature> {
        Err(Error::UserDeclined)
    }
}

/// Signer whose prompt never resolves.
pub struct PendingSigner {
    pub wallet: WalletKeypair,
}

#[async_trait]
impl WalletSigner for PendingSigner {
    fn address(&self) -> WalletAddress {
        self.wallet.address()
    }

    fn is_connected(&self) -> bool {
        true
    }

    async fn sign_message(&self, _message: &[u8]) -> Result<WalletSignature> {
        futures::future::pending().await
    }
}

/// Signer that signs with a different wallet than it claims.
pub struct ImpostorSigner {
    pub claimed: WalletKeypair,
    pub actual: WalletKeypair,
}

#[async_trait]
impl WalletSigner for ImpostorSigner {
    fn address(&self) -> WalletAddress {
        self.claimed.address()
    }

    fn is_connected(&self) -> bool {
        true
    }

    async fn sign_message(&self, message: &[u8]) -> Result<WalletSignature> {
        Ok(self.actual.sign(message))
    }
}
