//! In-memory store and membership directory.
//!
//! Reference implementations of the collaborator traits, used by tests and
//! local tooling. State is lost when the process exits.

use std::collections::HashMap;

use async_trait::async_trait;
use solkey_core::{
    Error, MemberDirectory, ProjectMember, Result, Secret, SecretStore, WrappedKeyRecord,
};
use solkey_crypto::{EncryptionPublicKey, WalletAddress};
use tokio::sync::RwLock;
use uuid::Uuid;

/// Secrets and wrapped-key records held in memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    secrets: RwLock<HashMap<Uuid, Secret>>,
    records: RwLock<HashMap<(Uuid, WalletAddress), WrappedKeyRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored secrets.
    pub async fn secret_count(&self) -> usize {
        self.secrets.read().await.len()
    }

    /// Number of stored wrapped-key records.
    pub async fn record_count(&self) -> usize {
        self.records.read().await.len()
    }
}

#[async_trait]
impl SecretStore for MemoryStore {
    async fn persist_secret(&self, secret: &Secret) -> Result<()> {
        self.secrets.write().await.insert(secret.id, secret.clone());
        Ok(())
    }

    async fn get_secret(&self, id: Uuid) -> Result<Option<Secret>> {
        Ok(self.secrets.read().await.get(&id).cloned())
    }

    async fn delete_secret(&self, id: Uuid) -> Result<bool> {
        Ok(self.secrets.write().await.remove(&id).is_some())
    }

    async fn find_secret_by_name(
        &self,
        project_id: Uuid,
        environment_id: Uuid,
        name: &str,
    ) -> Result<Option<Secret>> {
        Ok(self
            .secrets
            .read()
            .await
            .values()
            .find(|s| {
                s.project_id == project_id && s.environment_id == environment_id && s.name == name
            })
            .cloned())
    }

    async fn list_secrets(&self, project_id: Uuid) -> Result<Vec<Secret>> {
        let mut secrets: Vec<Secret> = self
            .secrets
            .read()
            .await
            .values()
            .filter(|s| s.project_id == project_id)
            .cloned()
            .collect();
        secrets.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(secrets)
    }

    async fn persist_wrapped_key(&self, record: &WrappedKeyRecord) -> Result<()> {
        if !self.secrets.read().await.contains_key(&record.secret_id) {
            return Err(Error::SecretNotFound(record.secret_id));
        }
        self.records.write().await.insert(
            (record.secret_id, record.recipient_wallet.clone()),
            record.clone(),
        );
        Ok(())
    }

    async fn get_wrapped_key(
        &self,
        secret_id: Uuid,
        wallet: &WalletAddress,
    ) -> Result<Option<WrappedKeyRecord>> {
        Ok(self
            .records
            .read()
            .await
            .get(&(secret_id, wallet.clone()))
            .cloned())
    }

    async fn delete_wrapped_key(&self, secret_id: Uuid, wallet: &WalletAddress) -> Result<bool> {
        Ok(self
            .records
            .write()
            .await
            .remove(&(secret_id, wallet.clone()))
            .is_some())
    }

    async fn list_wrapped_keys(&self, secret_id: Uuid) -> Result<Vec<WrappedKeyRecord>> {
        let mut records: Vec<WrappedKeyRecord> = self
            .records
            .read()
            .await
            .values()
            .filter(|r| r.secret_id == secret_id)
            .cloned()
            .collect();
        records.sort_by(|a, b| a.recipient_wallet.cmp(&b.recipient_wallet));
        Ok(records)
    }

    async fn list_wrapped_keys_for_wallet(
        &self,
        wallet: &WalletAddress,
    ) -> Result<Vec<WrappedKeyRecord>> {
        Ok(self
            .records
            .read()
            .await
            .values()
            .filter(|r| &r.recipient_wallet == wallet)
            .cloned()
            .collect())
    }
}

/// Project membership held in memory.
#[derive(Debug, Default)]
pub struct MemoryDirectory {
    projects: RwLock<HashMap<Uuid, Vec<ProjectMember>>>,
}

impl MemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a member, replacing any existing entry for the same wallet.
    pub async fn add_member(&self, project_id: Uuid, member: ProjectMember) {
        let mut projects = self.projects.write().await;
        let members = projects.entry(project_id).or_default();
        members.retain(|m| m.wallet_address != member.wallet_address);
        members.push(member);
    }

    /// Remove a member. Returns whether they were present.
    pub async fn remove_member(&self, project_id: Uuid, wallet: &WalletAddress) -> bool {
        let mut projects = self.projects.write().await;
        match projects.get_mut(&project_id) {
            Some(members) => {
                let before = members.len();
                members.retain(|m| &m.wallet_address != wallet);
                members.len() != before
            }
            None => false,
        }
    }
}

#[async_trait]
impl MemberDirectory for MemoryDirectory {
    async fn list_project_members(&self, project_id: Uuid) -> Result<Vec<ProjectMember>> {
        Ok(self
            .projects
            .read()
            .await
            .get(&project_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn get_member(
        &self,
        project_id: Uuid,
        wallet: &WalletAddress,
    ) -> Result<Option<ProjectMember>> {
        Ok(self
            .projects
            .read()
            .await
            .get(&project_id)
            .and_then(|members| members.iter().find(|m| &m.wallet_address == wallet))
            .cloned())
    }

    async fn set_encryption_key(
        &self,
        project_id: Uuid,
        wallet: &WalletAddress,
        key: EncryptionPublicKey,
    ) -> Result<()> {
        let mut projects = self.projects.write().await;
        let member = projects
            .get_mut(&project_id)
            .and_then(|members| members.iter_mut().find(|m| &m.wallet_address == wallet))
            .ok_or_else(|| Error::NotAMember {
                project_id,
                wallet: wallet.clone(),
            })?;
        member.encryption_key = Some(key);
        Ok(())
    }
}
