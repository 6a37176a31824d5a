//! Secret lifecycle: create, share, revoke, decrypt.
//!
//! A secret is encrypted once under a random per-secret key. That key is
//! wrapped separately for every member with access; the set of wrapped-key
//! records is the access list. Reading requires a wallet signature over the
//! derivation message, which recovers the member's unwrapping keypair.
//!
//! ```text
//! Uncreated ──create──▶ Sealed ──share──▶ Shared ──revoke──▶ Shared(N-1)
//!                          │                 │
//!                          └──────delete─────┴──────────────▶ Deleted
//! ```
//!
//! Share, revoke, rotate and delete on the same secret are serialized with a
//! per-secret lock. Creates of the same name in one environment are
//! serialized with a per-name lock. Decrypts take no lock.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use futures::future::join_all;
use solkey_core::{
    CreateSecretRequest, Error, MemberDirectory, ProjectMember, Result, Secret, SecretStore,
    SecretSummary, VaultConfig, WrappedKeyRecord,
};
use solkey_crypto::{
    address_to_x25519, cipher, unwrap, wrap_for_recipient, CryptoError, DerivedKeypair,
    EncryptionPublicKey, RecipientKey, SignatureKeyDeriver, SymmetricKey, WalletAddress,
    WalletSignature, WrapMethod,
};
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Keyed mutual exclusion for mutating operations.
#[derive(Debug)]
struct KeyedLocks<K> {
    locks: Mutex<HashMap<K, Arc<Mutex<()>>>>,
}

impl<K> Default for KeyedLocks<K> {
    fn default() -> Self {
        Self {
            locks: Mutex::new(HashMap::new()),
        }
    }
}

impl<K: Eq + Hash + Clone> KeyedLocks<K> {
    async fn acquire(&self, key: &K) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().await;
            locks.entry(key.clone()).or_default().clone()
        };
        lock.lock_owned().await
    }

    /// Drop `guard` and remove the entry if no other task holds or awaits it.
    async fn release(&self, key: &K, guard: OwnedMutexGuard<()>) {
        let mut locks = self.locks.lock().await;
        drop(guard);
        // The map's own handle is the last one when nobody else is waiting
        if locks.get(key).is_some_and(|lock| Arc::strong_count(lock) == 1) {
            locks.remove(key);
        }
    }
}

/// Secrets are unique per (project, environment, name).
type NameKey = (Uuid, Uuid, String);

/// Orchestrates secret creation, sharing, revocation and decryption.
pub struct AccessProtocol {
    store: Arc<dyn SecretStore>,
    directory: Arc<dyn MemberDirectory>,
    deriver: SignatureKeyDeriver,
    config: VaultConfig,
    locks: KeyedLocks<Uuid>,
    name_locks: KeyedLocks<NameKey>,
}

impl AccessProtocol {
    pub fn new(
        store: Arc<dyn SecretStore>,
        directory: Arc<dyn MemberDirectory>,
        config: VaultConfig,
    ) -> Self {
        Self {
            store,
            directory,
            deriver: SignatureKeyDeriver::new(config.kdf.clone()),
            config,
            locks: KeyedLocks::default(),
            name_locks: KeyedLocks::default(),
        }
    }

    pub fn config(&self) -> &VaultConfig {
        &self.config
    }

    pub fn deriver(&self) -> &SignatureKeyDeriver {
        &self.deriver
    }

    /// Verify `signature` over the derivation message and recover the
    /// wallet's recipient keypair.
    pub fn recipient_keypair(
        &self,
        wallet: &WalletAddress,
        signature: &WalletSignature,
    ) -> Result<DerivedKeypair> {
        signature
            .verify(wallet, self.config.derivation_message.as_bytes())
            .map_err(|e| match e {
                CryptoError::InvalidSignature => Error::SignatureVerification(wallet.clone()),
                other => other.into(),
            })?;
        Ok(self.deriver.derive_recipient_keypair(signature.as_bytes())?)
    }

    // =========================================================================
    // ENROLLMENT
    // =========================================================================

    /// Publish a member's signature-derived public key.
    ///
    /// After enrollment, new records for this member are wrapped to the
    /// derived key so the member can open them with a signature alone.
    pub async fn enroll_member(
        &self,
        project_id: Uuid,
        wallet: &WalletAddress,
        signature: &WalletSignature,
    ) -> Result<EncryptionPublicKey> {
        let keypair = self.recipient_keypair(wallet, signature)?;
        self.publish_key(project_id, wallet, keypair.public).await?;
        Ok(keypair.public)
    }

    pub(crate) async fn publish_key(
        &self,
        project_id: Uuid,
        wallet: &WalletAddress,
        key: EncryptionPublicKey,
    ) -> Result<()> {
        if self.directory.get_member(project_id, wallet).await?.is_none() {
            return Err(Error::NotAMember {
                project_id,
                wallet: wallet.clone(),
            });
        }
        self.directory
            .set_encryption_key(project_id, wallet, key)
            .await?;

        info!(
            subsystem = "vault",
            op = "enroll",
            project_id = %project_id,
            wallet = %wallet,
            key_fp = %key.fingerprint(),
            "Member enrolled"
        );
        Ok(())
    }

    /// Pick the wrapping key for a member.
    fn recipient_key(&self, member: &ProjectMember) -> Result<(EncryptionPublicKey, WrapMethod)> {
        match member.encryption_key {
            Some(key) => Ok((key, WrapMethod::SignatureDerived)),
            None if self.config.converted_fallback => {
                let key = address_to_x25519(&member.wallet_address)?;
                debug!(
                    wallet = %member.wallet_address,
                    wrap_method = %WrapMethod::ConvertedWalletKey,
                    "Member not enrolled, wrapping to converted wallet key"
                );
                Ok((key, WrapMethod::ConvertedWalletKey))
            }
            None => Err(Error::NotEnrolled(member.wallet_address.clone())),
        }
    }

    fn wrap_for_member(
        &self,
        secret_id: Uuid,
        key: &SymmetricKey,
        member: &ProjectMember,
    ) -> Result<WrappedKeyRecord> {
        let (public, method) = self.recipient_key(member)?;
        let wrapped = wrap_for_recipient(key, &public, method)?;
        Ok(WrappedKeyRecord::new(
            secret_id,
            member.wallet_address.clone(),
            wrapped,
        ))
    }

    // =========================================================================
    // CREATE
    // =========================================================================

    /// Encrypt a new secret and wrap its key for every current project member.
    ///
    /// All records are wrapped in memory before anything is written. If any
    /// write fails, everything already written is removed and
    /// [`Error::PartialWriteFailure`] is returned.
    ///
    /// Concurrent creates of the same name in the same environment are
    /// serialized; all but the first fail with [`Error::AlreadyExists`].
    pub async fn create_secret(&self, req: CreateSecretRequest) -> Result<Uuid> {
        if req.name.trim().is_empty() {
            return Err(Error::InvalidInput("secret name must not be empty".into()));
        }
        req.secret_type.validate(&req.plaintext)?;

        let key = (req.project_id, req.environment_id, req.name.clone());
        let guard = self.name_locks.acquire(&key).await;
        let result = self.create_locked(req).await;
        self.name_locks.release(&key, guard).await;
        result
    }

    async fn create_locked(&self, req: CreateSecretRequest) -> Result<Uuid> {
        let start = Instant::now();

        if self
            .store
            .find_secret_by_name(req.project_id, req.environment_id, &req.name)
            .await?
            .is_some()
        {
            return Err(Error::AlreadyExists(req.name));
        }

        let members = self.directory.list_project_members(req.project_id).await?;
        if !members.iter().any(|m| m.wallet_address == req.creator) {
            return Err(Error::NotAMember {
                project_id: req.project_id,
                wallet: req.creator,
            });
        }
        if members.len() > self.config.max_recipients {
            return Err(Error::InvalidInput(format!(
                "{} members exceeds the limit of {} recipients",
                members.len(),
                self.config.max_recipients
            )));
        }

        let key = SymmetricKey::generate();
        let payload = cipher::encrypt(&req.plaintext, &key)?;
        let now = Utc::now();
        let secret = Secret {
            id: Uuid::now_v7(),
            project_id: req.project_id,
            environment_id: req.environment_id,
            name: req.name,
            secret_type: req.secret_type,
            ciphertext: payload.ciphertext,
            iv: payload.iv,
            auth_tag: payload.auth_tag,
            created_at: now,
            updated_at: now,
        };

        let expected = members.len();
        let mut records = Vec::with_capacity(expected);
        for member in &members {
            match self.wrap_for_member(secret.id, &key, member) {
                Ok(record) => records.push(record),
                Err(e) => {
                    warn!(
                        subsystem = "vault",
                        op = "create",
                        secret_id = %secret.id,
                        wallet = %member.wallet_address,
                        error_kind = e.kind(),
                        "Wrapping failed, nothing persisted"
                    );
                    return Err(Error::PartialWriteFailure {
                        secret_id: secret.id,
                        written: 0,
                        expected,
                        reason: format!("{}: {}", member.wallet_address, e),
                    });
                }
            }
        }
        drop(key);

        self.persist_all(&secret, &records).await?;

        info!(
            subsystem = "vault",
            op = "create",
            secret_id = %secret.id,
            project_id = %secret.project_id,
            recipient_count = records.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Secret created"
        );
        Ok(secret.id)
    }

    async fn persist_all(&self, secret: &Secret, records: &[WrappedKeyRecord]) -> Result<()> {
        let expected = records.len();

        if let Err(e) = self.store.persist_secret(secret).await {
            self.rollback(secret.id, records).await;
            return Err(Error::PartialWriteFailure {
                secret_id: secret.id,
                written: 0,
                expected,
                reason: e.to_string(),
            });
        }

        let results = join_all(records.iter().map(|r| self.store.persist_wrapped_key(r))).await;
        let written = results.iter().filter(|r| r.is_ok()).count();

        if let Some(Err(e)) = results.into_iter().find(|r| r.is_err()) {
            self.rollback(secret.id, records).await;
            return Err(Error::PartialWriteFailure {
                secret_id: secret.id,
                written,
                expected,
                reason: e.to_string(),
            });
        }
        Ok(())
    }

    async fn rollback(&self, secret_id: Uuid, records: &[WrappedKeyRecord]) {
        let mut clean = true;
        for record in records {
            if let Err(e) = self
                .store
                .delete_wrapped_key(secret_id, &record.recipient_wallet)
                .await
            {
                clean = false;
                error!(
                    secret_id = %secret_id,
                    wallet = %record.recipient_wallet,
                    error = %e,
                    "Rollback failed to delete wrapped key"
                );
            }
        }
        if let Err(e) = self.store.delete_secret(secret_id).await {
            clean = false;
            error!(secret_id = %secret_id, error = %e, "Rollback failed to delete secret");
        }
        if clean {
            warn!(subsystem = "vault", secret_id = %secret_id, "Create rolled back");
        }
    }

    // =========================================================================
    // READ
    // =========================================================================

    async fn load_secret(&self, secret_id: Uuid) -> Result<Secret> {
        self.store
            .get_secret(secret_id)
            .await?
            .ok_or(Error::SecretNotFound(secret_id))
    }

    async fn unwrap_key<K>(
        &self,
        secret_id: Uuid,
        wallet: &WalletAddress,
        recipient: &K,
    ) -> Result<SymmetricKey>
    where
        K: RecipientKey + Sync,
    {
        let record = self
            .store
            .get_wrapped_key(secret_id, wallet)
            .await?
            .ok_or_else(|| Error::NoAccess {
                secret_id,
                wallet: wallet.clone(),
            })?;
        Ok(unwrap(&record.wrapped, recipient)?)
    }

    /// Decrypt a secret with a wallet signature over the derivation message.
    pub async fn decrypt_secret(
        &self,
        secret_id: Uuid,
        wallet: &WalletAddress,
        signature: &WalletSignature,
    ) -> Result<Vec<u8>> {
        let keypair = self.recipient_keypair(wallet, signature)?;
        self.decrypt_with_key(secret_id, wallet, &keypair).await
    }

    /// Decrypt a secret with already recovered recipient key material.
    pub async fn decrypt_with_key<K>(
        &self,
        secret_id: Uuid,
        wallet: &WalletAddress,
        recipient: &K,
    ) -> Result<Vec<u8>>
    where
        K: RecipientKey + Sync,
    {
        let secret = self.load_secret(secret_id).await?;
        let key = self.unwrap_key(secret_id, wallet, recipient).await?;
        let plaintext = cipher::decrypt(&secret.payload(), &key)?;

        debug!(op = "decrypt", secret_id = %secret_id, wallet = %wallet, "Secret decrypted");
        Ok(plaintext)
    }

    /// Wallets currently holding a record for this secret.
    pub async fn recipients(&self, secret_id: Uuid) -> Result<Vec<WalletAddress>> {
        self.load_secret(secret_id).await?;
        Ok(self
            .store
            .list_wrapped_keys(secret_id)
            .await?
            .into_iter()
            .map(|r| r.recipient_wallet)
            .collect())
    }

    /// Metadata of every secret this wallet can decrypt.
    pub async fn list_accessible_secrets(
        &self,
        wallet: &WalletAddress,
    ) -> Result<Vec<SecretSummary>> {
        let records = self.store.list_wrapped_keys_for_wallet(wallet).await?;
        let mut summaries = Vec::with_capacity(records.len());
        for record in records {
            if let Some(secret) = self.store.get_secret(record.secret_id).await? {
                summaries.push(secret.summary());
            }
        }
        summaries.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(summaries)
    }

    // =========================================================================
    // SHARE / REVOKE
    // =========================================================================

    /// Grant `recipient` access using a current holder's signature.
    ///
    /// The holder's record is unwrapped and the key re-wrapped for the
    /// recipient. The payload is not touched. An existing record for the
    /// recipient is replaced, which also upgrades converted-key records to
    /// the recipient's enrolled key.
    pub async fn share_secret(
        &self,
        secret_id: Uuid,
        holder: &WalletAddress,
        holder_signature: &WalletSignature,
        recipient: &WalletAddress,
    ) -> Result<()> {
        let keypair = self.recipient_keypair(holder, holder_signature)?;
        self.share_with_key(secret_id, holder, &keypair, recipient)
            .await
    }

    /// Share with already recovered holder key material.
    pub async fn share_with_key<K>(
        &self,
        secret_id: Uuid,
        holder: &WalletAddress,
        holder_key: &K,
        recipient: &WalletAddress,
    ) -> Result<()>
    where
        K: RecipientKey + Sync,
    {
        let _guard = self.locks.acquire(&secret_id).await;

        let secret = self.load_secret(secret_id).await?;
        let key = self.unwrap_key(secret_id, holder, holder_key).await?;

        let member = self
            .directory
            .get_member(secret.project_id, recipient)
            .await?
            .ok_or_else(|| Error::NotAMember {
                project_id: secret.project_id,
                wallet: recipient.clone(),
            })?;

        let record = self.wrap_for_member(secret_id, &key, &member)?;
        drop(key);

        if let Err(e) = self.store.persist_wrapped_key(&record).await {
            return Err(Error::PartialWriteFailure {
                secret_id,
                written: 0,
                expected: 1,
                reason: e.to_string(),
            });
        }

        info!(
            subsystem = "vault",
            op = "share",
            secret_id = %secret_id,
            wallet = %holder,
            recipient = %recipient,
            wrap_method = %record.method(),
            "Secret shared"
        );
        Ok(())
    }

    /// Remove a wallet's record for a secret.
    ///
    /// Idempotent. Does not rotate the secret's key: a member who kept the
    /// unwrapped key can still read the current ciphertext. Refuses to remove
    /// the last record.
    pub async fn revoke_secret(&self, secret_id: Uuid, wallet: &WalletAddress) -> Result<()> {
        let _guard = self.locks.acquire(&secret_id).await;
        self.load_secret(secret_id).await?;
        self.revoke_locked(secret_id, wallet).await
    }

    async fn revoke_locked(&self, secret_id: Uuid, wallet: &WalletAddress) -> Result<()> {
        let records = self.store.list_wrapped_keys(secret_id).await?;
        if !records.iter().any(|r| &r.recipient_wallet == wallet) {
            debug!(secret_id = %secret_id, wallet = %wallet, "Nothing to revoke");
            return Ok(());
        }
        if records.len() == 1 {
            return Err(Error::LastRecipient(secret_id));
        }

        self.store.delete_wrapped_key(secret_id, wallet).await?;

        info!(
            subsystem = "vault",
            op = "revoke",
            secret_id = %secret_id,
            wallet = %wallet,
            "Access revoked"
        );
        Ok(())
    }

    /// Revoke every record a wallet holds within a project.
    ///
    /// Locks every affected secret first, then fails with
    /// [`Error::LastRecipient`] before changing anything if the wallet is the
    /// only holder of any of them.
    pub async fn remove_member(&self, project_id: Uuid, wallet: &WalletAddress) -> Result<usize> {
        let mut candidates = Vec::new();
        for secret in self.store.list_secrets(project_id).await? {
            if self.store.get_wrapped_key(secret.id, wallet).await?.is_some() {
                candidates.push(secret.id);
            }
        }

        // Sorted acquisition keeps concurrent removals deadlock free
        candidates.sort();
        let mut guards = Vec::with_capacity(candidates.len());
        for secret_id in &candidates {
            guards.push(self.locks.acquire(secret_id).await);
        }

        let mut targets = Vec::with_capacity(candidates.len());
        for secret_id in candidates {
            let records = self.store.list_wrapped_keys(secret_id).await?;
            if !records.iter().any(|r| &r.recipient_wallet == wallet) {
                continue;
            }
            if records.len() == 1 {
                return Err(Error::LastRecipient(secret_id));
            }
            targets.push(secret_id);
        }

        for secret_id in &targets {
            self.store.delete_wrapped_key(*secret_id, wallet).await?;
            debug!(secret_id = %secret_id, wallet = %wallet, "Access revoked");
        }
        drop(guards);

        info!(
            subsystem = "vault",
            op = "remove_member",
            project_id = %project_id,
            wallet = %wallet,
            result_count = targets.len(),
            "Member access removed"
        );
        Ok(targets.len())
    }

    // =========================================================================
    // ROTATE / DELETE
    // =========================================================================

    /// Replace a secret's value, keeping its key and its records.
    pub async fn rotate_secret(
        &self,
        secret_id: Uuid,
        wallet: &WalletAddress,
        signature: &WalletSignature,
        new_plaintext: &[u8],
    ) -> Result<()> {
        let keypair = self.recipient_keypair(wallet, signature)?;
        self.rotate_with_key(secret_id, wallet, &keypair, new_plaintext)
            .await
    }

    /// Rotate with already recovered key material.
    pub async fn rotate_with_key<K>(
        &self,
        secret_id: Uuid,
        wallet: &WalletAddress,
        recipient: &K,
        new_plaintext: &[u8],
    ) -> Result<()>
    where
        K: RecipientKey + Sync,
    {
        let _guard = self.locks.acquire(&secret_id).await;

        let mut secret = self.load_secret(secret_id).await?;
        secret.secret_type.validate(new_plaintext)?;

        let key = self.unwrap_key(secret_id, wallet, recipient).await?;
        let payload = cipher::encrypt(new_plaintext, &key)?;
        drop(key);

        secret.set_payload(payload);
        secret.updated_at = Utc::now();
        self.store.persist_secret(&secret).await?;

        info!(
            subsystem = "vault",
            op = "rotate",
            secret_id = %secret_id,
            wallet = %wallet,
            "Secret value rotated"
        );
        Ok(())
    }

    /// Delete a secret and every record for it.
    pub async fn delete_secret(&self, secret_id: Uuid) -> Result<()> {
        let guard = self.locks.acquire(&secret_id).await;
        let result = self.delete_locked(secret_id).await;
        self.locks.release(&secret_id, guard).await;
        result?;

        info!(subsystem = "vault", op = "delete", secret_id = %secret_id, "Secret deleted");
        Ok(())
    }

    async fn delete_locked(&self, secret_id: Uuid) -> Result<()> {
        self.load_secret(secret_id).await?;
        for record in self.store.list_wrapped_keys(secret_id).await? {
            self.store
                .delete_wrapped_key(secret_id, &record.recipient_wallet)
                .await?;
        }
        self.store.delete_secret(secret_id).await?;
        Ok(())
    }
}

impl std::fmt::Debug for AccessProtocol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessProtocol")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
