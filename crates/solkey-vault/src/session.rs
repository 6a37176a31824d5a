//! Wallet session holding signature-derived key material.
//!
//! Opening a session asks the wallet for one signature and derives both the
//! recipient keypair and the vault key from it. Later operations reuse the
//! cached keys instead of prompting again.
//!
//! Key material lives only inside the session. `close` drops it, and every
//! operation checks the wallet is still connected first, closing the session
//! if it is not. Dropping the `open` future while the wallet prompt is pending
//! leaves nothing behind.

use std::sync::Arc;

use solkey_core::{Error, Result, WalletSigner};
use solkey_crypto::{DerivedKeypair, EncryptedPayload, EncryptionPublicKey, VaultKey, WalletAddress};
use tracing::info;
use uuid::Uuid;

use crate::protocol::AccessProtocol;

struct SessionKeys {
    keypair: DerivedKeypair,
    vault_key: VaultKey,
}

/// Authenticated wallet session.
pub struct Session {
    signer: Arc<dyn WalletSigner>,
    wallet: WalletAddress,
    keys: Option<SessionKeys>,
}

impl Session {
    /// Request the derivation signature and derive session keys.
    pub async fn open(signer: Arc<dyn WalletSigner>, protocol: &AccessProtocol) -> Result<Self> {
        if !signer.is_connected() {
            return Err(Error::WalletUnavailable("wallet not connected".into()));
        }

        let wallet = signer.address();
        let message = protocol.config().derivation_message.as_bytes();
        let signature = signer.sign_message(message).await?;

        let keypair = protocol.recipient_keypair(&wallet, &signature)?;
        let vault_key = protocol
            .deriver()
            .derive_vault_key(message, signature.as_bytes())?;

        info!(
            subsystem = "session",
            wallet = %wallet,
            key_fp = %keypair.public.fingerprint(),
            "Session opened"
        );

        Ok(Self {
            signer,
            wallet,
            keys: Some(SessionKeys { keypair, vault_key }),
        })
    }

    pub fn wallet(&self) -> &WalletAddress {
        &self.wallet
    }

    pub fn is_open(&self) -> bool {
        self.keys.is_some()
    }

    /// Public key to publish at enrollment.
    pub fn public_key(&self) -> Result<EncryptionPublicKey> {
        self.keys
            .as_ref()
            .map(|k| k.keypair.public)
            .ok_or(Error::SessionClosed)
    }

    /// Drop all cached key material.
    pub fn close(&mut self) {
        if self.keys.take().is_some() {
            info!(subsystem = "session", wallet = %self.wallet, "Session closed");
        }
    }

    fn keys(&mut self) -> Result<&SessionKeys> {
        if !self.signer.is_connected() {
            self.close();
        }
        self.keys.as_ref().ok_or(Error::SessionClosed)
    }

    /// Publish this session's key for `project_id`.
    pub async fn enroll(&mut self, protocol: &AccessProtocol, project_id: Uuid) -> Result<()> {
        let public = self.keys()?.keypair.public;
        protocol.publish_key(project_id, &self.wallet, public).await
    }

    pub async fn decrypt(&mut self, protocol: &AccessProtocol, secret_id: Uuid) -> Result<Vec<u8>> {
        let wallet = self.wallet.clone();
        let keys = self.keys()?;
        protocol
            .decrypt_with_key(secret_id, &wallet, &keys.keypair)
            .await
    }

    pub async fn share(
        &mut self,
        protocol: &AccessProtocol,
        secret_id: Uuid,
        recipient: &WalletAddress,
    ) -> Result<()> {
        let wallet = self.wallet.clone();
        let keys = self.keys()?;
        protocol
            .share_with_key(secret_id, &wallet, &keys.keypair, recipient)
            .await
    }

    pub async fn rotate(
        &mut self,
        protocol: &AccessProtocol,
        secret_id: Uuid,
        new_plaintext: &[u8],
    ) -> Result<()> {
        let wallet = self.wallet.clone();
        let keys = self.keys()?;
        protocol
            .rotate_with_key(secret_id, &wallet, &keys.keypair, new_plaintext)
            .await
    }

    /// Seal data only this wallet can read.
    pub fn seal_personal(&mut self, plaintext: &[u8]) -> Result<EncryptedPayload> {
        Ok(self.keys()?.vault_key.encrypt(plaintext)?)
    }

    /// Open data sealed by [`Session::seal_personal`].
    pub fn open_personal(&mut self, payload: &EncryptedPayload) -> Result<Vec<u8>> {
        Ok(self.keys()?.vault_key.decrypt(payload)?)
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("wallet", &self.wallet)
            .field("open", &self.is_open())
            .finish()
    }
}
