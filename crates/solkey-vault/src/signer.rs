//! Wallet signer backed by a locally held keypair.

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use solkey_core::{Error, Result, WalletSigner};
use solkey_crypto::{WalletAddress, WalletKeypair, WalletSignature};

/// Signs with a [`WalletKeypair`] in process memory.
///
/// Stands in for a browser wallet in tests and scripts. `disconnect` makes
/// every later signature request fail with `WalletUnavailable`.
#[derive(Debug)]
pub struct LocalSigner {
    wallet: WalletKeypair,
    connected: AtomicBool,
}

impl LocalSigner {
    pub fn new(wallet: WalletKeypair) -> Self {
        Self {
            wallet,
            connected: AtomicBool::new(true),
        }
    }

    pub fn wallet(&self) -> &WalletKeypair {
        &self.wallet
    }

    pub fn disconnect(&self) {
        self.connected.store(false, Ordering::SeqCst);
    }

    pub fn reconnect(&self) {
        self.connected.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl WalletSigner for LocalSigner {
    fn address(&self) -> WalletAddress {
        self.wallet.address()
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    async fn sign_message(&self, message: &[u8]) -> Result<WalletSignature> {
        if !self.is_connected() {
            return Err(Error::WalletUnavailable("wallet disconnected".into()));
        }
        Ok(self.wallet.sign(message))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_sign_while_connected() {
        let signer = LocalSigner::new(WalletKeypair::generate());
        let sig = signer.sign_message(b"m").await.unwrap();
        assert!(sig.verify(&signer.address(), b"m").is_ok());
    }

    #[tokio::test]
    async fn test_disconnect_makes_wallet_unavailable() {
        let signer = LocalSigner::new(WalletKeypair::generate());
        signer.disconnect();
        assert!(matches!(
            signer.sign_message(b"m").await,
            Err(Error::WalletUnavailable(_))
        ));
        signer.reconnect();
        assert!(signer.sign_message(b"m").await.is_ok());
    }
}
