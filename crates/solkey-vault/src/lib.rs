//! # solkey-vault
//!
//! Multi-recipient access protocol for SolKey secrets.
//!
//! [`AccessProtocol`] runs the secret lifecycle against the collaborator
//! traits from `solkey-core`. [`Session`] caches signature-derived keys for
//! one connected wallet. [`MemoryStore`], [`MemoryDirectory`] and
//! [`LocalSigner`] are in-process implementations of those collaborators.
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use solkey_core::{CreateSecretRequest, ProjectMember, SecretType, VaultConfig};
//! use solkey_crypto::{KdfParams, WalletKeypair};
//! use solkey_vault::{AccessProtocol, MemoryDirectory, MemoryStore};
//! use uuid::Uuid;
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let directory = Arc::new(MemoryDirectory::new());
//! let config = VaultConfig { kdf: KdfParams::insecure_fast(), ..VaultConfig::default() };
//! let vault = AccessProtocol::new(Arc::new(MemoryStore::new()), directory.clone(), config);
//!
//! let alice = WalletKeypair::generate();
//! let project = Uuid::now_v7();
//! directory.add_member(project, ProjectMember::new(alice.address())).await;
//!
//! let signature = alice.sign(vault.config().derivation_message.as_bytes());
//! vault.enroll_member(project, &alice.address(), &signature).await.unwrap();
//!
//! let id = vault
//!     .create_secret(CreateSecretRequest {
//!         project_id: project,
//!         environment_id: Uuid::now_v7(),
//!         name: "DB_URL".into(),
//!         secret_type: SecretType::String,
//!         plaintext: b"postgres://x".to_vec(),
//!         creator: alice.address(),
//!     })
//!     .await
//!     .unwrap();
//!
//! let plaintext = vault.decrypt_secret(id, &alice.address(), &signature).await.unwrap();
//! assert_eq!(plaintext, b"postgres://x");
//! # });
//! ```

pub mod memory;
pub mod protocol;
pub mod session;
pub mod signer;

pub use memory::{MemoryDirectory, MemoryStore};
pub use protocol::AccessProtocol;
pub use session::Session;
pub use signer::LocalSigner;
