//! # solkey-crypto
//!
//! Cryptographic primitives for SolKey.
//!
//! Secrets are encrypted once with a random per-secret key, and that key is
//! wrapped separately for every member allowed to read the secret. Members
//! never hand over a private key: their unwrapping key is recovered from a
//! wallet signature over a fixed message.
//!
//! ## Cryptographic Primitives
//!
//! - **Payload cipher**: AES-256-GCM, 96-bit random IV, detached 128-bit tag
//! - **Key wrapping**: X25519 + XSalsa20-Poly1305 box with an ephemeral sender key
//! - **Recipient keys**: X25519 seeded from an Ed25519 wallet signature
//! - **Vault key**: Argon2id over `message || signature`
//! - **Key conversion**: Ed25519 to X25519 birational map
//!
//! ## Examples
//!
//! ### Wrap a key for a wallet and open it again
//!
//! ```rust
//! use solkey_crypto::{
//!     cipher, unwrap, wrap_for_recipient, SignatureKeyDeriver, SymmetricKey, WalletKeypair,
//!     WrapMethod, DERIVATION_MESSAGE,
//! };
//!
//! let wallet = WalletKeypair::generate();
//! let signature = wallet.sign(DERIVATION_MESSAGE.as_bytes());
//! let keypair = SignatureKeyDeriver::default()
//!     .derive_recipient_keypair(signature.as_bytes())
//!     .unwrap();
//!
//! let key = SymmetricKey::generate();
//! let payload = cipher::encrypt(b"postgres://x", &key).unwrap();
//! let wrapped = wrap_for_recipient(&key, &keypair.public, WrapMethod::SignatureDerived).unwrap();
//!
//! let recovered = unwrap(&wrapped, &keypair).unwrap();
//! assert_eq!(cipher::decrypt(&payload, &recovered).unwrap(), b"postgres://x");
//! ```
//!
//! ### Convert a wallet address
//!
//! ```rust
//! use solkey_crypto::{address_to_x25519, WalletKeypair};
//!
//! let wallet = WalletKeypair::generate();
//! let encryption_key = address_to_x25519(&wallet.address()).unwrap();
//! println!("{}", encryption_key.to_base64());
//! ```

pub mod cipher;
pub mod convert;
pub mod derive;
pub mod encoding;
pub mod error;
pub mod keys;
pub mod wallet;
pub mod wrap;

// Re-export commonly used types
pub use cipher::EncryptedPayload;
pub use convert::{
    address_to_x25519, public_key_to_x25519, signing_key_to_x25519, try_public_key_to_x25519,
    ConvertedKeypair,
};
pub use derive::{KdfParams, SignatureKeyDeriver, VaultKey, DERIVATION_MESSAGE};
pub use encoding::Encoding;
pub use error::{CryptoError, CryptoResult};
pub use keys::{DerivedKeypair, EncryptionPublicKey, EncryptionSecretKey, SymmetricKey};
pub use wallet::{WalletAddress, WalletKeypair, WalletSignature};
pub use wrap::{unwrap, wrap_for_recipient, RecipientKey, WrapMethod, WrappedKey};
