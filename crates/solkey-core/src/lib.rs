//! # solkey-core
//!
//! Core types, traits, and abstractions for SolKey.
//!
//! This crate provides the domain models, the error taxonomy, and the
//! collaborator traits (membership, wallet signing, storage) that the vault
//! is built against.

pub mod defaults;
pub mod error;
pub mod logging;
pub mod models;
pub mod traits;

// Re-export commonly used types at crate root
pub use defaults::VaultConfig;
pub use error::{Error, Result};
pub use models::*;
pub use traits::*;
