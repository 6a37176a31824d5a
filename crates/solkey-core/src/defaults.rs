//! Centralized defaults and environment configuration for SolKey.
//!
//! **This module is the single source of truth** for shared default values.
//! Other crates reference these constants instead of defining their own.

use solkey_crypto::{KdfParams, DERIVATION_MESSAGE};

// =============================================================================
// KEY DERIVATION
// =============================================================================

/// Message every wallet signs to recover its decryption keypair.
///
/// Changing this for an existing deployment makes every previously wrapped
/// signature-derived record unreachable.
pub const DEFAULT_DERIVATION_MESSAGE: &str = DERIVATION_MESSAGE;

/// Smallest Argon2 memory cost accepted from the environment (KiB).
pub const MIN_KDF_MEMORY_KIB: u32 = 8 * 1024;

// =============================================================================
// ACCESS
// =============================================================================

/// Maximum number of recipients wrapped in a single create.
pub const MAX_RECIPIENTS: usize = 256;

/// Whether members without an enrolled key get a converted-key record.
pub const CONVERTED_FALLBACK: bool = true;

/// Vault configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VaultConfig {
    /// Message signed to derive recipient keypairs.
    pub derivation_message: String,
    /// Argon2id parameters for vault keys.
    pub kdf: KdfParams,
    /// Upper bound on recipients per secret at create time.
    pub max_recipients: usize,
    /// Wrap to the converted wallet key when a member has not enrolled.
    /// When false such members are reported as a partial write.
    pub converted_fallback: bool,
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            derivation_message: DEFAULT_DERIVATION_MESSAGE.to_string(),
            kdf: KdfParams::default(),
            max_recipients: MAX_RECIPIENTS,
            converted_fallback: CONVERTED_FALLBACK,
        }
    }
}

impl VaultConfig {
    /// Load configuration from environment variables.
    ///
    /// | Variable | Default |
    /// |----------|---------|
    /// | `SOLKEY_DERIVATION_MESSAGE` | `derive-decryption-key` |
    /// | `SOLKEY_KDF_PROFILE` | `default` (or `low_memory`) |
    /// | `SOLKEY_KDF_MEMORY_KIB` | 65536 |
    /// | `SOLKEY_KDF_ITERATIONS` | 3 |
    /// | `SOLKEY_KDF_PARALLELISM` | 4 |
    /// | `SOLKEY_MAX_RECIPIENTS` | 256 |
    /// | `SOLKEY_CONVERTED_FALLBACK` | true |
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(val) = lookup("SOLKEY_DERIVATION_MESSAGE") {
            if val.trim().is_empty() {
                tracing::warn!("Empty SOLKEY_DERIVATION_MESSAGE, using default");
            } else {
                config.derivation_message = val;
            }
        }

        // Profile first so the individual overrides below apply on top of it
        if let Some(val) = lookup("SOLKEY_KDF_PROFILE") {
            match val.as_str() {
                "default" => config.kdf = KdfParams::default(),
                "low_memory" => config.kdf = KdfParams::low_memory(),
                _ => tracing::warn!(value = %val, "Unknown SOLKEY_KDF_PROFILE, using default"),
            }
        }

        if let Some(val) = lookup("SOLKEY_KDF_MEMORY_KIB") {
            match val.parse::<u32>() {
                Ok(m) if m >= MIN_KDF_MEMORY_KIB => config.kdf.memory_kib = m,
                _ => tracing::warn!(value = %val, "Invalid SOLKEY_KDF_MEMORY_KIB, using default"),
            }
        }

        if let Some(val) = lookup("SOLKEY_KDF_ITERATIONS") {
            match val.parse::<u32>() {
                Ok(t) if t >= 1 => config.kdf.iterations = t,
                _ => tracing::warn!(value = %val, "Invalid SOLKEY_KDF_ITERATIONS, using default"),
            }
        }

        if let Some(val) = lookup("SOLKEY_KDF_PARALLELISM") {
            match val.parse::<u32>() {
                Ok(p) if p >= 1 => config.kdf.parallelism = p.min(16),
                _ => tracing::warn!(value = %val, "Invalid SOLKEY_KDF_PARALLELISM, using default"),
            }
        }

        if let Some(val) = lookup("SOLKEY_MAX_RECIPIENTS") {
            match val.parse::<usize>() {
                Ok(n) if n >= 1 => config.max_recipients = n,
                _ => tracing::warn!(value = %val, "Invalid SOLKEY_MAX_RECIPIENTS, using default"),
            }
        }

        if let Some(val) = lookup("SOLKEY_CONVERTED_FALLBACK") {
            config.converted_fallback = val != "false" && val != "0";
        }

        config
    }
}
