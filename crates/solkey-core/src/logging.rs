//! Structured logging field name constants for SolKey.
//!
//! Every crate logs with these names so log queries work across the
//! vault, the session layer and the CLI.
//!
//! ## Log Level Contract
//!
//! | Level | Usage |
//! |-------|-------|
//! | ERROR | Rollback failed, state may need operator attention |
//! | WARN  | Recoverable issue, automatic fallback applied |
//! | INFO  | Secret lifecycle events (create, share, revoke, delete) |
//! | DEBUG | Decision points, wrap method choices |
//! | TRACE | Per-recipient iteration |
//!
//! Key material and plaintext are never logged. Public keys are logged as
//! their fingerprint under [`KEY_FINGERPRINT`].

// ─── Identity fields ───────────────────────────────────────────────────────

/// Subsystem originating the log event.
/// Values: "vault", "session", "keytool"
pub const SUBSYSTEM: &str = "subsystem";

/// Logical operation name.
/// Examples: "create", "share", "revoke", "decrypt", "rotate"
pub const OPERATION: &str = "op";

// ─── Entity fields ─────────────────────────────────────────────────────────

/// Secret UUID being operated on.
pub const SECRET_ID: &str = "secret_id";

/// Project UUID.
pub const PROJECT_ID: &str = "project_id";

/// Wallet address acting or being acted on.
pub const WALLET: &str = "wallet";

/// Recipient wallet of a share.
pub const RECIPIENT: &str = "recipient";

// ─── Crypto fields ─────────────────────────────────────────────────────────

/// BLAKE3 fingerprint of a public key.
pub const KEY_FINGERPRINT: &str = "key_fp";

/// Wrap method of a record.
pub const WRAP_METHOD: &str = "wrap_method";

// ─── Measurement fields ────────────────────────────────────────────────────

/// Number of recipients wrapped.
pub const RECIPIENT_COUNT: &str = "recipient_count";

/// Number of records affected by a bulk operation.
pub const RESULT_COUNT: &str = "result_count";

/// Wall-clock duration in milliseconds.
pub const DURATION_MS: &str = "duration_ms";

/// Failure kind from `Error::kind`.
pub const ERROR_KIND: &str = "error_kind";
