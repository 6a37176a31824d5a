//! solkey-keytool: command-line access to SolKey key derivation and wrapping.
//!
//! Useful for inspecting stored records and for scripting with a local
//! wallet keypair. All output is JSON on stdout; logs go to stderr.

use clap::{Parser, Subcommand, ValueEnum};
use solkey_crypto::{
    address_to_x25519, cipher, unwrap, wrap_for_recipient, ConvertedKeypair, Encoding,
    EncryptedPayload, EncryptionPublicKey, SignatureKeyDeriver, SymmetricKey, WalletAddress,
    WalletKeypair, WalletSignature, WrapMethod, WrappedKey, DERIVATION_MESSAGE,
};
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "solkey-keytool")]
#[command(author, version, about = "Wallet-derived key tooling for SolKey")]
#[command(propagate_version = true)]
struct Cli {
    /// Encoding for binary fields given on the command line
    #[arg(long, value_enum, default_value = "base64", global = true)]
    encoding: WireEncoding,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum WireEncoding {
    Hex,
    Base64,
}

impl From<WireEncoding> for Encoding {
    fn from(value: WireEncoding) -> Self {
        match value {
            WireEncoding::Hex => Encoding::Hex,
            WireEncoding::Base64 => Encoding::Base64,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a local wallet keypair
    WalletNew,

    /// Sign a message with a local wallet
    Sign {
        /// Wallet secret seed (hex)
        #[arg(short, long, env = "SOLKEY_WALLET_SECRET")]
        secret: String,

        /// Message to sign
        #[arg(short, long, env = "SOLKEY_DERIVATION_MESSAGE", default_value = DERIVATION_MESSAGE)]
        message: String,
    },

    /// Derive the enrollment public key from a derivation signature
    Enroll {
        /// Signature over the derivation message
        #[arg(short, long)]
        signature: String,
    },

    /// Convert a wallet address to its X25519 wrapping key
    Convert {
        /// Base58 wallet address
        address: String,
    },

    /// Encrypt a value under a fresh per-secret key
    Encrypt {
        /// Plaintext value
        #[arg(short, long)]
        plaintext: String,
    },

    /// Decrypt a value with its per-secret key
    Decrypt {
        #[arg(short, long)]
        key: String,
        #[arg(short, long)]
        ciphertext: String,
        #[arg(short, long)]
        iv: String,
        #[arg(short, long)]
        auth_tag: String,
    },

    /// Wrap a per-secret key for one recipient
    Wrap {
        /// Per-secret key
        #[arg(short, long)]
        key: String,

        /// Recipient X25519 public key (base64)
        #[arg(short, long)]
        recipient: String,

        /// Wrap for a converted wallet key instead of an enrolled key
        #[arg(long)]
        converted: bool,
    },

    /// Open a wrapped-key record (JSON)
    Unwrap {
        /// Wrapped-key record as produced by `wrap`
        #[arg(short, long)]
        record: String,

        /// Signature over the derivation message
        #[arg(short, long, conflicts_with = "wallet_secret")]
        signature: Option<String>,

        /// Wallet secret seed (hex), for converted-key records
        #[arg(short, long)]
        wallet_secret: Option<String>,
    },
}

fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn init_tracing() {
    // LOG_FORMAT - "json" or "text" (default: "text")
    // RUST_LOG   - standard env filter (default: "solkey_crypto=info")
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "solkey_crypto=info".into());

    let registry = tracing_subscriber::registry().with(env_filter);
    if log_format == "json" {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let encoding = Encoding::from(cli.encoding);

    let output = match cli.command {
        Commands::WalletNew => cmd_wallet_new(),
        Commands::Sign { secret, message } => cmd_sign(&secret, &message, encoding)?,
        Commands::Enroll { signature } => cmd_enroll(&signature, encoding)?,
        Commands::Convert { address } => cmd_convert(&address)?,
        Commands::Encrypt { plaintext } => cmd_encrypt(&plaintext, encoding)?,
        Commands::Decrypt {
            key,
            ciphertext,
            iv,
            auth_tag,
        } => cmd_decrypt(&key, &ciphertext, &iv, &auth_tag, encoding)?,
        Commands::Wrap {
            key,
            recipient,
            converted,
        } => cmd_wrap(&key, &recipient, converted, encoding)?,
        Commands::Unwrap {
            record,
            signature,
            wallet_secret,
        } => cmd_unwrap(&record, signature.as_deref(), wallet_secret.as_deref(), encoding)?,
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn load_wallet(secret_hex: &str) -> Result<WalletKeypair, Box<dyn std::error::Error>> {
    let secret = Encoding::Hex.decode_array::<32>("wallet_secret", secret_hex)?;
    Ok(WalletKeypair::from_secret_bytes(secret))
}

fn cmd_wallet_new() -> serde_json::Value {
    let wallet = WalletKeypair::generate();
    serde_json::json!({
        "address": wallet.address().to_string(),
        "secret": Encoding::Hex.encode(&wallet.secret_bytes()),
    })
}

fn cmd_sign(
    secret_hex: &str,
    message: &str,
    encoding: Encoding,
) -> Result<serde_json::Value, Box<dyn std::error::Error>> {
    let wallet = load_wallet(secret_hex)?;
    let signature = wallet.sign(message.as_bytes());

    Ok(serde_json::json!({
        "address": wallet.address().to_string(),
        "message": message,
        "signature": encoding.encode(signature.as_bytes()),
    }))
}

fn cmd_enroll(
    signature: &str,
    encoding: Encoding,
) -> Result<serde_json::Value, Box<dyn std::error::Error>> {
    let signature = WalletSignature::decode(signature, encoding)?;
    let keypair = SignatureKeyDeriver::default().derive_recipient_keypair(signature.as_bytes())?;
    tracing::info!(key_fp = %keypair.public.fingerprint(), "Derived enrollment key");

    Ok(serde_json::json!({
        "encryption_public_key": keypair.public.to_base64(),
        "fingerprint": keypair.public.fingerprint(),
    }))
}

fn cmd_convert(address: &str) -> Result<serde_json::Value, Box<dyn std::error::Error>> {
    let address: WalletAddress = address.parse()?;
    let key = address_to_x25519(&address)?;

    Ok(serde_json::json!({
        "address": address.to_string(),
        "encryption_public_key": key.to_base64(),
        "fingerprint": key.fingerprint(),
    }))
}

fn cmd_encrypt(
    plaintext: &str,
    encoding: Encoding,
) -> Result<serde_json::Value, Box<dyn std::error::Error>> {
    let key = SymmetricKey::generate();
    let payload = cipher::encrypt(plaintext.as_bytes(), &key)?;

    Ok(serde_json::json!({
        "key": encoding.encode(key.as_bytes()),
        "ciphertext": encoding.encode(&payload.ciphertext),
        "iv": encoding.encode(&payload.iv),
        "auth_tag": encoding.encode(&payload.auth_tag),
        "encoding": encoding.to_string(),
    }))
}

fn cmd_decrypt(
    key: &str,
    ciphertext: &str,
    iv: &str,
    auth_tag: &str,
    encoding: Encoding,
) -> Result<serde_json::Value, Box<dyn std::error::Error>> {
    let key = SymmetricKey::from_bytes(encoding.decode_array("key", key)?);
    let payload = EncryptedPayload::from_encoded(ciphertext, iv, auth_tag, encoding)?;
    let plaintext = cipher::decrypt(&payload, &key)?;

    Ok(serde_json::json!({
        "plaintext": String::from_utf8_lossy(&plaintext),
    }))
}

fn cmd_wrap(
    key: &str,
    recipient: &str,
    converted: bool,
    encoding: Encoding,
) -> Result<serde_json::Value, Box<dyn std::error::Error>> {
    let key = SymmetricKey::from_bytes(encoding.decode_array("key", key)?);
    let recipient = EncryptionPublicKey::from_base64(recipient)?;
    let method = if converted {
        WrapMethod::ConvertedWalletKey
    } else {
        WrapMethod::SignatureDerived
    };

    let wrapped = wrap_for_recipient(&key, &recipient, method)?;
    tracing::debug!(key_fp = %recipient.fingerprint(), wrap_method = %method, "Wrapped key");

    Ok(serde_json::to_value(&wrapped)?)
}

fn cmd_unwrap(
    record: &str,
    signature: Option<&str>,
    wallet_secret: Option<&str>,
    encoding: Encoding,
) -> Result<serde_json::Value, Box<dyn std::error::Error>> {
    let wrapped: WrappedKey = serde_json::from_str(record)?;

    let key = match (signature, wallet_secret) {
        (Some(signature), _) => {
            let signature = WalletSignature::decode(signature, encoding)?;
            let keypair =
                SignatureKeyDeriver::default().derive_recipient_keypair(signature.as_bytes())?;
            unwrap(&wrapped, &keypair)?
        }
        (None, Some(secret)) => {
            let wallet = load_wallet(secret)?;
            unwrap(&wrapped, &ConvertedKeypair::from_wallet(&wallet))?
        }
        (None, None) => return Err("either --signature or --wallet-secret is required".into()),
    };

    Ok(serde_json::json!({
        "key": encoding.encode(key.as_bytes()),
        "method": wrapped.method,
    }))
}
