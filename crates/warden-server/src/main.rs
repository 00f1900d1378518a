//! Warden operator binary.
//!
//! # Usage
//!
//! ```bash
//! # Create a server identity
//! warden keygen --out ./keys
//!
//! # Secrets are read from WARDEN_* variables when not given as flags
//! export WARDEN_SESSION_SECRET=... WARDEN_NONCE_SUFFIX=...
//! export WARDEN_AT_REST_PASSPHRASE=... WARDEN_AT_REST_IV=...
//!
//! warden --key ./keys/private.pem --store ./warden.redb login alice
//! warden --key ./keys/private.pem --store ./warden.redb open "$(cat request.json)"
//! ```

use std::{io::Write, path::PathBuf, time::Duration};

use clap::{Parser, Subcommand};
use serde_json::Value;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};
use warden_core::{IssueContext, SessionPolicy};
use warden_crypto::MIN_RSA_BITS;
use warden_server::{Secrets, ServerError, SystemEnv, WardenConfig, commands};

/// Warden security boundary
#[derive(Parser, Debug)]
#[command(name = "warden")]
#[command(about = "Session credentials, nonces and envelopes for the Warden boundary")]
#[command(version)]
struct Args {
    /// Path to the server RSA private key (PEM)
    #[arg(long, global = true, env = "WARDEN_KEY", default_value = "private.pem")]
    key: PathBuf,

    /// Path to the Redb store file
    #[arg(long, global = true, env = "WARDEN_STORE", default_value = "warden.redb")]
    store: PathBuf,

    /// HMAC secret for session credentials
    #[arg(long, global = true, env = "WARDEN_SESSION_SECRET", hide_env_values = true, default_value = "")]
    session_secret: String,

    /// Secret suffix for nonce store keys
    #[arg(long, global = true, env = "WARDEN_NONCE_SUFFIX", hide_env_values = true, default_value = "")]
    nonce_suffix: String,

    /// Passphrase for the at-rest field codec
    #[arg(
        long,
        global = true,
        env = "WARDEN_AT_REST_PASSPHRASE",
        hide_env_values = true,
        default_value = ""
    )]
    at_rest_passphrase: String,

    /// IV seed for the at-rest field codec
    #[arg(long, global = true, env = "WARDEN_AT_REST_IV", hide_env_values = true, default_value = "")]
    at_rest_iv: String,

    /// Session lifetime in seconds
    #[arg(long, global = true, default_value = "604800")]
    session_lifetime: u64,

    /// Sliding refresh window in seconds
    #[arg(long, global = true, default_value = "86400")]
    refresh_window: u64,

    /// Maximum credentials per account
    #[arg(long, global = true, default_value = "5")]
    max_credentials: usize,

    /// Nonce lifetime in seconds
    #[arg(long, global = true, default_value = "300")]
    nonce_ttl: u64,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate a server key pair
    Keygen {
        /// Output directory
        #[arg(long, default_value = ".")]
        out: PathBuf,
        /// RSA modulus size
        #[arg(long, default_value_t = MIN_RSA_BITS)]
        bits: usize,
        /// Replace existing key files
        #[arg(long)]
        force: bool,
    },
    /// Print the server public key as hex-encoded PEM
    PublicKey,
    /// Issue a nonce
    Nonce,
    /// Issue a session credential
    Login {
        /// Account id
        account: String,
        #[command(flatten)]
        context: ContextArgs,
    },
    /// Verify a session token
    Verify {
        /// Wire token
        token: String,
    },
    /// Revoke a session token
    Revoke {
        /// Wire token
        token: String,
    },
    /// Exchange a session token for a new one
    Refresh {
        /// Wire token
        token: String,
        #[command(flatten)]
        context: ContextArgs,
    },
    /// List an account's credentials
    Sessions {
        /// Account id
        account: String,
    },
    /// Revoke every credential of an account
    LogoutAll {
        /// Account id
        account: String,
    },
    /// Encrypt a field value for storage
    Seal {
        /// Plaintext field value
        plaintext: String,
    },
    /// Decrypt a stored field value
    Unseal {
        /// Base64 ciphertext
        ciphertext: String,
    },
    /// Run the request boundary on a body
    Open {
        /// Request body: {"ciphertext": "<hex>"}
        body: String,
    },
}

#[derive(clap::Args, Debug)]
struct ContextArgs {
    /// Client device description
    #[arg(long)]
    device: Option<String>,
    /// Client address
    #[arg(long)]
    ip: Option<String>,
}

impl From<ContextArgs> for IssueContext {
    fn from(args: ContextArgs) -> Self {
        Self { device_info: args.device, source_ip: args.ip }
    }
}

impl Args {
    fn config(&self) -> WardenConfig {
        WardenConfig {
            key_path: self.key.clone(),
            store_path: self.store.clone(),
            secrets: Secrets {
                session_secret: self.session_secret.clone(),
                nonce_suffix: self.nonce_suffix.clone(),
                at_rest_passphrase: self.at_rest_passphrase.clone(),
                at_rest_iv: self.at_rest_iv.clone(),
            },
            session_policy: SessionPolicy {
                lifetime: Duration::from_secs(self.session_lifetime),
                refresh_window: Duration::from_secs(self.refresh_window),
                max_credentials: self.max_credentials,
                ..SessionPolicy::default()
            },
            nonce_ttl: Duration::from_secs(self.nonce_ttl),
        }
    }
}

fn run(args: Args) -> Result<Value, ServerError> {
    let env = SystemEnv::new();
    let config = args.config();

    match args.command {
        Command::Keygen { out, bits, force } => commands::keygen(&env, &out, bits, force),
        Command::Seal { plaintext } => {
            config.validate()?;
            Ok(commands::seal_field(&config.at_rest_codec(), &plaintext))
        },
        Command::Unseal { ciphertext } => {
            config.validate()?;
            commands::unseal_field(&config.at_rest_codec(), &ciphertext)
        },
        command => {
            let gate = config.build_gate(env)?;
            match command {
                Command::PublicKey => commands::public_key(&gate),
                Command::Nonce => commands::nonce(&gate),
                Command::Login { account, context } => {
                    commands::login(&gate, &account, context.into())
                },
                Command::Verify { token } => commands::verify(&gate, &token),
                Command::Revoke { token } => commands::revoke(&gate, &token),
                Command::Refresh { token, context } => {
                    commands::refresh(&gate, &token, context.into())
                },
                Command::Sessions { account } => commands::sessions(&gate, &account),
                Command::LogoutAll { account } => commands::logout_all(&gate, &account),
                Command::Open { body } => Ok(commands::open(&gate, &body)),
                Command::Keygen { .. } | Command::Seal { .. } | Command::Unseal { .. } => {
                    Err(ServerError::Internal("command dispatched twice".into()))
                },
            }
        },
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::registry().with(fmt::layer().with_writer(std::io::stderr)).with(filter).init();

    let output = run(args)?;

    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "{output:#}")?;
    Ok(())
}
