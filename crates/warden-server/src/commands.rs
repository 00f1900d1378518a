//! Operator commands behind the `warden` binary.
//!
//! Each command returns the JSON document the binary prints. They are
//! generic over the store so tests drive them against [`MemoryStore`]
//! (`warden_core::MemoryStore`) while the binary uses [`RedbStore`]
//! (`crate::RedbStore`).

use std::{
    fs::OpenOptions,
    io::{self, Write},
    path::Path,
};

use serde_json::{Value, json};
use warden_core::{
    AccountId, CredentialStatus, CredentialSummary, Environment, IssueContext, IssuedCredential,
    Store, VerifiedSession,
};
use warden_crypto::{AtRestCodec, KEYGEN_SEED_SIZE, generate_key_pair_pem};
use zeroize::Zeroizing;

use crate::{
    ServerError,
    gate::{Gate, SessionRequirement},
};

/// File name of the generated private key.
pub const PRIVATE_KEY_FILE: &str = "private.pem";

/// File name of the generated public key.
pub const PUBLIC_KEY_FILE: &str = "public.pem";

/// Generate a server identity into `out_dir`.
///
/// Existing key files are only replaced with `force`. The private key is
/// written owner-read/write only on Unix.
pub fn keygen<E: Environment>(
    env: &E,
    out_dir: &Path,
    bits: usize,
    force: bool,
) -> Result<Value, ServerError> {
    let seed = Zeroizing::new(
        env.random_array::<KEYGEN_SEED_SIZE>()
            .map_err(|_| ServerError::Crypto("entropy unavailable for key generation".into()))?,
    );
    let pair = generate_key_pair_pem(*seed, bits)?;

    std::fs::create_dir_all(out_dir)?;
    let private_path = out_dir.join(PRIVATE_KEY_FILE);
    let public_path = out_dir.join(PUBLIC_KEY_FILE);

    write_key_file(&private_path, pair.private_pem.as_bytes(), force, true)?;
    write_key_file(&public_path, pair.public_pem.as_bytes(), force, false)?;

    tracing::info!(path = %private_path.display(), bits, "generated server key pair");
    Ok(json!({
        "private_key": private_path.display().to_string(),
        "public_key": public_path.display().to_string(),
        "bits": bits,
    }))
}

fn write_key_file(path: &Path, contents: &[u8], force: bool, private: bool) -> Result<(), ServerError> {
    let mut options = OpenOptions::new();
    options.write(true);
    if force {
        options.create(true).truncate(true);
    } else {
        options.create_new(true);
    }

    #[cfg(unix)]
    if private {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    #[cfg(not(unix))]
    let _ = private;

    let mut file = options.open(path).map_err(|err| match err.kind() {
        io::ErrorKind::AlreadyExists => {
            ServerError::Config(format!("{} exists; pass --force to replace it", path.display()))
        },
        _ => ServerError::Io(err),
    })?;
    file.write_all(contents)?;
    file.sync_all()?;
    Ok(())
}

/// Server public key for the pre-request handshake.
pub fn public_key<S: Store, E: Environment>(gate: &Gate<S, E>) -> Result<Value, ServerError> {
    Ok(json!({ "public_key": gate.public_key_hex()? }))
}

/// Issue a nonce.
pub fn nonce<S: Store, E: Environment>(gate: &Gate<S, E>) -> Result<Value, ServerError> {
    Ok(json!({ "nonce": gate.issue_nonce()? }))
}

/// Issue a session credential.
pub fn login<S: Store, E: Environment>(
    gate: &Gate<S, E>,
    account: &str,
    context: IssueContext,
) -> Result<Value, ServerError> {
    let account_id = parse_account(account)?;
    let issued = gate.sessions().issue(&account_id, context)?;
    Ok(issued_json(&issued))
}

/// Verify a token, applying the sliding refresh.
pub fn verify<S: Store, E: Environment>(gate: &Gate<S, E>, token: &str) -> Result<Value, ServerError> {
    let session = gate.sessions().verify(token)?;
    Ok(session_json(&session))
}

/// Revoke a token.
pub fn revoke<S: Store, E: Environment>(gate: &Gate<S, E>, token: &str) -> Result<Value, ServerError> {
    gate.sessions().revoke(token)?;
    Ok(json!({ "revoked": true }))
}

/// Exchange a token for a new one.
pub fn refresh<S: Store, E: Environment>(
    gate: &Gate<S, E>,
    token: &str,
    context: IssueContext,
) -> Result<Value, ServerError> {
    let issued = gate.sessions().refresh(token, context)?;
    Ok(issued_json(&issued))
}

/// List an account's live credentials.
pub fn sessions<S: Store, E: Environment>(
    gate: &Gate<S, E>,
    account: &str,
) -> Result<Value, ServerError> {
    let account_id = parse_account(account)?;
    let summaries = gate.sessions().sessions(&account_id)?;
    Ok(json!({
        "account_id": account_id.as_str(),
        "sessions": summaries.iter().map(summary_json).collect::<Vec<_>>(),
    }))
}

/// Revoke every active credential of an account.
pub fn logout_all<S: Store, E: Environment>(
    gate: &Gate<S, E>,
    account: &str,
) -> Result<Value, ServerError> {
    let account_id = parse_account(account)?;
    let revoked = gate.sessions().revoke_all(&account_id)?;
    Ok(json!({ "account_id": account_id.as_str(), "revoked": revoked }))
}

/// Encrypt a field value with the at-rest codec.
pub fn seal_field(codec: &AtRestCodec, plaintext: &str) -> Value {
    json!({ "ciphertext": codec.encrypt(plaintext) })
}

/// Decrypt an at-rest field value.
pub fn unseal_field(codec: &AtRestCodec, ciphertext: &str) -> Result<Value, ServerError> {
    Ok(json!({ "plaintext": codec.decrypt_utf8(ciphertext)? }))
}

/// Run the boundary on a request body.
///
/// Rejections are reported in the output document, not as an error, since
/// they are the expected outcome for bad requests.
pub fn open<S: Store, E: Environment>(gate: &Gate<S, E>, body: &str) -> Value {
    match gate.open_request(body, SessionRequirement::Optional) {
        Ok(opened) => json!({
            "accepted": true,
            "payload": Value::Object(opened.payload.clone()),
            "session": opened.session.as_ref().map(session_json),
        }),
        Err(rejection) => json!({
            "accepted": false,
            "error": rejection.code(),
            "status": rejection.http_status(),
            "retryable": rejection.is_retryable(),
        }),
    }
}

fn parse_account(account: &str) -> Result<AccountId, ServerError> {
    AccountId::new(account).map_err(|err| ServerError::Config(format!("{err}: {account:?}")))
}

fn status_str(status: CredentialStatus) -> &'static str {
    match status {
        CredentialStatus::Active => "active",
        CredentialStatus::Revoked => "revoked",
    }
}

fn issued_json(issued: &IssuedCredential) -> Value {
    json!({
        "token": issued.token,
        "account_id": issued.claims.account_id.as_str(),
        "credential_id": issued.claims.credential_id.hyphenated().to_string(),
        "issued_at": issued.claims.issued_at,
        "expires_at": issued.claims.nominal_expires_at,
    })
}

fn session_json(session: &VerifiedSession) -> Value {
    json!({
        "account_id": session.account_id.as_str(),
        "credential_id": session.credential_id.hyphenated().to_string(),
        "issued_at": session.issued_at,
        "expires_at": session.effective_expires_at,
        "refreshed": session.refreshed,
    })
}

fn summary_json(summary: &CredentialSummary) -> Value {
    json!({
        "credential_id": summary.credential_id.hyphenated().to_string(),
        "status": status_str(summary.status),
        "created_at": summary.created_at,
        "device_info": summary.device_info,
        "source_ip": summary.source_ip,
        "expires_in_secs": summary.expires_in.map(|ttl| ttl.as_secs()),
    })
}
