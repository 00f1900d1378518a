//! Request boundary: envelope, nonce and session checks in a fixed order.
//!
//! ```text
//! {"ciphertext": "<hex>"}
//!        │ open with server private key ─────────► InvalidCiphertext
//!        ▼
//! {"nonce": "...", "token"?: "...", "public_key"?: "<hex PEM>", ...}
//!        │ consume nonce (single use) ───────────► Replay
//!        ▼
//!        │ verify session token if present ──────► Unauthenticated / Revoked
//!        ▼
//! OpenedRequest { payload, session, reply key }
//! ```
//!
//! Rejections are deliberately coarse. A caller learns that the ciphertext
//! was unusable, never whether the key unwrap or the padding check failed.

use std::sync::Arc;

use serde::Deserialize;
use serde_json::{Map, Value, json};
use thiserror::Error;
use warden_core::{
    AccountId, Environment, NonceError, NonceGuard, SessionAuthority, SessionError, Store,
    VerifiedSession,
};
use warden_crypto::{
    ENVELOPE_ENTROPY_LEN, EnvelopeEntropy, KeyMaterial, KeyMaterialError, MIN_RSA_BITS,
    RsaPublicKey, modulus_bits, parse_public_key_hex,
};
use zeroize::Zeroizing;

/// Payload field carrying the single-use nonce.
pub const NONCE_FIELD: &str = "nonce";

/// Payload field carrying the session token.
pub const TOKEN_FIELD: &str = "token";

/// Payload field carrying the caller's hex-encoded PEM public key.
pub const REPLY_KEY_FIELD: &str = "public_key";

/// Whether a request must carry a valid session token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionRequirement {
    /// Reject requests without a token.
    Required,
    /// Verify a token if present; accept anonymous requests.
    Optional,
}

/// Caller-facing rejection classes.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// Body or decrypted payload is not the expected JSON shape.
    #[error("bad request")]
    BadRequest,

    /// Ciphertext could not be decrypted under the server key.
    #[error("invalid ciphertext")]
    InvalidCiphertext,

    /// Nonce unknown, already used, or expired.
    #[error("replayed or expired request")]
    Replay,

    /// Session token missing, malformed, forged, or expired.
    #[error("unauthenticated")]
    Unauthenticated,

    /// Session token was revoked.
    #[error("session revoked")]
    Revoked,

    /// Store or entropy failure. Retry the whole request with a new nonce.
    #[error("service unavailable")]
    Unavailable,
}

impl Rejection {
    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::BadRequest => "bad_request",
            Self::InvalidCiphertext => "invalid_ciphertext",
            Self::Replay => "replay",
            Self::Unauthenticated => "unauthenticated",
            Self::Revoked => "revoked",
            Self::Unavailable => "unavailable",
        }
    }

    /// HTTP status an HTTP front end should answer with.
    pub fn http_status(&self) -> u16 {
        match self {
            Self::BadRequest | Self::InvalidCiphertext => 400,
            Self::Unauthenticated | Self::Revoked => 401,
            Self::Replay => 409,
            Self::Unavailable => 503,
        }
    }

    /// Returns true if resubmitting (with a fresh nonce) may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Unavailable)
    }

    /// JSON error body.
    pub fn to_body(&self) -> Value {
        json!({ "error": self.code() })
    }
}

impl From<NonceError> for Rejection {
    fn from(err: NonceError) -> Self {
        match err {
            NonceError::NotFoundOrExpired | NonceError::Expired => Self::Replay,
            NonceError::EntropyUnavailable | NonceError::StoreUnavailable(_) => Self::Unavailable,
        }
    }
}

impl From<SessionError> for Rejection {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::MalformedToken
            | SessionError::BadSignature
            | SessionError::NotFoundOrExpired
            | SessionError::Corrupt { .. } => Self::Unauthenticated,
            SessionError::Revoked => Self::Revoked,
            SessionError::EntropyUnavailable | SessionError::StoreUnavailable(_) => {
                Self::Unavailable
            },
        }
    }
}

#[derive(Deserialize)]
struct RequestBody {
    ciphertext: String,
}

/// A request that passed every boundary check.
#[derive(Debug, Clone)]
pub struct OpenedRequest {
    /// Decrypted JSON payload, including the consumed nonce.
    pub payload: Map<String, Value>,
    /// Verified session, if the payload carried a token.
    pub session: Option<VerifiedSession>,
    reply_key: Option<RsaPublicKey>,
}

impl OpenedRequest {
    /// Key the response must be sealed under, if the caller supplied one.
    pub fn reply_key(&self) -> Option<&RsaPublicKey> {
        self.reply_key.as_ref()
    }

    /// Authenticated account, if any.
    pub fn account_id(&self) -> Option<&AccountId> {
        self.session.as_ref().map(|session| &session.account_id)
    }
}

/// The security boundary every request and response passes through.
#[derive(Clone)]
pub struct Gate<S: Store, E: Environment> {
    keys: Arc<KeyMaterial>,
    nonces: NonceGuard<S, E>,
    sessions: SessionAuthority<S, E>,
    env: E,
}

impl<S: Store, E: Environment> Gate<S, E> {
    /// Assemble a gate from its parts.
    pub fn new(
        keys: Arc<KeyMaterial>,
        nonces: NonceGuard<S, E>,
        sessions: SessionAuthority<S, E>,
        env: E,
    ) -> Self {
        Self { keys, nonces, sessions, env }
    }

    /// Server key material.
    pub fn keys(&self) -> &KeyMaterial {
        &self.keys
    }

    /// Nonce guard shared with this gate.
    pub fn nonces(&self) -> &NonceGuard<S, E> {
        &self.nonces
    }

    /// Session authority shared with this gate.
    pub fn sessions(&self) -> &SessionAuthority<S, E> {
        &self.sessions
    }

    /// Server public key as hex-encoded PEM, for the pre-request handshake.
    pub fn public_key_hex(&self) -> Result<String, KeyMaterialError> {
        self.keys.public_key_hex()
    }

    /// Issue a nonce for the pre-request handshake.
    pub fn issue_nonce(&self) -> Result<String, NonceError> {
        self.nonces.issue()
    }

    /// Decrypt and authenticate a request body.
    ///
    /// Checks run in order: envelope, nonce, session. The nonce is consumed
    /// as soon as it is checked, so a request rejected at the session step
    /// cannot be replayed either.
    pub fn open_request(
        &self,
        body: &str,
        requirement: SessionRequirement,
    ) -> Result<OpenedRequest, Rejection> {
        let request: RequestBody = serde_json::from_str(body).map_err(|err| {
            tracing::debug!(%err, "rejected: body is not an envelope");
            Rejection::BadRequest
        })?;

        let plaintext =
            warden_crypto::open(&request.ciphertext, self.keys.private_key()).map_err(|err| {
                tracing::debug!(%err, "rejected: envelope did not open");
                Rejection::InvalidCiphertext
            })?;

        let Ok(Value::Object(payload)) = serde_json::from_slice::<Value>(&plaintext) else {
            tracing::debug!("rejected: payload is not a JSON object");
            return Err(Rejection::BadRequest);
        };

        let Some(nonce) = payload.get(NONCE_FIELD).and_then(Value::as_str) else {
            tracing::debug!("rejected: payload has no nonce");
            return Err(Rejection::BadRequest);
        };
        self.nonces.verify(nonce).map_err(|err| {
            tracing::debug!(%err, "rejected: nonce");
            Rejection::from(err)
        })?;

        let reply_key = match payload.get(REPLY_KEY_FIELD) {
            None | Some(Value::Null) => None,
            Some(Value::String(hex_pem)) => Some(parse_reply_key(hex_pem)?),
            Some(_) => return Err(Rejection::BadRequest),
        };

        let session = match payload.get(TOKEN_FIELD) {
            None | Some(Value::Null) => {
                if requirement == SessionRequirement::Required {
                    tracing::debug!("rejected: session required but no token");
                    return Err(Rejection::Unauthenticated);
                }
                None
            },
            Some(Value::String(token)) => Some(self.sessions.verify(token).map_err(|err| {
                tracing::debug!(%err, "rejected: session token");
                Rejection::from(err)
            })?),
            Some(_) => return Err(Rejection::BadRequest),
        };

        tracing::debug!(authenticated = session.is_some(), "request accepted");
        Ok(OpenedRequest { payload, session, reply_key })
    }

    /// Encode a response body for an opened request.
    ///
    /// Sealed as `{"ciphertext": "<hex>"}` under the caller's key when one
    /// was supplied, plain JSON otherwise.
    pub fn seal_response(&self, opened: &OpenedRequest, body: &Value) -> Result<String, Rejection> {
        let plaintext = body.to_string();

        let Some(reply_key) = opened.reply_key() else {
            return Ok(plaintext);
        };

        let mut entropy_bytes = Zeroizing::new([0u8; ENVELOPE_ENTROPY_LEN]);
        self.env.random_bytes(entropy_bytes.as_mut_slice()).map_err(|_| {
            tracing::warn!("response not sealed: entropy unavailable");
            Rejection::Unavailable
        })?;
        let entropy = EnvelopeEntropy::from_bytes(&entropy_bytes);

        let sealed = warden_crypto::seal(plaintext.as_bytes(), reply_key, &entropy).map_err(|err| {
            tracing::error!(%err, "response sealing failed");
            Rejection::Unavailable
        })?;

        Ok(json!({ "ciphertext": sealed }).to_string())
    }
}

/// Parse a caller-supplied reply key, refusing undersized moduli.
fn parse_reply_key(hex_pem: &str) -> Result<RsaPublicKey, Rejection> {
    let key = parse_public_key_hex(hex_pem).map_err(|err| {
        tracing::debug!(%err, "rejected: unusable reply key");
        Rejection::BadRequest
    })?;

    if modulus_bits(&key) < MIN_RSA_BITS {
        tracing::debug!(bits = modulus_bits(&key), "rejected: reply key too small");
        return Err(Rejection::BadRequest);
    }
    Ok(key)
}
