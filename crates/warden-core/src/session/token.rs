//! Session credential wire format.
//!
//! ```text
//! base64( accountId ":" credentialId ":" issuedAt ":" nominalExpiresAt ":" hex(HMAC) )
//! ```
//!
//! The HMAC covers everything before the last `:` exactly as it appears on
//! the wire, so parsing never has to re-serialize claims to check them.

use std::fmt;

use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use thiserror::Error;
use uuid::Uuid;
use warden_crypto::SigningKey;

use crate::error::SessionError;

/// Number of `:`-separated fields in a decoded token.
pub const TOKEN_FIELDS: usize = 5;

/// Account identifier is empty or contains `:`.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("account id must be non-empty and must not contain ':'")]
pub struct InvalidAccountId;

/// Validated account identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AccountId(String);

impl AccountId {
    /// Validate an account id.
    pub fn new(id: impl Into<String>) -> Result<Self, InvalidAccountId> {
        let id = id.into();
        if id.is_empty() || id.contains(':') {
            return Err(InvalidAccountId);
        }
        Ok(Self(id))
    }

    /// The id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Claims carried by a session credential.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialClaims {
    /// Account the credential authenticates.
    pub account_id: AccountId,
    /// Random v4 id; also the store key of the credential record.
    pub credential_id: Uuid,
    /// Unix seconds at issuance.
    pub issued_at: u64,
    /// Unix seconds at which the credential lapses unless slid forward.
    pub nominal_expires_at: u64,
}

impl CredentialClaims {
    /// The string the signature covers.
    pub fn signing_input(&self) -> String {
        format!(
            "{}:{}:{}:{}",
            self.account_id,
            self.credential_id.hyphenated(),
            self.issued_at,
            self.nominal_expires_at
        )
    }

    /// Sign and encode as a wire token.
    pub fn sign(&self, key: &SigningKey) -> String {
        let signed = self.signing_input();
        let signature = key.sign_hex(signed.as_bytes());
        BASE64.encode(format!("{signed}:{signature}"))
    }
}

/// A decoded but not yet authenticated token.
#[derive(Debug, Clone)]
pub struct ParsedToken {
    /// Claims as read from the token.
    pub claims: CredentialClaims,
    signed: Vec<u8>,
    signature: Vec<u8>,
}

impl ParsedToken {
    /// Decode a wire token.
    ///
    /// Only the four claim fields are validated. Everything after the fourth
    /// `:` is the signature, kept as raw bytes for the HMAC check.
    ///
    /// # Errors
    ///
    /// `MalformedToken` if the input is not base64, has fewer than five `:`
    /// fields, or a claim field is not valid UTF-8 or fails validation.
    pub fn parse(token: &str) -> Result<Self, SessionError> {
        let decoded = BASE64.decode(token.trim()).map_err(|_| SessionError::MalformedToken)?;

        let mut fields = decoded.splitn(TOKEN_FIELDS, |&b| b == b':');
        let claim_fields: Vec<&[u8]> = fields.by_ref().take(TOKEN_FIELDS - 1).collect();
        let (Some(signature), [account, credential, issued, expires]) =
            (fields.next(), claim_fields.as_slice())
        else {
            return Err(SessionError::MalformedToken);
        };

        let claims = CredentialClaims {
            account_id: AccountId::new(field_str(account)?)
                .map_err(|_| SessionError::MalformedToken)?,
            credential_id: Uuid::try_parse(field_str(credential)?)
                .map_err(|_| SessionError::MalformedToken)?,
            issued_at: parse_secs(field_str(issued)?)?,
            nominal_expires_at: parse_secs(field_str(expires)?)?,
        };

        let signed_len = decoded.len() - signature.len() - 1;
        let signature = signature.to_vec();
        let mut signed = decoded;
        signed.truncate(signed_len);
        Ok(Self { claims, signed, signature })
    }

    /// Check the signature in constant time.
    pub fn verify_signature(&self, key: &SigningKey) -> bool {
        key.verify_hex(&self.signed, &self.signature)
    }
}

fn field_str(field: &[u8]) -> Result<&str, SessionError> {
    std::str::from_utf8(field).map_err(|_| SessionError::MalformedToken)
}

fn parse_secs(field: &str) -> Result<u64, SessionError> {
    if field.is_empty() || !field.bytes().all(|b| b.is_ascii_digit()) {
        return Err(SessionError::MalformedToken);
    }
    field.parse().map_err(|_| SessionError::MalformedToken)
}
