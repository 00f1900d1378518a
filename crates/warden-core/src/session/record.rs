//! Persisted credential state and its store keys.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::token::AccountId;
use crate::error::SessionError;

/// Store key prefix for credential records.
pub const CREDENTIAL_KEY_PREFIX: &str = "credential:";

/// Store key prefix for per-account credential indexes.
pub const ACCOUNT_INDEX_KEY_PREFIX: &str = "account:credentials:";

/// Lifecycle status of a stored credential.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CredentialStatus {
    /// Accepted by verification.
    Active,
    /// Kept for audit only; verification reports `Revoked`.
    Revoked,
}

/// Stored alongside each issued credential, JSON encoded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialRecord {
    /// The exact token handed out at issuance.
    pub wire_token: String,
    /// Current status.
    pub status: CredentialStatus,
    /// Owning account.
    pub account_id: String,
    /// Unix seconds at issuance.
    pub created_at: u64,
    /// Caller-reported device description.
    #[serde(default)]
    pub device_info: Option<String>,
    /// Caller network address at issuance.
    #[serde(default)]
    pub source_ip: Option<String>,
}

impl CredentialRecord {
    pub(crate) fn to_json(&self) -> Result<String, SessionError> {
        serde_json::to_string(self).map_err(|e| SessionError::Corrupt { reason: e.to_string() })
    }

    pub(crate) fn from_json(raw: &str) -> Result<Self, SessionError> {
        serde_json::from_str(raw).map_err(|e| SessionError::Corrupt { reason: e.to_string() })
    }
}

/// `credential:<uuid>`
pub fn credential_key(credential_id: &Uuid) -> String {
    format!("{CREDENTIAL_KEY_PREFIX}{}", credential_id.hyphenated())
}

/// `account:credentials:<account>`
pub fn account_index_key(account_id: &AccountId) -> String {
    format!("{ACCOUNT_INDEX_KEY_PREFIX}{account_id}")
}
