//! Session credential lifecycle.
//!
//! ```text
//!   issue ──► Active ──(verify inside refresh window)──► Active (TTL re-armed)
//!               │
//!               ├──(revoke / refresh)──► Revoked ──(audit TTL)──► pruned
//!               └──(TTL lapses / evicted by cap)───────────────► pruned
//! ```
//!
//! State lives only in the shared store: one JSON record per credential and
//! one bounded JSON-array index per account. No in-process locks or caches.

use std::{fmt, time::Duration};

use uuid::Uuid;
use warden_crypto::SigningKey;

use super::{
    record::{
        CREDENTIAL_KEY_PREFIX, CredentialRecord, CredentialStatus, account_index_key,
        credential_key,
    },
    token::{AccountId, CredentialClaims, ParsedToken},
};
use crate::{
    env::Environment,
    error::SessionError,
    store::{Store, StoreError},
};

/// Default credential lifetime (7 days).
pub const DEFAULT_LIFETIME: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// Default sliding-refresh window before nominal expiry (1 day).
pub const DEFAULT_REFRESH_WINDOW: Duration = Duration::from_secs(24 * 60 * 60);

/// Default retention of revoked records (7 days).
pub const DEFAULT_AUDIT_RETENTION: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// Default maximum live credentials per account.
pub const DEFAULT_MAX_CREDENTIALS: usize = 5;

/// Session lifetime and capacity rules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionPolicy {
    /// Lifetime of a new credential, and the TTL applied on every re-arm.
    pub lifetime: Duration,
    /// Verification within this window of nominal expiry re-arms the TTL.
    pub refresh_window: Duration,
    /// How long a revoked record is kept.
    pub audit_retention: Duration,
    /// Credentials kept per account; issuing beyond this evicts the oldest.
    pub max_credentials: usize,
}

impl Default for SessionPolicy {
    fn default() -> Self {
        Self {
            lifetime: DEFAULT_LIFETIME,
            refresh_window: DEFAULT_REFRESH_WINDOW,
            audit_retention: DEFAULT_AUDIT_RETENTION,
            max_credentials: DEFAULT_MAX_CREDENTIALS,
        }
    }
}

/// Caller metadata recorded at issuance.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IssueContext {
    /// Free-form device description.
    pub device_info: Option<String>,
    /// Caller network address.
    pub source_ip: Option<String>,
}

/// A freshly issued credential.
#[derive(Clone)]
pub struct IssuedCredential {
    /// Wire token to hand to the caller.
    pub token: String,
    /// Claims encoded in the token.
    pub claims: CredentialClaims,
}

impl fmt::Debug for IssuedCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IssuedCredential").field("claims", &self.claims).finish_non_exhaustive()
    }
}

/// Outcome of a successful verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedSession {
    /// Authenticated account.
    pub account_id: AccountId,
    /// Credential that authenticated it.
    pub credential_id: Uuid,
    /// Unix seconds at issuance.
    pub issued_at: u64,
    /// Unix seconds the credential is now good until.
    pub effective_expires_at: u64,
    /// Whether this verification slid the expiry forward.
    pub refreshed: bool,
}

/// One entry of an account's credential listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialSummary {
    /// Credential id.
    pub credential_id: Uuid,
    /// Active or revoked.
    pub status: CredentialStatus,
    /// Unix seconds at issuance.
    pub created_at: u64,
    /// Device description given at issuance.
    pub device_info: Option<String>,
    /// Address given at issuance.
    pub source_ip: Option<String>,
    /// Remaining record lifetime, if the store reports one.
    pub expires_in: Option<Duration>,
}

/// Issues, verifies, refreshes and revokes session credentials.
///
/// Cheap to clone when the store is; clones share the same state.
#[derive(Clone)]
pub struct SessionAuthority<S: Store, E: Environment> {
    store: S,
    env: E,
    key: SigningKey,
    policy: SessionPolicy,
}

impl<S: Store, E: Environment> SessionAuthority<S, E> {
    /// Create an authority signing with `key`.
    ///
    /// A `max_credentials` of zero is raised to one.
    pub fn new(store: S, env: E, key: SigningKey, mut policy: SessionPolicy) -> Self {
        if policy.max_credentials == 0 {
            tracing::warn!("max_credentials of 0 raised to 1");
            policy.max_credentials = 1;
        }
        Self { store, env, key, policy }
    }

    /// Active policy.
    pub fn policy(&self) -> &SessionPolicy {
        &self.policy
    }

    /// Issue a credential for `account_id`.
    ///
    /// Stores the record, then prepends its id to the account index. If the
    /// index is full the oldest credential is evicted and its record deleted
    /// in the same atomic store call.
    ///
    /// # Errors
    ///
    /// - `EntropyUnavailable`: no randomness for the credential id
    /// - `StoreUnavailable`: record or index write failed; nothing usable was
    ///   issued
    pub fn issue(
        &self,
        account_id: &AccountId,
        context: IssueContext,
    ) -> Result<IssuedCredential, SessionError> {
        let id_bytes: [u8; 16] = self.env.random_array()?;
        let credential_id = uuid::Builder::from_random_bytes(id_bytes).into_uuid();

        let now = self.env.wall_clock_secs();
        let claims = CredentialClaims {
            account_id: account_id.clone(),
            credential_id,
            issued_at: now,
            nominal_expires_at: now.saturating_add(self.policy.lifetime.as_secs()),
        };
        let token = claims.sign(&self.key);

        let record = CredentialRecord {
            wire_token: token.clone(),
            status: CredentialStatus::Active,
            account_id: account_id.to_string(),
            created_at: now,
            device_info: context.device_info,
            source_ip: context.source_ip,
        };
        let record_key = credential_key(&credential_id);
        self.store.set(&record_key, &record.to_json()?, self.policy.lifetime)?;

        let pushed = self.store.push_bounded(
            &account_index_key(account_id),
            &credential_id.hyphenated().to_string(),
            self.policy.max_credentials,
            self.policy.lifetime,
            CREDENTIAL_KEY_PREFIX,
        );

        let evicted = match pushed {
            Ok(evicted) => evicted,
            Err(err) => {
                // An unindexed record would escape the per-account cap
                if let Err(cleanup) = self.store.delete(&record_key) {
                    tracing::warn!(%credential_id, error = %cleanup, "orphan credential record left behind");
                }
                return Err(err.into());
            },
        };

        tracing::info!(%credential_id, evicted = evicted.len(), "issued session credential");
        Ok(IssuedCredential { token, claims })
    }

    /// Verify a wire token.
    ///
    /// Inside the refresh window the record and index TTLs are re-armed.
    /// Past nominal expiry a still-live record is accepted only if that
    /// re-arm succeeds.
    ///
    /// # Errors
    ///
    /// - `MalformedToken`: not a decodable token
    /// - `BadSignature`: HMAC mismatch, or claims disagree with the record
    /// - `NotFoundOrExpired`: no live record
    /// - `Revoked`: record explicitly revoked
    /// - `StoreUnavailable`: lookup failed, or the mandatory re-arm failed
    /// - `Corrupt`: record could not be decoded
    pub fn verify(&self, token: &str) -> Result<VerifiedSession, SessionError> {
        self.verify_with_record(token).map(|(session, _)| session)
    }

    /// Revoke a credential. The token must verify first.
    ///
    /// The record is kept, marked revoked, for the audit retention period.
    pub fn revoke(&self, token: &str) -> Result<(), SessionError> {
        let (session, record) = self.verify_with_record(token)?;
        self.mark_revoked(&session.credential_id, record)?;

        tracing::info!(credential_id = %session.credential_id, "revoked session credential");
        Ok(())
    }

    /// Exchange a valid token for a new one and revoke the old.
    ///
    /// Verification failure aborts with no side effects. Failure to revoke
    /// the old token is logged and does not invalidate the new one.
    pub fn refresh(
        &self,
        token: &str,
        context: IssueContext,
    ) -> Result<IssuedCredential, SessionError> {
        let current = self.verify(token)?;
        let issued = self.issue(&current.account_id, context)?;

        if let Err(err) = self.revoke(token) {
            tracing::warn!(
                credential_id = %current.credential_id,
                error = %err,
                "refreshed credential could not be revoked"
            );
        }

        Ok(issued)
    }

    /// Live credentials (active or revoked) referenced by the account index.
    ///
    /// Ids whose record has already expired or been evicted are skipped.
    pub fn sessions(&self, account_id: &AccountId) -> Result<Vec<CredentialSummary>, SessionError> {
        let mut summaries = Vec::new();

        for (credential_id, record) in self.indexed_records(account_id)? {
            let expires_in = self.store.ttl(&credential_key(&credential_id))?;
            summaries.push(CredentialSummary {
                credential_id,
                status: record.status,
                created_at: record.created_at,
                device_info: record.device_info,
                source_ip: record.source_ip,
                expires_in,
            });
        }

        Ok(summaries)
    }

    /// Revoke every active credential of an account. Returns how many
    /// changed.
    pub fn revoke_all(&self, account_id: &AccountId) -> Result<usize, SessionError> {
        let mut revoked = 0;

        for (credential_id, record) in self.indexed_records(account_id)? {
            if record.status == CredentialStatus::Active {
                self.mark_revoked(&credential_id, record)?;
                revoked += 1;
            }
        }

        tracing::info!(revoked, "revoked all session credentials for account");
        Ok(revoked)
    }

    fn verify_with_record(
        &self,
        token: &str,
    ) -> Result<(VerifiedSession, CredentialRecord), SessionError> {
        let (claims, record) = self.authenticate(token.trim())?;

        let now = self.env.wall_clock_secs();
        let nominal = claims.nominal_expires_at;

        let refreshed = if now >= nominal {
            // Past nominal expiry: the credential lives on only if re-armed
            match self.rearm(&claims) {
                Ok(true) => true,
                Ok(false) => return Err(SessionError::NotFoundOrExpired),
                Err(err) => return Err(err.into()),
            }
        } else if nominal - now < self.policy.refresh_window.as_secs() {
            self.rearm(&claims).unwrap_or_else(|err| {
                tracing::warn!(
                    credential_id = %claims.credential_id,
                    error = %err,
                    "sliding refresh skipped"
                );
                false
            })
        } else {
            false
        };

        let effective_expires_at =
            if refreshed { now.saturating_add(self.policy.lifetime.as_secs()) } else { nominal };

        let session = VerifiedSession {
            account_id: claims.account_id,
            credential_id: claims.credential_id,
            issued_at: claims.issued_at,
            effective_expires_at,
            refreshed,
        };
        Ok((session, record))
    }

    /// Signature, record lookup and record consistency checks.
    fn authenticate(
        &self,
        token: &str,
    ) -> Result<(CredentialClaims, CredentialRecord), SessionError> {
        let parsed = ParsedToken::parse(token)?;
        if !parsed.verify_signature(&self.key) {
            tracing::debug!("session token rejected: bad signature");
            return Err(SessionError::BadSignature);
        }

        let claims = parsed.claims;
        let Some(raw) = self.store.get(&credential_key(&claims.credential_id))? else {
            tracing::debug!(credential_id = %claims.credential_id, "session token rejected: no record");
            return Err(SessionError::NotFoundOrExpired);
        };
        let record = CredentialRecord::from_json(&raw)?;

        if record.account_id != claims.account_id.as_str() || record.wire_token != token {
            tracing::warn!(credential_id = %claims.credential_id, "token disagrees with its record");
            return Err(SessionError::BadSignature);
        }

        if record.status == CredentialStatus::Revoked {
            tracing::debug!(credential_id = %claims.credential_id, "session token rejected: revoked");
            return Err(SessionError::Revoked);
        }

        Ok((claims, record))
    }

    /// Reset record and index TTLs. Returns false if the record is gone.
    fn rearm(&self, claims: &CredentialClaims) -> Result<bool, StoreError> {
        let lifetime = self.policy.lifetime;
        if !self.store.expire(&credential_key(&claims.credential_id), lifetime)? {
            return Ok(false);
        }
        self.store.expire(&account_index_key(&claims.account_id), lifetime)?;

        tracing::debug!(credential_id = %claims.credential_id, "slid credential expiry");
        Ok(true)
    }

    fn mark_revoked(
        &self,
        credential_id: &Uuid,
        record: CredentialRecord,
    ) -> Result<(), SessionError> {
        let revoked = CredentialRecord { status: CredentialStatus::Revoked, ..record };
        self.store.set(
            &credential_key(credential_id),
            &revoked.to_json()?,
            self.policy.audit_retention,
        )?;
        Ok(())
    }

    /// Records referenced by the account index that are still live and
    /// belong to the account.
    fn indexed_records(
        &self,
        account_id: &AccountId,
    ) -> Result<Vec<(Uuid, CredentialRecord)>, SessionError> {
        let mut records = Vec::new();

        for id in self.store.list(&account_index_key(account_id))? {
            let Ok(credential_id) = Uuid::try_parse(&id) else {
                tracing::warn!(id = %id, "skipping unparsable credential id in account index");
                continue;
            };
            let Some(raw) = self.store.get(&credential_key(&credential_id))? else {
                continue;
            };
            let record = CredentialRecord::from_json(&raw)?;
            if record.account_id == account_id.as_str() {
                records.push((credential_id, record));
            }
        }

        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        env::test_env::TestEnv,
        store::{ChaoticStore, MemoryStore},
    };

    const DAY: u64 = 24 * 60 * 60;
    const START: u64 = 1_700_000_000;

    type TestAuthority = SessionAuthority<MemoryStore<TestEnv>, TestEnv>;

    fn setup() -> (TestEnv, MemoryStore<TestEnv>, TestAuthority) {
        let env = TestEnv::new(START);
        let store = MemoryStore::new(env.clone());
        let authority = SessionAuthority::new(
            store.clone(),
            env.clone(),
            SigningKey::new(b"session-secret".to_vec()),
            SessionPolicy::default(),
        );
        (env, store, authority)
    }

    fn alice() -> AccountId {
        AccountId::new("alice").unwrap()
    }

    #[test]
    fn issue_then_verify() {
        let (_, _, authority) = setup();
        let issued = authority.issue(&alice(), IssueContext::default()).unwrap();

        let session = authority.verify(&issued.token).unwrap();
        assert_eq!(session.account_id, alice());
        assert_eq!(session.credential_id, issued.claims.credential_id);
        assert_eq!(session.issued_at, START);
        assert_eq!(session.effective_expires_at, START + 7 * DAY);
        assert!(!session.refreshed);
    }

    #[test]
    fn credential_ids_are_v4() {
        let (_, _, authority) = setup();
        let issued = authority.issue(&alice(), IssueContext::default()).unwrap();
        assert_eq!(issued.claims.credential_id.get_version_num(), 4);
    }

    #[test]
    fn issue_records_context() {
        let (_, store, authority) = setup();
        let context = IssueContext {
            device_info: Some("pixel".to_string()),
            source_ip: Some("192.0.2.7".to_string()),
        };
        let issued = authority.issue(&alice(), context).unwrap();

        let raw = store.get(&credential_key(&issued.claims.credential_id)).unwrap().unwrap();
        let record = CredentialRecord::from_json(&raw).unwrap();
        assert_eq!(record.device_info.as_deref(), Some("pixel"));
        assert_eq!(record.source_ip.as_deref(), Some("192.0.2.7"));
        assert_eq!(record.wire_token, issued.token);
    }

    #[test]
    fn forged_signature_rejected() {
        let (_, _, authority) = setup();
        let issued = authority.issue(&alice(), IssueContext::default()).unwrap();

        let forger = SessionAuthority::new(
            MemoryStore::new(TestEnv::new(START)),
            TestEnv::new(START),
            SigningKey::new(b"wrong-secret".to_vec()),
            SessionPolicy::default(),
        );
        let forged = issued.claims.sign(&SigningKey::new(b"wrong-secret".to_vec()));

        assert_eq!(authority.verify(&forged), Err(SessionError::BadSignature));
        assert_eq!(forger.verify(&issued.token), Err(SessionError::BadSignature));
    }

    #[test]
    fn any_signature_bit_flip_is_bad_signature() {
        use base64::{Engine as _, engine::general_purpose::STANDARD};

        let (_, _, authority) = setup();
        let issued = authority.issue(&alice(), IssueContext::default()).unwrap();
        let raw = STANDARD.decode(&issued.token).unwrap();
        let signature_start = issued.claims.signing_input().len() + 1;

        for index in signature_start..raw.len() {
            for bit in 0..8 {
                let mut flipped = raw.clone();
                flipped[index] ^= 1 << bit;
                assert_eq!(
                    authority.verify(&STANDARD.encode(&flipped)),
                    Err(SessionError::BadSignature),
                    "byte {index} bit {bit}"
                );
            }
        }
        assert!(authority.verify(&issued.token).is_ok());
    }

    #[test]
    fn zero_cap_is_raised_to_one() {
        let env = TestEnv::new(START);
        let authority = SessionAuthority::new(
            MemoryStore::new(env.clone()),
            env,
            SigningKey::new(b"session-secret".to_vec()),
            SessionPolicy { max_credentials: 0, ..SessionPolicy::default() },
        );
        assert_eq!(authority.policy().max_credentials, 1);

        let first = authority.issue(&alice(), IssueContext::default()).unwrap();
        assert!(authority.verify(&first.token).is_ok());

        let second = authority.issue(&alice(), IssueContext::default()).unwrap();
        assert!(authority.verify(&second.token).is_ok());
        assert_eq!(authority.verify(&first.token), Err(SessionError::NotFoundOrExpired));
    }

    #[test]
    fn garbage_token_is_malformed() {
        let (_, _, authority) = setup();
        assert_eq!(authority.verify("not a token"), Err(SessionError::MalformedToken));
    }

    #[test]
    fn revoked_token_reports_revoked() {
        let (_, store, authority) = setup();
        let issued = authority.issue(&alice(), IssueContext::default()).unwrap();

        authority.revoke(&issued.token).unwrap();

        assert_eq!(authority.verify(&issued.token), Err(SessionError::Revoked));
        assert_eq!(authority.revoke(&issued.token), Err(SessionError::Revoked));

        let ttl = store.ttl(&credential_key(&issued.claims.credential_id)).unwrap();
        assert_eq!(ttl, Some(DEFAULT_AUDIT_RETENTION));
    }

    #[test]
    fn expired_token_not_found() {
        let (env, _, authority) = setup();
        let issued = authority.issue(&alice(), IssueContext::default()).unwrap();

        env.advance(7 * DAY);
        assert_eq!(authority.verify(&issued.token), Err(SessionError::NotFoundOrExpired));
    }

    #[test]
    fn verify_inside_window_slides_expiry() {
        let (env, store, authority) = setup();
        let issued = authority.issue(&alice(), IssueContext::default()).unwrap();
        let id = issued.claims.credential_id;

        env.advance(6 * DAY + 1);
        let session = authority.verify(&issued.token).unwrap();

        assert!(session.refreshed);
        assert_eq!(session.effective_expires_at, env.wall_clock_secs() + 7 * DAY);
        assert_eq!(store.ttl(&credential_key(&id)).unwrap(), Some(DEFAULT_LIFETIME));
        assert_eq!(store.ttl(&account_index_key(&alice())).unwrap(), Some(DEFAULT_LIFETIME));
    }

    #[test]
    fn verify_outside_window_leaves_ttl() {
        let (env, store, authority) = setup();
        let issued = authority.issue(&alice(), IssueContext::default()).unwrap();

        env.advance(DAY);
        assert!(!authority.verify(&issued.token).unwrap().refreshed);

        let ttl = store.ttl(&credential_key(&issued.claims.credential_id)).unwrap();
        assert_eq!(ttl, Some(Duration::from_secs(6 * DAY)));
    }

    #[test]
    fn past_nominal_expiry_with_live_record_still_verifies() {
        let (env, _, authority) = setup();
        let issued = authority.issue(&alice(), IssueContext::default()).unwrap();

        env.advance(6 * DAY + 12 * 60 * 60);
        assert!(authority.verify(&issued.token).unwrap().refreshed);

        env.advance(3 * DAY);
        let now = env.wall_clock_secs();
        assert!(now > issued.claims.nominal_expires_at);

        let session = authority.verify(&issued.token).unwrap();
        assert!(session.refreshed);
        assert_eq!(session.effective_expires_at, now + 7 * DAY);
    }

    #[test]
    fn refresh_issues_new_and_revokes_old() {
        let (_, _, authority) = setup();
        let old = authority.issue(&alice(), IssueContext::default()).unwrap();

        let new = authority.refresh(&old.token, IssueContext::default()).unwrap();

        assert_ne!(new.claims.credential_id, old.claims.credential_id);
        assert!(authority.verify(&new.token).is_ok());
        assert_eq!(authority.verify(&old.token), Err(SessionError::Revoked));
    }

    #[test]
    fn refresh_of_invalid_token_has_no_side_effects() {
        let (_, store, authority) = setup();

        assert_eq!(
            authority.refresh("bogus", IssueContext::default()).err(),
            Some(SessionError::MalformedToken)
        );
        assert_eq!(store.live_key_count().unwrap(), 0);
    }

    #[test]
    fn sixth_issue_evicts_oldest() {
        let (_, store, authority) = setup();

        let tokens: Vec<_> = (0..6)
            .map(|_| authority.issue(&alice(), IssueContext::default()).unwrap())
            .collect();

        assert_eq!(authority.verify(&tokens[0].token), Err(SessionError::NotFoundOrExpired));
        for issued in &tokens[1..] {
            assert!(authority.verify(&issued.token).is_ok());
        }

        let index = store.list(&account_index_key(&alice())).unwrap();
        let expected: Vec<String> =
            tokens[1..].iter().rev().map(|t| t.claims.credential_id.to_string()).collect();
        assert_eq!(index, expected);
    }

    #[test]
    fn sessions_lists_active_and_revoked() {
        let (_, _, authority) = setup();
        let first = authority.issue(&alice(), IssueContext::default()).unwrap();
        let second = authority
            .issue(&alice(), IssueContext { device_info: Some("laptop".into()), source_ip: None })
            .unwrap();
        authority.revoke(&first.token).unwrap();

        let sessions = authority.sessions(&alice()).unwrap();

        assert_eq!(sessions.len(), 2);
        assert_eq!(sessions[0].credential_id, second.claims.credential_id);
        assert_eq!(sessions[0].status, CredentialStatus::Active);
        assert_eq!(sessions[0].device_info.as_deref(), Some("laptop"));
        assert_eq!(sessions[1].status, CredentialStatus::Revoked);
        assert_eq!(sessions[1].expires_in, Some(DEFAULT_AUDIT_RETENTION));
    }

    #[test]
    fn sessions_of_unknown_account_is_empty() {
        let (_, _, authority) = setup();
        assert!(authority.sessions(&AccountId::new("nobody").unwrap()).unwrap().is_empty());
    }

    #[test]
    fn revoke_all_revokes_only_active() {
        let (_, _, authority) = setup();
        let tokens: Vec<_> = (0..3)
            .map(|_| authority.issue(&alice(), IssueContext::default()).unwrap())
            .collect();
        authority.revoke(&tokens[0].token).unwrap();

        assert_eq!(authority.revoke_all(&alice()).unwrap(), 2);
        for issued in &tokens {
            assert_eq!(authority.verify(&issued.token), Err(SessionError::Revoked));
        }
        assert_eq!(authority.revoke_all(&alice()).unwrap(), 0);
    }

    #[test]
    fn revoke_all_leaves_other_accounts() {
        let (_, _, authority) = setup();
        let bob = authority.issue(&AccountId::new("bob").unwrap(), IssueContext::default()).unwrap();
        authority.issue(&alice(), IssueContext::default()).unwrap();

        authority.revoke_all(&alice()).unwrap();
        assert!(authority.verify(&bob.token).is_ok());
    }

    #[test]
    fn entropy_failure_issues_nothing() {
        let (env, store, authority) = setup();
        env.fail_entropy(true);

        assert_eq!(
            authority.issue(&alice(), IssueContext::default()).err(),
            Some(SessionError::EntropyUnavailable)
        );
        assert_eq!(store.live_key_count().unwrap(), 0);
    }

    #[test]
    fn store_failure_is_store_unavailable() {
        let env = TestEnv::new(START);
        let authority = SessionAuthority::new(
            ChaoticStore::new(MemoryStore::new(env.clone()), 1.0),
            env,
            SigningKey::new(b"session-secret".to_vec()),
            SessionPolicy::default(),
        );

        assert!(matches!(
            authority.issue(&alice(), IssueContext::default()),
            Err(SessionError::StoreUnavailable(_))
        ));
    }

    #[test]
    fn issued_credential_debug_hides_token() {
        let (_, _, authority) = setup();
        let issued = authority.issue(&alice(), IssueContext::default()).unwrap();
        assert!(!format!("{issued:?}").contains(&issued.token));
    }
}
