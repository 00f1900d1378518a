//! Store-level invariants for session state.
//!
//! Invariants capture what must be true of an account's stored state after
//! any sequence (or interleaving) of issue, verify, refresh and revoke calls.
//!
//! ```ignore
//! check_account(&world.store, &account, policy.max_credentials)?;
//! ```

use std::collections::HashSet;

use warden_core::{
    AccountId, Store, StoreError,
    session::{CREDENTIAL_KEY_PREFIX, CredentialRecord, account_index_key},
};

/// Invariant check result.
pub type InvariantResult = Result<(), Violation>;

/// Invariant violation with context.
#[derive(Debug, Clone)]
pub struct Violation {
    /// Name of the violated invariant.
    pub invariant: &'static str,
    /// Description of what went wrong.
    pub message: String,
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.invariant, self.message)
    }
}

impl std::error::Error for Violation {}

/// Stored state of one account: its index and the raw records it points to.
#[derive(Debug, Clone)]
pub struct AccountSnapshot {
    /// Account the snapshot was taken for.
    pub account_id: AccountId,
    /// Credential ids in index order (most recent first).
    pub index: Vec<String>,
    /// Raw record per indexed id, `None` once expired or evicted.
    pub records: Vec<(String, Option<String>)>,
}

impl AccountSnapshot {
    /// Read the account's index and every record it references.
    pub fn capture<S: Store>(store: &S, account_id: &AccountId) -> Result<Self, StoreError> {
        let index = store.list(&account_index_key(account_id))?;

        let mut records = Vec::with_capacity(index.len());
        for id in &index {
            records.push((id.clone(), store.get(&format!("{CREDENTIAL_KEY_PREFIX}{id}"))?));
        }

        Ok(Self { account_id: account_id.clone(), index, records })
    }
}

/// A property of an account snapshot.
pub trait Invariant {
    /// Invariant name for error reporting.
    fn name(&self) -> &'static str;

    /// Check the invariant against a snapshot.
    fn check(&self, snapshot: &AccountSnapshot) -> InvariantResult;
}

/// The index never holds more ids than the credential cap.
pub struct IndexWithinCap(pub usize);

impl Invariant for IndexWithinCap {
    fn name(&self) -> &'static str {
        "index_within_cap"
    }

    fn check(&self, snapshot: &AccountSnapshot) -> InvariantResult {
        if snapshot.index.len() <= self.0 {
            return Ok(());
        }
        Err(Violation {
            invariant: self.name(),
            message: format!("{} ids indexed, cap is {}", snapshot.index.len(), self.0),
        })
    }
}

/// No id appears twice in an index.
pub struct IndexDistinct;

impl Invariant for IndexDistinct {
    fn name(&self) -> &'static str {
        "index_distinct"
    }

    fn check(&self, snapshot: &AccountSnapshot) -> InvariantResult {
        let mut seen = HashSet::new();
        match snapshot.index.iter().find(|id| !seen.insert(id.as_str())) {
            None => Ok(()),
            Some(id) => Err(Violation {
                invariant: self.name(),
                message: format!("credential {id} indexed twice"),
            }),
        }
    }
}

/// Every live indexed record decodes and belongs to the indexed account.
pub struct RecordsMatchAccount;

impl Invariant for RecordsMatchAccount {
    fn name(&self) -> &'static str {
        "records_match_account"
    }

    fn check(&self, snapshot: &AccountSnapshot) -> InvariantResult {
        for (id, raw) in &snapshot.records {
            let Some(raw) = raw else { continue };

            let record: CredentialRecord = serde_json::from_str(raw).map_err(|e| Violation {
                invariant: self.name(),
                message: format!("credential {id} does not decode: {e}"),
            })?;

            if record.account_id != snapshot.account_id.as_str() {
                return Err(Violation {
                    invariant: self.name(),
                    message: format!(
                        "credential {id} belongs to {}, indexed under {}",
                        record.account_id, snapshot.account_id
                    ),
                });
            }
        }
        Ok(())
    }
}

/// Capture an account and check every session invariant against it.
///
/// A store failure during capture is reported as a violation so callers can
/// treat the result uniformly.
pub fn check_account<S: Store>(
    store: &S,
    account_id: &AccountId,
    max_credentials: usize,
) -> Result<(), Vec<Violation>> {
    let snapshot = AccountSnapshot::capture(store, account_id).map_err(|e| {
        vec![Violation { invariant: "capture", message: e.to_string() }]
    })?;

    let invariants: [&dyn Invariant; 3] =
        [&IndexWithinCap(max_credentials), &IndexDistinct, &RecordsMatchAccount];
    let violations: Vec<_> =
        invariants.iter().filter_map(|inv| inv.check(&snapshot).err()).collect();

    if violations.is_empty() { Ok(()) } else { Err(violations) }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use warden_core::MemoryStore;

    use super::*;
    use crate::SimEnv;

    const HOUR: Duration = Duration::from_secs(3600);

    #[test]
    fn empty_account_holds() {
        let store = MemoryStore::new(SimEnv::with_seed(0));
        let account = AccountId::new("alice").unwrap();
        assert!(check_account(&store, &account, 5).is_ok());
    }

    #[test]
    fn oversized_index_is_flagged() {
        let store = MemoryStore::new(SimEnv::with_seed(0));
        let account = AccountId::new("alice").unwrap();
        store.set(&account_index_key(&account), r#"["a","b","c"]"#, HOUR).unwrap();

        let violations = check_account(&store, &account, 2).unwrap_err();
        assert_eq!(violations[0].invariant, "index_within_cap");
    }

    #[test]
    fn duplicate_and_foreign_records_are_flagged() {
        let store = MemoryStore::new(SimEnv::with_seed(0));
        let account = AccountId::new("alice").unwrap();
        store.set(&account_index_key(&account), r#"["a","a"]"#, HOUR).unwrap();
        store
            .set(
                "credential:a",
                r#"{"wire_token":"t","status":"active","account_id":"mallory","created_at":1}"#,
                HOUR,
            )
            .unwrap();

        let names: Vec<_> =
            check_account(&store, &account, 5).unwrap_err().iter().map(|v| v.invariant).collect();
        assert_eq!(names, ["index_distinct", "records_match_account"]);
    }
}
