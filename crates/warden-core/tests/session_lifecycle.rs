//! Session lifecycle over a virtual clock.
//!
//! Unit tests cover single transitions; these drive whole lifetimes (days of
//! simulated time) and random operation sequences against a simple model.

use std::{collections::HashSet, time::Duration};

use proptest::prelude::*;
use warden_core::{
    AccountId, Environment, IssueContext, MemoryStore, SessionAuthority, SessionError, SessionPolicy,
};
use warden_crypto::SigningKey;
use warden_harness::{SimEnv, check_account};

const HOUR: Duration = Duration::from_secs(3600);
const DAY: Duration = Duration::from_secs(86_400);

type Authority = SessionAuthority<MemoryStore<SimEnv>, SimEnv>;

fn setup(seed: u64) -> (SimEnv, MemoryStore<SimEnv>, Authority) {
    let env = SimEnv::with_seed(seed);
    let store = MemoryStore::new(env.clone());
    let authority = SessionAuthority::new(
        store.clone(),
        env.clone(),
        SigningKey::new(b"lifecycle-secret".to_vec()),
        SessionPolicy::default(),
    );
    (env, store, authority)
}

fn alice() -> AccountId {
    AccountId::new("alice").unwrap()
}

#[test]
fn active_user_stays_signed_in_past_nominal_expiry() {
    let (env, _store, authority) = setup(1);
    let issued = authority.issue(&alice(), IssueContext::default()).unwrap();

    // Each visit lands inside the refresh window or past nominal expiry
    // while the re-armed record is still live
    for visit in 1..=8 {
        env.advance(DAY * 6 + HOUR * 12);
        let session = authority.verify(&issued.token).unwrap();
        assert!(session.refreshed, "visit {visit} did not slide");
        assert_eq!(session.effective_expires_at, env.wall_clock_secs() + DAY.as_secs() * 7);
    }
}

#[test]
fn idle_user_expires_with_record() {
    let (env, store, authority) = setup(2);
    let issued = authority.issue(&alice(), IssueContext::default()).unwrap();

    env.advance(DAY * 7);
    assert_eq!(authority.verify(&issued.token).unwrap_err(), SessionError::NotFoundOrExpired);
    assert_eq!(store.live_key_count().unwrap(), 0);
}

#[test]
fn revoked_record_kept_for_audit_then_pruned() {
    let (env, _store, authority) = setup(3);
    let issued = authority.issue(&alice(), IssueContext::default()).unwrap();

    env.advance(DAY * 5);
    authority.revoke(&issued.token).unwrap();

    // Retention restarts at revocation, beyond the original lifetime
    env.advance(DAY * 3);
    assert_eq!(authority.verify(&issued.token).unwrap_err(), SessionError::Revoked);

    env.advance(DAY * 4);
    assert_eq!(authority.verify(&issued.token).unwrap_err(), SessionError::NotFoundOrExpired);
}

#[test]
fn refreshed_chain_keeps_one_active_credential() {
    let (_env, _store, authority) = setup(4);
    let mut token = authority.issue(&alice(), IssueContext::default()).unwrap().token;

    for _ in 0..3 {
        let next = authority.refresh(&token, IssueContext::default()).unwrap().token;
        assert_eq!(authority.verify(&token).unwrap_err(), SessionError::Revoked);
        token = next;
    }

    let active = authority
        .sessions(&alice())
        .unwrap()
        .into_iter()
        .filter(|s| s.status == warden_core::CredentialStatus::Active)
        .count();
    assert_eq!(active, 1);
    assert!(authority.verify(&token).is_ok());
}

#[derive(Debug, Clone)]
enum Op {
    Issue,
    Verify(usize),
    Revoke(usize),
    Refresh(usize),
    Advance(u64),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => Just(Op::Issue),
        3 => (0usize..32).prop_map(Op::Verify),
        1 => (0usize..32).prop_map(Op::Revoke),
        1 => (0usize..32).prop_map(Op::Refresh),
        1 => (1u64..72).prop_map(Op::Advance),
    ]
}

/// Record a new token in the model index, marking evictions dead.
fn remember(
    tokens: &mut Vec<String>,
    index: &mut Vec<usize>,
    dead: &mut HashSet<usize>,
    cap: usize,
    token: String,
) {
    tokens.push(token);
    index.insert(0, tokens.len() - 1);
    if index.len() > cap {
        dead.extend(index.drain(cap..));
    }
}

#[test]
fn prop_revoked_and_evicted_credentials_never_verify() {
    proptest!(ProptestConfig::with_cases(64), |(
        seed in any::<u64>(),
        ops in proptest::collection::vec(op_strategy(), 1..60),
    )| {
        let (env, store, authority) = setup(seed);
        let cap = authority.policy().max_credentials;

        let mut tokens: Vec<String> = Vec::new();
        // Indices into `tokens`, most recent first
        let mut index: Vec<usize> = Vec::new();
        let mut dead: HashSet<usize> = HashSet::new();

        for op in ops {
            match op {
                Op::Issue => {
                    let issued = authority.issue(&alice(), IssueContext::default()).unwrap();
                    remember(&mut tokens, &mut index, &mut dead, cap, issued.token);
                },
                Op::Verify(i) if i < tokens.len() => {
                    let verified = authority.verify(&tokens[i]);
                    if dead.contains(&i) {
                        prop_assert!(verified.is_err(), "dead credential {i} verified");
                    }
                },
                Op::Revoke(i) if i < tokens.len() => {
                    if authority.revoke(&tokens[i]).is_ok() {
                        prop_assert!(!dead.contains(&i));
                        dead.insert(i);
                    }
                },
                Op::Refresh(i) if i < tokens.len() => {
                    if let Ok(issued) = authority.refresh(&tokens[i], IssueContext::default()) {
                        prop_assert!(!dead.contains(&i));
                        dead.insert(i);
                        remember(&mut tokens, &mut index, &mut dead, cap, issued.token);
                    }
                },
                Op::Advance(hours) => env.advance(HOUR * hours as u32),
                _ => {},
            }

            prop_assert!(check_account(&store, &alice(), cap).is_ok());
        }
    });
}
