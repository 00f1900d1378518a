//! Concurrent access to shared state.
//!
//! Atomicity lives in the store primitives, so racing threads against one
//! gate must never accept a nonce twice or overflow an account index.

use std::{
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
    thread,
};

use warden_core::{AccountId, IssueContext, NonceError, SessionPolicy};
use warden_harness::{SimWorld, check_account};

const THREADS: usize = 16;

#[test]
fn nonce_verified_exactly_once_across_threads() {
    let world = Arc::new(SimWorld::new(20));
    let nonce = world.nonces().issue().unwrap();

    let accepted = Arc::new(AtomicUsize::new(0));
    let handles: Vec<_> = (0..THREADS)
        .map(|_| {
            let world = Arc::clone(&world);
            let nonce = nonce.clone();
            let accepted = Arc::clone(&accepted);
            thread::spawn(move || match world.nonces().verify(&nonce) {
                Ok(()) => {
                    accepted.fetch_add(1, Ordering::SeqCst);
                },
                Err(err) => assert_eq!(err, NonceError::NotFoundOrExpired),
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }
    assert_eq!(accepted.load(Ordering::SeqCst), 1);
}

#[test]
fn concurrent_logins_never_exceed_cap() {
    let policy = SessionPolicy::default();
    let cap = policy.max_credentials;
    let world = Arc::new(SimWorld::with_policy(21, policy));
    let alice = AccountId::new("alice").unwrap();

    let handles: Vec<_> = (0..THREADS)
        .map(|i| {
            let world = Arc::clone(&world);
            let alice = alice.clone();
            thread::spawn(move || {
                let context =
                    IssueContext { device_info: Some(format!("device-{i}")), source_ip: None };
                world.sessions().issue(&alice, context).unwrap().token
            })
        })
        .collect();

    let tokens: Vec<String> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    check_account(&world.store, &alice, cap).unwrap();
    assert_eq!(world.sessions().sessions(&alice).unwrap().len(), cap);

    let live = tokens.iter().filter(|token| world.sessions().verify(token).is_ok()).count();
    assert_eq!(live, cap);
}
