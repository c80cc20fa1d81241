//! Integration tests for the external-checkout round trip.

use std::sync::Arc;

use examgen::api::payment::{CallbackAction, CheckoutReturn, PaymentGate};
use examgen::storage::{KeyValueStore, MemoryStore, KEY_PENDING_UNLOCK};

/// The full round trip as two separate process lifetimes: one session
/// persists the pending marker and leaves for checkout, a fresh session
/// parses the return query and resumes.
#[test]
fn test_checkout_round_trip_across_sessions() {
    let store = Arc::new(MemoryStore::new());

    // Session one: purchase handed off to checkout, marker persisted.
    store.set(KEY_PENDING_UNLOCK, "job-42").unwrap();

    // Session two: cold start over the same durable state.
    let gate = PaymentGate::new(store.clone() as Arc<dyn KeyValueStore>);
    assert!(!gate.is_unlocked("job-42"));

    let ret = CheckoutReturn::from_query("?payment=success&job_id=job-42")
        .expect("query is a checkout return");
    assert_eq!(
        gate.handle_checkout_return(&ret),
        CallbackAction::StartAnswerGeneration("job-42".to_string())
    );
    assert!(gate.is_unlocked("job-42"));
    assert!(store.get(KEY_PENDING_UNLOCK).is_none());
}

/// Replaying the same return navigation (browser refresh on the landing
/// page) does not unlock or kick off generation a second time.
#[test]
fn test_replayed_checkout_return_is_inert() {
    let store = Arc::new(MemoryStore::new());
    store.set(KEY_PENDING_UNLOCK, "job-42").unwrap();
    let gate = PaymentGate::new(store);

    let ret = CheckoutReturn::from_query("payment=success&job_id=job-42").unwrap();
    assert!(matches!(
        gate.handle_checkout_return(&ret),
        CallbackAction::StartAnswerGeneration(_)
    ));
    assert_eq!(gate.handle_checkout_return(&ret), CallbackAction::AlreadyHandled);
    assert_eq!(gate.handle_checkout_return(&ret), CallbackAction::AlreadyHandled);
}

#[test]
fn test_cancel_return_dismisses_without_unlock() {
    let store = Arc::new(MemoryStore::new());
    store.set(KEY_PENDING_UNLOCK, "job-42").unwrap();
    let gate = PaymentGate::new(store.clone() as Arc<dyn KeyValueStore>);

    let ret = CheckoutReturn::from_query("payment=cancel&job_id=job-42").unwrap();
    assert_eq!(gate.handle_checkout_return(&ret), CallbackAction::Dismissed);
    assert!(!gate.is_unlocked("job-42"));
    // Cancel still consumes the marker; a stale retry stays inert.
    assert_eq!(gate.handle_checkout_return(&ret), CallbackAction::AlreadyHandled);
}

/// Arriving with checkout parameters but no pending marker (deep link,
/// forged query, marker consumed elsewhere) does nothing.
#[test]
fn test_return_without_marker_is_ignored() {
    let gate = PaymentGate::new(Arc::new(MemoryStore::new()));
    let ret = CheckoutReturn::from_query("payment=success&job_id=job-42").unwrap();
    assert_eq!(gate.handle_checkout_return(&ret), CallbackAction::AlreadyHandled);
    assert!(!gate.is_unlocked("job-42"));
}
