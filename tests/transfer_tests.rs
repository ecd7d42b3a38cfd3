//! Integration Tests: balance display and transfers
//!
//! These tests verify:
//! 1. Balance is truncated, never rounded, and survives fetch failures
//! 2. Late balance responses never overwrite newer state
//! 3. Transfers validate before touching the provider
//! 4. Pending transfer form is kept on failure and cleared on success

mod common;

use beeconnect::core::paths::methods;
use beeconnect::{
    ManualScheduler, MemoryProvider, MemoryStore, PendingTransfer, ProviderError, ProviderEvent,
    SessionError, WalletSession,
};
use common::GatedProvider;
use std::rc::Rc;

const ALICE: &str = "0x5aaeb6053f3e94c9b9a09f33669435e7ef1beaed";
const BOB: &str = "0xfb6916095ca1df60bb79ce92ce3ea74c37c5d359";
const ETH: u128 = 1_000_000_000_000_000_000;

async fn connected(wallet: MemoryProvider) -> (Rc<MemoryProvider>, WalletSession) {
    let wallet = Rc::new(wallet);
    let session = WalletSession::new(
        Some(wallet.clone()),
        Rc::new(MemoryStore::new()),
        Rc::new(ManualScheduler::new()),
    );
    session.connect().await.expect("connect");
    (wallet, session)
}

// =============================================================================
// BALANCE
// =============================================================================

/// Test: display keeps six decimals by truncation
#[tokio::test]
async fn balance_is_truncated() {
    let (_wallet, session) =
        connected(MemoryProvider::new(&[ALICE], "0x1").with_balance(ALICE, 1_234_567_890_000_000_000)).await;

    let raw = session.refresh_balance().await.expect("balance");

    assert_eq!(raw, 1_234_567_890_000_000_000);
    assert_eq!(session.balance().display, "1.234567");
    assert_eq!(session.snapshot().balance, "1.234567");
}

/// Test: 0.9999999 ETH shows as 0.999999, not 1
#[tokio::test]
async fn balance_never_rounds_up() {
    let (_wallet, session) =
        connected(MemoryProvider::new(&[ALICE], "0x1").with_balance(ALICE, 999_999_900_000_000_000)).await;
    session.refresh_balance().await.expect("balance");
    assert_eq!(session.balance().display, "0.999999");
}

/// Test: a failed fetch keeps the previous balance and reports the failure
#[tokio::test]
async fn balance_failure_keeps_previous() {
    let (wallet, session) = connected(MemoryProvider::new(&[ALICE], "0x1").with_balance(ALICE, 3 * ETH / 2)).await;
    session.refresh_balance().await.expect("balance");

    wallet.fail_next(methods::GET_BALANCE, ProviderError::new(-32603, "header not found"));
    let err = session.refresh_balance().await.unwrap_err();

    assert_eq!(err, SessionError::BalanceFetch("header not found".into()));
    assert_eq!(session.balance().display, "1.5");
    assert_eq!(session.message(), "Balance fetch failed: header not found");
}

/// Test: no balance request while disconnected
#[tokio::test]
async fn balance_requires_connection() {
    let wallet = Rc::new(MemoryProvider::new(&[ALICE], "0x1"));
    let session = WalletSession::new(Some(wallet.clone()), Rc::new(MemoryStore::new()), Rc::new(ManualScheduler::new()));

    assert_eq!(session.refresh_balance().await.unwrap_err(), SessionError::NotConnected);
    assert_eq!(wallet.call_count(methods::GET_BALANCE), 0);
    assert_eq!(session.balance().display, "0");
}

/// Test: the old account's balance never lands on the new account
#[tokio::test]
async fn stale_balance_is_discarded() {
    let (wallet, release) =
        GatedProvider::new(MemoryProvider::new(&[ALICE, BOB], "0x1").with_balance(ALICE, 5 * ETH), methods::GET_BALANCE);
    let session = WalletSession::new(Some(wallet.clone()), Rc::new(MemoryStore::new()), Rc::new(ManualScheduler::new()));
    session.connect().await.expect("connect");

    let (result, ()) = futures::join!(session.refresh_balance(), async {
        session.apply(ProviderEvent::AccountsChanged(vec![BOB.into()]));
        let _ = release.send(());
    });

    assert_eq!(result.expect("late response is not an error"), 5 * ETH);
    assert_eq!(session.account().as_deref(), Some(BOB));
    assert_eq!(session.balance().display, "0");

    // a fresh request for the new account lands normally
    wallet.inner.set_balance(BOB, 2 * ETH);
    session.refresh_balance().await.expect("balance");
    assert_eq!(session.balance().display, "2");
}

// =============================================================================
// TRANSFERS
// =============================================================================

/// Test: a valid transfer is sent, the form cleared and the balance refreshed
#[tokio::test]
async fn send_submits_transfer() {
    let (wallet, session) = connected(MemoryProvider::new(&[ALICE], "0x1").with_balance(ALICE, 2 * ETH)).await;

    let hash = session.send(BOB, "0.5").await.expect("send");

    let expected = format!("0x{:064x}", 1);
    assert_eq!(hash.as_deref(), Some(expected.as_str()));
    assert_eq!(session.message(), format!("Transaction sent: {}", expected));
    assert_eq!(session.pending_transfer(), None);
    assert_eq!(session.balance().display, "1.5");

    let sent = wallet.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].from, ALICE);
    assert_eq!(sent[0].to, BOB);
    assert_eq!(sent[0].value, ETH / 2);
}

/// Test: a wallet that answers without a hash reports the transfer as pending
#[tokio::test]
async fn send_without_hash() {
    let (wallet, session) = connected(MemoryProvider::new(&[ALICE], "0x1").with_balance(ALICE, ETH)).await;
    wallet.withhold_tx_hash(true);

    assert_eq!(session.send(BOB, "0.1").await.expect("send"), None);
    assert_eq!(session.message(), "Transaction sent: pending");
}

/// Test: invalid input never reaches the provider
#[tokio::test]
async fn send_validates_before_request() {
    let (wallet, session) = connected(MemoryProvider::new(&[ALICE], "0x1").with_balance(ALICE, ETH)).await;
    wallet.clear_calls();

    let err = session.send("0x1234", "1").await.unwrap_err();
    assert!(matches!(err, SessionError::InvalidAddress(_)));
    assert!(session.message().starts_with("Invalid address"));

    // mixed case with a broken checksum
    let err = session.send("0xFB6916095ca1df60bB79Ce92cE3Ea74c37c5d359", "1").await.unwrap_err();
    assert!(matches!(err, SessionError::InvalidAddress(_)));

    for amount in ["0", "-1", "one", ""] {
        let err = session.send(BOB, amount).await.unwrap_err();
        assert!(matches!(err, SessionError::InvalidAmount(_)), "accepted {amount:?}");
    }

    assert!(wallet.calls().is_empty());
    assert_eq!(session.pending_transfer(), None);
}

/// Test: the provider's reason is shown verbatim and the form is kept
#[tokio::test]
async fn send_failure_keeps_form() {
    let (_wallet, session) = connected(MemoryProvider::new(&[ALICE], "0x1")).await;

    let err = session.send(BOB, "1").await.unwrap_err();

    assert_eq!(err, SessionError::TransactionSubmit("insufficient funds for transfer".into()));
    assert_eq!(session.message(), "insufficient funds for transfer");
    assert_eq!(
        session.pending_transfer(),
        Some(PendingTransfer { to: BOB.into(), amount_eth: "1".into() })
    );

    session.reset_transfer();
    assert_eq!(session.pending_transfer(), None);
}

/// Test: rejection in the wallet is shown as the wallet worded it
#[tokio::test]
async fn send_rejected_by_user() {
    let (wallet, session) = connected(MemoryProvider::new(&[ALICE], "0x1").with_balance(ALICE, ETH)).await;
    wallet.fail_next(methods::SEND_TRANSACTION, ProviderError::user_rejected());

    assert!(session.send(BOB, "0.1").await.is_err());
    assert_eq!(session.message(), "User rejected the request.");
    assert!(wallet.sent().is_empty());
}

/// Test: sending needs a connected account
#[tokio::test]
async fn send_requires_connection() {
    let wallet = Rc::new(MemoryProvider::new(&[ALICE], "0x1"));
    let session = WalletSession::new(Some(wallet.clone()), Rc::new(MemoryStore::new()), Rc::new(ManualScheduler::new()));

    assert_eq!(session.send(BOB, "1").await.unwrap_err(), SessionError::NotConnected);
    assert!(wallet.calls().is_empty());
}
