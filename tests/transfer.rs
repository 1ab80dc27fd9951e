//! Integration tests for the transfer protocol.
//!
//! These run the full service stack (logging middleware included) against
//! the in-memory ledger store, including concurrent transfers that contend
//! for the same rows.

use std::{sync::Arc, time::Duration};

use payment_system::{
    error::AppError,
    models::{Account, Direction, TransferRequest},
    services::{self, SharedService},
    store::{LedgerStore, MemoryLedgerStore},
};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn request(from: &str, to: &str, amount: Decimal, currency: &str) -> TransferRequest {
    TransferRequest {
        from: from.to_string(),
        to: to.to_string(),
        amount,
        currency: currency.to_string(),
    }
}

async fn setup(accounts: Vec<Account>) -> (MemoryLedgerStore, SharedService) {
    let store = MemoryLedgerStore::with_accounts(accounts).await;
    let service = services::build(Arc::new(store.clone()));
    (store, service)
}

async fn total(store: &MemoryLedgerStore) -> Decimal {
    store
        .list_accounts()
        .await
        .unwrap()
        .iter()
        .map(|account| account.balance)
        .sum()
}

/// Test: insufficient funds, then a successful transfer the other way
#[tokio::test]
async fn test_end_to_end_scenario() {
    let (store, service) = setup(vec![
        Account::new("alice456", dec!(0.01), "USD"),
        Account::new("bob123", dec!(100), "USD"),
    ])
    .await;

    // 1. Alice cannot send more than she has
    let err = service
        .transfer(request("alice456", "bob123", dec!(0.02), ""))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InsufficientFunds), "{err}");

    // 2. Bob sends Alice one cent
    let transfer = service
        .transfer(request("bob123", "alice456", dec!(0.01), ""))
        .await
        .unwrap();
    assert_eq!(transfer.currency, "USD");

    // 3. Balances moved by exactly the amount
    assert_eq!(store.account("alice456").await.unwrap().balance, dec!(0.02));
    assert_eq!(store.account("bob123").await.unwrap().balance, dec!(99.99));

    // 4. The ledger holds the failed attempt plus both sides of the success
    let records = service.list_transactions().await.unwrap();
    assert_eq!(records.len(), 3);

    let failed: Vec<_> = records.iter().filter(|record| !record.succeeded()).collect();
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0].direction, Direction::Outgoing);
    assert_eq!(failed[0].payer, "alice456");
    assert_eq!(failed[0].error, "Insufficient funds");

    let outgoing = records
        .iter()
        .find(|record| record.succeeded() && record.direction == Direction::Outgoing)
        .unwrap();
    assert_eq!(outgoing.payer, "bob123");

    let incoming = records
        .iter()
        .find(|record| record.direction == Direction::Incoming)
        .unwrap();
    assert_eq!(incoming.payee, "alice456");
    assert!(incoming.succeeded());
}

/// Test: transfers in opposite directions over the same pair never deadlock
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_opposite_transfers_complete() {
    let (store, service) = setup(vec![
        Account::new("alice456", dec!(1000), "USD"),
        Account::new("bob123", dec!(1000), "USD"),
    ])
    .await;

    let mut handles = Vec::new();
    for i in 0..200 {
        let service = Arc::clone(&service);
        let (from, to) = if i % 2 == 0 {
            ("alice456", "bob123")
        } else {
            ("bob123", "alice456")
        };
        handles.push(tokio::spawn(async move {
            service.transfer(request(from, to, dec!(1), "")).await
        }));
    }

    let all = async {
        for handle in handles {
            handle.await.unwrap().unwrap();
        }
    };
    tokio::time::timeout(Duration::from_secs(10), all)
        .await
        .expect("concurrent transfers deadlocked");

    // Equal traffic both ways leaves both balances where they started
    assert_eq!(store.account("alice456").await.unwrap().balance, dec!(1000));
    assert_eq!(store.account("bob123").await.unwrap().balance, dec!(1000));
    assert_eq!(service.list_transactions().await.unwrap().len(), 400);
}

/// Test: concurrent transfers across several accounts conserve money
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_transfers_conserve_total() {
    let ids = ["ann", "ben", "cat", "dan", "eve"];
    let (store, service) = setup(
        ids.iter()
            .map(|id| Account::new(*id, dec!(50), "USD"))
            .collect(),
    )
    .await;
    let before = total(&store).await;

    let mut handles = Vec::new();
    for i in 0..250 {
        let service = Arc::clone(&service);
        let from = ids[i % ids.len()];
        let to = ids[(i * 3 + 1) % ids.len()];
        let amount = Decimal::new((i % 7 + 1) as i64, 0);
        handles.push(tokio::spawn(async move {
            service.transfer(request(from, to, amount, "")).await
        }));
    }

    let all = async {
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_)
                | Err(AppError::InsufficientFunds)
                | Err(AppError::SelfTransfer) => {}
                Err(err) => panic!("unexpected failure: {err}"),
            }
        }
    };
    tokio::time::timeout(Duration::from_secs(10), all)
        .await
        .expect("concurrent transfers deadlocked");

    assert_eq!(total(&store).await, before);
    for account in store.list_accounts().await.unwrap() {
        assert!(account.balance >= Decimal::ZERO, "{account:?}");
    }
}

/// Test: racing withdrawals never overdraw the payer
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_racing_withdrawals_never_overdraw() {
    let (store, service) = setup(vec![
        Account::new("alice456", dec!(10), "USD"),
        Account::new("bob123", dec!(0), "USD"),
    ])
    .await;

    let mut handles = Vec::new();
    for _ in 0..50 {
        let service = Arc::clone(&service);
        handles.push(tokio::spawn(async move {
            service
                .transfer(request("alice456", "bob123", dec!(1), ""))
                .await
        }));
    }

    let mut committed = 0;
    let mut rejected = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => committed += 1,
            Err(AppError::InsufficientFunds) => rejected += 1,
            Err(err) => panic!("unexpected failure: {err}"),
        }
    }

    assert_eq!(committed, 10);
    assert_eq!(rejected, 40);
    assert_eq!(store.account("alice456").await.unwrap().balance, dec!(0));
    assert_eq!(store.account("bob123").await.unwrap().balance, dec!(10));

    let records = service.list_transactions().await.unwrap();
    let incoming = records
        .iter()
        .filter(|record| record.direction == Direction::Incoming)
        .count();
    assert_eq!(incoming, 10);
    assert_eq!(records.len(), 60);
}

/// Test: the caller's currency must match the payer's
#[tokio::test]
async fn test_currency_checks() {
    let (_store, service) = setup(vec![
        Account::new("bob123", dec!(100), "USD"),
        Account::new("ivan", dec!(100), "RUB"),
    ])
    .await;

    let err = service
        .transfer(request("bob123", "ivan", dec!(1), "RUB"))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::WrongCurrency), "{err}");

    let err = service
        .transfer(request("bob123", "ivan", dec!(1), "USD"))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::DifferentCurrency), "{err}");

    let records = service.list_transactions().await.unwrap();
    assert_eq!(records[0].currency, "RUB");
    assert_eq!(records[1].currency, "USD");
}
