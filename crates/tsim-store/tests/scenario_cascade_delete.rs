//! Deleting a user must take its portfolios with it, and deleting a
//! portfolio must take its positions: ownership is exclusive down the
//! chain, while tickers are shared references and survive.

use tsim_ledger::{Money, Qty, UNIT};
use tsim_store::Store;

const M: i64 = UNIT;

#[tokio::test]
async fn scenario_cascade_delete_user_portfolio_positions() {
    let store = Store::in_memory().await.unwrap();
    store.migrate().await.unwrap();

    let uid = store.create_user("alice", "pw", None).await.unwrap();
    let pid = store.create_portfolio(uid, "main").await.unwrap();
    let tid = store
        .create_ticker("ACME", Some("Acme Corp"), Some(Money::new(50 * M)))
        .await
        .unwrap();

    let mut tx = store.begin().await.unwrap();
    Store::open_or_increase_tx(&mut tx, pid, tid, Qty::new(10 * M), Money::new(500 * M))
        .await
        .unwrap();
    tx.commit().await.unwrap();
    assert_eq!(store.all_positions(pid).await.unwrap().len(), 1);

    store.delete_user("alice").await.unwrap();

    // portfolio gone with the user
    assert!(store.portfolio_names(uid).await.unwrap().is_empty());
    // position rows gone with the portfolio
    assert!(store.all_positions(pid).await.unwrap().is_empty());
    // shared catalog survives
    assert_eq!(store.all_tickers().await.unwrap().len(), 1);
}

#[tokio::test]
async fn scenario_cascade_delete_portfolio_only() {
    let store = Store::in_memory().await.unwrap();
    store.migrate().await.unwrap();

    let uid = store.create_user("bob", "pw", None).await.unwrap();
    let pid = store.create_portfolio(uid, "growth").await.unwrap();
    let tid = store.create_ticker("ZETA", None, None).await.unwrap();

    let mut tx = store.begin().await.unwrap();
    Store::open_or_increase_tx(&mut tx, pid, tid, Qty::new(M), Money::new(10 * M))
        .await
        .unwrap();
    tx.commit().await.unwrap();

    store.delete_portfolio(uid, "growth").await.unwrap();

    // user remains, with its balance intact
    assert_eq!(store.balance("bob").await.unwrap(), Money::ZERO);
    assert!(store.all_positions(pid).await.unwrap().is_empty());
}
