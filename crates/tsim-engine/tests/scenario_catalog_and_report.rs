//! Catalog seeding degrades per symbol, refresh re-quotes the cache, and
//! the portfolio report derives valuation rows, totals, and the
//! top-5-plus-Other allocation from live quotes.

use tsim_engine::{portfolio_report, refresh_prices, seed_catalog, TradeEngine, TradeRequest, TradeSize};
use tsim_ledger::{Money, Qty, TradeAction, UNIT};
use tsim_md::{parse_catalog, FixedPriceSource};
use tsim_store::Store;

const M: i64 = UNIT;

#[tokio::test]
async fn scenario_seed_skips_unquotable_symbols() {
    let store = Store::in_memory().await.unwrap();
    store.migrate().await.unwrap();

    let entries = parse_catalog(
        r#"{
            "0": {"ticker": "ACME", "title": "Acme Corp"},
            "1": {"ticker": "DEAD", "title": "Dead Co"},
            "2": {"ticker": "ZETA", "title": "Zeta Inc"}
        }"#,
    )
    .unwrap();

    // no quote for DEAD
    let src = FixedPriceSource::new()
        .with_price("ACME", Money::new(50 * M))
        .with_price("ZETA", Money::new(12 * M));

    let outcome = seed_catalog(&store, &src, &entries, None).await.unwrap();
    assert_eq!(outcome.updated, 2);
    assert_eq!(outcome.skipped, 1);

    let symbols: Vec<String> = store
        .all_tickers()
        .await
        .unwrap()
        .into_iter()
        .map(|t| t.symbol)
        .collect();
    assert_eq!(symbols, ["ACME", "ZETA"]);

    // re-seeding is harmless: everything already present is skipped
    let again = seed_catalog(&store, &src, &entries, None).await.unwrap();
    assert_eq!(again.updated, 0);
    assert_eq!(again.skipped, 3);
}

#[tokio::test]
async fn scenario_seed_limit_bounds_the_pass() {
    let store = Store::in_memory().await.unwrap();
    store.migrate().await.unwrap();

    let entries = parse_catalog(
        r#"{
            "0": {"ticker": "AAA", "title": "A"},
            "1": {"ticker": "BBB", "title": "B"},
            "2": {"ticker": "CCC", "title": "C"}
        }"#,
    )
    .unwrap();
    let src = FixedPriceSource::new()
        .with_price("AAA", Money::new(M))
        .with_price("BBB", Money::new(M))
        .with_price("CCC", Money::new(M));

    let outcome = seed_catalog(&store, &src, &entries, Some(2)).await.unwrap();
    assert_eq!(outcome.updated, 2);
    assert_eq!(store.all_tickers().await.unwrap().len(), 2);
}

#[tokio::test]
async fn scenario_refresh_updates_cached_prices() {
    let store = Store::in_memory().await.unwrap();
    store.migrate().await.unwrap();
    store
        .create_ticker("ACME", None, Some(Money::new(50 * M)))
        .await
        .unwrap();

    let src = FixedPriceSource::new().with_price("ACME", Money::new(61 * M));
    let outcome = refresh_prices(&store, &src).await.unwrap();
    assert_eq!(outcome.updated, 1);

    let rows = store.all_tickers().await.unwrap();
    assert_eq!(rows[0].last_price, Some(Money::new(61 * M)));
}

#[tokio::test]
async fn scenario_report_seven_positions_six_allocation_slices() {
    let store = Store::in_memory().await.unwrap();
    store.migrate().await.unwrap();
    let uid = store.create_user("alice", "pw", None).await.unwrap();
    let pid = store.create_portfolio(uid, "main").await.unwrap();
    store
        .deposit("alice", Money::new(100_000 * M))
        .await
        .unwrap();

    // seven tickers with descending cost bases: $700, $600, ... $100
    let mut src = FixedPriceSource::new();
    let symbols = ["AAA", "BBB", "CCC", "DDD", "EEE", "FFF", "GGG"];
    for (i, sym) in symbols.iter().enumerate() {
        store.create_ticker(sym, None, None).await.unwrap();
        let price = Money::new((700 - 100 * i as i64) * M);
        src.set_price(sym, price);
        TradeEngine::new(&store, &src)
            .execute(&TradeRequest {
                username: "alice".to_string(),
                portfolio_id: pid,
                symbol: sym.to_string(),
                action: TradeAction::Buy,
                size: TradeSize::Shares(Qty::new(M)),
            })
            .await
            .unwrap();
    }

    let report = portfolio_report(&store, &src, pid).await.unwrap();

    assert_eq!(report.rows.len(), 7);
    // marked at cost, the portfolio is flat
    assert_eq!(report.totals.total_cost_basis, Money::new(2_800 * M));
    assert_eq!(report.totals.total_value, Money::new(2_800 * M));
    assert_eq!(report.totals.total_profit_loss, Money::ZERO);

    // exactly 6 slices: the top five plus Other = $200 + $100
    assert_eq!(report.allocation.len(), 6);
    assert_eq!(report.allocation[0].label, "AAA");
    assert_eq!(report.allocation[0].cost_basis, Money::new(700 * M));
    assert_eq!(report.allocation[5].label, "Other");
    assert_eq!(report.allocation[5].cost_basis, Money::new(300 * M));
}

#[tokio::test]
async fn scenario_report_values_at_live_quotes() {
    let store = Store::in_memory().await.unwrap();
    store.migrate().await.unwrap();
    let uid = store.create_user("alice", "pw", None).await.unwrap();
    let pid = store.create_portfolio(uid, "main").await.unwrap();
    store.deposit("alice", Money::new(1_000 * M)).await.unwrap();
    store.create_ticker("ACME", None, None).await.unwrap();

    let src = FixedPriceSource::new().with_price("ACME", Money::new(50 * M));
    TradeEngine::new(&store, &src)
        .execute(&TradeRequest {
            username: "alice".to_string(),
            portfolio_id: pid,
            symbol: "ACME".to_string(),
            action: TradeAction::Buy,
            size: TradeSize::Shares(Qty::new(10 * M)),
        })
        .await
        .unwrap();

    // mark at $65: value $650 on a $500 basis
    let src = FixedPriceSource::new().with_price("ACME", Money::new(65 * M));
    let report = portfolio_report(&store, &src, pid).await.unwrap();

    let row = &report.rows[0];
    assert_eq!(row.average_price, Money::new(50 * M));
    assert_eq!(row.current_price, Money::new(65 * M));
    assert_eq!(row.current_value, Money::new(650 * M));
    assert_eq!(row.profit_loss, Money::new(150 * M));
    assert_eq!(report.totals.total_profit_loss, Money::new(150 * M));
}
