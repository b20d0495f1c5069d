//! The trade state machine.
//!
//! One pass per request, terminal on the first failure:
//!
//! 1. **Quote**: a single price is taken from the source and reused for
//!    normalization, validation, the cash leg, the position leg, and the
//!    log row. Nothing is ever re-quoted mid-trade, so one trade can never
//!    see two prices.
//! 2. **Normalize**: a size given in dollars becomes shares at the quoted
//!    price (floored; you cannot buy more than the cash covers).
//! 3. **Validate / Apply**: the cash leg, the position leg, and the log
//!    append run inside ONE database transaction. A rule rejection at any
//!    leg (insufficient funds, insufficient shares) rolls everything back,
//!    so a failed trade leaves balance, positions, and log exactly as they
//!    were.

use tsim_ledger::{Money, Qty, TradeAction};
use tsim_md::PriceSource;
use tsim_store::{Store, StoreError};

use crate::error::TradeError;

/// Requested trade size: a share count, or a dollar amount to convert at
/// the quoted price.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TradeSize {
    Shares(Qty),
    Cash(Money),
}

/// One buy or sell intent against a portfolio.
#[derive(Debug, Clone)]
pub struct TradeRequest {
    pub username: String,
    pub portfolio_id: i64,
    pub symbol: String,
    pub action: TradeAction,
    pub size: TradeSize,
}

/// What actually executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TradeReceipt {
    pub action: TradeAction,
    pub qty: Qty,
    /// The single quote the whole trade executed at.
    pub price: Money,
    /// `qty * price`: cash debited (buy) or credited (sell).
    pub gross: Money,
    pub balance_after: Money,
}

/// Executes trades against a store using quotes from a price source.
pub struct TradeEngine<'a> {
    store: &'a Store,
    prices: &'a dyn PriceSource,
}

impl<'a> TradeEngine<'a> {
    pub fn new(store: &'a Store, prices: &'a dyn PriceSource) -> Self {
        Self { store, prices }
    }

    /// Run one trade to completion or to a typed rejection.
    pub async fn execute(&self, req: &TradeRequest) -> Result<TradeReceipt, TradeError> {
        // Quote. Failure here aborts before anything else happens.
        let price = self
            .prices
            .current_price(&req.symbol)
            .await
            .map_err(|source| TradeError::PriceUnavailable {
                symbol: req.symbol.clone(),
                source,
            })?;

        let qty = normalize(req.size, price)?;
        let gross = price.mul_qty(qty).ok_or(TradeError::Ledger(
            tsim_ledger::LedgerError::Overflow,
        ))?;

        let receipt = match req.action {
            TradeAction::Buy => self.apply_buy(req, price, qty, gross).await?,
            TradeAction::Sell => self.apply_sell(req, price, qty, gross).await?,
        };

        tracing::info!(
            user = %req.username,
            portfolio = req.portfolio_id,
            symbol = %req.symbol,
            action = %receipt.action,
            qty = %receipt.qty,
            price = %receipt.price,
            "trade executed"
        );
        Ok(receipt)
    }

    async fn apply_buy(
        &self,
        req: &TradeRequest,
        price: Money,
        qty: Qty,
        cost: Money,
    ) -> Result<TradeReceipt, TradeError> {
        let ticker_id = self.store.ticker_id(&req.symbol).await?;

        let mut tx = self.store.begin().await?;
        // withdraw validates affordability before touching the row
        let balance_after = Store::withdraw_tx(&mut tx, &req.username, cost).await?;
        Store::open_or_increase_tx(&mut tx, req.portfolio_id, ticker_id, qty, cost).await?;
        Store::record_trade_tx(&mut tx, req.portfolio_id, &req.symbol, TradeAction::Buy, qty, price)
            .await?;
        tx.commit().await.map_err(StoreError::from)?;

        Ok(TradeReceipt {
            action: TradeAction::Buy,
            qty,
            price,
            gross: cost,
            balance_after,
        })
    }

    async fn apply_sell(
        &self,
        req: &TradeRequest,
        price: Money,
        qty: Qty,
        proceeds: Money,
    ) -> Result<TradeReceipt, TradeError> {
        let ticker_id = self.store.ticker_id(&req.symbol).await?;

        let mut tx = self.store.begin().await?;
        // the position leg validates holdings; proceeds use the same quote
        Store::decrease_or_close_tx(&mut tx, req.portfolio_id, ticker_id, qty).await?;
        let balance_after = Store::deposit_tx(&mut tx, &req.username, proceeds).await?;
        Store::record_trade_tx(
            &mut tx,
            req.portfolio_id,
            &req.symbol,
            TradeAction::Sell,
            qty,
            price,
        )
        .await?;
        tx.commit().await.map_err(StoreError::from)?;

        Ok(TradeReceipt {
            action: TradeAction::Sell,
            qty,
            price,
            gross: proceeds,
            balance_after,
        })
    }
}

/// Turn a requested size into a strictly positive share quantity at the
/// quoted price.
fn normalize(size: TradeSize, price: Money) -> Result<Qty, TradeError> {
    if !price.is_positive() {
        // a zero quote cannot price either leg of a trade
        return Err(TradeError::InvalidAmount {
            detail: format!("quoted price ${price} cannot price a trade"),
        });
    }

    match size {
        TradeSize::Shares(qty) => {
            if !qty.is_positive() {
                return Err(TradeError::InvalidAmount {
                    detail: format!("share quantity must be > 0, got {qty}"),
                });
            }
            Ok(qty)
        }
        TradeSize::Cash(amount) => {
            if !amount.is_positive() {
                return Err(TradeError::InvalidAmount {
                    detail: format!("cash amount must be > 0, got ${amount}"),
                });
            }
            match amount.div_price(price) {
                Some(qty) if qty.is_positive() => Ok(qty),
                _ => Err(TradeError::InvalidAmount {
                    detail: format!("${amount} buys no shares at ${price}"),
                }),
            }
        }
    }
}
