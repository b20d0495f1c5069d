//! HTTP price source.
//!
//! Talks to a JSON quote service:
//!
//! - `GET {base_url}/quote?symbol=SYM` ->
//!   `{"symbol": "SYM", "price": "182.34"}`
//! - `GET {base_url}/history?symbol=SYM&start=<rfc3339>` ->
//!   `{"symbol": "SYM", "points": [{"ts": "<rfc3339>", "price": "181.10"}, ...]}`
//!
//! Prices arrive as decimal strings and are normalised to fixed-point
//! micros here. The API key, when the service wants one, comes from an
//! environment variable, never from a config literal.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use tsim_ledger::Money;

use crate::source::{PriceError, PricePoint, PriceSource};

/// Header carrying the API key, when one is configured.
const API_KEY_HEADER: &str = "x-api-key";

#[derive(Debug)]
pub struct HttpPriceSource {
    base_url: String,
    api_key: Option<String>,
    client: reqwest::Client,
}

impl HttpPriceSource {
    /// Build a source against `base_url`. `api_key_env`, if given, names an
    /// environment variable that must hold the key.
    pub fn new(base_url: impl Into<String>, api_key_env: Option<&str>) -> Result<Self, PriceError> {
        let api_key = match api_key_env {
            Some(var) => Some(std::env::var(var).map_err(|_| {
                PriceError::Config(format!("api key env var {var} is not set"))
            })?),
            None => None,
        };

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
            client: reqwest::Client::new(),
        })
    }

    async fn get_json<T: for<'de> Deserialize<'de>>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, PriceError> {
        let url = format!("{}/{}", self.base_url, path);
        let mut req = self.client.get(&url).query(query);
        if let Some(key) = &self.api_key {
            req = req.header(API_KEY_HEADER, key);
        }

        let resp = req
            .send()
            .await
            .map_err(|e| PriceError::Transport(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(PriceError::Transport(format!(
                "{url} returned {}",
                resp.status()
            )));
        }

        resp.json::<T>()
            .await
            .map_err(|e| PriceError::Decode(e.to_string()))
    }
}

#[derive(Debug, Deserialize)]
struct QuoteBody {
    #[allow(dead_code)]
    symbol: Option<String>,
    price: Option<String>,
}

#[derive(Debug, Deserialize)]
struct HistoryBody {
    points: Vec<HistoryPointBody>,
}

#[derive(Debug, Deserialize)]
struct HistoryPointBody {
    ts: DateTime<Utc>,
    price: String,
}

fn parse_price(symbol: &str, raw: &str) -> Result<Money, PriceError> {
    Money::parse(raw).map_err(|detail| PriceError::Decode(format!(
        "bad price '{raw}' for '{symbol}': {detail}"
    )))
}

#[async_trait::async_trait]
impl PriceSource for HttpPriceSource {
    fn name(&self) -> &'static str {
        "http"
    }

    async fn current_price(&self, symbol: &str) -> Result<Money, PriceError> {
        let body: QuoteBody = self.get_json("quote", &[("symbol", symbol)]).await?;

        let raw = body.price.ok_or_else(|| PriceError::Unavailable {
            symbol: symbol.to_string(),
            reason: "quote response carried no price".to_string(),
        })?;

        let price = parse_price(symbol, &raw)?;
        tracing::debug!(symbol, %price, "quoted");
        Ok(price)
    }

    async fn history(
        &self,
        symbol: &str,
        start: DateTime<Utc>,
    ) -> Result<Vec<PricePoint>, PriceError> {
        let start_s = start.to_rfc3339();
        let body: HistoryBody = self
            .get_json("history", &[("symbol", symbol), ("start", &start_s)])
            .await?;

        let mut points = Vec::with_capacity(body.points.len());
        for p in body.points {
            points.push(PricePoint {
                ts: p.ts,
                price: parse_price(symbol, &p.price)?,
            });
        }
        // upstream order is not contractual; ours is
        points.sort_by_key(|p| p.ts);
        Ok(points)
    }
}
