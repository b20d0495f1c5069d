//! Ticker catalog file.
//!
//! The catalog is the SEC `company_tickers.json` shape: a JSON object whose
//! values each carry a `ticker` and a company `title`:
//!
//! ```json
//! {"0": {"cik_str": 320193, "ticker": "AAPL", "title": "Apple Inc."}, ...}
//! ```
//!
//! Entries come back sorted by symbol so seeding is deterministic
//! regardless of JSON object ordering.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::source::PriceError;

/// One tradable symbol and its descriptive name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    pub symbol: String,
    pub name: String,
}

#[derive(Debug, Deserialize)]
struct RawEntry {
    ticker: String,
    title: String,
}

/// Load and parse a catalog file.
pub fn load_catalog(path: impl AsRef<Path>) -> Result<Vec<CatalogEntry>, PriceError> {
    let path = path.as_ref();
    let raw = fs::read_to_string(path)
        .map_err(|e| PriceError::Config(format!("cannot read catalog {path:?}: {e}")))?;
    parse_catalog(&raw)
}

/// Parse catalog JSON content.
pub fn parse_catalog(raw: &str) -> Result<Vec<CatalogEntry>, PriceError> {
    let entries: BTreeMap<String, RawEntry> = serde_json::from_str(raw)
        .map_err(|e| PriceError::Decode(format!("bad catalog json: {e}")))?;

    // dedupe by symbol and order deterministically
    let mut by_symbol: BTreeMap<String, String> = BTreeMap::new();
    for entry in entries.into_values() {
        by_symbol.entry(entry.ticker).or_insert(entry.title);
    }

    Ok(by_symbol
        .into_iter()
        .map(|(symbol, name)| CatalogEntry { symbol, name })
        .collect())
}
