use crate::error::LedgerError;

/// BUY or SELL, as recorded in the transaction log.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum TradeAction {
    Buy,
    Sell,
}

impl TradeAction {
    /// Canonical storage form.
    pub fn as_str(&self) -> &'static str {
        match self {
            TradeAction::Buy => "buy",
            TradeAction::Sell => "sell",
        }
    }

    /// Parse the storage / user-input form. Anything other than buy/sell is
    /// a typed rejection, not a panic.
    pub fn parse(s: &str) -> Result<Self, LedgerError> {
        match s.trim().to_ascii_lowercase().as_str() {
            "buy" => Ok(TradeAction::Buy),
            "sell" => Ok(TradeAction::Sell),
            other => Err(LedgerError::InvalidAction {
                action: other.to_string(),
            }),
        }
    }
}

impl std::fmt::Display for TradeAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_accepts_canonical_and_mixed_case() {
        assert_eq!(TradeAction::parse("buy").unwrap(), TradeAction::Buy);
        assert_eq!(TradeAction::parse(" SELL ").unwrap(), TradeAction::Sell);
    }

    #[test]
    fn parse_rejects_anything_else() {
        let err = TradeAction::parse("hold").unwrap_err();
        assert_eq!(
            err,
            LedgerError::InvalidAction {
                action: "hold".to_string()
            }
        );
    }

    #[test]
    fn as_str_roundtrips() {
        for a in [TradeAction::Buy, TradeAction::Sell] {
            assert_eq!(TradeAction::parse(a.as_str()).unwrap(), a);
        }
    }
}
